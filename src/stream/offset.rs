//! Byte-offset reconciliation
//!
//! The push parser reports byte indices as wrapping `i32`s. Past 2 GiB those
//! go negative, and past 4 GiB they repeat. The true offset is recovered from
//! the number of bytes actually read so far, which is always at or beyond
//! the event being reported.

/// Width of one half of the 32-bit index space
const WRAP: u64 = 1 << 31;

/// Recover the true offset of `reported` given the read position
///
/// The read position is split into slots of 2^31 bytes. In an odd slot the
/// index is negative and `(slot + 1) * 2^31` is added; in an even slot it is
/// positive and `slot * 2^31` is added. When the chunk being parsed straddles
/// a slot boundary the event may still lie in the previous slot, in which case
/// the corrected value overshoots the read position by one full wrap.
pub fn reconcile(reported: i32, read_position: u64) -> u64 {
    if reported >= 0 && read_position < WRAP {
        return reported as u64;
    }

    let slot = read_position / WRAP;
    let odd = slot % 2;
    let correction = odd * ((slot + 1) * WRAP) + (1 - odd) * (slot * WRAP);

    let mut value = reported as i128 + correction as i128;
    if value > read_position as i128 {
        value -= 2 * WRAP as i128;
    }
    value.max(0) as u64
}

/// Pairs the last reported index with the running read position
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetTracker {
    read_position: u64,
    reported: i32,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `n` more bytes handed to the parser
    #[inline]
    pub fn advance_read(&mut self, n: usize) {
        self.read_position += n as u64;
    }

    #[inline]
    pub fn set_reported(&mut self, index: i32) {
        self.reported = index;
    }

    #[inline]
    pub fn read_position(&self) -> u64 {
        self.read_position
    }

    /// True byte offset of the last reported event
    #[inline]
    pub fn offset(&self) -> u64 {
        reconcile(self.reported, self.read_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB2: u64 = 1 << 31;
    const GIB4: u64 = 1 << 32;

    /// Index a 32-bit parser would report for `offset`
    fn wrapped(offset: u64) -> i32 {
        offset as u32 as i32
    }

    #[test]
    fn test_small_offsets_pass_through() {
        assert_eq!(reconcile(0, 0), 0);
        assert_eq!(reconcile(1234, 262_144), 1234);
    }

    #[test]
    fn test_slot_zero_to_one() {
        // Event just under 2 GiB, read position just past it
        let offset = GIB2 - 10;
        assert_eq!(reconcile(wrapped(offset), GIB2 + 100), offset);

        // Event just past 2 GiB reports a negative index
        let offset = GIB2 + 10;
        assert!(wrapped(offset) < 0);
        assert_eq!(reconcile(wrapped(offset), GIB2 + 100), offset);
    }

    #[test]
    fn test_slot_one_to_two() {
        // Negative index from slot one, read position already in slot two
        let offset = GIB4 - 10;
        assert!(wrapped(offset) < 0);
        assert_eq!(reconcile(wrapped(offset), GIB4 + 100), offset);

        // Index wrapped back to a small positive value
        let offset = GIB4 + 10;
        assert!(wrapped(offset) >= 0);
        assert_eq!(reconcile(wrapped(offset), GIB4 + 100), offset);
    }

    #[test]
    fn test_slot_two_to_three() {
        let boundary = GIB4 + GIB2;
        let before = boundary - 10;
        let after = boundary + 10;
        assert_eq!(reconcile(wrapped(before), boundary + 100), before);
        assert_eq!(reconcile(wrapped(after), boundary + 100), after);
    }

    #[test]
    fn test_tracker() {
        let mut tracker = OffsetTracker::new();
        tracker.advance_read(GIB2 as usize);
        tracker.advance_read(4096);
        tracker.set_reported(wrapped(GIB2 + 12));
        assert_eq!(tracker.offset(), GIB2 + 12);
        assert_eq!(tracker.read_position(), GIB2 + 4096);
    }
}
