//! Parallel parsing of many targets

use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

use super::FoxmlParser;
use crate::error::Result;
use crate::model::DigitalObject;

impl FoxmlParser {
    /// Parse every target on the rayon pool
    ///
    /// Results come back in the order of `targets`; one failure does not
    /// stop the others.
    pub fn parse_all<P>(&self, targets: &[P], control_concurrency: bool) -> Vec<Result<Arc<DigitalObject>>>
    where
        P: AsRef<Path> + Sync,
    {
        targets
            .par_iter()
            .map(|target| self.parse(target, control_concurrency))
            .collect()
    }
}
