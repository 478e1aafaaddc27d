//! Namespace Resolution
//!
//! Stack-based resolver that expands qualified names into the
//! `namespace-uri:local-name` form reported by namespace-aware SAX parsers.

/// Separator between namespace URI and local name in expanded names
pub const SEPARATOR: char = ':';

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

#[derive(Debug, Clone)]
struct NsBinding {
    /// Empty for the default namespace
    prefix: String,
    uri: String,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    bindings: Vec<NsBinding>,
    depth: u16,
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceResolver {
    /// Create a resolver with the `xml` prefix pre-bound
    pub fn new() -> Self {
        NamespaceResolver {
            bindings: vec![NsBinding {
                prefix: "xml".to_string(),
                uri: ns::XML.to_string(),
                depth: 0,
            }],
            depth: 0,
        }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while self.bindings.last().is_some_and(|b| b.depth >= self.depth && b.depth > 0) {
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a binding in the current scope; an empty prefix is the
    /// default namespace. Redeclaring `xml` or `xmlns` is ignored.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }
        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            depth: self.depth,
        });
    }

    /// Resolve a prefix (empty for the default namespace) to its URI
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Consume `xmlns` declarations from `attributes` into the current scope
    pub fn declare_from(&mut self, attributes: &mut Vec<(String, String)>) {
        attributes.retain(|(name, value)| {
            if name == "xmlns" {
                self.declare("", value);
                false
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                self.declare(prefix, value);
                false
            } else {
                true
            }
        });
    }

    /// Expand an element name; unprefixed names take the default namespace
    pub fn expand_element(&self, qname: &str) -> String {
        self.expand(qname, true)
    }

    /// Expand an attribute name; unprefixed attributes stay in no namespace
    pub fn expand_attribute(&self, qname: &str) -> String {
        self.expand(qname, false)
    }

    fn expand(&self, qname: &str, use_default: bool) -> String {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None if use_default => ("", qname),
            None => return qname.to_string(),
        };
        match self.resolve(prefix) {
            Some(uri) => format!("{uri}{SEPARATOR}{local}"),
            // Unbound prefixes are reported as written
            None => qname.to_string(),
        }
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_prefixed_and_default() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("foxml", "info:fedora/fedora-system:def/foxml#");
        resolver.declare("", "urn:default");

        assert_eq!(
            resolver.expand_element("foxml:datastream"),
            "info:fedora/fedora-system:def/foxml#:datastream"
        );
        assert_eq!(resolver.expand_element("plain"), "urn:default:plain");
        assert_eq!(resolver.expand_attribute("ID"), "ID");
        assert_eq!(resolver.expand_element("other:thing"), "other:thing");
    }

    #[test]
    fn test_declare_from_strips_xmlns() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        let mut attrs = vec![
            ("xmlns:rdf".to_string(), "urn:rdf".to_string()),
            ("rdf:about".to_string(), "info:fedora/test:1".to_string()),
        ];
        resolver.declare_from(&mut attrs);

        assert_eq!(attrs.len(), 1);
        assert_eq!(resolver.expand_attribute(&attrs[0].0), "urn:rdf:about");
    }

    #[test]
    fn test_scope_pop_and_shadowing() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("ns", "urn:one");
        resolver.push_scope();
        resolver.declare("ns", "urn:two");
        assert_eq!(resolver.resolve("ns"), Some("urn:two"));

        resolver.pop_scope();
        assert_eq!(resolver.resolve("ns"), Some("urn:one"));
        resolver.pop_scope();
        assert_eq!(resolver.resolve("ns"), None);
        assert_eq!(resolver.resolve("xml"), Some(ns::XML));
    }

    #[test]
    fn test_undeclare_default() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("", "urn:default");
        resolver.push_scope();
        resolver.declare("", "");
        assert_eq!(resolver.expand_element("a"), "a");
    }
}
