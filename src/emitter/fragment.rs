use std::collections::BTreeMap;
use std::fmt;

/// Kind of a rendered source fragment
///
/// The kind doubles as the slot name a fragment is injected into, see
/// [`FragmentKind::slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentKind {
    Model,
    Dao,
    DaoTest,
    RouteTable,
    Router,
    Handler,
    Service,
    ErrorCode,
}

impl FragmentKind {
    /// Marker slot name used by template files
    pub fn slot(self) -> &'static str {
        match self {
            FragmentKind::Model => "model",
            FragmentKind::Dao => "dao",
            FragmentKind::DaoTest => "dao_test",
            FragmentKind::RouteTable => "route_table",
            FragmentKind::Router => "router",
            FragmentKind::Handler => "handler",
            FragmentKind::Service => "service",
            FragmentKind::ErrorCode => "error_code",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot())
    }
}

/// Rendered fragments of one generation run, at most one per kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    inner: BTreeMap<FragmentKind, String>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, kind: FragmentKind, text: String) {
        self.inner.insert(kind, text);
    }

    pub fn get(&self, kind: FragmentKind) -> Option<&str> {
        self.inner.get(&kind).map(String::as_str)
    }

    /// Hand a fragment over to its consumer; a second take yields `None`
    pub fn take(&mut self, kind: FragmentKind) -> Option<String> {
        self.inner.remove(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = FragmentKind> + '_ {
        self.inner.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Rendered text normalized to end with exactly one newline
pub(crate) fn finish(rendered: String) -> String {
    let mut text = rendered.trim_end().to_string();
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes_once() {
        let mut fragments = Fragments::new();
        fragments.insert(FragmentKind::Model, "pub struct Order;".into());
        assert_eq!(fragments.take(FragmentKind::Model).as_deref(), Some("pub struct Order;"));
        assert!(fragments.take(FragmentKind::Model).is_none());
        assert!(fragments.is_empty());
    }
}
