use std::fmt;

/// A path to a field of the wizard state, e.g. `"debug.port"`.
///
/// Used as the key that binds a prompter to the part of the state it fills.
/// Paths are hierarchical, using dot notation for nested objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Create a new path from a dot-separated string. Empty segments are dropped.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            segments: path
                .as_ref()
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The root path. Addresses the whole state object.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append a child segment to this path, returning a new path.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(FieldPath::new(name).segments);
        Self { segments }
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path with its last segment removed. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Whether `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Whether the two paths address overlapping parts of the state.
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// Returns this path relative to `prefix`, if `prefix` is an ancestor.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<Self> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| Self {
                segments: rest.to_vec(),
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for FieldPath {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(path: &FieldPath) -> Self {
        path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new() {
        let path = FieldPath::new("name");
        assert_eq!(path.to_string(), "name");
        assert_eq!(path.depth(), 1);
    }

    #[test]
    fn empty_segments_are_dropped() {
        let path = FieldPath::new(".debug..port.");
        assert_eq!(path.to_string(), "debug.port");
    }

    #[test]
    fn child() {
        let path = FieldPath::new("debug").child("port");
        assert_eq!(path.to_string(), "debug.port");
        assert_eq!(FieldPath::root().child("name").to_string(), "name");
    }

    #[test]
    fn parent_and_last() {
        let path = FieldPath::new("target.lambda.handler");
        assert_eq!(path.last(), Some("handler"));
        assert_eq!(path.parent().to_string(), "target.lambda");
        assert!(FieldPath::new("a").parent().is_root());
    }

    #[test]
    fn starts_with_respects_segment_boundaries() {
        let path = FieldPath::new("region.name");
        assert!(path.starts_with(&FieldPath::new("region")));
        assert!(!FieldPath::new("regions").starts_with(&FieldPath::new("region")));
        assert!(path.overlaps(&FieldPath::new("region")));
        assert!(!path.overlaps(&FieldPath::new("logGroup")));
    }

    #[test]
    fn strip_prefix() {
        let path = FieldPath::new("debug.port");
        let stripped = path.strip_prefix(&FieldPath::new("debug")).unwrap();
        assert_eq!(stripped.to_string(), "port");
        assert!(path.strip_prefix(&FieldPath::new("other")).is_none());
    }
}
