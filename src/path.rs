//! Typed attribute and field-mask paths.
//!
//! An [`AttributePath`] addresses a location in a resource's nested state
//! using field names and positional indices, e.g.
//! `settings.0.mysql_source.0.database`. A [`FieldMaskPath`] addresses a
//! field in the cloud API's update-mask vocabulary and never carries
//! indices, e.g. `settings.mysql_source.database`.

use std::fmt;

/// One step of an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// An object key.
    Field(String),
    /// A list element position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A path into resource state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributePath {
    segments: Vec<PathSegment>,
}

impl AttributePath {
    /// The empty path, addressing the whole state.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse dot/index notation.
    ///
    /// Segments made only of ASCII digits become [`PathSegment::Index`];
    /// everything else is a [`PathSegment::Field`]. Parsing never fails:
    /// malformed input such as `a..b` yields an empty field segment, which
    /// [`crate::validation::validate_path_map`] reports.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        let segments = path
            .split('.')
            .map(|seg| {
                if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
                    seg.parse()
                        .map(PathSegment::Index)
                        .unwrap_or_else(|_| PathSegment::Field(seg.to_string()))
                } else {
                    PathSegment::Field(seg.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Append a field segment.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// Append an index segment.
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// The segments of this path, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether any field segment is empty.
    pub fn has_empty_segment(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, PathSegment::Field(name) if name.is_empty()))
    }

    /// Drop every index segment, keeping field names in order.
    ///
    /// This is the natural field-mask spelling of an attribute path whose
    /// blocks are singletons.
    pub fn to_field_mask_path(&self) -> FieldMaskPath {
        let names: Vec<&str> = self
            .segments
            .iter()
            .filter_map(|s| match s {
                PathSegment::Field(name) => Some(name.as_str()),
                PathSegment::Index(_) => None,
            })
            .collect();
        FieldMaskPath::new(names.join("."))
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// A dotted field path in an API update mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldMaskPath(String);

impl FieldMaskPath {
    /// Create a field-mask path. Well-formedness is checked by validation,
    /// not here.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the dotted components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Whether the path is empty or has an empty component.
    pub fn has_empty_component(&self) -> bool {
        self.0.is_empty() || self.components().any(str::is_empty)
    }

    /// Whether any component is a positional index.
    pub fn has_index(&self) -> bool {
        self.components()
            .any(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Whether `self` equals `other` or is a parent message of it.
    pub fn covers(&self, other: &FieldMaskPath) -> bool {
        other.0 == self.0
            || (other.0.len() > self.0.len()
                && other.0.starts_with(&self.0)
                && other.0.as_bytes()[self.0.len()] == b'.')
    }
}

impl fmt::Display for FieldMaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldMaskPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_and_indices() {
        let path = AttributePath::parse("settings.0.mysql_source.0.database");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("settings".to_string()),
                PathSegment::Index(0),
                PathSegment::Field("mysql_source".to_string()),
                PathSegment::Index(0),
                PathSegment::Field("database".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "settings.0.mysql_source.0.database");
    }

    #[test]
    fn test_builder_matches_parse() {
        let built = AttributePath::root()
            .field("connection_limits")
            .index(0)
            .field("max_user_connections");
        assert_eq!(
            built,
            AttributePath::parse("connection_limits.0.max_user_connections")
        );
    }

    #[test]
    fn test_parse_edge_cases() {
        assert!(AttributePath::parse("").is_root());
        assert!(AttributePath::parse("a..b").has_empty_segment());
        assert!(!AttributePath::parse("a.b").has_empty_segment());

        // Mixed alphanumerics stay field names.
        let path = AttributePath::parse("ipv4.0");
        assert_eq!(path.segments()[0], PathSegment::Field("ipv4".to_string()));
        assert_eq!(path.segments()[1], PathSegment::Index(0));
    }

    #[test]
    fn test_to_field_mask_path() {
        let path = AttributePath::parse("settings.0.postgres_target.0.password.0.raw");
        assert_eq!(
            path.to_field_mask_path().as_str(),
            "settings.postgres_target.password.raw"
        );
    }

    #[test]
    fn test_field_mask_path_checks() {
        assert!(FieldMaskPath::new("settings.0.database").has_index());
        assert!(!FieldMaskPath::new("settings.database").has_index());
        assert!(FieldMaskPath::new("").has_empty_component());
        assert!(FieldMaskPath::new("settings..database").has_empty_component());
    }

    #[test]
    fn test_covers() {
        let parent = FieldMaskPath::new("settings.mysql_source");
        assert!(parent.covers(&FieldMaskPath::new("settings.mysql_source")));
        assert!(parent.covers(&FieldMaskPath::new("settings.mysql_source.database")));
        assert!(!parent.covers(&FieldMaskPath::new("settings.mysql_source_x")));
        assert!(!parent.covers(&FieldMaskPath::new("settings")));
    }
}
