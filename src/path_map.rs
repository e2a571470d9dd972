//! Per-resource maps from attribute paths to field-mask paths.
//!
//! A [`PathMap`] is authored once per resource type and never mutated.
//! Resources keep theirs in a `LazyLock` static:
//!
//! ```
//! use std::sync::LazyLock;
//! use yc_update_mask::path_map::PathMap;
//!
//! static NETWORK_PATHS: LazyLock<PathMap> = LazyLock::new(|| {
//!     PathMap::from_pairs(&[
//!         ("name", "name"),
//!         ("description", "description"),
//!         ("labels", "labels"),
//!     ])
//! });
//!
//! assert_eq!(NETWORK_PATHS.len(), 3);
//! ```

use crate::path::{AttributePath, FieldMaskPath};

/// One mapping from a state attribute to the API field it updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapEntry {
    /// Where the attribute lives in resource state.
    pub attribute: AttributePath,
    /// The update-mask path covering it.
    pub field_mask: FieldMaskPath,
}

/// An ordered, immutable attribute-path to field-mask-path table.
///
/// Several attributes may share one mask path (leaves of a nested object
/// that the API replaces as a whole). An attribute appearing twice is an
/// authoring error reported by [`crate::validation::validate_path_map`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMap {
    entries: Vec<PathMapEntry>,
}

impl PathMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(attribute, field_mask)` string pairs in dot/index
    /// notation.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .fold(Self::new(), |map, (attribute, mask)| {
                map.with_entry(AttributePath::parse(attribute), FieldMaskPath::new(*mask))
            })
    }

    /// Add an entry.
    pub fn with_entry(mut self, attribute: AttributePath, field_mask: FieldMaskPath) -> Self {
        self.entries.push(PathMapEntry {
            attribute,
            field_mask,
        });
        self
    }

    /// Add an entry whose mask path is the attribute path without indices.
    pub fn with_mirrored(self, attribute: AttributePath) -> Self {
        let field_mask = attribute.to_field_mask_path();
        self.with_entry(attribute, field_mask)
    }

    /// The entries in declaration order.
    pub fn entries(&self) -> &[PathMapEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mask path for `attribute`, if mapped.
    pub fn get(&self, attribute: &AttributePath) -> Option<&FieldMaskPath> {
        self.entries
            .iter()
            .find(|e| &e.attribute == attribute)
            .map(|e| &e.field_mask)
    }

    /// Whether `attribute` is mapped.
    pub fn contains(&self, attribute: &AttributePath) -> bool {
        self.get(attribute).is_some()
    }

    /// Distinct mask paths in first-seen order.
    pub fn field_mask_paths(&self) -> Vec<&FieldMaskPath> {
        let mut seen: Vec<&FieldMaskPath> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&&entry.field_mask) {
                seen.push(&entry.field_mask);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_keeps_order() {
        let map = PathMap::from_pairs(&[
            ("settings.0.mysql_source.0.database", "settings.mysql_source.database"),
            ("name", "name"),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.entries()[0].attribute.to_string(),
            "settings.0.mysql_source.0.database"
        );
        assert_eq!(map.entries()[1].field_mask.as_str(), "name");
    }

    #[test]
    fn test_get() {
        let map = PathMap::from_pairs(&[("permission", "permissions")]);
        assert_eq!(
            map.get(&AttributePath::parse("permission")).map(|p| p.as_str()),
            Some("permissions")
        );
        assert!(!map.contains(&AttributePath::parse("password")));
    }

    #[test]
    fn test_with_mirrored() {
        let map = PathMap::new().with_mirrored(
            AttributePath::root()
                .field("connection_limits")
                .index(0)
                .field("max_questions_per_hour"),
        );
        assert_eq!(
            map.entries()[0].field_mask.as_str(),
            "connection_limits.max_questions_per_hour"
        );
    }

    #[test]
    fn test_field_mask_paths_distinct() {
        let map = PathMap::from_pairs(&[
            ("on_premise.0.hosts", "on_premise"),
            ("on_premise.0.port", "on_premise"),
            ("database", "database"),
        ]);
        let paths: Vec<&str> = map.field_mask_paths().iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["on_premise", "database"]);
    }
}
