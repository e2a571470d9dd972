//! Field masks and the field-mask builder.
//!
//! A [`FieldMask`] lists the API fields an update request overwrites.
//! Fields absent from the mask keep their server-side values; fields named
//! in it are overwritten with whatever the request carries, zero values
//! included. That is why the mask and the request payload are always built
//! from the same state snapshot.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use yc_update_mask::field_mask::build_field_mask;
//! use yc_update_mask::path_map::PathMap;
//! use yc_update_mask::state::JsonResourceState;
//!
//! let paths = PathMap::from_pairs(&[("name", "name"), ("description", "description")]);
//! let state = JsonResourceState::new(
//!     json!({"name": "a", "description": "x"}),
//!     json!({"name": "b", "description": "x"}),
//! );
//!
//! let mask = build_field_mask(&state, &paths);
//! assert_eq!(mask.paths, vec!["name".to_string()]);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::path::AttributePath;
use crate::path_map::PathMap;
use crate::schema::Schema;
use crate::state::{detect_change, detect_change_with_schema, ResourceState};

/// A set of symbolic field paths, wire-compatible with
/// `google.protobuf.FieldMask`.
///
/// In JSON the mask is a single comma-separated string.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct FieldMask {
    /// The field mask paths, in insertion order.
    #[prost(string, repeated, tag = "1")]
    pub paths: Vec<String>,
}

impl FieldMask {
    /// Create a mask from paths, dropping duplicates.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut mask = Self::default();
        for path in paths {
            mask.push(path);
        }
        mask
    }

    /// Append `path` unless it is already present. Returns whether it was
    /// added.
    pub fn push(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Whether `path` is in the mask.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the mask names no fields.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate the paths.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl Serialize for FieldMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.paths.join(","))
    }
}

impl<'de> Deserialize<'de> for FieldMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(Self::from_paths(joined.split(',').filter(|path| !path.is_empty())))
    }
}

/// Compute the mask of API fields whose mapped attribute changed.
///
/// Entries are visited in declaration order, so the result is
/// deterministic. A mask path shared by several changed attributes appears
/// once. The result is never longer than `path_map`.
///
/// Without a schema every array is compared in order; resources with set
/// attributes go through [`build_field_mask_with_schema`].
pub fn build_field_mask<S>(state: &S, path_map: &PathMap) -> FieldMask
where
    S: ResourceState + ?Sized,
{
    collect_mask(path_map, |path| detect_change(state, path).is_some())
}

/// Like [`build_field_mask`], comparing values the way `schema` types them,
/// so reordering the members of a set is not a change.
pub fn build_field_mask_with_schema<S>(state: &S, path_map: &PathMap, schema: &Schema) -> FieldMask
where
    S: ResourceState + ?Sized,
{
    collect_mask(path_map, |path| detect_change_with_schema(state, path, schema).is_some())
}

fn collect_mask(path_map: &PathMap, mut changed: impl FnMut(&AttributePath) -> bool) -> FieldMask {
    let mut mask = FieldMask::default();
    for entry in path_map.entries() {
        if changed(&entry.attribute) {
            mask.push(entry.field_mask.as_str());
        }
    }
    debug!(paths = ?mask.paths, "built field mask");
    mask
}
