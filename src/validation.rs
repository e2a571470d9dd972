//! Path map validation.
//!
//! Path maps are written by hand. A typo in either column silently turns an
//! update into a no-op: the attribute never matches state, or the API
//! ignores an unknown mask path. This module checks a [`PathMap`] against
//! the resource [`Schema`] and the API's field vocabulary so such mistakes
//! fail tests instead of dropping updates.
//!
//! # Example
//!
//! ```
//! use yc_update_mask::path_map::PathMap;
//! use yc_update_mask::schema::{Attribute, Schema};
//! use yc_update_mask::validation::validate_path_map;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::optional_string())
//!     .with_attribute("description", Attribute::optional_string());
//! let api_fields = ["name", "description", "labels"];
//!
//! let paths = PathMap::from_pairs(&[("name", "name")]);
//! let diagnostics = validate_path_map(&paths, &schema, &api_fields);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("description".to_string()));
//! ```

use std::collections::HashSet;

use crate::path::{AttributePath, FieldMaskPath};
use crate::path_map::PathMap;
use crate::schema::{Diagnostic, Schema};

/// Validate a path map.
///
/// `api_fields` lists the dotted field paths of the update request payload.
/// A mask path is valid when it names one of them or a parent message of
/// one.
///
/// # Validation Rules
///
/// - Attribute paths must be non-empty, without empty segments, and unique
/// - Mask paths must be non-empty, without empty components or indices
/// - Every mask path must exist in the API vocabulary
/// - Every mapped attribute must be mutable in place per the schema
/// - Every mutable attribute in the schema must be mapped
pub fn validate_path_map(
    path_map: &PathMap,
    schema: &Schema,
    api_fields: &[&str],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let api_fields: Vec<FieldMaskPath> =
        api_fields.iter().map(|f| FieldMaskPath::new(*f)).collect();
    let mutable: HashSet<AttributePath> = schema.mutable_attribute_paths().into_iter().collect();

    let mut seen: HashSet<&AttributePath> = HashSet::new();
    for entry in path_map.entries() {
        let attribute = &entry.attribute;
        let attr_name = attribute.to_string();

        if attribute.is_root() || attribute.has_empty_segment() {
            diagnostics.push(
                Diagnostic::error("Malformed attribute path")
                    .with_detail(format!("'{}' has an empty segment", attr_name))
                    .with_attribute(attr_name.clone()),
            );
        }

        if !seen.insert(attribute) {
            diagnostics.push(
                Diagnostic::error(format!("Attribute '{}' is mapped more than once", attr_name))
                    .with_attribute(attr_name.clone()),
            );
        }

        validate_mask_path(&entry.field_mask, &api_fields, &attr_name, &mut diagnostics);

        if !mutable.contains(attribute) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Attribute '{}' is not mutable in place",
                    attr_name
                ))
                .with_detail("The schema has no settable, non force-new attribute at this path")
                .with_attribute(attr_name),
            );
        }
    }

    for attribute in schema.mutable_attribute_paths() {
        if !path_map.contains(&attribute) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Mutable attribute '{}' has no field mask path",
                    attribute
                ))
                .with_detail("Changes to this attribute would never reach the API")
                .with_attribute(attribute.to_string()),
            );
        }
    }

    diagnostics
}

/// Validate a path map, returning Ok if valid or Err with diagnostics.
pub fn validate_path_map_result(
    path_map: &PathMap,
    schema: &Schema,
    api_fields: &[&str],
) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate_path_map(path_map, schema, api_fields);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a path map is valid.
pub fn is_valid(path_map: &PathMap, schema: &Schema, api_fields: &[&str]) -> bool {
    validate_path_map(path_map, schema, api_fields).is_empty()
}

fn validate_mask_path(
    mask: &FieldMaskPath,
    api_fields: &[FieldMaskPath],
    attr_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if mask.has_empty_component() {
        diagnostics.push(
            Diagnostic::error("Malformed field mask path")
                .with_detail(format!("'{}' has an empty component", mask))
                .with_attribute(attr_name),
        );
        return;
    }
    if mask.has_index() {
        diagnostics.push(
            Diagnostic::error("Field mask path contains an index")
                .with_detail(format!(
                    "'{}' addresses a list position; masks address fields",
                    mask
                ))
                .with_attribute(attr_name),
        );
        return;
    }
    if !api_fields.iter().any(|field| mask.covers(field)) {
        diagnostics.push(
            Diagnostic::error(format!("Unknown API field '{}'", mask))
                .with_detail("The update request has no field at this path")
                .with_attribute(attr_name),
        );
    }
}
