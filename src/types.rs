//! Convenience types shared by the change detector and the update handler.


use crate::field_mask::FieldMask;
use crate::path::AttributePath;

/// A change to a single attribute between prior and planned state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: AttributePath,
    /// The prior value (None if it was unset).
    pub before: Option<serde_json::Value>,
    /// The planned value (None if it is being unset).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<AttributePath>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a newly set attribute.
    pub fn added(path: impl Into<AttributePath>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for an attribute that is being unset.
    pub fn removed(path: impl Into<AttributePath>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<AttributePath>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    /// The planned value, or `null` when the attribute is being unset.
    pub fn new_value(&self) -> serde_json::Value {
        self.after.clone().unwrap_or(serde_json::Value::Null)
    }
}

/// What the update handler did for one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// No mapped attribute changed; no API call was made.
    Skipped,
    /// An update request carrying this mask was accepted by the API.
    Applied {
        /// The field mask that was sent.
        field_mask: FieldMask,
    },
}

impl UpdateOutcome {
    /// Whether an API call was made.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The mask that was sent, if any.
    pub fn field_mask(&self) -> Option<&FieldMask> {
        match self {
            Self::Skipped => None,
            Self::Applied { field_mask } => Some(field_mask),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("test"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("test")));

        let removed = AttributeChange::removed("description", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert_eq!(removed.new_value(), serde_json::Value::Null);

        let modified = AttributeChange::modified(
            "connection_limits.0.max_user_connections",
            json!(1),
            json!(2),
        );
        assert_eq!(
            modified.path.to_string(),
            "connection_limits.0.max_user_connections"
        );
        assert_eq!(modified.new_value(), json!(2));
    }

    #[test]
    fn test_update_outcome() {
        assert!(!UpdateOutcome::Skipped.is_applied());
        assert!(UpdateOutcome::Skipped.field_mask().is_none());

        let applied = UpdateOutcome::Applied {
            field_mask: FieldMask::from_paths(["name"]),
        };
        assert!(applied.is_applied());
        assert_eq!(applied.field_mask().map(FieldMask::len), Some(1));
    }
}
