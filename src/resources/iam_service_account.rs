//! `yandex_iam_service_account`.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::UpdateError;
use crate::field_mask::FieldMask;
use crate::path::AttributePath;
use crate::path_map::PathMap;
use crate::request::ResourceUpdate;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};
use crate::state::{ResourceState, StateReader};

/// `UpdateServiceAccountRequest` of the IAM service account service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateServiceAccountRequest {
    #[prost(string, tag = "1")]
    pub service_account_id: String,
    #[prost(message, optional, tag = "2")]
    pub update_mask: Option<FieldMask>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(map = "string, string", tag = "5")]
    pub labels: HashMap<String, String>,
}

static PATHS: LazyLock<PathMap> = LazyLock::new(|| {
    PathMap::from_pairs(&[
        ("name", "name"),
        ("description", "description"),
        ("labels", "labels"),
    ])
});

const API_FIELDS: &[&str] = &["name", "description", "labels"];

/// The service account resource.
pub struct ServiceAccount;

impl ResourceUpdate for ServiceAccount {
    type Request = UpdateServiceAccountRequest;
    const RESOURCE_TYPE: &'static str = "yandex_iam_service_account";

    fn path_map() -> &'static PathMap {
        &PATHS
    }

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("labels", Attribute::optional_string_map())
            .with_attribute(
                "folder_id",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_force_new(),
            )
            .with_attribute("created_at", Attribute::computed_string())
    }

    fn api_fields() -> &'static [&'static str] {
        API_FIELDS
    }

    fn build_request<S>(state: &S, field_mask: FieldMask) -> Result<Self::Request, UpdateError>
    where
        S: ResourceState + ?Sized,
    {
        Ok(UpdateServiceAccountRequest {
            service_account_id: state.get_string(&AttributePath::parse("id"))?,
            update_mask: Some(field_mask),
            name: state.get_string(&AttributePath::parse("name"))?,
            description: state.get_string(&AttributePath::parse("description"))?,
            labels: state.get_string_map(&AttributePath::parse("labels"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        assert_applied, assert_mask_eq, assert_no_errors, assert_skipped, UpdateTester,
    };
    use serde_json::json;

    #[test]
    fn test_path_map_matches_schema() {
        assert_no_errors(&ServiceAccount::validate_path_map());
    }

    #[tokio::test]
    async fn test_rename() {
        let tester = UpdateTester::<ServiceAccount>::new();
        let outcome = tester
            .update(
                json!({"id": "aje1", "name": "a", "description": "x"}),
                json!({"id": "aje1", "name": "b", "description": "x"}),
            )
            .await
            .unwrap();

        assert_mask_eq(assert_applied(&outcome), &["name"]);
        let request = tester.last_request().unwrap();
        assert_eq!(request.service_account_id, "aje1");
        assert_eq!(request.name, "b");
        assert_eq!(request.description, "x");
        assert_eq!(request.update_mask, Some(FieldMask::from_paths(["name"])));
    }

    #[tokio::test]
    async fn test_clearing_description_sends_empty_value() {
        let tester = UpdateTester::<ServiceAccount>::new();
        let outcome = tester
            .update(
                json!({"id": "aje1", "name": "a", "description": "x"}),
                json!({"id": "aje1", "name": "a", "description": ""}),
            )
            .await
            .unwrap();

        assert_mask_eq(assert_applied(&outcome), &["description"]);
        assert_eq!(tester.last_request().unwrap().description, "");
    }

    #[tokio::test]
    async fn test_no_change_makes_no_call() {
        let tester = UpdateTester::<ServiceAccount>::new();
        let state = json!({
            "id": "aje1",
            "name": "a",
            "description": "x",
            "labels": {"env": "dev"}
        });
        let outcome = tester.update(state.clone(), state).await.unwrap();

        assert_skipped(&outcome);
        assert_eq!(tester.client().call_count(), 0);
    }

    #[tokio::test]
    async fn test_folder_move_is_not_an_update() {
        // folder_id forces replacement; it never reaches an update mask.
        let tester = UpdateTester::<ServiceAccount>::new();
        let outcome = tester
            .update(
                json!({"id": "aje1", "name": "a", "folder_id": "b1g1"}),
                json!({"id": "aje1", "name": "a", "folder_id": "b1g2"}),
            )
            .await
            .unwrap();
        assert_skipped(&outcome);
    }

    #[tokio::test]
    async fn test_labels_removed() {
        let tester = UpdateTester::<ServiceAccount>::new();
        let outcome = tester
            .update(
                json!({"id": "aje1", "name": "a", "labels": {"env": "dev"}}),
                json!({"id": "aje1", "name": "a"}),
            )
            .await
            .unwrap();

        assert_mask_eq(assert_applied(&outcome), &["labels"]);
        assert!(tester.last_request().unwrap().labels.is_empty());
    }
}
