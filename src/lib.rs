//! Field-mask updates for Yandex Cloud resources.
//!
//! Yandex Cloud update RPCs take a full request message plus an
//! `update_mask` naming the fields to overwrite. This crate turns the
//! difference between a resource's prior and planned state into that mask
//! and the matching request, and sends it only when something changed.
//!
//! # Overview
//!
//! - **Path maps**: a per-resource table from state attribute paths to
//!   API field-mask paths ([`PathMap`])
//! - **Change detection**: comparing prior and planned values at a path
//!   ([`detect_change`])
//! - **Field-mask building**: the deduplicated, ordered mask of changed
//!   fields ([`build_field_mask`])
//! - **Request assembly**: the request message carrying that mask, or
//!   nothing when no mapped attribute changed ([`assemble_update`])
//! - **Updaters**: timeouts, retries and dispatch by resource type
//!   ([`Updater`], [`UpdaterRegistry`])
//! - **Validation**: checking path maps against resource schemas
//!   ([`validation`])
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use yc_update_mask::resources::iam_service_account::ServiceAccount;
//! use yc_update_mask::{assemble_update, JsonResourceState};
//!
//! let state = JsonResourceState::new(
//!     json!({"id": "aje1", "name": "builder", "labels": {"env": "dev"}}),
//!     json!({"id": "aje1", "name": "builder", "labels": {"env": "prod"}}),
//! );
//!
//! let update = assemble_update::<ServiceAccount, _>(&state)?.expect("labels changed");
//! assert_eq!(update.field_mask.paths, vec!["labels"]);
//! assert_eq!(update.request.service_account_id, "aje1");
//! # Ok::<(), yc_update_mask::UpdateError>(())
//! ```
//!
//! # Sending updates
//!
//! Implement [`UpdateClient`] over the generated gRPC client for each
//! service and register the shipped resources:
//!
//! ```ignore
//! use yc_update_mask::resources::{registry, ResourceClients};
//! use yc_update_mask::UpdateOptions;
//!
//! let registry = registry(
//!     ResourceClients {
//!         service_accounts: iam_client,
//!         mysql_users: mysql_client,
//!         transfer_endpoints: transfer_client,
//!     },
//!     UpdateOptions::default(),
//! );
//! let new_state = registry
//!     .update("yandex_iam_service_account", prior_state, planned_state)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod field_mask;
pub mod logging;
pub mod path;
pub mod path_map;
pub mod request;
#[allow(missing_docs)]
pub mod resources;
pub mod schema;
pub mod state;
pub mod testing;
pub mod types;
pub mod updater;
pub mod validation;

pub use client::UpdateClient;
pub use config::UpdateOptions;
pub use error::UpdateError;
pub use field_mask::{build_field_mask, build_field_mask_with_schema, FieldMask};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use path::{AttributePath, FieldMaskPath, PathSegment};
pub use path_map::{PathMap, PathMapEntry};
pub use request::{assemble_update, AssembledUpdate, ResourceUpdate};
pub use schema::{
    Attribute, AttributeType, Block, Diagnostic, DiagnosticSeverity, NestedBlock, Schema,
    SchemaNode,
};
pub use state::{
    detect_change, detect_change_with_schema, values_equal, JsonResourceState, ResourceState,
    StateReader,
};
pub use types::{AttributeChange, UpdateOutcome};
pub use updater::{ResourceUpdater, Updater, UpdaterRegistry};
pub use validation::{is_valid, validate_path_map, validate_path_map_result};

// Re-export commonly used dependencies
pub use async_trait::async_trait;
pub use prost;
pub use serde_json;
pub use tonic;
pub use tracing;
