//! Update request assembly.
//!
//! Each resource type implements [`ResourceUpdate`]: it names its path map,
//! schema and API field vocabulary, and knows how to fill its request
//! message from state. [`assemble_update`] drives the common part:
//! compute the mask, return nothing when it is empty, otherwise build the
//! request with every payload field populated from the planned state.
//!
//! Payload fields are populated whether or not they appear in the mask.
//! The API ignores fields outside the mask, and a field inside the mask
//! must carry its new value even when that value is empty.

use tracing::debug;

use crate::error::UpdateError;
use crate::field_mask::{build_field_mask_with_schema, FieldMask};
use crate::path_map::PathMap;
use crate::schema::{Diagnostic, Schema};
use crate::state::ResourceState;
use crate::validation::validate_path_map;

/// A resource type whose in-place updates go through a field mask.
pub trait ResourceUpdate: Send + Sync + 'static {
    /// The API update request message.
    type Request: Clone + Send + Sync + std::fmt::Debug + 'static;

    /// The resource type name, e.g. `yandex_vpc_network`.
    const RESOURCE_TYPE: &'static str;

    /// The attribute-path to mask-path table.
    fn path_map() -> &'static PathMap;

    /// The resource schema.
    fn schema() -> Schema;

    /// Dotted paths of every field the update request can carry.
    fn api_fields() -> &'static [&'static str];

    /// Build the request: identifiers and every payload field from state,
    /// plus `field_mask`.
    fn build_request<S>(state: &S, field_mask: FieldMask) -> Result<Self::Request, UpdateError>
    where
        S: ResourceState + ?Sized;

    /// Check the path map against the schema and API vocabulary.
    fn validate_path_map() -> Vec<Diagnostic> {
        validate_path_map(Self::path_map(), &Self::schema(), Self::api_fields())
    }
}

/// An assembled request together with the mask it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledUpdate<Req> {
    /// The request to send.
    pub request: Req,
    /// The mask attached to `request`.
    pub field_mask: FieldMask,
}

/// Assemble the update request for `R`, or `None` when nothing mapped
/// changed and no API call should be made.
///
/// Changes are detected against `R::schema()`, so reordered sets are not
/// updates.
pub fn assemble_update<R, S>(state: &S) -> Result<Option<AssembledUpdate<R::Request>>, UpdateError>
where
    R: ResourceUpdate,
    S: ResourceState + ?Sized,
{
    let field_mask = build_field_mask_with_schema(state, R::path_map(), &R::schema());
    if field_mask.is_empty() {
        debug!(resource_type = R::RESOURCE_TYPE, "no mapped attribute changed");
        return Ok(None);
    }
    let request = R::build_request(state, field_mask.clone())?;
    Ok(Some(AssembledUpdate {
        request,
        field_mask,
    }))
}
