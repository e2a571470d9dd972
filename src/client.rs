//! The seam to the cloud API.
//!
//! An [`UpdateClient`] sends one assembled update request and resolves once
//! the resulting long-running operation has finished. Implementations wrap
//! the generated service clients; this crate never talks to the network
//! itself.

use std::sync::Arc;

/// Sends update requests of type `Req`.
///
/// # Example
///
/// ```ignore
/// use yc_update_mask::client::UpdateClient;
/// use yc_update_mask::resources::iam_service_account::UpdateServiceAccountRequest;
///
/// struct IamClient { /* generated gRPC client */ }
///
/// #[async_trait::async_trait]
/// impl UpdateClient<UpdateServiceAccountRequest> for IamClient {
///     async fn update(&self, request: UpdateServiceAccountRequest) -> Result<(), tonic::Status> {
///         let operation = self.service_accounts.update(request).await?;
///         self.operations.wait(operation.into_inner()).await
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait UpdateClient<Req>: Send + Sync + 'static
where
    Req: Send + 'static,
{
    /// Send `request` and wait for the operation to complete.
    async fn update(&self, request: Req) -> Result<(), tonic::Status>;
}

#[async_trait::async_trait]
impl<Req, C> UpdateClient<Req> for Arc<C>
where
    Req: Send + 'static,
    C: UpdateClient<Req> + ?Sized,
{
    async fn update(&self, request: Req) -> Result<(), tonic::Status> {
        (**self).update(request).await
    }
}
