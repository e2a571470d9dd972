//! The per-resource update handler and the registry that dispatches to it.
//!
//! [`Updater`] runs one in-place update: assemble the request, skip the
//! call when the mask is empty, otherwise send it with a timeout and retry
//! transient failures. [`UpdaterRegistry`] holds updaters by resource type
//! name and exposes them through a provider-style `update` callback.
//!
//! Each call works on its own state snapshot, so one updater can serve
//! concurrent updates of independent resources.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::client::UpdateClient;
use crate::config::UpdateOptions;
use crate::error::UpdateError;
use crate::request::{assemble_update, AssembledUpdate, ResourceUpdate};
use crate::schema::Diagnostic;
use crate::state::{JsonResourceState, ResourceState};
use crate::types::UpdateOutcome;

/// Type-erased update handler for one resource type.
#[async_trait::async_trait]
pub trait ResourceUpdater: Send + Sync {
    /// The resource type this updater handles.
    fn resource_type(&self) -> &'static str;

    /// Validate the resource's path map.
    fn validate(&self) -> Vec<Diagnostic>;

    /// Apply the difference between `prior_state` and `planned_state`.
    async fn update(
        &self,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<UpdateOutcome, UpdateError>;
}

/// Update handler for resource type `R` sending through client `C`.
pub struct Updater<R, C> {
    client: C,
    options: UpdateOptions,
    _resource: PhantomData<fn() -> R>,
}

impl<R, C> Updater<R, C>
where
    R: ResourceUpdate,
    C: UpdateClient<R::Request>,
{
    /// Create an updater with default options.
    pub fn new(client: C) -> Self {
        Self::with_options(client, UpdateOptions::default())
    }

    /// Create an updater with custom options.
    pub fn with_options(client: C, options: UpdateOptions) -> Self {
        Self {
            client,
            options,
            _resource: PhantomData,
        }
    }

    /// The client used to send requests.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The options in effect.
    pub fn options(&self) -> &UpdateOptions {
        &self.options
    }

    /// Assemble and send the update for `state`.
    ///
    /// Returns [`UpdateOutcome::Skipped`] without calling the client when no
    /// mapped attribute changed.
    #[instrument(skip(self, state), fields(resource_type = R::RESOURCE_TYPE))]
    pub async fn apply<S>(&self, state: &S) -> Result<UpdateOutcome, UpdateError>
    where
        S: ResourceState + Sync + ?Sized,
    {
        let Some(AssembledUpdate {
            request,
            field_mask,
        }) = assemble_update::<R, S>(state)?
        else {
            info!("No changes to apply, skipping update call");
            return Ok(UpdateOutcome::Skipped);
        };
        info!(update_mask = ?field_mask.paths, "Sending update request");
        self.send(request).await?;
        info!("Update completed");
        Ok(UpdateOutcome::Applied { field_mask })
    }

    async fn send(&self, request: R::Request) -> Result<(), UpdateError> {
        let mut attempt = 0u32;
        loop {
            let call = self.client.update(request.clone());
            let result = match tokio::time::timeout(self.options.timeout, call).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(status)) => UpdateError::from(status),
                Err(_) => UpdateError::DeadlineExceeded(format!(
                    "update did not complete within {:?}",
                    self.options.timeout
                )),
            };

            if !result.is_retryable() || attempt >= self.options.max_retries {
                error!(error = %result, attempts = attempt + 1, "Update failed");
                return Err(result);
            }
            attempt += 1;
            let delay = self.options.backoff_for(attempt);
            warn!(error = %result, attempt, delay = ?delay, "Transient update failure, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl<R, C> ResourceUpdater for Updater<R, C>
where
    R: ResourceUpdate,
    C: UpdateClient<R::Request>,
{
    fn resource_type(&self) -> &'static str {
        R::RESOURCE_TYPE
    }

    fn validate(&self) -> Vec<Diagnostic> {
        R::validate_path_map()
    }

    async fn update(
        &self,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<UpdateOutcome, UpdateError> {
        let state = JsonResourceState::new(prior_state, planned_state);
        self.apply(&state).await
    }
}

/// Updaters keyed by resource type name.
#[derive(Clone, Default)]
pub struct UpdaterRegistry {
    updaters: BTreeMap<&'static str, Arc<dyn ResourceUpdater>>,
}

impl UpdaterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an updater under its resource type, replacing any previous
    /// one.
    pub fn with_updater<U: ResourceUpdater + 'static>(mut self, updater: U) -> Self {
        self.register(Arc::new(updater));
        self
    }

    /// Register a shared updater.
    pub fn register(&mut self, updater: Arc<dyn ResourceUpdater>) {
        self.updaters.insert(updater.resource_type(), updater);
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.updaters.keys().copied().collect()
    }

    /// Validate every registered path map. Diagnostics carry the resource
    /// type in their summary.
    pub fn validate(&self) -> Vec<Diagnostic> {
        self.updaters
            .iter()
            .flat_map(|(resource_type, updater)| {
                updater.validate().into_iter().map(move |mut d| {
                    d.summary = format!("{}: {}", resource_type, d.summary);
                    d
                })
            })
            .collect()
    }

    /// Update a resource, returning the state to record.
    ///
    /// On success the planned state becomes the new state whether or not an
    /// API call was needed.
    #[instrument(skip(self, prior_state, planned_state))]
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, UpdateError> {
        let updater = self
            .updaters
            .get(resource_type)
            .ok_or_else(|| UpdateError::UnknownResource(resource_type.to_string()))?;
        updater
            .update(prior_state, planned_state.clone())
            .await
            .map(|_| planned_state)
    }

    /// Like [`update`](Self::update), but reports what was done.
    pub async fn update_with_outcome(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<UpdateOutcome, UpdateError> {
        let updater = self
            .updaters
            .get(resource_type)
            .ok_or_else(|| UpdateError::UnknownResource(resource_type.to_string()))?;
        updater.update(prior_state, planned_state).await
    }
}

impl std::fmt::Debug for UpdaterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdaterRegistry")
            .field("resource_types", &self.resource_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::resources::datatransfer_endpoint::UpdateEndpointRequest;
    use crate::resources::iam_service_account::{ServiceAccount, UpdateServiceAccountRequest};
    use crate::resources::mdb_mysql_user::UpdateUserRequest;
    use crate::resources::{registry, ResourceClients};
    use crate::testing::{assert_applied, assert_mask_eq, RecordingClient, UpdateTester};
    use serde_json::json;

    fn renamed() -> (Value, Value) {
        (
            json!({"id": "aje1", "name": "old"}),
            json!({"id": "aje1", "name": "new"}),
        )
    }

    fn shipped_registry() -> UpdaterRegistry {
        registry(
            ResourceClients {
                service_accounts: RecordingClient::<UpdateServiceAccountRequest>::new(),
                mysql_users: RecordingClient::<UpdateUserRequest>::new(),
                transfer_endpoints: RecordingClient::<UpdateEndpointRequest>::new(),
            },
            UpdateOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let tester = UpdateTester::<ServiceAccount>::with_client(RecordingClient::failing_with([
            tonic::Status::unavailable("connection reset"),
        ]));
        let (prior, planned) = renamed();

        let outcome = tester.update(prior, planned).await.unwrap();
        assert_mask_eq(assert_applied(&outcome), &["name"]);
        assert_eq!(tester.client().call_count(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let tester = UpdateTester::<ServiceAccount>::with_client(RecordingClient::failing_with([
            tonic::Status::invalid_argument("name is too long"),
        ]));
        let (prior, planned) = renamed();

        let err = tester.update(prior, planned).await.unwrap_err();
        assert!(matches!(err, UpdateError::InvalidRequest(_)));
        assert_eq!(tester.client().call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let client = RecordingClient::failing_with(
            (0..5).map(|_| tonic::Status::resource_exhausted("quota")),
        );
        let options = UpdateOptions::new()
            .with_max_retries(2)
            .with_retry_backoff(Duration::from_millis(1));
        let tester = UpdateTester::<ServiceAccount>::with_client_and_options(client, options);
        let (prior, planned) = renamed();

        let err = tester.update(prior, planned).await.unwrap_err();
        assert!(matches!(err, UpdateError::ResourceExhausted(_)));
        assert_eq!(tester.client().call_count(), 3);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let client = RecordingClient::new().with_latency(Duration::from_millis(200));
        let options = UpdateOptions::new()
            .with_timeout(Duration::from_millis(10))
            .with_max_retries(0);
        let tester = UpdateTester::<ServiceAccount>::with_client_and_options(client, options);
        let (prior, planned) = renamed();

        let err = tester.update(prior, planned).await.unwrap_err();
        assert!(matches!(err, UpdateError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn test_registry_returns_planned_state() {
        let client = Arc::new(RecordingClient::<UpdateServiceAccountRequest>::new());
        let registry = UpdaterRegistry::new()
            .with_updater(Updater::<ServiceAccount, _>::new(Arc::clone(&client)));
        let (prior, planned) = renamed();

        let state = registry
            .update("yandex_iam_service_account", prior, planned.clone())
            .await
            .unwrap();
        assert_eq!(state, planned);
        assert_eq!(client.last_request().unwrap().name, "new");
    }

    #[tokio::test]
    async fn test_registry_reports_skipped_update() {
        let registry = shipped_registry();
        let state = json!({"cluster_id": "c9q1", "name": "app", "password": "p"});

        let outcome = registry
            .update_with_outcome("yandex_mdb_mysql_user", state.clone(), state)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_registry_unknown_resource() {
        let (prior, planned) = renamed();
        let err = shipped_registry()
            .update("yandex_vpc_network", prior, planned)
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::UnknownResource(ref t) if t == "yandex_vpc_network"));
    }

    #[test]
    fn test_shipped_resources_validate() {
        let registry = shipped_registry();
        assert_eq!(
            registry.resource_types(),
            vec![
                "yandex_datatransfer_endpoint",
                "yandex_iam_service_account",
                "yandex_mdb_mysql_user",
            ]
        );
        assert!(registry.validate().is_empty(), "{:?}", registry.validate());
    }

    #[tokio::test]
    async fn test_concurrent_updates_share_one_updater() {
        let client = Arc::new(RecordingClient::<UpdateServiceAccountRequest>::new());
        let updater: Arc<dyn ResourceUpdater> =
            Arc::new(Updater::<ServiceAccount, _>::new(Arc::clone(&client)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let updater = Arc::clone(&updater);
                tokio::spawn(async move {
                    updater
                        .update(
                            json!({"id": format!("aje{i}"), "name": "old"}),
                            json!({"id": format!("aje{i}"), "name": format!("sa-{i}")}),
                        )
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_applied());
        }

        let mut ids: Vec<String> = client
            .requests()
            .into_iter()
            .map(|r| r.service_account_id)
            .collect();
        ids.sort();
        assert_eq!(ids.len(), 8);
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
