//! Testing utilities for resource updates.
//!
//! This module lets resource implementations exercise their update path
//! without a cloud API: [`RecordingClient`] records every request and can
//! be scripted to fail, and [`UpdateTester`] wires one to an [`Updater`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use yc_update_mask::resources::iam_service_account::ServiceAccount;
//! use yc_update_mask::testing::{assert_mask_eq, UpdateTester};
//!
//! # tokio_test::block_on(async {
//! let tester = UpdateTester::<ServiceAccount>::new();
//! let outcome = tester
//!     .update(
//!         json!({"id": "aje1", "name": "old", "description": "x"}),
//!         json!({"id": "aje1", "name": "new", "description": "x"}),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_mask_eq(outcome.field_mask().unwrap(), &["name"]);
//! assert_eq!(tester.requests().len(), 1);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::client::UpdateClient;
use crate::config::UpdateOptions;
use crate::error::UpdateError;
use crate::field_mask::FieldMask;
use crate::request::ResourceUpdate;
use crate::schema::{Diagnostic, DiagnosticSeverity};
use crate::types::UpdateOutcome;
use crate::updater::Updater;

/// An [`UpdateClient`] that records requests instead of sending them.
pub struct RecordingClient<Req> {
    requests: Mutex<Vec<Req>>,
    failures: Mutex<VecDeque<tonic::Status>>,
    latency: Duration,
}

impl<Req> Default for RecordingClient<Req> {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            latency: Duration::ZERO,
        }
    }
}

impl<Req> RecordingClient<Req> {
    /// Create a client that accepts every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next calls with `statuses`, in order, then succeed.
    pub fn failing_with(statuses: impl IntoIterator<Item = tonic::Status>) -> Self {
        Self {
            failures: Mutex::new(statuses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls received, including failed ones.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<Req: Clone> RecordingClient<Req> {
    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Req> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<Req> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait::async_trait]
impl<Req> UpdateClient<Req> for RecordingClient<Req>
where
    Req: Send + 'static,
{
    async fn update(&self, request: Req) -> Result<(), tonic::Status> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match failure {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

/// A test harness pairing an [`Updater`] with a [`RecordingClient`].
///
/// Retries use a one-millisecond back-off so tests stay fast.
pub struct UpdateTester<R: ResourceUpdate> {
    client: Arc<RecordingClient<R::Request>>,
    updater: Updater<R, Arc<RecordingClient<R::Request>>>,
}

impl<R: ResourceUpdate> UpdateTester<R> {
    /// Create a tester whose client accepts every request.
    pub fn new() -> Self {
        Self::with_client(RecordingClient::new())
    }

    /// Create a tester around a prepared client.
    pub fn with_client(client: RecordingClient<R::Request>) -> Self {
        Self::with_client_and_options(client, fast_options())
    }

    /// Create a tester around a prepared client and options.
    pub fn with_client_and_options(
        client: RecordingClient<R::Request>,
        options: UpdateOptions,
    ) -> Self {
        let client = Arc::new(client);
        let updater = Updater::with_options(Arc::clone(&client), options);
        Self { client, updater }
    }

    /// The underlying updater.
    pub fn updater(&self) -> &Updater<R, Arc<RecordingClient<R::Request>>> {
        &self.updater
    }

    /// The recording client.
    pub fn client(&self) -> &RecordingClient<R::Request> {
        &self.client
    }

    /// Run an update from `prior_state` to `planned_state`.
    pub async fn update(
        &self,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<UpdateOutcome, UpdateError> {
        let state = crate::state::JsonResourceState::new(prior_state, planned_state);
        self.updater.apply(&state).await
    }

    /// Every request the client received.
    pub fn requests(&self) -> Vec<R::Request> {
        self.client.requests()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<R::Request> {
        self.client.last_request()
    }
}

impl<R: ResourceUpdate> Default for UpdateTester<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn fast_options() -> UpdateOptions {
    UpdateOptions::new()
        .with_timeout(Duration::from_secs(5))
        .with_retry_backoff(Duration::from_millis(1))
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that `mask` holds exactly `expected`, in order.
///
/// # Panics
///
/// Panics if the paths differ.
pub fn assert_mask_eq(mask: &FieldMask, expected: &[&str]) {
    let actual: Vec<&str> = mask.iter().collect();
    assert_eq!(
        actual, expected,
        "Expected field mask {:?}, got {:?}",
        expected, actual
    );
}

/// Assert that `mask` names `path`.
///
/// # Panics
///
/// Panics if `path` is missing.
pub fn assert_mask_contains(mask: &FieldMask, path: &str) {
    assert!(
        mask.contains(path),
        "Expected field mask to contain '{}', got {:?}",
        path,
        mask.paths
    );
}

/// Assert that `mask` does not name `path`.
///
/// # Panics
///
/// Panics if `path` is present.
pub fn assert_mask_excludes(mask: &FieldMask, path: &str) {
    assert!(
        !mask.contains(path),
        "Expected field mask to exclude '{}', got {:?}",
        path,
        mask.paths
    );
}

/// Assert that no API call was made.
///
/// # Panics
///
/// Panics if the outcome is [`UpdateOutcome::Applied`].
pub fn assert_skipped(outcome: &UpdateOutcome) {
    assert!(
        !outcome.is_applied(),
        "Expected update to be skipped, but it sent mask {:?}",
        outcome.field_mask().map(|m| &m.paths)
    );
}

/// Assert that an API call was made and return the mask it carried.
///
/// # Panics
///
/// Panics if the outcome is [`UpdateOutcome::Skipped`].
pub fn assert_applied(outcome: &UpdateOutcome) -> &FieldMask {
    match outcome.field_mask() {
        Some(mask) => mask,
        None => panic!("Expected update to be applied, but it was skipped"),
    }
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors
            .iter()
            .map(|d| format!("{} ({:?})", d.summary, d.attribute))
            .collect::<Vec<_>>()
    );
}
