//! Implementation status tracking for approved change requests.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KnowlexError, Result};

/// Where a change request stands on its way into the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl ImplStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplStatus::Pending => "pending",
            ImplStatus::InProgress => "in_progress",
            ImplStatus::Completed => "completed",
            ImplStatus::Blocked => "blocked",
        }
    }

    /// The transition table is a hard invariant: `completed` is terminal
    /// and nothing skips straight from `pending` to `completed`.
    pub fn can_transition_to(&self, to: ImplStatus) -> bool {
        matches!(
            (self, to),
            (ImplStatus::Pending, ImplStatus::InProgress)
                | (ImplStatus::Pending, ImplStatus::Blocked)
                | (ImplStatus::InProgress, ImplStatus::Completed)
                | (ImplStatus::InProgress, ImplStatus::Blocked)
                | (ImplStatus::Blocked, ImplStatus::InProgress)
        )
    }
}

impl fmt::Display for ImplStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed change to the knowledge base, tracked through review and
/// implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: String,
    /// Review status ("approved" gates automatic implementation checks)
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_state: Option<Value>,
    pub implementation_status: ImplStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub implementation_notes: String,
}

impl ChangeRequest {
    pub fn new(status: &str, proposed_state: Option<Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: status.to_string(),
            proposed_state,
            implementation_status: ImplStatus::Pending,
            implementation_notes: String::new(),
        }
    }
}

/// Persistence boundary for change requests. The real store lives in
/// another service; this crate ships an in-memory one.
#[async_trait]
pub trait ChangeRequestStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<ChangeRequest>;
    async fn put(&self, request: ChangeRequest) -> Result<()>;
}

/// Evidence source answering "does the codebase implement this rule?".
/// Returns a confidence in [0, 1].
#[async_trait]
pub trait ImplementationDetector: Send + Sync {
    async fn detect(&self, request: &ChangeRequest, codebase_path: &Path) -> Result<f64>;
}

const AUTO_COMPLETE_THRESHOLD: f64 = 0.7;

/// Drives the implementation-status state machine over a store.
pub struct ImplementationTracker<S, D> {
    store: S,
    detector: D,
}

impl<S, D> ImplementationTracker<S, D>
where
    S: ChangeRequestStore,
    D: ImplementationDetector,
{
    pub fn new(store: S, detector: D) -> Self {
        Self { store, detector }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Move a change request to `status`. Invalid transitions are
    /// rejected and the stored state is left untouched.
    pub async fn update_status(
        &self,
        change_request_id: &str,
        status: ImplStatus,
        notes: &str,
    ) -> Result<()> {
        let mut request = self.store.get(change_request_id).await?;
        if !request.implementation_status.can_transition_to(status) {
            return Err(KnowlexError::InvalidTransition {
                from: request.implementation_status.to_string(),
                to: status.to_string(),
            });
        }
        request.implementation_status = status;
        request.implementation_notes = notes.to_string();
        self.store.put(request).await?;
        log::info!(
            "updated implementation status for change request {} to {}",
            change_request_id,
            status
        );
        Ok(())
    }

    /// Check whether an approved change request has been implemented.
    ///
    /// Detector confidence above 0.7 moves the request to `Completed`
    /// with an auto-generated note; anything lower returns the current
    /// status unchanged. A non-approved request is an error, not a no-op.
    pub async fn check_implementation(
        &self,
        change_request_id: &str,
        codebase_path: &Path,
    ) -> Result<ImplStatus> {
        if change_request_id.is_empty() {
            return Err(KnowlexError::Validation {
                field: "change_request_id",
                message: "change request ID cannot be empty".to_string(),
            });
        }

        let request = self.store.get(change_request_id).await?;
        if request.status != "approved" {
            return Err(KnowlexError::Validation {
                field: "status",
                message: "change request is not approved".to_string(),
            });
        }

        let confidence = self.detector.detect(&request, codebase_path).await?;
        if confidence > AUTO_COMPLETE_THRESHOLD {
            self.update_status(
                change_request_id,
                ImplStatus::Completed,
                &format!(
                    "Auto-detected as implemented (confidence: {:.2}%)",
                    confidence * 100.0
                ),
            )
            .await?;
            return Ok(ImplStatus::Completed);
        }

        Ok(request.implementation_status)
    }
}

/// Mutex-guarded map store for tests and the CLI.
#[derive(Default)]
pub struct InMemoryStore {
    requests: Mutex<HashMap<String, ChangeRequest>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeRequestStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<ChangeRequest> {
        self.requests
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| KnowlexError::ChangeRequestNotFound(id.to_string()))
    }

    async fn put(&self, request: ChangeRequest) -> Result<()> {
        self.requests
            .lock()
            .unwrap()
            .insert(request.id.clone(), request);
        Ok(())
    }
}
