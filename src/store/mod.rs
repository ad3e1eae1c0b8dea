//! Contracts of the external persistence collaborators, plus the two
//! in-crate implementations (in-memory and directory-backed).
//!
//! Responses are status-coded rather than `Result`-shaped: a non-200 reply
//! is an expected outcome whose `message` is surfaced to the flow author,
//! not a programming error.

pub mod file;
pub mod memory;

pub use file::*;
pub use memory::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An agent bound to a workflow. Carried opaquely; assignment itself is
/// managed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    pub id: String,
}

/// A persisted workflow record as the collaborator returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWorkflow {
    pub id: String,
    pub name: String,
    /// The workflow document: either a JSON object or a pre-encoded JSON
    /// string. Both shapes occur in stored data and both are accepted.
    pub workflow: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateWorkflowRequest {
    pub name: String,
    pub workflow_json: Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    pub workflow_json: Option<Value>,
}

/// Status-coded reply from a persistence call. `200` signals success; any
/// other value is a failure whose `message` is shown to the author.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse<T> {
    pub status: u16,
    pub body: Option<T>,
    pub message: Option<String>,
}

impl<T> StoreResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: 200,
            body: Some(body),
            message: None,
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The persistence collaborator the editing session saves to and loads
/// from.
pub trait WorkflowStore {
    fn create_workflow(&mut self, request: CreateWorkflowRequest) -> StoreResponse<StoredWorkflow>;
    fn update_workflow(&mut self, id: &str, request: UpdateWorkflowRequest) -> StoreResponse<()>;
    fn get_workflow(&mut self, id: &str) -> StoreResponse<StoredWorkflow>;
}

/// Reply of the media upload collaborator, consumed to populate a
/// conversation node's file or image attachment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
