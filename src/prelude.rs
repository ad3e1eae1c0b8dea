//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and functions of the crate so
//! embedders can pull in the core surface with a single `use`.

// Graph data model and connection rules
pub use crate::graph::*;

// Format transformers
pub use crate::format::{
    MinimalEdge, MinimalNode, MinimalWorkflow, WorkflowFormat, decode_workflow, detect_format,
    encode_full, encode_minimal, from_minimal, grid_position, to_minimal,
};

// Editing session and collaborators
pub use crate::session::{
    ConnectOutcome, FlowSession, Notifier, NoticeLevel, PendingConnection, SaveTicket,
    TracingNotifier, collect_variables, extract_placeholders, unknown_references,
};

// Persistence
pub use crate::store::{
    AgentRef, CreateWorkflowRequest, JsonFileStore, MemoryStore, StoreResponse, StoredWorkflow,
    UpdateWorkflowRequest, UploadResult, WorkflowStore,
};

// Error types
pub use crate::error::{ConnectionRejection, FormatError, SessionError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
