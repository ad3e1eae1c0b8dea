use crate::graph::NodeKind;
use thiserror::Error;

/// Reasons the connection validator refuses a proposed edge.
///
/// A rejection is an expected, user-facing outcome, not a fault: the
/// `Display` text of each variant is the message shown to the flow author.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    #[error("a trigger can only connect to the conversation marked as the initial message")]
    TriggerRequiresEntryConversation,

    #[error("the initial conversation only accepts connections from a trigger")]
    EntryConversationRequiresTrigger,

    #[error("two capture-response nodes cannot be connected to each other")]
    ConsecutiveCaptureNodes,

    #[error("'{0}' nodes end the flow and cannot have outgoing connections")]
    TerminalSource(NodeKind),
}

/// Errors produced by editing operations on a [`FlowSession`](crate::session::FlowSession).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("a flow must start with a conversation, trigger or AI node, not '{kind}'")]
    InvalidFirstNode { kind: NodeKind },

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("update for node '{node_id}' carries '{found}' data, but the node is a '{expected}'")]
    KindMismatch {
        node_id: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error(transparent)]
    Rejected(#[from] ConnectionRejection),

    #[error("no connection is waiting for a condition label")]
    NoPendingConnection,

    #[error("a condition label cannot be empty")]
    EmptyConditionLabel,

    #[error("node '{node_id}' cannot hold an uploaded file or image")]
    UnsupportedMedia { node_id: String },

    #[error("{message}")]
    Upload { message: String },

    #[error("{message}")]
    Store { status: u16, message: String },

    #[error("failed to encode workflow: {0}")]
    Encode(String),

    #[error("failed to decode workflow: {0}")]
    Decode(String),
}

/// Errors raised while decoding a persisted workflow document.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to parse workflow JSON: {0}")]
    JsonParse(String),

    #[error("workflow JSON has an unrecognized shape: {0}")]
    UnrecognizedShape(String),
}
