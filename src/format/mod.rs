//! Bidirectional mapping between persisted workflow documents and the
//! in-editor graph.
//!
//! Two encodings exist on the wire. The *full* encoding mirrors the editor
//! shape exactly (`{id, type, position, data}` nodes, id-referenced edges)
//! and the *minimal* encoding is the compact, name-keyed form used for
//! hand-authored templates. Both must stay parseable indefinitely; the
//! encoding of a document is auto-detected at load time and anything
//! unrecognized is treated as full.

pub mod minimal;

pub use minimal::*;

use crate::error::FormatError;
use crate::graph::{Edge, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The detected encoding of a persisted workflow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowFormat {
    Full,
    Minimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FullWorkflow {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

/// Sniffs which encoding a document uses.
///
/// A document whose nodes all carry `id`, `type`, `position` and `data` is
/// full; one whose nodes carry a `type` but lack that structure is minimal.
/// Everything else is treated as full and left to the parser to accept or
/// reject.
pub fn detect_format(document: &Value) -> WorkflowFormat {
    let Some(nodes) = document.get("nodes").and_then(Value::as_array) else {
        return WorkflowFormat::Full;
    };
    if nodes.is_empty() {
        return WorkflowFormat::Full;
    }
    let is_full = nodes.iter().all(|node| {
        node.get("id").is_some()
            && node.get("type").is_some()
            && node.get("position").is_some()
            && node.get("data").is_some()
    });
    if is_full {
        return WorkflowFormat::Full;
    }
    if nodes.iter().all(|node| node.get("type").is_some()) {
        return WorkflowFormat::Minimal;
    }
    WorkflowFormat::Full
}

/// Decodes a persisted workflow document into editor nodes and edges,
/// auto-detecting the encoding. Full documents pass through unchanged
/// except that edge labels are re-derived from their condition payload.
pub fn decode_workflow(document: &Value) -> Result<(Vec<Node>, Vec<Edge>), FormatError> {
    match detect_format(document) {
        WorkflowFormat::Full => {
            let full: FullWorkflow = serde_json::from_value(document.clone())
                .map_err(|err| FormatError::JsonParse(err.to_string()))?;
            let mut edges = full.edges;
            for edge in &mut edges {
                edge.sync_label();
            }
            Ok((full.nodes, edges))
        }
        WorkflowFormat::Minimal => {
            let minimal: MinimalWorkflow = serde_json::from_value(document.clone())
                .map_err(|err| FormatError::JsonParse(err.to_string()))?;
            from_minimal(&minimal)
        }
    }
}

/// Encodes a graph as a full-format document, the encoding used when the
/// editor persists a workflow.
pub fn encode_full(nodes: &[Node], edges: &[Edge]) -> Result<Value, FormatError> {
    serde_json::to_value(FullWorkflow {
        nodes: nodes.to_vec(),
        edges: edges.to_vec(),
    })
    .map_err(|err| FormatError::JsonParse(err.to_string()))
}

/// Encodes a graph as a minimal-format document, as used for templates.
pub fn encode_minimal(nodes: &[Node], edges: &[Edge]) -> Result<Value, FormatError> {
    let minimal = to_minimal(nodes, edges)?;
    serde_json::to_value(minimal).map_err(|err| FormatError::JsonParse(err.to_string()))
}
