use super::{Edge, Node, NodeKind};
use crate::error::ConnectionRejection;
use ahash::AHashMap;
use tracing::debug;

/// Checks whether an edge from `source` to `target` is structurally legal.
///
/// The rules are evaluated in order and the first failing rule wins; the
/// returned rejection carries the user-facing reason. Acceptance is the
/// default: anything not explicitly forbidden connects.
pub fn validate_connection(source: &Node, target: &Node) -> Result<(), ConnectionRejection> {
    // Rule 1: a trigger feeds only the designated entry conversation.
    if source.kind() == NodeKind::Trigger
        && !(target.kind() == NodeKind::Conversation && target.data.initial_message())
    {
        return Err(ConnectionRejection::TriggerRequiresEntryConversation);
    }

    // Rule 2: the entry conversation accepts only trigger-sourced edges.
    if target.kind() == NodeKind::Conversation
        && target.data.initial_message()
        && source.kind() != NodeKind::Trigger
    {
        return Err(ConnectionRejection::EntryConversationRequiresTrigger);
    }

    // Rule 3: nothing happens between two consecutive captures.
    if source.kind() == NodeKind::CaptureResponse && target.kind() == NodeKind::CaptureResponse {
        return Err(ConnectionRejection::ConsecutiveCaptureNodes);
    }

    // Rules 4 and 5: terminal kinds have no outgoing edges.
    if source.kind() == NodeKind::TurnOffAgent {
        return Err(ConnectionRejection::TerminalSource(NodeKind::TurnOffAgent));
    }
    if source.kind() == NodeKind::HandoverToHuman {
        return Err(ConnectionRejection::TerminalSource(
            NodeKind::HandoverToHuman,
        ));
    }

    Ok(())
}

/// Drops every edge that no longer passes [`validate_connection`] against
/// the current node set, or whose endpoints no longer exist. Returns how
/// many edges were removed.
pub fn retain_valid_edges(nodes: &[Node], edges: &mut Vec<Edge>) -> usize {
    let by_id: AHashMap<&str, &Node> = nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    let before = edges.len();
    edges.retain(|edge| {
        let (Some(source), Some(target)) = (
            by_id.get(edge.source.as_str()).copied(),
            by_id.get(edge.target.as_str()).copied(),
        ) else {
            debug!(edge = %edge.id, "dropping edge with missing endpoint");
            return false;
        };
        match validate_connection(source, target) {
            Ok(()) => true,
            Err(rejection) => {
                debug!(edge = %edge.id, %rejection, "dropping invalid edge");
                false
            }
        }
    });
    before - edges.len()
}
