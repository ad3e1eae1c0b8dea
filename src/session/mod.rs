//! The stateful controller behind the flow editor.
//!
//! A [`FlowSession`] owns the current node and edge collections, applies
//! edits, keeps the structural invariants (single entry conversation,
//! edge legality, orphan-free deletion), and talks to the persistence and
//! notification collaborators. All mutations are synchronous and leave
//! the collections in a consistent state before returning.

pub mod notify;
pub mod variables;

pub use notify::*;
pub use variables::*;

use crate::error::SessionError;
use crate::format;
use crate::graph::{
    DataPatch, Edge, EdgeData, Node, NodeData, NodeKind, Position, retain_valid_edges,
    validate_connection,
};
use crate::store::{
    AgentRef, CreateWorkflowRequest, StoreResponse, StoredWorkflow, UpdateWorkflowRequest,
    UploadResult, WorkflowStore,
};
use itertools::Itertools;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Node kinds a flow may start from when the canvas is still empty.
const FIRST_NODE_KINDS: [NodeKind; 3] = [NodeKind::Conversation, NodeKind::Trigger, NodeKind::Ai];

const INVALID_EDGES_REMOVED: &str = "invalid connections were removed";

/// An AI-sourced connection waiting for its free-text condition label.
///
/// AI branches are natural-language conditions rather than fixed status
/// codes, so edge creation pauses until the author supplies the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConnection {
    pub source_id: String,
    pub target_id: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

/// What a [`FlowSession::connect`] call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The edge was created; carries its id.
    Connected(String),
    /// The connection is held pending a condition label.
    Pending,
}

/// A prepared save: the encoded document plus the generation number used
/// to discard stale acknowledgements.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub generation: u64,
    pub name: String,
    pub document: Value,
}

/// The graph editing session. Generic over the persistence store and the
/// notification surface so embeddings and tests plug in their own.
pub struct FlowSession<S, N> {
    workflow_id: Option<String>,
    name: String,
    agent: Option<AgentRef>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    global_variables: BTreeSet<String>,
    pending: Option<PendingConnection>,
    node_seq: u64,
    edge_seq: u64,
    save_generation: u64,
    acked_generation: u64,
    store: S,
    notifier: N,
}

impl<S: WorkflowStore, N: Notifier> FlowSession<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            workflow_id: None,
            name: String::new(),
            agent: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            global_variables: BTreeSet::new(),
            pending: None,
            node_seq: 0,
            edge_seq: 0,
            save_generation: 0,
            acked_generation: 0,
            store,
            notifier,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn global_variables(&self) -> &BTreeSet<String> {
        &self.global_variables
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn agent(&self) -> Option<&AgentRef> {
        self.agent.as_ref()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Adds a node of `kind` at `position` with its default payload and
    /// returns its id.
    ///
    /// On an empty canvas only entry-capable kinds (conversation, trigger,
    /// AI) are accepted. The first conversation node added while no other
    /// node claims the entry message becomes the implicit entry.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> Result<String, SessionError> {
        if self.nodes.is_empty() && !FIRST_NODE_KINDS.contains(&kind) {
            let err = SessionError::InvalidFirstNode { kind };
            self.notifier.notify(NoticeLevel::Error, &err.to_string());
            return Err(err);
        }

        let id = loop {
            self.node_seq += 1;
            let candidate = format!("{}-{}", kind, self.node_seq);
            if self.node(&candidate).is_none() {
                break candidate;
            }
        };

        let mut node = Node::new(id.clone(), kind, position);
        if let NodeData::Conversation(data) = &mut node.data {
            data.initial_message = !self.nodes.iter().any(|other| other.data.initial_message());
        }
        self.nodes.push(node);
        self.refresh_variables();
        Ok(id)
    }

    /// Shallow-merges `patch` into the node's payload and restores every
    /// invariant that may have broken: the single entry message, edge
    /// legality (violations are pruned with a notice), and the derived
    /// variable set.
    pub fn update_node(&mut self, id: &str, patch: DataPatch) -> Result<(), SessionError> {
        let Some(index) = self.index_of(id) else {
            return Err(SessionError::NodeNotFound(id.to_string()));
        };

        self.nodes[index]
            .data
            .merge(patch)
            .map_err(|mismatch| SessionError::KindMismatch {
                node_id: id.to_string(),
                expected: mismatch.expected,
                found: mismatch.found,
            })?;

        if self.nodes[index].data.initial_message() {
            let claimed = self.nodes[index].id.clone();
            for other in &mut self.nodes {
                if other.id != claimed {
                    other.data.clear_initial_message();
                }
            }
        }

        let removed = retain_valid_edges(&self.nodes, &mut self.edges);
        if removed > 0 {
            self.notifier
                .notify(NoticeLevel::Warning, INVALID_EDGES_REMOVED);
        }
        self.refresh_variables();

        if let NodeData::Condition(data) = &self.nodes[index].data {
            let unknown = unknown_references(&data.condition, &self.global_variables);
            if !unknown.is_empty() {
                let message = format!(
                    "condition references unknown variables: {}",
                    unknown.iter().join(", ")
                );
                self.notifier.notify(NoticeLevel::Info, &message);
            }
        }
        Ok(())
    }

    /// Proposes an edge between two nodes.
    ///
    /// The connection validator gates creation; rejections surface their
    /// reason as a notice and no edge is created. Accepted edges from
    /// branching sources auto-populate the target's trigger text from the
    /// branch label. AI-sourced connections are not created immediately:
    /// they are held pending until [`confirm_pending`](Self::confirm_pending)
    /// supplies the condition label.
    pub fn connect(
        &mut self,
        source_id: &str,
        target_id: &str,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
    ) -> Result<ConnectOutcome, SessionError> {
        let Some(source_index) = self.index_of(source_id) else {
            let err = SessionError::NodeNotFound(source_id.to_string());
            self.notifier.notify(NoticeLevel::Error, &err.to_string());
            return Err(err);
        };
        let Some(target_index) = self.index_of(target_id) else {
            let err = SessionError::NodeNotFound(target_id.to_string());
            self.notifier.notify(NoticeLevel::Error, &err.to_string());
            return Err(err);
        };

        let source = &self.nodes[source_index];
        let target = &self.nodes[target_index];
        if let Err(rejection) = validate_connection(source, target) {
            self.notifier
                .notify(NoticeLevel::Warning, &rejection.to_string());
            return Err(rejection.into());
        }

        if source.kind() == NodeKind::Ai {
            let pending = PendingConnection {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
                source_handle: source_handle.map(String::from),
                target_handle: target_handle.map(String::from),
            };
            if self.pending.replace(pending.clone()).is_some() {
                self.notifier.notify(
                    NoticeLevel::Info,
                    "the previous unconfirmed connection was discarded",
                );
            }
            self.notifier.condition_prompt(&pending);
            return Ok(ConnectOutcome::Pending);
        }

        let auto_text = source_handle.and_then(|handle| {
            source
                .data
                .branch_label(handle)
                .or_else(|| source.data.button_payload(handle))
                .map(String::from)
        });
        if let Some(text) = auto_text {
            self.nodes[target_index].data.set_auto_user_response(&text);
        }

        let id = self.push_edge(source_id, target_id, source_handle, target_handle, None);
        Ok(ConnectOutcome::Connected(id))
    }

    /// Resolves the pending AI connection with its condition label and
    /// creates the edge.
    ///
    /// The graph may have changed while the author was typing, so the
    /// endpoints are re-checked against current state; a connection whose
    /// endpoints disappeared or became illegal is discarded. An empty
    /// label is refused and leaves the connection pending.
    pub fn confirm_pending(&mut self, label: &str) -> Result<String, SessionError> {
        let Some(pending) = self.pending.clone() else {
            return Err(SessionError::NoPendingConnection);
        };

        let label = label.trim();
        if label.is_empty() {
            let err = SessionError::EmptyConditionLabel;
            self.notifier.notify(NoticeLevel::Error, &err.to_string());
            return Err(err);
        }

        let endpoints = (
            self.index_of(&pending.source_id),
            self.index_of(&pending.target_id),
        );
        let (Some(source_index), Some(target_index)) = endpoints else {
            self.pending = None;
            self.notifier.notify(
                NoticeLevel::Warning,
                "the connection was discarded because a node no longer exists",
            );
            return Err(SessionError::NodeNotFound(pending.target_id));
        };

        if let Err(rejection) =
            validate_connection(&self.nodes[source_index], &self.nodes[target_index])
        {
            self.pending = None;
            self.notifier
                .notify(NoticeLevel::Warning, &rejection.to_string());
            return Err(rejection.into());
        }

        self.pending = None;
        let id = self.push_edge(
            &pending.source_id,
            &pending.target_id,
            pending.source_handle.as_deref(),
            pending.target_handle.as_deref(),
            Some(label.to_string()),
        );
        Ok(id)
    }

    /// Discards the pending AI connection, if any.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Removes a node together with every edge it touches.
    pub fn delete_node(&mut self, id: &str) -> Result<(), SessionError> {
        let Some(index) = self.index_of(id) else {
            return Err(SessionError::NodeNotFound(id.to_string()));
        };
        self.nodes.remove(index);
        self.edges
            .retain(|edge| edge.source != id && edge.target != id);
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.source_id == id || pending.target_id == id)
        {
            self.pending = None;
        }
        self.refresh_variables();
        Ok(())
    }

    /// Populates a conversation node's attachment from an upload reply.
    /// Failed uploads surface their message and leave the node untouched.
    pub fn apply_upload(&mut self, node_id: &str, result: &UploadResult) -> Result<(), SessionError> {
        let url = match (result.success, result.url.as_deref()) {
            (true, Some(url)) => url,
            _ => {
                let message = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "the file could not be uploaded".to_string());
                self.notifier.notify(NoticeLevel::Error, &message);
                return Err(SessionError::Upload { message });
            }
        };
        let Some(index) = self.index_of(node_id) else {
            return Err(SessionError::NodeNotFound(node_id.to_string()));
        };
        if !self.nodes[index].data.set_file_or_image_url(url) {
            return Err(SessionError::UnsupportedMedia {
                node_id: node_id.to_string(),
            });
        }
        Ok(())
    }

    /// Resets the session to a fresh, empty workflow.
    pub fn new_workflow(&mut self, name: impl Into<String>) {
        self.workflow_id = None;
        self.name = name.into();
        self.agent = None;
        self.reset_graph();
    }

    /// Encodes the current graph and stamps it with the next save
    /// generation. Split from [`apply_save_result`](Self::apply_save_result)
    /// so hosts driving the store asynchronously can keep editing between
    /// the two halves.
    pub fn prepare_save(&mut self) -> Result<SaveTicket, SessionError> {
        let document = format::encode_full(&self.nodes, &self.edges)
            .map_err(|err| SessionError::Encode(err.to_string()))?;
        self.save_generation += 1;
        Ok(SaveTicket {
            generation: self.save_generation,
            name: self.name.clone(),
            document,
        })
    }

    /// Applies a store reply to a previously prepared save.
    ///
    /// Replies are applied last-write-wins: an acknowledgement older than
    /// one already applied is ignored (returns `Ok(false)`). A non-200
    /// reply surfaces its message and leaves local edits untouched.
    pub fn apply_save_result(
        &mut self,
        generation: u64,
        response: StoreResponse<StoredWorkflow>,
    ) -> Result<bool, SessionError> {
        if generation < self.acked_generation {
            debug!(generation, "ignoring stale save acknowledgement");
            return Ok(false);
        }
        self.acked_generation = generation;

        if !response.is_ok() {
            let message = response
                .message
                .unwrap_or_else(|| "the workflow could not be saved".to_string());
            self.notifier.notify(NoticeLevel::Error, &message);
            return Err(SessionError::Store {
                status: response.status,
                message,
            });
        }

        if self.workflow_id.is_none()
            && let Some(record) = response.body
        {
            self.workflow_id = Some(record.id);
        }
        Ok(true)
    }

    /// Persists the workflow: create on first save, update afterwards.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let ticket = self.prepare_save()?;
        let response = match self.workflow_id.clone() {
            Some(id) => {
                let reply = self.store.update_workflow(
                    &id,
                    UpdateWorkflowRequest {
                        name: Some(ticket.name.clone()),
                        workflow_json: Some(ticket.document.clone()),
                    },
                );
                StoreResponse {
                    status: reply.status,
                    body: None,
                    message: reply.message,
                }
            }
            None => self.store.create_workflow(CreateWorkflowRequest {
                name: ticket.name.clone(),
                workflow_json: ticket.document.clone(),
            }),
        };
        self.apply_save_result(ticket.generation, response).map(|_| ())
    }

    /// Loads a stored workflow, auto-detecting its encoding.
    ///
    /// A collaborator failure resets to an empty graph and asks the
    /// notifier to take the author back to the flow list. A document that
    /// exists but cannot be parsed surfaces a notice and leaves an empty
    /// canvas for the opened workflow.
    pub fn load(&mut self, id: &str) -> Result<(), SessionError> {
        let StoreResponse {
            status,
            body,
            message,
        } = self.store.get_workflow(id);

        let Some(stored) = body.filter(|_| status == 200) else {
            let message = message.unwrap_or_else(|| "the workflow could not be loaded".to_string());
            self.notifier.notify(NoticeLevel::Error, &message);
            self.new_workflow("");
            self.notifier.redirect_to_flows();
            return Err(SessionError::Store { status, message });
        };

        let document = match &stored.workflow {
            Value::String(text) => serde_json::from_str::<Value>(text)
                .map_err(|err| err.to_string()),
            other => Ok(other.clone()),
        };
        let decoded = document.and_then(|document| {
            format::decode_workflow(&document).map_err(|err| err.to_string())
        });

        self.workflow_id = Some(stored.id.clone());
        self.name = stored.name.clone();
        self.agent = stored.agent.clone();
        self.pending = None;

        match decoded {
            Ok((nodes, edges)) => {
                self.nodes = nodes;
                self.edges = edges;
                self.refresh_variables();
                Ok(())
            }
            Err(reason) => {
                warn!(workflow = %stored.id, %reason, "stored workflow could not be decoded");
                self.notifier.notify(
                    NoticeLevel::Error,
                    "the stored workflow could not be read; starting from an empty canvas",
                );
                self.reset_graph();
                Err(SessionError::Decode(reason))
            }
        }
    }

    fn reset_graph(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.pending = None;
        self.refresh_variables();
    }

    fn refresh_variables(&mut self) {
        self.global_variables = collect_variables(&self.nodes);
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    fn push_edge(
        &mut self,
        source: &str,
        target: &str,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
        condition: Option<String>,
    ) -> String {
        let id = loop {
            self.edge_seq += 1;
            let candidate = format!("edge-{}", self.edge_seq);
            if !self.edges.iter().any(|edge| edge.id == candidate) {
                break candidate;
            }
        };
        let mut edge = Edge {
            id: id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: source_handle.map(String::from),
            target_handle: target_handle.map(String::from),
            data: condition.map(|condition| EdgeData {
                condition: Some(condition),
            }),
            label: None,
        };
        edge.sync_label();
        self.edges.push(edge);
        id
    }
}
