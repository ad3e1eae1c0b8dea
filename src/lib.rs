//! # Convoflow - Conversation Flow Graph Core
//!
//! **Convoflow** is the graph validation and serialization core behind a
//! node-based chatbot flow builder. It owns the typed node/edge model of a
//! conversation graph, enforces the structural rules that make a flow
//! executable (a single entry conversation, terminal nodes without
//! outgoing edges, no consecutive capture steps), and converts between the
//! in-editor graph and the compact persisted encoding used for templates.
//!
//! ## Core Workflow
//!
//! 1.  **Open a session**: create a [`FlowSession`](session::FlowSession)
//!     with a persistence store and a notification surface.
//! 2.  **Edit**: add, update, connect and delete nodes. Every mutation
//!     re-establishes the graph invariants before returning; rejected
//!     edits surface their reason through the notifier.
//! 3.  **Persist**: `save` encodes the graph and hands it to the store;
//!     `load` auto-detects the stored encoding (full or minimal) and
//!     rebuilds the editor graph from it.
//!
//! ## Quick Start
//!
//! ```rust
//! use convoflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut session = FlowSession::new(MemoryStore::new(), TracingNotifier);
//!     session.new_workflow("Support bot");
//!
//!     // A flow starts from an entry-capable node.
//!     let trigger = session.add_node(NodeKind::Trigger, Position::new(50.0, 50.0))?;
//!     let welcome = session.add_node(NodeKind::Conversation, Position::new(330.0, 50.0))?;
//!
//!     session.update_node(
//!         &welcome,
//!         DataPatch::Conversation(ConversationPatch {
//!             name: Some("welcome".to_string()),
//!             bot_response: Some("Hi! How can we help?".to_string()),
//!             ..Default::default()
//!         }),
//!     )?;
//!
//!     // The validator gates every connection; this one is legal because
//!     // `welcome` is the designated entry conversation.
//!     session.connect(&trigger, &welcome, None, None)?;
//!
//!     session.save()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Persisted encodings
//!
//! Two wire encodings exist and both stay parseable indefinitely. The
//! *full* encoding mirrors the editor shape; the *minimal* encoding keys
//! nodes by name and type, omits ids and positions (ids are synthesized
//! and positions laid out on a grid at load time), and references edge
//! endpoints by node name. See the [`format`] module.

pub mod error;
pub mod format;
pub mod graph;
pub mod prelude;
pub mod session;
pub mod store;
