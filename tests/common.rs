//! Common test utilities for building graphs, sessions and fixtures.
use convoflow::prelude::*;

/// A [`Notifier`] that records everything the session surfaces, so tests
/// can assert on notices, prompts and redirects.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingNotifier {
    pub notices: Vec<(NoticeLevel, String)>,
    pub prompts: Vec<PendingConnection>,
    pub redirects: usize,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push((level, message.to_string()));
    }

    fn condition_prompt(&mut self, pending: &PendingConnection) {
        self.prompts.push(pending.clone());
    }

    fn redirect_to_flows(&mut self) {
        self.redirects += 1;
    }
}

#[allow(dead_code)]
pub type TestSession = FlowSession<MemoryStore, RecordingNotifier>;

#[allow(dead_code)]
pub fn new_session() -> TestSession {
    FlowSession::new(MemoryStore::new(), RecordingNotifier::default())
}

/// A session holding a trigger wired to its entry conversation.
/// Returns `(session, trigger_id, conversation_id)`.
#[allow(dead_code)]
pub fn session_with_entry() -> (TestSession, String, String) {
    let mut session = new_session();
    let trigger = session
        .add_node(NodeKind::Trigger, Position::default())
        .expect("trigger is a valid first node");
    let conversation = session
        .add_node(NodeKind::Conversation, Position::new(330.0, 50.0))
        .expect("conversation node");
    session
        .connect(&trigger, &conversation, None, None)
        .expect("trigger connects to the entry conversation");
    (session, trigger, conversation)
}

/// A standalone node of `kind` with default data, for validator tests.
#[allow(dead_code)]
pub fn node(id: &str, kind: NodeKind) -> Node {
    Node::new(id, kind, Position::default())
}

/// A conversation node claiming the entry message.
#[allow(dead_code)]
pub fn entry_conversation(id: &str) -> Node {
    let mut node = node(id, NodeKind::Conversation);
    if let NodeData::Conversation(data) = &mut node.data {
        data.initial_message = true;
    }
    node
}

/// A patch renaming a conversation node.
#[allow(dead_code)]
pub fn conversation_name(name: &str) -> DataPatch {
    DataPatch::Conversation(ConversationPatch {
        name: Some(name.to_string()),
        ..Default::default()
    })
}

/// A patch declaring a capture-response variable.
#[allow(dead_code)]
pub fn capture_variable(name: &str) -> DataPatch {
    DataPatch::CaptureResponse(CaptureResponsePatch {
        variable_name: Some(name.to_string()),
        ..Default::default()
    })
}
