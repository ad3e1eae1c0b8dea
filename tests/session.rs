//! Tests for the graph editing session: invariants, side effects and the
//! deferred AI connection flow.
mod common;
use common::*;
use convoflow::prelude::*;

#[test]
fn empty_graph_accepts_only_entry_capable_first_nodes() {
    for kind in [NodeKind::Conversation, NodeKind::Trigger, NodeKind::Ai] {
        let mut session = new_session();
        assert!(session.add_node(kind, Position::default()).is_ok());
    }

    let mut session = new_session();
    let result = session.add_node(NodeKind::Condition, Position::default());
    assert_eq!(
        result,
        Err(SessionError::InvalidFirstNode {
            kind: NodeKind::Condition
        })
    );
    assert!(session.nodes().is_empty(), "rejected add must not mutate");
    assert_eq!(session.notifier().notices.len(), 1);

    // Once the graph has an entry node, every kind is allowed.
    session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("conversation first");
    assert!(session.add_node(NodeKind::Condition, Position::default()).is_ok());
}

#[test]
fn first_conversation_claims_the_entry_message() {
    let mut session = new_session();
    let first = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("first");
    let second = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("second");

    let entries: Vec<&str> = session
        .nodes()
        .iter()
        .filter(|node| node.data.initial_message())
        .map(|node| node.id.as_str())
        .collect();
    assert_eq!(entries, vec![first.as_str()]);
    assert_ne!(first, second);
}

#[test]
fn at_most_one_entry_conversation_after_updates() {
    let mut session = new_session();
    let first = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("first");
    let second = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("second");

    session
        .update_node(
            &second,
            DataPatch::Conversation(ConversationPatch {
                initial_message: Some(true),
                ..Default::default()
            }),
        )
        .expect("claim entry");

    let entries: Vec<&str> = session
        .nodes()
        .iter()
        .filter(|node| node.data.initial_message())
        .map(|node| node.id.as_str())
        .collect();
    assert_eq!(entries, vec![second.as_str()]);
    assert!(!session.node(&first).expect("first exists").data.initial_message());
}

#[test]
fn updates_merge_shallowly() {
    let mut session = new_session();
    let id = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("node");
    session
        .update_node(&id, conversation_name("welcome"))
        .expect("rename");
    session
        .update_node(
            &id,
            DataPatch::Conversation(ConversationPatch {
                bot_response: Some("Hello!".to_string()),
                ..Default::default()
            }),
        )
        .expect("set response");

    let NodeData::Conversation(data) = &session.node(&id).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.name, "welcome");
    assert_eq!(data.bot_response, "Hello!");
    assert!(data.initial_message, "untouched fields keep their values");
}

#[test]
fn mismatched_patch_kind_is_rejected() {
    let mut session = new_session();
    let id = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("node");

    let result = session.update_node(&id, capture_variable("x"));
    assert_eq!(
        result,
        Err(SessionError::KindMismatch {
            node_id: id.clone(),
            expected: NodeKind::Conversation,
            found: NodeKind::CaptureResponse,
        })
    );
}

#[test]
fn trigger_wiring_scenario() {
    let (mut session, trigger, _entry) = session_with_entry();
    assert_eq!(session.edges().len(), 1);

    let second = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("second conversation");
    let result = session.connect(&trigger, &second, None, None);
    assert_eq!(
        result,
        Err(SessionError::Rejected(
            ConnectionRejection::TriggerRequiresEntryConversation
        ))
    );
    assert_eq!(session.edges().len(), 1, "rejected connect adds no edge");
}

#[test]
fn node_update_prunes_now_invalid_edges() {
    let (mut session, _trigger, entry) = session_with_entry();
    assert_eq!(session.edges().len(), 1);

    // Dropping the entry flag makes the trigger edge illegal.
    session
        .update_node(
            &entry,
            DataPatch::Conversation(ConversationPatch {
                initial_message: Some(false),
                ..Default::default()
            }),
        )
        .expect("unset entry");

    assert!(session.edges().is_empty());
    assert!(
        session
            .notifier()
            .notices
            .iter()
            .any(|(level, message)| *level == NoticeLevel::Warning
                && message.contains("invalid connections were removed"))
    );
}

#[test]
fn connecting_missing_nodes_fails() {
    let (mut session, trigger, _) = session_with_entry();
    let result = session.connect(&trigger, "ghost", None, None);
    assert_eq!(result, Err(SessionError::NodeNotFound("ghost".to_string())));
}

#[test]
fn branch_handles_auto_populate_the_target_trigger_text() {
    let mut session = new_session();
    session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("entry");
    let api = session
        .add_node(NodeKind::ApiRequest, Position::default())
        .expect("api");
    let success_target = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("target");
    let error_target = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("target");

    session
        .update_node(
            &api,
            DataPatch::ApiRequest(ApiRequestPatch {
                status_success: Some("ok".to_string()),
                status_error: Some("failed".to_string()),
                ..Default::default()
            }),
        )
        .expect("configure statuses");

    session
        .connect(&api, &success_target, Some("success"), None)
        .expect("success branch");
    session
        .connect(&api, &error_target, Some("error"), None)
        .expect("error branch");

    let NodeData::Conversation(data) = &session.node(&success_target).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.user_response, "ok");
    assert!(data.is_user_response_auto);

    let NodeData::Conversation(data) = &session.node(&error_target).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.user_response, "failed");
    assert!(data.is_user_response_auto);
}

#[test]
fn interactive_buttons_propagate_their_payload() {
    let mut session = new_session();
    let conversation = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("entry");
    let priced = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("target");
    let titled = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("target");

    session
        .update_node(
            &conversation,
            DataPatch::Conversation(ConversationPatch {
                interactive_buttons: Some(vec![
                    InteractiveButton {
                        id: "btn-1".to_string(),
                        title: "Pricing".to_string(),
                        payload: "show_pricing".to_string(),
                    },
                    InteractiveButton {
                        id: "btn-2".to_string(),
                        title: "Talk to sales".to_string(),
                        payload: String::new(),
                    },
                ]),
                ..Default::default()
            }),
        )
        .expect("configure buttons");

    session
        .connect(&conversation, &priced, Some("btn-1"), None)
        .expect("payload button");
    session
        .connect(&conversation, &titled, Some("btn-2"), None)
        .expect("title fallback button");

    let NodeData::Conversation(data) = &session.node(&priced).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.user_response, "show_pricing");

    let NodeData::Conversation(data) = &session.node(&titled).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.user_response, "Talk to sales");
    assert!(data.is_user_response_auto);
}

#[test]
fn ai_connections_wait_for_their_condition_label() {
    let mut session = new_session();
    let ai = session
        .add_node(NodeKind::Ai, Position::default())
        .expect("ai first");
    let target = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("target");

    // The conversation claimed the entry message (none existed), which
    // only accepts trigger sources; release it so the AI edge is legal.
    session
        .update_node(
            &target,
            DataPatch::Conversation(ConversationPatch {
                initial_message: Some(false),
                ..Default::default()
            }),
        )
        .expect("unset entry");

    let outcome = session.connect(&ai, &target, None, None).expect("deferred");
    assert_eq!(outcome, ConnectOutcome::Pending);
    assert!(session.edges().is_empty(), "no edge until confirmation");
    assert_eq!(session.notifier().prompts.len(), 1);

    // An empty label is refused and the connection stays pending.
    assert_eq!(
        session.confirm_pending("   "),
        Err(SessionError::EmptyConditionLabel)
    );
    assert!(session.pending().is_some());

    let edge_id = session
        .confirm_pending("customer asks about pricing")
        .expect("confirm");
    assert!(session.pending().is_none());

    let edge = session
        .edges()
        .iter()
        .find(|edge| edge.id == edge_id)
        .expect("edge created");
    assert_eq!(edge.condition(), Some("customer asks about pricing"));
    assert_eq!(edge.label.as_deref(), Some("customer asks about pricing"));
}

#[test]
fn pending_connections_can_be_cancelled_or_replaced() {
    let mut session = new_session();
    let ai = session
        .add_node(NodeKind::Ai, Position::default())
        .expect("ai");
    let a = session
        .add_node(NodeKind::Reminder, Position::default())
        .expect("a");
    let b = session
        .add_node(NodeKind::Crm, Position::default())
        .expect("b");

    session.connect(&ai, &a, None, None).expect("first pending");
    session.connect(&ai, &b, None, None).expect("second pending");
    assert_eq!(
        session.pending().map(|pending| pending.target_id.as_str()),
        Some(b.as_str()),
        "a new pending connection replaces the old one"
    );

    assert!(session.cancel_pending());
    assert!(!session.cancel_pending());
    assert_eq!(
        session.confirm_pending("anything"),
        Err(SessionError::NoPendingConnection)
    );
}

#[test]
fn confirming_after_the_target_disappeared_discards_the_connection() {
    let mut session = new_session();
    let ai = session
        .add_node(NodeKind::Ai, Position::default())
        .expect("ai");
    let target = session
        .add_node(NodeKind::Reminder, Position::default())
        .expect("target");

    session.connect(&ai, &target, None, None).expect("pending");
    session.delete_node(&target).expect("delete target");

    // Deleting an endpoint already discards the pending connection.
    assert_eq!(
        session.confirm_pending("label"),
        Err(SessionError::NoPendingConnection)
    );
    assert!(session.edges().is_empty());
}

#[test]
fn confirming_revalidates_against_the_current_graph() {
    let mut session = new_session();
    session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("entry");
    let ai = session
        .add_node(NodeKind::Ai, Position::default())
        .expect("ai");
    let target = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("target");

    session.connect(&ai, &target, None, None).expect("pending");

    // While the author types the label, the target becomes the entry
    // conversation, which no longer accepts an AI source.
    session
        .update_node(
            &target,
            DataPatch::Conversation(ConversationPatch {
                initial_message: Some(true),
                ..Default::default()
            }),
        )
        .expect("move entry");

    let result = session.confirm_pending("asks about billing");
    assert_eq!(
        result,
        Err(SessionError::Rejected(
            ConnectionRejection::EntryConversationRequiresTrigger
        ))
    );
    assert!(session.pending().is_none(), "an illegal connection is discarded");
    assert!(session.edges().is_empty());
}

#[test]
fn deleting_a_node_removes_its_edges() {
    let (mut session, trigger, entry) = session_with_entry();
    let next = session
        .add_node(NodeKind::Condition, Position::default())
        .expect("condition");
    session.connect(&entry, &next, None, None).expect("edge");
    assert_eq!(session.edges().len(), 2);

    session.delete_node(&entry).expect("delete");
    assert!(session.node(&entry).is_none());
    assert!(
        session
            .edges()
            .iter()
            .all(|edge| edge.source != entry && edge.target != entry),
        "no orphaned edges may remain"
    );
    assert!(session.edges().is_empty());
    assert!(session.node(&trigger).is_some());
}

#[test]
fn global_variables_are_derived_from_capture_nodes() {
    let mut session = new_session();
    session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("entry");
    let named = session
        .add_node(NodeKind::CaptureResponse, Position::default())
        .expect("capture");
    let unnamed = session
        .add_node(NodeKind::CaptureResponse, Position::default())
        .expect("capture");

    session
        .update_node(&named, capture_variable("id_cliente"))
        .expect("declare variable");
    session
        .update_node(&unnamed, capture_variable(""))
        .expect("empty variable");

    let variables: Vec<&str> = session
        .global_variables()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(variables, vec!["id_cliente"]);

    // Whitespace-only names are dropped, padded names are trimmed.
    session
        .update_node(&unnamed, capture_variable("  email  "))
        .expect("padded variable");
    assert!(session.global_variables().contains("email"));

    session.delete_node(&named).expect("delete capture");
    assert!(!session.global_variables().contains("id_cliente"));
}

#[test]
fn condition_updates_report_unknown_variable_references() {
    let mut session = new_session();
    session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("entry");
    let capture = session
        .add_node(NodeKind::CaptureResponse, Position::default())
        .expect("capture");
    session
        .update_node(&capture, capture_variable("topic"))
        .expect("declare");
    let condition = session
        .add_node(NodeKind::Condition, Position::default())
        .expect("condition");

    session
        .update_node(
            &condition,
            DataPatch::Condition(ConditionPatch {
                condition: Some("{{topic}} == \"billing\" && {{tier}} == \"pro\"".to_string()),
                ..Default::default()
            }),
        )
        .expect("set condition");

    assert!(
        session
            .notifier()
            .notices
            .iter()
            .any(|(level, message)| *level == NoticeLevel::Info
                && message.contains("tier")
                && !message.contains("topic"))
    );
}

#[test]
fn uploads_populate_conversation_attachments() {
    let mut session = new_session();
    let conversation = session
        .add_node(NodeKind::Conversation, Position::default())
        .expect("entry");
    let condition = session
        .add_node(NodeKind::Condition, Position::default())
        .expect("condition");

    let uploaded = UploadResult {
        success: true,
        url: Some("https://cdn.example/image.png".to_string()),
        ..Default::default()
    };
    session
        .apply_upload(&conversation, &uploaded)
        .expect("attach");
    let NodeData::Conversation(data) = &session.node(&conversation).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.file_or_image_url, "https://cdn.example/image.png");

    // Only conversation nodes hold attachments.
    assert_eq!(
        session.apply_upload(&condition, &uploaded),
        Err(SessionError::UnsupportedMedia {
            node_id: condition.clone()
        })
    );

    // A failed upload surfaces its message and changes nothing.
    let failed = UploadResult {
        success: false,
        error: Some("file too large".to_string()),
        ..Default::default()
    };
    let result = session.apply_upload(&conversation, &failed);
    assert_eq!(
        result,
        Err(SessionError::Upload {
            message: "file too large".to_string()
        })
    );
    let NodeData::Conversation(data) = &session.node(&conversation).expect("node").data else {
        panic!("kind changed");
    };
    assert_eq!(data.file_or_image_url, "https://cdn.example/image.png");
}
