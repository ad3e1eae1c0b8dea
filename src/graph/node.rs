use serde::{Deserialize, Serialize};
use std::fmt;

/// A button rendered under a conversation message. The `id` doubles as the
/// source handle name when the button is wired to a follow-up node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractiveButton {
    pub id: String,
    pub title: String,
    pub payload: String,
}

/// A single HTTP header entry on an API request node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// Returned when a patch targets a different node kind than the node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    pub expected: NodeKind,
    pub found: NodeKind,
}

/// Master macro defining every node kind together with its data struct,
/// its partial-update struct, and the dispatch tables over all of them.
/// Adding a kind here is the single point of change; every `match` the
/// macro generates stays exhaustive by construction.
macro_rules! define_node_kinds {
    (
        $(
            $kind:ident => $tag:literal, $data:ident, $patch:ident {
                $( $field:ident : $ty:ty ),* $(,)?
            }
        ),+ $(,)?
    ) => {
        /// The closed set of node types a flow can contain.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum NodeKind {
            $( #[serde(rename = $tag)] $kind, )+
        }

        impl NodeKind {
            /// The wire tag of this kind, as stored in workflow JSON.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( NodeKind::$kind => $tag, )+
                }
            }
        }

        impl fmt::Display for NodeKind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        $(
            #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
            #[serde(default, rename_all = "camelCase")]
            pub struct $data {
                $( pub $field: $ty, )*
            }

            #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
            #[serde(default, rename_all = "camelCase")]
            pub struct $patch {
                $(
                    #[serde(skip_serializing_if = "Option::is_none")]
                    pub $field: Option<$ty>,
                )*
            }
        )+

        /// A node's typed payload, tagged by kind on the wire
        /// (`{"type": "...", "data": {...}}`).
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data")]
        pub enum NodeData {
            $( #[serde(rename = $tag)] $kind($data), )+
        }

        /// A partial update to a node's payload. Every field is optional;
        /// absent fields leave the node's current value untouched.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data")]
        pub enum DataPatch {
            $( #[serde(rename = $tag)] $kind($patch), )+
        }

        impl NodeData {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $( NodeData::$kind(_) => NodeKind::$kind, )+
                }
            }

            /// The default payload template used when a node of `kind` is created.
            pub fn defaults(kind: NodeKind) -> NodeData {
                match kind {
                    $( NodeKind::$kind => NodeData::$kind($data::default()), )+
                }
            }

            /// Rebuilds a payload of `kind` from a loose JSON field map.
            /// Missing fields take their defaults; unknown fields are ignored,
            /// which keeps older persisted documents loadable.
            pub fn from_fields(
                kind: NodeKind,
                fields: serde_json::Value,
            ) -> Result<NodeData, serde_json::Error> {
                match kind {
                    $( NodeKind::$kind => serde_json::from_value::<$data>(fields).map(NodeData::$kind), )+
                }
            }

            /// The advisory display name of the node.
            pub fn name(&self) -> &str {
                match self {
                    $( NodeData::$kind(data) => &data.name, )+
                }
            }

            /// Shallowly merges `patch` into the payload: only fields the
            /// patch carries are overwritten.
            pub fn merge(&mut self, patch: DataPatch) -> Result<(), KindMismatch> {
                match (self, patch) {
                    $(
                        (NodeData::$kind(data), DataPatch::$kind(patch)) => {
                            $( if let Some(value) = patch.$field { data.$field = value; } )*
                            Ok(())
                        }
                    )+
                    (data, patch) => Err(KindMismatch {
                        expected: data.kind(),
                        found: patch.kind(),
                    }),
                }
            }
        }

        impl DataPatch {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $( DataPatch::$kind(_) => NodeKind::$kind, )+
                }
            }
        }
    };
}

define_node_kinds! {
    Trigger => "trigger", TriggerData, TriggerPatch {
        name: String,
    },
    Conversation => "conversation", ConversationData, ConversationPatch {
        name: String,
        bot_response: String,
        interactive_buttons: Vec<InteractiveButton>,
        initial_message: bool,
        jump_to_next_node: bool,
        user_response: String,
        is_user_response_auto: bool,
        file_or_image_url: String,
    },
    Condition => "condition", ConditionData, ConditionPatch {
        name: String,
        condition: String,
        status_success: String,
        status_error: String,
        bot_response: String,
        user_response: String,
        is_user_response_auto: bool,
    },
    CaptureResponse => "captureResponse", CaptureResponseData, CaptureResponsePatch {
        name: String,
        bot_response: String,
        variable_name: String,
        user_response: String,
        is_user_response_auto: bool,
    },
    ApiRequest => "apiRequest", ApiRequestData, ApiRequestPatch {
        name: String,
        url: String,
        method: String,
        headers: Vec<HeaderEntry>,
        body: String,
        status_success: String,
        status_error: String,
        user_response: String,
        is_user_response_auto: bool,
    },
    Crm => "crm", CrmData, CrmPatch {
        name: String,
        action: String,
        column: String,
    },
    UrlButton => "urlButton", UrlButtonData, UrlButtonPatch {
        name: String,
        bot_response: String,
        button_title: String,
        url: String,
        user_response: String,
        is_user_response_auto: bool,
    },
    TurnOffAgent => "turnOffAgent", TurnOffAgentData, TurnOffAgentPatch {
        name: String,
    },
    HandoverToHuman => "handoverToHuman", HandoverToHumanData, HandoverToHumanPatch {
        name: String,
        note: String,
    },
    Ai => "ai", AiData, AiPatch {
        name: String,
        prompt: String,
    },
    Integration => "integration", IntegrationData, IntegrationPatch {
        name: String,
        provider: String,
        calendar_id: String,
        event_title: String,
    },
    Reminder => "reminder", ReminderData, ReminderPatch {
        name: String,
        message: String,
        delay_minutes: u32,
    },
    TransferCall => "transferCall", TransferCallData, TransferCallPatch {
        name: String,
        phone_number: String,
    },
    EndCall => "endCall", EndCallData, EndCallPatch {
        name: String,
    },
}

impl NodeData {
    /// Whether this payload claims the flow's entry message. Only
    /// conversation nodes can.
    pub fn initial_message(&self) -> bool {
        matches!(self, NodeData::Conversation(data) if data.initial_message)
    }

    pub(crate) fn clear_initial_message(&mut self) {
        if let NodeData::Conversation(data) = self {
            data.initial_message = false;
        }
    }

    /// Resolves a `success`/`error` source handle to the configured status
    /// label, on kinds that branch on an outcome.
    pub fn branch_label(&self, handle: &str) -> Option<&str> {
        let (success, error) = match self {
            NodeData::Condition(data) => (&data.status_success, &data.status_error),
            NodeData::ApiRequest(data) => (&data.status_success, &data.status_error),
            _ => return None,
        };
        match handle {
            "success" => Some(success.as_str()),
            "error" => Some(error.as_str()),
            _ => None,
        }
    }

    /// Resolves a source handle naming an interactive button to the text a
    /// click on it sends (payload, falling back to the title).
    pub fn button_payload(&self, handle: &str) -> Option<&str> {
        let NodeData::Conversation(data) = self else {
            return None;
        };
        data.interactive_buttons
            .iter()
            .find(|button| button.id == handle)
            .map(|button| {
                if button.payload.is_empty() {
                    button.title.as_str()
                } else {
                    button.payload.as_str()
                }
            })
    }

    /// The variable a capture-response node declares, if this is one.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            NodeData::CaptureResponse(data) => Some(&data.variable_name),
            _ => None,
        }
    }

    pub(crate) fn set_auto_user_response(&mut self, text: &str) -> bool {
        let (user_response, is_auto) = match self {
            NodeData::Conversation(data) => {
                (&mut data.user_response, &mut data.is_user_response_auto)
            }
            NodeData::Condition(data) => {
                (&mut data.user_response, &mut data.is_user_response_auto)
            }
            NodeData::CaptureResponse(data) => {
                (&mut data.user_response, &mut data.is_user_response_auto)
            }
            NodeData::ApiRequest(data) => {
                (&mut data.user_response, &mut data.is_user_response_auto)
            }
            NodeData::UrlButton(data) => {
                (&mut data.user_response, &mut data.is_user_response_auto)
            }
            _ => return false,
        };
        *user_response = text.to_string();
        *is_auto = true;
        true
    }

    pub(crate) fn set_file_or_image_url(&mut self, url: &str) -> bool {
        if let NodeData::Conversation(data) = self {
            data.file_or_image_url = url.to_string();
            true
        } else {
            false
        }
    }
}

/// Canvas coordinates of a node in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A vertex of the conversation graph: a stable id, a canvas position, and
/// the kind-tagged payload. Serializes to the full wire shape
/// `{id, type, position, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub position: Position,
    #[serde(flatten)]
    pub data: NodeData,
}

impl Node {
    /// Creates a node of `kind` with its default payload template.
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            data: NodeData::defaults(kind),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn name(&self) -> &str {
        self.data.name()
    }
}
