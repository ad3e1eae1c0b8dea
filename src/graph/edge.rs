use serde::{Deserialize, Serialize};

/// Extra payload attached to an edge. Today this is only the free-text
/// condition labelling an AI branch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A directed connection between two nodes, optionally anchored to named
/// handles on either end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            data: None,
            label: None,
        }
    }

    /// The condition label carried in `data`, if any.
    pub fn condition(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.condition.as_deref())
    }

    /// Re-derives the display label from the condition payload, keeping a
    /// literal `label` only when no condition is present.
    pub fn sync_label(&mut self) {
        if let Some(condition) = self.condition() {
            self.label = Some(condition.to_string());
        }
    }
}
