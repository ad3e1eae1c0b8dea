use crate::error::FormatError;
use crate::graph::{Edge, EdgeData, Node, NodeData, NodeKind, Position};
use ahash::{AHashMap, AHashSet};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

const GRID_COLUMNS: usize = 5;
const GRID_CELL_WIDTH: f64 = 280.0;
const GRID_CELL_HEIGHT: f64 = 200.0;
const GRID_MARGIN: f64 = 50.0;

/// A node in the compact persisted encoding: keyed by `name`/`type`, with
/// the payload fields flattened into the record and no id. A position may
/// be carried but is usually absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimalNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// An edge in the compact encoding, referencing nodes by name (or id, for
/// nodes that never had a name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimalEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The compact persisted encoding of a whole workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinimalWorkflow {
    #[serde(default)]
    pub nodes: Vec<MinimalNode>,
    #[serde(default)]
    pub edges: Vec<MinimalEdge>,
}

/// The deterministic fallback layout for minimal nodes loaded without an
/// explicit position: a left-to-right grid, five nodes per row.
pub fn grid_position(index: usize) -> Position {
    Position {
        x: (index % GRID_COLUMNS) as f64 * GRID_CELL_WIDTH + GRID_MARGIN,
        y: (index / GRID_COLUMNS) as f64 * GRID_CELL_HEIGHT + GRID_MARGIN,
    }
}

/// Converts an in-editor graph into the compact encoding: ids and positions
/// are stripped, payload fields are flattened into the node record, and
/// edges reference their endpoints by node name, falling back to the id for
/// unnamed nodes.
pub fn to_minimal(nodes: &[Node], edges: &[Edge]) -> Result<MinimalWorkflow, FormatError> {
    let mut minimal_nodes = Vec::with_capacity(nodes.len());
    for node in nodes {
        let mut fields = data_field_map(&node.data)?;
        fields.remove("name");
        let name = (!node.name().is_empty()).then(|| node.name().to_string());
        minimal_nodes.push(MinimalNode {
            name,
            kind: node.kind(),
            position: None,
            fields,
        });
    }

    let by_id: AHashMap<&str, &Node> = nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    let reference = |id: &str| -> String {
        match by_id.get(id) {
            Some(node) if !node.name().is_empty() => node.name().to_string(),
            _ => id.to_string(),
        }
    };

    let minimal_edges = edges
        .iter()
        .map(|edge| MinimalEdge {
            from: reference(&edge.source),
            to: reference(&edge.target),
            data: edge.data.clone().filter(|data| data.condition.is_some()),
            label: match edge.condition() {
                Some(_) => None,
                None => edge.label.clone(),
            },
        })
        .collect();

    Ok(MinimalWorkflow {
        nodes: minimal_nodes,
        edges: minimal_edges,
    })
}

/// Expands the compact encoding back into a full in-editor graph.
///
/// Ids are synthesized (`name` when present and unused, else
/// `{type}-{index}`, else `{type}-{rand4hex}-{index}` until free) and
/// positions fall back to [`grid_position`]. Edges that reference a node
/// neither by name nor by id are dropped with a warning rather than
/// failing the whole load.
pub fn from_minimal(minimal: &MinimalWorkflow) -> Result<(Vec<Node>, Vec<Edge>), FormatError> {
    let mut used_ids: AHashSet<String> = AHashSet::new();
    let mut nodes = Vec::with_capacity(minimal.nodes.len());

    for (index, record) in minimal.nodes.iter().enumerate() {
        let id = synthesize_id(record, index, &used_ids);
        used_ids.insert(id.clone());

        let mut fields = record.fields.clone();
        if let Some(name) = &record.name {
            fields.insert("name".to_string(), Value::String(name.clone()));
        }
        let data = NodeData::from_fields(record.kind, Value::Object(fields))
            .map_err(|err| FormatError::JsonParse(err.to_string()))?;

        nodes.push(Node {
            id,
            position: record.position.unwrap_or_else(|| grid_position(index)),
            data,
        });
    }

    let mut by_name: AHashMap<&str, &str> = AHashMap::new();
    for node in &nodes {
        if !node.name().is_empty() {
            by_name.entry(node.name()).or_insert(node.id.as_str());
        }
    }
    let ids: AHashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let resolve = |reference: &str| -> Option<String> {
        by_name
            .get(reference)
            .map(|id| id.to_string())
            .or_else(|| ids.contains(reference).then(|| reference.to_string()))
    };

    let mut edges = Vec::with_capacity(minimal.edges.len());
    for (index, record) in minimal.edges.iter().enumerate() {
        let (Some(source), Some(target)) = (resolve(&record.from), resolve(&record.to)) else {
            warn!(from = %record.from, to = %record.to, "dropping edge with unresolvable endpoints");
            continue;
        };
        let label = record
            .data
            .as_ref()
            .and_then(|data| data.condition.clone())
            .or_else(|| record.label.clone());
        edges.push(Edge {
            id: format!("edge-{index}"),
            source,
            target,
            source_handle: None,
            target_handle: None,
            data: record.data.clone(),
            label,
        });
    }

    Ok((nodes, edges))
}

fn synthesize_id(record: &MinimalNode, index: usize, used: &AHashSet<String>) -> String {
    if let Some(name) = &record.name
        && !name.is_empty()
        && !used.contains(name)
    {
        return name.clone();
    }
    let mut id = format!("{}-{}", record.kind, index);
    while used.contains(&id) {
        let suffix: u32 = rand::rng().random_range(0..0x1_0000);
        id = format!("{}-{:04x}-{}", record.kind, suffix, index);
    }
    id
}

fn data_field_map(data: &NodeData) -> Result<Map<String, Value>, FormatError> {
    let value = serde_json::to_value(data).map_err(|err| FormatError::JsonParse(err.to_string()))?;
    match value.get("data").cloned() {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(FormatError::UnrecognizedShape(
            "node data did not serialize to an object".to_string(),
        )),
    }
}
