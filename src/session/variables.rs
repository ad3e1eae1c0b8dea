use crate::graph::Node;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Derives the flow's variable set: the non-empty, trimmed variable names
/// declared by the capture-response nodes currently in the graph.
///
/// This is a projection, never stored state; the session recomputes it
/// after every change to the node collection so it cannot drift.
pub fn collect_variables(nodes: &[Node]) -> BTreeSet<String> {
    nodes
        .iter()
        .filter_map(|node| node.data.variable_name())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Extracts `{{name}}` placeholders from a text, in order of appearance.
/// Whitespace inside the braces is trimmed; empty placeholders are skipped.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &after[end + 2..];
    }
    names
}

/// The placeholders in `text` that do not resolve to a declared variable,
/// deduplicated in order of first appearance.
pub fn unknown_references(text: &str, variables: &BTreeSet<String>) -> Vec<String> {
    extract_placeholders(text)
        .into_iter()
        .unique()
        .filter(|name| !variables.contains(name))
        .collect()
}
