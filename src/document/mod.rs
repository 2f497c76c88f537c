//! Pure operations over a page's ordered node list.
//!
//! Everything here is index based and never panics on bad input: an out of
//! range index or an unknown id leaves the list untouched.

use crate::models::{NodeData, NodeType};

pub(crate) const PLACEHOLDER: char = '\u{200B}';

pub(crate) fn add_node(nodes: &mut Vec<NodeData>, node: NodeData, index: usize) {
    let index = index.min(nodes.len());
    nodes.insert(index, node);
}

pub(crate) fn remove_node_by_index(nodes: &mut Vec<NodeData>, index: usize) -> Option<NodeData> {
    (index < nodes.len()).then(|| nodes.remove(index))
}

pub(crate) fn change_node_value(nodes: &mut [NodeData], index: usize, value: &str) -> bool {
    match nodes.get_mut(index) {
        Some(n) => {
            n.value = value.to_string();
            true
        }
        None => false,
    }
}

pub(crate) fn change_node_type(nodes: &mut [NodeData], index: usize, node_type: NodeType) -> bool {
    match nodes.get_mut(index) {
        Some(n) => {
            n.node_type = node_type;
            true
        }
        None => false,
    }
}

pub(crate) fn change_node_caption(nodes: &mut [NodeData], index: usize, caption: &str) -> bool {
    match nodes.get_mut(index) {
        Some(n) => {
            n.caption = Some(caption.to_string()).filter(|c| !c.is_empty());
            true
        }
        None => false,
    }
}

pub(crate) fn change_node_size(nodes: &mut [NodeData], index: usize, width: f64, height: f64) -> bool {
    match nodes.get_mut(index) {
        Some(n) => {
            n.width = Some(width);
            n.height = Some(height);
            true
        }
        None => false,
    }
}

/// Moves the node `active_id` to the position currently held by `over_id`.
pub(crate) fn reorder_nodes(nodes: &mut Vec<NodeData>, active_id: &str, over_id: &str) -> bool {
    if active_id == over_id {
        return false;
    }
    let from = nodes.iter().position(|n| n.id == active_id);
    let to = nodes.iter().position(|n| n.id == over_id);
    let (Some(from), Some(to)) = (from, to) else {
        return false;
    };

    let node = nodes.remove(from);
    nodes.insert(to, node);
    true
}

/// One rendered unit of the node list. Numbered list runs render as a single `<ol>`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodeGroup {
    Single(usize, NodeData),
    NumberedList(Vec<(usize, NodeData)>),
}

pub(crate) fn group_nodes(nodes: &[NodeData]) -> Vec<NodeGroup> {
    let mut groups: Vec<NodeGroup> = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        if node.node_type != NodeType::NumberedList {
            groups.push(NodeGroup::Single(idx, node.clone()));
            continue;
        }
        match groups.last_mut() {
            Some(NodeGroup::NumberedList(items)) => items.push((idx, node.clone())),
            _ => groups.push(NodeGroup::NumberedList(vec![(idx, node.clone())])),
        }
    }

    groups
}

/// Splits `text` at a char offset. Offsets past the end split at the end.
pub(crate) fn split_text(text: &str, caret: usize) -> (String, String) {
    let byte = text
        .char_indices()
        .nth(caret)
        .map(|(b, _)| b)
        .unwrap_or(text.len());
    let (before, after) = text.split_at(byte);
    (before.to_string(), after.to_string())
}

pub(crate) fn strip_placeholder(text: &str) -> String {
    text.replace(PLACEHOLDER, "").trim().to_string()
}

/// Text a block keeps after a slash command is applied. The command itself
/// is not content.
pub(crate) fn command_residue(text: &str) -> String {
    let cleaned = strip_placeholder(text);
    if cleaned.starts_with('/') {
        String::new()
    } else {
        cleaned
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, t: NodeType) -> NodeData {
        NodeData::new(id, t, id)
    }

    fn ids(nodes: &[NodeData]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn add_node_clamps_index() {
        let mut nodes = vec![node("a", NodeType::Text)];
        add_node(&mut nodes, node("b", NodeType::Text), 10);
        add_node(&mut nodes, node("c", NodeType::Text), 0);
        assert_eq!(ids(&nodes), vec!["c", "a", "b"]);
    }

    #[test]
    fn out_of_range_mutations_are_noops() {
        let mut nodes = vec![node("a", NodeType::Text)];
        assert!(remove_node_by_index(&mut nodes, 3).is_none());
        assert!(!change_node_value(&mut nodes, 1, "x"));
        assert!(!change_node_type(&mut nodes, 1, NodeType::List));
        assert_eq!(nodes, vec![node("a", NodeType::Text)]);
    }

    #[test]
    fn change_type_keeps_id_and_value() {
        let mut nodes = vec![node("a", NodeType::Text)];
        assert!(change_node_type(&mut nodes, 0, NodeType::Heading2));
        assert_eq!(nodes[0].id, "a");
        assert_eq!(nodes[0].value, "a");
        assert_eq!(nodes[0].node_type, NodeType::Heading2);
    }

    #[test]
    fn image_caption_and_size() {
        let mut nodes = vec![node("img", NodeType::Image)];
        assert!(change_node_caption(&mut nodes, 0, "A cat"));
        assert!(change_node_size(&mut nodes, 0, 320.0, 200.0));
        assert_eq!(nodes[0].caption.as_deref(), Some("A cat"));
        assert_eq!((nodes[0].width, nodes[0].height), (Some(320.0), Some(200.0)));

        change_node_caption(&mut nodes, 0, "");
        assert!(nodes[0].caption.is_none());
    }

    #[test]
    fn reorder_moves_like_an_array_move() {
        let mut nodes: Vec<_> = ["a", "b", "c", "d"].iter().map(|i| node(i, NodeType::Text)).collect();
        assert!(reorder_nodes(&mut nodes, "a", "c"));
        assert_eq!(ids(&nodes), vec!["b", "c", "a", "d"]);

        assert!(reorder_nodes(&mut nodes, "d", "b"));
        assert_eq!(ids(&nodes), vec!["d", "b", "c", "a"]);

        assert!(!reorder_nodes(&mut nodes, "b", "b"));
        assert!(!reorder_nodes(&mut nodes, "zz", "b"));
        assert_eq!(ids(&nodes), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn numbered_runs_are_grouped_with_global_indices() {
        let nodes = vec![
            node("a", NodeType::NumberedList),
            node("b", NodeType::NumberedList),
            node("c", NodeType::Text),
            node("d", NodeType::NumberedList),
        ];
        let groups = group_nodes(&nodes);
        assert_eq!(groups.len(), 3);
        match &groups[0] {
            NodeGroup::NumberedList(items) => {
                assert_eq!(items.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);
            }
            other => panic!("expected a numbered group, got {other:?}"),
        }
        assert!(matches!(&groups[1], NodeGroup::Single(2, n) if n.id == "c"));
        assert!(matches!(&groups[2], NodeGroup::NumberedList(items) if items[0].0 == 3));
    }

    #[test]
    fn split_is_char_boundary_safe() {
        assert_eq!(split_text("héllo", 2), ("hé".to_string(), "llo".to_string()));
        assert_eq!(split_text("abc", 0), (String::new(), "abc".to_string()));
        assert_eq!(split_text("abc", 99), ("abc".to_string(), String::new()));
    }

    #[test]
    fn placeholder_is_stripped_and_trimmed() {
        assert_eq!(strip_placeholder("\u{200B} hi \u{200B}"), "hi");
        assert_eq!(strip_placeholder("\u{200B}"), "");
        assert_eq!(char_len("hé"), 2);
    }

    #[test]
    fn slash_command_leaves_no_residue() {
        assert_eq!(command_residue("/head\u{200B}"), "");
        assert_eq!(command_residue("\u{200B}/numbered list"), "");
        assert_eq!(command_residue(" kept "), "kept");
    }
}
