use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

pub(crate) const START_SLUG: &str = "start";
pub(crate) const DEFAULT_EMOJI: &str = "📃";
pub(crate) const DEFAULT_TITLE: &str = "Untitled Page";

/// Block type. Serialized names match the `type` field stored in the page's node list.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub(crate) enum NodeType {
    Text,
    List,
    NumberedList,
    Page,
    Image,
    Heading1,
    Heading2,
    Heading3,
}

impl NodeType {
    /// Label shown in the command panel.
    pub fn label(self) -> &'static str {
        match self {
            NodeType::Text => "Text",
            NodeType::List => "List",
            NodeType::NumberedList => "Numbered List",
            NodeType::Page => "Page",
            NodeType::Image => "Image",
            NodeType::Heading1 => "Heading 1",
            NodeType::Heading2 => "Heading 2",
            NodeType::Heading3 => "Heading 3",
        }
    }

    /// Types rendered by the contenteditable block.
    pub fn is_editable_text(self) -> bool {
        !matches!(self, NodeType::Page | NodeType::Image)
    }
}

/// A single block inside a page.
///
/// `value` depends on `node_type`: plain text for text-like blocks, the child
/// page slug for `page`, and the storage path for `image`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NodeData {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl NodeData {
    pub fn new(id: impl Into<String>, node_type: NodeType, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            value: value.into(),
            width: None,
            height: None,
            caption: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Page {
    pub id: i64,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub cover_offset_y: Option<f64>,
    /// Stored as a JSON column; older rows may hold `null`.
    #[serde(default, deserialize_with = "nodes_or_empty")]
    pub nodes: Vec<NodeData>,
}

fn nodes_or_empty<'de, D>(d: D) -> Result<Vec<NodeData>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<NodeData>>::deserialize(d)?.unwrap_or_default())
}

/// Header fields used by page links and the emoji header.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct PageHeader {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NewPage {
    pub slug: String,
    pub title: String,
    pub emoji: Option<String>,
    pub cover: Option<String>,
    pub nodes: Vec<NodeData>,
    pub created_by: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Content inserted the first time a user opens the app.
pub(crate) fn start_page_scaffold(user_id: &str) -> NewPage {
    let hints = [
        (NodeType::Heading1, "Welcome to Noted"),
        (NodeType::Text, "Type / in an empty block to change its type."),
        (NodeType::Text, "Drag the handle on the left to reorder blocks."),
    ];

    NewPage {
        slug: START_SLUG.to_string(),
        title: "Start".to_string(),
        emoji: Some(DEFAULT_EMOJI.to_string()),
        cover: None,
        nodes: hints
            .iter()
            .enumerate()
            .map(|(i, (t, v))| NodeData::new(format!("start-{i}"), *t, *v))
            .collect(),
        created_by: user_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn node_type_wire_names_are_camel_case() {
        let v = serde_json::to_value(NodeType::NumberedList).expect("serialize");
        assert_eq!(v, "numberedList");
        assert_eq!(NodeType::Heading2.as_ref(), "heading2");
        assert_eq!(NodeType::from_str("numberedList").ok(), Some(NodeType::NumberedList));
        assert_eq!(NodeType::iter().count(), 8);
    }

    #[test]
    fn page_row_with_null_nodes_parses() {
        let json = r#"{"id": 7, "slug": "start", "title": "Start", "cover": null, "nodes": null}"#;
        let page: Page = serde_json::from_str(json).expect("page should parse");
        assert_eq!(page.id, 7);
        assert!(page.nodes.is_empty());
        assert!(page.cover.is_none());
    }

    #[test]
    fn image_node_keeps_size_and_caption() {
        let json = r#"{"id": "n1", "type": "image", "value": "a.png", "width": 300, "height": 150, "caption": "Cat"}"#;
        let node: NodeData = serde_json::from_str(json).expect("node should parse");
        assert_eq!(node.node_type, NodeType::Image);
        assert_eq!(node.width, Some(300.0));
        assert_eq!(node.caption.as_deref(), Some("Cat"));
    }

    #[test]
    fn text_node_serializes_without_image_fields() {
        let v = serde_json::to_value(NodeData::new("n1", NodeType::Text, "hi")).expect("serialize");
        assert_eq!(v["type"], "text");
        assert!(v.get("width").is_none());
        assert!(v.get("caption").is_none());
    }

    #[test]
    fn scaffold_belongs_to_user_and_uses_start_slug() {
        let page = start_page_scaffold("u-1");
        assert_eq!(page.slug, START_SLUG);
        assert_eq!(page.created_by, "u-1");
        assert!(!page.nodes.is_empty());
    }
}
