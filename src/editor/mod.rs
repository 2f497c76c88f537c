//! Block editing: key handling plans, caret helpers, the slash command panel
//! and the block components rendered by a page.

pub(crate) mod basic_node;
pub(crate) mod caret;
pub(crate) mod command_panel;
pub(crate) mod image_node;
pub(crate) mod node_container;
pub(crate) mod page_node;

pub use node_container::NodeContainer;

use crate::document::{char_len, split_text};
use crate::models::NodeData;

/// Where the caret lands in a block after focus moves to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CaretTarget {
    Start,
    End,
    Offset(usize),
}

/// What a keydown inside a text block should do to the document.
///
/// Plans are computed without touching the DOM so the rules can be tested
/// natively; `BasicNode` applies them through `PageState`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EditPlan {
    /// Let the browser handle the key.
    Passthrough,
    /// Swallow the key without changing anything.
    Suppress,
    ClearValue,
    /// Remove the block at `remove` and move focus to `focus`.
    RemoveAndFocus {
        remove: usize,
        focus: usize,
        caret: CaretTarget,
    },
    /// Append the current text to the previous block and drop the current one.
    MergeIntoPrevious { value: String },
    /// Append the next block's text to the current one and drop the next one.
    MergeNext { value: String, caret: CaretTarget },
    /// Keep `before` in the current block and insert a sibling holding `after`.
    Split { before: String, after: String },
}

impl EditPlan {
    pub fn prevents_default(&self) -> bool {
        !matches!(self, EditPlan::Passthrough)
    }
}

/// Snapshot of a text block at keydown time.
#[derive(Clone, Debug)]
pub(crate) struct KeyInput<'a> {
    pub key: &'a str,
    pub caret: usize,
    pub all_selected: bool,
    pub text: &'a str,
    pub index: usize,
    pub node_count: usize,
    pub prev: Option<&'a NodeData>,
    pub next: Option<&'a NodeData>,
    /// Also true for the Enter that picks a command: the block sees the
    /// keydown before the panel's window listener acts on it.
    pub command_panel_open: bool,
}

pub(crate) fn plan_key(input: &KeyInput<'_>) -> EditPlan {
    match input.key {
        "Backspace" => plan_backspace(input),
        "Enter" => plan_enter(input),
        "Delete" => plan_delete(input),
        _ => EditPlan::Passthrough,
    }
}

fn remove_current(input: &KeyInput<'_>) -> EditPlan {
    if input.index == 0 {
        if input.node_count > 1 {
            EditPlan::RemoveAndFocus {
                remove: 0,
                focus: 0,
                caret: CaretTarget::Start,
            }
        } else {
            EditPlan::ClearValue
        }
    } else {
        EditPlan::RemoveAndFocus {
            remove: input.index,
            focus: input.index - 1,
            caret: CaretTarget::End,
        }
    }
}

fn plan_backspace(input: &KeyInput<'_>) -> EditPlan {
    if input.all_selected || input.text.trim().is_empty() {
        return remove_current(input);
    }

    if input.caret == 0 && input.index > 0 {
        return match input.prev {
            Some(prev) if prev.node_type.is_editable_text() => EditPlan::MergeIntoPrevious {
                value: format!("{}{}", prev.value, input.text),
            },
            _ => EditPlan::Passthrough,
        };
    }

    EditPlan::Passthrough
}

fn plan_enter(input: &KeyInput<'_>) -> EditPlan {
    if input.command_panel_open {
        return EditPlan::Passthrough;
    }
    if input.text.starts_with('/') {
        return EditPlan::Suppress;
    }

    let (before, after) = split_text(input.text, input.caret);
    EditPlan::Split { before, after }
}

fn plan_delete(input: &KeyInput<'_>) -> EditPlan {
    let len = char_len(input.text);
    if input.caret < len {
        return EditPlan::Passthrough;
    }

    match input.next {
        Some(next) if next.node_type.is_editable_text() => EditPlan::MergeNext {
            value: format!("{}{}", input.text, next.value),
            caret: CaretTarget::Offset(len),
        },
        Some(_) => EditPlan::Suppress,
        None => EditPlan::Passthrough,
    }
}

/// What an image or page block does with a window keydown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKey {
    Remove,
    Activate,
}

/// Window keydown as seen by a block without editable text.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BlockKeyInput<'a> {
    pub key: &'a str,
    /// `focused_index` points at this block.
    pub focused: bool,
    /// The block's own wrapper is `document.activeElement`.
    pub owns_focus: bool,
    /// The event came from an input, textarea or contenteditable.
    pub from_text_field: bool,
    /// A caption editor or picker of this block is open.
    pub overlay_open: bool,
}

/// `focused_index` moves as soon as another block is removed, so it is not
/// enough on its own: the key must also come from this block's wrapper.
pub(crate) fn plan_block_key(input: &BlockKeyInput<'_>) -> Option<BlockKey> {
    if !input.focused || !input.owns_focus || input.from_text_field || input.overlay_open {
        return None;
    }
    match input.key {
        "Backspace" => Some(BlockKey::Remove),
        "Enter" => Some(BlockKey::Activate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;

    fn input<'a>(key: &'a str, text: &'a str, caret: usize, index: usize, count: usize) -> KeyInput<'a> {
        KeyInput {
            key,
            caret,
            all_selected: false,
            text,
            index,
            node_count: count,
            prev: None,
            next: None,
            command_panel_open: false,
        }
    }

    #[test]
    fn backspace_on_empty_first_block() {
        assert_eq!(
            plan_key(&input("Backspace", "", 0, 0, 3)),
            EditPlan::RemoveAndFocus {
                remove: 0,
                focus: 0,
                caret: CaretTarget::Start
            }
        );
        assert_eq!(plan_key(&input("Backspace", "  ", 0, 0, 1)), EditPlan::ClearValue);
    }

    #[test]
    fn backspace_with_everything_selected_removes_block() {
        let mut i = input("Backspace", "hello", 5, 2, 3);
        i.all_selected = true;
        assert_eq!(
            plan_key(&i),
            EditPlan::RemoveAndFocus {
                remove: 2,
                focus: 1,
                caret: CaretTarget::End
            }
        );
    }

    #[test]
    fn backspace_at_start_merges_into_text_previous() {
        let prev = NodeData::new("p", NodeType::Text, "abc");
        let mut i = input("Backspace", "def", 0, 1, 2);
        i.prev = Some(&prev);
        assert_eq!(
            plan_key(&i),
            EditPlan::MergeIntoPrevious {
                value: "abcdef".to_string()
            }
        );

        let image = NodeData::new("p", NodeType::Image, "a.png");
        i.prev = Some(&image);
        assert_eq!(plan_key(&i), EditPlan::Passthrough);
    }

    #[test]
    fn backspace_mid_text_is_left_to_browser() {
        assert_eq!(plan_key(&input("Backspace", "abc", 2, 1, 2)), EditPlan::Passthrough);
        assert!(!EditPlan::Passthrough.prevents_default());
    }

    #[test]
    fn enter_splits_at_caret() {
        assert_eq!(
            plan_key(&input("Enter", "hello world", 5, 0, 1)),
            EditPlan::Split {
                before: "hello".to_string(),
                after: " world".to_string()
            }
        );
    }

    #[test]
    fn enter_guards() {
        let mut i = input("Enter", "abc", 1, 0, 1);
        i.command_panel_open = true;
        assert_eq!(plan_key(&i), EditPlan::Passthrough);
        assert!(!plan_key(&i).prevents_default());

        assert_eq!(plan_key(&input("Enter", "/head", 5, 0, 1)), EditPlan::Suppress);
    }

    #[test]
    fn delete_at_end_pulls_next_block() {
        let next = NodeData::new("n", NodeType::List, "tail");
        let mut i = input("Delete", "héad", 4, 0, 2);
        i.next = Some(&next);
        assert_eq!(
            plan_key(&i),
            EditPlan::MergeNext {
                value: "héadtail".to_string(),
                caret: CaretTarget::Offset(4)
            }
        );

        i.caret = 1;
        assert_eq!(plan_key(&i), EditPlan::Passthrough);
    }

    #[test]
    fn delete_before_non_text_block_is_suppressed() {
        let next = NodeData::new("n", NodeType::Page, "child");
        let mut i = input("Delete", "x", 1, 0, 2);
        i.next = Some(&next);
        assert_eq!(plan_key(&i), EditPlan::Suppress);

        assert_eq!(plan_key(&input("Delete", "x", 1, 0, 1)), EditPlan::Passthrough);
    }

    fn block_key(key: &str) -> BlockKeyInput<'_> {
        BlockKeyInput {
            key,
            focused: true,
            owns_focus: true,
            from_text_field: false,
            overlay_open: false,
        }
    }

    #[test]
    fn focused_block_handles_its_keys() {
        assert_eq!(plan_block_key(&block_key("Backspace")), Some(BlockKey::Remove));
        assert_eq!(plan_block_key(&block_key("Enter")), Some(BlockKey::Activate));
        assert_eq!(plan_block_key(&block_key("a")), None);

        let mut i = block_key("Backspace");
        i.overlay_open = true;
        assert_eq!(plan_block_key(&i), None);
    }

    #[test]
    fn title_backspace_leaves_page_block_alone() {
        // focused_index still points at the page card, but the caret is in the title input.
        let mut i = block_key("Backspace");
        i.owns_focus = false;
        i.from_text_field = true;
        assert_eq!(plan_block_key(&i), None);
    }

    #[test]
    fn removing_empty_block_does_not_cascade_into_page_block() {
        let mut nodes = vec![
            NodeData::new("child", NodeType::Page, "abc123"),
            NodeData::new("t", NodeType::Text, ""),
        ];
        let prev = nodes[0].clone();
        let mut i = input("Backspace", "", 0, 1, nodes.len());
        i.prev = Some(&prev);
        let plan = plan_key(&i);
        assert_eq!(
            plan,
            EditPlan::RemoveAndFocus {
                remove: 1,
                focus: 0,
                caret: CaretTarget::End
            }
        );
        let EditPlan::RemoveAndFocus { remove, focus, .. } = plan else {
            unreachable!();
        };
        crate::document::remove_node_by_index(&mut nodes, remove);

        // The same keydown then reaches the page block's window listener with
        // focused_index already moved onto it.
        let mut bubbled = block_key("Backspace");
        bubbled.focused = focus == 0;
        bubbled.owns_focus = false;
        bubbled.from_text_field = true;
        assert_eq!(plan_block_key(&bubbled), None);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type, NodeType::Page);
    }
}
