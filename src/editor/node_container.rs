use super::basic_node::BasicNode;
use super::image_node::ImageNode;
use super::page_node::PageNode;
use crate::models::{NodeData, NodeType};
use crate::state::PageState;
use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    Text,
    Image,
    Page,
}

impl From<NodeType> for BlockKind {
    fn from(t: NodeType) -> Self {
        match t {
            NodeType::Image => BlockKind::Image,
            NodeType::Page => BlockKind::Page,
            _ => BlockKind::Text,
        }
    }
}

/// One row of the page: a drag handle plus the block for the node's type.
///
/// Looks the node up by id so reorders keep the same row mounted.
#[component]
pub fn NodeContainer(node_id: String) -> impl IntoView {
    let page_state = expect_context::<PageState>();
    let id = StoredValue::new(node_id);

    let node = Memo::new(move |_| {
        id.with_value(|id| {
            page_state
                .nodes
                .with(|nodes| nodes.iter().find(|n| &n.id == id).cloned())
        })
    });
    let index = Memo::new(move |_| {
        id.with_value(|id| {
            page_state
                .nodes
                .with(|nodes| nodes.iter().position(|n| &n.id == id).unwrap_or(0))
        })
    });
    // Text-like type changes keep the same block mounted.
    let kind = Memo::new(move |_| node.with(|n| n.as_ref().map(|n| BlockKind::from(n.node_type))));

    let node_signal = Signal::derive(move || {
        node.get()
            .unwrap_or_else(|| NodeData::new(id.get_value(), NodeType::Text, ""))
    });
    let index_signal = Signal::from(index);

    let drag_over: RwSignal<bool> = RwSignal::new(false);

    view! {
        <div
            class=move || {
                if drag_over.get() {
                    "group relative flex items-start gap-1 rounded-sm border-t-2 border-primary/60"
                } else {
                    "group relative flex items-start gap-1 rounded-sm border-t-2 border-transparent"
                }
            }
            on:dragover=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                if let Some(dt) = ev.data_transfer() {
                    dt.set_drop_effect("move");
                }
                drag_over.set(true);
            }
            on:dragleave=move |_ev: web_sys::DragEvent| drag_over.set(false)
            on:drop=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                drag_over.set(false);

                let dragged_id = ev
                    .data_transfer()
                    .and_then(|dt| dt.get_data("text/plain").ok())
                    .unwrap_or_default();
                if dragged_id.trim().is_empty() {
                    return;
                }
                id.with_value(|target_id| page_state.reorder_nodes(&dragged_id, target_id));
            }
        >
            <div
                class="mt-1 cursor-grab select-none px-1 text-muted-foreground opacity-0 transition-opacity group-hover:opacity-100"
                draggable="true"
                title="Drag to move"
                on:dragstart=move |ev: web_sys::DragEvent| {
                    if let Some(dt) = ev.data_transfer() {
                        let _ = dt.set_data("text/plain", &id.get_value());
                        dt.set_effect_allowed("move");
                    }
                }
            >
                "⋮⋮"
            </div>
            <div class="min-w-0 flex-1">
                {move || match kind.get() {
                    Some(BlockKind::Text) => {
                        view! { <BasicNode node=node_signal index=index_signal /> }.into_any()
                    }
                    Some(BlockKind::Image) => {
                        view! { <ImageNode node=node_signal index=index_signal /> }.into_any()
                    }
                    Some(BlockKind::Page) => {
                        view! { <PageNode node=node_signal index=index_signal /> }.into_any()
                    }
                    None => ().into_any(),
                }}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_like_types_share_a_block() {
        for t in [
            NodeType::Text,
            NodeType::List,
            NodeType::NumberedList,
            NodeType::Heading1,
            NodeType::Heading2,
            NodeType::Heading3,
        ] {
            assert_eq!(BlockKind::from(t), BlockKind::Text);
        }
        assert_eq!(BlockKind::from(NodeType::Image), BlockKind::Image);
        assert_eq!(BlockKind::from(NodeType::Page), BlockKind::Page);
    }
}
