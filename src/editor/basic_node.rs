use super::caret;
use super::command_panel::CommandPanel;
use super::{plan_key, CaretTarget, EditPlan, KeyInput};
use crate::document::command_residue;
use crate::models::{NewPage, NodeData, NodeType, DEFAULT_EMOJI, DEFAULT_TITLE};
use crate::state::PageState;
use crate::util::{new_node_id, new_page_slug};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;

fn text_class(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Heading1 => "text-3xl font-bold leading-tight mt-6",
        NodeType::Heading2 => "text-2xl font-semibold leading-tight mt-4",
        NodeType::Heading3 => "text-xl font-semibold leading-snug mt-3",
        _ => "text-base leading-relaxed",
    }
}

/// Contenteditable block for text, list, numbered list and heading types.
#[component]
pub fn BasicNode(#[prop(into)] node: Signal<NodeData>, #[prop(into)] index: Signal<usize>) -> impl IntoView {
    let page_state = expect_context::<PageState>();
    let el_ref: NodeRef<html::Div> = NodeRef::new();

    let text: RwSignal<String> = RwSignal::new(node.get_untracked().value);
    let has_focus: RwSignal<bool> = RwSignal::new(false);

    // The DOM owns the text while the block is being edited.
    Effect::new(move |_| {
        let value = node.with(|n| n.value.clone());
        let Some(el) = el_ref.get() else {
            return;
        };
        if has_focus.get_untracked() {
            return;
        }
        if caret::editable_text(&el) != value {
            el.set_text_content(Some(&value));
        }
        text.set(value);
    });

    Effect::new(move |_| {
        if page_state.focused_index.get() != Some(index.get()) {
            return;
        }
        let Some(el) = el_ref.get() else {
            return;
        };
        if !caret::is_active_element(&el) {
            let _ = el.focus();
        }
    });

    let on_input = move |_ev: web_sys::Event| {
        let Some(el) = el_ref.get_untracked() else {
            return;
        };
        let value = caret::editable_text(&el);
        text.set(value.clone());
        page_state.change_node_value(index.get_untracked(), &value);
    };

    let on_select = Callback::new(move |node_type: NodeType| {
        let idx = index.get_untracked();
        let Some(el) = el_ref.get_untracked() else {
            return;
        };
        let value = command_residue(&caret::editable_text(&el));
        el.set_text_content(Some(&value));
        text.set(value.clone());

        if node_type == NodeType::Page {
            let api_client = page_state.api_client();
            let Some(user_id) = api_client.user_id() else {
                return;
            };
            let slug = new_page_slug();
            let new_page = NewPage {
                slug: slug.clone(),
                title: DEFAULT_TITLE.to_string(),
                emoji: Some(DEFAULT_EMOJI.to_string()),
                cover: None,
                nodes: vec![],
                created_by: user_id,
            };
            spawn_local(async move {
                match api_client.insert_page(&new_page).await {
                    Ok(()) => {
                        tracing::debug!(slug = %slug, "child page created");
                        page_state.change_node_value(idx, &slug);
                        page_state.change_node_type(idx, NodeType::Page);
                    }
                    Err(e) => page_state.report(&e, "Failed to create page"),
                }
            });
            return;
        }

        page_state.change_node_value(idx, &value);
        page_state.change_node_type(idx, node_type);
        page_state.focused_index.set(Some(idx));
        caret::focus_editable_at_index(idx, CaretTarget::End);
    });

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        let Some(el) = el_ref.get_untracked() else {
            return;
        };
        let idx = index.get_untracked();
        let value = caret::editable_text(&el);
        let nodes = page_state.nodes.get_untracked();
        let key = ev.key();

        let plan = plan_key(&KeyInput {
            key: &key,
            caret: caret::caret_offset(&el),
            all_selected: caret::is_all_selected(&el),
            text: &value,
            index: idx,
            node_count: nodes.len(),
            prev: idx.checked_sub(1).and_then(|i| nodes.get(i)),
            next: nodes.get(idx + 1),
            command_panel_open: page_state.command_panel_open.get_untracked(),
        });
        if plan.prevents_default() {
            ev.prevent_default();
        }

        match plan {
            EditPlan::Passthrough | EditPlan::Suppress => {}
            EditPlan::ClearValue => {
                page_state.change_node_value(idx, "");
                el.set_text_content(None);
                text.set(String::new());
                caret::set_caret_at_start(&el);
            }
            EditPlan::RemoveAndFocus { remove, focus, caret: target } => {
                page_state.remove_node_by_index(remove);
                page_state.focused_index.set(Some(focus));
                caret::focus_editable_at_index(focus, target);
            }
            EditPlan::MergeIntoPrevious { value } => {
                let prev = idx.saturating_sub(1);
                page_state.change_node_value(prev, &value);
                page_state.remove_node_by_index(idx);
                page_state.focused_index.set(Some(prev));
                caret::focus_editable_at_index(prev, CaretTarget::End);
            }
            EditPlan::MergeNext { value, caret: at } => {
                page_state.change_node_value(idx, &value);
                page_state.remove_node_by_index(idx + 1);
                el.set_text_content(Some(&value));
                text.set(value);
                caret::place_caret(&el, at);
            }
            EditPlan::Split { before, after } => {
                page_state.change_node_value(idx, &before);
                el.set_text_content(Some(&before));
                text.set(before);

                let node_type = node.with_untracked(|n| n.node_type);
                page_state.add_node(NodeData::new(new_node_id(), node_type, after), idx + 1);
                page_state.focused_index.set(Some(idx + 1));
                caret::focus_editable_at_index(idx + 1, CaretTarget::Start);
            }
        }
    };

    let show_panel = move || has_focus.get() && text.with(|t| t.starts_with('/'));

    view! {
        <div class="relative flex w-full items-start gap-2">
            <Show when=move || node.with(|n| n.node_type == NodeType::List)>
                <span class="select-none pt-[2px] text-muted-foreground">"•"</span>
            </Show>
            <div
                node_ref=el_ref
                contenteditable="true"
                spellcheck="true"
                data-node-index=move || index.get().to_string()
                data-node-id=move || node.with(|n| n.id.clone())
                class=move || {
                    format!(
                        "min-h-[1.5em] w-full whitespace-pre-wrap break-words outline-none {}",
                        text_class(node.with(|n| n.node_type)),
                    )
                }
                on:input=on_input
                on:keydown=on_keydown
                on:focus=move |_| {
                    has_focus.set(true);
                    page_state.focused_index.set(Some(index.get_untracked()));
                }
                on:blur=move |_| has_focus.set(false)
                on:click=move |_| page_state.focused_index.set(Some(index.get_untracked()))
            ></div>
            <Show when=show_panel>
                <CommandPanel query=Signal::derive(move || text.get()) on_select=on_select />
            </Show>
        </div>
    }
}
