use super::cover::Cover;
use crate::components::emoji_picker::EmojiPicker;
use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::config::TITLE_SAVE_DEBOUNCE_MS;
use crate::document::{char_len, group_nodes, NodeGroup};
use crate::editor::caret::{
    caret_coordinates, caret_offset, editable_at_index, editable_text, focus_editable_at_index,
    set_caret_from_x,
};
use crate::editor::{CaretTarget, NodeContainer};
use crate::models::{NodeData, NodeType};
use crate::state::{AppContext, PageState};
use crate::util::{clear_timeout, new_node_id, set_timeout};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::hooks::use_navigate;
use wasm_bindgen::JsCast;

/// Render layout of the node list: numbered runs share one `<ol>`.
///
/// Holds ids only, so edits inside a block leave the layout untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum BlockGroup {
    Single(String),
    Numbered(Vec<String>),
}

fn block_layout(nodes: &[NodeData]) -> Vec<BlockGroup> {
    group_nodes(nodes)
        .into_iter()
        .map(|group| match group {
            NodeGroup::Single(_, node) => BlockGroup::Single(node.id),
            NodeGroup::NumberedList(items) => {
                BlockGroup::Numbered(items.into_iter().map(|(_, node)| node.id).collect())
            }
        })
        .collect()
}

fn is_input_target(ev: &web_sys::KeyboardEvent) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        .is_some()
}

/// Moves focus to block `target`, keeping the caret's horizontal position.
fn move_focus(target: usize, upward: bool) {
    let x = caret_coordinates().map(|(x, _)| x);
    let Some(el) = editable_at_index(target) else {
        return;
    };
    let _ = el.focus();
    if let (Some(x), true) = (x, el.is_content_editable()) {
        set_caret_from_x(&el, x, upward);
    }
}

#[component]
pub fn PageView(#[prop(into)] show_back: Signal<bool>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let page_state = expect_context::<PageState>();
    let navigate = StoredValue::new(use_navigate());

    let picker_open: RwSignal<bool> = RwSignal::new(false);
    let title_timer: StoredValue<Option<i32>> = StoredValue::new(None);

    let layout = Memo::new(move |_| page_state.nodes.with(|nodes| block_layout(nodes)));

    let on_back = move |_: web_sys::MouseEvent| {
        let Some(window) = web_sys::window() else {
            return;
        };
        let history = window.history().ok();
        let length = history.as_ref().and_then(|h| h.length().ok()).unwrap_or(0);
        match history {
            Some(h) if length > 1 => {
                let _ = h.back();
            }
            _ => navigate.with_value(|nav| nav("/", Default::default())),
        }
    };

    let on_sign_out = move |_: web_sys::MouseEvent| {
        let mut api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            api_client.sign_out().await;
            app_state.0.api_client.set(api_client);
            app_state.0.current_user.set(None);
            navigate.with_value(|nav| nav("/auth", Default::default()));
        });
    };

    let on_title_input = move |ev: web_sys::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let value = input.value();
        if let Some(handle) = title_timer.get_value() {
            clear_timeout(handle);
        }
        title_timer.set_value(set_timeout(
            move || page_state.set_title(value),
            TITLE_SAVE_DEBOUNCE_MS,
        ));
    };

    let on_title_keydown = move |ev: web_sys::KeyboardEvent| {
        if ev.key() != "Enter" {
            return;
        }
        ev.prevent_default();
        page_state.add_node(NodeData::new(new_node_id(), NodeType::Text, ""), 0);
        page_state.focused_index.set(Some(0));
        focus_editable_at_index(0, CaretTarget::Start);
    };

    let on_spacer_click = move |_: web_sys::MouseEvent| {
        let end = page_state.nodes.with_untracked(|n| n.len());
        page_state.add_node(NodeData::new(new_node_id(), NodeType::Text, ""), end);
        page_state.focused_index.set(Some(end));
        focus_editable_at_index(end, CaretTarget::Start);
    };

    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if page_state.command_panel_open.get_untracked() || is_input_target(&ev) {
            return;
        }
        let Some(current) = page_state.focused_index.get_untracked() else {
            return;
        };
        let count = page_state.nodes.with_untracked(|n| n.len());

        match ev.key().as_str() {
            "ArrowUp" => {
                ev.prevent_default();
                if current > 0 {
                    move_focus(current - 1, true);
                }
            }
            "ArrowDown" => {
                ev.prevent_default();
                if current + 1 < count {
                    move_focus(current + 1, false);
                }
            }
            "Delete" => {
                let at_end = editable_at_index(current)
                    .filter(|el| el.is_content_editable())
                    .map(|el| caret_offset(&el) >= char_len(&editable_text(&el)))
                    .unwrap_or(false);
                if at_end && current + 1 < count {
                    ev.prevent_default();
                }
            }
            _ => {}
        }
    });
    on_cleanup(move || {
        key_handle.remove();
        if let Some(handle) = title_timer.get_value() {
            clear_timeout(handle);
        }
    });

    view! {
        <div class="min-h-screen bg-background pb-24">
            <div class="relative">
                <Cover />
                <Show when=move || show_back.get()>
                    <Button
                        variant=ButtonVariant::Secondary
                        size=ButtonSize::Sm
                        class="absolute left-3 top-3"
                        on:click=on_back
                    >
                        "Previous Page"
                    </Button>
                </Show>
                <Button
                    variant=ButtonVariant::Secondary
                    size=ButtonSize::Sm
                    class="absolute right-3 top-3"
                    on:click=on_sign_out
                >
                    "Sign Out"
                </Button>
                <div class="relative mx-auto -mt-10 w-full max-w-3xl px-6">
                    <button
                        type="button"
                        data-testid="emoji-option"
                        class="text-6xl"
                        on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                        on:click=move |ev: web_sys::MouseEvent| {
                            ev.stop_propagation();
                            picker_open.update(|v| *v = !*v);
                        }
                    >
                        {move || page_state.emoji.get()}
                    </button>
                    <Show when=move || picker_open.get()>
                        <EmojiPicker
                            on_pick=Callback::new(move |emoji: String| page_state.set_emoji(emoji))
                            on_close=Callback::new(move |_| picker_open.set(false))
                        />
                    </Show>
                </div>
            </div>

            <div class="mx-auto w-full max-w-3xl px-6">
                <input
                    type="text"
                    placeholder="Untitled"
                    class="mt-4 w-full bg-transparent text-4xl font-bold outline-none"
                    prop:value=move || page_state.title.get()
                    on:input=on_title_input
                    on:keydown=on_title_keydown
                />

                <div class="mt-4 flex flex-col">
                    <For
                        each=move || layout.get()
                        key=|group| group.clone()
                        children=move |group| match group {
                            BlockGroup::Single(id) => view! { <NodeContainer node_id=id /> }.into_any(),
                            BlockGroup::Numbered(ids) => view! {
                                <ol class="m-0 list-decimal pl-16">
                                    {ids
                                        .into_iter()
                                        .map(|id| view! { <li><NodeContainer node_id=id /></li> })
                                        .collect_view()}
                                </ol>
                            }
                            .into_any(),
                        }
                    />
                </div>

                <div
                    data-testid="spacer"
                    class="min-h-24 cursor-text pt-2 text-sm text-muted-foreground"
                    on:click=on_spacer_click
                >
                    <Show when=move || page_state.nodes.with(|n| n.is_empty())>
                        "Click here to start writing."
                    </Show>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, t: NodeType) -> NodeData {
        NodeData::new(id, t, "")
    }

    #[test]
    fn numbered_runs_render_as_one_group() {
        let nodes = vec![
            node("a", NodeType::Heading1),
            node("b", NodeType::NumberedList),
            node("c", NodeType::NumberedList),
            node("d", NodeType::Text),
            node("e", NodeType::NumberedList),
        ];
        assert_eq!(
            block_layout(&nodes),
            vec![
                BlockGroup::Single("a".into()),
                BlockGroup::Numbered(vec!["b".into(), "c".into()]),
                BlockGroup::Single("d".into()),
                BlockGroup::Numbered(vec!["e".into()]),
            ]
        );
    }

    #[test]
    fn layout_ignores_block_contents() {
        let mut nodes = vec![node("a", NodeType::Text), node("b", NodeType::List)];
        let before = block_layout(&nodes);
        nodes[0].value = "typed".to_string();
        assert_eq!(block_layout(&nodes), before);
    }
}
