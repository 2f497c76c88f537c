use crate::components::ui::{CommandGroupLabel, CommandList};
use crate::document::PLACEHOLDER;
use crate::models::NodeType;
use crate::state::PageState;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

/// Block types offered by the slash menu, in display order.
pub(crate) const COMMANDS: [NodeType; 8] = [
    NodeType::Text,
    NodeType::List,
    NodeType::NumberedList,
    NodeType::Page,
    NodeType::Image,
    NodeType::Heading1,
    NodeType::Heading2,
    NodeType::Heading3,
];

pub(crate) fn normalize_query(text: &str) -> String {
    text.to_lowercase()
        .replace('/', "")
        .replace(PLACEHOLDER, "")
        .trim()
        .to_string()
}

/// Index of the first command whose wire name or label matches the typed text.
pub(crate) fn match_index(text: &str) -> usize {
    let q = normalize_query(text);
    COMMANDS
        .iter()
        .position(|t| {
            let value = t.as_ref().to_lowercase();
            let name = t.label().to_lowercase();
            value.starts_with(&q) || name.starts_with(&q) || value.contains(&q) || name.contains(&q)
        })
        .unwrap_or(0)
}

pub(crate) fn step_selection(current: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if down {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}

#[component]
pub fn CommandPanel(
    /// Raw text of the block, including the leading `/`.
    #[prop(into)]
    query: Signal<String>,
    on_select: Callback<NodeType>,
) -> impl IntoView {
    let page_state = expect_context::<PageState>();
    let selected: RwSignal<usize> = RwSignal::new(match_index(&query.get_untracked()));
    let open_upward: RwSignal<bool> = RwSignal::new(false);
    let panel_ref: NodeRef<html::Div> = NodeRef::new();

    page_state.command_panel_open.set(true);
    on_cleanup(move || page_state.command_panel_open.set(false));

    Effect::new(move |_| {
        selected.set(match_index(&query.get()));
    });

    // Flip above the block when the menu would run past the viewport bottom.
    Effect::new(move |_| {
        let Some(el) = panel_ref.get() else {
            return;
        };
        let rect = el.get_bounding_client_rect();
        let viewport = web_sys::window()
            .and_then(|w| w.inner_height().ok())
            .and_then(|v| v.as_f64())
            .unwrap_or(f64::MAX);
        open_upward.set(rect.bottom() > viewport);
    });

    let handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        match ev.key().as_str() {
            "ArrowDown" | "ArrowUp" => {
                ev.prevent_default();
                let down = ev.key() == "ArrowDown";
                selected.update(|i| *i = step_selection(*i, COMMANDS.len(), down));
            }
            "Enter" => {
                ev.prevent_default();
                if let Some(t) = COMMANDS.get(selected.get_untracked()) {
                    on_select.run(*t);
                }
            }
            _ => {}
        }
    });
    on_cleanup(move || handle.remove());

    view! {
        <div
            node_ref=panel_ref
            data-name="CommandPanel"
            class=move || {
                let side = if open_upward.get() { "bottom-full mb-1" } else { "top-full mt-1" };
                format!(
                    "absolute left-0 z-50 w-64 rounded-md border bg-popover p-1 text-popover-foreground shadow-md {side}"
                )
            }
        >
            <CommandGroupLabel>"Blocks"</CommandGroupLabel>
            <CommandList>
                {COMMANDS
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let t = *t;
                        view! {
                            <div
                                data-name="CommandItem"
                                aria-selected=move || (selected.get() == i).to_string()
                                class=move || {
                                    if selected.get() == i {
                                        "flex cursor-pointer items-center rounded-sm px-2 py-1.5 text-sm bg-accent text-accent-foreground"
                                    } else {
                                        "flex cursor-pointer items-center rounded-sm px-2 py-1.5 text-sm hover:bg-muted"
                                    }
                                }
                                on:mousedown=move |ev: web_sys::MouseEvent| {
                                    // Keep focus in the block being edited.
                                    ev.prevent_default();
                                    on_select.run(t);
                                }
                            >
                                {t.label()}
                            </div>
                        }
                    })
                    .collect_view()}
            </CommandList>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_normalized() {
        assert_eq!(normalize_query("/Head\u{200B} "), "head");
        assert_eq!(normalize_query("/"), "");
    }

    #[test]
    fn empty_query_selects_first() {
        assert_eq!(match_index("/"), 0);
        assert_eq!(match_index("/zzz"), 0);
    }

    #[test]
    fn matches_by_value_or_label() {
        assert_eq!(COMMANDS[match_index("/numbered")], NodeType::NumberedList);
        assert_eq!(COMMANDS[match_index("/heading 2")], NodeType::Heading2);
        assert_eq!(COMMANDS[match_index("/heading3")], NodeType::Heading3);
        assert_eq!(COMMANDS[match_index("/IMG")], NodeType::Text);
        assert_eq!(COMMANDS[match_index("/ima")], NodeType::Image);
        // "list" is contained in "numberedList" too, but List comes first.
        assert_eq!(COMMANDS[match_index("/list")], NodeType::List);
    }

    #[test]
    fn arrow_selection_wraps() {
        assert_eq!(step_selection(7, 8, true), 0);
        assert_eq!(step_selection(0, 8, false), 7);
        assert_eq!(step_selection(3, 8, true), 4);
        assert_eq!(step_selection(0, 0, true), 0);
    }
}
