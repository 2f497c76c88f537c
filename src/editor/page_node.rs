use super::caret::{is_active_element, is_typing_target};
use super::{plan_block_key, BlockKey, BlockKeyInput};
use crate::api::PagePatch;
use crate::components::emoji_picker::EmojiPicker;
use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::config::DEFAULT_COVER_SRC;
use crate::models::{NodeData, PageHeader, DEFAULT_EMOJI, DEFAULT_TITLE};
use crate::state::PageState;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::hooks::use_navigate;

/// Link block to a child page, shown as a small card with the child's header.
#[component]
pub fn PageNode(#[prop(into)] node: Signal<NodeData>, #[prop(into)] index: Signal<usize>) -> impl IntoView {
    let page_state = expect_context::<PageState>();
    let navigate = StoredValue::new(use_navigate());
    let wrapper_ref: NodeRef<html::Div> = NodeRef::new();

    let header: RwSignal<PageHeader> = RwSignal::new(PageHeader::default());
    let cover_url: RwSignal<Option<String>> = RwSignal::new(None);
    let picker_open: RwSignal<bool> = RwSignal::new(false);

    let slug = move || node.with(|n| n.value.clone());
    let is_focused = move || page_state.focused_index.get() == Some(index.get());

    let open_page = move || {
        let target = format!("/{}", slug());
        navigate.with_value(|nav| nav(&target, Default::default()));
    };

    Effect::new(move |_| {
        let slug = slug();
        if slug.is_empty() {
            return;
        }
        let api_client = page_state.api_client();
        let Some(user_id) = api_client.user_id() else {
            return;
        };
        spawn_local(async move {
            let loaded = match api_client.fetch_page_header(&slug, &user_id).await {
                Ok(h) => h.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "child page header unavailable");
                    return;
                }
            };
            let url = match loaded.cover.as_deref() {
                Some(path) if !path.is_empty() => api_client.signed_image_url(path).await.ok(),
                _ => None,
            };
            header.set(loaded);
            cover_url.set(url);
        });
    });

    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        let key = ev.key();
        let Some(action) = plan_block_key(&BlockKeyInput {
            key: &key,
            focused: page_state.focused_index.get_untracked() == Some(index.get_untracked()),
            owns_focus: wrapper_ref.get_untracked().is_some_and(|el| is_active_element(&el)),
            from_text_field: is_typing_target(ev.target()),
            overlay_open: picker_open.get_untracked(),
        }) else {
            return;
        };
        ev.prevent_default();
        match action {
            BlockKey::Remove => page_state.remove_node_by_index(index.get_untracked()),
            BlockKey::Activate => open_page(),
        }
    });
    on_cleanup(move || key_handle.remove());

    let on_delete = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let api_client = page_state.api_client();
        let Some(user_id) = api_client.user_id() else {
            return;
        };
        let slug = slug();
        let idx = index.get_untracked();
        spawn_local(async move {
            match api_client.delete_page(&slug, &user_id).await {
                Ok(()) => {
                    tracing::debug!(slug = %slug, "child page deleted");
                    page_state.remove_node_by_index(idx);
                }
                Err(e) => page_state.report(&e, "Failed to delete page"),
            }
        });
    };

    let on_pick = Callback::new(move |emoji: String| {
        header.update(|h| h.emoji = Some(emoji.clone()));
        let api_client = page_state.api_client();
        let Some(user_id) = api_client.user_id() else {
            return;
        };
        let slug = slug();
        spawn_local(async move {
            let patch = PagePatch {
                emoji: Some(emoji),
                ..Default::default()
            };
            if let Err(e) = api_client.update_page_by_slug(&slug, &user_id, &patch).await {
                page_state.report(&e, "Failed to save page emoji");
            }
        });
    });

    view! {
        <div
            node_ref=wrapper_ref
            tabindex="0"
            data-node-index=move || index.get().to_string()
            class=move || {
                if is_focused() {
                    "group relative my-2 w-full max-w-sm rounded-lg border outline-none ring-2 ring-primary/30"
                } else {
                    "group relative my-2 w-full max-w-sm rounded-lg border outline-none"
                }
            }
            on:focus=move |_| page_state.focused_index.set(Some(index.get_untracked()))
            on:click=move |_| page_state.focused_index.set(Some(index.get_untracked()))
        >
            <img
                src=move || cover_url.get().unwrap_or_else(|| DEFAULT_COVER_SRC.to_string())
                alt=move || if cover_url.with(|c| c.is_some()) { "Page cover" } else { "Default cover" }
                class="h-24 w-full cursor-pointer rounded-t-lg object-cover"
                on:click=move |_| open_page()
            />
            <div class="relative flex items-center gap-2 px-3 py-2">
                <button
                    type="button"
                    class="text-2xl"
                    on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        picker_open.update(|v| *v = !*v);
                    }
                >
                    {move || header.with(|h| h.emoji.clone()).unwrap_or_else(|| DEFAULT_EMOJI.to_string())}
                </button>
                <span class="flex-1 cursor-pointer truncate font-medium" on:click=move |_| open_page()>
                    {move || {
                        header
                            .with(|h| h.title.clone())
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
                    }}
                </span>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    class="opacity-0 group-hover:opacity-100"
                    attr:title="Delete this page"
                    on:click=on_delete
                >
                    "Delete"
                </Button>
                <Show when=move || picker_open.get()>
                    <EmojiPicker on_pick=on_pick on_close=Callback::new(move |_| picker_open.set(false)) />
                </Show>
            </div>
        </div>
    }
}
