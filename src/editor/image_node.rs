use super::caret::{is_active_element, is_typing_target};
use super::{plan_block_key, BlockKey, BlockKeyInput};
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Spinner};
use crate::config::is_mobile_viewport;
use crate::models::{NodeData, NodeType};
use crate::state::PageState;
use crate::util::set_timeout;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use wasm_bindgen::JsCast;

const MIN_IMAGE_WIDTH: f64 = 80.0;

/// Width while dragging the resize handle, kept inside the editor column.
pub(crate) fn resized_width(start_width: f64, start_x: f64, x: f64, max_width: f64) -> f64 {
    (start_width + (x - start_x)).clamp(MIN_IMAGE_WIDTH, max_width.max(MIN_IMAGE_WIDTH))
}

#[component]
pub fn ImageNode(#[prop(into)] node: Signal<NodeData>, #[prop(into)] index: Signal<usize>) -> impl IntoView {
    let page_state = expect_context::<PageState>();
    let file_ref: NodeRef<html::Input> = NodeRef::new();
    let wrapper_ref: NodeRef<html::Div> = NodeRef::new();
    let img_ref: NodeRef<html::Img> = NodeRef::new();

    let loading: RwSignal<bool> = RwSignal::new(false);
    let image_url: RwSignal<Option<String>> = RwSignal::new(None);
    let caption: RwSignal<String> = RwSignal::new(node.get_untracked().caption.unwrap_or_default());
    let caption_editing: RwSignal<bool> = RwSignal::new(false);
    let width: RwSignal<Option<f64>> = RwSignal::new(node.get_untracked().width);
    // (start mouse x, start width) while the handle is held.
    let resizing: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);
    let show_buttons: RwSignal<bool> = RwSignal::new(!is_mobile_viewport());

    let is_focused = move || page_state.focused_index.get() == Some(index.get());

    let open_picker = move || {
        if let Some(input) = file_ref.get_untracked() {
            input.click();
        }
    };

    // Storage paths are private; resolve a signed url whenever the path changes.
    Effect::new(move |_| {
        let path = node.with(|n| n.value.clone());
        if path.is_empty() {
            image_url.set(None);
            return;
        }
        let api_client = page_state.api_client();
        spawn_local(async move {
            match api_client.signed_image_url(&path).await {
                Ok(url) => image_url.set(Some(url)),
                Err(e) => page_state.report(&e, "Failed to load image"),
            }
        });
    });

    // A freshly converted block asks for a file straight away.
    if node.get_untracked().value.is_empty() {
        set_timeout(open_picker, 0);
    }

    let on_file_change = move |_ev: web_sys::Event| {
        let idx = index.get_untracked();
        let Some(input) = file_ref.get_untracked() else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            page_state.change_node_value(idx, "");
            return;
        };

        loading.set(true);
        let api_client = page_state.api_client();
        spawn_local(async move {
            match api_client.upload_file(&file).await {
                Ok(path) => page_state.change_node_value(idx, &path),
                Err(e) => {
                    page_state.change_node_value(idx, "");
                    page_state.change_node_type(idx, NodeType::Text);
                    page_state.report(&e, "Failed to upload image");
                }
            }
            loading.set(false);
            if let Some(input) = file_ref.get_untracked() {
                input.set_value("");
            }
        });
    };

    let toggle_caption = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        if caption_editing.get_untracked() {
            page_state.change_node_caption(index.get_untracked(), &caption.get_untracked());
        }
        caption_editing.update(|v| *v = !*v);
    };

    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        let key = ev.key();
        let Some(action) = plan_block_key(&BlockKeyInput {
            key: &key,
            focused: page_state.focused_index.get_untracked() == Some(index.get_untracked()),
            owns_focus: wrapper_ref.get_untracked().is_some_and(|el| is_active_element(&el)),
            from_text_field: is_typing_target(ev.target()),
            overlay_open: caption_editing.get_untracked(),
        }) else {
            return;
        };
        ev.prevent_default();
        match action {
            BlockKey::Remove => page_state.remove_node_by_index(index.get_untracked()),
            BlockKey::Activate => open_picker(),
        }
    });

    let move_handle = window_event_listener(ev::mousemove, move |ev: web_sys::MouseEvent| {
        let Some((start_x, start_width)) = resizing.get_untracked() else {
            return;
        };
        let max_width = wrapper_ref
            .get_untracked()
            .map(|el| el.client_width() as f64)
            .unwrap_or(f64::MAX);
        width.set(Some(resized_width(start_width, start_x, ev.client_x() as f64, max_width)));
    });

    let up_handle = window_event_listener(ev::mouseup, move |_ev: web_sys::MouseEvent| {
        if resizing.get_untracked().is_none() {
            return;
        }
        resizing.set(None);
        let Some(img) = img_ref.get_untracked() else {
            return;
        };
        let w = width.get_untracked().unwrap_or(img.client_width() as f64);
        page_state.change_node_size(index.get_untracked(), w, img.client_height() as f64);
    });

    // On touch layouts the buttons hide again when tapping elsewhere.
    let outside_handle = window_event_listener(ev::click, move |ev: web_sys::MouseEvent| {
        if !is_mobile_viewport() {
            return;
        }
        let inside = match (wrapper_ref.get_untracked(), ev.target()) {
            (Some(wrapper), Some(target)) => target
                .dyn_into::<web_sys::Node>()
                .map(|n| wrapper.contains(Some(&n)))
                .unwrap_or(false),
            _ => false,
        };
        if !inside {
            show_buttons.set(false);
        }
    });

    on_cleanup(move || {
        key_handle.remove();
        move_handle.remove();
        up_handle.remove();
        outside_handle.remove();
    });

    view! {
        <div
            node_ref=wrapper_ref
            tabindex="0"
            data-node-index=move || index.get().to_string()
            class=move || {
                if is_focused() {
                    "relative my-2 w-full rounded-md outline-none ring-2 ring-primary/30"
                } else {
                    "relative my-2 w-full rounded-md outline-none"
                }
            }
            on:focus=move |_| page_state.focused_index.set(Some(index.get_untracked()))
            on:click=move |_| {
                page_state.focused_index.set(Some(index.get_untracked()));
                if is_mobile_viewport() {
                    show_buttons.update(|v| *v = !*v);
                }
            }
        >
            <Show
                when=move || node.with(|n| !n.value.is_empty())
                fallback=move || view! {
                    <Button variant=ButtonVariant::Outline on:click=move |_: web_sys::MouseEvent| open_picker()>
                        "Upload image"
                    </Button>
                }
            >
                <div class="group relative inline-block max-w-full">
                    <img
                        node_ref=img_ref
                        src=move || image_url.get().unwrap_or_default()
                        alt=move || caption.get()
                        class="block max-w-full rounded-md"
                        style=move || width.get().map(|w| format!("width: {w}px;")).unwrap_or_default()
                        draggable="false"
                    />
                    <div
                        class="absolute right-0 top-0 h-full w-2 cursor-ew-resize"
                        on:mousedown=move |ev: web_sys::MouseEvent| {
                            ev.prevent_default();
                            let current = img_ref
                                .get_untracked()
                                .map(|img| img.client_width() as f64)
                                .unwrap_or(0.0);
                            resizing.set(Some((ev.client_x() as f64, current)));
                        }
                    ></div>
                    <Show when=move || show_buttons.get()>
                        <div class="absolute right-2 top-2 flex gap-1">
                            <Button
                                variant=ButtonVariant::Secondary
                                size=ButtonSize::Sm
                                on:click=move |ev: web_sys::MouseEvent| {
                                    ev.stop_propagation();
                                    page_state.remove_node_by_index(index.get_untracked());
                                }
                            >
                                "Delete"
                            </Button>
                            <Button
                                variant=ButtonVariant::Secondary
                                size=ButtonSize::Sm
                                on:click=move |ev: web_sys::MouseEvent| {
                                    ev.stop_propagation();
                                    open_picker();
                                }
                            >
                                "Replace"
                            </Button>
                            <Button
                                variant=ButtonVariant::Secondary
                                size=ButtonSize::Sm
                                on:click=toggle_caption
                            >
                                {move || if caption_editing.get() { "Save" } else { "Edit Caption" }}
                            </Button>
                        </div>
                    </Show>
                </div>
                <Show when=move || loading.get()>
                    <Spinner class="mt-2" />
                </Show>
                <Show
                    when=move || caption_editing.get()
                    fallback=move || view! {
                        <p class="mt-1 text-sm text-muted-foreground">{move || caption.get()}</p>
                    }
                >
                    <input
                        type="text"
                        class="mt-1 w-full rounded-md border px-2 py-1 text-sm"
                        prop:value=move || caption.get()
                        on:input=move |ev: web_sys::Event| {
                            if let Some(input) = ev
                                .target()
                                .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                            {
                                caption.set(input.value());
                            }
                        }
                    />
                </Show>
            </Show>
            <input
                node_ref=file_ref
                type="file"
                accept="image/*"
                class="hidden"
                on:change=on_file_change
            />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_is_clamped() {
        assert_eq!(resized_width(300.0, 100.0, 150.0, 600.0), 350.0);
        assert_eq!(resized_width(300.0, 100.0, 900.0, 600.0), 600.0);
        assert_eq!(resized_width(300.0, 100.0, -400.0, 600.0), MIN_IMAGE_WIDTH);
        assert_eq!(resized_width(300.0, 0.0, 0.0, 10.0), MIN_IMAGE_WIDTH);
    }
}
