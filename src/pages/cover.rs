use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::config::{is_mobile_viewport, DEFAULT_COVER_SRC};
use crate::state::PageState;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;

/// Keeps the image covering the banner: it may move up by the overflow, never down.
pub(crate) fn clamp_offset(tentative: f64, container_height: f64, image_height: f64) -> f64 {
    let min = (container_height - image_height).min(0.0);
    tentative.min(0.0).max(min)
}

pub(crate) fn offset_to_percent(offset_px: f64, image_height: f64) -> f64 {
    if image_height <= 0.0 {
        return 0.0;
    }
    offset_px / image_height * 100.0
}

pub(crate) fn percent_to_offset(percent: f64, image_height: f64) -> f64 {
    percent / 100.0 * image_height
}

#[component]
pub fn Cover() -> impl IntoView {
    let page_state = expect_context::<PageState>();
    let container_ref: NodeRef<html::Div> = NodeRef::new();
    let image_ref: NodeRef<html::Img> = NodeRef::new();
    let file_ref: NodeRef<html::Input> = NodeRef::new();

    let image_url: RwSignal<Option<String>> = RwSignal::new(None);
    let image_height: RwSignal<f64> = RwSignal::new(0.0);
    let container_height: RwSignal<f64> = RwSignal::new(0.0);
    let repositioning: RwSignal<bool> = RwSignal::new(false);
    let temp_offset: RwSignal<f64> = RwSignal::new(0.0);
    // Last pointer y while dragging.
    let drag_from: RwSignal<Option<f64>> = RwSignal::new(None);
    let show_buttons: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        let Some(path) = page_state.cover.get().filter(|p| !p.is_empty()) else {
            image_url.set(None);
            return;
        };
        let api_client = page_state.api_client();
        spawn_local(async move {
            match api_client.signed_image_url(&path).await {
                Ok(url) => image_url.set(Some(url)),
                Err(e) => page_state.report(&e, "Failed to load cover image"),
            }
        });
    });

    let measure = move || {
        if let (Some(img), Some(container)) = (image_ref.get_untracked(), container_ref.get_untracked()) {
            image_height.set(img.offset_height() as f64);
            container_height.set(container.offset_height() as f64);
        }
    };

    let drag_by = move |y: f64| {
        let Some(from) = drag_from.get_untracked() else {
            return;
        };
        drag_from.set(Some(y));
        temp_offset.update(|o| {
            *o = clamp_offset(
                *o + (y - from),
                container_height.get_untracked(),
                image_height.get_untracked(),
            )
        });
    };

    let mouse_move = window_event_listener(ev::mousemove, move |ev: web_sys::MouseEvent| {
        drag_by(ev.client_y() as f64);
    });
    let touch_move = window_event_listener(ev::touchmove, move |ev: web_sys::TouchEvent| {
        if let Some(touch) = ev.touches().get(0) {
            drag_by(touch.client_y() as f64);
        }
    });
    let mouse_up = window_event_listener(ev::mouseup, move |_ev: web_sys::MouseEvent| {
        drag_from.set(None);
    });
    let touch_end = window_event_listener(ev::touchend, move |_ev: web_sys::TouchEvent| {
        drag_from.set(None);
    });
    let resize = window_event_listener(ev::resize, move |_ev: web_sys::UiEvent| measure());
    on_cleanup(move || {
        mouse_move.remove();
        touch_move.remove();
        mouse_up.remove();
        touch_end.remove();
        resize.remove();
    });

    let start_reposition = move |_ev: web_sys::MouseEvent| {
        measure();
        temp_offset.set(percent_to_offset(
            page_state.cover_offset_y.get_untracked(),
            image_height.get_untracked(),
        ));
        repositioning.set(true);
    };

    let save_reposition = move |_ev: web_sys::MouseEvent| {
        let clamped = clamp_offset(
            temp_offset.get_untracked(),
            container_height.get_untracked(),
            image_height.get_untracked(),
        );
        page_state.set_cover_offset(offset_to_percent(clamped, image_height.get_untracked()));
        repositioning.set(false);
    };

    let on_file_change = move |_ev: web_sys::Event| {
        let Some(file) = file_ref
            .get_untracked()
            .and_then(|input| input.files())
            .and_then(|files| files.get(0))
        else {
            return;
        };
        let api_client = page_state.api_client();
        spawn_local(async move {
            match api_client.upload_file(&file).await {
                Ok(path) => page_state.set_cover_image(path),
                Err(e) => page_state.report(&e, "Failed to upload cover image"),
            }
            if let Some(input) = file_ref.get_untracked() {
                input.set_value("");
            }
        });
    };

    let image_style = move || {
        let offset = if repositioning.get() {
            temp_offset.get()
        } else {
            percent_to_offset(page_state.cover_offset_y.get(), image_height.get())
        };
        let cursor = match (repositioning.get(), drag_from.get().is_some()) {
            (false, _) => "default",
            (true, false) => "grab",
            (true, true) => "grabbing",
        };
        format!("transform: translateY({offset}px); cursor: {cursor};")
    };

    view! {
        <div
            node_ref=container_ref
            class="group relative h-[30vh] w-full overflow-hidden"
            on:click=move |_| {
                if is_mobile_viewport() {
                    show_buttons.update(|v| *v = !*v);
                }
            }
        >
            <img
                node_ref=image_ref
                src=move || image_url.get().unwrap_or_else(|| DEFAULT_COVER_SRC.to_string())
                alt="Cover"
                draggable="false"
                class="w-full select-none object-cover"
                style=image_style
                on:load=move |_| measure()
                on:mousedown=move |ev: web_sys::MouseEvent| {
                    if !repositioning.get_untracked() {
                        return;
                    }
                    ev.prevent_default();
                    drag_from.set(Some(ev.client_y() as f64));
                }
                on:touchstart=move |ev: web_sys::TouchEvent| {
                    if !repositioning.get_untracked() {
                        return;
                    }
                    if let Some(touch) = ev.touches().get(0) {
                        drag_from.set(Some(touch.client_y() as f64));
                    }
                }
            />
            <div class=move || {
                let visible = if show_buttons.get() || repositioning.get() {
                    "flex"
                } else {
                    "hidden group-hover:flex"
                };
                format!("absolute bottom-3 right-3 gap-2 {visible}")
            }>
                <Show
                    when=move || repositioning.get()
                    fallback=move || view! {
                        <Button
                            variant=ButtonVariant::Secondary
                            size=ButtonSize::Sm
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                if let Some(input) = file_ref.get_untracked() {
                                    input.click();
                                }
                            }
                        >
                            "Change cover photo"
                        </Button>
                        <Show when=move || image_url.with(|u| u.is_some())>
                            <Button variant=ButtonVariant::Secondary size=ButtonSize::Sm on:click=start_reposition>
                                "Reposition"
                            </Button>
                        </Show>
                    }
                >
                    <Button variant=ButtonVariant::Default size=ButtonSize::Sm on:click=save_reposition>
                        "Save"
                    </Button>
                    <Button
                        variant=ButtonVariant::Secondary
                        size=ButtonSize::Sm
                        on:click=move |_: web_sys::MouseEvent| repositioning.set(false)
                    >
                        "Cancel"
                    </Button>
                </Show>
            </div>
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
    fn offset_never_reveals_background() {
        assert_eq!(clamp_offset(20.0, 300.0, 600.0), 0.0);
        assert_eq!(clamp_offset(-500.0, 300.0, 600.0), -300.0);
        assert_eq!(clamp_offset(-120.0, 300.0, 600.0), -120.0);
    }

    #[test]
    fn short_image_cannot_move() {
        assert_eq!(clamp_offset(-50.0, 300.0, 200.0), 0.0);
        assert_eq!(clamp_offset(50.0, 300.0, 200.0), 0.0);
    }

    #[test]
    fn offset_is_stored_as_percent_of_image_height() {
        assert_eq!(offset_to_percent(-150.0, 600.0), -25.0);
        assert_eq!(percent_to_offset(-25.0, 600.0), -150.0);
        assert_eq!(offset_to_percent(-150.0, 0.0), 0.0);
    }
}
