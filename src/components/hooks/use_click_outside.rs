use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use wasm_bindgen::JsCast;

/// Calls `on_outside` for every mousedown or touchstart whose target is not
/// inside `target`. The listeners go away with the calling component.
pub fn use_click_outside(target: NodeRef<html::Div>, on_outside: impl Fn() + Clone + 'static) {
    let is_outside = move |ev_target: Option<web_sys::EventTarget>| {
        let Some(el) = target.get_untracked() else {
            return false;
        };
        let Some(node) = ev_target.and_then(|t| t.dyn_into::<web_sys::Node>().ok()) else {
            return false;
        };
        !el.contains(Some(&node))
    };

    let on_mouse = on_outside.clone();
    let mouse = window_event_listener(ev::mousedown, move |ev: web_sys::MouseEvent| {
        if is_outside(ev.target()) {
            on_mouse();
        }
    });
    let touch = window_event_listener(ev::touchstart, move |ev: web_sys::TouchEvent| {
        if is_outside(ev.target()) {
            on_outside();
        }
    });

    on_cleanup(move || {
        mouse.remove();
        touch.remove();
    });
}
