use crate::components::hooks::use_click_outside;
use leptos::html;
use leptos::prelude::*;

pub const PAGE_EMOJIS: [&str; 40] = [
    "📃", "📄", "📝", "📒", "📓", "📔", "📕", "📗", "📘", "📙", "📚", "📌", "📎", "🗂️", "🗒️",
    "🗓️", "✅", "⭐", "🔥", "💡", "🚀", "🎯", "🎨", "🎵", "🧠", "💼", "🏠", "🌱", "🌍", "☀️",
    "🌙", "⚡", "❤️", "😀", "😎", "🤔", "🙌", "🍀", "🐱", "🐶",
];

/// Popover grid of page icons. Closes on pick or on any press outside it.
#[component]
pub fn EmojiPicker(on_pick: Callback<String>, on_close: Callback<()>) -> impl IntoView {
    let panel_ref: NodeRef<html::Div> = NodeRef::new();
    use_click_outside(panel_ref, move || on_close.run(()));

    view! {
        <div
            node_ref=panel_ref
            role="dialog"
            data-name="EmojiPicker"
            class="absolute left-0 top-full z-50 mt-2 grid w-72 grid-cols-8 gap-1 rounded-md border bg-popover p-2 shadow-md"
        >
            {PAGE_EMOJIS
                .iter()
                .map(|emoji| {
                    let emoji = emoji.to_string();
                    let label = emoji.clone();
                    view! {
                        <button
                            type="button"
                            class="flex size-8 items-center justify-center rounded-md text-xl hover:bg-muted"
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                on_pick.run(emoji.clone());
                                on_close.run(());
                            }
                        >
                            {label}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}
