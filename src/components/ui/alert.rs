use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-md border px-3 py-2 text-sm"}
    clx! {AlertDescription, p, "text-sm leading-relaxed"}
}

pub use components::*;
