use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {CommandGroupLabel, div, "text-muted-foreground px-2 py-1.5 text-xs font-medium"}
    clx! {CommandList, div, "overflow-y-auto overflow-x-hidden max-h-[300px] scroll-py-1"}
}

pub use components::*;
