use crate::components::hooks::use_dismiss_after;
use crate::config::TOAST_TIMEOUT_MS;
use leptos::prelude::*;

/// Bottom toast bound to `message`; hidden while it is `None`.
#[component]
pub fn ErrorMessage(
    message: RwSignal<Option<String>>,
    #[prop(optional)] on_close: Option<Callback<()>>,
) -> impl IntoView {
    use_dismiss_after(message, TOAST_TIMEOUT_MS);

    view! {
        <Show when=move || message.with(|m| m.is_some())>
            <div
                role="alert"
                data-testid="error-message"
                class="fixed bottom-6 left-1/2 z-50 flex -translate-x-1/2 items-center gap-3 rounded-md border border-destructive/30 bg-background px-4 py-2 text-sm text-destructive shadow-md"
            >
                <span class="underline underline-offset-4">{move || message.get().unwrap_or_default()}</span>
                {on_close.map(|close| view! {
                    <button
                        type="button"
                        aria-label="Close"
                        class="text-lg leading-none text-muted-foreground hover:text-foreground"
                        on:click=move |_| close.run(())
                    >
                        "×"
                    </button>
                })}
            </div>
        </Show>
    }
}
