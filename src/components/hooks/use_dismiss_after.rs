use crate::util::{clear_timeout, set_timeout};
use leptos::prelude::*;

/// Clears `message` `ms` milliseconds after it was last set.
pub fn use_dismiss_after(message: RwSignal<Option<String>>, ms: i32) {
    let pending: StoredValue<Option<i32>> = StoredValue::new(None);

    Effect::new(move |_| {
        let shown = message.with(|m| m.is_some());
        if let Some(handle) = pending.get_value() {
            clear_timeout(handle);
            pending.set_value(None);
        }
        if shown {
            pending.set_value(set_timeout(move || message.set(None), ms));
        }
    });
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use leptos::task::Executor;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    #[wasm_bindgen_test]
    async fn message_clears_after_quiet_period() {
        let _ = Executor::init_wasm_bindgen();
        let owner = Owner::new();
        owner.set();

        let message: RwSignal<Option<String>> = RwSignal::new(None);
        use_dismiss_after(message, 200);

        message.set(Some("first".to_string()));
        sleep(120).await;
        assert!(message.get_untracked().is_some());

        // A new message restarts the countdown.
        message.set(Some("second".to_string()));
        sleep(120).await;
        assert_eq!(message.get_untracked().as_deref(), Some("second"));

        sleep(200).await;
        assert_eq!(message.get_untracked(), None);
        drop(owner);
    }
}
