mod api;
mod app;
mod components;
mod config;
mod document;
mod editor;
mod models;
mod pages;
mod state;
mod storage;
mod util;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

/// Routes `tracing` events to the browser console.
fn init_tracing() {
    use tracing::subscriber::set_global_default;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    init_tracing();
    mount_to_body(App);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::ApiClient;
    use crate::models::{Session, User};
    use crate::storage::{clear_session_storage, load_session_from_storage};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: None,
            user: User {
                id: "user-1".to_string(),
                email: Some("u@example.com".to_string()),
            },
        }
    }

    #[wasm_bindgen_test]
    fn session_survives_reload() {
        clear_session_storage();

        let mut c = ApiClient::load_from_storage();
        assert!(!c.is_authenticated());

        c.set_session(session("t1"));
        c.save_to_storage();

        let reloaded = ApiClient::load_from_storage();
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.user_id().as_deref(), Some("user-1"));
    }

    #[wasm_bindgen_test]
    fn clearing_session_forgets_user() {
        let mut c = ApiClient::load_from_storage();
        c.set_session(session("t2"));
        c.save_to_storage();

        c.clear_session();
        assert!(!c.is_authenticated());
        assert!(load_session_from_storage().is_none());
        assert!(!ApiClient::load_from_storage().is_authenticated());
    }
}
