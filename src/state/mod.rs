mod page_state;

pub(crate) use page_state::PageState;

use crate::api::ApiClient;
use crate::models::User;
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<User>>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let stored_user = stored_client.session.as_ref().map(|s| s.user.clone());

        Self {
            api_client: RwSignal::new(stored_client),
            current_user: RwSignal::new(stored_user),
        }
    }

    /// Drops the local session and sends the user back to the sign in screen.
    pub fn expire_session(&self) {
        self.api_client.update(|c| c.clear_session());
        self.current_user.set(None);
        if let Some(window) = web_sys::window() {
            let _ = window.location().set_href("/auth");
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
