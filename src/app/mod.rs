use crate::pages::{AuthPage, PageRoute, RootAuthed};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("auth") view=AuthPage />
                <Route path=path!(":slug") view=move || view! {
                    <RootAuthed>
                        <PageRoute />
                    </RootAuthed>
                } />
                <Route path=path!("") view=move || view! {
                    <RootAuthed>
                        <PageRoute />
                    </RootAuthed>
                } />
            </Routes>
        </Router>
    }
}
