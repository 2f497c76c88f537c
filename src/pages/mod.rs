mod cover;
mod error_message;
mod page_view;

pub use error_message::ErrorMessage;
pub use page_view::PageView;

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription,
    CardHeader, CardTitle, Input, Label, Spinner,
};
use crate::config::NOT_FOUND_IMAGE_SRC;
use crate::models::{start_page_scaffold, NewPage, Page, User, START_SLUG};
use crate::state::{AppContext, PageState};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::Redirect;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    fn title(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign in",
            AuthMode::SignUp => "Create account",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Invalid email or password",
            AuthMode::SignUp => "Failed to create account",
        }
    }
}

#[component]
pub fn AuthPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let mode: RwSignal<AuthMode> = RwSignal::new(AuthMode::SignIn);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let current_mode = mode.get_untracked();
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);
        notice.set(None);

        spawn_local(async move {
            let result = match current_mode {
                AuthMode::SignIn => api_client.sign_in(&email_val, &password_val).await.map(Some),
                AuthMode::SignUp => api_client.sign_up(&email_val, &password_val).await,
            };
            match result {
                Ok(Some(session)) => {
                    let user = session.user.clone();
                    api_client.set_session(session);
                    api_client.save_to_storage();
                    app_state.0.api_client.set(api_client);
                    app_state.0.current_user.set(Some(user));
                    navigate.with_value(|nav| nav("/", Default::default()));
                }
                Ok(None) => {
                    notice.set(Some("Check your email to confirm your account, then sign in.".to_string()));
                    mode.set(AuthMode::SignIn);
                }
                Err(e) => {
                    tracing::warn!(error = %e, mode = ?current_mode, "authentication failed");
                    error.set(Some(current_mode.failure().to_string()));
                }
            }
            loading.set(false);
        });
    };

    let toggle_mode = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        error.set(None);
        mode.update(|m| {
            *m = match m {
                AuthMode::SignIn => AuthMode::SignUp,
                AuthMode::SignUp => AuthMode::SignIn,
            }
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <span class="text-sm font-medium text-foreground">"Noted"</span>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{move || mode.get().title()}</CardTitle>
                        <CardDescription class="text-xs">"Use your email and password to continue."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            {move || {
                                error.get().map(|e| {
                                    view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                        </Alert>
                                    }
                                })
                            }}
                            {move || {
                                notice.get().map(|n| {
                                    view! {
                                        <Alert>
                                            <AlertDescription class="text-xs">{n}</AlertDescription>
                                        </Alert>
                                    }
                                })
                            }}

                            <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get()>
                                        <Spinner />
                                    </Show>
                                    {move || match (loading.get(), mode.get()) {
                                        (true, AuthMode::SignIn) => "Signing in...",
                                        (true, AuthMode::SignUp) => "Creating...",
                                        (false, _) => "Continue",
                                    }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                {move || match mode.get() {
                                    AuthMode::SignIn => "No account? ",
                                    AuthMode::SignUp => "Already have an account? ",
                                }}
                                <a class="text-primary underline underline-offset-4" href="#" on:click=toggle_mode>
                                    {move || match mode.get() {
                                        AuthMode::SignIn => "Sign up",
                                        AuthMode::SignUp => "Sign in",
                                    }}
                                </a>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// Renders `children` only with a stored session; otherwise goes to `/auth`.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=|| view! { <Redirect path="/auth" /> }>
            {move || children.with_value(|c| c())}
        </Show>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct PageRouteParams {
    pub slug: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadState {
    Loading,
    NotFound,
    Ready,
}

/// Outcome of the first lookup for a slug.
#[derive(Clone, Debug, PartialEq)]
enum Lookup {
    Found(Page),
    NotFound,
    /// The start page is missing; seed it if needed, then fetch again.
    SeedStart,
}

fn resolve_lookup(slug: &str, found: Option<Page>) -> Lookup {
    match found {
        Some(page) => Lookup::Found(page),
        None if slug == START_SLUG => Lookup::SeedStart,
        None => Lookup::NotFound,
    }
}

/// Scaffold to insert before refetching the start page. A row that exists but
/// failed to load is never overwritten.
fn start_seed(user_id: &str, start_exists: bool) -> Option<NewPage> {
    (!start_exists).then(|| start_page_scaffold(user_id))
}

/// Fetches the page for `slug`, creating the start page on first visit.
async fn load_page(api_client: &ApiClient, slug: &str) -> ApiResult<(User, Option<Page>)> {
    let user = api_client.get_user().await?;
    let found = api_client.fetch_page(slug, &user.id).await?;
    match resolve_lookup(slug, found) {
        Lookup::Found(page) => return Ok((user, Some(page))),
        Lookup::NotFound => return Ok((user, None)),
        Lookup::SeedStart => {}
    }

    let exists = api_client.page_exists(START_SLUG, &user.id).await?;
    if let Some(scaffold) = start_seed(&user.id, exists) {
        tracing::info!(user_id = %user.id, "creating start page");
        api_client.insert_page(&scaffold).await?;
    }
    let page = api_client
        .fetch_page(START_SLUG, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("start page"))?;
    Ok((user, Some(page)))
}

fn load_failure_message(err: &ApiError) -> &'static str {
    match err.kind {
        crate::api::ApiErrorKind::NotFound => "Page not found",
        _ => "Failed to load page data",
    }
}

#[component]
pub fn PageRoute() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let page_state = PageState::new(&app_state.0);
    provide_context(page_state);

    let params = use_params::<PageRouteParams>();
    let slug = Memo::new(move |_| {
        params
            .with(|p| p.as_ref().ok().and_then(|p| p.slug.clone()))
            .filter(|s| !s.is_empty())
    });

    let status: RwSignal<LoadState> = RwSignal::new(LoadState::Loading);
    let in_progress: StoredValue<bool> = StoredValue::new(false);
    // Bumped when the slug moved on while a load was still running.
    let reload: RwSignal<u32> = RwSignal::new(0);

    Effect::new(move |_| {
        reload.track();
        let requested = slug.get().unwrap_or_else(|| START_SLUG.to_string());
        if in_progress.get_value() {
            return;
        }
        in_progress.set_value(true);
        status.set(LoadState::Loading);

        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            let outcome = load_page(&api_client, &requested).await;
            in_progress.set_value(false);

            let current = slug.get_untracked().unwrap_or_else(|| START_SLUG.to_string());
            if current != requested {
                reload.update(|n| *n += 1);
                return;
            }

            match outcome {
                Ok((user, Some(page))) => {
                    app_state.0.current_user.set(Some(user));
                    page_state.load(page);
                    status.set(LoadState::Ready);
                }
                Ok((_, None)) => {
                    tracing::info!(slug = %requested, "page not found");
                    page_state.show_error("Page not found");
                    status.set(LoadState::NotFound);
                }
                Err(e) => {
                    page_state.report(&e, load_failure_message(&e));
                    status.set(LoadState::NotFound);
                }
            }
        });
    });

    let show_back = Signal::derive(move || slug.get().is_some());

    view! {
        {move || match status.get() {
            LoadState::Loading => view! {
                <div class="flex min-h-screen items-center justify-center">
                    <Spinner class="size-6" />
                </div>
            }
            .into_any(),
            LoadState::NotFound => view! { <PageNotFound /> }.into_any(),
            LoadState::Ready => view! { <PageView show_back=show_back /> }.into_any(),
        }}
        <ErrorMessage message=page_state.toast on_close=Callback::new(move |_| page_state.dismiss_error()) />
    }
}

#[component]
fn PageNotFound() -> impl IntoView {
    view! {
        <div class="mx-auto flex min-h-screen max-w-md flex-col items-center justify-center gap-4 px-4 text-center">
            <img src=NOT_FOUND_IMAGE_SRC alt="Lost page illustration" class="w-40" />
            <h1 class="text-xl font-semibold">"Oops! This page doesn't exist."</h1>
            <p class="text-sm text-muted-foreground">
                "You might have mistyped the URL, or this page has been torn from the notebook. 📔"
            </p>
            <Button
                variant=ButtonVariant::Outline
                size=ButtonSize::Sm
                on:click=move |_: web_sys::MouseEvent| {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href("/");
                    }
                }
            >
                "Return to Home"
            </Button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;

    #[test]
    fn auth_modes_have_distinct_copy() {
        assert_eq!(AuthMode::SignIn.title(), "Sign in");
        assert_eq!(AuthMode::SignUp.title(), "Create account");
        assert_ne!(AuthMode::SignIn.failure(), AuthMode::SignUp.failure());
    }

    #[test]
    fn load_failures_map_to_fixed_messages() {
        let missing = ApiError::not_found("page");
        assert_eq!(load_failure_message(&missing), "Page not found");

        let offline = ApiError {
            kind: ApiErrorKind::Network,
            message: "connection refused".to_string(),
        };
        assert_eq!(load_failure_message(&offline), "Failed to load page data");

        // A failed get_user gets the generic message.
        let expired = ApiError {
            kind: ApiErrorKind::Unauthorized,
            message: "JWT expired".to_string(),
        };
        assert_eq!(load_failure_message(&expired), "Failed to load page data");
    }

    fn page(slug: &str) -> Page {
        Page {
            id: 7,
            slug: slug.to_string(),
            title: "Notes".to_string(),
            emoji: None,
            cover: None,
            cover_offset_y: None,
            nodes: vec![],
        }
    }

    #[test]
    fn found_page_is_shown_as_is() {
        assert_eq!(resolve_lookup("abc", Some(page("abc"))), Lookup::Found(page("abc")));
        assert_eq!(
            resolve_lookup(START_SLUG, Some(page(START_SLUG))),
            Lookup::Found(page(START_SLUG))
        );
    }

    #[test]
    fn missing_child_page_is_not_found() {
        assert_eq!(resolve_lookup("gone12345678", None), Lookup::NotFound);
    }

    #[test]
    fn missing_start_page_is_seeded_only_without_a_row() {
        assert_eq!(resolve_lookup(START_SLUG, None), Lookup::SeedStart);

        let seed = start_seed("user-1", false).expect("scaffold for a new user");
        assert_eq!(seed.slug, START_SLUG);
        assert_eq!(seed.created_by, "user-1");
        assert!(!seed.nodes.is_empty());

        assert!(start_seed("user-1", true).is_none());
    }
}
