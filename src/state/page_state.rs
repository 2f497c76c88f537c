use crate::api::{ApiClient, ApiError, ApiErrorKind, PagePatch};
use crate::document;
use crate::models::{NodeData, NodeType, Page, DEFAULT_EMOJI};
use crate::state::AppState;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Reactive document of the page currently on screen.
///
/// Every mutation updates the signals first and then writes the change back
/// without waiting; a failed write is logged and surfaced as a toast.
#[derive(Clone, Copy)]
pub(crate) struct PageState {
    api_client: RwSignal<ApiClient>,
    current_user: RwSignal<Option<crate::models::User>>,

    pub page_id: RwSignal<Option<i64>>,
    pub slug: RwSignal<String>,
    pub title: RwSignal<String>,
    pub emoji: RwSignal<String>,
    pub cover: RwSignal<Option<String>>,
    pub cover_offset_y: RwSignal<f64>,
    pub nodes: RwSignal<Vec<NodeData>>,

    /// Index of the block that should hold focus after the next render.
    pub focused_index: RwSignal<Option<usize>>,
    pub command_panel_open: RwSignal<bool>,
    pub toast: RwSignal<Option<String>>,
}

impl PageState {
    pub fn new(app: &AppState) -> Self {
        Self {
            api_client: app.api_client,
            current_user: app.current_user,
            page_id: RwSignal::new(None),
            slug: RwSignal::new(String::new()),
            title: RwSignal::new(String::new()),
            emoji: RwSignal::new(DEFAULT_EMOJI.to_string()),
            cover: RwSignal::new(None),
            cover_offset_y: RwSignal::new(0.0),
            nodes: RwSignal::new(vec![]),
            focused_index: RwSignal::new(None),
            command_panel_open: RwSignal::new(false),
            toast: RwSignal::new(None),
        }
    }

    pub fn load(&self, page: Page) {
        tracing::debug!(page_id = page.id, slug = %page.slug, nodes = page.nodes.len(), "page loaded");
        self.page_id.set(Some(page.id));
        self.slug.set(page.slug);
        self.title.set(page.title);
        self.emoji
            .set(page.emoji.unwrap_or_else(|| DEFAULT_EMOJI.to_string()));
        self.cover.set(page.cover);
        self.cover_offset_y.set(page.cover_offset_y.unwrap_or(0.0));
        self.nodes.set(page.nodes);
        self.focused_index.set(None);
        self.command_panel_open.set(false);
    }

    pub fn api_client(&self) -> ApiClient {
        self.api_client.get_untracked()
    }

    pub fn show_error(&self, message: impl Into<String>) {
        self.toast.set(Some(message.into()));
    }

    pub fn dismiss_error(&self) {
        self.toast.set(None);
    }

    /// Logs a failed backend call and tells the user. An expired session
    /// sends the user back to sign in instead.
    pub fn report(&self, err: &ApiError, message: &str) {
        tracing::error!(kind = ?err.kind, error = %err, "{message}");
        if err.kind == ApiErrorKind::Unauthorized {
            AppState {
                api_client: self.api_client,
                current_user: self.current_user,
            }
            .expire_session();
            return;
        }
        self.show_error(message);
    }

    fn persist_nodes(&self) {
        let Some(page_id) = self.page_id.get_untracked() else {
            return;
        };
        let nodes = self.nodes.get_untracked();
        let api_client = self.api_client();
        let state = *self;

        spawn_local(async move {
            if let Err(e) = api_client.update_page_nodes(page_id, nodes).await {
                state.report(&e, "Failed to save changes");
            }
        });
    }

    fn persist_patch(&self, patch: PagePatch, message: &'static str) {
        let api_client = self.api_client();
        let Some(user_id) = api_client.user_id() else {
            return;
        };
        let slug = self.slug.get_untracked();
        let state = *self;

        spawn_local(async move {
            if let Err(e) = api_client.update_page_by_slug(&slug, &user_id, &patch).await {
                state.report(&e, message);
            }
        });
    }

    fn mutate_nodes(&self, f: impl FnOnce(&mut Vec<NodeData>) -> bool) {
        let mut changed = false;
        self.nodes.update(|nodes| changed = f(nodes));
        if changed {
            self.persist_nodes();
        }
    }

    pub fn add_node(&self, node: NodeData, index: usize) {
        tracing::debug!(index, node_type = node.node_type.as_ref(), "add node");
        self.mutate_nodes(|nodes| {
            document::add_node(nodes, node, index);
            true
        });
    }

    pub fn remove_node_by_index(&self, index: usize) {
        tracing::debug!(index, "remove node");
        self.mutate_nodes(|nodes| document::remove_node_by_index(nodes, index).is_some());
    }

    pub fn change_node_value(&self, index: usize, value: &str) {
        self.mutate_nodes(|nodes| document::change_node_value(nodes, index, value));
    }

    pub fn change_node_type(&self, index: usize, node_type: NodeType) {
        tracing::debug!(index, node_type = node_type.as_ref(), "change node type");
        self.mutate_nodes(|nodes| document::change_node_type(nodes, index, node_type));
    }

    pub fn change_node_caption(&self, index: usize, caption: &str) {
        self.mutate_nodes(|nodes| document::change_node_caption(nodes, index, caption));
    }

    pub fn change_node_size(&self, index: usize, width: f64, height: f64) {
        self.mutate_nodes(|nodes| document::change_node_size(nodes, index, width, height));
    }

    pub fn reorder_nodes(&self, active_id: &str, over_id: &str) {
        tracing::debug!(active_id, over_id, "reorder nodes");
        self.mutate_nodes(|nodes| document::reorder_nodes(nodes, active_id, over_id));
    }

    /// Writes the title back. Callers debounce keystrokes.
    pub fn set_title(&self, title: String) {
        self.title.set(title.clone());
        self.persist_patch(
            PagePatch {
                title: Some(title),
                ..Default::default()
            },
            "Failed to save page title",
        );
    }

    pub fn set_cover_image(&self, path: String) {
        self.cover.set(Some(path.clone()));
        self.cover_offset_y.set(0.0);
        self.persist_patch(
            PagePatch {
                cover: Some(path),
                cover_offset_y: Some(0.0),
                ..Default::default()
            },
            "Failed to save cover image",
        );
    }

    /// `offset` is a percentage of the cover image height.
    pub fn set_cover_offset(&self, offset: f64) {
        self.cover_offset_y.set(offset);
        self.persist_patch(
            PagePatch {
                cover_offset_y: Some(offset),
                ..Default::default()
            },
            "Failed to save cover position",
        );
    }

    /// Saves the emoji and then reloads the header so title and cover
    /// reflect what the backend holds.
    pub fn set_emoji(&self, emoji: String) {
        self.emoji.set(emoji.clone());

        let api_client = self.api_client();
        let Some(user_id) = api_client.user_id() else {
            return;
        };
        let slug = self.slug.get_untracked();
        let state = *self;

        spawn_local(async move {
            let patch = PagePatch {
                emoji: Some(emoji),
                ..Default::default()
            };
            if let Err(e) = api_client.update_page_by_slug(&slug, &user_id, &patch).await {
                state.report(&e, "Failed to save page emoji");
                return;
            }
            match api_client.fetch_page_header(&slug, &user_id).await {
                Ok(Some(header)) => {
                    if let Some(emoji) = header.emoji {
                        state.emoji.set(emoji);
                    }
                    if let Some(title) = header.title {
                        state.title.set(title);
                    }
                    state.cover.set(header.cover);
                }
                Ok(None) => {}
                Err(e) => state.report(&e, "Failed to refresh page"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PageState {
        let app = AppState {
            api_client: RwSignal::new(ApiClient {
                base_url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                bucket: "images".to_string(),
                session: None,
            }),
            current_user: RwSignal::new(None),
        };
        PageState::new(&app)
    }

    #[test]
    fn unsaved_page_mutates_locally() {
        let state = state();
        state.add_node(NodeData::new("a", NodeType::Text, "one"), 0);
        state.add_node(NodeData::new("b", NodeType::Text, "two"), 1);
        state.change_node_type(1, NodeType::Heading1);
        state.reorder_nodes("b", "a");

        let nodes = state.nodes.get_untracked();
        assert_eq!(nodes[0].id, "b");
        assert_eq!(nodes[0].node_type, NodeType::Heading1);

        state.remove_node_by_index(0);
        assert_eq!(state.nodes.get_untracked().len(), 1);
    }

    #[test]
    fn load_resets_transient_ui() {
        let state = state();
        state.command_panel_open.set(true);
        state.focused_index.set(Some(3));
        state.load(Page {
            id: 9,
            slug: "s".to_string(),
            title: "T".to_string(),
            emoji: None,
            cover: None,
            cover_offset_y: Some(-20.0),
            nodes: vec![],
        });
        assert_eq!(state.page_id.get_untracked(), Some(9));
        assert_eq!(state.emoji.get_untracked(), DEFAULT_EMOJI);
        assert_eq!(state.cover_offset_y.get_untracked(), -20.0);
        assert!(!state.command_panel_open.get_untracked());
        assert!(state.focused_index.get_untracked().is_none());
    }
}
