use crate::config::EnvConfig;
use crate::models::{NewPage, NodeData, Page, PageHeader, Session, User};
use crate::storage::{clear_session_storage, load_session_from_storage, save_session_to_storage};
use crate::util::storage_file_name;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    NotFound,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn not_found(what: &str) -> Self {
        Self {
            kind: ApiErrorKind::NotFound,
            message: format!("{what} not found"),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Credentials {
    pub email: String,
    pub password: String,
}

/// Partial update of a `pages` row. Unset fields are left untouched by the backend.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct PagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_offset_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeData>>,
}

const PAGE_COLUMNS: &str = "id,slug,title,emoji,cover,cover_offset_y,nodes";
const HEADER_COLUMNS: &str = "title,emoji,cover";
const SIGNED_URL_TTL_SECS: u32 = 60 * 60;

fn eq_filter(v: impl std::fmt::Display) -> String {
    format!("eq.{v}")
}

/// Client for the hosted backend: auth, the `pages` table and image storage.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) bucket: String,
    pub(crate) session: Option<Session>,
}

impl ApiClient {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            base_url: config.supabase_url,
            anon_key: config.supabase_anon_key,
            bucket: config.storage_bucket,
            session: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let mut client = Self::new(EnvConfig::new());
        client.session = load_session_from_storage();
        client
    }

    pub fn save_to_storage(&self) {
        if let Some(session) = &self.session {
            save_session_to_storage(session);
        }
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user.id.clone())
    }

    fn bearer(&self) -> String {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.anon_key.as_str());
        format!("Bearer {token}")
    }

    fn builder(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        reqwest::Client::new()
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
    }

    async fn send(req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<reqwest::Response> {
        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        req: reqwest::RequestBuilder,
        ctx: &str,
    ) -> ApiResult<T> {
        Self::send(req, ctx).await?.json().await.map_err(ApiError::parse)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let req = self
            .builder(Method::POST, "/auth/v1/token?grant_type=password")
            .json(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            });
        Self::send_json(req, "Sign in failed").await
    }

    /// Returns `None` when the backend requires email confirmation before issuing a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> ApiResult<Option<Session>> {
        let req = self.builder(Method::POST, "/auth/v1/signup").json(&Credentials {
            email: email.to_string(),
            password: password.to_string(),
        });
        let data: serde_json::Value = Self::send_json(req, "Sign up failed").await?;
        Ok(Self::parse_signup_response(data))
    }

    pub(crate) fn parse_signup_response(data: serde_json::Value) -> Option<Session> {
        if data.get("access_token").is_none() {
            return None;
        }
        serde_json::from_value(data).ok()
    }

    pub async fn get_user(&self) -> ApiResult<User> {
        if self.session.is_none() {
            return Err(ApiError::unauthorized());
        }
        Self::send_json(self.builder(Method::GET, "/auth/v1/user"), "Failed to fetch user info")
            .await
    }

    /// Invalidates the remote session (best effort) and always clears the local one.
    pub async fn sign_out(&mut self) {
        if self.session.is_some() {
            let req = self.builder(Method::POST, "/auth/v1/logout");
            if let Err(e) = Self::send(req, "Sign out failed").await {
                tracing::warn!(error = %e, "remote sign out failed");
            }
        }
        self.clear_session();
    }

    pub fn clear_session(&mut self) {
        self.session = None;
        clear_session_storage();
    }

    async fn select_pages<T: serde::de::DeserializeOwned>(
        &self,
        columns: &str,
        slug: &str,
        user_id: &str,
    ) -> ApiResult<Vec<T>> {
        let req = self.builder(Method::GET, "/rest/v1/pages").query(&[
            ("select", columns.to_string()),
            ("slug", eq_filter(slug)),
            ("created_by", eq_filter(user_id)),
            ("limit", "1".to_string()),
        ]);
        Self::send_json(req, "Failed to load page").await
    }

    pub async fn fetch_page(&self, slug: &str, user_id: &str) -> ApiResult<Option<Page>> {
        let rows: Vec<Page> = self.select_pages(PAGE_COLUMNS, slug, user_id).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn fetch_page_header(&self, slug: &str, user_id: &str) -> ApiResult<Option<PageHeader>> {
        let rows: Vec<PageHeader> = self.select_pages(HEADER_COLUMNS, slug, user_id).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn page_exists(&self, slug: &str, user_id: &str) -> ApiResult<bool> {
        let rows: Vec<serde_json::Value> = self.select_pages("id", slug, user_id).await?;
        Ok(!rows.is_empty())
    }

    pub async fn insert_page(&self, page: &NewPage) -> ApiResult<()> {
        let req = self
            .builder(Method::POST, "/rest/v1/pages")
            .header("Prefer", "return=minimal")
            .json(page);
        Self::send(req, "Failed to create page").await.map(|_| ())
    }

    pub async fn update_page_by_slug(
        &self,
        slug: &str,
        user_id: &str,
        patch: &PagePatch,
    ) -> ApiResult<()> {
        let req = self
            .builder(Method::PATCH, "/rest/v1/pages")
            .query(&[("slug", eq_filter(slug)), ("created_by", eq_filter(user_id))])
            .header("Prefer", "return=minimal")
            .json(patch);
        Self::send(req, "Failed to update page").await.map(|_| ())
    }

    pub async fn update_page_by_id(&self, id: i64, user_id: &str, patch: &PagePatch) -> ApiResult<()> {
        let req = self
            .builder(Method::PATCH, "/rest/v1/pages")
            .query(&[("id", eq_filter(id)), ("created_by", eq_filter(user_id))])
            .header("Prefer", "return=minimal")
            .json(patch);
        Self::send(req, "Failed to update page").await.map(|_| ())
    }

    pub async fn update_page_nodes(&self, id: i64, nodes: Vec<NodeData>) -> ApiResult<()> {
        let user_id = self.user_id().ok_or_else(ApiError::unauthorized)?;
        let patch = PagePatch {
            nodes: Some(nodes),
            ..Default::default()
        };
        self.update_page_by_id(id, &user_id, &patch).await
    }

    pub async fn delete_page(&self, slug: &str, user_id: &str) -> ApiResult<()> {
        let req = self
            .builder(Method::DELETE, "/rest/v1/pages")
            .query(&[("slug", eq_filter(slug)), ("created_by", eq_filter(user_id))]);
        Self::send(req, "Failed to delete page").await.map(|_| ())
    }

    fn object_path(&self, file_path: &str) -> String {
        format!(
            "{}/{}",
            urlencoding::encode(&self.bucket),
            urlencoding::encode(file_path)
        )
    }

    /// Uploads an image and returns the storage path to keep in the node or page cover.
    pub async fn upload_image(
        &self,
        file_path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<String> {
        let req = self
            .builder(
                Method::POST,
                &format!("/storage/v1/object/{}", self.object_path(file_path)),
            )
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        Self::send(req, "Failed to upload image").await?;
        Ok(file_path.to_string())
    }

    /// Reads a picked file and uploads it under a fresh object name.
    pub async fn upload_file(&self, file: &web_sys::File) -> ApiResult<String> {
        let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
            .await
            .map_err(|e| ApiError::parse(format!("failed to read file: {e:?}")))?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

        let content_type = match file.type_() {
            t if t.is_empty() => "application/octet-stream".to_string(),
            t => t,
        };
        let path = storage_file_name(&file.name());
        tracing::debug!(path = %path, size = bytes.len(), "uploading image");
        self.upload_image(&path, &content_type, bytes).await
    }

    pub async fn signed_image_url(&self, file_path: &str) -> ApiResult<String> {
        let req = self
            .builder(
                Method::POST,
                &format!("/storage/v1/object/sign/{}", self.object_path(file_path)),
            )
            .json(&serde_json::json!({ "expiresIn": SIGNED_URL_TTL_SECS }));
        let data: serde_json::Value = Self::send_json(req, "Failed to load image").await?;
        Self::parse_signed_url_response(&self.base_url, &data)
            .ok_or_else(|| ApiError::parse(format!("signed url missing in response: {data}")))
    }

    pub(crate) fn parse_signed_url_response(base_url: &str, data: &serde_json::Value) -> Option<String> {
        // Storage has returned both spellings across versions.
        let rel = data
            .get("signedURL")
            .or_else(|| data.get("signedUrl"))
            .and_then(|v| v.as_str())?;

        if rel.starts_with("http://") || rel.starts_with("https://") {
            return Some(rel.to_string());
        }
        let rel = rel.trim_start_matches('/');
        Some(format!("{base_url}/storage/v1/{rel}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;

    fn client() -> ApiClient {
        ApiClient {
            base_url: "http://localhost:54321".to_string(),
            anon_key: "anon".to_string(),
            bucket: "images".to_string(),
            session: None,
        }
    }

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: None,
            user: User {
                id: "user-1".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn test_sign_in_response_contract_deserialize() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r1",
            "user": {"id": "5f1c", "email": "u@example.com", "role": "authenticated"}
        }"#;
        let parsed: Session = serde_json::from_str(json).expect("session should parse");
        assert_eq!(parsed.access_token, "jwt");
        assert_eq!(parsed.user.id, "5f1c");
        assert_eq!(parsed.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_signup_without_session_requires_confirmation() {
        let pending = serde_json::json!({"id": "5f1c", "email": "u@example.com"});
        assert!(ApiClient::parse_signup_response(pending).is_none());

        let confirmed = serde_json::json!({
            "access_token": "jwt",
            "user": {"id": "5f1c"}
        });
        let s = ApiClient::parse_signup_response(confirmed).expect("session");
        assert_eq!(s.user.id, "5f1c");
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let mut c = client();
        assert_eq!(c.bearer(), "Bearer anon");
        c.set_session(session("jwt"));
        assert_eq!(c.bearer(), "Bearer jwt");
        assert!(c.is_authenticated());
        assert_eq!(c.user_id().as_deref(), Some("user-1"));
    }

    #[test]
    fn test_page_patch_serializes_only_set_fields() {
        let patch = PagePatch {
            title: Some("Hello".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(v, serde_json::json!({"title": "Hello"}));

        let nodes = PagePatch {
            nodes: Some(vec![NodeData::new("a", NodeType::Text, "x")]),
            cover_offset_y: Some(0.0),
            ..Default::default()
        };
        let v = serde_json::to_value(&nodes).expect("serialize");
        assert_eq!(v["nodes"][0]["type"], "text");
        assert_eq!(v["cover_offset_y"], 0.0);
        assert!(v.get("title").is_none());
    }

    #[test]
    fn test_signed_url_is_made_absolute() {
        let data = serde_json::json!({"signedURL": "/object/sign/images/a.png?token=t"});
        let url = ApiClient::parse_signed_url_response("http://h", &data).expect("url");
        assert_eq!(url, "http://h/storage/v1/object/sign/images/a.png?token=t");

        let abs = serde_json::json!({"signedUrl": "https://cdn/x.png"});
        assert_eq!(
            ApiClient::parse_signed_url_response("http://h", &abs).as_deref(),
            Some("https://cdn/x.png")
        );

        assert!(ApiClient::parse_signed_url_response("http://h", &serde_json::json!({})).is_none());
    }

    #[test]
    fn test_object_path_is_encoded() {
        assert_eq!(client().object_path("my cat.png"), "images/my%20cat.png");
    }

    #[test]
    fn test_eq_filter_format() {
        assert_eq!(eq_filter("start"), "eq.start");
        assert_eq!(eq_filter(42), "eq.42");
    }
}
