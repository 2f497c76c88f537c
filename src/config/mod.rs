use serde::{Deserialize, Serialize};

/// How long an error toast stays on screen.
pub(crate) const TOAST_TIMEOUT_MS: i32 = 15_000;
/// Idle time before a title edit is written back.
pub(crate) const TITLE_SAVE_DEBOUNCE_MS: i32 = 200;
/// Viewport width at or below which touch-style controls are used.
pub(crate) const MOBILE_BREAKPOINT_PX: f64 = 650.0;

/// Shown when a page has no cover of its own.
pub(crate) const DEFAULT_COVER_SRC: &str = "/assets/default-cover.jpg";
pub(crate) const NOT_FOUND_IMAGE_SRC: &str = "/assets/lost-page.png";

const DEFAULT_SUPABASE_URL: &str = "http://localhost:54321";
const DEFAULT_BUCKET: &str = "images";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_bucket: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut cfg = Self {
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            supabase_anon_key: String::new(),
            storage_bucket: DEFAULT_BUCKET.to_string(),
        };

        // Deployments inject `window.ENV`; both upper and lower case keys are accepted.
        let Some(env) = web_sys::window().and_then(|w| w.get("ENV")) else {
            return cfg;
        };
        if env.is_undefined() || !env.is_object() {
            return cfg;
        }

        let read = |upper: &str, lower: &str| -> Option<String> {
            [upper, lower].iter().find_map(|k| {
                js_sys::Reflect::get(&env, &(*k).into())
                    .ok()
                    .and_then(|v| v.as_string())
            })
        };

        if let Some(url) = read("SUPABASE_URL", "supabase_url") {
            cfg.supabase_url = url;
        }
        if let Some(key) = read("SUPABASE_ANON_KEY", "supabase_anon_key") {
            cfg.supabase_anon_key = key;
        }
        if let Some(bucket) = read("STORAGE_BUCKET", "storage_bucket") {
            cfg.storage_bucket = bucket;
        }

        cfg.supabase_url = cfg.supabase_url.trim_end_matches('/').to_string();
        cfg
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_mobile_viewport() -> bool {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .map(|w| w <= MOBILE_BREAKPOINT_PX)
        .unwrap_or(false)
}
