use uuid::Uuid;
use wasm_bindgen::JsCast;

pub(crate) fn new_node_id() -> String {
    Uuid::new_v4().to_string()
}

/// Short url-safe slug for newly created pages.
pub(crate) fn new_page_slug() -> String {
    let mut s = Uuid::new_v4().simple().to_string();
    s.truncate(12);
    s
}

/// Storage object name for an uploaded file, keeping the original extension.
pub(crate) fn storage_file_name(original_name: &str) -> String {
    let ext = original_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// Runs `f` once after `ms` milliseconds. Returns the timer handle.
pub(crate) fn set_timeout(f: impl FnOnce() + 'static, ms: i32) -> Option<i32> {
    web_sys::window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            wasm_bindgen::closure::Closure::once_into_js(f).as_ref().unchecked_ref(),
            ms,
        )
        .ok()
}

pub(crate) fn clear_timeout(handle: i32) {
    if let Some(window) = web_sys::window() {
        window.clear_timeout_with_handle(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_short_and_distinct() {
        let a = new_page_slug();
        let b = new_page_slug();
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
    }

    #[test]
    fn storage_name_keeps_lowercased_extension() {
        assert!(storage_file_name("Cat.PNG").ends_with(".png"));
        assert!(!storage_file_name("noext").contains('.'));
        assert!(!storage_file_name("weird.tar/../x").ends_with("x"));
    }
}
