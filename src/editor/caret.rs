//! DOM selection helpers for contenteditable blocks.
//!
//! Offsets are counted in chars of the block text with the zero-width
//! placeholder removed, matching the values stored in `NodeData`.

use super::CaretTarget;
use crate::document::PLACEHOLDER;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, Node, Range, Selection};

const SHOW_TEXT: u32 = 0x4;

fn selection() -> Option<Selection> {
    web_sys::window()?.get_selection().ok().flatten()
}

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

fn visible_chars(s: &str) -> usize {
    s.chars().filter(|c| *c != PLACEHOLDER).count()
}

/// UTF-16 offset inside `text` after skipping `chars` visible chars.
fn utf16_offset_for(text: &str, chars: usize) -> u32 {
    let mut seen = 0;
    let mut units = 0u32;
    for c in text.chars() {
        if seen == chars {
            break;
        }
        units += c.len_utf16() as u32;
        if c != PLACEHOLDER {
            seen += 1;
        }
    }
    units
}

/// Current block text as stored in the document.
pub(crate) fn editable_text(el: &HtmlElement) -> String {
    el.text_content()
        .unwrap_or_default()
        .replace(PLACEHOLDER, "")
}

fn selection_in(el: &HtmlElement) -> Option<(Selection, Range)> {
    let sel = selection()?;
    if sel.range_count() == 0 {
        return None;
    }
    let range = sel.get_range_at(0).ok()?;
    let container = range.end_container().ok()?;
    if !el.contains(Some(&container)) {
        return None;
    }
    Some((sel, range))
}

/// Caret position in chars from the start of the block, or 0 when the
/// selection is elsewhere.
pub(crate) fn caret_offset(el: &HtmlElement) -> usize {
    let Some((_, range)) = selection_in(el) else {
        return 0;
    };
    let Some(doc) = document() else {
        return 0;
    };
    let Ok(pre) = doc.create_range() else {
        return 0;
    };
    if pre.select_node_contents(el).is_err() {
        return 0;
    }
    let (Ok(node), Ok(offset)) = (range.end_container(), range.end_offset()) else {
        return 0;
    };
    if pre.set_end(&node, offset).is_err() {
        return 0;
    }
    visible_chars(&String::from(pre.to_string()))
}

pub(crate) fn is_all_selected(el: &HtmlElement) -> bool {
    let Some((sel, _)) = selection_in(el) else {
        return false;
    };
    if sel.is_collapsed() {
        return false;
    }
    let selected = String::from(sel.to_string()).replace(PLACEHOLDER, "");
    let text = editable_text(el);
    !text.is_empty() && selected.trim() == text.trim()
}

/// Makes sure an empty block holds exactly one placeholder and a
/// non-empty one holds none.
pub(crate) fn normalize_placeholder(el: &HtmlElement) {
    let raw = el.text_content().unwrap_or_default();
    let clean = raw.replace(PLACEHOLDER, "");
    if clean.is_empty() {
        if raw != PLACEHOLDER.to_string() {
            el.set_text_content(Some(&PLACEHOLDER.to_string()));
        }
    } else if clean.len() != raw.len() {
        el.set_text_content(Some(&clean));
    }
}

fn apply_range(range: &Range) {
    if let Some(sel) = selection() {
        let _ = sel.remove_all_ranges();
        let _ = sel.add_range(range);
    }
}

/// Text node and UTF-16 offset holding the `chars`-th visible char.
fn text_position(el: &HtmlElement, chars: usize) -> Option<(Node, u32)> {
    let walker = document()?
        .create_tree_walker_with_what_to_show(el, SHOW_TEXT)
        .ok()?;

    let mut remaining = chars;
    let mut last: Option<(Node, u32)> = None;
    while let Ok(Some(node)) = walker.next_node() {
        let text = node.text_content().unwrap_or_default();
        let len = visible_chars(&text);
        if remaining <= len {
            let offset = utf16_offset_for(&text, remaining);
            return Some((node, offset));
        }
        remaining -= len;
        last = Some((node, text.encode_utf16().count() as u32));
    }
    last
}

fn range_at(el: &HtmlElement, chars: usize) -> Option<Range> {
    let (node, offset) = text_position(el, chars)?;
    let range = document()?.create_range().ok()?;
    range.set_start(&node, offset).ok()?;
    range.collapse_with_to_start(true);
    Some(range)
}

pub(crate) fn set_caret_at_offset(el: &HtmlElement, chars: usize) {
    normalize_placeholder(el);
    if let Some(range) = range_at(el, chars) {
        apply_range(&range);
        return;
    }

    tracing::trace!(chars, "no text node for caret, collapsing to contents");
    let Some(range) = document().and_then(|d| d.create_range().ok()) else {
        return;
    };
    if range.select_node_contents(el).is_ok() {
        range.collapse_with_to_start(false);
        apply_range(&range);
    }
}

pub(crate) fn set_caret_at_start(el: &HtmlElement) {
    set_caret_at_offset(el, 0);
}

pub(crate) fn set_caret_at_end(el: &HtmlElement) {
    let len = visible_chars(&el.text_content().unwrap_or_default());
    set_caret_at_offset(el, len);
}

/// Viewport coordinates of the caret. Collapsed ranges in empty blocks
/// report a zero rect, so the block's own box is used instead.
pub(crate) fn caret_coordinates() -> Option<(f64, f64)> {
    let sel = selection()?;
    if sel.range_count() == 0 {
        return None;
    }
    let range = sel.get_range_at(0).ok()?.clone_range();
    range.collapse_with_to_start(true);
    let rect = range.get_bounding_client_rect();
    if rect.x() != 0.0 || rect.y() != 0.0 {
        return Some((rect.x(), rect.y()));
    }

    let el = range
        .start_container()
        .ok()
        .and_then(|n| n.parent_element().or_else(|| n.dyn_into::<web_sys::Element>().ok()))?;
    let rect = el.get_bounding_client_rect();
    Some((rect.x(), rect.y()))
}

/// Places the caret on the first (or last) visual line of `el` at the first
/// position whose x is at or past `x`, or at that line's end.
pub(crate) fn set_caret_from_x(el: &HtmlElement, x: f64, last_line: bool) {
    normalize_placeholder(el);
    let len = visible_chars(&el.text_content().unwrap_or_default());

    let positions: Vec<(usize, f64, f64)> = (0..=len)
        .filter_map(|i| {
            let rect = range_at(el, i)?.get_bounding_client_rect();
            Some((i, rect.x(), rect.y()))
        })
        .collect();

    let line_y = if last_line {
        positions.iter().map(|p| p.2).fold(f64::MIN, f64::max)
    } else {
        positions.iter().map(|p| p.2).fold(f64::MAX, f64::min)
    };
    let on_line: Vec<_> = positions
        .iter()
        .filter(|p| (p.2 - line_y).abs() < 1.0)
        .collect();

    let target = on_line
        .iter()
        .find(|p| p.1 >= x)
        .or(on_line.last())
        .map(|p| p.0)
        .unwrap_or(if last_line { len } else { 0 });

    set_caret_at_offset(el, target);
}

pub(crate) fn place_caret(el: &HtmlElement, caret: CaretTarget) {
    match caret {
        CaretTarget::Start => set_caret_at_start(el),
        CaretTarget::End => set_caret_at_end(el),
        CaretTarget::Offset(n) => set_caret_at_offset(el, n),
    }
}

/// Keys typed into an input, textarea or contenteditable belong to that field.
pub(crate) fn is_typing_target(target: Option<web_sys::EventTarget>) -> bool {
    target
        .and_then(|t| t.dyn_into::<HtmlElement>().ok())
        .map(|el| {
            let tag = el.tag_name().to_lowercase();
            tag == "input" || tag == "textarea" || el.is_content_editable()
        })
        .unwrap_or(false)
}

pub(crate) fn is_active_element(el: &web_sys::Element) -> bool {
    document()
        .and_then(|d| d.active_element())
        .is_some_and(|active| &active == el)
}

pub(crate) fn editable_at_index(index: usize) -> Option<HtmlElement> {
    document()?
        .query_selector(&format!("[data-node-index='{index}']"))
        .ok()
        .flatten()?
        .dyn_into::<HtmlElement>()
        .ok()
}

fn next_frame(f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let _ = window.request_animation_frame(Closure::once_into_js(f).unchecked_ref());
}

/// Focuses the block rendered at `index` once the pending render has landed.
pub(crate) fn focus_editable_at_index(index: usize, caret: CaretTarget) {
    next_frame(move || {
        next_frame(move || {
            let Some(el) = editable_at_index(index) else {
                tracing::debug!(index, "no block to focus");
                return;
            };
            let _ = el.focus();
            place_caret(&el, caret);
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_offsets_skip_placeholder() {
        assert_eq!(utf16_offset_for("abc", 2), 2);
        assert_eq!(utf16_offset_for("\u{200B}ab", 1), 2);
        assert_eq!(utf16_offset_for("😀x", 1), 2);
        assert_eq!(utf16_offset_for("ab", 9), 2);
        assert_eq!(visible_chars("\u{200B}"), 0);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn editable(text: &str) -> HtmlElement {
        let doc = document().expect("document");
        let el: HtmlElement = doc
            .create_element("div")
            .expect("div")
            .dyn_into()
            .expect("html element");
        el.set_attribute("contenteditable", "true").expect("attr");
        el.set_text_content(Some(text));
        doc.body().expect("body").append_child(&el).expect("append");
        el
    }

    #[wasm_bindgen_test]
    fn caret_round_trips_through_selection() {
        let el = editable("héllo");
        let _ = el.focus();
        set_caret_at_offset(&el, 2);
        assert_eq!(caret_offset(&el), 2);
        set_caret_at_end(&el);
        assert_eq!(caret_offset(&el), 5);
        set_caret_at_start(&el);
        assert_eq!(caret_offset(&el), 0);
        el.remove();
    }

    #[wasm_bindgen_test]
    fn offset_target_places_caret_mid_block() {
        let el = editable("abcdef");
        let _ = el.focus();
        place_caret(&el, CaretTarget::Offset(3));
        assert_eq!(caret_offset(&el), 3);
        place_caret(&el, CaretTarget::End);
        assert_eq!(caret_offset(&el), 6);
        el.remove();
    }

    #[wasm_bindgen_test]
    fn text_fields_are_typing_targets() {
        let text = editable("x");
        assert!(is_typing_target(Some(text.clone().into())));

        let doc = document().expect("document");
        let input = doc.create_element("input").expect("input");
        assert!(is_typing_target(Some(input.into())));

        let card: HtmlElement = doc
            .create_element("div")
            .expect("div")
            .dyn_into()
            .expect("html element");
        card.set_attribute("tabindex", "0").expect("attr");
        assert!(!is_typing_target(Some(card.into())));
        assert!(!is_typing_target(None));
        text.remove();
    }

    #[wasm_bindgen_test]
    fn active_element_follows_focus() {
        let doc = document().expect("document");
        let card: HtmlElement = doc
            .create_element("div")
            .expect("div")
            .dyn_into()
            .expect("html element");
        card.set_attribute("tabindex", "0").expect("attr");
        doc.body().expect("body").append_child(&card).expect("append");
        let text = editable("x");

        card.focus().expect("focus card");
        assert!(is_active_element(&card));

        text.focus().expect("focus text");
        assert!(!is_active_element(&card));
        card.remove();
        text.remove();
    }

    #[wasm_bindgen_test]
    fn empty_block_gets_single_placeholder() {
        let el = editable("");
        normalize_placeholder(&el);
        assert_eq!(el.text_content().as_deref(), Some("\u{200B}"));
        assert_eq!(editable_text(&el), "");
        el.remove();
    }
}
