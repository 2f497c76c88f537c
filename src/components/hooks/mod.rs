mod use_click_outside;
mod use_dismiss_after;

pub use use_click_outside::use_click_outside;
pub use use_dismiss_after::use_dismiss_after;
