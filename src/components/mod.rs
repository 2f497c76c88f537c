pub mod emoji_picker;
pub mod hooks;
pub mod ui;
