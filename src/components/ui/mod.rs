pub mod alert;
pub mod button;
pub mod card;
pub mod command;
pub mod input;
pub mod label;
pub mod spinner;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use alert::*;
pub use button::*;
pub use card::*;
pub use command::*;
pub use input::*;
pub use label::*;
pub use spinner::*;
