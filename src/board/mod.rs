// Transient board interaction state (drag gestures, card menus)

pub mod drag;
pub mod menu;

pub use drag::*;
pub use menu::*;
