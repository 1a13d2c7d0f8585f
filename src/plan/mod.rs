//! Plan model: what the user asks to render.

pub mod model;
pub mod storyboard;
pub mod validate;

pub use model::*;
pub use validate::validate;
