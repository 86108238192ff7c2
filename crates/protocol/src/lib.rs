pub mod commands;
pub mod theme;
pub mod trace;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use theme::ThemeToken;
pub use trace::{CallRecord, Trace};
pub use types::{Point, Rect, Viewport};
