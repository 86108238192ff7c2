pub mod call_index;
pub mod highlight;
pub mod session;

pub use call_index::{CallIndex, IndexError};
pub use highlight::HighlightSet;
pub use session::{ChartSession, SessionError};
