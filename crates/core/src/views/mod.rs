pub mod flame_chart;
pub mod time_ruler;

pub use flame_chart::render_flame_chart;
pub use time_ruler::render_time_ruler;
