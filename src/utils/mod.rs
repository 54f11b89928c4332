pub mod diagnostic;
pub mod hot_reload;
pub mod logging;

pub use diagnostic::render_diagnostic;
