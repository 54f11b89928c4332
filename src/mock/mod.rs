//! Mock route rules: compilation, matching, handling and live reloading.

pub mod body;
pub mod builtins;
pub mod compiler;
pub mod context;
pub mod handler;
pub mod loader;
pub mod matcher;
pub mod pattern;
pub mod rule;
pub mod wrapper;

pub use compiler::compile;
pub use context::{MockContext, ReloadMode};
pub use handler::{HandlerRegistry, MockHandler, MockReply, MockRequest, UploadedFile};
pub use loader::ConfigLoader;
pub use matcher::{MatchedRule, match_request};
pub use pattern::{PathParams, PathPattern};
pub use rule::{CompiledRule, MockMethod, RuleList};
pub use wrapper::{HandlerValue, WrappedHandler, wrap};
