pub mod query;
pub mod reference;
pub mod resolver;

pub use query::{resolve_target, ResolvedTarget, TargetQuery};
pub use reference::TargetReference;
pub use resolver::{TargetOverride, TargetResolver};
