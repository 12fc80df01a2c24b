pub mod context;
pub mod engine;
pub mod fold;
pub mod literal;
pub mod matcher;
pub mod scanner;

pub use context::SearchContext;
pub use engine::{concurrent_search, search};
pub use matcher::PatternMatcher;
