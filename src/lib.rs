pub mod errors;
pub mod pathmatch;
pub mod protocol;
pub mod results;
pub mod store;
pub mod search;

// Re-export commonly used types
pub use errors::{SearchError, SearchResult};
pub use pathmatch::{PathMatcher, PathPatternOptions};
pub use protocol::PatternInfo;
pub use results::{FileMatch, LineMatch, SearchOutput};
pub use search::context::SearchContext;
pub use search::engine::{concurrent_search, search};
pub use search::matcher::PatternMatcher;
pub use store::{Archive, ArchiveBuilder, SrcFile};
