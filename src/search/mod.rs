// Module declarations
pub mod common;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod normalizer;
pub mod query_parser;
pub mod search_manager;
pub mod session;

// Re-export public APIs
pub use common::{CancellationToken, SearchOutcome, SearchStats};
pub use error::{QueryError, SearchError, SyntaxErrorKind};
pub use evaluator::{CompiledQuery, evaluate};
pub use matcher::MatcherIndex;
pub use normalizer::{CompoundTerm, NormalizedText, Normalizer, NormalizerConfig, normalize};
pub use query_parser::{MAX_NESTING_DEPTH, MAX_OPERANDS, QueryNode, QueryParser, parse};
pub use search_manager::{SearchManager, search};
pub use session::SearchSession;
