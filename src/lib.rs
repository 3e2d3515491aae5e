//! Boolean resume search.
//!
//! Resume text is normalized into a token stream that tolerates CamelCase and
//! concatenated skill names, then filtered with boolean expressions such as
//! `(Java OR Python) AND "machine learning"`.

pub mod config;
pub mod record;
pub mod search;
