use std::fmt;

/// What went wrong while parsing a query expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// `(` without a matching `)`
    UnclosedParen,
    /// `)` without a matching `(`
    UnexpectedCloseParen,
    /// Operator or group with nothing on one side
    MissingOperand,
    /// `"` without a closing quote
    UnterminatedQuote,
    /// `""`
    EmptyPhrase,
    /// `(` nested deeper than [`MAX_NESTING_DEPTH`](super::query_parser::MAX_NESTING_DEPTH)
    TooDeep,
    /// More terms and phrases than [`MAX_OPERANDS`](super::query_parser::MAX_OPERANDS)
    TooManyOperands,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            SyntaxErrorKind::UnclosedParen => "unclosed parenthesis",
            SyntaxErrorKind::UnexpectedCloseParen => "unexpected closing parenthesis",
            SyntaxErrorKind::MissingOperand => "missing operand",
            SyntaxErrorKind::UnterminatedQuote => "unterminated quoted phrase",
            SyntaxErrorKind::EmptyPhrase => "empty quoted phrase",
            SyntaxErrorKind::TooDeep => "parentheses nested too deeply",
            SyntaxErrorKind::TooManyOperands => "too many terms",
        };
        f.write_str(message)
    }
}

/// Query parsing failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query is empty")]
    EmptyQuery,

    /// `position` is a 0-based character offset into `expression`
    #[error("{kind} at position {position} in query `{expression}`")]
    Syntax {
        expression: String,
        position: usize,
        kind: SyntaxErrorKind,
    },
}

impl QueryError {
    pub fn syntax(expression: &str, position: usize, kind: SyntaxErrorKind) -> Self {
        QueryError::Syntax {
            expression: expression.to_string(),
            position,
            kind,
        }
    }

    /// Offending character offset, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            QueryError::EmptyQuery => None,
            QueryError::Syntax { position, .. } => Some(*position),
        }
    }
}

/// Search failure
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("{records} records but {indexes} indexes")]
    IndexMismatch { records: usize, indexes: usize },
}
