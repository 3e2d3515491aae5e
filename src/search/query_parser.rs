use std::fmt;

use super::error::{QueryError, SyntaxErrorKind};

/// Deepest allowed parenthesis nesting
pub const MAX_NESTING_DEPTH: usize = 64;

/// Most terms and phrases one query may contain
pub const MAX_OPERANDS: usize = 1024;

/// Parsed boolean query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// A bare word (e.g., HuggingFace)
    Term(String),
    /// Words that must appear together in order (e.g., "machine learning")
    Phrase(Vec<String>),
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
    /// Parenthesized sub-expression
    Group(Box<QueryNode>),
}

impl QueryNode {
    pub fn term(word: &str) -> Self {
        QueryNode::Term(word.to_string())
    }

    pub fn phrase(words: &[&str]) -> Self {
        QueryNode::Phrase(words.iter().map(|w| w.to_string()).collect())
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Or(Box::new(left), Box::new(right))
    }

    pub fn group(child: QueryNode) -> Self {
        QueryNode::Group(Box::new(child))
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term(word) => write!(f, "{word}"),
            QueryNode::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            QueryNode::And(left, right) => write!(f, "{left} AND {right}"),
            QueryNode::Or(left, right) => write!(f, "{left} OR {right}"),
            QueryNode::Group(child) => write!(f, "({child})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Term(String),
    Phrase(Vec<String>),
}

#[derive(Debug, Clone)]
struct Lexeme {
    token: Token,
    /// Character offset in the expression
    position: usize,
}

/// Parser for boolean search expressions
///
/// Precedence from tightest to loosest: parentheses, `AND` (explicit or
/// implied by juxtaposition), `OR`. Keywords are case-insensitive.
pub struct QueryParser<'a> {
    expression: &'a str,
    lexemes: Vec<Lexeme>,
    cursor: usize,
    depth: usize,
    end: usize,
}

impl<'a> QueryParser<'a> {
    /// Parse an expression into a query tree
    ///
    /// # Examples
    /// ```
    /// use resume_search::search::query_parser::{QueryNode, QueryParser};
    ///
    /// let ast = QueryParser::parse("(Java OR Python) AND \"machine learning\"").unwrap();
    /// assert_eq!(
    ///     ast,
    ///     QueryNode::and(
    ///         QueryNode::group(QueryNode::or(QueryNode::term("Java"), QueryNode::term("Python"))),
    ///         QueryNode::phrase(&["machine", "learning"]),
    ///     )
    /// );
    /// ```
    pub fn parse(expression: &'a str) -> Result<QueryNode, QueryError> {
        if expression.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let lexemes = tokenize(expression)?;

        // Keeps the left-deep AND/OR chains short enough to walk and drop
        if let Some(extra) = lexemes
            .iter()
            .filter(|lexeme| matches!(lexeme.token, Token::Term(_) | Token::Phrase(_)))
            .nth(MAX_OPERANDS)
        {
            return Err(QueryError::syntax(
                expression,
                extra.position,
                SyntaxErrorKind::TooManyOperands,
            ));
        }

        let mut parser = Self {
            expression,
            lexemes,
            cursor: 0,
            depth: 0,
            end: expression.chars().count(),
        };

        let node = parser.parse_or()?;

        // Anything left over can only be a stray `)`
        if let Some(lexeme) = parser.lexemes.get(parser.cursor) {
            return Err(parser.error(lexeme.position, SyntaxErrorKind::UnexpectedCloseParen));
        }

        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.cursor).map(|lexeme| &lexeme.token)
    }

    fn error(&self, position: usize, kind: SyntaxErrorKind) -> QueryError {
        QueryError::syntax(self.expression, position, kind)
    }

    fn parse_or(&mut self) -> Result<QueryNode, QueryError> {
        let mut node = self.parse_and()?;

        while matches!(self.peek(), Some(Token::Or)) {
            self.cursor += 1;
            let right = self.parse_and()?;
            node = QueryNode::or(node, right);
        }

        Ok(node)
    }

    fn parse_and(&mut self) -> Result<QueryNode, QueryError> {
        let mut node = self.parse_primary()?;

        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.cursor += 1;
                }
                // Adjacent operands are joined by an implicit AND
                Some(Token::Term(_) | Token::Phrase(_) | Token::LParen) => {}
                _ => break,
            }
            let right = self.parse_primary()?;
            node = QueryNode::and(node, right);
        }

        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<QueryNode, QueryError> {
        let Some(lexeme) = self.lexemes.get(self.cursor).cloned() else {
            return Err(self.error(self.end, SyntaxErrorKind::MissingOperand));
        };

        match lexeme.token {
            Token::Term(word) => {
                self.cursor += 1;
                Ok(QueryNode::Term(word))
            }
            Token::Phrase(words) => {
                self.cursor += 1;
                Ok(QueryNode::Phrase(words))
            }
            Token::LParen => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(self.error(lexeme.position, SyntaxErrorKind::TooDeep));
                }
                self.cursor += 1;
                self.depth += 1;
                let inner = self.parse_or()?;

                if !matches!(self.peek(), Some(Token::RParen)) {
                    return Err(self.error(lexeme.position, SyntaxErrorKind::UnclosedParen));
                }
                self.cursor += 1;
                self.depth -= 1;
                Ok(QueryNode::group(inner))
            }
            Token::RParen if self.depth == 0 => {
                Err(self.error(lexeme.position, SyntaxErrorKind::UnexpectedCloseParen))
            }
            Token::RParen | Token::And | Token::Or => {
                Err(self.error(lexeme.position, SyntaxErrorKind::MissingOperand))
            }
        }
    }
}

/// Parse with [`QueryParser`]
pub fn parse(expression: &str) -> Result<QueryNode, QueryError> {
    QueryParser::parse(expression)
}

fn tokenize(expression: &str) -> Result<Vec<Lexeme>, QueryError> {
    let mut lexemes = Vec::new();
    let mut chars = expression.chars().enumerate().peekable();

    while let Some((position, ch)) = chars.next() {
        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '"' => {
                let mut content = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == '"' {
                        closed = true;
                        break;
                    }
                    content.push(next);
                }

                if !closed {
                    return Err(QueryError::syntax(
                        expression,
                        position,
                        SyntaxErrorKind::UnterminatedQuote,
                    ));
                }

                let words: Vec<String> = content.split_whitespace().map(String::from).collect();
                if words.is_empty() {
                    return Err(QueryError::syntax(
                        expression,
                        position,
                        SyntaxErrorKind::EmptyPhrase,
                    ));
                }
                Token::Phrase(words)
            }
            c if c.is_whitespace() => continue,
            _ => {
                let mut word = String::from(ch);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '(' | ')' | '"') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }

                if word.eq_ignore_ascii_case("and") {
                    Token::And
                } else if word.eq_ignore_ascii_case("or") {
                    Token::Or
                } else {
                    Token::Term(word)
                }
            }
        };

        lexemes.push(Lexeme { token, position });
    }

    Ok(lexemes)
}
