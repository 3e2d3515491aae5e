//! Query evaluation against a record's matcher index.
//!
//! [`CompiledQuery`] normalizes every term and phrase of a parsed query once,
//! so a search can evaluate the same query against many records without
//! re-normalizing the query text for each of them. Chains of the same operator
//! are flattened into one operand list, so a long `a b c ...` query is walked
//! with a loop rather than one stack frame per term.

use super::matcher::MatcherIndex;
use super::normalizer::{CompoundTerm, Normalizer};
use super::query_parser::QueryNode;

/// Query tree with normalized leaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledQuery {
    Term(CompoundTerm),
    Phrase(Vec<String>),
    /// Every operand must match
    And(Vec<CompiledQuery>),
    /// At least one operand must match
    Or(Vec<CompiledQuery>),
}

impl CompiledQuery {
    pub fn compile(node: &QueryNode, normalizer: &Normalizer) -> Self {
        match node {
            QueryNode::Term(word) => CompiledQuery::Term(normalizer.compound_term(word)),
            QueryNode::Phrase(words) => CompiledQuery::Phrase(normalizer.phrase_tokens(words)),
            QueryNode::And(..) => CompiledQuery::And(
                operands(node, Conjunction::And)
                    .into_iter()
                    .map(|operand| Self::compile(operand, normalizer))
                    .collect(),
            ),
            QueryNode::Or(..) => CompiledQuery::Or(
                operands(node, Conjunction::Or)
                    .into_iter()
                    .map(|operand| Self::compile(operand, normalizer))
                    .collect(),
            ),
            QueryNode::Group(child) => Self::compile(child, normalizer),
        }
    }

    /// Evaluate against one record; `And`/`Or` short-circuit
    pub fn matches(&self, index: &MatcherIndex) -> bool {
        match self {
            CompiledQuery::Term(term) => index.matches_compound(term),
            CompiledQuery::Phrase(words) => index.contains_phrase(words.as_slice()),
            CompiledQuery::And(operands) => operands.iter().all(|q| q.matches(index)),
            CompiledQuery::Or(operands) => operands.iter().any(|q| q.matches(index)),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    And,
    Or,
}

/// Operands of a run of `conjunction` nodes, left to right, looking through groups
fn operands(node: &QueryNode, conjunction: Conjunction) -> Vec<&QueryNode> {
    let mut pending = vec![node];
    let mut found = Vec::new();

    while let Some(node) = pending.pop() {
        match node {
            QueryNode::And(left, right) if conjunction == Conjunction::And => {
                pending.push(right.as_ref());
                pending.push(left.as_ref());
            }
            QueryNode::Or(left, right) if conjunction == Conjunction::Or => {
                pending.push(right.as_ref());
                pending.push(left.as_ref());
            }
            QueryNode::Group(child) => pending.push(child.as_ref()),
            other => found.push(other),
        }
    }

    found
}

/// Evaluate a parsed query with the default normalizer
pub fn evaluate(ast: &QueryNode, index: &MatcherIndex) -> bool {
    CompiledQuery::compile(ast, &Normalizer::default()).matches(index)
}
