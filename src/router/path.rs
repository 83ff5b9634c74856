//! Path expressions.
//!
//! `/boards/{int}/pins/{str}` compiles to `^/boards/([^/]+)/pins/([^/]+)$`
//! plus the slot kinds and a template used for reversing. Raw patterns have
//! no template.

use regex::Regex;

use super::RouterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Int,
    Str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Literal(String),
    Slot(Slot),
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledPath {
    pub(crate) regex: Regex,
    pub(crate) slots: Vec<Slot>,
    pub(crate) template: Option<Vec<Piece>>,
}

const SEGMENT: &str = "([^/]+)";

pub(crate) fn compile(expr: &str) -> Result<CompiledPath, RouterError> {
    let malformed = |reason: &str| RouterError::MalformedPath {
        path: expr.to_string(),
        reason: reason.to_string(),
    };

    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut rest = expr;
    while let Some(ch) = rest.chars().next() {
        match ch {
            '{' => {
                let close = rest.find('}').ok_or_else(|| malformed("unclosed '{'"))?;
                let slot = match &rest[1..close] {
                    "int" => Slot::Int,
                    "str" => Slot::Str,
                    _ => return Err(malformed("placeholder must be {int} or {str}")),
                };
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(Piece::Slot(slot));
                rest = &rest[close + 1..];
            }
            '}' => return Err(malformed("unmatched '}'")),
            _ => {
                literal.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }

    let mut source = String::from("^");
    let mut slots = Vec::new();
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => source.push_str(&regex::escape(text)),
            Piece::Slot(slot) => {
                source.push_str(SEGMENT);
                slots.push(*slot);
            }
        }
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| malformed(&e.to_string()))?;
    Ok(CompiledPath {
        regex,
        slots,
        template: Some(pieces),
    })
}

/// Compiles a raw regular expression. Every capture group becomes a string
/// slot and the route cannot be reversed.
pub(crate) fn compile_pattern(pattern: &str) -> Result<CompiledPath, RouterError> {
    let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| RouterError::MalformedPath {
        path: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let slots = vec![Slot::Str; regex.captures_len().saturating_sub(1)];
    Ok(CompiledPath {
        regex,
        slots,
        template: None,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/router/path.rs"]
mod tests;
