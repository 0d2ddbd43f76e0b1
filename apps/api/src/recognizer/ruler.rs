//! Rule-based entity ruler driven by a JSONL pattern file.
//!
//! Each line is `{"label": "...", "pattern": ...}` where `pattern` is either a phrase
//! (matched token-by-token on exact text) or a list of token constraint objects,
//! e.g. `[{"LOWER": "machine"}, {"LOWER": "learning", "OP": "?"}]`.
//!
//! Every match of every pattern is a candidate, including the shorter alternatives an
//! optional or repeated token allows. Overlaps resolve to the longest span; ties go to
//! the earliest start, then to the pattern that appears first in the file.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::errors::AppError;
use crate::recognizer::tokenizer::{tokenize, Token};
use crate::recognizer::{Entity, EntityRecognizer};

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Failed to read pattern file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pattern line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Pattern line {line}: {message}")]
    Invalid { line: usize, message: String },
}

fn invalid(line: usize, message: impl Into<String>) -> PatternError {
    PatternError::Invalid {
        line,
        message: message.into(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pattern file model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPattern {
    label: String,
    pattern: RawBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBody {
    Phrase(String),
    Tokens(Vec<Map<String, Value>>),
}

// ────────────────────────────────────────────────────────────────────────────
// Compiled patterns
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    One,
    /// Exactly one token that fails the constraints.
    Negate,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attr {
    Orth,
    Lower,
    Length,
    IsAlpha,
    IsDigit,
    IsPunct,
    IsLower,
    IsUpper,
    IsTitle,
    LikeNum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Str,
    Bool,
    Int,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expected {
    Str(String),
    Bool(bool),
    Int(u64),
}

enum Actual<'t> {
    Str(&'t str),
    Bool(bool),
    Int(u64),
}

#[derive(Debug)]
enum Predicate {
    Equals(Expected),
    In(Vec<Expected>),
    NotIn(Vec<Expected>),
    Regex(Regex),
}

#[derive(Debug)]
struct Constraint {
    attr: Attr,
    predicate: Predicate,
}

#[derive(Debug)]
struct TokenSpec {
    constraints: Vec<Constraint>,
    quantifier: Quantifier,
}

#[derive(Debug)]
struct Pattern {
    label: String,
    tokens: Vec<TokenSpec>,
}

impl Attr {
    /// Resolves a pattern key. The flag asks for expected strings to be lower-cased.
    fn parse(key: &str) -> Option<(Attr, bool)> {
        let parsed = match key {
            "ORTH" | "TEXT" => (Attr::Orth, false),
            "LOWER" => (Attr::Lower, false),
            "NORM" | "LEMMA" => (Attr::Lower, true),
            "LENGTH" => (Attr::Length, false),
            "IS_ALPHA" => (Attr::IsAlpha, false),
            "IS_DIGIT" => (Attr::IsDigit, false),
            "IS_PUNCT" => (Attr::IsPunct, false),
            "IS_LOWER" => (Attr::IsLower, false),
            "IS_UPPER" => (Attr::IsUpper, false),
            "IS_TITLE" => (Attr::IsTitle, false),
            "LIKE_NUM" => (Attr::LikeNum, false),
            _ => return None,
        };
        Some(parsed)
    }

    fn kind(self) -> ValueKind {
        match self {
            Attr::Orth | Attr::Lower => ValueKind::Str,
            Attr::Length => ValueKind::Int,
            _ => ValueKind::Bool,
        }
    }

    fn actual<'t>(self, token: &'t Token<'_>) -> Actual<'t> {
        let text = token.text;
        match self {
            Attr::Orth => Actual::Str(text),
            Attr::Lower => Actual::Str(&token.lower),
            Attr::Length => Actual::Int(text.chars().count() as u64),
            Attr::IsAlpha => Actual::Bool(text.chars().all(char::is_alphabetic)),
            Attr::IsDigit => Actual::Bool(text.chars().all(|c| c.is_ascii_digit())),
            Attr::IsPunct => Actual::Bool(text.chars().all(|c| !c.is_alphanumeric())),
            Attr::IsLower => Actual::Bool(
                text.chars().any(char::is_lowercase) && !text.chars().any(char::is_uppercase),
            ),
            Attr::IsUpper => Actual::Bool(
                text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase),
            ),
            Attr::IsTitle => {
                let mut chars = text.chars();
                Actual::Bool(
                    chars.next().is_some_and(char::is_uppercase)
                        && !chars.any(char::is_uppercase),
                )
            }
            Attr::LikeNum => {
                let digits: String = text.chars().filter(|c| *c != ',' && *c != '.').collect();
                Actual::Bool(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            }
        }
    }
}

impl Expected {
    fn parse(kind: ValueKind, fold: bool, value: &Value, line: usize) -> Result<Self, PatternError> {
        match (kind, value) {
            (ValueKind::Str, Value::String(s)) if fold => Ok(Expected::Str(s.to_lowercase())),
            (ValueKind::Str, Value::String(s)) => Ok(Expected::Str(s.clone())),
            (ValueKind::Bool, Value::Bool(b)) => Ok(Expected::Bool(*b)),
            (ValueKind::Int, Value::Number(n)) => n
                .as_u64()
                .map(Expected::Int)
                .ok_or_else(|| invalid(line, format!("expected a non-negative integer, got {n}"))),
            (kind, other) => Err(invalid(line, format!("expected a {kind:?} value, got {other}"))),
        }
    }

    fn matches(&self, actual: &Actual<'_>) -> bool {
        match (self, actual) {
            (Expected::Str(e), Actual::Str(a)) => e.as_str() == *a,
            (Expected::Bool(e), Actual::Bool(a)) => e == a,
            (Expected::Int(e), Actual::Int(a)) => e == a,
            _ => false,
        }
    }
}

impl Predicate {
    fn parse(attr: Attr, fold: bool, value: &Value, line: usize) -> Result<Self, PatternError> {
        let kind = attr.kind();
        let Value::Object(ops) = value else {
            return Ok(Predicate::Equals(Expected::parse(kind, fold, value, line)?));
        };

        let mut entries = ops.iter();
        let (op, arg) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => return Err(invalid(line, "predicate objects take exactly one operator")),
        };

        let list = |arg: &Value| -> Result<Vec<Expected>, PatternError> {
            arg.as_array()
                .ok_or_else(|| invalid(line, format!("{op} expects an array")))?
                .iter()
                .map(|v| Expected::parse(kind, fold, v, line))
                .collect()
        };

        match op.as_str() {
            "IN" => Ok(Predicate::In(list(arg)?)),
            "NOT_IN" => Ok(Predicate::NotIn(list(arg)?)),
            "REGEX" => {
                if kind != ValueKind::Str {
                    return Err(invalid(line, "REGEX only applies to text attributes"));
                }
                let source = arg
                    .as_str()
                    .ok_or_else(|| invalid(line, "REGEX expects a string"))?;
                Regex::new(source)
                    .map(Predicate::Regex)
                    .map_err(|e| invalid(line, format!("bad REGEX: {e}")))
            }
            other => Err(invalid(line, format!("unsupported predicate operator {other}"))),
        }
    }

    fn matches(&self, actual: &Actual<'_>) -> bool {
        match self {
            Predicate::Equals(expected) => expected.matches(actual),
            Predicate::In(options) => options.iter().any(|e| e.matches(actual)),
            Predicate::NotIn(options) => !options.iter().any(|e| e.matches(actual)),
            Predicate::Regex(re) => matches!(actual, Actual::Str(s) if re.is_match(s)),
        }
    }
}

impl TokenSpec {
    fn parse(spec: &Map<String, Value>, line: usize) -> Result<Self, PatternError> {
        let mut quantifier = Quantifier::One;
        let mut constraints = Vec::new();

        for (key, value) in spec {
            if key == "OP" {
                quantifier = match value.as_str() {
                    Some("1") => Quantifier::One,
                    Some("!") => Quantifier::Negate,
                    Some("?") => Quantifier::Optional,
                    Some("*") => Quantifier::ZeroOrMore,
                    Some("+") => Quantifier::OneOrMore,
                    _ => return Err(invalid(line, format!("unsupported OP {value}"))),
                };
                continue;
            }

            let (attr, fold) = Attr::parse(key)
                .ok_or_else(|| invalid(line, format!("unsupported token attribute {key}")))?;
            constraints.push(Constraint {
                attr,
                predicate: Predicate::parse(attr, fold, value, line)?,
            });
        }

        Ok(TokenSpec {
            constraints,
            quantifier,
        })
    }

    fn exact(text: &str) -> Self {
        TokenSpec {
            constraints: vec![Constraint {
                attr: Attr::Orth,
                predicate: Predicate::Equals(Expected::Str(text.to_string())),
            }],
            quantifier: Quantifier::One,
        }
    }

    fn accepts(&self, token: &Token<'_>) -> bool {
        self.constraints
            .iter()
            .all(|c| c.predicate.matches(&c.attr.actual(token)))
    }

    /// Lower-cased text every match must start with, when the constraints pin one.
    fn anchor(&self) -> Option<String> {
        if self.quantifier != Quantifier::One {
            return None;
        }
        self.constraints.iter().find_map(|c| match (&c.attr, &c.predicate) {
            (Attr::Orth | Attr::Lower, Predicate::Equals(Expected::Str(s))) => {
                Some(s.to_lowercase())
            }
            _ => None,
        })
    }
}

impl Pattern {
    fn compile(raw: RawPattern, line: usize) -> Result<Self, PatternError> {
        let tokens: Vec<TokenSpec> = match raw.pattern {
            RawBody::Phrase(phrase) => tokenize(&phrase)
                .iter()
                .map(|t| TokenSpec::exact(t.text))
                .collect(),
            RawBody::Tokens(specs) => specs
                .iter()
                .map(|spec| TokenSpec::parse(spec, line))
                .collect::<Result<_, _>>()?,
        };

        if tokens.is_empty() {
            return Err(invalid(line, "pattern is empty"));
        }

        Ok(Pattern {
            label: raw.label,
            tokens,
        })
    }
}

/// Pushes every token index at which `specs` can finish matching from `pos`.
fn collect_ends(specs: &[TokenSpec], tokens: &[Token<'_>], pos: usize, ends: &mut Vec<usize>) {
    let Some((spec, rest)) = specs.split_first() else {
        ends.push(pos);
        return;
    };
    let hit = |i: usize| tokens.get(i).is_some_and(|t| spec.accepts(t));

    match spec.quantifier {
        Quantifier::One => {
            if hit(pos) {
                collect_ends(rest, tokens, pos + 1, ends);
            }
        }
        Quantifier::Negate => {
            if pos < tokens.len() && !hit(pos) {
                collect_ends(rest, tokens, pos + 1, ends);
            }
        }
        Quantifier::Optional => {
            collect_ends(rest, tokens, pos, ends);
            if hit(pos) {
                collect_ends(rest, tokens, pos + 1, ends);
            }
        }
        Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
            if spec.quantifier == Quantifier::ZeroOrMore {
                collect_ends(rest, tokens, pos, ends);
            }
            let mut end = pos;
            while hit(end) {
                end += 1;
                collect_ends(rest, tokens, end, ends);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PatternRuler
// ────────────────────────────────────────────────────────────────────────────

/// Rule-based recognizer. Immutable once loaded; share it behind an `Arc`.
#[derive(Debug)]
pub struct PatternRuler {
    patterns: Vec<Pattern>,
    /// Patterns keyed by the lower-cased text of their fixed first token.
    anchored: HashMap<String, Vec<usize>>,
    /// Patterns that can start on any token.
    floating: Vec<usize>,
}

impl PatternRuler {
    fn new(patterns: Vec<Pattern>) -> Self {
        let mut anchored: HashMap<String, Vec<usize>> = HashMap::new();
        let mut floating = Vec::new();
        for (idx, pattern) in patterns.iter().enumerate() {
            match pattern.tokens.first().and_then(TokenSpec::anchor) {
                Some(key) => anchored.entry(key).or_default().push(idx),
                None => floating.push(idx),
            }
        }
        Self {
            patterns,
            anchored,
            floating,
        }
    }

    /// Loads patterns from a JSONL file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ruler = Self::from_jsonl(&contents)?;
        info!("Loaded {} patterns from {}", ruler.len(), path.display());
        Ok(ruler)
    }

    /// Parses JSONL pattern lines. Blank lines are skipped; line numbers in errors are 1-based.
    pub fn from_jsonl(contents: &str) -> Result<Self, PatternError> {
        let mut patterns = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let raw: RawPattern = serde_json::from_str(line).map_err(|source| PatternError::Json {
                line: line_no,
                source,
            })?;
            patterns.push(Pattern::compile(raw, line_no)?);
        }
        Ok(Self::new(patterns))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Runs every pattern over `text` and returns non-overlapping entities in document order.
    pub fn find_entities(&self, text: &str) -> Vec<Entity> {
        let tokens = tokenize(text);

        let mut candidates = Vec::new();
        for (start, token) in tokens.iter().enumerate() {
            let anchored = self
                .anchored
                .get(&token.lower)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for &idx in anchored.iter().chain(&self.floating) {
                let mut ends = Vec::new();
                collect_ends(&self.patterns[idx].tokens, &tokens, start, &mut ends);
                ends.sort_unstable();
                ends.dedup();
                candidates.extend(
                    ends.into_iter()
                        .filter(|&end| end > start)
                        .map(|end| (start, end, idx)),
                );
            }
        }

        candidates.sort_by_key(|&(start, end, idx)| (Reverse(end - start), start, idx));

        let mut taken = vec![false; tokens.len()];
        let mut chosen = Vec::new();
        for (start, end, idx) in candidates {
            if taken[start..end].iter().any(|t| *t) {
                continue;
            }
            taken[start..end].fill(true);
            chosen.push((start, end, idx));
        }
        chosen.sort_by_key(|&(start, _, _)| start);

        chosen
            .into_iter()
            .map(|(start, end, idx)| {
                let (from, to) = (tokens[start].start, tokens[end - 1].end);
                Entity {
                    text: text[from..to].to_string(),
                    label: self.patterns[idx].label.clone(),
                    start: from,
                    end: to,
                }
            })
            .collect()
    }
}

#[async_trait]
impl EntityRecognizer for PatternRuler {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, AppError> {
        Ok(self.find_entities(text))
    }
}
