//! Dynamically typed values produced by the script parser.
//!
//! Every scalar token in a technology script is classified by
//! [`parse_value`] into one of the [`Value`] variants. Nested blocks become
//! [`Value::Map`] or [`Value::Array`] depending on their shape, see
//! [`crate::script`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key/value entries of a parsed block.
///
/// Keys are kept sorted so that iteration (and therefore condition parsing
/// and serialization) is deterministic. Duplicate keys in the source keep
/// only the last occurrence.
pub type Block = BTreeMap<String, Value>;

/// Comparison operator of an entry written with something other than `=`.
///
/// Plain `key = value` entries carry no operator at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    /// Parse an operator token. Returns `None` for `=` and anything unknown.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    /// Script spelling of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Ne => "!=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed script value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// `yes`/`true` or `no`/`false`.
    Bool(bool),
    /// Integer literal that fits in 64 bits.
    Int(i64),
    /// Any other numeric literal.
    Float(f64),
    /// Quoted text (quotes removed) or an unclassifiable bare word.
    String(String),
    /// A brace block without `=` inside.
    Array(Vec<Value>),
    /// Entry compared with `<`, `>`, `<=`, `>=` or `!=` instead of assigned.
    Comparison {
        /// Operator between key and value.
        op: CompareOp,
        /// Right-hand side.
        value: Box<Value>,
    },
    /// A brace block containing `key = value` entries.
    Map(Block),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Comparison { .. } => "comparison",
            Self::Map(_) => "map",
        }
    }

    /// Boolean payload, if this is a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload, if this is a [`Value::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if this is a [`Value::Float`]. Integers are not widened.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric payload with integers widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String payload, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements, if this is a [`Value::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Entries, if this is a [`Value::Map`].
    #[must_use]
    pub const fn as_map(&self) -> Option<&Block> {
        match self {
            Self::Map(block) => Some(block),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        Self::Map(block)
    }
}

/// Renders the value back in script syntax.
///
/// Strings are quoted whenever the bare text would re-parse as something
/// else, so `parse_value(&v.to_string()) == v` holds for scalars.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("yes"),
            Self::Bool(false) => f.write_str("no"),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the fractional part so 2.0 does not come back as an int.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) if needs_quotes(s) => write!(f, "\"{s}\""),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                f.write_str("{")?;
                for item in items {
                    write!(f, " {item}")?;
                }
                f.write_str(" }")
            }
            Self::Comparison { op, value } => write!(f, "{op} {value}"),
            Self::Map(block) => {
                f.write_str("{")?;
                for (key, value) in block {
                    match value {
                        Self::Comparison { .. } => write!(f, " {key} {value}")?,
                        _ => write!(f, " {key} = {value}")?,
                    }
                }
                f.write_str(" }")
            }
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '=' | '#' | '<' | '>' | ','))
        || !matches!(parse_value(s), Value::String(ref bare) if bare == s)
}

/// Classify a single scalar token.
///
/// Surrounding whitespace and trailing commas are removed first. A token
/// wrapped in double quotes is always a string. Otherwise the first match
/// wins: `yes`/`true`, `no`/`false`, a 64-bit integer, a float, and finally
/// the raw text as a string.
#[must_use]
pub fn parse_value(token: &str) -> Value {
    let token = token.trim().trim_end_matches(',').trim_end();

    if token.starts_with('"') && token.ends_with('"') {
        return Value::String(token.trim_matches('"').to_string());
    }

    match token {
        "yes" | "true" => return Value::Bool(true),
        "no" | "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(i) = token.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::Float(f);
    }

    Value::String(token.to_string())
}
