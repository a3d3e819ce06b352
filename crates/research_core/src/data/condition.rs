//! Condition trees from `potential` and weight modifier blocks.

use serde::{Deserialize, Serialize};

use crate::value::{Block, CompareOp, Value};

/// Logical combinator keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOp {
    /// All children must hold.
    And,
    /// Any child must hold.
    Or,
    /// No child may hold.
    Not,
}

impl LogicOp {
    /// Keywords in the order they are looked for in a block.
    pub const PRIORITY: [Self; 3] = [Self::And, Self::Or, Self::Not];

    /// Script keyword for this combinator.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }

    /// Parse a script keyword. Matching is case-sensitive.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            _ => None,
        }
    }
}

/// A condition node.
///
/// Children of a [`Condition::Logic`] node are always leaves. Deeper
/// structure inside a child survives only as the child's map value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `AND`/`OR`/`NOT` over the entries of its block.
    Logic {
        /// Combinator.
        op: LogicOp,
        /// One leaf per entry of the combinator's block.
        children: Vec<Condition>,
        /// The mapping this node was parsed from.
        raw: Block,
    },
    /// A single `key = value` (or `key <op> value`) test.
    Leaf {
        /// Trigger name.
        key: String,
        /// Right-hand side.
        value: Value,
        /// Comparison operator, `None` for plain `=`.
        operator: Option<CompareOp>,
        /// The mapping this node was parsed from. Empty for children.
        raw: Block,
    },
}

impl Condition {
    fn leaf(key: &str, value: &Value, raw: Block) -> Self {
        let (value, operator) = match value {
            Value::Comparison { op, value } => ((**value).clone(), Some(*op)),
            other => (other.clone(), None),
        };
        Self::Leaf {
            key: key.to_string(),
            value,
            operator,
            raw,
        }
    }

    fn leaves(block: &Block) -> Vec<Self> {
        block
            .iter()
            .map(|(key, value)| Self::leaf(key, value, Block::new()))
            .collect()
    }

    /// Build a node from a single block entry.
    ///
    /// An `AND`/`OR`/`NOT` key with a map value becomes a logic node over
    /// that map. Anything else becomes a leaf. Either way `raw` is the
    /// one-entry mapping `{ key = value }`, as with [`parse_condition`].
    #[must_use]
    pub fn from_entry(key: &str, value: &Value) -> Self {
        let raw = Block::from([(key.to_string(), value.clone())]);
        match (LogicOp::from_keyword(key), value.as_map()) {
            (Some(op), Some(inner)) => Self::Logic {
                op,
                children: Self::leaves(inner),
                raw,
            },
            _ => Self::leaf(key, value, raw),
        }
    }

    /// Combinator, if this is a logic node.
    #[must_use]
    pub const fn logic_op(&self) -> Option<LogicOp> {
        match self {
            Self::Logic { op, .. } => Some(*op),
            Self::Leaf { .. } => None,
        }
    }

    /// Child nodes. Leaves have none.
    #[must_use]
    pub fn children(&self) -> &[Condition] {
        match self {
            Self::Logic { children, .. } => children,
            Self::Leaf { .. } => &[],
        }
    }

    /// Trigger name of a leaf.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Leaf { key, .. } => Some(key),
            Self::Logic { .. } => None,
        }
    }

    /// Right-hand side of a leaf.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Leaf { value, .. } => Some(value),
            Self::Logic { .. } => None,
        }
    }

    /// Comparison operator of a leaf.
    #[must_use]
    pub const fn operator(&self) -> Option<CompareOp> {
        match self {
            Self::Leaf { operator, .. } => *operator,
            Self::Logic { .. } => None,
        }
    }

    /// Source mapping of the node.
    #[must_use]
    pub const fn raw(&self) -> &Block {
        match self {
            Self::Logic { raw, .. } | Self::Leaf { raw, .. } => raw,
        }
    }
}

/// Interpret a mapping as a condition tree.
///
/// `AND`, `OR` and `NOT` are looked for in that order, and the first one
/// present with a map value becomes the root with one leaf child per entry.
/// Otherwise the root is a leaf built from the first entry in key order,
/// and the rest of the mapping is reachable only through [`Condition::raw`].
/// An empty mapping has no condition.
#[must_use]
pub fn parse_condition(block: &Block) -> Option<Condition> {
    for op in LogicOp::PRIORITY {
        if let Some(inner) = block.get(op.keyword()).and_then(Value::as_map) {
            return Some(Condition::Logic {
                op,
                children: Condition::leaves(inner),
                raw: block.clone(),
            });
        }
    }

    let (key, value) = block.iter().next()?;
    Some(Condition::leaf(key, value, block.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{parse_block, preprocess};

    fn block(text: &str) -> Block {
        parse_block(&preprocess(text))
    }

    #[test]
    fn test_and_condition() {
        let potential = block("AND = { is_gestalt = no has_ethic = ethic_materialist }");
        let cond = parse_condition(&potential).expect("condition present");

        assert_eq!(cond.logic_op(), Some(LogicOp::And));
        assert_eq!(cond.children().len(), 2);
        let keys: Vec<_> = cond.children().iter().filter_map(Condition::key).collect();
        assert_eq!(keys, vec!["has_ethic", "is_gestalt"]);
        assert_eq!(cond.children()[1].value(), Some(&Value::Bool(false)));
        assert_eq!(cond.raw(), &potential);
    }

    #[test]
    fn test_and_checked_before_or() {
        let potential = block("OR = { a = yes } AND = { b = yes }");
        let cond = parse_condition(&potential).expect("condition present");
        assert_eq!(cond.logic_op(), Some(LogicOp::And));
    }

    #[test]
    fn test_leaf_uses_first_key() {
        let potential = block("zeta = yes alpha = 3");
        let cond = parse_condition(&potential).expect("condition present");
        assert_eq!(cond.key(), Some("alpha"));
        assert_eq!(cond.value(), Some(&Value::Int(3)));
        assert_eq!(cond.raw().len(), 2);
    }

    #[test]
    fn test_empty_block_has_no_condition() {
        assert_eq!(parse_condition(&Block::new()), None);
    }

    #[test]
    fn test_logic_keyword_with_scalar_is_leaf() {
        let potential = block("NOT = yes");
        let cond = parse_condition(&potential).expect("condition present");
        assert_eq!(cond.logic_op(), None);
        assert_eq!(cond.key(), Some("NOT"));
    }

    #[test]
    fn test_nested_logic_stays_opaque() {
        let potential = block("OR = { NOT = { has_x = yes } has_y = yes }");
        let cond = parse_condition(&potential).expect("condition present");
        let nested = &cond.children()[0];
        assert_eq!(nested.key(), Some("NOT"));
        assert!(nested.value().and_then(Value::as_map).is_some());
        assert!(nested.children().is_empty());
    }

    #[test]
    fn test_comparison_lifted_into_operator() {
        let potential = block("AND = { years_passed > 25 }");
        // comparison-only bodies read as arrays, so the AND is not a map here
        assert_eq!(parse_condition(&potential).and_then(|c| c.logic_op()), None);

        let potential = block("AND = { years_passed > 25 is_ai = no }");
        let cond = parse_condition(&potential).expect("condition present");
        let years = cond
            .children()
            .iter()
            .find(|c| c.key() == Some("years_passed"))
            .expect("years_passed leaf");
        assert_eq!(years.operator(), Some(CompareOp::Gt));
        assert_eq!(years.value(), Some(&Value::Int(25)));
    }

    #[test]
    fn test_from_entry_logic() {
        let inner = block("has_x = yes");
        let cond = Condition::from_entry("OR", &Value::Map(inner.clone()));
        assert_eq!(cond.logic_op(), Some(LogicOp::Or));
        assert_eq!(cond.raw(), &block("OR = { has_x = yes }"));
        assert_eq!(cond.raw().get("OR"), Some(&Value::Map(inner)));
    }

    #[test]
    fn test_from_entry_raw_matches_parse_condition() {
        let outer = block("NOT = { is_ai = yes }");
        let parsed = parse_condition(&outer).expect("condition present");
        let (key, value) = outer.iter().next().expect("one entry");
        assert_eq!(Condition::from_entry(key, value), parsed);

        let leaf = Condition::from_entry(
            "has_ethic",
            &Value::String("ethic_fanatic_pacifist".into()),
        );
        assert_eq!(leaf.raw(), &block("has_ethic = ethic_fanatic_pacifist"));
    }

    #[test]
    fn test_json_shape() {
        let cond = parse_condition(&block("NOT = { is_ai = yes }")).expect("condition present");
        let json = serde_json::to_value(&cond).expect("condition serializes");
        assert_eq!(json["type"], "logic");
        assert_eq!(json["op"], "NOT");
        assert_eq!(json["children"][0]["type"], "leaf");
        assert_eq!(json["children"][0]["key"], "is_ai");
        assert_eq!(json["children"][0]["value"], true);
        assert!(json["children"][0]["operator"].is_null());
    }
}
