use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AttributeValue, Item};

/// Comparison operators usable in key conditions and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    BeginsWith,
    Contains,
    NotNull,
    Null,
}

impl ComparisonOperator {
    /// Number of operand values the operator takes.
    pub fn arity(self) -> usize {
        match self {
            ComparisonOperator::NotNull | ComparisonOperator::Null => 0,
            ComparisonOperator::Between => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComparisonOperator::Eq => "EQ",
            ComparisonOperator::Ne => "NE",
            ComparisonOperator::Lt => "LT",
            ComparisonOperator::Le => "LE",
            ComparisonOperator::Gt => "GT",
            ComparisonOperator::Ge => "GE",
            ComparisonOperator::Between => "BETWEEN",
            ComparisonOperator::BeginsWith => "BEGINS_WITH",
            ComparisonOperator::Contains => "CONTAINS",
            ComparisonOperator::NotNull => "NOT_NULL",
            ComparisonOperator::Null => "NULL",
        };
        f.write_str(name)
    }
}

/// An `attribute <operator> values` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: ComparisonOperator,
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

impl Condition {
    pub fn new(
        attribute: impl Into<String>,
        operator: ComparisonOperator,
        values: Vec<AttributeValue>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            values,
        }
    }

    pub fn eq(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::new(attribute, ComparisonOperator::Eq, vec![value])
    }

    pub fn begins_with(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::new(attribute, ComparisonOperator::BeginsWith, vec![value])
    }

    pub fn between(attribute: impl Into<String>, low: AttributeValue, high: AttributeValue) -> Self {
        Self::new(attribute, ComparisonOperator::Between, vec![low, high])
    }

    /// Evaluates the condition against an item.
    ///
    /// Operand count mismatches and type mismatches evaluate to false.
    pub fn matches(&self, item: &Item) -> bool {
        if self.values.len() != self.operator.arity() {
            return false;
        }
        match item.get(&self.attribute) {
            None => self.operator == ComparisonOperator::Null,
            Some(actual) => self.matches_value(actual),
        }
    }

    fn matches_value(&self, actual: &AttributeValue) -> bool {
        let cmp = |operand: &AttributeValue| actual.compare(operand);
        match self.operator {
            ComparisonOperator::Eq => actual == &self.values[0],
            ComparisonOperator::Ne => actual != &self.values[0],
            ComparisonOperator::Lt => cmp(&self.values[0]) == Some(Ordering::Less),
            ComparisonOperator::Le => matches!(
                cmp(&self.values[0]),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ComparisonOperator::Gt => cmp(&self.values[0]) == Some(Ordering::Greater),
            ComparisonOperator::Ge => matches!(
                cmp(&self.values[0]),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ComparisonOperator::Between => {
                matches!(
                    cmp(&self.values[0]),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(cmp(&self.values[1]), Some(Ordering::Less | Ordering::Equal))
            }
            ComparisonOperator::BeginsWith => match (actual, &self.values[0]) {
                (AttributeValue::S(a), AttributeValue::S(prefix)) => a.starts_with(prefix.as_str()),
                (AttributeValue::B(a), AttributeValue::B(prefix)) => a.starts_with(prefix),
                _ => false,
            },
            ComparisonOperator::Contains => match (actual, &self.values[0]) {
                (AttributeValue::S(a), AttributeValue::S(needle)) => a.contains(needle.as_str()),
                (AttributeValue::Ss(set), AttributeValue::S(needle)) => set.contains(needle),
                (AttributeValue::Ns(set), AttributeValue::N(needle)) => set.contains(needle),
                (AttributeValue::L(list), needle) => list.contains(needle),
                _ => false,
            },
            ComparisonOperator::NotNull => true,
            ComparisonOperator::Null => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item::from([
            ("name".to_string(), AttributeValue::S("ada".to_string())),
            ("age".to_string(), AttributeValue::N("36".to_string())),
        ])
    }

    #[test]
    fn test_equality_and_ranges() {
        let item = item();
        assert!(Condition::eq("name", AttributeValue::S("ada".into())).matches(&item));
        assert!(!Condition::eq("name", AttributeValue::S("bob".into())).matches(&item));
        assert!(Condition::between(
            "age",
            AttributeValue::N("30".into()),
            AttributeValue::N("40".into())
        )
        .matches(&item));
        assert!(Condition::new(
            "age",
            ComparisonOperator::Gt,
            vec![AttributeValue::N("4".into())]
        )
        .matches(&item));
    }

    #[test]
    fn test_begins_with_and_presence() {
        let item = item();
        assert!(Condition::begins_with("name", AttributeValue::S("ad".into())).matches(&item));
        assert!(Condition::new("age", ComparisonOperator::NotNull, vec![]).matches(&item));
        assert!(Condition::new("email", ComparisonOperator::Null, vec![]).matches(&item));
        assert!(!Condition::eq("email", AttributeValue::S("x".into())).matches(&item));
    }

    #[test]
    fn test_wrong_arity_never_matches() {
        let item = item();
        let malformed = Condition::new("age", ComparisonOperator::Between, vec![]);
        assert!(!malformed.matches(&item));
    }
}
