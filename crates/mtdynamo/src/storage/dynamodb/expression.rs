//! DynamoDB expression rendering.
//!
//! Pure functions turning condition triples and attribute updates into
//! expression strings with `#n<i>` name and `:v<i>` value placeholders.

use std::collections::HashMap;

use mtdynamo_core::attribute::{AttributeValue, ComparisonOperator, Condition};
use mtdynamo_core::request::{AttributeUpdate, UpdateAction};
use mtdynamo_core::store::{Result, StoreError};

/// Accumulates placeholders while rendering one request's expressions.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&mut self, attribute: &str) -> String {
        let next = self.names.len();
        self.names
            .entry(attribute.to_string())
            .or_insert_with(|| format!("#n{next}"))
            .clone()
    }

    fn value(&mut self, value: &AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value.clone());
        placeholder
    }

    /// Renders a single condition.
    pub fn condition(&mut self, condition: &Condition) -> Result<String> {
        if condition.values.len() != condition.operator.arity() {
            return Err(StoreError::InvalidRequest(format!(
                "{} on {} takes {} value(s), got {}",
                condition.operator,
                condition.attribute,
                condition.operator.arity(),
                condition.values.len()
            )));
        }

        let name = self.name(&condition.attribute);
        let values: Vec<String> = condition.values.iter().map(|v| self.value(v)).collect();
        let rendered = match condition.operator {
            ComparisonOperator::Eq => format!("{name} = {}", values[0]),
            ComparisonOperator::Ne => format!("{name} <> {}", values[0]),
            ComparisonOperator::Lt => format!("{name} < {}", values[0]),
            ComparisonOperator::Le => format!("{name} <= {}", values[0]),
            ComparisonOperator::Gt => format!("{name} > {}", values[0]),
            ComparisonOperator::Ge => format!("{name} >= {}", values[0]),
            ComparisonOperator::Between => {
                format!("{name} BETWEEN {} AND {}", values[0], values[1])
            }
            ComparisonOperator::BeginsWith => format!("begins_with({name}, {})", values[0]),
            ComparisonOperator::Contains => format!("contains({name}, {})", values[0]),
            ComparisonOperator::NotNull => format!("attribute_exists({name})"),
            ComparisonOperator::Null => format!("attribute_not_exists({name})"),
        };
        Ok(rendered)
    }

    /// Renders conditions joined with `AND`; `None` when there are none.
    pub fn conjunction(&mut self, conditions: &[Condition]) -> Result<Option<String>> {
        if conditions.is_empty() {
            return Ok(None);
        }
        let parts = conditions
            .iter()
            .map(|condition| self.condition(condition))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(parts.join(" AND ")))
    }

    /// Renders an update expression of `SET` and `REMOVE` clauses.
    pub fn update(&mut self, updates: &[AttributeUpdate]) -> Option<String> {
        let mut set = Vec::new();
        let mut remove = Vec::new();
        for update in updates {
            let name = self.name(&update.attribute);
            match &update.action {
                UpdateAction::Put(value) => {
                    let value = self.value(value);
                    set.push(format!("{name} = {value}"));
                }
                UpdateAction::Delete => remove.push(name),
            }
        }

        let mut clauses = Vec::new();
        if !set.is_empty() {
            clauses.push(format!("SET {}", set.join(", ")));
        }
        if !remove.is_empty() {
            clauses.push(format!("REMOVE {}", remove.join(", ")));
        }
        (!clauses.is_empty()).then(|| clauses.join(" "))
    }

    /// Placeholder to attribute name, `None` when unused.
    pub fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| {
            self.names
                .iter()
                .map(|(attribute, placeholder)| (placeholder.clone(), attribute.clone()))
                .collect()
        })
    }

    /// Placeholder to value, `None` when unused.
    pub fn values(&self) -> Option<&HashMap<String, AttributeValue>> {
        (!self.values.is_empty()).then_some(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn test_key_condition_and_filter_share_placeholders() {
        let mut builder = ExpressionBuilder::new();
        let key = builder
            .conjunction(&[
                Condition::eq("hk", s("t.orders.1")),
                Condition::between("rk", s("a"), s("m")),
            ])
            .unwrap();
        let filter = builder
            .conjunction(&[Condition::begins_with("hk", s("t.orders."))])
            .unwrap();

        assert_eq!(key.as_deref(), Some("#n0 = :v0 AND #n1 BETWEEN :v1 AND :v2"));
        assert_eq!(filter.as_deref(), Some("begins_with(#n0, :v3)"));

        let names = builder.names().unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names["#n0"], "hk");
        assert_eq!(builder.values().unwrap()[":v3"], s("t.orders."));
    }

    #[test]
    fn test_presence_operators_take_no_values() {
        let mut builder = ExpressionBuilder::new();
        let rendered = builder
            .condition(&Condition::new("gone", ComparisonOperator::Null, vec![]))
            .unwrap();
        assert_eq!(rendered, "attribute_not_exists(#n0)");
        assert!(builder.values().is_none());

        let err = builder
            .condition(&Condition::new("x", ComparisonOperator::Eq, vec![]))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }

    #[test]
    fn test_update_expression() {
        let mut builder = ExpressionBuilder::new();
        let rendered = builder.update(&[
            AttributeUpdate::put("a", s("1")),
            AttributeUpdate::delete("b"),
            AttributeUpdate::put("c", s("2")),
        ]);
        assert_eq!(
            rendered.as_deref(),
            Some("SET #n0 = :v0, #n2 = :v1 REMOVE #n1")
        );
        assert_eq!(ExpressionBuilder::new().update(&[]), None);
    }

    #[test]
    fn test_empty_conjunction() {
        let mut builder = ExpressionBuilder::new();
        assert_eq!(builder.conjunction(&[]).unwrap(), None);
        assert!(builder.names().is_none());
    }
}
