//! Packing of tenant context and virtual table name into hash-key values.
//!
//! A qualified value has the form `<context><d><table><d><value>`. Context and
//! table must not contain the delimiter; the value may.

use super::{MappingError, Result};

/// A qualified hash-key value split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedValue<'a> {
    pub context: &'a str,
    pub table: &'a str,
    pub value: &'a str,
}

/// Qualifies and unqualifies hash-key values with a fixed delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPrefix {
    delimiter: char,
}

impl FieldPrefix {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Rejects names that would make a qualified value ambiguous.
    pub fn check_name(&self, what: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(MappingError::InvalidName(format!("{what} must not be empty")));
        }
        if name.contains(self.delimiter) {
            return Err(MappingError::InvalidName(format!(
                "{what} '{name}' must not contain the delimiter '{}'",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// `<context><d><table><d>`, the prefix shared by every value of one
    /// tenant's table.
    pub fn prefix(&self, context: &str, table: &str) -> String {
        let d = self.delimiter;
        format!("{context}{d}{table}{d}")
    }

    pub fn qualify(&self, context: &str, table: &str, value: &str) -> String {
        let mut qualified = self.prefix(context, table);
        qualified.push_str(value);
        qualified
    }

    pub fn parse<'a>(&self, qualified: &'a str) -> Result<QualifiedValue<'a>> {
        let mut parts = qualified.splitn(3, self.delimiter);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(context), Some(table), Some(value)) => Ok(QualifiedValue {
                context,
                table,
                value,
            }),
            _ => Err(MappingError::Codec(format!(
                "value '{qualified}' is not qualified with a context and table name"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_and_parse() {
        let prefix = FieldPrefix::new('.');
        let qualified = prefix.qualify("tenant1", "orders", "a.b");
        assert_eq!(qualified, "tenant1.orders.a.b");

        let parsed = prefix.parse(&qualified).unwrap();
        assert_eq!(parsed.context, "tenant1");
        assert_eq!(parsed.table, "orders");
        assert_eq!(parsed.value, "a.b");
    }

    #[test]
    fn test_parse_rejects_unqualified() {
        let prefix = FieldPrefix::new('.');
        let err = prefix.parse("plain").unwrap_err();
        assert!(matches!(err, MappingError::Codec(_)));
    }

    #[test]
    fn test_check_name() {
        let prefix = FieldPrefix::new('.');
        assert!(prefix.check_name("tenant context", "t1").is_ok());
        assert_eq!(
            prefix.check_name("tenant context", "t.1").unwrap_err().to_string(),
            "tenant context 't.1' must not contain the delimiter '.'"
        );
        assert!(prefix.check_name("tenant context", "").is_err());
    }
}
