mod condition;
mod value;

pub use condition::{ComparisonOperator, Condition};
pub use value::{AttributeValue, Item};
