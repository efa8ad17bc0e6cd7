//! Explicit column-role classification for the fact pivot.

use serde::{Deserialize, Serialize};

use super::types::ColumnRole;

/// Which columns form the key, which column names the metric, and which holds its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Identifier columns, in output order.
    pub identifiers: Vec<String>,
    /// Column whose values name the metric (e.g. `Facts`).
    pub metric_name: String,
    /// Column holding the metric value in long form (e.g. `Value`).
    pub metric_value: String,
}

impl ColumnRoles {
    pub fn new(
        identifiers: impl IntoIterator<Item = impl Into<String>>,
        metric_name: impl Into<String>,
        metric_value: impl Into<String>,
    ) -> Self {
        Self {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
            metric_name: metric_name.into(),
            metric_value: metric_value.into(),
        }
    }

    /// Role of a column, or `None` when the column is not part of the pivot.
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        if column == self.metric_name {
            Some(ColumnRole::MetricName)
        } else if column == self.metric_value {
            Some(ColumnRole::MetricValue)
        } else if self.identifiers.iter().any(|c| c == column) {
            Some(ColumnRole::Identifier)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_of() {
        let roles = ColumnRoles::new(["Brand", "Date"], "Facts", "Value");
        assert_eq!(roles.role_of("Brand"), Some(ColumnRole::Identifier));
        assert_eq!(roles.role_of("Facts"), Some(ColumnRole::MetricName));
        assert_eq!(roles.role_of("Value"), Some(ColumnRole::MetricValue));
        assert_eq!(roles.role_of("Notes"), None);
    }
}
