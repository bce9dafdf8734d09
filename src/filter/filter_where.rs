use crate::database::value::SqlValue;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterOp, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<SqlValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions joined with AND; an empty list renders as an empty string.
    pub fn generate(
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = Vec::with_capacity(conditions.len());
        for condition in conditions {
            sql_conditions.push(filter_where.build_sql_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        Filter::validate_identifier(&condition.column)?;
        let quoted_column = format!("\"{}\"", condition.column);

        let sql = match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    format!("{} IS NULL", quoted_column)
                } else {
                    format!("{} = {}", quoted_column, self.param(&condition.data))
                }
            }
            FilterOp::Neq => {
                if condition.data.is_null() {
                    format!("{} IS NOT NULL", quoted_column)
                } else {
                    format!("{} <> {}", quoted_column, self.param(&condition.data))
                }
            }
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(&condition.data)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(&condition.data)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(&condition.data)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(&condition.data)),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(&condition.data)),
            FilterOp::In => match &condition.data {
                SqlValue::UuidArray(values) if values.is_empty() => "1=0".to_string(),
                SqlValue::UuidArray(_) => {
                    format!("{} = ANY({})", quoted_column, self.param(&condition.data))
                }
                _ => {
                    return Err(FilterError::InvalidOperatorData(
                        "IN requires an array value".to_string(),
                    ))
                }
            },
            FilterOp::IsNull => format!("{} IS NULL", quoted_column),
            FilterOp::NotNull => format!("{} IS NOT NULL", quoted_column),
        };
        Ok(sql)
    }

    fn param(&mut self, value: &SqlValue) -> String {
        self.param_values.push(value.clone());
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
