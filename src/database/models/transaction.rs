use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;
use crate::database::changes::ChangeSet;
use crate::resource::Resource;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

text_enum!(TransactionType {
    Income => "INCOME",
    Expense => "EXPENSE",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub proof_url: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreate {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub proof_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub proof_url: Option<String>,
}

fn check_amount(v: &mut Validator, amount: Option<Decimal>) {
    if let Some(amount) = amount {
        v.check(amount > Decimal::ZERO, "amount", "must be greater than 0");
    }
}

impl Resource for FinancialTransaction {
    type Create = TransactionCreate;
    type Update = TransactionUpdate;

    const TABLE: &'static str = "financial_transactions";
    const NAME: &'static str = "Transaction";
    const ORDER: &'static str = "date desc, created_at desc";

    fn create_changes(payload: TransactionCreate, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        let kind = match payload.kind.as_deref() {
            Some(k) => v.parse_enum::<TransactionType>("type", k),
            None => {
                v.add("type", "is required");
                None
            }
        };
        v.check(payload.amount.is_some(), "amount", "is required");
        check_amount(&mut v, payload.amount);
        v.required("category", &payload.category)
            .check(payload.date.is_some(), "date", "is required");
        v.finish()?;

        Ok(ChangeSet::new()
            .set("type", kind)
            .set("amount", payload.amount)
            .set("category", payload.category.trim().to_string())
            .set("description", normalize_optional(payload.description))
            .set("date", payload.date)
            .set("proof_url", normalize_optional(payload.proof_url))
            .set("author_id", actor))
    }

    fn update_changes(
        payload: TransactionUpdate,
        _current: &FinancialTransaction,
    ) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        let kind = payload
            .kind
            .as_deref()
            .and_then(|k| v.parse_enum::<TransactionType>("type", k));
        check_amount(&mut v, payload.amount);
        v.required_if_present("category", payload.category.as_deref());
        v.finish()?;

        Ok(ChangeSet::new()
            .set_some("type", kind)
            .set_some("amount", payload.amount)
            .set_some("category", payload.category.map(|c| c.trim().to_string()))
            .set_some("description", payload.description.map(|d| normalize_optional(Some(d))))
            .set_some("date", payload.date)
            .set_some("proof_url", payload.proof_url.map(|p| normalize_optional(Some(p)))))
    }
}

/// One row of the per-category breakdown in the summary.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: TransactionType,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

impl TransactionSummary {
    pub fn from_categories(by_category: Vec<CategoryTotal>) -> Self {
        let total = |kind: TransactionType| -> Decimal {
            by_category
                .iter()
                .filter(|c| c.kind == kind)
                .map(|c| c.total)
                .sum()
        };
        let total_income = total(TransactionType::Income);
        let total_expense = total(TransactionType::Expense);
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create(kind: &str, amount: &str) -> TransactionCreate {
        TransactionCreate {
            kind: Some(kind.to_string()),
            amount: Some(Decimal::from_str(amount).unwrap()),
            category: "Offering".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 3),
            proof_url: None,
        }
    }

    #[test]
    fn amount_must_be_positive() {
        for amount in ["0", "-10.50"] {
            let errors = FinancialTransaction::create_changes(create("INCOME", amount), Uuid::new_v4())
                .unwrap_err();
            assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["amount"]);
        }
    }

    #[test]
    fn type_must_be_known() {
        let errors = FinancialTransaction::create_changes(create("DONATION", "10"), Uuid::new_v4())
            .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["type"]);
    }

    #[test]
    fn accepts_numeric_json_amounts() {
        let payload: TransactionCreate = serde_json::from_value(serde_json::json!({
            "type": "EXPENSE",
            "amount": 120.5,
            "category": "Rent",
            "date": "2024-03-01"
        }))
        .unwrap();
        let changes = FinancialTransaction::create_changes(payload, Uuid::new_v4()).unwrap();
        assert_eq!(changes.get("type"), Some(&crate::database::value::SqlValue::from("EXPENSE")));
    }

    #[test]
    fn summary_totals_and_balance() {
        let summary = TransactionSummary::from_categories(vec![
            CategoryTotal {
                category: "Offering".to_string(),
                kind: TransactionType::Income,
                total: Decimal::new(50000, 2),
            },
            CategoryTotal {
                category: "Tithes".to_string(),
                kind: TransactionType::Income,
                total: Decimal::new(25000, 2),
            },
            CategoryTotal {
                category: "Rent".to_string(),
                kind: TransactionType::Expense,
                total: Decimal::new(30000, 2),
            },
        ]);
        assert_eq!(summary.total_income, Decimal::new(75000, 2));
        assert_eq!(summary.total_expense, Decimal::new(30000, 2));
        assert_eq!(summary.balance, Decimal::new(45000, 2));

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["byCategory"][2]["type"], "EXPENSE");
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = TransactionSummary::from_categories(vec![]);
        assert_eq!(summary.balance, Decimal::ZERO);
    }
}
