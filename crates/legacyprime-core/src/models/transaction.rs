use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::string_or_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Deposit => f.pad("Deposit"),
            TransactionKind::Withdrawal => f.pad("Withdrawal"),
        }
    }
}

/// Review state of a deposit or withdrawal. Admins move it out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Other,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Other => "other",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => f.pad("Pending"),
            TransactionStatus::Approved => f.pad("Approved"),
            TransactionStatus::Rejected => f.pad("Rejected"),
            TransactionStatus::Other => f.pad("Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Deposit {
    pub id: i64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub proof_image: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Withdrawal {
    pub id: i64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub withdrawal_address: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// `transactions/` response. A type filter drops the other list entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionList {
    #[serde(default)]
    pub deposits: Vec<Deposit>,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
}

/// One row of the combined history.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEntry {
    pub kind: TransactionKind,
    pub id: i64,
    pub amount: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionEntry {
    /// User-facing description of where the transaction stands.
    pub fn status_message(&self) -> String {
        let kind = self.kind.as_str();
        let amount = format!("${}", super::format_amount(&self.amount));
        match self.status {
            TransactionStatus::Pending => format!("Your {} of {} is awaiting approval", kind, amount),
            TransactionStatus::Approved => {
                format!("{} of {} has been approved and processed", self.kind, amount)
            }
            TransactionStatus::Rejected => format!("Your {} of {} was declined", kind, amount),
            TransactionStatus::Other => format!("Status update for your {} of {}", kind, amount),
        }
    }
}

impl TransactionList {
    /// Deposits and withdrawals merged, newest first.
    pub fn entries(&self) -> Vec<TransactionEntry> {
        let deposits = self.deposits.iter().map(|d| TransactionEntry {
            kind: TransactionKind::Deposit,
            id: d.id,
            amount: d.amount.clone(),
            status: d.status,
            created_at: d.created_at,
        });
        let withdrawals = self.withdrawals.iter().map(|w| TransactionEntry {
            kind: TransactionKind::Withdrawal,
            id: w.id,
            amount: w.amount.clone(),
            status: w.status,
            created_at: w.created_at,
        });
        let mut entries: Vec<_> = deposits.chain(withdrawals).collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }
}

/// Query filters for `transactions/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.as_str()));
        }
        if let Some(status) = self.status.filter(|s| *s != TransactionStatus::Other) {
            pairs.push(("status", status.as_str()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTransaction {
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// Approved totals for the dashboard cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub total_balance: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_deposits: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_withdrawals: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DailyTotal {
    pub day: NaiveDate,
    #[serde(deserialize_with = "string_or_number")]
    pub total: String,
}

/// Per-day approved totals over the last 30 days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardPerformance {
    #[serde(default)]
    pub deposits: Vec<DailyTotal>,
    #[serde(default)]
    pub withdrawals: Vec<DailyTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_JSON: &str = r#"{
        "deposits": [
            {"id": 1, "reference": null, "user": 7, "amount": "250.00", "method": "btc", "proof_image": "/media/proofs/a.png", "status": "approved", "created_at": "2024-05-01T10:00:00Z"}
        ],
        "withdrawals": [
            {"id": 3, "reference": null, "user": 7, "amount": "40.00", "withdrawal_address": "bc1q", "status": "pending", "created_at": "2024-05-02T09:30:00.123456Z"}
        ]
    }"#;

    #[test]
    fn test_parse_transaction_list() {
        let list: TransactionList = serde_json::from_str(LIST_JSON).unwrap();
        assert_eq!(list.deposits.len(), 1);
        assert_eq!(list.deposits[0].status, TransactionStatus::Approved);
        assert_eq!(list.withdrawals[0].amount, "40.00");
    }

    #[test]
    fn test_entries_newest_first() {
        let list: TransactionList = serde_json::from_str(LIST_JSON).unwrap();
        let entries = list.entries();
        assert_eq!(entries[0].kind, TransactionKind::Withdrawal);
        assert_eq!(entries[1].kind, TransactionKind::Deposit);
    }

    #[test]
    fn test_filtered_list_missing_side() {
        let list: TransactionList = serde_json::from_str(r#"{"withdrawals": []}"#).unwrap();
        assert!(list.deposits.is_empty());
    }

    #[test]
    fn test_unknown_status() {
        let status: TransactionStatus = serde_json::from_str(r#""processing""#).unwrap();
        assert_eq!(status, TransactionStatus::Other);
    }

    #[test]
    fn test_status_messages() {
        let mut entry = TransactionEntry {
            kind: TransactionKind::Deposit,
            id: 1,
            amount: "1000.00".to_string(),
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        };
        assert_eq!(entry.status_message(), "Your deposit of $1,000 is awaiting approval");
        entry.status = TransactionStatus::Approved;
        assert_eq!(entry.status_message(), "Deposit of $1,000 has been approved and processed");
        entry.kind = TransactionKind::Withdrawal;
        entry.status = TransactionStatus::Rejected;
        entry.amount = "250.5".to_string();
        assert_eq!(entry.status_message(), "Your withdrawal of $250.5 was declined");
    }

    #[test]
    fn test_filter_query_pairs() {
        assert!(TransactionFilter::default().query_pairs().is_empty());
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Deposit),
            status: Some(TransactionStatus::Pending),
        };
        assert_eq!(filter.query_pairs(), vec![("type", "deposit"), ("status", "pending")]);
    }

    #[test]
    fn test_summary_accepts_numbers_and_strings() {
        let summary: DashboardSummary = serde_json::from_str(
            r#"{"total_balance": 0, "total_deposits": "250.00", "total_withdrawals": 12.5}"#,
        )
        .unwrap();
        assert_eq!(summary.total_balance, "0");
        assert_eq!(summary.total_deposits, "250.00");
        assert_eq!(summary.total_withdrawals, "12.5");
    }

    #[test]
    fn test_parse_performance() {
        let perf: DashboardPerformance = serde_json::from_str(
            r#"{"deposits": [{"day": "2024-05-01", "total": 250.0}], "withdrawals": []}"#,
        )
        .unwrap();
        assert_eq!(perf.deposits[0].day, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(perf.deposits[0].total, "250.0");
    }
}
