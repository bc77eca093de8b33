//! Data models for LegacyPrime API payloads.
//!
//! This module contains the request and response shapes for:
//!
//! - `User`, login/registration/password payloads: accounts endpoints
//! - `Deposit`, `Withdrawal`, dashboard totals: transaction endpoints
//! - `DepositRequest`, `WithdrawalRequest`, `WithdrawalAccount`: wallet endpoints
//! - `Notification`: the notification feed

pub mod account;
pub mod notification;
pub mod transaction;
pub mod wallet;

pub use account::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse, MessageResponse,
    ProfileUpdate, RefreshResponse, RegisterRequest, RegisterResponse, SetNewPasswordRequest,
    User, VerifyOtpResponse,
};
pub use notification::Notification;
pub use transaction::{
    CreateTransaction, DailyTotal, DashboardPerformance, DashboardSummary, Deposit,
    TransactionEntry, TransactionFilter, TransactionKind, TransactionList, TransactionStatus,
    Withdrawal,
};
pub use wallet::{DepositRequest, NewWithdrawalAccount, WithdrawalAccount, WithdrawalRequest};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decimal amounts and ids arrive as JSON strings or numbers depending on
/// the endpoint. Keep them as text so no precision is lost.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Render a decimal amount for people: thousands grouped with commas, at
/// most three fraction digits, trailing zeros dropped ("1000.00" becomes
/// "1,000"). Text that is not a number is returned unchanged.
pub fn format_amount(raw: &str) -> String {
    let value = match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => return raw.to_string(),
    };

    let fixed = format!("{:.3}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && (whole != "0" || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };
    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Amount {
        #[serde(deserialize_with = "string_or_number")]
        value: String,
    }

    #[test]
    fn test_string_or_number() {
        let a: Amount = serde_json::from_str(r#"{"value": "10.50"}"#).unwrap();
        assert_eq!(a.value, "10.50");
        let b: Amount = serde_json::from_str(r#"{"value": 42}"#).unwrap();
        assert_eq!(b.value, "42");
        assert!(serde_json::from_str::<Amount>(r#"{"value": null}"#).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("1000.00"), "1,000");
        assert_eq!(format_amount("1234567.5"), "1,234,567.5");
        assert_eq!(format_amount("999"), "999");
        assert_eq!(format_amount("0.125"), "0.125");
        assert_eq!(format_amount("12.34567"), "12.346");
        assert_eq!(format_amount("-2500.10"), "-2,500.1");
        assert_eq!(format_amount("0"), "0");
        assert_eq!(format_amount("n/a"), "n/a");
    }
}
