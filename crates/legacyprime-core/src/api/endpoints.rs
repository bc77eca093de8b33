//! Backend endpoint paths, relative to the configured base URL.

// Accounts
pub const LOGIN: &str = "accounts/token/";
pub const REFRESH_TOKEN: &str = "accounts/token/refresh/";
pub const REGISTER: &str = "accounts/register/";
pub const LOGOUT: &str = "accounts/logout/";
pub const PROFILE: &str = "accounts/profile/";
pub const VERIFY_OTP: &str = "accounts/verify-otp/";
pub const RESEND_OTP: &str = "accounts/resend-otp/";
pub const REQUEST_PASSWORD_RESET: &str = "accounts/request-password-reset/";
pub const VERIFY_PASSWORD_RESET_OTP: &str = "accounts/verify-password-reset-otp/";
pub const SET_NEW_PASSWORD: &str = "accounts/set-new-password/";
pub const CHANGE_PASSWORD: &str = "accounts/change-password/";

// Dashboard
pub const DASHBOARD_SUMMARY: &str = "transactions/dashboard/summary/";
pub const DASHBOARD_PERFORMANCE: &str = "transactions/dashboard/performance/";

// Transactions
pub const TRANSACTIONS: &str = "transactions/";
pub const CREATE_TRANSACTION: &str = "transactions/create/";

// Wallet
pub const WALLET_DEPOSIT_REQUEST: &str = "wallet/deposit/request/";
pub const WALLET_WITHDRAW: &str = "wallet/withdraw/";
pub const WALLET_WITHDRAWAL_ACCOUNTS: &str = "wallet/withdrawal-accounts/";
pub const WALLET_SETTINGS: &str = "wallet/settings/";

// Notifications
pub const NOTIFICATIONS: &str = "notifications/";

pub const HEALTH: &str = "health";

pub fn wallet_deposit_confirm(id: i64) -> String {
    format!("wallet/deposit/{}/confirm/", id)
}

pub fn mark_notification_read(id: &str) -> String {
    format!("notifications/{}/mark-read/", id)
}

/// Join a base URL and a relative path with exactly one slash between them.
/// Absolute `http(s)://` paths are returned unchanged.
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim().trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8000/api", "accounts/token/"),
            "http://localhost:8000/api/accounts/token/"
        );
        assert_eq!(
            join_url("http://localhost:8000/api/", "/accounts/token/"),
            "http://localhost:8000/api/accounts/token/"
        );
        assert_eq!(join_url("", "health"), "health");
        assert_eq!(
            join_url("http://a/api", "https://b.example.com/x"),
            "https://b.example.com/x"
        );
    }

    #[test]
    fn test_parameterized_paths() {
        assert_eq!(wallet_deposit_confirm(42), "wallet/deposit/42/confirm/");
        assert_eq!(mark_notification_read("abc"), "notifications/abc/mark-read/");
    }
}
