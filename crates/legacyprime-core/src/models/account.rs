use serde::{Deserialize, Serialize};

use super::string_or_number;
use crate::api::request::FilePart;

/// The current user, as returned by login, OTP verification and the
/// profile endpoint. Profile-only fields are absent from login responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `accounts/token/` response: a flat token pair with the user nested.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// `accounts/token/refresh/` response. `refresh` is only present when the
/// backend rotates refresh tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    /// Check the form before it is sent. Returns `(field, messages)` pairs in
    /// the same shape as `ApiError::field_errors`; empty when valid.
    pub fn validate(&self) -> Vec<(String, Vec<String>)> {
        let mut errors: Vec<(String, Vec<String>)> = Vec::new();
        let mut report = |field: &str, messages: Vec<&str>| {
            if !messages.is_empty() {
                errors.push((field.to_string(), messages.into_iter().map(String::from).collect()));
            }
        };

        let username = &self.username;
        let mut messages = Vec::new();
        if username.chars().count() < 4 {
            messages.push("Username must be at least 4 characters");
        }
        if username.chars().count() > 20 {
            messages.push("Username must not exceed 20 characters");
        }
        if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
            messages.push("Username can only contain letters and numbers");
        }
        report("username", messages);

        if self.email.is_empty() {
            report("email", vec!["Email is required"]);
        } else if !looks_like_email(&self.email) {
            report("email", vec!["Invalid email format"]);
        }

        let password = &self.password;
        let mut messages = Vec::new();
        if password.chars().count() < 8 {
            messages.push("Password must be at least 8 characters");
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            messages.push("Password must contain at least one uppercase letter");
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            messages.push("Password must contain at least one lowercase letter");
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            messages.push("Password must contain at least one number");
        }
        report("password", messages);

        if self.password != self.password2 {
            report("password2", vec!["Passwords don't match"]);
        }
        if self.first_name.is_empty() {
            report("first_name", vec!["First name is required"]);
        }
        if self.last_name.is_empty() {
            report("last_name", vec!["Last name is required"]);
        }
        errors
    }
}

/// One `@`, something on both sides, a dot in the domain and no spaces.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `accounts/verify-otp/` response; completes registration with a token pair.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpResponse {
    pub user: User,
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Plain acknowledgement. The backend uses `message` or `detail`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl MessageResponse {
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.detail.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetNewPasswordRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
    pub new_password: &'a str,
    pub confirm_password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
    pub confirm_password: &'a str,
}

/// `accounts/change-password/` re-issues tokens so the session survives.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordResponse {
    #[serde(default)]
    pub detail: Option<String>,
    pub access: String,
    pub refresh: String,
}

/// Partial profile update. Unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Sent as multipart when present
    #[serde(skip)]
    pub profile_picture: Option<FilePart>,
}

impl ProfileUpdate {
    /// Text fields as form pairs, in declaration order.
    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
            ("country", &self.country),
            ("mobile", &self.mobile),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), v.clone())))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"refresh": "r.t.x", "access": "a.t.x", "user": {"id": 7, "email": "jane@example.com", "username": "jane", "first_name": "Jane", "last_name": "Doe", "address": null, "state": "", "zip_code": "", "city": "", "country": ""}}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access, "a.t.x");
        let user = resp.user.unwrap();
        assert_eq!(user.id, "7");
        assert_eq!(user.full_name(), "Jane Doe");
        assert_eq!(user.address, None);
    }

    #[test]
    fn test_parse_profile() {
        let json = r#"{"id": 7, "email": "jane@example.com", "username": "jane", "first_name": "", "last_name": "", "mobile": "555", "profile_picture_url": "/media/p.png"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.full_name(), "jane");
        assert_eq!(user.profile_picture_url.as_deref(), Some("/media/p.png"));
    }

    #[test]
    fn test_message_response_text() {
        let m: MessageResponse = serde_json::from_str(r#"{"message": "OTP sent"}"#).unwrap();
        assert_eq!(m.text(), "OTP sent");
        let d: MessageResponse = serde_json::from_str(r#"{"detail": "Done."}"#).unwrap();
        assert_eq!(d.text(), "Done.");
        assert_eq!(MessageResponse::default().text(), "");
    }

    #[test]
    fn test_profile_update_serializes_only_set_fields() {
        let update = ProfileUpdate {
            city: Some("Lagos".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"city": "Lagos"}));
        assert_eq!(update.form_fields(), vec![("city".to_string(), "Lagos".to_string())]);
    }

    fn registration() -> RegisterRequest {
        RegisterRequest {
            email: "jane@example.com".to_string(),
            username: "jane42".to_string(),
            password: "Secret123".to_string(),
            password2: "Secret123".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(registration().validate().is_empty());
    }

    #[test]
    fn test_registration_field_errors() {
        let form = RegisterRequest {
            email: "jane@".to_string(),
            username: "j_d".to_string(),
            password: "secret".to_string(),
            password2: "Secret".to_string(),
            first_name: String::new(),
            ..registration()
        };
        let errors = form.validate();
        let fields: Vec<&str> = errors.iter().map(|(field, _)| field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email", "password", "password2", "first_name"]);

        assert_eq!(
            errors[0].1,
            vec![
                "Username must be at least 4 characters",
                "Username can only contain letters and numbers"
            ]
        );
        assert_eq!(errors[1].1, vec!["Invalid email format"]);
        assert_eq!(
            errors[2].1,
            vec![
                "Password must be at least 8 characters",
                "Password must contain at least one uppercase letter",
                "Password must contain at least one number"
            ]
        );
    }

    #[test]
    fn test_username_too_long() {
        let form = RegisterRequest {
            username: "a".repeat(21),
            ..registration()
        };
        assert_eq!(
            form.validate(),
            vec![("username".to_string(), vec!["Username must not exceed 20 characters".to_string()])]
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@@b.co"));
    }
}
