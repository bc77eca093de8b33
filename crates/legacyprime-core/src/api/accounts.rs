//! Account, session and password endpoints.

use serde::de::IgnoredAny;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{CredentialStore, SessionEvent};
use crate::models::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse, MessageResponse,
    ProfileUpdate, RegisterRequest, RegisterResponse, SetNewPasswordRequest, User,
    VerifyOtpResponse,
};

use super::endpoints;
use super::request::{ApiRequest, MultipartBody};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Exchange email and password for a token pair and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(endpoints::LOGIN)
            .public()
            .json(&LoginRequest { email, password })?;
        let response: LoginResponse = self.send(&request).await?;

        self.store_tokens(&response.access, &response.refresh)?;
        info!("Logged in");
        self.emit(SessionEvent::LoggedIn);

        match response.user {
            Some(user) => Ok(user),
            None => self.profile().await,
        }
    }

    /// Create a pending account. The backend emails a one-time code.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let request = ApiRequest::post(endpoints::REGISTER)
            .public()
            .json(registration)?;
        self.send(&request).await
    }

    /// Confirm registration with the emailed code. Logs the user in.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(endpoints::VERIFY_OTP)
            .public()
            .json(&json!({ "email": email, "otp": otp }))?;
        let response: VerifyOtpResponse = self.send(&request).await?;

        self.store_tokens(&response.access, &response.refresh)?;
        info!("Email verified, logged in");
        self.emit(SessionEvent::LoggedIn);
        Ok(response.user)
    }

    pub async fn resend_otp(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = ApiRequest::post(endpoints::RESEND_OTP)
            .public()
            .json(&json!({ "email": email }))?;
        self.send(&request).await
    }

    /// Invalidate the refresh token on the backend if possible, then forget
    /// the local session. Backend failures are logged only.
    pub async fn logout(&self) {
        if let Some(refresh) = self.store().refresh_token() {
            let outcome = match ApiRequest::post(endpoints::LOGOUT).json(&json!({ "refresh": refresh })) {
                Ok(request) => self.send::<IgnoredAny>(&request).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                warn!(error = %e, status = e.status, "Backend logout failed");
            }
        }

        if let Err(e) = self.store().clear() {
            warn!(error = %e, "Failed to clear credentials");
        }
        info!("Logged out");
        self.emit(SessionEvent::LoggedOut);
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.send(&ApiRequest::get(endpoints::PROFILE)).await
    }

    /// Update profile fields. A new profile picture switches the body to
    /// multipart; otherwise the set fields are sent as JSON.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = match &update.profile_picture {
            Some(picture) => {
                let body = update
                    .form_fields()
                    .into_iter()
                    .fold(MultipartBody::new(), |body, (name, value)| body.text(name, value))
                    .file(picture.clone());
                ApiRequest::put(endpoints::PROFILE).multipart(body)
            }
            None => ApiRequest::put(endpoints::PROFILE).json(update)?,
        };
        self.send(&request).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = ApiRequest::post(endpoints::REQUEST_PASSWORD_RESET)
            .public()
            .json(&json!({ "email": email }))?;
        self.send(&request).await
    }

    pub async fn verify_password_reset_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<MessageResponse, ApiError> {
        let request = ApiRequest::post(endpoints::VERIFY_PASSWORD_RESET_OTP)
            .public()
            .json(&json!({ "email": email, "otp": otp }))?;
        self.send(&request).await
    }

    pub async fn set_new_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = SetNewPasswordRequest {
            email,
            otp,
            new_password,
            confirm_password: new_password,
        };
        let request = ApiRequest::post(endpoints::SET_NEW_PASSWORD)
            .public()
            .json(&body)?;
        self.send(&request).await
    }

    /// Change the password of the logged-in user. The backend re-issues the
    /// token pair, which replaces the stored one.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<ChangePasswordResponse, ApiError> {
        let body = ChangePasswordRequest {
            current_password,
            new_password,
            confirm_password: new_password,
        };
        let request = ApiRequest::post(endpoints::CHANGE_PASSWORD).json(&body)?;
        let response: ChangePasswordResponse = self.send(&request).await?;

        self.store_tokens(&response.access, &response.refresh)?;
        info!("Password changed, tokens replaced");
        self.emit(SessionEvent::TokensRefreshed);
        Ok(response)
    }
}
