use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::request::{FilePart, MultipartBody};
use crate::api::ApiError;

/// Multipart field carrying the payment proof
pub const PROOF_FIELD: &str = "proof_image";

/// Proof uploads the backend accepts, keyed by extension.
const PROOF_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("pdf", "application/pdf"),
];

/// A deposit awaiting admin approval, with the payment proof attached.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    pub amount: String,
    pub method: String,
    pub proof: FilePart,
}

impl DepositRequest {
    /// Build from in-memory proof bytes. The MIME type follows the file
    /// extension; anything other than JPEG, PNG or PDF is rejected.
    pub fn new(
        amount: impl Into<String>,
        method: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ApiError> {
        let file_name = file_name.into();
        let mime_type = proof_mime_type(&file_name)?;
        Ok(Self {
            amount: amount.into(),
            method: method.into(),
            proof: FilePart {
                field: PROOF_FIELD.to_string(),
                file_name,
                mime_type: mime_type.to_string(),
                bytes,
            },
        })
    }

    /// Read the proof from disk.
    pub fn from_file(
        amount: impl Into<String>,
        method: impl Into<String>,
        proof_path: &Path,
    ) -> Result<Self, ApiError> {
        let file_name = proof_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::request(format!("Invalid proof path: {}", proof_path.display())))?
            .to_string();
        let bytes = std::fs::read(proof_path).map_err(|e| {
            ApiError::request(format!("Failed to read {}: {}", proof_path.display(), e))
        })?;
        Self::new(amount, method, file_name, bytes)
    }

    pub(crate) fn to_multipart(&self) -> MultipartBody {
        MultipartBody::new()
            .text("amount", self.amount.clone())
            .text("method", self.method.clone())
            .file(self.proof.clone())
    }
}

fn proof_mime_type(file_name: &str) -> Result<&'static str, ApiError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    PROOF_MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            ApiError::request(format!(
                "Unsupported proof file {}: only JPEG, PNG and PDF are accepted",
                file_name
            ))
        })
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WithdrawalRequest {
    pub amount: String,
    pub withdrawal_address: String,
}

/// A saved payout destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WithdrawalAccount {
    pub id: i64,
    pub label: String,
    pub account_details: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWithdrawalAccount {
    pub label: String,
    pub account_details: String,
}
