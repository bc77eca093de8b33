//! Deposits, withdrawals and saved payout accounts.

use serde_json::Value;

use crate::models::{
    DepositRequest, NewWithdrawalAccount, WithdrawalAccount, WithdrawalRequest,
};

use super::endpoints;
use super::request::ApiRequest;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Submit a deposit with its payment proof for admin review.
    pub async fn request_deposit(&self, deposit: &DepositRequest) -> Result<Value, ApiError> {
        let request = ApiRequest::post(endpoints::WALLET_DEPOSIT_REQUEST).multipart(deposit.to_multipart());
        self.send(&request).await
    }

    /// Attach a proof to an existing deposit.
    pub async fn confirm_deposit(&self, id: i64, deposit: &DepositRequest) -> Result<Value, ApiError> {
        let request =
            ApiRequest::patch(endpoints::wallet_deposit_confirm(id)).multipart(deposit.to_multipart());
        self.send(&request).await
    }

    pub async fn request_withdrawal(&self, withdrawal: &WithdrawalRequest) -> Result<Value, ApiError> {
        let request = ApiRequest::post(endpoints::WALLET_WITHDRAW).json(withdrawal)?;
        self.send(&request).await
    }

    pub async fn withdrawal_accounts(&self) -> Result<Vec<WithdrawalAccount>, ApiError> {
        self.send(&ApiRequest::get(endpoints::WALLET_WITHDRAWAL_ACCOUNTS)).await
    }

    pub async fn create_withdrawal_account(
        &self,
        account: &NewWithdrawalAccount,
    ) -> Result<WithdrawalAccount, ApiError> {
        let request = ApiRequest::post(endpoints::WALLET_WITHDRAWAL_ACCOUNTS).json(account)?;
        self.send(&request).await
    }

    /// Platform settings (deposit addresses, limits). Shape is backend-defined.
    pub async fn wallet_settings(&self) -> Result<Value, ApiError> {
        self.send(&ApiRequest::get(endpoints::WALLET_SETTINGS)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::{ApiClient, ClientConfig};
    use crate::auth::MemoryCredentialStore;
    use crate::models::{DepositRequest, NewWithdrawalAccount, WithdrawalRequest};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig {
            base_url: format!("{}/api", server.uri()),
            timeout: Duration::from_secs(5),
        };
        ApiClient::new(config, Arc::new(MemoryCredentialStore::with_tokens("acc", "ref"))).unwrap()
    }

    #[tokio::test]
    async fn test_request_deposit_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/wallet/deposit/request/"))
            .and(header("authorization", "Bearer acc"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5, "status": "pending"})))
            .expect(1)
            .mount(&server)
            .await;

        let deposit = DepositRequest::new("100.00", "btc", "proof.pdf", b"%PDF-1.4".to_vec()).unwrap();
        let created = client_for(&server).request_deposit(&deposit).await.unwrap();
        assert_eq!(created["id"], 5);

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("Content-Type: application/pdf"));
        assert!(body.contains("name=\"method\""));
    }

    #[tokio::test]
    async fn test_confirm_deposit_is_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/wallet/deposit/5/confirm/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let deposit = DepositRequest::new("100.00", "btc", "proof.jpg", vec![0xff, 0xd8]).unwrap();
        client_for(&server).confirm_deposit(5, &deposit).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_withdrawal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/wallet/withdraw/"))
            .and(body_json(json!({"amount": "40.00", "withdrawal_address": "bc1q"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .request_withdrawal(&WithdrawalRequest {
                amount: "40.00".to_string(),
                withdrawal_address: "bc1q".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_withdrawal_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/wallet/withdrawal-accounts/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "label": "Main", "account_details": "bc1q", "created_at": "2024-05-01T10:00:00Z"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/wallet/withdrawal-accounts/"))
            .and(body_json(json!({"label": "Spare", "account_details": "0xabc"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!({"id": 2, "label": "Spare", "account_details": "0xabc"}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let accounts = client.withdrawal_accounts().await.unwrap();
        assert_eq!(accounts[0].label, "Main");
        let created = client
            .create_withdrawal_account(&NewWithdrawalAccount {
                label: "Spare".to_string(),
                account_details: "0xabc".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 2);
        assert!(created.created_at.is_none());
    }
}
