use serde::de::IgnoredAny;

use crate::models::Notification;

use super::endpoints;
use super::request::ApiRequest;
use super::{ApiClient, ApiError};

impl ApiClient {
    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.send(&ApiRequest::get(endpoints::NOTIFICATIONS)).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(endpoints::mark_notification_read(id));
        self.send::<IgnoredAny>(&request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::{ApiClient, ClientConfig};
    use crate::auth::MemoryCredentialStore;

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig {
            base_url: format!("{}/api", server.uri()),
            timeout: Duration::from_secs(5),
        };
        ApiClient::new(config, Arc::new(MemoryCredentialStore::with_tokens("acc", "ref"))).unwrap()
    }

    #[tokio::test]
    async fn test_notifications_and_mark_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 4, "message": "Deposit approved", "is_read": false}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/4/mark-read/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "marked as read"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let items = client.notifications().await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_read);
        client.mark_notification_read(&items[0].id).await.unwrap();
    }
}
