//! Dashboard aggregates and transaction history.

use serde_json::Value;

use crate::models::{
    CreateTransaction, DashboardPerformance, DashboardSummary, TransactionFilter, TransactionList,
};

use super::endpoints;
use super::request::ApiRequest;
use super::{ApiClient, ApiError};

impl ApiClient {
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.send(&ApiRequest::get(endpoints::DASHBOARD_SUMMARY)).await
    }

    /// Per-day approved totals for the last 30 days.
    pub async fn dashboard_performance(&self) -> Result<DashboardPerformance, ApiError> {
        self.send(&ApiRequest::get(endpoints::DASHBOARD_PERFORMANCE)).await
    }

    pub async fn transactions(&self, filter: TransactionFilter) -> Result<TransactionList, ApiError> {
        let request = filter
            .query_pairs()
            .into_iter()
            .fold(ApiRequest::get(endpoints::TRANSACTIONS), |request, (name, value)| {
                request.query(name, value)
            });
        self.send(&request).await
    }

    pub async fn create_transaction(&self, transaction: &CreateTransaction) -> Result<Value, ApiError> {
        let request = ApiRequest::post(endpoints::CREATE_TRANSACTION).json(transaction)?;
        self.send(&request).await
    }
}
