use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::clover::models::{ElementsPage, RawOrder, RawPayment};
use crate::error::SyncError;
use crate::registry::StoreCredentials;

/// Fixed page size for the paginated payments endpoint.
const PAGE_LIMIT: usize = 100;

/// HTTP client for the Clover merchant API.
#[derive(Clone)]
pub struct CloverClient {
    client: Client,
    base_url: String,
}

impl CloverClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        CloverClient { client, base_url }
    }

    /// Fetch all payments for a half-open time window, paging by offset
    /// until the API returns an empty page.
    ///
    /// Total volume for a window is unknown upfront, so termination is on
    /// empty page rather than a fixed count.
    pub async fn fetch_payments_window(
        &self,
        creds: &StoreCredentials,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawPayment>, SyncError> {
        let start_ms = window_start.timestamp_millis();
        let end_ms = window_end.timestamp_millis();

        let mut payments = Vec::new();
        let mut offset = 0usize;

        loop {
            let url = format!(
                "{}/merchants/{}/payments?limit={}&offset={}&filter=createdTime>{}&filter=createdTime<{}",
                self.base_url.trim_end_matches('/'),
                creds.merchant_id,
                PAGE_LIMIT,
                offset,
                start_ms,
                end_ms,
            );

            let response = self
                .client
                .get(&url)
                .bearer_auth(&creds.access_token)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_status(status, body));
            }

            let page: ElementsPage<RawPayment> = response.json().await?;
            if page.elements.is_empty() {
                break;
            }
            payments.extend(page.elements);
            offset += PAGE_LIMIT;
        }

        tracing::debug!(
            merchant_id = %creds.merchant_id,
            count = payments.len(),
            "fetched payments window"
        );

        Ok(payments)
    }

    /// Fetch one order expanded with line items, discounts and refunds.
    ///
    /// Returns `None` on any failure: a single bad order must not abort the
    /// surrounding sync pass, whose payment data is already durable.
    pub async fn fetch_order_detail(
        &self,
        creds: &StoreCredentials,
        order_id: &str,
    ) -> Option<RawOrder> {
        let url = format!(
            "{}/merchants/{}/orders/{}?expand=lineItems,discounts,refunds",
            self.base_url.trim_end_matches('/'),
            creds.merchant_id,
            order_id,
        );

        let result = async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&creds.access_token)
                .send()
                .await?
                .error_for_status()?;
            response.json::<RawOrder>().await
        }
        .await;

        match result {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::warn!(order_id, error = %e, "order detail fetch failed, skipping");
                None
            }
        }
    }
}

fn classify_status(status: reqwest::StatusCode, body: String) -> SyncError {
    use reqwest::StatusCode;

    let detail = format!("{status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::RemoteAuth(detail),
        StatusCode::TOO_MANY_REQUESTS => SyncError::RemoteRateLimit(detail),
        _ => SyncError::RemoteTransient(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn test_creds() -> StoreCredentials {
        StoreCredentials {
            merchant_id: "M1".to_string(),
            access_token: "tok".to_string(),
            display_name: Some("Test Store".to_string()),
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn paginates_until_empty_page() {
        let mut server = mockito::Server::new_async().await;

        let page1 = r#"{"elements": [
            {"id": "P1", "amount": 100, "createdTime": 1717200000000},
            {"id": "P2", "amount": 200, "createdTime": 1717200001000}
        ]}"#;

        let _m1 = server
            .mock("GET", "/merchants/M1/payments")
            .match_query(Matcher::Regex("offset=0&".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page1)
            .create_async()
            .await;

        let _m2 = server
            .mock("GET", "/merchants/M1/payments")
            .match_query(Matcher::Regex("offset=100&".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"elements": []}"#)
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        let (start, end) = window();
        let payments = client
            .fetch_payments_window(&test_creds(), start, end)
            .await
            .unwrap();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].id.as_deref(), Some("P1"));
    }

    #[tokio::test]
    async fn sends_bearer_token_and_ms_filters() {
        let mut server = mockito::Server::new_async().await;
        let (start, end) = window();

        let _m = server
            .mock("GET", "/merchants/M1/payments")
            .match_header("authorization", "Bearer tok")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex(format!("createdTime(%3E|>){}", start.timestamp_millis())),
                Matcher::Regex(format!("createdTime(%3C|<){}", end.timestamp_millis())),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"elements": []}"#)
            .expect(1)
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        let payments = client
            .fetch_payments_window(&test_creds(), start, end)
            .await
            .unwrap();
        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn classifies_401_as_auth_error() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/merchants/M1/payments")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        let (start, end) = window();
        let err = client
            .fetch_payments_window(&test_creds(), start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteAuth(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn classifies_429_as_rate_limit() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/merchants/M1/payments")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        let (start, end) = window();
        let err = client
            .fetch_payments_window(&test_creds(), start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteRateLimit(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn classifies_500_as_transient() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/merchants/M1/payments")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        let (start, end) = window();
        let err = client
            .fetch_payments_window(&test_creds(), start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteTransient(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn order_detail_returns_expanded_order() {
        let mut server = mockito::Server::new_async().await;

        let body = r#"{
            "id": "ORD1",
            "lineItems": {"elements": [{"id": "I1", "name": "Coffee", "price": 450}]},
            "refunds": {"elements": []}
        }"#;

        let _m = server
            .mock("GET", "/merchants/M1/orders/ORD1")
            .match_query(Matcher::UrlEncoded(
                "expand".to_string(),
                "lineItems,discounts,refunds".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        let order = client
            .fetch_order_detail(&test_creds(), "ORD1")
            .await
            .expect("order should be present");
        assert_eq!(order.id.as_deref(), Some("ORD1"));
        assert_eq!(order.line_items.unwrap().elements.len(), 1);
    }

    #[tokio::test]
    async fn order_detail_failure_is_absent_not_error() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/merchants/M1/orders/BAD")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = CloverClient::new(server.url());
        assert!(client.fetch_order_detail(&test_creds(), "BAD").await.is_none());
    }
}
