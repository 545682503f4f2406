use reqwest::{Client, StatusCode};
use std::time::Duration;
use valuation_core::market::MarketData;
use valuation_core::ValuationError;

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Client for the upstream stock-data API.
#[derive(Clone)]
pub struct MarketApiClient {
    base_url: String,
    api_key: String,
    client: Client,
    retry_delay: Duration,
}

impl MarketApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Reads `MARKET_API_BASE_URL` and `MARKET_API_KEY`.
    pub fn from_env() -> Result<Self, ValuationError> {
        let base_url = std::env::var("MARKET_API_BASE_URL")
            .map_err(|_| ValuationError::InvalidConfig("MARKET_API_BASE_URL not set".to_string()))?;
        let api_key = std::env::var("MARKET_API_KEY")
            .map_err(|_| ValuationError::InvalidConfig("MARKET_API_KEY not set".to_string()))?;
        Ok(Self::new(base_url, api_key))
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn stock_url(&self) -> String {
        format!("{}/stock", self.base_url)
    }

    /// Send a request, retrying while the API answers 429.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ValuationError> {
        let request = builder.build().map_err(|e| ValuationError::ApiError(e.to_string()))?;

        for attempt in 1..=MAX_ATTEMPTS {
            let req_clone = request
                .try_clone()
                .ok_or_else(|| ValuationError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| ValuationError::ApiError(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            tracing::warn!(
                "Market API 429 rate limited, waiting {:?} before retry {}/{}",
                self.retry_delay,
                attempt,
                MAX_ATTEMPTS
            );
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(ValuationError::ApiError(format!(
            "Rate limited by market API after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    /// Fetch the full stock payload for a company name.
    pub async fn fetch_stock(&self, name: &str) -> Result<MarketData, ValuationError> {
        tracing::info!("Fetching market data for {}", name);

        let response = self
            .send_request(
                self.client
                    .get(self.stock_url())
                    .query(&[("name", name)])
                    .header("x-api-key", &self.api_key),
            )
            .await?;

        if !response.status().is_success() {
            return Err(ValuationError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| ValuationError::InvalidData(format!("Unexpected market payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves the canned responses in order, one per connection, and records
    /// each raw request.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap();
                seen.lock().unwrap().push(String::from_utf8_lossy(&buf[..n]).to_string());

                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("http://{}/", addr), requests)
    }

    const BODY: &str = r#"{"companyName":"Infosys Limited","yearHigh":"1990.9","currentPrice":{"BSE":"1820.5","NSE":1821}}"#;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = MarketApiClient::new("https://example.test/api/", "key");
        assert_eq!(client.stock_url(), "https://example.test/api/stock");
    }

    #[tokio::test]
    async fn test_fetch_stock_sends_key_and_name() {
        let (base, requests) = serve(vec![(200, BODY)]).await;
        let client = MarketApiClient::new(base, "secret-key");

        let data = client.fetch_stock("infosys").await.unwrap();
        assert_eq!(data.company_name, "Infosys Limited");
        assert_eq!(data.year_high, Some(1990.9));

        let seen = requests.lock().unwrap();
        let request = seen[0].to_lowercase();
        assert!(request.starts_with("get /stock?name=infosys "));
        assert!(request.contains("x-api-key: secret-key"));
    }

    #[tokio::test]
    async fn test_retries_after_rate_limit() {
        let (base, requests) = serve(vec![(429, "{}"), (200, BODY)]).await;
        let client = MarketApiClient::new(base, "k").with_retry_delay(Duration::from_millis(10));

        let data = client.fetch_stock("infosys").await.unwrap();
        assert_eq!(data.current_price.unwrap().nse, Some(1821.0));
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_rate_limits() {
        let (base, _) = serve(vec![(429, "{}"), (429, "{}"), (429, "{}")]).await;
        let client = MarketApiClient::new(base, "k").with_retry_delay(Duration::from_millis(10));

        let err = client.fetch_stock("infosys").await.unwrap_err();
        assert!(matches!(err, ValuationError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let (base, _) = serve(vec![(500, r#"{"message":"boom"}"#)]).await;
        let client = MarketApiClient::new(base, "k");

        match client.fetch_stock("infosys").await {
            Err(ValuationError::ApiError(msg)) => assert!(msg.contains("500")),
            other => panic!("unexpected: {:?}", other.map(|d| d.company_name)),
        }
    }
}
