use super::{
    parse_checkout, parse_verification, Checkout, GatewayError, GatewayResult, InitializeRequest,
    PaymentGateway, Verification,
};
use crate::config::ChapaConfig;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// HTTP client for the Chapa REST API
#[derive(Clone)]
pub struct ChapaClient {
    secret_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ChapaClient {
    /// Create a new client from gateway configuration
    pub fn with_config(config: &ChapaConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Read the body as JSON regardless of HTTP status; Chapa reports errors in the envelope
    async fn read_body(response: reqwest::Response) -> GatewayResult<(bool, Value)> {
        let http_ok = response.status().is_success();
        let status = response.status();
        let text = response.text().await?;

        let payload = serde_json::from_str::<Value>(&text).map_err(|_| {
            GatewayError::InvalidResponse(format!("HTTP {} with non-JSON body", status))
        })?;

        Ok((http_ok, payload))
    }
}

#[async_trait]
impl PaymentGateway for ChapaClient {
    async fn initialize(&self, request: &InitializeRequest) -> GatewayResult<Checkout> {
        debug!("Initializing Chapa transaction tx_ref={}", request.tx_ref);

        let response = self
            .client
            .post(self.endpoint("transaction/initialize"))
            .bearer_auth(&self.secret_key)
            .json(request)
            .send()
            .await?;

        let (http_ok, payload) = Self::read_body(response).await?;
        let result = parse_checkout(http_ok, payload);

        match &result {
            Ok(_) => info!("Chapa checkout created for tx_ref={}", request.tx_ref),
            Err(e) => warn!("Chapa initialization failed for tx_ref={}: {}", request.tx_ref, e),
        }

        result
    }

    async fn verify(&self, tx_ref: &str) -> GatewayResult<Verification> {
        debug!("Verifying Chapa transaction tx_ref={}", tx_ref);

        let response = self
            .client
            .get(self.endpoint(&format!("transaction/verify/{}", tx_ref)))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let (http_ok, payload) = Self::read_body(response).await?;
        parse_verification(http_ok, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ChapaConfig {
            base_url: "https://api.chapa.co/v1/".to_string(),
            secret_key: "CHASECK_TEST-xyz".to_string(),
            ..Default::default()
        };
        let client = ChapaClient::with_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.chapa.co/v1");
        assert_eq!(
            client.endpoint("/transaction/initialize"),
            "https://api.chapa.co/v1/transaction/initialize"
        );
    }
}
