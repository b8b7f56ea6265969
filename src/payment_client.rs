use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::configuration::PaymentGatewaySettings;

#[derive(Debug)]
pub struct PaymentClient {
    http_client: Client,
    base_url: String,
    api_key: SecretString,
    pg_key: SecretString,
    school_id: String,
}

/// Claims signed with the gateway key. Field names follow the gateway contract.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CollectRequestClaims {
    pub school_id: String,
    pub amount: String,
    pub callback_url: String,
}

#[derive(Debug, Serialize)]
pub struct CollectRequestBody<'a> {
    pub school_id: &'a str,
    pub amount: &'a str,
    pub callback_url: &'a str,
    pub sign: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CollectRequestResponse {
    #[serde(alias = "collectRequestId")]
    pub collect_request_id: String,
    #[serde(
        rename = "Collect_request_url",
        alias = "collect_request_url",
        alias = "collectRequestUrl"
    )]
    pub collect_request_url: String,
    #[serde(default)]
    pub sign: Option<String>,
}

/// Gateway amounts are sent as strings; whole numbers drop the fraction.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

impl PaymentClient {
    #[tracing::instrument(skip(settings))]
    pub fn new(settings: &PaymentGatewaySettings) -> Result<Self, anyhow::Error> {
        tracing::info!("Establishing connection to the payment gateway.");
        let http_client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            http_client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            pg_key: settings.pg_key.clone(),
            school_id: settings.school_id.clone(),
        })
    }

    pub fn school_id(&self) -> &str {
        &self.school_id
    }

    fn get_auth_token(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    pub fn sign(&self, claims: &CollectRequestClaims) -> Result<String, anyhow::Error> {
        let encoding_key = EncodingKey::from_secret(self.pg_key.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), claims, &encoding_key)?)
    }

    #[tracing::instrument(name = "Create collect request", skip(self))]
    pub async fn create_collect_request(
        &self,
        amount: f64,
        callback_url: &str,
    ) -> Result<CollectRequestResponse, anyhow::Error> {
        let url = format!("{}/create-collect-request", self.base_url);
        let amount = format_amount(amount);
        let sign = self.sign(&CollectRequestClaims {
            school_id: self.school_id.clone(),
            amount: amount.clone(),
            callback_url: callback_url.to_string(),
        })?;
        let request_body = CollectRequestBody {
            school_id: &self.school_id,
            amount: &amount,
            callback_url,
            sign: &sign,
        };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Payment gateway responded with {}: {}",
                status,
                body
            ));
        }
        response
            .json::<CollectRequestResponse>()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to parse response: {}", err))
    }
}
