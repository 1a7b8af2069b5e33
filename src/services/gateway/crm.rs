use anyhow::Context;
use async_trait::async_trait;

use super::{IdentityGateway, IdentityProfile, TicketRequest, TicketingGateway};
use crate::models::IdentificationType;

/// Identity lookup against the real CRM REST API. Same contract as the
/// simulated gateway; only the transport differs.
pub struct CrmIdentityGateway {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl CrmIdentityGateway {
    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            base_url,
            api_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityGateway for CrmIdentityGateway {
    async fn authenticate(
        &self,
        id_type: IdentificationType,
        value: &str,
    ) -> anyhow::Result<IdentityProfile> {
        let body = serde_json::json!({
            "identification_type": id_type,
            "identification_value": value,
        });

        let resp = self
            .client
            .post(format!("{}/api/v1/identity/verify", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .context("failed to call CRM identity API")?
            .error_for_status()
            .context("CRM identity API returned error")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse CRM identity response")?;

        Ok(IdentityProfile {
            name: data["name"].as_str().unwrap_or("Cliente Registado").to_string(),
            has_existing_complaint: data["has_open_complaint"].as_bool().unwrap_or(false),
        })
    }
}

/// Ticket creation against the central complaint system.
pub struct CrmTicketingGateway {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl CrmTicketingGateway {
    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            base_url,
            api_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TicketingGateway for CrmTicketingGateway {
    async fn create_ticket(&self, request: &TicketRequest) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(format!("{}/api/v1/complaints", self.base_url))
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await
            .context("failed to call CRM ticketing API")?
            .error_for_status()
            .context("CRM ticketing API returned error")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse CRM ticketing response")?;

        data["protocol"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing protocol in CRM ticketing response"))
    }
}
