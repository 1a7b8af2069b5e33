use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use rand::Rng;

use super::{IdentityGateway, IdentityProfile, TicketRequest, TicketingGateway};
use crate::models::IdentificationType;

/// Stand-in for the CRM identity lookup: fixed latency, randomized
/// failures, randomized open-complaint flag.
pub struct SimulatedIdentityGateway {
    latency: Duration,
    failure_rate: f64,
    existing_complaint_rate: f64,
}

impl SimulatedIdentityGateway {
    pub fn new(latency_ms: u64, failure_rate: f64, existing_complaint_rate: f64) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            failure_rate: failure_rate.clamp(0.0, 1.0),
            existing_complaint_rate: existing_complaint_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl IdentityGateway for SimulatedIdentityGateway {
    async fn authenticate(
        &self,
        _id_type: IdentificationType,
        _value: &str,
    ) -> anyhow::Result<IdentityProfile> {
        tokio::time::sleep(self.latency).await;

        let (failed, has_existing_complaint) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_bool(self.failure_rate),
                rng.gen_bool(self.existing_complaint_rate),
            )
        };
        if failed {
            anyhow::bail!("Timeout na ligação ao CRM (Siebel).");
        }

        Ok(IdentityProfile {
            name: "Cliente Registado".to_string(),
            has_existing_complaint,
        })
    }
}

/// Stand-in for the central ticketing system.
pub struct SimulatedTicketingGateway {
    latency: Duration,
    failure_rate: f64,
}

impl SimulatedTicketingGateway {
    pub fn new(latency_ms: u64, failure_rate: f64) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl TicketingGateway for SimulatedTicketingGateway {
    async fn create_ticket(&self, _request: &TicketRequest) -> anyhow::Result<String> {
        tokio::time::sleep(self.latency).await;

        let (failed, number) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_bool(self.failure_rate),
                rng.gen_range(100_000..=999_999u32),
            )
        };
        if failed {
            anyhow::bail!("Falha ao gravar protocolo no sistema central.");
        }

        Ok(format!("RCL-{}-{}", Utc::now().year(), number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ConversationState};

    #[tokio::test]
    async fn never_failing_identity_resolves() {
        let gateway = SimulatedIdentityGateway::new(0, 0.0, 1.0);
        let profile = gateway
            .authenticate(IdentificationType::Nif, "1234567")
            .await
            .unwrap();
        assert_eq!(profile.name, "Cliente Registado");
        assert!(profile.has_existing_complaint);
    }

    #[tokio::test]
    async fn always_failing_identity_reports_crm_timeout() {
        let gateway = SimulatedIdentityGateway::new(0, 1.0, 0.0);
        let err = gateway
            .authenticate(IdentificationType::Nif, "1234567")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Siebel"));
    }

    #[tokio::test]
    async fn protocol_format() {
        let gateway = SimulatedTicketingGateway::new(0, 0.0);
        let mut state = ConversationState::default();
        state.category = Some(Category::Billing);
        state.user_data.description = Some("fatura errada".to_string());
        let protocol = gateway
            .create_ticket(&TicketRequest::from_state(&state))
            .await
            .unwrap();

        let parts: Vec<&str> = protocol.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RCL");
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }
}
