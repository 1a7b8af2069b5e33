pub mod crm;
pub mod simulated;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Category, ConversationState, IdentificationType};

/// Result of a successful identity lookup.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub name: String,
    pub has_existing_complaint: bool,
}

/// Collected complaint data shipped to the ticketing backend.
#[derive(Debug, Clone, Serialize)]
pub struct TicketRequest {
    pub identification_type: Option<IdentificationType>,
    pub category: Category,
    pub description: String,
    pub critical: bool,
}

impl TicketRequest {
    pub fn from_state(state: &ConversationState) -> Self {
        Self {
            identification_type: state.user_data.identification_type,
            category: state.category.unwrap_or(Category::Other),
            description: state.user_data.description.clone().unwrap_or_default(),
            critical: state.critical,
        }
    }
}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn authenticate(
        &self,
        id_type: IdentificationType,
        value: &str,
    ) -> anyhow::Result<IdentityProfile>;
}

#[async_trait]
pub trait TicketingGateway: Send + Sync {
    /// Returns the protocol id of the created ticket.
    async fn create_ticket(&self, request: &TicketRequest) -> anyhow::Result<String>;
}
