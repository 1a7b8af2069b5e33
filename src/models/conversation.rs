use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MetricsState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    Identification,
    AwaitingIdInput,
    ExistingComplaint,
    AfterView,
    Category,
    Description,
    CriticalDecision,
    RetrySubmission,
    Satisfaction,
    Closed,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::Identification => "identification",
            Step::AwaitingIdInput => "awaiting_id_input",
            Step::ExistingComplaint => "existing_complaint",
            Step::AfterView => "after_view",
            Step::Category => "category",
            Step::Description => "description",
            Step::CriticalDecision => "critical_decision",
            Step::RetrySubmission => "retry_submission",
            Step::Satisfaction => "satisfaction",
            Step::Closed => "closed",
        }
    }

    /// Steps where the free-text input is live; everywhere else the widget
    /// only offers option buttons.
    pub fn accepts_text(&self) -> bool {
        matches!(self, Step::AwaitingIdInput | Step::Description)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Closed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationType {
    Nif,
    Account,
    Mobile,
}

impl IdentificationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nif" => Some(IdentificationType::Nif),
            "account" => Some(IdentificationType::Account),
            "mobile" => Some(IdentificationType::Mobile),
            _ => None,
        }
    }

    /// Display name used when prompting for the value itself.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            IdentificationType::Nif => "NIF",
            IdentificationType::Account => "Número da Conta",
            IdentificationType::Mobile => "Número de Telemóvel",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Billing,
    Signal,
    Technical,
    Service,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Billing,
        Category::Signal,
        Category::Technical,
        Category::Service,
        Category::Other,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "faturacao" => Some(Category::Billing),
            "sinal" => Some(Category::Signal),
            "tecnico" => Some(Category::Technical),
            "atendimento" => Some(Category::Service),
            "outro" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Category::Billing => "faturacao",
            Category::Signal => "sinal",
            Category::Technical => "tecnico",
            Category::Service => "atendimento",
            Category::Other => "outro",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Billing => "💳 Faturação",
            Category::Signal => "📶 Qualidade de Sinal",
            Category::Technical => "🔧 Apoio Técnico",
            Category::Service => "👤 Atendimento",
            Category::Other => "📋 Outro",
        }
    }

    /// Label without the emoji prefix, for status lines and the protocol card.
    pub fn short_label(&self) -> &'static str {
        match self {
            Category::Billing => "Faturação",
            Category::Signal => "Qualidade de Sinal",
            Category::Technical => "Apoio Técnico",
            Category::Service => "Atendimento",
            Category::Other => "Outro",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Billing => "Problemas com faturas ou cobranças",
            Category::Signal => "Internet lenta ou sem conexão",
            Category::Technical => "Problemas com equipamentos",
            Category::Service => "Questões de serviço ao cliente",
            Category::Other => "Outras situações",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageOption {
    pub id: String,
    pub display_text: String,
    /// Controlled rich rendering of the option label, produced only from
    /// code-owned templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_display: Option<String>,
    #[serde(default)]
    pub is_rich_content: bool,
}

impl MessageOption {
    pub fn plain(id: &str, display_text: &str) -> Self {
        Self {
            id: id.to_string(),
            display_text: display_text.to_string(),
            rich_display: None,
            is_rich_content: false,
        }
    }

    pub fn rich(id: &str, display_text: String, rich_display: String) -> Self {
        Self {
            id: id.to_string(),
            display_text,
            rich_display: Some(rich_display),
            is_rich_content: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEntry {
    pub sender: Sender,
    pub text: String,
    /// Rich entries come exclusively from code-owned templates. User text
    /// is always stored and rendered as plain text.
    #[serde(default)]
    pub is_rich_content: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<MessageOption>>,
    pub timestamp: DateTime<Utc>,
}

impl MessageEntry {
    pub fn user(text: &str) -> Self {
        Self {
            sender: Sender::User,
            text: text.to_string(),
            is_rich_content: false,
            options: None,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(text: &str) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.to_string(),
            is_rich_content: false,
            options: None,
            timestamp: Utc::now(),
        }
    }

    pub fn bot_rich(text: String) -> Self {
        Self {
            sender: Sender::Bot,
            text,
            is_rich_content: true,
            options: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_options(mut self, options: Vec<MessageOption>) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_type: Option<IdentificationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub step: Step,
    #[serde(default)]
    pub user_data: UserData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_validation_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: MetricsState,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            step: Step::Welcome,
            user_data: UserData::default(),
            category: None,
            critical: false,
            protocol: None,
            last_validation_error: None,
            session_start_time: None,
            metrics: MetricsState::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusBadge {
    Pending,
    Active,
    Error,
}

impl StatusBadge {
    pub fn class_name(&self) -> &'static str {
        match self {
            StatusBadge::Pending => "status-badge pending",
            StatusBadge::Active => "status-badge active",
            StatusBadge::Error => "status-badge error",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusBadge::Pending => "Em Progresso",
            StatusBadge::Active => "Concluído",
            StatusBadge::Error => "Erro",
        }
    }
}

/// The unit of persistence: written after every state-affecting action,
/// read once when the widget loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: ConversationState,
    #[serde(default)]
    pub transcript: Vec<MessageEntry>,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub badge_class: String,
    #[serde(default)]
    pub badge_text: String,
}

impl SessionSnapshot {
    pub fn fresh() -> Self {
        let badge = StatusBadge::Pending;
        Self {
            state: ConversationState::default(),
            transcript: vec![],
            status_text: "Sessão iniciada".to_string(),
            badge_class: badge.class_name().to_string(),
            badge_text: badge.label().to_string(),
        }
    }

    pub fn set_status(&mut self, text: &str, badge: StatusBadge) {
        self.status_text = text.to_string();
        self.badge_class = badge.class_name().to_string();
        self.badge_text = badge.label().to_string();
    }
}
