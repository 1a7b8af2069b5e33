pub mod conversation;
pub mod metrics;

pub use conversation::{
    Category, ConversationState, IdentificationType, MessageEntry, MessageOption, Sender,
    SessionSnapshot, StatusBadge, Step, UserData,
};
pub use metrics::{satisfaction_score, KpiReport, MetricsState};
