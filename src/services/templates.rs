//! Code-owned rich message templates. These are the only source of rich
//! content in the transcript; user-supplied text never flows through here.

use chrono::{Duration, Utc};

/// Summary card for the open complaint found during identity lookup.
pub fn existing_complaint_summary() -> String {
    "<strong>Protocolo:</strong> RCL-2025-001234<br>\
     <strong>Categoria:</strong> Qualidade de Sinal<br>\
     <strong>Estado:</strong> Em Análise<br>\
     <strong>Prazo:</strong> 2 dias úteis restantes"
        .to_string()
}

/// Detail view shown when the customer asks to see the open complaint.
pub fn complaint_details() -> String {
    let registered_on = (Utc::now() - Duration::days(2)).format("%d/%m/%Y");
    format!(
        "📊 <strong>Detalhes do Protocolo RCL-2025-001234</strong><br><br>\
         <strong>Fase Atual:</strong> Análise Técnica<br>\
         <strong>Data de Registo:</strong> {registered_on}<br>\
         <strong>Última Atualização:</strong> Aguarda verificação da equipa de infraestrutura externa.<br>\
         <strong>Prazo SLA:</strong> Faltam 2 dias úteis."
    )
}

/// Card confirming a freshly created ticket.
pub fn protocol_card(protocol: &str, category_label: &str) -> String {
    let today = Utc::now().format("%d/%m/%Y");
    format!(
        "<div class=\"protocol-card\">\
         <div>📋 PROTOCOLO DE RECLAMAÇÃO</div>\
         <div class=\"protocol-number\">{protocol}</div>\
         <div class=\"protocol-meta\">\
         Categoria: {category_label}<br>\
         Data: {today}<br>\
         Prazo de resolução: 5 dias úteis\
         </div></div>"
    )
}

pub fn critical_warning() -> String {
    "⚠️ <strong>Atenção:</strong> Detectei que esta situação envolve termos críticos \
     e pode requerer prioridade legal ou técnica máxima."
        .to_string()
}

/// Handoff line for the escalation out of the complaint-detail view.
pub fn assistant_intro_process() -> String {
    "🧑‍💼 <strong>Assistente Maria:</strong> Olá! Já tenho o seu processo aberto. \
     Um momento por favor enquanto verifico os detalhes técnicos..."
        .to_string()
}

/// Handoff line for the critical-complaint escalation.
pub fn assistant_intro_personal() -> String {
    "🧑‍💼 <strong>Assistente Maria:</strong> Olá! Vou ajudá-lo pessoalmente com a \
     sua situação. Um momento por favor..."
        .to_string()
}

pub fn system_error(detail: &str) -> String {
    format!("⚠️ <strong>Erro de Sistema:</strong> {detail}")
}

pub fn submission_error(detail: &str) -> String {
    format!("⚠️ <strong>Erro:</strong> {detail}")
}

pub fn resume_notice() -> String {
    "🔄 <em>Sessão recuperada. Pode continuar de onde parou.</em>".to_string()
}
