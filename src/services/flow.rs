use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::db::queries;
use crate::models::{
    satisfaction_score, Category, ConversationState, IdentificationType, KpiReport, MessageEntry,
    MessageOption, SessionSnapshot, StatusBadge, Step,
};
use crate::services::classifier;
use crate::services::gateway::TicketRequest;
use crate::services::narration::Narration;
use crate::services::templates;
use crate::services::validation;
use crate::state::AppState;

const WELCOME: &str = "Olá! Sou o Alou, o assistente virtual da CVTelecom. 👋 \
    Estou aqui para ajudá-lo a registar a sua reclamação de forma rápida e conveniente, 24/7.";
const IDENTIFY_PROMPT: &str =
    "Para começar, preciso validar a sua identidade. Como deseja identificar-se?";
const CATEGORY_PROMPT: &str = "Por favor, selecione a categoria da sua reclamação:";

/// Everything the widget needs to render after a transition: the full
/// transcript (the view is fully re-rendered), input availability, the
/// status line and the derived KPIs.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub step: &'static str,
    pub messages: Vec<MessageEntry>,
    pub input_enabled: bool,
    pub status_text: String,
    pub badge_class: String,
    pub badge_text: String,
    pub kpis: KpiReport,
}

/// Resumes a persisted session, or starts a fresh conversation when no
/// snapshot exists for this id.
pub async fn start_session(state: &Arc<AppState>, session_id: &str) -> anyhow::Result<SessionView> {
    let lock = state.session_lock(session_id);
    let _guard = lock.lock().await;

    if let Some(mut snap) = load(state, session_id)? {
        tracing::info!(
            session = %session_id,
            step = snap.state.step.as_str(),
            "resuming session"
        );
        snap.transcript
            .push(MessageEntry::bot_rich(templates::resume_notice()));
        persist(state, session_id, &snap);
        return Ok(build_view(session_id, &snap));
    }

    init_fresh(state, session_id).await
}

/// Read-only view of the current session.
pub async fn session_view(
    state: &Arc<AppState>,
    session_id: &str,
) -> anyhow::Result<Option<SessionView>> {
    let lock = state.session_lock(session_id);
    let _guard = lock.lock().await;

    Ok(load(state, session_id)?.map(|snap| build_view(session_id, &snap)))
}

pub async fn kpi_report(
    state: &Arc<AppState>,
    session_id: &str,
) -> anyhow::Result<Option<KpiReport>> {
    let lock = state.session_lock(session_id);
    let _guard = lock.lock().await;

    Ok(load(state, session_id)?.map(|snap| snap.state.metrics.kpi_report()))
}

/// Wipes the persisted snapshot and reinitializes a blank session under
/// the same id.
pub async fn restart_session(
    state: &Arc<AppState>,
    session_id: &str,
) -> anyhow::Result<SessionView> {
    let lock = state.session_lock(session_id);
    let _guard = lock.lock().await;

    tracing::info!(session = %session_id, "restarting session");
    clear(state, session_id);
    init_fresh(state, session_id).await
}

/// Handles a multiple-choice click. Options that do not belong to the
/// current step (stale buttons after a resume) are ignored without any
/// state change.
pub async fn process_option(
    state: &Arc<AppState>,
    session_id: &str,
    option_id: &str,
) -> anyhow::Result<Option<SessionView>> {
    let lock = state.session_lock(session_id);
    let _guard = lock.lock().await;

    let Some(mut snap) = load(state, session_id)? else {
        return Ok(None);
    };
    let step = snap.state.step;

    let Some(option) = options_for(step).into_iter().find(|o| o.id == option_id) else {
        tracing::warn!(
            session = %session_id,
            step = step.as_str(),
            option = option_id,
            "option does not belong to current step, ignoring"
        );
        return Ok(Some(build_view(session_id, &snap)));
    };

    tracing::info!(
        session = %session_id,
        step = step.as_str(),
        option = option_id,
        "processing option"
    );

    if step == Step::Closed && option_id == "restart" {
        clear(state, session_id);
        return init_fresh(state, session_id).await.map(Some);
    }

    snap.transcript.push(MessageEntry::user(&option.display_text));
    persist(state, session_id, &snap);

    match (step, option_id) {
        (Step::Identification, _) => {
            if let Some(id_type) = IdentificationType::parse(option_id) {
                snap.state.user_data.identification_type = Some(id_type);
                snap.state.step = Step::AwaitingIdInput;
                let prompt = format!("Por favor, digite o seu {}:", id_type.prompt_label());
                play(state, session_id, &mut snap, Narration::new().bot_after(500, &prompt)).await;
            }
        }

        (Step::ExistingComplaint, "new") | (Step::AfterView, "new") => {
            play(
                state,
                session_id,
                &mut snap,
                Narration::new().options_after(0, CATEGORY_PROMPT, category_options()),
            )
            .await;
            snap.state.step = Step::Category;
        }

        (Step::ExistingComplaint, "exit") | (Step::AfterView, "exit") => {
            close_session(state, session_id, &mut snap).await;
        }

        (Step::ExistingComplaint, "view") => {
            // Informational only; the identity gateway is not consulted again.
            play(
                state,
                session_id,
                &mut snap,
                Narration::new()
                    .bot_after(2500, "A consultar os detalhes no sistema central...")
                    .rich_after(1000, templates::complaint_details())
                    .options_after(1500, "Posso ajudar com mais alguma coisa?", after_view_options()),
            )
            .await;
            snap.state.step = Step::AfterView;
        }

        (Step::AfterView, "human") => {
            transfer_to_human(
                state,
                session_id,
                &mut snap,
                "Vou transferi-lo para um assistente humano para analisar o estado deste processo em detalhe.",
                templates::assistant_intro_process(),
            )
            .await;
        }

        (Step::Category, _) => {
            if let Some(category) = Category::parse(option_id) {
                snap.state.category = Some(category);
                snap.set_status(
                    &format!("Categoria: {}", category.short_label()),
                    StatusBadge::Pending,
                );
                play(
                    state,
                    session_id,
                    &mut snap,
                    Narration::new()
                        .bot("Por favor, descreva detalhadamente o motivo da sua reclamação:"),
                )
                .await;
                snap.state.step = Step::Description;
            }
        }

        (Step::CriticalDecision, "human") => {
            transfer_to_human(
                state,
                session_id,
                &mut snap,
                "Esta situação requer atenção imediata. Vou transferi-lo para um assistente humano.",
                templates::assistant_intro_personal(),
            )
            .await;
        }

        (Step::CriticalDecision, "continue") => {
            submit_ticket(state, session_id, &mut snap).await;
        }

        (Step::RetrySubmission, "retry") => {
            if state.config.narration_delays {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            submit_ticket(state, session_id, &mut snap).await;
        }

        (Step::Satisfaction, _) => {
            if let Some(score) = satisfaction_score(option_id) {
                snap.state.metrics.record_satisfaction(score);
            }
            play(
                state,
                session_id,
                &mut snap,
                Narration::new().bot("Obrigado pelo seu feedback! A sua opinião ajuda-nos a melhorar."),
            )
            .await;
            snap.set_status("Sessão concluída", StatusBadge::Active);
            end_timer(&mut snap.state, false);
            close_with_restart(state, session_id, &mut snap).await;
        }

        _ => {
            tracing::warn!(
                session = %session_id,
                step = step.as_str(),
                option = option_id,
                "no transition for option"
            );
        }
    }

    persist(state, session_id, &snap);
    Ok(Some(build_view(session_id, &snap)))
}

/// Handles a free-text submission. Only `awaiting_id_input` and
/// `description` accept text; everywhere else the input is ignored.
pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    text: &str,
) -> anyhow::Result<Option<SessionView>> {
    let lock = state.session_lock(session_id);
    let _guard = lock.lock().await;

    let Some(mut snap) = load(state, session_id)? else {
        return Ok(None);
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(Some(build_view(session_id, &snap)));
    }

    let step = snap.state.step;
    if !step.accepts_text() {
        tracing::warn!(
            session = %session_id,
            step = step.as_str(),
            "free-text input ignored for step"
        );
        return Ok(Some(build_view(session_id, &snap)));
    }

    // The text may carry the identification value; log the step only.
    tracing::info!(session = %session_id, step = step.as_str(), "processing message");

    snap.transcript.push(MessageEntry::user(text));
    persist(state, session_id, &snap);

    match step {
        Step::AwaitingIdInput => {
            handle_identification_input(state, session_id, &mut snap, text).await;
        }
        Step::Description => {
            handle_description(state, session_id, &mut snap, text).await;
        }
        _ => {}
    }

    persist(state, session_id, &snap);
    Ok(Some(build_view(session_id, &snap)))
}

async fn init_fresh(state: &Arc<AppState>, session_id: &str) -> anyhow::Result<SessionView> {
    tracing::info!(session = %session_id, "starting fresh session");

    let mut snap = SessionSnapshot::fresh();
    play(state, session_id, &mut snap, Narration::new().bot(WELCOME)).await;

    snap.state.metrics.record_session_start();
    snap.state.session_start_time = Some(Utc::now());
    play(
        state,
        session_id,
        &mut snap,
        Narration::new().options_after(1000, IDENTIFY_PROMPT, identification_options()),
    )
    .await;
    snap.state.step = Step::Identification;

    persist(state, session_id, &snap);
    Ok(build_view(session_id, &snap))
}

async fn handle_identification_input(
    state: &Arc<AppState>,
    session_id: &str,
    snap: &mut SessionSnapshot,
    text: &str,
) {
    let id_type = snap.state.user_data.identification_type;

    if let Err(err) = validation::validate_identification(id_type.as_ref(), text) {
        snap.state.last_validation_error = Some(err.to_string());
        play(
            state,
            session_id,
            snap,
            Narration::new().bot(&format!("❌ {err}")),
        )
        .await;
        return;
    }
    snap.state.last_validation_error = None;

    let Some(id_type) = id_type else {
        // Snapshot predates the type selection; back to the picker.
        tracing::warn!(session = %session_id, "missing identification type, re-prompting");
        snap.state.step = Step::Identification;
        play(
            state,
            session_id,
            snap,
            Narration::new().options_after(0, IDENTIFY_PROMPT, identification_options()),
        )
        .await;
        return;
    };

    snap.state.user_data.identification_value = Some(text.to_string());
    persist(state, session_id, snap);

    match state.identity.authenticate(id_type, text).await {
        Ok(profile) => {
            snap.set_status(&format!("Cliente validado ({text})"), StatusBadge::Pending);
            let mut narration = Narration::new()
                .bot("Excelente! Verificando os seus dados...")
                .bot_after(2500, "A verificar o histórico no sistema...");

            if profile.has_existing_complaint {
                narration = narration
                    .bot_after(1000, "Encontrei uma reclamação já registada no seu nome:")
                    .rich_after(0, templates::existing_complaint_summary())
                    .options_after(1000, "Como deseja proceder?", existing_complaint_options());
                snap.state.step = Step::ExistingComplaint;
            } else {
                narration = narration
                    .bot_after(1000, "Não encontrei reclamações em aberto. Vamos registar uma nova.")
                    .options_after(1000, CATEGORY_PROMPT, category_options());
                snap.state.step = Step::Category;
            }
            play(state, session_id, snap, narration).await;
        }
        Err(err) => {
            // Surface the error and stay put; the user retries manually.
            tracing::warn!(session = %session_id, error = %err, "identity gateway failure");
            snap.set_status("Erro de Autenticação", StatusBadge::Error);
            play(
                state,
                session_id,
                snap,
                Narration::new()
                    .rich_after(0, templates::system_error(&err.to_string()))
                    .bot("Por favor, tente inserir os dados novamente:"),
            )
            .await;
        }
    }
}

async fn handle_description(
    state: &Arc<AppState>,
    session_id: &str,
    snap: &mut SessionSnapshot,
    text: &str,
) {
    snap.state.user_data.description = Some(text.to_string());
    snap.state.critical = classifier::is_critical(text, &state.config.critical_keywords);

    play(
        state,
        session_id,
        snap,
        Narration::new().bot_after(2500, "Analisando os detalhes fornecidos..."),
    )
    .await;

    if snap.state.critical {
        tracing::info!(session = %session_id, "complaint flagged as critical");
        play(
            state,
            session_id,
            snap,
            Narration::new()
                .rich_after(1000, templates::critical_warning())
                .options_after(1000, "Como deseja proceder?", critical_options()),
        )
        .await;
        snap.state.step = Step::CriticalDecision;
    } else {
        submit_ticket(state, session_id, snap).await;
    }
}

/// Submission flow shared by the non-critical path, the critical
/// "continue" choice and every manual retry. Gateway failure moves to
/// `retry_submission`; the collected data is never dropped, so a later
/// retry submits exactly what was gathered the first time.
async fn submit_ticket(state: &Arc<AppState>, session_id: &str, snap: &mut SessionSnapshot) {
    snap.set_status("A comunicar com o CRM...", StatusBadge::Pending);
    persist(state, session_id, snap);
    if state.config.narration_delays {
        tokio::time::sleep(Duration::from_millis(1000)).await;
    }

    let request = TicketRequest::from_state(&snap.state);
    match state.ticketing.create_ticket(&request).await {
        Ok(protocol) => {
            tracing::info!(session = %session_id, protocol = %protocol, "ticket created");
            snap.state.protocol = Some(protocol.clone());
            end_timer(&mut snap.state, true);
            snap.set_status("Reclamação registada com sucesso", StatusBadge::Active);
            play(
                state,
                session_id,
                snap,
                Narration::new()
                    .bot("Reclamação registada com sucesso! Aqui está o seu protocolo:")
                    .rich_after(
                        0,
                        templates::protocol_card(&protocol, request.category.short_label()),
                    )
                    .bot_after(
                        1500,
                        "📧 Enviámos uma confirmação para o seu email com os detalhes e prazos (SLA).",
                    )
                    .options_after(
                        1500,
                        "Como avalia a sua experiência com o Alou hoje?",
                        satisfaction_options(),
                    ),
            )
            .await;
            snap.state.step = Step::Satisfaction;
        }
        Err(err) => {
            tracing::warn!(session = %session_id, error = %err, "ticketing gateway failure");
            snap.set_status("Erro no Registo", StatusBadge::Error);
            play(
                state,
                session_id,
                snap,
                Narration::new()
                    .rich_after(0, templates::submission_error(&err.to_string()))
                    .options_after(
                        0,
                        "Os nossos sistemas estão temporariamente indisponíveis. A sua sessão \
                         foi guardada. Deseja tentar submeter novamente?",
                        retry_options(),
                    ),
            )
            .await;
            snap.state.step = Step::RetrySubmission;
        }
    }
}

async fn transfer_to_human(
    state: &Arc<AppState>,
    session_id: &str,
    snap: &mut SessionSnapshot,
    announcement: &str,
    assistant_intro: String,
) {
    play(
        state,
        session_id,
        snap,
        Narration::new().bot_after(2000, announcement),
    )
    .await;
    snap.set_status("Transferido para assistente", StatusBadge::Active);
    snap.state.metrics.record_transfer();
    end_timer(&mut snap.state, false);
    play(
        state,
        session_id,
        snap,
        Narration::new().rich_after(1000, assistant_intro),
    )
    .await;
    close_with_restart(state, session_id, snap).await;
}

async fn close_session(state: &Arc<AppState>, session_id: &str, snap: &mut SessionSnapshot) {
    play(
        state,
        session_id,
        snap,
        Narration::new().bot("Obrigado por utilizar o Alou CVT. Até breve! 👋"),
    )
    .await;
    snap.set_status("Sessão encerrada", StatusBadge::Active);
    close_with_restart(state, session_id, snap).await;
}

async fn close_with_restart(state: &Arc<AppState>, session_id: &str, snap: &mut SessionSnapshot) {
    snap.state.step = Step::Closed;
    play(
        state,
        session_id,
        snap,
        Narration::new().options_after(
            0,
            "Pode iniciar uma nova reclamação quando desejar.",
            restart_options(),
        ),
    )
    .await;
}

/// Ends the session timer. The first caller wins; the timer is cleared,
/// so later calls are no-ops.
fn end_timer(state: &mut ConversationState, resolved_by_bot: bool) {
    let Some(started) = state.session_start_time.take() else {
        return;
    };
    if resolved_by_bot {
        let duration_ms = (Utc::now() - started).num_milliseconds().max(0) as u64;
        state.metrics.record_resolution(duration_ms);
    }
}

/// Plays a narration sequence: sleep through the scripted pause (when
/// enabled), append the message, persist.
async fn play(
    state: &Arc<AppState>,
    session_id: &str,
    snap: &mut SessionSnapshot,
    narration: Narration,
) {
    for step in narration.into_steps() {
        if state.config.narration_delays && step.pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(step.pause_ms)).await;
        }
        snap.transcript.push(step.message);
        persist(state, session_id, snap);
    }
}

fn load(state: &Arc<AppState>, session_id: &str) -> anyhow::Result<Option<SessionSnapshot>> {
    let db = state.db.lock().unwrap();
    queries::get_snapshot(&db, session_id)
}

/// Persistence is fire-and-forget: a failed write only costs durability,
/// the conversation continues in memory.
fn persist(state: &Arc<AppState>, session_id: &str, snap: &SessionSnapshot) {
    let db = state.db.lock().unwrap();
    if let Err(err) =
        queries::save_snapshot(&db, session_id, snap, state.config.session_ttl_minutes)
    {
        tracing::warn!(session = %session_id, error = %err, "failed to persist session snapshot");
    }
}

fn clear(state: &Arc<AppState>, session_id: &str) {
    let db = state.db.lock().unwrap();
    if let Err(err) = queries::clear_snapshot(&db, session_id) {
        tracing::warn!(session = %session_id, error = %err, "failed to clear session snapshot");
    }
}

fn build_view(session_id: &str, snap: &SessionSnapshot) -> SessionView {
    SessionView {
        session_id: session_id.to_string(),
        step: snap.state.step.as_str(),
        messages: snap.transcript.clone(),
        input_enabled: snap.state.step.accepts_text(),
        status_text: snap.status_text.clone(),
        badge_class: snap.badge_class.clone(),
        badge_text: snap.badge_text.clone(),
        kpis: snap.state.metrics.kpi_report(),
    }
}

// ── Option sets ──
//
// The option lists double as the dispatch guard: an option id is only
// actionable while the current step's list contains it.

fn options_for(step: Step) -> Vec<MessageOption> {
    match step {
        Step::Identification => identification_options(),
        Step::ExistingComplaint => existing_complaint_options(),
        Step::AfterView => after_view_options(),
        Step::Category => category_options(),
        Step::CriticalDecision => critical_options(),
        Step::RetrySubmission => retry_options(),
        Step::Satisfaction => satisfaction_options(),
        Step::Closed => restart_options(),
        Step::Welcome | Step::AwaitingIdInput | Step::Description => vec![],
    }
}

fn identification_options() -> Vec<MessageOption> {
    vec![
        MessageOption::plain("nif", "🔢 NIF"),
        MessageOption::plain("account", "📱 Número da Conta"),
        MessageOption::plain("mobile", "📞 Número de Telemóvel"),
    ]
}

fn category_options() -> Vec<MessageOption> {
    Category::ALL
        .iter()
        .map(|c| {
            MessageOption::rich(
                c.id(),
                format!("{} - {}", c.label(), c.description()),
                format!("{} - <small>{}</small>", c.label(), c.description()),
            )
        })
        .collect()
}

fn existing_complaint_options() -> Vec<MessageOption> {
    vec![
        MessageOption::plain("view", "👁️ Ver estado detalhado"),
        MessageOption::plain("new", "➕ Registar nova reclamação"),
        MessageOption::plain("exit", "❌ Sair"),
    ]
}

fn after_view_options() -> Vec<MessageOption> {
    vec![
        MessageOption::plain("new", "➕ Registar nova reclamação"),
        MessageOption::plain("human", "👤 Falar com assistente sobre isto"),
        MessageOption::plain("exit", "❌ Encerrar"),
    ]
}

fn critical_options() -> Vec<MessageOption> {
    vec![
        MessageOption::plain("human", "👤 Transferir para assistente humano agora"),
        MessageOption::plain("continue", "✅ Manter registo automático normal"),
    ]
}

fn retry_options() -> Vec<MessageOption> {
    vec![MessageOption::plain("retry", "🔄 Tentar Novamente")]
}

fn satisfaction_options() -> Vec<MessageOption> {
    vec![
        MessageOption::plain("great", "😄 Excelente"),
        MessageOption::plain("good", "🙂 Bom"),
        MessageOption::plain("ok", "😐 Razoável"),
        MessageOption::plain("bad", "😞 Insatisfeito"),
    ]
}

fn restart_options() -> Vec<MessageOption> {
    vec![MessageOption::plain("restart", "🔄 Iniciar Nova Reclamação")]
}
