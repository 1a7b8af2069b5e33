use chrono::{Duration, Utc};
use rusqlite::{params, Connection};

use crate::models::{ConversationState, SessionSnapshot};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Loads the snapshot for a session. Expired rows and blobs that cannot
/// be deserialized read as absent, so the caller starts a fresh session
/// instead of propagating a parse error.
pub fn get_snapshot(conn: &Connection, session_id: &str) -> anyhow::Result<Option<SessionSnapshot>> {
    let now = Utc::now().format(TIME_FORMAT).to_string();
    let result = conn.query_row(
        "SELECT snapshot FROM sessions WHERE id = ?1 AND expires_at > ?2",
        params![session_id, now],
        |row| row.get::<_, String>(0),
    );

    let raw = match result {
        Ok(raw) => raw,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(parse_snapshot(&raw).or_else(|| {
        tracing::warn!(session = %session_id, "malformed session snapshot, starting fresh");
        None
    }))
}

/// Upserts the snapshot and pushes the expiry window forward. Callers
/// treat failures as a durability loss only and keep going.
pub fn save_snapshot(
    conn: &Connection,
    session_id: &str,
    snapshot: &SessionSnapshot,
    ttl_minutes: i64,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(snapshot)?;
    let now = Utc::now();
    let last_activity = now.format(TIME_FORMAT).to_string();
    let expires_at = (now + Duration::minutes(ttl_minutes))
        .format(TIME_FORMAT)
        .to_string();

    conn.execute(
        "INSERT INTO sessions (id, snapshot, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           snapshot = excluded.snapshot,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![session_id, raw, last_activity, expires_at],
    )?;
    Ok(())
}

pub fn clear_snapshot(conn: &Connection, session_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
    Ok(count > 0)
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().format(TIME_FORMAT).to_string();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}

/// Deserializes a persisted blob. Accepts the current format directly;
/// legacy blobs that stored rendered `html` instead of a structured
/// transcript load with an empty transcript. Anything else is malformed.
fn parse_snapshot(raw: &str) -> Option<SessionSnapshot> {
    if let Ok(snapshot) = serde_json::from_str::<SessionSnapshot>(raw) {
        return Some(snapshot);
    }

    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    if !value.get("html").is_some_and(|h| h.is_string()) {
        return None;
    }
    let state: ConversationState = serde_json::from_value(value.get("state")?.clone()).ok()?;

    Some(SessionSnapshot {
        state,
        transcript: vec![],
        status_text: string_field(&value, "statusText"),
        badge_class: string_field(&value, "badgeClass"),
        badge_text: string_field(&value, "badgeText"),
    })
}

fn string_field(value: &serde_json::Value, field: &str) -> String {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{MessageEntry, MessageOption, StatusBadge, Step};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn sample_snapshot() -> SessionSnapshot {
        let mut snap = SessionSnapshot::fresh();
        snap.state.step = Step::CriticalDecision;
        snap.state.critical = true;
        snap.state.user_data.description = Some("vou ao tribunal".to_string());
        snap.state.metrics.record_session_start();
        snap.transcript.push(MessageEntry::user("vou ao tribunal"));
        snap.transcript.push(
            MessageEntry::bot("Como deseja proceder?").with_options(vec![
                MessageOption::plain("human", "👤 Transferir"),
                MessageOption::plain("continue", "✅ Continuar"),
            ]),
        );
        snap.set_status("A analisar", StatusBadge::Pending);
        snap
    }

    #[test]
    fn round_trip_preserves_snapshot() {
        let conn = setup_db();
        let snap = sample_snapshot();

        save_snapshot(&conn, "s1", &snap, 30).unwrap();
        let loaded = get_snapshot(&conn, "s1").unwrap().unwrap();

        assert_eq!(loaded.state.step, Step::CriticalDecision);
        assert!(loaded.state.critical);
        assert_eq!(
            loaded.state.user_data.description.as_deref(),
            Some("vou ao tribunal")
        );
        assert_eq!(loaded.state.metrics.sessions_started, 1);
        assert_eq!(loaded.transcript, snap.transcript);
        assert_eq!(loaded.status_text, "A analisar");
        assert_eq!(loaded.badge_class, "status-badge pending");
    }

    #[test]
    fn missing_session_reads_as_none() {
        let conn = setup_db();
        assert!(get_snapshot(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn malformed_blob_reads_as_none() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO sessions (id, snapshot, last_activity, expires_at)
             VALUES ('s1', 'not json at all', '2026-01-01 00:00:00', '2999-01-01 00:00:00')",
            [],
        )
        .unwrap();

        assert!(get_snapshot(&conn, "s1").unwrap().is_none());
    }

    #[test]
    fn legacy_html_blob_loads_with_empty_transcript() {
        let conn = setup_db();
        let legacy = serde_json::json!({
            "state": { "step": "category" },
            "html": "<div class=\"message bot\">...</div>",
            "statusText": "Cliente validado (1234567)",
            "badgeClass": "status-badge pending",
            "badgeText": "Em Progresso"
        });
        conn.execute(
            "INSERT INTO sessions (id, snapshot, last_activity, expires_at)
             VALUES ('s1', ?1, '2026-01-01 00:00:00', '2999-01-01 00:00:00')",
            params![legacy.to_string()],
        )
        .unwrap();

        let loaded = get_snapshot(&conn, "s1").unwrap().unwrap();
        assert_eq!(loaded.state.step, Step::Category);
        assert!(loaded.transcript.is_empty());
        assert_eq!(loaded.status_text, "Cliente validado (1234567)");
    }

    #[test]
    fn expired_session_reads_as_none() {
        let conn = setup_db();
        let snap = sample_snapshot();
        save_snapshot(&conn, "s1", &snap, -1).unwrap();

        assert!(get_snapshot(&conn, "s1").unwrap().is_none());
        assert_eq!(expire_old_sessions(&conn).unwrap(), 1);
    }

    #[test]
    fn clear_removes_the_row() {
        let conn = setup_db();
        save_snapshot(&conn, "s1", &sample_snapshot(), 30).unwrap();

        assert!(clear_snapshot(&conn, "s1").unwrap());
        assert!(get_snapshot(&conn, "s1").unwrap().is_none());
        assert!(!clear_snapshot(&conn, "s1").unwrap());
    }

    #[test]
    fn save_is_last_write_wins() {
        let conn = setup_db();
        let mut snap = sample_snapshot();
        save_snapshot(&conn, "s1", &snap, 30).unwrap();

        snap.state.step = Step::Satisfaction;
        snap.state.protocol = Some("RCL-2026-123456".to_string());
        save_snapshot(&conn, "s1", &snap, 30).unwrap();

        let loaded = get_snapshot(&conn, "s1").unwrap().unwrap();
        assert_eq!(loaded.state.step, Step::Satisfaction);
        assert_eq!(loaded.state.protocol.as_deref(), Some("RCL-2026-123456"));
    }
}
