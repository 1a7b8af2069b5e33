use serde::{Deserialize, Serialize};

/// Display placeholders shown while a KPI has no data behind it yet.
const DEFAULT_CONTAINMENT: &str = "72%";
const DEFAULT_RESOLUTION_TIME: &str = "2.5min";
const DEFAULT_NPS: &str = "43";
const AVAILABILITY: &str = "24/7";

/// Counters accumulated from conversation events. Persisted inside the
/// session snapshot, so they survive a page reload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsState {
    #[serde(default)]
    pub sessions_started: u64,
    #[serde(default)]
    pub handled_by_bot: u64,
    #[serde(default)]
    pub transferred_to_human: u64,
    #[serde(default)]
    pub resolved_count: u64,
    #[serde(default)]
    pub total_resolution_time_ms: u64,
    #[serde(default)]
    pub nps_scores: Vec<u8>,
}

impl MetricsState {
    pub fn record_session_start(&mut self) {
        self.sessions_started += 1;
    }

    pub fn record_resolution(&mut self, duration_ms: u64) {
        self.handled_by_bot += 1;
        self.resolved_count += 1;
        self.total_resolution_time_ms += duration_ms;
    }

    pub fn record_transfer(&mut self) {
        self.transferred_to_human += 1;
    }

    pub fn record_satisfaction(&mut self, score: u8) {
        self.nps_scores.push(score.min(10));
    }

    /// Derives the display KPIs. Never stored; recomputed on demand.
    pub fn kpi_report(&self) -> KpiReport {
        let denom = self.handled_by_bot + self.transferred_to_human;
        let containment = if denom == 0 {
            DEFAULT_CONTAINMENT.to_string()
        } else {
            let rate = (self.handled_by_bot as f64 / denom as f64) * 100.0;
            format!("{}%", rate.round() as i64)
        };

        let resolution_time = if self.resolved_count == 0 {
            DEFAULT_RESOLUTION_TIME.to_string()
        } else {
            let avg_min =
                self.total_resolution_time_ms as f64 / (self.resolved_count as f64 * 60_000.0);
            format!("{avg_min:.1}min")
        };

        let nps = if self.nps_scores.is_empty() {
            DEFAULT_NPS.to_string()
        } else {
            let total = self.nps_scores.len() as f64;
            let promoters = self.nps_scores.iter().filter(|&&s| s >= 9).count() as f64;
            let detractors = self.nps_scores.iter().filter(|&&s| s <= 6).count() as f64;
            let nps = ((promoters - detractors) / total) * 100.0;
            format!("{}", nps.round() as i64)
        };

        KpiReport {
            containment,
            resolution_time,
            nps,
            availability: AVAILABILITY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KpiReport {
    pub containment: String,
    pub resolution_time: String,
    pub nps: String,
    pub availability: String,
}

/// Maps a satisfaction option id to its NPS score.
pub fn satisfaction_score(option_id: &str) -> Option<u8> {
    match option_id {
        "great" => Some(10),
        "good" => Some(8),
        "ok" => Some(6),
        "bad" => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_before_any_data() {
        let report = MetricsState::default().kpi_report();
        assert_eq!(report.containment, "72%");
        assert_eq!(report.resolution_time, "2.5min");
        assert_eq!(report.nps, "43");
        assert_eq!(report.availability, "24/7");
    }

    #[test]
    fn containment_after_one_resolution_one_transfer() {
        let mut m = MetricsState::default();
        m.record_resolution(120_000);
        m.record_transfer();
        assert_eq!(m.kpi_report().containment, "50%");
    }

    #[test]
    fn resolution_time_average_in_minutes() {
        let mut m = MetricsState::default();
        m.record_resolution(120_000);
        assert_eq!(m.kpi_report().resolution_time, "2.0min");
        m.record_resolution(240_000);
        assert_eq!(m.kpi_report().resolution_time, "3.0min");
    }

    #[test]
    fn nps_from_mixed_scores() {
        let mut m = MetricsState::default();
        for score in [10, 10, 3] {
            m.record_satisfaction(score);
        }
        // 2 promoters, 1 detractor out of 3 -> round(33.33) = 33
        assert_eq!(m.kpi_report().nps, "33");
    }

    #[test]
    fn score_of_eight_is_passive() {
        let mut m = MetricsState::default();
        m.record_satisfaction(8);
        assert_eq!(m.kpi_report().nps, "0");
    }

    #[test]
    fn satisfaction_mapping() {
        assert_eq!(satisfaction_score("great"), Some(10));
        assert_eq!(satisfaction_score("good"), Some(8));
        assert_eq!(satisfaction_score("ok"), Some(6));
        assert_eq!(satisfaction_score("bad"), Some(3));
        assert_eq!(satisfaction_score("meh"), None);
    }
}
