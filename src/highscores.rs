//! Distance leaderboard
//!
//! The score service keeps the top three distances in memory. This module
//! holds that model, the JSON shapes exchanged with the service, and the
//! client-side view of a fetched board. The player's own best distance is
//! kept locally (LocalStorage on web) and never depends on the service.

use serde::{Deserialize, Serialize};

/// Entries kept on the board
pub const MAX_LEADERBOARD: usize = 3;
/// Longer names are cut
pub const MAX_NAME_LEN: usize = 20;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Whole pixels traveled
    pub distance: i64,
    /// RFC 3339 time the score was accepted
    pub timestamp: String,
}

/// Why a submission was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    /// Body was not a JSON object
    Malformed,
    /// Name absent, empty or not a string
    MissingName,
    /// Distance absent or not a number
    InvalidDistance,
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let detail = match self {
            ScoreError::Malformed => "body must be a JSON object",
            ScoreError::MissingName => "missing name",
            ScoreError::InvalidDistance => "distance is not a number",
        };
        write!(
            f,
            "Invalid data. Requires name (string) and distance (number): {}",
            detail
        )
    }
}

impl std::error::Error for ScoreError {}

/// A validated score submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSubmission {
    pub name: String,
    pub distance: f64,
}

impl ScoreSubmission {
    /// Validate a raw request body
    pub fn from_value(body: &serde_json::Value) -> Result<Self, ScoreError> {
        let object = body.as_object().ok_or(ScoreError::Malformed)?;

        let name = object
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or(ScoreError::MissingName)?;
        let distance = object
            .get("distance")
            .and_then(|v| v.as_f64())
            .ok_or(ScoreError::InvalidDistance)?;

        Ok(Self {
            name: name.chars().take(MAX_NAME_LEN).collect(),
            distance,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|_| ScoreError::Malformed)?;
        Self::from_value(&value)
    }
}

/// Top distances, sorted descending
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank (1-indexed) a distance would get, None if it would not make the
    /// board. Ties rank below existing entries.
    pub fn potential_rank(&self, distance: i64) -> Option<usize> {
        let pos = self
            .entries
            .iter()
            .position(|e| distance > e.distance)
            .unwrap_or(self.entries.len());
        (pos < MAX_LEADERBOARD).then_some(pos + 1)
    }

    /// Record a submission. Returns its rank, or None when it fell off the
    /// board.
    pub fn submit(&mut self, submission: &ScoreSubmission, timestamp: String) -> Option<usize> {
        let distance = submission.distance.floor() as i64;
        let rank = self.potential_rank(distance)?;

        self.entries.insert(
            rank - 1,
            LeaderboardEntry {
                name: submission.name.clone(),
                distance,
                timestamp,
            },
        );
        self.entries.truncate(MAX_LEADERBOARD);
        Some(rank)
    }

    pub fn top_distance(&self) -> Option<i64> {
        self.entries.first().map(|e| e.distance)
    }
}

/// `GET /api/leaderboard`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub success: bool,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub server_start_time: String,
}

/// `POST /api/score`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub rank: Option<usize>,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub status: String,
    pub server_start_time: String,
    /// Whole seconds since start
    pub uptime: i64,
    pub total_scores: usize,
}

/// Body of every rejected request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl From<ScoreError> for ErrorResponse {
    fn from(err: ScoreError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
        }
    }
}

/// What the client shows of the service's board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardView {
    pub entries: Vec<LeaderboardEntry>,
    /// Empty when the board could not be fetched
    pub server_start_time: String,
}

impl LeaderboardView {
    /// Parse a leaderboard response; anything unusable becomes an empty board
    pub fn from_response(json: &str) -> Self {
        match serde_json::from_str::<LeaderboardResponse>(json) {
            Ok(resp) if resp.success => Self {
                entries: resp.leaderboard,
                server_start_time: resp.server_start_time,
            },
            Ok(_) => {
                log::warn!("Leaderboard request was not successful");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to parse leaderboard: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rank from a score response; None when rejected, unranked or unreadable
pub fn rank_from_response(json: &str) -> Option<usize> {
    match serde_json::from_str::<ScoreResponse>(json) {
        Ok(resp) if resp.success => resp.rank,
        Ok(_) => None,
        Err(e) => {
            log::warn!("Failed to parse score response: {}", e);
            None
        }
    }
}

/// The player's own best distance, kept on the device
pub struct LocalBest;

impl LocalBest {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "slap_fly_best_distance";

    /// Load the stored best (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> f32 {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(raw)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(best) = raw.parse::<f32>() {
                    log::info!("Loaded best distance {:.0}", best);
                    return best;
                }
            }
        }

        log::info!("No best distance stored, starting fresh");
        0.0
    }

    /// Store a new best (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(best: f32) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            let _ = storage.set_item(Self::STORAGE_KEY, &best.to_string());
            log::info!("Best distance saved ({:.0})", best);
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> f32 {
        0.0
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(_best: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(name: &str, distance: f64) -> ScoreSubmission {
        ScoreSubmission {
            name: name.to_string(),
            distance,
        }
    }

    #[test]
    fn test_keeps_top_three_sorted() {
        let mut board = Leaderboard::new();
        assert_eq!(board.submit(&submission("a", 100.0), "t1".into()), Some(1));
        assert_eq!(board.submit(&submission("b", 300.0), "t2".into()), Some(1));
        assert_eq!(board.submit(&submission("c", 200.0), "t3".into()), Some(2));
        assert_eq!(board.submit(&submission("d", 50.0), "t4".into()), None);
        assert_eq!(board.submit(&submission("e", 250.0), "t5".into()), Some(2));

        let names: Vec<_> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "e", "c"]);
        assert_eq!(board.top_distance(), Some(300));
    }

    #[test]
    fn test_ties_rank_below_existing() {
        let mut board = Leaderboard::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            board.submit(&submission(name, 100.0), format!("t{}", i));
        }
        assert_eq!(board.submit(&submission("late", 100.0), "t9".into()), None);
        assert_eq!(board.len(), 3);
        assert!(board.entries().iter().all(|e| e.name != "late"));
    }

    #[test]
    fn test_distance_is_floored() {
        let mut board = Leaderboard::new();
        board.submit(&submission("a", 1234.99), "t".into());
        assert_eq!(board.entries()[0].distance, 1234);
    }

    #[test]
    fn test_submission_validation() {
        let ok = ScoreSubmission::from_value(&json!({"name": "Slapper", "distance": 812.5})).unwrap();
        assert_eq!(ok, submission("Slapper", 812.5));

        let long = ScoreSubmission::from_value(&json!({
            "name": "abcdefghijklmnopqrstuvwxyz",
            "distance": 1
        }))
        .unwrap();
        assert_eq!(long.name, "abcdefghijklmnopqrst");

        assert_eq!(
            ScoreSubmission::from_value(&json!({"distance": 5})),
            Err(ScoreError::MissingName)
        );
        assert_eq!(
            ScoreSubmission::from_value(&json!({"name": "", "distance": 5})),
            Err(ScoreError::MissingName)
        );
        assert_eq!(
            ScoreSubmission::from_value(&json!({"name": "x", "distance": "5"})),
            Err(ScoreError::InvalidDistance)
        );
        assert_eq!(
            ScoreSubmission::from_value(&json!([1, 2])),
            Err(ScoreError::Malformed)
        );
        assert_eq!(ScoreSubmission::from_json("{nope"), Err(ScoreError::Malformed));
    }

    #[test]
    fn test_error_body() {
        let body = ErrorResponse::from(ScoreError::InvalidDistance);
        assert!(!body.success);
        assert!(body.error.starts_with("Invalid data."));
    }

    #[test]
    fn test_response_field_names() {
        let resp = StatusResponse {
            success: true,
            status: "running".into(),
            server_start_time: "2026-01-01T00:00:00Z".into(),
            uptime: 12,
            total_scores: 2,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["serverStartTime"], "2026-01-01T00:00:00Z");
        assert_eq!(value["totalScores"], 2);

        let score = ScoreResponse {
            success: true,
            rank: None,
            leaderboard: Vec::new(),
        };
        assert_eq!(serde_json::to_value(&score).unwrap()["rank"], json!(null));
    }

    #[test]
    fn test_view_degrades_to_empty() {
        let good = r#"{"success":true,"leaderboard":[{"name":"a","distance":10,"timestamp":"t"}],"serverStartTime":"s"}"#;
        let view = LeaderboardView::from_response(good);
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.server_start_time, "s");

        assert!(LeaderboardView::from_response(r#"{"success":false}"#).is_empty());
        assert!(LeaderboardView::from_response("<html>").is_empty());
        assert!(LeaderboardView::from_response("").is_empty());
    }

    #[test]
    fn test_rank_from_response() {
        assert_eq!(
            rank_from_response(r#"{"success":true,"rank":2,"leaderboard":[]}"#),
            Some(2)
        );
        assert_eq!(
            rank_from_response(r#"{"success":true,"rank":null,"leaderboard":[]}"#),
            None
        );
        assert_eq!(
            rank_from_response(r#"{"success":false,"error":"x"}"#),
            None
        );
    }
}
