//! In-memory leaderboard service
//!
//! Keeps the top three distances until the process exits.
//!
//! - `GET /api/leaderboard`
//! - `POST /api/score` with `{name, distance}`
//! - `GET /api/status`
//!
//! Listens on `$PORT` (default 3000) with CORS open to any origin.

use std::sync::{Mutex, MutexGuard};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, middleware, web};
use chrono::{DateTime, SecondsFormat, Utc};

use slap_fly::highscores::{
    ErrorResponse, Leaderboard, LeaderboardResponse, MAX_LEADERBOARD, ScoreResponse,
    ScoreSubmission, StatusResponse,
};

const DEFAULT_PORT: u16 = 3000;

struct ServerState {
    leaderboard: Mutex<Leaderboard>,
    started: DateTime<Utc>,
}

impl ServerState {
    fn new(started: DateTime<Utc>) -> Self {
        Self {
            leaderboard: Mutex::new(Leaderboard::new()),
            started,
        }
    }

    fn board(&self) -> MutexGuard<'_, Leaderboard> {
        self.leaderboard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn started_iso(&self) -> String {
        iso(self.started)
    }
}

fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /api/leaderboard
async fn leaderboard(state: web::Data<ServerState>) -> impl Responder {
    let entries = state.board().entries().to_vec();
    HttpResponse::Ok().json(LeaderboardResponse {
        success: true,
        leaderboard: entries,
        server_start_time: state.started_iso(),
    })
}

/// POST /api/score
async fn submit_score(state: web::Data<ServerState>, body: web::Bytes) -> impl Responder {
    let raw = String::from_utf8_lossy(&body);
    let submission = match ScoreSubmission::from_json(&raw) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Rejected score: {:?}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::from(e));
        }
    };

    let mut board = state.board();
    let rank = board.submit(&submission, iso(Utc::now()));
    log::info!(
        "Score {} by {:?}: rank {:?}",
        submission.distance.floor(),
        submission.name,
        rank
    );

    HttpResponse::Ok().json(ScoreResponse {
        success: true,
        rank,
        leaderboard: board.entries().to_vec(),
    })
}

/// GET /api/status
async fn status(state: web::Data<ServerState>) -> impl Responder {
    let uptime = (Utc::now() - state.started).num_seconds();
    HttpResponse::Ok().json(StatusResponse {
        success: true,
        status: "running".to_string(),
        server_start_time: state.started_iso(),
        uptime,
        total_scores: state.board().len(),
    })
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/leaderboard", web::get().to(leaderboard))
        .route("/api/score", web::post().to(submit_score))
        .route("/api/status", web::get().to(status));
}

fn port_from_env() -> u16 {
    match std::env::var("PORT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid PORT {:?}, using {}", raw, DEFAULT_PORT);
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let state = web::Data::new(ServerState::new(Utc::now()));
    let port = port_from_env();

    log::info!("Slap & Fly score server running on port {}", port);
    log::info!("Leaderboard (top {}) is in-memory only, resets on restart", MAX_LEADERBOARD);
    log::info!("Server started at: {}", state.started_iso());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(86400);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
