//! Browser bindings
//!
//! JS owns the animation loop and the canvas. Each frame it calls
//! [`WebGame::frame`] and then reads whatever it needs to draw through the
//! query methods. Score requests run on the browser's event loop and only
//! hand their results back into the shared state.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::highscores::{LeaderboardView, LocalBest, ScoreSubmission, rank_from_response};
use crate::physics::{PhysicsBody, PhysicsWorld};
use crate::platform;
use crate::sim::{GameEvent, Session, TickInput};
use crate::tuning::Tuning;

/// Called automatically when the module loads
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// What the renderer needs to draw one obstacle
#[derive(Serialize)]
struct ObstacleSprite {
    kind: &'static str,
    x: f32,
    y: f32,
    angle: f32,
    opacity: f32,
}

struct WebState {
    session: Session,
    input: TickInput,
    last_ms: Option<f64>,
    local_best: f32,
    leaderboard: LeaderboardView,
    last_rank: Option<usize>,
}

#[wasm_bindgen]
pub struct WebGame {
    state: Rc<RefCell<WebState>>,
    api_base: String,
}

#[wasm_bindgen]
impl WebGame {
    /// `seed` defaults to the current time; `api_base` is prefixed to the
    /// score service paths (empty for same origin)
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<f64>, api_base: Option<String>) -> WebGame {
        let seed = seed.map_or_else(platform::time_seed, |s| s as u64);
        let session = Session::simple(Tuning::default(), seed);
        let local_best = LocalBest::load();

        WebGame {
            state: Rc::new(RefCell::new(WebState {
                session,
                input: TickInput::default(),
                last_ms: None,
                local_best,
                leaderboard: LeaderboardView::default(),
                last_rank: None,
            })),
            api_base: api_base.unwrap_or_default(),
        }
    }

    /// Queue a tap for the next frame
    pub fn tap(&self) {
        self.state.borrow_mut().input.tap = true;
    }

    /// Queue a return to Idle for the next frame
    pub fn reset(&self) {
        self.state.borrow_mut().input.reset = true;
    }

    /// Run one frame at host time `now_ms`. Returns the frame's events as a
    /// JSON array.
    pub fn frame(&self, now_ms: f64) -> String {
        let mut st = self.state.borrow_mut();
        let dt = st
            .last_ms
            .map_or(0.0, |last| ((now_ms - last) / 1000.0).max(0.0) as f32);
        st.last_ms = Some(now_ms);

        let input = std::mem::take(&mut st.input);
        let events = st.session.frame(&input, dt, now_ms);

        for event in &events {
            if let GameEvent::RoundEnded { distance, .. } = event {
                if *distance > st.local_best {
                    st.local_best = *distance;
                    LocalBest::save(*distance);
                }
            }
        }

        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn state_name(&self) -> String {
        self.state.borrow().session.state().as_str().to_string()
    }

    pub fn instruction(&self) -> Option<String> {
        self.state
            .borrow()
            .session
            .state()
            .instruction()
            .map(str::to_string)
    }

    pub fn power_ratio(&self) -> f32 {
        self.state.borrow().session.round().power_ratio()
    }

    pub fn angle_ratio(&self) -> f32 {
        self.state.borrow().session.round().angle_ratio()
    }

    pub fn power(&self) -> f32 {
        self.state.borrow().session.round().power()
    }

    pub fn angle(&self) -> f32 {
        self.state.borrow().session.round().angle()
    }

    pub fn is_power_bonus(&self) -> bool {
        self.state.borrow().session.round().is_power_bonus()
    }

    pub fn multiplier(&self) -> f32 {
        self.state.borrow().session.round().total_multiplier()
    }

    pub fn sweet_spot_label(&self) -> Option<String> {
        self.state
            .borrow()
            .session
            .round()
            .sweet_spot()
            .map(|s| s.label.clone())
    }

    pub fn slap_progress(&self, now_ms: f64) -> f32 {
        self.state.borrow().session.round().slap_progress(now_ms)
    }

    pub fn slapper_x(&self, now_ms: f64) -> f32 {
        self.state.borrow().session.round().slapper_x(now_ms)
    }

    /// `[x, y, angle]`
    pub fn ragdoll_pose(&self) -> Vec<f32> {
        let (pos, angle) = self.state.borrow().session.ragdoll_pose();
        vec![pos.x, pos.y, angle]
    }

    /// Live obstacles as a JSON array of `{kind, x, y, angle, opacity}`
    pub fn obstacles(&self) -> String {
        let st = self.state.borrow();
        let world = st.session.world();
        let sprites: Vec<ObstacleSprite> = st
            .session
            .obstacles()
            .iter()
            .filter_map(|o| {
                let body = world.body(o.handle)?;
                let pos = body.position();
                Some(ObstacleSprite {
                    kind: o.kind.as_str(),
                    x: pos.x,
                    y: pos.y,
                    angle: body.angle(),
                    opacity: body.opacity(),
                })
            })
            .collect();
        serde_json::to_string(&sprites).unwrap_or_else(|_| "[]".to_string())
    }

    /// Camera transform in canvas `setTransform(a, b, c, d, e, f)` order
    pub fn camera_transform(&self) -> Vec<f32> {
        let t = self.state.borrow().session.camera().transform();
        vec![
            t.matrix2.x_axis.x,
            t.matrix2.x_axis.y,
            t.matrix2.y_axis.x,
            t.matrix2.y_axis.y,
            t.translation.x,
            t.translation.y,
        ]
    }

    pub fn distance(&self) -> f32 {
        self.state.borrow().session.round().last_distance()
    }

    /// Best of this session and anything stored on the device
    pub fn best_distance(&self) -> f32 {
        let st = self.state.borrow();
        st.session.round().best_distance().max(st.local_best)
    }

    /// Last fetched board as JSON; empty when unavailable
    pub fn leaderboard(&self) -> String {
        serde_json::to_string(&self.state.borrow().leaderboard.entries)
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Rank of the last submitted score, if it made the board
    pub fn last_rank(&self) -> Option<u32> {
        self.state.borrow().last_rank.map(|r| r as u32)
    }

    /// Fetch the board in the background
    pub fn refresh_leaderboard(&self) {
        let state = self.state.clone();
        let url = format!("{}/api/leaderboard", self.api_base);
        spawn_local(async move {
            let view = match fetch_text(&url, None).await {
                Ok(body) => LeaderboardView::from_response(&body),
                Err(e) => {
                    log::warn!("Failed to fetch leaderboard: {:?}", e);
                    LeaderboardView::default()
                }
            };
            state.borrow_mut().leaderboard = view;
        });
    }

    /// Submit the last round's distance under `name` in the background
    pub fn submit_score(&self, name: String) {
        let distance = self.state.borrow().session.round().last_distance();
        let body = match serde_json::to_string(&ScoreSubmission {
            name,
            distance: distance as f64,
        }) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Failed to encode score: {}", e);
                return;
            }
        };

        let state = self.state.clone();
        let url = format!("{}/api/score", self.api_base);
        spawn_local(async move {
            let rank = match fetch_text(&url, Some(body)).await {
                Ok(resp) => rank_from_response(&resp),
                Err(e) => {
                    log::warn!("Failed to submit score: {:?}", e);
                    None
                }
            };
            state.borrow_mut().last_rank = rank;
        });
    }
}

/// GET (or POST with a JSON body) and return the response text
async fn fetch_text(url: &str, json_body: Option<String>) -> Result<String, JsValue> {
    let opts = RequestInit::new();
    opts.set_mode(RequestMode::Cors);
    match &json_body {
        Some(body) => {
            opts.set_method("POST");
            opts.set_body(&JsValue::from_str(body));
        }
        None => opts.set_method("GET"),
    }

    let request = Request::new_with_str_and_init(url, &opts)?;
    if json_body.is_some() {
        request.headers().set("Content-Type", "application/json")?;
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    let text = JsFuture::from(resp.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}
