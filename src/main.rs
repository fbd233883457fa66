//! Slap & Fly entry point
//!
//! In the browser the library's `web` module is the entry point and JS drives
//! the frame loop. Natively this runs a headless autoplayer on the bundled
//! physics backend and logs how each round went.
//!
//! Usage: `slap-fly [rounds] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;

    use anyhow::{Context, Result};

    use slap_fly::platform;
    use slap_fly::sim::{GameEvent, RoundState, Session, TickInput};
    use slap_fly::tuning::Tuning;

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up on a round that has not settled after this long
    const MAX_ROUND_FRAMES: u32 = 60 * 180;

    /// Locks the power meter near the top and the angle meter near the
    /// middle. Starting rounds is left to the caller.
    struct AutoPlayer {
        power_target: f32,
        angle_target: f32,
        tolerance: f32,
    }

    impl AutoPlayer {
        fn wants_tap(&self, session: &Session) -> bool {
            let round = session.round();
            match session.state() {
                RoundState::PowerSelect => round.power_ratio() >= self.power_target,
                RoundState::AngleSelect => {
                    (round.angle_ratio() - self.angle_target).abs() <= self.tolerance
                }
                RoundState::Idle
                | RoundState::End
                | RoundState::SlapAnimation
                | RoundState::Flying => false,
            }
        }
    }

    pub fn run() -> Result<()> {
        let mut args = std::env::args().skip(1);
        let rounds: u32 = match args.next() {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid round count: {}", raw))?,
            None => 3,
        };
        let tuning = match args.next() {
            Some(path) => Tuning::load(Path::new(&path))?,
            None => {
                log::warn!("No tuning file given, using defaults");
                Tuning::default()
            }
        };

        let seed = platform::time_seed();
        let mut session = Session::simple(tuning, seed);
        let player = AutoPlayer {
            power_target: 0.93,
            angle_target: 0.5,
            tolerance: 0.02,
        };

        let started = platform::now_ms();
        let mut now_ms = 0.0f64;
        let mut played = 0;

        while played < rounds {
            // Leave End (or Idle) for a fresh round
            let input = TickInput {
                tap: true,
                reset: false,
            };
            now_ms += (FRAME_DT * 1000.0) as f64;
            report(&session.frame(&input, FRAME_DT, now_ms));

            let mut frames = 0;
            while session.state() != RoundState::End && frames < MAX_ROUND_FRAMES {
                let input = TickInput {
                    tap: player.wants_tap(&session),
                    reset: false,
                };
                now_ms += (FRAME_DT * 1000.0) as f64;
                report(&session.frame(&input, FRAME_DT, now_ms));
                frames += 1;
            }

            if session.state() != RoundState::End {
                log::warn!("Round {} did not settle, abandoning", session.round_index());
                session.frame(
                    &TickInput {
                        tap: false,
                        reset: true,
                    },
                    FRAME_DT,
                    now_ms,
                );
            }
            played += 1;
        }

        log::info!(
            "Played {} rounds in {:.0} ms, best distance {:.0}",
            played,
            platform::now_ms() - started,
            session.round().best_distance()
        );
        Ok(())
    }

    fn report(events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Boosted { kind } => log::debug!("Boost from {}", kind.as_str()),
                GameEvent::RoundEnded {
                    distance,
                    best,
                    new_best,
                } => {
                    let marker = if *new_best { " (new best)" } else { "" };
                    log::info!("Distance {:.0}, best {:.0}{}", distance, best, marker);
                }
                other => log::debug!("{:?}", other),
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Slap & Fly (headless) starting...");
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is slap_fly::web::start, this is just to satisfy the compiler
}
