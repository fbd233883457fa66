//! Per-frame session loop
//!
//! [`Session`] owns every gameplay component and runs them in a fixed order
//! each frame: input, round timers, launch, physics substeps, contact boosts,
//! distance and end checks, lane upkeep, camera. Rendering reads the session
//! afterwards through its accessors.

use glam::Vec2;

use super::collision::CollisionResolver;
use super::field::ObstacleField;
use super::obstacle::Obstacle;
use super::ragdoll::Ragdoll;
use super::round::RoundMachine;
use super::state::{GameEvent, RoundState};
use crate::camera::CameraController;
use crate::physics::{BodyDesc, BodyHandle, BodyLabel, PhysicsWorld, Shape, SimpleWorld};
use crate::tuning::Tuning;

/// Host input for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Tap/click/space
    pub tap: bool,
    /// Abandon the round and go back to Idle
    pub reset: bool,
}

/// Lane seed for a given round, mixed from the session seed
pub fn round_seed(session_seed: u64, round: u32) -> u64 {
    (round as u64)
        .wrapping_mul(2654435761)
        .wrapping_add(session_seed)
}

pub struct Session<W: PhysicsWorld = SimpleWorld> {
    tuning: Tuning,
    world: W,
    ground: BodyHandle,
    round: RoundMachine,
    ragdoll: Ragdoll,
    field: ObstacleField,
    resolver: CollisionResolver,
    camera: CameraController,
    seed: u64,
    round_index: u32,
    /// Launch force already handed out this round
    force_applied: bool,
    accumulator_ms: f32,
}

impl Session<SimpleWorld> {
    /// Session on the bundled physics backend
    pub fn simple(tuning: Tuning, seed: u64) -> Self {
        let world = SimpleWorld::new(tuning.world.gravity, tuning.world.gravity_scale);
        Self::new(tuning, world, seed)
    }
}

impl<W: PhysicsWorld> Session<W> {
    pub fn new(tuning: Tuning, mut world: W, seed: u64) -> Self {
        world.set_gravity(tuning.world.gravity);

        let ground = world.add_body(ground_desc(&tuning));
        let ragdoll = Ragdoll::spawn(&mut world, tuning.ragdoll.clone(), tuning.ragdoll_start());
        let mut field = ObstacleField::new(
            tuning.world.clone(),
            tuning.ragdoll.start_x,
            tuning.viewport.ground_y(),
            round_seed(seed, 0),
        );
        field.reset(&mut world, round_seed(seed, 0));

        log::info!("Session initialized with seed: {}", seed);

        Self {
            round: RoundMachine::new(tuning.shot.clone(), &tuning.ragdoll),
            resolver: CollisionResolver::new(tuning.world.ghost_opacity),
            camera: CameraController::new(tuning.camera.clone(), tuning.viewport),
            tuning,
            world,
            ground,
            ragdoll,
            field,
            seed,
            round_index: 0,
            force_applied: false,
            accumulator_ms: 0.0,
        }
    }

    /// Run one frame of `dt` seconds ending at host time `now_ms`
    pub fn frame(&mut self, input: &TickInput, dt: f32, now_ms: f64) -> Vec<GameEvent> {
        let dt = dt.clamp(0.0, self.tuning.frame_loop.max_frame_dt);
        let mut events = Vec::new();

        if input.reset {
            self.abandon_round();
        }
        if input.tap {
            self.tap(now_ms, &mut events);
        }

        self.round.update(dt, now_ms);
        self.launch_if_due(now_ms, &mut events);
        self.step_physics(dt, &mut events);

        let position = self.ragdoll.position(&self.world);
        let speed = self.ragdoll.speed(&self.world);

        if self.round.state() == RoundState::Flying {
            self.round.update_distance(position.x);
            let previous_best = self.round.best_distance();
            if self.round.check_end_condition(speed, dt) {
                let distance = self.round.last_distance();
                let best = self.round.best_distance();
                log::info!(
                    "Round {} ended: {:.0} (best {:.0})",
                    self.round_index,
                    distance,
                    best
                );
                events.push(GameEvent::RoundEnded {
                    distance,
                    best,
                    new_best: best > previous_best,
                });
            }
        }

        self.field.ensure_generated_ahead(&mut self.world, position.x);
        self.field.cleanup(&mut self.world, position.x);

        self.camera.follow(position, speed);
        self.camera.update();

        events
    }

    fn tap(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        let from = self.round.state();
        if !self.round.handle_tap(now_ms) {
            return;
        }

        match from {
            RoundState::Idle | RoundState::End => {
                self.begin_round();
                events.push(GameEvent::RoundStarted {
                    round: self.round_index,
                });
            }
            RoundState::PowerSelect => events.push(GameEvent::PowerLocked {
                power: self.round.power(),
                bonus: self.round.is_power_bonus(),
            }),
            RoundState::AngleSelect => events.push(GameEvent::AngleLocked {
                angle: self.round.angle(),
                sweet_spot: self.round.sweet_spot().map(|s| s.label.clone()),
                multiplier: self.round.total_multiplier(),
            }),
            RoundState::SlapAnimation | RoundState::Flying => {}
        }
    }

    /// Fresh lane, body back on its mark, camera home
    fn begin_round(&mut self) {
        self.round_index += 1;
        self.ragdoll.reset(&mut self.world);
        self.field
            .reset(&mut self.world, round_seed(self.seed, self.round_index));
        self.camera.reset();
        self.force_applied = false;
        self.accumulator_ms = 0.0;
        log::info!("Round {} started", self.round_index);
    }

    fn abandon_round(&mut self) {
        self.round.reset();
        self.ragdoll.reset(&mut self.world);
        self.camera.reset();
        self.force_applied = false;
        self.accumulator_ms = 0.0;
    }

    fn launch_if_due(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        if self.force_applied {
            return;
        }
        // A frame gap can straddle the impact window; the slap still lands
        // when the flight begins
        let due = self.round.should_apply_force(now_ms) || self.round.state() == RoundState::Flying;
        if !due {
            return;
        }

        let force = self.round.force_vector();
        let multiplier = self.round.total_multiplier();
        self.force_applied = true;
        if self.ragdoll.launch(&mut self.world, force) {
            log::info!(
                "Launch force ({:.3}, {:.3}) x{}",
                force.x,
                force.y,
                multiplier
            );
            events.push(GameEvent::Launched { force, multiplier });
        }
    }

    fn step_physics(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let step_ms = self.tuning.frame_loop.physics_step_ms;
        self.accumulator_ms += dt * 1000.0;

        let mut substeps = 0;
        while self.accumulator_ms >= step_ms && substeps < self.tuning.frame_loop.max_substeps {
            self.world.step(step_ms);
            self.accumulator_ms -= step_ms;
            substeps += 1;

            let pairs = self.world.drain_collision_starts();
            if self.round.state() != RoundState::Flying || pairs.is_empty() {
                continue;
            }

            let tracked = self.ragdoll.handle();
            let boosts = self
                .resolver
                .resolve_pairs(&mut self.world, tracked, &pairs, &mut self.field);
            for boost in boosts {
                self.ragdoll.boost_spin(&mut self.world, boost.force);
                events.push(GameEvent::Boosted { kind: boost.kind });
            }
        }
    }

    pub fn state(&self) -> RoundState {
        self.round.state()
    }

    pub fn round(&self) -> &RoundMachine {
        &self.round
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn ground(&self) -> BodyHandle {
        self.ground
    }

    pub fn ragdoll(&self) -> &Ragdoll {
        &self.ragdoll
    }

    /// Ragdoll position and angle
    pub fn ragdoll_pose(&self) -> (Vec2, f32) {
        (
            self.ragdoll.position(&self.world),
            self.ragdoll.angle(&self.world),
        )
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.field.obstacles()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn force_applied(&self) -> bool {
        self.force_applied
    }
}

/// A slab wide enough to cover the whole lane with room on both sides
fn ground_desc(tuning: &Tuning) -> BodyDesc {
    let lane = tuning.ragdoll.start_x + tuning.world.max_distance + tuning.world.lookahead;
    let width = lane + 2.0 * tuning.world.cleanup_distance;
    let height = tuning.viewport.ground_height;
    let center = Vec2::new(
        lane * 0.5,
        tuning.viewport.ground_y() + height * 0.5,
    );

    BodyDesc::new(BodyLabel::Ground, center, Shape::Rect { width, height })
        .with_static(true)
        .with_restitution(tuning.world.ground_restitution)
        .with_friction(tuning.world.ground_friction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsBody;

    const FRAME: f32 = 1.0 / 60.0;

    /// Drives a session frame by frame with a host clock
    struct Driver {
        session: Session,
        now_ms: f64,
        events: Vec<GameEvent>,
    }

    impl Driver {
        fn new(seed: u64) -> Self {
            Self {
                session: Session::simple(Tuning::default(), seed),
                now_ms: 0.0,
                events: Vec::new(),
            }
        }

        fn frame(&mut self, tap: bool) {
            self.now_ms += (FRAME * 1000.0) as f64;
            let input = TickInput { tap, reset: false };
            let events = self.session.frame(&input, FRAME, self.now_ms);
            self.events.extend(events);
        }

        fn run_for(&mut self, frames: usize) {
            for _ in 0..frames {
                self.frame(false);
            }
        }

        /// Tap through the meters with the given frame gaps, then fly until
        /// the round ends
        fn play_round(&mut self, power_frames: usize, angle_frames: usize) {
            self.frame(true);
            self.run_for(power_frames);
            self.frame(true);
            self.run_for(angle_frames);
            self.frame(true);
            for _ in 0..60 * 120 {
                if self.session.state() == RoundState::End {
                    return;
                }
                self.frame(false);
            }
        }
    }

    #[test]
    fn test_round_seed_differs_per_round() {
        assert_eq!(round_seed(7, 0), 7);
        assert_ne!(round_seed(7, 1), round_seed(7, 2));
    }

    #[test]
    fn test_new_session_is_idle_with_lane() {
        let driver = Driver::new(1);
        let s = &driver.session;
        assert_eq!(s.state(), RoundState::Idle);
        assert!(!s.obstacles().is_empty());
        assert_eq!(s.field().generated_up_to(), 5500.0);
        assert!(s.world().body(s.ground()).is_some());
        assert_eq!(s.ragdoll_pose().0, Vec2::new(500.0, 520.0));
    }

    #[test]
    fn test_idle_frames_keep_ragdoll_on_mark() {
        let mut driver = Driver::new(1);
        driver.run_for(120);
        assert_eq!(driver.session.ragdoll_pose().0, Vec2::new(500.0, 520.0));
        assert!(driver.events.is_empty());
    }

    #[test]
    fn test_full_round_reaches_end() {
        let mut driver = Driver::new(2024);
        driver.play_round(40, 25);

        let s = &driver.session;
        assert_eq!(s.state(), RoundState::End);
        assert!(s.force_applied());
        assert!(s.round().last_distance() > 0.0);
        assert_eq!(s.round().best_distance(), s.round().last_distance());

        let launches = driver
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Launched { .. }))
            .count();
        assert_eq!(launches, 1);
        assert!(matches!(driver.events[0], GameEvent::RoundStarted { round: 1 }));
        assert!(matches!(
            driver.events.last(),
            Some(GameEvent::RoundEnded { new_best: true, .. })
        ));
    }

    #[test]
    fn test_events_follow_round_order() {
        let mut driver = Driver::new(5);
        driver.play_round(30, 30);

        let order: Vec<&str> = driver
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::RoundStarted { .. } => Some("start"),
                GameEvent::PowerLocked { .. } => Some("power"),
                GameEvent::AngleLocked { .. } => Some("angle"),
                GameEvent::Launched { .. } => Some("launch"),
                GameEvent::RoundEnded { .. } => Some("end"),
                GameEvent::Boosted { .. } => None,
            })
            .collect();
        assert_eq!(order, ["start", "power", "angle", "launch", "end"]);
    }

    #[test]
    fn test_launch_lands_inside_impact_window() {
        let mut driver = Driver::new(9);
        driver.frame(true);
        driver.run_for(20);
        driver.frame(true);
        driver.run_for(20);
        driver.frame(true);
        let slap_at = driver.now_ms;

        while !driver.session.force_applied() {
            driver.frame(false);
        }
        let elapsed = driver.now_ms - slap_at;
        assert!((650.0..700.0).contains(&elapsed), "launched at {}", elapsed);
        assert_eq!(driver.session.state(), RoundState::SlapAnimation);
    }

    #[test]
    fn test_skipped_impact_window_still_launches() {
        let mut session = Session::simple(Tuning::default(), 3);
        let tap = TickInput {
            tap: true,
            reset: false,
        };
        session.frame(&tap, FRAME, 0.0);
        session.frame(&tap, FRAME, 500.0);
        session.frame(&tap, FRAME, 1000.0);
        assert_eq!(session.state(), RoundState::SlapAnimation);

        // Host stalls from 1640 ms straight to 1900 ms
        session.frame(&TickInput::default(), FRAME, 1640.0);
        assert!(!session.force_applied());
        let events = session.frame(&TickInput::default(), FRAME, 1900.0);
        assert_eq!(session.state(), RoundState::Flying);
        assert!(session.force_applied());
        assert!(events.iter().any(|e| matches!(e, GameEvent::Launched { .. })));
    }

    #[test]
    fn test_second_round_resets_ragdoll_and_lane() {
        let mut driver = Driver::new(77);
        driver.play_round(40, 25);
        let first_seed = driver.session.field().seed();
        let best = driver.session.round().best_distance();

        driver.frame(true);
        let s = &driver.session;
        assert_eq!(s.state(), RoundState::PowerSelect);
        assert_eq!(s.round_index(), 2);
        assert_ne!(s.field().seed(), first_seed);
        assert!(!s.force_applied());
        assert_eq!(s.round().best_distance(), best);
        assert_eq!(s.round().last_distance(), 0.0);

        let body = s.world().body(s.ragdoll().handle()).unwrap();
        assert!(body.is_static());
        assert_eq!(body.position(), s.ragdoll().start());
        // Re-homed, then one follow step toward the ragdoll
        assert!((0.0..10.0).contains(&s.camera().x()), "camera x {}", s.camera().x());
    }

    #[test]
    fn test_reset_input_returns_to_idle() {
        let mut driver = Driver::new(4);
        driver.frame(true);
        driver.run_for(10);
        assert_eq!(driver.session.state(), RoundState::PowerSelect);

        let input = TickInput {
            tap: false,
            reset: true,
        };
        driver.session.frame(&input, FRAME, driver.now_ms + 16.0);
        assert_eq!(driver.session.state(), RoundState::Idle);
    }

    #[test]
    fn test_same_seed_same_round() {
        let mut a = Driver::new(99_999);
        let mut b = Driver::new(99_999);
        a.play_round(35, 22);
        b.play_round(35, 22);

        assert_eq!(a.events, b.events);
        assert_eq!(a.session.round().last_distance(), b.session.round().last_distance());
        assert_eq!(a.session.ragdoll_pose(), b.session.ragdoll_pose());
    }

    #[test]
    fn test_huge_frame_dt_is_clamped() {
        let mut session = Session::simple(Tuning::default(), 8);
        session.frame(&TickInput::default(), 30.0, 30_000.0);
        // Clamped to 0.1 s worth of physics steps
        assert_eq!(session.field().generated_up_to(), 5500.0);
        assert_eq!(session.state(), RoundState::Idle);
    }
}
