//! One attempt at a level: scene, palette, spawners and phase.

use glam::Vec2;
use rand::Rng;
use shelter_engine::{EngineContext, EntityId, InputEvent, TimerId, Timers};

use crate::error::SetupError;
use crate::hazards::{BeeSpawner, HailSpawner};
use crate::levels::{EnemyKind, LevelDescriptor};
use crate::outcome::{Outcome, Phase, Spawner, Tick, COUNTDOWN_SECONDS};
use crate::palette::Palette;
use crate::scene::build_scene;
use crate::signals::{Signal, COUNTDOWN_GO, COUNTDOWN_HIDE};

const COUNTDOWN_TICK_MS: f64 = 1000.0;
/// "GO" stays up this long.
const GO_DISPLAY_MS: f64 = 1000.0;

/// Timer payloads scheduled by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    Countdown,
    HideCountdown,
    HailTick,
    BeeTick,
    /// Remove a hazard whose lifetime ran out.
    Expire(EntityId),
    /// Level duration for levels without a working spawner.
    Survival,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
}

pub struct Session {
    level: LevelDescriptor,
    player: EntityId,
    epoch: u32,
    countdown: Option<TimerId>,
    outcome: Outcome,
    palette: Palette,
    hail: Option<HailSpawner>,
    bees: Option<BeeSpawner>,
}

impl Session {
    /// Build the level into `ctx` and start the countdown.
    ///
    /// The session is always created. An empty shape budget comes back
    /// alongside it as a warning for the host.
    pub fn begin(
        level: LevelDescriptor,
        ctx: &mut EngineContext,
        timers: &mut Timers<SessionTimer>,
    ) -> (Self, Option<SetupError>) {
        let player = build_scene(ctx, level.id);
        let palette = Palette::from_budget(&level.shapes);
        let warning = palette
            .is_empty()
            .then_some(SetupError::EmptyShapeBudget(level.id));

        let hail = level
            .enemies
            .contains(EnemyKind::Hail)
            .then(HailSpawner::default);
        let bees = level
            .enemies
            .contains(EnemyKind::Bees)
            .then(|| BeeSpawner::new(level.duration_ms));

        Signal::PaletteReset {
            entries: palette.len(),
        }
        .emit(ctx);
        Signal::Countdown(COUNTDOWN_SECONDS as i32).emit(ctx);
        let countdown = timers.schedule_interval(COUNTDOWN_TICK_MS, SessionTimer::Countdown);

        let session = Self {
            outcome: Outcome::new(level.enemies),
            level,
            player,
            epoch: timers.epoch(),
            countdown: Some(countdown),
            palette,
            hail,
            bees,
        };
        (session, warning)
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Timer epoch this session was started under.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn phase(&self) -> Phase {
        self.outcome.phase()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Cloud position while hail is falling.
    pub fn cloud_x(&self) -> Option<f32> {
        self.hail.as_ref().and_then(HailSpawner::cloud_x)
    }

    /// Pointer and palette input. Placement only counts before the verdict.
    pub fn handle_input(&mut self, event: &InputEvent, ctx: &mut EngineContext) {
        match *event {
            InputEvent::PaletteGrab { index } => {
                if self.outcome.accepts_placement() {
                    self.palette.begin_drag(index as usize);
                }
            }
            InputEvent::PointerMove { x, y } | InputEvent::PointerDown { x, y } => {
                self.palette.pointer_moved(Vec2::new(x, y));
            }
            InputEvent::PointerUp { x, y } => {
                self.palette.pointer_moved(Vec2::new(x, y));
                if !self.outcome.accepts_placement() {
                    self.palette.cancel_drag();
                } else if let Some((index, _)) = self.palette.commit_drag(ctx) {
                    Signal::PaletteUsed { index }.emit(ctx);
                }
            }
            InputEvent::Custom { .. } => {}
        }
    }

    /// React to one of this session's timers.
    pub fn handle_timer(
        &mut self,
        timer: SessionTimer,
        ctx: &mut EngineContext,
        timers: &mut Timers<SessionTimer>,
        rng: &mut impl Rng,
    ) -> Option<Verdict> {
        match timer {
            SessionTimer::Countdown => {
                self.countdown(ctx, timers);
                None
            }
            SessionTimer::HideCountdown => {
                Signal::Countdown(COUNTDOWN_HIDE).emit(ctx);
                None
            }
            SessionTimer::HailTick => {
                let passed = self
                    .hail
                    .as_mut()
                    .is_some_and(|hail| hail.tick(ctx, timers, rng));
                self.finish_spawner(passed, Spawner::Hail)
            }
            SessionTimer::BeeTick => {
                let player = self.player;
                let done = self
                    .bees
                    .as_mut()
                    .is_some_and(|bees| bees.tick(ctx, timers, rng, player));
                self.finish_spawner(done, Spawner::Bees)
            }
            SessionTimer::Expire(id) => {
                if ctx.despawn(id) {
                    log::debug!("hazard {:?} expired", id);
                }
                if let Some(bees) = self.bees.as_mut() {
                    bees.forget(id);
                }
                None
            }
            SessionTimer::Survival => self.finish_spawner(true, Spawner::Survival),
        }
    }

    fn countdown(&mut self, ctx: &mut EngineContext, timers: &mut Timers<SessionTimer>) {
        match self.outcome.countdown_tick() {
            Tick::Show(n) => Signal::Countdown(n as i32).emit(ctx),
            Tick::Go => {
                Signal::Countdown(COUNTDOWN_GO).emit(ctx);
                if let Some(id) = self.countdown.take() {
                    timers.cancel(id);
                }
                timers.schedule_timeout(GO_DISPLAY_MS, SessionTimer::HideCountdown);
                self.release_hazards(timers);
            }
            Tick::Ignored => {}
        }
    }

    fn release_hazards(&mut self, timers: &mut Timers<SessionTimer>) {
        for kind in self.level.enemies.unimplemented() {
            log::warn!(
                "level {} lists {} hazards, which are not implemented",
                self.level.id,
                kind.token()
            );
        }
        if let Some(hail) = self.hail.as_mut() {
            hail.start(timers);
        }
        if let Some(bees) = self.bees.as_mut() {
            bees.start(timers);
        }
        if self.outcome.pending().contains(Spawner::Survival) {
            timers.schedule_timeout(self.level.duration_ms as f64, SessionTimer::Survival);
        }
        log::info!("level {} hazards released", self.level.id);
    }

    fn finish_spawner(&mut self, finished: bool, spawner: Spawner) -> Option<Verdict> {
        (finished && self.outcome.spawner_finished(spawner)).then_some(Verdict::Won)
    }

    /// Per-step forces on live hazards.
    pub fn steer(&mut self, ctx: &mut EngineContext, rng: &mut impl Rng) {
        if let Some(bees) = self.bees.as_mut() {
            bees.steer(ctx, rng);
        }
    }

    /// Look for a hazard touching the player in the last physics step.
    pub fn check_collisions(&mut self, ctx: &EngineContext) -> Option<Verdict> {
        let hit = ctx
            .collisions()
            .iter()
            .filter(|pair| pair.started)
            .filter_map(|pair| pair.other(self.player))
            .any(|other| ctx.scene.kind_of(other).is_some_and(|k| k.is_hazard()));
        (hit && self.outcome.hazard_hit()).then_some(Verdict::Lost)
    }

    /// Stop the countdown and spawners so nothing else is scheduled.
    pub fn stop(&mut self, timers: &mut Timers<SessionTimer>) {
        if let Some(id) = self.countdown.take() {
            timers.cancel(id);
        }
        if let Some(hail) = self.hail.as_mut() {
            hail.stop(timers);
        }
        if let Some(bees) = self.bees.as_mut() {
            bees.stop(timers);
        }
    }
}
