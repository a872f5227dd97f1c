use rand::SeedableRng;
use rand_pcg::Pcg32;
use shelter_engine::{
    EngineContext, Game, GameConfig, InputEvent, InputQueue, RenderContext, Timers,
};

use crate::error::SetupError;
use crate::levels::LevelCatalog;
use crate::outcome::Phase;
use crate::render::draw_session;
use crate::session::{Session, SessionTimer, Verdict};
use crate::signals::{custom, Signal, COUNTDOWN_HIDE};
use crate::unlock::{default_store, UnlockStore, FIRST_LEVEL};

/// Protect the Egg: level selection, unlock progress and the live session.
pub struct EggGame {
    config: GameConfig,
    catalog: LevelCatalog,
    store: Box<dyn UnlockStore>,
    highest: u32,
    session: Option<Session>,
    last_level: Option<u32>,
    timers: Timers<SessionTimer>,
    rng: Pcg32,
}

impl EggGame {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Deterministic hazards for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_store(seed, default_store())
    }

    pub fn with_store(seed: u64, store: Box<dyn UnlockStore>) -> Self {
        let catalog = LevelCatalog::load().unwrap_or_else(|e| {
            log::error!("level catalog unavailable: {:#}", e);
            LevelCatalog::default()
        });
        let max_id = catalog.levels().map(|l| l.id).max().unwrap_or(FIRST_LEVEL);
        let highest = store.get().clamp(FIRST_LEVEL, max_id);
        Self {
            config: GameConfig::default(),
            catalog,
            store,
            highest,
            session: None,
            last_level: None,
            timers: Timers::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn highest_unlocked(&self) -> u32 {
        self.highest
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Tear down whatever is running and start level `id`.
    ///
    /// An unknown id leaves the current state untouched. An empty shape
    /// budget is reported but the level still starts.
    pub fn start_level(&mut self, ctx: &mut EngineContext, id: u32) -> Result<(), SetupError> {
        let Some(level) = self.catalog.find(id).cloned() else {
            return Err(self.report(ctx, SetupError::UnknownLevel(id)));
        };

        self.teardown(ctx);
        ctx.resume_physics();

        log::info!("starting level {}: {} ({})", level.id, level.name, level.enemies);
        Signal::ShowPlay { level: level.id }.emit(ctx);
        let (session, warning) = Session::begin(level, ctx, &mut self.timers);
        self.session = Some(session);
        self.last_level = Some(id);

        match warning {
            Some(err) => Err(self.report(ctx, err)),
            None => Ok(()),
        }
    }

    /// Start the current (or last played) level again.
    pub fn restart(&mut self, ctx: &mut EngineContext) -> Result<(), SetupError> {
        let current = self.session.as_ref().map(|s| s.level().id);
        match current.or(self.last_level) {
            Some(id) => self.start_level(ctx, id),
            None => {
                log::warn!("restart requested before any level was played");
                Ok(())
            }
        }
    }

    pub fn return_to_menu(&mut self, ctx: &mut EngineContext) {
        self.teardown(ctx);
        Signal::ShowMenu.emit(ctx);
    }

    fn report(&self, ctx: &mut EngineContext, err: SetupError) -> SetupError {
        log::error!("level setup: {}", err);
        Signal::SetupError {
            code: err.code(),
            level: err.level_id(),
        }
        .emit(ctx);
        err
    }

    /// Cancel every timer, invalidate late callbacks and clear the world.
    fn teardown(&mut self, ctx: &mut EngineContext) {
        if let Some(mut session) = self.session.take() {
            session.stop(&mut self.timers);
            Signal::Countdown(COUNTDOWN_HIDE).emit(ctx);
            log::info!("level {} ended in {:?}", session.level().id, session.phase());
        }
        self.timers.cancel_all();
        self.timers.set_epoch(self.timers.epoch().wrapping_add(1));
        ctx.pause_physics();
        ctx.reset_world();
    }

    fn conclude(&mut self, ctx: &mut EngineContext, verdict: Verdict) {
        let Some(level_id) = self.session.as_ref().map(|s| s.level().id) else {
            return;
        };
        let won = verdict == Verdict::Won;
        log::info!("level {} {}", level_id, if won { "won" } else { "lost" });
        Signal::Outcome { won }.emit(ctx);
        if won {
            self.advance_unlock(ctx, level_id);
        }
        self.return_to_menu(ctx);
    }

    fn advance_unlock(&mut self, ctx: &mut EngineContext, won_level: u32) {
        let max_id = self.catalog.levels().map(|l| l.id).max().unwrap_or(FIRST_LEVEL);
        if won_level != self.highest || self.highest >= max_id {
            return;
        }
        self.highest += 1;
        self.store.set(self.highest);
        Signal::UnlockChanged {
            highest: self.highest,
        }
        .emit(ctx);
    }

    fn handle_custom(&mut self, ctx: &mut EngineContext, kind: u32, a: f32) {
        // Errors are already logged and signalled.
        let _ = match kind {
            custom::START_LEVEL => self.start_level(ctx, a as u32),
            custom::RESTART => self.restart(ctx),
            custom::MENU => {
                self.return_to_menu(ctx);
                Ok(())
            }
            other => {
                log::debug!("ignoring custom event {}", other);
                Ok(())
            }
        };
    }
}

impl Default for EggGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for EggGame {
    fn config(&self) -> GameConfig {
        self.config.clone()
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        ctx.pause_physics();
        log::info!(
            "{} levels loaded, highest unlocked {}",
            self.catalog.len(),
            self.highest
        );
        Signal::ShowMenu.emit(ctx);
        Signal::UnlockChanged {
            highest: self.highest,
        }
        .emit(ctx);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        for event in input.iter() {
            match *event {
                InputEvent::Custom { kind, a, .. } => self.handle_custom(ctx, kind, a),
                _ => {
                    if let Some(session) = self.session.as_mut() {
                        session.handle_input(event, ctx);
                    }
                }
            }
        }

        let elapsed_ms = f64::from(ctx.physics.dt()) * 1000.0;
        for fired in self.timers.advance(elapsed_ms) {
            let Some(session) = self.session.as_mut() else {
                break;
            };
            // Scheduled by a session that has since been torn down.
            if fired.epoch != session.epoch() {
                continue;
            }
            let verdict = session.handle_timer(fired.payload, ctx, &mut self.timers, &mut self.rng);
            if let Some(verdict) = verdict {
                self.conclude(ctx, verdict);
            }
        }

        if let Some(session) = self.session.as_mut() {
            if session.phase() == Phase::Active {
                session.steer(ctx, &mut self.rng);
            }
        }
    }

    fn post_step(&mut self, ctx: &mut EngineContext) {
        let verdict = self
            .session
            .as_mut()
            .and_then(|session| session.check_collisions(ctx));
        if let Some(verdict) = verdict {
            self.conclude(ctx, verdict);
        }
    }

    fn render(&self, ctx: &mut RenderContext) {
        let Some(session) = &self.session else {
            return;
        };
        draw_session(
            session,
            ctx.scene,
            ctx.vectors,
            self.config.gravity.y,
            self.config.fixed_dt,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::events;
    use crate::unlock::MemoryUnlockStore;
    use glam::Vec2;
    use shelter_engine::{BodyDesc, BodyKind, ColliderMaterial, Entity, GameEvent, Outline};

    fn game_with_highest(highest: u32) -> (EggGame, EngineContext) {
        let mut game = EggGame::with_store(9, Box::new(MemoryUnlockStore::with_highest(highest)));
        let mut ctx = EngineContext::from_config(&game.config());
        game.init(&mut ctx);
        ctx.clear_frame_data();
        (game, ctx)
    }

    fn step(game: &mut EggGame, ctx: &mut EngineContext, input: &InputQueue) {
        game.update(ctx, input);
        ctx.step_physics();
        game.post_step(ctx);
    }

    fn run_ms(game: &mut EggGame, ctx: &mut EngineContext, ms: u32) {
        let input = InputQueue::new();
        let steps = (ms as f32 * 60.0 / 1000.0).round() as u32;
        for _ in 0..steps {
            step(game, ctx, &input);
        }
    }

    fn drop_hail_on_egg(game: &EggGame, ctx: &mut EngineContext) {
        let egg = ctx.scene.get(game.session().unwrap().player()).unwrap().pos;
        let outline = Outline::Circle { radius: 6.0 };
        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(outline.into()).with_position(egg - Vec2::new(0.0, 80.0));
        ctx.spawn_with_body(
            Entity::new(id).with_kind(BodyKind::Hail),
            desc,
            ColliderMaterial::default(),
        );
    }

    fn kinds(ctx: &EngineContext) -> Vec<f32> {
        ctx.events.iter().map(|e| e.kind).collect()
    }

    fn find(ctx: &EngineContext, kind: f32) -> Option<GameEvent> {
        ctx.events.iter().copied().find(|e| e.kind == kind)
    }

    #[test]
    fn init_shows_menu_with_unlock_state() {
        let mut game = EggGame::with_store(1, Box::new(MemoryUnlockStore::with_highest(3)));
        let mut ctx = EngineContext::from_config(&game.config());
        game.init(&mut ctx);
        assert_eq!(kinds(&ctx), vec![events::SHOW_MENU, events::UNLOCK_CHANGED]);
        assert_eq!(ctx.events[1].a, 3.0);
        assert!(ctx.is_paused());
        assert!(!game.is_playing());
    }

    #[test]
    fn stored_progress_is_capped_to_the_catalog() {
        let game = EggGame::with_store(1, Box::new(MemoryUnlockStore::with_highest(400)));
        assert_eq!(game.highest_unlocked(), 25);
    }

    #[test]
    fn unknown_level_builds_nothing() {
        let (mut game, mut ctx) = game_with_highest(1);
        assert_eq!(game.start_level(&mut ctx, 77), Err(SetupError::UnknownLevel(77)));
        assert!(!game.is_playing());
        assert!(ctx.scene.is_empty());
        let err = find(&ctx, events::SETUP_ERROR).unwrap();
        assert_eq!((err.a, err.b), (1.0, 77.0));
    }

    #[test]
    fn start_level_builds_scene_and_signals_play() {
        let (mut game, mut ctx) = game_with_highest(1);
        assert_eq!(game.start_level(&mut ctx, 1), Ok(()));
        assert!(game.is_playing());
        assert!(!ctx.is_paused());
        assert_eq!(ctx.scene.count_kind(BodyKind::Player), 1);
        assert_eq!(find(&ctx, events::SHOW_PLAY).unwrap().a, 1.0);
        assert_eq!(find(&ctx, events::PALETTE_RESET).unwrap().a, 1.0);
        assert_eq!(find(&ctx, events::COUNTDOWN).unwrap().a, 10.0);
    }

    #[test]
    fn restart_rebuilds_with_a_single_player() {
        let (mut game, mut ctx) = game_with_highest(1);
        game.start_level(&mut ctx, 3).unwrap();
        run_ms(&mut game, &mut ctx, 3000);
        game.restart(&mut ctx).unwrap();
        assert_eq!(ctx.scene.count_kind(BodyKind::Player), 1);
        assert_eq!(game.session().unwrap().level().id, 3);
        assert!(matches!(
            game.session().unwrap().phase(),
            Phase::Countdown { remaining: 10 }
        ));
    }

    #[test]
    fn restart_clears_placed_shapes_and_hail() {
        let (mut game, mut ctx) = game_with_highest(1);
        game.start_level(&mut ctx, 1).unwrap();

        let mut input = InputQueue::new();
        input.push(InputEvent::PaletteGrab { index: 0 });
        input.push(InputEvent::PointerMove { x: 200.0, y: 60.0 });
        input.push(InputEvent::PointerUp { x: 200.0, y: 60.0 });
        step(&mut game, &mut ctx, &input);
        assert_eq!(ctx.scene.count_kind(BodyKind::Placed), 1);
        assert_eq!(game.session().unwrap().palette().remaining(), 0);

        run_ms(&mut game, &mut ctx, 10_100);
        for _ in 0..60 {
            if ctx.scene.count_kind(BodyKind::Hail) > 0 {
                break;
            }
            run_ms(&mut game, &mut ctx, 150);
        }
        assert!(game.is_playing());
        assert!(ctx.scene.count_kind(BodyKind::Hail) > 0);

        game.restart(&mut ctx).unwrap();
        assert_eq!(ctx.scene.count_kind(BodyKind::Placed), 0);
        assert_eq!(ctx.scene.count_kind(BodyKind::Hail), 0);
        assert_eq!(ctx.scene.count_kind(BodyKind::Bee), 0);
        assert_eq!(ctx.scene.count_kind(BodyKind::Player), 1);
        let session = game.session().unwrap();
        assert_eq!(session.palette().remaining(), session.palette().len());
        assert_eq!(session.epoch(), game.timers.epoch());
        // Only the new countdown is scheduled.
        assert_eq!(game.timers.len(), 1);
    }

    #[test]
    fn losing_keeps_progress_and_returns_to_the_menu() {
        let (mut game, mut ctx) = game_with_highest(1);
        game.start_level(&mut ctx, 1).unwrap();
        run_ms(&mut game, &mut ctx, 10_100);
        assert_eq!(game.session().unwrap().phase(), Phase::Active);

        ctx.clear_frame_data();
        drop_hail_on_egg(&game, &mut ctx);
        let input = InputQueue::new();
        for _ in 0..120 {
            if !game.is_playing() {
                break;
            }
            step(&mut game, &mut ctx, &input);
        }

        assert!(!game.is_playing());
        assert_eq!(find(&ctx, events::OUTCOME).unwrap().a, 0.0);
        assert!(find(&ctx, events::UNLOCK_CHANGED).is_none());
        assert!(find(&ctx, events::SHOW_MENU).is_some());
        assert_eq!(game.highest_unlocked(), 1);
        assert!(game.timers.is_empty());
        assert!(ctx.scene.is_empty());
        assert!(ctx.is_paused());
    }

    #[test]
    fn stale_countdown_does_not_leak_into_the_next_session() {
        let (mut game, mut ctx) = game_with_highest(1);
        game.start_level(&mut ctx, 2).unwrap();
        run_ms(&mut game, &mut ctx, 500);
        game.start_level(&mut ctx, 3).unwrap();
        // The first session's tick would have landed at 1000 ms.
        run_ms(&mut game, &mut ctx, 700);
        assert!(matches!(
            game.session().unwrap().phase(),
            Phase::Countdown { remaining: 10 }
        ));
        run_ms(&mut game, &mut ctx, 400);
        assert!(matches!(
            game.session().unwrap().phase(),
            Phase::Countdown { remaining: 9 }
        ));
    }

    #[test]
    fn menu_tears_the_session_down() {
        let (mut game, mut ctx) = game_with_highest(1);
        game.start_level(&mut ctx, 6).unwrap();
        ctx.clear_frame_data();
        game.return_to_menu(&mut ctx);
        assert!(!game.is_playing());
        assert!(ctx.scene.is_empty());
        assert!(ctx.is_paused());
        assert_eq!(kinds(&ctx), vec![events::COUNTDOWN, events::SHOW_MENU]);
        assert_eq!(ctx.events[0].a, -1.0);
    }

    #[test]
    fn custom_events_drive_the_menu() {
        let (mut game, mut ctx) = game_with_highest(1);
        let mut input = InputQueue::new();
        input.push(InputEvent::Custom {
            kind: custom::START_LEVEL,
            a: 4.0,
            b: 0.0,
            c: 0.0,
        });
        game.update(&mut ctx, &input);
        assert_eq!(game.session().unwrap().level().id, 4);

        let mut input = InputQueue::new();
        input.push(InputEvent::Custom {
            kind: custom::MENU,
            a: 0.0,
            b: 0.0,
            c: 0.0,
        });
        game.update(&mut ctx, &input);
        assert!(!game.is_playing());
    }

    #[test]
    fn surviving_the_highest_level_unlocks_the_next() {
        // Level 16 has only lasers, so it completes on the survival clock.
        let (mut game, mut ctx) = game_with_highest(16);
        game.start_level(&mut ctx, 16).unwrap();
        let duration = game.session().unwrap().level().duration_ms;
        ctx.clear_frame_data();
        run_ms(&mut game, &mut ctx, 10_000 + duration + 100);

        assert!(!game.is_playing());
        assert_eq!(find(&ctx, events::OUTCOME).unwrap().a, 1.0);
        assert_eq!(find(&ctx, events::UNLOCK_CHANGED).unwrap().a, 17.0);
        assert!(find(&ctx, events::SHOW_MENU).is_some());
        assert_eq!(game.highest_unlocked(), 17);
    }

    #[test]
    fn replaying_an_old_level_does_not_unlock() {
        let (mut game, mut ctx) = game_with_highest(20);
        game.start_level(&mut ctx, 17).unwrap();
        let duration = game.session().unwrap().level().duration_ms;
        ctx.clear_frame_data();
        run_ms(&mut game, &mut ctx, 10_000 + duration + 100);

        assert_eq!(find(&ctx, events::OUTCOME).unwrap().a, 1.0);
        assert!(find(&ctx, events::UNLOCK_CHANGED).is_none());
        assert_eq!(game.highest_unlocked(), 20);
    }

    #[test]
    fn render_draws_only_during_a_session() {
        let (mut game, mut ctx) = game_with_highest(1);
        let mut vectors = shelter_engine::VectorState::new();
        game.render(&mut RenderContext {
            scene: &ctx.scene,
            vectors: &mut vectors,
        });
        assert_eq!(vectors.vertex_count(), 0);

        game.start_level(&mut ctx, 1).unwrap();
        game.render(&mut RenderContext {
            scene: &ctx.scene,
            vectors: &mut vectors,
        });
        let before = vectors.vertex_count();
        assert!(before > 0);

        // Every body with a sprite is drawn, including ones spawned mid-level.
        drop_hail_on_egg(&game, &mut ctx);
        let id = ctx.scene.iter_kind(BodyKind::Hail).next().unwrap().id;
        ctx.scene.get_mut(id).unwrap().sprite = Some(shelter_engine::Sprite::skinned(
            Outline::Circle { radius: 6.0 },
            shelter_engine::Skin::Hailstone,
        ));
        vectors.clear();
        game.render(&mut RenderContext {
            scene: &ctx.scene,
            vectors: &mut vectors,
        });
        assert!(vectors.vertex_count() > before);
    }
}
