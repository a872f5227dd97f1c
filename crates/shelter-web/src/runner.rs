use shelter_engine::{
    EngineContext, FixedTimestep, Game, GameConfig, GameEvent, InputEvent, InputQueue,
    ProtocolLayout, RenderContext, VectorState,
};

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    vectors: VectorState,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    initialized: bool,
    frame: u32,
    /// Header + vectors + events, see `ProtocolLayout`.
    frame_buffer: Vec<f32>,
    /// Events emitted by direct calls between ticks, delivered with the next frame.
    carried_events: Vec<GameEvent>,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        let layout = ProtocolLayout::from_config(&config);

        Self {
            game,
            ctx: EngineContext::from_config(&config),
            input: InputQueue::new(),
            vectors: VectorState::with_capacity(config.max_vector_vertices),
            timestep,
            frame_buffer: vec![0.0; layout.buffer_total_floats],
            layout,
            config,
            initialized: false,
            frame: 0,
            carried_events: Vec::new(),
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.game.init(&mut self.ctx);
        self.carry_new_events(0);
        self.initialized = true;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run a direct call against the game between ticks.
    /// Events it emits are delivered with the next frame.
    pub fn with_game<R>(&mut self, f: impl FnOnce(&mut G, &mut EngineContext) -> R) -> R {
        let before = self.ctx.events.len();
        let out = f(&mut self.game, &mut self.ctx);
        self.carry_new_events(before);
        out
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    /// Run one frame tick: fixed steps of update, physics and post-step, then render.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        // Clear per-frame transient data
        self.ctx.clear_frame_data();
        self.ctx.events.append(&mut self.carried_events);

        // Fixed timestep accumulation. Input is handed to the first step only
        // and stays queued when no step runs this frame.
        let steps = self.timestep.accumulate(dt);
        if steps > 0 {
            let mut frame_input = InputQueue::new();
            for event in self.input.drain() {
                frame_input.push(event);
            }
            let empty = InputQueue::new();
            for step in 0..steps {
                let input = if step == 0 { &frame_input } else { &empty };
                self.game.update(&mut self.ctx, input);
                self.ctx.step_physics();
                self.game.post_step(&mut self.ctx);
            }
        }

        self.vectors.clear();
        {
            let mut render_ctx = RenderContext {
                scene: &self.ctx.scene,
                vectors: &mut self.vectors,
            };
            self.game.render(&mut render_ctx);
        }

        self.frame = self.frame.wrapping_add(1);
        self.layout.write_frame(
            &mut self.frame_buffer,
            self.frame,
            &self.config,
            self.vectors.as_slice(),
            &self.ctx.events,
        );
    }

    fn carry_new_events(&mut self, from: usize) {
        if self.ctx.events.len() > from {
            self.carried_events.extend(self.ctx.events.drain(from..));
        }
    }

    // ---- Pointer accessors for host reads ----

    pub fn frame_buffer_ptr(&self) -> *const f32 {
        self.frame_buffer.as_ptr()
    }

    pub fn vector_vertices_ptr(&self) -> *const f32 {
        self.vectors.buffer_ptr()
    }

    pub fn vector_vertex_count(&self) -> u32 {
        self.vectors.vertex_count() as u32
    }

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len().min(self.layout.max_events) as u32
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    // ---- Capacity accessors (read by the host via wasm_bindgen exports) ----

    pub fn max_vector_vertices(&self) -> u32 {
        self.layout.max_vector_vertices as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }

    #[cfg(test)]
    fn frame_buffer(&self) -> &[f32] {
        &self.frame_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_engine::bridge::protocol::{HEADER_EVENT_COUNT, HEADER_FRAME_COUNTER};
    use shelter_engine::VectorColor;
    use glam::Vec2;

    /// Records the order of hook calls and echoes custom input as events.
    #[derive(Default)]
    struct Probe {
        calls: Vec<&'static str>,
        customs_seen: u32,
    }

    impl Game for Probe {
        fn init(&mut self, ctx: &mut EngineContext) {
            ctx.emit_event(GameEvent::new(9.0, 0.0));
        }

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.calls.push("update");
            for event in input.iter() {
                if let InputEvent::Custom { kind, .. } = event {
                    self.customs_seen += 1;
                    ctx.emit_event(GameEvent::new(*kind as f32, 0.0));
                }
            }
        }

        fn post_step(&mut self, _ctx: &mut EngineContext) {
            self.calls.push("post_step");
        }

        fn render(&self, ctx: &mut RenderContext) {
            ctx.vectors.fill_rect(Vec2::ZERO, 10.0, 10.0, VectorColor::WHITE);
        }
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn hooks_run_in_step_order() {
        let mut runner = GameRunner::new(Probe::default());
        runner.init();
        runner.tick(DT * 2.0 + 0.001);
        assert_eq!(
            runner.game().calls,
            vec!["update", "post_step", "update", "post_step"]
        );
        assert_eq!(runner.vector_vertex_count(), 6);
    }

    #[test]
    fn input_reaches_only_the_first_step() {
        let mut runner = GameRunner::new(Probe::default());
        runner.init();
        runner.push_input(InputEvent::Custom { kind: 3, a: 0.0, b: 0.0, c: 0.0 });
        runner.tick(DT * 3.0 + 0.001);
        assert_eq!(runner.game().customs_seen, 1);
    }

    #[test]
    fn input_waits_for_a_step() {
        let mut runner = GameRunner::new(Probe::default());
        runner.init();
        runner.push_input(InputEvent::Custom { kind: 3, a: 0.0, b: 0.0, c: 0.0 });
        runner.tick(0.001);
        assert_eq!(runner.game().customs_seen, 0);
        runner.tick(DT);
        assert_eq!(runner.game().customs_seen, 1);
    }

    #[test]
    fn direct_call_events_arrive_with_next_frame() {
        let mut runner = GameRunner::new(Probe::default());
        runner.init();
        runner.with_game(|_, ctx| ctx.emit_event(GameEvent::new(5.0, 1.0)));
        assert_eq!(runner.game_events_len(), 0);

        runner.tick(0.0);
        // Init event plus the direct-call event.
        assert_eq!(runner.game_events_len(), 2);
        assert_eq!(runner.frame_buffer()[HEADER_EVENT_COUNT], 2.0);
        assert_eq!(runner.frame_buffer()[HEADER_FRAME_COUNTER], 1.0);

        runner.tick(0.0);
        assert_eq!(runner.game_events_len(), 0);
    }

    #[test]
    fn tick_before_init_does_nothing() {
        let mut runner = GameRunner::new(Probe::default());
        runner.tick(DT);
        assert!(runner.game().calls.is_empty());
    }
}
