//! Presentation signals sent to the host page as game events.

use shelter_engine::{EngineContext, GameEvent};

/// Game event kinds (`GameEvent::kind`).
pub mod events {
    pub const OUTCOME: f32 = 1.0;
    pub const COUNTDOWN: f32 = 2.0;
    pub const SHOW_MENU: f32 = 3.0;
    pub const SHOW_PLAY: f32 = 4.0;
    pub const PALETTE_USED: f32 = 5.0;
    pub const PALETTE_RESET: f32 = 6.0;
    pub const UNLOCK_CHANGED: f32 = 7.0;
    pub const SETUP_ERROR: f32 = 8.0;
}

/// Custom input kinds the host sends through `game_custom_event`.
pub mod custom {
    /// `a` = level id.
    pub const START_LEVEL: u32 = 1;
    pub const RESTART: u32 = 2;
    pub const MENU: u32 = 3;
}

/// Countdown payload that hides the overlay.
pub const COUNTDOWN_HIDE: i32 = -1;
/// Countdown payload for "GO".
pub const COUNTDOWN_GO: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Outcome { won: bool },
    /// Seconds left, `COUNTDOWN_GO`, or `COUNTDOWN_HIDE`.
    Countdown(i32),
    ShowMenu,
    ShowPlay { level: u32 },
    PaletteUsed { index: usize },
    PaletteReset { entries: usize },
    UnlockChanged { highest: u32 },
    SetupError { code: u32, level: u32 },
}

impl Signal {
    pub fn to_event(self) -> GameEvent {
        match self {
            Signal::Outcome { won } => GameEvent::new(events::OUTCOME, if won { 1.0 } else { 0.0 }),
            Signal::Countdown(n) => GameEvent::new(events::COUNTDOWN, n as f32),
            Signal::ShowMenu => GameEvent::new(events::SHOW_MENU, 0.0),
            Signal::ShowPlay { level } => GameEvent::new(events::SHOW_PLAY, level as f32),
            Signal::PaletteUsed { index } => GameEvent::new(events::PALETTE_USED, index as f32),
            Signal::PaletteReset { entries } => {
                GameEvent::new(events::PALETTE_RESET, entries as f32)
            }
            Signal::UnlockChanged { highest } => {
                GameEvent::new(events::UNLOCK_CHANGED, highest as f32)
            }
            Signal::SetupError { code, level } => GameEvent {
                kind: events::SETUP_ERROR,
                a: code as f32,
                b: level as f32,
                c: 0.0,
            },
        }
    }

    pub fn emit(self, ctx: &mut EngineContext) {
        ctx.emit_event(self.to_event());
    }
}
