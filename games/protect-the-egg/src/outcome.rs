//! Session phase: countdown, active play, and the terminal verdict.

use crate::levels::{EnemyKind, EnemyKinds};

/// Seconds shown before hazards start.
pub const COUNTDOWN_SECONDS: u32 = 10;

/// Something that must finish before the level is won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawner {
    Hail,
    Bees,
    /// Stands in when a level names only hazards without a spawner.
    Survival,
}

impl Spawner {
    fn bit(self) -> u8 {
        match self {
            Spawner::Hail => 1,
            Spawner::Bees => 1 << 1,
            Spawner::Survival => 1 << 2,
        }
    }
}

/// Spawners still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pending(u8);

impl Pending {
    /// Spawners a level with these enemies runs.
    pub fn for_enemies(enemies: EnemyKinds) -> Self {
        let mut pending = Pending::default();
        if enemies.contains(EnemyKind::Hail) {
            pending.insert(Spawner::Hail);
        }
        if enemies.contains(EnemyKind::Bees) {
            pending.insert(Spawner::Bees);
        }
        if pending.is_empty() {
            pending.insert(Spawner::Survival);
        }
        pending
    }

    pub fn insert(&mut self, spawner: Spawner) {
        self.0 |= spawner.bit();
    }

    /// Returns whether it was still pending.
    pub fn remove(&mut self, spawner: Spawner) -> bool {
        let had = self.contains(spawner);
        self.0 &= !spawner.bit();
        had
    }

    pub fn contains(self, spawner: Spawner) -> bool {
        self.0 & spawner.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Countdown { remaining: u32 },
    Active,
    Won,
    Lost,
}

/// What a countdown tick should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Show(u32),
    /// Hazards start now.
    Go,
    /// Not counting down.
    Ignored,
}

/// Phase tracker for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    phase: Phase,
    pending: Pending,
}

impl Outcome {
    pub fn new(enemies: EnemyKinds) -> Self {
        Self {
            phase: Phase::Countdown { remaining: COUNTDOWN_SECONDS },
            pending: Pending::for_enemies(enemies),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// One second of countdown elapsed.
    pub fn countdown_tick(&mut self) -> Tick {
        match self.phase {
            Phase::Countdown { remaining } if remaining > 1 => {
                self.phase = Phase::Countdown { remaining: remaining - 1 };
                Tick::Show(remaining - 1)
            }
            Phase::Countdown { .. } => {
                self.phase = Phase::Active;
                Tick::Go
            }
            _ => Tick::Ignored,
        }
    }

    /// A spawner completed. Returns `true` when this wins the level.
    pub fn spawner_finished(&mut self, spawner: Spawner) -> bool {
        if self.phase != Phase::Active || !self.pending.remove(spawner) {
            return false;
        }
        if self.pending.is_empty() {
            self.phase = Phase::Won;
            true
        } else {
            false
        }
    }

    /// A hazard touched the player. Returns `true` when this loses the level.
    pub fn hazard_hit(&mut self) -> bool {
        if self.phase == Phase::Active {
            self.phase = Phase::Lost;
            true
        } else {
            false
        }
    }

    pub fn accepts_placement(&self) -> bool {
        matches!(self.phase, Phase::Countdown { .. } | Phase::Active)
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Won | Phase::Lost)
    }
}
