/// Fixed timestep accumulator.
/// Ensures game logic runs at a consistent rate regardless of frame time.
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        // Cap to prevent spiral of death (max 10 steps per frame)
        self.accumulator = self.accumulator.min(self.dt * 10.0);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// Handle returned when scheduling a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A timer that came due during [`Timers::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    /// Epoch the timer was scheduled under. Always the current epoch.
    pub epoch: u32,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    epoch: u32,
    due_ms: f64,
    /// `Some` for repeating timers.
    period_ms: Option<f64>,
    payload: T,
}

/// Millisecond timer wheel driven by the fixed step.
///
/// Every timer is tagged with the epoch that was current when it was
/// scheduled. Bumping the epoch with [`Timers::set_epoch`] makes all older
/// timers stale: they are discarded the next time they come due instead of
/// being reported.
pub struct Timers<T> {
    now_ms: f64,
    next_id: u64,
    epoch: u32,
    timers: Vec<Timer<T>>,
}

/// Shortest allowed interval; keeps a zero period from firing forever.
const MIN_PERIOD_MS: f64 = 1.0;

impl<T: Clone> Timers<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 1,
            epoch: 0,
            timers: Vec::new(),
        }
    }

    /// Fire `payload` once, `delay_ms` from now.
    pub fn schedule_timeout(&mut self, delay_ms: f64, payload: T) -> TimerId {
        self.insert(delay_ms.max(0.0), None, payload)
    }

    /// Fire `payload` every `period_ms`, first time one period from now.
    pub fn schedule_interval(&mut self, period_ms: f64, payload: T) -> TimerId {
        let period = period_ms.max(MIN_PERIOD_MS);
        self.insert(period, Some(period), payload)
    }

    /// Cancel one timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Cancel every pending timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Switch to a new epoch. Timers scheduled under other epochs go stale.
    pub fn set_epoch(&mut self, epoch: u32) {
        self.epoch = epoch;
    }

    /// Whether a timer is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Number of pending timers, stale ones included.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Current clock reading.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Move the clock forward and collect every timer that came due, in due
    /// order. Repeating timers may fire several times in one call.
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<Fired<T>> {
        self.now_ms += elapsed_ms.max(0.0);
        let mut fired = Vec::new();

        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due_ms <= self.now_ms)
                .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms))
                .map(|(idx, _)| idx);
            let Some(idx) = next else { break };

            if self.timers[idx].epoch != self.epoch {
                let stale = self.timers.swap_remove(idx);
                log::debug!(
                    "dropping stale timer {:?} from epoch {} (current {})",
                    stale.id,
                    stale.epoch,
                    self.epoch
                );
                continue;
            }

            let timer = &mut self.timers[idx];
            fired.push(Fired {
                id: timer.id,
                epoch: timer.epoch,
                payload: timer.payload.clone(),
            });
            match timer.period_ms {
                Some(period) => timer.due_ms += period,
                None => {
                    self.timers.swap_remove(idx);
                }
            }
        }

        fired
    }

    fn insert(&mut self, delay_ms: f64, period_ms: Option<f64>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            epoch: self.epoch,
            due_ms: self.now_ms + delay_ms,
            period_ms,
            payload,
        });
        id
    }
}

impl<T: Clone> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}
