//! Millisecond timer slots on a virtual clock
//!
//! The scheduler never sleeps. It arms at most one timer per [`TimerSlot`]
//! and whoever owns it (the real-time driver thread, or a test) moves the
//! clock forward with [`TimerTable::pop_due`]. Arming a slot replaces any
//! timer already in it, so a slot can never hold two pending callbacks.

/// One timer handle per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerSlot {
    /// Chord-advance timeout
    Advance,
    /// Lead-in countdown interval
    Countdown,
    /// Visible beat counter interval
    Beat,
    /// Metronome click interval
    Metronome,
}

impl TimerSlot {
    /// Dispatch order when several slots are due at the same instant
    pub const ALL: [TimerSlot; 4] = [
        TimerSlot::Advance,
        TimerSlot::Countdown,
        TimerSlot::Beat,
        TimerSlot::Metronome,
    ];

    fn index(self) -> usize {
        match self {
            TimerSlot::Advance => 0,
            TimerSlot::Countdown => 1,
            TimerSlot::Beat => 2,
            TimerSlot::Metronome => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    due: u64,
    /// Repeat period for intervals; `None` for one-shot timeouts
    period: Option<u64>,
    epoch: u64,
}

/// A fired timer, tagged with the session epoch it was armed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub slot: TimerSlot,
    pub epoch: u64,
    pub at: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TimerTable {
    now: u64,
    slots: [Option<Timer>; 4],
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Arm a one-shot timer `delay` ms from now
    pub fn set_timeout(&mut self, slot: TimerSlot, delay: u64, epoch: u64) {
        self.slots[slot.index()] = Some(Timer {
            due: self.now + delay,
            period: None,
            epoch,
        });
    }

    /// Arm a repeating timer whose first tick is `period` ms from now
    pub fn set_interval(&mut self, slot: TimerSlot, period: u64, epoch: u64) {
        let period = period.max(1);
        self.slots[slot.index()] = Some(Timer {
            due: self.now + period,
            period: Some(period),
            epoch,
        });
    }

    pub fn cancel(&mut self, slot: TimerSlot) {
        self.slots[slot.index()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; 4];
    }

    /// Number of armed slots
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Earliest due time across all slots
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|timer| timer.due).min()
    }

    /// Fire the earliest timer due at or before `until`, moving the clock to
    /// its due time. Intervals are re-armed one period later.
    pub fn pop_due(&mut self, until: u64) -> Option<Fired> {
        let slot = TimerSlot::ALL
            .into_iter()
            .filter_map(|slot| self.slots[slot.index()].map(|timer| (timer.due, slot)))
            .filter(|&(due, _)| due <= until)
            .min()
            .map(|(_, slot)| slot)?;

        let entry = &mut self.slots[slot.index()];
        let timer = (*entry)?;
        self.now = self.now.max(timer.due);
        *entry = timer.period.map(|period| Timer {
            due: timer.due + period,
            ..timer
        });

        Some(Fired {
            slot,
            epoch: timer.epoch,
            at: timer.due,
        })
    }

    /// Move the clock forward without firing anything
    pub fn settle(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_fires_once() {
        let mut timers = TimerTable::new();
        timers.set_timeout(TimerSlot::Advance, 500, 1);
        assert_eq!(timers.next_deadline(), Some(500));
        assert_eq!(timers.pop_due(499), None);

        let fired = timers.pop_due(1000).unwrap();
        assert_eq!(fired.slot, TimerSlot::Advance);
        assert_eq!(fired.at, 500);
        assert_eq!(timers.now(), 500);
        assert_eq!(timers.pop_due(1000), None);
    }

    #[test]
    fn test_interval_rearms() {
        let mut timers = TimerTable::new();
        timers.set_interval(TimerSlot::Beat, 250, 1);
        let ticks: Vec<u64> = std::iter::from_fn(|| timers.pop_due(1000)).map(|f| f.at).collect();
        assert_eq!(ticks, vec![250, 500, 750, 1000]);
        assert_eq!(timers.next_deadline(), Some(1250));
    }

    #[test]
    fn test_rearming_replaces_pending_timer() {
        let mut timers = TimerTable::new();
        timers.set_timeout(TimerSlot::Advance, 100, 1);
        timers.set_timeout(TimerSlot::Advance, 300, 1);
        assert_eq!(timers.pending(), 1);
        assert_eq!(timers.pop_due(1000).map(|f| f.at), Some(300));
    }

    #[test]
    fn test_same_instant_dispatch_order() {
        let mut timers = TimerTable::new();
        timers.set_interval(TimerSlot::Metronome, 500, 1);
        timers.set_interval(TimerSlot::Beat, 500, 1);
        timers.set_timeout(TimerSlot::Advance, 500, 1);
        let order: Vec<TimerSlot> = (0..3).filter_map(|_| timers.pop_due(500)).map(|f| f.slot).collect();
        assert_eq!(order, vec![TimerSlot::Advance, TimerSlot::Beat, TimerSlot::Metronome]);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = TimerTable::new();
        timers.set_interval(TimerSlot::Countdown, 500, 2);
        timers.set_timeout(TimerSlot::Advance, 500, 2);
        timers.cancel_all();
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.next_deadline(), None);
    }
}
