//! Timer-driven playback of a progression

pub mod collaborators;
pub mod engine;
pub mod session;
pub mod timers;

pub use collaborators::{BeatIndicator, Highlighter, Silent, ToneGenerator};
pub use engine::{PracticeScheduler, ProgressionSource};
pub use session::{Phase, Session};
pub use timers::{TimerSlot, TimerTable};
