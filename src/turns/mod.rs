//! Turn scheduling.
//!
//! The `TurnScheduler` decides *who* acts and *when*; it never decides what
//! they do. The battle controller drives it tick by tick and hands each
//! acting unit to the resolution pipeline.

mod scheduler;

pub use scheduler::{GameSpeed, StepRejection, TickOutcome, TurnScheduler, UnitPhase};
