#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for courtbook.

This module wires together:
- `step`: single interactions (click / attribute read) with bounded retry against
  transient surface faults
- `gate`: marker-based availability classification and hard-verified selection

Neither layer returns errors: every interaction ends in a [`StepResult`] and the
booking orchestrator decides whether to proceed, fall back, or abort.

Example:
```no_run
use courtbook::config::Timing;
use courtbook::executor::StepExecutor;

let exec = StepExecutor::new(&Timing::default());
// let result = exec.click(&mut surface, &"//button".into()).await;
```
*/

pub mod gate;
pub mod step;

// Re-exports for convenient access from `courtbook::executor::*`
pub use gate::{AvailabilityGate, MarkerSet, SlotState, has_marker};
pub use step::{StepAction, StepExecutor, StepReason, StepResult};
