/*!
Booking workflow.

- `request`: what one attempt is after (target date, categories, slot candidates)
- `outcome`: wizard states, abort reasons, and the per-run outcome
- `orchestrator`: the wizard state machine for one category
- `controller`: bounded attempts with one category fallback each

Typical usage:
```no_run
use courtbook::booking::RunController;
use courtbook::config::Config;

let cfg = Config::default();
let controller = RunController::new(&cfg, false);
// let report = controller.run(&mut surface, &cfg.booking.categories, cfg.booking.attempts).await;
```
*/

pub mod controller;
pub mod orchestrator;
pub mod outcome;
pub mod request;

pub use controller::{RunController, RunReport};
pub use orchestrator::BookingOrchestrator;
pub use outcome::{AbortReason, BookingOutcome, BookingState, OutcomeTracker};
pub use request::{BookingRequest, day_label};
