//! Pipeline module
//!
//! The scheduled run: extract daily visits, load them, extract GA sessions,
//! load them. Each step gets a timeout and a bounded number of retries; a
//! step that still fails stops the run.
//!
//! # Overview
//!
//! - `Pipeline` - Holds the client, storage and warehouse for a run
//! - `StepPolicy` - Timeout, retries and delay applied to every step
//! - `Step` / `StepReport` / `RunReport` - What ran and what it did

mod runner;
mod types;

pub use runner::Pipeline;
pub use types::{RunReport, Step, StepOutcome, StepPolicy, StepReport};
