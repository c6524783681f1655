//! Progress pipeline - sequencing, relaying and running generation cycles.
//!
//! ```text
//! GenerationTask ──hooks──▶ EventSequencer ──append──▶ EventLogStore
//!                                  │                        │ replay
//!                                  └──publish──▶ ProgressBus ──tail──▶ ProgressRelay ──▶ viewer
//! ```

mod lifecycle;
mod relay;
mod sequencer;

pub use lifecycle::{CycleHandle, CycleLifecycleController, LifecycleError};
pub use relay::{ProgressRelay, RelayError, RelayExit, DEFAULT_IDLE_TIMEOUT};
pub use sequencer::{EventSequencer, ProgressReporter, SequencerHandle, SequencerStats};
