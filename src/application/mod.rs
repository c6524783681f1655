//! Application layer - Use cases built on the ports.
//!
//! The progress pipeline lives here: it orders events raised by a generation
//! run, persists and fans them out, and relays them to viewers.

pub mod progress;

pub use progress::{
    CycleHandle, CycleLifecycleController, EventSequencer, LifecycleError, ProgressRelay,
    ProgressReporter, RelayError, RelayExit,
};
