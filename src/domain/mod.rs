//! Domain layer containing business values and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, errors)
//! - `progress` - Lifecycle events of a generation cycle
//! - `generation` - Inputs and outputs of a generation run

pub mod foundation;
pub mod generation;
pub mod progress;
