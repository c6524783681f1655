//! Chat2Edit - Generation backend with live cycle progress.
//!
//! A generation cycle reports its lifecycle as progress events. The crate
//! orders those events per cycle, keeps a replayable log, and streams them
//! to any number of viewers, whether they attach before, during or after
//! the run.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
