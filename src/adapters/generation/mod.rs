//! Generation adapters - implementations of the generation task port.

mod scripted;

pub use scripted::ScriptedGenerationTask;
