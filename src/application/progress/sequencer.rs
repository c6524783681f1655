//! EventSequencer - Single-writer ordering of a cycle's progress events.
//!
//! Producers call [`SequencerHandle::raise`] from anywhere, concurrently.
//! One worker task per cycle drains the queue and, for each event:
//! 1. appends it to the event log (durable)
//! 2. publishes it on the progress bus with its log ordinal (live)
//!
//! Store and bus failures are logged and never reach the producer. The worker
//! stops after it has sequenced a terminal event or when the sequencer is
//! finished; later raises are dropped.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::foundation::CycleId;
use crate::domain::progress::{EventKind, ProgressEvent, SequencedEvent};
use crate::ports::{EventLogStore, GenerationSink, ProgressBus};

enum Command {
    Event(ProgressEvent),
    Stop,
}

/// What the worker did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencerStats {
    /// Events durably appended.
    pub appended: u64,
    /// Events published on the bus.
    pub published: u64,
    pub append_failures: u64,
    pub publish_failures: u64,
    /// Events still queued when the worker stopped.
    pub dropped: u64,
}

/// Cheap, cloneable producer side of a sequencer.
#[derive(Debug, Clone)]
pub struct SequencerHandle {
    cycle_id: CycleId,
    sender: mpsc::UnboundedSender<Command>,
}

impl SequencerHandle {
    pub fn cycle_id(&self) -> &CycleId {
        &self.cycle_id
    }

    /// Queue an event for sequencing. Never blocks and never fails; once the
    /// worker has stopped the event is dropped.
    pub fn raise(&self, event: ProgressEvent) {
        if let Err(mpsc::error::SendError(Command::Event(event))) =
            self.sender.send(Command::Event(event))
        {
            tracing::debug!(
                cycle_id = %self.cycle_id,
                kind = %event.kind,
                "Sequencer stopped, dropping progress event"
            );
        }
    }

    /// Whether the worker still accepts events.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Per-cycle event sequencer owning its worker task.
#[derive(Debug)]
pub struct EventSequencer {
    handle: SequencerHandle,
    worker: JoinHandle<SequencerStats>,
}

impl EventSequencer {
    /// Start the worker for `cycle_id`. Must be called inside a tokio runtime.
    pub fn spawn(
        cycle_id: CycleId,
        store: Arc<dyn EventLogStore>,
        bus: Arc<dyn ProgressBus>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(cycle_id.clone(), receiver, store, bus));

        Self {
            handle: SequencerHandle { cycle_id, sender },
            worker,
        }
    }

    pub fn cycle_id(&self) -> &CycleId {
        self.handle.cycle_id()
    }

    pub fn raise(&self, event: ProgressEvent) {
        self.handle.raise(event);
    }

    pub fn handle(&self) -> SequencerHandle {
        self.handle.clone()
    }

    /// A [`GenerationSink`] that raises one event per agent hook.
    pub fn reporter(&self) -> ProgressReporter {
        ProgressReporter {
            handle: self.handle(),
        }
    }

    /// Stop the worker once everything raised so far is sequenced, and wait
    /// for it.
    pub async fn finish(self) -> SequencerStats {
        // Fails only if the worker already stopped on a terminal event.
        let _ = self.handle.sender.send(Command::Stop);

        match self.worker.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(
                    cycle_id = %self.handle.cycle_id,
                    error = %e,
                    "Sequencer worker failed"
                );
                SequencerStats::default()
            }
        }
    }
}

async fn run_worker(
    cycle_id: CycleId,
    mut receiver: mpsc::UnboundedReceiver<Command>,
    store: Arc<dyn EventLogStore>,
    bus: Arc<dyn ProgressBus>,
) -> SequencerStats {
    let mut stats = SequencerStats::default();

    while let Some(command) = receiver.recv().await {
        let event = match command {
            Command::Event(event) => event,
            Command::Stop => break,
        };
        let terminal = event.is_terminal();

        let seq = match store.append(&cycle_id, &event).await {
            Ok(seq) => {
                stats.appended += 1;
                Some(seq)
            }
            Err(e) => {
                stats.append_failures += 1;
                tracing::warn!(
                    cycle_id = %cycle_id,
                    kind = %event.kind,
                    error = %e,
                    "Failed to append progress event"
                );
                None
            }
        };

        let kind = event.kind.clone();
        match bus.publish(&cycle_id, &SequencedEvent::new(seq, event)).await {
            Ok(()) => stats.published += 1,
            Err(e) => {
                stats.publish_failures += 1;
                tracing::warn!(
                    cycle_id = %cycle_id,
                    kind = %kind,
                    seq = ?seq,
                    error = %e,
                    "Failed to publish progress event"
                );
            }
        }

        if terminal {
            tracing::debug!(cycle_id = %cycle_id, kind = %kind, "Terminal event sequenced");
            break;
        }
    }

    receiver.close();
    while let Ok(command) = receiver.try_recv() {
        if let Command::Event(event) = command {
            stats.dropped += 1;
            tracing::debug!(
                cycle_id = %cycle_id,
                kind = %event.kind,
                "Dropping progress event raised after stop"
            );
        }
    }

    stats
}

/// Adapts agent hooks into sequenced progress events.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    handle: SequencerHandle,
}

impl ProgressReporter {
    fn report(&self, kind: EventKind, payload: Value) {
        self.handle.raise(ProgressEvent::new(kind).with_data(payload));
    }
}

impl GenerationSink for ProgressReporter {
    fn on_request(&self, payload: Value) {
        self.report(EventKind::Request, payload);
    }

    fn on_prompt(&self, payload: Value) {
        self.report(EventKind::Prompt, payload);
    }

    fn on_answer(&self, payload: Value) {
        self.report(EventKind::Answer, payload);
    }

    fn on_extract(&self, payload: Value) {
        self.report(EventKind::Extract, payload);
    }

    fn on_execute(&self, payload: Value) {
        self.report(EventKind::Execute, payload);
    }
}
