//! Command Producers
//!
//! Each producer runs a `CommandSource` on its own named thread and forwards
//! whatever it yields into the shared queue. Stopping is cooperative: the
//! stop flag is checked between waits, and commands already enqueued are
//! still applied by the tick loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::game::command::Command;
use crate::input::queue::CommandSender;

/// Result of one wait on a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePoll {
    /// A command is ready to enqueue
    Ready(Command),
    /// Nothing arrived within the timeout
    Pending,
    /// The source will never yield again
    Exhausted,
}

/// Something that produces commands, possibly blocking while it waits.
pub trait CommandSource: Send + 'static {
    /// Wait up to `timeout` for the next command.
    fn poll_command(&mut self, timeout: Duration) -> SourcePoll;
}

/// Replays a fixed list of commands, optionally paced.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    pending: VecDeque<Command>,
    interval: Duration,
    next_due: Option<Instant>,
}

impl ScriptedSource {
    /// Yield `commands` in order, as fast as they are polled.
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            pending: commands.into_iter().collect(),
            interval: Duration::ZERO,
            next_due: None,
        }
    }

    /// Wait `interval` of wall time between commands.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Commands not yet yielded.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl CommandSource for ScriptedSource {
    fn poll_command(&mut self, timeout: Duration) -> SourcePoll {
        if self.pending.is_empty() {
            return SourcePoll::Exhausted;
        }

        if let Some(due) = self.next_due {
            let now = Instant::now();
            if now < due {
                thread::sleep((due - now).min(timeout));
                if Instant::now() < due {
                    return SourcePoll::Pending;
                }
            }
        }

        match self.pending.pop_front() {
            Some(cmd) => {
                self.next_due = Some(Instant::now() + self.interval);
                SourcePoll::Ready(cmd)
            }
            None => SourcePoll::Exhausted,
        }
    }
}

/// Counters reported when a producer thread exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Commands enqueued
    pub sent: u64,
    /// Polls that timed out
    pub idle_polls: u64,
}

/// Handle to a running producer thread.
#[derive(Debug)]
pub struct ProducerHandle {
    name: String,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<ProducerStats>,
}

impl ProducerHandle {
    /// Producer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the producer to stop after its current wait.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Has the thread exited?
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the thread to exit.
    ///
    /// A producer that panicked reports empty stats.
    pub fn join(self) -> ProducerStats {
        match self.thread.join() {
            Ok(stats) => stats,
            Err(_) => {
                warn!("Producer {} panicked", self.name);
                ProducerStats::default()
            }
        }
    }

    /// `stop()` then `join()`.
    pub fn shutdown(self) -> ProducerStats {
        self.stop();
        self.join()
    }
}

/// Run `source` on a named thread, forwarding into `sender`.
///
/// The thread exits when stopped, when the source is exhausted, or when the
/// receiver is gone.
pub fn spawn_producer<S: CommandSource>(
    name: &str,
    mut source: S,
    sender: CommandSender,
    poll: Duration,
) -> std::io::Result<ProducerHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread_name = name.to_string();

    let thread = thread::Builder::new()
        .name(format!("producer-{name}"))
        .spawn(move || {
            let mut stats = ProducerStats::default();
            while !flag.load(Ordering::Acquire) {
                match source.poll_command(poll) {
                    SourcePoll::Ready(cmd) => {
                        debug!("Producer {} enqueued {} for {:?}", thread_name, cmd.kind, cmd.unit_id);
                        if !sender.send(cmd) {
                            debug!("Producer {}: queue closed", thread_name);
                            break;
                        }
                        stats.sent += 1;
                    }
                    SourcePoll::Pending => stats.idle_polls += 1,
                    SourcePoll::Exhausted => break,
                }
            }
            info!("Producer {} exiting after {} commands", thread_name, stats.sent);
            stats
        })?;

    Ok(ProducerHandle {
        name: name.to_string(),
        stop,
        thread,
    })
}
