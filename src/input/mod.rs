//! Command Intake
//!
//! Everything outside the tick loop that feeds it: the shared queue and the
//! producer threads that fill it.
//!
//! - `queue`: multi-producer, single-consumer command channel
//! - `producer`: command sources and their threads

pub mod queue;
pub mod producer;

pub use queue::{command_channel, CommandReceiver, CommandSender};
pub use producer::{spawn_producer, CommandSource, ProducerHandle, ProducerStats, ScriptedSource, SourcePoll};
