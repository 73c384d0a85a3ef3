//! Command Queue
//!
//! Unbounded multi-producer, single-consumer FIFO between input producers
//! and the tick loop. Senders are plain (non-async) handles usable from any
//! thread; the receiver is drained without blocking.

use tokio::sync::mpsc;

use crate::game::command::Command;

/// Create a connected sender/receiver pair.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Producer side. Cheap to clone, one per producer thread.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Enqueue a command.
    ///
    /// Returns `false` once the receiver is gone (the game has ended).
    pub fn send(&self, cmd: Command) -> bool {
        self.tx.send(cmd).is_ok()
    }

    /// Has the receiver been dropped?
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the tick loop.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandReceiver {
    /// Number of queued commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Is the queue empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Drain the commands queued at the moment of the call.
    ///
    /// Commands arriving while draining stay queued for the next call.
    pub fn drain_snapshot(&mut self) -> Vec<Command> {
        let available = self.rx.len();
        let mut drained = Vec::with_capacity(available);
        for _ in 0..available {
            match self.rx.try_recv() {
                Ok(cmd) => drained.push(cmd),
                Err(_) => break,
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Cell;

    fn cmd(ts: i64) -> Command {
        Command::jump(ts, "PW_6_0", Cell::new(6, 0))
    }

    #[test]
    fn test_fifo_per_producer() {
        let (tx, mut rx) = command_channel();
        for ts in 0..5 {
            assert!(tx.send(cmd(ts)));
        }
        let stamps: Vec<i64> = rx.drain_snapshot().iter().map(|c| c.timestamp_ms).collect();
        assert_eq!(stamps, vec![0, 1, 2, 3, 4]);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_drain_is_bounded_by_snapshot() {
        let (tx, mut rx) = command_channel();
        tx.send(cmd(1));
        tx.send(cmd(2));
        assert_eq!(rx.len(), 2);

        let first = rx.drain_snapshot();
        tx.send(cmd(3));
        assert_eq!(first.len(), 2);

        let second = rx.drain_snapshot();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].timestamp_ms, 3);
        assert!(rx.drain_snapshot().is_empty());
    }

    #[test]
    fn test_senders_from_threads() {
        let (tx, mut rx) = command_channel();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    for n in 0..10 {
                        tx.send(cmd(i * 100 + n));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(rx.drain_snapshot().len(), 40);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = command_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.send(cmd(0)));
    }
}
