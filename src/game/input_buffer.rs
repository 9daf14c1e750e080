//! Lock-free command queue with per-kind debouncing
//!
//! Uses crossbeam-channel for lock-free MPSC communication from the input
//! collaborator to the simulation. The simulation drains the queue once at
//! the start of every tick; drained commands are gone whether or not they
//! pass the debounce check.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::constants::input::{FIRE_DEBOUNCE_MS, MOVE_DEBOUNCE_MS, QUEUE_CAPACITY};
use crate::net::protocol::{Command, CommandKind};

/// Bounded command queue
///
/// Any number of [`CommandSender`] handles can submit commands without
/// blocking; the tick loop drains everything pending in one go.
pub struct CommandQueue {
    /// Sender side - cloned to each input source
    sender: Sender<Command>,
    /// Receiver side - used by the tick loop
    receiver: Receiver<Command>,
    capacity: usize,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Create a new sender handle for an input source
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to submit a command (non-blocking)
    ///
    /// Returns false if the queue is full
    #[inline]
    pub fn try_submit(&self, command: Command) -> bool {
        self.sender.try_send(command).is_ok()
    }

    /// Drain all pending commands in arrival order
    pub fn drain(&self) -> Vec<Command> {
        self.receiver.try_iter().collect()
    }

    /// Drop everything pending
    pub fn clear(&self) -> usize {
        self.receiver.try_iter().count()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(QUEUE_CAPACITY)
    }
}

/// Clonable sender handle for input sources
#[derive(Clone)]
pub struct CommandSender {
    sender: Sender<Command>,
}

impl CommandSender {
    /// Submit a command (non-blocking)
    #[inline]
    pub fn try_send(&self, command: Command) -> Result<(), CommandQueueError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => CommandQueueError::Full,
            TrySendError::Disconnected(_) => CommandQueueError::Disconnected,
        })
    }
}

/// Command queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandQueueError {
    /// Queue is full (backpressure)
    #[error("command queue is full")]
    Full,
    /// Simulation dropped its queue
    #[error("command queue disconnected")]
    Disconnected,
}

/// Per-kind last accepted timestamps
///
/// Movement commands share one window, fire has its own. Windows are
/// measured between command timestamps, never against wall time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Debouncer {
    last_move_ms: Option<u64>,
    last_fire_ms: Option<u64>,
}

impl Debouncer {
    pub fn window_ms(kind: CommandKind) -> u64 {
        match kind {
            CommandKind::MoveLeft | CommandKind::MoveRight => MOVE_DEBOUNCE_MS,
            CommandKind::Fire => FIRE_DEBOUNCE_MS,
        }
    }

    fn slot(&self, kind: CommandKind) -> Option<u64> {
        match kind {
            CommandKind::MoveLeft | CommandKind::MoveRight => self.last_move_ms,
            CommandKind::Fire => self.last_fire_ms,
        }
    }

    /// Whether a command of `kind` issued at `timestamp_ms` would be accepted
    pub fn is_ready(&self, kind: CommandKind, timestamp_ms: u64) -> bool {
        match self.slot(kind) {
            None => true,
            // Out-of-order timestamps saturate to 0 and are rejected
            Some(last) => timestamp_ms.saturating_sub(last) >= Self::window_ms(kind),
        }
    }

    /// Record an accepted command
    pub fn record(&mut self, kind: CommandKind, timestamp_ms: u64) {
        match kind {
            CommandKind::MoveLeft | CommandKind::MoveRight => self.last_move_ms = Some(timestamp_ms),
            CommandKind::Fire => self.last_fire_ms = Some(timestamp_ms),
        }
    }
}
