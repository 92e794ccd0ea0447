//! Software lighting bus
//!
//! Frames sent to a loopback interface are kept in memory where a
//! [`LoopbackTap`] can read them back. Used by visualizers, the CLI dry run,
//! and tests.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::dmx::interface::{Delivery, DmxInterface, InterfaceConfig};
use crate::dmx::universe::Universe;
use crate::error::{InitError, SendError};

/// Loopback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Frames kept before the oldest is dropped
    #[serde(default = "default_history")]
    pub history: usize,
}

fn default_history() -> usize {
    64
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            history: default_history(),
        }
    }
}

/// One frame captured by the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackFrame {
    pub universe: u32,
    pub data: Box<Universe>,
}

#[derive(Debug, Default)]
struct Bus {
    frames: VecDeque<LoopbackFrame>,
    sent: u64,
}

/// Read side of a loopback interface
#[derive(Debug, Clone)]
pub struct LoopbackTap {
    bus: Arc<Mutex<Bus>>,
}

impl LoopbackTap {
    /// Captured frames, oldest first
    pub fn frames(&self) -> Vec<LoopbackFrame> {
        self.bus.lock().frames.iter().cloned().collect()
    }

    /// Most recent frame for a universe
    pub fn last(&self, universe: u32) -> Option<Box<Universe>> {
        self.bus
            .lock()
            .frames
            .iter()
            .rev()
            .find(|f| f.universe == universe)
            .map(|f| f.data.clone())
    }

    /// Total frames sent, including dropped ones
    pub fn sent(&self) -> u64 {
        self.bus.lock().sent
    }

    pub fn clear(&self) {
        self.bus.lock().frames.clear();
    }
}

/// In-memory interface
pub struct LoopbackInterface {
    id: String,
    config: LoopbackConfig,
    bus: Arc<Mutex<Bus>>,
    open: bool,
}

impl LoopbackInterface {
    pub fn new(id: impl Into<String>, config: LoopbackConfig) -> Self {
        Self {
            id: id.into(),
            config,
            bus: Arc::new(Mutex::new(Bus::default())),
            open: false,
        }
    }

    /// A handle that observes frames sent through this interface
    pub fn tap(&self) -> LoopbackTap {
        LoopbackTap {
            bus: Arc::clone(&self.bus),
        }
    }
}

impl DmxInterface for LoopbackInterface {
    fn id(&self) -> &str {
        &self.id
    }

    fn init(&mut self) -> Result<(), InitError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn send(&mut self, channels: &Universe, universe: u32) -> Result<Delivery, SendError> {
        if !self.open {
            return Err(SendError::NotInitialized);
        }

        let mut bus = self.bus.lock();
        bus.sent += 1;
        if self.config.history == 0 {
            return Ok(Delivery::Sent);
        }
        while bus.frames.len() >= self.config.history {
            bus.frames.pop_front();
        }
        bus.frames.push_back(LoopbackFrame {
            universe,
            data: Box::new(*channels),
        });
        Ok(Delivery::Sent)
    }

    fn config(&self) -> InterfaceConfig {
        InterfaceConfig::Loopback(self.config.clone())
    }

    fn is_ready(&self) -> bool {
        self.open
    }
}
