//! # Codec Diagnostics
//!
//! The codec reports what it is doing through a caller-supplied
//! [`Diagnostics`] sink instead of process-wide state. Three sinks ship with
//! the crate:
//!
//! - [`LogDiagnostics`]: forwards every event to the `log` facade (default)
//! - [`NoDiagnostics`]: drops everything
//! - [`EventLog`]: keeps the events in memory and can export them as JSON

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured events emitted during encode and decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StegoEvent {
    /// The message was compressed (maybe) and encrypted.
    PayloadSealed {
        message_bytes: usize,
        sealed_bytes: usize,
        compressed: bool,
    },
    /// A depth was chosen for the frame.
    DepthPlanned {
        depth: u8,
        frame_bits: usize,
        required_slots: usize,
        available_slots: usize,
    },
    /// The frame was written into the carrier.
    FrameWritten { channels_touched: usize },
    /// The reader decoded the depth unit.
    DepthRecovered { depth: u8 },
    /// The reader decoded the length field.
    HeaderRecovered { payload_bits: usize, header_bits: usize },
    /// The reader collected every payload bit.
    PayloadRecovered {
        payload_bits: usize,
        channels_read: usize,
    },
}

/// Receives codec events. Implementations must be cheap; they run inline.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: &StegoEvent);
}

/// Logs events through the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn record(&self, event: &StegoEvent) {
        match event {
            StegoEvent::PayloadSealed {
                message_bytes,
                sealed_bytes,
                compressed,
            } => info!(
                "Sealed {} message bytes into {} payload bytes (compressed: {})",
                message_bytes, sealed_bytes, compressed
            ),
            StegoEvent::DepthPlanned {
                depth,
                frame_bits,
                required_slots,
                available_slots,
            } => info!(
                "Frame of {} bits at depth {} needs {}/{} channel slots",
                frame_bits, depth, required_slots, available_slots
            ),
            StegoEvent::FrameWritten { channels_touched } => {
                debug!("Frame written across {} channels", channels_touched)
            }
            StegoEvent::DepthRecovered { depth } => debug!("Decoded depth: {}", depth),
            StegoEvent::HeaderRecovered {
                payload_bits,
                header_bits,
            } => debug!(
                "Decoded header of {} bits, payload length {} bits",
                header_bits, payload_bits
            ),
            StegoEvent::PayloadRecovered {
                payload_bits,
                channels_read,
            } => info!(
                "Recovered {} payload bits from {} channels",
                payload_bits, channels_read
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn record(&self, _event: &StegoEvent) {}
}

/// Collects events for later inspection or export.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<StegoEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<StegoEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn export_to_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let output = serde_json::json!({
            "events": self.events(),
        });

        let json_string = serde_json::to_string_pretty(&output)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;

        Ok(())
    }
}

impl Diagnostics for EventLog {
    fn record(&self, event: &StegoEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
