//! Control messages and the speed handle.
//!
//! The render path reads the speed once per call from a shared
//! [`AtomicDouble`]. Everything in this module runs on control threads and
//! only ever replaces that value.

use crate::lockfree::AtomicDouble;
use crate::{Error, Result};
use crossbeam_channel::{unbounded, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Out-of-band message for a processor.
///
/// Serialized as `{"type": "speed", "value": 1.5}`. Any other `type` decodes
/// to [`ControlMessage::Unknown`] and is ignored by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    Speed { value: f64 },
    #[serde(other)]
    Unknown,
}

impl ControlMessage {
    pub fn speed(value: f64) -> Self {
        Self::Speed { value }
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Checks the caller contract for speed values: finite and greater than 0.
pub fn validate_speed(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter {
            name: "speed",
            value,
        })
    }
}

/// Control-side handle to a processor's speed factor.
///
/// Cheap to clone. Handling a message is a single atomic store; the new value
/// applies from the next render call, with no smoothing.
#[derive(Debug, Clone)]
pub struct SpeedHandle {
    speed: Arc<AtomicDouble>,
}

impl SpeedHandle {
    pub(crate) fn new(speed: Arc<AtomicDouble>) -> Self {
        Self { speed }
    }

    /// Apply a message as delivered, without validation.
    ///
    /// Non-positive and non-finite speeds are stored as-is; see
    /// [`hop_threshold`](crate::hop_threshold) for how the drain treats them.
    pub fn handle_message(&self, message: &ControlMessage) {
        match *message {
            ControlMessage::Speed { value } => {
                let previous = self.speed.swap(value);
                tracing::trace!(previous, value, "speed updated");
            }
            ControlMessage::Unknown => {
                tracing::trace!("ignoring unrecognized control message");
            }
        }
    }

    /// Decode a JSON payload and handle it.
    pub fn post_json(&self, payload: &str) -> Result<()> {
        let message = ControlMessage::from_json(payload)?;
        self.handle_message(&message);
        Ok(())
    }

    /// Validating entry point. Rejects `value <= 0` and non-finite values.
    pub fn set_speed(&self, value: f64) -> Result<()> {
        let value = validate_speed(value).inspect_err(|_| {
            tracing::warn!(value, "rejected speed");
        })?;
        self.handle_message(&ControlMessage::speed(value));
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed.get()
    }
}

/// Asynchronous delivery of control messages on a dedicated thread.
///
/// Posting never blocks and never waits for the message to be applied. The
/// thread exits once every clone of the port has been dropped.
#[derive(Debug, Clone)]
pub struct ControlPort {
    tx: Sender<ControlMessage>,
}

impl ControlPort {
    pub fn spawn(handle: SpeedHandle) -> Result<(Self, JoinHandle<()>)> {
        let (tx, rx) = unbounded::<ControlMessage>();

        let join = std::thread::Builder::new()
            .name("hopgate-control".into())
            .spawn(move || {
                tracing::debug!("control thread started");
                for message in rx.iter() {
                    handle.handle_message(&message);
                }
                tracing::debug!("control thread stopped");
            })?;

        Ok((Self { tx }, join))
    }

    /// Queue `message` for the control thread.
    ///
    /// Fails with [`Error::ControlClosed`] only if that thread has panicked;
    /// while any port exists it otherwise keeps receiving.
    pub fn post(&self, message: ControlMessage) -> Result<()> {
        self.tx.send(message).map_err(|_| Error::ControlClosed)
    }

    pub fn post_json(&self, payload: &str) -> Result<()> {
        self.post(ControlMessage::from_json(payload)?)
    }

    /// Messages posted but not yet applied.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}
