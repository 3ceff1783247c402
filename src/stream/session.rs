// Output session: the init/receive/cleanup handle an acquisition frontend
// drives.
//
// Wraps a VcdEncoder so that calls made before `init()` or after
// `cleanup()` are reported as errors instead of being unrepresentable.

use log::debug;

use crate::vcd::{AcquisitionInfo, ConfigError, EncodeError, EncodeStats, VcdEncoder, VcdOptions};

use super::packet::Packet;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("output session is not initialized")]
    NotInitialized,
    #[error("output session is already initialized")]
    AlreadyInitialized,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

// ---------------------------------------------------------------------------
// OutputSession
// ---------------------------------------------------------------------------

/// Exclusively owned handle for one VCD capture session.
#[derive(Debug, Default)]
pub struct OutputSession {
    encoder: Option<VcdEncoder>,
}

impl OutputSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the encoder. Nothing may be received until this succeeds.
    pub fn init(&mut self, info: &AcquisitionInfo, opts: VcdOptions) -> Result<(), SessionError> {
        if self.encoder.is_some() {
            return Err(SessionError::AlreadyInitialized);
        }
        self.encoder = Some(VcdEncoder::new(info, opts)?);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn encoder(&self) -> Option<&VcdEncoder> {
        self.encoder.as_ref()
    }

    /// Feed one packet. Logic packets return their VCD text; all other
    /// packet kinds return `None`.
    pub fn receive(&mut self, packet: &Packet<'_>) -> Result<Option<String>, SessionError> {
        let encoder = self.encoder.as_mut().ok_or(SessionError::NotInitialized)?;
        match *packet {
            Packet::Logic { data, unit_size } => Ok(Some(encoder.process_frame(data, unit_size)?)),
            ref other => {
                debug!("ignoring {} packet", other.kind());
                Ok(None)
            }
        }
    }

    /// Release the encoder and return its statistics.
    pub fn cleanup(&mut self) -> Result<EncodeStats, SessionError> {
        let encoder = self.encoder.take().ok_or(SessionError::NotInitialized)?;
        Ok(encoder.finish())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
