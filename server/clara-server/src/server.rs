use std::sync::Arc;
use std::time::Instant;

use clinical_audit::{AuditResult, OracleConfig, OracleGateway};

/// Base64 and JSON envelope headroom on top of the decoded audio cap.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Main CLARA server state
#[derive(Clone)]
pub struct ClaraServer {
    gateway: Arc<OracleGateway>,
    started_at: Instant,
}

impl ClaraServer {
    /// # Errors
    ///
    /// Propagates invalid oracle configuration.
    pub fn new(config: OracleConfig) -> AuditResult<Self> {
        Ok(Self::with_gateway(Arc::new(OracleGateway::new(config)?)))
    }

    pub fn with_gateway(gateway: Arc<OracleGateway>) -> Self {
        Self {
            gateway,
            started_at: Instant::now(),
        }
    }

    pub fn gateway(&self) -> &OracleGateway {
        &self.gateway
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Largest accepted request body: the audio cap once base64-encoded,
    /// plus envelope headroom.
    pub fn body_limit(&self) -> usize {
        let max_audio = self.gateway.config().max_audio_bytes;
        max_audio.div_ceil(3).saturating_mul(4).saturating_add(BODY_OVERHEAD_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_encoded_audio() {
        let mut config = OracleConfig::default();
        config.max_audio_bytes = 3 * 1024;
        let server = ClaraServer::new(config).unwrap();
        assert_eq!(server.body_limit(), 4 * 1024 + BODY_OVERHEAD_BYTES);
    }
}
