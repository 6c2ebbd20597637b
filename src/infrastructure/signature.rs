use crate::domain::event::Event;
use crate::domain::ports::SignatureVerifier;
use crate::error::{RelayError, Result};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Accepts every event without checking its checksum.
///
/// Only meant for setups where no events secret is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

impl SignatureVerifier for NoVerification {
    fn verify(&self, event: &Event) -> Result<()> {
        warn!(
            transaction_id = %event.transaction.id,
            "Signature not verified: no events secret configured"
        );
        Ok(())
    }
}

/// Verifies the gateway's event checksum.
///
/// The checksum is the hex SHA-256 of the signed property values (in the
/// order listed by `signature.properties`), followed by the event timestamp
/// and the events secret.
pub struct ChecksumVerifier {
    secret: String,
}

impl ChecksumVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the expected checksum for `event`.
    pub fn checksum(&self, event: &Event) -> Result<String> {
        let mut hasher = Sha256::new();

        for property in &event.signature.properties {
            let value = event.property_value(property).ok_or_else(|| {
                RelayError::Signature(format!("unknown or missing signed property '{property}'"))
            })?;
            hasher.update(value.as_bytes());
        }

        let timestamp = event
            .timestamp
            .ok_or_else(|| RelayError::Signature("missing timestamp".to_string()))?;
        hasher.update(timestamp.to_string().as_bytes());
        hasher.update(self.secret.as_bytes());

        Ok(hex::encode(hasher.finalize()))
    }
}

impl SignatureVerifier for ChecksumVerifier {
    fn verify(&self, event: &Event) -> Result<()> {
        let received = event
            .signature
            .checksum
            .as_deref()
            .ok_or_else(|| RelayError::Signature("missing checksum".to_string()))?
            .to_ascii_lowercase();
        let expected = self.checksum(event)?;

        if bool::from(expected.as_bytes().ct_eq(received.as_bytes())) {
            debug!(transaction_id = %event.transaction.id, "Signature verified");
            Ok(())
        } else {
            Err(RelayError::Signature("checksum mismatch".to_string()))
        }
    }
}
