//! Application layer containing the relay orchestration.
//!
//! This module defines the `RelayPolicy`, the single entry point used by the
//! ingress to forward an event: primary destination first, secondary only on
//! failure, and a single `RelayResult` describing what happened.

pub mod relay;
