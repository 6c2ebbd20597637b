//! Adapters implementing the domain ports.

pub mod http_delivery;
pub mod in_memory;
pub mod signature;
