//! Domain layer: the relayed event, delivery outcomes and the ports the
//! application layer depends on.

pub mod delivery;
pub mod event;
pub mod ports;
