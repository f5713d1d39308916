//! RoomOSC GW - OSC bridge to a room-conferencing controller
//!
//! Outbound, room commands are encoded and sent fire-and-forget to the
//! controller's command port. Inbound, telemetry datagrams are decoded,
//! routed by address and assembled into a registry of rooms that drives
//! display variables and feedback predicates.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod feedback;
pub mod notifier;
pub mod osc;
pub mod router;
pub mod session;
pub mod sniffer;
pub mod state;
pub mod transport;
pub mod variables;

pub use error::{CodecError, TransportError};
pub use session::{Session, SessionHooks, SessionRequest};
