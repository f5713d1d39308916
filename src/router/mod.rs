//! Router module - dispatches inbound OSC telemetry to state updates
//!
//! The router strips the configured output header from each inbound address
//! and matches the remaining route key against the route table:
//! - Global routes (room counts, list rebuild fragments) act on the registry
//! - Anything else is a per-room route carrying a `(roomID, roomName, roomIndex)`
//!   prefix; unknown per-room keys still refresh the room's identity

mod routes;

pub use routes::{lookup, GlobalRoute, Handler, RoomRoute, ROOM_PAYLOAD};


use tracing::{debug, trace};

use crate::osc::{arg_int, arg_str, normalize_path, InboundMessage};
use crate::state::Registry;

/// Outcome of routing one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Address outside the output header; dropped silently
    Foreign,
    /// Malformed or incomplete message; nothing was written
    Ignored,
    /// Registry touched without a committed change (pending list slot,
    /// identity refresh on an unknown or empty-payload room route)
    Unchanged,
    /// State changed; observers must be notified
    Committed,
}

impl Dispatch {
    pub fn should_notify(&self) -> bool {
        matches!(self, Dispatch::Committed)
    }
}

/// Inbound address router
#[derive(Debug, Clone)]
pub struct Router {
    output_header: String,
}

impl Router {
    /// Create a router for the given output header (a leading `/` is added if missing)
    pub fn new(output_header: &str) -> Self {
        Self {
            output_header: normalize_path(output_header),
        }
    }

    pub fn output_header(&self) -> &str {
        &self.output_header
    }

    /// Route key of an address, or `None` if it is outside the header
    pub fn route_key<'a>(&self, address: &'a str) -> Option<&'a str> {
        address
            .strip_prefix(self.output_header.as_str())
            .map(|rest| rest.trim_start_matches('/'))
    }

    /// Apply one inbound message to the registry
    pub fn dispatch(&self, registry: &mut Registry, msg: &InboundMessage) -> Dispatch {
        let Some(key) = self.route_key(&msg.address) else {
            trace!(address = %msg.address, "Address outside output header, dropping");
            return Dispatch::Foreign;
        };
        if key.is_empty() {
            return Dispatch::Ignored;
        }

        match lookup(key) {
            Some(Handler::Global(route, handler)) => handler(route, registry, &msg.args),
            Some(Handler::Room(route)) => Self::dispatch_room(registry, key, Some(route), msg),
            None => Self::dispatch_room(registry, key, None, msg),
        }
    }

    fn dispatch_room(
        registry: &mut Registry,
        key: &str,
        route: Option<RoomRoute>,
        msg: &InboundMessage,
    ) -> Dispatch {
        let room_id = match arg_str(&msg.args, 0) {
            Some(id) if !id.is_empty() => id,
            _ => {
                debug!(route = key, "Room message without room id, ignoring");
                return Dispatch::Ignored;
            }
        };
        let room_name = arg_str(&msg.args, 1);
        let room_index = arg_int(&msg.args, 2);

        let room = registry.upsert_room(&room_id, room_name, room_index);

        let Some(route) = route else {
            debug!(route = key, room = %room_id, "Unknown room route, identity refreshed only");
            return Dispatch::Unchanged;
        };

        match route.extract(&msg.args) {
            Some(attribute) => {
                debug!(route = key, room = %room_id, ?attribute, "Room attribute updated");
                room.apply(attribute);
                Dispatch::Committed
            }
            None => Dispatch::Unchanged,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_OUTPUT_HEADER)
    }
}
