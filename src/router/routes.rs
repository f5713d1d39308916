//! Route table - maps route keys to typed state-update handlers
//!
//! Global routes act on the registry as a whole (counts and list rebuilds).
//! Room routes decode one attribute from the payload that follows the
//! `(roomID, roomName, roomIndex)` prefix.

use once_cell::sync::Lazy;
use rosc::OscType;
use std::collections::HashMap;
use tracing::debug;

use super::Dispatch;
use crate::osc::{arg_bool, arg_int, arg_str};
use crate::state::{ListKind, ListUpdate, Registry, RoomAttribute};

/// Position of the first payload argument on room routes
pub const ROOM_PAYLOAD: usize = 3;

/// Routes that address the registry as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalRoute {
    AddedRoomsCount,
    PairedRoomsCount,
    AddedRoomsList,
    PairedRoomsList,
}

impl GlobalRoute {
    pub const ALL: [GlobalRoute; 4] = [
        GlobalRoute::AddedRoomsCount,
        GlobalRoute::PairedRoomsCount,
        GlobalRoute::AddedRoomsList,
        GlobalRoute::PairedRoomsList,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            GlobalRoute::AddedRoomsCount => "addedRoomsCount",
            GlobalRoute::PairedRoomsCount => "pairedRoomsCount",
            GlobalRoute::AddedRoomsList => "addedRoomsList",
            GlobalRoute::PairedRoomsList => "pairedRoomsList",
        }
    }

    pub fn list_kind(&self) -> ListKind {
        match self {
            GlobalRoute::AddedRoomsCount | GlobalRoute::AddedRoomsList => ListKind::Added,
            GlobalRoute::PairedRoomsCount | GlobalRoute::PairedRoomsList => ListKind::Paired,
        }
    }

    fn handler(&self) -> GlobalHandler {
        match self {
            GlobalRoute::AddedRoomsCount | GlobalRoute::PairedRoomsCount => handle_count,
            GlobalRoute::AddedRoomsList | GlobalRoute::PairedRoomsList => handle_list_fragment,
        }
    }
}

/// Routes that update one attribute of one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomRoute {
    MeetingStatus,
    ParticipantCount,
    MuteStatus,
    CameraStatus,
    SelectedPrimaryCamera,
    SelectedMic,
    SelectedSpeaker,
}

impl RoomRoute {
    pub const ALL: [RoomRoute; 7] = [
        RoomRoute::MeetingStatus,
        RoomRoute::ParticipantCount,
        RoomRoute::MuteStatus,
        RoomRoute::CameraStatus,
        RoomRoute::SelectedPrimaryCamera,
        RoomRoute::SelectedMic,
        RoomRoute::SelectedSpeaker,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RoomRoute::MeetingStatus => "meetingStatus",
            RoomRoute::ParticipantCount => "participantCount",
            RoomRoute::MuteStatus => "muteStatus",
            RoomRoute::CameraStatus => "cameraStatus",
            RoomRoute::SelectedPrimaryCamera => "selectedPrimaryCamera",
            RoomRoute::SelectedMic => "selectedMic",
            RoomRoute::SelectedSpeaker => "selectedSpeaker",
        }
    }

    /// Decode the attribute payload; `None` when absent or unparseable
    pub fn extract(&self, args: &[OscType]) -> Option<RoomAttribute> {
        let p = ROOM_PAYLOAD;
        match self {
            RoomRoute::MeetingStatus => arg_str(args, p).map(RoomAttribute::MeetingStatus),
            RoomRoute::ParticipantCount => arg_int(args, p).map(RoomAttribute::ParticipantCount),
            RoomRoute::MuteStatus => arg_bool(args, p).map(RoomAttribute::MuteStatus),
            RoomRoute::CameraStatus => arg_bool(args, p).map(RoomAttribute::CameraStatus),
            RoomRoute::SelectedPrimaryCamera => {
                arg_str(args, p).map(RoomAttribute::SelectedPrimaryCamera)
            }
            RoomRoute::SelectedMic => arg_str(args, p).map(RoomAttribute::SelectedMic),
            RoomRoute::SelectedSpeaker => arg_str(args, p).map(RoomAttribute::SelectedSpeaker),
        }
    }
}

pub type GlobalHandler = fn(GlobalRoute, &mut Registry, &[OscType]) -> Dispatch;

/// Registered handler for a route key
#[derive(Clone, Copy)]
pub enum Handler {
    Global(GlobalRoute, GlobalHandler),
    Room(RoomRoute),
}

static ROUTES: Lazy<HashMap<&'static str, Handler>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for route in GlobalRoute::ALL {
        table.insert(route.key(), Handler::Global(route, route.handler()));
    }
    for route in RoomRoute::ALL {
        table.insert(route.key(), Handler::Room(route));
    }
    table
});

/// Look up the handler registered for an exact route key
pub fn lookup(key: &str) -> Option<Handler> {
    ROUTES.get(key).copied()
}

/// `[count]`
fn handle_count(route: GlobalRoute, registry: &mut Registry, args: &[OscType]) -> Dispatch {
    match arg_int(args, 0).and_then(|n| u32::try_from(n).ok()) {
        Some(count) => {
            registry.set_count(route.list_kind(), count);
            debug!(route = route.key(), count, "Room count updated");
            Dispatch::Committed
        }
        None => Dispatch::Ignored,
    }
}

/// `[maxList, index, roomID, roomName]`
fn handle_list_fragment(route: GlobalRoute, registry: &mut Registry, args: &[OscType]) -> Dispatch {
    let max_list = arg_int(args, 0);
    let (Some(index), Some(id), Some(name)) = (arg_int(args, 1), arg_str(args, 2), arg_str(args, 3))
    else {
        return Dispatch::Ignored;
    };

    match registry.apply_list_fragment(route.list_kind(), max_list, index, id, name) {
        ListUpdate::Completed => {
            debug!(
                route = route.key(),
                len = registry.list(route.list_kind()).len(),
                "Room list rebuild complete"
            );
            Dispatch::Committed
        }
        ListUpdate::Pending => Dispatch::Unchanged,
        ListUpdate::Rejected => Dispatch::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_registered() {
        for route in GlobalRoute::ALL {
            assert!(matches!(lookup(route.key()), Some(Handler::Global(r, _)) if r == route));
        }
        for route in RoomRoute::ALL {
            assert!(matches!(lookup(route.key()), Some(Handler::Room(r)) if r == route));
        }
        assert!(lookup("overlayConfig").is_none());
        assert!(lookup("MuteStatus").is_none());
    }

    #[test]
    fn test_extract_reads_payload_position() {
        let args = vec![
            OscType::String("r1".into()),
            OscType::String("Room One".into()),
            OscType::Int(1),
            OscType::Int(7),
        ];
        assert_eq!(
            RoomRoute::ParticipantCount.extract(&args),
            Some(RoomAttribute::ParticipantCount(7))
        );
        assert_eq!(
            RoomRoute::MeetingStatus.extract(&args),
            Some(RoomAttribute::MeetingStatus("7".into()))
        );
        assert_eq!(RoomRoute::MuteStatus.extract(&args[..3]), None);
    }
}
