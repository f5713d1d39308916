//! Outbound command builder
//!
//! Room-targeted commands are addressed `/<namespace>/<target>/<command>`, with
//! the target value (if any) as the first argument. Global queries have no
//! target segment. The `catalog` module lists every room command with its
//! typed arguments.

pub mod catalog;

use std::fmt;
use std::str::FromStr;

use crate::osc::OscArg;

pub use catalog::{CommandGroup, CommandSpec, ParamKind, ParamSpec, CATALOG};

/// Default outbound namespace
pub const DEFAULT_NAMESPACE: &str = "zoomRooms";

/// Which room(s) a command addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    RoomId(String),
    RoomName(String),
    /// 1-based position in the device's room list
    RoomIndex(i32),
    AllRooms,
}

impl TargetSelector {
    /// Address segment naming the target type
    pub fn segment(&self) -> &'static str {
        match self {
            TargetSelector::RoomId(_) => "roomID",
            TargetSelector::RoomName(_) => "roomName",
            TargetSelector::RoomIndex(_) => "roomIndex",
            TargetSelector::AllRooms => "allRooms",
        }
    }

    /// Leading argument carrying the target value
    pub fn argument(&self) -> Option<OscArg> {
        match self {
            TargetSelector::RoomId(id) => Some(OscArg::Str(id.clone())),
            TargetSelector::RoomName(name) => Some(OscArg::Str(name.clone())),
            TargetSelector::RoomIndex(index) => Some(OscArg::Int(*index)),
            TargetSelector::AllRooms => None,
        }
    }

    /// Build a selector from a target type segment and its value
    pub fn parse(segment: &str, value: Option<&str>) -> Result<Self, String> {
        match (segment, value) {
            ("roomID", Some(id)) => Ok(TargetSelector::RoomId(id.to_string())),
            ("roomName", Some(name)) => Ok(TargetSelector::RoomName(name.to_string())),
            ("roomIndex", Some(raw)) => raw
                .parse::<i32>()
                .map(TargetSelector::RoomIndex)
                .map_err(|_| format!("Invalid room index '{}'", raw)),
            ("allRooms", _) => Ok(TargetSelector::AllRooms),
            ("roomID" | "roomName" | "roomIndex", None) => {
                Err(format!("Target '{}' needs a value", segment))
            }
            _ => Err(format!("Unknown target type '{}'", segment)),
        }
    }

    /// Whether this target type takes a value argument
    pub fn takes_value(segment: &str) -> bool {
        matches!(segment, "roomID" | "roomName" | "roomIndex")
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(arg) => write!(f, "{}={}", self.segment(), arg),
            None => f.write_str(self.segment()),
        }
    }
}

/// A ready-to-send `(path, args)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub path: String,
    pub args: Vec<OscArg>,
}

/// A command addressed to one or more rooms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCommand {
    pub target: TargetSelector,
    pub command: String,
    pub args: Vec<OscArg>,
}

impl RoomCommand {
    pub fn new(target: TargetSelector, command: impl Into<String>) -> Self {
        Self {
            target,
            command: command.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<OscArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = OscArg>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn join_meeting(target: TargetSelector, meeting_id: &str, meeting_pass: &str, user_name: &str) -> Self {
        Self::new(target, "joinMeeting")
            .with_arg(meeting_id)
            .with_arg(meeting_pass)
            .with_arg(user_name)
    }

    pub fn start_meeting(target: TargetSelector) -> Self {
        Self::new(target, "startMeeting")
    }

    pub fn leave_meeting(target: TargetSelector) -> Self {
        Self::new(target, "leaveMeeting")
    }

    pub fn mute_mic(target: TargetSelector) -> Self {
        Self::new(target, "muteMic")
    }

    pub fn unmute_mic(target: TargetSelector) -> Self {
        Self::new(target, "unMuteMic")
    }

    pub fn start_camera(target: TargetSelector) -> Self {
        Self::new(target, "startCamera")
    }

    pub fn stop_camera(target: TargetSelector) -> Self {
        Self::new(target, "stopCamera")
    }

    /// Address and arguments under the given namespace
    pub fn to_message(&self, namespace: &str) -> OutboundMessage {
        let mut args: Vec<OscArg> = self.target.argument().into_iter().collect();
        args.extend(self.args.iter().cloned());
        OutboundMessage {
            path: format!(
                "/{}/{}/{}",
                namespace.trim_matches('/'),
                self.target.segment(),
                self.command
            ),
            args,
        }
    }
}

/// Registry queries the device answers with telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalQuery {
    AddedRoomList,
    PairedRoomList,
    AddedRoomCount,
    PairedRoomCount,
}

impl GlobalQuery {
    pub const ALL: [GlobalQuery; 4] = [
        GlobalQuery::AddedRoomList,
        GlobalQuery::PairedRoomList,
        GlobalQuery::AddedRoomCount,
        GlobalQuery::PairedRoomCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalQuery::AddedRoomList => "addedRoomList",
            GlobalQuery::PairedRoomList => "pairedRoomList",
            GlobalQuery::AddedRoomCount => "addedRoomCount",
            GlobalQuery::PairedRoomCount => "pairedRoomCount",
        }
    }

    pub fn to_message(&self, namespace: &str) -> OutboundMessage {
        let (first, rest) = self.as_str().split_at(1);
        OutboundMessage {
            path: format!(
                "/{}/get{}{}",
                namespace.trim_matches('/'),
                first.to_uppercase(),
                rest
            ),
            args: Vec::new(),
        }
    }
}

impl FromStr for GlobalQuery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlobalQuery::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown query '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_by_index() {
        let msg = RoomCommand::mute_mic(TargetSelector::RoomIndex(3)).to_message(DEFAULT_NAMESPACE);
        assert_eq!(msg.path, "/zoomRooms/roomIndex/muteMic");
        assert_eq!(msg.args, vec![OscArg::Int(3)]);
    }

    #[test]
    fn test_target_arguments() {
        let msg = RoomCommand::unmute_mic(TargetSelector::RoomId("r1".into())).to_message("zoomRooms");
        assert_eq!(msg.path, "/zoomRooms/roomID/unMuteMic");
        assert_eq!(msg.args, vec![OscArg::Str("r1".into())]);

        let msg = RoomCommand::start_camera(TargetSelector::AllRooms).to_message("/zoomRooms/");
        assert_eq!(msg.path, "/zoomRooms/allRooms/startCamera");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_join_meeting_argument_order() {
        let msg = RoomCommand::join_meeting(TargetSelector::RoomName("Board".into()), "123", "pw", "Ops")
            .to_message(DEFAULT_NAMESPACE);
        assert_eq!(msg.path, "/zoomRooms/roomName/joinMeeting");
        assert_eq!(
            msg.args,
            vec![
                OscArg::Str("Board".into()),
                OscArg::Str("123".into()),
                OscArg::Str("pw".into()),
                OscArg::Str("Ops".into()),
            ]
        );
    }

    #[test]
    fn test_global_queries() {
        let paths: Vec<String> = GlobalQuery::ALL
            .iter()
            .map(|q| q.to_message(DEFAULT_NAMESPACE).path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "/zoomRooms/getAddedRoomList",
                "/zoomRooms/getPairedRoomList",
                "/zoomRooms/getAddedRoomCount",
                "/zoomRooms/getPairedRoomCount",
            ]
        );
        assert_eq!("pairedroomcount".parse::<GlobalQuery>(), Ok(GlobalQuery::PairedRoomCount));
        assert!("rooms".parse::<GlobalQuery>().is_err());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(TargetSelector::parse("roomIndex", Some("2")), Ok(TargetSelector::RoomIndex(2)));
        assert_eq!(TargetSelector::parse("allRooms", None), Ok(TargetSelector::AllRooms));
        assert!(TargetSelector::parse("roomIndex", Some("two")).is_err());
        assert!(TargetSelector::parse("roomID", None).is_err());
        assert!(TargetSelector::parse("everyone", None).is_err());
        assert_eq!(TargetSelector::RoomIndex(3).to_string(), "roomIndex=3");
    }
}
