//! Room command catalog
//!
//! Every room-targeted command the controller accepts, with the arguments
//! that follow the target value. An omitted number falls back to its default
//! and an omitted text argument is sent as an empty string.

use std::fmt;

use super::{RoomCommand, TargetSelector};
use crate::osc::OscArg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Meeting,
    Ndi,
    Hwio,
    Dante,
    Devices,
    Overlays,
    Share,
    Room,
}

impl CommandGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandGroup::Meeting => "meeting",
            CommandGroup::Ndi => "ndi",
            CommandGroup::Hwio => "hwio",
            CommandGroup::Dante => "dante",
            CommandGroup::Devices => "devices",
            CommandGroup::Overlays => "overlays",
            CommandGroup::Share => "share",
            CommandGroup::Room => "room",
        }
    }
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Number { default: i32, min: i32, max: i32 },
}

/// One positional argument after the target value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    /// Typed argument for a raw console value, or the default when omitted
    pub fn resolve(&self, value: Option<&str>) -> Result<OscArg, String> {
        match (self.kind, value) {
            (ParamKind::Text, value) => Ok(OscArg::Str(value.unwrap_or_default().to_string())),
            (ParamKind::Number { default, .. }, None) => Ok(OscArg::Int(default)),
            (ParamKind::Number { min, max, .. }, Some(raw)) => {
                let n: i32 = raw
                    .parse()
                    .map_err(|_| format!("{} expects a number, got '{}'", self.id, raw))?;
                if !(min..=max).contains(&n) {
                    return Err(format!("{} must be between {} and {}", self.id, min, max));
                }
                Ok(OscArg::Int(n))
            }
        }
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::Text => write!(f, "<{}>", self.id),
            ParamKind::Number { default, .. } => write!(f, "[{}={}]", self.id, default),
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub group: CommandGroup,
    pub params: &'static [ParamSpec],
}

impl CommandSpec {
    /// Build the command for `target` from positional console values
    pub fn build(&self, target: TargetSelector, values: &[&str]) -> Result<RoomCommand, String> {
        if values.len() > self.params.len() {
            return Err(format!(
                "{} takes at most {} argument(s): {}",
                self.name,
                self.params.len(),
                self.usage()
            ));
        }

        let args = self
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| param.resolve(values.get(i).copied()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoomCommand::new(target, self.name).with_args(args))
    }

    /// Argument synopsis, e.g. `[channel_num=1] <zoom_username>`
    pub fn usage(&self) -> String {
        self.params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Find a command by name, ignoring ASCII case
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    CATALOG.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}

const fn text(id: &'static str, label: &'static str) -> ParamSpec {
    ParamSpec {
        id,
        label,
        kind: ParamKind::Text,
    }
}

const fn number(id: &'static str, label: &'static str, default: i32, min: i32, max: i32) -> ParamSpec {
    ParamSpec {
        id,
        label,
        kind: ParamKind::Number { default, min, max },
    }
}

const fn index(id: &'static str, label: &'static str) -> ParamSpec {
    number(id, label, 0, 0, 99)
}

const CHANNEL: ParamSpec = number("channel_num", "Channel", 1, 1, 64);
const ZOOM_USERNAME: ParamSpec = text("zoom_username", "Zoom username");
const CAMERA_NAME: ParamSpec = text("camera_name", "Camera name");
const CAMERA_DEVICE_NAME: ParamSpec = text("camera_device_name", "Camera device name");
const NEW_CAMERA_DISPLAY_NAME: ParamSpec = text("new_camera_display_name", "New display name");
const CZR_ID: ParamSpec = text("czr_id", "Companion room ID");

macro_rules! cmd {
    ($name:expr, $label:expr, $group:expr, $params:expr $(,)?) => {
        CommandSpec {
            name: $name,
            label: $label,
            group: $group,
            params: $params,
        }
    };
}

use CommandGroup::*;

pub static CATALOG: &[CommandSpec] = &[
    cmd!(
        "joinMeeting",
        "Join meeting",
        Meeting,
        &[
            text("meetingID", "Meeting ID"),
            text("meetingPass", "Meeting password"),
            text("userName", "User name"),
        ],
    ),
    cmd!("startMeeting", "Start meeting", Meeting, &[]),
    cmd!("leaveMeeting", "Leave meeting", Meeting, &[]),
    // NDI
    cmd!("setNDIContentOff", "NDI: Set content off", Ndi, &[CHANNEL]),
    cmd!("setNDIContentParticipant", "NDI: Set content to participant", Ndi, &[CHANNEL]),
    cmd!("setNDIContentActiveSpeaker", "NDI: Set content to active speaker", Ndi, &[CHANNEL]),
    cmd!("setNDIContentGallery", "NDI: Set content to gallery", Ndi, &[CHANNEL]),
    cmd!("setNDIContentScreenshare", "NDI: Set content to screenshare", Ndi, &[CHANNEL]),
    cmd!("setNDIContentSpotlight", "NDI: Set content to spotlight", Ndi, &[CHANNEL]),
    cmd!("setNDIContentPinGroup", "NDI: Set content to pin group", Ndi, &[CHANNEL]),
    cmd!(
        "setNDIParticipantSelection",
        "NDI: Select participant",
        Ndi,
        &[CHANNEL, text("exact_zoom_username", "Zoom username")],
    ),
    cmd!(
        "setNDIGallerySelection",
        "NDI: Select gallery",
        Ndi,
        &[CHANNEL, index("gallery_index", "Gallery index")],
    ),
    cmd!(
        "setNDIScreenshareSelection",
        "NDI: Select screenshare",
        Ndi,
        &[CHANNEL, index("screenshare_index", "Screenshare index")],
    ),
    cmd!(
        "setNDIPinGroupSelection",
        "NDI: Select pin group",
        Ndi,
        &[CHANNEL, index("pin_group_index", "Pin group index")],
    ),
    cmd!("getNDIChannelConfig", "NDI: Get channel config", Ndi, &[CHANNEL]),
    cmd!("getNDIChannelCount", "NDI: Get channel count", Ndi, &[]),
    // HWIO
    cmd!("setHWIOMode", "HWIO: Set mode", Hwio, &[CHANNEL, index("mode_index", "Mode index")]),
    cmd!(
        "setHWIOInputSelection",
        "HWIO: Set input selection",
        Hwio,
        &[CHANNEL, index("video_index", "Video index")],
    ),
    cmd!("setHWIOContentOff", "HWIO: Content off", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentTestSignal", "HWIO: Content test signal", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentParticipant", "HWIO: Content participant", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentActiveSpeaker", "HWIO: Content active speaker", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentGallery", "HWIO: Content gallery", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentScreenshare", "HWIO: Content screenshare", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentSpotlight", "HWIO: Content spotlight", Hwio, &[CHANNEL]),
    cmd!("setHWIOContentPinGroup", "HWIO: Content pin group", Hwio, &[CHANNEL]),
    cmd!(
        "setHWIOResolutionFrameRate",
        "HWIO: Set resolution/framerate",
        Hwio,
        &[CHANNEL, text("resolution_framerate", "Resolution/framerate")],
    ),
    cmd!(
        "setHWIOAudioMix",
        "HWIO: Set audio mix",
        Hwio,
        &[CHANNEL, index("setting_index", "Setting index")],
    ),
    cmd!("setHWIOParticipantSelection", "HWIO: Select participant", Hwio, &[CHANNEL, ZOOM_USERNAME]),
    cmd!(
        "setHWIOGallerySelection",
        "HWIO: Select gallery",
        Hwio,
        &[CHANNEL, index("gallery_index", "Gallery index")],
    ),
    cmd!(
        "setHWIOScreenshareSelection",
        "HWIO: Select screenshare",
        Hwio,
        &[CHANNEL, index("screenshare_index", "Screenshare index")],
    ),
    cmd!(
        "setHWIOPinGroupSelection",
        "HWIO: Select pin group",
        Hwio,
        &[CHANNEL, index("pin_group_index", "Pin group index")],
    ),
    cmd!("getHWIOChannelConfig", "HWIO: Get channel config", Hwio, &[CHANNEL]),
    cmd!("getHWIOChannelCount", "HWIO: Get channel count", Hwio, &[]),
    cmd!(
        "getHWIOSupportedResolutionFrameRate",
        "HWIO: Get supported resolution/framerate",
        Hwio,
        &[CHANNEL],
    ),
    // Dante
    cmd!("setDanteContentOff", "Dante: Content off", Dante, &[CHANNEL]),
    cmd!("setDanteContentParticipant", "Dante: Content participant", Dante, &[CHANNEL]),
    cmd!("setDanteContentMix", "Dante: Content mixed audio", Dante, &[CHANNEL]),
    cmd!("setDanteContentScreenshare", "Dante: Content screenshare", Dante, &[CHANNEL]),
    cmd!(
        "setDanteParticipantSelection",
        "Dante: Select participant",
        Dante,
        &[CHANNEL, ZOOM_USERNAME],
    ),
    cmd!("getDanteChannelConfig", "Dante: Get channel config", Dante, &[CHANNEL]),
    cmd!("getDanteChannelCount", "Dante: Get channel count", Dante, &[]),
    // Devices
    cmd!("setRoomMic", "Set room mic", Devices, &[text("mic_name", "Mic name")]),
    cmd!("setRoomMainCamera", "Set main camera", Devices, &[CAMERA_NAME]),
    cmd!("setRoomMultiCameraOn", "Set multi-camera on", Devices, &[CAMERA_NAME]),
    cmd!("setRoomMultiCameraOff", "Set multi-camera off", Devices, &[CAMERA_NAME]),
    cmd!("setRoomSpeaker", "Set room speaker", Devices, &[text("speaker_name", "Speaker name")]),
    cmd!("getRoomMicList", "Get room mic list", Devices, &[]),
    cmd!("getRoomCameraList", "Get room camera list", Devices, &[]),
    cmd!("getRoomSpeakerList", "Get room speaker list", Devices, &[]),
    cmd!("muteMic", "Mute mic", Devices, &[]),
    cmd!("unMuteMic", "Unmute mic", Devices, &[]),
    cmd!("startCamera", "Start camera", Devices, &[]),
    cmd!("stopCamera", "Stop camera", Devices, &[]),
    cmd!("getSelectedPrimaryCamera", "Get selected primary camera", Devices, &[]),
    cmd!("getSelectedMultiCameras", "Get selected multi cameras", Devices, &[]),
    cmd!("getSelectedMic", "Get selected mic", Devices, &[]),
    cmd!("getSelectedSpeaker", "Get selected speaker", Devices, &[]),
    cmd!(
        "setCameraDisplayName",
        "Set camera display name",
        Devices,
        &[CAMERA_DEVICE_NAME, NEW_CAMERA_DISPLAY_NAME],
    ),
    // Overlays
    cmd!(
        "setNameTagAlignment",
        "Set name tag alignment",
        Overlays,
        &[number("location_index", "Location (1=left, 2=center, 3=right)", 2, 1, 3)],
    ),
    cmd!("enableNameTagOverlay", "Enable name tag overlay", Overlays, &[]),
    cmd!("disableNameTagOverlay", "Disable name tag overlay", Overlays, &[]),
    cmd!("enableEmojiOverlay", "Enable emoji overlay", Overlays, &[]),
    cmd!("disableEmojiOverlay", "Disable emoji overlay", Overlays, &[]),
    cmd!("enableHandRaiseOverlay", "Enable hand raise overlay", Overlays, &[]),
    cmd!("disableHandRaiseOverlay", "Disable hand raise overlay", Overlays, &[]),
    cmd!("enableActiveSpeakerOverlay", "Enable active speaker overlay", Overlays, &[]),
    cmd!("disableActiveSpeakerOverlay", "Disable active speaker overlay", Overlays, &[]),
    cmd!("getOverlaySettings", "Get overlay settings", Overlays, &[]),
    // Content share
    cmd!("startDeviceShare", "Start device share", Share, &[]),
    cmd!("startCameraShare", "Start camera share", Share, &[CAMERA_NAME]),
    cmd!("stopShare", "Stop share", Share, &[]),
    // Room and participants
    cmd!("getRoomInfo", "Get room info", Room, &[]),
    cmd!("getParticipantCount", "Get participant count", Room, &[]),
    cmd!("getMeetingStatus", "Get meeting status", Room, &[]),
    cmd!(
        "activateCameraPreset",
        "Activate camera preset",
        Room,
        &[number("preset_index", "Preset index", 1, 1, 99)],
    ),
    cmd!("pairRoom", "Pair room", Room, &[]),
    cmd!("unPairRoom", "Unpair room", Room, &[]),
    cmd!(
        "renameParticipant",
        "Rename participant",
        Room,
        &[text("current_name", "Current name"), text("new_name", "New name")],
    ),
    cmd!("setActiveSpeakerSelf", "Set active speaker (self)", Room, &[]),
    cmd!(
        "setActiveSpeakerChild",
        "Set active speaker (participant)",
        Room,
        &[text("participant_name", "Participant name")],
    ),
    cmd!("getCompanionRoomList", "Get companion room list", Room, &[]),
    cmd!("getCompanionRoomCameraList", "Get companion room camera list", Room, &[CZR_ID]),
    cmd!(
        "setCompanionRoomCameraDisplayName",
        "Set companion room camera display name",
        Room,
        &[CZR_ID, CAMERA_DEVICE_NAME, NEW_CAMERA_DISPLAY_NAME],
    ),
    cmd!(
        "setCompanionRoomCameraOff",
        "Set companion room camera off",
        Room,
        &[CZR_ID, CAMERA_DEVICE_NAME],
    ),
    cmd!(
        "setCompanionRoomCameraOn",
        "Set companion room camera on",
        Room,
        &[CZR_ID, CAMERA_DEVICE_NAME],
    ),
];
