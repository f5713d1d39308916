//! OSC message codec
//!
//! Encodes outbound commands into OSC datagrams and decodes inbound packets
//! into an address plus typed arguments. Only the small subset of OSC the
//! device speaks is produced on the way out: strings, int32, and booleans
//! folded into int32 `1`/`0`.

use rosc::{OscMessage, OscPacket, OscType};
use std::fmt;

use crate::error::CodecError;

/// Receive buffer size for a single datagram
pub const MTU: usize = rosc::decoder::MTU;

/// Outbound argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscArg {
    Str(String),
    Int(i32),
    Bool(bool),
}

impl OscArg {
    /// Parse a command-line literal: `true`/`false`, an integer, or a string
    pub fn parse_literal(raw: &str) -> Self {
        match raw {
            "true" => OscArg::Bool(true),
            "false" => OscArg::Bool(false),
            _ => raw
                .parse::<i32>()
                .map(OscArg::Int)
                .unwrap_or_else(|_| OscArg::Str(raw.to_string())),
        }
    }

    /// Wire representation; booleans become int32 1/0
    pub fn to_osc(&self) -> OscType {
        match self {
            OscArg::Str(s) => OscType::String(s.clone()),
            OscArg::Int(n) => OscType::Int(*n),
            OscArg::Bool(b) => OscType::Int(i32::from(*b)),
        }
    }
}

impl From<&str> for OscArg {
    fn from(value: &str) -> Self {
        OscArg::Str(value.to_string())
    }
}

impl From<String> for OscArg {
    fn from(value: String) -> Self {
        OscArg::Str(value)
    }
}

impl From<i32> for OscArg {
    fn from(value: i32) -> Self {
        OscArg::Int(value)
    }
}

impl From<bool> for OscArg {
    fn from(value: bool) -> Self {
        OscArg::Bool(value)
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Str(s) => write!(f, "{:?}", s),
            OscArg::Int(n) => write!(f, "{}", n),
            OscArg::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A decoded inbound OSC message
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub address: String,
    pub args: Vec<OscType>,
}

impl InboundMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscType>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.address, format_args(&self.args))
    }
}

/// Ensure an OSC path starts with `/`
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Serialize a command into a single OSC message datagram
pub fn encode(path: &str, args: &[OscArg]) -> Result<Vec<u8>, CodecError> {
    let addr = normalize_path(path);
    let packet = OscPacket::Message(OscMessage {
        addr: addr.clone(),
        args: args.iter().map(OscArg::to_osc).collect(),
    });

    rosc::encoder::encode(&packet).map_err(|e| CodecError::Encode {
        path: addr,
        reason: format!("{:?}", e),
    })
}

/// Parse a datagram into its messages
///
/// A plain message yields one entry; a bundle yields its messages in order,
/// nested bundles flattened.
pub fn decode(buf: &[u8]) -> Result<Vec<InboundMessage>, CodecError> {
    if buf.is_empty() {
        return Err(CodecError::Decode("empty datagram".to_string()));
    }
    let (_, packet) =
        rosc::decoder::decode_udp(buf).map_err(|e| CodecError::Decode(format!("{:?}", e)))?;

    let mut messages = Vec::new();
    flatten(packet, &mut messages);
    Ok(messages)
}

fn flatten(packet: OscPacket, out: &mut Vec<InboundMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(InboundMessage::new(msg.addr, msg.args)),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

/// Read argument `i` as a string, coercing scalars to their decimal text
pub fn arg_str(args: &[OscType], i: usize) -> Option<String> {
    match args.get(i)? {
        OscType::String(s) => Some(s.clone()),
        OscType::Int(n) => Some(n.to_string()),
        OscType::Long(n) => Some(n.to_string()),
        OscType::Float(x) => Some(x.to_string()),
        OscType::Double(x) => Some(x.to_string()),
        OscType::Bool(b) => Some(b.to_string()),
        OscType::Char(c) => Some(c.to_string()),
        _ => None,
    }
}

/// Read argument `i` as an integer; strings are parsed, `None` if unparseable
pub fn arg_int(args: &[OscType], i: usize) -> Option<i64> {
    match args.get(i)? {
        OscType::Int(n) => Some(i64::from(*n)),
        OscType::Long(n) => Some(*n),
        OscType::Float(x) if x.is_finite() => Some(x.trunc() as i64),
        OscType::Double(x) if x.is_finite() => Some(x.trunc() as i64),
        OscType::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Read argument `i` as a boolean
///
/// Integers are `true` only when equal to 1, native booleans pass through,
/// and the strings `1`/`true`/`0`/`false` are accepted.
pub fn arg_bool(args: &[OscType], i: usize) -> Option<bool> {
    match args.get(i)? {
        OscType::Int(n) => Some(*n == 1),
        OscType::Long(n) => Some(*n == 1),
        OscType::Bool(b) => Some(*b),
        OscType::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Short type tag for an argument, as written in an OSC type tag string
pub fn type_tag(arg: &OscType) -> char {
    match arg {
        OscType::Int(_) => 'i',
        OscType::Float(_) => 'f',
        OscType::String(_) => 's',
        OscType::Blob(_) => 'b',
        OscType::Time(_) => 't',
        OscType::Long(_) => 'h',
        OscType::Double(_) => 'd',
        OscType::Char(_) => 'c',
        OscType::Color(_) => 'r',
        OscType::Midi(_) => 'm',
        OscType::Bool(true) => 'T',
        OscType::Bool(false) => 'F',
        OscType::Nil => 'N',
        OscType::Inf => 'I',
        OscType::Array(_) => '[',
    }
}

/// Format arguments for logs and the sniffer, e.g. `s:"r1", i:3`
pub fn format_args(args: &[OscType]) -> String {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let tag = type_tag(arg);
            match arg {
                OscType::String(s) => format!("{}:{:?}", tag, s),
                _ => match arg_str(args, i) {
                    Some(text) => format!("{}:{}", tag, text),
                    None => tag.to_string(),
                },
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roundtrip(path: &str, args: &[OscArg]) -> InboundMessage {
        let buf = encode(path, args).unwrap();
        let mut messages = decode(&buf).unwrap();
        assert_eq!(messages.len(), 1);
        messages.remove(0)
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("zoomRooms/allRooms/muteMic"), "/zoomRooms/allRooms/muteMic");
        assert_eq!(normalize_path("/roomosc"), "/roomosc");
    }

    #[test]
    fn test_bool_encoded_as_int() {
        let msg = roundtrip("/x/flag", &[OscArg::Bool(true), OscArg::Bool(false)]);
        assert_eq!(msg.args, vec![OscType::Int(1), OscType::Int(0)]);
    }

    #[test]
    fn test_encode_adds_leading_slash() {
        let msg = roundtrip("zoomRooms/roomIndex/muteMic", &[OscArg::Int(3)]);
        assert_eq!(msg.address, "/zoomRooms/roomIndex/muteMic");
        assert_eq!(msg.args, vec![OscType::Int(3)]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(decode(&[0x01, 0x02, 0x03]), Err(CodecError::Decode(_))));
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_decode_bundle_flattens_in_order() {
        let bundle = OscPacket::Bundle(rosc::OscBundle {
            timetag: rosc::OscTime { seconds: 0, fractional: 1 },
            content: vec![
                OscPacket::Message(OscMessage {
                    addr: "/roomosc/addedRoomsCount".into(),
                    args: vec![OscType::Int(2)],
                }),
                OscPacket::Message(OscMessage {
                    addr: "/roomosc/pairedRoomsCount".into(),
                    args: vec![OscType::Int(1)],
                }),
            ],
        });
        let buf = rosc::encoder::encode(&bundle).unwrap();
        let messages = decode(&buf).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].address, "/roomosc/addedRoomsCount");
        assert_eq!(messages[1].address, "/roomosc/pairedRoomsCount");
    }

    #[test]
    fn test_arg_coercion() {
        let args = vec![
            OscType::Int(42),
            OscType::String("17".into()),
            OscType::String("abc".into()),
            OscType::Float(2.5),
            OscType::Bool(true),
        ];

        assert_eq!(arg_str(&args, 0).as_deref(), Some("42"));
        assert_eq!(arg_int(&args, 1), Some(17));
        assert_eq!(arg_int(&args, 2), None);
        assert_eq!(arg_str(&args, 3).as_deref(), Some("2.5"));
        assert_eq!(arg_int(&args, 3), Some(2));
        assert_eq!(arg_str(&args, 4).as_deref(), Some("true"));
        assert_eq!(arg_int(&args, 4), None);

        // Missing positions are "not updated", never an error
        assert_eq!(arg_str(&args, 9), None);
        assert_eq!(arg_int(&args, 9), None);
        assert_eq!(arg_bool(&args, 9), None);
    }

    #[test]
    fn test_arg_bool() {
        let args = vec![
            OscType::Int(1),
            OscType::Int(0),
            OscType::Int(2),
            OscType::Bool(false),
            OscType::String("true".into()),
            OscType::String("maybe".into()),
        ];
        assert_eq!(arg_bool(&args, 0), Some(true));
        assert_eq!(arg_bool(&args, 1), Some(false));
        assert_eq!(arg_bool(&args, 2), Some(false));
        assert_eq!(arg_bool(&args, 3), Some(false));
        assert_eq!(arg_bool(&args, 4), Some(true));
        assert_eq!(arg_bool(&args, 5), None);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(OscArg::parse_literal("true"), OscArg::Bool(true));
        assert_eq!(OscArg::parse_literal("-4"), OscArg::Int(-4));
        assert_eq!(OscArg::parse_literal("Room A"), OscArg::Str("Room A".into()));
    }

    #[test]
    fn test_format_args() {
        let args = vec![OscType::String("r1".into()), OscType::Int(3), OscType::Bool(true)];
        assert_eq!(format_args(&args), "s:\"r1\", i:3, T:true");
    }

    fn arg_strategy() -> impl Strategy<Value = OscArg> {
        prop_oneof![
            "[a-zA-Z0-9 _.-]{0,24}".prop_map(OscArg::Str),
            any::<i32>().prop_map(OscArg::Int),
            any::<bool>().prop_map(OscArg::Bool),
        ]
    }

    proptest! {
        #[test]
        fn prop_roundtrip_preserves_values(
            path in "/?[a-zA-Z]{1,8}(/[a-zA-Z]{1,8}){0,3}",
            args in prop::collection::vec(arg_strategy(), 0..8),
        ) {
            let msg = roundtrip(&path, &args);
            prop_assert_eq!(msg.address, normalize_path(&path));
            prop_assert_eq!(msg.args.len(), args.len());

            for (i, original) in args.iter().enumerate() {
                match original {
                    OscArg::Str(s) => prop_assert_eq!(arg_str(&msg.args, i), Some(s.clone())),
                    OscArg::Int(n) => prop_assert_eq!(arg_int(&msg.args, i), Some(i64::from(*n))),
                    OscArg::Bool(b) => prop_assert_eq!(arg_bool(&msg.args, i), Some(*b)),
                }
            }
        }
    }
}
