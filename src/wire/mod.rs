//! The netwayste application protocol as it appears on the wire.
//!
//! netwayste frames every message as one bincode-encoded [`Packet`] per UDP
//! datagram. The enum and struct shapes below are the wire contract: bincode
//! v1 encodes the variant index and fields in declaration order, so variant
//! order here must never change.

pub mod describe;

use serde::{Deserialize, Serialize};
use std::fmt;

/// UDP port netwayste servers listen on by default.
pub const DEFAULT_PORT: u16 = 2016;

/// Ping/pong nonce carrier used for latency measurement. The receiver echoes
/// the nonce back untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingPong {
    pub nonce: u64,
}

/// A chat line relayed by the server to room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastChatMessage {
    pub chat_seq: Option<u64>,
    pub player_name: String,
    pub message: String,
}

/// One part of a universe generation diff, split to fit in a datagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenStateDiffPart {
    pub gen0: u32,
    pub gen1: u32,
    pub part_number: u8,
    pub total_parts: u8,
    pub pattern_part: String,
}

/// Universe state carried by an `Update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniUpdate {
    Diff { diff: GenStateDiffPart },
    NoChange,
}

/// Room-level events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameUpdate {
    GameNotification { msg: String },
    GameStart,
    PlayerJoin { name: String },
    PlayerLeave { name: String },
    GameFinish,
    RoomDeleted,
}

/// Client-initiated actions carried by a `Request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestAction {
    None,
    Connect { name: String, client_version: String },
    Disconnect,
    KeepAlive { latest_response_ack: u64 },
    ListPlayers,
    ChatMessage { message: String },
    ListRooms,
    NewRoom { room_name: String },
    JoinRoom { room_name: String },
    LeaveRoom,
}

/// Summary of a room, returned by `ListRooms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_name: String,
    pub player_count: u8,
    pub in_progress: bool,
}

/// Server verdicts carried by a `Response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseCode {
    Ok,
    LoggedIn { cookie: String, server_version: String },
    JoinedRoom { room_name: String },
    LeaveRoom,
    PlayerList { players: Vec<String> },
    RoomList { rooms: Vec<RoomInfo> },
    BadRequest { error_msg: String },
    Unauthorized { error_msg: String },
    TooManyRequests { error_msg: String },
    ServerError { error_msg: String },
    NotConnected { error_msg: String },
    KeepAliveFailure,
}

impl ResponseCode {
    /// True for the variants that signal a request was rejected or failed.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ResponseCode::BadRequest { .. }
                | ResponseCode::Unauthorized { .. }
                | ResponseCode::TooManyRequests { .. }
                | ResponseCode::ServerError { .. }
                | ResponseCode::NotConnected { .. }
                | ResponseCode::KeepAliveFailure
        )
    }
}

/// Top-level netwayste message, one per UDP datagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    Request {
        sequence: u64,
        response_ack: Option<u64>,
        cookie: Option<String>,
        action: RequestAction,
    },
    Response {
        sequence: u64,
        request_ack: Option<u64>,
        code: ResponseCode,
    },
    Update {
        chats: Vec<BroadcastChatMessage>,
        game_update_seq: Option<u64>,
        game_updates: Vec<GameUpdate>,
        universe_update: UniUpdate,
        ping: PingPong,
    },
    UpdateReply {
        cookie: String,
        last_chat_seq: Option<u64>,
        last_game_update_seq: Option<u64>,
        last_full_gen: Option<u64>,
        partial_gen: Option<GenStateDiffPart>,
        pong: PingPong,
    },
    GetStatus {
        ping: PingPong,
    },
    Status {
        pong: PingPong,
        server_version: String,
        player_count: u64,
        room_count: u64,
        server_name: String,
    },
}

/// Discriminant-only classification of a [`Packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Request,
    Response,
    Update,
    UpdateReply,
    GetStatus,
    Status,
}

impl PacketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketKind::Request => "Request",
            PacketKind::Response => "Response",
            PacketKind::Update => "Update",
            PacketKind::UpdateReply => "UpdateReply",
            PacketKind::GetStatus => "GetStatus",
            PacketKind::Status => "Status",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Request { .. } => PacketKind::Request,
            Packet::Response { .. } => PacketKind::Response,
            Packet::Update { .. } => PacketKind::Update,
            Packet::UpdateReply { .. } => PacketKind::UpdateReply,
            Packet::GetStatus { .. } => PacketKind::GetStatus,
            Packet::Status { .. } => PacketKind::Status,
        }
    }

    /// Sequence number for the sequenced kinds (Request/Response).
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Packet::Request { sequence, .. } | Packet::Response { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }

    /// The session cookie, when this packet carries one.
    pub fn cookie(&self) -> Option<&str> {
        match self {
            Packet::Request { cookie, .. } => cookie.as_deref(),
            Packet::UpdateReply { cookie, .. } => Some(cookie.as_str()),
            Packet::Response { code, .. } => match code {
                ResponseCode::LoggedIn { cookie, .. } => Some(cookie.as_str()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Failure to interpret a UDP payload as a netwayste packet.
#[derive(Debug)]
pub struct DecodeError(bincode::Error);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "netwayste decode failed: {}", self.0)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Decode one datagram payload. Trailing bytes are tolerated, matching
/// what a bincode v1 receiver accepts.
pub fn decode(payload: &[u8]) -> Result<Packet, DecodeError> {
    bincode::deserialize(payload).map_err(DecodeError)
}

/// Encode a packet the way a netwayste peer would. Used by tests and the
/// benchmark to fabricate capture payloads.
pub fn encode(packet: &Packet) -> Result<Vec<u8>, DecodeError> {
    bincode::serialize(packet).map_err(DecodeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_status_wire_layout() {
        // bincode v1: u32 LE variant index, then fields in order.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u32.to_le_bytes()); // Packet::GetStatus
        bytes.extend_from_slice(&0xDEADBEEFu64.to_le_bytes()); // ping.nonce

        let packet = decode(&bytes).unwrap();
        assert_eq!(
            packet,
            Packet::GetStatus {
                ping: PingPong { nonce: 0xDEADBEEF }
            }
        );
    }

    #[test]
    fn request_connect_wire_layout() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes()); // Packet::Request
        bytes.extend_from_slice(&7u64.to_le_bytes()); // sequence
        bytes.push(0); // response_ack: None
        bytes.push(0); // cookie: None
        bytes.extend_from_slice(&1u32.to_le_bytes()); // RequestAction::Connect
        bytes.extend_from_slice(&4u64.to_le_bytes()); // name len
        bytes.extend_from_slice(b"kivo");
        bytes.extend_from_slice(&5u64.to_le_bytes()); // client_version len
        bytes.extend_from_slice(b"0.3.4");

        let packet = decode(&bytes).unwrap();
        match packet {
            Packet::Request {
                sequence,
                response_ack,
                cookie,
                action: RequestAction::Connect { name, client_version },
            } => {
                assert_eq!(sequence, 7);
                assert_eq!(response_ack, None);
                assert_eq!(cookie, None);
                assert_eq!(name, "kivo");
                assert_eq!(client_version, "0.3.4");
            }
            other => panic!("unexpected packet: {:?}", other),
        }
    }

    #[test]
    fn garbage_fails_to_decode() {
        // Variant index far out of range.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&99u32.to_le_bytes());
        assert!(decode(&bytes).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn trailing_bytes_are_tolerated() {
        let mut bytes = encode(&Packet::GetStatus {
            ping: PingPong { nonce: 1 },
        })
        .unwrap();
        bytes.extend_from_slice(&[0u8; 3]);
        assert!(decode(&bytes).is_ok());
    }

    #[test]
    fn cookie_extraction() {
        let logged_in = Packet::Response {
            sequence: 1,
            request_ack: Some(1),
            code: ResponseCode::LoggedIn {
                cookie: "abc123".into(),
                server_version: "0.3.4".into(),
            },
        };
        assert_eq!(logged_in.cookie(), Some("abc123"));

        let bare = Packet::Response {
            sequence: 2,
            request_ack: None,
            code: ResponseCode::Ok,
        };
        assert_eq!(bare.cookie(), None);
    }

    #[test]
    fn error_codes_classified() {
        assert!(ResponseCode::KeepAliveFailure.is_error());
        assert!(ResponseCode::BadRequest {
            error_msg: "nope".into()
        }
        .is_error());
        assert!(!ResponseCode::Ok.is_error());
        assert!(!ResponseCode::LeaveRoom.is_error());
    }
}
