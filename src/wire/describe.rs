//! Compact one-line renderings of decoded packets for the summary view.

use super::{GameUpdate, Packet, RequestAction, ResponseCode, UniUpdate};

/// A short, single-line description of the interesting fields of a packet.
/// The kind itself is printed separately by the display layer.
pub fn info(packet: &Packet) -> String {
    match packet {
        Packet::Request {
            sequence,
            response_ack,
            cookie,
            action,
        } => {
            let mut out = format!("seq={}", sequence);
            if let Some(ack) = response_ack {
                out.push_str(&format!(" ack={}", ack));
            }
            if cookie.is_some() {
                out.push_str(" cookie");
            }
            out.push(' ');
            out.push_str(&action_info(action));
            out
        }
        Packet::Response {
            sequence,
            request_ack,
            code,
        } => {
            let mut out = format!("seq={}", sequence);
            if let Some(ack) = request_ack {
                out.push_str(&format!(" ack={}", ack));
            }
            out.push(' ');
            out.push_str(&code_info(code));
            out
        }
        Packet::Update {
            chats,
            game_update_seq,
            game_updates,
            universe_update,
            ping,
        } => {
            let mut out = String::new();
            if let Some(seq) = game_update_seq {
                out.push_str(&format!("game_seq={} ", seq));
            }
            if !chats.is_empty() {
                out.push_str(&format!("chats={} ", chats.len()));
            }
            for update in game_updates {
                out.push_str(&game_update_info(update));
                out.push(' ');
            }
            match universe_update {
                UniUpdate::Diff { diff } => out.push_str(&format!(
                    "diff gen {}->{} part {}/{} ",
                    diff.gen0, diff.gen1, diff.part_number, diff.total_parts
                )),
                UniUpdate::NoChange => {}
            }
            out.push_str(&format!("ping={:#x}", ping.nonce));
            out
        }
        Packet::UpdateReply {
            last_chat_seq,
            last_game_update_seq,
            last_full_gen,
            partial_gen,
            pong,
            ..
        } => {
            let mut out = String::new();
            if let Some(seq) = last_chat_seq {
                out.push_str(&format!("chat_ack={} ", seq));
            }
            if let Some(seq) = last_game_update_seq {
                out.push_str(&format!("game_ack={} ", seq));
            }
            if let Some(gen) = last_full_gen {
                out.push_str(&format!("full_gen={} ", gen));
            }
            if partial_gen.is_some() {
                out.push_str("partial_gen ");
            }
            out.push_str(&format!("pong={:#x}", pong.nonce));
            out
        }
        Packet::GetStatus { ping } => format!("ping={:#x}", ping.nonce),
        Packet::Status {
            pong,
            server_version,
            player_count,
            room_count,
            server_name,
        } => format!(
            "\"{}\" v{} players={} rooms={} pong={:#x}",
            server_name, server_version, player_count, room_count, pong.nonce
        ),
    }
}

fn action_info(action: &RequestAction) -> String {
    match action {
        RequestAction::None => "None".into(),
        RequestAction::Connect {
            name,
            client_version,
        } => format!("Connect name=\"{}\" v{}", name, client_version),
        RequestAction::Disconnect => "Disconnect".into(),
        RequestAction::KeepAlive {
            latest_response_ack,
        } => format!("KeepAlive ack={}", latest_response_ack),
        RequestAction::ListPlayers => "ListPlayers".into(),
        RequestAction::ChatMessage { message } => {
            format!("Chat \"{}\"", truncate(message, 40))
        }
        RequestAction::ListRooms => "ListRooms".into(),
        RequestAction::NewRoom { room_name } => format!("NewRoom \"{}\"", room_name),
        RequestAction::JoinRoom { room_name } => format!("JoinRoom \"{}\"", room_name),
        RequestAction::LeaveRoom => "LeaveRoom".into(),
    }
}

fn code_info(code: &ResponseCode) -> String {
    match code {
        ResponseCode::Ok => "OK".into(),
        ResponseCode::LoggedIn {
            server_version, ..
        } => format!("LoggedIn v{}", server_version),
        ResponseCode::JoinedRoom { room_name } => format!("JoinedRoom \"{}\"", room_name),
        ResponseCode::LeaveRoom => "LeftRoom".into(),
        ResponseCode::PlayerList { players } => format!("PlayerList n={}", players.len()),
        ResponseCode::RoomList { rooms } => format!("RoomList n={}", rooms.len()),
        ResponseCode::BadRequest { error_msg } => {
            format!("BadRequest \"{}\"", truncate(error_msg, 40))
        }
        ResponseCode::Unauthorized { error_msg } => {
            format!("Unauthorized \"{}\"", truncate(error_msg, 40))
        }
        ResponseCode::TooManyRequests { error_msg } => {
            format!("TooManyRequests \"{}\"", truncate(error_msg, 40))
        }
        ResponseCode::ServerError { error_msg } => {
            format!("ServerError \"{}\"", truncate(error_msg, 40))
        }
        ResponseCode::NotConnected { error_msg } => {
            format!("NotConnected \"{}\"", truncate(error_msg, 40))
        }
        ResponseCode::KeepAliveFailure => "KeepAliveFailure".into(),
    }
}

fn game_update_info(update: &GameUpdate) -> String {
    match update {
        GameUpdate::GameNotification { msg } => format!("notify \"{}\"", truncate(msg, 40)),
        GameUpdate::GameStart => "game_start".into(),
        GameUpdate::PlayerJoin { name } => format!("join \"{}\"", name),
        GameUpdate::PlayerLeave { name } => format!("leave \"{}\"", name),
        GameUpdate::GameFinish => "game_finish".into(),
        GameUpdate::RoomDeleted => "room_deleted".into(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
