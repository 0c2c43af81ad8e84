//! STOMP 1.2 frame codec
//!
//! The match service exposes a STOMP broker over WebSocket. Each WebSocket
//! text message carries one or more NUL-terminated frames; a bare EOL is a
//! heart-beat.
//!
//! ```text
//! COMMAND EOL
//! *( header EOL )
//! EOL
//! *OCTET NUL
//! ```
//!
//! Header values are escaped (`\\`, `\n`, `\r`, `\c`) on every frame except
//! CONNECT and CONNECTED, as STOMP 1.2 requires.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const STOMP_VERSION: &str = "1.2";
const NUL: char = '\0';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StompError {
    #[error("Empty frame")]
    EmptyFrame,
    #[error("Unknown STOMP command: {0}")]
    UnknownCommand(String),
    #[error("Malformed header line: {0}")]
    MalformedHeader(String),
    #[error("Invalid header escape sequence in: {0}")]
    InvalidEscape(String),
    #[error("Frame is missing its NUL terminator")]
    MissingTerminator,
    #[error("Invalid content-length: {0}")]
    InvalidContentLength(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Client frames
    Connect,
    Stomp,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
    // Server frames
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = StompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONNECT" => Command::Connect,
            "STOMP" => Command::Stomp,
            "SEND" => Command::Send,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "ACK" => Command::Ack,
            "NACK" => Command::Nack,
            "BEGIN" => Command::Begin,
            "COMMIT" => Command::Commit,
            "ABORT" => Command::Abort,
            "DISCONNECT" => Command::Disconnect,
            "CONNECTED" => Command::Connected,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            other => return Err(StompError::UnknownCommand(other.to_string())),
        })
    }
}

/// A single STOMP frame. Headers keep their wire order; on lookup the first
/// occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// One unit decoded from a WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Heartbeat,
    Frame(Frame),
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    // -------------------------------------------------------------------------
    // Client frame builders
    // -------------------------------------------------------------------------

    /// CONNECT frame. `heartbeat` is `(outgoing_ms, incoming_ms)`.
    pub fn connect(host: &str, heartbeat: (u64, u64)) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", STOMP_VERSION)
            .header("host", host)
            .header("heart-beat", format!("{},{}", heartbeat.0, heartbeat.1))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Frame::new(Command::Unsubscribe).header("id", id)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new(Command::Disconnect).header("receipt", receipt)
    }

    /// SEND frame with a JSON body.
    pub fn send_json(destination: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .header("content-length", body.len().to_string())
            .with_body(body)
    }

    // -------------------------------------------------------------------------
    // Server frame accessors
    // -------------------------------------------------------------------------

    pub fn subscription(&self) -> Option<&str> {
        self.get_header("subscription")
    }

    pub fn destination(&self) -> Option<&str> {
        self.get_header("destination")
    }

    /// Negotiated `(server_sends_every_ms, server_expects_every_ms)` from CONNECTED.
    pub fn heartbeat(&self) -> Option<(u64, u64)> {
        let raw = self.get_header("heart-beat")?;
        let (sx, sy) = raw.split_once(',')?;
        Some((sx.trim().parse().ok()?, sy.trim().parse().ok()?))
    }

    /// Serialize to the wire format, NUL terminator included.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        let escape = self.command.escapes_headers();
        for (k, v) in &self.headers {
            if escape {
                out.push_str(&escape_header(k));
                out.push(':');
                out.push_str(&escape_header(v));
            } else {
                out.push_str(k);
                out.push(':');
                out.push_str(v);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(NUL);
        out
    }
}

/// Decode every frame and heart-beat contained in one WebSocket text message.
pub fn decode_all(input: &str) -> Result<Vec<Inbound>, StompError> {
    let mut out = Vec::new();
    let mut rest = input;

    loop {
        // Leading EOLs between frames are heart-beats.
        let trimmed = rest.trim_start_matches(['\r', '\n']);
        if trimmed.len() != rest.len() {
            out.push(Inbound::Heartbeat);
        }
        rest = trimmed;
        if rest.is_empty() {
            break;
        }

        let (frame, consumed) = decode_one(rest)?;
        out.push(Inbound::Frame(frame));
        rest = &rest[consumed..];
    }

    if out.is_empty() {
        return Err(StompError::EmptyFrame);
    }
    Ok(out)
}

/// Decode exactly one frame from the start of `input`, returning it together
/// with the number of bytes consumed (NUL included).
pub fn decode_one(input: &str) -> Result<(Frame, usize), StompError> {
    let (command_line, mut pos) = next_line(input, 0).ok_or(StompError::EmptyFrame)?;
    if command_line.is_empty() {
        return Err(StompError::EmptyFrame);
    }
    let command: Command = command_line.parse()?;
    let unescape = command.escapes_headers();

    let mut headers = Vec::new();
    loop {
        let (line, next) = next_line(input, pos).ok_or(StompError::MissingTerminator)?;
        pos = next;
        if line.is_empty() {
            break;
        }
        let (k, v) = line
            .split_once(':')
            .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
        if unescape {
            headers.push((unescape_header(k)?, unescape_header(v)?));
        } else {
            headers.push((k.to_string(), v.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| StompError::InvalidContentLength(v.clone()))
        })
        .transpose()?;

    let body_start = pos;
    let body_end = match content_length {
        Some(len) => {
            let end = body_start
                .checked_add(len)
                .ok_or_else(|| StompError::InvalidContentLength(len.to_string()))?;
            if input.get(body_start..end).is_none() || !input[end..].starts_with(NUL) {
                return Err(StompError::InvalidContentLength(len.to_string()));
            }
            end
        }
        None => input[body_start..]
            .find(NUL)
            .map(|i| body_start + i)
            .ok_or(StompError::MissingTerminator)?,
    };

    let frame = Frame {
        command,
        headers,
        body: input[body_start..body_end].to_string(),
    };
    Ok((frame, body_end + NUL.len_utf8()))
}

/// Returns the line starting at `from` (without its EOL) and the index after the EOL.
fn next_line(input: &str, from: usize) -> Option<(&str, usize)> {
    let rest = input.get(from..)?;
    let nl = rest.find('\n')?;
    let line = rest[..nl].strip_suffix('\r').unwrap_or(&rest[..nl]);
    Some((line, from + nl + 1))
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(value: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::InvalidEscape(value.to_string())),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_subscribe_frame() {
        let wire = Frame::subscribe("sub-0", "/topic/matching/u-1").encode();
        assert_eq!(
            wire,
            "SUBSCRIBE\nid:sub-0\ndestination:/topic/matching/u-1\nack:auto\n\n\0"
        );
    }

    #[test]
    fn connect_headers_are_not_escaped() {
        let wire = Frame::connect("localhost:8080", (10_000, 10_000)).encode();
        assert!(wire.starts_with("CONNECT\naccept-version:1.2\nhost:localhost:8080\n"));
        assert!(wire.contains("heart-beat:10000,10000\n"));
    }

    #[test]
    fn decodes_message_frame() {
        let wire = "MESSAGE\r\ndestination:/topic/matching/users/new\r\nsubscription:sub-1\r\nmessage-id:7\r\n\r\n{\"type\":\"NEW_USER\"}\0";
        let frames = decode_all(wire).unwrap();
        assert_eq!(frames.len(), 1);
        let Inbound::Frame(frame) = &frames[0] else {
            panic!("expected a frame");
        };
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.subscription(), Some("sub-1"));
        assert_eq!(frame.destination(), Some("/topic/matching/users/new"));
        assert_eq!(frame.body, "{\"type\":\"NEW_USER\"}");
    }

    #[test]
    fn honours_content_length_with_embedded_nul() {
        let wire = "MESSAGE\ncontent-length:3\n\na\0b\0";
        let (frame, consumed) = decode_one(wire).unwrap();
        assert_eq!(frame.body, "a\0b");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn content_length_counts_bytes() {
        let body = "매칭";
        let wire = format!("MESSAGE\ncontent-length:{}\n\n{}\0", body.len(), body);
        let (frame, _) = decode_one(&wire).unwrap();
        assert_eq!(frame.body, body);
    }

    #[test]
    fn huge_content_length_is_rejected() {
        let wire = format!("MESSAGE\ncontent-length:{}\n\nbody\0", usize::MAX);
        assert_eq!(
            decode_one(&wire).unwrap_err(),
            StompError::InvalidContentLength(usize::MAX.to_string())
        );
    }

    #[test]
    fn lone_eol_is_heartbeat() {
        assert_eq!(decode_all("\n").unwrap(), vec![Inbound::Heartbeat]);
        assert_eq!(decode_all("\r\n").unwrap(), vec![Inbound::Heartbeat]);
    }

    #[test]
    fn decodes_multiple_frames_in_one_message() {
        let wire = "RECEIPT\nreceipt-id:1\n\n\0\nCONNECTED\nversion:1.2\n\n\0";
        let frames = decode_all(wire).unwrap();
        let commands: Vec<_> = frames
            .iter()
            .filter_map(|f| match f {
                Inbound::Frame(frame) => Some(frame.command),
                Inbound::Heartbeat => None,
            })
            .collect();
        assert_eq!(commands, vec![Command::Receipt, Command::Connected]);
    }

    #[test]
    fn header_escapes_survive_a_trip_through_the_wire() {
        let frame = Frame::new(Command::Send).header("note", "a:b\\c\nd");
        let wire = frame.encode();
        assert!(wire.contains("note:a\\cb\\\\c\\nd\n"));
        let (decoded, _) = decode_one(&wire).unwrap();
        assert_eq!(decoded.get_header("note"), Some("a:b\\c\nd"));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            decode_one("BOGUS\n\n\0").unwrap_err(),
            StompError::UnknownCommand("BOGUS".into())
        );
        assert_eq!(
            decode_one("MESSAGE\nno-colon\n\n\0").unwrap_err(),
            StompError::MalformedHeader("no-colon".into())
        );
        assert_eq!(
            decode_one("MESSAGE\n\nbody without terminator").unwrap_err(),
            StompError::MissingTerminator
        );
        assert!(matches!(
            decode_one("MESSAGE\nk:bad\\x\n\n\0").unwrap_err(),
            StompError::InvalidEscape(_)
        ));
    }

    #[test]
    fn parses_negotiated_heartbeat() {
        let frame = Frame::new(Command::Connected).header("heart-beat", "0,10000");
        assert_eq!(frame.heartbeat(), Some((0, 10_000)));
    }
}
