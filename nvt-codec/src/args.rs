//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Parsed subnegotiation payloads (`IAC SB <option> ... IAC SE`).
//!
//! Each [`TelnetOption`] with structured subnegotiation data gets its own
//! small parsing module here; anything we don't specifically understand
//! decodes to [`TelnetArgument::Unknown`] with its raw bytes intact so a
//! caller can still inspect or forward it.

use crate::result::CodecResult;
use crate::options::TelnetOption;
use bytes::{BufMut, BytesMut};

use self::gmcp::GmcpMessage;

/// A decoded subnegotiation payload, carrying the option it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelnetArgument {
    /// Client terminal geometry from a NAWS subnegotiation.
    NAWSWindowSize(naws::WindowSize),
    /// A terminal type name, sent or received via TTYPE.
    TerminalType(String),
    /// Environment variables exchanged via NEW-ENVIRON or OLD-ENVIRON.
    Environment(Vec<new_environ::EnvironVar>),
    /// A CHARSET negotiation message: a REQUEST, ACCEPTED, or REJECTED.
    Charset(status::CharsetNegotiation),
    /// A parsed GMCP (Generic MUD Communication Protocol) message.
    GMCP(GmcpMessage),
    /// Any subnegotiation we don't parse structurally: the raw option and
    /// the payload bytes between `IAC SB <option>` and `IAC SE`.
    Unknown(TelnetOption, BytesMut),
}

impl TelnetArgument {
    /// The option this subnegotiation belongs to.
    pub fn option(&self) -> TelnetOption {
        match self {
            TelnetArgument::NAWSWindowSize(_) => TelnetOption::NAWS,
            TelnetArgument::TerminalType(_) => TelnetOption::TTYPE,
            TelnetArgument::Environment(_) => TelnetOption::NewEnvironment,
            TelnetArgument::Charset(_) => TelnetOption::Charset,
            TelnetArgument::GMCP(_) => TelnetOption::GMCP,
            TelnetArgument::Unknown(option, _) => *option,
        }
    }

    /// The encoded payload length in bytes, used to size the output
    /// buffer before encoding.
    pub fn len(&self) -> usize {
        match self {
            TelnetArgument::NAWSWindowSize(_) => 4,
            TelnetArgument::TerminalType(name) => 1 + name.len(),
            TelnetArgument::Environment(vars) => new_environ::encoded_len(vars),
            TelnetArgument::Charset(negotiation) => negotiation.encoded_len(),
            TelnetArgument::GMCP(message) => message.encode().len(),
            TelnetArgument::Unknown(_, data) => data.len(),
        }
    }

    /// Whether the encoded payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append this payload's wire bytes to `dst`. Does not write the
    /// surrounding `IAC SB <option> ... IAC SE` framing; the caller does
    /// that (see `TelnetCodec`'s `Encoder<TelnetFrame>` impl).
    pub fn encode(&self, dst: &mut BytesMut) -> CodecResult<()> {
        match self {
            TelnetArgument::NAWSWindowSize(size) => {
                dst.extend_from_slice(&naws::encode(*size));
            }
            TelnetArgument::TerminalType(name) => {
                dst.put_u8(0); // IS
                dst.extend_from_slice(name.as_bytes());
            }
            TelnetArgument::Environment(vars) => new_environ::encode(vars, dst),
            TelnetArgument::Charset(negotiation) => negotiation.encode(dst),
            TelnetArgument::GMCP(message) => dst.extend_from_slice(&message.encode()),
            TelnetArgument::Unknown(_, data) => dst.extend_from_slice(data),
        }
        Ok(())
    }
}

/// Negotiate About Window Size (RFC 1073).
pub mod naws {
    /// Client terminal dimensions, in character cells.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct WindowSize {
        /// Terminal width, in columns.
        pub cols: u16,
        /// Terminal height, in rows.
        pub rows: u16,
    }

    impl WindowSize {
        /// Build a window size from columns and rows.
        pub fn new(cols: u16, rows: u16) -> Self {
            Self { cols, rows }
        }
    }

    /// Parse a NAWS subnegotiation payload: four bytes, columns then
    /// rows, each big-endian `u16`.
    pub fn parse(buffer: &[u8]) -> Option<WindowSize> {
        if buffer.len() < 4 {
            return None;
        }
        let cols = u16::from_be_bytes([buffer[0], buffer[1]]);
        let rows = u16::from_be_bytes([buffer[2], buffer[3]]);
        Some(WindowSize { cols, rows })
    }

    /// Encode the four NAWS geometry bytes (without `IAC SB`/`IAC SE` framing).
    pub fn encode(size: WindowSize) -> [u8; 4] {
        let mut out = [0u8; 4];
        out[0..2].copy_from_slice(&size.cols.to_be_bytes());
        out[2..4].copy_from_slice(&size.rows.to_be_bytes());
        out
    }
}

/// NEW-ENVIRON (RFC 1572) and OLD-ENVIRON (RFC 1408) environment exchange.
pub mod new_environ {
    use bytes::{BufMut, BytesMut};

    /// One `VAR`/`USERVAR` pair reported by the client.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct EnvironVar {
        /// True for `USERVAR`, false for `VAR`.
        pub is_uservar: bool,
        /// Variable name.
        pub name: String,
        /// Variable value, if the client supplied one.
        pub value: Option<String>,
    }

    const VAR: u8 = 0;
    const VALUE: u8 = 1;
    const ESC: u8 = 2;
    const USERVAR: u8 = 3;
    const IS: u8 = 0;

    /// Parse an IS-response payload (command byte plus a run of
    /// `VAR`/`USERVAR` name/value pairs).
    pub fn parse(buffer: &[u8]) -> Option<Vec<EnvironVar>> {
        if buffer.is_empty() {
            return None;
        }
        let mut vars = Vec::new();
        let mut i = 1; // skip leading IS/SEND/INFO command byte
        while i < buffer.len() {
            let is_uservar = match buffer[i] {
                VAR => false,
                USERVAR => true,
                _ => return if vars.is_empty() { None } else { Some(vars) },
            };
            i += 1;
            let (name, next) = read_token(buffer, i);
            i = next;
            let mut value = None;
            if i < buffer.len() && buffer[i] == VALUE {
                i += 1;
                let (val, next) = read_token(buffer, i);
                value = Some(val);
                i = next;
            }
            vars.push(EnvironVar {
                is_uservar,
                name,
                value,
            });
        }
        Some(vars)
    }

    fn read_token(buffer: &[u8], mut i: usize) -> (String, usize) {
        let mut out = Vec::new();
        while i < buffer.len() {
            match buffer[i] {
                VAR | VALUE | USERVAR => break,
                ESC if i + 1 < buffer.len() => {
                    out.push(buffer[i + 1]);
                    i += 2;
                }
                byte => {
                    out.push(byte);
                    i += 1;
                }
            }
        }
        (String::from_utf8_lossy(&out).into_owned(), i)
    }

    fn escaped_len(text: &str) -> usize {
        text.bytes()
            .filter(|&b| b == VAR || b == VALUE || b == ESC || b == USERVAR)
            .count()
            + text.len()
    }

    pub(crate) fn encoded_len(vars: &[EnvironVar]) -> usize {
        1 + vars
            .iter()
            .map(|v| {
                1 + escaped_len(&v.name)
                    + v.value.as_deref().map_or(0, |val| 1 + escaped_len(val))
            })
            .sum::<usize>()
    }

    fn put_escaped(dst: &mut BytesMut, text: &str) {
        for byte in text.bytes() {
            if byte == VAR || byte == VALUE || byte == ESC || byte == USERVAR {
                dst.put_u8(ESC);
            }
            dst.put_u8(byte);
        }
    }

    pub(crate) fn encode(vars: &[EnvironVar], dst: &mut BytesMut) {
        dst.put_u8(IS);
        for var in vars {
            dst.put_u8(if var.is_uservar { USERVAR } else { VAR });
            put_escaped(dst, &var.name);
            if let Some(value) = &var.value {
                dst.put_u8(VALUE);
                put_escaped(dst, value);
            }
        }
    }

    const SEND: u8 = 1;

    /// Build the `IAC SB NEW-ENVIRON SEND VAR USERVAR IAC SE` request
    /// payload, asking the peer to report both kinds of variables.
    pub fn request() -> [u8; 3] {
        [SEND, VAR, USERVAR]
    }
}

/// TTYPE (RFC 1091) and CHARSET (RFC 2066) subnegotiation helpers, plus the
/// Telnet STATUS option (RFC 859).
pub mod status {
    use bytes::BytesMut;

    const SEND: u8 = 1;
    const IS: u8 = 0;

    /// Build the `IAC SB TTYPE SEND IAC SE` request payload.
    pub fn request_ttype() -> [u8; 1] {
        [SEND]
    }

    /// Parse a `TTYPE IS <name>` response payload into the terminal type
    /// name. Returns `None` if the leading command byte isn't `IS`.
    pub fn parse_ttype(buffer: &[u8]) -> Option<String> {
        if buffer.first() != Some(&IS) {
            return None;
        }
        Some(String::from_utf8_lossy(&buffer[1..]).into_owned())
    }

    const CHARSET_REQUEST: u8 = 1;
    const CHARSET_ACCEPTED: u8 = 2;
    const CHARSET_REJECTED: u8 = 3;
    const SEPARATOR: u8 = b';';

    /// A CHARSET (RFC 2066) negotiation message.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum CharsetNegotiation {
        /// We offered this list of charset names.
        Request(Vec<String>),
        /// The peer accepted this one charset name.
        Accepted(String),
        /// The peer rejected every offered charset.
        Rejected,
    }

    impl CharsetNegotiation {
        pub(crate) fn encoded_len(&self) -> usize {
            match self {
                CharsetNegotiation::Request(charsets) => {
                    2 + charsets.iter().map(String::len).sum::<usize>()
                        + charsets.len().saturating_sub(1)
                }
                CharsetNegotiation::Accepted(name) => 1 + name.len(),
                CharsetNegotiation::Rejected => 1,
            }
        }

        pub(crate) fn encode(&self, dst: &mut BytesMut) {
            use bytes::BufMut;
            match self {
                CharsetNegotiation::Request(charsets) => {
                    dst.put_u8(CHARSET_REQUEST);
                    dst.put_u8(SEPARATOR);
                    for (i, charset) in charsets.iter().enumerate() {
                        if i > 0 {
                            dst.put_u8(SEPARATOR);
                        }
                        dst.extend_from_slice(charset.as_bytes());
                    }
                }
                CharsetNegotiation::Accepted(name) => {
                    dst.put_u8(CHARSET_ACCEPTED);
                    dst.extend_from_slice(name.as_bytes());
                }
                CharsetNegotiation::Rejected => {
                    dst.put_u8(CHARSET_REJECTED);
                }
            }
        }
    }

    /// Parse any CHARSET subnegotiation payload into a
    /// [`CharsetNegotiation`], dispatching on the leading command byte.
    pub fn parse_charset(buffer: &[u8]) -> Option<CharsetNegotiation> {
        match buffer.first()? {
            &CHARSET_REQUEST if buffer.len() >= 2 => {
                let separator = buffer[1];
                let rest = &buffer[2..];
                Some(CharsetNegotiation::Request(
                    rest.split(|&byte| byte == separator)
                        .filter(|chunk| !chunk.is_empty())
                        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                        .collect(),
                ))
            }
            &CHARSET_ACCEPTED => Some(CharsetNegotiation::Accepted(
                String::from_utf8_lossy(&buffer[1..]).into_owned(),
            )),
            &CHARSET_REJECTED => Some(CharsetNegotiation::Rejected),
            _ => None,
        }
    }
}

/// Generic MUD Communication Protocol (GMCP) messages: a dot-separated
/// package/message name followed by an optional JSON payload.
pub mod gmcp {
    /// A single GMCP message: `Package.Message <json>`.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct GmcpMessage {
        /// The `Package.Message` name, verbatim.
        pub package: String,
        /// The raw JSON payload text, if any was present.
        pub json: Option<String>,
    }

    impl GmcpMessage {
        /// Parse a raw GMCP subnegotiation payload. The package name is
        /// everything up to the first space; the remainder, if
        /// non-empty, is kept as opaque JSON text (this crate does not
        /// depend on a JSON library; validating the payload is left to
        /// the application layer).
        pub fn parse(buffer: &[u8]) -> Option<Self> {
            if buffer.is_empty() {
                return None;
            }
            let text = std::str::from_utf8(buffer).ok()?;
            let trimmed = text.trim_start();
            match trimmed.find(char::is_whitespace) {
                Some(idx) => {
                    let (package, rest) = trimmed.split_at(idx);
                    Some(GmcpMessage {
                        package: package.to_string(),
                        json: Some(rest.trim_start().to_string()),
                    })
                }
                None => Some(GmcpMessage {
                    package: trimmed.to_string(),
                    json: None,
                }),
            }
        }

        /// Encode a GMCP message back into its wire payload.
        pub fn encode(&self) -> Vec<u8> {
            match &self.json {
                Some(json) => format!("{} {}", self.package, json).into_bytes(),
                None => self.package.clone().into_bytes(),
            }
        }
    }
}
