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

use super::{CodecError, TelnetEvent, TelnetFrame, TelnetOption, consts};
use crate::args::TelnetArgument;
use crate::args::gmcp::GmcpMessage;
use crate::args::{naws, new_environ, status};
use crate::options::{TelnetOptions, TelnetSide};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// A codec for handling the Telnet protocol, providing functionality to encode and decode Telnet messages.
///
/// `TelnetCodec` is responsible for managing the state and buffers required for processing data
/// when implementing the Telnet protocol. It is typically used in conjunction with asynchronous
/// service libraries to handle the transmission and reception of Telnet messages over a connection.
///
/// This struct is typically paired with a transport-like implementation
/// to facilitate stream I/O management for the Telnet protocol.
pub struct TelnetCodec {
    decoder_buffer: BytesMut,
    decoder_state: DecoderState,
    options: TelnetOptions,
    /// Reply frames the Q-method engine computed while processing the most
    /// recent `decode` call(s) (e.g. a `Do(NAWS)` in answer to a received
    /// `Will(NAWS)`). The caller drains these with `take_pending_replies`
    /// and is responsible for encoding and sending them back to the peer.
    pending_replies: std::collections::VecDeque<TelnetFrame>,
}

impl TelnetCodec {
    /// Creates a new instance of `TelnetCodec`.
    ///
    /// This constructor initializes the `TelnetCodec` struct with default settings:
    /// - `encoder_buffer`: A buffer for encoding data, initialized to its default state.
    /// - `decoder_buffer`: A buffer for decoding data, initialized to its default state.
    /// - `decoder_state`: The initial state of the decoder, set to `DecoderState::NormalData`.
    /// - `options`: A set of Telnet options, initialized with default values.
    ///
    /// # Returns
    /// A `TelnetCodec` instance ready for use.
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::TelnetCodec;
    ///
    /// let codec = TelnetCodec::new();
    /// ```
    pub fn new() -> TelnetCodec {
        TelnetCodec::default()
    }

    /// Checks if we support the given option locally
    pub fn is_supported_local(&self, option: TelnetOption) -> bool {
        self.options.is_supported_local(option)
    }

    /// Checks if we support the given option remotely
    pub fn is_supported_remote(&self, option: TelnetOption) -> bool {
        self.options.is_supported_remote(option)
    }

    /// Checks if a specific Telnet option is enabled locally.
    ///
    /// # Parameters
    /// - `option`: The `TelnetOption` to check the local enablement status for.
    ///
    /// # Returns
    /// - `bool`: Returns `true` if the specified Telnet option is enabled locally, otherwise `false`.
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::{TelnetCodec, TelnetOption};
    ///
    /// let codec = TelnetCodec::new();
    /// let is_enabled = codec.is_enabled_local(TelnetOption::Echo);
    /// if is_enabled {
    ///     println!("The Echo option is enabled locally.");
    /// } else {
    ///     println!("The Echo option is not enabled locally.");
    /// }
    /// ```
    ///
    /// # Note
    /// This function uses the `local_enabled` method of the `options` field to determine the enablement status.
    pub fn is_enabled_local(&self, option: TelnetOption) -> bool {
        self.options.local_enabled(option)
    }

    /// Checks if a specific Telnet option is enabled on the remote side.
    ///
    /// # Parameters
    /// - `option`: The `TelnetOption` to check for its enabled status.
    ///
    /// # Returns
    /// - `bool`: Returns `true` if the given Telnet option is enabled on the remote side,
    /// otherwise returns `false`.
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::{TelnetCodec, TelnetOption};
    ///
    /// let codec = TelnetCodec::new();
    /// let is_enabled = codec.is_enabled_remote(TelnetOption::Echo);
    /// if is_enabled {
    ///     println!("The Echo option is enabled locally.");
    /// } else {
    ///     println!("The Echo option is not enabled locally.");
    /// }
    /// ```
    pub fn is_enabled_remote(&self, option: TelnetOption) -> bool {
        self.options.remote_enabled(option)
    }

    /// Request to enable a Telnet option locally (we will send WILL).
    ///
    /// This initiates the negotiation process using the Q-method state machine.
    /// If negotiation is needed, returns a frame that should be sent to the remote side.
    ///
    /// # Parameters
    /// - `option`: The `TelnetOption` to enable locally.
    ///
    /// # Returns
    /// - `Some(TelnetFrame)`: A negotiation frame to send to the remote side.
    /// - `None`: No negotiation needed (option already enabled or not supported).
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::{TelnetCodec, TelnetOption};
    ///
    /// let mut codec = TelnetCodec::new();
    /// if let Some(frame) = codec.enable_local(TelnetOption::Echo) {
    ///     // Send frame to remote side
    /// }
    /// ```
    pub fn enable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.enable_local(option)
    }

    /// Request to disable a Telnet option locally (we will send WONT).
    ///
    /// This initiates the negotiation process using the Q-method state machine.
    /// If negotiation is needed, returns a frame that should be sent to the remote side.
    ///
    /// # Parameters
    /// - `option`: The `TelnetOption` to disable locally.
    ///
    /// # Returns
    /// - `Some(TelnetFrame)`: A negotiation frame to send to the remote side.
    /// - `None`: No negotiation needed (option already disabled).
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::{TelnetCodec, TelnetOption};
    ///
    /// let mut codec = TelnetCodec::new();
    /// if let Some(frame) = codec.disable_local(TelnetOption::Echo) {
    ///     // Send frame to remote side
    /// }
    /// ```
    pub fn disable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.disable_local(option)
    }

    /// Request to enable a Telnet option on the remote side (we will send DO).
    ///
    /// This initiates the negotiation process using the Q-method state machine.
    /// If negotiation is needed, returns a frame that should be sent to the remote side.
    ///
    /// # Parameters
    /// - `option`: The `TelnetOption` to enable on the remote side.
    ///
    /// # Returns
    /// - `Some(TelnetFrame)`: A negotiation frame to send to the remote side.
    /// - `None`: No negotiation needed (option already enabled or not supported).
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::{TelnetCodec, TelnetOption};
    ///
    /// let mut codec = TelnetCodec::new();
    /// if let Some(frame) = codec.enable_remote(TelnetOption::SuppressGoAhead) {
    ///     // Send frame to remote side
    /// }
    /// ```
    pub fn enable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.enable_remote(option)
    }

    /// Request to disable a Telnet option on the remote side (we will send DONT).
    ///
    /// This initiates the negotiation process using the Q-method state machine.
    /// If negotiation is needed, returns a frame that should be sent to the remote side.
    ///
    /// # Parameters
    /// - `option`: The `TelnetOption` to disable on the remote side.
    ///
    /// # Returns
    /// - `Some(TelnetFrame)`: A negotiation frame to send to the remote side.
    /// - `None`: No negotiation needed (option already disabled).
    ///
    /// # Example
    /// ```
    /// use muxnet_nvt::{TelnetCodec, TelnetOption};
    ///
    /// let mut codec = TelnetCodec::new();
    /// if let Some(frame) = codec.disable_remote(TelnetOption::Echo) {
    ///     // Send frame to remote side
    /// }
    /// ```
    pub fn disable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.disable_remote(option)
    }

    /// Drain the reply frames the Q-method engine queued while answering
    /// peer-initiated negotiation (DO/DONT/WILL/WONT) during the most
    /// recent `decode` call(s). Each frame must be encoded and sent back
    /// to the peer for negotiation to actually converge; `decode` itself
    /// only emits the informational `OptionStatus` event.
    pub fn take_pending_replies(&mut self) -> Vec<TelnetFrame> {
        self.pending_replies.drain(..).collect()
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        TelnetCodec {
            decoder_buffer: BytesMut::new(),
            decoder_state: DecoderState::NormalData,
            options: TelnetOptions::default(),
            pending_replies: std::collections::VecDeque::new(),
        }
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetEvent;
    type Error = CodecError;

    /// Decodes bytes from the provided `src` buffer into a `TelnetEvent` object by interpreting them
    /// using the internal `decoder_state`. The Telnet protocol supports various control and data
    /// transmission commands that this function processes.
    ///
    /// # Parameters
    /// - `src`: A mutable reference to a `BytesMut` buffer containing the raw data to decode.
    ///
    /// # Returns
    /// Returns a `Result` wrapping an `Option<TelnetFrame>`:
    /// - `Ok(Some(TelnetFrame))`: Successfully decoded a Telnet frame.
    /// - `Ok(None)`: No data was available for decoding; no frames were produced.
    /// - `Err(DecodeError)`: If an error occurred while decoding.
    ///
    /// # Telnet Decoder Workflow
    /// The function reads one byte at a time and performs state-based decoding depending on the
    /// `decoder_state` value and the byte's value. It keeps track of its internal state using
    /// `decoder_state`. The supported states and decoding behavior are as follows:
    ///
    /// ## States
    /// - `DecoderState::NormalData`: Default state to process normal data bytes.
    ///   - Switches to `DecoderState::InterpretAsCommand` upon encountering the `IAC (Interpret As Command)` byte.
    ///   - Emits any normal data frame as `TelnetFrame::Data`.
    ///
    /// - `DecoderState::InterpretAsCommand`: Handles bytes representing Telnet commands.
    ///   - Recognizes standard commands and returns the appropriate `TelnetFrame` variants, such as:
    ///     - `NoOperation`, `DataMark`, `Break`, `InterruptProcess`, `AbortOutput`, `AreYouThere`,
    ///       `EraseCharacter`, `EraseLine`, `GoAhead`.
    ///   - Handles negotiation commands such as `DO`, `DONT`, `WILL`, and `WONT` by transitioning
    ///     to respective negotiation states:
    ///     - `NegotiateDo`, `NegotiateDont`, `NegotiateWill`, `NegotiateWont`.
    ///   - Initiates subnegotiation with the `SB (Subnegotiation)` command by transitioning to
    ///     `DecoderState::Subnegotiate`.
    ///   - For unknown commands, it logs a warning and returns `TelnetEvent::NoOperation`.
    ///
    /// - `DecoderState::NegotiateDo/Dont/Will/Wont`: Completes a negotiation operation with the command
    ///   byte and returns the respective frame: `TelnetFrame::Do`, `TelnetFrame::Dont`, `TelnetFrame::Will`, `TelnetFrame::Wont`.
    ///
    /// - `DecoderState::Subnegotiate`: Starts accumulating subnegotiation arguments into an internal buffer.
    ///   - Transitions to `DecoderState::SubnegotiateArgument` when a subnegotiation byte is received.
    ///   - Handles escape sequences (double `IAC`) during argument accumulation by reverting to
    ///     `DecoderState::SubnegotiateArgumentIAC` and storing the `IAC` byte back into the buffer.
    ///   - Completes subnegotiation when the `SE (Subnegotiation End)` command is processed, returning
    ///     a `TelnetFrame::Subnegotiate` frame with the accumulated buffer data.
    ///   - On invalid commands during subnegotiation, aborts the operation, clears the buffer,
    ///     logs a warning, and returns `TelnetEvent::NoOperation`.
    ///
    /// - `DecoderState::SubnegotiateArgumentIAC`: Special state to handle escape sequences (`IAC`) during
    ///   subnegotiation arguments.
    ///
    /// # Behavior
    /// - The function processes one frame at a time.
    /// - Changes decoder state based on the byte and interprets commands as specified by the Telnet protocol.
    /// - Logs warnings for unknown or unexpected commands.
    /// - Uses an internal buffer for subnegotiation data (`decoder_buffer`).
    ///
    /// # Example Return Values
    /// - `Ok(Some(TelnetFrame::Data(byte)))`: Successfully decoded a normal data byte.
    /// - `Ok(Some(TelnetEvent::NoOperation))`: Processed a `No-Op (NOP)` or invalid/unknown command.
    /// - `Ok(Some(TelnetFrame::Will(option)))`: Processed a `WILL` negotiation command for a specific option.
    /// - `Ok(Some(TelnetFrame::Subnegotiate(option, buffer)))`: Processed subnegotiation with the provided data buffer.
    ///
    /// # Errors
    /// This function may return a `CodecError` if an error occurs during decoding.
    ///
    /// # Notes
    /// - The function is stateful and mutates the decoder's `decoder_state` and internal buffer (`decoder_buffer`) as it works.
    /// - When no bytes remain in the source buffer, the function returns `Ok(None)`, signaling there is
    ///   no new frame yet.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetEvent>, Self::Error> {
        while src.remaining() > 0 {
            let byte = src.get_u8();
            match (self.decoder_state, byte) {
                (DecoderState::NormalData, consts::IAC) => {
                    self.decoder_state = DecoderState::InterpretAsCommand;
                }
                (DecoderState::NormalData, _) => {
                    self.decoder_state = DecoderState::NormalData;
                    if !self.options.local_enabled(TelnetOption::TransmitBinary) && byte > 0x7F {
                        warn!(
                            "TransmitBinary option is disabled but received non-ASCII byte: 0x{:02X}",
                            byte
                        );
                    }

                    return Ok(Some(TelnetEvent::Data(byte)));
                }
                (DecoderState::InterpretAsCommand, consts::NOP) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::NoOperation));
                }
                (DecoderState::InterpretAsCommand, consts::DM) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::DataMark));
                }
                (DecoderState::InterpretAsCommand, consts::BRK) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::Break));
                }
                (DecoderState::InterpretAsCommand, consts::IP) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::InterruptProcess));
                }
                (DecoderState::InterpretAsCommand, consts::AO) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::AbortOutput));
                }
                (DecoderState::InterpretAsCommand, consts::AYT) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::AreYouThere));
                }
                (DecoderState::InterpretAsCommand, consts::EC) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::EraseCharacter));
                }
                (DecoderState::InterpretAsCommand, consts::EL) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::EraseLine));
                }
                (DecoderState::InterpretAsCommand, consts::GA) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::GoAhead));
                }
                (DecoderState::InterpretAsCommand, consts::EOR) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::EndOfRecord));
                }
                (DecoderState::InterpretAsCommand, consts::IAC) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::Data(consts::IAC)));
                }
                (DecoderState::InterpretAsCommand, consts::DO) => {
                    self.decoder_state = DecoderState::NegotiateDo;
                }
                (DecoderState::InterpretAsCommand, consts::DONT) => {
                    self.decoder_state = DecoderState::NegotiateDont;
                }
                (DecoderState::InterpretAsCommand, consts::WILL) => {
                    self.decoder_state = DecoderState::NegotiateWill;
                }
                (DecoderState::InterpretAsCommand, consts::WONT) => {
                    self.decoder_state = DecoderState::NegotiateWont;
                }
                (DecoderState::InterpretAsCommand, consts::SB) => {
                    self.decoder_state = DecoderState::Subnegotiate;
                }
                (DecoderState::InterpretAsCommand, _) => {
                    // Return to NormalData State, and return a No Operation
                    warn!("Received Unknown Command {:#X}", byte);
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetEvent::NoOperation));
                }
                (DecoderState::NegotiateDo, _) => {
                    self.decoder_state = DecoderState::NormalData;
                    let option: TelnetOption = byte.into();
                    let frame = TelnetFrame::Do(option);
                    // Check QState before processing - DO affects LOCAL side
                    let was_yes = matches!(
                        self.options.local_qstate(option),
                        crate::options::QState::Yes
                    );
                    // Process through QState machine
                    if let Some(reply) = self.options.handle_received(frame)? {
                        self.pending_replies.push_back(reply);
                    }
                    // Check if we transitioned to/from Yes state
                    let is_yes = matches!(
                        self.options.local_qstate(option),
                        crate::options::QState::Yes
                    );
                    if is_yes != was_yes {
                        return Ok(Some(TelnetEvent::OptionStatus(
                            option,
                            TelnetSide::Local,
                            is_yes,
                        )));
                    }
                    continue;
                }
                (DecoderState::NegotiateDont, _) => {
                    self.decoder_state = DecoderState::NormalData;
                    let option: TelnetOption = byte.into();
                    let frame = TelnetFrame::Dont(option);
                    // Check QState before processing - DONT affects LOCAL side
                    let was_yes = matches!(
                        self.options.local_qstate(option),
                        crate::options::QState::Yes
                    );
                    // Process through QState machine
                    if let Some(reply) = self.options.handle_received(frame)? {
                        self.pending_replies.push_back(reply);
                    }
                    // Check if we transitioned to/from Yes state
                    let is_yes = matches!(
                        self.options.local_qstate(option),
                        crate::options::QState::Yes
                    );
                    if is_yes != was_yes {
                        return Ok(Some(TelnetEvent::OptionStatus(
                            option,
                            TelnetSide::Local,
                            is_yes,
                        )));
                    }
                    continue;
                }
                (DecoderState::NegotiateWill, _) => {
                    self.decoder_state = DecoderState::NormalData;
                    let option: TelnetOption = byte.into();
                    let frame = TelnetFrame::Will(option);
                    // Check QState before processing - WILL affects REMOTE side
                    let was_yes = matches!(
                        self.options.remote_qstate(option),
                        crate::options::QState::Yes
                    );
                    // Process through QState machine
                    if let Some(reply) = self.options.handle_received(frame)? {
                        self.pending_replies.push_back(reply);
                    }
                    // Check if we transitioned to/from Yes state
                    let is_yes = matches!(
                        self.options.remote_qstate(option),
                        crate::options::QState::Yes
                    );
                    if is_yes != was_yes {
                        return Ok(Some(TelnetEvent::OptionStatus(
                            option,
                            TelnetSide::Remote,
                            is_yes,
                        )));
                    }
                    continue;
                }
                (DecoderState::NegotiateWont, _) => {
                    self.decoder_state = DecoderState::NormalData;
                    let option: TelnetOption = byte.into();
                    let frame = TelnetFrame::Wont(option);
                    // Check QState before processing - WONT affects REMOTE side
                    let was_yes = matches!(
                        self.options.remote_qstate(option),
                        crate::options::QState::Yes
                    );
                    // Process through QState machine
                    if let Some(reply) = self.options.handle_received(frame)? {
                        self.pending_replies.push_back(reply);
                    }
                    // Check if we transitioned to/from Yes state
                    let is_yes = matches!(
                        self.options.remote_qstate(option),
                        crate::options::QState::Yes
                    );
                    if is_yes != was_yes {
                        return Ok(Some(TelnetEvent::OptionStatus(
                            option,
                            TelnetSide::Remote,
                            is_yes,
                        )));
                    }
                    continue;
                }
                (DecoderState::Subnegotiate, _) => {
                    self.decoder_state = DecoderState::SubnegotiateArgument(byte);
                }
                (DecoderState::SubnegotiateArgument(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubnegotiateArgumentIAC(option);
                }
                (DecoderState::SubnegotiateArgument(_option), _) => {
                    self.decoder_buffer.put_u8(byte);
                }
                (DecoderState::SubnegotiateArgumentIAC(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubnegotiateArgument(option);
                    self.decoder_buffer.put_u8(consts::IAC);
                }
                (DecoderState::SubnegotiateArgumentIAC(option), consts::SE) => {
                    self.decoder_state = DecoderState::NormalData;
                    let option = TelnetOption::from_u8(option);
                    let buffer = BytesMut::from(self.decoder_buffer.as_ref());
                    let argument = match option {
                        TelnetOption::GMCP => {
                            // Parse GMCP message from buffer
                            if let Some(gmcp_msg) = GmcpMessage::parse(&buffer) {
                                TelnetArgument::GMCP(gmcp_msg)
                            } else {
                                // If parsing fails, treat as unknown
                                warn!("Failed to parse GMCP message, treating as unknown");
                                TelnetArgument::Unknown(option, buffer)
                            }
                        }
                        TelnetOption::NAWS => match naws::parse(&buffer) {
                            Some(dimensions) => TelnetArgument::NAWSWindowSize(dimensions),
                            None => {
                                warn!("Malformed NAWS subnegotiation, treating as unknown");
                                TelnetArgument::Unknown(option, buffer)
                            }
                        },
                        TelnetOption::TTYPE => match status::parse_ttype(&buffer) {
                            Some(terminal_type) => TelnetArgument::TerminalType(terminal_type),
                            None => TelnetArgument::Unknown(option, buffer),
                        },
                        TelnetOption::Environment | TelnetOption::NewEnvironment => {
                            match new_environ::parse(&buffer) {
                                Some(vars) => TelnetArgument::Environment(vars),
                                None => TelnetArgument::Unknown(option, buffer),
                            }
                        }
                        TelnetOption::Charset => match status::parse_charset(&buffer) {
                            Some(negotiation) => TelnetArgument::Charset(negotiation),
                            None => TelnetArgument::Unknown(option, buffer),
                        },
                        _ => TelnetArgument::Unknown(option, buffer),
                    };
                    self.decoder_buffer.clear();
                    return Ok(Some(TelnetEvent::Subnegotiate(argument)));
                }
                (DecoderState::SubnegotiateArgumentIAC(_), _) => {
                    // TODO: Evaluate if better to return back to SubnegotiateArgumentIAC state and keep buffer
                    self.decoder_state = DecoderState::NormalData;
                    self.decoder_buffer.clear();
                    warn!(
                        "Received Unknown or invalid Command during Subnegotiation {:#X}. Aborting",
                        byte
                    );
                    return Ok(Some(TelnetEvent::NoOperation));
                }
            }
        }
        Ok(None)
    }
}

impl Encoder<char> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: char, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(4);
        if item.is_ascii() {
            let ch = item as u8;
            if ch == consts::IAC {
                dst.put_u8(consts::IAC);
            }
            dst.put_u8(ch);
        } else {
            let mut buf = [0; 4];
            item.encode_utf8(&mut buf);
            dst.put_slice(&buf[0..item.len_utf8()]);
        }
        Ok(())
    }
}

impl Encoder<u8> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: u8, dst: &mut BytesMut) -> Result<(), Self::Error> {
        // Encode a raw byte, escaping IAC if necessary
        dst.reserve(2);
        if item == consts::IAC {
            dst.put_u8(consts::IAC);
        }
        dst.put_u8(item);
        Ok(())
    }
}

impl Encoder<&str> for TelnetCodec {
    type Error = CodecError;
    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        for byte in item.as_bytes() {
            self.encode(TelnetFrame::Data(*byte), dst)?;
        }
        self.encode(TelnetFrame::Data(b'\r'), dst)?;
        self.encode(TelnetFrame::Data(b'\n'), dst)?;
        Ok(())
    }
}

impl Encoder<TelnetFrame> for TelnetCodec {
    type Error = CodecError;

    /// Encodes a `TelnetFrame` into a byte buffer for transmission over the Telnet protocol.
    ///
    /// # Parameters
    ///
    /// - `item`: The `TelnetFrame` variant that represents a specific Telnet command, data, or negotiation to be encoded.
    /// - `dst`: A mutable reference to a [`BytesMut`] buffer where the encoded bytes for the Telnet frame will be appended.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: If the frame was successfully encoded into the destination buffer.
    /// - `Err(Self::Error)`: If an error occurs during the encoding process (handler dependent).
    ///
    /// # Behavior
    ///
    /// The method matches against the specific `TelnetFrame` variants and encodes them
    /// into the required byte sequences for Telnet protocol specifications. Most frames
    /// begin with the `IAC` (Interpret As Command) byte, followed by specific command or
    /// option bytes, and optionally any additional data.
    ///
    /// ## Variants:
    ///
    /// - `TelnetFrame::Data(ch)`: Encodes a single data byte. If the byte is `IAC` (Interpret As Command),
    ///   it is escaped by writing `IAC` twice.
    /// - `TelnetEvent::NoOperation`: Encodes the `NOP` (No Operation) command.
    /// - `TelnetFrame::DataMark`: Encodes the `DM` (Data Mark) command.
    /// - `TelnetFrame::Break`: Encodes the `BRK` (Break) command.
    /// - `TelnetFrame::InterruptProcess`: Encodes the `IP` (Interrupt Process) command.
    /// - `TelnetFrame::AbortOutput`: Encodes the `AO` (Abort Output) command.
    /// - `TelnetFrame::AreYouThere`: Encodes the `AYT` (Are You There?) command.
    /// - `TelnetFrame::EraseCharacter`: Encodes the `EC` (Erase Character) command.
    /// - `TelnetFrame::EraseLine`: Encodes the `EL` (Erase Line) command.
    /// - `TelnetFrame::GoAhead`: Encodes the `GA` (Go Ahead) command.
    /// - `TelnetFrame::Do(option)`: Encodes the `DO` command with the specified `option`.
    /// - `TelnetFrame::Dont(option)`: Encodes the `DONT` command with the specified `option`.
    /// - `TelnetFrame::Will(option)`: Encodes the `WILL` command with the specified `option`.
    /// - `TelnetFrame::Wont(option)`: Encodes the `WONT` command with the specified `option`.
    /// - `TelnetFrame::Subnegotiate(option, arguments)`: Encodes a subnegotiation sequence, consisting of:
    ///     - `IAC SB` prefix (Subnegotiation start).
    ///     - `option`: A byte indicating the option for the subnegotiation.
    ///     - `arguments`: The subnegotiation payload.
    ///     - `IAC SE` suffix (Subnegotiation end).
    ///
    /// # Encoding Buffer
    ///
    /// The method uses an internal buffer `encoder_buffer`, which is first cleared, then used to construct
    /// the encoded frame. Space is reserved in the buffer prior to encoding to ensure efficiency. After
    /// encoding, the content of `encoder_buffer` is appended to the `dst` buffer.
    ///
    /// # Errors
    ///
    /// This method generally does not produce errors unless there's a fault introduced by the implementing
    /// context (e.g., `Self::Error` defined by the encoder implementation).
    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetFrame::Data(ch) => {
                dst.reserve(2);
                if ch == consts::IAC {
                    dst.put_u8(consts::IAC);
                }
                dst.put_u8(ch);
            }
            TelnetFrame::NoOperation => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::NOP);
            }
            TelnetFrame::DataMark => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::DM);
            }
            TelnetFrame::Break => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::BRK);
            }
            TelnetFrame::InterruptProcess => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::IP);
            }
            TelnetFrame::AbortOutput => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::AO);
            }
            TelnetFrame::AreYouThere => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::AYT);
            }
            TelnetFrame::EraseCharacter => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::EC);
            }
            TelnetFrame::EraseLine => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::EL);
            }
            TelnetFrame::GoAhead => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::GA);
            }
            TelnetFrame::EndOfRecord => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::EOR);
            }
            TelnetFrame::Do(option) => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::DO);
                dst.put_u8(option.into());
            }
            TelnetFrame::Dont(option) => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::DONT);
                dst.put_u8(option.into());
            }
            TelnetFrame::Will(option) => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::WILL);
                dst.put_u8(option.into());
            }
            TelnetFrame::Wont(option) => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::WONT);
                dst.put_u8(option.into());
            }
            TelnetFrame::Subnegotiate(argument) => {
                dst.reserve(5 + argument.len());
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SB);
                dst.put_u8(argument.option().to_u8());
                argument.encode(dst)?;
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SE);
            }
        }
        Ok(())
    }
}

impl Encoder<TelnetEvent> for TelnetCodec {
    type Error = CodecError;

    /// Encodes a `TelnetEvent` into a byte buffer for transmission over the Telnet protocol.
    ///
    /// Note: `OptionStatus` events are informational only and cannot be encoded.
    /// They represent completed negotiations and are emitted by the decoder.
    fn encode(&mut self, item: TelnetEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetEvent::Data(byte) => self.encode(TelnetFrame::Data(byte), dst),
            TelnetEvent::NoOperation => self.encode(TelnetEvent::NoOperation, dst),
            TelnetEvent::DataMark => self.encode(TelnetFrame::DataMark, dst),
            TelnetEvent::Break => self.encode(TelnetFrame::Break, dst),
            TelnetEvent::InterruptProcess => self.encode(TelnetFrame::InterruptProcess, dst),
            TelnetEvent::AbortOutput => self.encode(TelnetFrame::AbortOutput, dst),
            TelnetEvent::AreYouThere => self.encode(TelnetFrame::AreYouThere, dst),
            TelnetEvent::EraseCharacter => self.encode(TelnetFrame::EraseCharacter, dst),
            TelnetEvent::EraseLine => self.encode(TelnetFrame::EraseLine, dst),
            TelnetEvent::GoAhead => self.encode(TelnetFrame::GoAhead, dst),
            TelnetEvent::EndOfRecord => self.encode(TelnetFrame::EndOfRecord, dst),
            TelnetEvent::Subnegotiate(arg) => self.encode(TelnetFrame::Subnegotiate(arg), dst),
            TelnetEvent::OptionStatus(_option, _side, _enabled) => {
                // OptionStatus events are informational only and cannot be encoded
                // They represent the result of negotiation, not a command to send
                warn!("Attempted to encode OptionStatus event - this is informational only");
                Ok(())
            }
        }
    }
}

///
/// Represents the internal state of a Telnet decoder.
/// This enumeration is used to track the current decoding context while processing Telnet protocol
/// messages.
///
/// # Variants
///
/// - `NormalData`:
///   This state indicates that the decoder is in a normal data mode, processing raw incoming data.
///
/// - `InterpretAsCommand`:
///   This state is entered when an IAC (Interpret As Command) byte is received.
///   The next byte is expected to encode a Telnet command.
///
/// - `NegotiateDo`:
///   This state is entered when a DO command is received. The next byte will indicate the option
///   being requested for negotiation.
///
/// - `NegotiateDont`:
///   This state indicates that a DONT command has been received. The next byte will specify the
///   option to cease negotiation.
///
/// - `NegotiateWill`:
///   This state occurs when a WILL command is received. The next byte is expected to specify the
///   option that the sender will negotiate.
///
/// - `NegotiateWont`:
///   This state is entered upon receiving a WONT command. The subsequent byte specifies which
///   option the sender will not negotiate.
///
/// - `Subnegotiate`:
///   This state indicates the beginning of subnegotiation, where the next byte will specify the
///   option being negotiated.
///
/// - `SubnegotiateArgument(u8)`:
///   Represents the sub-negotiation argument state.
///   Contains the option identifier (as u8) being negotiated. Subsequent bytes comprise the
///   argument data for the subnegotiation.
///
/// - `SubnegotiateArgumentIAC(u8)`:
///   Represents the sub-negotiation state when an IAC (Interpret As Command) byte is received
///   during subnegotiation. Contains the option identifier (as u8). The next byte is expected to
///   indicate a Telnet command or other subnegotiation-specific action.
///
/// # Usage
///
/// This enum is designed to guide the processing logic in a Telnet decoder, ensuring proper
/// handling of each state and transition. By maintaining an appropriate state, the decoder can
/// accurately interpret commands, negotiate options, and process subnegotiation arguments.
/// ```
#[derive(Clone, Copy, Debug)]
enum DecoderState {
    /// Normal Data
    NormalData,
    /// Received IAC, Next byte is Command
    InterpretAsCommand,
    /// Received DO Command, Next Byte is arguments
    NegotiateDo,
    /// Received DONT Command, Next Byte is arguments
    NegotiateDont,
    /// Received WILL Command, Next Byte is arguments
    NegotiateWill,
    /// Received WONT Command, Next Byte is arguments
    NegotiateWont,
    /// Received Subnegotiate Command, Next Byte is arguments
    Subnegotiate,
    /// Received Subnegotiate Option, Next Bytes are arguments
    SubnegotiateArgument(u8),
    /// Received IAC during Subnegotiation, Next Byte is command
    SubnegotiateArgumentIAC(u8),
}
