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

//! Line accumulator: turns the byte-at-a-time `TelnetEvent::Data` stream
//! into completed command lines (§4.2 actions 1-3).
//!
//! Encoding-awareness lives here rather than in `nvt-codec`: the codec only
//! knows about Telnet framing, while which bytes are "printable" and how
//! they combine into code points depends on the encoding a descriptor has
//! negotiated (§4.2's Latin-1/UTF-8/ASCII split).

use crate::types::Encoding;

/// Maximum accumulated line length, in bytes, before the excess is dropped
/// and counted in `input_lost` (§4.2's `LINE_MAX`).
pub const LINE_MAX: usize = 4096;

/// Accumulates raw input bytes into complete lines, honoring the
/// negotiated encoding and the no-mid-code-point-commit invariant (§8).
pub struct LineAccumulator {
    encoding: Encoding,
    line: String,
    /// Bytes of an in-progress, not-yet-decodable UTF-8 sequence.
    pending: Vec<u8>,
    /// Bytes dropped due to `LINE_MAX` overflow or invalid encoding.
    input_lost: u64,
}

impl LineAccumulator {
    /// Build an accumulator for a descriptor that has negotiated `encoding`.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            line: String::new(),
            pending: Vec::new(),
            input_lost: 0,
        }
    }

    /// Switch encodings, e.g. after CHARSET or NEW-ENVIRON negotiation
    /// changes it mid-session. Resets any in-progress code point, per
    /// §4.2's "switch encoding ... reset codepoint DFA".
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
        self.input_lost += self.pending.len() as u64;
        self.pending.clear();
    }

    /// Total bytes dropped so far.
    pub fn input_lost(&self) -> u64 {
        self.input_lost
    }

    /// The current, not-yet-terminated line contents.
    pub fn current_line(&self) -> &str {
        &self.line
    }

    /// Feed one raw input byte. Returns `Some(line)` when a line terminator
    /// (LF, optionally preceded by CR) completes a command.
    pub fn feed_byte(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\n' => {
                let line = std::mem::take(&mut self.line);
                Some(line)
            }
            b'\r' => None,
            _ => {
                self.accept(byte);
                None
            }
        }
    }

    /// Action 2: erase the previous character, dropping a partial
    /// multi-byte sequence first if one is in progress. A no-op on an
    /// already-empty line (§8's erase-idempotence invariant).
    pub fn erase_character(&mut self) {
        if !self.pending.is_empty() {
            self.input_lost += self.pending.len() as u64;
            self.pending.clear();
            return;
        }
        self.line.pop();
    }

    /// Action matching `EraseLine`: discard the whole in-progress line.
    pub fn erase_line(&mut self) {
        self.input_lost += self.pending.len() as u64;
        self.pending.clear();
        self.line.clear();
    }

    fn accept(&mut self, byte: u8) {
        if self.line.len() + self.pending.len() >= LINE_MAX {
            self.input_lost += 1;
            return;
        }
        match self.encoding {
            Encoding::Latin1 => {
                // Every Latin-1 byte is a valid code point; printable
                // range excludes the C0/C1 control blocks.
                if is_printable_latin1(byte) {
                    self.line.push(byte as char);
                } else {
                    self.input_lost += 1;
                }
            }
            Encoding::Utf8 => self.accept_utf8(byte),
        }
    }

    fn accept_utf8(&mut self, byte: u8) {
        self.pending.push(byte);
        match std::str::from_utf8(&self.pending) {
            Ok(s) => {
                if let Some(ch) = s.chars().next() {
                    if is_printable_char(ch) {
                        self.line.push(ch);
                    } else {
                        self.input_lost += self.pending.len() as u64;
                    }
                }
                self.pending.clear();
            }
            Err(e) => {
                if e.error_len().is_some() || self.pending.len() >= 4 {
                    // A definitively invalid byte, or a lead byte that
                    // never resolved within the max UTF-8 sequence
                    // length: drop what's accumulated and resync.
                    self.input_lost += self.pending.len() as u64;
                    self.pending.clear();
                }
                // Otherwise the sequence is merely incomplete so far;
                // keep buffering without committing anything.
            }
        }
    }
}

fn is_printable_latin1(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7E | 0xA0..=0xFF)
}

fn is_printable_char(ch: char) -> bool {
    !ch.is_control()
}
