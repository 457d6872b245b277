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

use crate::args::TelnetArgument;
use crate::options::TelnetOption;

/// One low-level Telnet sidechannel unit, as it appears on the wire. This is
/// the codec's internal vocabulary: `TelnetCodec::decode` produces the
/// higher-level [`crate::TelnetEvent`] by running frames through the
/// [`crate::options::TelnetOptions`] Q-method engine first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelnetFrame {
    /// A single byte of ordinary data (already de-escaped from `IAC IAC`).
    Data(u8),
    /// `IAC NOP`.
    NoOperation,
    /// `IAC DM`.
    DataMark,
    /// `IAC BRK`.
    Break,
    /// `IAC IP`.
    InterruptProcess,
    /// `IAC AO`.
    AbortOutput,
    /// `IAC AYT`.
    AreYouThere,
    /// `IAC EC`.
    EraseCharacter,
    /// `IAC EL`.
    EraseLine,
    /// `IAC GA`.
    GoAhead,
    /// `IAC EOR`.
    EndOfRecord,
    /// `IAC DO <option>`: a request that we enable `option`.
    Do(TelnetOption),
    /// `IAC DONT <option>`: a request that we disable `option`.
    Dont(TelnetOption),
    /// `IAC WILL <option>`: a notice that the peer enables `option`.
    Will(TelnetOption),
    /// `IAC WONT <option>`: a notice that the peer disables `option`.
    Wont(TelnetOption),
    /// `IAC SB <option> <data...> IAC SE`.
    Subnegotiate(TelnetArgument),
}
