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

//! Raw Telnet sidechannel byte constants (RFC 854/855 command codes and
//! IANA-registered option codes).

/// Interpret As Command.
pub const IAC: u8 = 255;
/// Don't.
pub const DONT: u8 = 254;
/// Do.
pub const DO: u8 = 253;
/// Won't.
pub const WONT: u8 = 252;
/// Will.
pub const WILL: u8 = 251;
/// Subnegotiation Begin.
pub const SB: u8 = 250;
/// Go Ahead.
pub const GA: u8 = 249;
/// Erase Line.
pub const EL: u8 = 248;
/// Erase Character.
pub const EC: u8 = 247;
/// Are You There.
pub const AYT: u8 = 246;
/// Abort Output.
pub const AO: u8 = 245;
/// Interrupt Process.
pub const IP: u8 = 244;
/// Break.
pub const BRK: u8 = 243;
/// Data Mark.
pub const DM: u8 = 242;
/// No Operation.
pub const NOP: u8 = 241;
/// Subnegotiation End.
pub const SE: u8 = 240;
/// End of Record (also negotiated as an option).
pub const EOR: u8 = 239;

/// Carriage return.
pub const CR: u8 = b'\r';
/// Line feed.
pub const LF: u8 = b'\n';
/// Null, the NVT-mandated companion byte to a bare CR.
pub const NUL: u8 = 0;

/// IANA-registered Telnet option codes.
pub mod option {
    pub const BINARY: u8 = 0;
    pub const ECHO: u8 = 1;
    pub const RCP: u8 = 2;
    pub const SGA: u8 = 3;
    pub const NAMS: u8 = 4;
    pub const STATUS: u8 = 5;
    pub const TM: u8 = 6;
    pub const RCTE: u8 = 7;
    pub const NAOL: u8 = 8;
    pub const NAOP: u8 = 9;
    pub const NAOCRD: u8 = 10;
    pub const NAOHTS: u8 = 11;
    pub const NAOHTD: u8 = 12;
    pub const NAOFFD: u8 = 13;
    pub const NAOVTS: u8 = 14;
    pub const NAOVTD: u8 = 15;
    pub const NAOLFD: u8 = 16;
    pub const XASCII: u8 = 17;
    pub const LOGOUT: u8 = 18;
    pub const BM: u8 = 19;
    pub const DET: u8 = 20;
    pub const SUPDUP: u8 = 21;
    pub const SUPDUP_OUTPUT: u8 = 22;
    pub const SNDLOC: u8 = 23;
    pub const TTYPE: u8 = 24;
    pub const EOR: u8 = 25;
    pub const TUID: u8 = 26;
    pub const OUTMRK: u8 = 27;
    pub const TTYLOC: u8 = 28;
    pub const OPT3270REGIME: u8 = 29;
    pub const X3PAD: u8 = 30;
    pub const NAWS: u8 = 31;
    pub const TSPEED: u8 = 32;
    pub const LFLOW: u8 = 33;
    pub const LINEMODE: u8 = 34;
    pub const XDISPLOC: u8 = 35;
    pub const OLD_ENVIRONMENT: u8 = 36;
    pub const AUTHENTICATION: u8 = 37;
    pub const ENCRYPTION: u8 = 38;
    pub const NEW_ENVIRONMENT: u8 = 39;
    pub const TN3270E: u8 = 40;
    pub const XAUTH: u8 = 41;
    pub const CHARSET: u8 = 42;
    pub const RSP: u8 = 43;
    pub const TRSP: u8 = 43;
    pub const COM_PORT_CONTROL: u8 = 44;
    pub const CPCO: u8 = 44;
    pub const SUPPRESS_LOCAL_ECHO: u8 = 45;
    pub const TSLE: u8 = 45;
    pub const START_TLS: u8 = 46;
    pub const KERMIT: u8 = 47;
    pub const SENDURL: u8 = 48;
    pub const FORWARDX: u8 = 49;
    pub const MSDP: u8 = 69;
    pub const MSSP: u8 = 70;
    pub const COMPRESS1: u8 = 85;
    pub const COMPRESS2: u8 = 86;
    pub const ZMP: u8 = 93;
    pub const PRAGMA_LOGIN: u8 = 138;
    pub const SSPI_LOGIN: u8 = 139;
    pub const PRAGMA_HEARTBEAT: u8 = 140;
    pub const GMCP: u8 = 201;
    pub const EXOPL: u8 = 255;

    /// Per-option `(supported_local, supported_remote)` table, indexed by
    /// raw option byte. Everything we don't actively implement defaults to
    /// unsupported in both directions; the negotiation engine still tracks
    /// state for unsupported options, it just always answers WONT/DONT.
    pub const SUPPORT: [(bool, bool); 256] = build_support();

    const fn build_support() -> [(bool, bool); 256] {
        let mut table = [(false, false); 256];
        table[BINARY as usize] = (true, true);
        table[ECHO as usize] = (true, false);
        table[SGA as usize] = (true, true);
        table[NAWS as usize] = (false, true);
        table[TTYPE as usize] = (false, true);
        table[OLD_ENVIRONMENT as usize] = (false, true);
        table[NEW_ENVIRONMENT as usize] = (false, true);
        table[CHARSET as usize] = (true, true);
        table[START_TLS as usize] = (true, true);
        table[EOR as usize] = (true, true);
        table[GMCP as usize] = (true, true);
        table[MSDP as usize] = (true, true);
        table[MSSP as usize] = (true, false);
        table
    }
}
