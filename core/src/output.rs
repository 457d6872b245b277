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

//! Per-descriptor output queue with backpressure.
//!
//! This is a direct translation of the legacy output-chain design (queue of
//! blocks, head block LOCKED while a write is in flight) onto a single
//! `tokio` write half: only one write future is ever polled per descriptor
//! at a time, which is what makes "LOCKED" true by construction rather than
//! an explicit flag (see `DESIGN.md`'s resolution of this open question).

use bytes::BytesMut;
use std::collections::VecDeque;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// One pending chunk of output bytes.
struct OutputBlock {
    data: BytesMut,
    start: usize,
}

impl OutputBlock {
    fn remaining(&self) -> &[u8] {
        &self.data[self.start..]
    }

    fn is_empty(&self) -> bool {
        self.start >= self.data.len()
    }
}

/// The result of a single `drain` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The chain is now empty; nothing left to write.
    Drained,
    /// A write would block; the caller should retry on writable readiness.
    WouldBlock,
    /// The underlying stream reported a fatal write error; the caller
    /// should treat this as a dead connection (`shutdown(SOCKDIED)`).
    Fatal,
}

/// A descriptor's outbound byte queue.
///
/// `queue_bytes` never fails for lack of space; it grows without bound up
/// to `cap` bytes of *unsent* data, past which additional bytes are
/// silently dropped and counted in `output_lost` — the cap is a policy
/// knob, not a protocol requirement.
pub struct OutputChain {
    blocks: VecDeque<OutputBlock>,
    /// Bytes currently queued and not yet written.
    output_size: usize,
    /// Bytes dropped because the chain was over `cap` when queued.
    output_lost: u64,
    /// Total bytes ever queued (lost or not), monotone non-decreasing.
    output_tot: u64,
    cap: usize,
}

impl OutputChain {
    /// Build an empty chain with the given backpressure cap, in bytes.
    pub fn new(cap: usize) -> Self {
        Self {
            blocks: VecDeque::new(),
            output_size: 0,
            output_lost: 0,
            output_tot: 0,
            cap,
        }
    }

    /// Bytes currently queued and unsent.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Bytes dropped to backpressure so far.
    pub fn output_lost(&self) -> u64 {
        self.output_lost
    }

    /// Total bytes ever queued, including dropped ones.
    pub fn output_tot(&self) -> u64 {
        self.output_tot
    }

    /// Whether there is anything left to write.
    pub fn has_pending(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Append bytes to the tail block, respecting the backpressure cap.
    pub fn queue_bytes(&mut self, buf: &[u8]) {
        self.output_tot = self.output_tot.saturating_add(buf.len() as u64);

        let room = self.cap.saturating_sub(self.output_size);
        if room == 0 {
            self.output_lost = self.output_lost.saturating_add(buf.len() as u64);
            return;
        }
        let (accepted, dropped) = if buf.len() > room {
            (&buf[..room], buf.len() - room)
        } else {
            (buf, 0)
        };
        if dropped > 0 {
            self.output_lost = self.output_lost.saturating_add(dropped as u64);
        }
        if accepted.is_empty() {
            return;
        }
        match self.blocks.back_mut() {
            Some(tail) => tail.data.extend_from_slice(accepted),
            None => {
                let mut data = BytesMut::with_capacity(accepted.len());
                data.extend_from_slice(accepted);
                self.blocks.push_back(OutputBlock { data, start: 0 });
            }
        }
        self.output_size += accepted.len();
    }

    /// Write the head block (and successive ones) until the chain is
    /// empty or the writer reports it would block / a fatal error occurs.
    ///
    /// At most one block is ever "in flight": the head. Advancing past an
    /// empty head and continuing into the next block within the same call
    /// is what lets one `drain` call flush several small queued writes in
    /// one pass without leaving spurious empty blocks at the head.
    pub async fn drain<W>(&mut self, writer: &mut W) -> DrainOutcome
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(block) = self.blocks.front_mut() {
            if block.is_empty() {
                self.blocks.pop_front();
                continue;
            }
            match writer.write(block.remaining()).await {
                Ok(0) => {
                    warn!("output write returned 0 bytes; treating as fatal");
                    return DrainOutcome::Fatal;
                }
                Ok(n) => {
                    block.start += n;
                    self.output_size -= n;
                    if block.is_empty() {
                        self.blocks.pop_front();
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    return DrainOutcome::WouldBlock;
                }
                Err(e) => {
                    debug!(error = %e, "output drain fatal error");
                    return DrainOutcome::Fatal;
                }
            }
        }
        DrainOutcome::Drained
    }
}
