// SPDX-License-Identifier: Apache-2.0

//! Line reassembly for the kernel log stream.
//!
//! `/proc/kmsg` hands back raw byte runs that may split a single kernel
//! message across reads, or pack several messages into one. The reassembler
//! stitches chunks back into discrete records, strips the optional `<N>`
//! syslog priority prefix from each, and caps runaway lines by emitting
//! forced-split continuation records.
//!
//! Example: `<6>eth0: link up\n` yields one record with priority 6 and
//! message `eth0: link up`.

/// Hard cap on a single reassembled message body. A run longer than this
/// is emitted in forced-split continuation records.
pub const MAX_LINE_LEN: usize = 1000;

/// Priority assigned to messages that carry no `<N>` prefix (LOG_WARNING).
pub const DEFAULT_PRIORITY: u32 = 4;

/// Prefix parser state, scoped to one message accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Nothing seen yet; a `<` would begin a priority prefix.
    Ready,
    /// Inside `<N`, accumulating digits.
    Started,
    /// Prefix finished or ruled out; remaining bytes belong to the body.
    Done,
}

/// One reconstructed kernel log record.
///
/// The priority is the raw accumulated prefix value; mapping onto a syslog
/// severity happens at the sink boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelRecord {
    pub priority: u32,
    pub message: String,
}

/// Incremental reassembler over the kernel log byte stream.
///
/// Holds the bytes of the message currently being assembled plus the prefix
/// parser state. Owned by a single caller; instances are independent so the
/// daemon and tests never share buffering state.
pub struct Reassembler {
    buf: Vec<u8>,
    state: ParseState,
    priority: u32,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_LINE_LEN),
            state: ParseState::Ready,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Consume one chunk of raw bytes, returning the records it completed
    /// in input order.
    ///
    /// Every byte is consumed exactly once: as a terminator, as part of a
    /// priority prefix, or appended to a message body. A terminator
    /// (newline or NUL) always emits, even for an empty body — kernel
    /// continuation records depend on that.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<KernelRecord> {
        let mut records = Vec::new();

        for &c in chunk {
            if c == b'\n' || c == 0 {
                records.push(self.emit());
                self.buf.clear();
                self.state = ParseState::Ready;
                self.priority = DEFAULT_PRIORITY;
                continue;
            }

            if self.buf.len() >= MAX_LINE_LEN {
                // Forced split. Only the buffer resets: parse state and
                // pending priority survive, so a continuation keeps the
                // priority already established for the line.
                records.push(self.emit());
                self.buf.clear();
            }

            match (self.state, c) {
                (ParseState::Ready, b'<') => {
                    self.priority = 0;
                    self.state = ParseState::Started;
                }
                (ParseState::Started, b'0'..=b'9') => {
                    // Wrapping on absurd digit runs, matching the unguarded
                    // accumulation of the classic forwarders.
                    self.priority = self
                        .priority
                        .wrapping_mul(10)
                        .wrapping_add(u32::from(c - b'0'));
                }
                (ParseState::Started, b'>') => {
                    self.state = ParseState::Done;
                }
                _ => {
                    self.state = ParseState::Done;
                    self.buf.push(c);
                }
            }
        }

        records
    }

    /// Force out whatever is buffered as a single final record.
    ///
    /// Used by the shutdown drain so a message interrupted mid-assembly is
    /// not dropped. Returns `None` when nothing is buffered.
    pub fn flush(&mut self) -> Option<KernelRecord> {
        if !self.has_pending() {
            return None;
        }
        self.feed(b"\n").pop()
    }

    /// True when bytes of a partially assembled message are buffered.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    fn emit(&self) -> KernelRecord {
        KernelRecord {
            priority: self.priority,
            // Kernel output is ASCII in practice, but a message is never
            // dropped for encoding reasons.
            message: String::from_utf8_lossy(&self.buf).into_owned(),
        }
    }
}
