// SPDX-License-Identifier: Apache-2.0

//! Non-blocking reader for the kernel log stream.
//!
//! `/proc/kmsg` is a destructive-read interface over the kernel ring
//! buffer: bytes are consumed as they are read, and a read with nothing
//! buffered returns EAGAIN once the descriptor is non-blocking. Records
//! carry an optional `<N>` priority prefix and are newline terminated, but
//! a single read may end mid-record; reassembly is the parser's concern,
//! not the source's.

use crate::source::error::{Result, SourceError};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, warn};

/// Kernel log stream device.
pub const KLOG_PROC_PATH: &str = "/proc/kmsg";

/// Bytes requested per read. Kernel records are bounded well below this,
/// so one chunk always holds at least one complete record worth of bytes.
pub const READ_CHUNK_SIZE: usize = 4096;

/// klogctl(2) action: re-enable printk'ing to the console.
const SYSLOG_ACTION_CONSOLE_ON: libc::c_int = 7;

/// Outcome of one bounded read from the kernel log source.
#[derive(Debug)]
pub enum ReadOutcome {
    /// `n` bytes were placed at the front of the chunk.
    Data(usize),
    /// Nothing buffered right now (EAGAIN); readiness was cleared and the
    /// next read waits on the reactor again.
    WouldBlock,
    /// The read was interrupted by a signal (EINTR); retry immediately.
    Interrupted,
    /// Unrecoverable read failure. The kernel log source is assumed always
    /// available, so there is no retry path for this.
    Failed(std::io::Error),
}

/// Kernel log stream handle, registered with the async reactor.
#[derive(Debug)]
pub struct KlogSource {
    inner: AsyncFd<File>,
}

impl KlogSource {
    /// Open the kernel log stream in non-blocking mode.
    pub fn open(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| SourceError::Open {
                path: path.to_string(),
                source: e,
            })?;

        let inner =
            AsyncFd::with_interest(file, Interest::READABLE).map_err(|e| SourceError::Register {
                path: path.to_string(),
                source: e,
            })?;

        debug!(path, "kernel log source opened");

        Ok(Self { inner })
    }

    /// Perform one bounded read, suspending until the reactor reports the
    /// source readable. EINTR and EAGAIN are classified, never raised.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let mut guard = match self.inner.readable().await {
            Ok(guard) => guard,
            Err(e) => return ReadOutcome::Failed(e),
        };

        let fd = guard.get_inner().as_raw_fd();
        let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };

        if n < 0 {
            let err = std::io::Error::last_os_error();
            return match err.kind() {
                std::io::ErrorKind::WouldBlock => {
                    guard.clear_ready();
                    ReadOutcome::WouldBlock
                }
                std::io::ErrorKind::Interrupted => ReadOutcome::Interrupted,
                _ => ReadOutcome::Failed(err),
            };
        }

        ReadOutcome::Data(n as usize)
    }

    /// Re-enable kernel message printing to the console.
    ///
    /// The daemon has been consuming the message stream in its place, so
    /// this runs once during drain. Best-effort: needs CAP_SYSLOG, and a
    /// refusal must not derail shutdown.
    pub fn restore_console(&self) {
        let rc = unsafe { libc::klogctl(SYSLOG_ACTION_CONSOLE_ON, std::ptr::null_mut(), 0) };
        if rc < 0 {
            warn!(
                error = %std::io::Error::last_os_error(),
                "failed to restore console log forwarding"
            );
        } else {
            debug!("console log forwarding restored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_missing_source() {
        let err = KlogSource::open("/nonexistent/kmsg").unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
