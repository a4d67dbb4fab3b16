// SPDX-License-Identifier: Apache-2.0

//! Minimal RFC 3164 datagram client for the local syslog socket.
//!
//! Writes are best-effort by contract: the forwarding daemon must survive
//! sink outages without exiting or blocking, so a failed send attempts one
//! reconnect and otherwise drops the record with a console-side
//! diagnostic.

use crate::sink::{Facility, KernelLogSink, Severity};
use chrono::Local;
use std::io;
use std::os::unix::net::UnixDatagram;
use tracing::{debug, warn};

/// Well-known receive socket of the local syslog daemon.
pub const SYSLOG_SOCKET_PATH: &str = "/dev/log";

/// Severity-leveled client for the local log collector.
///
/// Every record is tagged with the identifier and facility given at open
/// time; kernel-origin records stay distinguishable downstream from the
/// records of ordinary daemons.
pub struct SyslogSink {
    socket: Option<UnixDatagram>,
    path: String,
    identifier: String,
    facility: Facility,
}

impl SyslogSink {
    /// Create a sink for the socket at `path`.
    ///
    /// The connection itself is best-effort: if the socket is not there
    /// yet, records are dropped until a later write manages to connect.
    pub fn open(path: &str, identifier: &str, facility: Facility) -> Self {
        let socket = match Self::connect(path) {
            Ok(socket) => Some(socket),
            Err(e) => {
                warn!(path, error = %e, "syslog socket not reachable at open");
                None
            }
        };

        Self {
            socket,
            path: path.to_string(),
            identifier: identifier.to_string(),
            facility,
        }
    }

    fn connect(path: &str) -> io::Result<UnixDatagram> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(path)?;
        Ok(socket)
    }

    fn format(&self, severity: Severity, message: &str) -> String {
        let pri = self.facility.pri(severity);
        let stamp = Local::now().format("%b %e %H:%M:%S");
        format!("<{}>{} {}: {}", pri, stamp, self.identifier, message)
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        match &self.socket {
            Some(socket) => socket.send(frame).map(|_| ()),
            None => Err(io::Error::from(io::ErrorKind::NotConnected)),
        }
    }
}

impl KernelLogSink for SyslogSink {
    /// Send one record. A failed send reconnects once and retries; a
    /// record that still cannot be delivered is dropped.
    fn write(&mut self, severity: Severity, message: &str) {
        let frame = self.format(severity, message);

        if self.send(frame.as_bytes()).is_ok() {
            return;
        }

        match Self::connect(&self.path) {
            Ok(socket) => {
                self.socket = Some(socket);
                if let Err(e) = self.send(frame.as_bytes()) {
                    debug!(severity = severity.as_str(), error = %e, "record dropped, syslog unreachable");
                }
            }
            Err(e) => {
                self.socket = None;
                debug!(severity = severity.as_str(), error = %e, "record dropped, syslog unreachable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn socket_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("klogfwd-{}-{}.sock", tag, std::process::id()))
    }

    fn bind_server(path: &PathBuf) -> UnixDatagram {
        let _ = std::fs::remove_file(path);
        let server = UnixDatagram::bind(path).unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        server
    }

    fn recv_frame(server: &UnixDatagram) -> String {
        let mut buf = [0u8; 2048];
        let n = server.recv(&mut buf).unwrap();
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }

    #[test]
    fn frame_carries_pri_and_identifier() {
        let sink = SyslogSink::open("/nonexistent/log.sock", "kernel", Facility::Kern);
        let frame = sink.format(Severity::Error, "disk on fire");
        assert!(frame.starts_with("<3>"), "frame was: {frame}");
        assert!(frame.ends_with("kernel: disk on fire"), "frame was: {frame}");
    }

    #[test]
    fn write_delivers_datagram() {
        let path = socket_path("sink-write");
        let server = bind_server(&path);

        let mut sink = SyslogSink::open(path.to_str().unwrap(), "kernel", Facility::Kern);
        sink.write(Severity::Info, "eth0: link up");

        let frame = recv_frame(&server);
        assert!(frame.starts_with("<6>"), "frame was: {frame}");
        assert!(frame.ends_with("kernel: eth0: link up"), "frame was: {frame}");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn write_reconnects_when_sink_appears_late() {
        let path = socket_path("sink-late");
        let _ = std::fs::remove_file(&path);

        // Open before the socket exists: records are dropped, not errors.
        let mut sink = SyslogSink::open(path.to_str().unwrap(), "kernel", Facility::Kern);
        sink.write(Severity::Notice, "lost to the void");

        let server = bind_server(&path);
        sink.write(Severity::Notice, "back on the air");

        let frame = recv_frame(&server);
        assert!(frame.ends_with("kernel: back on the air"), "frame was: {frame}");

        let _ = std::fs::remove_file(&path);
    }
}
