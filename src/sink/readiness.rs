// SPDX-License-Identifier: Apache-2.0

//! Startup handshake with the logging sink.
//!
//! The forwarder is typically started alongside the syslog daemon and may
//! win the race, with no receive socket to talk to yet. Rather than fail
//! or spin, we probe once per second for a bounded number of attempts and
//! report the outcome; the caller proceeds either way.

use std::os::unix::net::UnixDatagram;
use std::time::Duration;
use tracing::debug;

/// Probe the sink socket at `path` until it accepts a connection or
/// `max_seconds` attempts (one per elapsed second) have been made.
///
/// A `false` result is advisory only and never aborts startup. Probe
/// creation failure (the socket syscall itself) aborts the wait early:
/// retrying cannot fix that.
pub async fn wait_for_sink(path: &str, max_seconds: u64) -> bool {
    for attempt in 1..=max_seconds {
        let probe = match UnixDatagram::unbound() {
            Ok(probe) => probe,
            Err(e) => {
                debug!(error = %e, "sink probe socket creation failed");
                return false;
            }
        };

        match probe.connect(path) {
            Ok(()) => {
                debug!(attempt, path, "sink socket is accepting connections");
                return true;
            }
            Err(e) => debug!(attempt, path, error = %e, "sink socket not ready"),
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_bounded_attempts() {
        let started = tokio::time::Instant::now();
        assert!(!wait_for_sink("/nonexistent/klogfwd-probe.sock", 3).await);
        // One probe per second, three attempts.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn reports_ready_sink_immediately() {
        let path = std::env::temp_dir().join(format!("klogfwd-ready-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let _server = UnixDatagram::bind(&path).unwrap();

        assert!(wait_for_sink(path.to_str().unwrap(), 1).await);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn zero_timeout_means_no_attempts() {
        assert!(!wait_for_sink("/nonexistent/klogfwd-probe.sock", 0).await);
    }
}
