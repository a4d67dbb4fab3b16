//! Daemon lifecycle: startup sequencing, the running phase, and the drain
//! sequence on shutdown.

use crate::ingest;
use crate::reassembler::Reassembler;
use crate::sink::readiness::wait_for_sink;
use crate::sink::syslog::SyslogSink;
use crate::sink::{Facility, KernelLogSink, Severity};
use crate::source::klog::KlogSource;
use std::error::Error;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Identifier stamped on every record the daemon writes to the sink.
pub const SYSLOG_IDENTIFIER: &str = "kernel";

/// Lifecycle phase of the daemon process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Running,
    Draining,
    Terminated,
}

/// Runtime configuration, fixed at startup from the parsed arguments.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub start_delay_secs: u64,
    pub sink_wait_secs: u64,
    pub foreground: bool,
    pub status_log: bool,
    pub source_path: String,
    pub sink_path: String,
}

/// The forwarding daemon.
///
/// Owns the configuration and the lifecycle phase; everything else
/// (source, sink, reassembler) lives only inside [`Daemon::run`].
pub struct Daemon {
    config: DaemonConfig,
    phase: Phase,
}

impl Daemon {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config,
            phase: Phase::Initializing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "lifecycle transition");
        self.phase = phase;
    }

    /// Run the daemon to completion.
    ///
    /// Returns `Ok` after a clean cancellation-driven shutdown (flush,
    /// console restore, exit notice), `Err` if the ingestion loop hit a
    /// fatal source error — in which case the drain sequence is skipped
    /// and the process exits with a failure status.
    pub async fn run(
        mut self,
        cancel: CancellationToken,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!(
            delay_secs = self.config.start_delay_secs,
            sink_wait_secs = self.config.sink_wait_secs,
            foreground = self.config.foreground,
            status_log = self.config.status_log,
            source = %self.config.source_path,
            sink = %self.config.sink_path,
            "starting kernel log forwarder"
        );

        if self.config.start_delay_secs > 0 {
            debug!(secs = self.config.start_delay_secs, "delaying startup");
            tokio::time::sleep(Duration::from_secs(self.config.start_delay_secs)).await;
        }

        if !wait_for_sink(&self.config.sink_path, self.config.sink_wait_secs).await {
            warn!(path = %self.config.sink_path, "syslog sink not ready, forwarding anyway");
        }

        let mut source = KlogSource::open(&self.config.source_path)?;
        let mut sink = SyslogSink::open(&self.config.sink_path, SYSLOG_IDENTIFIER, Facility::Kern);
        let mut reassembler = Reassembler::new();

        sink.write(Severity::Notice, "klogfwd: started");
        self.set_phase(Phase::Running);

        match ingest::run(&mut source, &mut sink, &mut reassembler, cancel).await {
            Ok(()) => {
                self.set_phase(Phase::Draining);
                // The loop already flushed the reassembler on cancellation.
                source.restore_console();
                drop(source);
                sink.write(Severity::Notice, "klogfwd: exiting");
                self.set_phase(Phase::Terminated);
                info!("kernel log forwarder stopped");
                Ok(())
            }
            Err(e) => {
                self.set_phase(Phase::Terminated);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_starts_in_initializing_phase() {
        let daemon = Daemon::new(DaemonConfig {
            start_delay_secs: 0,
            sink_wait_secs: 1,
            foreground: true,
            status_log: false,
            source_path: "/proc/kmsg".to_string(),
            sink_path: "/dev/log".to_string(),
        });
        assert_eq!(daemon.phase(), Phase::Initializing);
    }
}
