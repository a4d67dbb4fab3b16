use crate::init::daemon::DaemonConfig;
use crate::sink::syslog::SYSLOG_SOCKET_PATH;
use crate::source::klog::KLOG_PROC_PATH;
use clap::Args;

/// Default bound on the sink readiness wait, in seconds.
pub const DEFAULT_SINK_WAIT_SECS: u64 = 15;

#[derive(Debug, Args, Clone)]
pub struct DaemonArgs {
    /// Delay startup by SECS seconds (0-30)
    #[arg(
        short = 'd',
        long = "delay",
        value_name = "SECS",
        env = "KLOGFWD_DELAY",
        default_value_t = 0,
        value_parser = clap::value_parser!(u64).range(0..=30)
    )]
    pub delay: u64,

    /// Stay in the foreground, do not daemonize
    #[arg(
        short = 'n',
        long = "foreground",
        env = "KLOGFWD_FOREGROUND",
        default_value = "false"
    )]
    pub foreground: bool,

    /// Write daemon status messages to the status log file
    #[arg(
        short = 's',
        long = "status-log",
        env = "KLOGFWD_STATUS_LOG",
        default_value = "false"
    )]
    pub status_log: bool,

    /// Seconds to wait for the syslog socket before forwarding anyway
    #[arg(
        long,
        env = "KLOGFWD_SINK_WAIT_TIMEOUT",
        default_value_t = DEFAULT_SINK_WAIT_SECS
    )]
    pub sink_wait_timeout: u64,

    /// PID file
    #[arg(long, env = "KLOGFWD_PID_FILE", default_value = "/tmp/klogfwd.pid")]
    pub pid_file: String,

    /// Status log file
    #[arg(
        long,
        env = "KLOGFWD_STATUS_LOG_FILE",
        default_value = "/tmp/klogfwd.log"
    )]
    pub status_log_file: String,

    /// Kernel log stream to read
    #[arg(long, env = "KLOGFWD_SOURCE_PATH", default_value = KLOG_PROC_PATH)]
    pub source_path: String,

    /// Syslog socket to forward to
    #[arg(long, env = "KLOGFWD_SINK_PATH", default_value = SYSLOG_SOCKET_PATH)]
    pub sink_path: String,
}

impl Default for DaemonArgs {
    fn default() -> Self {
        Self {
            delay: 0,
            foreground: false,
            status_log: false,
            sink_wait_timeout: DEFAULT_SINK_WAIT_SECS,
            pid_file: "/tmp/klogfwd.pid".to_string(),
            status_log_file: "/tmp/klogfwd.log".to_string(),
            source_path: KLOG_PROC_PATH.to_string(),
            sink_path: SYSLOG_SOCKET_PATH.to_string(),
        }
    }
}

impl DaemonArgs {
    pub fn build_config(&self) -> DaemonConfig {
        DaemonConfig {
            start_delay_secs: self.delay,
            sink_wait_secs: self.sink_wait_timeout,
            foreground: self.foreground,
            status_log: self.status_log,
            source_path: self.source_path.clone(),
            sink_path: self.sink_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_build_default_config() {
        let config = DaemonArgs::default().build_config();
        assert_eq!(config.start_delay_secs, 0);
        assert_eq!(config.sink_wait_secs, DEFAULT_SINK_WAIT_SECS);
        assert!(!config.foreground);
        assert!(!config.status_log);
        assert_eq!(config.source_path, KLOG_PROC_PATH);
        assert_eq!(config.sink_path, SYSLOG_SOCKET_PATH);
    }
}
