// SPDX-License-Identifier: Apache-2.0

//! Forwarding sink: the severity/facility model, the syslog datagram
//! client, and the startup readiness probe.

pub mod readiness;
pub mod syslog;

pub use syslog::SyslogSink;

/// Syslog severity levels.
/// See: https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Emergency = 0, // System is unusable
    Alert = 1,     // Action must be taken immediately
    Critical = 2,  // Critical conditions
    Error = 3,     // Error conditions
    Warning = 4,   // Warning conditions
    Notice = 5,    // Normal but significant condition
    Info = 6,      // Informational
    Debug = 7,     // Debug-level messages
}

impl Severity {
    /// Map a parsed kernel priority onto a severity, keeping the low three
    /// bits the way syslog itself does.
    pub fn from_priority(value: u32) -> Self {
        match value & 0x07 {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            // 7 is the only remaining possibility after & 0x07
            _ => Severity::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }
}

/// Syslog facility codes.
/// See: https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Kern = 0,      // Kernel messages
    User = 1,      // User-level messages
    Mail = 2,      // Mail system
    Daemon = 3,    // System daemons
    Auth = 4,      // Security/authorization messages
    Syslog = 5,    // Syslogd internal messages
    Lpr = 6,       // Line printer subsystem
    News = 7,      // Network news subsystem
    Uucp = 8,      // UUCP subsystem
    Cron = 9,      // Clock daemon
    Authpriv = 10, // Security/authorization (private)
    Ftp = 11,      // FTP daemon
    Local0 = 16,   // Local use 0
    Local1 = 17,   // Local use 1
    Local2 = 18,   // Local use 2
    Local3 = 19,   // Local use 3
    Local4 = 20,   // Local use 4
    Local5 = 21,   // Local use 5
    Local6 = 22,   // Local use 6
    Local7 = 23,   // Local use 7
}

impl Facility {
    /// RFC 5424 PRI value for this facility at the given severity.
    pub fn pri(self, severity: Severity) -> u8 {
        ((self as u8) << 3) | severity as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::Authpriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }
}

/// Destination for reconstructed kernel records and the daemon's own
/// notices.
pub trait KernelLogSink {
    /// Write one severity-tagged record. Implementations are best-effort:
    /// they never block shutdown and never fail the caller.
    fn write(&mut self, severity: Severity, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_from_priority_masks_facility_bits() {
        assert_eq!(Severity::from_priority(3), Severity::Error);
        assert_eq!(Severity::from_priority(7), Severity::Debug);
        // Priority 14 = facility 1 (user) + level 6 (info)
        assert_eq!(Severity::from_priority(14), Severity::Info);
        assert_eq!(Severity::from_priority(0), Severity::Emergency);
    }

    #[test]
    fn pri_encoding() {
        assert_eq!(Facility::Kern.pri(Severity::Emergency), 0);
        assert_eq!(Facility::Kern.pri(Severity::Error), 3);
        assert_eq!(Facility::Daemon.pri(Severity::Notice), 29);
        assert_eq!(Facility::Local0.pri(Severity::Info), 134);
    }

    #[test]
    fn names() {
        assert_eq!(Severity::Warning.as_str(), "WARNING");
        assert_eq!(Facility::Kern.as_str(), "kern");
    }
}
