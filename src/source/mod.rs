// SPDX-License-Identifier: Apache-2.0

//! Kernel log source.
//!
//! Linux-only: the kernel log stream is drained from `/proc/kmsg` and the
//! console forwarding switch is flipped back through `klogctl(2)`.

pub mod error;
pub mod klog;

pub use error::SourceError;
pub use klog::KlogSource;
