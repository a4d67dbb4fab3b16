// SPDX-License-Identifier: Apache-2.0

//! Ingestion loop: kernel log source -> reassembler -> syslog sink.
//!
//! One bounded read at a time, each chunk fed straight through the
//! reassembler, each completed record written to the sink at the severity
//! its priority prefix mapped to. The loop owns the reassembler state for
//! its whole lifetime; nothing else touches it.

use crate::reassembler::{KernelRecord, Reassembler};
use crate::sink::{KernelLogSink, Severity};
use crate::source::error::SourceError;
use crate::source::klog::{KlogSource, ReadOutcome, READ_CHUNK_SIZE};
use std::error::Error;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Drive the source-to-sink pipeline until cancellation or a fatal read
/// error.
///
/// Cancellation performs the drain flush: a partially assembled message is
/// forced out as one final record before returning, so shutdown never
/// drops a kernel message. A fatal read error is logged to the console and
/// best-effort to the sink, then returned without a drain.
pub async fn run<S: KernelLogSink>(
    source: &mut KlogSource,
    sink: &mut S,
    reassembler: &mut Reassembler,
    cancel: CancellationToken,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("ingestion loop cancelled");
                break;
            }

            outcome = source.read_chunk(&mut chunk) => {
                match outcome {
                    // A zero-byte read is valid and produces no emissions.
                    ReadOutcome::Data(0) => {}
                    ReadOutcome::Data(n) => {
                        forward(reassembler.feed(&chunk[..n]), sink);
                    }
                    // EINTR retries immediately; EAGAIN waits on the
                    // reactor again. Neither is worth a log line.
                    ReadOutcome::Interrupted | ReadOutcome::WouldBlock => {}
                    ReadOutcome::Failed(e) => {
                        error!(error = %e, "kernel log read failed");
                        sink.write(
                            Severity::Error,
                            &format!("klogfwd: kernel log read failed: {e}"),
                        );
                        return Err(SourceError::Read(e).into());
                    }
                }
            }
        }
    }

    if let Some(record) = reassembler.flush() {
        forward(vec![record], sink);
    }

    Ok(())
}

fn forward<S: KernelLogSink>(records: Vec<KernelRecord>, sink: &mut S) {
    for record in records {
        sink.write(Severity::from_priority(record.priority), &record.message);
    }
}
