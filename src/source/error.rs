// SPDX-License-Identifier: Apache-2.0

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("failed to register {path} with the async reactor: {source}")]
    Register { path: String, source: io::Error },

    #[error("kernel log read failed: {0}")]
    Read(io::Error),
}

pub type Result<T> = std::result::Result<T, SourceError>;
