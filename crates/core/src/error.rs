// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire error shape shared by every RPC method, and the error kinds
//! from spec §7 that map onto it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kinds surfaced over RPC (spec §7). No stack traces cross the wire;
/// only a code and a human-readable message do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    LockConflict,
    AdapterUnknown,
    AdapterTimeout,
    InvalidArgument,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::LockConflict => "lock_conflict",
            ErrorCode::AdapterUnknown => "adapter_unknown",
            ErrorCode::AdapterTimeout => "adapter_timeout",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// `{code, message}` — the only shape an error ever takes once it reaches
/// an RPC client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub code: ErrorCode,
    pub message: String,
}

impl WireError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn lock_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LockConflict, message)
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for WireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case_code() {
        let err = WireError::lock_conflict("held by s1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "lock_conflict");
        assert_eq!(json["message"], "held by s1");
    }

    #[test]
    fn round_trips_through_json() {
        let err = WireError::not_found("session abc");
        let json = serde_json::to_string(&err).unwrap();
        let back: WireError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
