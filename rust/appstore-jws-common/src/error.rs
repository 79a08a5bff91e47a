// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verification error taxonomy.
//!
//! Every rejected token maps to exactly one [`VerificationStatus`]. The status is the
//! stable, machine-readable part of a failure; the optional source carries the
//! lower-level reason (parse error, path validation error, revocation error, ...).

use std::error::Error as StdError;
use std::fmt;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// Token decoding, algorithm or signature problems (including a missing `x5c`).
    VerificationFailure,
    /// Bundle id or app apple id did not match the configured values.
    InvalidAppIdentifier,
    /// The payload environment did not match the configured environment.
    InvalidEnvironment,
    /// A chain element was not valid base64 or not a DER X.509 certificate.
    InvalidCertificate,
    /// The chain did not contain exactly three certificates.
    InvalidChainLength,
    /// Path validation failed: untrusted root, expiry, revocation or extension policy.
    InvalidChain,
}

impl VerificationStatus {
    pub fn error_code(self) -> &'static str {
        match self {
            VerificationStatus::VerificationFailure => "VERIFICATION_FAILURE",
            VerificationStatus::InvalidAppIdentifier => "INVALID_APP_IDENTIFIER",
            VerificationStatus::InvalidEnvironment => "INVALID_ENVIRONMENT",
            VerificationStatus::InvalidCertificate => "INVALID_CERTIFICATE",
            VerificationStatus::InvalidChainLength => "INVALID_CHAIN_LENGTH",
            VerificationStatus::InvalidChain => "INVALID_CHAIN",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_code())
    }
}

/// A failed verification: a status plus an optional underlying cause.
#[derive(Debug)]
pub struct VerificationError {
    status: VerificationStatus,
    source: Option<BoxError>,
}

impl VerificationError {
    pub fn new(status: VerificationStatus) -> Self {
        Self { status, source: None }
    }

    pub fn with_source(status: VerificationStatus, source: impl Into<BoxError>) -> Self {
        Self {
            status,
            source: Some(source.into()),
        }
    }

    pub fn verification_failure(source: impl Into<BoxError>) -> Self {
        Self::with_source(VerificationStatus::VerificationFailure, source)
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    /// The underlying cause, if one was recorded.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl From<VerificationStatus> for VerificationError {
    fn from(status: VerificationStatus) -> Self {
        Self::new(status)
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

impl StdError for VerificationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_cause() {
        let err = VerificationError::with_source(VerificationStatus::InvalidChain, "leaf expired");
        assert_eq!(err.to_string(), "INVALID_CHAIN: leaf expired");
        assert_eq!(err.error_code(), "INVALID_CHAIN");
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn status_only_error_has_no_source() {
        let err: VerificationError = VerificationStatus::InvalidEnvironment.into();
        assert_eq!(err.to_string(), "INVALID_ENVIRONMENT");
        assert!(err.cause().is_none());
    }
}
