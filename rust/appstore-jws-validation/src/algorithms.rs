// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// ECDSA w/ SHA-256 over P-256, raw `r || s` signature (RFC 7518, section 3.4).
    Es256,
}

/// The only algorithm App Store tokens are verified with.
pub const ALLOWED_ALGORITHM: SigningAlgorithm = SigningAlgorithm::Es256;

impl SigningAlgorithm {
    pub fn jose_name(self) -> &'static str {
        match self {
            SigningAlgorithm::Es256 => "ES256",
        }
    }

    /// Compare a header `alg` value against the allow-list.
    ///
    /// The comparison is exact and case-sensitive; `None` (missing header) never matches.
    pub fn is_allowed(alg: Option<&str>) -> bool {
        alg == Some(ALLOWED_ALGORITHM.jose_name())
    }
}
