// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use appstore_jws_validation::SignatureError;
use appstore_jws_x509::TrustAnchorError;
use thiserror::Error;

/// The verifier could not be constructed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    TrustAnchors(#[from] TrustAnchorError),

    #[error("app_apple_id is required when the environment is Production")]
    MissingAppAppleId,
}

/// Causes attached to `VERIFICATION_FAILURE` errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWS header has no x5c certificate chain")]
    MissingX5c,

    #[error("payload is not valid JSON for the requested type: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("signedDate {0} is outside the representable time range")]
    SignedDateOutOfRange(i64),

    #[error("JWS alg {0:?} is not allowed")]
    AlgorithmNotAllowed(Option<String>),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}
