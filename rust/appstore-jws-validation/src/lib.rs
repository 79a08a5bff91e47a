// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! JWS signature verification for App Store tokens.
//!
//! Exactly one algorithm is accepted. The algorithm is never taken from the token: the
//! header value is only compared against the allow-list.

pub mod algorithms;
pub mod signature_verifier;

pub use algorithms::{SigningAlgorithm, ALLOWED_ALGORITHM};
pub use signature_verifier::{verify_jws_signature, SignatureError};
