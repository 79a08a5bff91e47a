// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verification of signed App Store payloads.
//!
//! Start with [`SignedDataVerifier`]: construct it once from the Apple root certificates
//! and a [`VerifierSettings`], then call the entry point matching the payload kind.
//! Payload types are supplied by the caller and only need to implement
//! `serde::de::DeserializeOwned`.

mod claims;
pub mod environment;
pub mod error;
pub mod settings;
pub mod signed_data_verifier;

pub use appstore_jws_common::{BoxError, VerificationError, VerificationStatus};
pub use appstore_jws_x509::{ChainVerifier, OcspOptions, OcspRevocationChecker, RevocationChecker, RevocationError};
pub use environment::{Environment, UnknownEnvironment};
pub use error::{ConfigurationError, TokenError};
pub use settings::VerifierSettings;
pub use signed_data_verifier::SignedDataVerifier;
