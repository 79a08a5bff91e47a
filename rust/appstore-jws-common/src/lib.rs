// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared datatypes for the appstore-jws crates.
//!
//! This crate sits below the chain verifier (`appstore-jws-x509`), the signature
//! verifier (`appstore-jws-validation`) and the `appstore-jws` facade so that all of
//! them report failures through one taxonomy.

pub mod encoding;
pub mod error;
pub mod jws;

pub use error::{BoxError, VerificationError, VerificationStatus};
pub use jws::{parse_compact_jws, CompactJws, JwsHeader, JwsParseError};
