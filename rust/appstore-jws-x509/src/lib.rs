// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! X.509 chain validation for the App Store `x5c` header.
//!
//! The chain carried by an App Store token is always `[leaf, WWDR intermediate, root]`.
//! The supplied root is never trusted as-is: only the leaf and intermediate are
//! validated, against roots held by a [`TrustAnchorStore`].

pub mod cert_signature;
pub mod chain_verifier;
pub mod extension_policy;
pub mod ocsp;
pub mod path_validation;
pub mod revocation;
pub mod trust_anchor_store;

pub use chain_verifier::{
    CertificateDecodeError, ChainLengthError, ChainVerifier, VerifiedSigningKey, EXPECTED_CHAIN_LENGTH,
};
pub use extension_policy::{
    ExtensionPolicyChecker, ExtensionPolicyError, LEAF_RECEIPT_SIGNER_OID, WWDR_INTERMEDIATE_OID,
};
pub use ocsp::{evaluate_response, OcspOptions, OcspRevocationChecker};
pub use path_validation::PathValidationError;
pub use revocation::{IssuerKey, RevocationChecker, RevocationError};
pub use trust_anchor_store::{TrustAnchor, TrustAnchorError, TrustAnchorStore};
