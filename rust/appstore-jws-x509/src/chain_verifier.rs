// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use appstore_jws_common::encoding::decode_base64_standard;
use appstore_jws_common::{VerificationError, VerificationStatus};
use thiserror::Error;
use tracing::debug;
use x509_parser::prelude::*;

use crate::extension_policy::ExtensionPolicyChecker;
use crate::ocsp::OcspRevocationChecker;
use crate::path_validation::validate_path;
use crate::revocation::RevocationChecker;
use crate::trust_anchor_store::{TrustAnchorError, TrustAnchorStore};

/// `x5c` must carry exactly leaf, intermediate and root.
pub const EXPECTED_CHAIN_LENGTH: usize = 3;

/// Number of leading `x5c` entries that form the validated path. The supplied root is ignored.
const PATH_LENGTH: usize = 2;

#[derive(Debug, Error)]
pub enum CertificateDecodeError {
    #[error("x5c[{index}] is not valid base64: {source}")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("x5c[{index}] is not a DER X.509 certificate: {reason}")]
    Der { index: usize, reason: String },
}

#[derive(Debug, Error)]
#[error("expected {EXPECTED_CHAIN_LENGTH} certificates in x5c, got {0}")]
pub struct ChainLengthError(pub usize);

/// The leaf public key of a chain that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSigningKey {
    spki_der: Vec<u8>,
}

impl VerifiedSigningKey {
    /// DER SubjectPublicKeyInfo of the leaf certificate.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }
}

/// Validates App Store `x5c` chains against a fixed set of trusted roots.
///
/// Holds no per-call state and can be shared between threads.
pub struct ChainVerifier {
    anchors: TrustAnchorStore,
    revocation: Arc<dyn RevocationChecker>,
}

impl fmt::Debug for ChainVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainVerifier")
            .field("anchors", &self.anchors.len())
            .finish_non_exhaustive()
    }
}

impl ChainVerifier {
    /// Build a verifier from DER root certificates, checking revocation over OCSP.
    pub fn new<I, B>(roots: I) -> Result<Self, TrustAnchorError>
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Ok(Self {
            anchors: TrustAnchorStore::from_der_certificates(roots)?,
            revocation: Arc::new(OcspRevocationChecker::default()),
        })
    }

    /// Replace the revocation backend used when revocation checking is requested.
    pub fn with_revocation_checker(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = checker;
        self
    }

    pub fn trust_anchors(&self) -> &TrustAnchorStore {
        &self.anchors
    }

    /// Validate `certs` (standard base64 DER, leaf first) at `effective_date`.
    ///
    /// # Errors
    ///
    /// * `INVALID_CERTIFICATE` when an entry does not decode or parse.
    /// * `INVALID_CHAIN_LENGTH` when there are not exactly three entries.
    /// * `INVALID_CHAIN` for any path validation, extension policy or revocation failure.
    pub fn verify_chain(
        &self,
        certs: &[String],
        perform_revocation_checking: bool,
        effective_date: SystemTime,
    ) -> Result<VerifiedSigningKey, VerificationError> {
        let ders = certs
            .iter()
            .enumerate()
            .map(|(index, b64)| {
                decode_base64_standard(b64).map_err(|source| CertificateDecodeError::Base64 { index, source })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid_certificate)?;

        let mut parsed = Vec::with_capacity(ders.len());
        for (index, der) in ders.iter().enumerate() {
            match X509Certificate::from_der(der) {
                Ok((rem, cert)) if rem.is_empty() => parsed.push(cert),
                Ok(_) => {
                    return Err(invalid_certificate(CertificateDecodeError::Der {
                        index,
                        reason: "trailing bytes after certificate".to_string(),
                    }))
                }
                Err(e) => {
                    return Err(invalid_certificate(CertificateDecodeError::Der {
                        index,
                        reason: e.to_string(),
                    }))
                }
            }
        }

        if parsed.len() != EXPECTED_CHAIN_LENGTH {
            debug!(count = parsed.len(), "rejecting x5c chain of unexpected length");
            return Err(VerificationError::with_source(
                VerificationStatus::InvalidChainLength,
                ChainLengthError(parsed.len()),
            ));
        }

        let path = &parsed[..PATH_LENGTH];
        let revocation = perform_revocation_checking.then_some(self.revocation.as_ref());
        let mut policy = ExtensionPolicyChecker::new();

        validate_path(path, &self.anchors, &mut policy, revocation, effective_date).map_err(|e| {
            debug!(error = %e, "x5c chain rejected");
            VerificationError::with_source(VerificationStatus::InvalidChain, e)
        })?;

        Ok(VerifiedSigningKey {
            spki_der: path[0].public_key().raw.to_vec(),
        })
    }
}

fn invalid_certificate(e: CertificateDecodeError) -> VerificationError {
    debug!(error = %e, "rejecting undecodable x5c entry");
    VerificationError::with_source(VerificationStatus::InvalidCertificate, e)
}
