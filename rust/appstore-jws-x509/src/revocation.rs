// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate revocation checking.
//!
//! Revocation is fail-closed: a checker returns `Ok(())` only for a positive "not
//! revoked" answer. Unreachable responders, unparseable or unverifiable responses,
//! `unknown` status and stale answers are all errors.

use std::time::SystemTime;

use thiserror::Error;
use x509_parser::prelude::X509Certificate;

/// Issuer material needed to identify and verify a status answer for a certificate.
#[derive(Debug, Copy, Clone)]
pub struct IssuerKey<'a> {
    /// DER of the issuer's subject Name.
    pub subject_raw: &'a [u8],
    /// DER of the issuer's SubjectPublicKeyInfo.
    pub spki_der: &'a [u8],
    /// The issuer's subjectPublicKey BIT STRING contents.
    pub public_key_bits: &'a [u8],
}

impl<'a> IssuerKey<'a> {
    pub fn of_certificate(cert: &'a X509Certificate<'_>) -> Self {
        Self {
            subject_raw: cert.subject().as_raw(),
            spki_der: cert.public_key().raw,
            public_key_bits: &cert.public_key().subject_public_key.data[..],
        }
    }
}

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("certificate does not name an OCSP responder")]
    NoResponder,

    #[error("OCSP request failed: {0}")]
    Transport(String),

    #[error("OCSP responder returned HTTP {0}")]
    HttpStatus(u16),

    #[error("OCSP response exceeds {0} bytes")]
    ResponseTooLarge(usize),

    #[error("malformed OCSP message: {0}")]
    Malformed(String),

    #[error("OCSP responder status was not successful: {0}")]
    ResponderStatus(String),

    #[error("OCSP response signature could not be verified: {0}")]
    UnverifiedResponse(String),

    #[error("OCSP response does not cover certificate serial {0}")]
    NoMatchingResponse(String),

    #[error("OCSP response for serial {0} is not current")]
    Stale(String),

    #[error("certificate serial {0} has been revoked")]
    Revoked(String),

    #[error("OCSP responder does not know certificate serial {0}")]
    UnknownStatus(String),
}

/// Answers "is this certificate revoked at `at`?" for one certificate/issuer pair.
pub trait RevocationChecker: Send + Sync {
    /// Return `Ok(())` only when the certificate is positively known to be good.
    ///
    /// # Errors
    ///
    /// Any condition that prevents a positive answer, including network failures.
    fn check(&self, cert: &X509Certificate<'_>, issuer: IssuerKey<'_>, at: SystemTime) -> Result<(), RevocationError>;
}
