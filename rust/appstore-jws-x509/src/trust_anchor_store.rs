// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;
use x509_parser::prelude::*;

use crate::cert_signature::verify_signed_data;
use crate::revocation::IssuerKey;

#[derive(Debug, Error)]
pub enum TrustAnchorError {
    #[error("at least one trusted root certificate is required")]
    Empty,

    #[error("trusted root certificate #{index} is not a DER X.509 certificate: {reason}")]
    InvalidCertificate { index: usize, reason: String },
}

/// A trusted root, reduced to what path validation needs.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    der: Vec<u8>,
    subject_raw: Vec<u8>,
    spki_der: Vec<u8>,
    public_key_bits: Vec<u8>,
    subject: String,
}

impl TrustAnchor {
    pub fn from_der(der: Vec<u8>) -> Result<Self, String> {
        let (subject_raw, spki_der, public_key_bits, subject) = {
            let (rem, cert) = X509Certificate::from_der(&der).map_err(|e| format!("invalid cert DER: {e}"))?;
            if !rem.is_empty() {
                return Err("trailing bytes after certificate".to_string());
            }
            (
                cert.subject().as_raw().to_vec(),
                cert.public_key().raw.to_vec(),
                cert.public_key().subject_public_key.data.to_vec(),
                cert.subject().to_string(),
            )
        };

        Ok(Self {
            der,
            subject_raw,
            spki_der,
            public_key_bits,
            subject,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn as_issuer(&self) -> IssuerKey<'_> {
        IssuerKey {
            subject_raw: &self.subject_raw,
            spki_der: &self.spki_der,
            public_key_bits: &self.public_key_bits,
        }
    }
}

/// Immutable set of trusted roots, parsed once at construction.
#[derive(Debug, Clone)]
pub struct TrustAnchorStore {
    anchors: Vec<TrustAnchor>,
}

impl TrustAnchorStore {
    pub fn from_der_certificates<I, B>(roots: I) -> Result<Self, TrustAnchorError>
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let mut anchors = Vec::new();
        for (index, der) in roots.into_iter().enumerate() {
            let anchor = TrustAnchor::from_der(der.into())
                .map_err(|reason| TrustAnchorError::InvalidCertificate { index, reason })?;
            anchors.push(anchor);
        }

        if anchors.is_empty() {
            return Err(TrustAnchorError::Empty);
        }

        Ok(Self { anchors })
    }

    pub fn anchors(&self) -> &[TrustAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Find the anchor that issued `cert`: same DN bytes and a signature that verifies.
    pub fn find_issuer(&self, cert: &X509Certificate<'_>) -> Option<&TrustAnchor> {
        let issuer_raw = cert.issuer().as_raw();
        self.anchors.iter().find(|anchor| {
            anchor.subject_raw == issuer_raw
                && verify_signed_data(
                    &anchor.spki_der,
                    cert.tbs_certificate.as_ref(),
                    &cert.signature_algorithm.algorithm.to_id_string(),
                    &cert.signature_value.data[..],
                )
                .is_ok()
        })
    }
}
