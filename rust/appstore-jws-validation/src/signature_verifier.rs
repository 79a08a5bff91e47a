// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! ES256 verification over the JWS signing input.

use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey as _;
use signature::Verifier as _;
use thiserror::Error;

use crate::algorithms::SigningAlgorithm;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signing key is not a P-256 public key: {0}")]
    UnsupportedKey(String),

    #[error("signature must be {expected} bytes (raw r || s), got {actual}")]
    SignatureLength { expected: usize, actual: usize },

    #[error("malformed ECDSA signature: {0}")]
    MalformedSignature(String),

    #[error("signature verification failed")]
    Mismatch,
}

/// Verify `signature` over `signing_input` with the DER SubjectPublicKeyInfo `spki_der`.
pub fn verify_jws_signature(
    alg: SigningAlgorithm,
    spki_der: &[u8],
    signing_input: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    match alg {
        SigningAlgorithm::Es256 => verify_es256(spki_der, signing_input, signature),
    }
}

fn verify_es256(spki_der: &[u8], signing_input: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let key = VerifyingKey::from_public_key_der(spki_der).map_err(|e| SignatureError::UnsupportedKey(e.to_string()))?;

    // JWS ECDSA signatures are fixed-size r || s, never ASN.1 DER.
    if signature.len() != 64 {
        return Err(SignatureError::SignatureLength {
            expected: 64,
            actual: signature.len(),
        });
    }
    let sig = Signature::from_slice(signature).map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;

    key.verify(signing_input, &sig).map_err(|_| SignatureError::Mismatch)
}
