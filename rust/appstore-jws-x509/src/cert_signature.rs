// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signature checks for data signed by a certificate key: certificates themselves and
//! OCSP responses.
//!
//! The ECDSA curve comes from the signer's SubjectPublicKeyInfo and the digest from the
//! signature algorithm OID, so P-256 and P-384 keys each work with any of the SHA-2 digests.

use p256::pkcs8::DecodePublicKey as _;
use rsa::pkcs1v15;
use rsa::RsaPublicKey;
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use signature::hazmat::PrehashVerifier as _;
use signature::Verifier as _;

const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";

/// Verify `signature` over `signed` using the DER SubjectPublicKeyInfo `signer_spki_der`.
pub fn verify_signed_data(signer_spki_der: &[u8], signed: &[u8], signature_oid: &str, signature: &[u8]) -> Result<(), String> {
    match signature_oid {
        ECDSA_WITH_SHA256 => verify_ecdsa(signer_spki_der, &Sha256::digest(signed), signature),
        ECDSA_WITH_SHA384 => verify_ecdsa(signer_spki_der, &Sha384::digest(signed), signature),
        ECDSA_WITH_SHA512 => verify_ecdsa(signer_spki_der, &Sha512::digest(signed), signature),

        SHA256_WITH_RSA => {
            let vk = pkcs1v15::VerifyingKey::<Sha256>::new(rsa_public_key(signer_spki_der)?);
            let sig = pkcs1v15::Signature::try_from(signature).map_err(|e| format!("bad RSA signature bytes: {e}"))?;
            vk.verify(signed, &sig).map_err(|_| "signature verification failed".to_string())
        }
        SHA384_WITH_RSA => {
            let vk = pkcs1v15::VerifyingKey::<Sha384>::new(rsa_public_key(signer_spki_der)?);
            let sig = pkcs1v15::Signature::try_from(signature).map_err(|e| format!("bad RSA signature bytes: {e}"))?;
            vk.verify(signed, &sig).map_err(|_| "signature verification failed".to_string())
        }
        SHA512_WITH_RSA => {
            let vk = pkcs1v15::VerifyingKey::<Sha512>::new(rsa_public_key(signer_spki_der)?);
            let sig = pkcs1v15::Signature::try_from(signature).map_err(|e| format!("bad RSA signature bytes: {e}"))?;
            vk.verify(signed, &sig).map_err(|_| "signature verification failed".to_string())
        }

        _ => Err(format!("unsupported signature algorithm OID: {signature_oid}")),
    }
}

fn verify_ecdsa(signer_spki_der: &[u8], prehash: &[u8], signature_der: &[u8]) -> Result<(), String> {
    if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(signer_spki_der) {
        let sig = p256::ecdsa::Signature::from_der(signature_der).map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
        return vk
            .verify_prehash(prehash, &sig)
            .map_err(|_| "signature verification failed".to_string());
    }

    if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(signer_spki_der) {
        let sig = p384::ecdsa::Signature::from_der(signature_der).map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
        return vk
            .verify_prehash(prehash, &sig)
            .map_err(|_| "signature verification failed".to_string());
    }

    Err("signer key is not a supported EC public key (P-256 or P-384)".to_string())
}

fn rsa_public_key(spki_der: &[u8]) -> Result<RsaPublicKey, String> {
    RsaPublicKey::from_public_key_der(spki_der).map_err(|e| format!("bad RSA public key: {e}"))
}
