// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! OCSP (RFC 6960) revocation checker.
//!
//! One blocking POST per certificate, to the responder named in the certificate's
//! Authority Information Access extension. No nonce, no caching, no retries.

use std::time::{Duration, SystemTime};

use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use der::{Decode as _, Encode as _};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use tracing::debug;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspRequest, OcspResponse, OcspResponseStatus, Request, SingleResponse, TbsRequest,
    Version,
};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer as _;

use crate::cert_signature::verify_signed_data;
use crate::path_validation::{is_within_validity, unix_seconds};
use crate::revocation::{IssuerKey, RevocationChecker, RevocationError};

const ID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";
const ID_PKIX_OCSP_BASIC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.1");
const ID_SHA_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const ID_SHA_256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

#[derive(Debug, Clone)]
pub struct OcspOptions {
    /// Timeout for the whole HTTP exchange with the responder.
    pub timeout: Duration,
    /// Responses larger than this are rejected without being parsed.
    pub max_response_bytes: usize,
    /// Tolerance applied to `thisUpdate` / `nextUpdate`.
    pub clock_skew: Duration,
}

impl Default for OcspOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_response_bytes: 64 * 1024,
            clock_skew: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OcspRevocationChecker {
    options: OcspOptions,
}

impl OcspRevocationChecker {
    pub fn new(options: OcspOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OcspOptions {
        &self.options
    }

    fn fetch(&self, url: &str, request_der: Vec<u8>) -> Result<Vec<u8>, RevocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.options.timeout)
            .build()
            .map_err(|e| RevocationError::Transport(e.to_string()))?;

        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/ocsp-request")
            .header(ACCEPT, "application/ocsp-response")
            .body(request_der)
            .send()
            .map_err(|e| RevocationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RevocationError::HttpStatus(status.as_u16()));
        }

        let max = self.options.max_response_bytes;
        if response.content_length().is_some_and(|len| len > max as u64) {
            return Err(RevocationError::ResponseTooLarge(max));
        }

        let body = response.bytes().map_err(|e| RevocationError::Transport(e.to_string()))?;
        if body.len() > max {
            return Err(RevocationError::ResponseTooLarge(max));
        }
        Ok(body.to_vec())
    }
}

impl RevocationChecker for OcspRevocationChecker {
    fn check(&self, cert: &X509Certificate<'_>, issuer: IssuerKey<'_>, at: SystemTime) -> Result<(), RevocationError> {
        let url = responder_url(cert)?;
        let request = encode_request(cert, issuer)?;

        debug!(responder = %url, serial = %cert.raw_serial_as_string(), "sending OCSP request");
        let body = self.fetch(&url, request)?;

        let outcome = evaluate_response(&body, cert, issuer, at, self.options.clock_skew);
        debug!(serial = %cert.raw_serial_as_string(), ok = outcome.is_ok(), "OCSP response evaluated");
        outcome
    }
}

/// The first http(s) OCSP responder URL in the certificate's AIA extension.
pub fn responder_url(cert: &X509Certificate<'_>) -> Result<String, RevocationError> {
    for ext in cert.extensions() {
        let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() else {
            continue;
        };
        for desc in &aia.accessdescs {
            if desc.access_method.to_id_string() != ID_AD_OCSP {
                continue;
            }
            if let GeneralName::URI(uri) = &desc.access_location {
                if uri.starts_with("http://") || uri.starts_with("https://") {
                    return Ok(uri.to_string());
                }
            }
        }
    }
    Err(RevocationError::NoResponder)
}

/// DER `OCSPRequest` for a single certificate, using a SHA-1 CertID.
pub fn encode_request(cert: &X509Certificate<'_>, issuer: IssuerKey<'_>) -> Result<Vec<u8>, RevocationError> {
    let request = OcspRequest {
        tbs_request: TbsRequest {
            version: Version::V1,
            requestor_name: None,
            request_list: vec![Request {
                req_cert: cert_id(cert, issuer, &ID_SHA_1)?,
                single_request_extensions: None,
            }],
            request_extensions: None,
        },
        optional_signature: None,
    };
    request.to_der().map_err(malformed)
}

/// Evaluate a DER `OCSPResponse` for `cert`. Only a verified, current `good` answer passes.
pub fn evaluate_response(
    body: &[u8],
    cert: &X509Certificate<'_>,
    issuer: IssuerKey<'_>,
    at: SystemTime,
    clock_skew: Duration,
) -> Result<(), RevocationError> {
    let response = OcspResponse::from_der(body).map_err(malformed)?;
    if response.response_status != OcspResponseStatus::Successful {
        return Err(RevocationError::ResponderStatus(format!("{:?}", response.response_status)));
    }

    let bytes = response
        .response_bytes
        .ok_or_else(|| RevocationError::Malformed("successful response without responseBytes".to_string()))?;
    if bytes.response_type != ID_PKIX_OCSP_BASIC {
        return Err(RevocationError::Malformed(format!("unsupported response type {}", bytes.response_type)));
    }
    let basic = BasicOcspResponse::from_der(bytes.response.as_bytes()).map_err(malformed)?;

    verify_response_signature(&basic, issuer, at)?;

    let serial = cert.raw_serial_as_string();
    let single = basic
        .tbs_response_data
        .responses
        .iter()
        .find(|single| cert_id_matches(&single.cert_id, cert, issuer))
        .ok_or_else(|| RevocationError::NoMatchingResponse(serial.clone()))?;

    check_freshness(single, at, clock_skew, &serial)?;

    match single.cert_status {
        CertStatus::Good(_) => Ok(()),
        CertStatus::Revoked(_) => Err(RevocationError::Revoked(serial)),
        CertStatus::Unknown(_) => Err(RevocationError::UnknownStatus(serial)),
    }
}

fn cert_id(cert: &X509Certificate<'_>, issuer: IssuerKey<'_>, hash: &ObjectIdentifier) -> Result<CertId, RevocationError> {
    let (name_hash, key_hash) = if *hash == ID_SHA_1 {
        (Sha1::digest(issuer.subject_raw).to_vec(), Sha1::digest(issuer.public_key_bits).to_vec())
    } else if *hash == ID_SHA_256 {
        (Sha256::digest(issuer.subject_raw).to_vec(), Sha256::digest(issuer.public_key_bits).to_vec())
    } else {
        return Err(RevocationError::Malformed(format!("unsupported CertID hash algorithm {hash}")));
    };

    Ok(CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: *hash,
            parameters: None,
        },
        issuer_name_hash: OctetString::new(name_hash).map_err(malformed)?,
        issuer_key_hash: OctetString::new(key_hash).map_err(malformed)?,
        serial_number: SerialNumber::new(cert.raw_serial()).map_err(malformed)?,
    })
}

fn cert_id_matches(candidate: &CertId, cert: &X509Certificate<'_>, issuer: IssuerKey<'_>) -> bool {
    let Ok(expected) = cert_id(cert, issuer, &candidate.hash_algorithm.oid) else {
        return false;
    };

    // Serial numbers are compared in their DER form so leading-zero handling cannot differ.
    candidate.issuer_name_hash == expected.issuer_name_hash
        && candidate.issuer_key_hash == expected.issuer_key_hash
        && matches!(
            (candidate.serial_number.to_der(), expected.serial_number.to_der()),
            (Ok(a), Ok(b)) if a == b
        )
}

fn verify_response_signature(basic: &BasicOcspResponse, issuer: IssuerKey<'_>, at: SystemTime) -> Result<(), RevocationError> {
    let tbs = basic.tbs_response_data.to_der().map_err(malformed)?;
    let signature_oid = basic.signature_algorithm.oid.to_string();
    let signature = basic
        .signature
        .as_bytes()
        .ok_or_else(|| RevocationError::Malformed("response signature has unused bits".to_string()))?;

    // Signed directly by the issuing CA.
    if verify_signed_data(issuer.spki_der, &tbs, &signature_oid, signature).is_ok() {
        return Ok(());
    }

    // Signed by a delegated responder certificate issued by the same CA.
    for embedded in basic.certs.iter().flatten() {
        let der = embedded.to_der().map_err(malformed)?;
        let Ok((_, responder)) = X509Certificate::from_der(&der) else {
            continue;
        };
        if let Err(reason) = authorized_responder(&responder, issuer, at) {
            debug!(%reason, "ignoring embedded OCSP responder certificate");
            continue;
        }
        if verify_signed_data(responder.public_key().raw, &tbs, &signature_oid, signature).is_ok() {
            return Ok(());
        }
    }

    Err(RevocationError::UnverifiedResponse(
        "not signed by the issuer or an authorized responder".to_string(),
    ))
}

fn authorized_responder(responder: &X509Certificate<'_>, issuer: IssuerKey<'_>, at: SystemTime) -> Result<(), String> {
    if responder.issuer().as_raw() != issuer.subject_raw {
        return Err("responder was not issued by the certificate's issuer".to_string());
    }
    verify_signed_data(
        issuer.spki_der,
        responder.tbs_certificate.as_ref(),
        &responder.signature_algorithm.algorithm.to_id_string(),
        &responder.signature_value.data[..],
    )?;

    match responder.extended_key_usage() {
        Ok(Some(eku)) if eku.value.ocsp_signing => {}
        _ => return Err("responder lacks id-kp-OCSPSigning".to_string()),
    }

    if !is_within_validity(responder, unix_seconds(at)) {
        return Err("responder certificate is outside its validity period".to_string());
    }
    Ok(())
}

fn check_freshness(single: &SingleResponse, at: SystemTime, clock_skew: Duration, serial: &str) -> Result<(), RevocationError> {
    let now = unix_seconds(at);
    let skew = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);

    let this_update = duration_secs(single.this_update.0.to_unix_duration());
    if this_update > now.saturating_add(skew) {
        return Err(RevocationError::Stale(serial.to_string()));
    }

    if let Some(next_update) = &single.next_update {
        let next_update = duration_secs(next_update.0.to_unix_duration());
        if next_update.saturating_add(skew) < now {
            return Err(RevocationError::Stale(serial.to_string()));
        }
    }
    Ok(())
}

fn duration_secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

fn malformed(e: impl std::fmt::Display) -> RevocationError {
    RevocationError::Malformed(e.to_string())
}
