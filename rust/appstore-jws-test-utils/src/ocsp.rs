// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signed OCSP responses for generated chains.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, Null, OctetString};
use der::{Decode as _, Encode as _};
use p256::ecdsa::{DerSignature, SigningKey};
use sha1::{Digest as _, Sha1};
use signature::Signer as _;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;
use x509_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspGeneralizedTime, OcspResponse, OcspResponseStatus, ResponderId,
    ResponseBytes, ResponseData, RevokedInfo, SingleResponse, Version,
};
use x509_parser::prelude::X509Certificate;

const ID_PKIX_OCSP_BASIC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.1");
const ID_SHA_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Good,
    Revoked,
    Unknown,
}

/// Contents of a single-certificate OCSP response.
#[derive(Debug, Clone)]
pub struct ResponseOptions {
    pub status: ResponseStatus,
    pub this_update: SystemTime,
    pub next_update: Option<SystemTime>,
    /// CertID serial to answer for instead of the certificate's own.
    pub serial: Option<Vec<u8>>,
    /// Certificates placed in the response's `certs` field.
    pub embedded_certs: Vec<Vec<u8>>,
}

impl ResponseOptions {
    /// A response valid for one day around `at`.
    pub fn current(status: ResponseStatus, at: SystemTime) -> Self {
        Self {
            status,
            this_update: at - Duration::from_secs(3600),
            next_update: Some(at + Duration::from_secs(86_400)),
            serial: None,
            embedded_certs: Vec::new(),
        }
    }
}

/// DER `OCSPResponse` about `cert`, whose issuer is `issuer`, signed ECDSA-SHA256 by `signer`.
pub fn signed_response(
    cert: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
    signer: &SigningKey,
    options: &ResponseOptions,
) -> Vec<u8> {
    let serial = options.serial.as_deref().unwrap_or(cert.raw_serial());
    let cert_id = CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: ID_SHA_1,
            parameters: None,
        },
        issuer_name_hash: OctetString::new(Sha1::digest(issuer.subject().as_raw()).to_vec()).unwrap(),
        issuer_key_hash: OctetString::new(Sha1::digest(&issuer.public_key().subject_public_key.data[..]).to_vec())
            .unwrap(),
        serial_number: SerialNumber::new(serial).unwrap(),
    };

    let cert_status = match options.status {
        ResponseStatus::Good => CertStatus::Good(Null),
        ResponseStatus::Revoked => CertStatus::Revoked(RevokedInfo {
            revocation_time: time(options.this_update),
            revocation_reason: None,
        }),
        ResponseStatus::Unknown => CertStatus::Unknown(Null),
    };

    let tbs_response_data = ResponseData {
        version: Version::V1,
        responder_id: ResponderId::ByName(Name::from_der(issuer.subject().as_raw()).unwrap()),
        produced_at: time(options.this_update),
        responses: vec![SingleResponse {
            cert_id,
            cert_status,
            this_update: time(options.this_update),
            next_update: options.next_update.map(time),
            single_extensions: None,
        }],
        response_extensions: None,
    };

    let signature: DerSignature = signer.sign(&tbs_response_data.to_der().unwrap());
    let certs = (!options.embedded_certs.is_empty()).then(|| {
        options
            .embedded_certs
            .iter()
            .map(|der| Certificate::from_der(der).unwrap())
            .collect()
    });

    let basic = BasicOcspResponse {
        tbs_response_data,
        signature_algorithm: AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA256,
            parameters: None,
        },
        signature: BitString::from_bytes(signature.as_bytes()).unwrap(),
        certs,
    };

    OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: Some(ResponseBytes {
            response_type: ID_PKIX_OCSP_BASIC,
            response: OctetString::new(basic.to_der().unwrap()).unwrap(),
        }),
    }
    .to_der()
    .unwrap()
}

fn time(at: SystemTime) -> OcspGeneralizedTime {
    let secs = at.duration_since(UNIX_EPOCH).unwrap().as_secs();
    OcspGeneralizedTime(GeneralizedTime::from_unix_duration(Duration::from_secs(secs)).unwrap())
}
