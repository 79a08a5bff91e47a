// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! OCSP checker tests that need no live responder.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use appstore_jws_test_utils::{generate_chain, valid_chain, ChainOptions};
use appstore_jws_x509::ocsp::{encode_request, responder_url};
use appstore_jws_x509::{
    evaluate_response, IssuerKey, OcspOptions, OcspRevocationChecker, RevocationChecker, RevocationError,
};
use der::{Decode as _, Encode as _};
use x509_ocsp::{OcspRequest, OcspResponse, OcspResponseStatus};

fn april_2023() -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(1_681_312_846_000)
}

#[test]
fn default_options() {
    let options = OcspOptions::default();
    assert_eq!(options.timeout, Duration::from_secs(10));
    assert_eq!(options.max_response_bytes, 64 * 1024);
    assert_eq!(options.clock_skew, Duration::from_secs(300));
}

#[test]
fn certificate_without_aia_has_no_responder() {
    let chain = valid_chain();
    let intermediate = chain.intermediate();

    let err = OcspRevocationChecker::default()
        .check(&chain.leaf(), IssuerKey::of_certificate(&intermediate), april_2023())
        .unwrap_err();
    assert!(matches!(err, RevocationError::NoResponder));
}

#[test]
fn responder_url_comes_from_aia() {
    let chain = generate_chain(&ChainOptions {
        ocsp_url: Some("http://ocsp.example.test/ocsp03-wwdrg6".to_string()),
        ..ChainOptions::default()
    });
    assert_eq!(responder_url(&chain.leaf()).unwrap(), "http://ocsp.example.test/ocsp03-wwdrg6");
}

#[test]
fn unreachable_responder_fails_closed() {
    let chain = generate_chain(&ChainOptions {
        ocsp_url: Some("http://127.0.0.1:9/ocsp".to_string()),
        ..ChainOptions::default()
    });
    let intermediate = chain.intermediate();
    let checker = OcspRevocationChecker::new(OcspOptions {
        timeout: Duration::from_secs(2),
        ..OcspOptions::default()
    });

    let err = checker
        .check(&chain.leaf(), IssuerKey::of_certificate(&intermediate), april_2023())
        .unwrap_err();
    assert!(matches!(err, RevocationError::Transport(_)), "{err}");
}

#[test]
fn request_identifies_the_certificate_serial() {
    let chain = valid_chain();
    let leaf = chain.leaf();
    let intermediate = chain.intermediate();

    let der = encode_request(&leaf, IssuerKey::of_certificate(&intermediate)).unwrap();
    let request = OcspRequest::from_der(&der).unwrap();

    assert_eq!(request.tbs_request.request_list.len(), 1);
    let cert_id = &request.tbs_request.request_list[0].req_cert;
    assert_eq!(cert_id.hash_algorithm.oid.to_string(), "1.3.14.3.2.26");
    assert_eq!(cert_id.issuer_name_hash.as_bytes().len(), 20);
    assert_eq!(cert_id.issuer_key_hash.as_bytes().len(), 20);
}

#[test]
fn garbage_response_is_malformed() {
    let chain = valid_chain();
    let leaf = chain.leaf();
    let intermediate = chain.intermediate();

    let err = evaluate_response(
        b"not an ocsp response",
        &leaf,
        IssuerKey::of_certificate(&intermediate),
        april_2023(),
        Duration::from_secs(300),
    )
    .unwrap_err();
    assert!(matches!(err, RevocationError::Malformed(_)), "{err}");
}

#[test]
fn unsuccessful_responder_status_fails_closed() {
    let chain = valid_chain();
    let leaf = chain.leaf();
    let intermediate = chain.intermediate();

    let body = OcspResponse {
        response_status: OcspResponseStatus::TryLater,
        response_bytes: None,
    }
    .to_der()
    .unwrap();

    let err = evaluate_response(
        &body,
        &leaf,
        IssuerKey::of_certificate(&intermediate),
        april_2023(),
        Duration::from_secs(300),
    )
    .unwrap_err();
    assert!(matches!(err, RevocationError::ResponderStatus(_)), "{err}");
}

#[test]
fn successful_status_without_body_is_malformed() {
    let chain = valid_chain();
    let leaf = chain.leaf();
    let intermediate = chain.intermediate();

    let body = OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: None,
    }
    .to_der()
    .unwrap();

    let err = evaluate_response(
        &body,
        &leaf,
        IssuerKey::of_certificate(&intermediate),
        april_2023(),
        Duration::from_secs(300),
    )
    .unwrap_err();
    assert!(matches!(err, RevocationError::Malformed(_)), "{err}");
}
