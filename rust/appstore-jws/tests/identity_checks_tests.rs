// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Identity checks performed by the per-kind entry points.

use appstore_jws::{Environment, SignedDataVerifier, VerificationStatus, VerifierSettings};
use appstore_jws_test_utils::{valid_chain, GeneratedChain};
use serde_json::{json, Value};

const SIGNED_DATE: i64 = 1_681_312_846_000;

fn verifier(chain: &GeneratedChain, environment: Environment) -> SignedDataVerifier {
    let settings = VerifierSettings::new("com.example", environment).with_app_apple_id(1234);
    SignedDataVerifier::new([chain.root_der.clone()], settings).unwrap()
}

fn status<T: std::fmt::Debug>(result: Result<T, appstore_jws::VerificationError>) -> VerificationStatus {
    result.unwrap_err().status()
}

fn notification(scope_key: &str, bundle_id: &str, app_apple_id: i64, environment: &str) -> Value {
    let mut payload = json!({
        "notificationType": "SUBSCRIBED",
        "notificationUUID": "002e14d5-51f5-4503-b5a8-c3a1af68eb20",
        "version": "2.0",
        "signedDate": SIGNED_DATE,
    });
    payload[scope_key] = json!({
        "bundleId": bundle_id,
        "appAppleId": app_apple_id,
        "environment": environment,
    });
    payload
}

#[test]
fn transaction_bundle_id_must_match() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token = chain.sign_payload(&json!({ "signedDate": SIGNED_DATE, "bundleId": "com.other", "environment": "Sandbox" }));
    assert_eq!(
        status(verifier.verify_and_decode_transaction::<Value>(&token)),
        VerificationStatus::InvalidAppIdentifier
    );
}

#[test]
fn transaction_environment_must_match() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token =
        chain.sign_payload(&json!({ "signedDate": SIGNED_DATE, "bundleId": "com.example", "environment": "Production" }));
    assert_eq!(
        status(verifier.verify_and_decode_transaction::<Value>(&token)),
        VerificationStatus::InvalidEnvironment
    );
}

#[test]
fn transaction_bundle_id_is_checked_before_environment() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token = chain.sign_payload(&json!({ "signedDate": SIGNED_DATE, "bundleId": "com.other", "environment": "Xcode" }));
    assert_eq!(
        status(verifier.verify_and_decode_transaction::<Value>(&token)),
        VerificationStatus::InvalidAppIdentifier
    );
}

#[test]
fn transaction_without_identity_fields_is_rejected() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token = chain.sign_payload(&json!({ "signedDate": SIGNED_DATE }));
    assert_eq!(
        status(verifier.verify_and_decode_transaction::<Value>(&token)),
        VerificationStatus::InvalidAppIdentifier
    );
}

#[test]
fn renewal_info_has_no_identity_checks() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let payload = json!({
        "signedDate": SIGNED_DATE,
        "environment": "Production",
        "autoRenewProductId": "com.example.yearly",
        "autoRenewStatus": 1,
    });
    let decoded: Value = verifier
        .verify_and_decode_renewal_info(&chain.sign_payload(&payload))
        .unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn decode_only_kinds_ignore_identity_field_shapes() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let payload = json!({
        "signedDate": SIGNED_DATE,
        "bundleId": false,
        "environment": 5,
        "appAppleId": "not a number",
        "data": "opaque",
        "summary": [1, 2, 3],
    });
    let token = chain.sign_payload(&payload);

    let decoded: Value = verifier.verify_and_decode_renewal_info(&token).unwrap();
    assert_eq!(decoded, payload);
    let decoded: Value = verifier.decode_signed_object(&token).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn transaction_ignores_fields_it_does_not_check() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let payload = json!({
        "signedDate": SIGNED_DATE,
        "bundleId": "com.example",
        "environment": "Sandbox",
        "appAppleId": "not a number",
        "data": 42,
    });
    let decoded: Value = verifier
        .verify_and_decode_transaction(&chain.sign_payload(&payload))
        .unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn notification_identity_from_data() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let payload = notification("data", "com.example", 1234, "Sandbox");
    let decoded: Value = verifier
        .verify_and_decode_notification(&chain.sign_payload(&payload))
        .unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn notification_identity_from_summary() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token = chain.sign_payload(&notification("summary", "com.example", 1234, "Sandbox"));
    assert!(verifier.verify_and_decode_notification::<Value>(&token).is_ok());

    let token = chain.sign_payload(&notification("summary", "com.other", 1234, "Sandbox"));
    assert_eq!(
        status(verifier.verify_and_decode_notification::<Value>(&token)),
        VerificationStatus::InvalidAppIdentifier
    );
}

#[test]
fn notification_data_takes_precedence_over_summary() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let payload = json!({
        "signedDate": SIGNED_DATE,
        "data": { "bundleId": "com.other", "environment": "Sandbox" },
        "summary": { "bundleId": "com.example", "environment": "Sandbox" },
    });
    assert_eq!(
        status(verifier.verify_and_decode_notification::<Value>(&chain.sign_payload(&payload))),
        VerificationStatus::InvalidAppIdentifier
    );
}

#[test]
fn notification_without_data_or_summary_is_rejected() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token = chain.sign_payload(&json!({ "signedDate": SIGNED_DATE, "notificationType": "TEST" }));
    assert_eq!(
        status(verifier.verify_and_decode_notification::<Value>(&token)),
        VerificationStatus::InvalidAppIdentifier
    );
}

#[test]
fn notification_app_apple_id_is_only_checked_in_production() {
    let chain = valid_chain();

    let sandbox = verifier(&chain, Environment::Sandbox);
    let token = chain.sign_payload(&notification("data", "com.example", 9999, "Sandbox"));
    assert!(sandbox.verify_and_decode_notification::<Value>(&token).is_ok());

    let production = verifier(&chain, Environment::Production);
    let token = chain.sign_payload(&notification("data", "com.example", 9999, "Production"));
    assert_eq!(
        status(production.verify_and_decode_notification::<Value>(&token)),
        VerificationStatus::InvalidAppIdentifier
    );

    let token = chain.sign_payload(&notification("data", "com.example", 1234, "Production"));
    assert!(production.verify_and_decode_notification::<Value>(&token).is_ok());
}

#[test]
fn notification_environment_must_match() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let token = chain.sign_payload(&notification("data", "com.example", 1234, "Production"));
    assert_eq!(
        status(verifier.verify_and_decode_notification::<Value>(&token)),
        VerificationStatus::InvalidEnvironment
    );
}

#[test]
fn app_transaction_environment_comes_from_receipt_type() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Sandbox);

    let payload = json!({
        "signedDate": SIGNED_DATE,
        "receiptType": "Sandbox",
        "bundleId": "com.example",
        "appAppleId": 1234,
        "applicationVersion": "1",
    });
    let decoded: Value = verifier
        .verify_and_decode_app_transaction(&chain.sign_payload(&payload))
        .unwrap();
    assert_eq!(decoded, payload);

    let mismatched = json!({
        "signedDate": SIGNED_DATE,
        "receiptType": "Production",
        "environment": "Sandbox",
        "bundleId": "com.example",
        "appAppleId": 1234,
    });
    assert_eq!(
        status(verifier.verify_and_decode_app_transaction::<Value>(&chain.sign_payload(&mismatched))),
        VerificationStatus::InvalidEnvironment
    );
}

#[test]
fn app_transaction_app_apple_id_is_checked_in_production() {
    let chain = valid_chain();
    let verifier = verifier(&chain, Environment::Production);

    let payload = json!({
        "signedDate": SIGNED_DATE,
        "receiptType": "Production",
        "bundleId": "com.example",
        "appAppleId": 5678,
    });
    assert_eq!(
        status(verifier.verify_and_decode_app_transaction::<Value>(&chain.sign_payload(&payload))),
        VerificationStatus::InvalidAppIdentifier
    );
}
