// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use appstore_jws_test_utils::{generate_chain, valid_chain, ChainOptions};
use appstore_jws_x509::{ExtensionPolicyChecker, ExtensionPolicyError, LEAF_RECEIPT_SIGNER_OID, WWDR_INTERMEDIATE_OID};

#[test]
fn reverse_order_visits_intermediate_then_leaf() {
    let chain = valid_chain();
    let mut checker = ExtensionPolicyChecker::new();
    checker.init(false);

    checker.check(&chain.intermediate()).unwrap();
    checker.check(&chain.leaf()).unwrap();
}

#[test]
fn forward_order_visits_leaf_then_intermediate() {
    let chain = valid_chain();
    let mut checker = ExtensionPolicyChecker::new();
    checker.init(true);

    checker.check(&chain.leaf()).unwrap();
    checker.check(&chain.intermediate()).unwrap();
}

#[test]
fn wrong_order_is_rejected_in_either_direction() {
    let chain = valid_chain();
    let mut checker = ExtensionPolicyChecker::new();

    checker.init(true);
    assert_eq!(
        checker.check(&chain.intermediate()),
        Err(ExtensionPolicyError::MissingLeafExtension(LEAF_RECEIPT_SIGNER_OID))
    );

    checker.init(false);
    assert_eq!(
        checker.check(&chain.leaf()),
        Err(ExtensionPolicyError::MissingIntermediateExtension(WWDR_INTERMEDIATE_OID))
    );
}

#[test]
fn third_certificate_exceeds_maximum_depth() {
    let chain = valid_chain();
    let mut checker = ExtensionPolicyChecker::new();
    checker.init(false);

    checker.check(&chain.intermediate()).unwrap();
    checker.check(&chain.leaf()).unwrap();
    assert_eq!(checker.check(&chain.leaf()), Err(ExtensionPolicyError::MaximumDepthExceeded));
}

#[test]
fn init_resets_position() {
    let chain = valid_chain();
    let mut checker = ExtensionPolicyChecker::new();

    checker.init(false);
    checker.check(&chain.intermediate()).unwrap();
    checker.check(&chain.leaf()).unwrap();

    checker.init(false);
    checker.check(&chain.intermediate()).unwrap();
}

#[test]
fn critical_receipt_extension_on_leaf_is_rejected() {
    let chain = generate_chain(&ChainOptions {
        leaf_receipt_extension_critical: true,
        ..ChainOptions::default()
    });
    let mut checker = ExtensionPolicyChecker::new();
    checker.init(true);

    assert_eq!(
        checker.check(&chain.leaf()),
        Err(ExtensionPolicyError::CriticalLeafExtension(LEAF_RECEIPT_SIGNER_OID))
    );
}

#[test]
fn supported_extensions_lists_both_oids() {
    let checker = ExtensionPolicyChecker::new();
    let supported = checker.supported_extensions();
    assert!(supported.contains(&LEAF_RECEIPT_SIGNER_OID));
    assert!(supported.contains(&WWDR_INTERMEDIATE_OID));
}
