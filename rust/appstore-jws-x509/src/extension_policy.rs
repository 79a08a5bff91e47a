// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! App Store certificate-extension policy, enforced while a path is being validated.
//!
//! Path validators disagree about traversal order: some walk leaf-to-root ("forward"),
//! others anchor-to-leaf ("reverse"). The checker is told the direction at [`init`]
//! and maps each visited position to the leaf or intermediate role accordingly.
//!
//! [`init`]: ExtensionPolicyChecker::init

use thiserror::Error;
use x509_parser::prelude::*;

/// Marks a certificate as an App Store receipt signer. Required on the leaf.
pub const LEAF_RECEIPT_SIGNER_OID: &str = "1.2.840.113635.100.6.11.1";

/// Marks the Apple Worldwide Developer Relations intermediate CA. Required on the intermediate.
pub const WWDR_INTERMEDIATE_OID: &str = "1.2.840.113635.100.6.2.1";

const SUPPORTED_EXTENSIONS: &[&str] = &[LEAF_RECEIPT_SIGNER_OID, WWDR_INTERMEDIATE_OID];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionPolicyError {
    #[error("leaf certificate is missing required extension {0}")]
    MissingLeafExtension(&'static str),

    #[error("leaf certificate extension {0} must not be marked critical")]
    CriticalLeafExtension(&'static str),

    #[error("intermediate certificate is missing required extension {0}")]
    MissingIntermediateExtension(&'static str),

    #[error("maximum depth exceeded")]
    MaximumDepthExceeded,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Role {
    Leaf,
    Intermediate,
}

#[derive(Debug, Default)]
pub struct ExtensionPolicyChecker {
    forward: bool,
    position: usize,
}

impl ExtensionPolicyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset state before visiting a path. `forward` means leaf first.
    pub fn init(&mut self, forward: bool) {
        self.forward = forward;
        self.position = 0;
    }

    /// Extension OIDs this checker processes; path validation treats them as recognized.
    pub fn supported_extensions(&self) -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    pub fn check(&mut self, cert: &X509Certificate<'_>) -> Result<(), ExtensionPolicyError> {
        let role = self.role_at(self.position)?;
        self.position += 1;

        match role {
            Role::Leaf => match find_extension(cert, LEAF_RECEIPT_SIGNER_OID) {
                None => Err(ExtensionPolicyError::MissingLeafExtension(LEAF_RECEIPT_SIGNER_OID)),
                Some(ext) if ext.critical => Err(ExtensionPolicyError::CriticalLeafExtension(LEAF_RECEIPT_SIGNER_OID)),
                Some(_) => Ok(()),
            },
            Role::Intermediate => match find_extension(cert, WWDR_INTERMEDIATE_OID) {
                None => Err(ExtensionPolicyError::MissingIntermediateExtension(WWDR_INTERMEDIATE_OID)),
                Some(_) => Ok(()),
            },
        }
    }

    fn role_at(&self, position: usize) -> Result<Role, ExtensionPolicyError> {
        match (self.forward, position) {
            (true, 0) | (false, 1) => Ok(Role::Leaf),
            (true, 1) | (false, 0) => Ok(Role::Intermediate),
            _ => Err(ExtensionPolicyError::MaximumDepthExceeded),
        }
    }
}

fn find_extension<'c, 'a>(cert: &'c X509Certificate<'a>, oid: &str) -> Option<&'c X509Extension<'a>> {
    cert.extensions().iter().find(|ext| ext.oid.to_id_string() == oid)
}
