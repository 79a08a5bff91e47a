// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certification path validation against a [`TrustAnchorStore`].
//!
//! The path is given leaf first and excludes the root. Certificates are processed from
//! the anchor down to the leaf; revocation runs afterwards, once every offline check
//! has passed, so a broken chain never causes network traffic.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::debug;
use x509_parser::prelude::*;

use crate::cert_signature::verify_signed_data;
use crate::extension_policy::{ExtensionPolicyChecker, ExtensionPolicyError};
use crate::revocation::{IssuerKey, RevocationChecker, RevocationError};
use crate::trust_anchor_store::TrustAnchorStore;

/// Extensions this validator processes, in addition to those of the policy checker.
///
/// Constraint extensions (name, policy, inhibitAnyPolicy) and certificatePolicies are
/// not evaluated, so a critical instance of any of them fails validation.
const RECOGNIZED_EXTENSIONS: &[&str] = &[
    "2.5.29.19", // basicConstraints
    "2.5.29.15", // keyUsage
    "2.5.29.37", // extKeyUsage
    "2.5.29.17", // subjectAltName
];

#[derive(Debug, Error)]
pub enum PathValidationError {
    #[error("certification path is empty")]
    EmptyPath,

    #[error("no trusted root issued {0}")]
    UntrustedRoot(String),

    #[error("issuer of {subject} does not match the subject of the next certificate")]
    NameChaining { subject: String },

    #[error("signature on {subject} does not verify: {reason}")]
    BadSignature { subject: String, reason: String },

    #[error("{subject} is not yet valid")]
    NotYetValid { subject: String },

    #[error("{subject} has expired")]
    Expired { subject: String },

    #[error("{subject} is not a CA certificate")]
    NotCa { subject: String },

    #[error("key usage of {subject} does not permit certificate signing")]
    KeyUsage { subject: String },

    #[error("path length constraint of {subject} exceeded")]
    PathLength { subject: String },

    #[error("{subject} has unrecognized critical extension {oid}")]
    UnrecognizedCriticalExtension { subject: String, oid: String },

    #[error(transparent)]
    ExtensionPolicy(#[from] ExtensionPolicyError),

    #[error("revocation check failed for {subject}: {source}")]
    Revocation {
        subject: String,
        #[source]
        source: RevocationError,
    },
}

/// Validate `path` (leaf first, root excluded) at `at`.
///
/// `policy` is initialized for reverse traversal and sees the intermediate before the leaf.
/// When `revocation` is given, every certificate in the path must be positively reported good.
pub fn validate_path(
    path: &[X509Certificate<'_>],
    anchors: &TrustAnchorStore,
    policy: &mut ExtensionPolicyChecker,
    revocation: Option<&dyn RevocationChecker>,
    at: SystemTime,
) -> Result<(), PathValidationError> {
    let top = path.last().ok_or(PathValidationError::EmptyPath)?;
    let anchor = anchors
        .find_issuer(top)
        .ok_or_else(|| PathValidationError::UntrustedRoot(top.subject().to_string()))?;
    debug!(anchor = %anchor.subject(), "certification path anchored");

    let now = unix_seconds(at);
    policy.init(false);

    for index in (0..path.len()).rev() {
        let cert = &path[index];
        let issuer = issuer_of(path, index, anchor.as_issuer());

        check_issued_by(cert, issuer)?;
        check_validity(cert, now)?;
        if index > 0 {
            check_ca(cert, index)?;
        }
        check_critical_extensions(cert, policy.supported_extensions())?;
        policy.check(cert)?;
    }

    if let Some(revocation) = revocation {
        for (index, cert) in path.iter().enumerate() {
            let issuer = issuer_of(path, index, anchor.as_issuer());
            revocation
                .check(cert, issuer, at)
                .map_err(|source| PathValidationError::Revocation {
                    subject: cert.subject().to_string(),
                    source,
                })?;
        }
    }

    Ok(())
}

fn issuer_of<'a>(path: &'a [X509Certificate<'_>], index: usize, anchor: IssuerKey<'a>) -> IssuerKey<'a> {
    match path.get(index + 1) {
        Some(issuer) => IssuerKey::of_certificate(issuer),
        None => anchor,
    }
}

fn check_issued_by(cert: &X509Certificate<'_>, issuer: IssuerKey<'_>) -> Result<(), PathValidationError> {
    if cert.issuer().as_raw() != issuer.subject_raw {
        return Err(PathValidationError::NameChaining {
            subject: cert.subject().to_string(),
        });
    }

    verify_signed_data(
        issuer.spki_der,
        cert.tbs_certificate.as_ref(),
        &cert.signature_algorithm.algorithm.to_id_string(),
        &cert.signature_value.data[..],
    )
    .map_err(|reason| PathValidationError::BadSignature {
        subject: cert.subject().to_string(),
        reason,
    })
}

fn check_validity(cert: &X509Certificate<'_>, now: i64) -> Result<(), PathValidationError> {
    let validity = cert.validity();
    if now < validity.not_before.timestamp() {
        return Err(PathValidationError::NotYetValid {
            subject: cert.subject().to_string(),
        });
    }
    if now > validity.not_after.timestamp() {
        return Err(PathValidationError::Expired {
            subject: cert.subject().to_string(),
        });
    }
    Ok(())
}

/// `index` is the certificate's leaf-first position; everything below it but the leaf
/// counts against pathLenConstraint.
fn check_ca(cert: &X509Certificate<'_>, index: usize) -> Result<(), PathValidationError> {
    let subject = || cert.subject().to_string();

    let constraints = match cert.basic_constraints() {
        Ok(Some(bc)) if bc.value.ca => bc.value,
        _ => return Err(PathValidationError::NotCa { subject: subject() }),
    };

    if let Some(max) = constraints.path_len_constraint {
        let below = index.saturating_sub(1);
        if below > max as usize {
            return Err(PathValidationError::PathLength { subject: subject() });
        }
    }

    match cert.key_usage() {
        Ok(Some(ku)) if !ku.value.key_cert_sign() => Err(PathValidationError::KeyUsage { subject: subject() }),
        Ok(_) => Ok(()),
        Err(_) => Err(PathValidationError::KeyUsage { subject: subject() }),
    }
}

fn check_critical_extensions(cert: &X509Certificate<'_>, supported: &[&str]) -> Result<(), PathValidationError> {
    for ext in cert.extensions().iter().filter(|ext| ext.critical) {
        let oid = ext.oid.to_id_string();
        if !RECOGNIZED_EXTENSIONS.contains(&oid.as_str()) && !supported.contains(&oid.as_str()) {
            return Err(PathValidationError::UnrecognizedCriticalExtension {
                subject: cert.subject().to_string(),
                oid,
            });
        }
    }
    Ok(())
}

pub(crate) fn is_within_validity(cert: &X509Certificate<'_>, now: i64) -> bool {
    let validity = cert.validity();
    validity.not_before.timestamp() <= now && now <= validity.not_after.timestamp()
}

/// Seconds since the Unix epoch; negative before it.
pub(crate) fn unix_seconds(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_secs()).map_or(i64::MIN, |s| -s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unix_seconds_handles_dates_before_the_epoch() {
        assert_eq!(unix_seconds(UNIX_EPOCH), 0);
        assert_eq!(unix_seconds(UNIX_EPOCH + Duration::from_secs(90)), 90);
        assert_eq!(unix_seconds(UNIX_EPOCH - Duration::from_secs(90)), -90);
    }
}
