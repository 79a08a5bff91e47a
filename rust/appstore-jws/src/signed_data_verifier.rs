// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verify-then-decode entry points for each App Store payload kind.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use appstore_jws_common::{parse_compact_jws, VerificationError, VerificationStatus};
use appstore_jws_validation::{verify_jws_signature, SigningAlgorithm, ALLOWED_ALGORITHM};
use appstore_jws_x509::ChainVerifier;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::claims::{AppTransactionIdentity, NotificationIdentity, SignedDate, TransactionIdentity};
use crate::environment::Environment;
use crate::error::{ConfigurationError, TokenError};
use crate::settings::VerifierSettings;

/// Verifies signed App Store data against a fixed set of trusted roots.
///
/// Immutable after construction; a single instance can serve concurrent callers.
#[derive(Debug)]
pub struct SignedDataVerifier {
    settings: VerifierSettings,
    chain_verifier: ChainVerifier,
}

impl SignedDataVerifier {
    /// # Errors
    ///
    /// [`ConfigurationError`] when a root does not parse, no root is given, or the
    /// environment is Production without an app apple id.
    pub fn new<I, B>(root_certificates: I, settings: VerifierSettings) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self::with_chain_verifier(ChainVerifier::new(root_certificates)?, settings)
    }

    /// Use a pre-built chain verifier, for example one with a custom revocation checker.
    pub fn with_chain_verifier(chain_verifier: ChainVerifier, settings: VerifierSettings) -> Result<Self, ConfigurationError> {
        if settings.environment == Environment::Production && settings.app_apple_id.is_none() {
            return Err(ConfigurationError::MissingAppAppleId);
        }
        Ok(Self {
            settings,
            chain_verifier,
        })
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    /// Verify a signed transaction; its `bundleId` and `environment` must match the settings.
    pub fn verify_and_decode_transaction<T: DeserializeOwned>(&self, token: &str) -> Result<T, VerificationError> {
        let (value, payload) = self.decode(token)?;
        let identity: TransactionIdentity = read_identity(&payload)?;

        if identity.bundle_id.as_deref() != Some(self.settings.bundle_id.as_str()) {
            debug!("transaction bundleId does not match");
            return Err(VerificationStatus::InvalidAppIdentifier.into());
        }
        self.check_environment(identity.environment.as_deref())?;
        Ok(value)
    }

    /// Verify signed renewal info. Renewal info carries no identity to compare.
    pub fn verify_and_decode_renewal_info<T: DeserializeOwned>(&self, token: &str) -> Result<T, VerificationError> {
        self.decode_signed_object(token)
    }

    /// Verify a server notification, taking identity from `data` or else `summary`.
    pub fn verify_and_decode_notification<T: DeserializeOwned>(&self, token: &str) -> Result<T, VerificationError> {
        let (value, payload) = self.decode(token)?;
        let scope = read_identity::<NotificationIdentity>(&payload)?.into_scope();
        self.check_app_identity(scope.bundle_id.as_deref(), scope.app_apple_id)?;
        self.check_environment(scope.environment.as_deref())?;
        Ok(value)
    }

    /// Verify an app transaction, whose `receiptType` names the environment.
    pub fn verify_and_decode_app_transaction<T: DeserializeOwned>(&self, token: &str) -> Result<T, VerificationError> {
        let (value, payload) = self.decode(token)?;
        let identity: AppTransactionIdentity = read_identity(&payload)?;
        self.check_app_identity(identity.bundle_id.as_deref(), identity.app_apple_id)?;
        self.check_environment(identity.receipt_type.as_deref())?;
        Ok(value)
    }

    /// Verify the chain and signature of `token` and decode its payload, with no identity checks.
    pub fn decode_signed_object<T: DeserializeOwned>(&self, token: &str) -> Result<T, VerificationError> {
        self.decode(token).map(|(value, _)| value)
    }

    /// Verify `token` and return the decoded value along with the raw payload bytes.
    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<(T, Vec<u8>), VerificationError> {
        let jws = parse_compact_jws(token).map_err(|e| {
            debug!(error = %e, "rejecting malformed token");
            VerificationError::verification_failure(e)
        })?;

        let x5c = jws.header.x5c.as_deref().ok_or_else(|| {
            debug!("rejecting token without x5c");
            VerificationError::verification_failure(TokenError::MissingX5c)
        })?;

        let value: T = serde_json::from_slice(&jws.payload).map_err(failure_payload)?;
        let signed_date: SignedDate = serde_json::from_slice(&jws.payload).map_err(failure_payload)?;

        let effective_date = self.effective_date(signed_date.signed_date)?;
        let key = self
            .chain_verifier
            .verify_chain(x5c, self.settings.enable_online_checks, effective_date)?;

        if !SigningAlgorithm::is_allowed(jws.header.alg.as_deref()) {
            debug!(alg = ?jws.header.alg, "rejecting token algorithm");
            return Err(VerificationError::verification_failure(TokenError::AlgorithmNotAllowed(
                jws.header.alg.clone(),
            )));
        }

        verify_jws_signature(ALLOWED_ALGORITHM, key.spki_der(), jws.signing_input(), &jws.signature).map_err(|e| {
            debug!(error = %e, "rejecting token signature");
            VerificationError::verification_failure(TokenError::from(e))
        })?;

        Ok((value, jws.payload))
    }

    /// "now" when online checks are on or the payload has no `signedDate`; otherwise `signedDate`.
    fn effective_date(&self, signed_date: Option<i64>) -> Result<SystemTime, VerificationError> {
        let Some(millis) = signed_date.filter(|_| !self.settings.enable_online_checks) else {
            return Ok(SystemTime::now());
        };

        let offset = Duration::from_millis(millis.unsigned_abs());
        let at = if millis >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        at.ok_or_else(|| VerificationError::verification_failure(TokenError::SignedDateOutOfRange(millis)))
    }

    /// Bundle id always; app apple id only in Production.
    fn check_app_identity(&self, bundle_id: Option<&str>, app_apple_id: Option<i64>) -> Result<(), VerificationError> {
        let bundle_matches = bundle_id == Some(self.settings.bundle_id.as_str());
        let app_matches =
            self.settings.environment != Environment::Production || app_apple_id == self.settings.app_apple_id;

        if !(bundle_matches && app_matches) {
            debug!(bundle_matches, app_matches, "rejecting payload app identity");
            return Err(VerificationStatus::InvalidAppIdentifier.into());
        }
        Ok(())
    }

    fn check_environment(&self, environment: Option<&str>) -> Result<(), VerificationError> {
        if environment != Some(self.settings.environment.as_str()) {
            debug!(expected = %self.settings.environment, "rejecting payload environment");
            return Err(VerificationStatus::InvalidEnvironment.into());
        }
        Ok(())
    }
}

/// Identity fields of an already verified payload.
fn read_identity<I: DeserializeOwned>(payload: &[u8]) -> Result<I, VerificationError> {
    serde_json::from_slice(payload).map_err(failure_payload)
}

fn failure_payload(e: serde_json::Error) -> VerificationError {
    debug!(error = %e, "rejecting undecodable payload");
    VerificationError::verification_failure(TokenError::Payload(e))
}
