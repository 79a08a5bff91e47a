// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

use crate::environment::Environment;

/// What a verified payload must be issued for.
///
/// Deserializable so hosts can keep it next to the rest of their configuration:
///
/// ```json
/// { "bundleId": "com.example", "appAppleId": 1234, "environment": "Production" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierSettings {
    pub bundle_id: String,

    /// Required for [`Environment::Production`].
    #[serde(default)]
    pub app_apple_id: Option<i64>,

    pub environment: Environment,

    /// Check revocation over the network and validate certificates at the current time
    /// instead of the payload's `signedDate`.
    #[serde(default)]
    pub enable_online_checks: bool,
}

impl VerifierSettings {
    pub fn new(bundle_id: impl Into<String>, environment: Environment) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            app_apple_id: None,
            environment,
            enable_online_checks: false,
        }
    }

    pub fn with_app_apple_id(mut self, app_apple_id: i64) -> Self {
        self.app_apple_id = Some(app_apple_id);
        self
    }

    pub fn with_online_checks(mut self, enabled: bool) -> Self {
        self.enable_online_checks = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_camel_case_json() {
        let settings: VerifierSettings =
            serde_json::from_str(r#"{"bundleId":"com.example","environment":"Sandbox"}"#).unwrap();
        assert_eq!(settings, VerifierSettings::new("com.example", Environment::Sandbox));

        let settings: VerifierSettings = serde_json::from_str(
            r#"{"bundleId":"com.example","appAppleId":1234,"environment":"Production","enableOnlineChecks":true}"#,
        )
        .unwrap();
        assert_eq!(settings.app_apple_id, Some(1234));
        assert!(settings.enable_online_checks);
    }
}
