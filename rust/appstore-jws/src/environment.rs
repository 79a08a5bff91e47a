// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The App Store server environment a payload was issued for.
///
/// Serialized with the strings the App Store uses in payloads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Sandbox,
    Production,
    Xcode,
    LocalTesting,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Sandbox => "Sandbox",
            Environment::Production => "Production",
            Environment::Xcode => "Xcode",
            Environment::LocalTesting => "LocalTesting",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown App Store environment: {0:?}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sandbox" => Ok(Environment::Sandbox),
            "Production" => Ok(Environment::Production),
            "Xcode" => Ok(Environment::Xcode),
            "LocalTesting" => Ok(Environment::LocalTesting),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_forms_round_trip() {
        for env in [
            Environment::Sandbox,
            Environment::Production,
            Environment::Xcode,
            Environment::LocalTesting,
        ] {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
            assert_eq!(serde_json::to_string(&env).unwrap(), format!("\"{env}\""));
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert_eq!(
            "sandbox".parse::<Environment>(),
            Err(UnknownEnvironment("sandbox".to_string()))
        );
    }
}
