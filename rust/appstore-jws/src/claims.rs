// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Views of the payload fields the verifier reads, independent of the caller's payload type.
//!
//! Each view names only the fields one entry point checks, so unrelated fields of any
//! shape never affect verification.

use serde::Deserialize;

/// Read by every entry point to choose the validation time.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignedDate {
    pub signed_date: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionIdentity {
    pub bundle_id: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppTransactionIdentity {
    pub bundle_id: Option<String>,
    pub app_apple_id: Option<i64>,
    pub receipt_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NotificationIdentity {
    pub data: Option<NotificationScope>,
    pub summary: Option<NotificationScope>,
}

/// `data` or `summary` of a server notification.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationScope {
    pub bundle_id: Option<String>,
    pub app_apple_id: Option<i64>,
    pub environment: Option<String>,
}

impl NotificationIdentity {
    /// Identity comes from `data`, or from `summary` when `data` is absent.
    pub fn into_scope(self) -> NotificationScope {
        self.data.or(self.summary).unwrap_or_default()
    }
}
