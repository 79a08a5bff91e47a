// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compact JWS parsing.
//!
//! Parsing never verifies anything: it splits `header.payload.signature`, decodes the
//! three base64url segments and deserializes the header. Callers must not trust the
//! payload until the chain and signature have been verified.

use serde::Deserialize;
use thiserror::Error;

use crate::encoding::decode_base64url;

#[derive(Debug, Error)]
pub enum JwsParseError {
    #[error("compact JWS must have 3 segments, found {0}")]
    SegmentCount(usize),

    #[error("JWS {segment} segment is not valid base64url: {source}")]
    Base64 {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("JWS header is not valid JSON: {0}")]
    Header(#[source] serde_json::Error),
}

/// The JOSE header fields the verifier looks at. Other header members are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JwsHeader {
    #[serde(default)]
    pub alg: Option<String>,

    /// Leaf-first certificate chain, each entry standard-base64 DER.
    #[serde(default)]
    pub x5c: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct CompactJws<'a> {
    signing_input: &'a str,
    pub header: JwsHeader,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl<'a> CompactJws<'a> {
    /// The exact bytes covered by the signature: `BASE64URL(header) || '.' || BASE64URL(payload)`.
    pub fn signing_input(&self) -> &'a [u8] {
        self.signing_input.as_bytes()
    }
}

pub fn parse_compact_jws(token: &str) -> Result<CompactJws<'_>, JwsParseError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        return Err(JwsParseError::SegmentCount(segments.len()));
    };

    let header_json = decode_base64url(header_b64).map_err(|source| JwsParseError::Base64 {
        segment: "header",
        source,
    })?;
    let payload = decode_base64url(payload_b64).map_err(|source| JwsParseError::Base64 {
        segment: "payload",
        source,
    })?;
    let signature = decode_base64url(signature_b64).map_err(|source| JwsParseError::Base64 {
        segment: "signature",
        source,
    })?;

    let header: JwsHeader = serde_json::from_slice(&header_json).map_err(JwsParseError::Header)?;

    Ok(CompactJws {
        signing_input: &token[..header_b64.len() + 1 + payload_b64.len()],
        header,
        payload,
        signature,
    })
}
