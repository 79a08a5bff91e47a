// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Base64 engines used for JWS segments and `x5c` certificates.
//!
//! Both engines accept input with or without trailing `=` padding. JWS segments are
//! produced unpadded, but some issuers pad `x5c` entries and some do not.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

const LENIENT_PADDING: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// URL-safe alphabet used by JWS compact serialization.
pub const BASE64_URL: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

/// Standard alphabet used by the `x5c` header (RFC 7515, section 4.1.6).
pub const BASE64_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);

pub fn decode_base64url(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_URL.decode(input)
}

pub fn decode_base64_standard(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_STANDARD.decode(input)
}
