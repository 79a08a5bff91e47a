// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test helpers shared by the workspace's integration tests.
//!
//! Generates `[leaf, intermediate, root]` chains shaped like the App Store's, signs
//! compact JWS tokens with the leaf key, and provides canned revocation checkers.
//! [`ocsp`] builds signed OCSP responses for the same chains.

pub mod ocsp;

use std::sync::Mutex;
use std::time::SystemTime;

use appstore_jws_x509::{IssuerKey, RevocationChecker, RevocationError};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use const_oid::ObjectIdentifier;
use der::asn1::Ia5String;
use der::Encode as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey as _;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CustomExtension, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, GeneralSubtree, IsCa, KeyPair, KeyUsagePurpose, NameConstraints,
};
use serde_json::{json, Value};
use signature::Signer as _;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{AccessDescription, AuthorityInfoAccessSyntax};
use x509_parser::prelude::X509Certificate;

const LEAF_RECEIPT_SIGNER: &[u64] = &[1, 2, 840, 113635, 100, 6, 11, 1];
const WWDR_INTERMEDIATE: &[u64] = &[1, 2, 840, 113635, 100, 6, 2, 1];
const AUTHORITY_INFO_ACCESS: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 1];
const UNKNOWN_EXTENSION: &[u64] = &[1, 3, 6, 1, 4, 1, 55555, 1];
const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");

/// Knobs for [`generate_chain`]. The default produces a chain the verifier accepts.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub root_common_name: String,
    pub leaf_receipt_extension: bool,
    pub leaf_receipt_extension_critical: bool,
    pub leaf_unknown_critical_extension: bool,
    pub intermediate_wwdr_extension: bool,
    pub intermediate_is_ca: bool,
    pub intermediate_key_cert_sign: bool,
    /// `(year, month, day)` applied to leaf and intermediate.
    pub not_before: (i32, u8, u8),
    pub not_after: (i32, u8, u8),
    /// OCSP responder URL placed in the leaf and intermediate AIA extension.
    pub ocsp_url: Option<String>,
    /// Critical nameConstraints on the intermediate permitting only this organization.
    pub intermediate_permitted_organization: Option<String>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            root_common_name: "Test Root CA - G3".to_string(),
            leaf_receipt_extension: true,
            leaf_receipt_extension_critical: false,
            leaf_unknown_critical_extension: false,
            intermediate_wwdr_extension: true,
            intermediate_is_ca: true,
            intermediate_key_cert_sign: true,
            not_before: (2020, 1, 1),
            not_after: (2035, 12, 31),
            ocsp_url: None,
            intermediate_permitted_organization: None,
        }
    }
}

/// A generated chain plus the leaf and intermediate signing keys.
pub struct GeneratedChain {
    pub root_der: Vec<u8>,
    pub intermediate_der: Vec<u8>,
    pub leaf_der: Vec<u8>,
    leaf_key: SigningKey,
    intermediate_key: SigningKey,
    intermediate_cert: Certificate,
    intermediate_key_pair: KeyPair,
}

impl GeneratedChain {
    /// The chain as an `x5c` header value: leaf, intermediate, root.
    pub fn x5c(&self) -> Vec<String> {
        [&self.leaf_der, &self.intermediate_der, &self.root_der]
            .iter()
            .map(|der| STANDARD.encode(der))
            .collect()
    }

    /// Sign `payload` with `{"alg":"ES256","x5c":[...]}`.
    pub fn sign_payload(&self, payload: &Value) -> String {
        self.sign_with_header(&json!({ "alg": "ES256", "x5c": self.x5c() }), payload)
    }

    pub fn sign_with_header(&self, header: &Value, payload: &Value) -> String {
        sign_compact(&self.leaf_key, header, payload)
    }

    pub fn leaf(&self) -> X509Certificate<'_> {
        parse(&self.leaf_der)
    }

    pub fn intermediate(&self) -> X509Certificate<'_> {
        parse(&self.intermediate_der)
    }

    /// The intermediate's key, which signs OCSP responses for the leaf.
    pub fn intermediate_key(&self) -> &SigningKey {
        &self.intermediate_key
    }

    /// Issue a delegated OCSP responder certificate from the intermediate.
    ///
    /// Returns the certificate DER and its key. `ocsp_signing` controls whether the
    /// certificate carries id-kp-OCSPSigning.
    pub fn issue_ocsp_responder(&self, ocsp_signing: bool) -> (Vec<u8>, SigningKey) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = name("Test OCSP Responder");
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        if ocsp_signing {
            params.extended_key_usages = vec![ExtendedKeyUsagePurpose::OcspSigning];
        }
        params.not_before = rcgen::date_time_ymd(2020, 1, 1);
        params.not_after = rcgen::date_time_ymd(2035, 12, 31);

        let cert = params
            .signed_by(&key, &self.intermediate_cert, &self.intermediate_key_pair)
            .unwrap();
        (cert.der().to_vec(), signing_key(&key))
    }
}

pub fn generate_chain(options: &ChainOptions) -> GeneratedChain {
    let root_key = KeyPair::generate().unwrap();
    let root = root_params(&options.root_common_name).self_signed(&root_key).unwrap();

    let intermediate_key = KeyPair::generate().unwrap();
    let intermediate = intermediate_params(options)
        .signed_by(&intermediate_key, &root, &root_key)
        .unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let leaf = leaf_params(options)
        .signed_by(&leaf_key, &intermediate, &intermediate_key)
        .unwrap();

    GeneratedChain {
        root_der: root.der().to_vec(),
        intermediate_der: intermediate.der().to_vec(),
        leaf_der: leaf.der().to_vec(),
        leaf_key: signing_key(&leaf_key),
        intermediate_key: signing_key(&intermediate_key),
        intermediate_cert: intermediate,
        intermediate_key_pair: intermediate_key,
    }
}

fn signing_key(key: &KeyPair) -> SigningKey {
    SigningKey::from_pkcs8_der(&key.serialize_der()).unwrap()
}

/// A chain with default options.
pub fn valid_chain() -> GeneratedChain {
    generate_chain(&ChainOptions::default())
}

/// A self-signed root whose subject matches the default chain's root but whose key does not.
pub fn impostor_root() -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let root: Certificate = root_params(&ChainOptions::default().root_common_name).self_signed(&key).unwrap();
    root.der().to_vec()
}

/// Build `header.payload.signature` with a raw r||s ES256 signature.
pub fn sign_compact(key: &SigningKey, header: &Value, payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap());
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    let signing_input = format!("{header}.{payload}");
    let signature: Signature = key.sign(signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
}

fn root_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = name(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.not_before = rcgen::date_time_ymd(2015, 1, 1);
    params.not_after = rcgen::date_time_ymd(2045, 1, 1);
    params
}

fn intermediate_params(options: &ChainOptions) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = name("Test Worldwide Developer Relations CA - G6");
    params.is_ca = if options.intermediate_is_ca {
        IsCa::Ca(BasicConstraints::Constrained(0))
    } else {
        IsCa::ExplicitNoCa
    };
    params.key_usages = if options.intermediate_key_cert_sign {
        vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign]
    } else {
        vec![KeyUsagePurpose::DigitalSignature]
    };
    set_validity(&mut params, options);

    if options.intermediate_wwdr_extension {
        params
            .custom_extensions
            .push(CustomExtension::from_oid_content(WWDR_INTERMEDIATE, vec![0x05, 0x00]));
    }
    if let Some(url) = &options.ocsp_url {
        params.custom_extensions.push(ocsp_aia_extension(url));
    }
    if let Some(organization) = &options.intermediate_permitted_organization {
        let mut permitted = DistinguishedName::new();
        permitted.push(DnType::OrganizationName, organization.as_str());
        params.name_constraints = Some(NameConstraints {
            permitted_subtrees: vec![GeneralSubtree::DirectoryName(permitted)],
            excluded_subtrees: Vec::new(),
        });
    }
    params
}

fn leaf_params(options: &ChainOptions) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = name("Test StoreKit Signing");
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    set_validity(&mut params, options);

    if options.leaf_receipt_extension {
        let mut ext = CustomExtension::from_oid_content(LEAF_RECEIPT_SIGNER, vec![0x05, 0x00]);
        ext.set_criticality(options.leaf_receipt_extension_critical);
        params.custom_extensions.push(ext);
    }
    if options.leaf_unknown_critical_extension {
        let mut ext = CustomExtension::from_oid_content(UNKNOWN_EXTENSION, vec![0x05, 0x00]);
        ext.set_criticality(true);
        params.custom_extensions.push(ext);
    }
    if let Some(url) = &options.ocsp_url {
        params.custom_extensions.push(ocsp_aia_extension(url));
    }
    params
}

fn set_validity(params: &mut CertificateParams, options: &ChainOptions) {
    let (y, m, d) = options.not_before;
    params.not_before = rcgen::date_time_ymd(y, m, d);
    let (y, m, d) = options.not_after;
    params.not_after = rcgen::date_time_ymd(y, m, d);
}

fn name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "Test Inc.");
    dn
}

/// AuthorityInfoAccessSyntax with a single id-ad-ocsp URI.
fn ocsp_aia_extension(url: &str) -> CustomExtension {
    let aia = AuthorityInfoAccessSyntax(vec![AccessDescription {
        access_method: ID_AD_OCSP,
        access_location: GeneralName::UniformResourceIdentifier(Ia5String::new(url).unwrap()),
    }]);
    CustomExtension::from_oid_content(AUTHORITY_INFO_ACCESS, aia.to_der().unwrap())
}

fn parse(der: &[u8]) -> X509Certificate<'_> {
    use x509_parser::prelude::FromDer as _;
    X509Certificate::from_der(der).unwrap().1
}

/// Reports every certificate as good.
#[derive(Debug, Default)]
pub struct AcceptingRevocationChecker;

impl RevocationChecker for AcceptingRevocationChecker {
    fn check(&self, _cert: &X509Certificate<'_>, _issuer: IssuerKey<'_>, _at: SystemTime) -> Result<(), RevocationError> {
        Ok(())
    }
}

/// Reports every certificate as revoked.
#[derive(Debug, Default)]
pub struct RevokingRevocationChecker;

impl RevocationChecker for RevokingRevocationChecker {
    fn check(&self, cert: &X509Certificate<'_>, _issuer: IssuerKey<'_>, _at: SystemTime) -> Result<(), RevocationError> {
        Err(RevocationError::Revoked(cert.raw_serial_as_string()))
    }
}

/// Accepts everything and records the subject of each certificate it was asked about.
#[derive(Debug, Default)]
pub struct RecordingRevocationChecker {
    checked: Mutex<Vec<String>>,
}

impl RecordingRevocationChecker {
    pub fn checked_subjects(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

impl RevocationChecker for RecordingRevocationChecker {
    fn check(&self, cert: &X509Certificate<'_>, _issuer: IssuerKey<'_>, _at: SystemTime) -> Result<(), RevocationError> {
        self.checked.lock().unwrap().push(cert.subject().to_string());
        Ok(())
    }
}
