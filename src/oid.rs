//! Object identifier constants and display name tables.
//!
//! # References
//!
//! - [RFC 5280 Appendix A](https://datatracker.ietf.org/doc/html/rfc5280#appendix-A)
//! - [RFC 8018 Appendix C](https://datatracker.ietf.org/doc/html/rfc8018#appendix-C)
//! - [SEC 2](https://www.secg.org/sec2-v2.pdf)

pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const DSA: &str = "1.2.840.10040.4.1";
pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
/// X9.42 dhpublicnumber
pub const DH_PUBLIC_NUMBER: &str = "1.2.840.10046.2.1";
/// PKCS #3 dhKeyAgreement
pub const DH_KEY_AGREEMENT: &str = "1.2.840.113549.1.3.1";

pub const PBE_MD2_DES: &str = "1.2.840.113549.1.5.1";
pub const PBE_MD2_RC2: &str = "1.2.840.113549.1.5.4";
pub const PBE_MD5_DES: &str = "1.2.840.113549.1.5.3";
pub const PBE_MD5_RC2: &str = "1.2.840.113549.1.5.6";
pub const PBE_SHA1_DES: &str = "1.2.840.113549.1.5.10";
pub const PBE_SHA1_RC2: &str = "1.2.840.113549.1.5.11";
pub const PBKDF2: &str = "1.2.840.113549.1.5.12";
pub const PBES2: &str = "1.2.840.113549.1.5.13";
/// Prefix of the PKCS #12 password based encryption arc.
pub const PKCS12_PBE_PREFIX: &str = "1.2.840.113549.1.12.";
pub const PKCS12_PBE_SHA1_3DES: &str = "1.2.840.113549.1.12.1.3";

pub const DES_CBC: &str = "1.3.14.3.2.7";
pub const DES_EDE3_CBC: &str = "1.2.840.113549.3.7";
pub const RC2_CBC: &str = "1.2.840.113549.3.2";
pub const RC5_CBC_PAD: &str = "1.2.840.113549.3.9";
pub const AES128_CBC: &str = "2.16.840.1.101.3.4.1.2";
pub const AES192_CBC: &str = "2.16.840.1.101.3.4.1.22";
pub const AES256_CBC: &str = "2.16.840.1.101.3.4.1.42";

pub const HMAC_SHA1: &str = "1.2.840.113549.2.7";
pub const HMAC_SHA224: &str = "1.2.840.113549.2.8";
pub const HMAC_SHA256: &str = "1.2.840.113549.2.9";
pub const HMAC_SHA384: &str = "1.2.840.113549.2.10";
pub const HMAC_SHA512: &str = "1.2.840.113549.2.11";
pub const SHA1: &str = "1.3.14.3.2.26";

pub const PKCS7_DATA: &str = "1.2.840.113549.1.7.1";
pub const PKCS9_LOCAL_KEY_ID: &str = "1.2.840.113549.1.9.21";
pub const PKCS9_X509_CERTIFICATE: &str = "1.2.840.113549.1.9.22.1";
pub const PKCS12_SHROUDED_KEY_BAG: &str = "1.2.840.113549.1.12.10.1.2";
pub const PKCS12_CERT_BAG: &str = "1.2.840.113549.1.12.10.1.3";

pub const AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
pub const SUBJECT_KEY_IDENTIFIER: &str = "2.5.29.14";
pub const SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const AUTHORITY_KEY_IDENTIFIER: &str = "2.5.29.35";

const NAMES: &[(&str, &str)] = &[
    // X.520 attribute types
    ("2.5.4.3", "CN"),
    ("2.5.4.4", "SN"),
    ("2.5.4.5", "serialNumber"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.9", "street"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.12", "title"),
    ("2.5.4.13", "description"),
    ("2.5.4.17", "postalCode"),
    ("2.5.4.41", "name"),
    ("2.5.4.42", "GN"),
    ("2.5.4.43", "initials"),
    ("2.5.4.46", "dnQualifier"),
    ("1.2.840.113549.1.9.1", "emailAddress"),
    ("0.9.2342.19200300.100.1.5", "favouriteDrink"),
    // access methods
    ("1.3.6.1.5.5.7.48.1", "OCSP"),
    ("1.3.6.1.5.5.7.48.2", "caIssuers"),
    // certificate extensions
    (AUTHORITY_INFO_ACCESS, "authorityInfoAccess"),
    (SUBJECT_KEY_IDENTIFIER, "subjectKeyIdentifier"),
    ("2.5.29.15", "keyUsage"),
    (SUBJECT_ALT_NAME, "subjectAltName"),
    (BASIC_CONSTRAINTS, "basicConstraints"),
    ("2.5.29.31", "cRLDistributionPoints"),
    ("2.5.29.32", "certificatePolicies"),
    (AUTHORITY_KEY_IDENTIFIER, "authorityKeyIdentifier"),
    ("2.5.29.37", "extendedKeyUsage"),
];

const CURVES: &[(&str, usize)] = &[
    ("1.2.840.10045.3.1.1", 192), // secp192r1
    ("1.3.132.0.33", 224),        // secp224r1
    ("1.2.840.10045.3.1.7", 256), // secp256r1
    ("1.3.132.0.34", 384),        // secp384r1
    ("1.3.132.0.35", 521),        // secp521r1
    ("1.3.132.0.6", 112),         // secp112r1
    ("1.3.132.0.7", 112),         // secp112r2
    ("1.3.132.0.28", 128),        // secp128r1
    ("1.3.132.0.29", 128),        // secp128r2
    ("1.3.132.0.9", 160),         // secp160k1
    ("1.3.132.0.8", 160),         // secp160r1
    ("1.3.132.0.30", 160),        // secp160r2
    ("1.3.132.0.31", 192),        // secp192k1
    ("1.3.132.0.32", 224),        // secp224k1
    ("1.3.132.0.10", 256),        // secp256k1
    ("1.3.132.0.4", 113),         // sect113r1
    ("1.3.132.0.5", 113),         // sect113r2
    ("1.3.132.0.22", 131),        // sect131r1
    ("1.3.132.0.23", 131),        // sect131r2
    ("1.3.132.0.1", 163),         // sect163k1
    ("1.3.132.0.2", 163),         // sect163r1
    ("1.3.132.0.15", 163),        // sect163r2
    ("1.3.132.0.24", 193),        // sect193r1
    ("1.3.132.0.25", 193),        // sect193r2
    ("1.3.132.0.26", 233),        // sect233k1
    ("1.3.132.0.27", 233),        // sect233r1
    ("1.3.132.0.3", 239),         // sect239k1
    ("1.3.132.0.16", 283),        // sect283k1
    ("1.3.132.0.17", 283),        // sect283r1
    ("1.3.132.0.36", 409),        // sect409k1
    ("1.3.132.0.37", 409),        // sect409r1
    ("1.3.132.0.38", 571),        // sect571k1
    ("1.3.132.0.39", 571),        // sect571r1
    ("1.3.36.3.3.2.8.1.1.1", 160),  // brainpoolP160r1
    ("1.3.36.3.3.2.8.1.1.3", 192),  // brainpoolP192r1
    ("1.3.36.3.3.2.8.1.1.5", 224),  // brainpoolP224r1
    ("1.3.36.3.3.2.8.1.1.7", 256),  // brainpoolP256r1
    ("1.3.36.3.3.2.8.1.1.9", 320),  // brainpoolP320r1
    ("1.3.36.3.3.2.8.1.1.11", 384), // brainpoolP384r1
    ("1.3.36.3.3.2.8.1.1.13", 512), // brainpoolP512r1
];

/// Display name for a dotted OID, if it is in the table.
pub fn name(oid: &str) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(dotted, _)| *dotted == oid)
        .map(|(_, name)| *name)
}

/// Field size in bits of a named elliptic curve.
pub fn curve_bits(oid: &str) -> Option<usize> {
    CURVES
        .iter()
        .find(|(dotted, _)| *dotted == oid)
        .map(|(_, bits)| *bits)
}
