//! Certificate extensions.
//!
//! # References
//!
//! - [RFC 5280 Section 4.2](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2)
//!
//! ```text
//! Extension  ::=  SEQUENCE  {
//!      extnID      OBJECT IDENTIFIER,
//!      critical    BOOLEAN DEFAULT FALSE,
//!      extnValue   OCTET STRING
//!                  -- contains the DER encoding of an ASN.1 value
//!                  -- corresponding to the extension type identified
//!                  -- by extnID
//!      }
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::{
    der::{
        BOOLEAN, DNS_NAME, DerElement, INTEGER, IP_ADDRESS, OBJECT_IDENTIFIER, OCTET_STRING,
        RFC822_NAME, SEQUENCE, URI,
    },
    oid, parse,
};

/// Kind of a subject alternative name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AltNameKind {
    Email,
    Dns,
    IpAddress,
}

impl AltNameKind {
    /// Key used for the name in a decoded extension map.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AltNameKind::Email => "email",
            AltNameKind::Dns => "DNS",
            AltNameKind::IpAddress => "IP Address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionValue {
    /// Ordered key and value pairs, keys may repeat.
    Map(Vec<(String, String)>),
    Hex(String),
    BasicConstraints {
        ca: bool,
        path_len_constraint: Option<u64>,
    },
    /// Contents of `extnValue` for extensions without a decoder.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    oid: String,
    name: String,
    value: ExtensionValue,
    critical: bool,
    supported: bool,
}

impl Extension {
    /// Dotted OID.
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Display name, the dotted OID when it is not in the name table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &ExtensionValue {
        &self.value
    }

    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// False when the value was passed through undecoded.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.supported
    }
}

type Decoder = fn(&str, &[u8], &mut Vec<(AltNameKind, String)>) -> Option<ExtensionValue>;

const DECODERS: &[(&str, Decoder)] = &[
    (oid::AUTHORITY_INFO_ACCESS, authority_info_access),
    (oid::SUBJECT_KEY_IDENTIFIER, subject_key_identifier),
    (oid::BASIC_CONSTRAINTS, basic_constraints),
    (oid::AUTHORITY_KEY_IDENTIFIER, authority_key_identifier),
    (oid::SUBJECT_ALT_NAME, subject_alt_name),
];

/// Decode one `Extension`, adding subject alternative names to `alt_names`.
///
/// `None` when the structure is malformed, or when the value of an extension
/// with a decoder is.
pub(crate) fn read(
    name: &str,
    b: &[u8],
    alt_names: &mut Vec<(AltNameKind, String)>,
) -> Option<Extension> {
    let (remain, extn_id) =
        DerElement::read_expected(OBJECT_IDENTIFIER, &format!("{name}.extnID"), b)?;
    let extn_oid: String = extn_id.to_object_id()?;

    let (remain, critical_or_value) = DerElement::read_expected2(
        BOOLEAN,
        OCTET_STRING,
        &format!("{name}.critical_or_extnValue"),
        remain,
    )?;

    let (remain, critical, extn_value) = if critical_or_value.tag() == BOOLEAN {
        let critical: bool = critical_or_value.to_bool().or_else(|| {
            log::error!("{name}.critical is not a valid BOOLEAN");
            None
        })?;
        let (remain, extn_value) =
            DerElement::read_expected(OCTET_STRING, &format!("{name}.extnValue"), remain)?;
        (remain, critical, extn_value)
    } else {
        (remain, false, critical_or_value)
    };

    if !remain.is_empty() {
        log::error!("{name} contains {} bytes of extra data", remain.len());
        return None;
    }

    let display_name: String =
        oid::name(&extn_oid).map_or_else(|| extn_oid.clone(), str::to_string);

    let decoder: Option<Decoder> = DECODERS
        .iter()
        .find(|(decoder_oid, _)| *decoder_oid == extn_oid)
        .map(|(_, decoder)| *decoder);

    let (value, supported) = match decoder {
        Some(decoder) => {
            let value: ExtensionValue =
                decoder(&format!("{name}.{display_name}"), extn_value.value(), alt_names)?;
            (value, true)
        }
        None => {
            if critical {
                log::warn!("{name} critical extension {display_name} is not decoded");
            } else {
                log::debug!("{name} extension {display_name} is not decoded");
            }
            (ExtensionValue::Raw(extn_value.into_value()), false)
        }
    };

    Some(Extension {
        oid: extn_oid,
        name: display_name,
        value,
        critical,
        supported,
    })
}

/// Exactly one element of type `tag` fills `b`.
fn read_whole(tag: u8, name: &str, b: &[u8]) -> Option<DerElement> {
    let (remain, element) = DerElement::read_expected(tag, name, b)?;
    if !remain.is_empty() {
        log::error!("{name} contains {} bytes of extra data", remain.len());
        return None;
    }
    Some(element)
}

/// Text form of an email, DNS or URI `GeneralName`, `None` for other choices.
fn general_name_text(general_name: &DerElement) -> Option<String> {
    match general_name.tag() {
        RFC822_NAME | DNS_NAME | URI => Some(general_name.to_text()),
        _ => None,
    }
}

/// # References
///
/// - [RFC 5280 Section 4.2.2.1](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.2.1)
///
/// ```text
/// AuthorityInfoAccessSyntax  ::=
///         SEQUENCE SIZE (1..MAX) OF AccessDescription
///
/// AccessDescription  ::=  SEQUENCE {
///         accessMethod          OBJECT IDENTIFIER,
///         accessLocation        GeneralName  }
/// ```
fn authority_info_access(
    name: &str,
    b: &[u8],
    _: &mut Vec<(AltNameKind, String)>,
) -> Option<ExtensionValue> {
    let syntax: DerElement = read_whole(SEQUENCE, &format!("{name}.AuthorityInfoAccessSyntax"), b)?;

    let mut map: Vec<(String, String)> = Vec::new();

    for (n, description) in syntax.to_list().into_iter().enumerate() {
        let description_name: String = format!("{name}.AccessDescription[{n}]");
        let parts: Vec<DerElement> = description.to_list();

        let [access_method, access_location] = parts.as_slice() else {
            log::error!("{description_name} has {} elements, expected 2", parts.len());
            return None;
        };
        if description.tag() != SEQUENCE || access_method.tag() != OBJECT_IDENTIFIER {
            log::error!("{description_name} is not a SEQUENCE starting with an OID");
            return None;
        }

        let Some(location) = general_name_text(access_location) else {
            log::warn!(
                "{description_name}.accessLocation {:?} ignored",
                access_location.identifier()
            );
            continue;
        };

        map.push((access_method.to_object_name()?, location));
    }

    Some(ExtensionValue::Map(map))
}

/// # References
///
/// - [RFC 5280 Section 4.2.1.2](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.2)
fn subject_key_identifier(
    name: &str,
    b: &[u8],
    _: &mut Vec<(AltNameKind, String)>,
) -> Option<ExtensionValue> {
    let key_id: DerElement = read_whole(OCTET_STRING, &format!("{name}.KeyIdentifier"), b)?;
    Some(ExtensionValue::Hex(
        parse::colon_hex(key_id.value()).to_uppercase(),
    ))
}

/// # References
///
/// - [RFC 5280 Section 4.2.1.9](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.9)
///
/// ```text
/// BasicConstraints ::= SEQUENCE {
///     cA                      BOOLEAN DEFAULT FALSE,
///     pathLenConstraint       INTEGER (0..MAX) OPTIONAL }
/// ```
fn basic_constraints(
    name: &str,
    b: &[u8],
    _: &mut Vec<(AltNameKind, String)>,
) -> Option<ExtensionValue> {
    let name: String = format!("{name}.BasicConstraints");
    let seq: DerElement = read_whole(SEQUENCE, &name, b)?;

    let mut b: &[u8] = seq.value();

    let ca: bool = if b.first() == Some(&BOOLEAN) {
        let (remain, ca) = DerElement::read(&format!("{name}.cA"), b)?;
        b = remain;
        ca.to_bool()?
    } else {
        false
    };

    let path_len_constraint: Option<u64> = if b.is_empty() {
        None
    } else {
        let path_len: DerElement =
            read_whole(INTEGER, &format!("{name}.pathLenConstraint"), b)?;
        Some(path_len.to_integer()?)
    };

    Some(ExtensionValue::BasicConstraints {
        ca,
        path_len_constraint,
    })
}

/// # References
///
/// - [RFC 5280 Section 4.2.1.1](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.1)
///
/// ```text
/// AuthorityKeyIdentifier ::= SEQUENCE {
///   keyIdentifier             [0] KeyIdentifier           OPTIONAL,
///   authorityCertIssuer       [1] GeneralNames            OPTIONAL,
///   authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL  }
/// ```
fn authority_key_identifier(
    name: &str,
    b: &[u8],
    _: &mut Vec<(AltNameKind, String)>,
) -> Option<ExtensionValue> {
    let seq: DerElement = read_whole(SEQUENCE, &format!("{name}.AuthorityKeyIdentifier"), b)?;

    let mut map: Vec<(String, String)> = Vec::new();
    for child in seq.to_list() {
        match child.tag() {
            0x80 => map.push(("keyid".to_string(), hex::encode(child.value()))),
            0x82 => map.push(("serial".to_string(), serial_text(child.value()))),
            _ => {}
        }
    }

    Some(ExtensionValue::Map(map))
}

/// # References
///
/// - [RFC 5280 Section 4.2.1.6](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.6)
///
/// ```text
/// SubjectAltName ::= GeneralNames
///
/// GeneralNames ::= SEQUENCE SIZE (1..MAX) OF GeneralName
/// ```
fn subject_alt_name(
    name: &str,
    b: &[u8],
    alt_names: &mut Vec<(AltNameKind, String)>,
) -> Option<ExtensionValue> {
    let general_names: DerElement = read_whole(SEQUENCE, &format!("{name}.GeneralNames"), b)?;

    let mut map: Vec<(String, String)> = Vec::new();

    for (n, general_name) in general_names.to_list().into_iter().enumerate() {
        let entry: (AltNameKind, String) = match general_name.tag() {
            RFC822_NAME => (AltNameKind::Email, general_name.to_text()),
            DNS_NAME => (AltNameKind::Dns, general_name.to_text()),
            IP_ADDRESS => {
                let address: IpAddr = match general_name.value().len() {
                    4 => {
                        let octets: [u8; 4] = general_name.value().try_into().ok()?;
                        IpAddr::V4(Ipv4Addr::from(octets))
                    }
                    16 => {
                        let octets: [u8; 16] = general_name.value().try_into().ok()?;
                        IpAddr::V6(Ipv6Addr::from(octets))
                    }
                    len => {
                        log::warn!(
                            "{name}.GeneralNames[{n}] IP address of length {len} ignored, expected 4 or 16"
                        );
                        continue;
                    }
                };
                (AltNameKind::IpAddress, address.to_string())
            }
            _ => {
                log::debug!(
                    "{name}.GeneralNames[{n}] {:?} ignored",
                    general_name.identifier()
                );
                continue;
            }
        };

        map.push((entry.0.label().to_string(), entry.1.clone()));
        alt_names.push(entry);
    }

    Some(ExtensionValue::Map(map))
}

/// Colon hex of an unsigned integer without leading zero bytes, `00` for zero.
pub(crate) fn serial_text(integer: &[u8]) -> String {
    let skip: usize = integer.iter().take_while(|&&byte| byte == 0).count();
    if skip == integer.len() {
        return "00".to_string();
    }
    parse::colon_hex(&integer[skip..])
}
