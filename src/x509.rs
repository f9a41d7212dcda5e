//! # References
//!
//! - [RFC 5280 Section 4.1](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1)
//! - [A Warm Welcome to ASN.1 and DER](https://letsencrypt.org/docs/a-warm-welcome-to-asn1-and-der/)

use jiff::Zoned;

use crate::{
    AltNameKind, Error, Extension, HashAlgorithm, Key, KeyAlgorithm, KeyType, armor,
    der::{BIT_STRING, Class, DerElement, INTEGER, SEQUENCE},
    extension, oid,
};

/// A decoded X.509 certificate.
///
/// Everything is read once when parsing, the DER the certificate was parsed
/// from is kept and is the authoritative form.
///
/// ```text
/// Certificate  ::=  SEQUENCE  {
///     tbsCertificate       TBSCertificate,
///     signatureAlgorithm   AlgorithmIdentifier,
///     signatureValue       BIT STRING  }
///
/// TBSCertificate  ::=  SEQUENCE  {
///      version         [0]  EXPLICIT Version DEFAULT v1,
///      serialNumber         CertificateSerialNumber,
///      signature            AlgorithmIdentifier,
///      issuer               Name,
///      validity             Validity,
///      subject              Name,
///      subjectPublicKeyInfo SubjectPublicKeyInfo,
///      issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///      subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///      extensions      [3]  EXPLICIT Extensions OPTIONAL
///      }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    version: String,
    serial_number: String,
    issuer: Vec<(String, String)>,
    subject: Vec<(String, String)>,
    not_before: Zoned,
    not_after: Zoned,
    public_key_info: Vec<u8>,
    public_key_algorithm: KeyAlgorithm,
    extensions: Vec<Extension>,
    alt_names: Vec<(AltNameKind, String)>,
    subject_matches_issuer: bool,
    der: Vec<u8>,
}

impl Certificate {
    /// Parse the certificate at the front of `bytes`.
    ///
    /// Bytes after the certificate are ignored.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (remain, certificate) = Self::read(bytes)?;
        if !remain.is_empty() {
            log::warn!("Certificate followed by {} bytes of extra data", remain.len());
        }
        Some(certificate)
    }

    /// Parse concatenated DER certificates until `count` are read, the input
    /// is exhausted, or one fails to parse.
    ///
    /// `None` reads without limit.
    pub fn from_der_many(bytes: &[u8], count: Option<usize>) -> Vec<Self> {
        let limit: usize = count.unwrap_or(usize::MAX);
        let mut certificates: Vec<Self> = Vec::new();
        let mut b: &[u8] = bytes;

        while !b.is_empty() && certificates.len() < limit {
            match Self::read(b) {
                Some((remain, certificate)) => {
                    certificates.push(certificate);
                    b = remain;
                }
                None => {
                    log::debug!(
                        "Stopped after {} certificates with {} bytes unread",
                        certificates.len(),
                        b.len()
                    );
                    break;
                }
            }
        }

        certificates
    }

    /// Like [`Certificate::from_der_many`] over the `CERTIFICATE` blocks of
    /// PEM text, other blocks are skipped.
    pub fn from_pem_many(text: &str, count: Option<usize>) -> Result<Vec<Self>, Error> {
        let limit: usize = count.unwrap_or(usize::MAX);
        let mut certificates: Vec<Self> = Vec::new();

        for block in armor::decode_all(text)? {
            if certificates.len() >= limit {
                break;
            }
            if block.tag() != armor::CERTIFICATE {
                log::debug!("Skipping PEM block {}", block.tag());
                continue;
            }
            match Self::parse(block.contents()) {
                Some(certificate) => certificates.push(certificate),
                None => break,
            }
        }

        Ok(certificates)
    }

    fn read(buf: &[u8]) -> Option<(&[u8], Self)> {
        let (remain, span, certificate) = DerElement::read_span("Certificate", buf)?;
        if certificate.tag() != SEQUENCE {
            log::error!(
                "Certificate expected SEQUENCE got {:?}",
                certificate.identifier()
            );
            return None;
        }

        let (b, tbs_certificate) = DerElement::read_expected(
            SEQUENCE,
            "Certificate.tbsCertificate",
            certificate.value(),
        )?;
        let (b, _) = DerElement::read_expected(SEQUENCE, "Certificate.signatureAlgorithm", b)?;
        let (b, _) = DerElement::read_expected(BIT_STRING, "Certificate.signatureValue", b)?;
        if !b.is_empty() {
            log::error!("Certificate contains {} bytes of extra data", b.len());
            return None;
        }

        let tbs: Tbs = Tbs::read(tbs_certificate.value())?;

        Some((
            remain,
            Self {
                version: tbs.version,
                serial_number: tbs.serial_number,
                issuer: tbs.issuer.to_info(),
                subject: tbs.subject.to_info(),
                subject_matches_issuer: tbs.issuer_span == tbs.subject_span,
                not_before: tbs.not_before,
                not_after: tbs.not_after,
                public_key_info: tbs.public_key_info,
                public_key_algorithm: tbs.public_key_algorithm,
                extensions: tbs.extensions,
                alt_names: tbs.alt_names,
                der: span.to_vec(),
            },
        ))
    }

    /// `1`, `2` or `3`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Lowercase colon hex without leading zero bytes.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Issuer attributes in encoding order.
    #[must_use]
    pub fn issuer(&self) -> &[(String, String)] {
        &self.issuer
    }

    #[must_use]
    pub fn subject(&self) -> &[(String, String)] {
        &self.subject
    }

    /// Values of an issuer attribute, given by display name or dotted OID.
    #[must_use]
    pub fn issuer_info(&self, attribute: &str) -> Vec<&str> {
        info(&self.issuer, attribute)
    }

    #[must_use]
    pub fn subject_info(&self, attribute: &str) -> Vec<&str> {
        info(&self.subject, attribute)
    }

    /// First `CN`, else `OU`, else `O`, else empty.
    #[must_use]
    pub fn issuer_display_name(&self) -> String {
        display_name(&self.issuer)
    }

    #[must_use]
    pub fn subject_display_name(&self) -> String {
        display_name(&self.subject)
    }

    /// `notBefore`
    #[must_use]
    pub fn effective_date(&self) -> &Zoned {
        &self.not_before
    }

    /// `notAfter`
    #[must_use]
    pub fn expiry_date(&self) -> &Zoned {
        &self.not_after
    }

    /// True when the encoded issuer and subject names are byte for byte the
    /// same. The signature is not checked.
    #[must_use]
    pub fn is_self_signed(&self) -> bool {
        self.subject_matches_issuer
    }

    #[must_use]
    pub fn public_key_algorithm(&self) -> KeyAlgorithm {
        self.public_key_algorithm
    }

    /// DER of the `SubjectPublicKeyInfo`.
    #[must_use]
    pub fn public_key_info(&self) -> &[u8] {
        &self.public_key_info
    }

    pub fn public_key(&self) -> Result<Key, Error> {
        Key::from_der(
            KeyType::Public,
            self.public_key_algorithm,
            &self.public_key_info,
            "",
        )
    }

    #[must_use]
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Email, DNS and IP address entries of the subject alternative name
    /// extension, in encoding order.
    #[must_use]
    pub fn subject_alternative_names(&self) -> &[(AltNameKind, String)] {
        &self.alt_names
    }

    /// Digest of the DER, a certificate fingerprint.
    #[must_use]
    pub fn digest(&self, hash: HashAlgorithm) -> Vec<u8> {
        hash.digest(&self.der)
    }

    #[must_use]
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn to_pem(&self) -> String {
        armor::encode(armor::CERTIFICATE, &self.der)
    }
}

fn info<'a>(attributes: &'a [(String, String)], attribute: &str) -> Vec<&'a str> {
    let key: &str = match oid::name(attribute) {
        Some(name) => name,
        None => attribute,
    };
    attributes
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
        .collect()
}

fn display_name(attributes: &[(String, String)]) -> String {
    ["CN", "OU", "O"]
        .iter()
        .find_map(|key| info(attributes, key).first().map(|value| value.to_string()))
        .unwrap_or_default()
}

/// Fields of a `TBSCertificate` before they are moved into [`Certificate`].
struct Tbs {
    version: String,
    serial_number: String,
    issuer: DerElement,
    issuer_span: Vec<u8>,
    not_before: Zoned,
    not_after: Zoned,
    subject: DerElement,
    subject_span: Vec<u8>,
    public_key_info: Vec<u8>,
    public_key_algorithm: KeyAlgorithm,
    extensions: Vec<Extension>,
    alt_names: Vec<(AltNameKind, String)>,
}

impl Tbs {
    fn read(b: &[u8]) -> Option<Self> {
        let (b, version) = Self::read_version(b)?;

        let (b, serial_number) =
            DerElement::read_expected(INTEGER, "Certificate.tbsCertificate.serialNumber", b)?;
        let (b, _) =
            DerElement::read_expected(SEQUENCE, "Certificate.tbsCertificate.signature", b)?;

        let (b, issuer_span, issuer) =
            read_span_expected(SEQUENCE, "Certificate.tbsCertificate.issuer", b)?;

        let (b, validity) =
            DerElement::read_expected(SEQUENCE, "Certificate.tbsCertificate.validity", b)?;
        let (not_before, not_after) = Self::read_validity(&validity)?;

        let (b, subject_span, subject) =
            read_span_expected(SEQUENCE, "Certificate.tbsCertificate.subject", b)?;

        let (mut b, public_key_info, spki) = read_span_expected(
            SEQUENCE,
            "Certificate.tbsCertificate.subjectPublicKeyInfo",
            b,
        )?;
        let public_key_algorithm: KeyAlgorithm = spki
            .to_list()
            .first()
            .and_then(|algorithm| algorithm.to_list().into_iter().next())
            .and_then(|algorithm_oid| algorithm_oid.to_object_id())
            .map(|algorithm_oid| KeyAlgorithm::from_oid(&algorithm_oid))
            .or_else(|| {
                log::error!(
                    "Certificate.tbsCertificate.subjectPublicKeyInfo.algorithm is malformed"
                );
                None
            })?;

        let mut extensions: Vec<Extension> = Vec::new();
        let mut alt_names: Vec<(AltNameKind, String)> = Vec::new();
        let mut prev_number: u8 = 0;

        while !b.is_empty() {
            let (local_b, optional) =
                DerElement::read("Certificate.tbsCertificate optional", b)?;
            b = local_b;

            let identifier = optional.identifier();
            if identifier.class != Class::ContextSpecific || identifier.number <= prev_number {
                log::error!(
                    "Certificate.tbsCertificate unexpected {identifier:?} after field [{prev_number}]"
                );
                return None;
            }
            prev_number = identifier.number;

            match identifier.number {
                1 | 2 => log::debug!("Certificate.tbsCertificate ignoring unique identifier"),
                3 => Self::read_extensions(optional.value(), &mut extensions, &mut alt_names)?,
                number => {
                    log::error!("Certificate.tbsCertificate contains unexpected field [{number}]");
                    return None;
                }
            }
        }

        Some(Self {
            version,
            serial_number: extension::serial_text(serial_number.value()),
            issuer,
            issuer_span: issuer_span.to_vec(),
            not_before,
            not_after,
            subject,
            subject_span: subject_span.to_vec(),
            public_key_info: public_key_info.to_vec(),
            public_key_algorithm,
            extensions,
            alt_names,
        })
    }

    /// ```text
    /// Version  ::=  INTEGER  {  v1(0), v2(1), v3(2)  }
    /// ```
    fn read_version(b: &[u8]) -> Option<(&[u8], String)> {
        if b.first() != Some(&0xA0) {
            return Some((b, "1".to_string()));
        }

        let (b, explicit) = DerElement::read("Certificate.tbsCertificate.version", b)?;
        let (remain, version) = DerElement::read_expected(
            INTEGER,
            "Certificate.tbsCertificate.version",
            explicit.value(),
        )?;
        if !remain.is_empty() {
            log::error!(
                "Certificate.tbsCertificate.version contains {} bytes of extra data",
                remain.len()
            );
            return None;
        }

        let version: u64 = version.to_integer()?;
        Some((b, version.saturating_add(1).to_string()))
    }

    /// ```text
    /// Validity ::= SEQUENCE {
    ///      notBefore      Time,
    ///      notAfter       Time }
    /// ```
    fn read_validity(validity: &DerElement) -> Option<(Zoned, Zoned)> {
        let times: Vec<DerElement> = validity.to_list();
        let [not_before, not_after] = times.as_slice() else {
            log::error!(
                "Certificate.tbsCertificate.validity has {} elements, expected 2",
                times.len()
            );
            return None;
        };
        Some((not_before.to_date_time()?, not_after.to_date_time()?))
    }

    /// ```text
    /// Extensions  ::=  SEQUENCE SIZE (1..MAX) OF Extension
    /// ```
    fn read_extensions(
        b: &[u8],
        extensions: &mut Vec<Extension>,
        alt_names: &mut Vec<(AltNameKind, String)>,
    ) -> Option<()> {
        let (remain, seq) =
            DerElement::read_expected(SEQUENCE, "Certificate.tbsCertificate.extensions", b)?;
        if !remain.is_empty() {
            log::error!(
                "Certificate.tbsCertificate.extensions contains {} bytes of extra data",
                remain.len()
            );
            return None;
        }

        let mut b: &[u8] = seq.value();
        while !b.is_empty() {
            let name: String =
                format!("Certificate.tbsCertificate.extensions[{}]", extensions.len());
            let (local_b, encoding) = DerElement::read_expected(SEQUENCE, &name, b)?;
            b = local_b;

            extensions.push(extension::read(&name, encoding.value(), alt_names)?);
        }

        Some(())
    }
}

fn read_span_expected<'a>(
    tag: u8,
    name: &str,
    b: &'a [u8],
) -> Option<(&'a [u8], &'a [u8], DerElement)> {
    let (remain, span, element) = DerElement::read_span(name, b)?;
    if element.tag() != tag {
        log::error!("{name} expected tag 0x{tag:02x} got {:?}", element.identifier());
        return None;
    }
    Some((remain, span, element))
}
