//! Public and private keys.
//!
//! # References
//!
//! - [RFC 5280 Section 4.1.2.7](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.7)
//!   `SubjectPublicKeyInfo`
//! - [RFC 5208 Section 5](https://datatracker.ietf.org/doc/html/rfc5208#section-5)
//!   `PrivateKeyInfo`
//! - [RFC 8017 Appendix A.1](https://datatracker.ietf.org/doc/html/rfc8017#appendix-A.1)
//!   `RSAPrivateKey`
//! - [RFC 5915 Section 3](https://datatracker.ietf.org/doc/html/rfc5915#section-3)
//!   `ECPrivateKey`

use std::borrow::Cow;

use rand::{RngCore, rngs::OsRng};

use crate::{
    Cipher, Error, armor,
    der::{BIT_STRING, DerElement, INTEGER, OBJECT_IDENTIFIER, OCTET_STRING, SEQUENCE},
    kdf, oid, pkcs8,
};

/// `PrivateKeyInfo` nested inside `PrivateKeyInfo` is only followed this far.
const MAX_NESTING: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Dsa,
    Dh,
    Ec,
    /// Keys held by an external provider, these have no DER form.
    Opaque,
}

impl KeyAlgorithm {
    pub(crate) fn from_oid(algorithm_oid: &str) -> Self {
        match algorithm_oid {
            oid::RSA_ENCRYPTION => KeyAlgorithm::Rsa,
            oid::DSA => KeyAlgorithm::Dsa,
            oid::DH_PUBLIC_NUMBER | oid::DH_KEY_AGREEMENT => KeyAlgorithm::Dh,
            oid::EC_PUBLIC_KEY => KeyAlgorithm::Ec,
            _ => KeyAlgorithm::Opaque,
        }
    }

    /// `PrivateKeyInfo` algorithm of keys that are wrapped from their
    /// traditional form.
    pub(crate) fn pkcs8_oid(self) -> Option<&'static str> {
        match self {
            KeyAlgorithm::Rsa => Some(oid::RSA_ENCRYPTION),
            KeyAlgorithm::Dsa => Some(oid::DSA),
            KeyAlgorithm::Dh | KeyAlgorithm::Ec | KeyAlgorithm::Opaque => None,
        }
    }

    fn traditional_label(self) -> Option<&'static str> {
        match self {
            KeyAlgorithm::Rsa => Some("RSA PRIVATE KEY"),
            KeyAlgorithm::Dsa => Some("DSA PRIVATE KEY"),
            KeyAlgorithm::Dh => Some("DH PRIVATE KEY"),
            KeyAlgorithm::Ec => Some("EC PRIVATE KEY"),
            KeyAlgorithm::Opaque => None,
        }
    }
}

/// A decoded key, holding its DER and the facts read from it.
///
/// A key decoded from nothing is the null key, it has no DER and a bit length
/// of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    key_type: KeyType,
    algorithm: KeyAlgorithm,
    der: Vec<u8>,
    bit_length: usize,
    pkcs8: bool,
}

impl Key {
    #[must_use]
    pub fn null(key_type: KeyType, algorithm: KeyAlgorithm) -> Self {
        Self {
            key_type,
            algorithm,
            der: Vec::new(),
            bit_length: 0,
            pkcs8: false,
        }
    }

    /// Decode a key of the declared type and algorithm.
    ///
    /// Public keys are `SubjectPublicKeyInfo`. Private keys are
    /// `PrivateKeyInfo` or the traditional per algorithm structure, and an
    /// `EncryptedPrivateKeyInfo` is decrypted with `passphrase` first.
    pub fn from_der(
        key_type: KeyType,
        algorithm: KeyAlgorithm,
        der: &[u8],
        passphrase: &str,
    ) -> Result<Self, Error> {
        if der.is_empty() {
            return Ok(Self::null(key_type, algorithm));
        }

        if algorithm == KeyAlgorithm::Opaque {
            return Err(Error::UnsupportedAlgorithm(
                "opaque keys have no DER encoding".to_string(),
            ));
        }

        match key_type {
            KeyType::Public => decode_public(algorithm, der),
            KeyType::Private => {
                let der: Cow<[u8]> = if pkcs8::is_encrypted_pkcs8(der) {
                    Cow::Owned(pkcs8::decrypt(der, passphrase)?)
                } else {
                    Cow::Borrowed(der)
                };
                decode_private(algorithm, &der, 0)
            }
        }
    }

    /// Decode the first PEM block of `text`.
    ///
    /// Blocks with `Proc-Type: 4,ENCRYPTED` are decrypted with a key derived
    /// from `passphrase` and the `DEK-Info` IV.
    pub fn from_pem(
        key_type: KeyType,
        algorithm: KeyAlgorithm,
        text: &str,
        passphrase: &str,
    ) -> Result<Self, Error> {
        let block = armor::decode(text)?;

        let label_ok: bool = match key_type {
            KeyType::Public => block.tag() == armor::PUBLIC_KEY,
            KeyType::Private => block.tag().ends_with(armor::PRIVATE_KEY),
        };
        if !label_ok {
            return Err(Error::Malformed(format!(
                "PEM block '{}' does not hold a {key_type:?} key",
                block.tag()
            )));
        }

        match armor::legacy_encryption(&block)? {
            Some((cipher, iv)) => {
                log::debug!("Decrypting {} with {}", block.tag(), cipher.dek_info_name());
                let key: Vec<u8> = kdf::legacy_key(passphrase.as_bytes(), &iv, cipher.key_len());
                let plaintext: Vec<u8> = cipher.decrypt(block.contents(), &key, &iv)?;
                Self::from_der(key_type, algorithm, &plaintext, "")
            }
            None => Self::from_der(key_type, algorithm, block.contents(), passphrase),
        }
    }

    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Modulus size for RSA, prime size for DSA and DH, field size for EC.
    #[must_use]
    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.der.is_empty()
    }

    /// True for private keys held as `PrivateKeyInfo`.
    #[must_use]
    pub fn is_pkcs8(&self) -> bool {
        self.pkcs8
    }

    /// DER as decoded, always unencrypted.
    #[must_use]
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// PEM encoding, encrypted when `passphrase` is not empty.
    ///
    /// `PrivateKeyInfo` keys are encrypted to an `ENCRYPTED PRIVATE KEY`,
    /// traditional keys get `DES-EDE3-CBC` legacy encryption.
    pub fn to_pem(&self, passphrase: &str) -> Result<String, Error> {
        if self.is_null() {
            return Err(Error::InvalidInput("the null key has no PEM encoding".to_string()));
        }

        if self.key_type == KeyType::Public {
            return Ok(armor::encode(armor::PUBLIC_KEY, &self.der));
        }

        if self.pkcs8 {
            return if passphrase.is_empty() {
                Ok(armor::encode(armor::PRIVATE_KEY, &self.der))
            } else {
                let encrypted: Vec<u8> = pkcs8::encrypt_pkcs8(&self.der, passphrase)?;
                Ok(armor::encode(armor::ENCRYPTED_PRIVATE_KEY, &encrypted))
            };
        }

        let label: &str = self.algorithm.traditional_label().ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("{:?} has no PEM label", self.algorithm))
        })?;

        if passphrase.is_empty() {
            return Ok(armor::encode(label, &self.der));
        }

        let cipher: Cipher = Cipher::DesEde3Cbc;
        let mut iv: Vec<u8> = vec![0; cipher.iv_len()];
        OsRng.fill_bytes(&mut iv);

        let key: Vec<u8> = kdf::legacy_key(passphrase.as_bytes(), &iv, cipher.key_len());
        let encrypted: Vec<u8> = cipher.encrypt(&self.der, &key, &iv)?;

        armor::encode_with_headers(
            label,
            &encrypted,
            &[
                (armor::PROC_TYPE, armor::PROC_TYPE_ENCRYPTED),
                (armor::DEK_INFO, &armor::dek_info(cipher, &iv)),
            ],
        )
    }
}

/// Bits in a big endian unsigned integer, ignoring leading zero bytes.
pub(crate) fn number_of_bits(integer: &[u8]) -> usize {
    let skip: usize = integer.iter().take_while(|&&byte| byte == 0).count();
    let significant: &[u8] = &integer[skip..];
    match significant.first() {
        Some(first) => significant.len() * 8 - first.leading_zeros() as usize,
        None => 0,
    }
}

fn check_algorithm(
    declared: KeyAlgorithm,
    found: KeyAlgorithm,
    algorithm_oid: &str,
) -> Result<(), Error> {
    if found == KeyAlgorithm::Opaque {
        log::error!("Key algorithm {algorithm_oid} is not supported");
        return Err(Error::UnsupportedAlgorithm(algorithm_oid.to_string()));
    }
    if declared != found {
        log::error!("Declared a {declared:?} key, the encoding holds {found:?}");
        return Err(Error::AlgorithmMismatch {
            expected: declared,
            found,
        });
    }
    Ok(())
}

/// `AlgorithmIdentifier` OID and its parameters, if any.
fn algorithm_identifier(
    name: &str,
    element: &DerElement,
) -> Result<(String, Option<DerElement>), Error> {
    let malformed = || Error::Malformed(name.to_string());

    if element.tag() != SEQUENCE {
        log::error!("{name} is {:?}, expected SEQUENCE", element.identifier());
        return Err(malformed());
    }

    let mut children = element.to_list().into_iter();
    let algorithm_oid: String = children
        .next()
        .filter(|algorithm| algorithm.tag() == OBJECT_IDENTIFIER)
        .and_then(|algorithm| algorithm.to_object_id())
        .ok_or_else(malformed)?;

    Ok((algorithm_oid, children.next()))
}

/// Size of the prime `p`, the first INTEGER of DSA and DH domain parameters.
fn prime_bits(parameters: Option<&DerElement>) -> Result<usize, Error> {
    parameters
        .filter(|parameters| parameters.tag() == SEQUENCE)
        .and_then(|parameters| parameters.to_list().into_iter().next())
        .filter(|p| p.tag() == INTEGER)
        .map(|p| number_of_bits(p.value()))
        .ok_or_else(|| Error::Malformed("domain parameters without a prime".to_string()))
}

fn named_curve_bits(parameters: Option<&DerElement>) -> Result<usize, Error> {
    let curve: String = parameters
        .filter(|parameters| parameters.tag() == OBJECT_IDENTIFIER)
        .and_then(DerElement::to_object_id)
        .ok_or_else(|| Error::Malformed("EC parameters are not a named curve".to_string()))?;

    oid::curve_bits(&curve).ok_or_else(|| {
        log::error!("Curve {curve} is not known");
        Error::UnsupportedAlgorithm(curve)
    })
}

/// ```text
/// SubjectPublicKeyInfo  ::=  SEQUENCE  {
///      algorithm            AlgorithmIdentifier,
///      subjectPublicKey     BIT STRING  }
/// ```
fn decode_public(algorithm: KeyAlgorithm, der: &[u8]) -> Result<Key, Error> {
    const NAME: &str = "SubjectPublicKeyInfo";
    let malformed = || Error::Malformed(NAME.to_string());

    let (remain, span, spki) =
        DerElement::read_span(NAME, der).ok_or_else(|| Error::unreadable(NAME, der))?;
    if spki.tag() != SEQUENCE {
        return Err(malformed());
    }
    if !remain.is_empty() {
        log::warn!("{NAME} followed by {} trailing bytes", remain.len());
    }

    let children: Vec<DerElement> = spki.to_list();
    let [algorithm_identifier_element, public_key] = children.as_slice() else {
        log::error!("{NAME} has {} elements, expected 2", children.len());
        return Err(malformed());
    };
    if public_key.tag() != BIT_STRING {
        log::error!("{NAME}.subjectPublicKey is {:?}", public_key.identifier());
        return Err(malformed());
    }

    let (algorithm_oid, parameters) =
        algorithm_identifier(&format!("{NAME}.algorithm"), algorithm_identifier_element)?;
    let found: KeyAlgorithm = KeyAlgorithm::from_oid(&algorithm_oid);
    check_algorithm(algorithm, found, &algorithm_oid)?;

    let bit_length: usize = match found {
        KeyAlgorithm::Rsa => {
            // first octet of a BIT STRING counts the unused bits
            let rsa_public_key: &[u8] = public_key.value().get(1..).ok_or_else(malformed)?;
            let (_, rsa_public_key) =
                DerElement::read_expected(SEQUENCE, "RSAPublicKey", rsa_public_key)
                    .ok_or_else(malformed)?;
            rsa_public_key
                .to_list()
                .first()
                .filter(|modulus| modulus.tag() == INTEGER)
                .map(|modulus| number_of_bits(modulus.value()))
                .ok_or_else(|| Error::Malformed("RSAPublicKey.modulus".to_string()))?
        }
        KeyAlgorithm::Dsa | KeyAlgorithm::Dh => prime_bits(parameters.as_ref())?,
        KeyAlgorithm::Ec => named_curve_bits(parameters.as_ref())?,
        KeyAlgorithm::Opaque => return Err(Error::UnsupportedAlgorithm(algorithm_oid)),
    };

    Ok(Key {
        key_type: KeyType::Public,
        algorithm: found,
        der: span.to_vec(),
        bit_length,
        pkcs8: false,
    })
}

/// ```text
/// PrivateKeyInfo ::= SEQUENCE {
///   version                   Version,
///   privateKeyAlgorithm       PrivateKeyAlgorithmIdentifier,
///   privateKey                PrivateKey,
///   attributes           [0]  IMPLICIT Attributes OPTIONAL }
/// ```
///
/// Anything else is matched against the traditional structures by shape.
fn decode_private(algorithm: KeyAlgorithm, der: &[u8], depth: usize) -> Result<Key, Error> {
    const NAME: &str = "PrivateKey";
    let malformed = || Error::Malformed(NAME.to_string());

    let (remain, span, key) =
        DerElement::read_span(NAME, der).ok_or_else(|| Error::unreadable(NAME, der))?;
    if key.tag() != SEQUENCE {
        log::error!("{NAME} is {:?}, expected SEQUENCE", key.identifier());
        return Err(malformed());
    }
    if !remain.is_empty() {
        log::warn!("{NAME} followed by {} trailing bytes", remain.len());
    }

    let children: Vec<DerElement> = key.to_list();
    let version: &[u8] = children
        .first()
        .filter(|version| version.tag() == INTEGER)
        .map(DerElement::value)
        .ok_or_else(malformed)?;

    let is_private_key_info: bool = matches!(version, [0] | [1])
        && (3..=5).contains(&children.len())
        && children[1].tag() == SEQUENCE
        && children[2].tag() == OCTET_STRING;

    let (found, bit_length, pkcs8) = if is_private_key_info {
        let (algorithm_oid, parameters) =
            algorithm_identifier("PrivateKeyInfo.privateKeyAlgorithm", &children[1])?;
        let found: KeyAlgorithm = KeyAlgorithm::from_oid(&algorithm_oid);
        check_algorithm(algorithm, found, &algorithm_oid)?;

        let bit_length: usize = match found {
            KeyAlgorithm::Rsa => {
                if depth >= MAX_NESTING {
                    log::error!("PrivateKeyInfo nested deeper than {MAX_NESTING}");
                    return Err(malformed());
                }
                decode_private(KeyAlgorithm::Rsa, children[2].value(), depth + 1)?.bit_length
            }
            KeyAlgorithm::Dsa | KeyAlgorithm::Dh => prime_bits(parameters.as_ref())?,
            KeyAlgorithm::Ec => named_curve_bits(parameters.as_ref())?,
            KeyAlgorithm::Opaque => return Err(Error::UnsupportedAlgorithm(algorithm_oid)),
        };

        (found, bit_length, true)
    } else {
        let all_integers: bool = children.iter().all(|child| child.tag() == INTEGER);
        let found: KeyAlgorithm = match (version, children.len()) {
            // version n e d p q dp dq qinv
            ([0], 9) if all_integers => KeyAlgorithm::Rsa,
            // version p q g y x
            ([0], 6) if all_integers && algorithm == KeyAlgorithm::Dh => KeyAlgorithm::Dh,
            ([0], 6) if all_integers => KeyAlgorithm::Dsa,
            ([0], 5) if children[1].tag() == INTEGER => KeyAlgorithm::Dh,
            // version privateKey [0] parameters [1] publicKey
            ([1], 4)
                if children[1].tag() == OCTET_STRING
                    && children[2].tag() == 0xA0
                    && children[3].tag() == 0xA1 =>
            {
                KeyAlgorithm::Ec
            }
            _ => {
                log::error!(
                    "{NAME} with version {version:02x?} and {} elements is not a known structure",
                    children.len()
                );
                return Err(malformed());
            }
        };

        if found != algorithm {
            log::error!("Declared a {algorithm:?} key, the encoding holds {found:?}");
            return Err(Error::AlgorithmMismatch {
                expected: algorithm,
                found,
            });
        }

        let bit_length: usize = match found {
            KeyAlgorithm::Ec => {
                let curve: Option<DerElement> = children[2].to_list().into_iter().next();
                named_curve_bits(curve.as_ref())?
            }
            _ => number_of_bits(children[1].value()),
        };

        (found, bit_length, false)
    };

    Ok(Key {
        key_type: KeyType::Private,
        algorithm: found,
        der: span.to_vec(),
        bit_length,
        pkcs8,
    })
}
