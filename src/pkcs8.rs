//! Encrypted PKCS #8 private keys.
//!
//! # References
//!
//! - [RFC 5958 Section 3](https://datatracker.ietf.org/doc/html/rfc5958#section-3)
//! - [RFC 8018](https://datatracker.ietf.org/doc/html/rfc8018)
//!
//! ```text
//! EncryptedPrivateKeyInfo ::= SEQUENCE {
//!   encryptionAlgorithm  EncryptionAlgorithmIdentifier,
//!   encryptedData        EncryptedData }
//!
//! EncryptedData ::= OCTET STRING
//! ```

use std::borrow::Cow;

use rand::{RngCore, rngs::OsRng};

use crate::{
    Cipher, Error,
    der::{self, DerElement, INTEGER, OBJECT_IDENTIFIER, OCTET_STRING, SEQUENCE},
    kdf::{self, HashAlgorithm},
    oid,
};

/// Iteration count used when encrypting.
const PBKDF2_ITERATIONS: u32 = 2048;

/// Structural check for an `EncryptedPrivateKeyInfo`, nothing is decrypted.
#[must_use]
pub fn is_encrypted_pkcs8(der: &[u8]) -> bool {
    if der.first() != Some(&SEQUENCE) {
        return false;
    }

    let Some((_, outer)) = DerElement::read("EncryptedPrivateKeyInfo", der) else {
        return false;
    };

    match outer.to_list().as_slice() {
        [algorithm, encrypted_data] => {
            algorithm.tag() == SEQUENCE
                && algorithm
                    .to_list()
                    .first()
                    .is_some_and(|algorithm_oid| algorithm_oid.tag() == OBJECT_IDENTIFIER)
                && encrypted_data.tag() == OCTET_STRING
        }
        _ => false,
    }
}

/// Decrypt an `EncryptedPrivateKeyInfo` into a `PrivateKeyInfo`.
///
/// When the data cannot be decrypted, because the scheme is unsupported or
/// the passphrase is wrong, `der` is returned unchanged.
pub fn decrypt_pkcs8<'a>(der: &'a [u8], passphrase: &str) -> Cow<'a, [u8]> {
    match decrypt(der, passphrase) {
        Ok(plaintext) => Cow::Owned(plaintext),
        Err(e) => {
            log::warn!("EncryptedPrivateKeyInfo left encrypted: {e}");
            Cow::Borrowed(der)
        }
    }
}

pub(crate) fn decrypt(der: &[u8], passphrase: &str) -> Result<Vec<u8>, Error> {
    let malformed = || Error::Malformed("EncryptedPrivateKeyInfo".to_string());

    let (_, outer) = DerElement::read_expected(SEQUENCE, "EncryptedPrivateKeyInfo", der)
        .ok_or_else(|| Error::unreadable("EncryptedPrivateKeyInfo", der))?;

    let children: Vec<DerElement> = outer.to_list();
    let [algorithm, encrypted_data] = children.as_slice() else {
        log::error!(
            "EncryptedPrivateKeyInfo has {} elements, expected 2",
            children.len()
        );
        return Err(malformed());
    };

    if algorithm.tag() != SEQUENCE || encrypted_data.tag() != OCTET_STRING {
        log::error!(
            "EncryptedPrivateKeyInfo expected a SEQUENCE and OCTET STRING, got {:?} and {:?}",
            algorithm.identifier(),
            encrypted_data.identifier()
        );
        return Err(malformed());
    }

    let algorithm: Vec<DerElement> = algorithm.to_list();
    let algorithm_oid: String = algorithm
        .first()
        .and_then(DerElement::to_object_id)
        .ok_or_else(malformed)?;
    let params: Option<&DerElement> = algorithm.get(1);

    let descriptor: EncryptionDescriptor = match algorithm_oid.as_str() {
        oid::PBES2 => EncryptionDescriptor::pbes2(params, passphrase)?,
        oid::PBE_MD2_DES
        | oid::PBE_MD2_RC2
        | oid::PBE_MD5_DES
        | oid::PBE_MD5_RC2
        | oid::PBE_SHA1_DES
        | oid::PBE_SHA1_RC2 => EncryptionDescriptor::pbes1(&algorithm_oid, params, passphrase)?,
        pkcs12 if pkcs12.starts_with(oid::PKCS12_PBE_PREFIX) => {
            log::warn!("PKCS #12 password based encryption {pkcs12} is not implemented");
            return Err(Error::UnsupportedAlgorithm(pkcs12.to_string()));
        }
        other => {
            log::error!("EncryptedPrivateKeyInfo uses unsupported algorithm {other}");
            return Err(Error::UnsupportedAlgorithm(other.to_string()));
        }
    };

    let plaintext: Vec<u8> = descriptor.cipher.decrypt(
        encrypted_data.value(),
        &descriptor.key,
        &descriptor.iv,
    )?;

    Ok(unwrap_octet_string(plaintext))
}

/// Some encoders wrap the `PrivateKeyInfo` in an extra OCTET STRING.
fn unwrap_octet_string(plaintext: Vec<u8>) -> Vec<u8> {
    if plaintext.first() != Some(&OCTET_STRING) {
        return plaintext;
    }

    match DerElement::read("PrivateKeyInfo", &plaintext) {
        Some((remain, inner)) if remain.is_empty() => inner.into_value(),
        _ => plaintext,
    }
}

/// Encrypt a `PrivateKeyInfo` with PBES2, PBKDF2 with HMAC-SHA256 and
/// DES-EDE3-CBC, under a fresh salt and IV.
pub fn encrypt_pkcs8(private_key_info: &[u8], passphrase: &str) -> Result<Vec<u8>, Error> {
    let mut salt: [u8; 8] = [0; 8];
    OsRng.fill_bytes(&mut salt);
    let mut iv: [u8; 8] = [0; 8];
    OsRng.fill_bytes(&mut iv);

    let cipher: Cipher = Cipher::DesEde3Cbc;
    let key: Vec<u8> = kdf::pbkdf2(
        HashAlgorithm::Sha256,
        passphrase.as_bytes(),
        &salt,
        PBKDF2_ITERATIONS,
        cipher.key_len(),
    )?;
    let encrypted: Vec<u8> = cipher.encrypt(private_key_info, &key, &iv)?;

    let kdf_params: DerElement = DerElement::from_vector(&[
        DerElement::from_octet_string(salt.to_vec()),
        DerElement::from_integer(PBKDF2_ITERATIONS.into()),
        DerElement::from_vector(&[der::object_id(oid::HMAC_SHA256)?, DerElement::null()]),
    ]);

    let pbes2_params: DerElement = DerElement::from_vector(&[
        DerElement::from_vector(&[der::object_id(oid::PBKDF2)?, kdf_params]),
        DerElement::from_vector(&[
            der::object_id(oid::DES_EDE3_CBC)?,
            DerElement::from_octet_string(iv.to_vec()),
        ]),
    ]);

    Ok(DerElement::from_vector(&[
        DerElement::from_vector(&[der::object_id(oid::PBES2)?, pbes2_params]),
        DerElement::from_octet_string(encrypted),
    ])
    .to_der())
}

/// Cipher with derived key and IV, never retained past one decryption.
struct EncryptionDescriptor {
    cipher: Cipher,
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl EncryptionDescriptor {
    /// # References
    ///
    /// - [RFC 8018 Appendix A.3](https://datatracker.ietf.org/doc/html/rfc8018#appendix-A.3)
    ///
    /// ```text
    /// PBEParameter ::= SEQUENCE {
    ///    salt OCTET STRING (SIZE(8)),
    ///    iterationCount INTEGER }
    /// ```
    fn pbes1(scheme: &str, params: Option<&DerElement>, passphrase: &str) -> Result<Self, Error> {
        let (hash, cipher): (HashAlgorithm, Cipher) = match scheme {
            oid::PBE_MD5_DES => (HashAlgorithm::Md5, Cipher::DesCbc),
            oid::PBE_SHA1_DES => (HashAlgorithm::Sha1, Cipher::DesCbc),
            // PBES1 fixes RC2 at 64 effective key bits
            oid::PBE_MD5_RC2 => (
                HashAlgorithm::Md5,
                Cipher::Rc2Cbc {
                    effective_key_bits: 64,
                },
            ),
            oid::PBE_SHA1_RC2 => (
                HashAlgorithm::Sha1,
                Cipher::Rc2Cbc {
                    effective_key_bits: 64,
                },
            ),
            other => {
                log::error!("PBES1 scheme {other} requires MD2, which is not supported");
                return Err(Error::UnsupportedAlgorithm(other.to_string()));
            }
        };

        let name: &str = "PBES1.PBEParameter";
        let params: Vec<DerElement> = expect_sequence(name, params)?;

        let [salt, iterations] = params.as_slice() else {
            log::error!("{name} has {} elements, expected 2", params.len());
            return Err(Error::Malformed(name.to_string()));
        };

        if salt.tag() != OCTET_STRING || salt.value().len() != 8 {
            log::error!("{name}.salt must be an 8 byte OCTET STRING");
            return Err(Error::Malformed(format!("{name}.salt")));
        }

        let iterations: u32 = iteration_count(name, iterations)?;

        let dk: Vec<u8> = kdf::pbkdf1(hash, passphrase.as_bytes(), salt.value(), iterations, 16)?;
        let (key, iv) = dk.split_at(8);

        Ok(Self {
            cipher,
            key: key.to_vec(),
            iv: iv.to_vec(),
        })
    }

    /// # References
    ///
    /// - [RFC 8018 Appendix A.2 and A.4](https://datatracker.ietf.org/doc/html/rfc8018#appendix-A.2)
    ///
    /// ```text
    /// PBES2-params ::= SEQUENCE {
    ///   keyDerivationFunc AlgorithmIdentifier {{PBES2-KDFs}},
    ///   encryptionScheme AlgorithmIdentifier {{PBES2-Encs}} }
    ///
    /// PBKDF2-params ::= SEQUENCE {
    ///   salt CHOICE {
    ///     specified OCTET STRING,
    ///     otherSource AlgorithmIdentifier {{PBKDF2-SaltSources}}
    ///   },
    ///   iterationCount INTEGER (1..MAX),
    ///   keyLength INTEGER (1..MAX) OPTIONAL,
    ///   prf AlgorithmIdentifier {{PBKDF2-PRFs}} DEFAULT
    ///   algid-hmacWithSHA1 }
    /// ```
    fn pbes2(params: Option<&DerElement>, passphrase: &str) -> Result<Self, Error> {
        let params: Vec<DerElement> = expect_sequence("PBES2-params", params)?;

        let [key_derivation_func, encryption_scheme] = params.as_slice() else {
            log::error!("PBES2-params has {} elements, expected 2", params.len());
            return Err(Error::Malformed("PBES2-params".to_string()));
        };

        let kdf: Vec<DerElement> =
            expect_sequence("PBES2-params.keyDerivationFunc", Some(key_derivation_func))?;
        let kdf_oid: String = kdf
            .first()
            .and_then(DerElement::to_object_id)
            .ok_or_else(|| Error::Malformed("PBES2-params.keyDerivationFunc".to_string()))?;

        if kdf_oid != oid::PBKDF2 {
            log::error!("PBES2 key derivation function {kdf_oid} is not PBKDF2");
            return Err(Error::UnsupportedAlgorithm(kdf_oid));
        }

        let name: &str = "PBKDF2-params";
        let kdf_params: Vec<DerElement> = expect_sequence(name, kdf.get(1))?;
        let mut kdf_params = kdf_params.iter();

        let salt: Vec<u8> = match kdf_params.next() {
            Some(salt) if salt.tag() == OCTET_STRING => salt.value().to_vec(),
            Some(salt) => {
                log::error!(
                    "{name}.salt uses {:?}, only a specified OCTET STRING is supported",
                    salt.identifier()
                );
                return Err(Error::UnsupportedAlgorithm(format!("{name}.salt otherSource")));
            }
            None => return Err(Error::Malformed(format!("{name}.salt"))),
        };

        let iterations: u32 = match kdf_params.next() {
            Some(iterations) => iteration_count(name, iterations)?,
            None => return Err(Error::Malformed(format!("{name}.iterationCount"))),
        };

        let mut key_length: Option<usize> = None;
        let mut prf: HashAlgorithm = HashAlgorithm::Sha1;

        for optional in kdf_params {
            match optional.tag() {
                INTEGER if key_length.is_none() => {
                    let len: u64 = optional
                        .to_integer()
                        .ok_or_else(|| Error::Malformed(format!("{name}.keyLength")))?;
                    key_length =
                        Some(usize::try_from(len).map_err(|_| Error::InvalidKeyLength)?);
                }
                SEQUENCE => {
                    let prf_oid: String = optional
                        .to_list()
                        .first()
                        .and_then(DerElement::to_object_id)
                        .ok_or_else(|| Error::Malformed(format!("{name}.prf")))?;
                    prf = match HashAlgorithm::from_hmac_oid(&prf_oid) {
                        Some(prf) => prf,
                        None => {
                            log::error!("{name}.prf {prf_oid} is not supported");
                            return Err(Error::UnsupportedAlgorithm(prf_oid));
                        }
                    };
                }
                _ => {
                    log::error!("{name} has unexpected {:?}", optional.identifier());
                    return Err(Error::Malformed(name.to_string()));
                }
            }
        }

        let (cipher, iv): (Cipher, Vec<u8>) = encryption_scheme_params(encryption_scheme)?;

        let key_len: usize = key_length.unwrap_or(cipher.key_len());
        let key_len_ok: bool = match cipher {
            Cipher::Rc2Cbc { .. } => (1..=128).contains(&key_len),
            _ => key_len == cipher.key_len(),
        };
        if !key_len_ok {
            log::error!("{name}.keyLength {key_len} is invalid for {cipher:?}");
            return Err(Error::InvalidKeyLength);
        }

        let key: Vec<u8> = kdf::pbkdf2(prf, passphrase.as_bytes(), &salt, iterations, key_len)?;

        Ok(Self { cipher, key, iv })
    }
}

/// # References
///
/// - [RFC 8018 Appendix B.2](https://datatracker.ietf.org/doc/html/rfc8018#appendix-B.2)
///
/// ```text
/// RC2-CBC-Parameter ::= SEQUENCE {
///   rc2ParameterVersion INTEGER OPTIONAL,
///   iv OCTET STRING (SIZE(8)) }
/// ```
fn encryption_scheme_params(scheme: &DerElement) -> Result<(Cipher, Vec<u8>), Error> {
    let name: &str = "PBES2-params.encryptionScheme";
    let scheme: Vec<DerElement> = expect_sequence(name, Some(scheme))?;

    let scheme_oid: String = scheme
        .first()
        .and_then(DerElement::to_object_id)
        .ok_or_else(|| Error::Malformed(name.to_string()))?;

    let (cipher, iv): (Cipher, Option<DerElement>) = match scheme_oid.as_str() {
        oid::DES_CBC => (Cipher::DesCbc, scheme.get(1).cloned()),
        oid::DES_EDE3_CBC => (Cipher::DesEde3Cbc, scheme.get(1).cloned()),
        oid::RC2_CBC => {
            let params: Vec<DerElement> = expect_sequence(&format!("{name}.RC2"), scheme.get(1))?;
            match params.as_slice() {
                [iv] => (rc2_version_cipher(None)?, Some(iv.clone())),
                [version, iv] => {
                    let version: u64 = version
                        .to_integer()
                        .ok_or_else(|| Error::Malformed(format!("{name}.rc2ParameterVersion")))?;
                    (rc2_version_cipher(Some(version))?, Some(iv.clone()))
                }
                _ => {
                    log::error!("{name}.RC2 has {} elements", params.len());
                    return Err(Error::Malformed(format!("{name}.RC2")));
                }
            }
        }
        oid::AES128_CBC | oid::AES192_CBC | oid::AES256_CBC | oid::RC5_CBC_PAD => {
            log::error!("{name} {scheme_oid} is recognized but not implemented");
            return Err(Error::UnsupportedAlgorithm(scheme_oid));
        }
        other => {
            log::error!("{name} {other} is not supported");
            return Err(Error::UnsupportedAlgorithm(other.to_string()));
        }
    };

    match iv {
        Some(iv) if iv.tag() == OCTET_STRING && iv.value().len() == cipher.iv_len() => {
            Ok((cipher, iv.value().to_vec()))
        }
        _ => {
            log::error!(
                "{name} requires an IV of {} bytes for {cipher:?}",
                cipher.iv_len()
            );
            Err(Error::Malformed(format!("{name}.iv")))
        }
    }
}

/// RFC 8018 B.2.3 maps the RC2 parameter version to effective key bits.
fn rc2_version_cipher(version: Option<u64>) -> Result<Cipher, Error> {
    let effective_key_bits: u64 = match version {
        None => 32,
        Some(160) => 40,
        Some(120) => 64,
        Some(58) => 128,
        Some(bits) if (256..=1024).contains(&bits) => bits,
        Some(other) => {
            log::error!("RC2 parameter version {other} is not defined");
            return Err(Error::UnsupportedAlgorithm(format!("RC2 version {other}")));
        }
    };

    Ok(Cipher::Rc2Cbc {
        effective_key_bits: usize::try_from(effective_key_bits)
            .map_err(|_| Error::InvalidKeyLength)?,
    })
}

fn expect_sequence(name: &str, element: Option<&DerElement>) -> Result<Vec<DerElement>, Error> {
    match element {
        Some(element) if element.tag() == SEQUENCE => Ok(element.to_list()),
        Some(element) => {
            log::error!("{name} expected a SEQUENCE got {:?}", element.identifier());
            Err(Error::Malformed(name.to_string()))
        }
        None => {
            log::error!("{name} is missing");
            Err(Error::Malformed(name.to_string()))
        }
    }
}

fn iteration_count(name: &str, element: &DerElement) -> Result<u32, Error> {
    match element.to_integer().map(u32::try_from) {
        Some(Ok(iterations)) if iterations > 0 => Ok(iterations),
        _ => {
            log::error!("{name}.iterationCount is not an integer in 1..=u32::MAX");
            Err(Error::Malformed(format!("{name}.iterationCount")))
        }
    }
}
