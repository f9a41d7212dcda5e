//! Password based key derivation.
//!
//! # References
//!
//! - [RFC 8018 Section 5](https://datatracker.ietf.org/doc/html/rfc8018#section-5)

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::{Error, oid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// PRF of a PBKDF2 parameter block.
    pub(crate) fn from_hmac_oid(hmac_oid: &str) -> Option<Self> {
        match hmac_oid {
            oid::HMAC_SHA1 => Some(HashAlgorithm::Sha1),
            oid::HMAC_SHA224 => Some(HashAlgorithm::Sha224),
            oid::HMAC_SHA256 => Some(HashAlgorithm::Sha256),
            oid::HMAC_SHA384 => Some(HashAlgorithm::Sha384),
            oid::HMAC_SHA512 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// PBKDF1, defined for MD5 and SHA-1 only.
///
/// # References
///
/// - [RFC 8018 Section 5.1](https://datatracker.ietf.org/doc/html/rfc8018#section-5.1)
pub fn pbkdf1(
    hash: HashAlgorithm,
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    dk_len: usize,
) -> Result<Vec<u8>, Error> {
    if !matches!(hash, HashAlgorithm::Md5 | HashAlgorithm::Sha1) {
        return Err(Error::UnsupportedAlgorithm(format!("PBKDF1 with {hash:?}")));
    }

    if dk_len > hash.output_len() {
        log::error!(
            "PBKDF1 with {hash:?} derives at most {} bytes, {dk_len} requested",
            hash.output_len()
        );
        return Err(Error::InvalidKeyLength);
    }

    if iterations == 0 {
        return Err(Error::InvalidInput("PBKDF1 iteration count is zero".to_string()));
    }

    let mut t: Vec<u8> = hash.digest(&[passphrase, salt].concat());
    for _ in 1..iterations {
        t = hash.digest(&t);
    }

    t.truncate(dk_len);
    Ok(t)
}

/// PBKDF2 with HMAC over `hash`.
///
/// # References
///
/// - [RFC 8018 Section 5.2](https://datatracker.ietf.org/doc/html/rfc8018#section-5.2)
pub fn pbkdf2(
    hash: HashAlgorithm,
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    dk_len: usize,
) -> Result<Vec<u8>, Error> {
    if iterations == 0 {
        return Err(Error::InvalidInput("PBKDF2 iteration count is zero".to_string()));
    }

    let mut key: Vec<u8> = vec![0; dk_len];

    match hash {
        HashAlgorithm::Md5 => {
            return Err(Error::UnsupportedAlgorithm("PBKDF2 with MD5".to_string()));
        }
        HashAlgorithm::Sha1 => {
            ::pbkdf2::pbkdf2_hmac::<Sha1>(passphrase, salt, iterations, &mut key)
        }
        HashAlgorithm::Sha224 => {
            ::pbkdf2::pbkdf2_hmac::<Sha224>(passphrase, salt, iterations, &mut key)
        }
        HashAlgorithm::Sha256 => {
            ::pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key)
        }
        HashAlgorithm::Sha384 => {
            ::pbkdf2::pbkdf2_hmac::<Sha384>(passphrase, salt, iterations, &mut key)
        }
        HashAlgorithm::Sha512 => {
            ::pbkdf2::pbkdf2_hmac::<Sha512>(passphrase, salt, iterations, &mut key)
        }
    }

    Ok(key)
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single round, keyed for the
/// `DEK-Info` header of legacy encrypted PEM.
///
/// The first 8 bytes of `iv` are the salt.
pub fn legacy_key(passphrase: &[u8], iv: &[u8], key_len: usize) -> Vec<u8> {
    let salt: &[u8] = &iv[..iv.len().min(8)];

    let mut key: Vec<u8> = Vec::with_capacity(key_len + 16);
    let mut block: Vec<u8> = Vec::new();

    while key.len() < key_len {
        let mut md5: Md5 = Md5::new();
        md5.update(&block);
        md5.update(passphrase);
        md5.update(salt);
        block = md5.finalize().to_vec();
        key.extend_from_slice(&block);
    }

    key.truncate(key_len);
    key
}
