//! PKCS #12 bundles of certificates and a private key.
//!
//! # References
//!
//! - [RFC 7292](https://datatracker.ietf.org/doc/html/rfc7292)
//!
//! ```text
//! PFX ::= SEQUENCE {
//!     version    INTEGER {v3(3)}(v3,...),
//!     authSafe   ContentInfo,
//!     macData    MacData OPTIONAL
//! }
//!
//! MacData ::= SEQUENCE {
//!     mac        DigestInfo,
//!     macSalt    OCTET STRING,
//!     iterations INTEGER DEFAULT 1
//! }
//!
//! AuthenticatedSafe ::= SEQUENCE OF ContentInfo
//!
//! SafeContents ::= SEQUENCE OF SafeBag
//!
//! SafeBag ::= SEQUENCE {
//!     bagId          BAG-TYPE.&id ({PKCS12BagSet}),
//!     bagValue       [0] EXPLICIT BAG-TYPE.&Type({PKCS12BagSet}{@bagId}),
//!     bagAttributes  SET OF PKCS12Attribute OPTIONAL
//! }
//! ```

use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha1::{Digest, Sha1};

use crate::{
    Certificate, Cipher, Error, Key, KeyType,
    der::{self, DerElement},
    oid,
};

const DEFAULT_ITERATIONS: u32 = 2048;
const SALT_LEN: usize = 8;

/// Diversifier of the key generation in RFC 7292 Appendix B.3.
const ID_KEY: u8 = 1;
const ID_IV: u8 = 2;
const ID_MAC: u8 = 3;

/// SHA-1 output length.
const U: usize = 20;
/// SHA-1 block length.
const V: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkcs12Builder {
    iterations: u32,
    mac_iterations: u32,
}

impl Default for Pkcs12Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pkcs12Builder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            mac_iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Iteration count for encrypting the key bag.
    #[must_use]
    pub fn set_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Iteration count for the integrity MAC key.
    #[must_use]
    pub fn set_mac_iterations(mut self, mac_iterations: u32) -> Self {
        self.mac_iterations = mac_iterations;
        self
    }

    /// DER of a PFX holding `certificates` and `key`.
    ///
    /// The key is 3DES encrypted in a shrouded key bag, and carries the local
    /// key ID of the first certificate. Salts are fresh for every call.
    pub fn build(
        &self,
        certificates: &[Certificate],
        key: Option<&Key>,
        passphrase: &str,
    ) -> Result<Vec<u8>, Error> {
        if self.iterations == 0 || self.mac_iterations == 0 {
            return Err(Error::InvalidInput(
                "PKCS #12 iteration count is zero".to_string(),
            ));
        }

        let mut content_infos: Vec<DerElement> = Vec::with_capacity(certificates.len() + 1);

        for certificate in certificates {
            content_infos.push(data_content_info(&safe_contents(&cert_bag(
                certificate.to_der(),
            )?))?);
        }

        if let Some(key) = key {
            let first: &Certificate = certificates.first().ok_or_else(|| {
                log::error!("A PKCS #12 key bag needs a certificate for its local key ID");
                Error::MissingCertificate
            })?;
            let bag: DerElement =
                shrouded_key_bag(key, first.to_der(), passphrase, self.iterations)?;
            content_infos.push(data_content_info(&safe_contents(&bag))?);
        }

        let auth_safe: Vec<u8> = DerElement::from_vector(&content_infos).to_der();

        let mac_data: DerElement = mac_data(&auth_safe, passphrase, self.mac_iterations)?;

        log::debug!(
            "PKCS #12 with {} certificates and {} key",
            certificates.len(),
            if key.is_some() { "a" } else { "no" }
        );

        Ok(DerElement::from_vector(&[
            DerElement::from_integer(3),
            DerElement::from_vector(&[
                der::object_id(oid::PKCS7_DATA)?,
                DerElement::explicit(0, &DerElement::from_octet_string(auth_safe)),
            ]),
            mac_data,
        ])
        .to_der())
    }
}

/// [`Pkcs12Builder::build`] with the default iteration counts.
pub fn build(
    certificates: &[Certificate],
    key: Option<&Key>,
    passphrase: &str,
) -> Result<Vec<u8>, Error> {
    Pkcs12Builder::new().build(certificates, key, passphrase)
}

/// PKCS #12 key generation with SHA-1.
///
/// `id` is 1 for cipher keys, 2 for IVs and 3 for MAC keys.
///
/// # References
///
/// - [RFC 7292 Appendix B.2](https://datatracker.ietf.org/doc/html/rfc7292#appendix-B.2)
#[allow(clippy::many_single_char_names)]
#[must_use]
pub fn pkcs12_keygen(id: u8, salt: &[u8], passphrase: &str, n: usize, iterations: u32) -> Vec<u8> {
    let d: [u8; V] = [id; V];
    let mut i: Vec<u8> = [tile(salt), tile(&bmp_passphrase(passphrase))].concat();

    let mut a: Vec<u8> = Vec::with_capacity(n + U);

    loop {
        let mut ai: Vec<u8> = Sha1::new().chain_update(d).chain_update(&i).finalize().to_vec();
        for _ in 1..iterations.max(1) {
            ai = Sha1::digest(&ai).to_vec();
        }
        a.extend_from_slice(&ai);

        if a.len() >= n {
            break;
        }

        let b: Vec<u8> = tile(&ai);
        for block in i.chunks_exact_mut(V) {
            add_block(block, &b);
        }
    }

    a.truncate(n);
    a
}

/// UTF-16BE with two terminating zero bytes, a `BMPString` with its NUL.
fn bmp_passphrase(passphrase: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = Vec::with_capacity(passphrase.len() * 2 + 2);
    for unit in passphrase.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Repeat `b` up to the next multiple of 64 bytes, nothing for empty input.
fn tile(b: &[u8]) -> Vec<u8> {
    let len: usize = b.len().div_ceil(V) * V;
    b.iter().copied().cycle().take(len).collect()
}

/// `block = (block + b + 1) mod 2^512`, both big endian.
fn add_block(block: &mut [u8], b: &[u8]) {
    let mut carry: u16 = 1;
    for (x, y) in block.iter_mut().rev().zip(b.iter().rev()) {
        let sum: u16 = u16::from(*x) + u16::from(*y) + carry;
        *x = sum as u8;
        carry = sum >> 8;
    }
}

fn random_salt() -> Vec<u8> {
    let mut salt: Vec<u8> = vec![0; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// `ContentInfo` of type `data` holding `content`.
fn data_content_info(content: &DerElement) -> Result<DerElement, Error> {
    Ok(DerElement::from_vector(&[
        der::object_id(oid::PKCS7_DATA)?,
        DerElement::explicit(0, &DerElement::from_octet_string(content.to_der())),
    ]))
}

fn safe_contents(bag: &DerElement) -> DerElement {
    DerElement::from_vector(std::slice::from_ref(bag))
}

fn local_key_id(certificate_der: &[u8]) -> Result<DerElement, Error> {
    Ok(DerElement::from_set(&[DerElement::from_vector(&[
        der::object_id(oid::PKCS9_LOCAL_KEY_ID)?,
        DerElement::from_set(&[DerElement::from_octet_string(
            Sha1::digest(certificate_der).to_vec(),
        )]),
    ])]))
}

/// ```text
/// CertBag ::= SEQUENCE {
///     certId    BAG-TYPE.&id   ({CertTypes}),
///     certValue [0] EXPLICIT BAG-TYPE.&Type ({CertTypes}{@certId})
/// }
/// ```
fn cert_bag(certificate_der: &[u8]) -> Result<DerElement, Error> {
    let cert: DerElement = DerElement::from_vector(&[
        der::object_id(oid::PKCS9_X509_CERTIFICATE)?,
        DerElement::explicit(0, &DerElement::from_octet_string(certificate_der.to_vec())),
    ]);

    Ok(DerElement::from_vector(&[
        der::object_id(oid::PKCS12_CERT_BAG)?,
        DerElement::explicit(0, &cert),
        local_key_id(certificate_der)?,
    ]))
}

/// `PrivateKeyInfo` of `key`, wrapping traditional RSA and DSA keys.
fn private_key_info(key: &Key) -> Result<Vec<u8>, Error> {
    if key.key_type() != KeyType::Private || key.is_null() {
        return Err(Error::InvalidInput(
            "a PKCS #12 key bag holds a private key".to_string(),
        ));
    }

    if key.is_pkcs8() {
        return Ok(key.to_der().to_vec());
    }

    let algorithm_oid: &str = key.algorithm().pkcs8_oid().ok_or_else(|| {
        log::error!("{:?} keys cannot be wrapped in a PrivateKeyInfo", key.algorithm());
        Error::UnsupportedAlgorithm(format!("{:?} key in a PKCS #12 key bag", key.algorithm()))
    })?;

    Ok(DerElement::from_vector(&[
        DerElement::from_integer(0),
        DerElement::from_vector(&[der::object_id(algorithm_oid)?, DerElement::null()]),
        DerElement::from_octet_string(key.to_der().to_vec()),
    ])
    .to_der())
}

/// ```text
/// PKCS8ShroudedKeyBag ::= EncryptedPrivateKeyInfo
/// ```
///
/// Encrypted with `pbeWithSHAAnd3-KeyTripleDES-CBC`.
fn shrouded_key_bag(
    key: &Key,
    certificate_der: &[u8],
    passphrase: &str,
    iterations: u32,
) -> Result<DerElement, Error> {
    let cipher: Cipher = Cipher::DesEde3Cbc;
    let salt: Vec<u8> = random_salt();

    let encryption_key: Vec<u8> =
        pkcs12_keygen(ID_KEY, &salt, passphrase, cipher.key_len(), iterations);
    let iv: Vec<u8> = pkcs12_keygen(ID_IV, &salt, passphrase, cipher.iv_len(), iterations);

    let encrypted: Vec<u8> = cipher.encrypt(&private_key_info(key)?, &encryption_key, &iv)?;

    let encrypted_private_key_info: DerElement = DerElement::from_vector(&[
        DerElement::from_vector(&[
            der::object_id(oid::PKCS12_PBE_SHA1_3DES)?,
            DerElement::from_vector(&[
                DerElement::from_octet_string(salt),
                DerElement::from_integer(u64::from(iterations)),
            ]),
        ]),
        DerElement::from_octet_string(encrypted),
    ]);

    Ok(DerElement::from_vector(&[
        der::object_id(oid::PKCS12_SHROUDED_KEY_BAG)?,
        DerElement::explicit(0, &encrypted_private_key_info),
        local_key_id(certificate_der)?,
    ]))
}

/// HMAC-SHA1 over the DER of the `AuthenticatedSafe`.
fn mac_data(auth_safe: &[u8], passphrase: &str, iterations: u32) -> Result<DerElement, Error> {
    let salt: Vec<u8> = random_salt();
    let key: Vec<u8> = pkcs12_keygen(ID_MAC, &salt, passphrase, U, iterations);

    let mut hmac = Hmac::<Sha1>::new_from_slice(&key).map_err(|_| Error::InvalidKeyLength)?;
    hmac.update(auth_safe);
    let mac: Vec<u8> = hmac.finalize().into_bytes().to_vec();

    Ok(DerElement::from_vector(&[
        DerElement::from_vector(&[
            DerElement::from_vector(&[der::object_id(oid::SHA1)?, DerElement::null()]),
            DerElement::from_octet_string(mac),
        ]),
        DerElement::from_octet_string(salt),
        DerElement::from_integer(u64::from(iterations)),
    ]))
}
