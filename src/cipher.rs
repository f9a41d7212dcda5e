use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyIvInit, block_padding::Pkcs7};
use rc2::Rc2;

use crate::Error;

type DesCbcEnc = cbc::Encryptor<des::Des>;
type DesCbcDec = cbc::Decryptor<des::Des>;
type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;
type Rc2CbcEnc = cbc::Encryptor<Rc2>;
type Rc2CbcDec = cbc::Decryptor<Rc2>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// CBC mode block ciphers with PKCS #7 padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cipher {
    DesCbc,
    DesEde3Cbc,
    Rc2Cbc { effective_key_bits: usize },
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl Cipher {
    /// RC2 with a 128 bit effective key, what OpenSSL means by `RC2-CBC`.
    pub const RC2_CBC_128: Self = Self::Rc2Cbc {
        effective_key_bits: 128,
    };

    /// Default key length in bytes.
    #[must_use]
    pub fn key_len(self) -> usize {
        match self {
            Cipher::DesCbc => 8,
            Cipher::DesEde3Cbc => 24,
            Cipher::Rc2Cbc { .. } => 16,
            Cipher::Aes128Cbc => 16,
            Cipher::Aes192Cbc => 24,
            Cipher::Aes256Cbc => 32,
        }
    }

    #[must_use]
    pub fn iv_len(self) -> usize {
        match self {
            Cipher::DesCbc | Cipher::DesEde3Cbc | Cipher::Rc2Cbc { .. } => 8,
            Cipher::Aes128Cbc | Cipher::Aes192Cbc | Cipher::Aes256Cbc => 16,
        }
    }

    /// Name used in a legacy PEM `DEK-Info` header.
    #[must_use]
    pub fn dek_info_name(self) -> &'static str {
        match self {
            Cipher::DesCbc => "DES-CBC",
            Cipher::DesEde3Cbc => "DES-EDE3-CBC",
            Cipher::Rc2Cbc { .. } => "RC2-CBC",
            Cipher::Aes128Cbc => "AES-128-CBC",
            Cipher::Aes192Cbc => "AES-192-CBC",
            Cipher::Aes256Cbc => "AES-256-CBC",
        }
    }

    pub fn from_dek_info_name(name: &str) -> Option<Self> {
        match name {
            "DES-CBC" => Some(Cipher::DesCbc),
            "DES-EDE3-CBC" => Some(Cipher::DesEde3Cbc),
            "RC2-CBC" => Some(Cipher::RC2_CBC_128),
            "AES-128-CBC" => Some(Cipher::Aes128Cbc),
            "AES-192-CBC" => Some(Cipher::Aes192Cbc),
            "AES-256-CBC" => Some(Cipher::Aes256Cbc),
            _ => None,
        }
    }

    pub fn encrypt(self, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Cipher::DesCbc => encrypt_with::<DesCbcEnc>(data, key, iv),
            Cipher::DesEde3Cbc => encrypt_with::<TdesCbcEnc>(data, key, iv),
            Cipher::Rc2Cbc { effective_key_bits } => {
                let rc2: Rc2 = rc2_with_effective_bits(key, effective_key_bits)?;
                let encryptor: Rc2CbcEnc =
                    Rc2CbcEnc::inner_iv_slice_init(rc2, iv).map_err(|_| Error::InvalidKeyLength)?;
                Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(data))
            }
            Cipher::Aes128Cbc => encrypt_with::<Aes128CbcEnc>(data, key, iv),
            Cipher::Aes192Cbc => encrypt_with::<Aes192CbcEnc>(data, key, iv),
            Cipher::Aes256Cbc => encrypt_with::<Aes256CbcEnc>(data, key, iv),
        }
    }

    pub fn decrypt(self, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Cipher::DesCbc => decrypt_with::<DesCbcDec>(data, key, iv),
            Cipher::DesEde3Cbc => decrypt_with::<TdesCbcDec>(data, key, iv),
            Cipher::Rc2Cbc { effective_key_bits } => {
                let rc2: Rc2 = rc2_with_effective_bits(key, effective_key_bits)?;
                let decryptor: Rc2CbcDec =
                    Rc2CbcDec::inner_iv_slice_init(rc2, iv).map_err(|_| Error::InvalidKeyLength)?;
                decryptor
                    .decrypt_padded_vec_mut::<Pkcs7>(data)
                    .map_err(|_| Error::DecryptFailed)
            }
            Cipher::Aes128Cbc => decrypt_with::<Aes128CbcDec>(data, key, iv),
            Cipher::Aes192Cbc => decrypt_with::<Aes192CbcDec>(data, key, iv),
            Cipher::Aes256Cbc => decrypt_with::<Aes256CbcDec>(data, key, iv),
        }
    }
}

fn encrypt_with<E: KeyIvInit + BlockEncryptMut>(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, Error> {
    let encryptor: E = E::new_from_slices(key, iv).map_err(|_| {
        log::error!("Key length {} or IV length {} rejected by cipher", key.len(), iv.len());
        Error::InvalidKeyLength
    })?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn decrypt_with<D: KeyIvInit + BlockDecryptMut>(
    data: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, Error> {
    let decryptor: D = D::new_from_slices(key, iv).map_err(|_| {
        log::error!("Key length {} or IV length {} rejected by cipher", key.len(), iv.len());
        Error::InvalidKeyLength
    })?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| Error::DecryptFailed)
}

fn rc2_with_effective_bits(key: &[u8], effective_key_bits: usize) -> Result<Rc2, Error> {
    // RFC 2268 section 2: 1 to 128 key bytes, 1 to 1024 effective bits
    if key.is_empty() || key.len() > 128 || !(1..=1024).contains(&effective_key_bits) {
        log::error!(
            "RC2 key of {} bytes with {effective_key_bits} effective bits is invalid",
            key.len()
        );
        return Err(Error::InvalidKeyLength);
    }
    Ok(Rc2::new_with_eff_key_len(key, effective_key_bits))
}
