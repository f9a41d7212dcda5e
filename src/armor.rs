//! PEM armor.
//!
//! # References
//!
//! - [RFC 7468](https://datatracker.ietf.org/doc/html/rfc7468)
//! - [RFC 1421 Section 4.6.1](https://datatracker.ietf.org/doc/html/rfc1421#section-4.6.1)
//!   for the `Proc-Type` and `DEK-Info` headers

use pem::{EncodeConfig, LineEnding, Pem};

use crate::{Cipher, Error};

pub const CERTIFICATE: &str = "CERTIFICATE";
pub const PUBLIC_KEY: &str = "PUBLIC KEY";
pub const PRIVATE_KEY: &str = "PRIVATE KEY";
pub const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";

pub(crate) const PROC_TYPE: &str = "Proc-Type";
pub(crate) const PROC_TYPE_ENCRYPTED: &str = "4,ENCRYPTED";
pub(crate) const DEK_INFO: &str = "DEK-Info";

/// Base64 in 64 column lines between `BEGIN`/`END` markers, every line
/// terminated by `\n`.
#[must_use]
pub fn encode(label: &str, der: &[u8]) -> String {
    pem::encode_config(
        &Pem::new(label, der.to_vec()),
        EncodeConfig::new().set_line_ending(LineEnding::LF),
    )
}

/// Like [`encode`] with RFC 1421 headers, in the given order.
pub fn encode_with_headers(
    label: &str,
    der: &[u8],
    headers: &[(&str, &str)],
) -> Result<String, Error> {
    let mut block: Pem = Pem::new(label, der.to_vec());
    for (key, value) in headers {
        block.headers_mut().add(key, value)?;
    }

    Ok(pem::encode_config(
        &block,
        EncodeConfig::new().set_line_ending(LineEnding::LF),
    ))
}

/// First PEM block of `text`.
pub fn decode(text: &str) -> Result<Pem, Error> {
    Ok(pem::parse(text)?)
}

/// Every PEM block of `text` in order.
pub fn decode_all(text: &str) -> Result<Vec<Pem>, Error> {
    Ok(pem::parse_many(text)?)
}

/// Cipher and IV of a block carrying `Proc-Type: 4,ENCRYPTED`, `None` for a
/// plain block.
pub fn legacy_encryption(block: &Pem) -> Result<Option<(Cipher, Vec<u8>)>, Error> {
    let Some(proc_type) = block.headers().get(PROC_TYPE) else {
        return Ok(None);
    };

    if proc_type.trim() != PROC_TYPE_ENCRYPTED {
        log::warn!("Ignoring {PROC_TYPE} '{proc_type}' on {}", block.tag());
        return Ok(None);
    }

    let Some(dek_info) = block.headers().get(DEK_INFO) else {
        return Err(Error::Malformed(format!(
            "{} has {PROC_TYPE} {PROC_TYPE_ENCRYPTED} without {DEK_INFO}",
            block.tag()
        )));
    };

    let Some((cipher_name, iv_hex)) = dek_info.split_once(',') else {
        return Err(Error::Malformed(format!("{DEK_INFO} '{dek_info}' has no IV")));
    };

    let Some(cipher) = Cipher::from_dek_info_name(cipher_name.trim()) else {
        return Err(Error::UnsupportedAlgorithm(cipher_name.trim().to_string()));
    };

    let iv: Vec<u8> = hex::decode(iv_hex.trim()).map_err(|e| {
        log::error!("{DEK_INFO} IV '{iv_hex}' is not hex: {e}");
        Error::Malformed(format!("{DEK_INFO} IV '{iv_hex}' is not hex"))
    })?;

    if iv.len() != cipher.iv_len() {
        return Err(Error::Malformed(format!(
            "{DEK_INFO} IV is {} bytes, {} requires {}",
            iv.len(),
            cipher.dek_info_name(),
            cipher.iv_len()
        )));
    }

    Ok(Some((cipher, iv)))
}

/// `DEK-Info` header value for `cipher` and `iv`.
pub(crate) fn dek_info(cipher: Cipher, iv: &[u8]) -> String {
    format!("{},{}", cipher.dek_info_name(), hex::encode_upper(iv))
}
