//! DER codec with X.509 certificate parsing, PKCS #8 key decoding and
//! PKCS #12 bundle building on top.
//!
//! # Examples
//!
//! ```
//! use pkix_der::der::DerElement;
//!
//! let encoded: Vec<u8> = DerElement::from_integer(256).to_der();
//! assert_eq!(encoded, [0x02, 0x02, 0x01, 0x00]);
//!
//! let (remain, decoded) = DerElement::read("example", &encoded).unwrap();
//! assert!(remain.is_empty());
//! assert_eq!(decoded.to_integer(), Some(256));
//! ```

pub mod armor;
mod cipher;
pub mod der;
mod error;
mod extension;
pub mod kdf;
mod key;
pub mod oid;
pub(crate) mod parse;
pub mod pkcs12;
pub mod pkcs8;
mod x509;

pub use cipher::Cipher;
pub use error::Error;
pub use extension::{AltNameKind, Extension, ExtensionValue};
pub use kdf::HashAlgorithm;
pub use key::{Key, KeyAlgorithm, KeyType};
pub use pkcs12::Pkcs12Builder;
pub use x509::Certificate;
