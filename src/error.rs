use crate::{KeyAlgorithm, der::DerElement};

#[derive(Debug)]
pub enum Error {
    /// Input did not have the expected DER structure.
    Malformed(String),
    /// A DER length does not fit in the platform word.
    LengthOverflow,
    /// Algorithm identifier is recognized but not implemented, or unknown.
    UnsupportedAlgorithm(String),
    /// The caller declared one key algorithm, the data contained another.
    AlgorithmMismatch {
        expected: KeyAlgorithm,
        found: KeyAlgorithm,
    },
    InvalidKeyLength,
    /// Bad padding after decryption, usually a wrong passphrase.
    DecryptFailed,
    /// A PKCS #12 bundle was requested with a key but no certificate.
    MissingCertificate,
    InvalidInput(String),
    Pem(pem::PemError),
}

impl Error {
    /// Error for a top level `name` element of `der` that could not be read.
    pub(crate) fn unreadable(name: &str, der: &[u8]) -> Self {
        if DerElement::length_overflows(der) {
            Self::LengthOverflow
        } else {
            Self::Malformed(name.to_string())
        }
    }
}

impl From<pem::PemError> for Error {
    fn from(value: pem::PemError) -> Self {
        Self::Pem(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Malformed(what) => write!(f, "Malformed encoding: {what}"),
            Error::LengthOverflow => write!(f, "Encoded length exceeds the addressable size"),
            Error::UnsupportedAlgorithm(oid) => write!(f, "Unsupported algorithm {oid}"),
            Error::AlgorithmMismatch { expected, found } => {
                write!(f, "Expected a {expected:?} key, found {found:?}")
            }
            Error::InvalidKeyLength => write!(f, "Invalid key or IV length for cipher"),
            Error::DecryptFailed => write!(f, "Decryption failed"),
            Error::MissingCertificate => {
                write!(f, "A private key requires at least one certificate")
            }
            Error::InvalidInput(what) => write!(f, "Invalid input: {what}"),
            Error::Pem(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for Error {}
