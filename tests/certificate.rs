use jiff::{Zoned, civil::date, tz::TimeZone};
use pkix_der::{
    AltNameKind, Certificate, ExtensionValue, HashAlgorithm, Key, KeyAlgorithm, KeyType,
};

const ROOT_DER: &[u8] = include_bytes!("data/root_cert.der");
const ROOT_PEM: &str = include_str!("data/root_cert.pem");
const LEAF_DER: &[u8] = include_bytes!("data/leaf_cert.der");
const LEAF_PEM: &str = include_str!("data/leaf_cert.pem");
const RSA_PUB_DER: &[u8] = include_bytes!("data/rsa_pub.der");

fn init_logger() {
    stderrlog::new()
        .verbosity(4)
        .timestamp(stderrlog::Timestamp::Microsecond)
        .init()
        .ok();
}

fn utc(y: i16, mo: i8, d: i8, h: i8, mi: i8, s: i8) -> Zoned {
    date(y, mo, d).at(h, mi, s, 0).to_zoned(TimeZone::UTC).unwrap()
}

fn map(pairs: &[(&str, &str)]) -> ExtensionValue {
    ExtensionValue::Map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[test]
fn root_fields() {
    init_logger();

    let cert: Certificate = Certificate::parse(ROOT_DER).expect("root certificate");

    assert_eq!(cert.version(), "3");
    assert_eq!(cert.serial_number(), "c0:ff:ee:01");
    assert_eq!(cert.effective_date(), &utc(2007, 4, 17, 7, 40, 26));
    assert_eq!(cert.expiry_date(), &utc(2050, 6, 1, 12, 0, 0));
    assert!(cert.is_self_signed());
    assert_eq!(cert.public_key_algorithm(), KeyAlgorithm::Rsa);
    assert_eq!(cert.to_der(), ROOT_DER);

    let expected_name: Vec<(String, String)> = [
        ("C", "NO"),
        ("ST", "Oslo"),
        ("L", "Oslo"),
        ("O", "Example Widgets"),
        ("OU", "Testing"),
        ("OU", "Certificates"),
        ("CN", "Example Root"),
        ("emailAddress", "admin@example.com"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(cert.subject(), expected_name.as_slice());
    assert_eq!(cert.issuer(), expected_name.as_slice());

    assert_eq!(cert.subject_info("OU"), vec!["Testing", "Certificates"]);
    assert_eq!(cert.issuer_info("2.5.4.3"), vec!["Example Root"]);
    assert!(cert.subject_info("title").is_empty());
    assert_eq!(cert.subject_display_name(), "Example Root");
    assert_eq!(cert.issuer_display_name(), "Example Root");
}

#[test]
fn root_extensions() {
    init_logger();

    let cert: Certificate = Certificate::parse(ROOT_DER).unwrap();
    let names: Vec<&str> = cert.extensions().iter().map(|ext| ext.name()).collect();
    assert_eq!(
        names,
        [
            "subjectKeyIdentifier",
            "authorityKeyIdentifier",
            "basicConstraints",
            "keyUsage",
            "subjectAltName",
            "authorityInfoAccess",
        ]
    );

    let ext = &cert.extensions()[0];
    assert_eq!(ext.oid(), "2.5.29.14");
    assert!(!ext.is_critical());
    assert!(ext.is_supported());
    assert_eq!(
        ext.value(),
        &ExtensionValue::Hex("FC:26:08:93:95:71:5F:ED:90:46:9C:53:2C:A8:09:60:6B:EA:41:7B".into())
    );

    assert_eq!(
        cert.extensions()[1].value(),
        &map(&[
            ("keyid", "fc26089395715fed90469c532ca809606bea417b"),
            ("serial", "c0:ff:ee:01"),
        ])
    );

    let ext = &cert.extensions()[2];
    assert!(ext.is_critical());
    assert_eq!(
        ext.value(),
        &ExtensionValue::BasicConstraints {
            ca: true,
            path_len_constraint: Some(2)
        }
    );

    let ext = &cert.extensions()[3];
    assert!(ext.is_critical());
    assert!(!ext.is_supported());
    assert!(matches!(ext.value(), ExtensionValue::Raw(raw) if raw.first() == Some(&0x03)));

    assert_eq!(
        cert.extensions()[4].value(),
        &map(&[
            ("DNS", "localhost"),
            ("DNS", "www.example.com"),
            ("IP Address", "127.0.0.1"),
            ("IP Address", "::1"),
            ("email", "admin@example.com"),
        ])
    );

    assert_eq!(
        cert.extensions()[5].value(),
        &map(&[
            ("OCSP", "http://ocsp.example.com/"),
            ("caIssuers", "http://ca.example.com/ca.crt"),
        ])
    );

    let alt_names: Vec<(AltNameKind, &str)> = cert
        .subject_alternative_names()
        .iter()
        .map(|(kind, value)| (*kind, value.as_str()))
        .collect();
    assert_eq!(
        alt_names,
        [
            (AltNameKind::Dns, "localhost"),
            (AltNameKind::Dns, "www.example.com"),
            (AltNameKind::IpAddress, "127.0.0.1"),
            (AltNameKind::IpAddress, "::1"),
            (AltNameKind::Email, "admin@example.com"),
        ]
    );
}

#[test]
fn leaf_fields() {
    init_logger();

    let cert: Certificate = Certificate::parse(LEAF_DER).unwrap();

    assert_eq!(cert.serial_number(), "01:02:03:04:05:06:07:08");
    assert_eq!(cert.effective_date(), &utc(1999, 12, 31, 23, 59, 59));
    assert_eq!(cert.expiry_date(), &utc(2030, 1, 1, 0, 0, 0));
    assert!(!cert.is_self_signed());
    assert_eq!(cert.subject_display_name(), "leaf.example.com");
    assert_eq!(cert.issuer_display_name(), "Example Root");
    assert_eq!(cert.public_key_algorithm(), KeyAlgorithm::Ec);

    // basicConstraints is an empty SEQUENCE
    let basic_constraints = cert
        .extensions()
        .iter()
        .find(|ext| ext.name() == "basicConstraints")
        .unwrap();
    assert!(basic_constraints.is_critical());
    assert_eq!(
        basic_constraints.value(),
        &ExtensionValue::BasicConstraints {
            ca: false,
            path_len_constraint: None
        }
    );

    assert!(
        cert.extensions()
            .iter()
            .any(|ext| ext.name() == "extendedKeyUsage" && !ext.is_supported())
    );
    assert_eq!(
        cert.subject_alternative_names(),
        [(AltNameKind::Dns, "leaf.example.com".to_string())]
    );

    let key: Key = cert.public_key().unwrap();
    assert_eq!(key.key_type(), KeyType::Public);
    assert_eq!(key.algorithm(), KeyAlgorithm::Ec);
    assert_eq!(key.bit_length(), 256);
}

#[test]
fn public_key() {
    init_logger();

    let cert: Certificate = Certificate::parse(ROOT_DER).unwrap();
    assert_eq!(cert.public_key_info(), RSA_PUB_DER);

    let key: Key = cert.public_key().unwrap();
    assert_eq!(key.algorithm(), KeyAlgorithm::Rsa);
    assert_eq!(key.bit_length(), 2048);
    assert_eq!(key.to_der(), RSA_PUB_DER);
}

#[test]
fn digest() {
    init_logger();

    let cert: Certificate = Certificate::parse(ROOT_DER).unwrap();
    assert_eq!(
        cert.digest(HashAlgorithm::Sha1),
        hex_literal::hex!("dc368c0097978e6fbff9e776dd86d6d9f81c261c")
    );
    assert_eq!(cert.digest(HashAlgorithm::Sha256).len(), 32);
}

#[test]
fn pem() {
    init_logger();

    let cert: Certificate = Certificate::parse(ROOT_DER).unwrap();
    assert_eq!(cert.to_pem(), ROOT_PEM);

    let certs: Vec<Certificate> =
        Certificate::from_pem_many(&[ROOT_PEM, LEAF_PEM].concat(), None).unwrap();
    assert_eq!(certs.len(), 2);
    assert_eq!(certs[0], cert);
    assert_eq!(certs[1].to_der(), LEAF_DER);

    let certs: Vec<Certificate> =
        Certificate::from_pem_many(&[ROOT_PEM, LEAF_PEM].concat(), Some(1)).unwrap();
    assert_eq!(certs.len(), 1);
}

#[test]
fn many() {
    init_logger();

    let bundle: Vec<u8> = [ROOT_DER, LEAF_DER, ROOT_DER].concat();

    let certs: Vec<Certificate> = Certificate::from_der_many(&bundle, None);
    assert_eq!(certs.len(), 3);
    let total: usize = certs.iter().map(|cert| cert.to_der().len()).sum();
    assert_eq!(total, bundle.len());
    assert_eq!(certs[1].to_der(), LEAF_DER);

    assert_eq!(Certificate::from_der_many(&bundle, Some(2)).len(), 2);
    assert_eq!(Certificate::from_der_many(&bundle, Some(0)).len(), 0);

    // stops quietly at the first certificate that does not parse
    let truncated: &[u8] = &bundle[..ROOT_DER.len() + LEAF_DER.len() / 2];
    assert_eq!(Certificate::from_der_many(truncated, None).len(), 1);
}

#[test]
fn modified_subject_is_not_self_signed() {
    init_logger();

    let needle: &[u8] = b"Example Root";
    let positions: Vec<usize> = ROOT_DER
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(pos, _)| pos)
        .collect();
    // issuer, subject, authorityKeyIdentifier
    assert_eq!(positions.len(), 3);

    let mut der: Vec<u8> = ROOT_DER.to_vec();
    der[positions[1]] = b'X';

    let cert: Certificate = Certificate::parse(&der).unwrap();
    assert!(!cert.is_self_signed());
    assert_eq!(cert.subject_display_name(), "Xxample Root");
    assert_eq!(cert.issuer_display_name(), "Example Root");
}

#[test]
fn garbage() {
    init_logger();

    assert!(Certificate::parse(&[]).is_none());
    assert!(Certificate::parse(&[0x30, 0x80, 0x00, 0x00]).is_none());
    assert!(Certificate::parse(&ROOT_DER[..ROOT_DER.len() - 1]).is_none());
    assert!(Certificate::parse(RSA_PUB_DER).is_none());
}
