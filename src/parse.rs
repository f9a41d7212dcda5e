// byte helpers for the DER reader, each logs the field name on failure

pub fn u8<'a>(name: &str, buf: &'a [u8]) -> Option<(&'a [u8], u8)> {
    match buf.split_first() {
        Some((val, remain)) => Some((remain, *val)),
        None => {
            log::error!("{name} is missing");
            None
        }
    }
}

pub fn n<'a>(name: &str, buf: &'a [u8], n: usize) -> Option<(&'a [u8], &'a [u8])> {
    match buf.split_at_checked(n) {
        Some((val, remain)) => Some((remain, val)),
        None => {
            log::error!(
                "{name} requires {n} bytes, only {} bytes are available",
                buf.len()
            );
            None
        }
    }
}

/// Fixed width ASCII decimal field, used by the ASN.1 time types.
pub fn digits<'a>(name: &str, buf: &'a [u8], width: usize) -> Option<(&'a [u8], u32)> {
    let (remain, field) = n(name, buf, width)?;

    let mut val: u32 = 0;
    for &byte in field {
        if !byte.is_ascii_digit() {
            log::error!("{name} contains a non-digit 0x{byte:02x}");
            return None;
        }
        val = val * 10 + u32::from(byte - b'0');
    }

    Some((remain, val))
}

/// Lowercase hex with `:` between bytes.
pub fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode)
        .collect::<Vec<String>>()
        .join(":")
}

#[cfg(test)]
mod parse_tests {
    #[test]
    fn digits() {
        assert_eq!(super::digits("t", b"0704xx", 4), Some((&b"xx"[..], 704)));
        assert_eq!(super::digits("t", b"07a4", 4), None);
        assert_eq!(super::digits("t", b"07", 4), None);
    }

    #[test]
    fn colon_hex() {
        assert_eq!(super::colon_hex(&[0xc0, 0xff, 0xee, 0x01]), "c0:ff:ee:01");
        assert_eq!(super::colon_hex(&[0x0a]), "0a");
        assert_eq!(super::colon_hex(&[]), "");
    }
}
