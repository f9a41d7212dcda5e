//! # References
//!
//! - [A Warm Welcome to ASN.1 and DER](https://letsencrypt.org/docs/a-warm-welcome-to-asn1-and-der/)
//! - [A Layman's Guide to a Subset of ASN.1, BER, and DER](https://luca.ntop.org/Teaching/Appunti/asn1.html)
//! - [X.690](https://www.itu.int/rec/T-REC-X.690)

use std::fmt;

use jiff::{Zoned, civil::DateTime, tz::TimeZone};

use crate::{oid, parse};

pub const BOOLEAN: u8 = 0x01;
pub const INTEGER: u8 = 0x02;
pub const BIT_STRING: u8 = 0x03;
pub const OCTET_STRING: u8 = 0x04;
pub const NULL: u8 = 0x05;
pub const OBJECT_IDENTIFIER: u8 = 0x06;
pub const UTF8_STRING: u8 = 0x0C;
pub const NUMERIC_STRING: u8 = 0x12;
pub const PRINTABLE_STRING: u8 = 0x13;
pub const TELETEX_STRING: u8 = 0x14;
pub const IA5_STRING: u8 = 0x16;
pub const UTC_TIME: u8 = 0x17;
pub const GENERALIZED_TIME: u8 = 0x18;
pub const VISIBLE_STRING: u8 = 0x1A;
pub const BMP_STRING: u8 = 0x1E;
pub const SEQUENCE: u8 = 0x30;
pub const SET: u8 = 0x31;

/// `[1] IMPLICIT IA5String` rfc822Name choice of GeneralName.
pub const RFC822_NAME: u8 = 0x81;
/// `[2] IMPLICIT IA5String` dNSName choice of GeneralName.
pub const DNS_NAME: u8 = 0x82;
/// `[6] IMPLICIT IA5String` uniformResourceIdentifier choice of GeneralName.
pub const URI: u8 = 0x86;
/// `[7] IMPLICIT OCTET STRING` iPAddress choice of GeneralName.
pub const IP_ADDRESS: u8 = 0x87;

/// DER limits the long form to this many length octets.
const MAX_LENGTH_OCTETS: usize = 7;

/// Identifier octet class
///
/// # References
///
/// - X.690 Section 8.1.2.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Universal = 0b00,
    Application = 0b01,
    ContextSpecific = 0b10,
    Private = 0b11,
}

/// Primitive or constructed bit.
///
/// # References
///
/// - X.690 Section 8.1.2.5
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pc {
    /// Atomic type that cannot be broken down into smaller components.
    Primitive = 0b0,
    /// Composite type that consists of other types.
    Constructed = 0b1,
}

impl Pc {
    /// Returns `true` if the pc is [`Constructed`].
    ///
    /// [`Constructed`]: Pc::Constructed
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        matches!(self, Self::Constructed)
    }
}

/// Identifier octet split into its fields.
///
/// # References
///
/// - X.690 Section 8.1.2 Identifier octets
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    pub class: Class,
    pub pc: Pc,
    pub number: u8,
}

impl From<u8> for Identifier {
    fn from(val: u8) -> Self {
        let class: Class = match (val >> 6) & 0b11 {
            0b00 => Class::Universal,
            0b01 => Class::Application,
            0b10 => Class::ContextSpecific,
            _ => Class::Private,
        };

        let pc: Pc = if val & 0x20 == 0x20 {
            Pc::Constructed
        } else {
            Pc::Primitive
        };

        Self {
            class,
            pc,
            number: val & 0x1F,
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?} {} {:?}]", self.class, self.number, self.pc)
    }
}

/// One TLV node of a DER tree.
///
/// # References
///
/// - X.690 Section 8.1.1 Structure of an encoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerElement {
    tag: u8,
    value: Vec<u8>,
}

impl DerElement {
    #[must_use]
    pub fn new(tag: u8, value: Vec<u8>) -> Self {
        Self { tag, value }
    }

    #[must_use]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    #[must_use]
    pub fn identifier(&self) -> Identifier {
        Identifier::from(self.tag)
    }

    /// Tag 0 is reserved and never produced by [`DerElement::read`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.tag != 0
    }

    /// Read one element from the front of `b`, returning the remaining bytes.
    ///
    /// `name` is the path of the field being decoded, it is only used for
    /// diagnostics.
    pub fn read<'a>(name: &str, b: &'a [u8]) -> Option<(&'a [u8], Self)> {
        let (b, tag) = parse::u8(name, b)?;

        if tag == 0 {
            log::error!("{name} uses the reserved tag 0x00");
            return None;
        }

        let identifier: Identifier = Identifier::from(tag);
        let length_debug: String = format!("{name} with {identifier:?}");

        let (b, len_octet) = parse::u8(&length_debug, b)?;

        // Reference section 8.1.3, Length octets
        // - short: bit 8 is zero, 7-1 encode number of bytes in contents
        // - long: bit 8 is one, 7-1 encode number of bytes in length
        let (b, len): (_, usize) = if len_octet & 0x80 == 0x80 {
            let len_len: usize = usize::from(len_octet & 0x7F);

            if len_len == 0 {
                log::error!("{length_debug} uses the indefinite form, forbidden by DER");
                return None;
            }

            if len_len > MAX_LENGTH_OCTETS {
                log::error!(
                    "{length_debug} has {len_len} length octets, maximum is {MAX_LENGTH_OCTETS}"
                );
                return None;
            }

            let (b, len_buf) = parse::n(&length_debug, b, len_len)?;

            let len: u64 = len_buf
                .iter()
                .fold(0, |acc, &byte| (acc << 8) | u64::from(byte));

            match usize::try_from(len) {
                Ok(len) => (b, len),
                Err(_) => {
                    log::error!("{length_debug} length {len} exceeds the address space");
                    return None;
                }
            }
        } else {
            (b, usize::from(len_octet))
        };

        let content_debug: String = format!("{name} with {identifier:?} of length {len}");
        let (remain, content) = parse::n(&content_debug, b, len)?;

        Some((
            remain,
            Self {
                tag,
                value: content.to_vec(),
            },
        ))
    }

    /// Whether the length octets of the element at the front of `b` are
    /// unrepresentable: more than seven of them, or a value above `usize`.
    ///
    /// [`DerElement::read`] rejects these with `None`, callers use this to
    /// tell them apart from other structural errors.
    pub fn length_overflows(b: &[u8]) -> bool {
        let Some(&len_octet) = b.get(1) else {
            return false;
        };
        if len_octet & 0x80 == 0 {
            return false;
        }

        let len_len: usize = usize::from(len_octet & 0x7F);
        if len_len > MAX_LENGTH_OCTETS {
            return true;
        }

        b.get(2..2 + len_len).is_some_and(|len_buf| {
            let len: u64 = len_buf
                .iter()
                .fold(0, |acc, &byte| (acc << 8) | u64::from(byte));
            usize::try_from(len).is_err()
        })
    }

    /// Like [`DerElement::read`], additionally returning the raw bytes of the
    /// element (identifier and length octets included).
    pub fn read_span<'a>(name: &str, b: &'a [u8]) -> Option<(&'a [u8], &'a [u8], Self)> {
        let (remain, element) = Self::read(name, b)?;
        let span: &[u8] = &b[..b.len() - remain.len()];
        Some((remain, span, element))
    }

    pub fn read_expected<'a>(tag: u8, name: &str, b: &'a [u8]) -> Option<(&'a [u8], Self)> {
        let (b, element) = Self::read(name, b)?;

        if element.tag != tag {
            log::error!(
                "{name} expected identifier octet {:?} got {:?} of length {}",
                Identifier::from(tag),
                element.identifier(),
                element.value.len(),
            );
            return None;
        }

        Some((b, element))
    }

    pub fn read_expected2<'a>(
        tag1: u8,
        tag2: u8,
        name: &str,
        b: &'a [u8],
    ) -> Option<(&'a [u8], Self)> {
        let (b, element) = Self::read(name, b)?;

        if element.tag != tag1 && element.tag != tag2 {
            log::error!(
                "{name} expected identifier octet {:?} or {:?} got {:?} of length {}",
                Identifier::from(tag1),
                Identifier::from(tag2),
                element.identifier(),
                element.value.len(),
            );
            return None;
        }

        Some((b, element))
    }

    /// Append the encoding, with the length in its minimal form.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.tag);

        let len: usize = self.value.len();
        if len < 0x80 {
            out.push(len as u8);
        } else {
            let len_bytes = len.to_be_bytes();
            let skip: usize = len_bytes.iter().take_while(|&&byte| byte == 0).count();
            out.push(0x80 | (len_bytes.len() - skip) as u8);
            out.extend_from_slice(&len_bytes[skip..]);
        }

        out.extend_from_slice(&self.value);
    }

    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::with_capacity(self.value.len() + 6);
        self.write(&mut out);
        out
    }

    #[must_use]
    pub fn from_bool(val: bool) -> Self {
        Self::new(BOOLEAN, vec![if val { 0xFF } else { 0x00 }])
    }

    /// Unsigned integer, with a leading zero octet when the high bit would
    /// otherwise read as a sign.
    #[must_use]
    pub fn from_integer(val: u64) -> Self {
        let bytes = val.to_be_bytes();
        let skip: usize = bytes
            .iter()
            .take_while(|&&byte| byte == 0)
            .count()
            .min(bytes.len() - 1);

        let mut content: Vec<u8> = bytes[skip..].to_vec();
        if content.first().is_some_and(|first| first & 0x80 == 0x80) {
            content.insert(0, 0);
        }

        Self::new(INTEGER, content)
    }

    /// `SEQUENCE` of `children`.
    #[must_use]
    pub fn from_vector(children: &[DerElement]) -> Self {
        Self::new(SEQUENCE, Self::concat(children))
    }

    /// `SET` of `children`, in the given order.
    #[must_use]
    pub fn from_set(children: &[DerElement]) -> Self {
        Self::new(SET, Self::concat(children))
    }

    #[must_use]
    pub fn from_octet_string(val: Vec<u8>) -> Self {
        Self::new(OCTET_STRING, val)
    }

    #[must_use]
    pub fn null() -> Self {
        Self::new(NULL, Vec::new())
    }

    /// Context specific constructed `[number]` wrapping `inner`.
    #[must_use]
    pub fn explicit(number: u8, inner: &DerElement) -> Self {
        Self::new(0xA0 | (number & 0x1F), inner.to_der())
    }

    fn concat(children: &[DerElement]) -> Vec<u8> {
        let mut value: Vec<u8> = Vec::new();
        for child in children {
            child.write(&mut value);
        }
        value
    }

    /// Encode a dotted decimal object identifier.
    ///
    /// # References
    ///
    /// - X.690 Section 8.19
    pub fn from_object_id(dotted: &str) -> Option<Self> {
        let arcs: Vec<u64> = match dotted
            .split('.')
            .map(|arc| arc.parse::<u64>().ok())
            .collect::<Option<Vec<u64>>>()
        {
            Some(arcs) => arcs,
            None => {
                log::error!("Object identifier '{dotted}' contains a non-numeric arc");
                return None;
            }
        };

        if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            log::error!("Object identifier '{dotted}' has invalid leading arcs");
            return None;
        }

        let first: u64 = arcs[0].checked_mul(40)?.checked_add(arcs[1])?;

        let mut value: Vec<u8> = Vec::new();
        push_base128(&mut value, first);
        for &arc in &arcs[2..] {
            push_base128(&mut value, arc);
        }

        Some(Self::new(OBJECT_IDENTIFIER, value))
    }

    pub fn to_bool(&self) -> Option<bool> {
        if self.tag != BOOLEAN || self.value.len() != 1 {
            log::error!("{:?} of length {} is not a BOOLEAN", self.identifier(), self.value.len());
            return None;
        }

        match self.value[0] {
            0x00 => Some(false),
            0xFF => Some(true),
            val => {
                log::error!("BOOLEAN value invalid, expected 0x00 or 0xFF, got 0x{val:02x}");
                None
            }
        }
    }

    /// Non-negative integers of up to 8 content octets.
    pub fn to_integer(&self) -> Option<u64> {
        if self.tag != INTEGER {
            log::error!("{:?} is not an INTEGER", self.identifier());
            return None;
        }

        match self.value.first() {
            None => {
                log::error!("INTEGER has no content");
                return None;
            }
            Some(first) if first & 0x80 == 0x80 => {
                log::error!("INTEGER is negative");
                return None;
            }
            Some(_) => (),
        }

        if self.value.len() > 8 {
            log::error!("INTEGER of {} octets does not fit in 64 bits", self.value.len());
            return None;
        }

        Some(
            self.value
                .iter()
                .fold(0, |acc, &byte| (acc << 8) | u64::from(byte)),
        )
    }

    /// # References
    ///
    /// - [RFC 5280 Section 4.1.2.5](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.5)
    ///
    /// ```text
    /// Time ::= CHOICE {
    ///      utcTime        UTCTime,
    ///      generalTime    GeneralizedTime }
    /// ```
    pub fn to_date_time(&self) -> Option<Zoned> {
        let (name, year_width, expected_len): (&str, usize, usize) = match self.tag {
            UTC_TIME => ("UTCTime", 2, 13),
            GENERALIZED_TIME => ("GeneralizedTime", 4, 15),
            _ => {
                log::error!("{:?} is not a time type", self.identifier());
                return None;
            }
        };

        if self.value.len() != expected_len || self.value.last() != Some(&b'Z') {
            log::error!(
                "{name} '{}' is not of the form {}MMddHHmmssZ",
                String::from_utf8_lossy(&self.value),
                if year_width == 2 { "yy" } else { "yyyy" },
            );
            return None;
        }

        let b: &[u8] = &self.value;
        let (b, year) = parse::digits(&format!("{name} year"), b, year_width)?;
        let (b, month) = parse::digits(&format!("{name} month"), b, 2)?;
        let (b, day) = parse::digits(&format!("{name} day"), b, 2)?;
        let (b, hour) = parse::digits(&format!("{name} hour"), b, 2)?;
        let (b, minute) = parse::digits(&format!("{name} minute"), b, 2)?;
        let (_, second) = parse::digits(&format!("{name} second"), b, 2)?;

        // RFC 5280 4.1.2.5.1 two digit years below 50 are 20YY
        let year: u32 = match (year_width, year) {
            (2, yy) if yy < 50 => 2000 + yy,
            (2, yy) => 1900 + yy,
            (_, yyyy) => yyyy,
        };

        let field = |val: u32| i8::try_from(val).ok();

        let datetime: DateTime = match DateTime::new(
            i16::try_from(year).ok()?,
            field(month)?,
            field(day)?,
            field(hour)?,
            field(minute)?,
            field(second)?,
            0,
        ) {
            Ok(datetime) => datetime,
            Err(e) => {
                log::error!(
                    "{name} '{}' is not a valid date: {e}",
                    String::from_utf8_lossy(&self.value)
                );
                return None;
            }
        };

        match datetime.to_zoned(TimeZone::UTC) {
            Ok(zoned) => Some(zoned),
            Err(e) => {
                log::error!("{name} cannot be placed in UTC: {e}");
                None
            }
        }
    }

    /// Dotted decimal form of an `OBJECT IDENTIFIER`.
    pub fn to_object_id(&self) -> Option<String> {
        if self.tag != OBJECT_IDENTIFIER {
            log::error!("{:?} is not an OBJECT IDENTIFIER", self.identifier());
            return None;
        }

        let mut arcs: Vec<u64> = Vec::new();
        let mut acc: u64 = 0;
        let mut continued: bool = false;

        for &byte in &self.value {
            if !continued && byte == 0x80 {
                log::error!("OBJECT IDENTIFIER has a sub-identifier with a leading 0x80");
                return None;
            }
            if acc > (u64::MAX >> 7) {
                log::error!("OBJECT IDENTIFIER sub-identifier exceeds 64 bits");
                return None;
            }

            acc = (acc << 7) | u64::from(byte & 0x7F);
            continued = byte & 0x80 == 0x80;

            if !continued {
                arcs.push(acc);
                acc = 0;
            }
        }

        if continued {
            log::error!("OBJECT IDENTIFIER has an unterminated multi-byte encoding");
            return None;
        }

        let Some((&first, rest)) = arcs.split_first() else {
            log::error!("OBJECT IDENTIFIER must not be empty");
            return None;
        };

        let (arc0, arc1): (u64, u64) = match first {
            0..40 => (0, first),
            40..80 => (1, first - 40),
            _ => (2, first - 80),
        };

        let mut repr: String = format!("{arc0}.{arc1}");
        for arc in rest {
            repr.push_str(&format!(".{arc}"));
        }

        Some(repr)
    }

    /// Display name of an `OBJECT IDENTIFIER`, or its dotted form if unnamed.
    pub fn to_object_name(&self) -> Option<String> {
        let dotted: String = self.to_object_id()?;
        Some(match oid::name(&dotted) {
            Some(name) => name.to_string(),
            None => dotted,
        })
    }

    /// Children of a constructed element.
    ///
    /// Decoding stops at the first malformed child, returning the children
    /// read before it. Primitive elements have no children.
    #[must_use]
    pub fn to_list(&self) -> Vec<DerElement> {
        let mut children: Vec<DerElement> = Vec::new();

        if !self.identifier().pc.is_constructed() {
            return children;
        }

        let mut b: &[u8] = &self.value;
        while !b.is_empty() {
            let name: String = format!("{:?}[{}]", self.identifier(), children.len());
            match Self::read(&name, b) {
                Some((remain, child)) => {
                    children.push(child);
                    b = remain;
                }
                None => {
                    log::debug!("{name} stopping with {} bytes undecoded", b.len());
                    break;
                }
            }
        }

        children
    }

    /// Attributes of an X.501 `Name` in encoding order, keyed by display name.
    ///
    /// # References
    ///
    /// - [RFC 5280 Section 4.1.2.4](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.4)
    ///
    /// ```text
    /// RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
    ///
    /// RelativeDistinguishedName ::=
    ///   SET SIZE (1..MAX) OF AttributeTypeAndValue
    ///
    /// AttributeTypeAndValue ::= SEQUENCE {
    ///   type     AttributeType,
    ///   value    AttributeValue }
    /// ```
    #[must_use]
    pub fn to_info(&self) -> Vec<(String, String)> {
        let mut info: Vec<(String, String)> = Vec::new();

        for rdn in self.to_list() {
            if rdn.tag != SET {
                log::warn!("Name contains {:?} where a SET was expected", rdn.identifier());
                continue;
            }

            for atav in rdn.to_list() {
                let parts: Vec<DerElement> = atav.to_list();
                if atav.tag != SEQUENCE || parts.len() != 2 {
                    log::warn!("Name contains a malformed AttributeTypeAndValue");
                    continue;
                }

                if let Some(key) = parts[0].to_object_name() {
                    info.push((key, parts[1].to_text()));
                }
            }
        }

        info
    }

    /// Text of a string type, empty for other types or when the text contains
    /// a NUL character.
    #[must_use]
    pub fn to_text(&self) -> String {
        let text: String = match self.tag {
            UTF8_STRING => match String::from_utf8(self.value.clone()) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("UTF8String is not valid UTF-8: {e}");
                    return String::new();
                }
            },
            PRINTABLE_STRING | NUMERIC_STRING | VISIBLE_STRING | IA5_STRING | RFC822_NAME
            | DNS_NAME | URI => String::from_utf8_lossy(&self.value).into_owned(),
            // T.61 is treated as Latin-1, which covers what CAs put in it
            TELETEX_STRING => self.value.iter().map(|&byte| char::from(byte)).collect(),
            BMP_STRING => {
                if self.value.len() % 2 != 0 {
                    log::warn!("BMPString has an odd length of {}", self.value.len());
                    return String::new();
                }
                char::decode_utf16(
                    self.value
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
                )
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
            }
            _ => return String::new(),
        };

        if text.contains('\0') {
            log::warn!("{:?} string contains a NUL character", self.identifier());
            String::new()
        } else {
            text
        }
    }
}

/// `OBJECT IDENTIFIER` element for one of the dotted constants in [`oid`].
pub(crate) fn object_id(dotted: &str) -> Result<DerElement, crate::Error> {
    DerElement::from_object_id(dotted).ok_or_else(|| {
        crate::Error::InvalidInput(format!("'{dotted}' is not an object identifier"))
    })
}

fn push_base128(out: &mut Vec<u8>, mut arc: u64) {
    let mut groups: [u8; 10] = [0; 10];
    let mut start: usize = groups.len();

    loop {
        start -= 1;
        groups[start] = (arc & 0x7F) as u8;
        arc >>= 7;
        if arc == 0 {
            break;
        }
    }

    let last: usize = groups.len() - 1;
    for group in &mut groups[start..last] {
        *group |= 0x80;
    }

    out.extend_from_slice(&groups[start..]);
}

#[cfg(test)]
mod der_tests {
    use super::*;
    use jiff::civil::date;

    fn utc(y: i16, mo: i8, d: i8, h: i8, mi: i8, s: i8) -> Zoned {
        date(y, mo, d).at(h, mi, s, 0).to_zoned(TimeZone::UTC).unwrap()
    }

    fn reread(element: &DerElement) -> DerElement {
        let der: Vec<u8> = element.to_der();
        let (remain, decoded) = DerElement::read("test", &der).unwrap();
        assert!(remain.is_empty());
        decoded
    }

    #[test]
    fn integer_encoding() {
        assert_eq!(DerElement::from_integer(0).to_der(), [0x02, 0x01, 0x00]);
        assert_eq!(DerElement::from_integer(127).to_der(), [0x02, 0x01, 0x7F]);
        assert_eq!(DerElement::from_integer(128).to_der(), [0x02, 0x02, 0x00, 0x80]);
        assert_eq!(DerElement::from_integer(256).to_der(), [0x02, 0x02, 0x01, 0x00]);
        assert_eq!(
            DerElement::from_integer(u64::MAX).to_der(),
            [0x02, 0x09, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn integer_decoding() {
        for val in [0, 1, 127, 128, 256, 65535, 1 << 40, i64::MAX as u64] {
            assert_eq!(reread(&DerElement::from_integer(val)).to_integer(), Some(val));
        }

        assert_eq!(DerElement::new(INTEGER, vec![]).to_integer(), None);
        assert_eq!(DerElement::new(INTEGER, vec![0x80]).to_integer(), None);
        assert_eq!(DerElement::new(INTEGER, vec![0x01; 9]).to_integer(), None);
        assert_eq!(DerElement::new(OCTET_STRING, vec![0x01]).to_integer(), None);
        // above i64::MAX needs a guard octet, which makes it 9 octets
        assert_eq!(DerElement::from_integer(u64::MAX).to_integer(), None);
    }

    #[test]
    fn constructors_reread_equal() {
        let elements: Vec<DerElement> = vec![
            DerElement::from_bool(true),
            DerElement::from_bool(false),
            DerElement::from_integer(256),
            DerElement::from_object_id("1.2.840.113549.1.1.1").unwrap(),
            DerElement::from_octet_string(vec![0xAB; 300]),
            DerElement::null(),
            DerElement::from_vector(&[DerElement::from_integer(3), DerElement::null()]),
            DerElement::from_set(&[DerElement::from_bool(true)]),
            DerElement::explicit(0, &DerElement::from_integer(2)),
        ];

        for element in &elements {
            assert_eq!(&reread(element), element);
        }

        assert_eq!(reread(&elements[0]).to_bool(), Some(true));
        assert_eq!(reread(&elements[1]).to_bool(), Some(false));
        assert_eq!(elements[8].to_der(), [0xA0, 0x03, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn long_form_length() {
        let element: DerElement = DerElement::from_octet_string(vec![0x55; 0x1234]);
        let der: Vec<u8> = element.to_der();
        assert_eq!(&der[..4], [0x04, 0x82, 0x12, 0x34]);
        assert_eq!(reread(&element), element);

        let der: Vec<u8> = DerElement::from_octet_string(vec![0; 128]).to_der();
        assert_eq!(&der[..3], [0x04, 0x81, 0x80]);
    }

    #[test]
    fn read_rejects() {
        // reserved tag
        assert!(DerElement::read("test", &[0x00, 0x00]).is_none());
        // indefinite length
        assert!(DerElement::read("test", &[0x30, 0x80, 0x00, 0x00]).is_none());
        // 8 length octets
        assert!(
            DerElement::read("test", &[0x04, 0x88, 0, 0, 0, 0, 0, 0, 0, 1, 0xFF]).is_none()
        );
        // short content
        assert!(DerElement::read("test", &[0x04, 0x05, 0x01, 0x02]).is_none());
        // missing length
        assert!(DerElement::read("test", &[0x04]).is_none());
        assert!(DerElement::read("test", &[]).is_none());
    }

    #[test]
    fn length_overflows() {
        assert!(DerElement::length_overflows(&[0x04, 0x88, 0, 0, 0, 0, 0, 0, 0, 1]));
        assert!(DerElement::length_overflows(&[0x04, 0xFF]));
        assert!(!DerElement::length_overflows(&[0x04, 0x87, 0, 0, 0, 0, 0, 0, 1]));
        assert!(!DerElement::length_overflows(&[0x04, 0x82, 0x12]));
        assert!(!DerElement::length_overflows(&[0x04, 0x05]));
        assert!(!DerElement::length_overflows(&[0x04]));
    }

    #[test]
    fn read_leaves_remainder() {
        let b: [u8; 5] = [0x02, 0x01, 0x05, 0x05, 0x00];
        let (remain, span, element) = DerElement::read_span("test", &b).unwrap();
        assert_eq!(span, &b[..3]);
        assert_eq!(remain, &b[3..]);
        assert_eq!(element.to_integer(), Some(5));
        assert!(DerElement::read_expected(SEQUENCE, "test", &b).is_none());
        assert!(DerElement::read_expected2(SEQUENCE, INTEGER, "test", &b).is_some());
    }

    #[test]
    fn object_identifier() {
        let rsa: DerElement = DerElement::from_object_id("1.2.840.113549.1.1.1").unwrap();
        assert_eq!(
            rsa.to_der(),
            [0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01]
        );

        let ec: DerElement = DerElement::new(
            OBJECT_IDENTIFIER,
            vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01],
        );
        assert_eq!(ec.to_object_id().as_deref(), Some("1.2.840.10045.2.1"));

        let secp384r1: DerElement =
            DerElement::new(OBJECT_IDENTIFIER, vec![0x2B, 0x81, 0x04, 0x00, 0x22]);
        assert_eq!(secp384r1.to_object_id().as_deref(), Some("1.3.132.0.34"));

        for dotted in [
            "0.9.2342.19200300.100.1.5",
            "1.2.3.4",
            "2.5.4.3",
            "2.999.1",
            "1.3.6.1.4.1.311.60.2.1.3",
        ] {
            let element: DerElement = DerElement::from_object_id(dotted).unwrap();
            assert_eq!(reread(&element).to_object_id().as_deref(), Some(dotted));
        }

        let drink: DerElement = DerElement::from_object_id("0.9.2342.19200300.100.1.5").unwrap();
        assert_eq!(drink.to_object_name().as_deref(), Some("favouriteDrink"));

        let unknown: DerElement = DerElement::from_object_id("1.2.3.4").unwrap();
        assert_eq!(unknown.to_object_name().as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn object_identifier_rejects() {
        assert!(DerElement::from_object_id("").is_none());
        assert!(DerElement::from_object_id("1").is_none());
        assert!(DerElement::from_object_id("3.1").is_none());
        assert!(DerElement::from_object_id("1.40").is_none());
        assert!(DerElement::from_object_id("1.2.x").is_none());

        assert!(DerElement::new(OBJECT_IDENTIFIER, vec![]).to_object_id().is_none());
        assert!(DerElement::new(OBJECT_IDENTIFIER, vec![0x2A, 0x86]).to_object_id().is_none());
        assert!(
            DerElement::new(OBJECT_IDENTIFIER, vec![0x2A, 0x80, 0x01])
                .to_object_id()
                .is_none()
        );
        assert!(DerElement::new(INTEGER, vec![0x2A]).to_object_id().is_none());
    }

    #[test]
    fn utc_time() {
        let time = DerElement::new(UTC_TIME, b"070417074026Z".to_vec());
        assert_eq!(time.to_date_time(), Some(utc(2007, 4, 17, 7, 40, 26)));

        let time = DerElement::new(UTC_TIME, b"500101000000Z".to_vec());
        assert_eq!(time.to_date_time(), Some(utc(1950, 1, 1, 0, 0, 0)));

        let time = DerElement::new(UTC_TIME, b"491231235959Z".to_vec());
        assert_eq!(time.to_date_time(), Some(utc(2049, 12, 31, 23, 59, 59)));

        let time = DerElement::new(UTC_TIME, b"991231235959Z".to_vec());
        assert_eq!(time.to_date_time(), Some(utc(1999, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn generalized_time() {
        let time = DerElement::new(GENERALIZED_TIME, b"20500601120000Z".to_vec());
        assert_eq!(time.to_date_time(), Some(utc(2050, 6, 1, 12, 0, 0)));
    }

    #[test]
    fn time_rejects() {
        for (tag, text) in [
            (UTC_TIME, &b"070417074026"[..]),
            (UTC_TIME, &b"070417074026+0100"[..]),
            (UTC_TIME, &b"0704170740Z"[..]),
            (UTC_TIME, &b"0704170740a6Z"[..]),
            (UTC_TIME, &b"071317074026Z"[..]),
            (GENERALIZED_TIME, &b"070417074026Z"[..]),
            (GENERALIZED_TIME, &b"20500601120000.5Z"[..]),
            (OCTET_STRING, &b"070417074026Z"[..]),
        ] {
            assert!(DerElement::new(tag, text.to_vec()).to_date_time().is_none());
        }
    }

    #[test]
    fn list_stops_at_malformed_child() {
        let seq = DerElement::new(SEQUENCE, vec![0x02, 0x01, 0x05, 0x02, 0x05, 0x01]);
        let children: Vec<DerElement> = seq.to_list();
        assert_eq!(children, vec![DerElement::new(INTEGER, vec![0x05])]);

        let primitive = DerElement::new(OCTET_STRING, vec![0x02, 0x01, 0x05]);
        assert!(primitive.to_list().is_empty());
    }

    #[test]
    fn text() {
        let utf8 = DerElement::new(UTF8_STRING, "Ålesund".as_bytes().to_vec());
        assert_eq!(utf8.to_text(), "Ålesund");

        let printable = DerElement::new(PRINTABLE_STRING, b"NO".to_vec());
        assert_eq!(printable.to_text(), "NO");

        let teletex = DerElement::new(TELETEX_STRING, vec![b'M', 0xFC, b'n']);
        assert_eq!(teletex.to_text(), "Mün");

        let bmp = DerElement::new(BMP_STRING, vec![0x00, b'h', 0x00, b'i']);
        assert_eq!(bmp.to_text(), "hi");

        let nul = DerElement::new(IA5_STRING, b"evil.com\0.example.com".to_vec());
        assert_eq!(nul.to_text(), "");

        let dns = DerElement::new(DNS_NAME, b"localhost".to_vec());
        assert_eq!(dns.to_text(), "localhost");

        assert_eq!(DerElement::from_integer(7).to_text(), "");
    }

    #[test]
    fn info() {
        let atav = |oid: &str, tag: u8, val: &str| {
            DerElement::from_set(&[DerElement::from_vector(&[
                DerElement::from_object_id(oid).unwrap(),
                DerElement::new(tag, val.as_bytes().to_vec()),
            ])])
        };

        let name: DerElement = DerElement::from_vector(&[
            atav("2.5.4.6", PRINTABLE_STRING, "NO"),
            atav("2.5.4.11", UTF8_STRING, "Testing"),
            atav("2.5.4.11", UTF8_STRING, "Certificates"),
            atav("0.9.2342.19200300.100.1.5", UTF8_STRING, "tea"),
            atav("1.2.3.4", UTF8_STRING, "x"),
        ]);

        assert_eq!(
            name.to_info(),
            vec![
                ("C".to_string(), "NO".to_string()),
                ("OU".to_string(), "Testing".to_string()),
                ("OU".to_string(), "Certificates".to_string()),
                ("favouriteDrink".to_string(), "tea".to_string()),
                ("1.2.3.4".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn identifier() {
        let id: Identifier = Identifier::from(0xA3);
        assert_eq!(id.class, Class::ContextSpecific);
        assert_eq!(id.pc, Pc::Constructed);
        assert_eq!(id.number, 3);

        let id: Identifier = Identifier::from(SEQUENCE);
        assert_eq!(id.class, Class::Universal);
        assert!(id.pc.is_constructed());
        assert_eq!(id.number, 16);
    }
}
