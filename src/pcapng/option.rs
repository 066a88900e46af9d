use std::convert::TryFrom;
use std::fmt;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

use cookie_factory::bytes::{be_i8, be_u8};
use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::{SerializeFn, WriteContext};
use nom::IResult;
use rusticata_macros::{align32, newtype_enum};

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::serialize::{gen_i16, gen_i32, gen_i64, gen_to_vec, gen_u16, gen_u32, gen_u64, padding_for};
use crate::strictness::Strictness;

#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
}
}

/// Semantic type of an option value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionType {
    /// UTF-8 string, without terminator
    String,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Ipv4,
    /// IPv4 address followed by a netmask
    Ipv4Mask,
    Ipv6,
    /// IPv6 address followed by a prefix length
    Ipv6Prefix,
    /// 6-bytes MAC address
    MacAddr,
    /// 8-bytes EUI address
    EuiAddr,
    /// One type byte, followed by the value
    TypeBytes,
    /// Bytes kept as-is
    Raw,
}

/// Entry of an option table: an option known for a block kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    pub code: OptionCode,
    pub name: &'static str,
    pub ty: OptionType,
    /// True if the option can appear more than once
    pub multiple: bool,
}

impl OptionSpec {
    pub const fn single(code: u16, name: &'static str, ty: OptionType) -> OptionSpec {
        OptionSpec {
            code: OptionCode(code),
            name,
            ty,
            multiple: false,
        }
    }

    pub const fn multiple(code: u16, name: &'static str, ty: OptionType) -> OptionSpec {
        OptionSpec {
            code: OptionCode(code),
            name,
            ty,
            multiple: true,
        }
    }
}

/// The `opt_comment` option, common to all blocks having options
pub const OPT_COMMENT: OptionSpec = OptionSpec::multiple(1, "opt_comment", OptionType::String);

/// Decoded value of an option
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Ipv4(Ipv4Addr),
    /// Address and netmask
    Ipv4Mask(Ipv4Addr, Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Address and prefix length
    Ipv6Prefix(Ipv6Addr, u8),
    MacAddr([u8; 6]),
    EuiAddr([u8; 8]),
    /// Type byte and value
    TypeBytes(u8, Vec<u8>),
    /// Unknown option, or value that could not be decoded
    Raw(Vec<u8>),
}

impl OptionValue {
    /// Returns true if the value can be stored in an option of type `ty`
    ///
    /// Raw values are accepted for all types.
    pub fn matches(&self, ty: OptionType) -> bool {
        matches!(
            (self, ty),
            (OptionValue::Raw(_), _)
                | (OptionValue::Str(_), OptionType::String)
                | (OptionValue::U8(_), OptionType::U8)
                | (OptionValue::U16(_), OptionType::U16)
                | (OptionValue::U32(_), OptionType::U32)
                | (OptionValue::U64(_), OptionType::U64)
                | (OptionValue::I8(_), OptionType::I8)
                | (OptionValue::I16(_), OptionType::I16)
                | (OptionValue::I32(_), OptionType::I32)
                | (OptionValue::I64(_), OptionType::I64)
                | (OptionValue::Ipv4(_), OptionType::Ipv4)
                | (OptionValue::Ipv4Mask(_, _), OptionType::Ipv4Mask)
                | (OptionValue::Ipv6(_), OptionType::Ipv6)
                | (OptionValue::Ipv6Prefix(_, _), OptionType::Ipv6Prefix)
                | (OptionValue::MacAddr(_), OptionType::MacAddr)
                | (OptionValue::EuiAddr(_), OptionType::EuiAddr)
                | (OptionValue::TypeBytes(_, _), OptionType::TypeBytes)
        )
    }

    /// Length of the encoded value, without padding
    pub fn encoded_len(&self) -> usize {
        match self {
            OptionValue::Str(s) => s.len(),
            OptionValue::U8(_) | OptionValue::I8(_) => 1,
            OptionValue::U16(_) | OptionValue::I16(_) => 2,
            OptionValue::U32(_) | OptionValue::I32(_) | OptionValue::Ipv4(_) => 4,
            OptionValue::U64(_) | OptionValue::I64(_) | OptionValue::Ipv4Mask(_, _) => 8,
            OptionValue::Ipv6(_) => 16,
            OptionValue::Ipv6Prefix(_, _) => 17,
            OptionValue::MacAddr(_) => 6,
            OptionValue::EuiAddr(_) => 8,
            OptionValue::TypeBytes(_, v) => 1 + v.len(),
            OptionValue::Raw(v) => v.len(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Return the value as an unsigned integer, if it is one
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            OptionValue::U8(v) => Some(u64::from(v)),
            OptionValue::U16(v) => Some(u64::from(v)),
            OptionValue::U32(v) => Some(u64::from(v)),
            OptionValue::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Return the value as a signed integer, if it is one
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            OptionValue::I8(v) => Some(i64::from(v)),
            OptionValue::I16(v) => Some(i64::from(v)),
            OptionValue::I32(v) => Some(i64::from(v)),
            OptionValue::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Return the raw bytes of an undecoded value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            OptionValue::Raw(v) => Some(v),
            _ => None,
        }
    }

    /// Convert raw option bytes to a value of type `ty`
    ///
    /// On error, returns the reason why the bytes do not match the type.
    pub(crate) fn decode<En: PcapEndianness>(
        ty: OptionType,
        b: &[u8],
    ) -> Result<OptionValue, String> {
        fn sized<const N: usize>(b: &[u8]) -> Result<[u8; N], String> {
            <[u8; N]>::try_from(b)
                .map_err(|_| format!("expected {} bytes, got {}", N, b.len()))
        }
        let v = match ty {
            OptionType::String => {
                let s = std::str::from_utf8(b).map_err(|e| e.to_string())?;
                OptionValue::Str(s.to_string())
            }
            OptionType::U8 => OptionValue::U8(sized::<1>(b)?[0]),
            OptionType::U16 => OptionValue::U16(En::u16_from_bytes(sized(b)?)),
            OptionType::U32 => OptionValue::U32(En::u32_from_bytes(sized(b)?)),
            OptionType::U64 => OptionValue::U64(En::u64_from_bytes(sized(b)?)),
            OptionType::I8 => OptionValue::I8(sized::<1>(b)?[0] as i8),
            OptionType::I16 => OptionValue::I16(En::u16_from_bytes(sized(b)?) as i16),
            OptionType::I32 => OptionValue::I32(En::u32_from_bytes(sized(b)?) as i32),
            OptionType::I64 => OptionValue::I64(En::u64_from_bytes(sized(b)?) as i64),
            OptionType::Ipv4 => OptionValue::Ipv4(Ipv4Addr::from(sized::<4>(b)?)),
            OptionType::Ipv4Mask => {
                let a = sized::<8>(b)?;
                OptionValue::Ipv4Mask(
                    Ipv4Addr::new(a[0], a[1], a[2], a[3]),
                    Ipv4Addr::new(a[4], a[5], a[6], a[7]),
                )
            }
            OptionType::Ipv6 => OptionValue::Ipv6(Ipv6Addr::from(sized::<16>(b)?)),
            OptionType::Ipv6Prefix => {
                let a = sized::<17>(b)?;
                let mut addr = [0u8; 16];
                addr.copy_from_slice(&a[..16]);
                OptionValue::Ipv6Prefix(Ipv6Addr::from(addr), a[16])
            }
            OptionType::MacAddr => OptionValue::MacAddr(sized(b)?),
            OptionType::EuiAddr => OptionValue::EuiAddr(sized(b)?),
            OptionType::TypeBytes => match b.split_first() {
                Some((t, rest)) => OptionValue::TypeBytes(*t, rest.to_vec()),
                None => return Err("missing type byte".to_string()),
            },
            OptionType::Raw => OptionValue::Raw(b.to_vec()),
        };
        Ok(v)
    }
}

fn gen_option_value<'a, W: Write + 'a>(
    v: &'a OptionValue,
    byte_order: ByteOrder,
) -> impl SerializeFn<W> + 'a {
    move |out: WriteContext<W>| match v {
        OptionValue::Str(s) => slice(s.as_bytes())(out),
        OptionValue::U8(x) => be_u8(*x)(out),
        OptionValue::U16(x) => gen_u16(*x, byte_order)(out),
        OptionValue::U32(x) => gen_u32(*x, byte_order)(out),
        OptionValue::U64(x) => gen_u64(*x, byte_order)(out),
        OptionValue::I8(x) => be_i8(*x)(out),
        OptionValue::I16(x) => gen_i16(*x, byte_order)(out),
        OptionValue::I32(x) => gen_i32(*x, byte_order)(out),
        OptionValue::I64(x) => gen_i64(*x, byte_order)(out),
        OptionValue::Ipv4(a) => slice(a.octets())(out),
        OptionValue::Ipv4Mask(a, m) => tuple((slice(a.octets()), slice(m.octets())))(out),
        OptionValue::Ipv6(a) => slice(a.octets())(out),
        OptionValue::Ipv6Prefix(a, p) => tuple((slice(a.octets()), be_u8(*p)))(out),
        OptionValue::MacAddr(a) => slice(a)(out),
        OptionValue::EuiAddr(a) => slice(a)(out),
        OptionValue::TypeBytes(t, b) => tuple((be_u8(*t), slice(b)))(out),
        OptionValue::Raw(b) => slice(b)(out),
    }
}

macro_rules! option_value_from {
    ($t:ty, $variant:ident) => {
        impl From<$t> for OptionValue {
            fn from(v: $t) -> Self {
                OptionValue::$variant(v)
            }
        }
    };
}

option_value_from!(String, Str);
option_value_from!(u8, U8);
option_value_from!(u16, U16);
option_value_from!(u32, U32);
option_value_from!(u64, U64);
option_value_from!(i8, I8);
option_value_from!(i16, I16);
option_value_from!(i32, I32);
option_value_from!(i64, I64);
option_value_from!(Ipv4Addr, Ipv4);
option_value_from!(Ipv6Addr, Ipv6);
option_value_from!(Vec<u8>, Raw);

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionValue::Str(s) => f.write_str(s),
            OptionValue::U8(v) => write!(f, "{}", v),
            OptionValue::U16(v) => write!(f, "{}", v),
            OptionValue::U32(v) => write!(f, "{}", v),
            OptionValue::U64(v) => write!(f, "{}", v),
            OptionValue::I8(v) => write!(f, "{}", v),
            OptionValue::I16(v) => write!(f, "{}", v),
            OptionValue::I32(v) => write!(f, "{}", v),
            OptionValue::I64(v) => write!(f, "{}", v),
            OptionValue::Ipv4(a) => write!(f, "{}", a),
            OptionValue::Ipv4Mask(a, m) => write!(f, "{}/{}", a, m),
            OptionValue::Ipv6(a) => write!(f, "{}", a),
            OptionValue::Ipv6Prefix(a, p) => write!(f, "{}/{}", a, p),
            OptionValue::MacAddr(a) => fmt_hex(f, a, ':'),
            OptionValue::EuiAddr(a) => fmt_hex(f, a, ':'),
            OptionValue::TypeBytes(t, b) => {
                write!(f, "{}:", t)?;
                fmt_hex(f, b, ' ')
            }
            OptionValue::Raw(b) => fmt_hex(f, b, ' '),
        }
    }
}

fn fmt_hex(f: &mut fmt::Formatter, b: &[u8], sep: char) -> fmt::Result {
    for (idx, byte) in b.iter().enumerate() {
        if idx > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}

/// A single option: code and value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcapNGOption {
    pub code: OptionCode,
    pub value: OptionValue,
}

fn gen_option<'a, W: Write + 'a>(
    o: &'a PcapNGOption,
    byte_order: ByteOrder,
) -> impl SerializeFn<W> + 'a {
    // length was checked before serializing
    let len = o.value.encoded_len();
    tuple((
        gen_u16(o.code.0, byte_order),
        gen_u16(len as u16, byte_order),
        gen_option_value(&o.value, byte_order),
        padding_for(len),
    ))
}

/// Ordered list of options attached to a block
///
/// Options are identified by name, using the option table of the block kind. Options with a code
/// not present in the table are kept as raw bytes, and written back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    specs: &'static [OptionSpec],
    entries: Vec<PcapNGOption>,
}

impl Options {
    /// Create an empty list of options, using the given option table
    pub fn new(specs: &'static [OptionSpec]) -> Options {
        Options {
            specs,
            entries: Vec::new(),
        }
    }

    /// The option table
    pub fn specs(&self) -> &'static [OptionSpec] {
        self.specs
    }

    pub fn spec_by_name(&self, name: &str) -> Option<&'static OptionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn spec_by_code(&self, code: OptionCode) -> Option<&'static OptionSpec> {
        self.specs.iter().find(|s| s.code == code)
    }

    fn code_of(&self, name: &str) -> Option<OptionCode> {
        self.spec_by_name(name).map(|s| s.code)
    }

    /// Return the first value of option `name`, if present
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        let code = self.code_of(name)?;
        self.get_code(code)
    }

    /// Return the first value of the option with the given code, if present
    pub fn get_code(&self, code: OptionCode) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|o| o.code == code)
            .map(|o| &o.value)
    }

    /// Return all values of option `name`, in order
    pub fn get_all(&self, name: &str) -> Vec<&OptionValue> {
        match self.code_of(name) {
            Some(code) => self
                .entries
                .iter()
                .filter(|o| o.code == code)
                .map(|o| &o.value)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set option `name`
    ///
    /// The value must match the type declared in the option table (raw values are always
    /// accepted). If the option can appear only once, the previous value is replaced, otherwise
    /// the value is appended.
    pub fn insert<V: Into<OptionValue>>(&mut self, name: &str, value: V) -> Result<(), PcapError> {
        let spec = self
            .spec_by_name(name)
            .ok_or_else(|| PcapError::invalid_value(name, "unknown option"))?;
        let value = value.into();
        if !value.matches(spec.ty) {
            return Err(PcapError::invalid_value(
                name,
                format!("{:?} is not a value of type {:?}", value, spec.ty),
            ));
        }
        let code = spec.code;
        if !spec.multiple {
            if let Some(pos) = self.entries.iter().position(|o| o.code == code) {
                self.entries[pos].value = value;
                let mut seen = false;
                self.entries.retain(|o| {
                    if o.code != code {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
                return Ok(());
            }
        }
        self.entries.push(PcapNGOption { code, value });
        Ok(())
    }

    /// Remove all occurrences of option `name`, returning the removed values
    pub fn remove(&mut self, name: &str) -> Vec<OptionValue> {
        let code = match self.code_of(name) {
            Some(code) => code,
            None => return Vec::new(),
        };
        let (removed, kept): (Vec<PcapNGOption>, Vec<PcapNGOption>) =
            self.entries.drain(..).partition(|o| o.code == code);
        self.entries = kept;
        removed.into_iter().map(|o| o.value).collect()
    }

    /// Append an option with a raw value, for ex. a custom option or a code missing from the table
    pub fn push_raw(&mut self, code: u16, value: Vec<u8>) -> Result<(), PcapError> {
        if code == OptionCode::EndOfOpt.0 {
            return Err(PcapError::invalid_value(
                "option code",
                "code 0 is reserved for the end of options",
            ));
        }
        self.entries.push(PcapNGOption {
            code: OptionCode(code),
            value: OptionValue::Raw(value),
        });
        Ok(())
    }

    /// Append an option without checking it against the table
    pub(crate) fn append(&mut self, code: OptionCode, value: OptionValue) {
        self.entries.push(PcapNGOption { code, value });
    }

    /// Iterate over options, in wire order
    pub fn iter(&self) -> std::slice::Iter<'_, PcapNGOption> {
        self.entries.iter()
    }

    /// Iterate over options with their name (`None` for options not in the table)
    pub fn iter_named(&self) -> impl Iterator<Item = (Option<&'static str>, &PcapNGOption)> + '_ {
        self.entries
            .iter()
            .map(move |o| (self.spec_by_code(o.code).map(|s| s.name), o))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_decoded<En: PcapEndianness>(
        &mut self,
        code: OptionCode,
        raw: &[u8],
        strictness: Strictness,
    ) -> Result<(), PcapError> {
        let spec = match self.spec_by_code(code) {
            Some(spec) => spec,
            None => {
                self.entries.push(PcapNGOption {
                    code,
                    value: OptionValue::Raw(raw.to_vec()),
                });
                return Ok(());
            }
        };
        if !spec.multiple && self.entries.iter().any(|o| o.code == code) {
            strictness.problem(format!("option {} is repeated", spec.name))?;
            if strictness.should_fix() {
                strictness.warn(format!("dropping repeated option {}", spec.name));
                return Ok(());
            }
        }
        let value = match OptionValue::decode::<En>(spec.ty, raw) {
            Ok(v) => v,
            Err(reason) => {
                strictness.problem(format!("invalid value for option {}: {}", spec.name, reason))?;
                OptionValue::Raw(raw.to_vec())
            }
        };
        self.entries.push(PcapNGOption { code, value });
        Ok(())
    }

    /// Serialize all options followed by the end-of-options marker
    pub fn to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let mut capacity = 4;
        for o in &self.entries {
            let len = o.value.encoded_len();
            if len > usize::from(u16::MAX) {
                return Err(PcapError::invalid_value(
                    format!("option {:?}", o.code),
                    format!("value length {} does not fit in 16 bits", len),
                ));
            }
            capacity += 4 + align32!(len);
        }
        gen_to_vec(
            tuple((
                many_ref(&self.entries, move |o| gen_option(o, byte_order)),
                gen_u16(OptionCode::EndOfOpt.0, byte_order),
                gen_u16(0, byte_order),
            )),
            capacity,
        )
    }
}

impl<'a> IntoIterator for &'a Options {
    type Item = &'a PcapNGOption;
    type IntoIter = std::slice::Iter<'a, PcapNGOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parse options until the end-of-options marker, or the end of data
///
/// The marker is code 0 with length 0. A code 0 with a value is reported and skipped.
/// Values are converted using the option table. Repeated options and invalid values are reported
/// to the strictness policy.
pub(crate) fn parse_options<'a, En: PcapEndianness>(
    i: &'a [u8],
    specs: &'static [OptionSpec],
    strictness: Strictness,
) -> IResult<&'a [u8], Options, PcapError> {
    let mut options = Options::new(specs);
    let mut i = i;
    loop {
        if i.is_empty() {
            // end-of-options marker is optional
            break;
        }
        if i.len() < 4 {
            return Err(nom::Err::Failure(PcapError::LengthMismatch {
                what: "option header",
                declared: 4,
                available: i.len(),
            }));
        }
        let (rem, code) = En::parse_u16(i)?;
        let (rem, len) = En::parse_u16(rem)?;
        if code == OptionCode::EndOfOpt.0 && len == 0 {
            i = rem;
            break;
        }
        let len = usize::from(len);
        if len > rem.len() {
            return Err(nom::Err::Failure(PcapError::LengthMismatch {
                what: "option value",
                declared: len,
                available: rem.len(),
            }));
        }
        let (raw, rem) = rem.split_at(len);
        let padding = (align32!(len) - len).min(rem.len());
        i = &rem[padding..];
        if code == OptionCode::EndOfOpt.0 {
            // the value is skipped, following options are still read
            strictness
                .problem(format!("end-of-options marker with length {}", len))
                .map_err(nom::Err::Failure)?;
            continue;
        }
        options
            .push_decoded::<En>(OptionCode(code), raw, strictness)
            .map_err(nom::Err::Failure)?;
    }
    Ok((i, options))
}
