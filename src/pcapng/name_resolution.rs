use std::convert::TryFrom;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use nom::{Err, IResult};
use rusticata_macros::{align32, newtype_enum};

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::serialize::{gen_to_vec, gen_u16, padding_for, ToVec};
use crate::strictness::Strictness;

use super::*;

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct NameRecordType(pub u16);

newtype_enum! {
    impl debug NameRecordType {
        End = 0,
        Ipv4 = 1,
        Ipv6 = 2,
        Eui48 = 3,
        Eui64 = 4,
    }
}

/// Options of the Name Resolution Block
pub const NRB_OPTIONS: &[OptionSpec] = &[
    OPT_COMMENT,
    OptionSpec::single(2, "ns_dnsname", OptionType::String),
    OptionSpec::single(3, "ns_dnsIP4addr", OptionType::Ipv4),
    OptionSpec::single(4, "ns_dnsIP6addr", OptionType::Ipv6),
];

/// An entry of a Name Resolution Block: an address, and the names associated to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameRecord {
    Ipv4 { addr: Ipv4Addr, names: Vec<String> },
    Ipv6 { addr: Ipv6Addr, names: Vec<String> },
    Eui48 { addr: [u8; 6], names: Vec<String> },
    Eui64 { addr: [u8; 8], names: Vec<String> },
    /// Record of unknown type, or that could not be decoded
    Unknown {
        record_type: NameRecordType,
        value: Vec<u8>,
    },
}

impl NameRecord {
    pub fn record_type(&self) -> NameRecordType {
        match self {
            NameRecord::Ipv4 { .. } => NameRecordType::Ipv4,
            NameRecord::Ipv6 { .. } => NameRecordType::Ipv6,
            NameRecord::Eui48 { .. } => NameRecordType::Eui48,
            NameRecord::Eui64 { .. } => NameRecordType::Eui64,
            NameRecord::Unknown { record_type, .. } => *record_type,
        }
    }

    /// Names of the record (empty for unknown records)
    pub fn names(&self) -> &[String] {
        match self {
            NameRecord::Ipv4 { names, .. }
            | NameRecord::Ipv6 { names, .. }
            | NameRecord::Eui48 { names, .. }
            | NameRecord::Eui64 { names, .. } => names,
            NameRecord::Unknown { .. } => &[],
        }
    }

    fn value_to_vec(&self) -> Vec<u8> {
        fn with_names(addr: &[u8], names: &[String]) -> Vec<u8> {
            let len = addr.len() + names.iter().map(|n| n.len() + 1).sum::<usize>();
            let mut v = Vec::with_capacity(len);
            v.extend_from_slice(addr);
            for name in names {
                v.extend_from_slice(name.as_bytes());
                v.push(0);
            }
            v
        }
        match self {
            NameRecord::Ipv4 { addr, names } => with_names(&addr.octets(), names),
            NameRecord::Ipv6 { addr, names } => with_names(&addr.octets(), names),
            NameRecord::Eui48 { addr, names } => with_names(addr, names),
            NameRecord::Eui64 { addr, names } => with_names(addr, names),
            NameRecord::Unknown { value, .. } => value.clone(),
        }
    }

    /// Decode the value of a record
    ///
    /// On error, returns the reason why the value does not match the record type.
    fn decode(record_type: NameRecordType, value: &[u8]) -> Result<NameRecord, String> {
        fn split_addr<const N: usize>(value: &[u8]) -> Result<([u8; N], Vec<String>), String> {
            if value.len() < N {
                return Err(format!("expected at least {} bytes, got {}", N, value.len()));
            }
            let (addr, rest) = value.split_at(N);
            let mut a = [0u8; N];
            a.copy_from_slice(addr);
            Ok((a, decode_names(rest)?))
        }
        let record = match record_type {
            NameRecordType::Ipv4 => {
                let (addr, names) = split_addr::<4>(value)?;
                NameRecord::Ipv4 {
                    addr: Ipv4Addr::from(addr),
                    names,
                }
            }
            NameRecordType::Ipv6 => {
                let (addr, names) = split_addr::<16>(value)?;
                NameRecord::Ipv6 {
                    addr: Ipv6Addr::from(addr),
                    names,
                }
            }
            NameRecordType::Eui48 => {
                let (addr, names) = split_addr::<6>(value)?;
                NameRecord::Eui48 { addr, names }
            }
            NameRecordType::Eui64 => {
                let (addr, names) = split_addr::<8>(value)?;
                NameRecord::Eui64 { addr, names }
            }
            _ => NameRecord::Unknown {
                record_type,
                value: value.to_vec(),
            },
        };
        Ok(record)
    }
}

/// Split a list of zero-terminated names
fn decode_names(mut b: &[u8]) -> Result<Vec<String>, String> {
    let mut names = Vec::new();
    while !b.is_empty() {
        let end = b
            .iter()
            .position(|&c| c == 0)
            .ok_or_else(|| "name is not zero-terminated".to_string())?;
        let name = std::str::from_utf8(&b[..end]).map_err(|e| e.to_string())?;
        names.push(name.to_string());
        b = &b[end + 1..];
    }
    Ok(names)
}

/// The Name Resolution Block (NRB) is used to support the correlation of numeric addresses
/// (present in the captured packets) and their corresponding canonical names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameResolutionBlock {
    /// Records, without the end record
    pub records: Vec<NameRecord>,
    pub options: Options,
}

impl Default for NameResolutionBlock {
    fn default() -> Self {
        NameResolutionBlock::new()
    }
}

impl NameResolutionBlock {
    pub fn new() -> NameResolutionBlock {
        NameResolutionBlock {
            records: Vec::new(),
            options: Options::new(NRB_OPTIONS),
        }
    }

    /// Return the names of the first record matching address `addr`
    pub fn names_for_ipv4(&self, addr: Ipv4Addr) -> Option<&[String]> {
        self.records.iter().find_map(|r| match r {
            NameRecord::Ipv4 { addr: a, names } if *a == addr => Some(names.as_slice()),
            _ => None,
        })
    }

    /// Return the names of the first record matching address `addr`
    pub fn names_for_ipv6(&self, addr: Ipv6Addr) -> Option<&[String]> {
        self.records.iter().find_map(|r| match r {
            NameRecord::Ipv6 { addr: a, names } if *a == addr => Some(names.as_slice()),
            _ => None,
        })
    }

    /// Write the block using the byte order of `section`
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        write_block_bytes(self, section.byte_order(), out)
    }
}

fn gen_name_record<'a, W: Write + 'a>(
    record_type: u16,
    value: &'a [u8],
    byte_order: ByteOrder,
) -> impl SerializeFn<W> + 'a {
    // length was checked before serializing
    tuple((
        gen_u16(record_type, byte_order),
        gen_u16(value.len() as u16, byte_order),
        slice(value),
        padding_for(value.len()),
    ))
}

impl ToVec for NameResolutionBlock {
    fn magic(&self) -> u32 {
        NRB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let mut records = Vec::with_capacity(self.records.len());
        let mut capacity = 4;
        for r in &self.records {
            let value = r.value_to_vec();
            if u16::try_from(value.len()).is_err() {
                return Err(PcapError::invalid_value(
                    "name record",
                    format!("value length {} does not fit in 16 bits", value.len()),
                ));
            }
            capacity += 4 + align32!(value.len());
            records.push((r.record_type().0, value));
        }
        let options = self.options.to_vec(byte_order)?;
        gen_to_vec(
            tuple((
                many_ref(&records, move |(t, v)| gen_name_record(*t, v, byte_order)),
                gen_u16(NameRecordType::End.0, byte_order),
                gen_u16(0, byte_order),
                slice(&options),
            )),
            capacity + options.len(),
        )
    }
}

/// Parse name records, until the end record or the end of data
fn parse_name_records<'a, En: PcapEndianness>(
    i: &'a [u8],
    strictness: Strictness,
) -> IResult<&'a [u8], Vec<NameRecord>, PcapError> {
    let mut records = Vec::new();
    let mut i = i;
    loop {
        if i.is_empty() {
            break;
        }
        if i.len() < 4 {
            return Err(Err::Failure(PcapError::LengthMismatch {
                what: "name record header",
                declared: 4,
                available: i.len(),
            }));
        }
        let (rem, record_type) = En::parse_u16(i)?;
        let (rem, record_len) = En::parse_u16(rem)?;
        if record_type == NameRecordType::End.0 && record_len == 0 {
            i = rem;
            break;
        }
        let record_len = usize::from(record_len);
        let (rem, value) = take_checked(rem, record_len, "name record")?;
        let padding = (align32!(record_len) - record_len).min(rem.len());
        i = &rem[padding..];
        if record_type == NameRecordType::End.0 {
            strictness
                .problem(format!("end record with length {}", record_len))
                .map_err(Err::Failure)?;
            continue;
        }
        let record_type = NameRecordType(record_type);
        let record = match NameRecord::decode(record_type, value) {
            Ok(r) => r,
            Err(reason) => {
                strictness
                    .problem(format!("invalid name record {:?}: {}", record_type, reason))
                    .map_err(Err::Failure)?;
                NameRecord::Unknown {
                    record_type,
                    value: value.to_vec(),
                }
            }
        };
        records.push(record);
    }
    Ok((i, records))
}

impl PcapNGBlockParser for NameResolutionBlock {
    const HDR_SZ: usize = 12;
    const MAGIC: u32 = NRB_MAGIC;

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], NameResolutionBlock, PcapError> {
        let (i, records) = parse_name_records::<En>(i, section.strictness())?;
        let (i, options) = parse_options::<En>(i, NRB_OPTIONS, section.strictness())?;
        let block = NameResolutionBlock { records, options };
        Ok((i, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const NRB_BODY_LE: &[u8] = &hex!(
        "
01 00 0e 00 c0 a8 00 01 72 6f 75 74 65 72 00 67
77 00 00 00 03 00 09 00 00 11 22 33 44 55 61 62
00 00 00 00 09 00 02 00 ab cd 00 00 00 00 00 00
02 00 08 00 6c 6f 63 61 6c 64 6e 73 00 00 00 00"
    );

    #[test]
    fn decode_records() {
        let section = Section::new(ByteOrder::LittleEndian);
        let nrb: NameResolutionBlock = parse_block_body(NRB_BODY_LE, &section).expect("nrb");
        assert_eq!(nrb.records.len(), 3);
        assert_eq!(
            nrb.names_for_ipv4(Ipv4Addr::new(192, 168, 0, 1)),
            Some(&["router".to_string(), "gw".to_string()][..])
        );
        assert_eq!(
            nrb.records[1],
            NameRecord::Eui48 {
                addr: [0, 0x11, 0x22, 0x33, 0x44, 0x55],
                names: vec!["ab".to_string()]
            }
        );
        assert_eq!(
            nrb.records[2],
            NameRecord::Unknown {
                record_type: NameRecordType(9),
                value: vec![0xab, 0xcd]
            }
        );
        assert_eq!(
            nrb.options.get("ns_dnsname"),
            Some(&OptionValue::from("localdns"))
        );
        assert_eq!(nrb.body_to_vec(ByteOrder::LittleEndian).unwrap(), NRB_BODY_LE);
    }

    #[test]
    fn invalid_record() {
        // IPv6 record with only 4 bytes
        let body = hex!("02 00 04 00 01 02 03 04 00 00 00 00");
        let section = Section::new(ByteOrder::LittleEndian);
        let res: Result<NameResolutionBlock, _> = parse_block_body(&body, &section);
        assert!(matches!(res, Err(PcapError::Strictness(_))));
        let section = section.with_strictness(Strictness::Ignore);
        let nrb: NameResolutionBlock = parse_block_body(&body, &section).expect("nrb");
        assert_eq!(nrb.records[0].record_type(), NameRecordType::Ipv6);
        assert!(nrb.records[0].names().is_empty());
    }

    #[test]
    fn end_record_with_value() {
        let body = hex!(
            "
00 00 04 00 de ad be ef 01 00 09 00 0a 00 00 01
68 6f 73 74 00 00 00 00 00 00 00 00"
        );
        let section = Section::new(ByteOrder::LittleEndian);
        let res: Result<NameResolutionBlock, _> = parse_block_body(&body, &section);
        assert!(matches!(res, Err(PcapError::Strictness(_))));
        let section = section.with_strictness(Strictness::Warn);
        let nrb: NameResolutionBlock = parse_block_body(&body, &section).expect("nrb");
        assert_eq!(nrb.records.len(), 1);
        assert_eq!(
            nrb.names_for_ipv4(Ipv4Addr::new(10, 0, 0, 1)),
            Some(&["host".to_string()][..])
        );
    }

    #[test]
    fn encode_ipv6_record_be() {
        let mut nrb = NameResolutionBlock::new();
        nrb.records.push(NameRecord::Ipv6 {
            addr: Ipv6Addr::LOCALHOST,
            names: vec!["localhost".to_string()],
        });
        let v = nrb.body_to_vec(ByteOrder::BigEndian).unwrap();
        assert_eq!(&v[..4], &[0, 2, 0, 26]);
        assert_eq!(v.len(), 4 + 28 + 4 + 4);
        let section = Section::new(ByteOrder::BigEndian);
        let decoded: NameResolutionBlock = parse_block_body(&v, &section).expect("nrb");
        assert_eq!(decoded, nrb);
    }
}
