use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use nom::IResult;

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::serialize::{gen_to_vec, gen_u16, gen_u32, ToVec};
use crate::Linktype;

use super::*;

/// Options of the Interface Description Block
pub const IDB_OPTIONS: &[OptionSpec] = &[
    OPT_COMMENT,
    OptionSpec::single(2, "if_name", OptionType::String),
    OptionSpec::single(3, "if_description", OptionType::String),
    OptionSpec::multiple(4, "if_IPv4addr", OptionType::Ipv4Mask),
    OptionSpec::multiple(5, "if_IPv6addr", OptionType::Ipv6Prefix),
    OptionSpec::single(6, "if_MACaddr", OptionType::MacAddr),
    OptionSpec::single(7, "if_EUIaddr", OptionType::EuiAddr),
    OptionSpec::single(8, "if_speed", OptionType::U64),
    // kept as raw bytes, see `timestamp_resolution`
    OptionSpec::single(9, "if_tsresol", OptionType::Raw),
    OptionSpec::single(10, "if_tzone", OptionType::U32),
    OptionSpec::single(11, "if_filter", OptionType::TypeBytes),
    OptionSpec::single(12, "if_os", OptionType::String),
    OptionSpec::single(13, "if_fcslen", OptionType::U8),
    OptionSpec::single(14, "if_tsoffset", OptionType::I64),
    OptionSpec::single(15, "if_hardware", OptionType::String),
];

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
///
/// The interface identifier is not stored in the block: it is the rank of the block among the
/// interfaces of its section, and is returned by [`Section::register_interface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceDescriptionBlock {
    pub linktype: Linktype,
    pub reserved: [u8; 2],
    /// Maximum number of bytes captured from each packet, 0 for no limit
    pub snaplen: u32,
    pub options: Options,
}

impl InterfaceDescriptionBlock {
    pub fn new(linktype: Linktype, snaplen: u32) -> InterfaceDescriptionBlock {
        InterfaceDescriptionBlock {
            linktype,
            reserved: [0, 0],
            snaplen,
            options: Options::new(IDB_OPTIONS),
        }
    }

    /// Raw `if_tsresol` value (the first byte of the option), if present
    pub fn if_tsresol(&self) -> Option<u8> {
        match self.options.get("if_tsresol")? {
            OptionValue::Raw(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Duration of one timestamp unit, in seconds
    ///
    /// If the most significant bit of `if_tsresol` is 0, the other bits give the resolution as a
    /// negative power of 10, otherwise as a negative power of 2. Without the option, the
    /// resolution is one microsecond.
    pub fn timestamp_resolution(&self) -> f64 {
        ts_resolution_secs(self.if_tsresol().unwrap_or(DEFAULT_TSRESOL))
    }

    /// Decode the interface time resolution, in units per second
    ///
    /// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
    #[inline]
    pub fn ts_resolution(&self) -> Option<u64> {
        build_ts_resolution(self.if_tsresol().unwrap_or(DEFAULT_TSRESOL))
    }

    /// Return the interface timestamp offset, in seconds (0 if not present)
    pub fn ts_offset(&self) -> i64 {
        self.options
            .get("if_tsoffset")
            .and_then(OptionValue::as_i64)
            .unwrap_or(0)
    }

    /// Description of the link type
    pub fn link_type_description(&self) -> String {
        match self.linktype.description() {
            Some(s) => s.to_string(),
            None => format!("Unknown link type: 0x{:04x}", self.linktype.0),
        }
    }

    /// Latest statistics registered in `section` for the interface `if_id`
    ///
    /// The interface identifier must be given, since it is not part of the block.
    pub fn statistics<'s>(
        &self,
        section: &'s Section,
        if_id: u32,
    ) -> Option<&'s InterfaceStatisticsBlock> {
        section.interface_stats(if_id)
    }

    /// Return the `if_name` option value, if present
    pub fn if_name(&self) -> Option<&str> {
        self.options.get("if_name").and_then(OptionValue::as_str)
    }

    /// Return the `if_description` option value, if present
    pub fn if_description(&self) -> Option<&str> {
        self.options.get("if_description").and_then(OptionValue::as_str)
    }

    /// Return the `if_os` option value, if present
    pub fn if_os(&self) -> Option<&str> {
        self.options.get("if_os").and_then(OptionValue::as_str)
    }

    /// Return the `if_IPv4addr` option values
    ///
    /// Each item is a pair `(IPv4Addr, IPv4Mask)`. Values that could not be decoded are skipped.
    pub fn if_ipv4addr(&self) -> Vec<(Ipv4Addr, Ipv4Addr)> {
        self.options
            .get_all("if_IPv4addr")
            .into_iter()
            .filter_map(|v| match v {
                OptionValue::Ipv4Mask(a, m) => Some((*a, *m)),
                _ => None,
            })
            .collect()
    }

    /// Return the `if_IPv6addr` option values
    ///
    /// Each item is a pair `(IPv6Addr, PrefixLen)`. Values that could not be decoded are skipped.
    pub fn if_ipv6addr(&self) -> Vec<(Ipv6Addr, u8)> {
        self.options
            .get_all("if_IPv6addr")
            .into_iter()
            .filter_map(|v| match v {
                OptionValue::Ipv6Prefix(a, p) => Some((*a, *p)),
                _ => None,
            })
            .collect()
    }

    pub fn if_macaddr(&self) -> Option<[u8; 6]> {
        match self.options.get("if_MACaddr")? {
            OptionValue::MacAddr(a) => Some(*a),
            _ => None,
        }
    }

    /// Return the `if_speed` option value (bits per second), if present
    pub fn if_speed(&self) -> Option<u64> {
        self.options.get("if_speed").and_then(OptionValue::as_u64)
    }

    /// Return the `if_filter` option value, as a pair `(filter type, filter)`
    pub fn if_filter(&self) -> Option<(u8, &[u8])> {
        match self.options.get("if_filter")? {
            OptionValue::TypeBytes(t, b) => Some((*t, b)),
            _ => None,
        }
    }

    /// Return the `if_fcslen` option value, if present
    pub fn if_fcslen(&self) -> Option<u8> {
        match self.options.get("if_fcslen")? {
            OptionValue::U8(v) => Some(*v),
            _ => None,
        }
    }

    /// Write the block using the byte order of `section`
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        write_block_bytes(self, section.byte_order(), out)
    }
}

impl ToVec for InterfaceDescriptionBlock {
    fn magic(&self) -> u32 {
        IDB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let options = self.options.to_vec(byte_order)?;
        gen_to_vec(
            tuple((
                gen_u16(self.linktype.0, byte_order),
                slice(self.reserved),
                gen_u32(self.snaplen, byte_order),
                slice(&options),
            )),
            8 + options.len(),
        )
    }
}

impl PcapNGBlockParser for InterfaceDescriptionBlock {
    const HDR_SZ: usize = 20;
    const MAGIC: u32 = IDB_MAGIC;

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], InterfaceDescriptionBlock, PcapError> {
        let (i, linktype) = En::parse_u16(i)?;
        let (i, reserved) = take_checked(i, 2, "reserved")?;
        let (i, snaplen) = En::parse_u32(i)?;
        let (i, options) = parse_options::<En>(i, IDB_OPTIONS, section.strictness())?;
        let block = InterfaceDescriptionBlock {
            linktype: Linktype(linktype),
            reserved: [reserved[0], reserved[1]],
            snaplen,
            options,
        };
        Ok((i, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strictness::Strictness;
    use hex_literal::hex;

    // IDB with if_name "eth0", if_tsresol 9 and if_tsoffset -1
    const IDB_LE: &[u8] = &hex!(
        "
01 00 00 00 34 00 00 00 01 00 00 00 00 00 04 00
02 00 04 00 65 74 68 30 09 00 01 00 09 00 00 00
0e 00 08 00 ff ff ff ff ff ff ff ff 00 00 00 00
34 00 00 00"
    );

    #[test]
    fn decode_idb() {
        let section = Section::new(ByteOrder::LittleEndian);
        let (_, raw) = parse_frame_le(IDB_LE, Strictness::Fail).expect("frame");
        let idb: InterfaceDescriptionBlock =
            parse_block_body(raw.body, &section).expect("idb");
        assert_eq!(idb.linktype, Linktype::ETHERNET);
        assert_eq!(idb.snaplen, 0x40000);
        assert_eq!(idb.if_name(), Some("eth0"));
        assert_eq!(idb.if_tsresol(), Some(9));
        assert_eq!(idb.ts_resolution(), Some(1_000_000_000));
        assert_eq!(idb.ts_offset(), -1);
        assert_eq!(idb.to_vec(ByteOrder::LittleEndian).unwrap(), IDB_LE);
    }

    #[test]
    fn default_resolution() {
        let mut idb = InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0);
        assert_eq!(idb.timestamp_resolution(), 1e-6);
        assert_eq!(idb.ts_resolution(), Some(1_000_000));
        idb.options.insert("if_tsresol", vec![0x89]).unwrap();
        assert_eq!(idb.timestamp_resolution(), 1.0 / 512.0);
    }

    #[test]
    fn link_type_descriptions() {
        let idb = InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0);
        assert_eq!(idb.link_type_description(), "IEEE 802.3 Ethernet");
        let idb = InterfaceDescriptionBlock::new(Linktype(0xabc), 0);
        assert_eq!(idb.link_type_description(), "Unknown link type: 0x0abc");
    }
}
