use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use nom::IResult;

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::serialize::{gen_to_vec, gen_u32, ToVec};
use crate::traits::{HasInterface, HasTimestamp};

use super::*;

/// Options of the Interface Statistics Block
pub const ISB_OPTIONS: &[OptionSpec] = &[
    OPT_COMMENT,
    OptionSpec::single(2, "isb_starttime", OptionType::U64),
    OptionSpec::single(3, "isb_endtime", OptionType::U64),
    OptionSpec::single(4, "isb_ifrecv", OptionType::U64),
    OptionSpec::single(5, "isb_ifdrop", OptionType::U64),
    OptionSpec::single(6, "isb_filteraccept", OptionType::U64),
    OptionSpec::single(7, "isb_osdrop", OptionType::U64),
    OptionSpec::single(8, "isb_usrdeliv", OptionType::U64),
];

/// The Interface Statistics Block (ISB) contains the capture statistics for a given interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceStatisticsBlock {
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    pub options: Options,
}

impl InterfaceStatisticsBlock {
    pub fn new(if_id: u32) -> InterfaceStatisticsBlock {
        InterfaceStatisticsBlock {
            if_id,
            ts_high: 0,
            ts_low: 0,
            options: Options::new(ISB_OPTIONS),
        }
    }

    /// Number of packets received from the physical interface, if present
    pub fn if_recv(&self) -> Option<u64> {
        self.options.get("isb_ifrecv").and_then(OptionValue::as_u64)
    }

    /// Number of packets dropped by the interface, if present
    pub fn if_drop(&self) -> Option<u64> {
        self.options.get("isb_ifdrop").and_then(OptionValue::as_u64)
    }

    /// Number of packets dropped by the operating system, if present
    pub fn os_drop(&self) -> Option<u64> {
        self.options.get("isb_osdrop").and_then(OptionValue::as_u64)
    }

    /// Write the block using the byte order of `section`
    ///
    /// As for packets, the section must have at least one interface.
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        if !section.check_has_interface("InterfaceStatisticsBlock")? {
            return Ok(0);
        }
        write_block_bytes(self, section.byte_order(), out)
    }
}

impl HasInterface for InterfaceStatisticsBlock {
    fn interface_id(&self) -> u32 {
        self.if_id
    }
}

impl HasTimestamp for InterfaceStatisticsBlock {
    fn ts_high(&self) -> u32 {
        self.ts_high
    }

    fn ts_low(&self) -> u32 {
        self.ts_low
    }
}

impl ToVec for InterfaceStatisticsBlock {
    fn magic(&self) -> u32 {
        ISB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let options = self.options.to_vec(byte_order)?;
        gen_to_vec(
            tuple((
                gen_u32(self.if_id, byte_order),
                gen_u32(self.ts_high, byte_order),
                gen_u32(self.ts_low, byte_order),
                slice(&options),
            )),
            12 + options.len(),
        )
    }
}

impl PcapNGBlockParser for InterfaceStatisticsBlock {
    const HDR_SZ: usize = 24;
    const MAGIC: u32 = ISB_MAGIC;

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], InterfaceStatisticsBlock, PcapError> {
        let (i, if_id) = En::parse_u32(i)?;
        let (i, ts_high) = En::parse_u32(i)?;
        let (i, ts_low) = En::parse_u32(i)?;
        let (i, options) = parse_options::<En>(i, ISB_OPTIONS, section.strictness())?;
        let block = InterfaceStatisticsBlock {
            if_id,
            ts_high,
            ts_low,
            options,
        };
        Ok((i, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Linktype;
    use hex_literal::hex;

    // from https://datatracker.ietf.org/doc/html/draft-ietf-opsawg-pcapng section 4.6
    const ISB_BODY_LE: &[u8] = &hex!(
        "
00 00 00 00 97 c3 04 00 aa 47 ca 64 04 00 08 00
64 00 00 00 00 00 00 00 05 00 08 00 02 00 00 00
00 00 00 00 00 00 00 00"
    );

    #[test]
    fn decode_isb() {
        let mut section = Section::new(ByteOrder::LittleEndian);
        let mut idb = InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0);
        idb.options.insert("if_tsresol", vec![3]).unwrap();
        section.register_interface(idb);
        let isb: InterfaceStatisticsBlock = parse_block_body(ISB_BODY_LE, &section).expect("isb");
        assert_eq!(isb.if_recv(), Some(100));
        assert_eq!(isb.if_drop(), Some(2));
        assert_eq!(isb.os_drop(), None);
        assert_eq!(isb.timestamp_resolution(&section), Ok(1e-3));
        assert_eq!(isb.body_to_vec(ByteOrder::LittleEndian).unwrap(), ISB_BODY_LE);
    }
}
