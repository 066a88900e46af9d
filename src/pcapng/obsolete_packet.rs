use std::convert::TryFrom;
use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use nom::IResult;

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::flags::{FlagError, FlagWord, EPB_FLAGS_SCHEMA};
use crate::serialize::{gen_to_vec, gen_u16, gen_u32, ToVec};
use crate::traits::{HasInterface, HasTimestamp, PcapNGPacketBlock};

use super::*;

/// Options of the Packet Block
pub const OPB_OPTIONS: &[OptionSpec] = &[
    OPT_COMMENT,
    // same layout as epb_flags
    OptionSpec::single(2, "pack_flags", OptionType::U32),
    OptionSpec::multiple(3, "pack_hash", OptionType::TypeBytes),
];

/// The Packet Block is obsolete, and must not be used in new files.
///
/// It can still be decoded. When written, it is reported to the strictness policy, and
/// converted to an [`EnhancedPacketBlock`] under `Strictness::Fix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObsoletePacketBlock {
    pub if_id: u16,
    pub drops_count: u16,
    pub ts_high: u32,
    pub ts_low: u32,
    pub origlen: u32,
    pub data: Vec<u8>,
    pub options: Options,
}

impl ObsoletePacketBlock {
    pub fn new(if_id: u16, data: Vec<u8>) -> ObsoletePacketBlock {
        let origlen = u32::try_from(data.len()).unwrap_or(u32::MAX);
        ObsoletePacketBlock {
            if_id,
            drops_count: 0,
            ts_high: 0,
            ts_low: 0,
            origlen,
            data,
            options: Options::new(OPB_OPTIONS),
        }
    }

    /// Return the `pack_flags` option as a flag word (all zero if absent)
    pub fn flags(&self) -> Result<FlagWord, FlagError> {
        let value = self
            .options
            .get("pack_flags")
            .and_then(OptionValue::as_u64)
            .unwrap_or(0);
        FlagWord::with_value(EPB_FLAGS_SCHEMA, 32, value)
    }

    /// Convert to an Enhanced Packet Block
    ///
    /// `pack_flags` and `pack_hash` become `epb_flags` and `epb_hash`, and the drops count is
    /// stored in `epb_dropcount`. Other options are copied unchanged.
    pub fn to_enhanced(&self) -> EnhancedPacketBlock {
        let mut options = Options::new(EPB_OPTIONS);
        for (name, opt) in self.options.iter_named() {
            let renamed = match name {
                Some("pack_flags") => "epb_flags",
                Some("pack_hash") => "epb_hash",
                Some(name) => name,
                None => {
                    options.append(opt.code, opt.value.clone());
                    continue;
                }
            };
            if options.insert(renamed, opt.value.clone()).is_err() {
                options.append(opt.code, opt.value.clone());
            }
        }
        // an unknown code 4 of the old block would be read as epb_dropcount
        options.remove("epb_dropcount");
        options.append(OptionCode(4), OptionValue::U64(u64::from(self.drops_count)));
        EnhancedPacketBlock {
            if_id: u32::from(self.if_id),
            ts_high: self.ts_high,
            ts_low: self.ts_low,
            origlen: self.origlen,
            data: self.data.clone(),
            options,
        }
    }

    /// Write the block using the byte order of `section`
    ///
    /// Writing this block is always reported to the strictness policy. Under `Strictness::Fix`,
    /// the result of [`ObsoletePacketBlock::to_enhanced`] is written instead.
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        let strictness = section.strictness();
        strictness.problem("Packet Block is obsolete and must not be used")?;
        if strictness.should_fix() {
            return self.to_enhanced().write(section, out);
        }
        if !section.check_has_interface("ObsoletePacketBlock")? {
            return Ok(0);
        }
        write_block_bytes(self, section.byte_order(), out)
    }
}

impl HasInterface for ObsoletePacketBlock {
    fn interface_id(&self) -> u32 {
        u32::from(self.if_id)
    }
}

impl HasTimestamp for ObsoletePacketBlock {
    fn ts_high(&self) -> u32 {
        self.ts_high
    }

    fn ts_low(&self) -> u32 {
        self.ts_low
    }
}

impl PcapNGPacketBlock for ObsoletePacketBlock {
    fn orig_len(&self) -> u32 {
        self.origlen
    }

    fn packet_data(&self) -> &[u8] {
        &self.data
    }
}

impl ToVec for ObsoletePacketBlock {
    fn magic(&self) -> u32 {
        OPB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let caplen = packet_length(&self.data)?;
        let options = self.options.to_vec(byte_order)?;
        gen_to_vec(
            tuple((
                gen_u16(self.if_id, byte_order),
                gen_u16(self.drops_count, byte_order),
                gen_u32(self.ts_high, byte_order),
                gen_u32(self.ts_low, byte_order),
                gen_u32(caplen, byte_order),
                gen_u32(self.origlen, byte_order),
                gen_packet_data(&self.data),
                slice(&options),
            )),
            20 + self.data.len() + 3 + options.len(),
        )
    }
}

impl PcapNGBlockParser for ObsoletePacketBlock {
    const HDR_SZ: usize = 32;
    const MAGIC: u32 = OPB_MAGIC;

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], ObsoletePacketBlock, PcapError> {
        let (i, if_id) = En::parse_u16(i)?;
        let (i, drops_count) = En::parse_u16(i)?;
        let (i, ts_high) = En::parse_u32(i)?;
        let (i, ts_low) = En::parse_u32(i)?;
        let (i, caplen) = En::parse_u32(i)?;
        let (i, origlen) = En::parse_u32(i)?;
        let (i, data) = parse_packet_data(i, caplen as usize)?;
        let (i, options) = parse_options::<En>(i, OPB_OPTIONS, section.strictness())?;
        let block = ObsoletePacketBlock {
            if_id,
            drops_count,
            ts_high,
            ts_low,
            origlen,
            data: data.to_vec(),
            options,
        };
        Ok((i, block))
    }
}
