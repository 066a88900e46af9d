use std::convert::TryFrom;
use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use nom::IResult;

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::flags::{FlagError, FlagWord, EPB_FLAGS_SCHEMA};
use crate::serialize::{gen_to_vec, gen_u32, ToVec};
use crate::traits::{HasInterface, HasTimestamp, PcapNGPacketBlock};

use super::*;

/// Options of the Enhanced Packet Block
pub const EPB_OPTIONS: &[OptionSpec] = &[
    OPT_COMMENT,
    OptionSpec::single(2, "epb_flags", OptionType::U32),
    OptionSpec::multiple(3, "epb_hash", OptionType::TypeBytes),
    OptionSpec::single(4, "epb_dropcount", OptionType::U64),
];

/// An Enhanced Packet Block (EPB) is the standard container for storing
/// the packets coming from the network.
///
/// The captured length is not stored: it is the length of `data`.
///
/// ## Examples
///
/// ```rust
/// use pcapng_codec::*;
/// use pcapng_codec::traits::PcapNGPacketBlock;
///
/// let mut epb = EnhancedPacketBlock::new(0, vec![0xaa; 60]);
/// epb.origlen = 1514;
/// let packet_data = epb.packet_data();
/// if packet_data.len() < epb.orig_len() as usize {
///     // packet was truncated
/// } else {
///     // we have a full packet
/// }
/// assert!(epb.truncated());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnhancedPacketBlock {
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Original packet length
    pub origlen: u32,
    /// Captured packet data, without padding
    pub data: Vec<u8>,
    pub options: Options,
}

impl EnhancedPacketBlock {
    /// Create a packet block for interface `if_id`, with a zero timestamp
    ///
    /// The original length is set to the length of `data`.
    pub fn new(if_id: u32, data: Vec<u8>) -> EnhancedPacketBlock {
        let origlen = u32::try_from(data.len()).unwrap_or(u32::MAX);
        EnhancedPacketBlock {
            if_id,
            ts_high: 0,
            ts_low: 0,
            origlen,
            data,
            options: Options::new(EPB_OPTIONS),
        }
    }

    /// Captured packet length
    #[inline]
    pub fn caplen(&self) -> usize {
        self.data.len()
    }

    /// Set the timestamp, in resolution units of the interface
    pub fn set_ts_units(&mut self, ts: u64) {
        self.ts_high = (ts >> 32) as u32;
        self.ts_low = ts as u32;
    }

    /// Decode the packet timestamp
    ///
    /// To decode the timestamp, the raw values if_tsresol and if_tsoffset are required.
    /// These values are stored as options in the [`InterfaceDescriptionBlock`]
    /// matching the interface ID.
    ///
    /// Return the timestamp seconds and fractional part (in resolution units)
    #[inline]
    pub fn decode_ts(&self, ts_offset: u64, resolution: u64) -> (u32, u32) {
        build_ts(self.ts_high, self.ts_low, ts_offset, resolution)
    }

    /// Decode the packet timestamp as `f64`
    ///
    /// To decode the timestamp, the resolution and offset are required.
    /// These values are stored as options in the [`InterfaceDescriptionBlock`]
    /// matching the interface ID.
    #[inline]
    pub fn decode_ts_f64(&self, ts_offset: u64, resolution: u64) -> f64 {
        build_ts_f64(self.ts_high, self.ts_low, ts_offset, resolution)
    }

    /// Return the `epb_flags` option as a flag word
    ///
    /// If the option is absent, all flags are zero.
    pub fn flags(&self) -> Result<FlagWord, FlagError> {
        let value = self
            .options
            .get("epb_flags")
            .and_then(OptionValue::as_u64)
            .unwrap_or(0);
        FlagWord::with_value(EPB_FLAGS_SCHEMA, 32, value)
    }

    /// Store a flag word in the `epb_flags` option
    pub fn set_flags(&mut self, flags: &FlagWord) -> Result<(), PcapError> {
        let value = u32::try_from(flags.value())
            .map_err(|_| PcapError::invalid_value("epb_flags", "flag word wider than 32 bits"))?;
        self.options.insert("epb_flags", value)
    }

    /// Write the block using the byte order of `section`
    ///
    /// The section must have at least one interface. Under `Strictness::Fix`, the block is
    /// skipped (and 0 is returned) if it has none.
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        if !section.check_has_interface("EnhancedPacketBlock")? {
            return Ok(0);
        }
        write_block_bytes(self, section.byte_order(), out)
    }
}

impl HasInterface for EnhancedPacketBlock {
    fn interface_id(&self) -> u32 {
        self.if_id
    }
}

impl HasTimestamp for EnhancedPacketBlock {
    fn ts_high(&self) -> u32 {
        self.ts_high
    }

    fn ts_low(&self) -> u32 {
        self.ts_low
    }
}

impl PcapNGPacketBlock for EnhancedPacketBlock {
    fn orig_len(&self) -> u32 {
        self.origlen
    }

    fn packet_data(&self) -> &[u8] {
        &self.data
    }
}

impl ToVec for EnhancedPacketBlock {
    fn magic(&self) -> u32 {
        EPB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let caplen = packet_length(&self.data)?;
        let options = self.options.to_vec(byte_order)?;
        gen_to_vec(
            tuple((
                gen_u32(self.if_id, byte_order),
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

impl PcapNGBlockParser for EnhancedPacketBlock {
    const HDR_SZ: usize = 32;
    const MAGIC: u32 = EPB_MAGIC;

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], EnhancedPacketBlock, PcapError> {
        let (i, if_id) = En::parse_u32(i)?;
        let (i, ts_high) = En::parse_u32(i)?;
        let (i, ts_low) = En::parse_u32(i)?;
        let (i, caplen) = En::parse_u32(i)?;
        let (i, origlen) = En::parse_u32(i)?;
        let (i, data) = parse_packet_data(i, caplen as usize)?;
        let (i, options) = parse_options::<En>(i, EPB_OPTIONS, section.strictness())?;
        let block = EnhancedPacketBlock {
            if_id,
            ts_high,
            ts_low,
            origlen,
            data: data.to_vec(),
            options,
        };
        Ok((i, block))
    }
}
