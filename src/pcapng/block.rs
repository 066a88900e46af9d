use std::io::Write;

use nom::bytes::streaming::take;
use nom::IResult;

use crate::endianness::{ByteOrder, PcapBE, PcapEndianness, PcapLE};
use crate::error::PcapError;
use crate::serialize::ToVec;
use crate::strictness::Strictness;

use super::*;

/// A block from a PcapNG file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    SectionHeader(SectionHeaderBlock),
    InterfaceDescription(InterfaceDescriptionBlock),
    EnhancedPacket(EnhancedPacketBlock),
    SimplePacket(SimplePacketBlock),
    ObsoletePacket(ObsoletePacketBlock),
    NameResolution(NameResolutionBlock),
    InterfaceStatistics(InterfaceStatisticsBlock),
    Unknown(UnknownBlock),
}

impl Block {
    /// Returns true if blocks contains a network packet
    pub fn is_data_block(&self) -> bool {
        matches!(
            self,
            &Block::EnhancedPacket(_) | &Block::SimplePacket(_) | &Block::ObsoletePacket(_)
        )
    }

    /// Return the normalized magic number of the block
    pub fn magic(&self) -> u32 {
        match self {
            Block::SectionHeader(_) => SHB_MAGIC,
            Block::InterfaceDescription(_) => IDB_MAGIC,
            Block::EnhancedPacket(_) => EPB_MAGIC,
            Block::SimplePacket(_) => SPB_MAGIC,
            Block::ObsoletePacket(_) => OPB_MAGIC,
            Block::NameResolution(_) => NRB_MAGIC,
            Block::InterfaceStatistics(_) => ISB_MAGIC,
            Block::Unknown(ub) => ub.block_type,
        }
    }

    /// Write the block, checking it against the section
    ///
    /// Returns the number of bytes written, which is 0 if the block was skipped by the
    /// strictness policy.
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        match self {
            Block::SectionHeader(b) => b.write(out),
            Block::InterfaceDescription(b) => b.write(section, out),
            Block::EnhancedPacket(b) => b.write(section, out),
            Block::SimplePacket(b) => b.write(section, out),
            Block::ObsoletePacket(b) => b.write(section, out),
            Block::NameResolution(b) => b.write(section, out),
            Block::InterfaceStatistics(b) => b.write(section, out),
            Block::Unknown(b) => b.write(section, out),
        }
    }
}

impl ToVec for Block {
    fn magic(&self) -> u32 {
        Block::magic(self)
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        match self {
            Block::SectionHeader(b) => b.body_to_vec(byte_order),
            Block::InterfaceDescription(b) => b.body_to_vec(byte_order),
            Block::EnhancedPacket(b) => b.body_to_vec(byte_order),
            Block::SimplePacket(b) => b.body_to_vec(byte_order),
            Block::ObsoletePacket(b) => b.body_to_vec(byte_order),
            Block::NameResolution(b) => b.body_to_vec(byte_order),
            Block::InterfaceStatistics(b) => b.body_to_vec(byte_order),
            Block::Unknown(b) => b.body_to_vec(byte_order),
        }
    }
}

macro_rules! block_from {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Block {
            fn from(b: $t) -> Self {
                Block::$variant(b)
            }
        }
    };
}

block_from!(SectionHeaderBlock, SectionHeader);
block_from!(InterfaceDescriptionBlock, InterfaceDescription);
block_from!(EnhancedPacketBlock, EnhancedPacket);
block_from!(SimplePacketBlock, SimplePacket);
block_from!(ObsoletePacketBlock, ObsoletePacket);
block_from!(NameResolutionBlock, NameResolution);
block_from!(InterfaceStatisticsBlock, InterfaceStatistics);
block_from!(UnknownBlock, Unknown);

/// A framed block, not yet decoded
///
/// `block_type` is read using the section byte order. `body` does not include the framing, but
/// includes the padding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawBlock<'a> {
    pub block_type: u32,
    pub block_len: u32,
    pub body: &'a [u8],
}

pub(crate) trait PcapNGBlockParser: Sized {
    /// Minimum block size (including framing), in bytes
    const HDR_SZ: usize;
    /// Little-endian magic number for this block type
    const MAGIC: u32;

    // caller function must have tested header type(magic) and length
    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], Self, PcapError>;
}

/// Decode a block body, using the byte order of the section
pub(crate) fn parse_block_body<P: PcapNGBlockParser>(
    body: &[u8],
    section: &Section,
) -> Result<P, PcapError> {
    tracing::trace!("decoding block type {:#x} ({} bytes)", P::MAGIC, body.len());
    // 12 is block_type (4) + block_len1 (4) + block_len2 (4)
    if body.len() + 12 < P::HDR_SZ {
        return Err(PcapError::LengthMismatch {
            what: "block header",
            declared: P::HDR_SZ - 12,
            available: body.len(),
        });
    }
    let (rem, block) = match section.byte_order() {
        ByteOrder::LittleEndian => P::inner_parse::<PcapLE>(body, section)?,
        ByteOrder::BigEndian => P::inner_parse::<PcapBE>(body, section)?,
    };
    if !rem.is_empty() {
        section.strictness().problem(format!(
            "{} bytes ignored after the end of block type {:#x}",
            rem.len(),
            P::MAGIC
        ))?;
    }
    Ok(block)
}

/// Split the next block of a section
///
/// Returns `Incomplete` if the input does not contain the complete block. Lengths are checked:
/// a leading length smaller than the framing, or different leading and trailing lengths, are
/// fatal. A length not aligned on 32 bits is reported to the strictness policy.
pub(crate) fn parse_frame<'a, En: PcapEndianness>(
    i: &'a [u8],
    strictness: Strictness,
) -> IResult<&'a [u8], RawBlock<'a>, PcapError> {
    let (i, block_type) = En::parse_u32_streaming(i)?;
    let (i, block_len1) = En::parse_u32_streaming(i)?;
    if block_len1 < 12 {
        return Err(nom::Err::Failure(PcapError::InvalidBlockLength(block_len1)));
    }
    let (i, body) = take(block_len1 - 12)(i)?;
    let (i, block_len2) = En::parse_u32_streaming(i)?;
    if block_len2 != block_len1 {
        return Err(nom::Err::Failure(PcapError::FrameLengthMismatch {
            leading: block_len1,
            trailing: block_len2,
        }));
    }
    if block_len1 % 4 != 0 {
        strictness
            .problem(format!(
                "block length {} is not a multiple of 4 (type {:#x})",
                block_len1, block_type
            ))
            .map_err(nom::Err::Failure)?;
    }
    let block = RawBlock {
        block_type,
        block_len: block_len1,
        body,
    };
    Ok((i, block))
}

/// Split the next block (little-endian)
pub fn parse_frame_le(i: &[u8], strictness: Strictness) -> IResult<&[u8], RawBlock, PcapError> {
    parse_frame::<PcapLE>(i, strictness)
}

/// Split the next block (big-endian)
pub fn parse_frame_be(i: &[u8], strictness: Strictness) -> IResult<&[u8], RawBlock, PcapError> {
    parse_frame::<PcapBE>(i, strictness)
}

/// Serialize and write a block, returning the number of bytes written
pub(crate) fn write_block_bytes<B: ToVec, W: Write>(
    block: &B,
    byte_order: ByteOrder,
    out: &mut W,
) -> Result<usize, PcapError> {
    let v = block.to_vec(byte_order)?;
    crate::serialize::write_all(out, &v)?;
    Ok(v.len())
}
