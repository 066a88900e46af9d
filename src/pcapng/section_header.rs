use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use nom::{Err, IResult};

use crate::endianness::{ByteOrder, PcapBE, PcapEndianness, PcapLE};
use crate::error::PcapError;
use crate::serialize::{gen_i64, gen_to_vec, gen_u16, gen_u32, ToVec};
use crate::strictness::Strictness;

use super::*;

/// Options of the Section Header Block
pub const SHB_OPTIONS: &[OptionSpec] = &[
    OPT_COMMENT,
    OptionSpec::single(2, "shb_hardware", OptionType::String),
    OptionSpec::single(3, "shb_os", OptionType::String),
    OptionSpec::single(4, "shb_userappl", OptionType::String),
];

/// The Section Header Block (SHB) identifies the
/// beginning of a section of the capture capture file.
///
/// The
/// Section Header Block does not contain data but it rather identifies a
/// list of blocks (interfaces, packets) that are logically correlated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeaderBlock {
    /// Byte order of the section, given by the byte-order magic
    pub byte_order: ByteOrder,
    pub major_version: u16,
    pub minor_version: u16,
    /// Length of the section in bytes, or -1 if unknown
    pub section_len: i64,
    pub options: Options,
}

impl Default for SectionHeaderBlock {
    fn default() -> Self {
        SectionHeaderBlock::new(ByteOrder::default())
    }
}

impl SectionHeaderBlock {
    /// Create a header for a version 1.0 section of unknown length
    pub fn new(byte_order: ByteOrder) -> SectionHeaderBlock {
        SectionHeaderBlock {
            byte_order,
            major_version: 1,
            minor_version: 0,
            section_len: -1,
            options: Options::new(SHB_OPTIONS),
        }
    }

    pub fn big_endian(&self) -> bool {
        self.byte_order.is_big_endian()
    }

    /// Format version, as `(major, minor)`
    pub fn version(&self) -> (u16, u16) {
        (self.major_version, self.minor_version)
    }

    /// Return the `shb_hardware` option value, if present
    pub fn hardware(&self) -> Option<&str> {
        self.options.get("shb_hardware").and_then(OptionValue::as_str)
    }

    /// Return the `shb_os` option value, if present
    pub fn os(&self) -> Option<&str> {
        self.options.get("shb_os").and_then(OptionValue::as_str)
    }

    /// Return the `shb_userappl` option value, if present
    pub fn user_application(&self) -> Option<&str> {
        self.options.get("shb_userappl").and_then(OptionValue::as_str)
    }

    /// Write the block, using its own byte order
    pub fn write<W: Write>(&self, out: &mut W) -> Result<usize, PcapError> {
        write_block_bytes(self, self.byte_order, out)
    }

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        strictness: Strictness,
    ) -> IResult<&'a [u8], SectionHeaderBlock, PcapError> {
        // byte-order magic was already checked
        let (i, _bom) = En::parse_u32(i)?;
        let (i, major_version) = En::parse_u16(i)?;
        let (i, minor_version) = En::parse_u16(i)?;
        let (i, section_len) = En::parse_i64(i)?;
        if major_version != 1 {
            strictness
                .problem(format!(
                    "unsupported section version {}.{}",
                    major_version, minor_version
                ))
                .map_err(Err::Failure)?;
        }
        let (i, options) = parse_options::<En>(i, SHB_OPTIONS, strictness)?;
        let block = SectionHeaderBlock {
            byte_order: En::BYTE_ORDER,
            major_version,
            minor_version,
            section_len,
            options,
        };
        Ok((i, block))
    }
}

impl ToVec for SectionHeaderBlock {
    fn magic(&self) -> u32 {
        SHB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let options = self.options.to_vec(byte_order)?;
        gen_to_vec(
            tuple((
                gen_u32(BOM_MAGIC, byte_order),
                gen_u16(self.major_version, byte_order),
                gen_u16(self.minor_version, byte_order),
                gen_i64(self.section_len, byte_order),
                slice(&options),
            )),
            16 + options.len(),
        )
    }
}

/// Minimum size of a Section Header Block, including framing
const SHB_HDR_SZ: usize = 28;

/// Detect the byte order of a section, reading the first bytes of a Section Header Block
///
/// Returns `Incomplete` if less than 12 bytes are available, and `HeaderNotRecognized` if the
/// input does not start with a section header, or if the byte-order magic is invalid.
pub fn detect_byte_order(i: &[u8]) -> IResult<&[u8], ByteOrder, PcapError> {
    if i.len() < 12 {
        return Err(Err::Incomplete(nom::Needed::new(12 - i.len())));
    }
    // the block type is a palindrome, it reads the same in both orders
    let (_, magic) = PcapLE::parse_u32::<PcapError>(i)?;
    if magic != SHB_MAGIC {
        return Err(Err::Error(PcapError::HeaderNotRecognized));
    }
    let (_, bom) = PcapLE::parse_u32::<PcapError>(&i[8..])?;
    if bom == BOM_MAGIC {
        Ok((i, ByteOrder::LittleEndian))
    } else if bom == BOM_MAGIC.swap_bytes() {
        Ok((i, ByteOrder::BigEndian))
    } else {
        Err(Err::Failure(PcapError::HeaderNotRecognized))
    }
}

/// Parse a SectionHeaderBlock (little or big endian), using the given strictness policy
pub fn parse_sectionheaderblock_with(
    i: &[u8],
    strictness: Strictness,
) -> IResult<&[u8], SectionHeaderBlock, PcapError> {
    let (_, byte_order) = detect_byte_order(i)?;
    let (rem, raw) = match byte_order {
        ByteOrder::LittleEndian => parse_frame::<PcapLE>(i, strictness)?,
        ByteOrder::BigEndian => parse_frame::<PcapBE>(i, strictness)?,
    };
    if raw.body.len() + 12 < SHB_HDR_SZ {
        return Err(Err::Failure(PcapError::LengthMismatch {
            what: "section header",
            declared: SHB_HDR_SZ - 12,
            available: raw.body.len(),
        }));
    }
    let (body_rem, shb) = match byte_order {
        ByteOrder::LittleEndian => SectionHeaderBlock::inner_parse::<PcapLE>(raw.body, strictness)?,
        ByteOrder::BigEndian => SectionHeaderBlock::inner_parse::<PcapBE>(raw.body, strictness)?,
    };
    if !body_rem.is_empty() {
        strictness
            .problem(format!(
                "{} bytes ignored after the end of section header",
                body_rem.len()
            ))
            .map_err(Err::Failure)?;
    }
    tracing::debug!(
        "section header: version {}.{}, {:?}",
        shb.major_version,
        shb.minor_version,
        shb.byte_order
    );
    Ok((rem, shb))
}

/// Parse a SectionHeaderBlock (little or big endian)
///
/// Format violations are fatal. Use [`parse_sectionheaderblock_with`] to choose another policy.
#[inline]
pub fn parse_sectionheaderblock(i: &[u8]) -> IResult<&[u8], SectionHeaderBlock, PcapError> {
    parse_sectionheaderblock_with(i, Strictness::Fail)
}
