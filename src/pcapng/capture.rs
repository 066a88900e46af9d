use nom::{Err, IResult};

use crate::endianness::{ByteOrder, PcapBE, PcapEndianness, PcapLE};
use crate::error::PcapError;
use crate::pcapng::*;
use crate::strictness::Strictness;

/// State of a scan: the current section, if a section header was read
#[derive(Default)]
pub(crate) struct CurrentSectionInfo {
    pub(crate) section: Option<Section>,
    pub(crate) strictness: Strictness,
}

impl CurrentSectionInfo {
    pub(crate) fn new(strictness: Strictness) -> CurrentSectionInfo {
        CurrentSectionInfo {
            section: None,
            strictness,
        }
    }

    /// Read and decode the next block
    ///
    /// Returns `Incomplete` if the input does not contain a complete block. The section state is
    /// only modified once a block was completely decoded.
    pub(crate) fn parse_next<'a>(&mut self, i: &'a [u8]) -> IResult<&'a [u8], Block, PcapError> {
        // section header magic is a palindrome
        let (_, magic) = PcapLE::parse_u32_streaming::<PcapError>(i)?;
        if magic == SHB_MAGIC {
            let (rem, shb) = parse_sectionheaderblock_with(i, self.strictness)?;
            tracing::debug!("starting new section ({:?})", shb.byte_order);
            self.section = Some(Section::from_header(shb.clone(), self.strictness));
            return Ok((rem, Block::SectionHeader(shb)));
        }
        let section = match self.section.as_mut() {
            Some(section) => section,
            None => return Err(Err::Error(PcapError::HeaderNotRecognized)),
        };
        let (rem, raw) = match section.byte_order() {
            ByteOrder::LittleEndian => parse_frame::<PcapLE>(i, self.strictness)?,
            ByteOrder::BigEndian => parse_frame::<PcapBE>(i, self.strictness)?,
        };
        tracing::trace!("block type {:#x}, {} bytes", raw.block_type, raw.block_len);
        let block = section.decode_block(&raw).map_err(Err::Failure)?;
        Ok((rem, block))
    }
}

/// Parsing iterator over pcap-ng data (requires data to be loaded into memory)
///
/// Blocks are decoded one at a time. The iterator stops after the first error.
///
/// ```rust
/// use pcapng_codec::*;
///
/// let mut section = Section::new(ByteOrder::BigEndian);
/// let mut buffer = Vec::new();
/// section.write_header(&mut buffer).unwrap();
/// let idb = section
///     .new_member(InterfaceDescriptionBlock::new(Linktype::RAW, 0))
///     .unwrap();
/// section.write_block(&idb, &mut buffer).unwrap();
///
/// let mut num_blocks = 0;
/// let capture = PcapNGSlice::from_slice(&buffer).expect("parse file");
/// for block in capture {
///     let _block = block.expect("block");
///     num_blocks += 1;
/// }
/// assert_eq!(num_blocks, 2);
/// ```
pub struct PcapNGSlice<'a> {
    info: CurrentSectionInfo,
    // remaining (unparsed) data
    rem: &'a [u8],
    failed: bool,
}

impl<'a> PcapNGSlice<'a> {
    /// Create an iterator over `i`, using the default strictness policy
    pub fn new(i: &'a [u8]) -> PcapNGSlice<'a> {
        PcapNGSlice::with_strictness(i, Strictness::default())
    }

    pub fn with_strictness(i: &'a [u8], strictness: Strictness) -> PcapNGSlice<'a> {
        PcapNGSlice {
            info: CurrentSectionInfo::new(strictness),
            rem: i,
            failed: false,
        }
    }

    /// Create an iterator over `i`, checking first that the data starts with a section header
    pub fn from_slice(i: &'a [u8]) -> Result<PcapNGSlice<'a>, PcapError> {
        // just check that first block is a valid one
        let (_rem, _shb) = parse_sectionheaderblock(i)?;
        Ok(PcapNGSlice::new(i))
    }

    /// The current section (`None` before the first section header)
    pub fn section(&self) -> Option<&Section> {
        self.info.section.as_ref()
    }

    /// Data not yet parsed
    pub fn remaining(&self) -> &'a [u8] {
        self.rem
    }
}

/// Iterator for PcapNGSlice. Returns a result so parsing errors are not
/// silently ignored
impl<'a> Iterator for PcapNGSlice<'a> {
    type Item = Result<Block, PcapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rem.is_empty() {
            return None;
        }
        match self.info.parse_next(self.rem) {
            Ok((rem, block)) => {
                self.rem = rem;
                Some(Ok(block))
            }
            Err(e) => {
                self.failed = true;
                // a truncated block cannot be completed
                Some(Err(PcapError::from(e)))
            }
        }
    }
}

/// Parse the entire file
///
/// Note: this requires the file to be fully loaded to memory.
pub fn parse_pcapng(i: &[u8]) -> Result<Vec<Block>, PcapError> {
    PcapNGSlice::from_slice(i)?.collect()
}
