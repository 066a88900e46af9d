use std::io::Write;

use crate::endianness::ByteOrder;
use crate::error::PcapError;
use crate::serialize::ToVec;

use super::*;

/// Unknown block (magic not recognized, or not yet implemented)
///
/// The body is kept as-is, including its padding, and written back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownBlock {
    /// Block type, in the section byte order
    pub block_type: u32,
    pub data: Vec<u8>,
}

impl UnknownBlock {
    pub fn new(block_type: u32, data: Vec<u8>) -> UnknownBlock {
        UnknownBlock { block_type, data }
    }

    pub(crate) fn from_raw(raw: &RawBlock) -> UnknownBlock {
        UnknownBlock {
            block_type: raw.block_type,
            data: raw.body.to_vec(),
        }
    }

    /// Write the block using the byte order of `section`
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        write_block_bytes(self, section.byte_order(), out)
    }
}

impl ToVec for UnknownBlock {
    fn magic(&self) -> u32 {
        self.block_type
    }

    fn body_to_vec(&self, _byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        Ok(self.data.clone())
    }
}
