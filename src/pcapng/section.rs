use std::collections::BTreeMap;
use std::io::Write;

use crate::endianness::ByteOrder;
use crate::error::PcapError;
use crate::strictness::Strictness;

use super::*;

/// A Section from a PcapNG file: the Section Header Block, and the state shared by the blocks
/// following it
///
/// The section gives the byte order of its blocks, and the list of interfaces. Blocks do not
/// keep a reference to their section: operations needing it take it as an argument.
///
/// Interfaces are identified by their rank in the section, starting from 0. Each Interface
/// Description Block decoded or created with [`Section::new_member`] is registered, and its id
/// is the number of interfaces registered before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    header: SectionHeaderBlock,
    interfaces: Vec<InterfaceDescriptionBlock>,
    interface_stats: BTreeMap<u32, InterfaceStatisticsBlock>,
    strictness: Strictness,
}

impl Section {
    /// Create an empty section, with a default header, to write blocks
    pub fn new(byte_order: ByteOrder) -> Section {
        Section::from_header(SectionHeaderBlock::new(byte_order), Strictness::default())
    }

    pub fn from_header(header: SectionHeaderBlock, strictness: Strictness) -> Section {
        Section {
            header,
            interfaces: Vec::new(),
            interface_stats: BTreeMap::new(),
            strictness,
        }
    }

    /// Set the policy used when reading or writing blocks of this section
    pub fn with_strictness(mut self, strictness: Strictness) -> Section {
        self.strictness = strictness;
        self
    }

    pub fn set_strictness(&mut self, strictness: Strictness) {
        self.strictness = strictness;
    }

    #[inline]
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    pub fn header(&self) -> &SectionHeaderBlock {
        &self.header
    }

    /// Mutable access to the header, for ex. to add options before writing it
    pub fn header_mut(&mut self) -> &mut SectionHeaderBlock {
        &mut self.header
    }

    /// Add an interface to the section, and return its identifier
    pub fn register_interface(&mut self, idb: InterfaceDescriptionBlock) -> u32 {
        let if_id = self.interfaces.len() as u32;
        tracing::debug!(
            "registering interface {} (linktype {}, snaplen {})",
            if_id,
            idb.linktype,
            idb.snaplen
        );
        self.interfaces.push(idb);
        if_id
    }

    /// Store statistics for an interface, replacing the previous ones
    pub fn add_interface_stats(&mut self, isb: InterfaceStatisticsBlock) {
        self.interface_stats.insert(isb.if_id, isb);
    }

    /// Return the interface with the given identifier
    pub fn interface(&self, if_id: u32) -> Result<&InterfaceDescriptionBlock, PcapError> {
        self.interfaces
            .get(if_id as usize)
            .ok_or(PcapError::UnknownInterface(if_id))
    }

    /// Return the latest statistics of an interface, if any
    pub fn interface_stats(&self, if_id: u32) -> Option<&InterfaceStatisticsBlock> {
        self.interface_stats.get(&if_id)
    }

    /// Interfaces of the section, in identifier order
    pub fn interfaces(&self) -> &[InterfaceDescriptionBlock] {
        &self.interfaces
    }

    #[inline]
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// Attach a new block to this section
    ///
    /// Interface descriptions and statistics are registered. A Section Header Block cannot be
    /// a member of another section.
    pub fn new_member<B: Into<Block>>(&mut self, block: B) -> Result<Block, PcapError> {
        let block = block.into();
        match block {
            Block::SectionHeader(_) => return Err(PcapError::InvalidMember("section header")),
            Block::InterfaceDescription(ref idb) => {
                self.register_interface(idb.clone());
            }
            Block::InterfaceStatistics(ref isb) => self.add_interface_stats(isb.clone()),
            _ => (),
        }
        Ok(block)
    }

    /// Write the Section Header Block
    pub fn write_header<W: Write>(&self, out: &mut W) -> Result<usize, PcapError> {
        self.header.write(out)
    }

    /// Write a block of this section
    ///
    /// See [`Block::write`].
    pub fn write_block<W: Write>(&self, block: &Block, out: &mut W) -> Result<usize, PcapError> {
        block.write(self, out)
    }

    /// Decode a framed block of this section
    ///
    /// The block is decoded using the byte order and interfaces of the section. Interface
    /// descriptions and statistics are registered once decoded. Section headers must be handled
    /// by the caller, since they start a new section.
    pub fn decode_block(&mut self, raw: &RawBlock) -> Result<Block, PcapError> {
        let block = match raw.block_type {
            SHB_MAGIC => return Err(PcapError::InvalidMember("section header")),
            IDB_MAGIC => {
                let idb: InterfaceDescriptionBlock = parse_block_body(raw.body, self)?;
                self.register_interface(idb.clone());
                Block::InterfaceDescription(idb)
            }
            EPB_MAGIC => Block::EnhancedPacket(parse_block_body(raw.body, self)?),
            SPB_MAGIC => Block::SimplePacket(parse_block_body(raw.body, self)?),
            OPB_MAGIC => Block::ObsoletePacket(parse_block_body(raw.body, self)?),
            NRB_MAGIC => Block::NameResolution(parse_block_body(raw.body, self)?),
            ISB_MAGIC => {
                let isb: InterfaceStatisticsBlock = parse_block_body(raw.body, self)?;
                self.add_interface_stats(isb.clone());
                Block::InterfaceStatistics(isb)
            }
            _ => {
                tracing::debug!("unknown block type {:#x}", raw.block_type);
                Block::Unknown(UnknownBlock::from_raw(raw))
            }
        };
        Ok(block)
    }

    /// Check that a block referring to an interface can be written
    ///
    /// Returns `false` if the block must be skipped.
    pub(crate) fn check_has_interface(&self, kind: &str) -> Result<bool, PcapError> {
        if self.interfaces.is_empty() {
            self.strictness
                .problem(format!("writing {} for section with no interfaces", kind))?;
            if self.strictness.should_fix() {
                // the only fix is not to write the block
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Linktype;

    #[test]
    fn interfaces_are_numbered() {
        let mut section = Section::new(ByteOrder::LittleEndian);
        assert_eq!(section.interface(0), Err(PcapError::UnknownInterface(0)));
        let id0 = section.register_interface(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0));
        let id1 = section.register_interface(InterfaceDescriptionBlock::new(Linktype::RAW, 100));
        assert_eq!((id0, id1), (0, 1));
        assert_eq!(section.interface(1).unwrap().snaplen, 100);
        assert_eq!(section.interface_count(), 2);
    }

    #[test]
    fn members() {
        let mut section = Section::new(ByteOrder::BigEndian);
        let shb = SectionHeaderBlock::new(ByteOrder::BigEndian);
        assert_eq!(
            section.new_member(shb),
            Err(PcapError::InvalidMember("section header"))
        );
        section
            .new_member(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0))
            .unwrap();
        let mut isb = InterfaceStatisticsBlock::new(0);
        isb.options.insert("isb_ifdrop", 4u64).unwrap();
        section.new_member(isb.clone()).unwrap();
        isb.options.insert("isb_ifdrop", 5u64).unwrap();
        section.new_member(isb).unwrap();
        assert_eq!(section.interface_stats(0).and_then(|s| s.if_drop()), Some(5));
        let idb = section.interface(0).unwrap();
        assert_eq!(
            idb.statistics(&section, 0).and_then(|s| s.if_drop()),
            Some(5)
        );
    }

    #[test]
    fn decode_unknown_block() {
        let mut section = Section::new(ByteOrder::LittleEndian);
        let raw = RawBlock {
            block_type: 0x0bad,
            block_len: 16,
            body: &[1, 2, 3, 4],
        };
        let block = section.decode_block(&raw).unwrap();
        assert_eq!(block, Block::Unknown(UnknownBlock::new(0x0bad, vec![1, 2, 3, 4])));
        let raw = RawBlock {
            block_type: SHB_MAGIC,
            block_len: 28,
            body: &[0; 16],
        };
        assert!(section.decode_block(&raw).is_err());
    }
}
