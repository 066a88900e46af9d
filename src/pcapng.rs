//! PCAPNG file format
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! There are several ways of reading a PCAPNG file. The first method is to use a
//! [`PcapNGSlice`], which iterates over blocks of data already loaded into memory.
//!
//! The second (and prefered for large files or streams) method is to use a [`PcapNGReader`],
//! which reads data from any source implementing `Read` using a circular buffer.
//!
//! The last method is to manually split the blocks using [`parse_frame_le`] or
//! [`parse_frame_be`] (after reading the section header using [`parse_sectionheaderblock`]),
//! and decode them using [`Section::decode_block`].
//!
//! ## File format and parsing
//!
//! A capture file is organized in blocks. Blocks are organized in sections, each section
//! starting with a Section Header Block (SHB), and followed by blocks (interface description,
//! statistics, packets, etc.).
//! A file is usually composed of one section, but can contain multiple sections. When a SHB is
//! encountered, this means a new section starts (and all information about previous section has to
//! be flushed, like interfaces).
//!
//! ## Endianness
//!
//! The endianness of a block is indicated by the Section Header Block that started the section
//! containing this block. Since a file can contain several sections, a single file can contain
//! both endianness variants.
//!
//! ## Writing
//!
//! Blocks are written relative to a [`Section`], which gives the byte order and the list of
//! interfaces:
//!
//! ```rust
//! use pcapng_codec::*;
//!
//! let mut section = Section::new(ByteOrder::LittleEndian);
//! let idb = InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0);
//! let idb = section.new_member(idb).expect("interface");
//! let epb = section
//!     .new_member(EnhancedPacketBlock::new(0, b"hello".to_vec()))
//!     .expect("packet");
//!
//! let mut out = Vec::new();
//! section.write_header(&mut out).unwrap();
//! section.write_block(&idb, &mut out).unwrap();
//! section.write_block(&epb, &mut out).unwrap();
//! assert_eq!(&out[..4], &[0x0a, 0x0d, 0x0d, 0x0a]);
//! ```

mod block;
mod capture;
mod enhanced_packet;
mod interface_description;
mod interface_statistics;
mod name_resolution;
mod obsolete_packet;
mod option;
mod packet_data;
mod reader;
mod section;
mod section_header;
mod simple_packet;
mod time;
mod unknown;

pub use block::*;
pub use capture::*;
pub use enhanced_packet::*;
pub use interface_description::*;
pub use interface_statistics::*;
pub use name_resolution::*;
pub use obsolete_packet::*;
pub use option::*;
pub(crate) use packet_data::*;
pub use reader::*;
pub use section::*;
pub use section_header::*;
pub use simple_packet::*;
pub use time::*;
pub use unknown::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Obsolete Packet Block magic
pub const OPB_MAGIC: u32 = 0x0000_0002;
/// Simple Packet Block magic
pub const SPB_MAGIC: u32 = 0x0000_0003;
/// Name Resolution Block magic
pub const NRB_MAGIC: u32 = 0x0000_0004;
/// Interface Statistic Block magic
pub const ISB_MAGIC: u32 = 0x0000_0005;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;
