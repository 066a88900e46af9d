//! # PCAPNG reader and writer
//!
//! This crate reads and writes files in the PCAPNG format: section headers, interface
//! descriptions, packet blocks (enhanced, simple and obsolete), name resolution and interface
//! statistics blocks.
//!
//! Sections can use either byte order, and a file can contain several sections. Blocks are
//! owned values, decoded and encoded relative to a [`Section`], which holds the byte order and
//! the interfaces of the section.
//!
//! Format violations are handled according to a [`Strictness`] policy: fail, fix, warn or
//! ignore. Warnings are emitted using [`tracing`](https://docs.rs/tracing).
//!
//! # Example: streaming parser
//!
//! The following code shows how to parse pcap-ng data using a
//! [PcapNGReader](struct.PcapNGReader.html) streaming parser. Any source providing the `Read`
//! trait can be used, for ex. a `File`.
//!
//! ```rust
//! use pcapng_codec::*;
//! use pcapng_codec::traits::PcapNGPacketBlock;
//!
//! # let mut section = Section::new(ByteOrder::BigEndian);
//! # let mut data = Vec::new();
//! # section.write_header(&mut data).unwrap();
//! # let idb = section.new_member(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0)).unwrap();
//! # section.write_block(&idb, &mut data).unwrap();
//! # let epb = section.new_member(EnhancedPacketBlock::new(0, vec![1, 2, 3])).unwrap();
//! # section.write_block(&epb, &mut data).unwrap();
//! let mut num_blocks = 0;
//! let reader = PcapNGReader::new(65536, &data[..]).expect("PcapNGReader");
//! for block in reader {
//!     match block {
//!         Ok(Block::EnhancedPacket(epb)) => {
//!             println!("packet: {:?}", epb.packet_data());
//!         }
//!         Ok(_) => (),
//!         Err(e) => panic!("error while reading: {:?}", e),
//!     }
//!     num_blocks += 1;
//! }
//! assert_eq!(num_blocks, 3);
//! ```
//!
//! See [PcapNGReader](struct.PcapNGReader.html) for details on the buffer, and
//! [PcapNGSlice](struct.PcapNGSlice.html) for data already loaded into memory.

#[cfg(test)]
#[macro_use]
extern crate hex_literal;

mod endianness;
mod error;
pub mod flags;
mod linktype;
mod serialize;
mod strictness;

pub use endianness::ByteOrder;
pub use error::*;
pub use flags::{FlagError, FlagField, FlagKind, FlagValue, FlagWord};
pub use linktype::*;
pub use serialize::ToVec;
pub use strictness::Strictness;

pub mod pcapng;
pub use pcapng::*;

pub mod traits;
