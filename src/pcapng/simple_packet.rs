use std::convert::TryFrom;
use std::io::Write;

use cookie_factory::sequence::tuple;
use nom::{Err, IResult};

use crate::endianness::{ByteOrder, PcapEndianness};
use crate::error::PcapError;
use crate::serialize::{gen_to_vec, gen_u32, ToVec};
use crate::traits::{HasInterface, PcapNGPacketBlock};

use super::*;

/// The Simple Packet Block (SPB) is a lightweight container for storing
/// the packets coming from the network.
///
/// This block does not contain the interface ID field: it always refers to the first interface
/// of the section. The captured length is not stored either, and is computed from the original
/// length and the snapshot length of the interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimplePacketBlock {
    /// Original packet length
    pub origlen: u32,
    pub data: Vec<u8>,
}

impl SimplePacketBlock {
    /// Create a block for a packet captured entirely
    pub fn new(data: Vec<u8>) -> SimplePacketBlock {
        let origlen = u32::try_from(data.len()).unwrap_or(u32::MAX);
        SimplePacketBlock { origlen, data }
    }

    /// Length of the captured data, given the snapshot length of the first interface of `section`
    ///
    /// This is the original length if the snapshot length is 0 (unlimited), or the smallest of
    /// both values.
    pub fn captured_len(&self, section: &Section) -> Result<usize, PcapError> {
        let idb = self.interface(section)?;
        Ok(captured_len(self.origlen, idb.snaplen))
    }

    /// Write the block using the byte order of `section`
    ///
    /// A section with more than one interface is reported to the strictness policy, but cannot
    /// be fixed. The data length must match the captured length computed from the snapshot
    /// length of the first interface.
    pub fn write<W: Write>(&self, section: &Section, out: &mut W) -> Result<usize, PcapError> {
        if section.interface_count() > 1 {
            // the interfaces have already been written
            section
                .strictness()
                .problem("writing SimplePacketBlock for section with multiple interfaces")?;
        }
        if !section.check_has_interface("SimplePacketBlock")? {
            return Ok(0);
        }
        if let Ok(idb) = section.interface(0) {
            let expected = captured_len(self.origlen, idb.snaplen);
            if self.data.len() != expected {
                return Err(PcapError::invalid_value(
                    "packet data",
                    format!(
                        "{} bytes written, captured length is {}",
                        self.data.len(),
                        expected
                    ),
                ));
            }
        }
        write_block_bytes(self, section.byte_order(), out)
    }
}

fn captured_len(origlen: u32, snaplen: u32) -> usize {
    let len = if snaplen == 0 {
        origlen
    } else {
        origlen.min(snaplen)
    };
    len as usize
}

impl HasInterface for SimplePacketBlock {
    fn interface_id(&self) -> u32 {
        0
    }
}

impl PcapNGPacketBlock for SimplePacketBlock {
    fn orig_len(&self) -> u32 {
        self.origlen
    }

    fn packet_data(&self) -> &[u8] {
        &self.data
    }
}

impl ToVec for SimplePacketBlock {
    fn magic(&self) -> u32 {
        SPB_MAGIC
    }

    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        gen_to_vec(
            tuple((
                gen_u32(self.origlen, byte_order),
                gen_packet_data(&self.data),
            )),
            4 + self.data.len() + 3,
        )
    }
}

impl PcapNGBlockParser for SimplePacketBlock {
    const HDR_SZ: usize = 16;
    const MAGIC: u32 = SPB_MAGIC;

    fn inner_parse<'a, En: PcapEndianness>(
        i: &'a [u8],
        section: &Section,
    ) -> IResult<&'a [u8], SimplePacketBlock, PcapError> {
        let (i, origlen) = En::parse_u32(i)?;
        let snaplen = section.interface(0).map_err(Err::Failure)?.snaplen;
        let (i, data) = parse_packet_data(i, captured_len(origlen, snaplen))?;
        let block = SimplePacketBlock {
            origlen,
            data: data.to_vec(),
        };
        Ok((i, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strictness::Strictness;
    use crate::Linktype;
    use hex_literal::hex;

    const SPB_BODY: &[u8] = &hex!("0a 00 00 00 01 02 03 04 05 06 07 08 09 0a 00 00");

    fn section(snaplens: &[u32]) -> Section {
        let mut section = Section::new(ByteOrder::LittleEndian);
        for snaplen in snaplens {
            section.register_interface(InterfaceDescriptionBlock::new(Linktype::ETHERNET, *snaplen));
        }
        section
    }

    #[test]
    fn captured_length_is_clamped() {
        // only the captured bytes are stored
        let body = hex!("0a 00 00 00 01 02 03 04");
        let s = section(&[4]);
        let spb: SimplePacketBlock = parse_block_body(&body, &s).expect("spb");
        assert_eq!(spb.origlen, 10);
        assert_eq!(spb.data, [1, 2, 3, 4]);
        assert_eq!(spb.captured_len(&s), Ok(4));
        assert!(spb.truncated());

        let s = section(&[0]);
        let spb: SimplePacketBlock = parse_block_body(SPB_BODY, &s).expect("spb");
        assert_eq!(spb.data.len(), 10);
        assert_eq!(spb.to_vec(ByteOrder::LittleEndian).unwrap()[8..24], *SPB_BODY);

        // a body longer than the captured length
        let s = section(&[4]);
        let res: Result<SimplePacketBlock, _> = parse_block_body(SPB_BODY, &s);
        assert!(matches!(res, Err(PcapError::Strictness(_))));
    }

    #[test]
    fn decode_without_interface() {
        let s = section(&[]);
        let res: Result<SimplePacketBlock, _> = parse_block_body(SPB_BODY, &s);
        assert_eq!(res, Err(PcapError::UnknownInterface(0)));
    }

    #[test]
    fn write_checks() {
        let mut out = Vec::new();
        let spb = SimplePacketBlock::new(vec![0; 10]);
        // snaplen 4 would truncate the data to 4 bytes
        let s = section(&[4]);
        assert!(matches!(
            spb.write(&s, &mut out),
            Err(PcapError::InvalidFieldValue { .. })
        ));
        let s = section(&[0, 0]);
        assert!(matches!(
            spb.write(&s, &mut out),
            Err(PcapError::Strictness(_))
        ));
        // cannot be fixed: the block is still written
        let s = section(&[0, 0]).with_strictness(Strictness::Fix);
        assert_eq!(spb.write(&s, &mut out), Ok(28));
    }
}
