use std::io::{self, Read};

use pcapng_codec::*;

fn sample_capture(byte_order: ByteOrder, num_packets: usize, packet_len: usize) -> Vec<u8> {
    let mut section = Section::new(byte_order);
    let mut out = Vec::new();
    section.write_header(&mut out).unwrap();
    let idb = section
        .new_member(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0))
        .unwrap();
    section.write_block(&idb, &mut out).unwrap();
    for i in 0..num_packets {
        let mut epb = EnhancedPacketBlock::new(0, vec![i as u8; packet_len]);
        epb.set_ts_units(i as u64);
        section
            .write_block(&Block::EnhancedPacket(epb), &mut out)
            .unwrap();
    }
    out
}

/// Reader returning at most `chunk` bytes per call
struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> Read for ChunkedReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let sz = buf.len().min(self.chunk).min(self.data.len());
        buf[..sz].copy_from_slice(&self.data[..sz]);
        self.data = &self.data[sz..];
        Ok(sz)
    }
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "broken"))
    }
}

#[test]
fn test_empty_reader_error() {
    let empty: &[u8] = &[];
    let res = PcapNGReader::new(1024, empty);
    assert_eq!(res.err(), Some(PcapError::Eof));
}

#[test]
fn test_reader_not_pcapng() {
    let data: &[u8] = b"this is not a capture file";
    let res = PcapNGReader::new(1024, data);
    assert_eq!(res.err(), Some(PcapError::HeaderNotRecognized));
}

#[test]
fn test_reader_read_error() {
    let res = PcapNGReader::new(1024, FailingReader);
    assert_eq!(res.err(), Some(PcapError::ReadError));
}

#[test]
fn test_reader_truncated() {
    let data = sample_capture(ByteOrder::LittleEndian, 2, 20);
    let truncated = &data[..data.len() - 5];
    let mut reader = PcapNGReader::new(1024, truncated).expect("PcapNGReader");
    let mut blocks = Vec::new();
    let mut errors = Vec::new();
    for block in &mut reader {
        match block {
            Ok(b) => blocks.push(b),
            Err(e) => errors.push(e),
        }
    }
    assert_eq!(blocks.len(), 3);
    assert_eq!(errors, vec![PcapError::UnexpectedEof]);

    let one_byte: &[u8] = &[0x0a];
    let mut reader = PcapNGReader::new(1024, one_byte).expect("PcapNGReader");
    assert_eq!(reader.next(), Some(Err(PcapError::UnexpectedEof)));
    assert_eq!(reader.next(), None);
}

#[test]
fn test_reader_both_byte_orders() {
    for byte_order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
        let data = sample_capture(byte_order, 10, 60);
        let mut reader = PcapNGReader::new(65536, &data[..]).expect("PcapNGReader");
        let mut num_packets = 0;
        for block in &mut reader {
            if let Block::EnhancedPacket(epb) = block.expect("block") {
                assert_eq!(epb.data, vec![num_packets as u8; 60]);
                num_packets += 1;
            }
        }
        assert_eq!(num_packets, 10);
        assert_eq!(reader.consumed(), data.len());
        let section = reader.section().expect("section");
        assert_eq!(section.byte_order(), byte_order);
        assert_eq!(section.interface_count(), 1);
    }
}

#[test]
fn test_reader_small_buffer_grows() {
    // blocks are larger than the initial buffer, and data arrives in small chunks
    let data = sample_capture(ByteOrder::BigEndian, 3, 1500);
    let input = ChunkedReader {
        data: &data,
        chunk: 100,
    };
    let reader = PcapNGReader::new(64, input).expect("PcapNGReader");
    let blocks: Vec<_> = reader.map(|b| b.expect("block")).collect();
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks, parse_pcapng(&data).expect("parse"));
}

#[test]
fn test_reader_block_too_large() {
    let mut data = Vec::new();
    Section::new(ByteOrder::LittleEndian)
        .write_header(&mut data)
        .unwrap();
    // enhanced packet block declaring 256 MiB, followed by a few bytes only
    data.extend_from_slice(&[6, 0, 0, 0, 0, 0, 0, 0x10, 0, 0, 0, 0]);
    let mut reader = PcapNGReader::new(65536, &data[..]).expect("PcapNGReader");
    assert!(matches!(reader.next(), Some(Ok(Block::SectionHeader(_)))));
    assert_eq!(
        reader.next(),
        Some(Err(PcapError::BlockTooLarge {
            needed: 0x1000_0000 - 4,
            max: DEFAULT_MAX_BLOCK_SIZE
        }))
    );
    assert_eq!(reader.next(), None);
}

#[test]
fn test_reader_max_block_size() {
    let data = sample_capture(ByteOrder::BigEndian, 3, 1500);
    let mut reader = PcapNGReader::new(64, &data[..]).expect("PcapNGReader");
    reader.set_max_block_size(1024);
    let res: Result<Vec<_>, _> = reader.collect();
    assert!(matches!(res, Err(PcapError::BlockTooLarge { max: 1024, .. })));

    let mut reader = PcapNGReader::new(64, &data[..]).expect("PcapNGReader");
    reader.set_max_block_size(4096);
    assert_eq!(reader.max_block_size(), 4096);
    assert_eq!(reader.map(|b| b.expect("block")).count(), 5);
}

#[test]
fn test_reader_strictness() {
    let mut data = sample_capture(ByteOrder::LittleEndian, 0, 0);
    // an unknown block whose length is not a multiple of 4
    data.extend_from_slice(&[0xad, 0x0b, 0, 0, 0x0e, 0, 0, 0, 1, 2, 0x0e, 0, 0, 0]);
    let reader = PcapNGReader::new(1024, &data[..]).expect("PcapNGReader");
    let res: Result<Vec<_>, _> = reader.collect();
    assert!(matches!(res, Err(PcapError::Strictness(_))));

    let reader =
        PcapNGReader::with_strictness(1024, &data[..], Strictness::Warn).expect("PcapNGReader");
    let blocks: Vec<_> = reader.map(|b| b.expect("block")).collect();
    assert_eq!(
        blocks[2],
        Block::Unknown(UnknownBlock::new(0x0bad, vec![1, 2]))
    );
}
