use hex_literal::hex;
use pcapng_codec::flags::{FlagValue, FlagWord, EPB_FLAGS_SCHEMA, INVALID_ENUM_VALUE};
use pcapng_codec::traits::{HasTimestamp, PcapNGPacketBlock};
use pcapng_codec::*;

// LE enhanced packet block, interface 0, 4 bytes of data and epb_flags=1
const EPB_FLAGS_LE: &[u8] = &hex!(
    "
06 00 00 00 30 00 00 00 00 00 00 00 01 00 00 00
02 00 00 00 04 00 00 00 04 00 00 00 de ad be ef
02 00 04 00 01 00 00 00 00 00 00 00 30 00 00 00"
);

fn new_section(byte_order: ByteOrder, snaplen: u32) -> (Section, Vec<u8>) {
    let mut section = Section::new(byte_order);
    let mut out = Vec::new();
    section.write_header(&mut out).expect("header");
    let idb = section
        .new_member(InterfaceDescriptionBlock::new(Linktype::ETHERNET, snaplen))
        .expect("idb");
    section.write_block(&idb, &mut out).expect("idb");
    (section, out)
}

#[test]
fn test_pcapng_write_and_scan_le() {
    let (section, mut out) = new_section(ByteOrder::LittleEndian, 0);
    let epb = Block::from(EnhancedPacketBlock::new(0, (0..14).collect()));
    section.write_block(&epb, &mut out).expect("epb");
    assert_eq!(&out[..4], &hex!("0a 0d 0d 0a"));

    let blocks = parse_pcapng(&out).expect("could not parse data");
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], Block::SectionHeader(section.header().clone()));
    assert_eq!(
        blocks[1],
        Block::InterfaceDescription(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0))
    );
    assert_eq!(blocks[2], epb);
    if let Block::EnhancedPacket(epb) = &blocks[2] {
        assert_eq!(epb.packet_data().len(), 14);
        assert!(!epb.truncated());
    }
}

#[test]
fn test_pcapng_byte_order_detection() {
    for byte_order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
        let (_, out) = new_section(byte_order, 0);
        let (_, detected) = detect_byte_order(&out).expect("byte order");
        assert_eq!(detected, byte_order);
        let (_, shb) = parse_sectionheaderblock(&out).expect("section header");
        assert_eq!(shb.byte_order, byte_order);
        assert_eq!(shb.big_endian(), byte_order.is_big_endian());
    }
    // byte order magic swapped in the middle
    let data = hex!("0a 0d 0d 0a 1c 00 00 00 4d 3c 2b 1a");
    assert!(detect_byte_order(&data).is_ok());
    let data = hex!("0a 0d 0d 0a 1c 00 00 00 3c 4d 1a 2b");
    assert!(detect_byte_order(&data).is_err());
}

#[test]
fn test_pcapng_framing_lengths() {
    let (section, mut out) = new_section(ByteOrder::BigEndian, 0);
    for len in 0..8 {
        let epb = EnhancedPacketBlock::new(0, vec![0x55; len]);
        section
            .write_block(&Block::EnhancedPacket(epb), &mut out)
            .expect("epb");
    }
    let mut rem = &out[..];
    let (i, _) = parse_sectionheaderblock(rem).expect("shb");
    rem = i;
    while !rem.is_empty() {
        let (i, raw) = parse_frame_be(rem, Strictness::Fail).expect("frame");
        let block_len = raw.block_len as usize;
        assert_eq!(block_len % 4, 0);
        assert_eq!(block_len, 12 + raw.body.len());
        let trailing = u32::from_be_bytes([
            rem[block_len - 4],
            rem[block_len - 3],
            rem[block_len - 2],
            rem[block_len - 1],
        ]);
        assert_eq!(trailing, raw.block_len);
        rem = i;
    }
}

#[test]
fn test_pcapng_epb_round_trip() {
    let (mut section, _) = new_section(ByteOrder::LittleEndian, 0);
    let (rem, raw) = parse_frame_le(EPB_FLAGS_LE, Strictness::Fail).expect("frame");
    assert!(rem.is_empty());
    let block = section.decode_block(&raw).expect("decode");
    let epb = match &block {
        Block::EnhancedPacket(epb) => epb,
        b => panic!("unexpected block {:?}", b),
    };
    assert_eq!(epb.data, hex!("de ad be ef"));
    assert_eq!(epb.ts_units(), (1 << 32) | 2);
    let flags = epb.flags().expect("flags");
    assert_eq!(flags.get("inout"), Ok(FlagValue::Symbol("inbound")));
    let mut out = Vec::new();
    let sz = section.write_block(&block, &mut out).expect("write");
    assert_eq!(sz, EPB_FLAGS_LE.len());
    assert_eq!(out, EPB_FLAGS_LE);
}

#[test]
fn test_pcapng_unknown_option_preserved() {
    let (section, mut out) = new_section(ByteOrder::LittleEndian, 0);
    let mut epb = EnhancedPacketBlock::new(0, vec![1, 2, 3]);
    epb.options.push_raw(0x7fff, b"xyz".to_vec()).expect("raw option");
    epb.options.insert("opt_comment", "first").expect("comment");
    let epb = Block::EnhancedPacket(epb);
    section.write_block(&epb, &mut out).expect("epb");
    let blocks = parse_pcapng(&out).expect("parse");
    assert_eq!(blocks[2], epb);
    if let Block::EnhancedPacket(epb) = &blocks[2] {
        let codes: Vec<u16> = epb.options.iter().map(|o| o.code.0).collect();
        assert_eq!(codes, vec![0x7fff, 1]);
    }
}

#[test]
fn test_pcapng_simple_packet_clamp() {
    let (section, mut out) = new_section(ByteOrder::LittleEndian, 10);
    let spb = SimplePacketBlock {
        origlen: 100,
        data: vec![7; 10],
    };
    section
        .write_block(&Block::SimplePacket(spb.clone()), &mut out)
        .expect("spb");
    let mut slice = PcapNGSlice::new(&out);
    let blocks: Vec<_> = (&mut slice).map(|b| b.expect("block")).collect();
    assert_eq!(blocks[2], Block::SimplePacket(spb.clone()));
    let section = slice.section().expect("section");
    assert_eq!(spb.captured_len(section), Ok(10));
    assert!(spb.truncated());
}

#[test]
fn test_pcapng_timestamp_resolution() {
    let mut idb = InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0);
    assert_eq!(idb.timestamp_resolution(), 1e-6);
    idb.options.insert("if_tsresol", vec![0x06]).unwrap();
    assert_eq!(idb.timestamp_resolution(), 1e-6);
    idb.options.remove("if_tsresol");
    idb.options.insert("if_tsresol", vec![0x89]).unwrap();
    assert_eq!(idb.timestamp_resolution(), 1.0 / 512.0);

    let mut section = Section::new(ByteOrder::LittleEndian);
    section.register_interface(idb);
    let mut epb = EnhancedPacketBlock::new(0, vec![]);
    epb.set_ts_units(1024);
    assert_eq!(epb.timestamp(&section), Ok(2.0));
}

#[test]
fn test_pcapng_flag_word() {
    let mut flags = FlagWord::new(EPB_FLAGS_SCHEMA, 32).unwrap();
    flags.set("fcslen", 17u64).unwrap();
    assert_eq!(flags.get("fcslen"), Ok(FlagValue::UInt(1)));
    flags.set("inout", 3u64).unwrap();
    assert_eq!(flags.get("inout"), Ok(FlagValue::Symbol(INVALID_ENUM_VALUE)));
    flags.set("err_crc", true).unwrap();
    let mut epb = EnhancedPacketBlock::new(0, vec![]);
    epb.set_flags(&flags).unwrap();
    assert_eq!(epb.flags(), Ok(flags));
}

#[test]
fn test_pcapng_obsolete_fix() {
    let (section, mut out) = new_section(ByteOrder::LittleEndian, 0);
    let section = section.with_strictness(Strictness::Fix);
    let mut opb = ObsoletePacketBlock::new(0, vec![0xaa; 5]);
    opb.drops_count = 3;
    let sz = section
        .write_block(&Block::ObsoletePacket(opb), &mut out)
        .expect("opb");
    assert!(sz > 0);
    let blocks = parse_pcapng(&out).expect("parse");
    match &blocks[2] {
        Block::EnhancedPacket(epb) => {
            assert_eq!(epb.data, vec![0xaa; 5]);
            assert_eq!(epb.options.get("epb_dropcount"), Some(&OptionValue::U64(3)));
        }
        b => panic!("unexpected block {:?}", b),
    }
}

#[test]
fn test_pcapng_obsolete_fail() {
    let (section, mut out) = new_section(ByteOrder::LittleEndian, 0);
    let len = out.len();
    let opb = ObsoletePacketBlock::new(0, vec![0xaa; 5]);
    let res = section.write_block(&Block::ObsoletePacket(opb), &mut out);
    assert!(matches!(res, Err(PcapError::Strictness(_))));
    assert_eq!(out.len(), len);
}

#[test]
fn test_pcapng_multiple_sections() {
    let (section, mut out) = new_section(ByteOrder::LittleEndian, 0);
    let epb = EnhancedPacketBlock::new(0, vec![1; 3]);
    section
        .write_block(&Block::EnhancedPacket(epb.clone()), &mut out)
        .unwrap();
    let (section, out2) = new_section(ByteOrder::BigEndian, 0);
    out.extend_from_slice(&out2);
    section
        .write_block(&Block::EnhancedPacket(epb.clone()), &mut out)
        .unwrap();
    let blocks = parse_pcapng(&out).expect("parse");
    let magics: Vec<u32> = blocks.iter().map(Block::magic).collect();
    assert_eq!(
        magics,
        vec![SHB_MAGIC, IDB_MAGIC, EPB_MAGIC, SHB_MAGIC, IDB_MAGIC, EPB_MAGIC]
    );
    assert_eq!(blocks[5], Block::EnhancedPacket(epb));
}

#[test]
fn test_pcapng_strictness_from_str() {
    assert_eq!("fix".parse::<Strictness>(), Ok(Strictness::Fix));
    assert!("repair".parse::<Strictness>().is_err());
}
