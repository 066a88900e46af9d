use nom::error::ParseError;
use nom::number::complete::{be_i64, be_u16, be_u32, le_i64, le_u16, le_u32};
use nom::number::streaming;
use nom::IResult;

/// Byte order of a pcap-ng section
///
/// All multi-byte integers of a section (block framing, fields and options) are encoded using the
/// byte order fixed by its Section Header Block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host
    pub fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    #[inline]
    pub fn is_big_endian(self) -> bool {
        self == ByteOrder::BigEndian
    }
}

pub(crate) struct PcapBE;
pub(crate) struct PcapLE;

pub(crate) trait PcapEndianness {
    const BYTE_ORDER: ByteOrder;

    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E>;
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E>;
    fn parse_i64<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], i64, E>;

    /// Streaming variant, used for block framing
    fn parse_u32_streaming<'a, E: ParseError<&'a [u8]>>(i: &'a [u8])
        -> IResult<&'a [u8], u32, E>;

    fn u16_from_bytes(i: [u8; 2]) -> u16;
    fn u32_from_bytes(i: [u8; 4]) -> u32;
    fn u64_from_bytes(i: [u8; 8]) -> u64;
}

impl PcapEndianness for PcapBE {
    const BYTE_ORDER: ByteOrder = ByteOrder::BigEndian;

    #[inline]
    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E> {
        be_u16(i)
    }

    #[inline]
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E> {
        be_u32(i)
    }

    #[inline]
    fn parse_i64<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], i64, E> {
        be_i64(i)
    }

    #[inline]
    fn parse_u32_streaming<'a, E: ParseError<&'a [u8]>>(
        i: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        streaming::be_u32(i)
    }

    #[inline]
    fn u16_from_bytes(i: [u8; 2]) -> u16 {
        u16::from_be_bytes(i)
    }

    #[inline]
    fn u32_from_bytes(i: [u8; 4]) -> u32 {
        u32::from_be_bytes(i)
    }

    #[inline]
    fn u64_from_bytes(i: [u8; 8]) -> u64 {
        u64::from_be_bytes(i)
    }
}

impl PcapEndianness for PcapLE {
    const BYTE_ORDER: ByteOrder = ByteOrder::LittleEndian;

    #[inline]
    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E> {
        le_u16(i)
    }

    #[inline]
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E> {
        le_u32(i)
    }

    #[inline]
    fn parse_i64<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], i64, E> {
        le_i64(i)
    }

    #[inline]
    fn parse_u32_streaming<'a, E: ParseError<&'a [u8]>>(
        i: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        streaming::le_u32(i)
    }

    #[inline]
    fn u16_from_bytes(i: [u8; 2]) -> u16 {
        u16::from_le_bytes(i)
    }

    #[inline]
    fn u32_from_bytes(i: [u8; 4]) -> u32 {
        u32::from_le_bytes(i)
    }

    #[inline]
    fn u64_from_bytes(i: [u8; 8]) -> u64 {
        u64::from_le_bytes(i)
    }
}
