use std::convert::TryFrom;
use std::io::Write;

use cookie_factory::bytes::{
    be_i16, be_i32, be_i64, be_u16, be_u32, be_u64, le_i16, le_i32, le_i64, le_u16, le_u32, le_u64,
};
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen_simple, SerializeFn, WriteContext};
use rusticata_macros::align32;

use crate::endianness::ByteOrder;
use crate::error::PcapError;

/// Common trait for all block serialization functions
pub trait ToVec {
    /// Block type, as written in the block header
    fn magic(&self) -> u32;

    /// Serialize the block body (without framing and padding), using the given byte order
    fn body_to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError>;

    /// Serialize the complete block: type, total length, body, padding and total length
    fn to_vec(&self, byte_order: ByteOrder) -> Result<Vec<u8>, PcapError> {
        let body = self.body_to_vec(byte_order)?;
        frame_block(self.magic(), &body, byte_order)
    }
}

macro_rules! gen_int {
    ($name:ident, $t:ty, $le:ident, $be:ident) => {
        pub(crate) fn $name<W: Write>(v: $t, byte_order: ByteOrder) -> impl SerializeFn<W> {
            move |out: WriteContext<W>| match byte_order {
                ByteOrder::LittleEndian => $le(v)(out),
                ByteOrder::BigEndian => $be(v)(out),
            }
        }
    };
}

gen_int!(gen_u16, u16, le_u16, be_u16);
gen_int!(gen_u32, u32, le_u32, be_u32);
gen_int!(gen_u64, u64, le_u64, be_u64);
gen_int!(gen_i16, i16, le_i16, be_i16);
gen_int!(gen_i32, i32, le_i32, be_i32);
gen_int!(gen_i64, i64, le_i64, be_i64);

/// Zero bytes required to align `unaligned_length` on 32 bits
pub(crate) fn padding_for<'a, W: Write + 'a>(unaligned_length: usize) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(&[0u8, 0, 0, 0][..length])
}

/// Run a serializer into a new buffer
pub(crate) fn gen_to_vec<F>(f: F, capacity: usize) -> Result<Vec<u8>, PcapError>
where
    F: SerializeFn<Vec<u8>>,
{
    gen_simple(f, Vec::with_capacity(capacity)).map_err(PcapError::from)
}

/// Wrap a block body into its framing
///
/// The total length written at both ends is 12 plus the body length rounded up to 4.
pub(crate) fn frame_block(
    block_type: u32,
    body: &[u8],
    byte_order: ByteOrder,
) -> Result<Vec<u8>, PcapError> {
    let total = 12 + align32!(body.len());
    let total32 = u32::try_from(total).map_err(|_| {
        PcapError::invalid_value("block length", format!("{} bytes do not fit in 32 bits", total))
    })?;
    gen_to_vec(
        tuple((
            gen_u32(block_type, byte_order),
            gen_u32(total32, byte_order),
            slice(body),
            padding_for(body.len()),
            gen_u32(total32, byte_order),
        )),
        total,
    )
}

pub(crate) fn write_all<W: Write>(out: &mut W, data: &[u8]) -> Result<(), PcapError> {
    out.write_all(data)
        .map_err(|e| PcapError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn frame_is_padded() {
        let v = frame_block(0x0bad, b"abcde", ByteOrder::LittleEndian).expect("serialize");
        assert_eq!(
            v,
            hex!("ad 0b 00 00 14 00 00 00 61 62 63 64 65 00 00 00 14 00 00 00")
        );
    }

    #[test]
    fn frame_big_endian() {
        let v = frame_block(6, &[1, 2, 3, 4], ByteOrder::BigEndian).expect("serialize");
        assert_eq!(v, hex!("00 00 00 06 00 00 00 10 01 02 03 04 00 00 00 10"));
    }

    #[test]
    fn integers_follow_byte_order() {
        let le = gen_to_vec(gen_u16(0x0102, ByteOrder::LittleEndian), 2).unwrap();
        let be = gen_to_vec(gen_i64(-2, ByteOrder::BigEndian), 8).unwrap();
        assert_eq!(le, [2, 1]);
        assert_eq!(be, hex!("ff ff ff ff ff ff ff fe"));
    }
}
