use std::convert::TryFrom;
use std::io::Write;

use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use nom::IResult;
use rusticata_macros::align32;

use crate::error::PcapError;
use crate::serialize::padding_for;

/// Take `len` bytes from a block body
///
/// A length going past the end of the body is an integrity error.
pub(crate) fn take_checked<'a>(
    i: &'a [u8],
    len: usize,
    what: &'static str,
) -> IResult<&'a [u8], &'a [u8], PcapError> {
    if len > i.len() {
        return Err(nom::Err::Failure(PcapError::LengthMismatch {
            what,
            declared: len,
            available: i.len(),
        }));
    }
    let (data, rem) = i.split_at(len);
    Ok((rem, data))
}

/// Read `caplen` bytes of packet data, then skip the padding to the next 32-bit boundary
pub(crate) fn parse_packet_data(i: &[u8], caplen: usize) -> IResult<&[u8], &[u8], PcapError> {
    let (rem, data) = take_checked(i, caplen, "packet data")?;
    // a body truncated right after the payload is tolerated
    let padding = (align32!(caplen) - caplen).min(rem.len());
    Ok((&rem[padding..], data))
}

/// Captured length of a packet, as written in the block
pub(crate) fn packet_length(data: &[u8]) -> Result<u32, PcapError> {
    u32::try_from(data.len()).map_err(|_| {
        PcapError::invalid_value("packet data", format!("{} bytes do not fit in 32 bits", data.len()))
    })
}

/// Write packet data followed by its padding
pub(crate) fn gen_packet_data<'a, W: Write + 'a>(data: &'a [u8]) -> impl SerializeFn<W> + 'a {
    tuple((slice(data), padding_for(data.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_padding() {
        let i = [1, 2, 3, 0, 9];
        let (rem, data) = parse_packet_data(&i, 3).expect("parse");
        assert_eq!(data, &[1, 2, 3]);
        assert_eq!(rem, &[9]);
    }

    #[test]
    fn declared_length_too_large() {
        let i = [1, 2, 3, 0];
        let res = parse_packet_data(&i, 8);
        assert_eq!(
            res,
            Err(nom::Err::Failure(PcapError::LengthMismatch {
                what: "packet data",
                declared: 8,
                available: 4
            }))
        );
    }
}
