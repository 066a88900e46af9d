use std::io::Read;

use circular::Buffer;
use nom::{Needed, Offset};

use crate::error::PcapError;
use crate::pcapng::*;
use crate::strictness::Strictness;

/// Default maximum size of a block read by [`PcapNGReader`] (16 MiB)
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Parsing iterator over pcap-ng data (streaming version)
///
/// ## Pcap-NG Reader
///
/// This reader is a streaming parser based on a circular buffer, which means memory
/// usage is constant, and that it can be used to parse huge files or infinite streams.
/// It creates an abstraction over any input providing the `Read` trait, and takes care
/// of managing the circular buffer to provide an iterator interface.
///
/// The first block returned is a Section Header Block (SHB), marking the start of a
/// new section.
/// For each section, the following blocks are decoded using the section state (byte order,
/// interfaces), which is available using [`PcapNGReader::section`]. Interface Description
/// Blocks are registered in the section, so Enhanced Packet Blocks can be matched with their
/// interface.
///
/// The size of the circular buffer should be big enough for at least one complete block.
/// If a block is larger, the buffer is grown, up to the maximum block size
/// ([`DEFAULT_MAX_BLOCK_SIZE`] unless changed with [`PcapNGReader::set_max_block_size`]).
/// A block declaring a larger length is an error, and nothing is allocated for it.
/// Using a larger value (at least 65k) is advised to avoid frequent reads and buffer shifts.
///
/// ## Example
///
/// ```rust
/// use pcapng_codec::*;
///
/// # let mut section = Section::new(ByteOrder::LittleEndian);
/// # let mut data = Vec::new();
/// # section.write_header(&mut data).unwrap();
/// # let idb = section.new_member(InterfaceDescriptionBlock::new(Linktype::ETHERNET, 0)).unwrap();
/// # section.write_block(&idb, &mut data).unwrap();
/// # let epb = section.new_member(EnhancedPacketBlock::new(0, vec![0; 64])).unwrap();
/// # section.write_block(&epb, &mut data).unwrap();
/// let reader = PcapNGReader::new(65536, &data[..]).expect("PcapNGReader");
/// let mut num_packets = 0;
/// for block in reader {
///     match block {
///         Ok(Block::EnhancedPacket(epb)) => {
///             num_packets += 1;
///             println!("packet of {} bytes", epb.caplen());
///         }
///         Ok(_) => (),
///         Err(e) => panic!("error while reading: {:?}", e),
///     }
/// }
/// assert_eq!(num_packets, 1);
/// ```
pub struct PcapNGReader<R>
where
    R: Read,
{
    info: CurrentSectionInfo,
    reader: R,
    buffer: Buffer,
    consumed: usize,
    max_block_size: usize,
    reader_exhausted: bool,
    failed: bool,
}

impl<R> PcapNGReader<R>
where
    R: Read,
{
    /// Creates a new `PcapNGReader<R>` with the provided buffer capacity.
    pub fn new(capacity: usize, reader: R) -> Result<PcapNGReader<R>, PcapError> {
        Self::with_strictness(capacity, reader, Strictness::default())
    }

    /// Creates a new `PcapNGReader<R>`, using the given policy for format violations
    pub fn with_strictness(
        capacity: usize,
        reader: R,
        strictness: Strictness,
    ) -> Result<PcapNGReader<R>, PcapError> {
        let buffer = Buffer::with_capacity(capacity);
        Self::from_buffer(buffer, reader, strictness)
    }

    /// Creates a new `PcapNGReader<R>` using the provided `Buffer`.
    pub fn from_buffer(
        mut buffer: Buffer,
        mut reader: R,
        strictness: Strictness,
    ) -> Result<PcapNGReader<R>, PcapError> {
        let sz = reader.read(buffer.space()).or(Err(PcapError::ReadError))?;
        if sz == 0 {
            return Err(PcapError::Eof);
        }
        buffer.fill(sz);
        // just check that first block is a valid one
        match detect_byte_order(buffer.data()) {
            Ok(_) | Err(nom::Err::Incomplete(_)) => (),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(e),
        }
        // do not consume
        Ok(PcapNGReader {
            info: CurrentSectionInfo::new(strictness),
            reader,
            buffer,
            consumed: 0,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            reader_exhausted: false,
            failed: false,
        })
    }

    /// The current section (`None` before the first block was read)
    pub fn section(&self) -> Option<&Section> {
        self.info.section.as_ref()
    }

    /// Number of bytes consumed since the start of the stream
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Maximum size of a block: the buffer is never grown beyond it
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn set_max_block_size(&mut self, size: usize) {
        self.max_block_size = size;
    }

    /// Returns true if the underlying reader reached the end of data
    pub fn reader_exhausted(&self) -> bool {
        self.reader_exhausted
    }

    fn consume(&mut self, offset: usize) {
        self.consumed += offset;
        self.buffer.consume(offset);
    }

    fn refill(&mut self) -> Result<(), PcapError> {
        self.buffer.shift();
        let space = self.buffer.space();
        // check if available space is empty, so we can distinguish
        // a read() returning 0 because of EOF or because we requested 0
        if space.is_empty() {
            return Ok(());
        }
        let sz = self.reader.read(space).or(Err(PcapError::ReadError))?;
        self.reader_exhausted = sz == 0;
        self.buffer.fill(sz);
        Ok(())
    }

    /// Make room for a block of `needed` more bytes than available
    fn reserve(&mut self, needed: Needed) -> Result<(), PcapError> {
        let available = self.buffer.available_data();
        let required = match needed {
            Needed::Size(n) => available.saturating_add(usize::from(n)),
            Needed::Unknown => available + 1,
        };
        if required > self.buffer.capacity() {
            if required > self.max_block_size {
                return Err(PcapError::BlockTooLarge {
                    needed: required,
                    max: self.max_block_size,
                });
            }
            let new_size = required.max(self.buffer.capacity() * 2).min(self.max_block_size);
            tracing::debug!("growing buffer to {} bytes", new_size);
            self.buffer.grow(new_size);
        }
        Ok(())
    }

    fn next_block(&mut self) -> Option<Result<Block, PcapError>> {
        loop {
            // Return EOF if all bytes have been read, and no more data is available
            if self.buffer.available_data() == 0 && self.reader_exhausted {
                return None;
            }
            let data = self.buffer.data();
            match self.info.parse_next(data) {
                Ok((rem, block)) => {
                    let offset = data.offset(rem);
                    self.consume(offset);
                    return Some(Ok(block));
                }
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Some(Err(e)),
                Err(nom::Err::Incomplete(needed)) => {
                    if self.reader_exhausted {
                        // expected more bytes but reader is EOF, truncated pcap?
                        return Some(Err(PcapError::UnexpectedEof));
                    }
                    if let Err(e) = self.reserve(needed).and_then(|_| self.refill()) {
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

/// Iterator for PcapNGReader. Stops after the first error
impl<R> Iterator for PcapNGReader<R>
where
    R: Read,
{
    type Item = Result<Block, PcapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_block();
        if let Some(Err(_)) = item {
            self.failed = true;
        }
        item
    }
}
