//! Capabilities shared by several kinds of blocks

use crate::error::PcapError;
use crate::pcapng::{InterfaceDescriptionBlock, Section};

/// Blocks referring to an interface of their section
pub trait HasInterface {
    /// Identifier of the interface, as registered in the section
    fn interface_id(&self) -> u32;

    /// Look up the Interface Description Block of this block in `section`
    ///
    /// Fails with `UnknownInterface` if the interface was not registered.
    fn interface<'s>(&self, section: &'s Section) -> Result<&'s InterfaceDescriptionBlock, PcapError> {
        section.interface(self.interface_id())
    }
}

/// Blocks carrying a timestamp, counted in units of their interface resolution
pub trait HasTimestamp: HasInterface {
    fn ts_high(&self) -> u32;
    fn ts_low(&self) -> u32;

    /// Raw 64-bit timestamp, in resolution units
    fn ts_units(&self) -> u64 {
        (u64::from(self.ts_high()) << 32) | u64::from(self.ts_low())
    }

    /// Duration of one timestamp unit, in seconds, as declared by the interface
    fn timestamp_resolution(&self, section: &Section) -> Result<f64, PcapError> {
        Ok(self.interface(section)?.timestamp_resolution())
    }

    /// Timestamp in seconds since the epoch
    fn timestamp(&self, section: &Section) -> Result<f64, PcapError> {
        let resolution = self.timestamp_resolution(section)?;
        Ok(self.ts_units() as f64 * resolution)
    }
}

/// Common methods for PcapNG blocks containing a packet
pub trait PcapNGPacketBlock {
    /// Original length of the packet, on the wire
    fn orig_len(&self) -> u32;

    /// Captured packet data (without padding)
    fn packet_data(&self) -> &[u8];

    /// Returns true if the packet was truncated when captured
    fn truncated(&self) -> bool {
        (self.packet_data().len() as u64) < u64::from(self.orig_len())
    }
}
