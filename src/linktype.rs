use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Linktype(pub u16);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    IEEE802_5 = 6,
    PPP = 9,
    FDDI = 10,

    RAW = 101,
    IEEE802_11 = 105,

    LOOP = 108,
    LINUX_SLL = 113,
    IEEE802_11_RADIOTAP = 127,

    // USB packets, beginning with a Linux USB header
    USB_LINUX = 189,
    BLUETOOTH_HCI_H4 = 187,
    // USB packets, beginning with a Linux USB header, as captured with memory-mapped access
    USB_LINUX_MMAPPED = 220,

    // Raw IPv4; the packet begins with an IPv4 header.
    IPV4 = 228,
    // Raw IPv6; the packet begins with an IPv6 header.
    IPV6 = 229,

    NFLOG = 239,

    //  Upper-layer protocol saves from Wireshark
    WIRESHARK_UPPER_PDU = 252,
    LINUX_SLL2 = 276,
}
}

impl Linktype {
    /// Human-readable description of the link type, if known
    pub fn description(self) -> Option<&'static str> {
        let s = match self {
            Linktype::NULL => "BSD loopback encapsulation",
            Linktype::ETHERNET => "IEEE 802.3 Ethernet",
            Linktype::IEEE802_5 => "IEEE 802.5 Token Ring",
            Linktype::PPP => "Point-to-Point Protocol",
            Linktype::FDDI => "FDDI, as specified by ANSI INCITS 239-1994",
            Linktype::RAW => "Raw IP",
            Linktype::IEEE802_11 => "IEEE 802.11 wireless LAN",
            Linktype::LOOP => "OpenBSD loopback encapsulation",
            Linktype::LINUX_SLL => "Linux \"cooked\" capture encapsulation",
            Linktype::IEEE802_11_RADIOTAP => "Radiotap link-layer information followed by an 802.11 header",
            Linktype::BLUETOOTH_HCI_H4 => "Bluetooth HCI UART transport layer",
            Linktype::USB_LINUX => "USB packets, beginning with a Linux USB header",
            Linktype::USB_LINUX_MMAPPED => "USB packets, beginning with a Linux USB header (memory-mapped)",
            Linktype::IPV4 => "Raw IPv4",
            Linktype::IPV6 => "Raw IPv6",
            Linktype::NFLOG => "Linux netlink NETLINK NFLOG socket log messages",
            Linktype::WIRESHARK_UPPER_PDU => "Upper-layer protocol saves from Wireshark",
            Linktype::LINUX_SLL2 => "Linux \"cooked\" capture encapsulation v2",
            _ => return None,
        };
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linktype_names() {
        assert_eq!(Linktype(1), Linktype::ETHERNET);
        assert_eq!(format!("{}", Linktype::USB_LINUX_MMAPPED), "USB_LINUX_MMAPPED");
        assert_eq!(Linktype::ETHERNET.description(), Some("IEEE 802.3 Ethernet"));
        assert_eq!(Linktype(0x1234).description(), None);
    }
}
