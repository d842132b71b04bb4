//! Layered frame parsing: Ethernet -> (VLAN) -> IPv4/IPv6 -> UDP.
//!
//! Every header type borrows from the capture buffer; nothing is copied
//! until the UDP payload reaches the wire decoder. Non-IP and non-UDP
//! frames still parse into a `FrameView` (with `udp == None`) so the
//! caller can count and skip them.

pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod udp;

use std::fmt;
use std::net::IpAddr;

/// EtherType values this tool cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    Arp,
    VlanTagged,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x86DD => EtherType::Ipv6,
            0x0806 => EtherType::Arp,
            0x8100 => EtherType::VlanTagged,
            other => EtherType::Unknown(other),
        }
    }
}

impl EtherType {
    pub fn as_u16(&self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Ipv6 => 0x86DD,
            EtherType::Arp => 0x0806,
            EtherType::VlanTagged => 0x8100,
            EtherType::Unknown(v) => *v,
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Ipv6 => write!(f, "IPv6"),
            EtherType::Arp => write!(f, "ARP"),
            EtherType::VlanTagged => write!(f, "802.1Q VLAN"),
            EtherType::Unknown(v) => write!(f, "Unknown(0x{:04x})", v),
        }
    }
}

/// IP protocol numbers. Only UDP is dissected further, but named
/// variants keep the skipped-frame log lines readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Tcp,
    Udp,
    Icmp,
    Unknown(u8),
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        match value {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Unknown(other),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::Tcp => write!(f, "TCP"),
            IpProtocol::Udp => write!(f, "UDP"),
            IpProtocol::Icmp => write!(f, "ICMP"),
            IpProtocol::Unknown(v) => write!(f, "Proto({})", v),
        }
    }
}

/// Errors from frame parsing.
#[derive(Debug)]
pub enum FrameError {
    /// The buffer ends before the header does.
    Truncated { expected: usize, actual: usize },
    /// Header fields are structurally invalid.
    Malformed(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated { expected, actual } => {
                write!(f, "frame truncated: need {} bytes, got {}", expected, actual)
            }
            FrameError::Malformed(msg) => write!(f, "malformed header: {}", msg),
        }
    }
}

impl std::error::Error for FrameError {}

/// 802.1Q tag fields.
#[derive(Debug, Clone, Copy)]
pub struct VlanTag {
    pub priority: u8,
    pub dei: bool,
    pub vlan_id: u16,
}

/// Network layer header, either version.
#[derive(Debug)]
pub enum IpHeader<'a> {
    V4(ipv4::Ipv4Header<'a>),
    V6(ipv6::Ipv6Header<'a>),
}

impl<'a> IpHeader<'a> {
    pub fn src_ip(&self) -> IpAddr {
        match self {
            IpHeader::V4(h) => IpAddr::V4(h.src_addr()),
            IpHeader::V6(h) => IpAddr::V6(h.src_addr()),
        }
    }

    pub fn dst_ip(&self) -> IpAddr {
        match self {
            IpHeader::V4(h) => IpAddr::V4(h.dst_addr()),
            IpHeader::V6(h) => IpAddr::V6(h.dst_addr()),
        }
    }

    pub fn protocol(&self) -> IpProtocol {
        match self {
            IpHeader::V4(h) => h.protocol(),
            IpHeader::V6(h) => h.next_header(),
        }
    }
}

/// A parsed frame. `payload` is the UDP payload when `udp` is present,
/// otherwise whatever bytes followed the deepest parsed header.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub ethernet: ethernet::EthernetFrame<'a>,
    pub vlan: Option<VlanTag>,
    pub network: Option<IpHeader<'a>>,
    pub udp: Option<udp::UdpHeader<'a>>,
    pub payload: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Source and destination (ip, port) when this is a UDP/IP frame.
    pub fn udp_endpoints(&self) -> Option<(IpAddr, u16, IpAddr, u16)> {
        let net = self.network.as_ref()?;
        let udp = self.udp.as_ref()?;
        Some((net.src_ip(), udp.src_port(), net.dst_ip(), udp.dst_port()))
    }
}

/// Parse a raw captured frame down to the UDP payload.
pub fn parse_frame(data: &[u8]) -> Result<FrameView<'_>, FrameError> {
    let eth = ethernet::EthernetFrame::parse(data)?;
    let mut remaining = eth.payload();
    let mut ether_type = eth.ether_type();
    let mut vlan = None;

    if ether_type == EtherType::VlanTagged {
        if remaining.len() < 4 {
            return Err(FrameError::Truncated {
                expected: 4,
                actual: remaining.len(),
            });
        }
        let tci = u16::from_be_bytes([remaining[0], remaining[1]]);
        vlan = Some(VlanTag {
            priority: (tci >> 13) as u8,
            dei: (tci >> 12) & 1 == 1,
            vlan_id: tci & 0x0FFF,
        });
        ether_type = EtherType::from(u16::from_be_bytes([remaining[2], remaining[3]]));
        remaining = &remaining[4..];
    }

    let (network, l4_data, ip_proto) = match ether_type {
        EtherType::Ipv4 => {
            let hdr = ipv4::Ipv4Header::parse(remaining)?;
            // A non-first fragment carries no UDP header, and a first
            // fragment's payload is incomplete. Skip transport parsing
            // for both.
            let proto = if hdr.fragment_offset() == 0 && !hdr.more_fragments() {
                Some(hdr.protocol())
            } else {
                None
            };
            let payload = hdr.payload();
            (Some(IpHeader::V4(hdr)), payload, proto)
        }
        EtherType::Ipv6 => {
            let hdr = ipv6::Ipv6Header::parse(remaining)?;
            let proto = hdr.next_header();
            let payload = hdr.payload();
            (Some(IpHeader::V6(hdr)), payload, Some(proto))
        }
        _ => (None, remaining, None),
    };

    let (udp, payload) = match ip_proto {
        Some(IpProtocol::Udp) => match udp::UdpHeader::parse(l4_data) {
            Ok(hdr) => {
                let payload = hdr.payload();
                (Some(hdr), payload)
            }
            Err(_) => (None, l4_data),
        },
        _ => (None, l4_data),
    };

    Ok(FrameView {
        ethernet: eth,
        vlan,
        network,
        udp,
        payload,
    })
}
