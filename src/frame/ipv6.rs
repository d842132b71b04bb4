//! IPv6 fixed header view (40 bytes).
//!
//! Extension headers are not walked; when present, the next-header value
//! will not be UDP and the frame is simply not dissected further.

use super::{FrameError, IpProtocol};
use std::fmt;
use std::net::Ipv6Addr;

pub const IPV6_HEADER_LEN: usize = 40;

/// Borrowed view over an IPv6 fixed header.
#[derive(Debug)]
pub struct Ipv6Header<'a> {
    data: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, FrameError> {
        if data.len() < IPV6_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: IPV6_HEADER_LEN,
                actual: data.len(),
            });
        }
        let version = data[0] >> 4;
        if version != 6 {
            return Err(FrameError::Malformed(format!(
                "IP version {} where 6 expected",
                version
            )));
        }
        Ok(Ipv6Header { data })
    }

    /// Length of everything after the fixed header.
    #[inline]
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    #[inline]
    pub fn next_header(&self) -> IpProtocol {
        IpProtocol::from(self.data[6])
    }

    #[inline]
    pub fn next_header_raw(&self) -> u8 {
        self.data[6]
    }

    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.data[7]
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[8..24]);
        Ipv6Addr::from(octets)
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[24..40]);
        Ipv6Addr::from(octets)
    }

    /// Payload clamped to the declared payload length.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let declared = self.payload_length() as usize;
        let available = self.data.len() - IPV6_HEADER_LEN;
        let end = IPV6_HEADER_LEN + declared.min(available);
        &self.data[IPV6_HEADER_LEN..end]
    }
}

impl<'a> fmt::Display for Ipv6Header<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} next_hdr={} hop_limit={} len={}",
            self.src_addr(),
            self.dst_addr(),
            self.next_header(),
            self.hop_limit(),
            self.payload_length()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp_ipv6_bytes() -> Vec<u8> {
        let mut pkt = vec![0u8; 40];
        pkt[0] = 0x60;
        pkt[4..6].copy_from_slice(&12u16.to_be_bytes());
        pkt[6] = 17; // UDP
        pkt[7] = 64;
        pkt[23] = 1; // src ::1
        pkt[39] = 2; // dst ::2
        pkt.extend_from_slice(&[0xBB; 12]);
        pkt
    }

    #[test]
    fn parses_fixed_header() {
        let pkt = udp_ipv6_bytes();
        let hdr = Ipv6Header::parse(&pkt).unwrap();
        assert_eq!(hdr.next_header(), IpProtocol::Udp);
        assert_eq!(hdr.hop_limit(), 64);
        assert_eq!(hdr.payload_length(), 12);
        assert_eq!(hdr.src_addr(), Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1));
        assert_eq!(hdr.dst_addr(), Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 2));
        assert_eq!(hdr.payload().len(), 12);
    }

    #[test]
    fn rejects_ipv4_version_nibble() {
        let mut pkt = udp_ipv6_bytes();
        pkt[0] = 0x45;
        assert!(Ipv6Header::parse(&pkt).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(Ipv6Header::parse(&[0x60; 39]).is_err());
    }
}
