//! IPv4 header view (RFC 791).
//!
//! Validates version and IHL on parse; all other fields are read lazily.
//! The payload accessor clamps to `total_length` so Ethernet trailer
//! padding never leaks into the UDP layer.

use super::{FrameError, IpProtocol};
use std::fmt;
use std::net::Ipv4Addr;

/// Header length with no options (IHL = 5).
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// Borrowed view over an IPv4 header.
#[derive(Debug)]
pub struct Ipv4Header<'a> {
    data: &'a [u8],
    header_len: usize,
}

impl<'a> Ipv4Header<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, FrameError> {
        if data.len() < IPV4_MIN_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: IPV4_MIN_HEADER_LEN,
                actual: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(FrameError::Malformed(format!(
                "IP version {} where 4 expected",
                version
            )));
        }

        let header_len = ((data[0] & 0x0F) as usize) * 4;
        if header_len < IPV4_MIN_HEADER_LEN {
            return Err(FrameError::Malformed(format!(
                "IHL {} below minimum of 5",
                data[0] & 0x0F
            )));
        }
        if data.len() < header_len {
            return Err(FrameError::Truncated {
                expected: header_len,
                actual: data.len(),
            });
        }

        Ok(Ipv4Header { data, header_len })
    }

    #[inline]
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Header plus payload length in bytes, as declared by the sender.
    #[inline]
    pub fn total_length(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    #[inline]
    pub fn identification(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    #[inline]
    pub fn dont_fragment(&self) -> bool {
        (self.data[6] >> 6) & 1 == 1
    }

    #[inline]
    pub fn more_fragments(&self) -> bool {
        (self.data[6] >> 5) & 1 == 1
    }

    /// Fragment offset in 8-byte units. Non-zero means this is not the
    /// first fragment and carries no UDP header.
    #[inline]
    pub fn fragment_offset(&self) -> u16 {
        u16::from_be_bytes([self.data[6] & 0x1F, self.data[7]])
    }

    #[inline]
    pub fn ttl(&self) -> u8 {
        self.data[8]
    }

    #[inline]
    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[9])
    }

    #[inline]
    pub fn protocol_raw(&self) -> u8 {
        self.data[9]
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[10], self.data[11]])
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[12], self.data[13], self.data[14], self.data[15])
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[16], self.data[17], self.data[18], self.data[19])
    }

    /// Payload clamped to the declared total length.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let declared = (self.total_length() as usize).saturating_sub(self.header_len);
        let available = self.data.len() - self.header_len;
        let end = self.header_len + declared.min(available);
        &self.data[self.header_len..end]
    }

    /// One's-complement sum over the header; valid when it folds to 0xFFFF.
    pub fn verify_checksum(&self) -> bool {
        let mut sum: u32 = 0;
        for i in (0..self.header_len).step_by(2) {
            sum += u16::from_be_bytes([self.data[i], self.data[i + 1]]) as u32;
        }
        while sum >> 16 != 0 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        sum == 0xFFFF
    }
}

impl<'a> fmt::Display for Ipv4Header<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} proto={} ttl={} len={}",
            self.src_addr(),
            self.dst_addr(),
            self.protocol(),
            self.ttl(),
            self.total_length()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp_ipv4_bytes() -> Vec<u8> {
        let mut pkt = vec![0u8; 20];
        pkt[0] = 0x45; // version 4, IHL 5
        pkt[2..4].copy_from_slice(&36u16.to_be_bytes()); // 20 hdr + 16 payload
        pkt[4..6].copy_from_slice(&0x1234u16.to_be_bytes());
        pkt[6] = 0x40; // DF
        pkt[8] = 64;
        pkt[9] = 17; // UDP
        pkt[12..16].copy_from_slice(&[192, 168, 1, 7]);
        pkt[16..20].copy_from_slice(&[192, 168, 1, 1]);
        pkt.extend_from_slice(&[0xAA; 16]);
        pkt
    }

    #[test]
    fn parses_udp_header_fields() {
        let pkt = udp_ipv4_bytes();
        let hdr = Ipv4Header::parse(&pkt).unwrap();
        assert_eq!(hdr.header_len(), 20);
        assert_eq!(hdr.total_length(), 36);
        assert_eq!(hdr.protocol(), IpProtocol::Udp);
        assert_eq!(hdr.ttl(), 64);
        assert!(hdr.dont_fragment());
        assert_eq!(hdr.fragment_offset(), 0);
        assert_eq!(hdr.src_addr(), Ipv4Addr::new(192, 168, 1, 7));
        assert_eq!(hdr.dst_addr(), Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hdr.payload().len(), 16);
    }

    #[test]
    fn payload_ignores_ethernet_padding() {
        let mut pkt = udp_ipv4_bytes();
        // Ethernet minimum-size padding past the declared total length.
        pkt.extend_from_slice(&[0x00; 10]);
        let hdr = Ipv4Header::parse(&pkt).unwrap();
        assert_eq!(hdr.payload().len(), 16);
    }

    #[test]
    fn rejects_wrong_version() {
        let mut pkt = udp_ipv4_bytes();
        pkt[0] = 0x65;
        assert!(Ipv4Header::parse(&pkt).is_err());
    }

    #[test]
    fn rejects_bad_ihl() {
        let mut pkt = udp_ipv4_bytes();
        pkt[0] = 0x42; // IHL 2
        assert!(Ipv4Header::parse(&pkt).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(Ipv4Header::parse(&[0x45; 19]).is_err());
    }
}
