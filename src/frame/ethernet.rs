//! Ethernet II header view.
//!
//! Layout: destination MAC (6), source MAC (6), EtherType (2). VLAN tags
//! are handled by the caller in `frame::parse_frame`.

use super::{EtherType, FrameError};
use std::fmt;

/// Ethernet header length without VLAN tags.
pub const ETH_HEADER_LEN: usize = 14;

/// Borrowed view over an Ethernet II header.
#[derive(Debug)]
pub struct EthernetFrame<'a> {
    data: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, FrameError> {
        if data.len() < ETH_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: ETH_HEADER_LEN,
                actual: data.len(),
            });
        }
        Ok(EthernetFrame { data })
    }

    #[inline]
    pub fn dst_mac(&self) -> &'a [u8] {
        &self.data[0..6]
    }

    #[inline]
    pub fn src_mac(&self) -> &'a [u8] {
        &self.data[6..12]
    }

    #[inline]
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(self.ether_type_raw())
    }

    #[inline]
    pub fn ether_type_raw(&self) -> u16 {
        u16::from_be_bytes([self.data[12], self.data[13]])
    }

    /// Bytes after the 14-byte header.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[ETH_HEADER_LEN..]
    }
}

/// `aa:bb:cc:dd:ee:ff` rendering of a 6-byte MAC slice.
pub fn format_mac(mac: &[u8]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

impl<'a> fmt::Display for EthernetFrame<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            format_mac(self.src_mac()),
            format_mac(self.dst_mac()),
            self.ether_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_payload() {
        let frame = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst (broadcast)
            0x02, 0x00, 0x00, 0xaa, 0xbb, 0xcc, // src
            0x08, 0x00, // IPv4
            0xde, 0xad, // payload
        ];
        let eth = EthernetFrame::parse(&frame).unwrap();
        assert_eq!(eth.ether_type(), EtherType::Ipv4);
        assert_eq!(eth.src_mac(), &[0x02, 0x00, 0x00, 0xaa, 0xbb, 0xcc]);
        assert_eq!(eth.payload(), &[0xde, 0xad]);
    }

    #[test]
    fn thirteen_bytes_is_too_short() {
        assert!(EthernetFrame::parse(&[0u8; 13]).is_err());
    }

    #[test]
    fn mac_formatting() {
        assert_eq!(
            format_mac(&[0x02, 0x00, 0x00, 0xaa, 0xbb, 0xcc]),
            "02:00:00:aa:bb:cc"
        );
    }
}
