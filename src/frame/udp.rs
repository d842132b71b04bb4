//! UDP header view (8 bytes: src port, dst port, length, checksum).

use super::FrameError;
use std::fmt;

pub const UDP_HEADER_LEN: usize = 8;

/// Borrowed view over a UDP header.
#[derive(Debug)]
pub struct UdpHeader<'a> {
    data: &'a [u8],
}

impl<'a> UdpHeader<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, FrameError> {
        if data.len() < UDP_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: UDP_HEADER_LEN,
                actual: data.len(),
            });
        }
        Ok(UdpHeader { data })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Declared datagram length, header included.
    #[inline]
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[6], self.data[7]])
    }

    /// Payload clamped to the declared length. The wire decoder must only
    /// ever see bytes the sender actually declared.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let declared = (self.length() as usize).saturating_sub(UDP_HEADER_LEN);
        let available = self.data.len() - UDP_HEADER_LEN;
        let end = UDP_HEADER_LEN + declared.min(available);
        &self.data[UDP_HEADER_LEN..end]
    }
}

impl<'a> fmt::Display for UdpHeader<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{} -> :{} len={}",
            self.src_port(),
            self.dst_port(),
            self.length()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp_bytes(src: u16, dst: u16, payload: &[u8]) -> Vec<u8> {
        let mut pkt = Vec::with_capacity(8 + payload.len());
        pkt.extend_from_slice(&src.to_be_bytes());
        pkt.extend_from_slice(&dst.to_be_bytes());
        pkt.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
        pkt.extend_from_slice(&[0, 0]);
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn parses_ports_and_payload() {
        let pkt = udp_bytes(54000, 2016, &[1, 2, 3, 4]);
        let hdr = UdpHeader::parse(&pkt).unwrap();
        assert_eq!(hdr.src_port(), 54000);
        assert_eq!(hdr.dst_port(), 2016);
        assert_eq!(hdr.length(), 12);
        assert_eq!(hdr.payload(), &[1, 2, 3, 4]);
    }

    #[test]
    fn payload_clamped_to_declared_length() {
        let mut pkt = udp_bytes(1, 2, &[9; 4]);
        pkt.extend_from_slice(&[0; 6]); // trailing padding
        let hdr = UdpHeader::parse(&pkt).unwrap();
        assert_eq!(hdr.payload().len(), 4);
    }

    #[test]
    fn rejects_seven_bytes() {
        assert!(UdpHeader::parse(&[0u8; 7]).is_err());
    }
}
