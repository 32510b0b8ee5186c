//! Ethernet/IPv4/TCP/UDP dissector.
//!
//! Header fields are read through pnet packet views. Every length field is
//! untrusted, so payload offsets are computed here and checked against the
//! captured bytes before they are recorded.

use macaddr::MacAddr6;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;

use crate::domain::{
    Diagnostic, DissectedHeader, Frame, Ipv4Endpoints, Layer, PayloadSpan, ProtocolClass,
    TransportInfo,
};

/// Ethernet II header: two MACs and the ethertype.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// IPv4 header without options.
const IPV4_MIN_HEADER_LEN: usize = 20;

/// TCP header without options.
const TCP_MIN_HEADER_LEN: usize = 20;

const UDP_HEADER_LEN: usize = 8;

/// Classifies frames and locates TCP/UDP payloads.
///
/// Dissection never fails: anything inconsistent is recorded as a
/// `Diagnostic` on the returned header and the payload shrinks to zero.
pub struct EthernetDissector;

impl EthernetDissector {
    pub fn new() -> Self {
        Self
    }

    /// Dissect one captured frame.
    pub fn dissect(&self, frame: &Frame) -> DissectedHeader {
        let data = frame.as_bytes();

        let Some(ethernet) = EthernetPacket::new(data) else {
            let mut header = DissectedHeader::link_only(
                MacAddr6::nil(),
                MacAddr6::nil(),
                0,
                ProtocolClass::OtherNonIpv4,
            );
            header.diagnostics.push(Diagnostic::Truncated {
                layer: Layer::Link,
                needed: ETHERNET_HEADER_LEN,
                available: data.len(),
            });
            return header;
        };

        let ethertype = ethernet.get_ethertype();
        let mut header = DissectedHeader::link_only(
            MacAddr6::from(ethernet.get_source().octets()),
            MacAddr6::from(ethernet.get_destination().octets()),
            ethertype.0,
            ProtocolClass::OtherNonIpv4,
        );

        match ethertype {
            EtherTypes::Ipv4 => self.dissect_ipv4(&data[ETHERNET_HEADER_LEN..], &mut header),
            // ARP is counted, never decoded.
            EtherTypes::Arp => header.class = ProtocolClass::Arp,
            _ => {}
        }

        header
    }

    fn dissect_ipv4(&self, ip: &[u8], header: &mut DissectedHeader) {
        header.class = ProtocolClass::OtherIpv4;

        let Some(&first) = ip.first() else {
            header.diagnostics.push(Diagnostic::Truncated {
                layer: Layer::Network,
                needed: IPV4_MIN_HEADER_LEN,
                available: 0,
            });
            return;
        };

        let version = first >> 4;
        header.ip_version = Some(version);
        if version != 4 {
            return;
        }

        let Some(ipv4) = Ipv4Packet::new(ip) else {
            header.diagnostics.push(Diagnostic::Truncated {
                layer: Layer::Network,
                needed: IPV4_MIN_HEADER_LEN,
                available: ip.len(),
            });
            return;
        };

        header.ipv4 = Some(Ipv4Endpoints {
            source: ipv4.get_source(),
            destination: ipv4.get_destination(),
        });
        header.class = ProtocolClass::from_ip_protocol(ipv4.get_next_level_protocol().0);

        let ip_header_len = ipv4.get_header_length() as usize * 4;
        if ip_header_len < IPV4_MIN_HEADER_LEN || ip_header_len > ip.len() {
            header.diagnostics.push(Diagnostic::HeaderOverrun {
                layer: Layer::Network,
                header_len: ip_header_len,
                available: ip.len(),
            });
            return;
        }

        let captured = (ip.len() - ip_header_len) as i64;
        let declared = ipv4.get_total_length() as i64 - ip_header_len as i64;
        if captured != declared {
            header
                .diagnostics
                .push(Diagnostic::LengthMismatch { declared, captured });
        }

        let segment = &ip[ip_header_len..];
        let base = ETHERNET_HEADER_LEN + ip_header_len;

        header.transport = match header.class {
            ProtocolClass::Tcp => dissect_tcp(segment, base, &mut header.diagnostics),
            ProtocolClass::Udp => dissect_udp(segment, base, &mut header.diagnostics),
            _ => None,
        };
    }
}

impl Default for EthernetDissector {
    fn default() -> Self {
        Self::new()
    }
}

fn dissect_tcp(
    segment: &[u8],
    base: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TransportInfo> {
    let Some(tcp) = TcpPacket::new(segment) else {
        diagnostics.push(Diagnostic::Truncated {
            layer: Layer::Transport,
            needed: TCP_MIN_HEADER_LEN,
            available: segment.len(),
        });
        return None;
    };

    let header_len = tcp.get_data_offset() as usize * 4;
    Some(TransportInfo {
        source_port: tcp.get_source(),
        destination_port: tcp.get_destination(),
        payload: payload_span(segment.len(), header_len, TCP_MIN_HEADER_LEN, base, diagnostics),
    })
}

fn dissect_udp(
    segment: &[u8],
    base: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TransportInfo> {
    let Some(udp) = UdpPacket::new(segment) else {
        diagnostics.push(Diagnostic::Truncated {
            layer: Layer::Transport,
            needed: UDP_HEADER_LEN,
            available: segment.len(),
        });
        return None;
    };

    Some(TransportInfo {
        source_port: udp.get_source(),
        destination_port: udp.get_destination(),
        payload: payload_span(segment.len(), UDP_HEADER_LEN, UDP_HEADER_LEN, base, diagnostics),
    })
}

/// Locate the payload behind a transport header of `header_len` bytes.
///
/// The payload runs to the end of the captured bytes. An out-of-range header
/// length yields an empty span at the end of the frame.
fn payload_span(
    segment_len: usize,
    header_len: usize,
    min_header_len: usize,
    base: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> PayloadSpan {
    if header_len < min_header_len || header_len > segment_len {
        diagnostics.push(Diagnostic::HeaderOverrun {
            layer: Layer::Transport,
            header_len,
            available: segment_len,
        });
        return PayloadSpan::empty_at(base + segment_len);
    }

    PayloadSpan {
        offset: base + header_len,
        len: segment_len - header_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const SRC_MAC: [u8; 6] = [0x00, 0x1b, 0x21, 0x0a, 0x0b, 0x0c];
    const DST_MAC: [u8; 6] = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff];

    fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + payload.len());
        frame.extend_from_slice(&DST_MAC);
        frame.extend_from_slice(&SRC_MAC);
        frame.extend_from_slice(&ethertype.to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    /// IPv4 header with `ihl` words (options zero-filled) followed by `payload`.
    /// `total_len` of `None` writes the consistent value.
    fn ipv4(protocol: u8, ihl: u8, total_len: Option<u16>, payload: &[u8]) -> Vec<u8> {
        let header_len = (ihl as usize * 4).max(IPV4_MIN_HEADER_LEN);
        let mut packet = vec![0u8; header_len];
        packet[0] = 0x40 | (ihl & 0x0f);
        let total = total_len.unwrap_or((ihl as usize * 4 + payload.len()) as u16);
        packet[2..4].copy_from_slice(&total.to_be_bytes());
        packet[8] = 64;
        packet[9] = protocol;
        packet[12..16].copy_from_slice(&[192, 168, 1, 10]);
        packet[16..20].copy_from_slice(&[10, 0, 0, 1]);
        packet.extend_from_slice(payload);
        packet
    }

    fn tcp(source: u16, destination: u16, data_offset: u8, payload: &[u8]) -> Vec<u8> {
        let header_len = (data_offset as usize * 4).max(TCP_MIN_HEADER_LEN);
        let mut segment = vec![0u8; header_len];
        segment[0..2].copy_from_slice(&source.to_be_bytes());
        segment[2..4].copy_from_slice(&destination.to_be_bytes());
        segment[12] = data_offset << 4;
        segment.extend_from_slice(payload);
        segment
    }

    fn udp(source: u16, destination: u16, payload: &[u8]) -> Vec<u8> {
        let mut datagram = vec![0u8; UDP_HEADER_LEN];
        datagram[0..2].copy_from_slice(&source.to_be_bytes());
        datagram[2..4].copy_from_slice(&destination.to_be_bytes());
        datagram[4..6].copy_from_slice(&((UDP_HEADER_LEN + payload.len()) as u16).to_be_bytes());
        datagram.extend_from_slice(payload);
        datagram
    }

    fn dissect(bytes: Vec<u8>) -> (Frame, DissectedHeader) {
        let frame = Frame::from(bytes);
        let header = EthernetDissector::new().dissect(&frame);
        (frame, header)
    }

    mod classification {
        use super::*;

        #[test]
        fn udp_frame() {
            let (frame, header) = dissect(ethernet(
                0x0800,
                &ipv4(17, 5, None, &udp(5353, 53, b"hello dns")),
            ));

            assert_eq!(header.class, ProtocolClass::Udp);
            assert_eq!(header.source_mac, MacAddr6::from(SRC_MAC));
            assert_eq!(header.destination_mac, MacAddr6::from(DST_MAC));
            assert_eq!(header.ip_version, Some(4));
            assert_eq!(
                header.ipv4,
                Some(Ipv4Endpoints {
                    source: Ipv4Addr::new(192, 168, 1, 10),
                    destination: Ipv4Addr::new(10, 0, 0, 1),
                })
            );

            let transport = header.transport.unwrap();
            assert_eq!(transport.source_port, 5353);
            assert_eq!(transport.destination_port, 53);
            assert_eq!(header.payload(&frame), b"hello dns");
            assert!(header.is_clean());
        }

        #[test]
        fn tcp_frame_with_options() {
            let (frame, header) = dissect(ethernet(
                0x0800,
                &ipv4(6, 5, None, &tcp(443, 51000, 8, b"GET / HTTP/1.1")),
            ));

            assert_eq!(header.class, ProtocolClass::Tcp);
            let transport = header.transport.unwrap();
            assert_eq!(transport.source_port, 443);
            assert_eq!(transport.destination_port, 51000);
            assert_eq!(transport.payload.offset, 14 + 20 + 32);
            assert_eq!(header.payload(&frame), b"GET / HTTP/1.1");
            assert!(header.is_clean());
        }

        #[test]
        fn ip_options_shift_payload() {
            let (frame, header) = dissect(ethernet(
                0x0800,
                &ipv4(17, 7, None, &udp(1, 2, b"xyz")),
            ));

            assert_eq!(header.transport.unwrap().payload.offset, 14 + 28 + 8);
            assert_eq!(header.payload(&frame), b"xyz");
            assert!(header.is_clean());
        }

        #[test]
        fn other_ip_protocols() {
            for (protocol, class) in [
                (1, ProtocolClass::Icmp),
                (2, ProtocolClass::Igmp),
                (89, ProtocolClass::Ospf),
                (47, ProtocolClass::OtherIpv4),
            ] {
                let (_, header) = dissect(ethernet(0x0800, &ipv4(protocol, 5, None, &[0u8; 16])));
                assert_eq!(header.class, class);
                assert!(header.ipv4.is_some());
                assert!(header.transport.is_none());
                assert_eq!(header.payload_len(), 0);
            }
        }

        #[test]
        fn arp_is_never_ip_dissected() {
            // The ARP body looks like an IPv4 header with a bogus length.
            let body = ipv4(6, 15, Some(9999), &[]);
            let (_, header) = dissect(ethernet(0x0806, &body));

            assert_eq!(header.class, ProtocolClass::Arp);
            assert_eq!(header.ethertype, 0x0806);
            assert!(header.ip_version.is_none());
            assert!(header.ipv4.is_none());
            assert!(header.transport.is_none());
            assert!(header.is_clean());
        }

        #[test]
        fn non_ipv4_version_is_other_ipv4() {
            let mut body = ipv4(17, 5, None, &udp(1, 2, b"data"));
            body[0] = 0x65;
            let (_, header) = dissect(ethernet(0x0800, &body));

            assert_eq!(header.class, ProtocolClass::OtherIpv4);
            assert_eq!(header.ip_version, Some(6));
            assert!(header.ipv4.is_none());
            assert!(header.transport.is_none());
        }

        #[test]
        fn other_ethertype_is_non_ipv4() {
            let (_, header) = dissect(ethernet(0x86dd, &[0x60; 40]));

            assert_eq!(header.class, ProtocolClass::OtherNonIpv4);
            assert_eq!(header.ethertype, 0x86dd);
            assert!(header.ip_version.is_none());
            assert!(header.is_clean());
        }
    }

    mod malformed {
        use super::*;

        #[test]
        fn length_mismatch_gives_one_diagnostic() {
            let (frame, header) = dissect(ethernet(
                0x0800,
                &ipv4(17, 5, Some(400), &udp(1000, 2000, b"abcd")),
            ));

            assert_eq!(header.class, ProtocolClass::Udp);
            assert_eq!(
                header.diagnostics,
                vec![Diagnostic::LengthMismatch {
                    declared: 380,
                    captured: 12,
                }]
            );
            // The captured bytes still define the payload.
            assert_eq!(header.payload(&frame), b"abcd");
        }

        #[test]
        fn total_length_smaller_than_header() {
            let (_, header) = dissect(ethernet(0x0800, &ipv4(1, 5, Some(4), &[0u8; 8])));

            assert_eq!(header.class, ProtocolClass::Icmp);
            assert_eq!(
                header.diagnostics,
                vec![Diagnostic::LengthMismatch {
                    declared: -16,
                    captured: 8,
                }]
            );
        }

        #[test]
        fn ip_header_length_past_frame() {
            let mut body = ipv4(6, 5, None, &[0u8; 10]);
            body[0] = 0x4f;
            let (frame, header) = dissect(ethernet(0x0800, &body));

            assert_eq!(header.class, ProtocolClass::Tcp);
            assert!(header.transport.is_none());
            assert_eq!(header.payload_len(), 0);
            assert!(header.payload(&frame).is_empty());
            assert_eq!(
                header.diagnostics,
                vec![Diagnostic::HeaderOverrun {
                    layer: Layer::Network,
                    header_len: 60,
                    available: 30,
                }]
            );
        }

        #[test]
        fn ip_header_length_below_minimum() {
            let mut body = ipv4(17, 5, None, &udp(1, 2, b"zz"));
            body[0] = 0x42;
            let (_, header) = dissect(ethernet(0x0800, &body));

            assert_eq!(header.class, ProtocolClass::Udp);
            assert_eq!(header.payload_len(), 0);
            assert!(matches!(
                header.diagnostics.as_slice(),
                [Diagnostic::HeaderOverrun {
                    layer: Layer::Network,
                    header_len: 8,
                    ..
                }]
            ));
        }

        #[test]
        fn tcp_data_offset_past_segment() {
            let mut segment = tcp(22, 40000, 5, &[0u8; 10]);
            segment[12] = 0xf0;
            let (frame, header) = dissect(ethernet(0x0800, &ipv4(6, 5, None, &segment)));

            assert_eq!(header.class, ProtocolClass::Tcp);
            let transport = header.transport.unwrap();
            assert_eq!(transport.source_port, 22);
            assert_eq!(transport.destination_port, 40000);
            assert_eq!(transport.payload.len, 0);
            assert!(header.payload(&frame).is_empty());
            assert_eq!(
                header.diagnostics,
                vec![Diagnostic::HeaderOverrun {
                    layer: Layer::Transport,
                    header_len: 60,
                    available: 30,
                }]
            );
        }

        #[test]
        fn truncated_transport_headers() {
            let (_, header) = dissect(ethernet(0x0800, &ipv4(6, 5, None, &[0u8; 12])));
            assert_eq!(header.class, ProtocolClass::Tcp);
            assert!(header.transport.is_none());
            assert!(matches!(
                header.diagnostics.as_slice(),
                [Diagnostic::Truncated {
                    layer: Layer::Transport,
                    needed: 20,
                    available: 12,
                }]
            ));

            let (_, header) = dissect(ethernet(0x0800, &ipv4(17, 5, None, &[0u8; 5])));
            assert_eq!(header.class, ProtocolClass::Udp);
            assert!(header.transport.is_none());
        }

        #[test]
        fn short_ip_header() {
            let (_, header) = dissect(ethernet(0x0800, &[0x45, 0, 0, 40, 0, 0]));

            assert_eq!(header.class, ProtocolClass::OtherIpv4);
            assert_eq!(header.ip_version, Some(4));
            assert!(header.ipv4.is_none());
            assert!(matches!(
                header.diagnostics.as_slice(),
                [Diagnostic::Truncated {
                    layer: Layer::Network,
                    ..
                }]
            ));

            let (_, header) = dissect(ethernet(0x0800, &[]));
            assert_eq!(header.class, ProtocolClass::OtherIpv4);
            assert!(header.ip_version.is_none());
        }

        #[test]
        fn runt_frame() {
            let (_, header) = dissect(vec![0xaa; 9]);

            assert_eq!(header.class, ProtocolClass::OtherNonIpv4);
            assert_eq!(header.source_mac, MacAddr6::nil());
            assert_eq!(
                header.diagnostics,
                vec![Diagnostic::Truncated {
                    layer: Layer::Link,
                    needed: 14,
                    available: 9,
                }]
            );
        }

        #[test]
        fn payload_length_is_never_negative() {
            // Sweep attacker-controlled length fields against short captures.
            for ihl in 0u8..16 {
                for data_offset in 0u8..16 {
                    for extra in [0usize, 3, 20, 64] {
                        let mut segment = tcp(1, 2, 5, &vec![0x41; extra]);
                        segment[12] = data_offset << 4;
                        let body = ipv4(6, ihl, None, &segment);

                        let (frame, header) = dissect(ethernet(0x0800, &body));
                        assert_eq!(header.class, ProtocolClass::Tcp);

                        let ip_len = ihl as usize * 4;
                        let tcp_len = data_offset as usize * 4;
                        let available = frame.len() as i64
                            - ETHERNET_HEADER_LEN as i64
                            - ip_len as i64
                            - tcp_len as i64;
                        let well_formed = ihl >= 5 && data_offset >= 5 && available >= 0;

                        if well_formed {
                            assert_eq!(header.payload_len() as i64, available);
                        } else {
                            assert_eq!(header.payload_len(), 0);
                        }
                        assert_eq!(header.payload(&frame).len(), header.payload_len());
                    }
                }
            }
        }
    }
}
