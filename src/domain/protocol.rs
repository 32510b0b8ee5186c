//! Protocol classification buckets used for statistics.

/// IP protocol numbers we classify on.
pub mod ip_protocols {
    pub const ICMP: u8 = 1;
    pub const IGMP: u8 = 2;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const OSPF: u8 = 89;
}

/// The closed set of classes every frame falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolClass {
    Tcp,
    Udp,
    Icmp,
    Igmp,
    Ospf,
    Arp,
    /// IPv4 ethertype with an unclassified protocol or a version other than 4.
    OtherIpv4,
    /// Any ethertype that is neither IPv4 nor ARP.
    OtherNonIpv4,
}

impl ProtocolClass {
    pub const COUNT: usize = 8;

    /// Every class, in report order.
    pub const ALL: [ProtocolClass; Self::COUNT] = [
        Self::Tcp,
        Self::Udp,
        Self::Icmp,
        Self::Igmp,
        Self::Ospf,
        Self::OtherIpv4,
        Self::OtherNonIpv4,
        Self::Arp,
    ];

    /// Classify an IPv4 protocol field.
    pub fn from_ip_protocol(value: u8) -> Self {
        match value {
            ip_protocols::TCP => Self::Tcp,
            ip_protocols::UDP => Self::Udp,
            ip_protocols::ICMP => Self::Icmp,
            ip_protocols::IGMP => Self::Igmp,
            ip_protocols::OSPF => Self::Ospf,
            _ => Self::OtherIpv4,
        }
    }

    /// Stable slot for per-class counter arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Tcp => 0,
            Self::Udp => 1,
            Self::Icmp => 2,
            Self::Igmp => 3,
            Self::Ospf => 4,
            Self::Arp => 5,
            Self::OtherIpv4 => 6,
            Self::OtherNonIpv4 => 7,
        }
    }

    /// Label used in the summary report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Icmp => "ICMP",
            Self::Igmp => "IGMP",
            Self::Ospf => "OSPF",
            Self::Arp => "ARP",
            Self::OtherIpv4 => "Other IPv4",
            Self::OtherNonIpv4 => "Non-IPv4",
        }
    }
}

impl std::fmt::Display for ProtocolClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
