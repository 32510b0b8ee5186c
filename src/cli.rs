//! Command line interface.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "seepackets")]
#[command(version)]
#[command(about = "Reads Ethernet frames for a period of time and reports traffic per protocol")]
pub struct Cli {
    /// Show payloads for TCP/UDP packets
    #[arg(short = 'p')]
    pub payloads: bool,

    /// Show TCP packets
    #[arg(short = 't')]
    pub tcp: bool,

    /// Show UDP packets
    #[arg(short = 'u')]
    pub udp: bool,

    /// Show ICMP packets
    #[arg(short = 'c')]
    pub icmp: bool,

    /// Show IGMP packets
    #[arg(short = 'g')]
    pub igmp: bool,

    /// Show OSPF packets
    #[arg(short = 's')]
    pub ospf: bool,

    /// Show ARP packets
    #[arg(short = 'a')]
    pub arp: bool,

    /// Show other packets
    #[arg(short = 'o')]
    pub other: bool,

    /// Maximum duration in seconds (runs until Ctrl+C if omitted)
    #[arg(short = 'm', value_name = "SECONDS")]
    pub max_duration: Option<u64>,

    /// Network interface to capture on (e.g., eth0)
    pub interface: String,
}
