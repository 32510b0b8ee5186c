//! Console-based traffic reporter.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::{DissectedHeader, Frame, ProtocolClass};
use crate::reporter::{TraceFilter, TrafficReporter};
use crate::stats::StatsTotals;

/// Bytes shown per payload dump line.
pub const DISPLAY_LINE: usize = 19;

/// Prints traces and the summary to stdout.
pub struct ConsoleReporter {
    /// Classes that get a trace line
    filter: TraceFilter,
    /// Whether to dump TCP/UDP payloads under their trace line
    show_payloads: bool,
}

impl ConsoleReporter {
    pub fn new(filter: TraceFilter) -> Self {
        Self {
            filter,
            show_payloads: false,
        }
    }

    /// Enable or disable payload dumps.
    pub fn with_payloads(mut self, show_payloads: bool) -> Self {
        self.show_payloads = show_payloads;
        self
    }

    /// Render the trace for one frame, or `None` if its class is filtered
    /// out. `seconds` is any wall-clock second count; only the time of day
    /// is printed.
    pub fn format_trace(
        &self,
        header: &DissectedHeader,
        frame: &Frame,
        seconds: u64,
    ) -> Option<String> {
        if !self.filter.contains(header.class) {
            return None;
        }

        let mut output = format_time_of_day(seconds);
        output.push(' ');

        match (header.class, header.ipv4) {
            (ProtocolClass::Tcp | ProtocolClass::Udp, Some(ip)) => {
                let _ = write!(
                    output,
                    "{} {} to {} ",
                    header.class, ip.source, ip.destination
                );
                match header.transport {
                    Some(transport) => {
                        let _ = write!(
                            output,
                            "{} to {} ({} bytes)",
                            transport.source_port,
                            transport.destination_port,
                            transport.payload.len
                        );
                    }
                    None => output.push_str("(0 bytes)"),
                }
                if self.show_payloads {
                    // The trailing newline of the dump comes from the writer.
                    let dump = hex_dump(header.payload(frame));
                    output.push('\n');
                    output.push_str(dump.strip_suffix('\n').unwrap_or(&dump));
                }
            }
            (ProtocolClass::OtherIpv4, Some(ip)) => {
                let _ = write!(output, "IPv4 {} to {}", ip.source, ip.destination);
            }
            (ProtocolClass::Icmp | ProtocolClass::Igmp | ProtocolClass::Ospf, Some(ip)) => {
                let _ = write!(
                    output,
                    "{} {} to {}",
                    header.class, ip.source, ip.destination
                );
            }
            (ProtocolClass::Arp, _) => {
                let _ = write!(
                    output,
                    "ARP {} to {}",
                    header.source_mac,
                    header.destination_mac
                );
            }
            (ProtocolClass::OtherNonIpv4, _) => {
                let _ = write!(
                    output,
                    "0x{:04X} {} to {}",
                    header.ethertype,
                    header.source_mac,
                    header.destination_mac
                );
            }
            // IPv4 ethertype without a usable IPv4 header.
            (_, None) => {
                let _ = write!(
                    output,
                    "IPv{} {} to {}",
                    header.ip_version.unwrap_or(4),
                    header.source_mac,
                    header.destination_mac
                );
            }
        }

        Some(output)
    }
}

impl TrafficReporter for ConsoleReporter {
    fn trace(&self, header: &DissectedHeader, frame: &Frame) {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if let Some(output) = self.format_trace(header, frame, seconds) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", output);
        }
    }

    fn on_start(&self, interface: &str, max_duration: Option<Duration>) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", format_start(interface, max_duration));
    }

    fn summary(&self, totals: &StatsTotals, elapsed: Duration) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", format_summary(totals, elapsed));
        let _ = stdout.flush();
    }
}

/// Render the line announcing a run.
pub fn format_start(interface: &str, max_duration: Option<Duration>) -> String {
    match max_duration {
        Some(limit) => format!(
            "Capturing on {} for {} seconds. Press Ctrl+C to stop early.",
            interface,
            limit.as_secs()
        ),
        None => format!("Capturing on {}. Press Ctrl+C to stop.", interface),
    }
}

/// Render the end-of-run report.
///
/// Rates use whole elapsed seconds, never less than one.
pub fn format_summary(totals: &StatsTotals, elapsed: Duration) -> String {
    let seconds = elapsed.as_secs().max(1);
    let rate = |bytes: u64| bytes as f64 / seconds as f64;

    let mut output = format!(
        "Captured {} frames in {} seconds.\n",
        totals.frames(),
        seconds
    );

    if totals.payload_bytes() > 0 {
        let _ = writeln!(
            output,
            "Total TCP/UDP data transferred: {} bytes, {:.1} bytes/sec.",
            totals.payload_bytes(),
            rate(totals.payload_bytes())
        );
    }

    for (class, bytes) in totals.nonzero() {
        let _ = writeln!(
            output,
            "{} traffic: {} bytes, {:.1} bytes/sec.",
            class,
            bytes,
            rate(bytes)
        );
    }

    let _ = writeln!(
        output,
        "Total traffic: {} bytes, {:.1} bytes/sec.",
        totals.total(),
        rate(totals.total())
    );

    output
}

/// Render a payload as ASCII and hex columns, `DISPLAY_LINE` bytes per line.
///
/// Each line is a space, the printable characters (others as `.`) padded to
/// the line width, two spaces, then the bytes in hex. A blank line ends the
/// dump.
pub fn hex_dump(payload: &[u8]) -> String {
    let mut output = String::new();

    for chunk in payload.chunks(DISPLAY_LINE) {
        output.push(' ');
        for &byte in chunk {
            output.push(if (0x20..=0x7e).contains(&byte) {
                byte as char
            } else {
                '.'
            });
        }
        for _ in chunk.len()..DISPLAY_LINE {
            output.push(' ');
        }
        output.push_str("  ");
        for byte in chunk {
            let _ = write!(output, "{:02X} ", byte);
        }
        output.push('\n');
    }

    output.push('\n');
    output
}

fn format_time_of_day(seconds: u64) -> String {
    let of_day = seconds % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}
