//! Frame dissection module.
//!
//! Turns raw frame bytes into a `DissectedHeader`: protocol class,
//! addressing and the location of any TCP/UDP payload.

mod ethernet_dissector;

pub use ethernet_dissector::{EthernetDissector, ETHERNET_HEADER_LEN};
