//! pnet-based frame capture.

use std::io::ErrorKind;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, NetworkInterface};
use tracing::debug;

use super::FrameSource;
use crate::domain::Frame;
use crate::error::CaptureError;

/// How long a single receive may block before control returns to the loop.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Live capture of every frame on one interface.
pub struct PnetSource {
    interface: NetworkInterface,
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetSource {
    /// Open a raw channel bound to the named interface.
    pub fn open(interface_name: &str) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface_name.to_string()))?;

        let config = Config {
            read_timeout: Some(READ_TIMEOUT),
            ..Config::default()
        };

        let rx = match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(CaptureError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
            Err(e) => {
                if e.kind() == ErrorKind::PermissionDenied {
                    return Err(CaptureError::InsufficientPermissions);
                }
                let msg = e.to_string();
                if msg.contains("permission") || msg.contains("Operation not permitted") {
                    return Err(CaptureError::InsufficientPermissions);
                }
                return Err(CaptureError::ChannelCreation(msg));
            }
        };

        debug!("Opened capture channel on {}", interface.name);
        Ok(Self { interface, rx })
    }
}

impl FrameSource for PnetSource {
    fn capture(&mut self) -> Result<Option<Frame>, CaptureError> {
        match self.rx.next() {
            Ok([]) => Err(CaptureError::EmptyRead),
            Ok(packet) => Ok(Some(Frame::from_bytes(packet))),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(CaptureError::Receive(e)),
        }
    }

    fn interface_name(&self) -> &str {
        &self.interface.name
    }
}
