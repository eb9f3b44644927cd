/*!
Transport layer: the capability seam over the physical USB link, plus the
reconnect-and-retry policy that keeps it alive.

The batching and addressing logic never touches the bus directly; it talks to
a [`Transport`]. The production transport is [`ReconnectingTransport`], built
from a [`LinkOpener`] (device discovery and claim) and the [`ControlLink`] it
opens (raw vendor control transfers). Tests substitute in-memory stubs for
both.
*/

use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{DiscoveryError, Result, TransportError};

/// Timeout applied to every control transfer
pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(1000);

/// Total attempts per send: the original transfer plus one retry after
/// reconnecting
const SEND_ATTEMPTS: u32 = 2;

/// What the driver core needs from the bus: a write-direction transfer for
/// commands and a read-direction transfer for queries
pub trait Transport {
    /// Perform one write-direction control transfer
    fn send(&mut self, opcode: u8, value: u16, index: u16) -> Result<()>;

    /// Perform one read-direction control transfer and return the 2-byte
    /// little-endian result. `value` carries the echo stimulus; ordinary
    /// queries pass 0.
    fn get(&mut self, opcode: u8, value: u16) -> Result<u16>;
}

/// Raw control transfers over an already-open device handle.
///
/// Dropping a link must fully release the underlying handle; the reconnect
/// path relies on that to never hold two handles at once.
pub trait ControlLink {
    fn control_write(
        &mut self,
        opcode: u8,
        value: u16,
        index: u16,
        timeout: Duration,
    ) -> Result<()>;

    fn control_read(&mut self, opcode: u8, value: u16, timeout: Duration) -> Result<u16>;
}

/// Discovers and claims the device, yielding a fresh [`ControlLink`].
///
/// The opener remembers its discovery filters (bus/address), so re-opening
/// after a failure finds the same physical device again.
pub trait LinkOpener {
    type Link: ControlLink;

    fn open(&mut self) -> std::result::Result<Self::Link, DiscoveryError>;
}

/// [`Transport`] that survives one transient link failure per send.
///
/// On a failed write the dead handle is dropped, the device is re-discovered
/// through the opener, and the transfer is retried exactly once. A failed
/// reopen or a failed retry is fatal and leaves no handle open. Reads are not
/// retried; they only happen at startup, where the caller substitutes a safe
/// default on failure.
pub struct ReconnectingTransport<O: LinkOpener> {
    opener: O,
    link: Option<O::Link>,
    timeout: Duration,
}

impl<O: LinkOpener> ReconnectingTransport<O> {
    /// Open the device and wrap it. Fails if no device is found.
    pub fn new(mut opener: O) -> std::result::Result<Self, DiscoveryError> {
        let link = opener.open()?;
        Ok(Self {
            opener,
            link: Some(link),
            timeout: TRANSFER_TIMEOUT,
        })
    }

    /// Override the per-transfer timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn ensure_link(&mut self) -> Result<&mut O::Link> {
        if self.link.is_none() {
            self.link = Some(self.opener.open()?);
        }
        self.link
            .as_mut()
            .ok_or_else(|| TransportError::Transfer("link unavailable".to_string()))
    }
}

impl<O: LinkOpener> Transport for ReconnectingTransport<O> {
    fn send(&mut self, opcode: u8, value: u16, index: u16) -> Result<()> {
        let mut last_failure = String::new();

        for attempt in 0..SEND_ATTEMPTS {
            let timeout = self.timeout;
            let reconnected = self.link.is_none();
            let link = self.ensure_link()?;
            if reconnected {
                info!("✅ Device successfully reconnected");
            }

            match link.control_write(opcode, value, index, timeout) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    // Release the dead handle before re-discovery; the old
                    // handle must be fully closed before a new one is opened.
                    self.link = None;
                    last_failure = e.to_string();
                    if attempt + 1 < SEND_ATTEMPTS {
                        warn!("USB request failed, trying to reconnect device: {e}");
                    }
                }
            }
        }

        error!("retried USB request failed, aborting");
        Err(TransportError::RetryExhausted(last_failure))
    }

    fn get(&mut self, opcode: u8, value: u16) -> Result<u16> {
        let timeout = self.timeout;
        self.ensure_link()?.control_read(opcode, value, timeout)
    }
}
