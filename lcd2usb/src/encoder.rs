/*!
Command batching.

The interface accepts up to four protocol bytes per control transfer, as long
as they share one command class and controller target. The encoder collects
consecutive same-key bytes and flushes them as a single [`Request`] when the
key changes, when the batch is full, or on explicit request. Grouping this way
amortizes USB transaction overhead while preserving issue order exactly, which
matters because cursor-set commands must reach the chip before the data they
position.
*/

use crate::error::Result;
use crate::protocol::{BatchKey, ControllerMap, Request, MAX_BATCH_LEN};
use crate::transport::Transport;

/// Batches homogeneous protocol bytes into single control transfers.
///
/// Owns the transport and the detected controller map; with an empty map every
/// flush quietly discards its batch instead of writing to hardware that was
/// never found.
pub struct CommandEncoder<T: Transport> {
    transport: T,
    controllers: ControllerMap,
    key: Option<BatchKey>,
    buf: [u8; MAX_BATCH_LEN],
    fill: usize,
}

impl<T: Transport> CommandEncoder<T> {
    pub fn new(transport: T, controllers: ControllerMap) -> Self {
        Self {
            transport,
            controllers,
            key: None,
            buf: [0; MAX_BATCH_LEN],
            fill: 0,
        }
    }

    /// The controller map writes are masked against
    pub fn controllers(&self) -> ControllerMap {
        self.controllers
    }

    /// Replace the controller map (conservatively empty after a failed
    /// re-query disables all further writes)
    pub fn set_controllers(&mut self, controllers: ControllerMap) {
        self.controllers = controllers;
    }

    /// Append one byte to the current batch.
    ///
    /// A key change flushes the previous batch first; reaching the 4-byte
    /// protocol limit flushes immediately. No byte is ever dropped.
    pub fn enqueue(&mut self, key: BatchKey, byte: u8) -> Result<()> {
        if self.key.is_some() && self.key != Some(key) {
            self.flush()?;
        }

        self.key = Some(key);
        self.buf[self.fill] = byte;
        self.fill += 1;

        if self.fill == MAX_BATCH_LEN {
            self.flush()?;
        }
        Ok(())
    }

    /// Transmit the pending batch, if any.
    ///
    /// The batch is cleared whether or not the transfer succeeds; retrying is
    /// the transport's job, not this layer's. With no controllers detected the
    /// batch is discarded without touching the bus.
    pub fn flush(&mut self) -> Result<()> {
        let Some(key) = self.key.take() else {
            return Ok(());
        };
        let len = self.fill;
        self.fill = 0;

        if self.controllers.is_empty() {
            return Ok(());
        }

        let request = Request::pack(key, &self.buf[..len]);
        self.transport
            .send(request.opcode, request.value, request.index)
    }

    /// Send one unbatched request, flushing anything pending first.
    ///
    /// Used for SET transfers whose value field is a setting, not a byte
    /// batch.
    pub fn submit(&mut self, key: BatchKey, value: u16, index: u16) -> Result<()> {
        self.flush()?;
        self.transport.send(key.opcode(1), value, index)
    }

    /// Perform a read-direction query, flushing anything pending first so the
    /// reply reflects every command issued so far.
    pub fn query(&mut self, key: BatchKey) -> Result<u16> {
        self.flush()?;
        self.transport.get(key.read_opcode(), 0)
    }

    /// Access the underlying transport (test hooks)
    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
