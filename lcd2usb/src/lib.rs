/*!
# LCD2USB driver core

Command batching, display addressing and transport resilience for character
LCDs behind the LCD2USB vendor control protocol.

## Core Types

- [`CommandEncoder`] - batches same-class protocol bytes into single transfers
- [`ReconnectingTransport`] - survives one transient link failure per send
- [`Display`] - positioned writes, clearing, contrast and brightness
- [`Geometry`] - logical row/column to controller chip and linear address
- [`ControllerMap`] - which of the (up to two) controller chips are installed

## Modules

- [`protocol`] - opcode layout and request packing
- [`encoder`] - command batching
- [`transport`] - the USB capability seam and the reconnect-retry policy
- [`addressing`] - row/column to chip/address mapping
- [`display`] - high-level display operations and startup queries
- [`diag`] - randomized echo self-test
- [`error`] - common error types

The crate never touches the bus itself; a [`transport::ControlLink`] /
[`transport::LinkOpener`] pair supplied by the application does, which keeps
every piece of logic exercisable with in-memory stubs.
*/

pub mod addressing;
pub mod diag;
pub mod display;
pub mod encoder;
pub mod error;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use addressing::Geometry;
pub use display::{detect_controllers, firmware_version, Display};
pub use encoder::CommandEncoder;
pub use error::{DiscoveryError, Result, TransportError};
pub use protocol::{BatchKey, CommandClass, ControllerMap, Request};
pub use transport::{ControlLink, LinkOpener, ReconnectingTransport, Transport};

/// Version information for the driver library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
