/*!
Link diagnostics: the randomized echo self-test run at startup to gauge how
reliable the USB interfacing is.
*/

use rand::Rng;
use tracing::{info, warn};

use crate::error::Result;
use crate::protocol::BatchKey;
use crate::transport::Transport;

/// Default number of echo transfers per test run
pub const ECHO_TRIALS: usize = 100;

/// Send random 16-bit words through the echo command and count how many come
/// back wrong.
///
/// Mismatches are tallied, not fatal; the caller reports a nonzero count and
/// keeps going. A failed transfer, by contrast, aborts the whole test with the
/// transport error.
pub fn run_echo_test<T: Transport>(transport: &mut T, trials: usize) -> Result<u32> {
    let mut rng = rand::thread_rng();
    let mut mismatches = 0u32;

    for _ in 0..trials {
        let stimulus: u16 = rng.gen();
        let reply = transport.get(BatchKey::ECHO.read_opcode(), stimulus)?;
        if reply != stimulus {
            mismatches += 1;
        }
    }

    if mismatches > 0 {
        warn!("{mismatches} out of {trials} echo transfers failed");
    } else {
        info!("echo test successful");
    }
    Ok(mismatches)
}
