/*!
In-memory transport stubs shared by the unit tests. No physical device is
required to exercise the batching, addressing and retry logic.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{DiscoveryError, Result, TransportError};
use crate::protocol::{BatchKey, Request};
use crate::transport::{ControlLink, LinkOpener, Transport};

#[derive(Default)]
struct BusState {
    opens: u32,
    fail_reopens: bool,
    write_failures_left: u32,
    write_attempts: u32,
    writes: Vec<(u8, u16, u16)>,
    read_value: u16,
}

/// A scripted USB bus: hands out links whose first N writes fail, and counts
/// every open and transfer attempt.
#[derive(Clone)]
pub struct ScriptedBus {
    state: Rc<RefCell<BusState>>,
}

impl ScriptedBus {
    pub fn new(write_failures: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                write_failures_left: write_failures,
                ..BusState::default()
            })),
        }
    }

    pub fn fail_reopens(&self) {
        self.state.borrow_mut().fail_reopens = true;
    }

    pub fn set_read_value(&self, value: u16) {
        self.state.borrow_mut().read_value = value;
    }

    pub fn opens(&self) -> u32 {
        self.state.borrow().opens
    }

    pub fn write_attempts(&self) -> u32 {
        self.state.borrow().write_attempts
    }

    pub fn writes(&self) -> Vec<(u8, u16, u16)> {
        self.state.borrow().writes.clone()
    }
}

pub struct ScriptedOpener {
    bus: ScriptedBus,
}

impl ScriptedOpener {
    pub fn new(bus: &ScriptedBus) -> Self {
        Self { bus: bus.clone() }
    }
}

impl LinkOpener for ScriptedOpener {
    type Link = ScriptedLink;

    fn open(&mut self) -> std::result::Result<ScriptedLink, DiscoveryError> {
        let mut state = self.bus.state.borrow_mut();
        state.opens += 1;
        if state.fail_reopens && state.opens > 1 {
            return Err(DiscoveryError::NotFound);
        }
        Ok(ScriptedLink {
            bus: self.bus.clone(),
        })
    }
}

pub struct ScriptedLink {
    bus: ScriptedBus,
}

impl ControlLink for ScriptedLink {
    fn control_write(&mut self, opcode: u8, value: u16, index: u16, _: Duration) -> Result<()> {
        let mut state = self.bus.state.borrow_mut();
        state.write_attempts += 1;
        if state.write_failures_left > 0 {
            state.write_failures_left -= 1;
            return Err(TransportError::Transfer("scripted failure".to_string()));
        }
        state.writes.push((opcode, value, index));
        Ok(())
    }

    fn control_read(&mut self, _opcode: u8, _value: u16, _: Duration) -> Result<u16> {
        Ok(self.bus.state.borrow().read_value)
    }
}

/// A [`Transport`] that records every request and answers queries from a
/// scripted table. Echo transfers reflect the stimulus back, except for the
/// trial indexes listed in `corrupt_echoes`.
#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<Request>,
    pub get_responses: HashMap<u8, u16>,
    pub corrupt_echoes: Vec<usize>,
    pub fail_sends: bool,
    pub fail_gets: bool,
    echo_calls: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply to a read-direction opcode
    pub fn answer(mut self, key: BatchKey, value: u16) -> Self {
        self.get_responses.insert(key.read_opcode(), value);
        self
    }

    /// Opcodes of every request sent so far
    pub fn opcodes(&self) -> Vec<u8> {
        self.sent.iter().map(|r| r.opcode).collect()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, opcode: u8, value: u16, index: u16) -> Result<()> {
        if self.fail_sends {
            return Err(TransportError::Transfer("mock send failure".to_string()));
        }
        self.sent.push(Request {
            opcode,
            value,
            index,
        });
        Ok(())
    }

    fn get(&mut self, opcode: u8, value: u16) -> Result<u16> {
        if self.fail_gets {
            return Err(TransportError::Transfer("mock get failure".to_string()));
        }
        if opcode == BatchKey::ECHO.read_opcode() {
            let trial = self.echo_calls;
            self.echo_calls += 1;
            if self.corrupt_echoes.contains(&trial) {
                return Ok(!value);
            }
            return Ok(value);
        }
        self.get_responses
            .get(&opcode)
            .copied()
            .ok_or_else(|| TransportError::Transfer("unscripted query".to_string()))
    }
}
