//! The link-layer session: `open`, `write`, `read`, `close`.
//!
//! Owns the serial port, the sender/receiver sequence bits, and the retry
//! counters. There is exactly one control flow per session: `write` and
//! `read` are `&mut self` so the borrow checker enforces "no concurrent
//! writes" rather than a runtime lock.

use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::codec::{self, A_RX, A_TX, FLAG};
use crate::error::Error;
use crate::frame::{self, C_DISC, C_SET, C_UA};
use crate::port::{RealSerialPort, SerialPort};
use crate::receiver::{ExpectedC, Expectation, FrameReceiver, Kind, Outcome};
use crate::timer::AlarmTimer;

/// Maximum payload length this implementation admits. The application layer
/// never needs more than 256 bytes of data plus its 4-byte header (260); the
/// extra headroom costs nothing.
pub const P_MAX: usize = 1024;

pub const DEFAULT_MAX_RETRANSMISSIONS: u8 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Transmitter,
    Receiver,
}

/// Constructed by the caller, consumed by `open`, immutable thereafter.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub port: String,
    pub role: Role,
    /// Informational at this layer; passed straight to the serial port.
    pub baud_rate: u32,
    pub max_retransmissions: u8,
    pub timeout: Duration,
}

impl LinkConfig {
    pub fn new(port: impl Into<String>, role: Role) -> Self {
        LinkConfig {
            port: port.into(),
            role,
            baud_rate: 9600,
            max_retransmissions: DEFAULT_MAX_RETRANSMISSIONS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Open,
    Closed,
}

enum WaitResult {
    Accepted(u8),
    TimedOut,
}

pub struct Session {
    port: Box<dyn SerialPort>,
    role: Role,
    tx_seq: u8,
    rx_seq: u8,
    max_retransmissions: u8,
    timeout: Duration,
    timer: AlarmTimer,
    state: LinkState,
}

impl Session {
    /// Open a real serial port at `config.port`/`config.baud_rate` and
    /// perform the SET/UA (or SET-wait/UA) handshake.
    pub fn open(config: LinkConfig) -> Result<Self, Error> {
        let port = RealSerialPort::open(&config.port, config.baud_rate)?;
        Self::open_with_port(Box::new(port), config)
    }

    /// Same as [`Session::open`] but over a caller-supplied port, so tests
    /// can substitute a fault-injecting loopback for a real cable.
    pub fn open_with_port(port: Box<dyn SerialPort>, config: LinkConfig) -> Result<Self, Error> {
        let mut session = Session {
            port,
            role: config.role,
            tx_seq: 0,
            rx_seq: 0,
            max_retransmissions: config.max_retransmissions,
            timeout: config.timeout,
            timer: AlarmTimer::new(),
            state: LinkState::Closed,
        };
        match session.role {
            Role::Transmitter => session.handshake_as_transmitter()?,
            Role::Receiver => session.handshake_as_receiver()?,
        }
        session.state = LinkState::Open;
        Ok(session)
    }

    fn handshake_as_transmitter(&mut self) -> Result<(), Error> {
        let wire = frame::set();
        for attempt in 0..=self.max_retransmissions {
            debug!("open: sending SET (attempt {}/{})", attempt + 1, self.max_retransmissions + 1);
            self.port.write_all(&wire)?;
            self.timer.arm(self.timeout);
            let expectation = Expectation {
                a: A_RX,
                c: ExpectedC::Exact(C_UA),
                kind: Kind::Supervisory,
            };
            let result = self.wait_for_supervisory(expectation)?;
            self.timer.disarm();
            match result {
                WaitResult::Accepted(_) => {
                    debug!("open: UA received, connection established");
                    return Ok(());
                }
                WaitResult::TimedOut => {
                    warn!("open: timed out waiting for UA");
                }
            }
        }
        self.state = LinkState::Closed;
        Err(Error::OpenFailed)
    }

    fn handshake_as_receiver(&mut self) -> Result<(), Error> {
        let expectation = Expectation {
            a: A_TX,
            c: ExpectedC::Exact(C_SET),
            kind: Kind::Supervisory,
        };
        let mut recv = FrameReceiver::new(expectation);
        loop {
            if let Some(byte) = self.port.read_byte()? {
                if let Outcome::Accepted { .. } = recv.feed(byte) {
                    break;
                }
            }
        }
        debug!("open: SET received, sending UA");
        self.port.write_all(&frame::ua())?;
        Ok(())
    }

    /// Send `payload` as a single I-frame, retrying on timeout or REJ up to
    /// `max_retransmissions` times.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize, Error> {
        self.ensure_open()?;
        if payload.is_empty() || payload.len() > P_MAX {
            return Err(Error::InvalidPayloadLength);
        }

        let control = frame::i_for(self.tx_seq);
        let wire = frame::build_information(A_TX, control, payload);
        let rr_next = frame::rr_for(1 - self.tx_seq);
        let rej_current = frame::rej_for(self.tx_seq);

        for attempt in 0..=self.max_retransmissions {
            trace!(
                "write: sending I-frame seq={} attempt={}/{}",
                self.tx_seq,
                attempt + 1,
                self.max_retransmissions + 1
            );
            self.port.write_all(&wire)?;
            self.timer.arm(self.timeout);
            let expectation = Expectation {
                a: A_RX,
                c: ExpectedC::AnyOf(vec![rr_next, rej_current]),
                kind: Kind::Supervisory,
            };
            let result = self.wait_for_supervisory(expectation)?;
            self.timer.disarm();
            match result {
                WaitResult::Accepted(c) if c == rr_next => {
                    debug!("write: RR received, frame accepted");
                    self.tx_seq ^= 1;
                    return Ok(payload.len());
                }
                WaitResult::Accepted(_) => {
                    warn!("write: REJ received, retransmitting");
                }
                WaitResult::TimedOut => {
                    warn!("write: timed out waiting for ack, retransmitting");
                }
            }
        }
        Err(Error::WriteFailed)
    }

    /// Capture and validate one I-frame. Returns the payload with its
    /// header and BCC2 already stripped.
    pub fn read(&mut self) -> Result<Vec<u8>, Error> {
        self.ensure_open()?;
        let raw = self.capture_raw_frame()?;

        if raw.len() < 5 {
            warn!("read: frame too short ({} bytes)", raw.len());
            self.send_rej_current()?;
            return Err(Error::FrameError);
        }

        let (a, c, bcc1) = (raw[1], raw[2], raw[3]);
        if codec::bcc1(a, c) != bcc1 {
            warn!("read: BCC1 mismatch");
            self.send_rej_current()?;
            return Err(Error::FrameError);
        }

        let stuffed = &raw[4..raw.len() - 1];
        let destuffed = match codec::destuff(stuffed) {
            Ok(d) if !d.is_empty() => d,
            _ => {
                warn!("read: malformed stuffing or empty payload");
                self.send_rej_current()?;
                return Err(Error::FrameError);
            }
        };

        let (payload, check) = destuffed.split_at(destuffed.len() - 1);
        if codec::bcc2(payload) != check[0] {
            warn!("read: BCC2 mismatch");
            self.send_rej_current()?;
            return Err(Error::FrameError);
        }

        let received_seq = frame::seq_of(c);
        if received_seq != self.rx_seq {
            debug!("read: duplicate frame (seq={}, expected={})", received_seq, self.rx_seq);
            self.port.write_all(&frame::rr(self.rx_seq))?;
            return Err(Error::Duplicate);
        }

        let next = 1 - self.rx_seq;
        self.port.write_all(&frame::rr(next))?;
        debug!("read: frame accepted (seq={}), RR sent", received_seq);
        self.rx_seq = next;
        Ok(payload.to_vec())
    }

    /// Tear down the connection. Idempotent: calling this again once the
    /// session is closed is a no-op success.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.state == LinkState::Closed {
            return Ok(());
        }
        let result = match self.role {
            Role::Transmitter => self.close_as_transmitter(),
            Role::Receiver => self.close_as_receiver(),
        };
        self.state = LinkState::Closed;
        result
    }

    fn close_as_transmitter(&mut self) -> Result<(), Error> {
        let disc = frame::disc_from_transmitter();
        let mut accepted = false;
        for attempt in 0..=self.max_retransmissions {
            debug!("close: sending DISC (attempt {}/{})", attempt + 1, self.max_retransmissions + 1);
            self.port.write_all(&disc)?;
            self.timer.arm(self.timeout);
            let expectation = Expectation {
                a: A_RX,
                c: ExpectedC::Exact(C_DISC),
                kind: Kind::Supervisory,
            };
            let result = self.wait_for_supervisory(expectation)?;
            self.timer.disarm();
            if let WaitResult::Accepted(_) = result {
                accepted = true;
                break;
            }
            warn!("close: timed out waiting for DISC");
        }
        if !accepted {
            return Err(Error::CloseWarning);
        }
        self.port.write_all(&frame::ua())?;
        thread::sleep(Duration::from_millis(100));
        debug!("close: UA sent, connection closed");
        Ok(())
    }

    fn close_as_receiver(&mut self) -> Result<(), Error> {
        let expectation = Expectation {
            a: A_TX,
            c: ExpectedC::Exact(C_DISC),
            kind: Kind::Supervisory,
        };
        let mut recv = FrameReceiver::new(expectation);
        loop {
            if let Some(byte) = self.port.read_byte()? {
                if let Outcome::Accepted { .. } = recv.feed(byte) {
                    break;
                }
            }
        }
        debug!("close: DISC received, sending DISC");
        self.port.write_all(&frame::disc_from_receiver())?;

        self.timer.arm(self.timeout * 2);
        let expectation = Expectation {
            a: A_RX,
            c: ExpectedC::Exact(C_UA),
            kind: Kind::Supervisory,
        };
        let result = self.wait_for_supervisory(expectation)?;
        self.timer.disarm();
        match result {
            WaitResult::Accepted(_) => {
                debug!("close: final UA received, connection closed");
                Ok(())
            }
            WaitResult::TimedOut => {
                warn!("close: timed out waiting for final UA, closing anyway");
                Err(Error::CloseWarning)
            }
        }
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.state == LinkState::Open {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }

    fn send_rej_current(&mut self) -> Result<(), Error> {
        self.port.write_all(&frame::rej(self.rx_seq))?;
        Ok(())
    }

    /// Drive `FrameReceiver` against an armed timer, returning either the
    /// accepted control byte or a timeout.
    fn wait_for_supervisory(&mut self, expectation: Expectation) -> Result<WaitResult, Error> {
        let mut recv = FrameReceiver::new(expectation);
        loop {
            match self.port.read_byte()? {
                Some(byte) => {
                    if let Outcome::Accepted { c, .. } = recv.feed(byte) {
                        return Ok(WaitResult::Accepted(c));
                    }
                }
                None => {
                    if self.timer.has_fired() {
                        return Ok(WaitResult::TimedOut);
                    }
                }
            }
        }
    }

    /// Capture the raw bytes of one frame delimited by flags, tolerating a
    /// shared flag between consecutive frames.
    fn capture_raw_frame(&mut self) -> Result<Vec<u8>, Error> {
        let mut raw = Vec::new();
        let mut in_frame = false;
        loop {
            let byte = match self.port.read_byte()? {
                Some(b) => b,
                None => continue,
            };
            if byte == FLAG {
                if !in_frame {
                    in_frame = true;
                    raw.clear();
                    raw.push(byte);
                } else {
                    raw.push(byte);
                    return Ok(raw);
                }
            } else if in_frame {
                raw.push(byte);
                if raw.len() > 2 * P_MAX + 6 {
                    // Frame too large to be real; give up and resync.
                    in_frame = false;
                    raw.clear();
                }
            }
        }
    }
}
