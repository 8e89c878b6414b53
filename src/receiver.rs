//! The six-state frame receiver used while waiting for a supervisory frame
//! (UA during `open`, RR/REJ during `write`, DISC/UA during `close`).
//!
//! `read`'s I-frame capture has its own, more literal algorithm and lives in
//! [`crate::session`]; this machine handles the supervisory-frame case, plus
//! the information-frame case (unused by `read`, exercised directly by this
//! module's tests) for symmetry with how frames are modeled elsewhere.

use crate::codec::FLAG;

/// What a given wait is prepared to accept.
#[derive(Debug, Clone)]
pub enum ExpectedC {
    Exact(u8),
    AnyOf(Vec<u8>),
}

impl ExpectedC {
    fn matches(&self, c: u8) -> bool {
        match self {
            ExpectedC::Exact(expected) => c == *expected,
            ExpectedC::AnyOf(set) => set.contains(&c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Supervisory,
    Information,
}

pub struct Expectation {
    pub a: u8,
    pub c: ExpectedC,
    pub kind: Kind,
}

enum State {
    Start,
    FlagRx,
    AOk,
    COk,
    BccOk,
}

pub enum Outcome {
    /// Keep feeding bytes.
    Pending,
    /// A complete, validated frame was captured.
    Accepted { a: u8, c: u8, payload: Vec<u8> },
}

/// Byte-at-a-time state machine scanning for one specific expected frame.
pub struct FrameReceiver {
    state: State,
    expectation: Expectation,
    c_seen: u8,
    payload: Vec<u8>,
}

impl FrameReceiver {
    pub fn new(expectation: Expectation) -> Self {
        FrameReceiver {
            state: State::Start,
            expectation,
            c_seen: 0,
            payload: Vec::new(),
        }
    }

    /// Feed one byte from the wire. Returns `Outcome::Accepted` exactly once,
    /// the moment the expected frame's trailing flag is seen.
    pub fn feed(&mut self, byte: u8) -> Outcome {
        match self.state {
            State::Start => {
                if byte == FLAG {
                    self.state = State::FlagRx;
                }
                Outcome::Pending
            }
            State::FlagRx => {
                if byte == self.expectation.a {
                    self.state = State::AOk;
                } else if byte != FLAG {
                    self.state = State::Start;
                }
                Outcome::Pending
            }
            State::AOk => {
                if self.expectation.c.matches(byte) {
                    self.c_seen = byte;
                    self.state = State::COk;
                } else if byte == FLAG {
                    self.state = State::FlagRx;
                } else {
                    self.state = State::Start;
                }
                Outcome::Pending
            }
            State::COk => {
                if byte == self.expectation.a ^ self.c_seen {
                    self.state = State::BccOk;
                    self.payload.clear();
                } else if byte == FLAG {
                    self.state = State::FlagRx;
                } else {
                    self.state = State::Start;
                }
                Outcome::Pending
            }
            State::BccOk => match self.expectation.kind {
                Kind::Supervisory => {
                    if byte == FLAG {
                        self.state = State::Start;
                        Outcome::Accepted {
                            a: self.expectation.a,
                            c: self.c_seen,
                            payload: Vec::new(),
                        }
                    } else {
                        self.state = State::Start;
                        Outcome::Pending
                    }
                }
                Kind::Information => {
                    if byte == FLAG {
                        self.state = State::Start;
                        let payload = std::mem::take(&mut self.payload);
                        Outcome::Accepted {
                            a: self.expectation.a,
                            c: self.c_seen,
                            payload,
                        }
                    } else {
                        self.payload.push(byte);
                        Outcome::Pending
                    }
                }
            },
        }
    }
}
