//! Reliable single-file transfer over a point-to-point serial link.
//!
//! The stack is layered the way the wire protocol is: [`codec`] handles
//! byte stuffing and block checks, [`frame`] builds the HDLC-derived frame
//! shapes, [`receiver`] drives the state machine that recognizes them,
//! [`session`] runs the stop-and-wait link (open/write/read/close), and
//! [`packet`]/[`transfer`] implement the application-layer file transfer on
//! top of it.

pub mod codec;
pub mod error;
pub mod frame;
pub mod packet;
pub mod port;
pub mod receiver;
pub mod session;
pub mod timer;
pub mod transfer;

pub use error::Error;
pub use port::{RealSerialPort, SerialPort};
pub use session::{LinkConfig, Role, Session, P_MAX};
