//! Byte stuffing and block check characters.
//!
//! Stuffing is applied only to the payload (and its trailing BCC2), never to
//! the flag bytes or the A/C/BCC1 header triple.

use crate::error::CodecError;

pub const FLAG: u8 = 0x7E;
const ESC: u8 = 0x7D;
const ESC_FLAG: u8 = 0x5E;
const ESC_ESC: u8 = 0x5D;

/// Address bytes: set by the frame's originator, not by direction.
pub const A_TX: u8 = 0x03;
pub const A_RX: u8 = 0x01;

/// Replace every `FLAG`/`ESC` byte in `src` with its two-byte escape.
pub fn stuff(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    for &b in src {
        match b {
            FLAG => out.extend_from_slice(&[ESC, ESC_FLAG]),
            ESC => out.extend_from_slice(&[ESC, ESC_ESC]),
            _ => out.push(b),
        }
    }
    out
}

/// Reverse [`stuff`]. Fails if an escape byte is the last byte of `src`.
pub fn destuff(src: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] == ESC {
            let next = *src.get(i + 1).ok_or(CodecError::MalformedStuffing)?;
            out.push(match next {
                ESC_FLAG => FLAG,
                ESC_ESC => ESC,
                _ => return Err(CodecError::MalformedStuffing),
            });
            i += 2;
        } else {
            out.push(src[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// BCC1 = A XOR C, the header check for every frame.
pub fn bcc1(a: u8, c: u8) -> u8 {
    a ^ c
}

/// BCC2 = XOR-reduction of the raw (unstuffed) payload bytes, seeded at 0.
pub fn bcc2(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}
