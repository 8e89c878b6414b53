//! Frame construction: control byte constants and the two frame shapes
//! (supervisory/unnumbered, and information) that travel on the wire.

use crate::codec::{bcc1, bcc2, stuff, A_RX, A_TX, FLAG};

pub const C_SET: u8 = 0x03;
pub const C_UA: u8 = 0x07;
pub const C_DISC: u8 = 0x0B;
pub const C_RR0: u8 = 0x05;
pub const C_RR1: u8 = 0x85;
pub const C_REJ0: u8 = 0x01;
pub const C_REJ1: u8 = 0x81;
pub const C_I0: u8 = 0x00;
pub const C_I1: u8 = 0x40;

/// RR/REJ control byte for sequence bit `seq`.
pub fn rr_for(seq: u8) -> u8 {
    if seq == 0 {
        C_RR0
    } else {
        C_RR1
    }
}

pub fn rej_for(seq: u8) -> u8 {
    if seq == 0 {
        C_REJ0
    } else {
        C_REJ1
    }
}

/// I-frame control byte for sequence bit `seq`.
pub fn i_for(seq: u8) -> u8 {
    if seq == 0 {
        C_I0
    } else {
        C_I1
    }
}

/// Sequence bit carried in an I-frame's control byte (bit 6).
pub fn seq_of(c: u8) -> u8 {
    (c & 0x40) >> 6
}

/// Build the 5-byte wire form of a supervisory frame.
pub fn build_supervisory(a: u8, c: u8) -> Vec<u8> {
    vec![FLAG, a, c, bcc1(a, c), FLAG]
}

/// Build the wire form of an I-frame: header, stuffed(payload || BCC2), flag.
pub fn build_information(a: u8, c: u8, payload: &[u8]) -> Vec<u8> {
    let check = bcc2(payload);
    let mut unstuffed = Vec::with_capacity(payload.len() + 1);
    unstuffed.extend_from_slice(payload);
    unstuffed.push(check);

    let mut frame = Vec::with_capacity(payload.len() * 2 + 6);
    frame.push(FLAG);
    frame.push(a);
    frame.push(c);
    frame.push(bcc1(a, c));
    frame.extend(stuff(&unstuffed));
    frame.push(FLAG);
    frame
}

pub const SET_FRAME_LEN: usize = 5;

/// Convenience builders for the well-known control frames, tagged with the
/// originator per HDLC address discipline: the sender of a frame, not its
/// direction, determines the address byte.
pub fn set() -> Vec<u8> {
    build_supervisory(A_TX, C_SET)
}

/// UA is always addressed `A_RX` by HDLC convention, whether it is sent by
/// the receiver role during `open` or by the transmitter role as the final
/// frame of `close`.
pub fn ua() -> Vec<u8> {
    build_supervisory(A_RX, C_UA)
}

pub fn disc_from_transmitter() -> Vec<u8> {
    build_supervisory(A_TX, C_DISC)
}

pub fn disc_from_receiver() -> Vec<u8> {
    build_supervisory(A_RX, C_DISC)
}

pub fn rr(seq: u8) -> Vec<u8> {
    build_supervisory(A_RX, rr_for(seq))
}

pub fn rej(seq: u8) -> Vec<u8> {
    build_supervisory(A_RX, rej_for(seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_frame_has_transmitter_address_and_bcc1() {
        assert_eq!(set(), vec![FLAG, 0x03, 0x03, 0x00, FLAG]);
    }

    #[test]
    fn ua_frame_has_receiver_address_and_bcc1() {
        assert_eq!(ua(), vec![FLAG, 0x01, 0x07, 0x06, FLAG]);
    }

    #[test]
    fn information_frame_carries_payload_and_bcc2() {
        let frame = build_information(A_TX, i_for(0), b"Hi");
        assert_eq!(frame, vec![FLAG, 0x03, 0x00, 0x03, 0x48, 0x69, 0x21, FLAG]);
    }

    #[test]
    fn information_frame_stuffs_embedded_flag() {
        let frame = build_information(A_TX, i_for(0), &[0x7E]);
        assert_eq!(
            frame,
            vec![FLAG, 0x03, 0x00, 0x03, 0x7D, 0x5E, 0x7D, 0x5E, FLAG]
        );
    }

    #[test]
    fn disc_frames_are_addressed_by_originator() {
        assert_eq!(disc_from_transmitter(), vec![FLAG, 0x03, 0x0B, 0x08, FLAG]);
        assert_eq!(disc_from_receiver(), vec![FLAG, 0x01, 0x0B, 0x0A, FLAG]);
    }

    #[test]
    fn rr_alternates_with_sequence() {
        assert_eq!(rr(0), vec![FLAG, 0x01, C_RR0, A_RX ^ C_RR0, FLAG]);
        assert_eq!(rr(1), vec![FLAG, 0x01, C_RR1, A_RX ^ C_RR1, FLAG]);
    }

    #[test]
    fn seq_of_extracts_bit_six() {
        assert_eq!(seq_of(C_I0), 0);
        assert_eq!(seq_of(C_I1), 1);
    }
}
