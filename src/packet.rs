//! Application-layer packet codec: START/END control packets carrying
//! file metadata as TLVs, and DATA packets carrying a chunk of the file.

use std::fmt;

pub const CTRL_DATA: u8 = 0x01;
pub const CTRL_START: u8 = 0x02;
pub const CTRL_END: u8 = 0x03;

pub const TLV_FILE_SIZE: u8 = 0x00;
pub const TLV_FILE_NAME: u8 = 0x01;

/// Largest chunk a single DATA packet carries. The link layer's `Pmax`
/// leaves headroom above `MAX_CHUNK_SIZE + 4` for the packet header.
pub const MAX_CHUNK_SIZE: usize = 256;

#[derive(Debug)]
pub enum PacketError {
    /// A TLV's declared length ran past the end of the packet.
    Truncated,
    /// A DATA packet's L2/L1 length header didn't match the bytes present.
    BadDataLength,
    /// The packet was empty or its control field was neither START, END,
    /// nor DATA.
    UnknownControl(u8),
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::Truncated => write!(f, "TLV length ran past the end of the packet"),
            PacketError::BadDataLength => write!(f, "data packet length header did not match payload"),
            PacketError::UnknownControl(c) => write!(f, "unrecognized control field: 0x{:02x}", c),
        }
    }
}

impl std::error::Error for PacketError {}

/// File metadata carried by a START or END control packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_size: u64,
    pub file_name: String,
}

/// Build a START or END control packet: control byte, then a FILE_SIZE TLV
/// (big-endian, minimal byte width) and a FILE_NAME TLV.
pub fn build_control_packet(control: u8, info: &FileInfo) -> Vec<u8> {
    let mut packet = Vec::with_capacity(8 + info.file_name.len());
    packet.push(control);

    let size_bytes = minimal_be_bytes(info.file_size);
    packet.push(TLV_FILE_SIZE);
    packet.push(size_bytes.len() as u8);
    packet.extend_from_slice(&size_bytes);

    let name_bytes = info.file_name.as_bytes();
    let name_len = name_bytes.len().min(255);
    packet.push(TLV_FILE_NAME);
    packet.push(name_len as u8);
    packet.extend_from_slice(&name_bytes[..name_len]);

    packet
}

/// Smallest big-endian encoding of `value` with at least one byte, matching
/// the reference encoder's "while remainder > 0" loop.
fn minimal_be_bytes(value: u64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    bytes
}

/// Parse a START or END control packet's TLVs. Unknown TLV types are
/// skipped rather than rejected, so the wire format can grow new TLVs.
pub fn parse_control_packet(packet: &[u8]) -> Result<FileInfo, PacketError> {
    let mut file_size: u64 = 0;
    let mut file_name = String::new();
    let mut idx = 1; // skip control field

    while idx < packet.len() {
        let tlv_type = packet[idx];
        let length = *packet.get(idx + 1).ok_or(PacketError::Truncated)? as usize;
        idx += 2;
        if idx + length > packet.len() {
            return Err(PacketError::Truncated);
        }
        let value = &packet[idx..idx + length];
        match tlv_type {
            TLV_FILE_SIZE => {
                file_size = value.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
            }
            TLV_FILE_NAME => {
                file_name = String::from_utf8_lossy(value).into_owned();
            }
            _ => {}
        }
        idx += length;
    }

    Ok(FileInfo { file_size, file_name })
}

/// Build a DATA packet: control byte, 1-byte sequence number, 2-byte
/// big-endian length (L2 high, L1 low), then the raw chunk.
pub fn build_data_packet(sequence: u8, data: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(4 + data.len());
    packet.push(CTRL_DATA);
    packet.push(sequence);
    packet.push((data.len() >> 8) as u8);
    packet.push((data.len() & 0xFF) as u8);
    packet.extend_from_slice(data);
    packet
}

pub struct DataPacket<'a> {
    pub sequence: u8,
    pub data: &'a [u8],
}

/// Parse a DATA packet, validating that its length header matches the
/// bytes actually present.
pub fn parse_data_packet(packet: &[u8]) -> Result<DataPacket<'_>, PacketError> {
    if packet.len() < 4 {
        return Err(PacketError::BadDataLength);
    }
    let sequence = packet[1];
    let length = ((packet[2] as usize) << 8) | packet[3] as usize;
    if 4 + length > packet.len() {
        return Err(PacketError::BadDataLength);
    }
    Ok(DataPacket {
        sequence,
        data: &packet[4..4 + length],
    })
}

/// The control field of any application-layer packet, or an error if the
/// packet is empty or carries an unrecognized one.
pub fn control_of(packet: &[u8]) -> Result<u8, PacketError> {
    match packet.first() {
        Some(&c) if c == CTRL_START || c == CTRL_END || c == CTRL_DATA => Ok(c),
        Some(&c) => Err(PacketError::UnknownControl(c)),
        None => Err(PacketError::UnknownControl(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_packet_round_trips() {
        let info = FileInfo {
            file_size: 12345,
            file_name: "photo.png".to_string(),
        };
        let packet = build_control_packet(CTRL_START, &info);
        assert_eq!(packet[0], CTRL_START);
        let parsed = parse_control_packet(&packet).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn file_size_is_encoded_big_endian_minimal_width() {
        let info = FileInfo {
            file_size: 300,
            file_name: String::new(),
        };
        let packet = build_control_packet(CTRL_END, &info);
        // control(1) + TLV_FILE_SIZE(1) + length(1) + 2 size bytes
        assert_eq!(packet[1], TLV_FILE_SIZE);
        assert_eq!(packet[2], 2);
        assert_eq!(&packet[3..5], &[0x01, 0x2C]);
    }

    #[test]
    fn zero_size_still_encodes_one_byte() {
        let bytes = minimal_be_bytes(0);
        assert_eq!(bytes, vec![0]);
    }

    #[test]
    fn parse_rejects_truncated_tlv() {
        let packet = vec![CTRL_START, TLV_FILE_NAME, 10, b'a', b'b'];
        assert!(matches!(parse_control_packet(&packet), Err(PacketError::Truncated)));
    }

    #[test]
    fn parse_skips_unknown_tlv_types() {
        let mut packet = vec![CTRL_START, 0x7F, 2, 0xAA, 0xBB];
        packet.extend_from_slice(&[TLV_FILE_NAME, 3, b'f', b'o', b'o']);
        let parsed = parse_control_packet(&packet).unwrap();
        assert_eq!(parsed.file_name, "foo");
    }

    #[test]
    fn data_packet_round_trips() {
        let packet = build_data_packet(7, b"hello");
        let parsed = parse_data_packet(&packet).unwrap();
        assert_eq!(parsed.sequence, 7);
        assert_eq!(parsed.data, b"hello");
    }

    #[test]
    fn data_packet_length_header_is_big_endian() {
        let data = vec![0u8; 300];
        let packet = build_data_packet(0, &data);
        assert_eq!(packet[2], 1);
        assert_eq!(packet[3], 0x2C);
    }

    #[test]
    fn parse_rejects_length_header_past_end() {
        let packet = vec![CTRL_DATA, 0, 0, 10, b'a', b'b'];
        assert!(matches!(parse_data_packet(&packet), Err(PacketError::BadDataLength)));
    }

    #[test]
    fn control_of_identifies_packet_kind() {
        assert_eq!(control_of(&[CTRL_START]).unwrap(), CTRL_START);
        assert_eq!(control_of(&[CTRL_DATA, 0, 0, 0]).unwrap(), CTRL_DATA);
        assert!(matches!(control_of(&[0xFF]), Err(PacketError::UnknownControl(0xFF))));
        assert!(matches!(control_of(&[]), Err(PacketError::UnknownControl(0))));
    }
}
