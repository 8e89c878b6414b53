//! The file transfer driver: streams one file as a START packet, a run of
//! DATA packets, and an END packet, or does the reverse on the other end.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::{info, warn};

use crate::error::Error;
use crate::packet::{
    self, build_control_packet, build_data_packet, parse_control_packet, parse_data_packet, FileInfo,
    CTRL_END, CTRL_START, MAX_CHUNK_SIZE,
};
use crate::session::Session;

/// Send `path` over `session` as START, a sequence of DATA packets, and END.
pub fn send_file(session: &mut Session, path: &Path) -> Result<(), Error> {
    let mut file = File::open(path).map_err(Error::Io)?;
    let file_size = file.metadata().map_err(Error::Io)?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("sending {} ({} bytes)", file_name, file_size);
    let info = FileInfo { file_size, file_name };

    session.write(&build_control_packet(CTRL_START, &info))?;

    let mut buffer = [0u8; MAX_CHUNK_SIZE];
    let mut sequence: u8 = 0;
    let mut sent: u64 = 0;
    loop {
        let read = file.read(&mut buffer).map_err(Error::Io)?;
        if read == 0 {
            break;
        }
        session.write(&build_data_packet(sequence, &buffer[..read]))?;
        sent += read as u64;
        sequence = sequence.wrapping_add(1);
    }

    session.write(&build_control_packet(CTRL_END, &info))?;
    info!("transfer complete: {} bytes sent", sent);
    Ok(())
}

/// Receive a file into `path`, looping on `session.read()` until the START
/// packet arrives, then streaming DATA packets to disk until END.
pub fn receive_file(session: &mut Session, path: &Path) -> Result<(), Error> {
    let info = wait_for_start(session)?;
    info!("receiving {} ({} bytes expected)", info.file_name, info.file_size);

    let mut file = File::create(path).map_err(Error::Io)?;
    let mut received: u64 = 0;
    let mut expected_seq: u8 = 0;

    loop {
        let raw = match session.read() {
            Ok(raw) => raw,
            Err(Error::Duplicate) | Err(Error::FrameError) => continue,
            Err(e) => return Err(e),
        };

        match packet::control_of(&raw) {
            Ok(CTRL_END) => {
                let end_info = parse_control_packet(&raw).map_err(|_| Error::FrameError)?;
                if end_info.file_size != info.file_size {
                    warn!(
                        "file size mismatch in END packet: expected {}, got {}",
                        info.file_size, end_info.file_size
                    );
                }
                break;
            }
            Ok(packet::CTRL_DATA) => {
                let data = parse_data_packet(&raw).map_err(|_| Error::FrameError)?;
                if data.sequence != expected_seq {
                    warn!("sequence mismatch: expected {}, got {}", expected_seq, data.sequence);
                }
                expected_seq = expected_seq.wrapping_add(1);
                file.write_all(data.data).map_err(Error::Io)?;
                received += data.data.len() as u64;
            }
            Ok(CTRL_START) => {
                warn!("duplicate START packet received after transfer began, ignoring");
            }
            Ok(other) => {
                warn!("unrecognized control field 0x{:02x}, ignoring", other);
            }
            Err(packet::PacketError::UnknownControl(other)) => {
                warn!("unrecognized control field 0x{:02x}, ignoring", other);
            }
            Err(e) => {
                warn!("malformed packet: {}", e);
            }
        }
    }

    if received != info.file_size {
        warn!(
            "received size does not match announced file size: expected {}, got {}",
            info.file_size, received
        );
    }
    info!("transfer complete: {} bytes received", received);
    Ok(())
}

fn wait_for_start(session: &mut Session) -> Result<FileInfo, Error> {
    loop {
        let raw = match session.read() {
            Ok(raw) => raw,
            Err(Error::Duplicate) | Err(Error::FrameError) => continue,
            Err(e) => return Err(e),
        };
        if packet::control_of(&raw) == Ok(CTRL_START) {
            return parse_control_packet(&raw).map_err(|_| Error::FrameError);
        }
    }
}
