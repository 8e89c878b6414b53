//! Send or receive a single file over a real serial port.
//!
//! Usage: `filexfer <tx|rx> <serial-port> <file>`

use std::path::Path;
use std::process;

use hdlc_xfer::session::{LinkConfig, Role};
use hdlc_xfer::transfer::{receive_file, send_file};
use hdlc_xfer::Session;
use log::{error, info, LevelFilter};

fn main() {
    log::set_max_level(LevelFilter::Debug);
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (role_arg, port_arg, file_arg) = match (args.next(), args.next(), args.next()) {
        (Some(r), Some(p), Some(f)) => (r, p, f),
        _ => {
            eprintln!("usage: filexfer <tx|rx> <serial-port> <file>");
            process::exit(2);
        }
    };

    let role = match role_arg.as_str() {
        "tx" => Role::Transmitter,
        "rx" => Role::Receiver,
        other => {
            eprintln!("invalid role '{}': expected 'tx' or 'rx'", other);
            process::exit(2);
        }
    };

    let config = LinkConfig::new(port_arg.clone(), role);
    info!("opening {} as {:?}", port_arg, role);

    let mut session = match Session::open(config) {
        Ok(session) => session,
        Err(e) => {
            error!("failed to open connection: {}", e);
            process::exit(1);
        }
    };
    info!("connection established");

    let path = Path::new(&file_arg);
    let result = match role {
        Role::Transmitter => send_file(&mut session, path),
        Role::Receiver => receive_file(&mut session, path),
    };

    if let Err(e) = session.close() {
        error!("warning: connection did not close cleanly: {}", e);
    }

    match result {
        Ok(()) => {
            info!("transfer successful");
        }
        Err(e) => {
            error!("transfer failed: {}", e);
            process::exit(1);
        }
    }
}
