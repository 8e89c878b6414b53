#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use hdlc_xfer::session::{LinkConfig, Role};
    use hdlc_xfer::transfer::{receive_file, send_file};
    use hdlc_xfer::{SerialPort, Session};

    #[derive(Clone)]
    struct LoopbackPort {
        inbox: Arc<Mutex<VecDeque<u8>>>,
        outbox: Arc<Mutex<VecDeque<u8>>>,
    }

    impl LoopbackPort {
        fn pair() -> (Self, Self) {
            let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
            let b_to_a = Arc::new(Mutex::new(VecDeque::new()));
            (
                LoopbackPort { inbox: Arc::clone(&b_to_a), outbox: Arc::clone(&a_to_b) },
                LoopbackPort { inbox: a_to_b, outbox: b_to_a },
            )
        }
    }

    impl SerialPort for LoopbackPort {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(self.inbox.lock().unwrap().pop_front())
        }

        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.outbox.lock().unwrap().extend(bytes.iter().copied());
            Ok(())
        }
    }

    fn config(role: Role) -> LinkConfig {
        LinkConfig {
            port: String::new(),
            role,
            baud_rate: 9600,
            max_retransmissions: 3,
            timeout: Duration::from_millis(30),
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hdlc-xfer-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn file_survives_the_round_trip() {
        let src_path = temp_path("src.bin");
        let dst_path = temp_path("dst.bin");

        // A payload comfortably larger than one chunk, with bytes that force
        // byte stuffing (0x7E, 0x7D) to actually run.
        let mut content = Vec::new();
        for i in 0..900u32 {
            content.push((i % 251) as u8);
        }
        content.extend_from_slice(&[0x7E, 0x7D, 0x7E]);
        fs::write(&src_path, &content).unwrap();

        let (tx_port, rx_port) = LoopbackPort::pair();
        let rx_thread = thread::spawn(move || {
            let mut rx_session = Session::open_with_port(Box::new(rx_port), config(Role::Receiver)).unwrap();
            let dst = temp_path("dst.bin");
            receive_file(&mut rx_session, &dst).unwrap();
            rx_session.close().unwrap();
        });

        let mut tx_session = Session::open_with_port(Box::new(tx_port), config(Role::Transmitter)).unwrap();
        send_file(&mut tx_session, &src_path).unwrap();
        tx_session.close().unwrap();

        rx_thread.join().unwrap();

        let received = fs::read(&dst_path).unwrap();
        assert_eq!(received, content);

        let _ = fs::remove_file(&src_path);
        let _ = fs::remove_file(&dst_path);
    }
}
