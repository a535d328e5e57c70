//! Fuzz line capture and the command decoders with arbitrary serial input.
//!
//! The first byte selects the buffer capacity; the rest is what the host
//! sent. Sleeps complete immediately, so every capture finishes in one poll.

#![no_main]

use std::{
    collections::VecDeque,
    future::Future,
    io,
    pin::pin,
    task::{Context, Poll, Waker},
    time::{Duration, Instant},
};

use alarmlink_core::{Capture, ChannelConfig, CommandChannel, Environment, ProtocolCatalog, SerialPort};
use alarmlink_proto::Status;
use libfuzzer_sys::fuzz_target;

#[derive(Clone)]
struct NoWaitEnv;

impl Environment for NoWaitEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

struct FuzzPort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl SerialPort for FuzzPort {
    fn bytes_available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }
}

fn poll_once<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    match future.as_mut().poll(&mut Context::from_waker(Waker::noop())) {
        Poll::Ready(output) => output,
        Poll::Pending => panic!("capture suspended with an immediate environment"),
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&capacity, input)) = data.split_first() else {
        return;
    };

    let port = FuzzPort { rx: input.iter().copied().collect(), tx: Vec::new() };
    let config = ChannelConfig { buffer_capacity: capacity, ..ChannelConfig::default() };
    let mut channel = CommandChannel::new(NoWaitEnv, port, config);
    let catalog = ProtocolCatalog::default();

    // Capture every line in the input, decoding each one
    loop {
        match poll_once(channel.capture()) {
            Capture::Idle => break,
            Capture::NoMarker => continue,
            Capture::Line(line) => {
                assert!(line.len <= usize::from(capacity));
                assert!(channel.buffer().len() <= line.len);

                let _ = catalog.recognize(&channel);
                let _ = catalog.read_status(&mut channel, Status::default());
                let _ = catalog.read_credentials(&mut channel);
                let _ = catalog.read_network_change(&mut channel);
                let _ = catalog.read_retry(&mut channel);
                let _ = catalog.read_reset(&mut channel);
            },
        }
    }

    assert_eq!(channel.drain(), 0);
    assert!(channel.buffer().is_empty());
});
