//! In-memory serial link with a scripted host on the far end.
//!
//! The device side is a [`SimSerial`] implementing
//! [`alarmlink_core::SerialPort`]; the host side is a [`SimHost`] handle
//! that injects commands, acknowledges device lines and records everything
//! it sees. Bytes travelling towards the device carry a delivery instant
//! on the virtual clock, so latency is modelled without any real waiting.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use alarmlink_core::{Environment, SerialPort};
use alarmlink_proto::tokens::{LINE_MARKER, LINE_TERMINATOR, RSP_BAD_VALUE, RSP_OK};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::SimEnv;

/// How the simulated host answers lines sent by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    /// Reply `RSP+OK`
    #[default]
    Ok,
    /// Reply `RSP+BAD_VALUE`
    BadValue,
    /// Never reply
    Silent,
}

#[derive(Debug)]
struct Pending {
    at: Instant,
    byte: u8,
}

#[derive(Debug, Default)]
struct LinkState {
    to_device: VecDeque<Pending>,
    partial: Vec<u8>,
    device_lines: Vec<String>,
    ack_mode: AckMode,
    latency: Duration,
    ignore_next: u32,
    follow_ups: Vec<(String, Vec<u8>)>,
    write_failure: bool,
}

impl LinkState {
    fn enqueue(&mut self, at: Instant, bytes: &[u8]) {
        // Keep arrival order even if a later enqueue has a shorter latency.
        let at = self.to_device.back().map_or(at, |last| at.max(last.at));
        self.to_device.extend(bytes.iter().map(|&byte| Pending { at, byte }));
    }

    fn enqueue_line(&mut self, at: Instant, line: &[u8]) {
        let mut bytes = line.to_vec();
        bytes.extend_from_slice(LINE_TERMINATOR);
        self.enqueue(at, &bytes);
    }

    fn on_device_line(&mut self, now: Instant, line: String) {
        tracing::trace!(%line, "device line");

        if line.as_bytes().starts_with(LINE_MARKER) {
            let reply_at = now + self.latency;
            if self.ignore_next > 0 {
                self.ignore_next -= 1;
                tracing::debug!(%line, remaining = self.ignore_next, "host ignoring line");
            } else {
                match self.ack_mode {
                    AckMode::Ok => self.enqueue_line(reply_at, RSP_OK),
                    AckMode::BadValue => self.enqueue_line(reply_at, RSP_BAD_VALUE),
                    AckMode::Silent => {},
                }

                if let Some(index) =
                    self.follow_ups.iter().position(|(trigger, _)| line.starts_with(trigger.as_str()))
                {
                    let (_, command) = self.follow_ups.remove(index);
                    self.enqueue(reply_at, &command);
                }
            }
        }

        self.device_lines.push(line);
    }
}

fn lock(state: &Mutex<LinkState>) -> MutexGuard<'_, LinkState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a connected device port and host handle.
pub fn sim_link(env: SimEnv) -> (SimSerial, SimHost) {
    let state = Arc::new(Mutex::new(LinkState::default()));
    (SimSerial { env, state: Arc::clone(&state) }, SimHost { env, state })
}

/// Device end of the simulated link.
#[derive(Debug)]
pub struct SimSerial {
    env: SimEnv,
    state: Arc<Mutex<LinkState>>,
}

impl SerialPort for SimSerial {
    fn bytes_available(&self) -> usize {
        let now = self.env.now();
        lock(&self.state).to_device.iter().take_while(|p| p.at <= now).count()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let now = self.env.now();
        let mut state = lock(&self.state);
        match state.to_device.front() {
            Some(pending) if pending.at <= now => state.to_device.pop_front().map(|p| p.byte),
            _ => None,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let now = self.env.now();
        let mut state = lock(&self.state);
        if state.write_failure {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated link failure"));
        }

        for &byte in bytes {
            if byte == b'\n' {
                let raw = std::mem::take(&mut state.partial);
                let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_owned();
                state.on_device_line(now, line);
            } else {
                state.partial.push(byte);
            }
        }
        Ok(())
    }
}

/// Host end of the simulated link.
#[derive(Debug, Clone)]
pub struct SimHost {
    env: SimEnv,
    state: Arc<Mutex<LinkState>>,
}

impl SimHost {
    /// Send `CMD+<body>` to the device now.
    pub fn send_command(&self, body: &str) {
        let mut line = LINE_MARKER.to_vec();
        line.extend_from_slice(body.as_bytes());
        lock(&self.state).enqueue_line(self.env.now(), &line);
    }

    /// Send raw bytes to the device now.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.state).enqueue(self.env.now(), bytes);
    }

    /// Send raw bytes that reach the device `delay` from now.
    pub fn inject_after(&self, delay: Duration, bytes: &[u8]) {
        lock(&self.state).enqueue(self.env.now() + delay, bytes);
    }

    /// Send `len` bytes of seeded noise, free of line markers and newlines.
    pub fn inject_noise(&self, seed: u64, len: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise: Vec<u8> = (0..len)
            .map(|_| loop {
                let byte: u8 = rng.gen_range(b' '..=b'~');
                if byte != b'+' {
                    break byte;
                }
            })
            .collect();
        self.inject(&noise);
    }

    /// How device lines are answered from now on.
    pub fn set_ack_mode(&self, mode: AckMode) {
        lock(&self.state).ack_mode = mode;
    }

    /// Delay between receiving a device line and the reply reaching it.
    pub fn set_latency(&self, latency: Duration) {
        lock(&self.state).latency = latency;
    }

    /// Leave the next `count` device lines unanswered.
    pub fn ignore_next(&self, count: u32) {
        lock(&self.state).ignore_next = count;
    }

    /// After acknowledging a line starting with `trigger`, send `CMD+<body>`.
    ///
    /// Each follow-up fires once.
    pub fn follow_up(&self, trigger: &str, body: &str) {
        let mut command = LINE_MARKER.to_vec();
        command.extend_from_slice(body.as_bytes());
        command.extend_from_slice(LINE_TERMINATOR);
        lock(&self.state).follow_ups.push((trigger.to_owned(), command));
    }

    /// Make every device write fail.
    pub fn break_link(&self) {
        lock(&self.state).write_failure = true;
    }

    /// Every complete line the device has written, terminators stripped.
    pub fn device_lines(&self) -> Vec<String> {
        lock(&self.state).device_lines.clone()
    }

    /// Device lines that start with the command marker.
    pub fn device_commands(&self) -> Vec<String> {
        lock(&self.state)
            .device_lines
            .iter()
            .filter(|line| line.as_bytes().starts_with(LINE_MARKER))
            .cloned()
            .collect()
    }

    /// Device lines that answer a host command.
    pub fn device_responses(&self) -> Vec<String> {
        lock(&self.state)
            .device_lines
            .iter()
            .filter(|line| !line.as_bytes().starts_with(LINE_MARKER))
            .cloned()
            .collect()
    }

    /// Bytes still in flight or unread on the device side.
    pub fn pending_to_device(&self) -> usize {
        lock(&self.state).to_device.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_arrives_after_latency() {
        let mut sim = turmoil::Builder::new().build();

        sim.client("device", async {
            let env = SimEnv::new();
            let (mut port, host) = sim_link(env);
            host.set_latency(Duration::from_millis(200));

            port.write(b"CMD+DISCONNECTED\r\n")?;
            assert_eq!(port.bytes_available(), 0);

            env.sleep(Duration::from_millis(200)).await;
            assert_eq!(port.bytes_available(), b"RSP+OK\r\n".len());
            assert_eq!(host.device_commands(), vec!["CMD+DISCONNECTED"]);

            Ok(())
        });

        sim.run().expect("simulation failed");
    }

    #[test]
    fn responses_are_not_acknowledged() {
        let mut sim = turmoil::Builder::new().build();

        sim.client("device", async {
            let (mut port, host) = sim_link(SimEnv::new());

            port.write(b"RSP+OK\r\n")?;

            assert_eq!(host.device_responses(), vec!["RSP+OK"]);
            assert_eq!(host.pending_to_device(), 0);

            Ok(())
        });

        sim.run().expect("simulation failed");
    }

    #[test]
    fn noise_is_deterministic_and_marker_free() {
        let mut sim = turmoil::Builder::new().build();

        sim.client("device", async {
            let (mut port, host) = sim_link(SimEnv::new());
            host.inject_noise(7, 64);
            let first: Vec<u8> = std::iter::from_fn(|| port.read_byte()).collect();

            host.inject_noise(7, 64);
            let second: Vec<u8> = std::iter::from_fn(|| port.read_byte()).collect();

            assert_eq!(first.len(), 64);
            assert_eq!(first, second);
            assert!(!first.contains(&b'+'));

            Ok(())
        });

        sim.run().expect("simulation failed");
    }
}
