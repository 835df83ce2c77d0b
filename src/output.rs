// Output Module - Frame sinks: DDP to a WLED device, a terminal preview, or nowhere
use anyhow::Result;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use ddp_rs::connection::DDPConnection;
use ddp_rs::protocol::{PixelConfig, ID};
use std::io::Write;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use crate::math8::scale8;
use crate::types::Rgb;

pub const DDP_PORT: u16 = 4048;

// WLED DDP timeout is ~1 second, so send keepalive every 500ms to be safe
const KEEPALIVE_INTERVAL: Duration = Duration::from_millis(500);

/// Receives each completed frame. Brightness is applied here, never by patterns.
pub trait FrameSink {
    fn send(&mut self, leds: &[Rgb], brightness: u8) -> Result<()>;
}

/// Flatten to RGB bytes with global brightness applied
pub fn encode_frame(leds: &[Rgb], brightness: u8) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(leds.len() * 3);
    for led in leds {
        if brightness == 255 {
            bytes.extend_from_slice(&[led.r, led.g, led.b]);
        } else {
            bytes.extend_from_slice(&[scale8(led.r, brightness), scale8(led.g, brightness), scale8(led.b, brightness)]);
        }
    }
    bytes
}

/// Tracks what was last sent so unchanged frames only go out as keepalives
#[derive(Debug, Default)]
struct SendGate {
    last_frame: Vec<u8>,
    last_send: Option<Instant>,
}

impl SendGate {
    fn should_send(&self, frame: &[u8], now: Instant) -> bool {
        match self.last_send {
            None => true,
            Some(last) => frame != self.last_frame.as_slice() || now.duration_since(last) >= KEEPALIVE_INTERVAL,
        }
    }

    fn sent(&mut self, frame: Vec<u8>, now: Instant) {
        self.last_frame = frame;
        self.last_send = Some(now);
    }
}

/// DDP over UDP to a single WLED device
pub struct DdpSink {
    ip: String,
    connection: DDPConnection,
    gate: SendGate,
}

impl DdpSink {
    pub fn new(ip: &str) -> Result<Self> {
        if ip.trim().is_empty() {
            anyhow::bail!("No WLED address configured (set wled_ip or pass --wled-ip)");
        }
        let dest_addr = format!("{}:{}", ip.trim(), DDP_PORT);
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let connection = DDPConnection::try_new(&dest_addr, PixelConfig::default(), ID::Default, socket)?;
        log::info!("Sending DDP to {}", dest_addr);

        Ok(DdpSink { ip: ip.trim().to_string(), connection, gate: SendGate::default() })
    }
}

impl FrameSink for DdpSink {
    fn send(&mut self, leds: &[Rgb], brightness: u8) -> Result<()> {
        let frame = encode_frame(leds, brightness);
        let now = Instant::now();
        if !self.gate.should_send(&frame, now) {
            return Ok(());
        }
        self.connection
            .write(&frame)
            .map_err(|e| anyhow::anyhow!("Failed to send to {}: {}", self.ip, e))?;
        self.gate.sent(frame, now);
        Ok(())
    }
}

/// Truecolor blocks redrawn in place, one row per `width` pixels
pub struct PreviewSink<W: Write> {
    out: W,
    width: usize,
    rows_drawn: u16,
}

impl<W: Write> PreviewSink<W> {
    pub fn new(out: W, width: usize) -> Self {
        PreviewSink { out, width: width.max(1), rows_drawn: 0 }
    }
}

impl PreviewSink<std::io::Stdout> {
    /// Preview on stdout, as wide as the terminal allows
    pub fn stdout() -> Self {
        let width = crossterm::terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
        PreviewSink::new(std::io::stdout(), width)
    }
}

impl<W: Write> FrameSink for PreviewSink<W> {
    fn send(&mut self, leds: &[Rgb], brightness: u8) -> Result<()> {
        if self.rows_drawn > 0 {
            queue!(self.out, MoveUp(self.rows_drawn), MoveToColumn(0))?;
        }

        let mut rows = 0u16;
        for row in leds.chunks(self.width) {
            for led in row {
                let c = led.scaled(brightness);
                queue!(self.out, SetForegroundColor(Color::Rgb { r: c.r, g: c.g, b: c.b }), Print('█'))?;
            }
            queue!(self.out, ResetColor, Print("\r\n"))?;
            rows = rows.saturating_add(1);
        }

        self.out.flush()?;
        self.rows_drawn = rows;
        Ok(())
    }
}

/// Discards frames; for benchmarking and headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn send(&mut self, _leds: &[Rgb], _brightness: u8) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_applies_brightness() {
        let leds = [Rgb::new(255, 128, 0), Rgb::new(10, 20, 30)];
        assert_eq!(encode_frame(&leds, 255), vec![255, 128, 0, 10, 20, 30]);
        let dimmed = encode_frame(&leds, 128);
        assert_eq!(dimmed[0], 128);
        assert_eq!(dimmed[2], 0);
        assert!(encode_frame(&leds, 0).iter().all(|&b| b == 0));
    }

    #[test]
    fn unchanged_frames_wait_for_keepalive() {
        let mut gate = SendGate::default();
        let t0 = Instant::now();
        let frame = vec![1, 2, 3];
        assert!(gate.should_send(&frame, t0));
        gate.sent(frame.clone(), t0);

        assert!(!gate.should_send(&frame, t0 + Duration::from_millis(100)));
        assert!(gate.should_send(&[9, 9, 9], t0 + Duration::from_millis(100)));
        assert!(gate.should_send(&frame, t0 + KEEPALIVE_INTERVAL));
    }

    #[test]
    fn preview_redraws_in_place() {
        let mut sink = PreviewSink::new(Vec::new(), 4);
        let leds = vec![Rgb::new(255, 0, 0); 10];
        sink.send(&leds, 255).unwrap();
        assert_eq!(sink.rows_drawn, 3);
        let first_len = sink.out.len();
        let text = String::from_utf8(sink.out.clone()).unwrap();
        assert_eq!(text.matches('█').count(), 10);
        assert!(text.contains("38;2;255;0;0"));

        sink.send(&leds, 255).unwrap();
        let text = String::from_utf8(sink.out[first_len..].to_vec()).unwrap();
        // Cursor moves back up over the previous three rows
        assert!(text.starts_with("\x1b[3A"));
    }

    #[test]
    fn empty_address_is_rejected() {
        assert!(DdpSink::new("  ").is_err());
    }
}
