//! Live detector stream over TCP.
//!
//! The arbiter listens; the detector process connects and writes one JSON
//! frame per line. A dropped connection is not fatal: the source waits for
//! the detector to reconnect and keeps counting frames across connections.
//! Malformed lines are logged and skipped.

use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};

use anyhow::{Context, Result};

use super::{parse_frame_line, DetectorSource, SourceStats};
use crate::track::DetectionFrame;

pub struct TcpSource {
    addr: String,
    listener: Option<TcpListener>,
    conn: Option<BufReader<TcpStream>>,
    frames_read: u64,
    connections: u64,
}

impl TcpSource {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            listener: None,
            conn: None,
            frames_read: 0,
            connections: 0,
        }
    }

    fn accept(&mut self) -> Result<()> {
        let Some(listener) = self.listener.as_ref() else {
            anyhow::bail!("tcp source not connected");
        };
        log::info!("TcpSource: waiting for detector on {}", self.addr);
        let (stream, peer) = listener
            .accept()
            .with_context(|| format!("accepting detector connection on {}", self.addr))?;
        self.connections += 1;
        log::info!("TcpSource: detector connected from {}", peer);
        self.conn = Some(BufReader::new(stream));
        Ok(())
    }
}

impl DetectorSource for TcpSource {
    fn connect(&mut self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .with_context(|| format!("binding detection listener on {}", self.addr))?;
        self.listener = Some(listener);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<DetectionFrame>> {
        loop {
            if self.conn.is_none() {
                self.accept()?;
            }
            let Some(reader) = self.conn.as_mut() else {
                continue;
            };

            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    log::warn!("TcpSource: detector disconnected");
                    self.conn = None;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("TcpSource: read failed, dropping connection: {}", e);
                    self.conn = None;
                    continue;
                }
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_frame_line(&line) {
                Ok(frame) => {
                    self.frames_read += 1;
                    return Ok(Some(frame));
                }
                Err(e) => {
                    log::warn!("TcpSource: skipping bad frame: {}", e);
                }
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.conn.is_some()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_read,
            source: format!("tcp://{}", self.addr),
        }
    }
}
