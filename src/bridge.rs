use std::{
    io::{ErrorKind, Read, Write},
    net::{Shutdown, TcpStream},
};
use thiserror::Error;

use crate::{
    device::{DeviceCommand, DeviceError, DeviceRecord},
    nmea::NmeaSentence,
    read_until::{get_reader, DelimitedReader},
    ubx::ResetKind,
};

/// Largest chunk taken from the TCP client per read
pub const UBX_READ_SIZE: usize = 1024;

#[derive(Error, Debug)]
/// Conditions that stop one direction of the bridge
pub enum BridgeError {
    #[error("Failed to read from serial port: {0}")]
    SerialRead(std::io::Error),
    #[error("Failed to write to serial port: {0}")]
    SerialWrite(std::io::Error),
    #[error("Failed to read from TCP client: {0}")]
    TcpRead(std::io::Error),
    #[error("Failed to write to TCP client: {0}")]
    TcpWrite(std::io::Error),
    #[error("Failed to encode device command: {0}")]
    Encode(#[from] DeviceError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Message counters for one direction of the bridge
pub struct TranslatorStats {
    /// Lines or chunks read
    pub received: usize,
    /// Sentences or commands forwarded
    pub forwarded: usize,
    /// Records that could not be decoded
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
/// What a single serial line turned into
pub enum Translation {
    /// Empty or whitespace-only line
    Blank,
    /// A sentence to forward to the TCP client
    Sentence(NmeaSentence),
    /// A `TEMP` record, only logged
    Temp(serde_json::Value),
    /// A record of a type the bridge does not handle
    Ignored(String),
}

/// Turn one line of device output into what should be sent to the TCP client.
pub fn translate_line(line: &str) -> Result<Translation, DeviceError> {
    if line.trim().is_empty() {
        return Ok(Translation::Blank);
    }
    Ok(match DeviceRecord::parse(line)? {
        DeviceRecord::GpsLine(line) => Translation::Sentence(
            NmeaSentence::from_device_line(&line)?.rewrite_constellation(),
        ),
        DeviceRecord::Temp(value) => Translation::Temp(value),
        DeviceRecord::Other(kind) => Translation::Ignored(kind),
    })
}

/// Forwards NMEA sentences from the device to the TCP client.
pub struct SentenceTranslator<R, W> {
    lines: DelimitedReader<R>,
    output: W,
    stats: TranslatorStats,
}

impl<R: Read, W: Write> SentenceTranslator<R, W> {
    pub fn new(serial: R, output: W) -> Self {
        Self {
            lines: get_reader(serial, b"\n"),
            output,
            stats: TranslatorStats::default(),
        }
    }

    pub fn stats(&self) -> TranslatorStats {
        self.stats
    }

    /// Run until the serial stream ends or the TCP client goes away.
    ///
    /// Undecodable lines are logged and skipped; only I/O failures end the loop.
    pub fn run(&mut self) -> Result<TranslatorStats, BridgeError> {
        for line in self.lines.by_ref() {
            let line = line.map_err(BridgeError::SerialRead)?;
            let line = String::from_utf8_lossy(&line);
            self.stats.received += 1;
            match translate_line(&line) {
                Ok(Translation::Sentence(sentence)) => {
                    log::info!("{sentence} ({})", sentence.talker());
                    self.output
                        .write_all(sentence.to_wire().as_bytes())
                        .and_then(|_| self.output.flush())
                        .map_err(BridgeError::TcpWrite)?;
                    self.stats.forwarded += 1;
                }
                Ok(Translation::Temp(record)) => {
                    log::warn!("Device not tracking: {record}");
                }
                Ok(Translation::Blank) | Ok(Translation::Ignored(_)) => {}
                Err(e) => {
                    self.stats.dropped += 1;
                    log::warn!("Dropped serial line {:?}: {e}", line.trim_end());
                }
            }
        }
        log::info!("Serial stream ended");
        Ok(self.stats)
    }
}

/// Forwards u-center reset commands to the device.
pub struct CommandTranslator<R, W> {
    input: R,
    serial: W,
    stats: TranslatorStats,
}

impl<R: Read, W: Write> CommandTranslator<R, W> {
    pub fn new(input: R, serial: W) -> Self {
        Self {
            input,
            serial,
            stats: TranslatorStats::default(),
        }
    }

    pub fn stats(&self) -> TranslatorStats {
        self.stats
    }

    /// Run until the TCP client closes its side or the serial port fails.
    ///
    /// A zero-length read is the client closing the connection.
    pub fn run(&mut self) -> Result<TranslatorStats, BridgeError> {
        let mut buf = [0; UBX_READ_SIZE];
        loop {
            let n = match self.input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BridgeError::TcpRead(e)),
            };
            self.stats.received += 1;
            let Some(kind) = ResetKind::from_frame(&buf[..n]) else {
                log::trace!("Ignoring {n} bytes from client");
                continue;
            };
            log::info!("UBX {kind} START");
            let command = DeviceCommand::from(kind).to_line()?;
            self.serial
                .write_all(command.as_bytes())
                .and_then(|_| self.serial.flush())
                .map_err(BridgeError::SerialWrite)?;
            self.stats.forwarded += 1;
        }
        log::info!("TCP client closed the connection");
        Ok(self.stats)
    }
}

/// Close both directions of the client connection, waking a blocked reader.
pub fn hang_up(conn: &TcpStream) -> std::io::Result<()> {
    let res = conn.shutdown(Shutdown::Both);
    match &res {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotConnected => {
            log::debug!("TCP client already disconnected: {e}")
        }
        Err(e) => log::warn!("Failed to shut down TCP client: {e}"),
    }
    res
}
