// src/monitor.rs
//! Serial ingestion: reads NMEA lines and folds them into the fix store

use crate::{
    error::{GpsError, Result},
    gps::{nmea, DecodedSentence, FixStore},
};
use log::{debug, info, trace, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Longest line kept while waiting for its newline. NMEA sentences are at
/// most 82 bytes.
pub const MAX_LINE_LEN: usize = 1024;

/// Counters kept by one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    pub time_updates: u64,
    pub location_updates: u64,
    pub skipped: u64,
    pub decode_errors: u64,
    pub read_errors: u64,
}

/// The only writer of the [`FixStore`].
pub struct StreamIngester {
    store: FixStore,
    running: Arc<AtomicBool>,
    read_timeout: Duration,
    max_consecutive_read_errors: u32,
}

impl StreamIngester {
    pub fn new(store: FixStore, running: Arc<AtomicBool>) -> Self {
        Self {
            store,
            running,
            read_timeout: Duration::from_secs(5),
            max_consecutive_read_errors: 0,
        }
    }

    /// How long a single read may wait for data before it is reported.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Give up after this many failed reads in a row. Zero never gives up.
    pub fn with_max_consecutive_read_errors(mut self, max: u32) -> Self {
        self.max_consecutive_read_errors = max;
        self
    }

    /// Read lines until the stream ends or the running flag is cleared.
    ///
    /// Read errors and undecodable lines are logged and skipped. The loop
    /// only fails when `max_consecutive_read_errors` is set and reached.
    pub async fn run<R: AsyncRead + Unpin>(&self, stream: R) -> Result<IngestStats> {
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        let mut stats = IngestStats::default();
        let mut consecutive_errors = 0u32;
        // Set while the tail of an oversized line is being dropped.
        let mut discarding = false;

        while self.running.load(Ordering::Relaxed) {
            // A timed out read leaves its partial line in the buffer and
            // the next read appends to it.
            let limit = (MAX_LINE_LEN + 1).saturating_sub(line.len()) as u64;
            let mut limited = (&mut reader).take(limit);
            let read = tokio::time::timeout(self.read_timeout, limited.read_until(b'\n', &mut line)).await;
            match read {
                Ok(Ok(0)) => {
                    if !line.is_empty() && !discarding {
                        self.handle_line(&String::from_utf8_lossy(&line), &mut stats);
                    }
                    info!("GPS stream closed");
                    break;
                }
                Ok(Ok(_)) => {
                    consecutive_errors = 0;
                    if line.last() == Some(&b'\n') {
                        if !discarding {
                            self.handle_line(&String::from_utf8_lossy(&line), &mut stats);
                        }
                        discarding = false;
                        line.clear();
                    } else if line.len() > MAX_LINE_LEN {
                        if !discarding {
                            stats.lines += 1;
                            stats.decode_errors += 1;
                            warn!("Dropping line longer than {} bytes without a newline", MAX_LINE_LEN);
                        }
                        discarding = true;
                        line.clear();
                    } else if !discarding {
                        // Final line of a stream that does not end in a newline.
                        self.handle_line(&String::from_utf8_lossy(&line), &mut stats);
                        line.clear();
                    }
                }
                Ok(Err(e)) => {
                    stats.read_errors += 1;
                    consecutive_errors += 1;
                    warn!("Error while reading from GPS stream: {}", e);
                    if self.max_consecutive_read_errors > 0
                        && consecutive_errors >= self.max_consecutive_read_errors
                    {
                        return Err(GpsError::StreamFailed { consecutive_errors });
                    }
                }
                Err(_) => {
                    stats.read_errors += 1;
                    warn!("No data from GPS stream within {:?}", self.read_timeout);
                }
            }
        }

        Ok(stats)
    }

    /// Decode one line and apply it to the store
    pub fn handle_line(&self, line: &str, stats: &mut IngestStats) {
        let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        if line.trim().is_empty() {
            return;
        }
        stats.lines += 1;
        debug!("Raw sentence: {}", line);

        match nmea::decode(line) {
            Ok(DecodedSentence::TimeDate(s)) => {
                debug!("New time {}", s.timestamp);
                self.store.update_time(s.timestamp);
                stats.time_updates += 1;
            }
            Ok(DecodedSentence::Location(s)) => {
                debug!(
                    "Latitude: {}, Longitude: {}, Altitude: {}, Satellites: {}",
                    s.latitude, s.longitude, s.altitude, s.satellites
                );
                self.store.apply_location(s);
                stats.location_updates += 1;
            }
            Ok(other @ DecodedSentence::Other { .. }) => {
                trace!("Skipping {}", other.kind());
                stats.skipped += 1;
            }
            Err(e) => {
                warn!("{}", e);
                stats.decode_errors += 1;
            }
        }
    }
}

/// Open the GPS receiver's serial port
pub fn open_serial(port: &str, baudrate: u32, timeout: Duration) -> Result<SerialStream> {
    info!("Connecting to GPS on {} at {} baud", port, baudrate);

    tokio_serial::new(port, baudrate)
        .timeout(timeout)
        .open_native_async()
        .map_err(|e| GpsError::Connection(format!("Failed to open serial port {}: {}", port, e)))
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
