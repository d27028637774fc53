//! # Serial Communication Module
//!
//! Handles the UART connection to the New Dawn unit.
//!
//! This module handles:
//! - Opening the serial port at 460,800 baud, 8N1, no flow control
//! - Bounded-timeout reads of whatever bytes are available
//! - Writing handshake responses

pub mod port_trait;

use crate::error::{LinkError, Result};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Duration;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

pub use port_trait::LinkTransport;

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC devices
    "/dev/ttyS1",   // On-board UART
];

/// Serial link to the New Dawn unit
pub struct SerialTransport {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialTransport {
    /// Open a specific serial device
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Line speed; the New Dawn unit uses 460,800
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Serial`] if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dawn_link::serial::SerialTransport;
    /// use dawn_link::wire::protocol::LINK_BAUD_RATE;
    ///
    /// let serial = SerialTransport::open("/dev/ttyUSB0", LINK_BAUD_RATE)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = Self::open_port(path, baud_rate)?;
        info!("Serial interface opened at {} ({} baud)", path, baud_rate);

        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Open the first device in `paths` that can be opened
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::SerialPortNotFound`] listing every path tried
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open(path, baud_rate) {
                Ok(serial) => return Ok(serial),
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(LinkError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| LinkError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl LinkTransport for SerialTransport {
    async fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<usize> {
        match tokio::time::timeout(wait, self.port.read(buf)).await {
            // End of stream: the device hung up
            Ok(Ok(0)) if !buf.is_empty() => Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(result) => result,
            Err(_) => Ok(0),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(&mut self.port, data).await?;
        self.port.flush().await
    }
}
