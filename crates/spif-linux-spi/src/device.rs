//! Linux spidev transport
//!
//! [`LinuxSpi`] implements `SpiTransport` on top of `SPI_IOC_MESSAGE`. A
//! command frame followed by a receive phase is submitted as one message of
//! two transfers, so chip select stays asserted between them.

use crate::error::{LinuxSpiError, Result};

use spif_core::transport::SpiTransport;
use spif_core::Result as CoreResult;

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::{Duration, Instant};

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock speed in Hz (2 MHz)
const DEFAULT_SPEED_HZ: u32 = 2_000_000;

/// Opcode, 24-bit address and one dummy byte
const MAX_HEADER_LEN: usize = 5;

/// Interval between two `flock` attempts
const LOCK_RETRY: Duration = Duration::from_millis(1);

/// SPI mode constants
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: u8 = 0;
    /// SPI mode 1: CPOL=0, CPHA=1
    pub const MODE_1: u8 = 1;
    /// SPI mode 2: CPOL=1, CPHA=0
    pub const MODE_2: u8 = 2;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: u8 = 3;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of the kernel's struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// SPI_IOC_MESSAGE(n) = _IOW('k', 0, char[n * sizeof(spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// Kernel struct spi_ioc_transfer
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

impl SpiIocTransfer {
    fn tx(buf: &[u8], speed_hz: u32) -> Self {
        Self {
            tx_buf: buf.as_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }

    fn rx(buf: &mut [u8], speed_hz: u32) -> Self {
        Self {
            rx_buf: buf.as_mut_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 2 MHz)
    pub speed_hz: u32,
    /// SPI mode (0-3, default: 0)
    pub mode: u8,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: mode::MODE_0,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// SPI transport over a spidev device node
pub struct LinuxSpi {
    file: File,
    max_kernel_buf_size: usize,
    speed_hz: u32,
    locked: bool,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let mode = config.mode;
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = config.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz)",
            config.device,
            mode,
            speed / 1000
        );

        let max_kernel_buf_size = get_max_kernel_buf_size();
        log::debug!(
            "linux_spi: Max kernel buffer size: {} bytes",
            max_kernel_buf_size
        );

        Ok(Self {
            file,
            max_kernel_buf_size,
            speed_hz: speed,
            locked: false,
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Submit one SPI message: an optional transmit phase followed by an
    /// optional receive phase, under a single chip select
    fn message(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let total = tx.len() + rx.len();
        if total > self.max_kernel_buf_size {
            return Err(LinuxSpiError::TransferTooLarge {
                len: total,
                max: self.max_kernel_buf_size,
            });
        }

        let mut transfers = Vec::with_capacity(2);
        if !tx.is_empty() {
            transfers.push(SpiIocTransfer::tx(tx, self.speed_hz));
        }
        if !rx.is_empty() {
            transfers.push(SpiIocTransfer::rx(rx, self.speed_hz));
        }
        if transfers.is_empty() {
            return Ok(());
        }

        let ioctl_num = ioctl::spi_ioc_message(transfers.len() as u8);
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), ioctl_num, transfers.as_ptr()) };

        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(())
    }

    /// Take an exclusive `flock` on the device node, polling until `timeout_ms`
    fn flock(&mut self, timeout_ms: u32) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);

        loop {
            let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
            if ret == 0 {
                self.locked = true;
                return Ok(());
            }

            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EWOULDBLOCK) {
                return Err(LinuxSpiError::LockFailed(err));
            }
            if Instant::now() >= deadline {
                return Err(LinuxSpiError::LockTimeout(timeout_ms));
            }
            thread::sleep(LOCK_RETRY);
        }
    }
}

fn core_error(err: LinuxSpiError) -> spif_core::Error {
    log::error!("linux_spi: {}", err);
    err.into()
}

impl SpiTransport for LinuxSpi {
    fn lock(&mut self, timeout_ms: u32) -> CoreResult<()> {
        self.flock(timeout_ms).map_err(core_error)
    }

    fn unlock(&mut self) {
        if !self.locked {
            return;
        }
        let ret = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if ret != 0 {
            log::warn!(
                "linux_spi: Failed to unlock device: {}",
                std::io::Error::last_os_error()
            );
        }
        self.locked = false;
    }

    fn max_read_len(&self) -> usize {
        self.max_kernel_buf_size.saturating_sub(MAX_HEADER_LEN)
    }

    fn send(&mut self, tx: &[u8]) -> CoreResult<()> {
        self.message(tx, &mut []).map_err(core_error)
    }

    fn recv(&mut self, rx: &mut [u8]) -> CoreResult<()> {
        self.message(&[], rx).map_err(core_error)
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> CoreResult<()> {
        self.message(tx, rx).map_err(core_error)
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size > 0 {
        page_size as usize
    } else {
        4096
    }
}

/// Parse programmer options from a list of key-value pairs
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=4000` - Optional: speed in kHz (default: 2000)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxSpiConfig> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                let speed_khz: u32 = value.parse().map_err(|_| {
                    LinuxSpiError::InvalidParameter(format!("Invalid spispeed value: {}", value))
                })?;
                config.speed_hz = speed_khz.saturating_mul(1000);
            }
            "mode" => {
                let mode: u8 = value.parse().map_err(|_| {
                    LinuxSpiError::InvalidParameter(format!("Invalid mode value: {}", value))
                })?;
                if mode > mode::MODE_3 {
                    return Err(LinuxSpiError::InvalidParameter(format!(
                        "Invalid SPI mode: {} (must be 0-3)",
                        mode
                    )));
                }
                config.mode = mode;
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err(LinuxSpiError::NoDevice);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("dev", "/dev/spidev1.0"),
            ("spispeed", "4000"),
            ("mode", "3"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/spidev1.0");
        assert_eq!(config.speed_hz, 4_000_000);
        assert_eq!(config.mode, mode::MODE_3);
    }

    #[test]
    fn test_parse_options_defaults() {
        let config = parse_options(&[("dev", "/dev/spidev0.0")]).unwrap();
        assert_eq!(config, LinuxSpiConfig::new("/dev/spidev0.0"));
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(parse_options(&[]), Err(LinuxSpiError::NoDevice)));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_message_ioctl_numbers() {
        assert_eq!(ioctl::spi_ioc_message(1), 0x4020_6B00);
        assert_eq!(ioctl::spi_ioc_message(2), 0x4040_6B00);
    }

    #[test]
    fn test_transfer_layout() {
        assert_eq!(
            std::mem::size_of::<SpiIocTransfer>(),
            ioctl::SPI_IOC_TRANSFER_SIZE
        );
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            spif_core::Error::from(LinuxSpiError::LockTimeout(10)),
            spif_core::Error::LockTimeout
        );
        assert_eq!(
            spif_core::Error::from(LinuxSpiError::NoDevice),
            spif_core::Error::Transport
        );
    }
}
