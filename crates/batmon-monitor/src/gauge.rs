//! Fuel gauge access
//!
//! Two backends: a MAX17048 read directly over i2c-dev, and the kernel's
//! `power_supply` class for boards whose gauge already has a driver.

use crate::MonitorError;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

/// Source of raw battery readings
pub trait FuelGauge: Send {
    /// State of charge in percent
    fn read_percent(&mut self) -> Result<f64, MonitorError>;

    /// Cell voltage in volts
    fn read_voltage(&mut self) -> Result<f64, MonitorError>;
}

impl<G: FuelGauge + ?Sized> FuelGauge for Box<G> {
    fn read_percent(&mut self) -> Result<f64, MonitorError> {
        (**self).read_percent()
    }

    fn read_voltage(&mut self) -> Result<f64, MonitorError> {
        (**self).read_voltage()
    }
}

/// VCELL register: 12-bit cell voltage, 1.25 mV per LSB
const REG_VCELL: u8 = 0x02;
/// SOC register: high byte whole percent, low byte 1/256 percent
const REG_SOC: u8 = 0x04;

// I2C_SLAVE from linux/i2c-dev.h
nix::ioctl_write_int_bad!(i2c_set_slave, 0x0703);

/// Decode a VCELL register pair into volts
pub fn decode_vcell(bytes: [u8; 2]) -> f64 {
    let raw = (u16::from(bytes[0]) << 4) | (u16::from(bytes[1]) >> 4);
    f64::from(raw) * 1.25 / 1000.0
}

/// Decode a SOC register pair into percent
pub fn decode_soc(bytes: [u8; 2]) -> f64 {
    f64::from(bytes[0]) + f64::from(bytes[1]) / 256.0
}

/// MAX17048 fuel gauge on a Linux i2c bus
pub struct Max17048 {
    device: File,
    path: PathBuf,
}

impl Max17048 {
    /// Open `/dev/i2c-<bus>` and bind it to the gauge address
    pub fn open(bus: u8, address: u16) -> Result<Self, MonitorError> {
        let path = PathBuf::from(format!("/dev/i2c-{}", bus));
        if !path.exists() {
            return Err(MonitorError::GaugeNotFound(path));
        }

        let device = OpenOptions::new().read(true).write(true).open(&path)?;

        // SAFETY: the descriptor is valid for the lifetime of `device` and
        // I2C_SLAVE takes the address by value.
        unsafe { i2c_set_slave(device.as_raw_fd(), libc::c_int::from(address)) }?;

        tracing::info!("Opened MAX17048 at {} address {:#04x}", path.display(), address);
        Ok(Self { device, path })
    }

    fn read_register(&mut self, register: u8) -> Result<[u8; 2], MonitorError> {
        self.device.write_all(&[register])?;
        let mut buf = [0u8; 2];
        self.device.read_exact(&mut buf).map_err(|e| {
            MonitorError::Gauge(format!(
                "register {:#04x} on {}: {}",
                register,
                self.path.display(),
                e
            ))
        })?;
        Ok(buf)
    }
}

impl FuelGauge for Max17048 {
    fn read_percent(&mut self) -> Result<f64, MonitorError> {
        self.read_register(REG_SOC).map(decode_soc)
    }

    fn read_voltage(&mut self) -> Result<f64, MonitorError> {
        self.read_register(REG_VCELL).map(decode_vcell)
    }
}

/// Standard sysfs power supply directory
pub const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Battery exposed through the kernel power_supply class
pub struct SysfsGauge {
    battery_path: PathBuf,
}

impl SysfsGauge {
    /// Use an explicit power supply directory
    pub fn new(battery_path: PathBuf) -> Self {
        Self { battery_path }
    }

    /// Find the first battery under the standard sysfs directory
    pub fn detect() -> Result<Self, MonitorError> {
        Self::detect_in(Path::new(POWER_SUPPLY_DIR))
    }

    /// Find the first supply whose `type` is `Battery` under `dir`
    pub fn detect_in(dir: &Path) -> Result<Self, MonitorError> {
        if !dir.exists() {
            return Err(MonitorError::GaugeNotFound(dir.to_path_buf()));
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            if let Ok(psu_type) = fs::read_to_string(path.join("type"))
                && psu_type.trim().eq_ignore_ascii_case("battery")
            {
                tracing::info!("Found battery at {}", path.display());
                return Ok(Self::new(path));
            }
        }

        Err(MonitorError::GaugeNotFound(dir.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.battery_path
    }

    fn read_sysfs_int(&self, name: &str) -> Result<i64, MonitorError> {
        let path = self.battery_path.join(name);
        let contents = fs::read_to_string(&path)?;
        contents.trim().parse().map_err(|e| {
            MonitorError::Gauge(format!("{}: {}", path.display(), e))
        })
    }
}

impl FuelGauge for SysfsGauge {
    fn read_percent(&mut self) -> Result<f64, MonitorError> {
        self.read_sysfs_int("capacity").map(|c| c as f64)
    }

    fn read_voltage(&mut self) -> Result<f64, MonitorError> {
        // microvolts
        self.read_sysfs_int("voltage_now")
            .map(|uv| uv as f64 / 1_000_000.0)
    }
}
