//! A platform-agnostic driver for the PCF8563 real-time clock.
//!
//! The driver exposes the clock as seven logical fields (year, month, day,
//! weekday, hour, minute, second) and hides the chip's packed BCD encoding
//! and the flag bits sharing the time registers.
//!
//! Field values are normalized, never rejected:
//! - reads mask flag bits and clamp the decoded value into the field's range,
//!   so a corrupted or brand-new chip still yields a well-formed value
//! - writes reduce the value modulo the field's range before encoding
//! - every write ends by clearing the clock integrity (VL) flag in the
//!   seconds register, so subsequent reads are trusted by the chip
//!
//! The year register holds 0-99, read back as 2000-2099.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf8563::{TimeField, PCF8563, DEFAULT_ADDRESS};
//!
//! let mut rtc = PCF8563::new(i2c, DEFAULT_ADDRESS);
//! rtc.set_field(TimeField::Hour, 7)?;
//! let minute = rtc.field(TimeField::Minute)?;
//! ```
//!
//! # Features
//!
//! - `async`: async driver in [`asynch`] over `embedded-hal-async`
//! - `log`: debug logging through the `log` crate
//! - `defmt`: debug logging through `defmt`
//!
//! # Concurrency
//!
//! Each write is two bus sequences (field write, then integrity restart) and
//! is not atomic. Callers sharing the bus must serialize access themselves.
#![cfg_attr(not(test), no_std)]

// Logging shims, resolved once for the whole crate.
cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { defmt::warn!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { defmt::error!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { log::warn!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { log::error!($($arg)*) };
        }
    } else {
        macro_rules! debug {
            ($($arg:tt)*) => {};
        }
        macro_rules! warn {
            ($($arg:tt)*) => {};
        }
        macro_rules! error {
            ($($arg:tt)*) => {};
        }
    }
}

pub mod bcd;
mod datetime;
mod registers;

#[cfg(feature = "async")]
pub mod asynch;

use chrono::NaiveDateTime;
use embedded_hal::i2c::I2c;

use crate::datetime::CalendarFields;
pub use crate::datetime::DateTimeError;
pub use crate::registers::{FieldSpec, MonthWrap, RegAddr, TimeField, VlSeconds, FIELD_TABLE};

/// I2C address of the PCF8563.
pub const DEFAULT_ADDRESS: u8 = 0x51;

/// Driver configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Reduction applied to month writes
    pub month_wrap: MonthWrap,
}

/// Errors returned by the driver.
///
/// Field values never cause an error; only the bus and the calendar
/// conversions can fail.
#[derive(Debug)]
pub enum PCF8563Error<I2CE> {
    /// I2C bus error
    I2c(I2CE),
    /// Calendar conversion error
    DateTime(DateTimeError),
}

impl<I2CE> From<I2CE> for PCF8563Error<I2CE> {
    fn from(e: I2CE) -> Self {
        PCF8563Error::I2c(e)
    }
}

/// PCF8563 real-time clock driver.
///
/// The driver owns the bus handle and keeps no state between calls apart
/// from its [`Config`].
pub struct PCF8563<I2C: I2c> {
    i2c: I2C,
    address: u8,
    config: Config,
}

impl<I2C: I2c> PCF8563<I2C> {
    /// Creates a new driver with the default configuration.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x51)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::with_config(i2c, address, Config::default())
    }

    /// Creates a new driver with the given configuration.
    pub fn with_config(i2c: I2C, address: u8, config: Config) -> Self {
        Self {
            i2c,
            address,
            config,
        }
    }

    /// Replaces the driver configuration. Does not touch the device.
    pub fn configure(&mut self, config: &Config) {
        debug!("PCF8563: month wrap {:?}", config.month_wrap);
        self.config = *config;
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the driver and returns the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, register: RegAddr) -> Result<u8, PCF8563Error<I2C::Error>> {
        let mut data = [0];
        self.i2c.write(self.address, &[register as u8])?;
        self.i2c.read(self.address, &mut data)?;
        debug!("PCF8563: read {:?} = {:#x}", register, data[0]);
        Ok(data[0])
    }

    fn write_register(
        &mut self,
        register: RegAddr,
        value: u8,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        debug!("PCF8563: write {:?} = {:#x}", register, value);
        self.i2c.write(self.address, &[register as u8, value])?;
        Ok(())
    }

    /// Reads the untouched register byte behind a field, flag bits included.
    ///
    /// Intended for diagnostics; no masking, decoding or clamping is applied.
    pub fn field_raw(&mut self, field: TimeField) -> Result<u8, PCF8563Error<I2C::Error>> {
        self.read_register(field.spec().register)
    }

    /// Reads a field as a logical value.
    ///
    /// The result is always within the field's range (2000-2099 for
    /// [`TimeField::Year`]), whatever the register holds.
    pub fn field(&mut self, field: TimeField) -> Result<u16, PCF8563Error<I2C::Error>> {
        let spec = field.spec();
        let raw = self.read_register(spec.register)?;
        if !spec.in_range(raw) {
            warn!("PCF8563: {:?} register {:#x} out of range, clamped", field, raw);
        }
        Ok(spec.decode(raw))
    }

    fn write_field(
        &mut self,
        field: TimeField,
        value: u16,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let spec = field.spec();
        self.write_register(spec.register, spec.encode(value, self.config.month_wrap))
    }

    /// Writes a field, then clears the clock integrity flag.
    ///
    /// `value` is reduced modulo the field's range, so a write never fails
    /// for being out of range (65 seconds stores 5). Month writes follow
    /// [`Config::month_wrap`].
    ///
    /// On success the VL flag in the seconds register is clear.
    pub fn set_field(
        &mut self,
        field: TimeField,
        value: u16,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        self.write_field(field, value)?;
        self.restart_clock_integrity()
    }

    /// Clears the clock integrity (VL) flag, keeping the seconds count.
    ///
    /// Read-modify-write of the seconds register. The chip keeps the flag set
    /// after power loss and until software clears it.
    pub fn restart_clock_integrity(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let mut seconds = VlSeconds::from(self.read_register(RegAddr::VlSeconds)?);
        if seconds.integrity_lost() {
            debug!("PCF8563: clearing clock integrity flag");
        }
        seconds.set_integrity_lost(false);
        self.write_register(RegAddr::VlSeconds, seconds.into())
    }

    /// Reads all fields and assembles them into a date and time.
    ///
    /// The fields are read one register at a time, so a rollover between
    /// reads is not detected.
    ///
    /// # Errors
    /// `DateTime(InvalidDateTime)` if the clamped fields do not form a real
    /// date, e.g. February 31.
    pub fn datetime(&mut self) -> Result<NaiveDateTime, PCF8563Error<I2C::Error>> {
        let mut fields = CalendarFields::default();
        for field in TimeField::ALL {
            fields.set(field, self.field(field)?);
        }
        fields.into_datetime().map_err(PCF8563Error::DateTime)
    }

    /// Writes every field from a date and time, then clears the clock
    /// integrity flag once.
    ///
    /// # Errors
    /// `DateTime(YearNotAfter1999)` or `DateTime(YearNotBefore2100)` if the
    /// year cannot be stored. Nothing is written in that case.
    pub fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let fields = CalendarFields::from_datetime(datetime).map_err(PCF8563Error::DateTime)?;
        for field in TimeField::ALL {
            self.write_field(field, fields.get(field))?;
        }
        self.restart_clock_integrity()
    }
}

// Per-field shorthands over `field` and `set_field`
macro_rules! impl_field_access {
    ($(($name:ident, $field:ident)),+) => {
        impl<I2C: I2c> PCF8563<I2C> {
            $(
                paste::paste! {
                    #[doc = concat!("Reads the ", stringify!($name), " field. See [`PCF8563::field`].")]
                    pub fn $name(&mut self) -> Result<u16, PCF8563Error<I2C::Error>> {
                        self.field(TimeField::$field)
                    }

                    #[doc = concat!("Writes the ", stringify!($name), " field. See [`PCF8563::set_field`].")]
                    pub fn [<set_ $name>](&mut self, value: u16) -> Result<(), PCF8563Error<I2C::Error>> {
                        self.set_field(TimeField::$field, value)
                    }
                }
            )+
        }
    }
}

impl_field_access!(
    (year, Year),
    (month, Month),
    (day, Day),
    (weekday, Weekday),
    (hour, Hour),
    (minute, Minute),
    (second, Second)
);
