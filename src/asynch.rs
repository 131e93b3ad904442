//! Async implementation of the PCF8563 driver.
//!
//! This module provides an async interface to the PCF8563 RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled. Every operation issues the same bus transactions, in the same
//! order, as the blocking driver.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf8563::asynch::PCF8563;
//!
//! let mut rtc = PCF8563::new(i2c, pcf8563::DEFAULT_ADDRESS);
//! rtc.set_field(TimeField::Minute, 30).await?;
//! let hour = rtc.field(TimeField::Hour).await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{datetime::CalendarFields, Config, PCF8563Error, RegAddr, TimeField, VlSeconds};

/// PCF8563 Real-Time Clock async driver.
pub struct PCF8563<I2C: I2c> {
    i2c: I2C,
    address: u8,
    config: Config,
}

impl<I2C: I2c> PCF8563<I2C> {
    /// Creates a new async driver with the default configuration.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x51)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::with_config(i2c, address, Config::default())
    }

    /// Creates a new async driver with the given configuration.
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

    async fn read_register(&mut self, register: RegAddr) -> Result<u8, PCF8563Error<I2C::Error>> {
        let mut data = [0];
        self.i2c.write(self.address, &[register as u8]).await?;
        self.i2c.read(self.address, &mut data).await?;
        debug!("PCF8563: read {:?} = {:#x}", register, data[0]);
        Ok(data[0])
    }

    async fn write_register(
        &mut self,
        register: RegAddr,
        value: u8,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        debug!("PCF8563: write {:?} = {:#x}", register, value);
        self.i2c
            .write(self.address, &[register as u8, value])
            .await?;
        Ok(())
    }

    /// Reads the untouched register byte behind a field, flag bits included.
    pub async fn field_raw(&mut self, field: TimeField) -> Result<u8, PCF8563Error<I2C::Error>> {
        self.read_register(field.spec().register).await
    }

    /// Reads a field as a logical value, masked and clamped into range.
    pub async fn field(&mut self, field: TimeField) -> Result<u16, PCF8563Error<I2C::Error>> {
        let spec = field.spec();
        let raw = self.read_register(spec.register).await?;
        if !spec.in_range(raw) {
            warn!("PCF8563: {:?} register {:#x} out of range, clamped", field, raw);
        }
        Ok(spec.decode(raw))
    }

    async fn write_field(
        &mut self,
        field: TimeField,
        value: u16,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let spec = field.spec();
        self.write_register(spec.register, spec.encode(value, self.config.month_wrap))
            .await
    }

    /// Writes a field reduced into range, then clears the clock integrity
    /// flag.
    pub async fn set_field(
        &mut self,
        field: TimeField,
        value: u16,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        self.write_field(field, value).await?;
        self.restart_clock_integrity().await
    }

    /// Clears the clock integrity (VL) flag, keeping the seconds count.
    pub async fn restart_clock_integrity(&mut self) -> Result<(), PCF8563Error<I2C::Error>> {
        let mut seconds = VlSeconds::from(self.read_register(RegAddr::VlSeconds).await?);
        if seconds.integrity_lost() {
            debug!("PCF8563: clearing clock integrity flag");
        }
        seconds.set_integrity_lost(false);
        self.write_register(RegAddr::VlSeconds, seconds.into()).await
    }

    /// Reads all fields and assembles them into a date and time.
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` - The current date and time
    /// * `Err(PCF8563Error)` on bus error or if the fields do not form a date
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, PCF8563Error<I2C::Error>> {
        let mut fields = CalendarFields::default();
        for field in TimeField::ALL {
            fields.set(field, self.field(field).await?);
        }
        fields.into_datetime().map_err(PCF8563Error::DateTime)
    }

    /// Writes every field from a date and time, then clears the clock
    /// integrity flag once.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(PCF8563Error)` on bus error or if the year is outside 2000-2099
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), PCF8563Error<I2C::Error>> {
        let fields = CalendarFields::from_datetime(datetime).map_err(PCF8563Error::DateTime)?;
        for field in TimeField::ALL {
            self.write_field(field, fields.get(field)).await?;
        }
        self.restart_clock_integrity().await
    }
}

// Per-field shorthands over `field` and `set_field`
macro_rules! impl_field_access {
    ($(($name:ident, $field:ident)),+) => {
        impl<I2C: I2c> PCF8563<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads the ", stringify!($name), " field.")]
                    pub async fn $name(&mut self) -> Result<u16, PCF8563Error<I2C::Error>> {
                        self.field(TimeField::$field).await
                    }

                    #[doc = concat!("Writes the ", stringify!($name), " field.")]
                    pub async fn [<set_ $name>](&mut self, value: u16) -> Result<(), PCF8563Error<I2C::Error>> {
                        self.set_field(TimeField::$field, value).await
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
