//! Register definitions and the time field table for the PCF8563 RTC.
//!
//! Every logical time/date field maps to exactly one register, a mask that
//! strips the flag bits sharing that register, and a legal range. The mapping
//! lives in a single table shared by the read and write paths.

use bitfield::bitfield;

use crate::bcd;

/// Register addresses of the PCF8563 time and date block.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59) with the clock integrity (VL) flag in bit 7
    VlSeconds = 0x02,
    /// Minutes register (0-59)
    Minutes = 0x03,
    /// Hours register (0-23)
    Hours = 0x04,
    /// Day of month register (1-31)
    Days = 0x05,
    /// Day of week register (0-6)
    Weekdays = 0x06,
    /// Month register (1-12) with the century flag in bit 7
    CenturyMonths = 0x07,
    /// Year register (0-99)
    Years = 0x08,
}

/// Logical time and date fields exposed by the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeField {
    /// Calendar year (2000-2099)
    Year = 0,
    /// Month of year (1-12)
    Month = 1,
    /// Day of month (1-31)
    Day = 2,
    /// Day of week (0-6)
    Weekday = 3,
    /// Hour of day (0-23)
    Hour = 4,
    /// Minute (0-59)
    Minute = 5,
    /// Second (0-59)
    Second = 6,
}

impl TimeField {
    /// All fields, in table order.
    pub const ALL: [TimeField; 7] = [
        TimeField::Year,
        TimeField::Month,
        TimeField::Day,
        TimeField::Weekday,
        TimeField::Hour,
        TimeField::Minute,
        TimeField::Second,
    ];

    /// Returns the register layout and range of this field.
    pub const fn spec(self) -> FieldSpec {
        FIELD_TABLE[self as usize]
    }
}

/// How a write to the month field is reduced into range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonthWrap {
    /// `value % 13`. Can store month 0 and never stores 13. This matches
    /// the behavior of existing PCF8563 firmware and is the default.
    #[default]
    Modulo13,
    /// Maps any value onto 1-12, so 0 becomes 12 and 13 becomes 1.
    Calendar,
}

/// Register layout and legal range of one [`TimeField`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldSpec {
    /// The field described by this entry
    pub field: TimeField,
    /// Register holding the field
    pub register: RegAddr,
    /// Bits of the register carrying BCD data
    pub mask: u8,
    /// Smallest value returned by a read, before `offset`
    pub min: u8,
    /// Largest value returned by a read, before `offset`
    pub max: u8,
    /// Writes are reduced modulo this value
    pub modulus: u16,
    /// Added to the clamped register value on read
    pub offset: u16,
}

/// Field table, indexed by `TimeField as usize`.
pub const FIELD_TABLE: [FieldSpec; 7] = [
    FieldSpec {
        field: TimeField::Year,
        register: RegAddr::Years,
        mask: 0xFF,
        min: 0,
        max: 99,
        modulus: 100,
        offset: 2000,
    },
    FieldSpec {
        field: TimeField::Month,
        register: RegAddr::CenturyMonths,
        mask: 0x1F,
        min: 1,
        max: 12,
        modulus: 13,
        offset: 0,
    },
    FieldSpec {
        field: TimeField::Day,
        register: RegAddr::Days,
        mask: 0x3F,
        min: 1,
        max: 31,
        modulus: 32,
        offset: 0,
    },
    FieldSpec {
        field: TimeField::Weekday,
        register: RegAddr::Weekdays,
        mask: 0x07,
        min: 0,
        max: 6,
        modulus: 7,
        offset: 0,
    },
    FieldSpec {
        field: TimeField::Hour,
        register: RegAddr::Hours,
        mask: 0x3F,
        min: 0,
        max: 23,
        modulus: 24,
        offset: 0,
    },
    FieldSpec {
        field: TimeField::Minute,
        register: RegAddr::Minutes,
        mask: 0x7F,
        min: 0,
        max: 59,
        modulus: 60,
        offset: 0,
    },
    FieldSpec {
        field: TimeField::Second,
        register: RegAddr::VlSeconds,
        mask: 0x7F,
        min: 0,
        max: 59,
        modulus: 60,
        offset: 0,
    },
];

// Table order must follow the TimeField discriminants.
const _: () = {
    let mut i = 0;
    while i < FIELD_TABLE.len() {
        assert!(FIELD_TABLE[i].field as usize == i);
        i += 1;
    }
};

impl FieldSpec {
    /// Returns `true` if the masked register content decodes into range.
    pub const fn in_range(&self, raw: u8) -> bool {
        let value = bcd::decode(raw & self.mask);
        value >= self.min && value <= self.max
    }

    /// Converts a raw register byte into the field's logical value.
    ///
    /// Flag bits are masked off and out-of-range content is clamped, so the
    /// result is always within `min..=max` plus `offset`.
    pub fn decode(&self, raw: u8) -> u16 {
        let value = bcd::decode(raw & self.mask).clamp(self.min, self.max);
        u16::from(value) + self.offset
    }

    /// Reduces an arbitrary value into the range stored by the register.
    pub const fn wrap(&self, value: u16, month_wrap: MonthWrap) -> u8 {
        let wrapped = match (self.field, month_wrap) {
            (TimeField::Month, MonthWrap::Calendar) => match value % 12 {
                0 => 12,
                m => m,
            },
            _ => value % self.modulus,
        };
        // every modulus is at most 100
        wrapped as u8
    }

    /// Converts a logical value into the register byte to write.
    pub const fn encode(&self, value: u16, month_wrap: MonthWrap) -> u8 {
        bcd::encode(self.wrap(value, month_wrap))
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register with the clock integrity (VL) flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct VlSeconds(u8);
    impl Debug;
    /// Set by the chip when the clock integrity is no longer guaranteed
    pub integrity_lost, set_integrity_lost: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(VlSeconds);

#[cfg(feature = "defmt")]
impl defmt::Format for VlSeconds {
    fn format(&self, f: defmt::Formatter) {
        let seconds = 10 * self.ten_seconds() + self.seconds();
        defmt::write!(f, "VlSeconds({}s", seconds);
        if self.integrity_lost() {
            defmt::write!(f, ", VL");
        }
        defmt::write!(f, ")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_registers() {
        assert_eq!(TimeField::Second.spec().register as u8, 0x02);
        assert_eq!(TimeField::Minute.spec().register as u8, 0x03);
        assert_eq!(TimeField::Hour.spec().register as u8, 0x04);
        assert_eq!(TimeField::Day.spec().register as u8, 0x05);
        assert_eq!(TimeField::Weekday.spec().register as u8, 0x06);
        assert_eq!(TimeField::Month.spec().register as u8, 0x07);
        assert_eq!(TimeField::Year.spec().register as u8, 0x08);
        for field in TimeField::ALL {
            assert_eq!(field.spec().field, field);
        }
    }

    #[test]
    fn test_decode_always_in_range() {
        for field in TimeField::ALL {
            let spec = field.spec();
            let min = u16::from(spec.min) + spec.offset;
            let max = u16::from(spec.max) + spec.offset;
            for raw in 0..=u8::MAX {
                let value = spec.decode(raw);
                assert!(
                    (min..=max).contains(&value),
                    "{field:?} raw={raw:#04x} decoded to {value}"
                );
            }
        }
    }

    #[test]
    fn test_decode_strips_flag_bits() {
        // VL flag set on 45 seconds
        assert_eq!(TimeField::Second.spec().decode(0xC5), 45);
        // century flag set on December
        assert_eq!(TimeField::Month.spec().decode(0x92), 12);
        assert_eq!(TimeField::Hour.spec().decode(0xD3), 13);
        assert_eq!(TimeField::Weekday.spec().decode(0xFB), 3);
    }

    #[test]
    fn test_decode_clamps() {
        // brand new chip, everything zero
        assert_eq!(TimeField::Month.spec().decode(0x00), 1);
        assert_eq!(TimeField::Day.spec().decode(0x00), 1);
        assert_eq!(TimeField::Second.spec().decode(0x7F), 59);
        assert_eq!(TimeField::Hour.spec().decode(0x3F), 23);
        assert_eq!(TimeField::Weekday.spec().decode(0x07), 6);
        assert_eq!(TimeField::Month.spec().decode(0x13), 12);
    }

    #[test]
    fn test_year_offset() {
        assert_eq!(TimeField::Year.spec().decode(0x00), 2000);
        assert_eq!(TimeField::Year.spec().decode(0x24), 2024);
        assert_eq!(TimeField::Year.spec().decode(0x99), 2099);
        assert_eq!(TimeField::Year.spec().decode(0xFF), 2099);
    }

    #[test]
    fn test_in_range() {
        assert!(TimeField::Second.spec().in_range(0xD9));
        assert!(!TimeField::Second.spec().in_range(0x6A));
        assert!(!TimeField::Month.spec().in_range(0x00));
        assert!(TimeField::Month.spec().in_range(0x12));
        assert!(!TimeField::Year.spec().in_range(0xA0));
    }

    #[test]
    fn test_encode_wraps() {
        let second = TimeField::Second.spec();
        assert_eq!(second.encode(65, MonthWrap::Modulo13), 0x05);
        assert_eq!(
            second.encode(65, MonthWrap::Modulo13),
            second.encode(5, MonthWrap::Modulo13)
        );
        assert_eq!(TimeField::Hour.spec().encode(24, MonthWrap::Modulo13), 0x00);
        assert_eq!(TimeField::Day.spec().encode(32, MonthWrap::Modulo13), 0x00);
        assert_eq!(TimeField::Day.spec().encode(31, MonthWrap::Modulo13), 0x31);
        assert_eq!(TimeField::Weekday.spec().encode(9, MonthWrap::Modulo13), 0x02);
        assert_eq!(TimeField::Year.spec().encode(2024, MonthWrap::Modulo13), 0x24);
        assert_eq!(TimeField::Year.spec().encode(u16::MAX, MonthWrap::Modulo13), 0x35);
    }

    #[test]
    fn test_month_wrap_modulo13() {
        let month = TimeField::Month.spec();
        assert_eq!(month.encode(12, MonthWrap::Modulo13), 0x12);
        assert_eq!(month.encode(13, MonthWrap::Modulo13), 0x00);
        assert_eq!(month.encode(14, MonthWrap::Modulo13), 0x01);
    }

    #[test]
    fn test_month_wrap_calendar() {
        let month = TimeField::Month.spec();
        assert_eq!(month.encode(0, MonthWrap::Calendar), 0x12);
        assert_eq!(month.encode(1, MonthWrap::Calendar), 0x01);
        assert_eq!(month.encode(12, MonthWrap::Calendar), 0x12);
        assert_eq!(month.encode(13, MonthWrap::Calendar), 0x01);
        assert_eq!(month.encode(24, MonthWrap::Calendar), 0x12);
        // the policy only applies to the month field
        assert_eq!(TimeField::Day.spec().encode(32, MonthWrap::Calendar), 0x00);
    }

    #[test]
    fn test_vl_seconds_register() {
        let mut seconds = VlSeconds::from(0xD9);
        assert!(seconds.integrity_lost());
        assert_eq!(seconds.ten_seconds(), 5);
        assert_eq!(seconds.seconds(), 9);
        seconds.set_integrity_lost(false);
        assert_eq!(u8::from(seconds), 0x59);

        let seconds = VlSeconds::from(0x30);
        assert!(!seconds.integrity_lost());
        assert_eq!(u8::from(seconds), 0x30);
    }
}
