//! Conversion between the PCF8563 field values and chrono's `NaiveDateTime`.
//!
//! The field API never fails, but not every combination of in-range fields
//! is a real date. Conversions here validate the combination and report
//! [`DateTimeError`] instead.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::TimeField;

/// Logical values of all seven fields, indexed by `TimeField as usize`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub(crate) struct CalendarFields([u16; 7]);

impl CalendarFields {
    pub(crate) fn get(&self, field: TimeField) -> u16 {
        self.0[field as usize]
    }

    pub(crate) fn set(&mut self, field: TimeField, value: u16) {
        self.0[field as usize] = value;
    }

    pub(crate) fn from_datetime(datetime: &NaiveDateTime) -> Result<Self, DateTimeError> {
        let year = datetime.year();
        if year > 2099 {
            error!("Year {} is too late! must be before 2100", year);
            return Err(DateTimeError::YearNotBefore2100);
        }
        if year < 2000 {
            error!("Year {} is too early! must be greater than 1999", year);
            return Err(DateTimeError::YearNotAfter1999);
        }

        let mut fields = Self::default();
        fields.set(
            TimeField::Year,
            u16::try_from(year).map_err(|_| DateTimeError::InvalidDateTime)?,
        );
        // chrono components are already in range and fit in u16
        fields.set(TimeField::Month, datetime.month() as u16);
        fields.set(TimeField::Day, datetime.day() as u16);
        fields.set(
            TimeField::Weekday,
            datetime.weekday().num_days_from_sunday() as u16,
        );
        fields.set(TimeField::Hour, datetime.hour() as u16);
        fields.set(TimeField::Minute, datetime.minute() as u16);
        fields.set(TimeField::Second, datetime.second() as u16);

        debug!("fields={:?}", fields.0);
        Ok(fields)
    }

    /// The weekday field is not checked against the date.
    pub(crate) fn into_datetime(self) -> Result<NaiveDateTime, DateTimeError> {
        let component = |field| u32::from(self.get(field));
        NaiveDate::from_ymd_opt(
            i32::from(self.get(TimeField::Year)),
            component(TimeField::Month),
            component(TimeField::Day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                component(TimeField::Hour),
                component(TimeField::Minute),
                component(TimeField::Second),
            )
        })
        .ok_or(DateTimeError::InvalidDateTime)
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur during PCF8563 date/time conversion.
pub enum DateTimeError {
    /// The fields do not form a valid date and time (e.g. February 30)
    InvalidDateTime,
    /// The year is not before 2100 (the PCF8563 year register covers 2000-2099)
    YearNotBefore2100,
    /// The year is not after 1999 (the PCF8563 year register covers 2000-2099)
    YearNotAfter1999,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: [u16; 7]) -> CalendarFields {
        CalendarFields(values)
    }

    #[test]
    fn test_from_datetime_and_into_datetime_roundtrip() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let raw = CalendarFields::from_datetime(&dt).unwrap();
        assert_eq!(raw, fields([2024, 3, 14, 4, 15, 30, 0]));
        assert_eq!(raw.into_datetime().unwrap(), dt);
    }

    #[test]
    fn test_from_datetime_year_too_early() {
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let err = CalendarFields::from_datetime(&dt).unwrap_err();
        assert!(matches!(err, DateTimeError::YearNotAfter1999));
    }

    #[test]
    fn test_from_datetime_year_too_late() {
        let dt = NaiveDate::from_ymd_opt(2100, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = CalendarFields::from_datetime(&dt).unwrap_err();
        assert!(matches!(err, DateTimeError::YearNotBefore2100));
    }

    #[test]
    fn test_valid_edge_cases() {
        let dt = NaiveDate::from_ymd_opt(2099, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert!(CalendarFields::from_datetime(&dt).is_ok());

        let dt = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(CalendarFields::from_datetime(&dt).is_ok());
    }

    #[test]
    fn test_weekday_conversion() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let raw = CalendarFields::from_datetime(&sunday).unwrap();
        assert_eq!(raw.get(TimeField::Weekday), 0);

        let saturday = NaiveDate::from_ymd_opt(2024, 3, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let raw = CalendarFields::from_datetime(&saturday).unwrap();
        assert_eq!(raw.get(TimeField::Weekday), 6);
    }

    #[test]
    fn test_into_datetime_ignores_weekday() {
        // 2024-03-14 is a Thursday, stored weekday says Monday
        let dt = fields([2024, 3, 14, 1, 8, 0, 0]).into_datetime().unwrap();
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_into_datetime_invalid_dates() {
        // February 30
        assert!(matches!(
            fields([2024, 2, 30, 0, 0, 0, 0]).into_datetime(),
            Err(DateTimeError::InvalidDateTime)
        ));
        // February 29 outside a leap year
        assert!(fields([2023, 2, 29, 0, 0, 0, 0]).into_datetime().is_err());
        assert!(fields([2024, 2, 29, 0, 0, 0, 0]).into_datetime().is_ok());
        // April 31
        assert!(fields([2024, 4, 31, 0, 0, 0, 0]).into_datetime().is_err());
    }
}
