//! Offered slot list and conversions between the stored `TIME` value and the
//! `HH:MM AM/PM` display form used by the API.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

pub const SLOT_MINUTES: i64 = 30;
const FIRST_SLOT: (u32, u32) = (9, 0);
const DAY_END: (u32, u32) = (17, 0);

/// Every slot a doctor can be booked for, in chronological order.
pub fn offered_slots() -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let (Some(mut current), Some(end)) = (
        NaiveTime::from_hms_opt(FIRST_SLOT.0, FIRST_SLOT.1, 0),
        NaiveTime::from_hms_opt(DAY_END.0, DAY_END.1, 0),
    ) else {
        return slots;
    };
    while current < end {
        slots.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

pub fn is_offered(time: NaiveTime) -> bool {
    offered_slots().contains(&time)
}

/// Accepts `HH:MM`, `HH:MM:SS` and 12-hour `H:MM AM/PM` (any case).
pub fn parse_slot_time(input: &str) -> Result<NaiveTime, String> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    if upper.ends_with("AM") || upper.ends_with("PM") {
        let (clock, meridiem) = upper.split_at(upper.len() - 2);
        let normalized = format!("{} {}", clock.trim(), meridiem);
        return NaiveTime::parse_from_str(&normalized, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(&normalized, "%I:%M:%S %p"))
            .map_err(|_| format!("invalid time '{trimmed}'"));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| format!("invalid time '{trimmed}'"))
}

/// `10:00 AM`, `02:00 PM`.
pub fn format_slot(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// Normalizes stored times into display slots, dropping anything outside the
/// offered list. Output is sorted and free of duplicates.
pub fn booked_slots<I>(times: I) -> Vec<String>
where
    I: IntoIterator<Item = NaiveTime>,
{
    let mut booked: Vec<NaiveTime> = times.into_iter().filter(|t| is_offered(*t)).collect();
    booked.sort();
    booked.dedup();
    booked.into_iter().map(format_slot).collect()
}

pub fn available_slots(booked: &[NaiveTime]) -> Vec<String> {
    offered_slots()
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .map(format_slot)
        .collect()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, whose UTC calendar date is used.
pub fn parse_appointment_date(input: &str) -> Result<NaiveDate, String> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| {
            DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .map_err(|_| format!("invalid date '{trimmed}'"))
}

/// The server's local calendar date. Booking and dashboard windows are anchored on it.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Start of `date` in the server's time zone, as an instant.
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    midnight_in(date, &Local)
}

/// Start of `date` in `tz`. A midnight skipped by a DST jump falls back to UTC midnight.
pub fn midnight_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::default());
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn offered_slots_cover_the_working_day() {
        let slots = offered_slots();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first(), Some(&t(9, 0)));
        assert_eq!(slots.last(), Some(&t(16, 30)));
    }

    #[test]
    fn parses_both_stored_representations() {
        assert_eq!(parse_slot_time("10:00 AM"), Ok(t(10, 0)));
        assert_eq!(parse_slot_time("02:00 PM"), Ok(t(14, 0)));
        assert_eq!(parse_slot_time("2:00pm"), Ok(t(14, 0)));
        assert_eq!(parse_slot_time("14:00:00"), Ok(t(14, 0)));
        assert_eq!(parse_slot_time("09:30"), Ok(t(9, 30)));
        assert_eq!(parse_slot_time("12:00 PM"), Ok(t(12, 0)));
        assert_eq!(parse_slot_time("12:30 AM"), Ok(t(0, 30)));
    }

    #[test]
    fn rejects_garbage_times() {
        assert!(parse_slot_time("").is_err());
        assert!(parse_slot_time("25:00").is_err());
        assert!(parse_slot_time("13:00 PM").is_err());
        assert!(parse_slot_time("ten o'clock").is_err());
    }

    #[test]
    fn formats_as_zero_padded_twelve_hour_clock() {
        assert_eq!(format_slot(t(10, 0)), "10:00 AM");
        assert_eq!(format_slot(t(14, 0)), "02:00 PM");
        assert_eq!(format_slot(t(11, 30)), "11:30 AM");
    }

    #[test]
    fn booked_slots_are_a_sorted_subset_of_offered() {
        let stored = vec![t(14, 0), t(10, 0), t(11, 30), t(10, 0), t(7, 15), t(18, 0)];
        let booked = booked_slots(stored);
        assert_eq!(booked, vec!["10:00 AM", "11:30 AM", "02:00 PM"]);

        let offered: Vec<String> = offered_slots().into_iter().map(format_slot).collect();
        assert!(booked.iter().all(|slot| offered.contains(slot)));
    }

    #[test]
    fn available_slots_exclude_booked() {
        let available = available_slots(&[t(10, 0), t(11, 30), t(14, 0)]);
        assert_eq!(available.len(), 13);
        assert!(!available.contains(&"10:00 AM".to_string()));
        assert!(available.contains(&"10:30 AM".to_string()));
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
        assert_eq!(parse_appointment_date("2026-02-12"), Ok(expected));
        assert_eq!(parse_appointment_date("2026-02-12T00:00:00Z"), Ok(expected));
        assert_eq!(
            parse_appointment_date("2026-02-12T23:30:00-05:00"),
            Ok(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap())
        );
        assert!(parse_appointment_date("12/02/2026").is_err());
    }

    #[test]
    fn midnight_follows_the_given_zone() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
        assert_eq!(midnight_in(date, &Utc).to_rfc3339(), "2026-02-12T00:00:00+00:00");

        let plus_three = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(
            midnight_in(date, &plus_three).to_rfc3339(),
            "2026-02-11T21:00:00+00:00"
        );
    }
}
