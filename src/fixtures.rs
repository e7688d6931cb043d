//! Builders for event histories used across unit tests

use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::temporal::{minutes_between, offset_by_minutes};
use crate::types::{FeedCategory, FeedingEpisode, SleepCategory, SleepEpisode, Subject};

pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

pub fn subject_id() -> Uuid {
    Uuid::from_u128(0xaa)
}

pub fn subject(birth_date: &str) -> Subject {
    Subject {
        id: subject_id(),
        name: "Ada".to_string(),
        birth_date: NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").unwrap(),
    }
}

pub fn sleep(start: &str, end: Option<&str>, category: SleepCategory) -> SleepEpisode {
    let start_time = at(start);
    let end_time = end.map(at);
    SleepEpisode {
        id: Uuid::new_v4(),
        subject_id: subject_id(),
        start_time,
        end_time,
        duration_minutes: end_time.map(|end| minutes_between(&start_time, &end).floor() as u32),
        category,
        notes: None,
    }
}

pub fn nap(start: &str, end: &str) -> SleepEpisode {
    sleep(start, Some(end), SleepCategory::Nap)
}

pub fn night(start: &str, end: &str) -> SleepEpisode {
    sleep(start, Some(end), SleepCategory::Night)
}

pub fn feed(start: &str, category: FeedCategory) -> FeedingEpisode {
    let start_time = at(start);
    FeedingEpisode {
        id: Uuid::new_v4(),
        subject_id: subject_id(),
        start_time,
        end_time: Some(offset_by_minutes(&start_time, 15.0)),
        feed_category: category,
        quantity: None,
        quantity_unit: None,
        side: None,
        notes: None,
    }
}
