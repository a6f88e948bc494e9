/// Campaign targeting: age window, gender filter and activation time.
use chrono::{DateTime, Datelike, Utc};

use crate::domain::{Account, Gender, Post};

/// The viewer attributes a campaign is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Audience {
    pub age: i32,
    pub gender: Gender,
}

impl Audience {
    pub fn of(account: &Account, now: DateTime<Utc>) -> Self {
        Self {
            age: age_in_years(account.birth_date, now),
            gender: account.gender,
        }
    }
}

/// Whole elapsed years between `birth_date` and `now` (floored, never rounded).
pub fn age_in_years(birth_date: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    let birth = birth_date.date_naive();
    let today = now.date_naive();

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// True when `post` is a live campaign aimed at `audience` at instant `now`.
pub fn is_targeted(post: &Post, audience: &Audience, now: DateTime<Utc>) -> bool {
    if !post.campaign || post.removed || post.hidden {
        return false;
    }
    // Scheduled but not yet active.
    if post.exposure_date > now {
        return false;
    }

    let window = post.targeting();
    let age_ok = window.age_low <= audience.age && audience.age <= window.age_high;
    let gender_ok = window.gender == Gender::Everyone || window.gender == audience.gender;

    age_ok && gender_ok
}
