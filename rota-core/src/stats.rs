//! Review load arithmetic
//!
//! The store hands over raw reviewer links; turning them into averages lives
//! here so the rules can be tested without a database.

use chrono::{DateTime, Utc};

use crate::models::UserStat;

/// Team average reported when no member has a merged review yet
pub const NO_COMPLETED_REVIEWS: f64 = -1.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One reviewer link as seen by the statistics aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSample {
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl ReviewSample {
    /// Fractional hours from creation to merge, `None` while open
    pub fn turnaround_hours(&self) -> Option<f64> {
        self.merged_at
            .map(|merged_at| (merged_at - self.created_at).num_milliseconds() as f64 / MILLIS_PER_HOUR)
    }
}

/// Build a user's statistics from every reviewer link they ever held
pub fn user_stat(user_id: impl Into<String>, is_active: bool, samples: &[ReviewSample]) -> UserStat {
    let durations: Vec<f64> = samples
        .iter()
        .filter_map(ReviewSample::turnaround_hours)
        .collect();

    UserStat {
        user_id: user_id.into(),
        count_pr: samples.len() as i64,
        avg_duration: mean(&durations),
        is_active,
    }
}

/// Mean of the members' averages, skipping members without merged reviews
pub fn team_average(users: &[UserStat]) -> f64 {
    let averages: Vec<f64> = users.iter().filter_map(|u| u.avg_duration).collect();
    mean(&averages).unwrap_or(NO_COMPLETED_REVIEWS)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(hours_open: Option<i64>) -> ReviewSample {
        let created_at = Utc::now() - Duration::days(3);
        ReviewSample {
            created_at,
            merged_at: hours_open.map(|h| created_at + Duration::hours(h)),
        }
    }

    #[test]
    fn test_turnaround_is_fractional_hours() {
        let created_at = Utc::now();
        let review = ReviewSample {
            created_at,
            merged_at: Some(created_at + Duration::minutes(90)),
        };
        assert_eq!(review.turnaround_hours(), Some(1.5));
        assert_eq!(sample(None).turnaround_hours(), None);
    }

    #[test]
    fn test_user_without_reviews() {
        let stat = user_stat("u1", true, &[]);
        assert_eq!(stat.count_pr, 0);
        assert_eq!(stat.avg_duration, None);
        assert!(stat.is_active);
    }

    #[test]
    fn test_open_reviews_count_but_do_not_average() {
        let stat = user_stat("u1", false, &[sample(Some(2)), sample(None), sample(Some(4))]);
        assert_eq!(stat.count_pr, 3);
        assert_eq!(stat.avg_duration, Some(3.0));
        assert!(!stat.is_active);
    }

    #[test]
    fn test_team_average_skips_members_without_merges() {
        let users = vec![
            user_stat("u1", true, &[sample(Some(2))]),
            user_stat("u2", true, &[sample(None)]),
            user_stat("u3", true, &[sample(Some(6))]),
        ];
        assert_eq!(team_average(&users), 4.0);
    }

    #[test]
    fn test_team_average_sentinel() {
        let users = vec![user_stat("u1", true, &[sample(None)]), user_stat("u2", true, &[])];
        assert_eq!(team_average(&users), NO_COMPLETED_REVIEWS);
        assert_eq!(team_average(&[]), NO_COMPLETED_REVIEWS);
    }
}
