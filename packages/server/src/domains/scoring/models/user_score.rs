use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::scoring::{config, Category};

/// Per-user ledger record.
///
/// Point totals and one-time fields reset at calendar-month boundaries;
/// timestamp sequences are append-only and survive resets, so lifetime
/// counts are simply sequence lengths.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserScore {
    pub user_id: String,
    pub points_from_posts: f64,
    pub points_from_likes: f64,
    pub points_from_comments: f64,
    pub points_from_referrals: f64,
    pub points_from_tipping: f64,
    pub points_from_crypto: f64,
    pub one_time_points: f64,
    pub one_time_events: Vec<String>,
    pub last_reset_date: NaiveDate,
    pub daily_posts_timestamps: Vec<DateTime<Utc>>,
    pub daily_likes_timestamps: Vec<DateTime<Utc>>,
    pub daily_comments_timestamps: Vec<DateTime<Utc>>,
    pub daily_referrals_timestamps: Vec<DateTime<Utc>>,
    pub daily_tipping_timestamps: Vec<DateTime<Utc>>,
    pub daily_crypto_timestamps: Vec<DateTime<Utc>>,
    pub last_active_date: Option<NaiveDate>,
    pub consecutive_activity_days: i32,
    pub historical_engagement_score: f64,
}

/// Result of applying one interaction to the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionOutcome {
    /// Points awarded; the timestamp was appended at `awarded_at`.
    Accepted { delta: f64, awarded_at: DateTime<Utc> },
    /// The 24-hour accepted-interaction limit is reached; nothing recorded.
    DailyLimited,
    /// The monthly cap leaves no headroom; nothing recorded.
    MonthlyCapped,
}

impl UserScore {
    /// Fresh record for a user's first interaction.
    pub fn new(user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            points_from_posts: 0.0,
            points_from_likes: 0.0,
            points_from_comments: 0.0,
            points_from_referrals: 0.0,
            points_from_tipping: 0.0,
            points_from_crypto: 0.0,
            one_time_points: 0.0,
            one_time_events: Vec::new(),
            last_reset_date: today,
            daily_posts_timestamps: Vec::new(),
            daily_likes_timestamps: Vec::new(),
            daily_comments_timestamps: Vec::new(),
            daily_referrals_timestamps: Vec::new(),
            daily_tipping_timestamps: Vec::new(),
            daily_crypto_timestamps: Vec::new(),
            last_active_date: None,
            consecutive_activity_days: 0,
            historical_engagement_score: 0.0,
        }
    }

    pub fn points(&self, category: Category) -> f64 {
        match category {
            Category::Posts => self.points_from_posts,
            Category::Likes => self.points_from_likes,
            Category::Comments => self.points_from_comments,
            Category::Referrals => self.points_from_referrals,
            Category::Tipping => self.points_from_tipping,
            Category::Crypto => self.points_from_crypto,
        }
    }

    fn points_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Posts => &mut self.points_from_posts,
            Category::Likes => &mut self.points_from_likes,
            Category::Comments => &mut self.points_from_comments,
            Category::Referrals => &mut self.points_from_referrals,
            Category::Tipping => &mut self.points_from_tipping,
            Category::Crypto => &mut self.points_from_crypto,
        }
    }

    pub fn timestamps(&self, category: Category) -> &[DateTime<Utc>] {
        match category {
            Category::Posts => &self.daily_posts_timestamps,
            Category::Likes => &self.daily_likes_timestamps,
            Category::Comments => &self.daily_comments_timestamps,
            Category::Referrals => &self.daily_referrals_timestamps,
            Category::Tipping => &self.daily_tipping_timestamps,
            Category::Crypto => &self.daily_crypto_timestamps,
        }
    }

    fn timestamps_mut(&mut self, category: Category) -> &mut Vec<DateTime<Utc>> {
        match category {
            Category::Posts => &mut self.daily_posts_timestamps,
            Category::Likes => &mut self.daily_likes_timestamps,
            Category::Comments => &mut self.daily_comments_timestamps,
            Category::Referrals => &mut self.daily_referrals_timestamps,
            Category::Tipping => &mut self.daily_tipping_timestamps,
            Category::Crypto => &mut self.daily_crypto_timestamps,
        }
    }

    /// Accepted interactions in the rolling 24-hour window ending at `now`.
    pub fn recent_count(&self, category: Category, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::hours(24);
        self.timestamps(category)
            .iter()
            .filter(|ts| **ts > cutoff)
            .count()
    }

    /// All-time accepted interactions for the category.
    pub fn lifetime_count(&self, category: Category) -> usize {
        self.timestamps(category).len()
    }

    /// Whether the user met the category's daily requirement as of `now`.
    pub fn qualified(&self, category: Category, now: DateTime<Utc>) -> bool {
        self.recent_count(category, now) >= category.daily_limit()
    }

    /// Sum of the six category totals (one-time points excluded).
    pub fn total_points(&self) -> f64 {
        Category::ALL.iter().map(|c| self.points(*c)).sum()
    }

    /// Monthly total normalized to 0-100.
    pub fn normalized_score(&self) -> f64 {
        let score = (self.total_points() / config::TOTAL_POSSIBLE_MONTHLY_POINTS) * 100.0;
        score.clamp(0.0, 100.0)
    }

    /// Whether a calendar-month boundary has passed since the last reset.
    pub fn month_reset_due(&self, today: NaiveDate) -> bool {
        today.year() != self.last_reset_date.year() || today.month() != self.last_reset_date.month()
    }

    /// Zero the point totals and one-time fields if a month boundary passed.
    /// Timestamp histories and the streak are preserved. Returns true if a
    /// reset was applied.
    pub fn maybe_month_reset(&mut self, today: NaiveDate) -> bool {
        if !self.month_reset_due(today) {
            return false;
        }
        for category in Category::ALL {
            *self.points_mut(category) = 0.0;
        }
        self.one_time_points = 0.0;
        self.one_time_events.clear();
        self.last_reset_date = today;
        true
    }

    /// Apply one interaction worth `base_points` under the daily-limit and
    /// monthly-cap rules. The caller is expected to have run
    /// [`maybe_month_reset`](Self::maybe_month_reset) first.
    pub fn apply_interaction(
        &mut self,
        category: Category,
        base_points: f64,
        now: DateTime<Utc>,
    ) -> InteractionOutcome {
        if self.recent_count(category, now) >= category.daily_limit() {
            return InteractionOutcome::DailyLimited;
        }

        let remaining = category.monthly_cap() - self.points(category);
        let delta = base_points.min(remaining);
        if delta <= 0.0 {
            return InteractionOutcome::MonthlyCapped;
        }

        *self.points_mut(category) += delta;
        self.timestamps_mut(category).push(now);
        self.last_active_date = Some(now.date_naive());

        InteractionOutcome::Accepted {
            delta,
            awarded_at: now,
        }
    }

    /// Credit a named one-time event. Returns `None` if the event was already
    /// credited (the set is unchanged), otherwise the awarded delta.
    pub fn record_one_time(&mut self, event_id: &str, points: f64) -> Option<f64> {
        if self.one_time_events.iter().any(|e| e == event_id) {
            return None;
        }
        let delta = points.max(0.0);
        self.one_time_events.push(event_id.to_string());
        self.one_time_points += delta;
        Some(delta)
    }

    /// Reverse a post award: subtract the originally awarded points (never
    /// below zero) and drop the matching post timestamp.
    pub fn refund_post(&mut self, delta: f64, awarded_at: Option<DateTime<Utc>>) {
        self.points_from_posts = (self.points_from_posts - delta.max(0.0)).max(0.0);
        if let Some(ts) = awarded_at {
            if let Some(idx) = self.daily_posts_timestamps.iter().position(|t| *t == ts) {
                self.daily_posts_timestamps.remove(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserScore {
        UserScore::new("U1", NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    #[test]
    fn daily_limit_blocks_the_sixth_like() {
        let mut rec = record();
        let now = Utc::now();

        for i in 0..5 {
            let at = now - Duration::minutes(5 - i);
            let outcome = rec.apply_interaction(Category::Likes, Category::Likes.point_value(), at);
            assert!(matches!(outcome, InteractionOutcome::Accepted { .. }));
        }

        assert_eq!(
            rec.apply_interaction(Category::Likes, Category::Likes.point_value(), now),
            InteractionOutcome::DailyLimited
        );
        assert_eq!(rec.recent_count(Category::Likes, now), 5);
        assert!((rec.normalized_score() - (0.5 / 110.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn timestamps_outside_the_window_free_the_limit() {
        let mut rec = record();
        let now = Utc::now();
        rec.daily_tipping_timestamps.push(now - Duration::hours(25));

        let outcome = rec.apply_interaction(Category::Tipping, 0.5, now);
        assert!(matches!(outcome, InteractionOutcome::Accepted { .. }));
    }

    #[test]
    fn monthly_cap_truncates_then_blocks() {
        let mut rec = record();
        let now = Utc::now();
        rec.points_from_referrals = 9.5;

        // 10-point referral award against 0.5 of headroom
        match rec.apply_interaction(Category::Referrals, 10.0, now) {
            InteractionOutcome::Accepted { delta, .. } => assert!((delta - 0.5).abs() < 1e-9),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(rec.points_from_referrals, Category::Referrals.monthly_cap());

        // A day later the daily limit no longer applies but the cap does
        let tomorrow = now + Duration::hours(25);
        assert_eq!(
            rec.apply_interaction(Category::Referrals, 10.0, tomorrow),
            InteractionOutcome::MonthlyCapped
        );
        assert_eq!(rec.lifetime_count(Category::Referrals), 1);
    }

    #[test]
    fn month_reset_zeroes_points_but_keeps_history() {
        let mut rec = record();
        let now = Utc::now();
        rec.apply_interaction(Category::Crypto, 0.5, now);
        rec.record_one_time("REGISTRATION", 10.0);
        rec.consecutive_activity_days = 4;

        let next_month = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(rec.maybe_month_reset(next_month));

        assert_eq!(rec.total_points(), 0.0);
        assert_eq!(rec.one_time_points, 0.0);
        assert!(rec.one_time_events.is_empty());
        assert_eq!(rec.lifetime_count(Category::Crypto), 1);
        assert_eq!(rec.consecutive_activity_days, 4);
        assert_eq!(rec.last_reset_date, next_month);

        // Same month again is a no-op
        assert!(!rec.maybe_month_reset(next_month));
    }

    #[test]
    fn one_time_event_credits_at_most_once() {
        let mut rec = record();

        assert_eq!(rec.record_one_time("SIGNUP_BONUS", 10.0), Some(10.0));
        assert_eq!(rec.record_one_time("SIGNUP_BONUS", 10.0), None);
        assert_eq!(rec.one_time_events.len(), 1);
        assert_eq!(rec.one_time_points, 10.0);
    }

    #[test]
    fn refund_restores_points_and_timestamp() {
        let mut rec = record();
        let now = Utc::now();

        let awarded_at = match rec.apply_interaction(Category::Posts, 1.55, now) {
            InteractionOutcome::Accepted { awarded_at, .. } => awarded_at,
            other => panic!("unexpected outcome: {:?}", other),
        };

        rec.refund_post(1.55, Some(awarded_at));
        assert_eq!(rec.points_from_posts, 0.0);
        assert!(rec.daily_posts_timestamps.is_empty());
    }

    #[test]
    fn refund_never_goes_negative_and_tolerates_unknown_delta() {
        let mut rec = record();
        rec.points_from_posts = 0.5;

        rec.refund_post(2.0, None);
        assert_eq!(rec.points_from_posts, 0.0);

        rec.refund_post(0.0, None);
        assert_eq!(rec.points_from_posts, 0.0);
    }

    #[test]
    fn normalized_score_is_clamped() {
        let mut rec = record();
        for category in Category::ALL {
            *match category {
                Category::Posts => &mut rec.points_from_posts,
                Category::Likes => &mut rec.points_from_likes,
                Category::Comments => &mut rec.points_from_comments,
                Category::Referrals => &mut rec.points_from_referrals,
                Category::Tipping => &mut rec.points_from_tipping,
                Category::Crypto => &mut rec.points_from_crypto,
            } = category.monthly_cap();
        }
        assert_eq!(rec.normalized_score(), 100.0);
    }
}
