//! Daily reward-qualification analysis.
//!
//! Once per day, every ledger record is examined: users are partitioned per
//! category into qualified and non-qualified, streaks and historical
//! engagement scores are updated, and the top slice of non-qualified users is
//! published as the empathy cohort. The run holds an advisory lock so it
//! never overlaps with itself.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use super::models::{CategoryCohort, DailyCohorts};
use crate::domains::scoring::{config, store, Category, UserScore};

/// Advisory lock key for the daily run; shared across instances.
const DAILY_ANALYSIS_LOCK_KEY: i64 = 0x5C0E_DA11;

/// Streak and historical score to write back for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDailyUpdate {
    pub user_id: String,
    pub streak: i32,
    pub historical_score: f64,
}

pub struct DailyAnalyzer {
    pool: PgPool,
}

impl DailyAnalyzer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute the daily analysis. Returns `None` when another run already
    /// holds the lock.
    pub async fn run(&self) -> Result<Option<DailyCohorts>> {
        let (locked,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(DAILY_ANALYSIS_LOCK_KEY)
            .fetch_one(&self.pool)
            .await?;

        if !locked {
            warn!("daily analysis is already running; skipping");
            return Ok(None);
        }

        let result = self.run_locked().await;

        if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(DAILY_ANALYSIS_LOCK_KEY)
            .execute(&self.pool)
            .await
        {
            warn!(error = %e, "failed to release daily-analysis lock");
        }

        result.map(Some)
    }

    async fn run_locked(&self) -> Result<DailyCohorts> {
        let now = Utc::now();
        info!(run_date = %now.date_naive(), "starting daily reward analysis");

        let users = store::scan_all(&self.pool).await?;
        info!(user_count = users.len(), "ledger snapshot loaded");

        let (updates, cohorts) = evaluate(&users, now);

        let mut tx = self.pool.begin().await?;
        for update in &updates {
            store::update_daily_analysis(
                &mut tx,
                &update.user_id,
                update.streak,
                update.historical_score,
            )
            .await?;
        }
        tx.commit().await?;

        cohorts.save(&self.pool).await?;

        for (category, cohort) in &cohorts.cohorts {
            info!(
                category = category.as_str(),
                qualified = cohort.qualified.len(),
                empathy = cohort.empathy.len(),
                "cohorts published"
            );
        }

        Ok(cohorts)
    }
}

/// Pure daily evaluation over a ledger snapshot.
///
/// Streak rule: a user who met the daily requirement in every category keeps
/// building their streak and carries no empathy score. Everyone else has the
/// streak they had built folded into their historical engagement score, and
/// the streak starts over.
pub fn evaluate(users: &[UserScore], now: DateTime<Utc>) -> (Vec<UserDailyUpdate>, DailyCohorts) {
    let mut updates = Vec::with_capacity(users.len());
    let mut cohorts = DailyCohorts::new(now.date_naive());

    // Per-user qualification plus streak/historical updates
    let mut evaluations = Vec::with_capacity(users.len());
    for user in users {
        let qualified: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| user.qualified(*c, now))
            .collect();
        let fully_qualified = qualified.len() == Category::ALL.len();

        let update = if fully_qualified {
            UserDailyUpdate {
                user_id: user.user_id.clone(),
                streak: user.consecutive_activity_days + 1,
                historical_score: 0.0,
            }
        } else {
            let streak_component =
                f64::from(user.consecutive_activity_days) * config::STREAK_WEIGHT;
            let activity_component: f64 = Category::ALL
                .iter()
                .map(|c| user.lifetime_count(*c) as f64 * c.empathy_weight())
                .sum();
            UserDailyUpdate {
                user_id: user.user_id.clone(),
                streak: 0,
                historical_score: streak_component + activity_component,
            }
        };

        evaluations.push((user.user_id.clone(), qualified, update.historical_score));
        updates.push(update);
    }

    // Per-category cohort build
    for category in Category::ALL {
        let mut qualified = Vec::new();
        let mut candidates: Vec<(&str, f64)> = Vec::new();

        for (user_id, quals, historical_score) in &evaluations {
            if quals.contains(&category) {
                qualified.push(user_id.clone());
            } else if *historical_score > 0.0 {
                // Never-active users have no engagement to reward
                candidates.push((user_id, *historical_score));
            }
        }

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        let take = (config::EMPATHY_REWARD_FRACTION * candidates.len() as f64).ceil() as usize;
        let empathy = candidates
            .into_iter()
            .take(take)
            .map(|(user_id, _)| user_id.to_string())
            .collect();

        cohorts
            .cohorts
            .insert(category, CategoryCohort { qualified, empathy });
    }

    (updates, cohorts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(user_id: &str) -> UserScore {
        UserScore::new(user_id, Utc::now().date_naive())
    }

    fn push_recent(user: &mut UserScore, category: Category, count: usize, now: DateTime<Utc>) {
        for i in 0..count {
            let ts = now - Duration::minutes(i as i64 + 1);
            match category {
                Category::Posts => user.daily_posts_timestamps.push(ts),
                Category::Likes => user.daily_likes_timestamps.push(ts),
                Category::Comments => user.daily_comments_timestamps.push(ts),
                Category::Referrals => user.daily_referrals_timestamps.push(ts),
                Category::Tipping => user.daily_tipping_timestamps.push(ts),
                Category::Crypto => user.daily_crypto_timestamps.push(ts),
            }
        }
    }

    fn fully_active(user_id: &str, now: DateTime<Utc>) -> UserScore {
        let mut u = user(user_id);
        for category in Category::ALL {
            push_recent(&mut u, category, category.daily_limit(), now);
        }
        u
    }

    #[test]
    fn fully_qualified_user_extends_streak() {
        let now = Utc::now();
        let mut a = fully_active("A", now);
        a.consecutive_activity_days = 3;

        let (updates, cohorts) = evaluate(&[a], now);

        assert_eq!(updates[0].streak, 4);
        assert_eq!(updates[0].historical_score, 0.0);
        for category in Category::ALL {
            assert_eq!(cohorts.category(category).qualified, vec!["A".to_string()]);
            assert!(cohorts.category(category).empathy.is_empty());
        }
    }

    #[test]
    fn partial_user_becomes_empathy_candidate_and_loses_streak() {
        let now = Utc::now();

        let mut a = fully_active("A", now);
        a.consecutive_activity_days = 10;

        // B made a single post today, streak of 7 from earlier days
        let mut b = user("B");
        push_recent(&mut b, Category::Posts, 1, now);
        b.consecutive_activity_days = 7;

        // C never did anything
        let c = user("C");

        let (updates, cohorts) = evaluate(&[a, b, c], now);

        let b_update = updates.iter().find(|u| u.user_id == "B").unwrap();
        assert_eq!(b_update.streak, 0);
        // 7 * 0.5 streak component + 1 lifetime post * 0.25
        assert!((b_update.historical_score - 3.75).abs() < 1e-9);

        let c_update = updates.iter().find(|u| u.user_id == "C").unwrap();
        assert_eq!(c_update.streak, 0);
        assert_eq!(c_update.historical_score, 0.0);

        // B is the only scoring non-qualified user, so B is the empathy
        // cohort in every category; C is excluded everywhere.
        for category in Category::ALL {
            let cohort = cohorts.category(category);
            assert_eq!(cohort.qualified, vec!["A".to_string()]);
            assert_eq!(cohort.empathy, vec!["B".to_string()]);
        }
    }

    #[test]
    fn qualification_is_per_category() {
        let now = Utc::now();

        let mut u = user("U");
        push_recent(&mut u, Category::Likes, Category::Likes.daily_limit(), now);
        push_recent(&mut u, Category::Posts, 1, now);

        let (updates, cohorts) = evaluate(&[u], now);

        assert!(cohorts
            .category(Category::Likes)
            .qualified
            .contains(&"U".to_string()));
        assert!(cohorts.category(Category::Posts).qualified.is_empty());
        // Not qualified everywhere, so the streak resets
        assert_eq!(updates[0].streak, 0);
    }

    #[test]
    fn empathy_and_qualified_are_disjoint() {
        let now = Utc::now();

        let mut u = user("U");
        push_recent(&mut u, Category::Likes, Category::Likes.daily_limit(), now);
        u.consecutive_activity_days = 2;

        let (_, cohorts) = evaluate(&[u], now);

        for category in Category::ALL {
            let cohort = cohorts.category(category);
            for user_id in &cohort.empathy {
                assert!(!cohort.qualified.contains(user_id));
            }
        }
        // U is qualified for likes, so despite a positive historical score U
        // must not appear in the likes empathy cohort.
        assert!(cohorts.category(Category::Likes).empathy.is_empty());
        assert_eq!(
            cohorts.category(Category::Posts).empathy,
            vec!["U".to_string()]
        );
    }

    #[test]
    fn empathy_takes_the_top_tenth_rounded_up() {
        let now = Utc::now();

        // Twelve users with one lifetime like each and varying streaks
        let users: Vec<UserScore> = (0..12)
            .map(|i| {
                let mut u = user(&format!("user-{:02}", i));
                u.daily_likes_timestamps.push(now - Duration::days(3));
                u.consecutive_activity_days = i;
                u
            })
            .collect();

        let (_, cohorts) = evaluate(&users, now);

        // ceil(0.10 * 12) = 2; the two longest streaks win
        let empathy = &cohorts.category(Category::Likes).empathy;
        assert_eq!(empathy.len(), 2);
        assert_eq!(empathy[0], "user-11");
        assert_eq!(empathy[1], "user-10");
    }

    #[test]
    fn ties_break_by_user_id() {
        let now = Utc::now();

        let users: Vec<UserScore> = ["charlie", "alice", "bravo"]
            .iter()
            .map(|name| {
                let mut u = user(name);
                u.daily_likes_timestamps.push(now - Duration::days(2));
                u
            })
            .collect();

        let (_, cohorts) = evaluate(&users, now);

        // All scores equal: ceil(0.3) = 1, lexicographically first user wins
        assert_eq!(
            cohorts.category(Category::Posts).empathy,
            vec!["alice".to_string()]
        );
    }

    #[test]
    fn old_timestamps_do_not_qualify() {
        let now = Utc::now();

        let mut u = user("U");
        for i in 0..Category::Likes.daily_limit() {
            u.daily_likes_timestamps
                .push(now - Duration::hours(25) - Duration::minutes(i as i64));
        }

        let (_, cohorts) = evaluate(&[u], now);
        assert!(cohorts.category(Category::Likes).qualified.is_empty());
    }
}
