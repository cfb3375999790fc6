//! Daily cohort evaluation tests over ledger snapshots.

use chrono::{DateTime, Duration, Utc};
use scoring_core::domains::cohorts::evaluate;
use scoring_core::domains::scoring::{Category, UserScore};

fn new_user(user_id: &str) -> UserScore {
    UserScore::new(user_id, Utc::now().date_naive())
}

fn add_recent(user: &mut UserScore, category: Category, count: usize, now: DateTime<Utc>) {
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

/// Three-user day: A hits every limit, B posted once with a streak of 7,
/// C never did anything.
#[test]
fn full_partial_and_idle_users() {
    let now = Utc::now();

    let mut a = new_user("A");
    for category in Category::ALL {
        add_recent(&mut a, category, category.daily_limit(), now);
    }
    a.consecutive_activity_days = 3;

    let mut b = new_user("B");
    add_recent(&mut b, Category::Posts, 1, now);
    b.consecutive_activity_days = 7;

    let c = new_user("C");

    let (updates, cohorts) = evaluate(&[a, b, c], now);

    // A: qualified everywhere, streak extended, no empathy score
    let a_update = updates.iter().find(|u| u.user_id == "A").unwrap();
    assert_eq!(a_update.streak, 4);
    assert_eq!(a_update.historical_score, 0.0);

    // B: streak folded into the historical score (7 * 0.5 + 1 * 0.25), then reset
    let b_update = updates.iter().find(|u| u.user_id == "B").unwrap();
    assert_eq!(b_update.streak, 0);
    assert!((b_update.historical_score - 3.75).abs() < 1e-9);

    // C: nothing to fold, excluded from empathy everywhere
    let c_update = updates.iter().find(|u| u.user_id == "C").unwrap();
    assert_eq!(c_update.historical_score, 0.0);

    for category in Category::ALL {
        let cohort = cohorts.category(category);
        assert_eq!(cohort.qualified, vec!["A".to_string()]);
        assert_eq!(cohort.empathy, vec!["B".to_string()]);
    }
}

/// Qualification matches the daily limit exactly, per category.
#[test]
fn qualification_threshold_is_the_daily_limit() {
    let now = Utc::now();

    let mut at_limit = new_user("at-limit");
    add_recent(&mut at_limit, Category::Crypto, Category::Crypto.daily_limit(), now);

    let mut below = new_user("below");
    add_recent(&mut below, Category::Crypto, Category::Crypto.daily_limit() - 1, now);

    let (_, cohorts) = evaluate(&[at_limit, below], now);

    let cohort = cohorts.category(Category::Crypto);
    assert_eq!(cohort.qualified, vec!["at-limit".to_string()]);
    assert!(!cohort.qualified.contains(&"below".to_string()));
}

/// The empathy cohort is a tenth of the scoring candidates, rounded up,
/// and disjoint from the qualified set.
#[test]
fn empathy_size_and_disjointness() {
    let now = Utc::now();

    let mut users = Vec::new();
    // Twenty non-qualified users with engagement history
    for i in 0..20 {
        let mut u = new_user(&format!("candidate-{:02}", i));
        add_recent(&mut u, Category::Likes, 1, now);
        u.consecutive_activity_days = i;
        users.push(u);
    }
    // Five users qualified for likes
    for i in 0..5 {
        let mut u = new_user(&format!("qualified-{}", i));
        add_recent(&mut u, Category::Likes, Category::Likes.daily_limit(), now);
        users.push(u);
    }

    let (_, cohorts) = evaluate(&users, now);
    let cohort = cohorts.category(Category::Likes);

    assert_eq!(cohort.qualified.len(), 5);
    // ceil(0.10 * 20) = 2
    assert_eq!(cohort.empathy.len(), 2);
    assert_eq!(cohort.empathy[0], "candidate-19");
    assert_eq!(cohort.empathy[1], "candidate-18");

    for user_id in &cohort.empathy {
        assert!(!cohort.qualified.contains(user_id));
    }
}

/// Users with score zero are never rewarded, even when the cohort would
/// otherwise have room.
#[test]
fn zero_score_users_are_excluded() {
    let now = Utc::now();

    let idle: Vec<UserScore> = (0..10).map(|i| new_user(&format!("idle-{}", i))).collect();

    let (_, cohorts) = evaluate(&idle, now);

    for category in Category::ALL {
        assert!(cohorts.category(category).empathy.is_empty());
    }
}

/// Equal historical scores resolve by user id, ascending.
#[test]
fn ranking_ties_resolve_lexicographically() {
    let now = Utc::now();

    let users: Vec<UserScore> = ["zeta", "alpha", "mike"]
        .iter()
        .map(|name| {
            let mut u = new_user(name);
            add_recent(&mut u, Category::Comments, 1, now);
            u
        })
        .collect();

    let (_, cohorts) = evaluate(&users, now);

    // ceil(0.10 * 3) = 1 slot; "alpha" wins the three-way tie
    assert_eq!(
        cohorts.category(Category::Posts).empathy,
        vec!["alpha".to_string()]
    );
}
