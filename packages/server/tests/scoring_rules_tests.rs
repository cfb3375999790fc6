//! Ledger rule tests: daily limits, monthly caps, month reset, one-time
//! events, and the normalized score.

use chrono::{Duration, NaiveDate, Utc};
use scoring_core::domains::scoring::{config, Category, InteractionOutcome, UserScore};

fn new_user(user_id: &str) -> UserScore {
    UserScore::new(user_id, Utc::now().date_naive())
}

#[test]
fn five_likes_then_daily_limit() {
    let mut user = new_user("U1");
    let now = Utc::now();

    for i in 0..5 {
        let at = now - Duration::seconds(60 - i);
        match user.apply_interaction(Category::Likes, Category::Likes.point_value(), at) {
            InteractionOutcome::Accepted { delta, .. } => assert!((delta - 0.1).abs() < 1e-9),
            other => panic!("like {} unexpectedly rejected: {:?}", i + 1, other),
        }
    }

    // The sixth like within the same minute hits the daily limit
    assert_eq!(
        user.apply_interaction(Category::Likes, Category::Likes.point_value(), now),
        InteractionOutcome::DailyLimited
    );

    // Five accepted likes: (0.5 / 110) * 100
    let expected = (0.5 / config::TOTAL_POSSIBLE_MONTHLY_POINTS) * 100.0;
    assert!((user.normalized_score() - expected).abs() < 1e-9);
    assert!((user.normalized_score() - 0.4545).abs() < 1e-3);
}

#[test]
fn post_award_includes_quality_and_originality_bonuses() {
    // Quality 8 against an empty index: 0.5 base + 0.8 quality + 0.25 originality
    let points = config::qualitative_post_points(8, 1.0);
    assert!((points - 1.55).abs() < 1e-9);

    let mut user = new_user("U2");
    match user.apply_interaction(Category::Posts, points, Utc::now()) {
        InteractionOutcome::Accepted { delta, .. } => assert!((delta - 1.55).abs() < 1e-9),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn category_totals_never_exceed_their_caps() {
    let mut user = new_user("U3");
    let mut at = Utc::now() - Duration::days(40);

    // A referral a day for 40 days; the cap is 10 points
    for _ in 0..40 {
        user.apply_interaction(Category::Referrals, Category::Referrals.point_value(), at);
        at += Duration::days(1);
    }

    assert!(user.points(Category::Referrals) <= Category::Referrals.monthly_cap());
    assert!(user.total_points() <= config::TOTAL_POSSIBLE_MONTHLY_POINTS);
    assert!(user.normalized_score() <= 100.0);
}

#[test]
fn capped_interactions_record_no_timestamp() {
    let mut user = new_user("U4");
    let now = Utc::now();

    // Fill the tipping cap directly, then try another tip a day later
    match user.apply_interaction(Category::Tipping, Category::Tipping.monthly_cap(), now) {
        InteractionOutcome::Accepted { .. } => {}
        other => panic!("unexpected outcome: {:?}", other),
    }
    let before = user.lifetime_count(Category::Tipping);

    assert_eq!(
        user.apply_interaction(
            Category::Tipping,
            Category::Tipping.point_value(),
            now + Duration::hours(25),
        ),
        InteractionOutcome::MonthlyCapped
    );
    assert_eq!(user.lifetime_count(Category::Tipping), before);
}

#[test]
fn month_boundary_resets_points_and_preserves_history() {
    let mut user = UserScore::new("U5", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    let now = Utc::now();

    user.apply_interaction(Category::Likes, 0.1, now - Duration::minutes(2));
    user.apply_interaction(Category::Comments, 0.1, now - Duration::minutes(1));
    user.record_one_time("REGISTRATION", config::POINTS_FOR_REGISTRATION);
    user.consecutive_activity_days = 9;

    assert!(user.maybe_month_reset(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));

    for category in Category::ALL {
        assert_eq!(user.points(category), 0.0, "{} not reset", category.as_str());
    }
    assert_eq!(user.one_time_points, 0.0);
    assert!(user.one_time_events.is_empty());
    assert_eq!(user.lifetime_count(Category::Likes), 1);
    assert_eq!(user.lifetime_count(Category::Comments), 1);
    assert_eq!(user.consecutive_activity_days, 9);
}

#[test]
fn one_time_event_applied_twice_awards_once() {
    let mut user = new_user("U6");

    assert_eq!(user.record_one_time("SIGNUP_BONUS", 10.0), Some(10.0));
    let events_after_first = user.one_time_events.len();

    assert_eq!(user.record_one_time("SIGNUP_BONUS", 10.0), None);
    assert_eq!(user.one_time_events.len(), events_after_first);
    assert_eq!(user.one_time_points, 10.0);
}

#[test]
fn post_insert_then_refund_restores_prior_state() {
    let mut user = new_user("U7");
    let now = Utc::now();

    let points_before = user.points(Category::Posts);
    let count_before = user.lifetime_count(Category::Posts);

    let (delta, awarded_at) = match user.apply_interaction(Category::Posts, 1.55, now) {
        InteractionOutcome::Accepted { delta, awarded_at } => (delta, awarded_at),
        other => panic!("unexpected outcome: {:?}", other),
    };

    user.refund_post(delta, Some(awarded_at));

    assert!((user.points(Category::Posts) - points_before).abs() < 1e-9);
    assert_eq!(user.lifetime_count(Category::Posts), count_before);
}
