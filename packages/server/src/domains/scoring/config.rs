//! Cross-category scoring constants.
//!
//! Per-category values (awards, daily limits, monthly caps, empathy weights)
//! live on [`Category`](super::Category); this module holds the constants
//! that span categories.

/// Sum of the six monthly caps; denominator of the normalized 0-100 score.
pub const TOTAL_POSSIBLE_MONTHLY_POINTS: f64 = 110.0;

/// Maximum quality bonus for a post, scaled by `quality / 10`.
pub const QUALITY_BONUS_MAX: f64 = 1.0;

/// Maximum originality bonus for a post, scaled by the vector distance
/// (clamped to 1.0) of the nearest existing post.
pub const ORIGINALITY_BONUS_MAX: f64 = 0.25;

/// Weight of the pre-reset streak in the historical engagement score.
pub const STREAK_WEIGHT: f64 = 0.5;

/// Fraction of scoring non-qualified users per category selected into the
/// empathy cohort.
pub const EMPATHY_REWARD_FRACTION: f64 = 0.10;

/// Nearest-neighbour distance at or below which a post is a duplicate.
pub const DUPLICATE_DISTANCE_THRESHOLD: f64 = 0.1;

/// Confidence at or above which the external classifier's gibberish label
/// rejects a text.
pub const ML_GIBBERISH_CONFIDENCE: f64 = 0.85;

/// One-time award for completing registration.
pub const POINTS_FOR_REGISTRATION: f64 = 10.0;

/// One-time award for completing verification.
pub const POINTS_FOR_VERIFICATION: f64 = 10.0;

/// Points for an accepted post: base plus quality and originality bonuses.
///
/// `quality` is the 0-10 model rating; `originality` is the nearest-neighbour
/// distance, already clamped to `[0, 1]` by the validator.
pub fn qualitative_post_points(quality: u8, originality: f64) -> f64 {
    let quality_bonus = (f64::from(quality.min(10)) / 10.0) * QUALITY_BONUS_MAX;
    let originality_bonus = originality.clamp(0.0, 1.0) * ORIGINALITY_BONUS_MAX;
    super::Category::Posts.point_value() + quality_bonus + originality_bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_points_combine_base_quality_and_originality() {
        // First post into an empty index with quality 8: 0.5 + 0.8 + 0.25
        let points = qualitative_post_points(8, 1.0);
        assert!((points - 1.55).abs() < 1e-9);
    }

    #[test]
    fn post_points_floor_is_the_base_award() {
        let points = qualitative_post_points(0, 0.0);
        assert!((points - 0.5).abs() < 1e-9);
    }

    #[test]
    fn originality_is_clamped() {
        let near = qualitative_post_points(5, 1.0);
        let far = qualitative_post_points(5, 3.7);
        assert!((near - far).abs() < 1e-9);
    }
}
