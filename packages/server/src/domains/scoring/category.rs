use serde::{Deserialize, Serialize};

/// The six interaction categories tracked by the ledger.
///
/// Every per-category constant (award, daily limit, monthly cap, empathy
/// weight) lives on this enum so that adding a category is one variant plus
/// one row in each table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Posts,
    Likes,
    Comments,
    Referrals,
    Tipping,
    Crypto,
}

impl Category {
    /// All categories in ledger column order.
    pub const ALL: [Category; 6] = [
        Category::Posts,
        Category::Likes,
        Category::Comments,
        Category::Referrals,
        Category::Tipping,
        Category::Crypto,
    ];

    /// Base points awarded per accepted interaction.
    ///
    /// For posts this is the base before quality and originality bonuses.
    pub fn point_value(self) -> f64 {
        match self {
            Category::Posts => 0.5,
            Category::Likes => 0.1,
            Category::Comments => 0.1,
            Category::Referrals => 10.0,
            Category::Tipping => 0.5,
            Category::Crypto => 0.5,
        }
    }

    /// Accepted interactions allowed within a rolling 24-hour window; also
    /// the daily requirement for reward qualification.
    pub fn daily_limit(self) -> usize {
        match self {
            Category::Posts => 2,
            Category::Likes => 5,
            Category::Comments => 5,
            Category::Referrals => 1,
            Category::Tipping => 1,
            Category::Crypto => 3,
        }
    }

    /// Maximum points accruable per calendar month.
    pub fn monthly_cap(self) -> f64 {
        match self {
            Category::Posts => 30.0,
            Category::Likes => 15.0,
            Category::Comments => 15.0,
            Category::Referrals => 10.0,
            Category::Tipping => 20.0,
            Category::Crypto => 20.0,
        }
    }

    /// Weight applied to the lifetime interaction count when computing the
    /// historical engagement score.
    pub fn empathy_weight(self) -> f64 {
        match self {
            Category::Posts => 0.25,
            Category::Likes => 0.08,
            Category::Comments => 0.08,
            Category::Referrals => 0.05,
            Category::Tipping => 0.05,
            Category::Crypto => 0.09,
        }
    }

    /// Canonical name, matching the ledger column suffix.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Posts => "posts",
            Category::Likes => "likes",
            Category::Comments => "comments",
            Category::Referrals => "referrals",
            Category::Tipping => "tipping",
            Category::Crypto => "crypto",
        }
    }

    /// Parse the canonical (plural) name used by the rewards API.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "posts" => Some(Category::Posts),
            "likes" => Some(Category::Likes),
            "comments" => Some(Category::Comments),
            "referrals" => Some(Category::Referrals),
            "tipping" => Some(Category::Tipping),
            "crypto" => Some(Category::Crypto),
            _ => None,
        }
    }

    /// Map an `interactionType` wire value onto a category.
    pub fn from_interaction_type(interaction_type: &str) -> Option<Self> {
        match interaction_type.to_lowercase().as_str() {
            "post" => Some(Category::Posts),
            "like" => Some(Category::Likes),
            "comment" => Some(Category::Comments),
            "referral" => Some(Category::Referrals),
            "tip" | "tipping" => Some(Category::Tipping),
            "crypto" => Some(Category::Crypto),
            _ => None,
        }
    }

    /// Human-readable reward program name for API responses.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Posts => "Content Creation Rewards",
            Category::Likes => "Engagement Rewards",
            Category::Comments => "Discussion Rewards",
            Category::Referrals => "Growth Rewards",
            Category::Tipping => "Community Support Rewards",
            Category::Crypto => "Crypto Activity Rewards",
        }
    }

    /// Short description of who earns this reward.
    pub fn description(self) -> &'static str {
        match self {
            Category::Posts => "Rewards for users who create quality posts",
            Category::Likes => "Rewards for users who actively like content",
            Category::Comments => "Rewards for users who participate in discussions",
            Category::Referrals => "Rewards for users who bring new members to the community",
            Category::Tipping => "Rewards for users who tip other community members",
            Category::Crypto => "Rewards for users who perform crypto transactions",
        }
    }
}
