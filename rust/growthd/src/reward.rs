use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reward {
    Gold,
    Silver,
    Bronze,
    GreatEffort,
    KeepTrying,
    BetterLuckNextTime,
}

/// Highest threshold first. A mark meets a threshold when it is `>=` it.
const THRESHOLDS: [(f64, Reward); 5] = [
    (90.0, Reward::Gold),
    (80.0, Reward::Silver),
    (70.0, Reward::Bronze),
    (60.0, Reward::GreatEffort),
    (50.0, Reward::KeepTrying),
];

impl Reward {
    pub fn label(self) -> &'static str {
        match self {
            Reward::Gold => "Gold",
            Reward::Silver => "Silver",
            Reward::Bronze => "Bronze",
            Reward::GreatEffort => "Great Effort",
            Reward::KeepTrying => "Keep Trying",
            Reward::BetterLuckNextTime => "Better luck next time",
        }
    }

    /// Decorated text shown next to a freshly added student.
    pub fn badge(self) -> &'static str {
        match self {
            Reward::Gold => "Gold Medal 🥇",
            Reward::Silver => "Silver Medal 🥈",
            Reward::Bronze => "Bronze Medal 🥉",
            Reward::GreatEffort => "Great Effort 🌟",
            Reward::KeepTrying => "Keep Trying 💪",
            Reward::BetterLuckNextTime => "Better luck next time! 🎯",
        }
    }
}

/// Total over f64: anything above 100 is still Gold, anything below 50
/// (including NaN) gets the default.
pub fn classify(marks: f64) -> Reward {
    THRESHOLDS
        .iter()
        .find(|(threshold, _)| marks >= *threshold)
        .map(|(_, reward)| *reward)
        .unwrap_or(Reward::BetterLuckNextTime)
}
