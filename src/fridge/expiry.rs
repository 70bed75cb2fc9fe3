use serde::Serialize;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Red,
    Orange,
    Green,
}

/// Days-to-expiry label and its colour, relative to `today`.
pub fn annotate(expiry_date: Date, today: Date) -> (String, StatusColor) {
    let days = (expiry_date - today).whole_days();
    match days {
        d if d < 0 => (format!("D+{}", -d), StatusColor::Red),
        0 => ("D-Day".to_string(), StatusColor::Orange),
        d => (format!("D-{d}"), StatusColor::Green),
    }
}
