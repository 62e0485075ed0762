//! Record types shared by the parsers and the dataset builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of one race, taken from the query string of its race-card URL.
///
/// e.g. `rno=1&jcd=01&hd=20240101`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RaceKey {
    /// Raw query string, used verbatim as the folder name
    pub raw: String,
    pub race_number: Option<u8>,
    pub venue: Option<String>,
    pub date: Option<NaiveDate>,
}

impl RaceKey {
    /// Decode a race key from a query string. Unknown parameters are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut key = RaceKey {
            raw: raw.to_string(),
            race_number: None,
            venue: None,
            date: None,
        };

        for pair in raw.split('&') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            match name {
                "rno" => key.race_number = value.parse().ok(),
                "jcd" => key.venue = Some(value.to_string()),
                "hd" => key.date = NaiveDate::parse_from_str(value, "%Y%m%d").ok(),
                _ => {}
            }
        }

        key
    }

    /// Extract the key from a page URL: everything after the first `?`.
    pub fn from_url(url: &str) -> Option<Self> {
        let (_, query) = url.split_once('?')?;
        if query.is_empty() {
            return None;
        }
        Some(Self::parse(query))
    }
}

/// Win / 2-place / 3-place rates as they appear in one statistics cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTriple {
    pub win: String,
    pub place2: String,
    pub place3: String,
}

/// One lane of a race card, raw text as found on the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceCardEntry {
    pub lane: String,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub avg_st: String,
    pub national: RateTriple,
    pub local: RateTriple,
    pub motor_place2: String,
    pub motor_place3: String,
}

/// One lane of the win-odds table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsEntry {
    pub lane: String,
    pub win_odds: String,
}

/// One finisher row of a result page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Finish rank text; non-finishes are already mapped to `"6"`
    pub rank: String,
    pub lane: String,
    pub racer_id: String,
}

/// One merged, normalized output row (one lane of one race)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneRow {
    pub race_key: String,
    pub race_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub race_number: Option<u8>,
    pub racer_id: Option<i64>,
    pub lane: i64,
    pub rank: Option<i64>,
    pub age: Option<i64>,
    pub weight: Option<f64>,
    pub avg_st: Option<f64>,
    pub national_win_rate: Option<f64>,
    pub national_2_rate: Option<f64>,
    pub national_3_rate: Option<f64>,
    pub local_win_rate: Option<f64>,
    pub local_2_rate: Option<f64>,
    pub local_3_rate: Option<f64>,
    pub motor_2_rate: Option<f64>,
    pub motor_3_rate: Option<f64>,
    pub win_odds: Option<f64>,
}
