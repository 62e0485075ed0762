//! Race result parser for boatrace.jp
//!
//! URL: https://www.boatrace.jp/owpc/pc/race/raceresult?rno=..&jcd=..&hd=..
//!
//! The result table renders one `<tbody>` per finisher:
//! 着 | 枠 | ボートレーサー (登番 + 氏名) | レースタイム

use anyhow::{Context, Result};
use scraper::Html;

use super::table::{cell_text, cells, find_table, TBODY};
use crate::types::ResultEntry;

/// Text that identifies the result table
pub const RESULT_MARKERS: [&str; 2] = ["着", "ボートレーサー"];

/// Rank assigned to every non-finish (flying, disqualification, accident, ...).
///
/// Indistinguishable from an actual sixth place in the output.
pub const NON_FINISH_RANK: &str = "6";

/// Parser for race result pages
pub struct RaceResultParser;

impl RaceResultParser {
    /// Parse one result page into finisher rows, in page order.
    ///
    /// Row groups with fewer than four cells are skipped.
    pub fn parse(html: &str) -> Result<Vec<ResultEntry>> {
        let document = Html::parse_document(html);

        let table = find_table(&document, &RESULT_MARKERS)
            .context("result table (着 / ボートレーサー) not found")?;

        let mut entries = Vec::new();

        for group in table.select(&TBODY) {
            let cols = cells(&group);
            if cols.len() < 4 {
                continue;
            }

            let rank = Self::clean_rank(&cell_text(&cols[0]));
            let lane = cell_text(&cols[1]);
            // 登録番号 is the leading four digits of the racer cell
            let racer_id: String = cell_text(&cols[2]).chars().take(4).collect();

            entries.push(ResultEntry {
                rank,
                lane,
                racer_id,
            });
        }

        Ok(entries)
    }

    /// Map a finish-rank cell to rank text.
    ///
    /// Digit strings (ASCII or full-width) are kept as-is; anything else that
    /// does not read as an integer becomes [`NON_FINISH_RANK`].
    pub fn clean_rank(text: &str) -> String {
        if !text.is_empty() && text.chars().all(is_rank_digit) {
            return text.to_string();
        }
        match text.trim().parse::<i64>() {
            Ok(rank) => rank.to_string(),
            Err(_) => NON_FINISH_RANK.to_string(),
        }
    }
}

fn is_rank_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}
