//! Win odds (単勝) parser for boatrace.jp
//!
//! URL: https://www.boatrace.jp/owpc/pc/race/oddstf?rno=..&jcd=..&hd=..
//!
//! The page holds a 単勝 table and a 複勝 table; only the first is read.
//! Each `<tbody>` is one lane: 枠 | ボートレーサー | 単勝オッズ

use anyhow::{Context, Result};
use scraper::Html;

use super::table::{cell_text, cells, find_table, TBODY};
use crate::types::OddsEntry;

/// Text that identifies the win odds table
pub const ODDS_MARKERS: [&str; 1] = ["単勝"];

/// Parser for win odds pages
pub struct OddsParser;

impl OddsParser {
    /// Parse win odds per lane.
    ///
    /// Every row group must have at least three cells; a short row fails the
    /// whole page.
    pub fn parse(html: &str) -> Result<Vec<OddsEntry>> {
        let document = Html::parse_document(html);

        let table = find_table(&document, &ODDS_MARKERS).context("win odds table (単勝) not found")?;

        let mut entries = Vec::new();

        for (idx, group) in table.select(&TBODY).enumerate() {
            let cols = cells(&group);

            let lane = cols
                .first()
                .with_context(|| format!("odds row {}: lane cell missing", idx))?;
            let odds = cols
                .get(2)
                .with_context(|| format!("odds row {}: odds cell missing ({} cells)", idx, cols.len()))?;

            entries.push(OddsEntry {
                lane: cell_text(lane),
                win_odds: cell_text(odds),
            });
        }

        Ok(entries)
    }
}
