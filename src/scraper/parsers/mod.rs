//! HTML parsers for boatrace.jp pages.

pub mod odds;
pub mod race_card;
pub mod race_list;
pub mod race_result;
pub mod schedule;
pub mod table;

pub use odds::OddsParser;
pub use race_card::RaceCardParser;
pub use race_list::RaceListParser;
pub use race_result::RaceResultParser;
pub use schedule::{ScheduleParser, TournamentLinks};
