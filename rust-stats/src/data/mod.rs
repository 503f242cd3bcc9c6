//! Season table aggregation and the on-disk cache

pub mod aggregate;
pub mod cache;

pub use aggregate::{merge_tables, CleaningStats, SeasonAggregator};
pub use cache::{
    dataframe_to_records, load_records, records_to_dataframe, save_records, season_summaries,
    SeasonSummary, SEASON_COLUMNS,
};
