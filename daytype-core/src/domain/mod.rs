//! Domain types for day-type classification

pub mod bar;
pub mod day_type;
pub mod record;

pub use bar::Bar;
pub use day_type::{DayType, IbSize, UnknownLabel};
pub use record::ClassificationRecord;
