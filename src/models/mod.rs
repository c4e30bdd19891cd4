pub mod climate;

pub use climate::{round_to_tenth, ClimateRecord, RecordGenerator, LOCATIONS};
