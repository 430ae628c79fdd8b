pub mod reading;

pub use reading::{Reading, ReadingField, Timestamp};
