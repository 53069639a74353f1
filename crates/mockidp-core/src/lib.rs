pub mod config;
pub mod error;
pub mod json;
pub mod protocol;
pub mod request;
pub mod tape;
pub mod testing;

pub use config::MockConfig;
pub use error::{MockError, Result};
pub use json::pretty_json;
pub use request::{RequestSummary, StandardizedRequest, Standardizer};
pub use tape::{get_tape_details, Tape, TapeDetail, TapeResponse, TapeStore, UnusedTapes};
