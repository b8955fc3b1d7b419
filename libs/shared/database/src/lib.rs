pub mod data_api;

pub use data_api::{DataApiClient, DataApiError, UpdateOutcome};
