pub mod phq9;

pub use phq9::{score_phq9, Phq9Service};
