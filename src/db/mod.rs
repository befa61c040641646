pub mod inventory;
pub mod ratings;

pub use inventory::load_inventory;
pub use ratings::{CsvRatingStore, RatingStore};
