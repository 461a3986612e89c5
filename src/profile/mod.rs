pub mod model;
pub mod store;

pub use model::{DayStats, IslandProgress, PlayerProfile, Progress};
pub use store::{FileProfileStore, HttpProfileStore, ProfileStore};
