pub mod model;
pub mod tracker;

pub use model::{LearningUnit, MasteryRecord, ReviewData, UnitCategory};
pub use tracker::MasteryTracker;
