pub mod generator;
pub mod stage;
pub mod task;

pub use generator::{TaskContext, TaskGenerator};
pub use stage::{StageChange, StageConfig, StageTracker, StreakThresholds};
pub use task::{Answer, Operation, Side, Task, TaskArchetype, TaskKind};
