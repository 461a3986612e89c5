use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskArchetype {
    Count,
    Compare,
    Bigger,
    Smaller,
    Sequence,
    AddSub,
}

impl TaskArchetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskArchetype::Count => "count",
            TaskArchetype::Compare => "compare",
            TaskArchetype::Bigger => "bigger",
            TaskArchetype::Smaller => "smaller",
            TaskArchetype::Sequence => "sequence",
            TaskArchetype::AddSub => "addSub",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
}

impl Operation {
    pub fn apply(&self, left: i32, right: i32) -> i32 {
        match self {
            Operation::Add => left + right,
            Operation::Subtract => left - right,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
        }
    }
}

/// A candidate answer the player can tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Number(i32),
    Side(Side),
}

impl Answer {
    pub fn as_number(&self) -> Option<i32> {
        match self {
            Answer::Number(n) => Some(*n),
            Answer::Side(_) => None,
        }
    }
}

/// What the player is shown. Each archetype carries only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskKind {
    Count { count: i32, icon: String },
    Compare { left: i32, right: i32 },
    Bigger { numbers: Vec<i32> },
    Smaller { numbers: Vec<i32> },
    #[serde(rename_all = "camelCase")]
    Sequence { cells: [i32; 4], missing_index: usize },
    AddSub { left: i32, right: i32, op: Operation },
}

impl TaskKind {
    pub fn archetype(&self) -> TaskArchetype {
        match self {
            TaskKind::Count { .. } => TaskArchetype::Count,
            TaskKind::Compare { .. } => TaskArchetype::Compare,
            TaskKind::Bigger { .. } => TaskArchetype::Bigger,
            TaskKind::Smaller { .. } => TaskArchetype::Smaller,
            TaskKind::Sequence { .. } => TaskArchetype::Sequence,
            TaskKind::AddSub { .. } => TaskArchetype::AddSub,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "visual")]
    pub kind: TaskKind,
    pub options: Vec<Answer>,
    pub correct: Answer,
    pub stage: u8,
    pub time_limit_seconds: u32,
    pub hints_enabled: bool,
}

impl Task {
    pub fn archetype(&self) -> TaskArchetype {
        self.kind.archetype()
    }

    pub fn is_correct(&self, answer: &Answer) -> bool {
        *answer == self.correct
    }

    /// Sequence cells with the masked one as `None`; empty for other archetypes.
    pub fn sequence_display(&self) -> Vec<Option<i32>> {
        match &self.kind {
            TaskKind::Sequence { cells, missing_index } => cells
                .iter()
                .enumerate()
                .map(|(i, n)| if i == *missing_index { None } else { Some(*n) })
                .collect(),
            _ => Vec::new(),
        }
    }
}
