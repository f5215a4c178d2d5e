use serde::{Deserialize, Serialize};

/// Pipeline stage (a column on the prospect board)
/// `order` positions the column; equal orders keep their listed sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub order: i64,
}

impl Stage {
    pub fn new(id: &str, name: &str, order: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            order,
        }
    }
}

/// Stages written by `leadboard init`
pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::new("new", "New Lead", 0),
        Stage::new("contacted", "Contacted", 1),
        Stage::new("qualified", "Qualified", 2),
        Stage::new("proposal", "Proposal", 3),
    ]
}
