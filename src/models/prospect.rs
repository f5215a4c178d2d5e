use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How soon the prospect needs a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }
}

/// Optional qualification metadata gathered while prospecting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_contact: Option<NaiveDate>,
}

impl Qualification {
    pub fn is_empty(&self) -> bool {
        self == &Qualification::default()
    }
}

/// Prospect model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    pub id: String,
    pub name: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub stage_id: String,
    pub created_ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<Qualification>,
}

impl Prospect {
    /// Create a new prospect in the given stage
    pub fn new(name: String, company: String, stage_id: String) -> Self {
        Self {
            id: super::new_id(),
            name,
            company,
            email: None,
            phone: None,
            stage_id,
            created_ts: chrono::Utc::now().timestamp(),
            qualification: None,
        }
    }

    /// Estimated budget from qualification, if recorded
    pub fn estimated_budget(&self) -> Option<f64> {
        self.qualification.as_ref().and_then(|q| q.estimated_budget)
    }

    pub fn next_contact(&self) -> Option<NaiveDate> {
        self.qualification.as_ref().and_then(|q| q.next_contact)
    }
}
