// Prompt construction, one function per assist mode.
// Prompts depend only on the record fields passed in, so the same records
// always produce the same text.

use serde_json::json;

use crate::assist::client::CompletionRequest;
use crate::models::{Deal, Prospect, Stage};
use crate::pipeline::{group_by_key, order_stages};

/// Assist modes offered in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistMode {
    Research,
    Icebreaker,
    Strategy,
    Prioritize,
}

impl AssistMode {
    pub const ALL: [AssistMode; 4] = [
        AssistMode::Research,
        AssistMode::Icebreaker,
        AssistMode::Strategy,
        AssistMode::Prioritize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssistMode::Research => "research",
            AssistMode::Icebreaker => "icebreaker",
            AssistMode::Strategy => "strategy",
            AssistMode::Prioritize => "prioritize",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "research" => Some(AssistMode::Research),
            "icebreaker" => Some(AssistMode::Icebreaker),
            "strategy" => Some(AssistMode::Strategy),
            "prioritize" | "prioritise" => Some(AssistMode::Prioritize),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssistMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assist request together with the records it is about
#[derive(Debug, Clone, Copy)]
pub enum AssistTask<'a> {
    Research(&'a Prospect),
    Icebreaker(&'a Prospect),
    Strategy(&'a Deal),
    Prioritize {
        prospects: &'a [Prospect],
        stages: &'a [Stage],
    },
}

impl<'a> AssistTask<'a> {
    pub fn mode(&self) -> AssistMode {
        match self {
            AssistTask::Research(_) => AssistMode::Research,
            AssistTask::Icebreaker(_) => AssistMode::Icebreaker,
            AssistTask::Strategy(_) => AssistMode::Strategy,
            AssistTask::Prioritize { .. } => AssistMode::Prioritize,
        }
    }

    pub fn request(&self) -> CompletionRequest {
        match self {
            AssistTask::Research(p) => CompletionRequest {
                prompt: research_prompt(p),
                response_schema: None,
            },
            AssistTask::Icebreaker(p) => CompletionRequest {
                prompt: icebreaker_prompt(p),
                response_schema: None,
            },
            AssistTask::Strategy(d) => CompletionRequest {
                prompt: strategy_prompt(d),
                response_schema: None,
            },
            AssistTask::Prioritize { prospects, stages } => CompletionRequest {
                prompt: prioritize_prompt(prospects, stages),
                response_schema: Some(prioritize_schema()),
            },
        }
    }
}

fn push_prospect_fields(buf: &mut String, p: &Prospect) {
    buf.push_str(&format!("- Name: {}\n", p.name));
    buf.push_str(&format!("- Company: {}\n", p.company));
    if let Some(email) = &p.email {
        buf.push_str(&format!("- Email: {}\n", email));
    }
    if let Some(phone) = &p.phone {
        buf.push_str(&format!("- Phone: {}\n", phone));
    }
    if let Some(q) = &p.qualification {
        if let Some(segment) = &q.segment {
            buf.push_str(&format!("- Segment: {}\n", segment));
        }
        if let Some(size) = &q.size {
            buf.push_str(&format!("- Company size: {}\n", size));
        }
        if let Some(urgency) = q.urgency {
            buf.push_str(&format!("- Urgency: {}\n", urgency.as_str()));
        }
        if let Some(budget) = q.estimated_budget {
            buf.push_str(&format!("- Estimated budget: {:.2}\n", budget));
        }
        if let Some(next) = q.next_contact {
            buf.push_str(&format!("- Next contact: {}\n", next.format("%Y-%m-%d")));
        }
    }
}

pub fn research_prompt(p: &Prospect) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a sales research assistant for a small business.\n");
    prompt.push_str("Research the lead below and summarise what a salesperson should know before the first contact: ");
    prompt.push_str("what the company does, its likely needs, and objections to expect.\n\n");
    prompt.push_str("Lead:\n");
    push_prospect_fields(&mut prompt, p);
    prompt.push_str("\nAnswer in at most five short bullet points.\n");
    prompt
}

pub fn icebreaker_prompt(p: &Prospect) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are helping a small-business owner start a conversation with a new lead.\n");
    prompt.push_str("Write three short, friendly opening messages (one per line) that could be sent by email or chat. ");
    prompt.push_str("Mention the company by name and avoid sounding like a template.\n\n");
    prompt.push_str("Lead:\n");
    push_prospect_fields(&mut prompt, p);
    prompt
}

pub fn strategy_prompt(d: &Deal) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a sales coach. A budget was sent to a client and needs to be followed up.\n");
    prompt.push_str("Suggest a follow-up strategy: what to say next, when, and how to handle silence.\n\n");
    prompt.push_str("Budget:\n");
    prompt.push_str(&format!("- Title: {}\n", d.title));
    prompt.push_str(&format!("- Client: {}\n", d.client));
    prompt.push_str(&format!("- Value: {:.2}\n", d.value));
    let status = d
        .status()
        .map(|s| s.label().to_string())
        .or_else(|| d.status.clone())
        .unwrap_or_else(|| "unknown".to_string());
    prompt.push_str(&format!("- Status: {}\n", status));
    prompt.push_str(&format!("- Sent on: {}\n", d.sent_date.format("%Y-%m-%d")));
    if let Some(next) = d.next_follow_up {
        prompt.push_str(&format!("- Next follow-up planned: {}\n", next.format("%Y-%m-%d")));
    }
    if d.follow_ups.is_empty() {
        prompt.push_str("- No follow-ups yet\n");
    } else {
        prompt.push_str("- Follow-up history:\n");
        for f in &d.follow_ups {
            prompt.push_str(&format!("  - {}: {}\n", f.date.format("%Y-%m-%d"), f.note));
        }
    }
    prompt.push_str("\nKeep the answer under 150 words.\n");
    prompt
}

/// Prospects sitting in a board column, column by column. These are the
/// only records a prioritize request lists or may rank.
pub fn prioritize_candidates<'a>(prospects: &'a [Prospect], stages: &[Stage]) -> Vec<&'a Prospect> {
    let ordered = order_stages(stages);
    let keys: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
    let buckets = group_by_key(prospects, &keys);
    buckets
        .iter()
        .flat_map(|bucket| bucket.items.iter().copied())
        .collect()
}

/// Only prospects in a board column are ranked; they are listed column by column.
pub fn prioritize_prompt(prospects: &[Prospect], stages: &[Stage]) -> String {
    let ordered = order_stages(stages);
    let keys: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
    let buckets = group_by_key(prospects, &keys);

    let mut prompt = String::new();
    prompt.push_str("You are a sales manager reviewing a prospecting pipeline.\n");
    prompt.push_str("Rank the leads below by how likely they are to turn into a sale soon.\n");
    prompt.push_str("Return a JSON array sorted by score, highest first. For each lead give:\n");
    prompt.push_str("- prospectId: the id exactly as written below\n");
    prompt.push_str("- score: a number from 0 to 100\n");
    prompt.push_str("- action: the recommended next step, in a few words\n");
    prompt.push_str("- rationale: one short sentence\n\n");
    prompt.push_str("Leads:\n");

    for (stage, bucket) in ordered.iter().zip(buckets.iter()) {
        for p in &bucket.items {
            prompt.push_str(&format!("- id={} | {} ({}) | stage: {}", p.id, p.name, p.company, stage.name));
            if let Some(q) = &p.qualification {
                if let Some(segment) = &q.segment {
                    prompt.push_str(&format!(" | segment: {}", segment));
                }
                if let Some(size) = &q.size {
                    prompt.push_str(&format!(" | size: {}", size));
                }
                if let Some(urgency) = q.urgency {
                    prompt.push_str(&format!(" | urgency: {}", urgency.as_str()));
                }
                if let Some(budget) = q.estimated_budget {
                    prompt.push_str(&format!(" | budget: {:.2}", budget));
                }
                if let Some(next) = q.next_contact {
                    prompt.push_str(&format!(" | next contact: {}", next.format("%Y-%m-%d")));
                }
            }
            prompt.push('\n');
        }
    }
    prompt
}

/// Response schema for prioritize: an array of ranked leads
pub fn prioritize_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "prospectId": { "type": "STRING" },
                "score": { "type": "NUMBER", "description": "Score from 0 to 100" },
                "action": { "type": "STRING" },
                "rationale": { "type": "STRING" }
            },
            "required": ["prospectId", "score", "action", "rationale"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FollowUp, Qualification, Urgency};
    use chrono::NaiveDate;

    fn prospect(id: &str, stage: &str) -> Prospect {
        Prospect {
            id: id.to_string(),
            name: format!("Name {}", id),
            company: format!("Company {}", id),
            email: Some(format!("{}@example.com", id)),
            phone: None,
            stage_id: stage.to_string(),
            created_ts: 0,
            qualification: Some(Qualification {
                segment: Some("retail".into()),
                urgency: Some(Urgency::High),
                estimated_budget: Some(1500.0),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_mode_parsing() {
        for mode in AssistMode::ALL {
            assert_eq!(AssistMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(AssistMode::from_str("Prioritise"), Some(AssistMode::Prioritize));
        assert_eq!(AssistMode::from_str("summarize"), None);
    }

    #[test]
    fn test_research_prompt_embeds_fields() {
        let p = prospect("p1", "new");
        let prompt = research_prompt(&p);
        assert!(prompt.contains("Name p1"));
        assert!(prompt.contains("Company p1"));
        assert!(prompt.contains("p1@example.com"));
        assert!(prompt.contains("Segment: retail"));
        assert!(prompt.contains("Urgency: high"));
        assert!(prompt.contains("1500.00"));
        assert!(!prompt.contains("Phone"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let p = prospect("p1", "new");
        assert_eq!(icebreaker_prompt(&p), icebreaker_prompt(&p));
        assert_eq!(
            AssistTask::Research(&p).request(),
            AssistTask::Research(&p).request()
        );
    }

    #[test]
    fn test_only_prioritize_has_schema() {
        let p = prospect("p1", "new");
        let stages = vec![Stage::new("new", "New", 0)];
        let deal = Deal::new("Roof".into(), "Acme".into(), 10.0, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        assert!(AssistTask::Research(&p).request().response_schema.is_none());
        assert!(AssistTask::Icebreaker(&p).request().response_schema.is_none());
        assert!(AssistTask::Strategy(&deal).request().response_schema.is_none());

        let prospects = vec![p.clone()];
        let task = AssistTask::Prioritize { prospects: &prospects, stages: &stages };
        assert_eq!(task.mode(), AssistMode::Prioritize);
        let schema = task.request().response_schema.unwrap();
        assert_eq!(schema["type"], "ARRAY");
        let required = schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 4);
    }

    #[test]
    fn test_prioritize_prompt_lists_board_prospects_in_column_order() {
        let stages = vec![Stage::new("late", "Proposal", 5), Stage::new("early", "New", 0)];
        let prospects = vec![prospect("p1", "late"), prospect("p2", "early"), prospect("p3", "missing")];
        let prompt = prioritize_prompt(&prospects, &stages);

        let p1 = prompt.find("id=p1").unwrap();
        let p2 = prompt.find("id=p2").unwrap();
        assert!(p2 < p1);
        assert!(!prompt.contains("id=p3"));
        assert!(prompt.contains("stage: Proposal"));
    }

    #[test]
    fn test_strategy_prompt_includes_history() {
        let mut deal = Deal::new("Kitchen".into(), "Bob".into(), 4200.0, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        deal.follow_ups.push(FollowUp {
            date: NaiveDate::from_ymd_opt(2026, 2, 8).unwrap(),
            note: "left voicemail".into(),
        });
        let prompt = strategy_prompt(&deal);
        assert!(prompt.contains("Kitchen"));
        assert!(prompt.contains("4200.00"));
        assert!(prompt.contains("Status: Sent"));
        assert!(prompt.contains("2026-02-08: left voicemail"));
    }
}
