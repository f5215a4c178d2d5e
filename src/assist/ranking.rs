use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::assist::client::AssistError;
use crate::models::Prospect;

const MAX_LOG_CHARS: usize = 2_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankEntry {
    prospect_id: String,
    score: f64,
    action: String,
    rationale: String,
}

/// One row of the prioritize panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProspect {
    pub prospect_id: String,
    pub name: String,
    pub company: String,
    pub score: f64,
    pub action: String,
    pub rationale: String,
}

/// Parse a prioritize response against the current prospects.
///
/// Entries naming a prospect that is not in `prospects` (the records the
/// prompt listed) are dropped. The
/// rest keep the order the service returned; scores are not re-sorted.
pub fn parse_ranking<'a, I>(text: &str, prospects: I) -> Result<Vec<RankedProspect>, AssistError>
where
    I: IntoIterator<Item = &'a Prospect>,
{
    let json = extract_json_array(text).ok_or_else(|| {
        log::debug!("prioritize output without JSON array: {}", truncate_for_log(text, MAX_LOG_CHARS));
        AssistError::Malformed("response did not contain a JSON array".to_string())
    })?;
    let entries: Vec<RankEntry> = serde_json::from_str(json)
        .map_err(|e| AssistError::Malformed(format!("invalid ranking JSON: {}", e)))?;

    let by_id: HashMap<&str, &Prospect> = prospects.into_iter().map(|p| (p.id.as_str(), p)).collect();
    let total = entries.len();

    let ranked: Vec<RankedProspect> = entries
        .into_iter()
        .filter_map(|entry| match by_id.get(entry.prospect_id.as_str()) {
            Some(p) => Some(RankedProspect {
                prospect_id: entry.prospect_id,
                name: p.name.clone(),
                company: p.company.clone(),
                score: entry.score,
                action: entry.action,
                rationale: entry.rationale,
            }),
            None => {
                log::debug!("dropping ranking entry for unknown prospect '{}'", entry.prospect_id);
                None
            }
        })
        .collect();

    if ranked.len() < total {
        log::info!("prioritize: {} of {} entries referenced unknown prospects", total - ranked.len(), total);
    }
    Ok(ranked)
}

/// Slice from the first '[' to the last ']' (tolerates code fences and chatter)
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

pub(crate) fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}
