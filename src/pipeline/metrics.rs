// Board footer and dashboard metrics, recomputed from the records on every call

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Deal, DealStatus, Prospect, Stage};
use crate::pipeline::bucket::{group_by_key, order_stages};

/// A deal is stale when it is still open and its next follow-up date has passed
pub fn is_stale(deal: &Deal, today: NaiveDate) -> bool {
    match (deal.status(), deal.next_follow_up) {
        (Some(status), Some(next)) => status.is_open() && next < today,
        _ => false,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub status: DealStatus,
    pub count: usize,
    pub total: f64,
    pub stale: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealMetrics {
    pub columns: Vec<StatusSummary>,
    /// Value still in play (sent + following up)
    pub open_total: f64,
    /// Value of placed orders
    pub won_total: f64,
    pub stale_count: usize,
    /// Deals whose status matched no column
    pub unfiled: usize,
}

pub fn deal_metrics(deals: &[Deal], today: NaiveDate) -> DealMetrics {
    let keys: Vec<&str> = DealStatus::ALL.iter().map(|s| s.as_str()).collect();
    let buckets = group_by_key(deals, &keys);

    let columns: Vec<StatusSummary> = DealStatus::ALL
        .iter()
        .zip(buckets.iter())
        .map(|(status, bucket)| StatusSummary {
            status: *status,
            count: bucket.len(),
            total: bucket.total,
            stale: bucket.items.iter().filter(|d| is_stale(d, today)).count(),
        })
        .collect();

    let open_total = columns
        .iter()
        .filter(|c| c.status.is_open())
        .map(|c| c.total)
        .sum();
    let won_total = columns
        .iter()
        .filter(|c| c.status == DealStatus::OrderPlaced)
        .map(|c| c.total)
        .sum();
    let stale_count = columns.iter().map(|c| c.stale).sum();

    DealMetrics {
        columns,
        open_total,
        won_total,
        stale_count,
        unfiled: buckets.dropped(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageCount {
    pub stage_id: String,
    pub name: String,
    pub count: usize,
    pub estimated_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProspectMetrics {
    pub stages: Vec<StageCount>,
    /// Ids of prospects whose next contact date is today or earlier
    pub due_for_contact: Vec<String>,
    /// Prospects whose stage is not on the board
    pub unassigned: usize,
}

pub fn prospect_metrics(prospects: &[Prospect], stages: &[Stage], today: NaiveDate) -> ProspectMetrics {
    let ordered = order_stages(stages);
    let keys: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
    let buckets = group_by_key(prospects, &keys);

    let stages = ordered
        .iter()
        .zip(buckets.iter())
        .map(|(stage, bucket)| StageCount {
            stage_id: stage.id.clone(),
            name: stage.name.clone(),
            count: bucket.len(),
            estimated_total: bucket.total,
        })
        .collect();

    let due_for_contact = prospects
        .iter()
        .filter(|p| p.next_contact().map_or(false, |d| d <= today))
        .map(|p| p.id.clone())
        .collect();

    ProspectMetrics {
        stages,
        due_for_contact,
        unassigned: buckets.dropped(),
    }
}
