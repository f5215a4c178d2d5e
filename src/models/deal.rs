use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Deal status (kanban column on the deals board)
///
/// - Sent: budget sent to the client, no answer yet
/// - FollowingUp: client is being chased
/// - OrderPlaced: won (terminal)
/// - Lost: declined or abandoned (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Sent,
    FollowingUp,
    OrderPlaced,
    Lost,
}

impl DealStatus {
    /// Column order on the deals board
    pub const ALL: [DealStatus; 4] = [
        DealStatus::Sent,
        DealStatus::FollowingUp,
        DealStatus::OrderPlaced,
        DealStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Sent => "sent",
            DealStatus::FollowingUp => "following_up",
            DealStatus::OrderPlaced => "order_placed",
            DealStatus::Lost => "lost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(DealStatus::Sent),
            "following_up" => Some(DealStatus::FollowingUp),
            "order_placed" => Some(DealStatus::OrderPlaced),
            "lost" => Some(DealStatus::Lost),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DealStatus::Sent => "Sent",
            DealStatus::FollowingUp => "Following Up",
            DealStatus::OrderPlaced => "Order Placed",
            DealStatus::Lost => "Lost",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Sent | Self::FollowingUp)
    }
}

/// A dated follow-up event on a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub date: NaiveDate,
    pub note: String,
}

/// Deal (a budget sent to a client)
///
/// `status` is kept as the raw string the shell stored. Records whose
/// status is not one of the known values stay in the data set but never
/// land in a board column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub value: f64,
    #[serde(default)]
    pub status: Option<String>,
    pub client: String,
    pub sent_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_follow_up: Option<NaiveDate>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
}

impl Deal {
    /// Create a new deal in the `sent` column
    pub fn new(title: String, client: String, value: f64, sent_date: NaiveDate) -> Self {
        Self {
            id: super::new_id(),
            title,
            value,
            status: Some(DealStatus::Sent.as_str().to_string()),
            client,
            sent_date,
            next_follow_up: None,
            follow_ups: Vec::new(),
        }
    }

    /// Parsed status, or None when the stored value is absent or unknown
    pub fn status(&self) -> Option<DealStatus> {
        self.status.as_deref().and_then(DealStatus::from_str)
    }

    /// Most recent follow-up event, if any
    pub fn last_follow_up(&self) -> Option<&FollowUp> {
        self.follow_ups.iter().max_by_key(|f| f.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_deal_status_conversion() {
        for status in DealStatus::ALL {
            assert_eq!(DealStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(DealStatus::from_str("won"), None);
        assert_eq!(DealStatus::from_str(""), None);
    }

    #[test]
    fn test_deal_status_open() {
        assert!(DealStatus::Sent.is_open());
        assert!(DealStatus::FollowingUp.is_open());
        assert!(!DealStatus::OrderPlaced.is_open());
        assert!(!DealStatus::Lost.is_open());
    }

    #[test]
    fn test_unknown_status_parses_to_none() {
        let mut deal = Deal::new("Roof".into(), "Acme".into(), 100.0, date("2026-01-02"));
        assert_eq!(deal.status(), Some(DealStatus::Sent));

        deal.status = Some("archived".to_string());
        assert_eq!(deal.status(), None);

        deal.status = None;
        assert_eq!(deal.status(), None);
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{"id":"d1","title":"Fence","value":250.5,"client":"Bob","sent_date":"2026-03-01"}"#;
        let deal: Deal = serde_json::from_str(json).unwrap();
        assert_eq!(deal.status, None);
        assert!(deal.follow_ups.is_empty());
        assert_eq!(deal.next_follow_up, None);
    }

    #[test]
    fn test_last_follow_up() {
        let mut deal = Deal::new("Roof".into(), "Acme".into(), 100.0, date("2026-01-02"));
        assert!(deal.last_follow_up().is_none());
        deal.follow_ups.push(FollowUp { date: date("2026-01-10"), note: "called".into() });
        deal.follow_ups.push(FollowUp { date: date("2026-01-05"), note: "emailed".into() });
        assert_eq!(deal.last_follow_up().unwrap().note, "called");
    }
}
