use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::IntentSink;
use crate::models::{default_stages, Deal, Prospect, Stage};

/// Record lookup errors
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("No prospect or deal matches id '{0}'")]
    NotFound(String),
    #[error("Id '{prefix}' is ambiguous; it matches {matches}")]
    Ambiguous { prefix: String, matches: String },
}

/// A record located by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Prospect(usize),
    Deal(usize),
}

/// What applying an intent did to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Moved { id: String, from: Option<String>, to: String },
    Converted { prospect_id: String, deal_id: String },
    Deleted { id: String },
    Selected { id: String },
    /// The intent named a record that is no longer on the board
    Missing { id: String },
}

/// The shell's data set: stages, prospects and deals in list order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub prospects: Vec<Prospect>,
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(skip)]
    selected: Option<String>,
    #[serde(skip)]
    events: Vec<BoardEvent>,
    #[serde(skip)]
    today: Option<NaiveDate>,
}

impl Board {
    /// Empty board with the default stages
    pub fn with_default_stages() -> Self {
        Self {
            stages: default_stages(),
            ..Self::default()
        }
    }

    /// Load the board file; a missing file gives an empty board with default stages
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("board file {} not found, using defaults", path.display());
            return Ok(Self::with_default_stages());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read board file: {}", path.display()))?;
        let board: Board = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse board file: {}", path.display()))?;
        Ok(board)
    }

    /// Write the board file, creating parent directories if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize board")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write board file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace board file: {}", path.display()))?;
        Ok(())
    }

    /// Pin "today" (used for dates stamped on converted deals)
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = Some(today);
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Events recorded since the last call
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Find a record by exact id, then by unique id prefix
    pub fn resolve(&self, id: &str) -> Result<RecordRef, StoreError> {
        if let Some(i) = self.prospects.iter().position(|p| p.id == id) {
            return Ok(RecordRef::Prospect(i));
        }
        if let Some(i) = self.deals.iter().position(|d| d.id == id) {
            return Ok(RecordRef::Deal(i));
        }

        let mut matches: Vec<(RecordRef, &str)> = Vec::new();
        for (i, p) in self.prospects.iter().enumerate() {
            if p.id.starts_with(id) {
                matches.push((RecordRef::Prospect(i), p.id.as_str()));
            }
        }
        for (i, d) in self.deals.iter().enumerate() {
            if d.id.starts_with(id) {
                matches.push((RecordRef::Deal(i), d.id.as_str()));
            }
        }

        match matches.len() {
            0 => Err(StoreError::NotFound(id.to_string())),
            1 => Ok(matches[0].0),
            _ => Err(StoreError::Ambiguous {
                prefix: id.to_string(),
                matches: matches.iter().map(|(_, id)| *id).collect::<Vec<_>>().join(", "),
            }),
        }
    }

    /// Stage by id, or by name (case-insensitive)
    pub fn find_stage(&self, id_or_name: &str) -> Option<&Stage> {
        self.stages
            .iter()
            .find(|s| s.id == id_or_name)
            .or_else(|| {
                self.stages
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(id_or_name) || s.id.eq_ignore_ascii_case(id_or_name))
            })
    }

    pub fn stage_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.stages
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
            .unwrap_or(id)
    }

    /// Stage new prospects land in (lowest order)
    pub fn first_stage(&self) -> Option<&Stage> {
        crate::pipeline::order_stages(&self.stages).into_iter().next()
    }

    fn remove(&mut self, id: &str) -> bool {
        if let Some(i) = self.prospects.iter().position(|p| p.id == id) {
            self.prospects.remove(i);
            return true;
        }
        if let Some(i) = self.deals.iter().position(|d| d.id == id) {
            self.deals.remove(i);
            return true;
        }
        false
    }
}

impl IntentSink for Board {
    fn move_item(&mut self, id: &str, key: &str) {
        // A moved record goes to the end of its list so it arrives last in its new bucket
        if let Some(i) = self.prospects.iter().position(|p| p.id == id) {
            let mut prospect = self.prospects.remove(i);
            let from = std::mem::replace(&mut prospect.stage_id, key.to_string());
            self.prospects.push(prospect);
            self.events.push(BoardEvent::Moved {
                id: id.to_string(),
                from: Some(from),
                to: key.to_string(),
            });
        } else if let Some(i) = self.deals.iter().position(|d| d.id == id) {
            let mut deal = self.deals.remove(i);
            let from = deal.status.replace(key.to_string());
            self.deals.push(deal);
            self.events.push(BoardEvent::Moved {
                id: id.to_string(),
                from,
                to: key.to_string(),
            });
        } else {
            log::warn!("move requested for unknown record '{}'", id);
            self.events.push(BoardEvent::Missing { id: id.to_string() });
        }
    }

    fn convert_item(&mut self, id: &str) {
        let Some(i) = self.prospects.iter().position(|p| p.id == id) else {
            log::warn!("convert requested for unknown prospect '{}'", id);
            self.events.push(BoardEvent::Missing { id: id.to_string() });
            return;
        };
        let today = self.today();
        let prospect = self.prospects.remove(i);
        let mut deal = Deal::new(
            format!("Proposal for {}", prospect.company),
            prospect.company.clone(),
            prospect.estimated_budget().unwrap_or(0.0),
            today,
        );
        deal.next_follow_up = prospect.next_contact();
        self.events.push(BoardEvent::Converted {
            prospect_id: prospect.id,
            deal_id: deal.id.clone(),
        });
        self.deals.push(deal);
    }

    fn delete_item(&mut self, id: &str) {
        if self.remove(id) {
            self.events.push(BoardEvent::Deleted { id: id.to_string() });
        } else {
            log::warn!("delete requested for unknown record '{}'", id);
            self.events.push(BoardEvent::Missing { id: id.to_string() });
        }
    }

    fn select_item(&mut self, id: &str) {
        self.selected = Some(id.to_string());
        self.events.push(BoardEvent::Selected { id: id.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DragController, DropTarget, Intent};
    use crate::models::Qualification;
    use crate::pipeline::{current_key_of, group_by_key};
    use tempfile::TempDir;

    fn prospect(id: &str, stage: &str) -> Prospect {
        Prospect {
            id: id.to_string(),
            name: id.to_uppercase(),
            company: format!("{} Ltd", id),
            email: None,
            phone: None,
            stage_id: stage.to_string(),
            created_ts: 0,
            qualification: None,
        }
    }

    fn two_stage_board() -> Board {
        Board {
            stages: vec![Stage::new("A", "Alpha", 0), Stage::new("B", "Beta", 1)],
            prospects: vec![prospect("p1", "A"), prospect("p2", "B")],
            ..Board::default()
        }
    }

    fn ids(board: &Board, key: &str) -> Vec<String> {
        let keys: Vec<&str> = board.stages.iter().map(|s| s.id.as_str()).collect();
        let buckets = group_by_key(&board.prospects, &keys);
        buckets.get(key).unwrap().items.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_drag_p1_to_b_arrives_after_existing_cards() {
        let mut board = two_stage_board();
        let mut ctl = DragController::with_pseudo_targets(true, true);

        ctl.start_drag("p1");
        let intent = ctl
            .drop(DropTarget::bucket("B"), |id| current_key_of(&board.prospects, id).map(String::from))
            .unwrap();
        assert_eq!(intent, Intent::Move { id: "p1".into(), key: "B".into() });
        intent.dispatch(&mut board);

        assert_eq!(board.take_events().len(), 1);
        assert!(ids(&board, "A").is_empty());
        assert_eq!(ids(&board, "B"), vec!["p2", "p1"]);
    }

    #[test]
    fn test_move_deal_status() {
        let mut board = Board::default();
        let mut deal = Deal::new("Roof".into(), "Acme".into(), 10.0, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        deal.id = "d1".into();
        board.deals.push(deal);

        board.move_item("d1", "order_placed");
        assert_eq!(board.deals[0].status.as_deref(), Some("order_placed"));
        assert_eq!(
            board.take_events(),
            vec![BoardEvent::Moved { id: "d1".into(), from: Some("sent".into()), to: "order_placed".into() }]
        );
    }

    #[test]
    fn test_convert_creates_deal_and_removes_prospect() {
        let mut board = two_stage_board();
        board.set_today(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
        board.prospects[0].qualification = Some(Qualification {
            estimated_budget: Some(750.0),
            ..Default::default()
        });

        board.convert_item("p1");

        assert_eq!(board.prospects.len(), 1);
        assert_eq!(board.deals.len(), 1);
        let deal = &board.deals[0];
        assert_eq!(deal.client, "p1 Ltd");
        assert_eq!(deal.value, 750.0);
        assert_eq!(deal.status.as_deref(), Some("sent"));
        assert_eq!(deal.sent_date, NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
        assert!(matches!(&board.take_events()[0], BoardEvent::Converted { prospect_id, .. } if prospect_id == "p1"));
    }

    #[test]
    fn test_delete_and_missing() {
        let mut board = two_stage_board();
        board.delete_item("p2");
        board.delete_item("p2");
        assert_eq!(board.prospects.len(), 1);
        assert_eq!(
            board.take_events(),
            vec![BoardEvent::Deleted { id: "p2".into() }, BoardEvent::Missing { id: "p2".into() }]
        );
    }

    #[test]
    fn test_select() {
        let mut board = two_stage_board();
        board.select_item("p1");
        assert_eq!(board.selected(), Some("p1"));
    }

    #[test]
    fn test_resolve_prefix() {
        let mut board = two_stage_board();
        board.prospects.push(prospect("abc123", "A"));
        board.prospects.push(prospect("abd456", "A"));

        assert_eq!(board.resolve("p1"), Ok(RecordRef::Prospect(0)));
        assert_eq!(board.resolve("abc"), Ok(RecordRef::Prospect(2)));
        assert!(matches!(board.resolve("ab"), Err(StoreError::Ambiguous { .. })));
        assert_eq!(board.resolve("zz"), Err(StoreError::NotFound("zz".into())));
    }

    #[test]
    fn test_find_stage_by_name() {
        let board = two_stage_board();
        assert_eq!(board.find_stage("A").unwrap().name, "Alpha");
        assert_eq!(board.find_stage("beta").unwrap().id, "B");
        assert!(board.find_stage("gamma").is_none());
        assert_eq!(board.first_stage().unwrap().id, "A");
        assert_eq!(board.stage_name("B"), "Beta");
        assert_eq!(board.stage_name("Z"), "Z");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("board.json");

        let board = two_stage_board();
        board.save(&path).unwrap();
        let loaded = Board::load(&path).unwrap();
        assert_eq!(loaded.stages, board.stages);
        assert_eq!(loaded.prospects, board.prospects);
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let board = Board::load(&temp_dir.path().join("none.json")).unwrap();
        assert_eq!(board.stages.len(), 4);
        assert!(board.prospects.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("board.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Board::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse board file"));
    }
}
