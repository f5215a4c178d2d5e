// Output formatting utilities

use chrono::NaiveDate;
use std::io::IsTerminal;

use crate::assist::{AssistOutput, AssistState};
use crate::models::{Deal, DealStatus, Prospect};
use crate::pipeline::{deal_metrics, group_by_key, is_stale, order_stages, prospect_metrics};
use crate::store::{Board, BoardEvent};
use crate::utils::format_relative_date;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_FG_RED: &str = "\x1b[31m";

/// Rendering options shared by the board views
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub today: NaiveDate,
    pub currency_symbol: String,
    pub is_tty: bool,
    pub width: usize,
}

impl RenderOptions {
    pub fn plain(today: NaiveDate) -> Self {
        Self {
            today,
            currency_symbol: "$".to_string(),
            is_tty: false,
            width: 120,
        }
    }
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, falling back to COLUMNS and then 120.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }
    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }
    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn red_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_FG_RED, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Format a monetary value with thousands separators, e.g. `$12,345.60`
pub fn format_currency(value: f64, symbol: &str) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}{}.{:02}", if negative { "-" } else { "" }, symbol, grouped, frac)
}

/// Cut `text` to `width` characters, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let mut out: String = text.chars().take(width - 3).collect();
    out.push_str("...");
    out
}

fn prospect_card(p: &Prospect, opts: &RenderOptions) -> String {
    let mut line = format!("  [{}] {} - {}", p.id, p.name, p.company);
    if let Some(q) = &p.qualification {
        if let Some(urgency) = q.urgency {
            line.push_str(&format!(" urgency={}", urgency.as_str()));
        }
        if let Some(budget) = q.estimated_budget {
            line.push_str(&format!(" budget={}", format_currency(budget, &opts.currency_symbol)));
        }
        if let Some(next) = q.next_contact {
            line.push_str(&format!(" next={}", format_relative_date(next, opts.today)));
        }
    }
    truncate(&line, opts.width)
}

/// Prospect kanban: one section per stage in column order
pub fn format_prospect_board(board: &Board, opts: &RenderOptions) -> String {
    let ordered = order_stages(&board.stages);
    let keys: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
    let buckets = group_by_key(&board.prospects, &keys);

    let mut output = String::new();
    if ordered.is_empty() {
        output.push_str("No stages defined. Run 'leadboard init' to create the default stages.\n");
        return output;
    }

    for (stage, bucket) in ordered.iter().zip(buckets.iter()) {
        let header = format!(
            "=== {} ({}) {} ===",
            stage.name,
            bucket.len(),
            format_currency(bucket.total, &opts.currency_symbol)
        );
        output.push_str(&bold_if_tty(&header, opts.is_tty));
        output.push('\n');
        if bucket.is_empty() {
            output.push_str("  (empty)\n");
        }
        for p in &bucket.items {
            output.push_str(&prospect_card(p, opts));
            output.push('\n');
        }
        output.push('\n');
    }

    let metrics = prospect_metrics(&board.prospects, &board.stages, opts.today);
    if !metrics.due_for_contact.is_empty() {
        output.push_str(&format!("{} prospect(s) due for contact\n", metrics.due_for_contact.len()));
    }
    if buckets.dropped() > 0 {
        output.push_str(&format!("{} prospect(s) not in any stage\n", buckets.dropped()));
    }
    output
}

fn deal_card(d: &Deal, opts: &RenderOptions) -> String {
    let mut line = format!(
        "  [{}] {} - {} {} sent={}",
        d.id,
        d.title,
        d.client,
        format_currency(d.value, &opts.currency_symbol),
        d.sent_date.format("%Y-%m-%d")
    );
    if let Some(next) = d.next_follow_up {
        line.push_str(&format!(" next={}", format_relative_date(next, opts.today)));
    }
    if !d.follow_ups.is_empty() {
        line.push_str(&format!(" follow-ups={}", d.follow_ups.len()));
    }
    let line = truncate(&line, opts.width.saturating_sub(8).max(20));
    if is_stale(d, opts.today) {
        format!("{} {}", line, red_if_tty("STALE", opts.is_tty))
    } else {
        line
    }
}

/// Deal kanban by status with column footers and pipeline totals
pub fn format_deal_board(deals: &[Deal], opts: &RenderOptions) -> String {
    let keys: Vec<&str> = DealStatus::ALL.iter().map(|s| s.as_str()).collect();
    let buckets = group_by_key(deals, &keys);
    let metrics = deal_metrics(deals, opts.today);
    let symbol = &opts.currency_symbol;

    let mut output = String::new();
    for (status, bucket) in DealStatus::ALL.iter().zip(buckets.iter()) {
        let header = format!("=== {} ({}) ===", status.label(), bucket.len());
        output.push_str(&bold_if_tty(&header, opts.is_tty));
        output.push('\n');
        if bucket.is_empty() {
            output.push_str("  (empty)\n");
        }
        for d in &bucket.items {
            output.push_str(&deal_card(d, opts));
            output.push('\n');
        }
        output.push_str(&format!("  Total: {}\n\n", format_currency(bucket.total, symbol)));
    }

    output.push_str(&format!(
        "Open pipeline: {}  Won: {}  Stale: {}\n",
        format_currency(metrics.open_total, symbol),
        format_currency(metrics.won_total, symbol),
        metrics.stale_count
    ));
    if metrics.unfiled > 0 {
        output.push_str(&format!("{} deal(s) with an unknown status are not shown\n", metrics.unfiled));
    }
    output
}

pub fn format_stage_list(board: &Board) -> String {
    let ordered = order_stages(&board.stages);
    if ordered.is_empty() {
        return "No stages defined.\n".to_string();
    }
    let mut output = format!("{:<6} {:<16} {}\n", "Order", "Id", "Name");
    output.push_str(&format!("{}\n", "-".repeat(40)));
    for stage in ordered {
        output.push_str(&format!("{:<6} {:<16} {}\n", stage.order, stage.id, stage.name));
    }
    output
}

pub fn format_prospect_detail(board: &Board, p: &Prospect, opts: &RenderOptions) -> String {
    let mut output = format!("Prospect {}\n", p.id);
    output.push_str(&format!("  Name:     {}\n", p.name));
    output.push_str(&format!("  Company:  {}\n", p.company));
    if let Some(email) = &p.email {
        output.push_str(&format!("  Email:    {}\n", email));
    }
    if let Some(phone) = &p.phone {
        output.push_str(&format!("  Phone:    {}\n", phone));
    }
    output.push_str(&format!("  Stage:    {}\n", board.stage_name(&p.stage_id)));
    if let Some(created) = chrono::DateTime::from_timestamp(p.created_ts, 0) {
        output.push_str(&format!("  Created:  {}\n", created.format("%Y-%m-%d")));
    }
    if let Some(q) = &p.qualification {
        if let Some(segment) = &q.segment {
            output.push_str(&format!("  Segment:  {}\n", segment));
        }
        if let Some(size) = &q.size {
            output.push_str(&format!("  Size:     {}\n", size));
        }
        if let Some(urgency) = q.urgency {
            output.push_str(&format!("  Urgency:  {}\n", urgency.as_str()));
        }
        if let Some(budget) = q.estimated_budget {
            output.push_str(&format!("  Budget:   {}\n", format_currency(budget, &opts.currency_symbol)));
        }
        if let Some(next) = q.next_contact {
            output.push_str(&format!(
                "  Next contact: {} ({})\n",
                next.format("%Y-%m-%d"),
                format_relative_date(next, opts.today)
            ));
        }
    }
    output
}

pub fn format_deal_detail(d: &Deal, opts: &RenderOptions) -> String {
    let status = match d.status() {
        Some(s) => s.label().to_string(),
        None => format!("{} (unknown)", d.status.as_deref().unwrap_or("none")),
    };
    let mut output = format!("Deal {}\n", d.id);
    output.push_str(&format!("  Title:    {}\n", d.title));
    output.push_str(&format!("  Client:   {}\n", d.client));
    output.push_str(&format!("  Value:    {}\n", format_currency(d.value, &opts.currency_symbol)));
    output.push_str(&format!("  Status:   {}\n", status));
    output.push_str(&format!("  Sent:     {}\n", d.sent_date.format("%Y-%m-%d")));
    if let Some(next) = d.next_follow_up {
        let stale = if is_stale(d, opts.today) { " STALE" } else { "" };
        output.push_str(&format!(
            "  Next follow-up: {} ({}){}\n",
            next.format("%Y-%m-%d"),
            format_relative_date(next, opts.today),
            stale
        ));
    }
    if !d.follow_ups.is_empty() {
        output.push_str("  Follow-ups:\n");
        for f in &d.follow_ups {
            output.push_str(&format!("    {}  {}\n", f.date.format("%Y-%m-%d"), f.note));
        }
    }
    output
}

/// Assist panel contents
pub fn format_assist_state(state: &AssistState) -> String {
    match state {
        AssistState::Idle => String::new(),
        AssistState::Loading => "Thinking...\n".to_string(),
        AssistState::Failed(message) => format!("Assist failed: {}\n", message),
        AssistState::Ready(AssistOutput::Text(text)) => format!("{}\n", text),
        AssistState::Ready(AssistOutput::Ranking(rows)) => {
            if rows.is_empty() {
                return "No prospects to prioritize.\n".to_string();
            }
            let mut output = String::new();
            for (i, row) in rows.iter().enumerate() {
                output.push_str(&format!(
                    "{}. [{}] {} ({}) score {:.0}\n",
                    i + 1,
                    row.prospect_id,
                    row.name,
                    row.company,
                    row.score
                ));
                output.push_str(&format!("   Next: {}\n", row.action));
                output.push_str(&format!("   Why:  {}\n", row.rationale));
            }
            output
        }
    }
}

fn status_label(key: &str) -> String {
    DealStatus::from_str(key)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| key.to_string())
}

/// One line per board change
pub fn format_events(board: &Board, events: &[BoardEvent]) -> String {
    let mut output = String::new();
    for event in events {
        let line = match event {
            BoardEvent::Moved { id, from, to } => {
                let is_prospect = board.prospects.iter().any(|p| &p.id == id);
                if is_prospect {
                    let from = from.as_deref().map(|f| board.stage_name(f).to_string()).unwrap_or_default();
                    format!("Moved {} from '{}' to '{}'", id, from, board.stage_name(to))
                } else {
                    let from = from.as_deref().map(status_label).unwrap_or_else(|| "no status".to_string());
                    format!("Moved {} from '{}' to '{}'", id, from, status_label(to))
                }
            }
            BoardEvent::Converted { prospect_id, deal_id } => {
                format!("Converted prospect {} into deal {}", prospect_id, deal_id)
            }
            BoardEvent::Deleted { id } => format!("Removed {} from the pipeline", id),
            BoardEvent::Selected { id } => format!("Selected {}", id),
            BoardEvent::Missing { id } => format!("Record {} no longer exists", id),
        };
        output.push_str(&line);
        output.push('\n');
    }
    output
}
