use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::assist::{AssistMode, AssistOutput, AssistSession, AssistState, AssistTask, GeminiClient};
use crate::board::{DragController, DropTarget, Intent};
use crate::cli::error::{user_error, validate_amount, validate_date, validate_non_empty};
use crate::cli::output::{
    format_assist_state, format_currency, format_deal_board, format_deal_detail, format_events, format_prospect_board,
    format_prospect_detail, format_stage_list, get_terminal_width, is_tty, RenderOptions,
};
use crate::models::{Deal, DealStatus, FollowUp, Prospect, Qualification, Urgency};
use crate::pipeline::{current_key_of, deal_metrics, group_by_key, order_stages, prospect_metrics};
use crate::store::{Board, Config, RecordRef};
use crate::subscription::{CheckoutOutcome, CheckoutStub, Plan};
use crate::utils::{fuzzy, today};

#[derive(Parser)]
#[command(name = "leadboard")]
#[command(about = "Leadboard - Sales pipeline boards with AI-assisted prospecting from the command line")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the board file with the default stages
    Init,
    /// List pipeline stages in column order
    Stages {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Prospect management commands
    Prospect {
        #[command(subcommand)]
        subcommand: ProspectCommands,
    },
    /// Deal management commands
    Deal {
        #[command(subcommand)]
        subcommand: DealCommands,
    },
    /// Show the prospect board (one column per stage)
    Board {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the deal board (one column per status)
    Deals {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Drag a card onto a column, or onto the convert/delete zones
    Drag {
        /// Prospect or deal id (any unique prefix)
        id: String,
        /// Stage id or name, deal status, "convert" or "delete"
        target: String,
    },
    /// Show a prospect or deal
    Show {
        /// Prospect or deal id (any unique prefix)
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Ask the AI assistant (research, icebreaker, strategy, prioritize)
    Assist {
        /// research | icebreaker | strategy | prioritize
        mode: String,
        /// Prospect id (research, icebreaker) or deal id (strategy)
        id: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Start a subscription checkout (monthly or annual)
    Subscribe {
        /// monthly | annual
        plan: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ProspectCommands {
    /// Add a new prospect
    Add {
        /// Contact name
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Stage id or name (defaults to the first stage)
        #[arg(long)]
        stage: Option<String>,
        /// Market segment
        #[arg(long)]
        segment: Option<String>,
        /// Company size
        #[arg(long)]
        size: Option<String>,
        /// low | medium | high
        #[arg(long)]
        urgency: Option<String>,
        /// Estimated budget
        #[arg(long)]
        budget: Option<String>,
        /// Next contact date (YYYY-MM-DD, today, tomorrow, +3d, +2w)
        #[arg(long = "next-contact")]
        next_contact: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DealCommands {
    /// Add a new deal
    Add {
        /// Deal title
        title: String,
        #[arg(long)]
        client: String,
        /// Deal value
        #[arg(long)]
        value: String,
        /// sent | following_up | order_placed | lost
        #[arg(long)]
        status: Option<String>,
        /// Date the budget was sent (defaults to today)
        #[arg(long)]
        sent: Option<String>,
        /// Next follow-up date
        #[arg(long = "follow-up")]
        follow_up: Option<String>,
    },
    /// Record a follow-up note on a deal, dated today
    Note {
        /// Deal id (any unique prefix)
        id: String,
        /// Note text
        #[arg(trailing_var_arg = true, required = true)]
        note: Vec<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse_from(std::env::args()) {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            // --help and --version print to stdout and succeed
            if e.use_stderr() {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => handle_init(),
        Commands::Stages { json } => handle_stages(json),
        Commands::Prospect { subcommand } => match subcommand {
            ProspectCommands::Add {
                name,
                company,
                email,
                phone,
                stage,
                segment,
                size,
                urgency,
                budget,
                next_contact,
            } => handle_prospect_add(ProspectInput {
                name,
                company,
                email,
                phone,
                stage,
                segment,
                size,
                urgency,
                budget,
                next_contact,
            }),
        },
        Commands::Deal { subcommand } => match subcommand {
            DealCommands::Add {
                title,
                client,
                value,
                status,
                sent,
                follow_up,
            } => handle_deal_add(title, client, value, status, sent, follow_up),
            DealCommands::Note { id, note } => handle_deal_note(id, note),
        },
        Commands::Board { json } => handle_board(json),
        Commands::Deals { json } => handle_deals(json),
        Commands::Drag { id, target } => handle_drag(id, target),
        Commands::Show { id, json } => handle_show(id, json),
        Commands::Assist { mode, id, json } => handle_assist(mode, id, json),
        Commands::Subscribe { plan, json } => handle_subscribe(plan, json),
    }
}

fn load_context() -> Result<(Config, Board)> {
    let config = Config::load().context("Failed to load configuration")?;
    let board = Board::load(&config.data_location)?;
    Ok((config, board))
}

fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        today: today(),
        currency_symbol: config.currency_symbol.clone(),
        is_tty: is_tty(),
        width: get_terminal_width(),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

/// Exit with "unknown X" plus a did-you-mean hint when one is close enough
fn unknown_with_suggestion(what: &str, value: &str, candidates: &[String]) -> ! {
    match fuzzy::suggest(value, candidates) {
        Some(hint) => user_error(&format!("Unknown {} '{}'. Did you mean '{}'?", what, value, hint)),
        None => user_error(&format!(
            "Unknown {} '{}'. Valid values: {}",
            what,
            value,
            candidates.join(", ")
        )),
    }
}

/// Accepts "following up", "Following-Up" and "following_up"
fn parse_status(value: &str) -> Option<DealStatus> {
    let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
    DealStatus::from_str(&normalized)
}

fn status_candidates() -> Vec<String> {
    DealStatus::ALL.iter().map(|s| s.as_str().to_string()).collect()
}

fn handle_init() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let path = &config.data_location;
    if path.exists() {
        println!("Board already exists at {}", path.display());
        return Ok(());
    }
    Board::with_default_stages().save(path)?;
    println!("Created board at {}", path.display());
    Ok(())
}

fn handle_stages(json: bool) -> Result<()> {
    let (_, board) = load_context()?;
    if json {
        let stages = order_stages(&board.stages);
        return print_json(&json!(stages));
    }
    print!("{}", format_stage_list(&board));
    Ok(())
}

struct ProspectInput {
    name: String,
    company: String,
    email: Option<String>,
    phone: Option<String>,
    stage: Option<String>,
    segment: Option<String>,
    size: Option<String>,
    urgency: Option<String>,
    budget: Option<String>,
    next_contact: Option<String>,
}

fn handle_prospect_add(input: ProspectInput) -> Result<()> {
    if let Err(e) = validate_non_empty(&input.name, "Prospect name") {
        user_error(&e);
    }
    if let Err(e) = validate_non_empty(&input.company, "Company") {
        user_error(&e);
    }

    let (config, mut board) = load_context()?;
    let today = today();

    let stage_id = match &input.stage {
        Some(stage) => match board.find_stage(stage) {
            Some(s) => s.id.clone(),
            None => {
                let candidates: Vec<String> = board.stages.iter().map(|s| s.id.clone()).collect();
                unknown_with_suggestion("stage", stage, &candidates);
            }
        },
        None => match board.first_stage() {
            Some(s) => s.id.clone(),
            None => user_error("No stages defined. Run 'leadboard init' to create the default stages."),
        },
    };

    let urgency = input.urgency.as_deref().map(|u| {
        Urgency::from_str(u)
            .unwrap_or_else(|| user_error(&format!("Invalid urgency '{}'. Use low, medium or high.", u)))
    });
    let estimated_budget = input
        .budget
        .as_deref()
        .map(|b| validate_amount(b, "budget").unwrap_or_else(|e| user_error(&e)));
    let next_contact = input
        .next_contact
        .as_deref()
        .map(|d| validate_date(d, "next contact date", today).unwrap_or_else(|e| user_error(&e)));

    let qualification = Qualification {
        segment: input.segment,
        size: input.size,
        urgency,
        estimated_budget,
        next_contact,
    };

    let mut prospect = Prospect::new(input.name.trim().to_string(), input.company.trim().to_string(), stage_id);
    prospect.email = input.email;
    prospect.phone = input.phone;
    if !qualification.is_empty() {
        prospect.qualification = Some(qualification);
    }

    let id = prospect.id.clone();
    let name = prospect.name.clone();
    let stage_id = prospect.stage_id.clone();
    board.prospects.push(prospect);
    board.save(&config.data_location)?;
    log::info!("added prospect {} in stage {}", id, stage_id);

    println!("Added prospect {} ({}) to '{}'", id, name, board.stage_name(&stage_id));
    Ok(())
}

fn handle_deal_add(
    title: String,
    client: String,
    value: String,
    status: Option<String>,
    sent: Option<String>,
    follow_up: Option<String>,
) -> Result<()> {
    if let Err(e) = validate_non_empty(&title, "Deal title") {
        user_error(&e);
    }
    if let Err(e) = validate_non_empty(&client, "Client") {
        user_error(&e);
    }
    let value = validate_amount(&value, "deal value").unwrap_or_else(|e| user_error(&e));
    let today = today();
    let status = match status.as_deref() {
        Some(s) => parse_status(s).unwrap_or_else(|| unknown_with_suggestion("status", s, &status_candidates())),
        None => DealStatus::Sent,
    };
    let sent_date = match sent.as_deref() {
        Some(d) => validate_date(d, "sent date", today).unwrap_or_else(|e| user_error(&e)),
        None => today,
    };
    let next_follow_up = follow_up
        .as_deref()
        .map(|d| validate_date(d, "follow-up date", today).unwrap_or_else(|e| user_error(&e)));

    let (config, mut board) = load_context()?;
    let mut deal = Deal::new(title.trim().to_string(), client.trim().to_string(), value, sent_date);
    deal.status = Some(status.as_str().to_string());
    deal.next_follow_up = next_follow_up;

    let id = deal.id.clone();
    let title = deal.title.clone();
    board.deals.push(deal);
    board.save(&config.data_location)?;
    log::info!("added deal {} with status {}", id, status.as_str());

    println!("Added deal {} ({}) as '{}'", id, title, status.label());
    Ok(())
}

fn handle_deal_note(id: String, note: Vec<String>) -> Result<()> {
    let note = note.join(" ");
    if let Err(e) = validate_non_empty(&note, "Note") {
        user_error(&e);
    }
    let (config, mut board) = load_context()?;
    let index = match board.resolve(&id) {
        Ok(RecordRef::Deal(i)) => i,
        Ok(RecordRef::Prospect(_)) => user_error(&format!("{} is a prospect. Notes are recorded on deals.", id)),
        Err(e) => user_error(&e.to_string()),
    };

    let deal = &mut board.deals[index];
    deal.follow_ups.push(FollowUp {
        date: today(),
        note: note.trim().to_string(),
    });
    let deal_id = deal.id.clone();
    let count = deal.follow_ups.len();
    board.save(&config.data_location)?;

    println!("Recorded follow-up #{} on deal {}", count, deal_id);
    Ok(())
}

fn handle_board(json: bool) -> Result<()> {
    let (config, board) = load_context()?;
    let opts = render_options(&config);

    if json {
        let ordered = order_stages(&board.stages);
        let keys: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
        let buckets = group_by_key(&board.prospects, &keys);
        let columns: Vec<serde_json::Value> = ordered
            .iter()
            .zip(buckets.iter())
            .map(|(stage, bucket)| {
                json!({
                    "stage": stage,
                    "count": bucket.len(),
                    "estimated_total": bucket.total,
                    "prospects": bucket.items,
                })
            })
            .collect();
        let metrics = prospect_metrics(&board.prospects, &board.stages, opts.today);
        return print_json(&json!({
            "columns": columns,
            "due_for_contact": metrics.due_for_contact,
            "unassigned": metrics.unassigned,
        }));
    }

    print!("{}", format_prospect_board(&board, &opts));
    Ok(())
}

fn handle_deals(json: bool) -> Result<()> {
    let (config, board) = load_context()?;
    let opts = render_options(&config);

    if json {
        let keys: Vec<&str> = DealStatus::ALL.iter().map(|s| s.as_str()).collect();
        let buckets = group_by_key(&board.deals, &keys);
        let columns: Vec<serde_json::Value> = DealStatus::ALL
            .iter()
            .zip(buckets.iter())
            .map(|(status, bucket)| {
                json!({
                    "status": status,
                    "label": status.label(),
                    "count": bucket.len(),
                    "total": bucket.total,
                    "deals": bucket.items,
                })
            })
            .collect();
        let metrics = deal_metrics(&board.deals, opts.today);
        return print_json(&json!({
            "columns": columns,
            "open_total": metrics.open_total,
            "won_total": metrics.won_total,
            "stale_count": metrics.stale_count,
            "unfiled": metrics.unfiled,
        }));
    }

    print!("{}", format_deal_board(&board.deals, &opts));
    Ok(())
}

fn prospect_drop_target(board: &Board, target: &str) -> DropTarget {
    match target.trim().to_lowercase().as_str() {
        "convert" => return DropTarget::Convert,
        "delete" | "remove" => return DropTarget::Delete,
        _ => {}
    }
    match board.find_stage(target.trim()) {
        Some(stage) => DropTarget::bucket(&stage.id),
        None => {
            let mut candidates: Vec<String> = board.stages.iter().map(|s| s.id.clone()).collect();
            candidates.push("convert".to_string());
            candidates.push("delete".to_string());
            unknown_with_suggestion("stage", target, &candidates);
        }
    }
}

fn deal_drop_target(target: &str) -> DropTarget {
    match target.trim().to_lowercase().as_str() {
        "delete" | "remove" => return DropTarget::Delete,
        "convert" => user_error("Only prospects can be converted into deals."),
        _ => {}
    }
    match parse_status(target) {
        Some(status) => DropTarget::bucket(status.as_str()),
        None => {
            let mut candidates = status_candidates();
            candidates.push("delete".to_string());
            unknown_with_suggestion("status", target, &candidates);
        }
    }
}

fn handle_drag(id: String, target: String) -> Result<()> {
    let (config, mut board) = load_context()?;
    let record = board.resolve(&id).unwrap_or_else(|e| user_error(&e.to_string()));

    let (record_id, drop_target, mut controller) = match record {
        RecordRef::Prospect(i) => (
            board.prospects[i].id.clone(),
            prospect_drop_target(&board, &target),
            DragController::with_pseudo_targets(true, true),
        ),
        RecordRef::Deal(i) => (
            board.deals[i].id.clone(),
            deal_drop_target(&target),
            DragController::with_pseudo_targets(false, true),
        ),
    };

    controller.start_drag(&record_id);
    controller.drag_over(drop_target.clone());
    let intent = controller.drop(drop_target, |id| {
        let key = match record {
            RecordRef::Prospect(_) => current_key_of(&board.prospects, id),
            RecordRef::Deal(_) => current_key_of(&board.deals, id),
        };
        key.map(String::from)
    });

    let Some(intent) = intent else {
        println!("{} is already in that column. Nothing to do.", record_id);
        return Ok(());
    };

    board.set_today(today());
    intent.dispatch(&mut board);
    let events = board.take_events();
    board.save(&config.data_location)?;

    print!("{}", format_events(&board, &events));
    Ok(())
}

fn handle_show(id: String, json: bool) -> Result<()> {
    let (config, mut board) = load_context()?;
    let record = board.resolve(&id).unwrap_or_else(|e| user_error(&e.to_string()));
    let record_id = match record {
        RecordRef::Prospect(i) => board.prospects[i].id.clone(),
        RecordRef::Deal(i) => board.deals[i].id.clone(),
    };

    Intent::Select { id: record_id }.dispatch(&mut board);
    board.take_events();
    let opts = render_options(&config);

    match record {
        RecordRef::Prospect(i) => {
            let prospect = &board.prospects[i];
            if json {
                return print_json(&json!(prospect));
            }
            print!("{}", format_prospect_detail(&board, prospect, &opts));
        }
        RecordRef::Deal(i) => {
            let deal = &board.deals[i];
            if json {
                return print_json(&json!(deal));
            }
            print!("{}", format_deal_detail(deal, &opts));
        }
    }
    Ok(())
}

fn handle_assist(mode: String, id: Option<String>, json: bool) -> Result<()> {
    let mode = AssistMode::from_str(&mode).unwrap_or_else(|| {
        let candidates: Vec<String> = AssistMode::ALL.iter().map(|m| m.as_str().to_string()).collect();
        unknown_with_suggestion("assist mode", &mode, &candidates)
    });

    let (config, board) = load_context()?;

    let require_id = |kind: &str| -> String {
        id.clone()
            .unwrap_or_else(|| user_error(&format!("The {} assist needs a {} id.", mode, kind)))
    };

    let task = match mode {
        AssistMode::Research | AssistMode::Icebreaker => {
            let id = require_id("prospect");
            let prospect = match board.resolve(&id) {
                Ok(RecordRef::Prospect(i)) => &board.prospects[i],
                Ok(RecordRef::Deal(_)) => user_error(&format!("{} is a deal. The {} assist works on prospects.", id, mode)),
                Err(e) => user_error(&e.to_string()),
            };
            if mode == AssistMode::Research {
                AssistTask::Research(prospect)
            } else {
                AssistTask::Icebreaker(prospect)
            }
        }
        AssistMode::Strategy => {
            let id = require_id("deal");
            match board.resolve(&id) {
                Ok(RecordRef::Deal(i)) => AssistTask::Strategy(&board.deals[i]),
                Ok(RecordRef::Prospect(_)) => {
                    user_error(&format!("{} is a prospect. The strategy assist works on deals.", id))
                }
                Err(e) => user_error(&e.to_string()),
            }
        }
        AssistMode::Prioritize => {
            if let Some(id) = &id {
                log::warn!("prioritize ranks the whole board; ignoring id '{}'", id);
            }
            AssistTask::Prioritize {
                prospects: &board.prospects,
                stages: &board.stages,
            }
        }
    };

    let mut session = AssistSession::new();
    let state = session.run_with(GeminiClient::new(config.ai.clone()), &task);

    if json {
        let value = match state {
            AssistState::Ready(output) => json!({ "mode": mode.as_str(), "status": "ready", "output": output }),
            AssistState::Failed(message) => json!({ "mode": mode.as_str(), "status": "failed", "message": message }),
            AssistState::Idle | AssistState::Loading => json!({ "mode": mode.as_str(), "status": "idle" }),
        };
        return print_json(&value);
    }

    if let AssistState::Ready(AssistOutput::Ranking(_)) = state {
        println!("Prioritized prospects:");
    }
    print!("{}", format_assist_state(state));
    Ok(())
}

fn handle_subscribe(plan: String, json: bool) -> Result<()> {
    let plan = Plan::from_str(&plan).unwrap_or_else(|| {
        let candidates = vec!["monthly".to_string(), "annual".to_string()];
        unknown_with_suggestion("plan", &plan, &candidates)
    });
    let config = Config::load().context("Failed to load configuration")?;
    let stub = CheckoutStub::new(Duration::from_millis(config.checkout_delay_ms));

    if !json {
        println!(
            "Starting checkout for the {} plan ({})...",
            plan.as_str(),
            format_currency(plan.price(), &config.currency_symbol)
        );
    }
    let outcome = stub.start(plan);

    if json {
        return print_json(&json!(outcome));
    }
    match outcome {
        CheckoutOutcome::NotYetActive { message, .. } => println!("{}", message),
    }
    Ok(())
}
