//! Command line commands

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::ConsoleError;
use crate::models::campaign::CampaignAction;
use crate::models::entity::EntityKind;
use crate::sync::query::{parse_page, FilterChange, ListQuery, SortOrder};

/// What a single invocation does
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List { kind: EntityKind, query: ListQuery },
    Watch { kind: EntityKind, query: ListQuery },
    CampaignAction { campaign_id: String, action: CampaignAction },
    SetCallLead { call_id: String, is_lead: bool },
    DeleteLead { lead_id: String },
    ExportLeads { path: Option<PathBuf>, query: ListQuery },
    AssignVoiceAccount { owner_user_id: String, account: String },
    Impersonate { user_id: String },
    StopImpersonating,
    WhoAmI,
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, ConsoleError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ConsoleError::ValidationError(format!("--{} expects YYYY-MM-DD, got {:?}", key, raw))
    })
}

fn parse_kind(raw: &str) -> Result<EntityKind, ConsoleError> {
    raw.parse().map_err(ConsoleError::ValidationError)
}

fn flag_value<'a>(args: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    args.get(key)
        .map(|v| v.as_str())
        .filter(|v| *v != "true" && !v.trim().is_empty())
}

fn required<'a>(args: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConsoleError> {
    flag_value(args, key)
        .ok_or_else(|| ConsoleError::ValidationError(format!("--{} needs a value", key)))
}

/// Build a list query from `--query` and the individual filter flags.
/// Individual flags win over the query string.
pub fn query_from_args(
    args: &HashMap<String, String>,
    page_size: u32,
) -> Result<ListQuery, ConsoleError> {
    let mut query = match args.get("query") {
        Some(qs) => ListQuery::from_query_string(qs, page_size),
        None => ListQuery::new(page_size),
    };
    let page = query.page;

    if let Some(status) = args.get("status") {
        query.apply_filter(FilterChange::Status(Some(status.clone())));
    }
    if let Some(search) = args.get("search") {
        query.apply_filter(FilterChange::Search(Some(search.clone())));
    }
    if let Some(bot) = args.get("bot") {
        query.apply_filter(FilterChange::Bot(Some(bot.clone())));
    }
    if let Some(from) = args.get("from") {
        query.apply_filter(FilterChange::DateFrom(Some(parse_date("from", from)?)));
    }
    if let Some(to) = args.get("to") {
        query.apply_filter(FilterChange::DateTo(Some(parse_date("to", to)?)));
    }
    if let Some(sort) = args.get("sort") {
        let sort: SortOrder = sort.parse().map_err(ConsoleError::ValidationError)?;
        query.set_sort(sort);
    }

    // Flags describe one view, so the page from --query survives them
    query.set_page(page);
    if let Some(raw) = args.get("page") {
        query.set_page(parse_page(raw));
    }

    Ok(query)
}

impl Command {
    /// Pick the command from parsed `--key=value` arguments. `None` when
    /// no command flag is present.
    pub fn from_args(
        args: &HashMap<String, String>,
        page_size: u32,
    ) -> Result<Option<Command>, ConsoleError> {
        if let Some(kind) = args.get("list") {
            return Ok(Some(Command::List {
                kind: parse_kind(kind)?,
                query: query_from_args(args, page_size)?,
            }));
        }

        if let Some(kind) = args.get("watch") {
            let kind = parse_kind(kind)?;
            if !matches!(kind, EntityKind::Campaign | EntityKind::Lead | EntityKind::Call) {
                return Err(ConsoleError::ValidationError(format!(
                    "--watch supports campaigns, leads and calls, not {}s",
                    kind
                )));
            }
            return Ok(Some(Command::Watch {
                kind,
                query: query_from_args(args, page_size)?,
            }));
        }

        for action in [CampaignAction::Pause, CampaignAction::Resume, CampaignAction::Cancel] {
            if args.contains_key(action.as_str()) {
                return Ok(Some(Command::CampaignAction {
                    campaign_id: required(args, action.as_str())?.to_string(),
                    action,
                }));
            }
        }

        if args.contains_key("toggle-lead") {
            let is_lead = match args.get("lead").map(|v| v.to_lowercase()) {
                None => true,
                Some(v) if v == "true" || v == "yes" || v == "1" => true,
                Some(v) if v == "false" || v == "no" || v == "0" => false,
                Some(v) => {
                    return Err(ConsoleError::ValidationError(format!(
                        "--lead expects true or false, got {:?}",
                        v
                    )))
                }
            };
            return Ok(Some(Command::SetCallLead {
                call_id: required(args, "toggle-lead")?.to_string(),
                is_lead,
            }));
        }

        if args.contains_key("delete-lead") {
            return Ok(Some(Command::DeleteLead {
                lead_id: required(args, "delete-lead")?.to_string(),
            }));
        }

        if args.contains_key("export-leads") {
            return Ok(Some(Command::ExportLeads {
                path: flag_value(args, "export-leads").map(PathBuf::from),
                query: query_from_args(args, page_size)?,
            }));
        }

        if args.contains_key("assign-voice-account") {
            return Ok(Some(Command::AssignVoiceAccount {
                account: required(args, "assign-voice-account")?.to_string(),
                owner_user_id: required(args, "owner")?.to_string(),
            }));
        }

        if args.contains_key("impersonate") {
            return Ok(Some(Command::Impersonate {
                user_id: required(args, "impersonate")?.to_string(),
            }));
        }

        if args.contains_key("stop-impersonating") {
            return Ok(Some(Command::StopImpersonating));
        }

        if args.contains_key("whoami") {
            return Ok(Some(Command::WhoAmI));
        }

        Ok(None)
    }
}

/// Parse `--key=value` and `--flag` arguments
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> HashMap<String, String> {
    let mut cli_args = HashMap::new();
    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }
    cli_args
}
