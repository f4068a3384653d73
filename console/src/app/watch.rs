//! Interactive watch session
//!
//! Mounts one list view, keeps its rooms in step with the displayed page,
//! merges pushed events and reads commands from stdin until `quit` or the
//! shutdown signal.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::actions::dispatcher::ActionDispatcher;
use crate::errors::ConsoleError;
use crate::models::call::Call;
use crate::models::campaign::{Campaign, CampaignAction};
use crate::models::entity::{Entity, EntityKind};
use crate::models::lead::Lead;
use crate::notify::Notifier;
use crate::realtime::hub::{RealtimeHub, RoomSet};
use crate::render::menu::render_action_menu;
use crate::render::render_list;
use crate::render::render_notice;
use crate::render::table::TableRow;
use crate::sync::controller::{ListController, RefreshOutcome};
use crate::sync::debounce::debounce;
use crate::sync::query::{FilterChange, SortOrder};

/// A command typed in a watch session
#[derive(Debug, Clone, PartialEq)]
pub enum WatchCommand {
    Search(String),
    Filter(FilterChange),
    Page(u32),
    Next,
    Prev,
    Sort(SortOrder),
    Refresh,
    Campaign(CampaignAction, String),
    Menu(String),
    Toggle(String),
    Delete(String),
    Url,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  search <text>          filter by text (applied after a short pause)
  status <s>|-           filter by status, - clears
  bot <id>|-             filter by bot
  from <date>|-          created on or after YYYY-MM-DD
  to <date>|-            created on or before YYYY-MM-DD
  clear                  clear every filter
  page <n> | next | prev
  sort asc|desc
  refresh
  pause|resume|cancel <campaign id>
  menu <campaign id>     show the actions offered for a campaign
  toggle <call id>       flip the lead flag of a call
  delete <lead id>
  url                    print the query string of this view
  quit";

fn optional(arg: &str) -> Option<String> {
    match arg.trim() {
        "" | "-" => None,
        other => Some(other.to_string()),
    }
}

fn optional_date(arg: &str) -> Result<Option<NaiveDate>, String> {
    optional(arg)
        .map(|d| {
            NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .map_err(|_| format!("Expected YYYY-MM-DD, got {:?}", d))
        })
        .transpose()
}

fn required_id(command: &str, arg: &str) -> Result<String, String> {
    optional(arg).ok_or_else(|| format!("Usage: {} <id>", command))
}

impl FromStr for WatchCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = arg.trim();

        match command.to_lowercase().as_str() {
            "search" | "s" => Ok(WatchCommand::Search(arg.to_string())),
            "status" => Ok(WatchCommand::Filter(FilterChange::Status(optional(arg)))),
            "bot" => Ok(WatchCommand::Filter(FilterChange::Bot(optional(arg)))),
            "from" => Ok(WatchCommand::Filter(FilterChange::DateFrom(optional_date(arg)?))),
            "to" => Ok(WatchCommand::Filter(FilterChange::DateTo(optional_date(arg)?))),
            "clear" => Ok(WatchCommand::Filter(FilterChange::Clear)),
            "page" | "p" => arg
                .parse::<u32>()
                .map(WatchCommand::Page)
                .map_err(|_| format!("Invalid page: {:?}", arg)),
            "next" | "n" => Ok(WatchCommand::Next),
            "prev" => Ok(WatchCommand::Prev),
            "sort" => arg.parse().map(WatchCommand::Sort),
            "refresh" | "r" => Ok(WatchCommand::Refresh),
            "pause" | "resume" | "cancel" => {
                let action: CampaignAction = command.parse()?;
                Ok(WatchCommand::Campaign(action, required_id(command, arg)?))
            }
            "menu" => Ok(WatchCommand::Menu(required_id(command, arg)?)),
            "toggle" => Ok(WatchCommand::Toggle(required_id(command, arg)?)),
            "delete" => Ok(WatchCommand::Delete(required_id(command, arg)?)),
            "url" => Ok(WatchCommand::Url),
            "help" | "?" => Ok(WatchCommand::Help),
            "quit" | "q" | "exit" => Ok(WatchCommand::Quit),
            "" => Err("Empty command".to_string()),
            other => Err(format!("Unknown command: {} (try help)", other)),
        }
    }
}

/// Kind-erased operations of a list controller
#[async_trait]
pub trait ListView: Send + Sync {
    fn kind(&self) -> EntityKind;

    async fn render(&self) -> String;

    async fn displayed_ids(&self) -> Vec<String>;

    async fn query_string(&self) -> String;

    async fn refresh(&self) -> Result<RefreshOutcome, ConsoleError>;

    async fn apply_filter(&self, change: FilterChange) -> Result<RefreshOutcome, ConsoleError>;

    async fn set_sort(&self, sort: SortOrder) -> Result<RefreshOutcome, ConsoleError>;

    async fn set_page(&self, page: u32) -> Result<RefreshOutcome, ConsoleError>;

    async fn next_page(&self) -> Result<RefreshOutcome, ConsoleError>;

    async fn prev_page(&self) -> Result<RefreshOutcome, ConsoleError>;

    async fn apply_event(&self, id: &str, patch: &Map<String, Value>) -> bool;
}

#[async_trait]
impl<T: Entity + TableRow> ListView for ListController<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    async fn render(&self) -> String {
        render_list(&self.snapshot().await)
    }

    async fn displayed_ids(&self) -> Vec<String> {
        ListController::displayed_ids(self).await
    }

    async fn query_string(&self) -> String {
        ListController::query_string(self).await
    }

    async fn refresh(&self) -> Result<RefreshOutcome, ConsoleError> {
        ListController::refresh(self).await
    }

    async fn apply_filter(&self, change: FilterChange) -> Result<RefreshOutcome, ConsoleError> {
        ListController::apply_filter(self, change).await
    }

    async fn set_sort(&self, sort: SortOrder) -> Result<RefreshOutcome, ConsoleError> {
        ListController::set_sort(self, sort).await
    }

    async fn set_page(&self, page: u32) -> Result<RefreshOutcome, ConsoleError> {
        ListController::set_page(self, page).await
    }

    async fn next_page(&self) -> Result<RefreshOutcome, ConsoleError> {
        ListController::next_page(self).await
    }

    async fn prev_page(&self) -> Result<RefreshOutcome, ConsoleError> {
        ListController::prev_page(self).await
    }

    async fn apply_event(&self, id: &str, patch: &Map<String, Value>) -> bool {
        ListController::apply_event(self, id, patch).await
    }
}

/// The watched list, typed where actions need it
#[derive(Clone)]
pub enum WatchTarget {
    Campaigns(Arc<ListController<Campaign>>),
    Leads(Arc<ListController<Lead>>),
    Calls(Arc<ListController<Call>>),
}

impl WatchTarget {
    pub fn view(&self) -> &dyn ListView {
        match self {
            WatchTarget::Campaigns(c) => c.as_ref(),
            WatchTarget::Leads(c) => c.as_ref(),
            WatchTarget::Calls(c) => c.as_ref(),
        }
    }
}

/// Where a watch session prints
pub trait Output: Send {
    fn print(&mut self, text: &str);
}

/// Prints to stdout
pub struct Stdout;

impl Output for Stdout {
    fn print(&mut self, text: &str) {
        println!("{}", text);
    }
}

pub struct WatchSession<O: Output> {
    target: WatchTarget,
    dispatcher: Arc<ActionDispatcher>,
    notifier: Notifier,
    rooms: RoomSet,
    hub: RealtimeHub,
    search_debounce: Duration,
    output: O,
}

enum Flow {
    Continue,
    Redraw,
    Quit,
}

impl<O: Output> WatchSession<O> {
    pub fn new(
        target: WatchTarget,
        dispatcher: Arc<ActionDispatcher>,
        notifier: Notifier,
        hub: RealtimeHub,
        search_debounce: Duration,
        output: O,
    ) -> Self {
        let rooms = RoomSet::new(hub.clone(), target.view().kind());
        Self {
            target,
            dispatcher,
            notifier,
            rooms,
            hub,
            search_debounce,
            output,
        }
    }

    /// Hold rooms for exactly the displayed ids
    pub async fn sync_rooms(&mut self) {
        let ids = self.target.view().displayed_ids().await;
        self.rooms.retain_only(&ids);
        debug!("Holding {} {} rooms", self.rooms.len(), self.target.view().kind());
    }

    async fn redraw(&mut self) {
        self.sync_rooms().await;
        let text = self.target.view().render().await;
        self.output.print(&text);
    }

    /// Run until `quit`, end of input or the shutdown signal
    pub async fn run<R>(
        mut self,
        input: R,
        mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
    ) -> Result<(), ConsoleError>
    where
        R: tokio::io::AsyncRead + Unpin + Send,
    {
        info!("Watching {}s", self.target.view().kind());
        let mut lines = BufReader::new(input).lines();
        let mut events = self.hub.subscribe();
        let mut notices = self.notifier.subscribe();
        let (search, mut searches) = debounce::<String>(self.search_debounce);

        let _ = self.target.view().refresh().await;
        self.redraw().await;

        loop {
            let flow = tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Watch session shutting down...");
                    Flow::Quit
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            Flow::Continue
                        } else {
                            match line.parse::<WatchCommand>() {
                                Ok(WatchCommand::Search(text)) => {
                                    search.push(text);
                                    Flow::Continue
                                }
                                Ok(command) => self.execute(command).await,
                                Err(e) => {
                                    self.notifier.error(e);
                                    Flow::Continue
                                }
                            }
                        }
                    }
                    Ok(None) => Flow::Quit,
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        Flow::Quit
                    }
                },
                Some(text) = searches.recv() => {
                    let _ = self.target.view().apply_filter(FilterChange::Search(Some(text))).await;
                    Flow::Redraw
                }
                event = events.recv() => match event {
                    Ok(event) if event.room.kind == self.target.view().kind() => {
                        if self.target.view().apply_event(&event.id, &event.payload).await {
                            Flow::Redraw
                        } else {
                            Flow::Continue
                        }
                    }
                    Ok(_) => Flow::Continue,
                    Err(RecvError::Lagged(missed)) => {
                        // Missed patches are recovered by a full fetch
                        warn!("Missed {} realtime events, refreshing", missed);
                        let _ = self.target.view().refresh().await;
                        Flow::Redraw
                    }
                    Err(RecvError::Closed) => Flow::Continue,
                },
                notice = notices.recv() => {
                    if let Ok(notice) = notice {
                        self.output.print(&render_notice(&notice));
                    }
                    Flow::Continue
                }
            };

            match flow {
                Flow::Continue => {}
                Flow::Redraw => self.redraw().await,
                Flow::Quit => break,
            }
        }

        self.rooms.clear();
        Ok(())
    }

    /// Run one command
    async fn execute(&mut self, command: WatchCommand) -> Flow {
        let view = self.target.view();
        match command {
            WatchCommand::Search(text) => {
                let _ = view.apply_filter(FilterChange::Search(Some(text))).await;
            }
            WatchCommand::Filter(change) => {
                let _ = view.apply_filter(change).await;
            }
            WatchCommand::Page(page) => {
                let _ = view.set_page(page).await;
            }
            WatchCommand::Next => {
                let _ = view.next_page().await;
            }
            WatchCommand::Prev => {
                let _ = view.prev_page().await;
            }
            WatchCommand::Sort(sort) => {
                let _ = view.set_sort(sort).await;
            }
            WatchCommand::Refresh => {
                let _ = view.refresh().await;
            }
            WatchCommand::Campaign(action, id) => match &self.target {
                WatchTarget::Campaigns(campaigns) => {
                    let _ = self
                        .dispatcher
                        .campaign_action(Some(campaigns.as_ref()), &id, action)
                        .await;
                }
                _ => self.notifier.error("Campaign actions need --watch=campaigns"),
            },
            WatchCommand::Menu(id) => match &self.target {
                WatchTarget::Campaigns(campaigns) => match campaigns.get(&id).await {
                    Some(campaign) => {
                        let menu = render_action_menu(&campaign, self.dispatcher.permissions());
                        self.output.print(&menu);
                    }
                    None => self.notifier.error(format!("Campaign {} is not displayed", id)),
                },
                _ => self.notifier.error("menu needs --watch=campaigns"),
            },
            WatchCommand::Toggle(id) => match &self.target {
                WatchTarget::Calls(calls) => {
                    let _ = self.dispatcher.toggle_lead(calls.as_ref(), &id).await;
                }
                _ => self.notifier.error("toggle needs --watch=calls"),
            },
            WatchCommand::Delete(id) => match &self.target {
                WatchTarget::Leads(leads) => {
                    let _ = self.dispatcher.delete_lead(Some(leads.as_ref()), &id).await;
                }
                _ => self.notifier.error("delete needs --watch=leads"),
            },
            WatchCommand::Url => {
                let qs = view.query_string().await;
                self.output.print(&format!("?{}", qs));
                return Flow::Continue;
            }
            WatchCommand::Help => {
                self.output.print(HELP);
                return Flow::Continue;
            }
            WatchCommand::Quit => return Flow::Quit,
        }
        Flow::Redraw
    }
}
