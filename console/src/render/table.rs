//! Column-aligned tables for each entity

use colored::{Color, Colorize};

use crate::models::bot::Bot;
use crate::models::call::{format_duration, Call, CallStatus};
use crate::models::campaign::{Campaign, CampaignStatus};
use crate::models::consumer::Consumer;
use crate::models::lead::Lead;
use crate::utils::truncate;

const SUMMARY_WIDTH: usize = 40;
const EMPTY: &str = "-";

/// One table cell; color is applied after padding so widths stay right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub color: Option<Color>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }

    fn opt(value: &Option<String>) -> Self {
        Self::plain(value.as_deref().unwrap_or(EMPTY))
    }
}

/// A record that can be shown as a table row
pub trait TableRow {
    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_rows<T: TableRow>(items: &[T]) -> Self {
        Self {
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows: items.iter().map(TableRow::cells).collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.text.chars().count());
                }
            }
        }

        let header = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", h, width = *w).bold().to_string())
            .collect::<Vec<_>>()
            .join("  ");

        let mut lines = vec![header.trim_end().to_string()];
        for row in &self.rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    let padded = format!("{:<width$}", cell.text, width = *w);
                    match cell.color {
                        Some(color) => padded.color(color).to_string(),
                        None => padded,
                    }
                })
                .collect::<Vec<_>>()
                .join("  ");
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }
}

pub fn campaign_status_color(status: CampaignStatus) -> Color {
    match status {
        CampaignStatus::Scheduled => Color::Blue,
        CampaignStatus::InProgress => Color::Green,
        CampaignStatus::Paused => Color::Yellow,
        CampaignStatus::Completed => Color::Cyan,
        CampaignStatus::Cancelled | CampaignStatus::Unknown => Color::BrightBlack,
        CampaignStatus::Failed => Color::Red,
    }
}

fn call_status_color(status: CallStatus) -> Color {
    match status {
        CallStatus::Pending => Color::Blue,
        CallStatus::InProgress => Color::Green,
        CallStatus::Completed => Color::Cyan,
        CallStatus::Failed => Color::Red,
        CallStatus::Unknown => Color::BrightBlack,
    }
}

impl TableRow for Campaign {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "PROGRESS", "CALLS", "LEADS", "SCHEDULED"]
    }

    fn cells(&self) -> Vec<Cell> {
        let progress = self
            .progress_percent
            .map(|p| format!("{:.0}%", p.clamp(0.0, 100.0)))
            .unwrap_or_else(|| EMPTY.to_string());
        let calls = match (self.calls_completed, self.contacts_count) {
            (Some(done), Some(all)) => format!("{}/{}", done, all),
            (Some(done), None) => done.to_string(),
            _ => EMPTY.to_string(),
        };
        let scheduled = match (&self.scheduled_at, &self.tz) {
            (Some(at), Some(tz)) => format!("{} {}", at, tz),
            (Some(at), None) => at.clone(),
            _ => EMPTY.to_string(),
        };

        vec![
            Cell::plain(&self.id),
            Cell::opt(&self.name),
            Cell::colored(self.status.as_str(), campaign_status_color(self.status)),
            Cell::plain(progress),
            Cell::plain(calls),
            Cell::plain(self.leads_count.map(|n| n.to_string()).unwrap_or_else(|| EMPTY.to_string())),
            Cell::plain(scheduled),
        ]
    }
}

impl TableRow for Lead {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "PHONE", "EMAIL", "SUMMARY", "CREATED"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::plain(&self.id),
            Cell::opt(&self.name),
            Cell::opt(&self.phone),
            Cell::opt(&self.email),
            Cell::plain(truncate(self.summary.as_deref().unwrap_or(EMPTY), SUMMARY_WIDTH)),
            Cell::opt(&self.created_at),
        ]
    }
}

impl TableRow for Call {
    fn headers() -> &'static [&'static str] {
        &["ID", "STATUS", "DURATION", "LEAD", "BOT"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::plain(&self.id),
            Cell::colored(self.call_status.to_string(), call_status_color(self.call_status)),
            Cell::plain(self.duration.map(format_duration).unwrap_or_else(|| EMPTY.to_string())),
            if self.is_lead {
                Cell::colored("yes", Color::Green)
            } else {
                Cell::plain("no")
            },
            Cell::opt(&self.bot_ref),
        ]
    }
}

impl TableRow for Bot {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "COMPANY", "VOICE", "LANGUAGE", "OWNER", "ACCOUNT"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::plain(&self.id),
            Cell::opt(&self.name),
            Cell::opt(&self.company_name),
            Cell::opt(&self.voice),
            Cell::opt(&self.language),
            Cell::opt(&self.owner_user_id),
            Cell::opt(&self.account_in_use),
        ]
    }
}

impl TableRow for Consumer {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "EMAIL", "ROLE", "CREATED"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::plain(&self.id),
            Cell::opt(&self.name),
            Cell::opt(&self.email),
            Cell::opt(&self.role),
            Cell::opt(&self.created_at),
        ]
    }
}
