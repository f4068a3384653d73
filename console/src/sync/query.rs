//! Paged and filtered list query
//!
//! The query is the only shareable view state. It serializes to a URL query
//! string (`page`, `status`, `search`, `bot`, `from`, `to`, `sort`) and is
//! rebuilt from one, so a link reproduces the same view.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use url::form_urlencoded;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pages above this are treated as malformed
pub const MAX_PAGE: u32 = 1_000_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sort order on creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "oldest" => Ok(SortOrder::Asc),
            "desc" | "newest" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Active list filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub status: Option<String>,
    pub search: Option<String>,
    pub bot_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// A single filter edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Status(Option<String>),
    Search(Option<String>),
    Bot(Option<String>),
    DateFrom(Option<NaiveDate>),
    DateTo(Option<NaiveDate>),
    Clear,
}

/// Paged list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub filters: Filters,
    pub sort: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a page parameter. Anything that is not a positive integer is page 1.
pub fn parse_page(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(page) if (1..=MAX_PAGE).contains(&page) => page,
        _ => 1,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            filters: Filters::default(),
            sort: SortOrder::default(),
        }
    }

    /// Apply a filter edit. Any filter edit returns to page 1.
    pub fn apply_filter(&mut self, change: FilterChange) {
        match change {
            FilterChange::Status(v) => self.filters.status = non_blank(v),
            FilterChange::Search(v) => self.filters.search = non_blank(v),
            FilterChange::Bot(v) => self.filters.bot_id = non_blank(v),
            FilterChange::DateFrom(v) => self.filters.date_from = v,
            FilterChange::DateTo(v) => self.filters.date_to = v,
            FilterChange::Clear => self.filters = Filters::default(),
        }
        self.page = 1;
    }

    /// Change sort order, returning to page 1
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Serialize to a query string (without the leading `?`). Defaults are
    /// left out, so page 1 is never written.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if self.page > 1 {
            serializer.append_pair("page", &self.page.to_string());
        }
        if let Some(status) = &self.filters.status {
            serializer.append_pair("status", status);
        }
        if let Some(search) = &self.filters.search {
            serializer.append_pair("search", search);
        }
        if let Some(bot_id) = &self.filters.bot_id {
            serializer.append_pair("bot", bot_id);
        }
        if let Some(from) = &self.filters.date_from {
            serializer.append_pair("from", &from.format(DATE_FORMAT).to_string());
        }
        if let Some(to) = &self.filters.date_to {
            serializer.append_pair("to", &to.format(DATE_FORMAT).to_string());
        }
        if self.sort != SortOrder::default() {
            serializer.append_pair("sort", self.sort.as_str());
        }
        serializer.finish()
    }

    /// Rebuild a query from a query string. Unknown keys and malformed
    /// values are ignored; a malformed page is page 1.
    pub fn from_query_string(query: &str, page_size: u32) -> Self {
        let mut result = Self::new(page_size);
        let query = query.trim_start_matches('?');

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => result.page = parse_page(&value),
                "status" => result.filters.status = non_blank(Some(value.into_owned())),
                "search" => result.filters.search = non_blank(Some(value.into_owned())),
                "bot" => result.filters.bot_id = non_blank(Some(value.into_owned())),
                "from" => result.filters.date_from = parse_date(&value),
                "to" => result.filters.date_to = parse_date(&value),
                "sort" => result.sort = value.parse().unwrap_or_default(),
                _ => {}
            }
        }

        result
    }

    /// Parameters sent to a collection endpoint
    pub fn to_request_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
            ("sort".to_string(), self.sort.as_str().to_string()),
        ];
        if let Some(status) = &self.filters.status {
            params.push(("status".to_string(), status.clone()));
        }
        if let Some(search) = &self.filters.search {
            params.push(("search".to_string(), search.clone()));
        }
        if let Some(bot_id) = &self.filters.bot_id {
            params.push(("bot_id".to_string(), bot_id.clone()));
        }
        if let Some(from) = &self.filters.date_from {
            params.push(("start_date".to_string(), from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = &self.filters.date_to {
            params.push(("end_date".to_string(), to.format(DATE_FORMAT).to_string()));
        }
        params
    }

    /// Filter-only parameters, used by exports
    pub fn to_filter_params(&self) -> Vec<(String, String)> {
        self.to_request_params()
            .into_iter()
            .filter(|(k, _)| k != "page" && k != "limit")
            .collect()
    }
}
