//! Terminal rendering
//!
//! Pure functions from view state to text. Nothing here talks to the backend.

pub mod menu;
pub mod table;

use colored::Colorize;

use crate::models::entity::Entity;
use crate::notify::{Notice, NoticeLevel};
use crate::sync::controller::ListSnapshot;

use self::table::{Table, TableRow};

/// `Page N of M (T total)`
pub fn pagination_footer(page: u32, total_pages: u32, total: u64) -> String {
    format!("Page {} of {} ({} total)", page, total_pages.max(1), total)
}

/// Table of the displayed page followed by the pagination footer
pub fn render_list<T: Entity + TableRow>(snapshot: &ListSnapshot<T>) -> String {
    let body = if !snapshot.loaded && snapshot.loading {
        "Loading...".dimmed().to_string()
    } else if snapshot.page.items.is_empty() {
        format!("No {}s found", T::KIND).dimmed().to_string()
    } else {
        Table::from_rows(&snapshot.page.items).render()
    };

    let mut footer = pagination_footer(
        snapshot.query.page,
        snapshot.page.total_pages,
        snapshot.page.total,
    );
    if snapshot.loading && snapshot.loaded {
        footer.push_str(" refreshing...");
    }

    format!("{}\n{}", body, footer.dimmed())
}

pub fn render_notice(notice: &Notice) -> String {
    let text = notice.to_string();
    match notice.level {
        NoticeLevel::Info => text.cyan().to_string(),
        NoticeLevel::Success => text.green().to_string(),
        NoticeLevel::Error => text.red().bold().to_string(),
    }
}
