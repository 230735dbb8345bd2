//! What the switcher overlay shows, independent of how it is drawn.

use std::fmt;

use crate::model::{TabDescriptor, TabKind};

const EMPTY_PLACEHOLDER: &str = "No tabs to switch";
const MAX_URL_LEN: usize = 60;
const TRUNCATED_URL_LEN: usize = 57;

/// Something that can put a [`TabStrip`] on screen.
pub trait Overlay {
    /// Replaces whatever is shown with `strip`.
    fn show(&mut self, strip: &TabStrip);

    /// Moves the highlight to `index` without rebuilding the rows.
    fn select(&mut self, index: usize);

    fn hide(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRow {
    pub title: String,
    pub subtitle: String,
    /// Full locator when the subtitle had to be shortened.
    pub tooltip: Option<String>,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabStrip {
    Empty,
    Rows(Vec<TabRow>),
}

impl TabStrip {
    pub fn build(tabs: &[TabDescriptor], selected: usize) -> Self {
        if tabs.is_empty() {
            return TabStrip::Empty;
        }
        let rows = tabs
            .iter()
            .enumerate()
            .map(|(idx, tab)| {
                let (subtitle, tooltip) = subtitle_of(tab);
                TabRow {
                    title: tab.title.clone(),
                    subtitle,
                    tooltip,
                    is_selected: idx == selected,
                }
            })
            .collect();
        TabStrip::Rows(rows)
    }

    pub fn rows(&self) -> &[TabRow] {
        match self {
            TabStrip::Empty => &[],
            TabStrip::Rows(rows) => rows,
        }
    }

    pub fn selected(&self) -> Option<usize> { self.rows().iter().position(|row| row.is_selected) }
}

fn subtitle_of(tab: &TabDescriptor) -> (String, Option<String>) {
    match tab.kind {
        TabKind::File => (tab.locator.clone(), None),
        TabKind::WebResource => {
            if tab.locator.chars().count() > MAX_URL_LEN {
                let short: String = tab.locator.chars().take(TRUNCATED_URL_LEN).collect();
                (format!("{short}..."), Some(tab.locator.clone()))
            } else {
                (tab.locator.clone(), None)
            }
        }
        TabKind::Other => (format!("[{}]", tab.view_type), None),
    }
}

impl fmt::Display for TabStrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabStrip::Empty => write!(f, "  {EMPTY_PLACEHOLDER}"),
            TabStrip::Rows(rows) => {
                for (idx, row) in rows.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    let marker = if row.is_selected { '>' } else { ' ' };
                    write!(f, "{marker} {}  {}", row.title, row.subtitle)?;
                }
                Ok(())
            }
        }
    }
}
