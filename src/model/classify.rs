//! Turning one host view into a [`TabDescriptor`].
//!
//! Classification is an ordered chain of independent predicates. Each one
//! either claims the view or passes; the first claim wins and anything left
//! over becomes [`TabKind::Other`]. A failing accessor aborts classification
//! of that view and the catalog drops it.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{trace, warn};
use uuid::Uuid;

use crate::model::tab::{TabDescriptor, TabKind};
use crate::sys::host::{FileInfo, ProbeResult, ViewHandle, ViewProbe};

/// View types queried directly for documents.
pub const DOCUMENT_VIEW_TYPES: &[&str] =
    &["markdown", "pdf", "image", "video", "audio", "canvas", "excalidraw"];

/// View types queried directly in the hope of catching web viewers.
pub const QUERIED_WEB_VIEW_TYPES: &[&str] = &[
    "web-view",
    "webview",
    "browser-view",
    "custom-frames",
    "iframe",
    "web-browser",
    "surfing-view",
    "browser",
    "webpage",
    "site",
    "external-link",
    "url-view",
    "web",
    "http",
    "https",
];

/// View types that count as web resources even when no URL can be read.
pub const WEB_VIEW_TYPES: &[&str] =
    &["web-view", "webview", "browser-view", "custom-frames", "iframe", "web-browser"];

const EMBEDDED_FRAME_URL: &str = "iframe://embedded";
const UNKNOWN_VIEW_TYPE: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext<'a> {
    pub active: Option<ViewHandle>,
    pub active_file: Option<&'a FileInfo>,
}

struct Candidate<'a> {
    handle: ViewHandle,
    view: &'a dyn ViewProbe,
    view_type: String,
    is_active: bool,
    active_file: Option<&'a FileInfo>,
}

type Classifier = fn(&Candidate<'_>) -> ProbeResult<Option<TabDescriptor>>;

const CHAIN: &[(&str, Classifier)] = &[
    ("file", from_file),
    ("secondary_file", from_secondary_file),
    ("web", from_web_signals),
];

pub fn classify(
    handle: ViewHandle,
    view: &dyn ViewProbe,
    ctx: &ClassifyContext<'_>,
) -> ProbeResult<TabDescriptor> {
    let candidate = Candidate {
        handle,
        view,
        view_type: resolve_view_type(view),
        is_active: ctx.active == Some(handle),
        active_file: ctx.active_file,
    };
    for (name, classifier) in CHAIN {
        if let Some(tab) = classifier(&candidate)? {
            trace!(classifier = *name, title = %tab.title, "classified view");
            return Ok(tab);
        }
    }
    as_other(&candidate)
}

/// The view's declared type, or a guess from what it exposes.
pub fn resolve_view_type(view: &dyn ViewProbe) -> String {
    let declared = view.view_type().unwrap_or_else(|err| {
        trace!(%err, "view type accessor failed");
        None
    });
    if let Some(view_type) = declared.filter(|t| !t.is_empty() && t != UNKNOWN_VIEW_TYPE) {
        return view_type;
    }
    if matches!(view.file(), Ok(Some(_))) {
        return "markdown".into();
    }
    if view.has_navigation() {
        return "special".into();
    }
    UNKNOWN_VIEW_TYPE.into()
}

fn from_file(c: &Candidate<'_>) -> ProbeResult<Option<TabDescriptor>> {
    Ok(c.view.file()?.map(|file| file_descriptor(c, file)))
}

fn from_secondary_file(c: &Candidate<'_>) -> ProbeResult<Option<TabDescriptor>> {
    if c.view_type != "markdown" && !c.view.is_markdown() {
        return Ok(None);
    }
    match secondary_file(c) {
        Ok(file) => Ok(file.map(|file| file_descriptor(c, file))),
        Err(err) => {
            warn!(%err, "could not resolve the file behind a markdown view");
            Ok(None)
        }
    }
}

fn secondary_file(c: &Candidate<'_>) -> ProbeResult<Option<FileInfo>> {
    if let Some(file) = c.view.data_file()? {
        return Ok(Some(file));
    }
    if let Some(file) = c.view.editor_file()? {
        return Ok(Some(file));
    }
    Ok(if c.is_active { c.active_file.cloned() } else { None })
}

fn file_descriptor(c: &Candidate<'_>, file: FileInfo) -> TabDescriptor {
    let title = if file.basename.is_empty() { "Untitled".to_string() } else { file.basename };
    TabDescriptor {
        handle: c.handle,
        kind: TabKind::File,
        title,
        locator: file.path,
        view_type: c.view_type.clone(),
        recency_rank: None,
        modified_at: file.modified_at,
    }
}

fn from_web_signals(c: &Candidate<'_>) -> ProbeResult<Option<TabDescriptor>> {
    let url = match direct_url(c.view)? {
        Some(url) => Some(url),
        None => c.view.embedded_frames()?.into_iter().next().map(|src| {
            if src.is_empty() { EMBEDDED_FRAME_URL.to_string() } else { src }
        }),
    };
    if url.is_none() && !WEB_VIEW_TYPES.contains(&c.view_type.as_str()) {
        return Ok(None);
    }
    let title = non_empty(c.view.display_text()?).unwrap_or_else(|| "Web Page".to_string());
    let locator = url.unwrap_or_else(|| format!("{}://internal", c.view_type));
    Ok(Some(TabDescriptor {
        handle: c.handle,
        kind: TabKind::WebResource,
        title,
        locator,
        view_type: c.view_type.clone(),
        recency_rank: None,
        modified_at: None,
    }))
}

fn direct_url(view: &dyn ViewProbe) -> ProbeResult<Option<String>> {
    if let Some(url) = non_empty(view.url()?) {
        return Ok(Some(url));
    }
    if let Some(src) = non_empty(view.src()?) {
        return Ok(Some(src));
    }
    Ok(non_empty(view.frame_src()?))
}

fn as_other(c: &Candidate<'_>) -> ProbeResult<TabDescriptor> {
    let title = match non_empty(c.view.display_text()?) {
        Some(text) => text,
        None if c.view_type != UNKNOWN_VIEW_TYPE => c.view_type.clone(),
        None => "Unknown".to_string(),
    };
    let id = match non_empty(c.view.view_id()?).or_else(|| non_empty(c.view.leaf_id())) {
        Some(id) => id,
        None => synthesized_id(&title),
    };
    Ok(TabDescriptor {
        handle: c.handle,
        kind: TabKind::Other,
        locator: format!("{}:{}", c.view_type, id),
        title,
        view_type: c.view_type.clone(),
        recency_rank: None,
        modified_at: None,
    })
}

fn synthesized_id(title: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{title}_{millis}_{suffix}")
}

fn non_empty(value: Option<String>) -> Option<String> { value.filter(|s| !s.is_empty()) }
