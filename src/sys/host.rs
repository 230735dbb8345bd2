//! The contract between the switcher and the workspace application hosting it.
//!
//! The host owns every view. The switcher only ever holds [`ViewHandle`]s and
//! asks the host for a [`ViewProbe`] when it needs to look inside one.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

new_key_type! {
    /// Opaque identity of one open view (a leaf) in the host.
    pub struct ViewHandle;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub basename: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub modified_at: Option<u64>,
}

impl FileInfo {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let basename = basename_of(&path).to_string();
        Self { path, basename, modified_at: None }
    }

    pub fn modified(mut self, modified_at: u64) -> Self {
        self.modified_at = Some(modified_at);
        self
    }
}

/// File name without directories or extension.
fn basename_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("view accessor `{0}` is unavailable")]
    Unavailable(&'static str),
    #[error("view accessor `{accessor}` failed: {reason}")]
    Failed { accessor: &'static str, reason: String },
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Introspection of a single view.
///
/// Every accessor may fail; hosts expose views from third-party plugins whose
/// shape is not guaranteed. The defaults describe a view that has nothing to
/// offer, so implementors only override what their views actually carry.
pub trait ViewProbe {
    /// Identifier of the leaf containing the view.
    fn leaf_id(&self) -> Option<String> { None }

    /// Identifier of the view itself, when it has one separate from its leaf.
    fn view_id(&self) -> ProbeResult<Option<String>> { Ok(None) }

    fn view_type(&self) -> ProbeResult<Option<String>> { Ok(None) }

    fn file(&self) -> ProbeResult<Option<FileInfo>> { Ok(None) }

    /// File reachable through the view's state data.
    fn data_file(&self) -> ProbeResult<Option<FileInfo>> { Ok(None) }

    /// File reachable through the view's editor.
    fn editor_file(&self) -> ProbeResult<Option<FileInfo>> { Ok(None) }

    /// True when the view is a markdown editing view, whatever type it reports.
    fn is_markdown(&self) -> bool { false }

    fn has_navigation(&self) -> bool { false }

    fn url(&self) -> ProbeResult<Option<String>> { Ok(None) }

    fn src(&self) -> ProbeResult<Option<String>> { Ok(None) }

    /// Source of a frame element the view holds directly (iframe, frame or webview).
    fn frame_src(&self) -> ProbeResult<Option<String>> { Ok(None) }

    /// Sources of frames found in the view's rendered content. A frame
    /// without a source shows up as an empty string.
    fn embedded_frames(&self) -> ProbeResult<Vec<String>> { Ok(Vec::new()) }

    fn display_text(&self) -> ProbeResult<Option<String>> { Ok(None) }
}

/// A tab header found by walking the rendered workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabHeader {
    pub title: String,
    /// The view the host could tie the header to, if any.
    pub owner: Option<ViewHandle>,
}

pub trait Host {
    fn views_of_type(&self, view_type: &str) -> Vec<ViewHandle>;

    /// Full-tree walk over the views in the main workspace.
    fn walk_views(&self) -> Vec<ViewHandle>;

    /// Secondary walk over every view, including floating and sidebar ones.
    /// `None` when the host has no such mechanism.
    fn walk_all_views(&self) -> Option<Vec<ViewHandle>> { None }

    fn tab_headers(&self) -> Vec<TabHeader> { Vec::new() }

    fn active_view(&self) -> Option<ViewHandle>;

    fn active_file(&self) -> Option<FileInfo> { None }

    /// Recently opened file paths, most recent first. `None` when untracked.
    fn recent_files(&self) -> Option<Vec<String>> { None }

    fn view(&self, handle: ViewHandle) -> Option<&dyn ViewProbe>;

    fn is_open(&self, handle: ViewHandle) -> bool { self.view(handle).is_some() }

    fn set_active_view(&mut self, handle: ViewHandle);

    /// Focuses the view's content editor. Returns false if it has none.
    fn focus_editor(&mut self, handle: ViewHandle) -> bool;

    /// Generic focus. Returns false if the view cannot take focus.
    fn focus_view(&mut self, handle: ViewHandle) -> bool;
}
