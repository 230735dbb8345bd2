//! An in-memory [`Host`] built from a RON workspace fixture.
//!
//! The harness binary replays key scripts against it, and the tests use it to
//! model the awkward corners of real hosts: views that only one enumeration
//! mechanism reports, headers that cannot be tied to a view, accessors that
//! throw.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;
use tracing::debug;

use crate::common::collections::HashMap;
use crate::sys::host::{FileInfo, Host, ProbeError, ProbeResult, TabHeader, ViewHandle, ViewProbe};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryView {
    /// Fixture-local name used to refer to the view from elsewhere in the fixture.
    pub name: String,
    pub leaf_id: Option<String>,
    pub view_id: Option<String>,
    pub view_type: Option<String>,
    pub file: Option<FileInfo>,
    pub data_file: Option<FileInfo>,
    pub editor_file: Option<FileInfo>,
    pub markdown: bool,
    pub navigation: bool,
    pub url: Option<String>,
    pub src: Option<String>,
    pub frame_src: Option<String>,
    pub embedded_frames: Vec<String>,
    pub display_text: Option<String>,
    pub editor: bool,
    pub focusable: bool,
    /// Whether the primary tree walk reports this view.
    pub in_tree: bool,
    /// Accessors that fail when probed, by name (`file`, `url`, `display_text`, ...).
    pub failing: Vec<String>,
}

impl Default for MemoryView {
    fn default() -> Self {
        Self {
            name: String::new(),
            leaf_id: None,
            view_id: None,
            view_type: None,
            file: None,
            data_file: None,
            editor_file: None,
            markdown: false,
            navigation: false,
            url: None,
            src: None,
            frame_src: None,
            embedded_frames: Vec::new(),
            display_text: None,
            editor: false,
            focusable: true,
            in_tree: true,
            failing: Vec::new(),
        }
    }
}

impl MemoryView {
    /// A markdown editor showing `path`.
    pub fn file(name: &str, path: &str) -> Self {
        let file = FileInfo::new(path);
        Self {
            name: name.to_string(),
            leaf_id: Some(format!("leaf-{name}")),
            view_type: Some("markdown".into()),
            display_text: Some(file.basename.clone()),
            file: Some(file),
            markdown: true,
            editor: true,
            ..Self::default()
        }
    }

    /// A browser-style view showing `url`.
    pub fn web(name: &str, url: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            leaf_id: Some(format!("leaf-{name}")),
            view_type: Some("webviewer".into()),
            url: Some(url.to_string()),
            display_text: Some(title.to_string()),
            ..Self::default()
        }
    }

    /// A plugin view with no file and no URL.
    pub fn other(name: &str, view_type: &str) -> Self {
        Self {
            name: name.to_string(),
            leaf_id: Some(format!("leaf-{name}")),
            view_type: Some(view_type.to_string()),
            ..Self::default()
        }
    }

    pub fn modified(mut self, modified_at: u64) -> Self {
        if let Some(file) = self.file.as_mut() {
            file.modified_at = Some(modified_at);
        }
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.display_text = Some(title.to_string());
        self
    }

    pub fn with_type(mut self, view_type: &str) -> Self {
        self.view_type = Some(view_type.to_string());
        self
    }

    pub fn failing(mut self, accessor: &str) -> Self {
        self.failing.push(accessor.to_string());
        self
    }

    pub fn outside_tree(mut self) -> Self {
        self.in_tree = false;
        self
    }

    fn check(&self, accessor: &'static str) -> ProbeResult<()> {
        if self.failing.iter().any(|name| name == accessor) {
            return Err(ProbeError::Failed {
                accessor,
                reason: "accessor threw".into(),
            });
        }
        Ok(())
    }

    fn probe<T: Clone>(&self, accessor: &'static str, value: &T) -> ProbeResult<T> {
        self.check(accessor)?;
        Ok(value.clone())
    }
}

impl ViewProbe for MemoryView {
    fn leaf_id(&self) -> Option<String> { self.leaf_id.clone() }

    fn view_id(&self) -> ProbeResult<Option<String>> { self.probe("view_id", &self.view_id) }

    fn view_type(&self) -> ProbeResult<Option<String>> { self.probe("view_type", &self.view_type) }

    fn file(&self) -> ProbeResult<Option<FileInfo>> { self.probe("file", &self.file) }

    fn data_file(&self) -> ProbeResult<Option<FileInfo>> { self.probe("data_file", &self.data_file) }

    fn editor_file(&self) -> ProbeResult<Option<FileInfo>> {
        self.probe("editor_file", &self.editor_file)
    }

    fn is_markdown(&self) -> bool { self.markdown }

    fn has_navigation(&self) -> bool { self.navigation }

    fn url(&self) -> ProbeResult<Option<String>> { self.probe("url", &self.url) }

    fn src(&self) -> ProbeResult<Option<String>> { self.probe("src", &self.src) }

    fn frame_src(&self) -> ProbeResult<Option<String>> { self.probe("frame_src", &self.frame_src) }

    fn embedded_frames(&self) -> ProbeResult<Vec<String>> {
        self.probe("embedded_frames", &self.embedded_frames)
    }

    fn display_text(&self) -> ProbeResult<Option<String>> {
        self.probe("display_text", &self.display_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFixture {
    pub title: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceFixture {
    pub views: Vec<MemoryView>,
    pub active: Option<String>,
    pub active_file: Option<FileInfo>,
    pub recent_files: Option<Vec<String>>,
    pub headers: Vec<HeaderFixture>,
    /// When false the primary tree walk comes back empty.
    pub primary_walk: bool,
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self {
            views: Vec::new(),
            active: None,
            active_file: None,
            recent_files: None,
            headers: Vec::new(),
            primary_walk: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read workspace fixture {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse workspace fixture {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("fixture refers to unknown view `{0}`")]
    UnknownView(String),
}

/// Host-side effects the switcher asked for, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    Activate(ViewHandle),
    FocusEditor(ViewHandle),
    FocusView(ViewHandle),
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    views: SlotMap<ViewHandle, MemoryView>,
    order: Vec<ViewHandle>,
    names: HashMap<String, ViewHandle>,
    active: Option<ViewHandle>,
    active_file: Option<FileInfo>,
    recent_files: Option<Vec<String>>,
    headers: Vec<TabHeader>,
    primary_walk_disabled: bool,
    calls: Vec<HostCall>,
}

impl MemoryHost {
    pub fn new() -> Self { Self::default() }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| FixtureError::Read { path: path.to_path_buf(), source })?;
        let fixture: WorkspaceFixture = ron::from_str(&text)
            .map_err(|source| FixtureError::Parse { path: path.to_path_buf(), source })?;
        Self::from_fixture(fixture)
    }

    pub fn from_fixture(fixture: WorkspaceFixture) -> Result<Self, FixtureError> {
        let mut host = Self::new();
        for view in fixture.views {
            host.add_view(view);
        }
        if let Some(name) = fixture.active {
            let handle = host.require(&name)?;
            host.active = Some(handle);
        }
        for header in fixture.headers {
            let owner = match header.owner {
                Some(name) => Some(host.require(&name)?),
                None => None,
            };
            host.headers.push(TabHeader { title: header.title, owner });
        }
        host.active_file = fixture.active_file;
        host.recent_files = fixture.recent_files;
        host.primary_walk_disabled = !fixture.primary_walk;
        debug!(views = host.order.len(), "loaded workspace fixture");
        Ok(host)
    }

    fn require(&self, name: &str) -> Result<ViewHandle, FixtureError> {
        self.handle_named(name).ok_or_else(|| FixtureError::UnknownView(name.to_string()))
    }

    pub fn add_view(&mut self, view: MemoryView) -> ViewHandle {
        let name = view.name.clone();
        let handle = self.views.insert(view);
        self.order.push(handle);
        if !name.is_empty() {
            self.names.insert(name, handle);
        }
        handle
    }

    pub fn close(&mut self, handle: ViewHandle) {
        if let Some(view) = self.views.remove(handle) {
            self.names.remove(&view.name);
        }
        self.order.retain(|h| *h != handle);
        if self.active == Some(handle) {
            self.active = None;
        }
    }

    pub fn handle_named(&self, name: &str) -> Option<ViewHandle> { self.names.get(name).copied() }

    pub fn name_of(&self, handle: ViewHandle) -> Option<&str> {
        self.views.get(handle).map(|view| view.name.as_str())
    }

    pub fn set_active(&mut self, handle: Option<ViewHandle>) { self.active = handle; }

    pub fn set_active_file(&mut self, file: Option<FileInfo>) { self.active_file = file; }

    pub fn set_recent_files(&mut self, recent: Option<Vec<String>>) { self.recent_files = recent; }

    pub fn add_header(&mut self, title: &str, owner: Option<ViewHandle>) {
        self.headers.push(TabHeader { title: title.to_string(), owner });
    }

    pub fn set_primary_walk(&mut self, enabled: bool) { self.primary_walk_disabled = !enabled; }

    pub fn calls(&self) -> &[HostCall] { &self.calls }

    pub fn take_calls(&mut self) -> Vec<HostCall> { std::mem::take(&mut self.calls) }
}

impl Host for MemoryHost {
    fn views_of_type(&self, view_type: &str) -> Vec<ViewHandle> {
        self.order
            .iter()
            .copied()
            .filter(|h| self.views[*h].view_type.as_deref() == Some(view_type))
            .collect()
    }

    fn walk_views(&self) -> Vec<ViewHandle> {
        if self.primary_walk_disabled {
            return Vec::new();
        }
        self.order.iter().copied().filter(|h| self.views[*h].in_tree).collect()
    }

    fn walk_all_views(&self) -> Option<Vec<ViewHandle>> { Some(self.order.clone()) }

    fn tab_headers(&self) -> Vec<TabHeader> { self.headers.clone() }

    fn active_view(&self) -> Option<ViewHandle> { self.active }

    fn active_file(&self) -> Option<FileInfo> { self.active_file.clone() }

    fn recent_files(&self) -> Option<Vec<String>> { self.recent_files.clone() }

    fn view(&self, handle: ViewHandle) -> Option<&dyn ViewProbe> {
        self.views.get(handle).map(|view| view as &dyn ViewProbe)
    }

    fn set_active_view(&mut self, handle: ViewHandle) {
        self.active = Some(handle);
        self.calls.push(HostCall::Activate(handle));
    }

    fn focus_editor(&mut self, handle: ViewHandle) -> bool {
        let has_editor = self.views.get(handle).is_some_and(|view| view.editor);
        if has_editor {
            self.calls.push(HostCall::FocusEditor(handle));
        }
        has_editor
    }

    fn focus_view(&mut self, handle: ViewHandle) -> bool {
        let focusable = self.views.get(handle).is_some_and(|view| view.focusable);
        if focusable {
            self.calls.push(HostCall::FocusView(handle));
        }
        focusable
    }
}
