use serde::Serialize;

use crate::sys::host::ViewHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TabKind {
    File,
    WebResource,
    Other,
}

impl TabKind {
    pub fn is_switchable(self) -> bool { matches!(self, TabKind::File | TabKind::WebResource) }

    /// Which of two same-titled tabs survives deduplication: files beat web
    /// resources, web resources beat everything else.
    pub(crate) fn preference(self) -> u8 {
        match self {
            TabKind::File => 2,
            TabKind::WebResource => 1,
            TabKind::Other => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabDescriptor {
    #[serde(skip)]
    pub handle: ViewHandle,
    pub kind: TabKind,
    pub title: String,
    /// File path, URL, or `viewType:id` depending on `kind`.
    pub locator: String,
    pub view_type: String,
    pub recency_rank: Option<usize>,
    /// Milliseconds since the Unix epoch; files only.
    pub modified_at: Option<u64>,
}
