//! An [`Overlay`] that writes down what it was asked to draw.

use std::fmt;

use tracing::trace;

use crate::ui::tab_strip::{Overlay, TabStrip};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayFrame {
    Shown(TabStrip),
    Selected(usize),
    Hidden,
}

impl fmt::Display for OverlayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayFrame::Shown(strip) => write!(f, "[overlay]\n{strip}"),
            OverlayFrame::Selected(index) => write!(f, "[select {index}]"),
            OverlayFrame::Hidden => f.write_str("[hidden]"),
        }
    }
}

#[derive(Debug, Default)]
pub struct TranscriptOverlay {
    frames: Vec<OverlayFrame>,
    visible: bool,
}

impl TranscriptOverlay {
    pub fn new() -> Self { Self::default() }

    pub fn frames(&self) -> &[OverlayFrame] { &self.frames }

    pub fn drain(&mut self) -> Vec<OverlayFrame> { std::mem::take(&mut self.frames) }

    pub fn is_visible(&self) -> bool { self.visible }

    /// The most recent strip put on screen, if the overlay is still up.
    pub fn current(&self) -> Option<&TabStrip> {
        if !self.visible {
            return None;
        }
        self.frames.iter().rev().find_map(|frame| match frame {
            OverlayFrame::Shown(strip) => Some(strip),
            _ => None,
        })
    }
}

impl Overlay for TranscriptOverlay {
    fn show(&mut self, strip: &TabStrip) {
        trace!(rows = strip.rows().len(), "overlay shown");
        self.visible = true;
        self.frames.push(OverlayFrame::Shown(strip.clone()));
    }

    fn select(&mut self, index: usize) { self.frames.push(OverlayFrame::Selected(index)); }

    fn hide(&mut self) {
        self.visible = false;
        self.frames.push(OverlayFrame::Hidden);
    }
}
