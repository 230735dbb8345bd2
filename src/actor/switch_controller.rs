//! The key-driven selection state machine behind the switcher overlay.
//!
//! The controller is synchronous: the host hands it each key event as it is
//! dispatched and gets back whether to suppress default handling. The only
//! thing that outlives a call is the deferred focus after an activation, which
//! the caller fires through [`SwitchController::run_pending_focus`] once
//! [`SwitchController::next_focus_deadline`] has passed.

use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use crate::common::config::{InputMode, SwitcherSettings};
use crate::model::{TabCatalog, TabDescriptor};
use crate::sys::event::{Direction, Key, KeyEvent, Modifiers, Propagation};
use crate::sys::host::{Host, ViewHandle};
use crate::ui::tab_strip::{Overlay, TabStrip};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    /// Where the selection started when the overlay was shown.
    pub original_index: usize,
    /// The catalog as last computed while the overlay was up.
    pub catalog: Vec<TabDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SwitcherState {
    #[default]
    Hidden,
    Visible(Selection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFocus {
    pub target: ViewHandle,
    pub due: Instant,
}

pub struct SwitchController<H, O> {
    settings: SwitcherSettings,
    host: H,
    overlay: O,
    state: SwitcherState,
    held: Modifiers,
    latched: bool,
    pending_focus: Option<PendingFocus>,
}

impl<H: Host, O: Overlay> SwitchController<H, O> {
    pub fn new(settings: SwitcherSettings, host: H, overlay: O) -> Self {
        Self {
            settings,
            host,
            overlay,
            state: SwitcherState::Hidden,
            held: Modifiers::empty(),
            latched: false,
            pending_focus: None,
        }
    }

    pub fn settings(&self) -> &SwitcherSettings { &self.settings }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn overlay(&self) -> &O { &self.overlay }

    pub fn overlay_mut(&mut self) -> &mut O { &mut self.overlay }

    pub fn state(&self) -> &SwitcherState { &self.state }

    pub fn is_visible(&self) -> bool { matches!(self.state, SwitcherState::Visible(_)) }

    pub fn selection_index(&self) -> Option<usize> {
        match &self.state {
            SwitcherState::Visible(selection) => Some(selection.index),
            SwitcherState::Hidden => None,
        }
    }

    pub fn held_modifiers(&self) -> Modifiers { self.held }

    pub fn is_latched(&self) -> bool { self.latched }

    pub fn pending_focus(&self) -> Option<PendingFocus> { self.pending_focus }

    pub fn next_focus_deadline(&self) -> Option<Instant> { self.pending_focus.map(|p| p.due) }

    #[instrument(skip(self), fields(mode = %self.settings.mode))]
    pub fn handle_key_down(&mut self, event: &KeyEvent) -> Propagation {
        self.track_modifiers(event, true);
        if !self.settings.enabled {
            return Propagation::Pass;
        }
        match self.settings.mode {
            InputMode::SingleKey => self.single_key_down(event),
            InputMode::Combo => self.combo_down(event),
        }
    }

    /// Key releases never suppress default handling; they only end a switch.
    #[instrument(skip(self), fields(mode = %self.settings.mode))]
    pub fn handle_key_up(&mut self, event: &KeyEvent) -> Propagation {
        self.track_modifiers(event, false);
        if !self.settings.enabled {
            return Propagation::Pass;
        }
        match self.settings.mode {
            InputMode::SingleKey => {
                if event.key == self.settings.switch_key.key() {
                    self.latched = false;
                    self.activate_selection();
                }
            }
            InputMode::Combo => {
                if self.latched && !self.combo_satisfied() {
                    trace!("combo released");
                    self.latched = false;
                    self.activate_selection();
                }
            }
        }
        Propagation::Pass
    }

    fn track_modifiers(&mut self, event: &KeyEvent, pressed: bool) {
        self.held = event.modifiers;
        if let Some(flag) = event.key.modifier() {
            self.held.set(flag, pressed);
        }
    }

    fn single_key_down(&mut self, event: &KeyEvent) -> Propagation {
        if event.key == self.settings.switch_key.key() && self.single_key_qualifies(event) {
            if !self.latched {
                self.latched = true;
                self.show();
            }
            return Propagation::Consume;
        }
        if !(self.latched && self.is_visible()) {
            return Propagation::Pass;
        }
        match event.key {
            Key::ArrowLeft if self.selection_index() == Some(0) => {
                self.return_to_current_tab();
                Propagation::Consume
            }
            Key::ArrowLeft => {
                self.move_selection(Direction::Left);
                Propagation::Consume
            }
            Key::ArrowRight => {
                self.move_selection(Direction::Right);
                Propagation::Consume
            }
            _ => Propagation::Pass,
        }
    }

    fn single_key_qualifies(&self, event: &KeyEvent) -> bool {
        if !self.settings.strict_single_key {
            return true;
        }
        let switch = self.settings.switch_key;
        let others = Modifiers::all() - switch.modifier();
        event.key == switch.key() && !event.modifiers.intersects(others)
    }

    fn combo_down(&mut self, event: &KeyEvent) -> Propagation {
        if !self.combo_satisfied() {
            return Propagation::Pass;
        }
        if !self.latched {
            self.latched = true;
            self.show();
            return Propagation::Consume;
        }
        match event.key.direction() {
            Some(direction) => {
                self.move_selection(direction);
                Propagation::Consume
            }
            None => Propagation::Pass,
        }
    }

    fn combo_satisfied(&self) -> bool {
        let required = self.settings.combo_keys.required();
        !required.is_empty() && self.held.contains(required)
    }

    fn catalog(&self) -> Vec<TabDescriptor> {
        TabCatalog::new(&self.host).list_switchable_tabs(self.settings.exclude_active)
    }

    fn show(&mut self) {
        if self.is_visible() {
            return;
        }
        let catalog = self.catalog();
        debug!(tabs = catalog.len(), "showing switcher");
        self.overlay.show(&TabStrip::build(&catalog, 0));
        self.state = SwitcherState::Visible(Selection { index: 0, original_index: 0, catalog });
    }

    fn move_selection(&mut self, direction: Direction) {
        let catalog = self.catalog();
        let SwitcherState::Visible(selection) = &mut self.state else { return };
        if catalog.is_empty() {
            selection.catalog = catalog;
            return;
        }
        selection.index = direction.step(selection.index, catalog.len());
        selection.catalog = catalog;
        trace!(index = selection.index, "moved selection");
        let index = selection.index;
        self.overlay.show(&TabStrip::build(&selection.catalog, index));
        self.overlay.select(index);
    }

    /// Jumps back to the tab that was active when switching began, if the
    /// catalog lists it. Otherwise the selection stays where it is.
    fn return_to_current_tab(&mut self) {
        let catalog = self.catalog();
        let active = self.host.active_view();
        let SwitcherState::Visible(selection) = &mut self.state else { return };
        let found = active.and_then(|active| catalog.iter().position(|tab| tab.handle == active));
        selection.catalog = catalog;
        match found {
            Some(index) => {
                selection.index = index;
                self.overlay.show(&TabStrip::build(&selection.catalog, index));
                self.overlay.select(index);
            }
            None => trace!("active tab not listed; staying put"),
        }
    }

    /// Activates whatever is selected in a freshly computed catalog and hides
    /// the overlay. Does nothing while hidden.
    #[instrument(skip(self))]
    pub fn activate_selection(&mut self) {
        let SwitcherState::Visible(selection) = &self.state else { return };
        let index = selection.index;
        let catalog = self.catalog();
        match catalog.get(index) {
            Some(tab) => {
                debug!(title = %tab.title, index, "activating tab");
                self.host.set_active_view(tab.handle);
                self.schedule_focus(tab.handle);
            }
            None => debug!(index, tabs = catalog.len(), "selection out of range; nothing to activate"),
        }
        self.hide();
    }

    /// Activates the tab next to the active one without showing the overlay.
    #[instrument(skip(self))]
    pub fn switch_to_adjacent(&mut self, direction: Direction) {
        let catalog = self.catalog();
        if catalog.is_empty() {
            return;
        }
        let last = catalog.len() - 1;
        let current = self
            .host
            .active_view()
            .and_then(|active| catalog.iter().position(|tab| tab.handle == active));
        let target = match (direction, current) {
            (Direction::Left, Some(i)) if i > 0 => i - 1,
            (Direction::Left, _) => last,
            (Direction::Right, Some(i)) if i < last => i + 1,
            (Direction::Right, _) => 0,
        };
        debug!(title = %catalog[target].title, "switching to adjacent tab");
        self.host.set_active_view(catalog[target].handle);
    }

    /// Hides the overlay without activating anything.
    pub fn dismiss(&mut self) {
        self.latched = false;
        self.hide();
    }

    pub fn update_config(&mut self, settings: SwitcherSettings) {
        debug!(?settings, "switcher settings updated");
        self.settings = settings;
        self.dismiss();
    }

    fn hide(&mut self) {
        if !self.is_visible() {
            return;
        }
        self.state = SwitcherState::Hidden;
        self.overlay.hide();
    }

    fn schedule_focus(&mut self, target: ViewHandle) {
        if let Some(prior) = self.pending_focus.take() {
            trace!(?prior.target, "cancelling pending focus");
        }
        let due = Instant::now() + self.settings.focus_delay();
        self.pending_focus = Some(PendingFocus { target, due });
    }

    /// Fires the deferred focus if it is due at `now`. Returns whether it fired.
    pub fn run_pending_focus(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending_focus.take_if(|p| p.due <= now) else {
            return false;
        };
        if !self.host.is_open(pending.target) {
            debug!(?pending.target, "focus target closed before focus fired");
            return true;
        }
        if !self.host.focus_editor(pending.target) && !self.host.focus_view(pending.target) {
            trace!(?pending.target, "view has nothing to focus");
        }
        true
    }
}
