use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::actor;
use crate::actor::switch_controller::SwitchController;
use crate::common::config::Config;
use crate::sys::event::{Direction, KeyEvent};
use crate::sys::host::Host;
use crate::sys::timer::Timer;
use crate::ui::tab_strip::Overlay;

#[derive(Debug)]
pub enum Event {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    SwitchAdjacent(Direction),
    Dismiss,
    UpdateConfig(Config),
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// Drives a [`SwitchController`] from a channel and fires its deferred focus
/// on a timer.
pub struct TabSwitcherActor<H, O> {
    controller: SwitchController<H, O>,
    rx: Receiver,
    focus_timer: Timer,
}

impl<H: Host, O: Overlay> TabSwitcherActor<H, O> {
    pub fn new(controller: SwitchController<H, O>, rx: Receiver) -> Self {
        Self { controller, rx, focus_timer: Timer::manual() }
    }

    /// Runs until every sender is gone, then lets any pending focus land and
    /// hands the controller back.
    pub async fn run(mut self) -> SwitchController<H, O> {
        loop {
            tokio::select! {
                _ = &mut self.focus_timer, if self.focus_timer.is_armed() => {
                    self.controller.run_pending_focus(Instant::now());
                    self.arm_focus_timer();
                }

                maybe = self.rx.recv() => {
                    match maybe {
                        Some((span, event)) => {
                            let _enter = span.enter();
                            self.handle_event(event);
                            self.arm_focus_timer();
                        }
                        None => break,
                    }
                }
            }
        }

        if let Some(due) = self.controller.next_focus_deadline() {
            tokio::time::sleep_until(due).await;
            self.controller.run_pending_focus(due);
        }
        debug!("tab switcher channel closed");
        self.controller
    }

    #[instrument(skip(self))]
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::KeyDown(key) => {
                self.controller.handle_key_down(&key);
            }
            Event::KeyUp(key) => {
                self.controller.handle_key_up(&key);
            }
            Event::SwitchAdjacent(direction) => self.controller.switch_to_adjacent(direction),
            Event::Dismiss => self.controller.dismiss(),
            Event::UpdateConfig(config) => self.controller.update_config(config.settings.switcher),
        }
    }

    fn arm_focus_timer(&mut self) {
        match self.controller.next_focus_deadline() {
            Some(due) => self.focus_timer.set_deadline(due),
            None => self.focus_timer.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::SwitcherSettings;
    use crate::sys::event::{Key, Modifiers};
    use crate::sys::memory_host::{HostCall, MemoryHost, MemoryView};
    use crate::ui::transcript::TranscriptOverlay;

    fn spawn_parts() -> (Sender, TabSwitcherActor<MemoryHost, TranscriptOverlay>) {
        let mut host = MemoryHost::new();
        host.add_view(MemoryView::file("a", "a.md").modified(2));
        host.add_view(MemoryView::file("b", "b.md").modified(1));
        let settings = SwitcherSettings { focus_delay_ms: 5, ..SwitcherSettings::default() };
        let controller = SwitchController::new(settings, host, TranscriptOverlay::new());
        let (tx, rx) = actor::channel();
        (tx, TabSwitcherActor::new(controller, rx))
    }

    #[test]
    fn builds_outside_a_runtime() {
        let (tx, actor) = spawn_parts();
        assert!(!actor.focus_timer.is_armed());
        drop((tx, actor));
    }

    #[tokio::test(start_paused = true)]
    async fn switches_and_focuses_through_the_channel() {
        let (tx, actor) = spawn_parts();
        tx.try_send(Event::KeyDown(KeyEvent::new(Key::Alt, Modifiers::ALT)));
        tx.try_send(Event::KeyDown(KeyEvent::new(Key::ArrowRight, Modifiers::ALT)));
        tx.try_send(Event::KeyUp(KeyEvent::new(Key::Alt, Modifiers::empty())));
        drop(tx);

        let controller = actor.run().await;
        let b = controller.host().handle_named("b").unwrap();
        assert!(!controller.is_visible());
        assert_eq!(controller.host().calls(), &[HostCall::Activate(b), HostCall::FocusEditor(b)]);
        assert_eq!(controller.pending_focus(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_fires_on_the_timer_while_the_channel_is_open() {
        let (tx, actor) = spawn_parts();
        let start = Instant::now();
        let handle = tokio::spawn(actor.run());
        tx.try_send(Event::KeyDown(KeyEvent::new(Key::Alt, Modifiers::ALT)));
        tx.try_send(Event::KeyUp(KeyEvent::new(Key::Alt, Modifiers::empty())));

        // Paused time only moves once every task is idle, so the actor has
        // handled both keys and fired its 5ms focus timer before this returns.
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.try_send(Event::SwitchAdjacent(Direction::Right));
        drop(tx);

        let controller = handle.await.unwrap();
        let a = controller.host().handle_named("a").unwrap();
        let b = controller.host().handle_named("b").unwrap();
        assert_eq!(
            controller.host().calls(),
            &[HostCall::Activate(a), HostCall::FocusEditor(a), HostCall::Activate(b)]
        );
        assert_eq!(controller.pending_focus(), None);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn config_updates_reach_the_controller() {
        let (tx, actor) = spawn_parts();
        tx.try_send(Event::KeyDown(KeyEvent::new(Key::Alt, Modifiers::ALT)));
        let mut config = Config::default();
        config.settings.switcher.enabled = false;
        tx.try_send(Event::UpdateConfig(config));
        tx.try_send(Event::KeyUp(KeyEvent::new(Key::Alt, Modifiers::empty())));
        drop(tx);

        let controller = actor.run().await;
        assert!(!controller.settings().enabled);
        assert!(!controller.is_visible());
        assert!(controller.host().calls().is_empty());
    }
}
