//! The actor that drives the engines from host notifications.
//!
//! Host callbacks only enqueue [`Event`]s. Work that should be coalesced is
//! recorded in a [`DeferredQueue`] under a [`Task`] key and runs once its
//! delay has passed with no newer request for the same key.

use std::path::PathBuf;
use std::time::Instant;

use notify::RecommendedWatcher;
use notify_debouncer_mini::Debouncer;
use tracing::{debug, info, instrument, trace, warn};

use super::broadcast::BroadcastSender;
use super::panel_manager::{PanelLayoutEngine, TOGGLE_INTELLIHIDE_ACTION};
use crate::common::config::{self, Config, ConfigError, Timing};
use crate::model::panel::PanelId;
use crate::sys::Host;
use crate::sys::event::{Key, MouseButton, PointerEvent};
use crate::sys::settings::SettingKey;
use crate::sys::timer::{Delay, DeferredQueue};
use crate::sys::workspace::{AppId, WindowId};

pub type Sender = crate::actor::Sender<Event>;
pub type Receiver = crate::actor::Receiver<Event>;

#[derive(Debug)]
pub enum Event {
    Enable,
    Disable,
    /// Disables everything and stops the actor.
    Shutdown,
    SettingChanged(SettingKey),
    ConfigReloaded(Box<Config>),
    MonitorsChanged,
    WorkareasChanged,
    /// The pointer or keyboard focus moved to another monitor.
    MonitorFocused(usize),
    WorkspaceAdded,
    WorkspaceRemoved,
    ActiveWorkspaceChanged,
    WorkspaceRenamed,
    /// A window was added to or removed from the workspace at this index.
    WorkspaceWindowsChanged(usize),
    WindowCreated,
    WindowDestroyed(WindowId),
    FocusChanged,
    /// The host laid out a preview pane.
    PreviewAllocated(PanelId),
    Pointer {
        panel: PanelId,
        event: PointerEvent,
    },
    Key {
        panel: PanelId,
        key: Key,
    },
    /// A keybinding registered by the engine was triggered.
    Keybinding(String),
    ShortcutClicked {
        panel: PanelId,
        slot: usize,
        button: MouseButton,
    },
    ShortcutChosen {
        panel: PanelId,
        slot: usize,
        app: Option<AppId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Reset,
    SyncWorkspaces,
    /// Second geometry pass after a structural change.
    SettleGeometry,
    RefreshActive,
    WorkareaGeometry,
    AllocationGeometry(PanelId),
    AppIcons(usize),
    FirstWindowRebuild,
}

/// Forwards every parsed revision of the config file as
/// [`Event::ConfigReloaded`]. The returned debouncer must be kept alive.
pub fn watch_config(
    path: PathBuf,
    events: Sender,
) -> Result<Debouncer<RecommendedWatcher>, ConfigError> {
    config::watch(path, move |config| events.send(Event::ConfigReloaded(Box::new(config))))
}

fn now() -> Instant { tokio::time::Instant::now().into_std() }

pub struct Shell {
    host: Host,
    engine: PanelLayoutEngine,
    timing: Timing,
    tasks: DeferredQueue<Task>,
    rx: Receiver,
    seen_first_window: bool,
}

impl Shell {
    pub fn new(
        host: Host,
        timing: Timing,
        events: Sender,
        rx: Receiver,
        broadcast: BroadcastSender,
    ) -> Self {
        Shell {
            engine: PanelLayoutEngine::new(host.clone(), events, broadcast),
            host,
            timing,
            tasks: DeferredQueue::new(),
            rx,
            seen_first_window: false,
        }
    }

    pub fn engine(&self) -> &PanelLayoutEngine { &self.engine }

    pub fn engine_mut(&mut self) -> &mut PanelLayoutEngine { &mut self.engine }

    pub fn tasks(&self) -> &DeferredQueue<Task> { &self.tasks }

    pub async fn run(mut self) {
        loop {
            let deadline = self.tasks.next_deadline();
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at.into()).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                biased;

                maybe = self.rx.recv() => {
                    let Some((span, event)) = maybe else { break };
                    let _guard = span.enter();
                    if matches!(event, Event::Shutdown) {
                        self.handle_event(event, now());
                        break;
                    }
                    self.handle_event(event, now());
                }

                _ = timer => self.run_due(now()),
            }
        }
        self.engine.disable(false);
    }

    fn schedule(&mut self, task: Task, delay: std::time::Duration, now: Instant) {
        self.tasks.schedule(task, Delay::After(delay), now);
    }

    #[instrument(name = "shell::handle_event", skip(self, now))]
    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Enable => {
                self.seen_first_window = false;
                self.engine.enable(false);
            }
            Event::Disable | Event::Shutdown => {
                self.tasks.cancel_all();
                self.engine.disable(false);
            }
            Event::SettingChanged(key) => {
                if self.engine.on_setting_changed(key) {
                    debug!(%key, "setting requires reset");
                    self.tasks.schedule(Task::Reset, Delay::Idle, now);
                }
            }
            Event::ConfigReloaded(config) => self.apply_config(&config),
            _ if !self.engine.is_enabled() => trace!("engine disabled; event dropped"),
            Event::MonitorsChanged => self.schedule(Task::Reset, self.timing.monitors_rebuild, now),
            Event::WorkareasChanged => {
                self.schedule(Task::WorkareaGeometry, self.timing.workarea_geometry, now)
            }
            Event::MonitorFocused(monitor) => {
                self.engine.set_focused_monitor(monitor);
            }
            Event::WorkspaceAdded | Event::WorkspaceRemoved => {
                self.schedule(Task::SyncWorkspaces, self.timing.workspace_sync, now)
            }
            Event::ActiveWorkspaceChanged => {
                self.tasks.schedule(Task::RefreshActive, Delay::Idle, now)
            }
            Event::WorkspaceRenamed => {
                for preview in self.engine.previews_mut() {
                    preview.refresh_labels();
                }
            }
            Event::WorkspaceWindowsChanged(index) => {
                self.schedule(Task::AppIcons(index), self.timing.app_icons, now)
            }
            Event::WindowCreated => {
                if !self.seen_first_window {
                    self.seen_first_window = true;
                    self.schedule(Task::FirstWindowRebuild, self.timing.first_window, now);
                }
            }
            Event::WindowDestroyed(window) => {
                self.engine.app_cache().evict(window);
            }
            Event::FocusChanged => {
                for preview in self.engine.previews_mut() {
                    preview.on_focus_changed();
                }
            }
            Event::PreviewAllocated(panel) => {
                self.schedule(Task::AllocationGeometry(panel), self.timing.allocation_geometry, now)
            }
            Event::Pointer { panel, event } => {
                if let Some(preview) = self.engine.preview_mut(panel) {
                    preview.handle_pointer(event);
                }
            }
            Event::Key { panel, key } => {
                if let Some(preview) = self.engine.preview_mut(panel) {
                    preview.handle_key(key);
                }
            }
            Event::Keybinding(action) => {
                if action == TOGGLE_INTELLIHIDE_ACTION {
                    self.engine.toggle_intellihide();
                } else {
                    debug!(%action, "unknown keybinding action");
                }
            }
            Event::ShortcutClicked { panel, slot, button } => {
                if let Some(preview) = self.engine.preview(panel) {
                    preview.shortcut_clicked(slot, button);
                }
            }
            Event::ShortcutChosen { panel, slot, app } => {
                if let Some(preview) = self.engine.preview(panel) {
                    preview.choose_shortcut(slot, app);
                }
            }
        }
    }

    /// Writes every changed value into the settings store. The store's
    /// change notifications then flow back in as `SettingChanged`.
    fn apply_config(&mut self, config: &Config) {
        if let Err(err) = config.validate() {
            warn!(%err, "ignoring invalid config");
            return;
        }
        self.timing = config.timing;
        let mut changed = 0;
        for (key, value) in config.to_settings() {
            if self.host.settings.get(key).as_ref() == Some(&value) {
                continue;
            }
            match self.host.settings.set(key, value) {
                Ok(()) => changed += 1,
                Err(err) => warn!(%err, "could not apply config value"),
            }
        }
        info!(changed, "config reloaded");
    }

    /// Runs every task whose deadline has passed.
    pub fn run_due(&mut self, now: Instant) {
        for task in self.tasks.take_due(now) {
            self.run_task(task, now);
        }
    }

    #[instrument(name = "shell::run_task", skip(self, now))]
    fn run_task(&mut self, task: Task, now: Instant) {
        match task {
            Task::Reset => {
                self.tasks.cancel_where(|t| matches!(t, Task::AllocationGeometry(_)));
                if self.tasks.cancel(&Task::SettleGeometry) {
                    trace!("settle pass superseded by reset");
                }
                self.engine.reset();
            }
            Task::SyncWorkspaces => {
                let mut changed = false;
                for preview in self.engine.previews_mut() {
                    changed |= preview.sync_items().changed();
                }
                if changed {
                    self.tasks.schedule_once(Task::SettleGeometry, Delay::Idle, now);
                }
            }
            Task::SettleGeometry => {
                for preview in self.engine.previews_mut() {
                    preview.on_allocation_changed();
                }
            }
            Task::RefreshActive => {
                for preview in self.engine.previews_mut() {
                    preview.refresh_active();
                }
            }
            Task::WorkareaGeometry => self.engine.on_workareas_changed(),
            Task::AllocationGeometry(panel) => {
                if let Some(preview) = self.engine.preview_mut(panel) {
                    preview.on_allocation_changed();
                }
            }
            Task::AppIcons(index) => {
                for preview in self.engine.previews_mut() {
                    preview.refresh_icons(index);
                }
            }
            Task::FirstWindowRebuild => {
                for preview in self.engine.previews_mut() {
                    preview.rebuild_all();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor;
    use crate::sys::fake::{ChromeCall, FakeHost, FakeRenderer};
    use crate::sys::geometry::Rect;
    use crate::sys::settings::{SettingValue, SettingsStore};

    fn shell(fake: &FakeHost) -> (Shell, Sender) {
        let (tx, rx) = actor::channel();
        let (broadcast, _) = actor::channel();
        (Shell::new(fake.host(), Timing::default(), tx.clone(), rx, broadcast), tx)
    }

    fn renderer(fake: &FakeHost) -> Rc<FakeRenderer> {
        let renderers = fake.chrome.renderers.borrow();
        renderers.values().next().cloned().unwrap()
    }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn workspace_bursts_coalesce_into_one_sync() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        let r = renderer(&fake);
        let created = r.created.get();

        fake.workspaces.push();
        shell.handle_event(Event::WorkspaceAdded, t0);
        fake.workspaces.push();
        shell.handle_event(Event::WorkspaceAdded, t0 + ms(60));
        assert_eq!(shell.tasks().len(), 1);

        shell.run_due(t0 + ms(120));
        assert_eq!(r.created.get(), created);
        shell.run_due(t0 + ms(160));
        assert_eq!(r.created.get(), created + 2);
        assert!(shell.tasks().is_pending(&Task::SettleGeometry));
        shell.run_due(t0 + ms(160));
        assert!(shell.tasks().is_empty());
    }

    #[test]
    fn settle_pass_keeps_its_first_deadline() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        fake.workspaces.push();
        shell.run_task(Task::SyncWorkspaces, t0);
        fake.workspaces.push();
        shell.run_task(Task::SyncWorkspaces, t0 + ms(40));
        assert_eq!(shell.tasks().len(), 1);
        assert_eq!(shell.tasks().next_deadline(), Some(t0));
    }

    #[test]
    fn reset_supersedes_pending_settle_pass() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        fake.workspaces.push();
        shell.run_task(Task::SyncWorkspaces, t0);
        assert!(shell.tasks().is_pending(&Task::SettleGeometry));
        shell.run_task(Task::Reset, t0);
        assert!(!shell.tasks().is_pending(&Task::SettleGeometry));
        assert!(shell.engine().is_enabled());
    }

    #[test]
    fn events_are_dropped_while_disabled() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::WorkspaceAdded, t0);
        shell.handle_event(Event::MonitorsChanged, t0);
        assert!(shell.tasks().is_empty());
    }

    #[test]
    fn disable_cancels_pending_work() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        shell.handle_event(Event::WorkareasChanged, t0);
        shell.handle_event(Event::WorkspaceWindowsChanged(0), t0);
        shell.handle_event(Event::Disable, t0);
        assert!(shell.tasks().is_empty());
        assert!(!shell.engine().is_enabled());
    }

    #[test]
    fn only_the_first_window_triggers_a_rebuild() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        shell.handle_event(Event::WindowCreated, t0);
        shell.run_due(t0 + ms(150));
        let r = renderer(&fake);
        let created = r.created.get();
        assert_eq!(created, 4);
        shell.handle_event(Event::WindowCreated, t0 + ms(200));
        assert!(shell.tasks().is_empty());
    }

    #[test]
    fn reset_setting_is_debounced_to_idle() {
        let fake = FakeHost::new(2, 1);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        fake.chrome.take_calls();
        let lengths = SettingValue::Str(r#"{"*":50}"#.into());
        fake.settings.set(SettingKey::PanelLengths, lengths).unwrap();
        shell.handle_event(Event::SettingChanged(SettingKey::PanelLengths), t0);
        shell.handle_event(Event::SettingChanged(SettingKey::PanelLengths), t0);
        shell.run_due(t0);
        let calls = fake.chrome.take_calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, ChromeCall::ReleaseNative(_))).count(), 1);
        let primary = shell.engine().primary_panel().unwrap();
        assert_eq!(primary.geometry.length_px, 540);
    }

    #[test]
    fn workarea_changes_reach_previews() {
        let fake = FakeHost::new(1, 2);
        let (mut shell, _tx) = shell(&fake);
        let t0 = Instant::now();
        shell.handle_event(Event::Enable, t0);
        let r = renderer(&fake);
        let pushes = r.geometry_pushes.get();
        fake.topology.set_work_area(0, Rect::new(0, 0, 1600, 1080));
        shell.handle_event(Event::WorkareasChanged, t0);
        shell.handle_event(Event::WorkareasChanged, t0 + ms(40));
        shell.run_due(t0 + ms(100));
        assert_eq!(r.geometry_pushes.get(), pushes);
        shell.run_due(t0 + ms(120));
        assert_eq!(r.geometry_pushes.get(), pushes + 2);
    }

    #[test]
    fn keybinding_toggles_intellihide() {
        let fake = FakeHost::new(1, 1);
        let (mut shell, _tx) = shell(&fake);
        shell.handle_event(Event::Enable, Instant::now());
        shell.handle_event(Event::Keybinding(TOGGLE_INTELLIHIDE_ACTION.into()), Instant::now());
        assert!(shell.engine().panels().all(|p| p.hidden));
    }

    #[test]
    fn window_destroy_evicts_cached_app() {
        let fake = FakeHost::new(1, 1);
        let (mut shell, _tx) = shell(&fake);
        shell.handle_event(Event::Enable, Instant::now());
        let window = fake.workspaces.add_window(0, 3, 0, None);
        fake.apps.assign(window, "a");
        shell.handle_event(Event::WorkspaceWindowsChanged(0), Instant::now());
        shell.run_due(Instant::now() + ms(100));
        assert_eq!(shell.engine().app_cache().len(), 1);
        shell.handle_event(Event::WindowDestroyed(window), Instant::now());
        assert!(shell.engine().app_cache().is_empty());
    }

    #[test]
    fn config_reload_writes_changed_settings() {
        let fake = FakeHost::new(1, 1);
        let (mut shell, _tx) = shell(&fake);
        let mut config = Config::default();
        config.preview.app_icon_size = 32;
        shell.handle_event(Event::ConfigReloaded(Box::new(config)), Instant::now());
        assert_eq!(fake.settings.get_int(SettingKey::AppIconSize), Some(32));
    }

    #[test]
    fn config_watch_needs_an_existing_directory() {
        let (tx, _rx) = actor::channel();
        let dir = tempfile::tempdir().unwrap();
        assert!(watch_config(dir.path().join("gone").join("config.toml"), tx).is_err());
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn actor_loop_fires_tasks_after_their_delay() {
        let fake = FakeHost::new(1, 3);
        let (shell, tx) = shell(&fake);
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let handle = tokio::task::spawn_local(shell.run());
                tx.send(Event::Enable);
                tokio::time::sleep(ms(1)).await;
                let r = renderer(&fake);
                assert_eq!(r.items.borrow().len(), 3);

                fake.workspaces.push();
                tx.send(Event::WorkspaceAdded);
                tx.send(Event::WorkspaceAdded);
                tokio::time::sleep(ms(50)).await;
                assert_eq!(r.items.borrow().len(), 3);
                tokio::time::sleep(ms(100)).await;
                assert_eq!(r.items.borrow().len(), 4);

                tx.send(Event::Shutdown);
                handle.await.unwrap();
                let released = fake.chrome.count(|c| matches!(c, ChromeCall::ReleaseNative(_)));
                assert_eq!(released, 1);
            })
            .await;
    }
}
