use tracing::{debug, warn};

use crate::layout_engine::preview_size::SHORTCUT_SLOTS;
use crate::sys::settings::{SettingKey, SettingValue, SettingsStore};
use crate::sys::shell::AppSystem;
use crate::sys::workspace::AppId;

pub type Slots = [Option<AppId>; SHORTCUT_SLOTS];

fn to_slots(ids: Vec<String>) -> Slots {
    let mut slots: Slots = Default::default();
    for (slot, id) in slots.iter_mut().zip(ids) {
        *slot = Some(id).filter(|s| !s.is_empty());
    }
    slots
}

fn to_strv(slots: &Slots) -> Vec<String> {
    slots.iter().map(|s| s.clone().unwrap_or_default()).collect()
}

fn persist(settings: &dyn SettingsStore, slots: &Slots) {
    let value = SettingValue::StrList(to_strv(slots));
    if let Err(err) = settings.set(SettingKey::ShortcutApps, value) {
        warn!(%err, "could not store shortcut slots");
    }
}

/// Reads the five slots, padding or truncating the stored list.
///
/// When every slot is empty the first favorites are copied in and stored,
/// after which the slots no longer follow the favorites.
pub fn load(settings: &dyn SettingsStore, apps: &dyn AppSystem) -> Slots {
    let slots = to_slots(settings.get_strv(SettingKey::ShortcutApps));
    if slots.iter().any(Option::is_some) {
        return slots;
    }
    let favorites: Vec<AppId> =
        apps.favorites().into_iter().filter(|f| !f.is_empty()).take(SHORTCUT_SLOTS).collect();
    if favorites.is_empty() {
        return slots;
    }
    let seeded = to_slots(favorites);
    debug!(?seeded, "seeded shortcut slots from favorites");
    persist(settings, &seeded);
    seeded
}

pub fn set_slot(
    settings: &dyn SettingsStore,
    apps: &dyn AppSystem,
    index: usize,
    app: Option<AppId>,
) {
    if index >= SHORTCUT_SLOTS {
        return;
    }
    let mut slots = load(settings, apps);
    slots[index] = app.filter(|a| !a.is_empty());
    persist(settings, &slots);
}

pub fn clear_slot(settings: &dyn SettingsStore, apps: &dyn AppSystem, index: usize) {
    set_slot(settings, apps, index, None);
}
