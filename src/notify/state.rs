//! Notification state: live records, id allocation and their timers.
//!
//! The store owns the timeout scheduler so a record and its timer always
//! change together. A record holds an armed timer exactly when it has a
//! timeout and is not hovered.

use std::collections::btree_map::{self, BTreeMap};
use std::time::Duration;

use tokio::time::Instant;

use super::timeout::{TimeoutScheduler, TimerToken};

/// Notification id as used on the wire.
pub type NotificationId = u32;

/// One live notification.
#[derive(Debug)]
pub struct NotificationRecord<P> {
    pub id: NotificationId,
    /// Popup resource, owned exclusively by this record
    pub popup: P,
    /// Configured expiry; `None` never expires
    pub timeout: Option<Duration>,
    /// Armed countdown, if any
    pub timer: Option<TimerToken>,
    pub hovered: bool,
    /// Action keys, indexed by the popup's action affordances
    pub actions: Vec<String>,
}

impl<P> NotificationRecord<P> {
    fn new(id: NotificationId, popup: P) -> Self {
        Self {
            id,
            popup,
            timeout: None,
            timer: None,
            hovered: false,
            actions: Vec::new(),
        }
    }

    /// Action key behind an action affordance.
    pub fn action_key(&self, index: usize) -> Option<&str> {
        self.actions.get(index).map(String::as_str)
    }
}

/// Creates or repaints the popup resource during [`NotificationStore::upsert`].
pub trait PopupBuilder<P> {
    type Error;

    /// Allocate a new popup for a record that did not exist.
    fn create(&mut self, id: NotificationId) -> Result<P, Self::Error>;

    /// Repaint an existing popup with new content.
    fn update(&mut self, popup: &mut P) -> Result<(), Self::Error>;
}

/// Authoritative mapping id → notification record.
#[derive(Debug)]
pub struct NotificationStore<P> {
    records: BTreeMap<NotificationId, NotificationRecord<P>>,
    timers: TimeoutScheduler,
    /// Last id handed out by `allocate_id`
    last_id: NotificationId,
}

impl<P> Default for NotificationStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> NotificationStore<P> {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            timers: TimeoutScheduler::new(),
            last_id: 0,
        }
    }

    /// Hand out a fresh id, greater than any id allocated before.
    ///
    /// Ids held by live records (including caller-chosen ones) are skipped.
    /// Once the id space runs out the counter wraps around past 0.
    pub fn allocate_id(&mut self) -> NotificationId {
        loop {
            self.last_id = self.last_id.wrapping_add(1);
            if self.last_id != 0 && !self.records.contains_key(&self.last_id) {
                return self.last_id;
            }
        }
    }

    /// Create the record for `id`, or repaint it in place if it exists.
    ///
    /// The popup of an existing record is reused, never recreated.
    pub fn upsert<B>(
        &mut self,
        id: NotificationId,
        builder: &mut B,
    ) -> Result<&mut NotificationRecord<P>, B::Error>
    where
        B: PopupBuilder<P>,
    {
        match self.records.entry(id) {
            btree_map::Entry::Occupied(entry) => {
                let record = entry.into_mut();
                builder.update(&mut record.popup)?;
                Ok(record)
            }
            btree_map::Entry::Vacant(entry) => {
                let popup = builder.create(id)?;
                Ok(entry.insert(NotificationRecord::new(id, popup)))
            }
        }
    }

    /// Remove a record, cancelling its timer. `None` if absent.
    pub fn remove(&mut self, id: NotificationId) -> Option<NotificationRecord<P>> {
        let mut record = self.records.remove(&id)?;
        self.timers.stop(id);
        record.timer = None;
        Some(record)
    }

    /// Remove every record, cancelling all timers.
    pub fn drain(&mut self) -> Vec<NotificationRecord<P>> {
        let ids: Vec<NotificationId> = self.records.keys().copied().collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationRecord<P>> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.records.contains_key(&id)
    }

    /// Visit every live record in id order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&NotificationRecord<P>),
    {
        self.records.values().for_each(|record| f(record));
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NotificationRecord<P>> {
        self.records.values_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ── Timers ──────────────────────────────────────────────────────────

    /// Replace the configured timeout and restart the countdown from `now`.
    ///
    /// A hovered record keeps its timer stopped until the pointer leaves.
    pub fn set_timeout(&mut self, id: NotificationId, timeout: Option<Duration>, now: Instant) {
        if let Some(record) = self.records.get_mut(&id) {
            record.timeout = timeout;
            Self::rearm(&mut self.timers, record, now);
        }
    }

    /// Pointer entered the popup: pause the countdown.
    pub fn hover_enter(&mut self, id: NotificationId) {
        if let Some(record) = self.records.get_mut(&id) {
            record.hovered = true;
            self.timers.stop(id);
            record.timer = None;
        }
    }

    /// Pointer left the popup: restart the full configured countdown.
    pub fn hover_leave(&mut self, id: NotificationId, now: Instant) {
        if let Some(record) = self.records.get_mut(&id) {
            record.hovered = false;
            Self::rearm(&mut self.timers, record, now);
        }
    }

    fn rearm(timers: &mut TimeoutScheduler, record: &mut NotificationRecord<P>, now: Instant) {
        timers.stop(record.id);
        record.timer = match record.timeout {
            Some(duration) if !record.hovered => Some(timers.start(record.id, duration, now)),
            _ => None,
        };
    }

    /// Earliest pending expiry.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// When the timer of `id` fires, if armed.
    pub fn deadline(&self, id: NotificationId) -> Option<Instant> {
        self.timers.deadline(id)
    }

    /// Collect notifications whose timers ran out by `now`. Their timers are
    /// disarmed; the records stay until the caller removes them.
    pub fn expire(&mut self, now: Instant) -> Vec<NotificationId> {
        let fired = self.timers.expire(now);
        for id in &fired {
            if let Some(record) = self.records.get_mut(id) {
                record.timer = None;
            }
        }
        fired
    }
}
