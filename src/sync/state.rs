use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::common::{Notification, NotificationId, NotificationSnapshot, Page};

/// How incoming items are merged with the ones already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Prepend pushes and append pages unconditionally. A pushed item that
    /// shows up again in a later page is held twice.
    #[default]
    Append,
    /// Skip any incoming item whose id is already held.
    Dedupe,
}

/// Inverse of an optimistic read mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadUndo {
    generation: u64,
    count_epoch: u64,
    flipped: Vec<NotificationId>,
    decremented: u64,
}

impl ReadUndo {
    pub fn is_noop(&self) -> bool {
        self.flipped.is_empty() && self.decremented == 0
    }
}

/// Trạng thái danh sách thông báo: mới nhất ở đầu, kèm số chưa đọc.
///
/// Mọi thay đổi đi qua actor `NotificationSync`, nên struct này không cần khóa.
#[derive(Debug)]
pub struct NotificationState {
    notifications: VecDeque<Notification>,
    held_ids: HashSet<NotificationId>,
    unread_count: u64,
    pending_pages: u32,
    has_more: bool,
    current_page: u32,
    /// Bumped whenever page 0 replaces the list.
    generation: u64,
    /// Bumped whenever the server count replaces the local one.
    count_epoch: u64,
    /// Restored from cache and no live page 0 has arrived yet.
    restored: bool,
    policy: MergePolicy,
}

impl NotificationState {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            notifications: VecDeque::new(),
            held_ids: HashSet::new(),
            unread_count: 0,
            pending_pages: 0,
            has_more: true,
            current_page: 0,
            generation: 0,
            count_epoch: 0,
            restored: false,
            policy,
        }
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn is_loading(&self) -> bool {
        self.pending_pages > 0
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// A restored list has no page position, so paging waits for a live page 0.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading() && !self.restored
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            notifications: self.notifications.iter().cloned().collect(),
            unread_count: self.unread_count,
            is_loading: self.is_loading(),
            has_more: self.has_more,
            current_page: self.current_page,
        }
    }

    /// Seeds the list from a cached snapshot. Pagination starts over, so the
    /// next page 0 fetch replaces whatever was restored.
    pub fn hydrate(&mut self, notifications: Vec<Notification>, unread_count: u64) {
        self.held_ids = notifications
            .iter()
            .map(|notification| notification.notification_id.clone())
            .collect();
        self.notifications = notifications.into();
        self.unread_count = unread_count;
        self.restored = true;
    }

    pub fn begin_page_fetch(&mut self) {
        self.pending_pages += 1;
    }

    pub fn fail_page_fetch(&mut self) {
        self.pending_pages = self.pending_pages.saturating_sub(1);
    }

    /// Applies a fetched page and returns how many items were added.
    pub fn apply_page(&mut self, page_number: u32, page: Page<Notification>) -> usize {
        self.pending_pages = self.pending_pages.saturating_sub(1);
        self.has_more = page_number.saturating_add(1) < page.total_pages;
        self.current_page = page_number;

        if page_number == 0 {
            self.generation += 1;
            self.restored = false;
            self.notifications.clear();
            self.held_ids.clear();
        }

        let mut added = 0;
        for notification in page.content {
            if self.policy == MergePolicy::Dedupe
                && self.held_ids.contains(&notification.notification_id)
            {
                continue;
            }
            self.held_ids.insert(notification.notification_id.clone());
            self.notifications.push_back(notification);
            added += 1;
        }
        added
    }

    /// Replaces the count with the server's figure. Pending undos stop
    /// touching the count from here on.
    pub fn set_unread_count(&mut self, count: u64) {
        self.unread_count = count;
        self.count_epoch += 1;
    }

    /// Prepends a pushed notification and bumps the unread count by one.
    /// Returns `false` when the dedupe policy dropped it.
    pub fn push(&mut self, notification: Notification) -> bool {
        if self.policy == MergePolicy::Dedupe
            && self.held_ids.contains(&notification.notification_id)
        {
            return false;
        }
        self.held_ids.insert(notification.notification_id.clone());
        self.notifications.push_front(notification);
        self.unread_count += 1;
        true
    }

    /// Optimistically marks `id` as read.
    ///
    /// An item that is held and already read leaves the count alone. An id that
    /// is not held still decrements, since the server count covers items outside
    /// the loaded pages. The count never goes below zero.
    pub fn mark_read(&mut self, id: &NotificationId) -> ReadUndo {
        let mut held = false;
        let mut flipped = false;
        for notification in self
            .notifications
            .iter_mut()
            .filter(|notification| &notification.notification_id == id)
        {
            held = true;
            if !notification.read {
                notification.read = true;
                flipped = true;
            }
        }

        let decremented = if (flipped || !held) && self.unread_count > 0 {
            self.unread_count -= 1;
            1
        } else {
            0
        };

        ReadUndo {
            generation: self.generation,
            count_epoch: self.count_epoch,
            flipped: if flipped { vec![id.clone()] } else { Vec::new() },
            decremented,
        }
    }

    pub fn mark_all_read(&mut self) -> ReadUndo {
        let mut flipped = Vec::new();
        for notification in self.notifications.iter_mut() {
            if !notification.read {
                notification.read = true;
                flipped.push(notification.notification_id.clone());
            }
        }
        let decremented = std::mem::take(&mut self.unread_count);
        ReadUndo {
            generation: self.generation,
            count_epoch: self.count_epoch,
            flipped,
            decremented,
        }
    }

    /// Re-applies the inverse of a failed mutation. Returns `false` when page 0
    /// has replaced the list since, in which case server truth wins and nothing
    /// is touched. A server count received after the mutation already excludes
    /// it, so only the read flags are restored then.
    pub fn rollback(&mut self, undo: ReadUndo) -> bool {
        if undo.generation != self.generation {
            return false;
        }
        let flipped: HashSet<NotificationId> = undo.flipped.into_iter().collect();
        for notification in self.notifications.iter_mut() {
            if flipped.contains(&notification.notification_id) {
                notification.read = false;
            }
        }
        if undo.count_epoch == self.count_epoch {
            self.unread_count += undo.decremented;
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::common::{Id, NotificationType};
    use chrono::{TimeZone, Utc};

    pub(crate) fn notification(id: &str, read: bool) -> Notification {
        Notification {
            notification_id: Id::from(id),
            receiver: None,
            sender: None,
            kind: NotificationType::PostLike,
            content: format!("notification {id}"),
            related_id: None,
            read,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    fn page(ids: &[&str], total_pages: u32) -> Page<Notification> {
        Page {
            content: ids.iter().map(|id| notification(id, false)).collect(),
            total_pages,
            total_elements: 0,
            number: 0,
            size: ids.len() as u32,
        }
    }

    fn ids(state: &NotificationState) -> Vec<String> {
        state
            .notifications()
            .map(|notification| notification.notification_id.to_string())
            .collect()
    }

    #[test]
    fn initial_state() {
        let state = NotificationState::new(MergePolicy::Append);
        assert!(state.is_empty());
        assert_eq!(state.unread_count(), 0);
        assert!(state.has_more());
        assert!(!state.is_loading());
        assert_eq!(state.current_page(), 0);
    }

    #[test]
    fn first_page_of_three() {
        let mut state = NotificationState::new(MergePolicy::Append);
        let names: Vec<String> = (0..10).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        state.begin_page_fetch();
        assert!(state.is_loading());
        state.apply_page(0, page(&refs, 3));

        assert!(state.has_more());
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.len(), 10);
        assert!(!state.is_loading());
    }

    #[test]
    fn page_zero_replaces() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a", "b"], 2));
        state.apply_page(1, page(&["c"], 2));
        state.apply_page(0, page(&["x"], 1));

        assert_eq!(ids(&state), vec!["x"]);
        assert!(!state.has_more());
    }

    #[test]
    fn later_pages_append_in_order() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a", "b"], 3));
        let before = state.len();
        let added = state.apply_page(1, page(&["c", "d", "e"], 3));

        assert_eq!(added, 3);
        assert_eq!(state.len(), before + 3);
        assert_eq!(ids(&state), vec!["a", "b", "c", "d", "e"]);
        assert!(state.has_more());

        state.apply_page(2, page(&["f"], 3));
        assert!(!state.has_more());
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn empty_result_has_no_more() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&[], 0));
        assert!(!state.has_more());
        assert!(!state.can_load_more());
    }

    #[test]
    fn failed_fetch_keeps_list() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a"], 2));
        state.begin_page_fetch();
        assert!(!state.can_load_more());
        state.fail_page_fetch();

        assert_eq!(ids(&state), vec!["a"]);
        assert!(state.can_load_more());
    }

    #[test]
    fn push_prepends_and_counts() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a", "b"], 1));
        state.set_unread_count(5);

        assert!(state.push(notification("p", false)));
        assert_eq!(ids(&state)[0], "p");
        assert_eq!(state.unread_count(), 6);
    }

    #[test]
    fn append_policy_keeps_duplicate_from_later_page() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a"], 2));
        state.push(notification("x", false));
        state.apply_page(1, page(&["x", "b"], 2));

        assert_eq!(ids(&state), vec!["x", "a", "x", "b"]);
    }

    #[test]
    fn dedupe_policy_skips_held_ids() {
        let mut state = NotificationState::new(MergePolicy::Dedupe);
        state.apply_page(0, page(&["a"], 2));
        state.push(notification("x", false));
        let added = state.apply_page(1, page(&["x", "b"], 2));

        assert_eq!(added, 1);
        assert_eq!(ids(&state), vec!["x", "a", "b"]);

        let count = state.unread_count();
        assert!(!state.push(notification("a", false)));
        assert_eq!(state.unread_count(), count);
    }

    #[test]
    fn mark_read_twice_decrements_once() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a", "b"], 1));
        state.set_unread_count(2);

        state.mark_read(&Id::from("a"));
        assert_eq!(state.unread_count(), 1);
        let second = state.mark_read(&Id::from("a"));
        assert_eq!(state.unread_count(), 1);
        assert!(second.is_noop());
        assert!(state.notifications().next().unwrap().read);
    }

    #[test]
    fn mark_read_floors_at_zero() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a"], 1));
        state.set_unread_count(0);

        let undo = state.mark_read(&Id::from("a"));
        assert_eq!(state.unread_count(), 0);
        state.mark_read(&Id::from("elsewhere"));
        assert_eq!(state.unread_count(), 0);
        assert_eq!(undo.decremented, 0);
    }

    #[test]
    fn mark_read_of_unloaded_item_still_decrements() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a"], 4));
        state.set_unread_count(12);

        state.mark_read(&Id::from("on-page-3"));
        assert_eq!(state.unread_count(), 11);
    }

    #[test]
    fn mark_all_read_zeroes_everything() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a", "b", "c"], 1));
        state.push(notification("d", true));
        state.set_unread_count(40);

        state.mark_all_read();
        assert_eq!(state.unread_count(), 0);
        assert!(state.notifications().all(|notification| notification.read));
    }

    #[test]
    fn rollback_restores_flags_and_count() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a", "b"], 1));
        state.set_unread_count(7);
        let undo = state.mark_all_read();

        assert!(state.rollback(undo));
        assert_eq!(state.unread_count(), 7);
        assert!(state.notifications().all(|notification| !notification.read));
    }

    #[test]
    fn rollback_leaves_already_read_items_alone() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(
            0,
            Page {
                content: vec![notification("a", true), notification("b", false)],
                total_pages: 1,
                total_elements: 2,
                number: 0,
                size: 10,
            },
        );
        state.set_unread_count(1);
        let undo = state.mark_all_read();
        state.rollback(undo);

        let read: Vec<bool> = state.notifications().map(|n| n.read).collect();
        assert_eq!(read, vec![true, false]);
        assert_eq!(state.unread_count(), 1);
    }

    #[test]
    fn rollback_after_refetch_is_skipped() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a"], 1));
        state.set_unread_count(1);
        let undo = state.mark_read(&Id::from("a"));

        state.apply_page(0, page(&["a"], 1));
        state.set_unread_count(1);
        assert!(!state.rollback(undo));
        assert_eq!(state.unread_count(), 1);
    }

    #[test]
    fn rollback_after_server_count_keeps_count() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(0, page(&["a"], 1));
        state.set_unread_count(5);
        let undo = state.mark_read(&Id::from("a"));
        assert_eq!(state.unread_count(), 4);

        state.set_unread_count(5);
        assert!(state.rollback(undo));
        assert_eq!(state.unread_count(), 5);
        assert!(!state.notifications().next().unwrap().read);
    }

    #[test]
    fn last_representable_page_does_not_overflow() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.apply_page(u32::MAX, page(&["a"], 3));

        assert!(!state.has_more());
        assert_eq!(state.current_page(), u32::MAX);
        assert!(!state.can_load_more());
    }

    #[test]
    fn hydrate_restores_cached_view() {
        let mut state = NotificationState::new(MergePolicy::Dedupe);
        state.hydrate(vec![notification("a", false), notification("b", true)], 3);

        assert_eq!(state.unread_count(), 3);
        assert!(!state.push(notification("b", false)));
        assert!(state.has_more());
    }

    #[test]
    fn restored_list_waits_for_live_first_page() {
        let mut state = NotificationState::new(MergePolicy::Append);
        state.hydrate(vec![notification("a", false), notification("b", false)], 2);
        assert!(!state.can_load_more());

        state.begin_page_fetch();
        state.fail_page_fetch();
        assert!(!state.can_load_more());

        state.apply_page(0, page(&["x"], 2));
        assert!(state.can_load_more());
        assert_eq!(ids(&state), vec!["x"]);
    }
}
