//! Candidate list construction.
//!
//! The [`Catalog`] holds everything the switcher knows about running items
//! between sessions: the latest item snapshot, the active item, the hidden
//! set and the MRU order.  [`Catalog::candidates`] turns that into the
//! ordered list one session works with:
//!
//! 1. hidden items are dropped,
//! 2. the rest are ordered by MRU rank,
//! 3. items the MRU order has never seen follow alphabetically,
//! 4. the active item is moved to the front.

use crate::item::{MruKey, Pid, RunningItem};
use crate::mru::MruOrder;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// One visible item with its precomputed sort keys.
struct Ranked<'a> {
    item: &'a RunningItem,
    rank: Option<usize>,
    folded_name: String,
}

/// Build the candidate list for a session.
///
/// Each pid appears at most once; the first occurrence in `items` wins.
/// Instances sharing one MRU key share its rank and keep their input order.
///
/// Runs in `O(items + order)`: every item key is derived once and the MRU
/// order is scanned once, however many stale keys it has accumulated.
pub fn build_candidates(
    items: &[RunningItem],
    active: Option<Pid>,
    order: &MruOrder,
    hidden: &HashSet<MruKey>,
) -> Vec<RunningItem> {
    let mut seen = HashSet::new();
    let visible: Vec<(MruKey, &RunningItem)> = items
        .iter()
        .filter(|item| seen.insert(item.pid))
        .map(|item| (item.mru_key(), item))
        .filter(|(key, _)| !hidden.contains(key))
        .collect();

    let mut ranks: HashMap<&MruKey, usize> = HashMap::with_capacity(visible.len());
    let wanted: HashSet<&MruKey> = visible.iter().map(|(key, _)| key).collect();
    for (rank, key) in order.keys().iter().enumerate() {
        if wanted.contains(key) {
            ranks.entry(key).or_insert(rank);
        }
    }

    let mut ranked: Vec<Ranked<'_>> = visible
        .iter()
        .map(|(key, item)| Ranked {
            item: *item,
            rank: ranks.get(key).copied(),
            folded_name: item.name.to_lowercase(),
        })
        .collect();
    ranked.sort_by(|a, b| match (a.rank, b.rank) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .folded_name
            .cmp(&b.folded_name)
            .then_with(|| a.item.pid.cmp(&b.item.pid)),
    });
    let mut ordered: Vec<RunningItem> = ranked.into_iter().map(|r| r.item.clone()).collect();

    if let Some(pid) = active {
        if let Some(pos) = ordered.iter().position(|item| item.pid == pid) {
            let item = ordered.remove(pos);
            ordered.insert(0, item);
        }
    }
    ordered
}

/// What the switcher knows about running items between sessions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<RunningItem>,
    active: Option<Pid>,
    order: MruOrder,
    hidden: HashSet<MruKey>,
}

impl Catalog {
    pub fn new(order: MruOrder, hidden: HashSet<MruKey>) -> Self {
        Self {
            order,
            hidden,
            ..Self::default()
        }
    }

    /// Replace the item snapshot and the active item.
    pub fn set_items(&mut self, items: Vec<RunningItem>, active: Option<Pid>) {
        self.items = items;
        self.active = active;
    }

    /// Record that `item` became the active item.
    ///
    /// Promotes its MRU key regardless of who activated it.
    pub fn activated(&mut self, item: &RunningItem) {
        self.active = Some(item.pid);
        self.order.promote(item.mru_key());
    }

    pub fn set_hidden(&mut self, hidden: HashSet<MruKey>) {
        self.hidden = hidden;
    }

    pub fn order(&self) -> &MruOrder {
        &self.order
    }

    pub fn items(&self) -> &[RunningItem] {
        &self.items
    }

    /// The ordered candidate list for a new session.
    pub fn candidates(&self) -> Vec<RunningItem> {
        build_candidates(&self.items, self.active, &self.order, &self.hidden)
    }
}
