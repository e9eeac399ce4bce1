//! Request identity tracking for stale-response detection.
//!
//! Every outstanding request carries the tag it was issued with. A response
//! is applied only while its tag is still the pending tag of its slot;
//! issuing a newer request or invalidating the slot makes it stale.

use crate::filter::DiscoverQuery;

/// What a request was issued for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RequestKey {
    Trending { page: u32 },
    Search { query: String, page: u32 },
    Filter { query: DiscoverQuery },
    Genres,
    Detail { movie_id: u32 },
}

/// Identity of one outstanding request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RequestTag {
    seq: u64,
    key: RequestKey,
}

/// State slots that can have a request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Trending,
    Search,
    Filter,
    Genres,
    Detail,
}

impl Slot {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Slot::Trending => "trending",
            Slot::Search => "search",
            Slot::Filter => "filter",
            Slot::Genres => "genres",
            Slot::Detail => "detail",
        }
    }
}

/// Pending request per slot, plus the sequence counter.
#[derive(Debug, Default)]
pub(crate) struct PendingRequests {
    next_seq: u64,
    trending: Option<RequestTag>,
    search: Option<RequestTag>,
    filter: Option<RequestTag>,
    genres: Option<RequestTag>,
    detail: Option<RequestTag>,
}

impl PendingRequests {
    fn slot(&self, slot: Slot) -> &Option<RequestTag> {
        match slot {
            Slot::Trending => &self.trending,
            Slot::Search => &self.search,
            Slot::Filter => &self.filter,
            Slot::Genres => &self.genres,
            Slot::Detail => &self.detail,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<RequestTag> {
        match slot {
            Slot::Trending => &mut self.trending,
            Slot::Search => &mut self.search,
            Slot::Filter => &mut self.filter,
            Slot::Genres => &mut self.genres,
            Slot::Detail => &mut self.detail,
        }
    }

    /// Record a new request as the slot's current one, superseding any other.
    pub(crate) fn issue(&mut self, slot: Slot, key: RequestKey) -> RequestTag {
        self.next_seq += 1;
        let tag = RequestTag {
            seq: self.next_seq,
            key,
        };
        *self.slot_mut(slot) = Some(tag.clone());
        tag
    }

    /// Whether the slot has a request in flight.
    pub(crate) fn is_pending(&self, slot: Slot) -> bool {
        self.slot(slot).is_some()
    }

    /// Resolve a request. Returns `true` if it is still current (and clears
    /// the slot), `false` if it is stale.
    pub(crate) fn complete(&mut self, slot: Slot, tag: &RequestTag) -> bool {
        let pending = self.slot_mut(slot);
        if pending.as_ref() == Some(tag) {
            *pending = None;
            true
        } else {
            false
        }
    }

    /// Make whatever is in flight for the slot stale.
    pub(crate) fn invalidate(&mut self, slot: Slot) {
        *self.slot_mut(slot) = None;
    }
}
