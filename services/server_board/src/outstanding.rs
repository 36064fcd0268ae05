use std::collections::HashMap;

use protocol::Seqno;
use repeater::Repeater;

/// A cached response plus the Repeater still retransmitting it.
pub struct OutstandingEntry {
    pub repeater: Repeater,
    pub response: Vec<u8>,
}

/// Maps `seqno -> OutstandingEntry` for the one bound client (spec.md §3).
/// Repeater ownership lives here, not in a back-pointer, per spec.md §9.
#[derive(Default)]
pub struct OutstandingTable {
    entries: HashMap<u32, OutstandingEntry>,
}

impl OutstandingTable {
    pub fn new() -> Self {
        OutstandingTable::default()
    }

    pub fn insert(&mut self, seqno: Seqno, entry: OutstandingEntry) {
        self.entries.insert(seqno.0, entry);
    }

    pub fn get_response(&self, seqno: Seqno) -> Option<Vec<u8>> {
        self.entries.get(&seqno.0).map(|e| e.response.clone())
    }

    /// Cancel and drop the entry for `seqno`, if any. Used both by real
    /// `ACK` handling and to retire a repeater before replacing it.
    pub fn remove(&mut self, seqno: Seqno) -> bool {
        match self.entries.remove(&seqno.0) {
            Some(entry) => {
                entry.repeater.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop every entry whose seqno predates `new_current` — the client has
    /// moved past them and will never `ACK` them.
    pub fn retain_from(&mut self, new_current: Seqno) {
        let stale: Vec<u32> = self
            .entries
            .keys()
            .copied()
            .filter(|&seqno| seqno < new_current.0)
            .collect();
        for seqno in stale {
            if let Some(entry) = self.entries.remove(&seqno) {
                entry.repeater.cancel();
            }
        }
    }

    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.repeater.cancel();
        }
    }
}
