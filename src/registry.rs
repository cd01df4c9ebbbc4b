//! Client liveness registry.
//!
//! Maps each reporting client to the monotonic timestamp it was last heard
//! at. Entries are created on first contact and pruned when a client has
//! been silent for the eviction window. Owned exclusively by the server
//! engine and mutated only from its single loop.

use std::collections::HashMap;

use crate::wire::ClientId;

/// Per-client bookkeeping record.
#[derive(Debug, Clone, Copy)]
pub struct ClientRecord {
    last_heard_ns: u64,
}

impl ClientRecord {
    /// Monotonic timestamp of the last valid report from this client.
    #[must_use]
    pub const fn last_heard_ns(&self) -> u64 {
        self.last_heard_ns
    }
}

/// Registry of currently-tracked clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, ClientRecord>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a contact from `client` at monotonic time `now_ns`.
    ///
    /// Returns the inter-arrival delta since the previous contact, or
    /// `None` if this is the first contact (a new client has no prior
    /// timestamp, so it contributes no arrival-delta sample).
    pub fn observe(&mut self, client: ClientId, now_ns: u64) -> Option<u64> {
        match self.clients.get_mut(&client) {
            Some(record) => {
                let delta = now_ns - record.last_heard_ns;
                record.last_heard_ns = now_ns;
                Some(delta)
            }
            None => {
                self.clients.insert(
                    client,
                    ClientRecord {
                        last_heard_ns: now_ns,
                    },
                );
                None
            }
        }
    }

    /// Removes every client silent for at least `window_ns`.
    ///
    /// Returns the number of evicted clients.
    pub fn evict_stale(&mut self, now_ns: u64, window_ns: u64) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, record| now_ns - record.last_heard_ns < window_ns);
        before - self.clients.len()
    }

    /// Number of currently-tracked clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no clients are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Returns the record for `client`, if tracked.
    #[must_use]
    pub fn get(&self, client: ClientId) -> Option<&ClientRecord> {
        self.clients.get(&client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND_NS: u64 = 1_000_000_000;

    #[test]
    fn first_contact_inserts_without_delta() {
        let mut registry = ClientRegistry::new();
        let delta = registry.observe(ClientId(1), 5 * SECOND_NS);
        assert_eq!(delta, None);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(ClientId(1)).unwrap().last_heard_ns(),
            5 * SECOND_NS
        );
    }

    #[test]
    fn second_contact_yields_elapsed_delta() {
        let mut registry = ClientRegistry::new();
        registry.observe(ClientId(1), 0);
        let delta = registry.observe(ClientId(1), SECOND_NS);
        assert_eq!(delta, Some(SECOND_NS));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clients_are_tracked_independently() {
        let mut registry = ClientRegistry::new();
        registry.observe(ClientId(1), 0);
        registry.observe(ClientId(2), 10);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.observe(ClientId(1), 100), Some(100));
        assert_eq!(registry.observe(ClientId(2), 100), Some(90));
    }

    #[test]
    fn eviction_happens_at_window_not_before() {
        let window = 30 * SECOND_NS;
        let mut registry = ClientRegistry::new();
        registry.observe(ClientId(1), 0);

        assert_eq!(registry.evict_stale(window - 1, window), 0);
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.evict_stale(window, window), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn eviction_spares_active_clients() {
        let window = 30 * SECOND_NS;
        let mut registry = ClientRegistry::new();
        registry.observe(ClientId(1), 0);
        registry.observe(ClientId(2), 25 * SECOND_NS);

        assert_eq!(registry.evict_stale(40 * SECOND_NS, window), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(ClientId(2)).is_some());
        assert!(registry.get(ClientId(1)).is_none());
    }
}
