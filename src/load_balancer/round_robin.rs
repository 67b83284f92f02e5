//! Round-robin peer selection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Round-robin selector.
///
/// The cursor only ever moves forward. Each call takes a ticket with a single
/// `fetch_add`; concurrent callers are ordered by the order their increments
/// land, so no two callers start from the same ticket.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor value.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Return the next alive backend, scanning at most one full rotation.
    pub fn select<'a>(&self, backends: &'a [Arc<Backend>]) -> Option<&'a Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len();
        let ticket = self.cursor.fetch_add(1, Ordering::Relaxed);
        let start = (ticket % len as u64) as usize;

        for offset in 0..len {
            let backend = &backends[(start + offset) % len];
            if !backend.is_alive() {
                continue;
            }
            if offset > 0 {
                // Jump past the dead run so later callers start at the survivor's
                // successor. Losing the race means someone already moved further.
                let expected = ticket.wrapping_add(1);
                let _ = self.cursor.compare_exchange(
                    expected,
                    expected.wrapping_add(offset as u64),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                );
            }
            return Some(backend);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::tests::backend;

    fn ports(picks: &[Option<&Arc<Backend>>]) -> Vec<u16> {
        picks
            .iter()
            .map(|b| b.and_then(|b| b.url().port()).unwrap_or(0))
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = vec![backend(8080), backend(8081)];

        let picks: Vec<_> = (0..3).map(|_| lb.select(&backends)).collect();
        assert_eq!(ports(&picks), vec![8080, 8081, 8080]);
    }

    #[test]
    fn test_skips_dead_backend() {
        let lb = RoundRobin::new();
        let backends: Vec<_> = (6000..6005).map(backend).collect();
        backends[2].set_alive(false);

        let picks: Vec<_> = (0..5).map(|_| lb.select(&backends)).collect();
        assert_eq!(ports(&picks), vec![6000, 6001, 6003, 6004, 6000]);
    }

    #[test]
    fn test_cycles_every_pool_size() {
        for n in 1..=7u16 {
            let lb = RoundRobin::new();
            let backends: Vec<_> = (0..n).map(|i| backend(7000 + i)).collect();
            let picks: Vec<_> = (0..2 * n).map(|_| lb.select(&backends)).collect();
            let expected: Vec<u16> = (0..2 * n).map(|i| 7000 + i % n).collect();
            assert_eq!(ports(&picks), expected, "pool size {}", n);
        }
    }

    #[test]
    fn test_dead_backend_never_returned() {
        let lb = RoundRobin::new();
        let backends: Vec<_> = (6000..6004).map(backend).collect();
        backends[0].set_alive(false);
        backends[3].set_alive(false);

        for _ in 0..20 {
            let port = lb.select(&backends).and_then(|b| b.url().port());
            assert!(matches!(port, Some(6001) | Some(6002)));
        }

        backends[3].set_alive(true);
        let seen: Vec<_> = (0..6)
            .filter_map(|_| lb.select(&backends).and_then(|b| b.url().port()))
            .collect();
        assert!(seen.contains(&6003));
    }

    #[test]
    fn test_all_dead_returns_none() {
        let lb = RoundRobin::new();
        let backends: Vec<_> = (6000..6003).map(backend).collect();
        for b in &backends {
            b.set_alive(false);
        }
        assert!(lb.select(&backends).is_none());
        assert!(lb.select(&[]).is_none());
    }

    #[test]
    fn test_cursor_only_advances() {
        let lb = RoundRobin::new();
        let backends: Vec<_> = (6000..6005).map(backend).collect();
        backends[1].set_alive(false);
        backends[2].set_alive(false);

        let mut last = lb.cursor();
        for _ in 0..20 {
            lb.select(&backends);
            let now = lb.cursor();
            assert!(now > last);
            last = now;
        }
    }
}
