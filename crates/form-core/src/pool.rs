//! Bounded score-ordered beam of exemplars.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::{codes, ErrorInfo, FormError};
use crate::exemplar::Exemplar;

/// Pool ordering: evaluation descending, unscored last, then id ascending.
pub fn pool_order(a: &Exemplar, b: &Exemplar) -> Ordering {
    let by_score = match (a.evaluation(), b.evaluation()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_score.then_with(|| a.id().cmp(&b.id()))
}

/// Bounded container kept sorted by [`pool_order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemplarsPool {
    capacity: Option<usize>,
    entries: Vec<Exemplar>,
}

impl ExemplarsPool {
    /// Creates a pool holding at most `capacity` exemplars; `None` is unbounded.
    pub fn new(capacity: Option<usize>) -> Result<Self, FormError> {
        if capacity == Some(0) {
            return Err(FormError::Config(
                ErrorInfo::new(codes::CONFIG, "pool capacity must be positive")
                    .with_context("max_pool_size", "0"),
            ));
        }
        Ok(Self {
            capacity,
            entries: Vec::new(),
        })
    }

    /// Creates an unbounded pool.
    pub fn unbounded() -> Self {
        Self {
            capacity: None,
            entries: Vec::new(),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Inserts an exemplar at its sorted position.
    ///
    /// Returns the evicted exemplar when the pool overflows; this may be the
    /// inserted exemplar itself.
    pub fn insert(&mut self, exemplar: Exemplar) -> Option<Exemplar> {
        let at = self
            .entries
            .partition_point(|held| pool_order(held, &exemplar) == Ordering::Less);
        self.entries.insert(at, exemplar);
        match self.capacity {
            Some(cap) if self.entries.len() > cap => self.entries.pop(),
            _ => None,
        }
    }

    /// Number of held exemplars.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best exemplar.
    pub fn best(&self) -> Option<&Exemplar> {
        self.entries.first()
    }

    /// Prefix of at most `n` best exemplars.
    pub fn top_n(&self, n: usize) -> &[Exemplar] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Exemplars in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &Exemplar> {
        self.entries.iter()
    }

    /// Removes and returns every exemplar in pool order.
    pub fn drain(&mut self) -> Vec<Exemplar> {
        std::mem::take(&mut self.entries)
    }

    /// Consumes the pool.
    pub fn into_vec(self) -> Vec<Exemplar> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ExemplarId;
    use crate::signal::Signal;

    fn scored(id: u64, score: Option<f64>) -> Exemplar {
        let signal = Signal::new(vec![0.0; 4], 10.0).unwrap();
        let mut ex = Exemplar::new(ExemplarId::from_raw(id), signal);
        ex.set_evaluation(score).unwrap();
        ex
    }

    #[test]
    fn unscored_sort_last_and_ties_by_id() {
        let mut pool = ExemplarsPool::unbounded();
        pool.insert(scored(3, None));
        pool.insert(scored(2, Some(0.5)));
        pool.insert(scored(1, Some(0.5)));
        pool.insert(scored(4, Some(0.9)));
        let ids: Vec<u64> = pool.iter().map(|ex| ex.id().as_raw()).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[test]
    fn overflow_evicts_the_worst() {
        let mut pool = ExemplarsPool::new(Some(2)).unwrap();
        assert!(pool.insert(scored(1, Some(0.1))).is_none());
        assert!(pool.insert(scored(2, Some(0.8))).is_none());
        let evicted = pool.insert(scored(3, Some(0.5))).unwrap();
        assert_eq!(evicted.id().as_raw(), 1);
        let evicted = pool.insert(scored(4, Some(0.2))).unwrap();
        assert_eq!(evicted.id().as_raw(), 4);
        assert_eq!(pool.top_n(5).len(), 2);
        assert_eq!(pool.best().unwrap().id().as_raw(), 2);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(ExemplarsPool::new(Some(0)).is_err());
    }
}
