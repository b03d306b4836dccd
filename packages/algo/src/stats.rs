//! Learned/total statistics, recomputed on demand

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::progress::ProgressStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Catalog words at or above the learned threshold
    pub learned: usize,
    /// Catalog size
    pub total: usize,
    /// `round(100 * learned / total)`, 0 for an empty catalog
    pub percent_learned: u32,
}

pub fn compute_stats(catalog: &Catalog, store: &ProgressStore, learned_threshold: u8) -> Stats {
    let total = catalog.len();
    let learned = catalog
        .words()
        .filter_map(|word| store.get(word))
        .filter(|record| record.is_learned(learned_threshold))
        .count();

    let percent_learned = if total > 0 {
        (100.0 * learned as f64 / total as f64).round() as u32
    } else {
        0
    };

    Stats {
        learned,
        total,
        percent_learned,
    }
}
