//! Greedy price-level clustering
//!
//! Prices are visited in ascending order. Each one joins the first existing
//! cluster whose running mean lies within the relative tolerance, otherwise it
//! opens a new cluster. Clusters are never merged, split or re-ordered after
//! the fact, so the result depends only on the sorted input.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default relative tolerance for support/resistance zones (2%)
pub const DEFAULT_CLUSTER_TOLERANCE: Decimal = dec!(0.02);
/// Clusters with fewer members are discarded
pub const MIN_CLUSTER_MEMBERS: usize = 2;

/// A zone of nearby prices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCluster {
    /// Running mean of `members`
    pub price: Decimal,
    /// Member prices in the order they joined
    pub members: Vec<Decimal>,
}

impl LevelCluster {
    fn new(price: Decimal) -> Self {
        Self {
            price,
            members: vec![price],
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// `|price - representative| / representative <= tolerance`.
    ///
    /// A zero representative accepts nothing.
    #[inline]
    pub fn accepts(&self, price: Decimal, tolerance: Decimal) -> bool {
        (price - self.price)
            .abs()
            .checked_div(self.price)
            .is_some_and(|distance| distance <= tolerance)
    }

    fn push(&mut self, price: Decimal) {
        self.members.push(price);
        let sum: Decimal = self.members.iter().copied().sum();
        self.price = sum / Decimal::from(self.members.len());
    }
}

/// Clusterer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelClusterer {
    pub tolerance: Decimal,
    pub min_members: usize,
}

impl Default for LevelClusterer {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_CLUSTER_TOLERANCE,
            min_members: MIN_CLUSTER_MEMBERS,
        }
    }
}

impl LevelClusterer {
    pub fn new(tolerance: Decimal) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Cluster `prices` (any order) and drop clusters below `min_members`.
    pub fn cluster(&self, prices: &[Decimal]) -> Vec<LevelCluster> {
        let mut sorted = prices.to_vec();
        sorted.sort_unstable();

        let mut clusters: Vec<LevelCluster> = Vec::new();

        for price in sorted {
            match clusters
                .iter_mut()
                .find(|c| c.accepts(price, self.tolerance))
            {
                Some(cluster) => cluster.push(price),
                None => clusters.push(LevelCluster::new(price)),
            }
        }

        tracing::trace!(
            prices = prices.len(),
            clusters = clusters.len(),
            "clustered price levels"
        );

        clusters.retain(|c| c.count() >= self.min_members);
        clusters
    }
}

/// Cluster with the given tolerance, keeping clusters of at least two members.
pub fn cluster_levels(prices: &[Decimal], tolerance: Decimal) -> Vec<LevelCluster> {
    LevelClusterer::new(tolerance).cluster(prices)
}
