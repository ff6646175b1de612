//! Nearest-Branch Locator
//!
//! Resolves which physical branch serves an order. The fallback policy
//! is an explicit ordered list of strategies, tried in sequence:
//!
//! 1. [`DistanceStrategy`] — rank branches by reported travel distance
//! 2. [`CityTextStrategy`] — textual city match against the directory
//!
//! Every strategy returns an `Option`; the chain returning `None` means
//! the order lands in the default partition. Locator failures are logged
//! and never abort order creation.

use crate::db::models::Branch;
use crate::services::DistanceProvider;
use async_trait::async_trait;
use shared::types::Coordinates;
use std::sync::Arc;

/// A resolved serving branch
#[derive(Debug, Clone, PartialEq)]
pub struct BranchMatch {
    pub name: String,
    pub city: String,
    pub coordinates: Option<Coordinates>,
}

impl From<&Branch> for BranchMatch {
    fn from(branch: &Branch) -> Self {
        Self {
            name: branch.name.clone(),
            city: branch.city.clone(),
            coordinates: branch.coordinates,
        }
    }
}

/// Inputs available to the strategies
pub struct LocateContext<'a> {
    pub coordinates: Option<Coordinates>,
    /// Resolved city text (may be empty)
    pub city: &'a str,
    /// Branch Directory snapshot, in directory iteration order
    pub branches: &'a [Branch],
}

/// One resolution attempt in the fallback chain
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn resolve(&self, ctx: &LocateContext<'_>) -> Option<BranchMatch>;
}

/// Rank all branches-with-coordinates by reported travel distance from
/// the customer. Smallest valid distance wins, ties broken by position
/// in the destinations list. Any upstream failure yields `None`.
pub struct DistanceStrategy {
    provider: Arc<dyn DistanceProvider>,
}

impl DistanceStrategy {
    pub fn new(provider: Arc<dyn DistanceProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ResolveStrategy for DistanceStrategy {
    fn name(&self) -> &'static str {
        "distance"
    }

    async fn resolve(&self, ctx: &LocateContext<'_>) -> Option<BranchMatch> {
        let origin = ctx.coordinates?;

        let candidates: Vec<&Branch> = ctx
            .branches
            .iter()
            .filter(|b| b.coordinates.is_some())
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let destinations: Vec<Coordinates> = candidates
            .iter()
            .filter_map(|b| b.coordinates)
            .collect();

        let elements = match self.provider.travel_distances(origin, &destinations).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!(target: "locator", error = %e, "distance lookup failed, falling through");
                return None;
            }
        };

        candidates
            .iter()
            .zip(elements)
            .filter(|(_, element)| element.ok)
            .min_by_key(|(_, element)| element.meters)
            .map(|(branch, _)| BranchMatch::from(*branch))
    }
}

/// Match the resolved city text against directory cities: exact first,
/// then substring containment in either direction. First match wins, in
/// directory iteration order.
pub struct CityTextStrategy;

#[async_trait]
impl ResolveStrategy for CityTextStrategy {
    fn name(&self) -> &'static str {
        "city-text"
    }

    async fn resolve(&self, ctx: &LocateContext<'_>) -> Option<BranchMatch> {
        let needle = ctx.city.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(branch) = ctx
            .branches
            .iter()
            .find(|b| b.city.trim().to_lowercase() == needle)
        {
            return Some(BranchMatch::from(branch));
        }

        ctx.branches
            .iter()
            .find(|b| {
                let city = b.city.trim().to_lowercase();
                !city.is_empty() && (city.contains(&needle) || needle.contains(&city))
            })
            .map(BranchMatch::from)
    }
}

/// The locator itself: owns the ordered strategy chain
pub struct BranchLocator {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl BranchLocator {
    pub fn new(provider: Arc<dyn DistanceProvider>) -> Self {
        Self {
            strategies: vec![
                Box::new(DistanceStrategy::new(provider)),
                Box::new(CityTextStrategy),
            ],
        }
    }

    /// Try each strategy in order; first hit wins.
    pub async fn locate(&self, ctx: &LocateContext<'_>) -> Option<BranchMatch> {
        for strategy in &self.strategies {
            if let Some(found) = strategy.resolve(ctx).await {
                tracing::debug!(target: "locator", strategy = strategy.name(), branch = %found.name, "branch resolved");
                return Some(found);
            }
        }
        tracing::debug!(target: "locator", "no branch resolved, using default partition");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{DistanceElement, DistanceError};

    fn branch(name: &str, city: &str, coordinates: Option<Coordinates>) -> Branch {
        Branch {
            id: None,
            name: name.to_string(),
            city: city.to_string(),
            street: None,
            postal_code: None,
            coordinates,
            slug: crate::orders::shard::normalize_city(city),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Provider returning a fixed element list, or failing outright
    struct StubProvider {
        result: Result<Vec<DistanceElement>, ()>,
    }

    #[async_trait]
    impl DistanceProvider for StubProvider {
        async fn travel_distances(
            &self,
            _origin: Coordinates,
            _destinations: &[Coordinates],
        ) -> Result<Vec<DistanceElement>, DistanceError> {
            self.result
                .clone()
                .map_err(|_| DistanceError::Upstream("stub failure".to_string()))
        }
    }

    fn directory() -> Vec<Branch> {
        vec![
            branch("Campbell River", "Campbell River", Some(Coordinates::new(50.02, -125.24))),
            branch("Tofino", "Tofino", Some(Coordinates::new(49.15, -125.91))),
            branch("Ucluelet", "Ucluelet", None),
        ]
    }

    #[tokio::test]
    async fn distance_picks_smallest_valid_element() {
        let provider = Arc::new(StubProvider {
            result: Ok(vec![
                DistanceElement { ok: true, meters: 42_000 },
                DistanceElement { ok: true, meters: 3_000 },
            ]),
        });
        let locator = BranchLocator::new(provider);
        let branches = directory();
        let ctx = LocateContext {
            coordinates: Some(Coordinates::new(49.2, -125.9)),
            city: "",
            branches: &branches,
        };
        let found = locator.locate(&ctx).await.unwrap();
        assert_eq!(found.name, "Tofino");
    }

    #[tokio::test]
    async fn invalid_elements_are_skipped() {
        let provider = Arc::new(StubProvider {
            result: Ok(vec![
                DistanceElement { ok: false, meters: 0 },
                DistanceElement { ok: true, meters: 80_000 },
            ]),
        });
        let locator = BranchLocator::new(provider);
        let branches = directory();
        let ctx = LocateContext {
            coordinates: Some(Coordinates::new(49.2, -125.9)),
            city: "",
            branches: &branches,
        };
        let found = locator.locate(&ctx).await.unwrap();
        assert_eq!(found.name, "Tofino");
    }

    #[tokio::test]
    async fn distance_failure_falls_back_to_city_text() {
        let provider = Arc::new(StubProvider { result: Err(()) });
        let locator = BranchLocator::new(provider);
        let branches = directory();
        let ctx = LocateContext {
            coordinates: Some(Coordinates::new(49.2, -125.9)),
            city: "tofino",
            branches: &branches,
        };
        let found = locator.locate(&ctx).await.unwrap();
        assert_eq!(found.name, "Tofino");
    }

    #[tokio::test]
    async fn city_text_matches_exactly_before_substring() {
        let locator = BranchLocator::new(Arc::new(StubProvider { result: Err(()) }));
        let branches = vec![
            branch("River District", "Campbell River", None),
            branch("River", "River", None),
        ];
        let ctx = LocateContext {
            coordinates: None,
            city: "river",
            branches: &branches,
        };
        let found = locator.locate(&ctx).await.unwrap();
        assert_eq!(found.name, "River");
    }

    #[tokio::test]
    async fn city_text_substring_matches_either_direction() {
        let locator = BranchLocator::new(Arc::new(StubProvider { result: Err(()) }));
        let branches = directory();
        // needle contained in directory city
        let ctx = LocateContext {
            coordinates: None,
            city: "campbell",
            branches: &branches,
        };
        assert_eq!(locator.locate(&ctx).await.unwrap().name, "Campbell River");
        // directory city contained in needle
        let ctx = LocateContext {
            coordinates: None,
            city: "tofino bc canada",
            branches: &branches,
        };
        assert_eq!(locator.locate(&ctx).await.unwrap().name, "Tofino");
    }

    #[tokio::test]
    async fn exhausted_chain_returns_none() {
        let locator = BranchLocator::new(Arc::new(StubProvider { result: Err(()) }));
        let branches = directory();
        let ctx = LocateContext {
            coordinates: None,
            city: "winnipeg",
            branches: &branches,
        };
        assert!(locator.locate(&ctx).await.is_none());
    }
}
