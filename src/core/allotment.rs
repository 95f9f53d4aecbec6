//! Allotted-minutes calculation for a job.
//!
//! The tier table describes a two-person team; the team-size adjustment
//! scales that baseline. Everything here is pure: the tiers and the default
//! are loaded once by the caller and handed in.

use crate::db::reference::load_tiers;
use crate::db::settings::default_allotted_minutes;
use crate::errors::AppResult;
use crate::models::reference::{Customer, PriceTier};
use rusqlite::Connection;

/// Finds the tier whose inclusive bounds contain a price.
#[derive(Debug, Clone, Default)]
pub struct PriceTierResolver {
    tiers: Vec<PriceTier>,
}

impl PriceTierResolver {
    pub fn new(mut tiers: Vec<PriceTier>) -> Self {
        tiers.sort_by_key(|t| (t.price_min, t.price_max));
        Self { tiers }
    }

    /// First matching tier by lower bound. Tiers are expected not to overlap.
    pub fn resolve(&self, price: i64) -> Option<&PriceTier> {
        self.tiers.iter().find(|t| t.contains(price))
    }

    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }
}

#[derive(Debug, Clone)]
pub struct AllotmentCalculator {
    resolver: PriceTierResolver,
    default_minutes: i64,
}

impl AllotmentCalculator {
    pub fn new(tiers: Vec<PriceTier>, default_minutes: i64) -> Self {
        Self {
            resolver: PriceTierResolver::new(tiers),
            default_minutes,
        }
    }

    /// Tiers and default baseline as currently stored.
    pub fn load(conn: &Connection) -> AppResult<Self> {
        Ok(Self::new(load_tiers(conn)?, default_allotted_minutes(conn)?))
    }

    /// Two-person baseline for a price; the default when no tier matches.
    pub fn baseline(&self, price: i64) -> i64 {
        self.resolver
            .resolve(price)
            .map(|t| t.allotted_minutes)
            .unwrap_or(self.default_minutes)
    }

    pub fn compute(
        &self,
        customer_price: i64,
        is_friends_family: bool,
        friends_family_minutes: Option<i64>,
        team_size: usize,
    ) -> i64 {
        if is_friends_family && let Some(minutes) = friends_family_minutes {
            return minutes;
        }
        adjust_for_team_size(self.baseline(customer_price), team_size)
    }

    pub fn for_customer(&self, customer: &Customer, team_size: usize) -> i64 {
        self.compute(
            customer.price,
            customer.is_friends_family,
            customer.friends_family_minutes,
            team_size,
        )
    }
}

/// Solo work doubles the baseline, two people keep it, larger teams get
/// `round(minutes * 2 / size)` (half rounds up). Size 0 leaves it unchanged.
pub fn adjust_for_team_size(minutes: i64, team_size: usize) -> i64 {
    match team_size {
        0 | 2 => minutes,
        1 => minutes * 2,
        n => {
            let n = n as i64;
            (minutes * 4 + n) / (2 * n)
        }
    }
}
