//! Reference data owned by the admin collaborators and read by the engine.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub color_hex: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    /// Whole currency units.
    pub price: i64,
    pub is_friends_family: bool,
    pub friends_family_minutes: Option<i64>,
    pub average_wage_ratio: Option<i64>,
    pub average_efficiency: Option<i64>,
    pub active: bool,
}

/// Inclusive price band mapped to a baseline (two-person) duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceTier {
    pub price_min: i64,
    pub price_max: i64,
    pub allotted_minutes: i64,
}

impl PriceTier {
    pub fn contains(&self, price: i64) -> bool {
        self.price_min <= price && price <= self.price_max
    }
}
