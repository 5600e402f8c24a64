//! Market, tier and product record types plus the per-record pricing rules

use std::fmt;
use std::str::FromStr;

/// Lei per euro used to compare Romanian prices against Spanish ones
pub const RON_PER_EUR: f64 = 5.03;

/// Upper bound of the low tier, in euros
pub const LOW_TIER_LIMIT_EUR: f64 = 8.0;

/// Upper bound of the mid tier, in euros
pub const MID_TIER_LIMIT_EUR: f64 = 15.0;

/// Source market of a catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Market {
    /// Domestic market, prices already in euros
    Spain,
    /// Foreign market, prices in Romanian lei
    Romania,
}

impl Market {
    /// Both markets in display order
    pub const ALL: [Market; 2] = [Market::Spain, Market::Romania];

    /// Label stored in the `país` column
    pub fn label(self) -> &'static str {
        match self {
            Market::Spain => "España",
            Market::Romania => "Rumania",
        }
    }

    /// ISO code of the native currency
    pub fn currency(self) -> &'static str {
        match self {
            Market::Spain => "EUR",
            Market::Romania => "RON",
        }
    }

    /// Native currency units per euro
    pub fn exchange_rate(self) -> f64 {
        match self {
            Market::Spain => 1.0,
            Market::Romania => RON_PER_EUR,
        }
    }

    /// Reference monthly minimum wage in the native currency
    pub fn minimum_wage(self) -> f64 {
        match self {
            Market::Spain => 1184.0,
            Market::Romania => 4050.0,
        }
    }

    /// Low/mid tier limits converted to the native currency
    pub fn tier_thresholds(self) -> (f64, f64) {
        let rate = self.exchange_rate();
        (LOW_TIER_LIMIT_EUR * rate, MID_TIER_LIMIT_EUR * rate)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "españa" | "espana" | "spain" | "es" => Ok(Market::Spain),
            "rumania" | "rumanía" | "romania" | "ro" => Ok(Market::Romania),
            other => anyhow::bail!("Unknown market: {}", other),
        }
    }
}

/// Market-local price class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Low,
    Mid,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Mid, Tier::High];

    /// Label stored in the `gama` column
    pub fn label(self) -> &'static str {
        match self {
            Tier::Low => "Baja",
            Tier::Mid => "Media",
            Tier::High => "Alta",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a native-currency price into a tier using the market's thresholds.
///
/// A price sitting exactly on a threshold belongs to the cheaper tier.
pub fn classify_tier(native_price: f64, market: Market) -> Tier {
    let (low, mid) = market.tier_thresholds();
    if native_price <= low {
        Tier::Low
    } else if native_price <= mid {
        Tier::Mid
    } else {
        Tier::High
    }
}

/// Convert a native-currency price to euros
pub fn convert_to_reference(native_price: f64, market: Market) -> f64 {
    match market {
        Market::Spain => native_price,
        Market::Romania => native_price / RON_PER_EUR,
    }
}

/// One row of the unified catalog, priced and classified
#[derive(Debug, Clone, PartialEq)]
pub struct PricedProduct {
    pub name: Option<String>,
    /// Value of `categoria_general` when the catalog carries it
    pub category: Option<String>,
    pub market: Market,
    /// Price in the market's native currency
    pub price: f64,
    /// Price in euros
    pub reference_price: f64,
    pub tier: Tier,
}

impl PricedProduct {
    /// Build a record from its native price, deriving the euro price and tier
    pub fn new(
        name: Option<String>,
        category: Option<String>,
        market: Market,
        price: f64,
    ) -> Self {
        Self {
            name,
            category,
            market,
            price,
            reference_price: convert_to_reference(price, market),
            tier: classify_tier(price, market),
        }
    }
}
