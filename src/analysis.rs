//! Filters and aggregations the dashboard displays over the unified catalog

use std::collections::BTreeMap;

use crate::model::{Market, PricedProduct, Tier};

/// Market and category selection. `None` selects everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub markets: Option<Vec<Market>>,
    pub categories: Option<Vec<String>>,
}

impl CatalogFilter {
    pub fn matches(&self, product: &PricedProduct) -> bool {
        let market_ok = self
            .markets
            .as_ref()
            .map_or(true, |markets| markets.contains(&product.market));
        let category_ok = match (&self.categories, &product.category) {
            (None, _) => true,
            (Some(categories), Some(category)) => categories.iter().any(|c| c == category),
            (Some(_), None) => false,
        };
        market_ok && category_ok
    }

    /// Read-only view of the products this filter selects.
    ///
    /// The category selection is ignored for catalogs without `categoria_general`.
    pub fn apply<'a>(
        &self,
        products: &'a [PricedProduct],
        has_categories: bool,
    ) -> Vec<&'a PricedProduct> {
        let effective = if has_categories {
            self.clone()
        } else {
            CatalogFilter {
                markets: self.markets.clone(),
                categories: None,
            }
        };
        products.iter().filter(|p| effective.matches(p)).collect()
    }
}

/// Markets present in the catalog, in order of first appearance
pub fn unique_markets<'a>(products: impl IntoIterator<Item = &'a PricedProduct>) -> Vec<Market> {
    let mut seen = Vec::new();
    for product in products {
        if !seen.contains(&product.market) {
            seen.push(product.market);
        }
    }
    seen
}

/// Categories present in the catalog, in order of first appearance
pub fn unique_categories<'a>(
    products: impl IntoIterator<Item = &'a PricedProduct>,
) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in products.into_iter().filter_map(|p| p.category.as_ref()) {
        if !seen.contains(category) {
            seen.push(category.clone());
        }
    }
    seen
}

/// Headline metrics shown above the charts
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub per_market: BTreeMap<Market, usize>,
    /// `None` for an empty selection
    pub mean_reference_price: Option<f64>,
}

impl Summary {
    pub fn count(&self, market: Market) -> usize {
        self.per_market.get(&market).copied().unwrap_or(0)
    }
}

pub fn summarize(view: &[&PricedProduct]) -> Summary {
    let mut per_market: BTreeMap<Market, usize> = Market::ALL.iter().map(|&m| (m, 0)).collect();
    for product in view {
        *per_market.entry(product.market).or_insert(0) += 1;
    }

    Summary {
        total: view.len(),
        per_market,
        mean_reference_price: mean(view.iter().map(|p| p.reference_price)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Median of a set of values, averaging the middle pair for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Euro prices of one market within a view
pub fn reference_prices(view: &[&PricedProduct], market: Market) -> Vec<f64> {
    view.iter()
        .filter(|p| p.market == market)
        .map(|p| p.reference_price)
        .collect()
}

pub fn median_reference_price(view: &[&PricedProduct], market: Market) -> Option<f64> {
    median(&reference_prices(view, market))
}

/// Median-priced products one minimum wage buys in `market`.
///
/// Zero when the market has no products or a non-positive median.
pub fn affordability(view: &[&PricedProduct], market: Market) -> f64 {
    let wage_eur = market.minimum_wage() / market.exchange_rate();
    match median_reference_price(view, market) {
        Some(median) if median > 0.0 => wage_eur / median,
        _ => 0.0,
    }
}

/// Mean euro price of one (category, market) group
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMean {
    pub category: String,
    pub market: Market,
    /// Rounded to cents
    pub mean: f64,
    pub count: usize,
}

/// Mean euro price per category and market, ordered by category then market
pub fn category_means(view: &[&PricedProduct]) -> Vec<CategoryMean> {
    let mut groups: BTreeMap<(String, Market), (f64, usize)> = BTreeMap::new();
    for product in view {
        if let Some(category) = &product.category {
            let entry = groups
                .entry((category.clone(), product.market))
                .or_insert((0.0, 0));
            entry.0 += product.reference_price;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|((category, market), (sum, count))| CategoryMean {
            category,
            market,
            mean: round_cents(sum / count as f64),
            count,
        })
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Leaf of the market → category → tier hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct TierSlice {
    pub market: Market,
    pub category: Option<String>,
    pub tier: Tier,
    pub count: usize,
    /// Sum of euro prices, the slice's weight in the hierarchy
    pub total_reference_price: f64,
}

/// Hierarchical breakdown of the portfolio by market, category and tier
pub fn tier_breakdown(view: &[&PricedProduct]) -> Vec<TierSlice> {
    let mut groups: BTreeMap<(Market, Option<String>, Tier), (usize, f64)> = BTreeMap::new();
    for product in view {
        let entry = groups
            .entry((product.market, product.category.clone(), product.tier))
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += product.reference_price;
    }

    groups
        .into_iter()
        .map(|((market, category, tier), (count, total))| TierSlice {
            market,
            category,
            tier,
            count,
            total_reference_price: total,
        })
        .collect()
}

/// Equal-width histogram bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Smallest and largest of `values`; infinite bounds when empty
pub fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Equal-width bins over a fixed `[min, max]` so several series share bin edges.
///
/// The last bin is closed on the right and values outside the range are ignored.
/// A degenerate range (`min == max`) yields a single unit-wide bin centred on `min`.
pub fn histogram_range(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<Bin> {
    if bins == 0 || !min.is_finite() || !max.is_finite() || max < min {
        return Vec::new();
    }
    if max == min {
        return vec![Bin {
            start: min - 0.5,
            end: min + 0.5,
            count: values.iter().filter(|&&v| v == min).count(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &value in values.iter().filter(|v| (min..=max).contains(*v)) {
        let index = (((value - min) / width) as usize).min(bins - 1);
        result[index].count += 1;
    }
    result
}
