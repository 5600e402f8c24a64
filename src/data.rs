//! Catalog loading, cleaning and normalization using Polars

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::model::{Market, PricedProduct};

/// Product name column
pub const NAME: &str = "nombre";
/// Native-currency price column
pub const PRICE: &str = "precio";
/// Mass/volume column
pub const QUANTITY: &str = "gramos/ml";
/// Fine-grained category column, only used to drop the `Otro` sentinel
pub const CATEGORY: &str = "categoria";
/// Broad category column the dashboard groups and filters by
pub const GENERAL_CATEGORY: &str = "categoria_general";
/// Market label column attached during cleaning
pub const MARKET: &str = "país";
/// Euro price column attached during annotation
pub const REFERENCE_PRICE: &str = "precio_eur";
/// Tier label column attached during annotation
pub const TIER: &str = "gama";

/// Category value marking rows that do not belong to any comparable family
pub const OTHER_CATEGORY: &str = "Otro";

pub const SPAIN_KEYWORDS: &[&str] = &["pack", "set", "rutina"];
pub const ROMANIA_KEYWORDS: &[&str] = &["pachet", "pack", "set", "rutina"];

/// Applied to the unified table to catch bundles the per-market pass missed
pub const COMBINED_KEYWORDS: &[&str] = &["pack", "set", "rutina", "pachet", "kit", "combo"];

/// Bundle keywords for a market's catalog
pub fn exclusion_keywords(market: Market) -> &'static [&'static str] {
    match market {
        Market::Spain => SPAIN_KEYWORDS,
        Market::Romania => ROMANIA_KEYWORDS,
    }
}

/// Locations of the two raw catalogs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogPaths {
    pub spain: PathBuf,
    pub romania: PathBuf,
}

impl CatalogPaths {
    pub fn new(spain: impl Into<PathBuf>, romania: impl Into<PathBuf>) -> Self {
        Self {
            spain: spain.into(),
            romania: romania.into(),
        }
    }

    pub fn get(&self, market: Market) -> &Path {
        match market {
            Market::Spain => &self.spain,
            Market::Romania => &self.romania,
        }
    }
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self::new("./nala_es.csv", "./nala_ro.csv")
    }
}

/// The unified, annotated catalog for one session
#[derive(Debug)]
pub struct Catalog {
    /// All source columns plus `país`, `precio_eur` and `gama`
    pub frame: DataFrame,
    /// Typed view of `frame`, one entry per row in the same order
    pub products: Vec<PricedProduct>,
    /// Set when the raw files could not be used and the example dataset was substituted
    pub fallback: Option<CatalogError>,
}

impl Catalog {
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }

    /// Whether the catalog carries `categoria_general`
    pub fn has_categories(&self) -> bool {
        self.frame.column(GENERAL_CATEGORY).is_ok()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Case-insensitive substring match of a product name against bundle keywords
pub fn is_excluded(name: &str, keywords: &[&str]) -> bool {
    let name = name.to_lowercase();
    keywords
        .iter()
        .any(|keyword| name.contains(&keyword.to_lowercase()))
}

/// Read a raw market CSV into a DataFrame
pub fn read_market_csv(path: &Path, market: Market) -> Result<DataFrame, CatalogError> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|source| CatalogError::Load {
            market,
            path: path.to_path_buf(),
            source,
        })
}

/// Clean one market's raw table.
///
/// # Arguments
/// * `raw` - Raw catalog with at least `nombre`, `precio` and `gramos/ml`
/// * `market` - Market the rows come from
/// * `keywords` - Bundle keywords; matching names are dropped
///
/// # Returns
/// * Cleaned table with a `país` column; may be empty
pub fn load_and_clean(
    raw: DataFrame,
    market: Market,
    keywords: &[&str],
) -> Result<DataFrame, CatalogError> {
    require_columns(&raw, &[NAME, PRICE, QUANTITY])?;
    let has_category = raw.column(CATEGORY).is_ok();
    let raw_rows = raw.height();

    let mut lf = raw
        .lazy()
        .with_columns([
            // Unparsable and missing quantities both become 0
            col(QUANTITY).cast(DataType::Int64).fill_null(lit(0)),
            col(PRICE).cast(DataType::Float64),
        ])
        .with_column(
            when(col(QUANTITY).lt(lit(0)))
                .then(lit(0))
                .otherwise(col(QUANTITY))
                .cast(DataType::Int64)
                .alias(QUANTITY),
        );

    if has_category {
        lf = lf.filter(
            col(CATEGORY)
                .is_null()
                .or(col(CATEGORY).neq(lit(OTHER_CATEGORY))),
        );
    }

    let df = lf.with_column(lit(market.label()).alias(MARKET)).collect()?;
    let df = drop_excluded(df, keywords)?;

    debug!(
        market = %market,
        raw_rows,
        kept_rows = df.height(),
        "Cleaned market catalog"
    );
    Ok(df)
}

/// Concatenate both cleaned markets and run the cross-market bundle filter.
///
/// Columns present in only one market are null-filled for the other.
pub fn combine(spain: DataFrame, romania: DataFrame) -> Result<DataFrame, CatalogError> {
    let unified =
        concat_lf_diagonal([spain.lazy(), romania.lazy()], UnionArgs::default())?.collect()?;
    drop_excluded(unified, COMBINED_KEYWORDS)
}

/// Drop every row whose name contains one of `keywords`. Rows without a name are kept.
pub fn drop_excluded(df: DataFrame, keywords: &[&str]) -> Result<DataFrame, CatalogError> {
    let mask: BooleanChunked = df
        .column(NAME)?
        .str()?
        .into_iter()
        .map(|name| name.map_or(true, |name| !is_excluded(name, keywords)))
        .collect();

    Ok(df.filter(&mask)?)
}

/// Read and clean one market, reporting any failure as a load failure
fn load_market(paths: &CatalogPaths, market: Market) -> Result<DataFrame, CatalogError> {
    let path = paths.get(market);
    let raw = read_market_csv(path, market)?;
    load_and_clean(raw, market, exclusion_keywords(market)).map_err(|err| match err {
        CatalogError::Polars(source) => CatalogError::Load {
            market,
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Load both markets and combine them, without any fallback
pub fn load_unified(paths: &CatalogPaths) -> Result<DataFrame, CatalogError> {
    let spain = load_market(paths, Market::Spain)?;
    let romania = load_market(paths, Market::Romania)?;
    combine(spain, romania)
}

/// Built-in example dataset used when the raw catalogs cannot be loaded
pub fn fallback_frame() -> Result<DataFrame, CatalogError> {
    let spain = Market::Spain.label();
    let romania = Market::Romania.label();
    Ok(df!(
        MARKET => &[spain, spain, romania, romania],
        GENERAL_CATEGORY => &["Rostro", "Corporal", "Rostro", "Corporal"],
        PRICE => &[15.90, 8.50, 79.90, 45.50],
        NAME => &["Crema Facial", "Gel de Ducha", "Crema Facial", "Gel de Ducha"],
    )?)
}

/// Load, clean, combine and annotate both catalogs.
///
/// A load failure of either file degrades to [`fallback_frame`]; the failure is kept on
/// [`Catalog::fallback`]. Schema and market errors are fatal.
pub fn load_catalog(paths: &CatalogPaths) -> Result<Catalog, CatalogError> {
    let (frame, fallback) = match load_unified(paths) {
        Ok(frame) => (frame, None),
        Err(err) => {
            warn!(error = %err, "Error loading catalogs, using example dataset");
            (fallback_frame()?, Some(err))
        }
    };

    let (frame, products) = annotate(frame)?;
    info!(
        rows = products.len(),
        degraded = fallback.is_some(),
        "Catalog ready"
    );

    Ok(Catalog {
        frame,
        products,
        fallback,
    })
}

/// Attach `precio_eur` and `gama` to the unified table and extract typed records.
///
/// Fails when `país` or `precio` is missing or a market label is not recognised.
/// Rows without a price are dropped.
pub fn annotate(frame: DataFrame) -> Result<(DataFrame, Vec<PricedProduct>), CatalogError> {
    let missing = missing_columns(&frame, &[MARKET, PRICE]);
    if !missing.is_empty() {
        return Err(CatalogError::Schema(missing));
    }

    let prices = frame.column(PRICE)?.cast(&DataType::Float64)?;
    let mut frame = if prices.null_count() > 0 {
        warn!(
            dropped = prices.null_count(),
            "Dropping rows without a price"
        );
        frame.filter(&prices.is_not_null())?
    } else {
        frame
    };

    let products = extract_products(&frame)?;

    let reference_prices: Vec<f64> = products.iter().map(|p| p.reference_price).collect();
    let tiers: Vec<&str> = products.iter().map(|p| p.tier.label()).collect();
    frame.with_column(Series::new(REFERENCE_PRICE, reference_prices))?;
    frame.with_column(Series::new(TIER, tiers))?;

    Ok((frame, products))
}

fn extract_products(frame: &DataFrame) -> Result<Vec<PricedProduct>, CatalogError> {
    let prices = frame.column(PRICE)?.cast(&DataType::Float64)?;
    let prices = prices.f64()?;
    let markets = frame.column(MARKET)?.cast(&DataType::String)?;
    let markets = markets.str()?;
    let names = string_values(frame, NAME)?;
    let categories = string_values(frame, GENERAL_CATEGORY)?;

    let mut products = Vec::with_capacity(frame.height());
    for (((price, market), name), category) in prices
        .into_iter()
        .zip(markets.into_iter())
        .zip(names)
        .zip(categories)
    {
        let label = market.unwrap_or_default();
        let market: Market = label
            .parse()
            .map_err(|_| CatalogError::UnknownMarket(label.to_string()))?;
        products.push(PricedProduct::new(
            name,
            category,
            market,
            price.unwrap_or_default(),
        ));
    }

    Ok(products)
}

/// String values of an optional column; all `None` when the column is absent
fn string_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>, CatalogError> {
    match frame.column(name) {
        Ok(column) => {
            let column = column.cast(&DataType::String)?;
            Ok(column
                .str()?
                .into_iter()
                .map(|value| value.map(str::to_owned))
                .collect())
        }
        Err(_) => Ok(vec![None; frame.height()]),
    }
}

fn missing_columns(df: &DataFrame, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect()
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), CatalogError> {
    let missing = missing_columns(df, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PolarsError::ColumnNotFound(format!("{:?}", missing).into()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tier;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_spain_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "nombre,categoria,categoria_general,gramos/ml,precio").unwrap();
        writeln!(file, "Crema Hidratante,Facial,Rostro,50,12.5").unwrap();
        writeln!(file, "Gel de Ducha,Corporal,Corporal,,6.95").unwrap();
        writeln!(file, "Pack Verano,Facial,Rostro,200,20.0").unwrap();
        writeln!(file, "SET de Regalo,Corporal,Corporal,100,30.0").unwrap();
        writeln!(file, "Rutina Noche,Facial,Rostro,30,25.0").unwrap();
        writeln!(file, "Bálsamo Labial,Otro,Otros,10,3.5").unwrap();
        writeln!(file, "Serum Vitamina C,Facial,Rostro,-5,15.0").unwrap();
        writeln!(file, "Mascarilla Kit Glow,Facial,Rostro,75,9.0").unwrap();
        file
    }

    fn create_romania_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "nombre,categoria,categoria_general,gramos/ml,precio,marca").unwrap();
        writeln!(file, "Cremă Hidratantă,Facial,Rostro,50,62.9,Nala").unwrap();
        writeln!(file, "Pachet Cadou,Corporal,Corporal,100,99.0,Nala").unwrap();
        writeln!(file, "Gel de Duș,Corporal,Corporal,250,40.24,Nala").unwrap();
        writeln!(file, "Combo Vară,Facial,Rostro,,55.0,Nala").unwrap();
        writeln!(file, "Ser Facial,Facial,Rostro,30,120.0,Nala").unwrap();
        file
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.column(NAME)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|n| n.unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_is_excluded() {
        assert!(is_excluded("Gift Set Deluxe", COMBINED_KEYWORDS));
        assert!(is_excluded("PACHET cadou", ROMANIA_KEYWORDS));
        assert!(!is_excluded("Pachet cadou", SPAIN_KEYWORDS));
        assert!(!is_excluded("Crema Facial", COMBINED_KEYWORDS));
        assert!(!is_excluded("anything", &[]));
    }

    #[test]
    fn test_load_and_clean_spain() {
        let file = create_spain_csv();
        let raw = read_market_csv(file.path(), Market::Spain).unwrap();
        let cleaned = load_and_clean(raw, Market::Spain, SPAIN_KEYWORDS).unwrap();

        assert_eq!(
            names(&cleaned),
            vec!["Crema Hidratante", "Gel de Ducha", "Serum Vitamina C", "Mascarilla Kit Glow"]
        );

        let quantities: Vec<Option<i64>> = cleaned
            .column(QUANTITY)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(quantities, vec![Some(50), Some(0), Some(0), Some(75)]);

        let markets = cleaned.column(MARKET).unwrap().str().unwrap();
        assert!(markets.into_iter().all(|m| m == Some("España")));
    }

    #[test]
    fn test_load_and_clean_unparsable_quantity_becomes_zero() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "nombre,gramos/ml,precio").unwrap();
        writeln!(file, "Crema Hidratante,50ml,12.5").unwrap();
        writeln!(file, "Tónico Facial,200,9.0").unwrap();
        let raw = read_market_csv(file.path(), Market::Spain).unwrap();
        let cleaned = load_and_clean(raw, Market::Spain, SPAIN_KEYWORDS).unwrap();

        assert_eq!(names(&cleaned), vec!["Crema Hidratante", "Tónico Facial"]);
        let quantities: Vec<Option<i64>> = cleaned
            .column(QUANTITY)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(quantities, vec![Some(0), Some(200)]);
    }

    #[test]
    fn test_load_and_clean_romania_keeps_extra_columns() {
        let file = create_romania_csv();
        let raw = read_market_csv(file.path(), Market::Romania).unwrap();
        let cleaned = load_and_clean(raw, Market::Romania, ROMANIA_KEYWORDS).unwrap();

        assert_eq!(cleaned.height(), 4);
        assert!(cleaned.column("marca").is_ok());
        assert!(!names(&cleaned).iter().any(|n| n.contains("Pachet")));
    }

    #[test]
    fn test_load_and_clean_is_idempotent() {
        let file = create_spain_csv();
        let raw = read_market_csv(file.path(), Market::Spain).unwrap();
        let cleaned = load_and_clean(raw, Market::Spain, SPAIN_KEYWORDS).unwrap();
        let again = load_and_clean(cleaned.clone(), Market::Spain, SPAIN_KEYWORDS).unwrap();

        assert!(cleaned.equals_missing(&again));
    }

    #[test]
    fn test_load_and_clean_empty_result() {
        let raw = df!(
            NAME => &["Pack Uno", "Set Dos"],
            PRICE => &[1.0, 2.0],
            QUANTITY => &[1i64, 2],
        )
        .unwrap();
        let cleaned = load_and_clean(raw, Market::Spain, SPAIN_KEYWORDS).unwrap();
        assert_eq!(cleaned.height(), 0);
    }

    #[test]
    fn test_load_and_clean_missing_quantity_column() {
        let raw = df!(NAME => &["Crema"], PRICE => &[1.0]).unwrap();
        let result = load_and_clean(raw, Market::Spain, SPAIN_KEYWORDS);
        assert!(matches!(result, Err(CatalogError::Polars(_))));
    }

    #[test]
    fn test_combine_applies_cross_market_keywords() {
        let es = create_spain_csv();
        let ro = create_romania_csv();
        let paths = CatalogPaths::new(es.path(), ro.path());

        let unified = load_unified(&paths).unwrap();
        let names = names(&unified);

        assert_eq!(unified.height(), 6);
        assert!(!names.iter().any(|n| is_excluded(n, COMBINED_KEYWORDS)));
        // Spanish rows have no `marca`
        assert_eq!(unified.column("marca").unwrap().null_count(), 3);
    }

    #[test]
    fn test_load_catalog_annotates() {
        let es = create_spain_csv();
        let ro = create_romania_csv();
        let catalog = load_catalog(&CatalogPaths::new(es.path(), ro.path())).unwrap();

        assert!(!catalog.is_degraded());
        assert!(catalog.has_categories());
        assert_eq!(catalog.frame.height(), catalog.len());
        assert!(catalog.frame.column(REFERENCE_PRICE).is_ok());
        assert!(catalog.frame.column(TIER).is_ok());

        let gel = catalog
            .products
            .iter()
            .find(|p| p.name.as_deref() == Some("Gel de Duș"))
            .unwrap();
        assert_eq!(gel.market, Market::Romania);
        assert_eq!(gel.tier, Tier::Low);
        assert!((gel.reference_price - 8.0).abs() < 1e-9);

        for product in catalog.products.iter().filter(|p| p.market == Market::Spain) {
            assert_eq!(product.reference_price, product.price);
        }
    }

    #[test]
    fn test_fallback_when_files_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CatalogPaths::new(dir.path().join("es.csv"), dir.path().join("ro.csv"));

        let catalog = load_catalog(&paths).unwrap();
        assert!(catalog.is_degraded());
        assert!(matches!(
            catalog.fallback,
            Some(CatalogError::Load { market: Market::Spain, .. })
        ));
        assert_eq!(catalog.len(), 4);

        let columns: Vec<String> = fallback_frame()
            .unwrap()
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(columns, vec![MARKET, GENERAL_CATEGORY, PRICE, NAME]);
    }

    #[test]
    fn test_fallback_when_one_file_missing() {
        let es = create_spain_csv();
        let dir = tempfile::tempdir().unwrap();
        let paths = CatalogPaths::new(es.path(), dir.path().join("ro.csv"));

        let catalog = load_catalog(&paths).unwrap();
        assert!(matches!(
            catalog.fallback,
            Some(CatalogError::Load { market: Market::Romania, .. })
        ));
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_annotate_schema_failure() {
        let frame = df!(NAME => &["Crema"], "otra" => &[1.0]).unwrap();
        match annotate(frame) {
            Err(CatalogError::Schema(missing)) => {
                assert_eq!(missing, vec![MARKET.to_string(), PRICE.to_string()])
            }
            other => panic!("expected schema failure, got {:?}", other.map(|(_, p)| p)),
        }
    }

    #[test]
    fn test_annotate_rejects_unknown_market() {
        let frame = df!(MARKET => &["España", "Portugal"], PRICE => &[1.0, 2.0]).unwrap();
        assert!(matches!(
            annotate(frame),
            Err(CatalogError::UnknownMarket(label)) if label == "Portugal"
        ));
    }

    #[test]
    fn test_annotate_drops_null_prices() {
        let frame = df!(
            MARKET => &["España", "Rumania", "España"],
            PRICE => &[Some(5.0), None, Some(20.0)],
        )
        .unwrap();
        let (frame, products) = annotate(frame).unwrap();

        assert_eq!(frame.height(), 2);
        assert_eq!(products.len(), 2);
        let tiers: Vec<&str> = frame
            .column(TIER)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(tiers, vec!["Baja", "Alta"]);
    }
}
