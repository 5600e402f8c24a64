//! Chart rendering using Plotters for the price dashboard

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::analysis::{
    self, affordability, category_means, histogram_range, reference_prices, value_range,
    CategoryMean,
};
use crate::model::{Market, PricedProduct, Tier, RON_PER_EUR};

/// Bins of the overall price histogram
const PRICE_BINS: usize = 30;

/// Bins of each per-category histogram
const CATEGORY_BINS: usize = 20;

/// Series color per market
pub fn market_color(market: Market) -> RGBColor {
    match market {
        Market::Spain => RGBColor(44, 85, 48),
        Market::Romania => RGBColor(214, 96, 77),
    }
}

/// Widen `[min, max]` by 5% on each side, or by 1 unit when the range is empty
pub fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

fn native_prices(view: &[&PricedProduct], market: Market) -> Vec<f64> {
    view.iter()
        .filter(|p| p.market == market)
        .map(|p| p.price)
        .collect()
}

/// Overlaid native-price histograms, one series per market
pub fn create_price_histogram(view: &[&PricedProduct], output_path: &Path) -> crate::Result<()> {
    let all_prices: Vec<f64> = view.iter().map(|p| p.price).collect();
    let (min, max) = value_range(&all_prices);
    let (x_min, x_max) = padded_range(min, max);

    let series: Vec<(Market, Vec<analysis::Bin>)> = Market::ALL
        .iter()
        .map(|&m| (m, histogram_range(&native_prices(view, m), min, max, PRICE_BINS)))
        .collect();
    let max_count = series
        .iter()
        .flat_map(|(_, bins)| bins.iter().map(|b| b.count))
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribución de Precios - España vs Rumanía", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Precio (moneda local)")
        .y_desc("Productos")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (market, bins) in &series {
        let color = market_color(*market);
        chart
            .draw_series(bins.iter().map(|b| {
                Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.mix(0.6).filled())
            }))?
            .label(market.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    root.present()?;
    info!(path = %output_path.display(), "Price histogram saved");

    Ok(())
}

/// Euro-price box plot per market
pub fn create_reference_boxplot(view: &[&PricedProduct], output_path: &Path) -> crate::Result<()> {
    let boxes: Vec<(&'static str, Market, Quartiles)> = Market::ALL
        .iter()
        .filter_map(|&m| {
            let prices = reference_prices(view, m);
            (!prices.is_empty()).then(|| (m.label(), m, Quartiles::new(&prices[..])))
        })
        .collect();
    if boxes.is_empty() {
        warn!("No prices to plot in box plot");
        return Ok(());
    }

    let labels: Vec<&str> = boxes.iter().map(|(label, _, _)| *label).collect();
    let y_max = boxes
        .iter()
        .map(|(_, _, q)| q.values()[4])
        .fold(0f32, f32::max)
        .max(1.0)
        * 1.1;

    let root = BitMapBackend::new(output_path, (700, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Comparación de Precios por País (EUR)", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(labels[..].into_segmented(), 0f32..y_max)?;

    chart
        .configure_mesh()
        .y_desc("Precio (EUR)")
        .axis_desc_style(("sans-serif", 15))
        .light_line_style(&WHITE)
        .draw()?;

    chart.draw_series(boxes.iter().zip(labels.iter()).map(|((_, market, quartiles), label)| {
        Boxplot::new_vertical(SegmentValue::CenterOf(label), quartiles)
            .width(40)
            .style(market_color(*market))
    }))?;

    root.present()?;
    info!(path = %output_path.display(), "Box plot saved");

    Ok(())
}

/// One native-price histogram panel per category, markets overlaid
pub fn create_category_histograms(
    view: &[&PricedProduct],
    categories: &[String],
    output_path: &Path,
) -> crate::Result<()> {
    if categories.is_empty() {
        warn!("No categories to facet by");
        return Ok(());
    }

    let root = BitMapBackend::new(output_path, (400 * categories.len() as u32, 500))
        .into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(
        "Distribución de Precios por Categoría General - España vs Rumanía",
        ("sans-serif", 24),
    )?;
    let panels = root.split_evenly((1, categories.len()));

    for (panel, category) in panels.iter().zip(categories) {
        let in_category: Vec<&PricedProduct> = view
            .iter()
            .copied()
            .filter(|p| p.category.as_deref() == Some(category.as_str()))
            .collect();
        let all_prices: Vec<f64> = in_category.iter().map(|p| p.price).collect();
        let (min, max) = value_range(&all_prices);
        let (x_min, x_max) = padded_range(min, max);

        let series: Vec<(Market, Vec<analysis::Bin>)> = Market::ALL
            .iter()
            .map(|&m| {
                let prices = native_prices(&in_category, m);
                (m, histogram_range(&prices, min, max, CATEGORY_BINS))
            })
            .collect();
        let max_count = series
            .iter()
            .flat_map(|(_, bins)| bins.iter().map(|b| b.count))
            .max()
            .unwrap_or(1)
            .max(1) as f64;

        let mut chart = ChartBuilder::on(panel)
            .caption(category, ("sans-serif", 18))
            .margin(8)
            .x_label_area_size(35)
            .y_label_area_size(40)
            .build_cartesian_2d(x_min..x_max, 0f64..(max_count * 1.1))?;
        chart.configure_mesh().x_desc("Precio").y_desc("Frecuencia").draw()?;

        for (market, bins) in &series {
            let color = market_color(*market);
            chart.draw_series(bins.iter().map(|b| {
                Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.mix(0.6).filled())
            }))?;
        }
    }

    root.present()?;
    info!(path = %output_path.display(), "Category histograms saved");

    Ok(())
}

/// Native-price box plots per category, one box per market side by side
pub fn create_category_boxplots(
    view: &[&PricedProduct],
    categories: &[String],
    output_path: &Path,
) -> crate::Result<()> {
    let mut boxes: Vec<(&String, Market, Quartiles)> = Vec::new();
    for category in categories {
        for market in Market::ALL {
            let prices: Vec<f64> = view
                .iter()
                .filter(|p| p.market == market && p.category.as_ref() == Some(category))
                .map(|p| p.price)
                .collect();
            if !prices.is_empty() {
                boxes.push((category, market, Quartiles::new(&prices[..])));
            }
        }
    }
    if boxes.is_empty() {
        warn!("No category prices to plot in box plots");
        return Ok(());
    }

    let y_max = boxes
        .iter()
        .map(|(_, _, q)| q.values()[4])
        .fold(0f32, f32::max)
        .max(1.0)
        * 1.1;

    let root = BitMapBackend::new(output_path, (200 * categories.len() as u32 + 300, 600))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribución de Precios por Categoría General", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(categories[..].into_segmented(), 0f32..y_max)?;

    chart
        .configure_mesh()
        .y_desc("Precio (moneda local)")
        .axis_desc_style(("sans-serif", 15))
        .light_line_style(&WHITE)
        .draw()?;

    for (slot, market) in Market::ALL.iter().enumerate() {
        let color = market_color(*market);
        let offset = if slot == 0 { -12 } else { 12 };
        chart
            .draw_series(boxes.iter().filter(|(_, m, _)| m == market).map(
                |(category, _, quartiles)| {
                    Boxplot::new_vertical(SegmentValue::CenterOf(*category), quartiles)
                        .width(20)
                        .offset(offset)
                        .style(color)
                },
            ))?
            .label(market.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    root.present()?;
    info!(path = %output_path.display(), "Category box plots saved");

    Ok(())
}

/// Grouped bars of mean euro price per category, one bar per market
pub fn create_category_means_chart(
    means: &[CategoryMean],
    output_path: &Path,
) -> crate::Result<()> {
    let mut categories: Vec<&str> = Vec::new();
    for mean in means {
        if !categories.contains(&mean.category.as_str()) {
            categories.push(&mean.category);
        }
    }
    if categories.is_empty() {
        warn!("No category means to plot");
        return Ok(());
    }

    let y_max = means.iter().map(|m| m.mean).fold(0.0, f64::max).max(1.0) * 1.15;

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Precio Promedio por Categoría General (EUR)", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..categories.len() as f64, 0f64..y_max)?;

    let label_for = |x: &f64| {
        let index = x.floor() as usize;
        categories.get(index).map(|c| c.to_string()).unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len() + 1)
        .x_label_formatter(&label_for)
        .y_desc("Precio Promedio (EUR)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (slot, market) in Market::ALL.iter().enumerate() {
        let color = market_color(*market);
        let bars: Vec<(usize, f64)> = means
            .iter()
            .filter(|m| m.market == *market)
            .filter_map(|m| {
                categories
                    .iter()
                    .position(|c| *c == m.category)
                    .map(|index| (index, m.mean))
            })
            .collect();

        chart
            .draw_series(bars.iter().map(|&(index, mean)| {
                let left = index as f64 + 0.1 + slot as f64 * 0.4;
                Rectangle::new([(left, 0.0), (left + 0.4, mean)], color.filled())
            }))?
            .label(market.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart.configure_series_labels().border_style(&BLACK).draw()?;
    root.present()?;
    info!(path = %output_path.display(), "Category means chart saved");

    Ok(())
}

/// Bars of products purchasable with one minimum wage, per market
pub fn create_affordability_chart(
    view: &[&PricedProduct],
    output_path: &Path,
) -> crate::Result<()> {
    let values: Vec<(Market, f64)> = Market::ALL
        .iter()
        .map(|&m| (m, affordability(view, m)))
        .collect();
    let y_max = values.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0) * 1.15;

    let root = BitMapBackend::new(output_path, (600, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Productos comprables con un salario mínimo", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..values.len() as f64, 0f64..y_max)?;

    let label_for = |x: &f64| {
        Market::ALL
            .get(x.floor() as usize)
            .map(|m| m.label().to_string())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(values.len() + 1)
        .x_label_formatter(&label_for)
        .y_desc("Número de productos")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(index, (market, value))| {
        let left = index as f64 + 0.2;
        Rectangle::new([(left, 0.0), (left + 0.6, *value)], market_color(*market).filled())
    }))?;

    root.present()?;
    info!(path = %output_path.display(), "Affordability chart saved");

    Ok(())
}

/// Render every chart for the current selection into `output_dir`.
///
/// Category charts are skipped for catalogs without categories. Returns the files written.
pub fn generate_dashboard_charts(
    view: &[&PricedProduct],
    has_categories: bool,
    output_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    if view.is_empty() {
        warn!("Selection is empty, no charts generated");
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();

    let path = output_dir.join("price_histogram.png");
    create_price_histogram(view, &path)?;
    written.push(path);

    let path = output_dir.join("reference_boxplot.png");
    create_reference_boxplot(view, &path)?;
    written.push(path);

    if has_categories {
        let categories = analysis::unique_categories(view.iter().copied());

        let path = output_dir.join("category_histograms.png");
        create_category_histograms(view, &categories, &path)?;
        written.push(path);

        let path = output_dir.join("category_boxplots.png");
        create_category_boxplots(view, &categories, &path)?;
        written.push(path);

        let path = output_dir.join("category_means.png");
        create_category_means_chart(&category_means(view), &path)?;
        written.push(path);
    }

    let path = output_dir.join("affordability.png");
    create_affordability_chart(view, &path)?;
    written.push(path);

    Ok(written)
}

/// Print the headline metrics and grouped tables to the console
pub fn print_dashboard_summary(view: &[&PricedProduct], has_categories: bool) {
    let summary = analysis::summarize(view);

    println!("\n=== NALA — De los Leus al Euro ===");
    println!("Tipo de cambio: 1 EUR = {} LEI", RON_PER_EUR);
    println!("Productos totales: {}", summary.total);
    match summary.mean_reference_price {
        Some(mean) => println!("Precio medio: €{:.2}", mean),
        None => println!("Precio medio: -"),
    }
    for market in Market::ALL {
        let tiers: Vec<String> = Tier::ALL
            .iter()
            .map(|&tier| {
                let count = view
                    .iter()
                    .filter(|p| p.market == market && p.tier == tier)
                    .count();
                format!("{} {}", tier.label(), count)
            })
            .collect();
        println!(
            "  {}: {} productos en {} ({})",
            market,
            summary.count(market),
            market.currency(),
            tiers.join(", ")
        );
    }

    println!("\nAccesibilidad (productos comprables con un salario mínimo):");
    for market in Market::ALL {
        let median = analysis::median_reference_price(view, market)
            .map(|m| format!("€{:.2}", m))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:8} | mediana {:>8} | {:6.0} productos",
            market.label(),
            median,
            affordability(view, market)
        );
    }

    if has_categories {
        println!("\nPrecio promedio por categoría (EUR):");
        println!("  Categoría            | País     |   Media | Productos");
        println!("  ---------------------|----------|---------|----------");
        for mean in category_means(view) {
            println!(
                "  {:20} | {:8} | {:7.2} | {:9}",
                mean.category,
                mean.market.label(),
                mean.mean,
                mean.count
            );
        }
    }

    println!("\nPortfolio por país, categoría y gama:");
    for slice in analysis::tier_breakdown(view) {
        println!(
            "  {:8} / {:20} / {:5} | {:5} productos | €{:.2}",
            slice.market.label(),
            slice.category.as_deref().unwrap_or("-"),
            slice.tier.label(),
            slice.count,
            slice.total_reference_price
        );
    }
}
