//! Deterministic visual summaries of a single tool's result set.
//!
//! Every tool belongs to at most one [`ToolFamily`]. The family decides which
//! field is pulled out of each record ([`Series`]) and how that series is
//! bucketed into bars. Rendering is pure: identical `(tool, items)` always
//! produce the identical [`Figure`] or `None`.

mod svg;

use crate::tools::registry::{headline, truncate_chars};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Dalton ranges for the molecular weight histogram.
const WEIGHT_RANGES: [(f64, f64); 7] = [
    (50.0, 200.0),
    (200.0, 300.0),
    (300.0, 400.0),
    (400.0, 500.0),
    (500.0, 700.0),
    (700.0, 1000.0),
    (1000.0, 1500.0),
];

const MAX_YEAR_BUCKETS: usize = 12;
const YEAR_BINS: i32 = 10;
const LENGTH_BINS: usize = 8;
const TOP_BARS: usize = 8;
const BAR_LABEL_CHARS: usize = 24;

/// Figure family of a tool, carrying only what its rendering rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFamily {
    Temporal,
    MolecularWeight,
    Length,
    Scored,
    Categorical { field: &'static str },
}

impl ToolFamily {
    pub fn for_tool(tool: &str) -> Option<Self> {
        let family = match tool {
            "pubmed_search" | "europe_pmc" | "openalex_works" => Self::Temporal,
            "pubchem_compound" | "chembl_molecule" => Self::MolecularWeight,
            "uniprot_search" | "ncbi_gene" => Self::Length,
            "string_interactions" | "opentargets_search" => Self::Scored,
            "clinical_trials" => Self::Categorical { field: "phase" },
            "openfda_labels" => Self::Categorical { field: "route" },
            "reactome_pathways" => Self::Categorical { field: "species" },
            _ => return None,
        };
        Some(family)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::MolecularWeight => "molecular_weight",
            Self::Length => "length",
            Self::Scored => "scored",
            Self::Categorical { .. } => "categorical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    Histogram,
    RankedBars,
    CategoryCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

impl Bar {
    fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub tool: String,
    pub kind: FigureKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
    pub svg: String,
}

/// The one field a family reads from each record.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Years(Vec<i32>),
    Weights(Vec<f64>),
    Lengths(Vec<f64>),
    Scores(Vec<(String, f64)>),
    Categories(Vec<String>),
}

impl Series {
    pub fn extract(family: ToolFamily, items: &[Record]) -> Self {
        match family {
            ToolFamily::Temporal => Self::Years(
                items
                    .iter()
                    .filter_map(|r| r.get("year").and_then(four_digit_year))
                    .collect(),
            ),
            ToolFamily::MolecularWeight => Self::Weights(
                items
                    .iter()
                    .filter_map(|r| r.get("molecular_weight").and_then(as_number))
                    .filter(|w| *w > 50.0 && *w < 1500.0)
                    .collect(),
            ),
            ToolFamily::Length => Self::Lengths(
                items
                    .iter()
                    .filter_map(|r| r.get("length").and_then(as_number))
                    .filter(|l| *l > 0.0)
                    .collect(),
            ),
            ToolFamily::Scored => Self::Scores(
                items
                    .iter()
                    .filter_map(|r| {
                        let score = r.get("score").and_then(as_number)?;
                        let label = headline(r).unwrap_or_else(|| "unnamed".to_string());
                        Some((label, score))
                    })
                    .collect(),
            ),
            ToolFamily::Categorical { field } => Self::Categories(
                items
                    .iter()
                    .filter_map(|r| match r.get(field)? {
                        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
        }
    }

    /// Bucket the series, or `None` when there are too few qualifying points.
    fn into_bars(self) -> Option<Vec<Bar>> {
        match self {
            Self::Years(years) => year_bars(years),
            Self::Weights(weights) if weights.len() >= 2 => Some(weight_bars(&weights)),
            Self::Lengths(lengths) if lengths.len() >= 2 => Some(length_bars(&lengths)),
            Self::Scores(scores) if !scores.is_empty() => Some(score_bars(scores)),
            Self::Categories(categories) if !categories.is_empty() => {
                Some(category_bars(categories))
            }
            _ => None,
        }
    }
}

/// Render the figure for one tool's items, if its family has enough data.
pub fn render(tool: &str, items: &[Record]) -> Option<Figure> {
    let family = ToolFamily::for_tool(tool)?;
    let bars = Series::extract(family, items).into_bars()?;

    let (kind, title, x_label, y_label) = match family {
        ToolFamily::Temporal => (
            FigureKind::Histogram,
            "Results by publication year".to_string(),
            "Year",
            "Results",
        ),
        ToolFamily::MolecularWeight => (
            FigureKind::Histogram,
            "Molecular weight distribution".to_string(),
            "Molecular weight (Da)",
            "Compounds",
        ),
        ToolFamily::Length => (
            FigureKind::Histogram,
            "Length distribution".to_string(),
            "Length",
            "Entries",
        ),
        ToolFamily::Scored => (
            FigureKind::RankedBars,
            "Top hits by score".to_string(),
            "Hit",
            "Score",
        ),
        ToolFamily::Categorical { field } => (
            FigureKind::CategoryCounts,
            format!("Results by {}", field),
            field,
            "Count",
        ),
    };

    let svg = svg::bar_chart(&title, x_label, y_label, &bars);
    Some(Figure {
        tool: tool.to_string(),
        kind,
        title,
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        bars,
        svg,
    })
}

/// First plausible 4-digit year in a year/date value ("2019 Mar 4", 2020, "2021-06").
fn four_digit_year(value: &Value) -> Option<i32> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let bytes = text.as_bytes();
    (0..bytes.len().saturating_sub(3)).find_map(|i| {
        let window = &bytes[i..i + 4];
        let bounded_left = i == 0 || !bytes[i - 1].is_ascii_digit();
        let bounded_right = bytes.get(i + 4).is_none_or(|b| !b.is_ascii_digit());
        if bounded_left && bounded_right && window.iter().all(u8::is_ascii_digit) {
            let year: i32 = std::str::from_utf8(window).ok()?.parse().ok()?;
            (1800..=2100).contains(&year).then_some(year)
        } else {
            None
        }
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn year_bars(years: Vec<i32>) -> Option<Vec<Bar>> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in years {
        *counts.entry(year).or_default() += 1;
    }
    if counts.len() < 2 {
        return None;
    }
    if counts.len() <= MAX_YEAR_BUCKETS {
        return Some(
            counts
                .into_iter()
                .map(|(year, count)| Bar::new(year.to_string(), count as f64))
                .collect(),
        );
    }

    let (&first, _) = counts.first_key_value()?;
    let (&last, _) = counts.last_key_value()?;
    let span = last - first + 1;
    let width = (span + YEAR_BINS - 1) / YEAR_BINS;
    let mut bins = vec![0usize; YEAR_BINS as usize];
    for (year, count) in &counts {
        let idx = ((year - first) / width).min(YEAR_BINS - 1) as usize;
        bins[idx] += count;
    }
    Some(
        bins.into_iter()
            .enumerate()
            .map(|(i, count)| {
                let lo = first + i as i32 * width;
                let hi = lo + width - 1;
                Bar::new(format!("{}–{}", lo, hi), count as f64)
            })
            .collect(),
    )
}

fn weight_bars(weights: &[f64]) -> Vec<Bar> {
    WEIGHT_RANGES
        .iter()
        .map(|&(lo, hi)| {
            let count = weights.iter().filter(|w| **w >= lo && **w < hi).count();
            Bar::new(format!("{}–{}", lo, hi), count as f64)
        })
        .collect()
}

fn length_bars(lengths: &[f64]) -> Vec<Bar> {
    let min = lengths.iter().copied().fold(f64::INFINITY, f64::min);
    let max = lengths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / LENGTH_BINS as f64;

    let mut bins = vec![0usize; LENGTH_BINS];
    for length in lengths {
        let idx = if width > 0.0 {
            (((length - min) / width) as usize).min(LENGTH_BINS - 1)
        } else {
            0
        };
        bins[idx] += 1;
    }

    bins.into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lo = min + i as f64 * width;
            let hi = lo + width;
            Bar::new(format!("{:.0}–{:.0}", lo, hi), count as f64)
        })
        .collect()
}

fn score_bars(mut scores: Vec<(String, f64)>) -> Vec<Bar> {
    // sort_by is stable, so equal scores keep relevance order
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
        .into_iter()
        .take(TOP_BARS)
        .map(|(label, score)| Bar::new(truncate_chars(&label, BAR_LABEL_CHARS), score))
        .collect()
}

fn category_bars(categories: Vec<String>) -> Vec<Bar> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for category in categories {
        *counts.entry(category).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
        .into_iter()
        .take(TOP_BARS)
        .map(|(label, count)| Bar::new(truncate_chars(&label, BAR_LABEL_CHARS), count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::http::record;
    use rstest::rstest;
    use serde_json::json;

    fn with(field: &'static str, values: &[Value]) -> Vec<Record> {
        values.iter().map(|v| record([(field, v.clone())])).collect()
    }

    #[test]
    fn test_year_buckets_for_three_papers() {
        let items = with("year", &[json!("2019"), json!("2020"), json!("2020")]);
        let figure = render("pubmed_search", &items).unwrap();
        assert_eq!(figure.kind, FigureKind::Histogram);
        assert_eq!(
            figure.bars,
            vec![Bar::new("2019", 1.0), Bar::new("2020", 2.0)]
        );
    }

    #[test]
    fn test_single_year_gives_no_figure() {
        let items = with("year", &[json!("2020"), json!("2020 Jan")]);
        assert!(render("europe_pmc", &items).is_none());
    }

    #[rstest]
    #[case(json!("2019 Mar 4"), Some(2019))]
    #[case(json!(2021), Some(2021))]
    #[case(json!("2018-06"), Some(2018))]
    #[case(json!("Spring 12345"), None)]
    #[case(json!("n.d."), None)]
    fn test_four_digit_year(#[case] value: Value, #[case] expected: Option<i32>) {
        assert_eq!(four_digit_year(&value), expected);
    }

    #[test]
    fn test_many_years_are_binned() {
        let values: Vec<Value> = (1990..2020).map(|y| json!(y)).collect();
        let figure = render("openalex_works", &with("year", &values)).unwrap();
        assert_eq!(figure.bars.len(), 10);
        assert_eq!(figure.bars[0].label, "1990–1992");
        let total: f64 = figure.bars.iter().map(|b| b.value).sum();
        assert_eq!(total, 30.0);
    }

    #[test]
    fn test_weights_use_fixed_ranges() {
        let items = with(
            "molecular_weight",
            &[json!(153.18), json!(375.9), json!(12.0), json!(2000.0)],
        );
        let figure = render("pubchem_compound", &items).unwrap();
        assert_eq!(figure.bars.len(), 7);
        assert_eq!(figure.bars[0].value, 1.0);
        assert_eq!(figure.bars[2].value, 1.0);

        let only_one = with("molecular_weight", &[json!(153.18), json!(3000.0)]);
        assert!(render("chembl_molecule", &only_one).is_none());
    }

    #[test]
    fn test_lengths_use_eight_bins() {
        let items = with("length", &[json!(100), json!(180), json!(420), json!(0)]);
        let figure = render("uniprot_search", &items).unwrap();
        assert_eq!(figure.bars.len(), 8);
        assert_eq!(figure.bars[0].value, 1.0);
        assert_eq!(figure.bars[7].value, 1.0);
    }

    #[test]
    fn test_scores_are_ranked_descending() {
        let items: Vec<Record> = [("A", 0.4), ("B", 0.9), ("C", 0.9), ("D", 0.1)]
            .iter()
            .map(|(name, score)| record([("name", json!(name)), ("score", json!(score))]))
            .collect();
        let figure = render("string_interactions", &items).unwrap();
        assert_eq!(figure.kind, FigureKind::RankedBars);
        let labels: Vec<&str> = figure.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_categories_sorted_by_count_then_label() {
        let items = with(
            "phase",
            &[json!("PHASE3"), json!("PHASE2"), json!("PHASE3"), json!("NA")],
        );
        let figure = render("clinical_trials", &items).unwrap();
        assert_eq!(figure.kind, FigureKind::CategoryCounts);
        assert_eq!(figure.bars[0], Bar::new("PHASE3", 2.0));
        assert_eq!(figure.bars[1].label, "NA");
        assert_eq!(figure.bars[2].label, "PHASE2");
    }

    #[test]
    fn test_unknown_tool_has_no_figure() {
        let items = with("year", &[json!(2019), json!(2020)]);
        assert!(render("not_a_tool", &items).is_none());
        assert!(render("pubmed_search", &[]).is_none());
    }

    #[test]
    fn test_render_is_deterministic() {
        let items = with("route", &[json!("ORAL"), json!("INTRAMUSCULAR"), json!("ORAL")]);
        assert_eq!(
            render("openfda_labels", &items),
            render("openfda_labels", &items)
        );
    }
}
