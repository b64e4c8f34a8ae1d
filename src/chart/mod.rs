//! Vega-Lite line chart over a Long Table.

use crate::models::{LongTable, PRICE_LABEL};
use serde::Serialize;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

const DATE_FIELD: &str = "Date";
const NAME_FIELD: &str = "Name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Temporal,
    Quantitative,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkType,
    pub opacity: f64,
    /// Clip marks that fall outside the fixed y domain.
    pub clip: bool,
    /// Break the line at null prices instead of bridging them.
    pub invalid: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub field: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scale {
    pub domain: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAxis {
    pub field: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldType,
    /// Always serialized as `null`: overlaid lines, never stacked.
    pub stack: Option<&'static str>,
    pub scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub x: FieldDef,
    pub y: PriceAxis,
    pub color: FieldDef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub values: LongTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub width: &'static str,
    pub data: InlineData,
    pub mark: Mark,
    pub encoding: Encoding,
}

/// Build the chart. The y scale is pinned to `y_range` whatever the data
/// holds; points outside it stay in `data` and are clipped when drawn.
pub fn build(long: &LongTable, y_range: (f64, f64)) -> ChartSpec {
    let (ymin, ymax) = y_range;

    ChartSpec {
        schema: VEGA_LITE_SCHEMA,
        width: "container",
        data: InlineData {
            values: long.clone(),
        },
        mark: Mark {
            kind: MarkType::Line,
            opacity: 0.8,
            clip: true,
            invalid: "break-paths-show-domains",
        },
        encoding: Encoding {
            x: FieldDef {
                field: DATE_FIELD,
                kind: FieldType::Temporal,
            },
            y: PriceAxis {
                field: PRICE_LABEL,
                kind: FieldType::Quantitative,
                stack: None,
                scale: Scale {
                    domain: [ymin, ymax],
                },
            },
            color: FieldDef {
                field: NAME_FIELD,
                kind: FieldType::Nominal,
            },
        },
    }
}

impl ChartSpec {
    pub fn point_count(&self) -> usize {
        self.data.values.len()
    }

    /// Distinct series, in first-seen order. One hue each.
    pub fn series_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.data.values.rows {
            if !names.contains(&row.name.as_str()) {
                names.push(&row.name);
            }
        }
        names
    }

    pub fn y_domain(&self) -> (f64, f64) {
        let [lo, hi] = self.encoding.y.scale.domain;
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LongRow, WideRow, WideTable};
    use crate::provider::testing::march;
    use crate::reshape::to_long;
    use serde_json::json;

    fn apple_two_days() -> LongTable {
        to_long(&WideTable {
            dates: vec![march(4), march(5)],
            rows: vec![WideRow { name: "apple".into(), values: vec![Some(100.0), Some(102.0)] }],
        })
    }

    #[test]
    fn test_two_points_one_series() {
        let chart = build(&apple_two_days(), (0.0, 3500.0));
        assert_eq!(chart.point_count(), 2);
        assert_eq!(chart.series_names(), vec!["apple"]);
    }

    #[test]
    fn test_domain_is_fixed_and_data_is_kept() {
        let long = LongTable {
            rows: [50.0, 99.0, 120.0, 150.0]
                .iter()
                .enumerate()
                .map(|(i, p)| LongRow { name: "netflix".into(), date: march(4 + i as u32), price: Some(*p) })
                .collect(),
        };

        let chart = build(&long, (0.0, 100.0));
        assert_eq!(chart.y_domain(), (0.0, 100.0));
        assert_eq!(chart.point_count(), 4);
        assert!(chart.data.values.rows.iter().any(|r| r.price == Some(150.0)));
        assert!(chart.mark.clip);
    }

    #[test]
    fn test_serialized_shape() {
        let chart = build(&apple_two_days(), (0.0, 100.0));
        let v = serde_json::to_value(&chart).unwrap();

        assert_eq!(v["$schema"], json!(VEGA_LITE_SCHEMA));
        assert_eq!(v["mark"], json!({
            "type": "line", "opacity": 0.8, "clip": true, "invalid": "break-paths-show-domains"
        }));
        assert_eq!(v["encoding"], json!({
            "x": { "field": "Date", "type": "temporal" },
            "y": {
                "field": "Stock Prices(USD)",
                "type": "quantitative",
                "stack": null,
                "scale": { "domain": [0.0, 100.0] }
            },
            "color": { "field": "Name", "type": "nominal" }
        }));
        assert_eq!(v["data"]["values"][1], json!({
            "Name": "apple", "Date": "2024-03-05", "Stock Prices(USD)": 102.0
        }));
    }

    #[test]
    fn test_gap_serializes_as_null() {
        let long = LongTable {
            rows: vec![LongRow { name: "google".into(), date: march(4), price: None }],
        };
        let v = serde_json::to_value(build(&long, (0.0, 1.0))).unwrap();
        assert!(v["data"]["values"][0]["Stock Prices(USD)"].is_null());
    }
}
