//! Asset color map ingest: asset name → [R, G, B], channels in [0, 1].
//!
//! Grounded in `examples/original_source/asset_colors.py` and the weighted
//! color blend in `modules/data_types.py::plot_color`.

use crate::error::PortfolioError;
use crate::market::AssetUniverse;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Deserialize)]
#[serde(transparent)]
struct RawColorMap(HashMap<String, [f32; 3]>);

#[derive(Clone, Debug)]
pub struct ColorMap(HashMap<String, [f32; 3]>);

impl ColorMap {
    #[cfg(test)]
    pub(crate) fn from_map_for_test(map: HashMap<String, [f32; 3]>) -> Self {
        ColorMap(map)
    }

    pub fn get(&self, asset: &str) -> Option<[f32; 3]> {
        self.0.get(asset).copied()
    }

    /// Every market asset must have a color entry, or this is a
    /// [`PortfolioError::ColorMissing`] (collected, not raised eagerly).
    pub fn missing_for(&self, universe: &AssetUniverse) -> Vec<PortfolioError> {
        universe
            .names()
            .iter()
            .filter(|name| !self.0.contains_key(name.as_str()))
            .map(|name| PortfolioError::ColorMissing {
                asset: name.clone(),
            })
            .collect()
    }

    /// Weighted blend of an allocation's asset colors, normalized the way
    /// the original `plot_color` does: each channel divided by the max
    /// channel so the result stays in [0, 1].
    pub fn blend(&self, weights: &[(&str, i32)]) -> Result<(f32, f32, f32), PortfolioError> {
        let mut color = [0.0f32, 0.0, 0.0];
        for &(asset, weight) in weights {
            let rgb = self.get(asset).ok_or_else(|| PortfolioError::ColorMissing {
                asset: asset.to_string(),
            })?;
            for c in 0..3 {
                color[c] += rgb[c] * weight as f32 / 100.0;
            }
        }
        let max = color.iter().cloned().fold(f32::MIN, f32::max).max(1.0);
        Ok((color[0] / max, color[1] / max, color[2] / max))
    }
}

pub fn read_color_config(path: &Path) -> Result<ColorMap, PortfolioError> {
    let text = std::fs::read_to_string(path)?;
    let raw: RawColorMap = serde_json::from_str(&text)
        .map_err(|e| PortfolioError::Config(format!("invalid color config: {e}")))?;
    Ok(ColorMap(raw.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_weighted_average_normalizes_to_unit_max() {
        let mut m = HashMap::new();
        m.insert("A".to_string(), [1.0, 0.0, 0.0]);
        m.insert("B".to_string(), [0.0, 0.0, 1.0]);
        let map = ColorMap(m);
        let (r, g, b) = map.blend(&[("A", 50), ("B", 50)]).unwrap();
        assert!((r - 1.0).abs() < 1e-6);
        assert!(g.abs() < 1e-6);
        assert!((b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_color_surfaces_as_color_missing() {
        let map = ColorMap(HashMap::new());
        let err = map.blend(&[("A", 100)]).unwrap_err();
        assert!(matches!(err, PortfolioError::ColorMissing { .. }));
    }

    #[test]
    fn sub_unit_color_is_left_unchanged_not_brightened() {
        // max(r, g, b, 1.0): a 1.0 floor, not a divisor that rescales
        // every color up to saturate its largest channel.
        let mut m = HashMap::new();
        m.insert("A".to_string(), [0.2, 0.4, 0.1]);
        let map = ColorMap(m);
        let (r, g, b) = map.blend(&[("A", 100)]).unwrap();
        assert!((r - 0.2).abs() < 1e-6);
        assert!((g - 0.4).abs() < 1e-6);
        assert!((b - 0.1).abs() < 1e-6);
    }
}
