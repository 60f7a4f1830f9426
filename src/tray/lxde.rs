use std::path::PathBuf;
use tracing::{debug, warn};

use super::r#trait::PanelSource;
use super::{parse_dimension, HorizontalAlign, PanelGeometry, TraySource, VerticalAnchor};
use crate::error::{MenuError, Result};
use crate::utils::read_source;

/// Файл панели lxpanel: строки `key=value` внутри блока Global
pub struct LxdeSource {
    candidates: Vec<PathBuf>,
}

impl LxdeSource {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

impl PanelSource for LxdeSource {
    fn source(&self) -> TraySource {
        TraySource::Lxde
    }

    fn read_geometry(&self) -> Result<PanelGeometry> {
        for candidate in self.candidates.iter().filter(|p| p.exists()) {
            match read_source(candidate) {
                Ok(content) => {
                    debug!("LXDE: используем {:?}", candidate);
                    return Ok(parse_lxde(&content));
                }
                Err(e) => warn!("LXDE: не удалось прочитать {:?}: {}", candidate, e),
            }
        }

        MenuError::source_missing("конфигурация lxpanel не найдена")
    }
}

pub(super) fn parse_lxde(content: &str) -> PanelGeometry {
    let mut geometry = PanelGeometry::default();

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key {
            "edge" => match value.to_lowercase().as_str() {
                "top" => geometry.vertical_anchor = Some(VerticalAnchor::Top),
                "bottom" => geometry.vertical_anchor = Some(VerticalAnchor::Bottom),
                // Боковые панели не влияют на вертикальное положение меню
                _ => {}
            },
            "allign" => {
                if let Ok(align) = value.parse::<HorizontalAlign>() {
                    geometry.horizontal_anchor = Some(align);
                }
            }
            "width" => geometry.width = parse_dimension(value).or(geometry.width),
            "height" => geometry.height = parse_dimension(value).or(geometry.height),
            _ => {}
        }
    }

    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PANEL: &str = "# lxpanel <profile> config file\nGlobal {\n  edge=top\n  allign=left\n  margin=4\n  widthtype=percent\n  width=100\n  height=26\n}\nPlugin {\n  type=space\n}\n";

    #[test]
    fn test_parse_global_block() {
        let geometry = parse_lxde(PANEL);
        assert_eq!(geometry.vertical_anchor, Some(VerticalAnchor::Top));
        assert_eq!(geometry.horizontal_anchor, Some(HorizontalAlign::Left));
        assert_eq!(geometry.width, Some(100));
        assert_eq!(geometry.height, Some(26));
    }

    #[test]
    fn test_missing_keys_stay_unset() {
        let geometry = parse_lxde("Global {\n  edge=left\n  height=abc\n  width=-3\n}\n");
        assert_eq!(geometry.vertical_anchor, None);
        assert_eq!(geometry.height, None);
        assert_eq!(geometry.width, None);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second");
        let third = dir.path().join("third");
        fs::write(&second, "edge=top\n").unwrap();
        fs::write(&third, "edge=bottom\n").unwrap();

        let source = LxdeSource::new(vec![dir.path().join("first"), second, third]);
        assert_eq!(source.read_geometry().unwrap().vertical_anchor, Some(VerticalAnchor::Top));
    }

    #[test]
    fn test_no_candidates_is_missing() {
        let source = LxdeSource::new(vec![]);
        assert!(matches!(source.read_geometry(), Err(MenuError::SourceMissing(_))));
    }
}
