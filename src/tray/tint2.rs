use std::path::PathBuf;
use tracing::debug;

use super::r#trait::PanelSource;
use super::{parse_dimension, HorizontalAlign, PanelGeometry, TraySource, VerticalAnchor};
use crate::error::Result;
use crate::utils::read_source;

/// tint2rc: строки `key = value`, нас интересуют panel_size и panel_position
pub struct Tint2Source {
    path: PathBuf,
}

impl Tint2Source {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PanelSource for Tint2Source {
    fn source(&self) -> TraySource {
        TraySource::Tint2
    }

    fn read_geometry(&self) -> Result<PanelGeometry> {
        let content = read_source(&self.path)?;
        Ok(parse_tint2(&content))
    }
}

/// Нечисловые и неизвестные значения пропускаются, разбор не прерывается
pub(super) fn parse_tint2(content: &str) -> PanelGeometry {
    let mut geometry = PanelGeometry::default();

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let parts: Vec<&str> = value.split_whitespace().collect();

        match key.trim() {
            // panel_size = 100% 30
            "panel_size" if parts.len() >= 2 => match parse_dimension(parts[1]) {
                Some(height) => geometry.height = Some(height),
                None => debug!("tint2: пропускаем panel_size '{}'", value.trim()),
            },
            // panel_position = bottom center horizontal
            "panel_position" if parts.len() >= 2 => {
                match parts[0].to_lowercase().as_str() {
                    "top" => geometry.vertical_anchor = Some(VerticalAnchor::Top),
                    "bottom" => geometry.vertical_anchor = Some(VerticalAnchor::Bottom),
                    _ => {}
                }
                if let Ok(align) = parts[1].parse::<HorizontalAlign>() {
                    geometry.horizontal_anchor = Some(align);
                }
            }
            _ => {}
        }
    }

    geometry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_and_position() {
        let geometry = parse_tint2(
            "# Panel\npanel_items = LTSC\npanel_size = 100% 42\npanel_position = top right horizontal\n",
        );
        assert_eq!(geometry.height, Some(42));
        assert_eq!(geometry.vertical_anchor, Some(VerticalAnchor::Top));
        assert_eq!(geometry.horizontal_anchor, Some(HorizontalAlign::Right));
    }

    #[test]
    fn test_bad_numbers_are_skipped() {
        let geometry = parse_tint2("panel_size = 100% big\npanel_position = center left\n");
        assert_eq!(geometry.height, None);
        // "center" не годится как вертикальная позиция tint2
        assert_eq!(geometry.vertical_anchor, None);
        assert_eq!(geometry.horizontal_anchor, Some(HorizontalAlign::Left));

        let negative = parse_tint2("panel_size = 100% -2147483648\n");
        assert_eq!(negative.height, None);
    }

    #[test]
    fn test_missing_file_fails_the_step() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Tint2Source::new(dir.path().join("tint2rc")).read_geometry().is_err());
    }
}
