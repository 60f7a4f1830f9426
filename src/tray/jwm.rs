use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::PathBuf;
use tracing::debug;

use super::r#trait::PanelSource;
use super::{parse_dimension, HorizontalAlign, PanelGeometry, TraySource, VerticalAnchor};
use crate::error::{MenuError, Result};
use crate::menu_error;
use crate::utils::read_source;

/// Элемент `<Tray>` из jwmrc-tray (или из самого меню, если отдельного файла нет)
pub struct JwmTraySource {
    tray_file: PathBuf,
    menu_file: PathBuf,
}

impl JwmTraySource {
    pub fn new(tray_file: PathBuf, menu_file: PathBuf) -> Self {
        Self { tray_file, menu_file }
    }

    fn target_file(&self) -> &PathBuf {
        if self.tray_file.exists() {
            &self.tray_file
        } else {
            &self.menu_file
        }
    }
}

impl PanelSource for JwmTraySource {
    fn source(&self) -> TraySource {
        TraySource::Jwm
    }

    fn read_geometry(&self) -> Result<PanelGeometry> {
        let target = self.target_file();
        debug!("Читаем Tray из {:?}", target);
        let content = read_source(target)?;
        parse_tray(&content)
    }
}

pub(super) fn parse_tray(content: &str) -> Result<PanelGeometry> {
    let mut reader = Reader::from_str(content);

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"Tray" => {
                return tray_attributes(e);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(menu_error!(field, "элемент Tray не найден"))
}

fn tray_attributes(e: &BytesStart) -> Result<PanelGeometry> {
    let mut geometry = PanelGeometry {
        vertical_anchor: Some(VerticalAnchor::Bottom),
        horizontal_anchor: Some(HorizontalAlign::Center),
        ..PanelGeometry::default()
    };

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.trim().to_lowercase();

        match attr.key.as_ref() {
            b"height" => geometry.height = Some(parse_int("height", &value)?),
            b"width" => geometry.width = Some(parse_int("width", &value)?),
            // JWM знает ещё "fixed": такая панель не мешает, центрируем меню
            b"valign" => geometry.vertical_anchor = Some(value.parse().unwrap_or(VerticalAnchor::Center)),
            b"halign" => geometry.horizontal_anchor = Some(value.parse().unwrap_or(HorizontalAlign::Center)),
            b"layer" => geometry.layer = Some(value),
            b"autohide" => geometry.autohide = Some(!matches!(value.as_str(), "off" | "false" | "no" | "")),
            _ => {}
        }
    }

    Ok(geometry)
}

fn parse_int(name: &str, value: &str) -> Result<i32> {
    match parse_dimension(value) {
        Some(v) => Ok(v),
        None => MenuError::malformed(format!("Tray {}=\"{}\" не размер в пикселях", name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_tray_attributes() {
        let geometry = parse_tray(
            r#"<?xml version="1.0"?>
<JWM>
  <Tray x="0" y="-1" height="36" width="1024" valign="Top" halign="left" layer="below" autohide="bottom">
    <TrayButton>root:1</TrayButton>
  </Tray>
</JWM>"#,
        )
        .unwrap();

        assert_eq!(geometry.height, Some(36));
        assert_eq!(geometry.width, Some(1024));
        assert_eq!(geometry.vertical_anchor, Some(VerticalAnchor::Top));
        assert_eq!(geometry.horizontal_anchor, Some(HorizontalAlign::Left));
        assert_eq!(geometry.layer.as_deref(), Some("below"));
        assert_eq!(geometry.autohide, Some(true));
    }

    #[test]
    fn test_missing_attributes_stay_unset() {
        let geometry = parse_tray("<JWM><Tray/></JWM>").unwrap();
        assert_eq!(geometry.height, None);
        assert_eq!(geometry.vertical_anchor, Some(VerticalAnchor::Bottom));
        assert_eq!(geometry.layer, None);
    }

    #[test]
    fn test_no_tray_is_an_error() {
        assert!(matches!(parse_tray("<JWM><Menu/></JWM>"), Err(MenuError::FieldMissing(_))));
    }

    #[test]
    fn test_negative_height_is_malformed() {
        assert!(matches!(
            parse_tray(r#"<JWM><Tray height="-2147483648"/></JWM>"#),
            Err(MenuError::SourceMalformed(_))
        ));
        assert!(matches!(
            parse_tray(r#"<JWM><Tray width="-5"/></JWM>"#),
            Err(MenuError::SourceMalformed(_))
        ));
    }

    #[test]
    fn test_bad_height_is_malformed() {
        assert!(matches!(
            parse_tray(r#"<JWM><Tray height="tall"/></JWM>"#),
            Err(MenuError::SourceMalformed(_))
        ));
    }

    #[test]
    fn test_falls_back_to_menu_file() {
        let dir = tempfile::tempdir().unwrap();
        let menu = dir.path().join("jwmrc");
        fs::write(&menu, r#"<JWM><Tray height="44"/></JWM>"#).unwrap();

        let source = JwmTraySource::new(dir.path().join("jwmrc-tray"), menu);
        assert_eq!(source.read_geometry().unwrap().height, Some(44));
    }
}
