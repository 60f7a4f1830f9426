use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::r#trait::PanelSource;
use super::{parse_dimension, HorizontalAlign, PanelGeometry, TraySource, VerticalAnchor, DEFAULT_TRAY_WIDTH};
use crate::error::{MenuError, Result};
use crate::utils::read_source;

/// Ширина экрана, от которой xfce4-panel считает `length` в процентах
const REFERENCE_WIDTH: f64 = 1920.0;

/// Y ниже этого значения означает панель сверху, что бы ни говорил код `p=`
const TOP_Y_THRESHOLD: i32 = 100;

/// xfce4-panel.xml из xfconf: по блоку `property name="panel-N"` на панель
pub struct XfceSource {
    candidates: Vec<PathBuf>,
}

impl XfceSource {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

impl PanelSource for XfceSource {
    fn source(&self) -> TraySource {
        TraySource::Xfce
    }

    fn read_geometry(&self) -> Result<PanelGeometry> {
        for candidate in self.candidates.iter().filter(|p| p.exists()) {
            let parsed = read_source(candidate).and_then(|content| parse_xfce_panels(&content));

            match parsed {
                Ok(Some(geometry)) => {
                    debug!("XFCE: панель взята из {:?}: {:?}", candidate, geometry);
                    return Ok(geometry);
                }
                Ok(None) => debug!("XFCE: в {:?} нет пригодных панелей", candidate),
                Err(e) => warn!("XFCE: ошибка разбора {:?}: {}", candidate, e),
            }
        }

        MenuError::source_missing("конфигурация xfce4-panel не найдена")
    }
}

/// Сырые значения свойств одного блока panel-N (первое вхождение каждого)
#[derive(Debug, Default)]
struct PanelBlock {
    name: String,
    depth: usize,
    size: Option<String>,
    length: Option<String>,
    position: Option<String>,
}

impl PanelBlock {
    fn record(&mut self, name: &str, value: Option<String>) {
        let slot = match name {
            "size" => &mut self.size,
            "length" => &mut self.length,
            "position" => &mut self.position,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value.unwrap_or_default());
        }
    }

    fn into_geometry(self) -> Result<PanelGeometry> {
        let mut geometry = PanelGeometry::default();

        if let Some(size) = self.size {
            let Some(height) = parse_dimension(&size) else {
                return MenuError::malformed(format!("{}: size=\"{}\" не размер в пикселях", self.name, size));
            };
            geometry.height = Some(height);
        }

        if let Some(length) = self.length {
            geometry.width = Some(match length.trim().parse::<f64>() {
                Ok(percent) if (0.0..=100.0).contains(&percent) => (REFERENCE_WIDTH * (percent / 100.0)) as i32,
                _ => DEFAULT_TRAY_WIDTH,
            });
        }

        if let Some(position) = self.position {
            if let Some((vertical, horizontal)) = anchors_from_position(&position) {
                geometry.vertical_anchor = Some(vertical);
                geometry.horizontal_anchor = Some(horizontal);
            }
        }

        debug!("XFCE: {} → {:?}", self.name, geometry);
        Ok(geometry)
    }
}

/// Разбирает строку вида `p=6;x=960;y=1064`.
///
/// Код `p=` бывает несогласован с координатой `y=`: при маленьком Y панель
/// считается верхней независимо от кода.
fn anchors_from_position(position: &str) -> Option<(VerticalAnchor, HorizontalAlign)> {
    let field = |key: &str| {
        position
            .split(';')
            .filter_map(|part| part.split_once('='))
            .find(|(k, _)| k.trim() == key)
            .map(|(_, v)| v.trim())
    };

    let code = field("p")?;
    let y = field("y").and_then(|v| v.parse::<i32>().ok());

    let Ok(code) = code.parse::<i32>() else {
        return Some((VerticalAnchor::Bottom, HorizontalAlign::Center));
    };

    let mut vertical = match code {
        12 | 2 | 4 => VerticalAnchor::Top,
        _ => VerticalAnchor::Bottom,
    };

    let horizontal = match code {
        8 | 12 => HorizontalAlign::Left,
        10 | 4 => HorizontalAlign::Right,
        _ => HorizontalAlign::Center,
    };

    if let Some(y) = y {
        if y < TOP_Y_THRESHOLD && vertical != VerticalAnchor::Top {
            debug!("XFCE: p={} говорит bottom, но y={} — исправляем на top", code, y);
            vertical = VerticalAnchor::Top;
        }
    }

    Some((vertical, horizontal))
}

fn property_attrs(e: &BytesStart) -> Result<(String, Option<String>)> {
    let mut name = String::new();
    let mut value = None;

    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"name" => name = attr.unescape_value()?.into_owned(),
            b"value" => value = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    Ok((name, value))
}

/// `Ok(None)` — документ корректен, но ни одна панель не дала данных
pub(super) fn parse_xfce_panels(content: &str) -> Result<Option<PanelGeometry>> {
    let mut reader = Reader::from_str(content);
    let mut depth = 0usize;
    let mut current: Option<PanelBlock> = None;
    let mut blocks = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                depth += 1;
                if e.name().as_ref() != b"property" {
                    continue;
                }
                let (name, value) = property_attrs(e)?;
                match current.as_mut() {
                    Some(block) => block.record(&name, value),
                    None if name.starts_with("panel-") => {
                        current = Some(PanelBlock { name, depth, ..PanelBlock::default() });
                    }
                    None => {}
                }
            }
            Event::Empty(ref e) if e.name().as_ref() == b"property" => {
                if let Some(block) = current.as_mut() {
                    let (name, value) = property_attrs(e)?;
                    block.record(&name, value);
                }
            }
            Event::End(_) => {
                if current.as_ref().is_some_and(|b| b.depth == depth) {
                    blocks.extend(current.take());
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut chosen: Option<PanelGeometry> = None;
    for block in blocks {
        let name = block.name.clone();
        let geometry = block.into_geometry()?;
        if geometry.is_empty() {
            continue;
        }

        // Верхняя панель важнее: меню должно открываться под ней
        if geometry.vertical_anchor == Some(VerticalAnchor::Top) {
            debug!("XFCE: используем {} (top)", name);
            return Ok(Some(geometry));
        }
        chosen.get_or_insert(geometry);
    }

    Ok(chosen)
}
