//! Детекция панели задач: где она находится и сколько места занимает.
//!
//! Этот модуль отвечает ТОЛЬКО за получение `TrayInfo` из конфигов JWM, tint2,
//! XFCE и LXDE. Расчёт позиции окна живёт в `position`, а реакция на изменения
//! файлов в `services::source_watcher`.

mod detector;
mod environment;
mod jwm;
mod lxde;
mod tint2;
mod r#trait;
mod xfce;

pub use self::detector::PanelEnvironmentDetector;
pub use self::r#trait::PanelSource;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use crate::position::HorizontalAlign;

/// Вертикальная привязка панели
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    #[default]
    Bottom,
    Center,
}

impl FromStr for VerticalAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "center" => Ok(Self::Center),
            other => Err(format!("неизвестная вертикальная привязка: {}", other)),
        }
    }
}

impl fmt::Display for VerticalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Center => "center",
        };
        f.write_str(s)
    }
}

/// Откуда получены данные о панели
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraySource {
    Jwm,
    Tint2,
    Xfce,
    Lxde,
    #[default]
    Default,
}

impl fmt::Display for TraySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Jwm => "jwm",
            Self::Tint2 => "tint2",
            Self::Xfce => "xfce",
            Self::Lxde => "lxde",
            Self::Default => "default",
        };
        f.write_str(s)
    }
}

/// Итоговая геометрия панели
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayInfo {
    pub height: i32,
    pub width: i32,
    pub vertical_anchor: VerticalAnchor,
    pub horizontal_anchor: HorizontalAlign,
    pub layer: String,
    pub autohide: bool,
    pub source: TraySource,
}

pub const DEFAULT_TRAY_HEIGHT: i32 = 30;
pub const DEFAULT_TRAY_WIDTH: i32 = 1300;
pub const DEFAULT_TRAY_LAYER: &str = "above";

/// Больше этого размер панели в пикселях не бывает
pub const MAX_PANEL_DIMENSION: i32 = 16384;

/// Размер панели из конфига: целое в `[0, MAX_PANEL_DIMENSION]`
pub fn parse_dimension(value: &str) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|v| (0..=MAX_PANEL_DIMENSION).contains(v))
}

impl Default for TrayInfo {
    fn default() -> Self {
        Self {
            height: DEFAULT_TRAY_HEIGHT,
            width: DEFAULT_TRAY_WIDTH,
            vertical_anchor: VerticalAnchor::Bottom,
            horizontal_anchor: HorizontalAlign::Center,
            layer: DEFAULT_TRAY_LAYER.to_string(),
            autohide: false,
            source: TraySource::Default,
        }
    }
}

impl TrayInfo {
    /// Собирает полный `TrayInfo`: поля, которых нет в `geometry`, берутся из значений по умолчанию
    pub fn from_geometry(geometry: PanelGeometry, source: TraySource) -> Self {
        let defaults = Self::default();
        Self {
            height: geometry.height.unwrap_or(defaults.height),
            width: geometry.width.unwrap_or(defaults.width),
            vertical_anchor: geometry.vertical_anchor.unwrap_or(defaults.vertical_anchor),
            horizontal_anchor: geometry.horizontal_anchor.unwrap_or(defaults.horizontal_anchor),
            layer: geometry.layer.unwrap_or(defaults.layer),
            autohide: geometry.autohide.unwrap_or(defaults.autohide),
            source,
        }
    }
}

impl fmt::Display for TrayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} {}/{} layer={} autohide={}",
            self.source,
            self.width,
            self.height,
            self.vertical_anchor,
            self.horizontal_anchor,
            self.layer,
            if self.autohide { "on" } else { "off" }
        )
    }
}

/// Частичный результат разбора одного источника: `None` означает "ключ не найден"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelGeometry {
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub vertical_anchor: Option<VerticalAnchor>,
    pub horizontal_anchor: Option<HorizontalAlign>,
    pub layer: Option<String>,
    pub autohide: Option<bool>,
}

impl PanelGeometry {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
