//! Расчёт координат окна меню относительно экрана и панели.
//!
//! Чистая функция без ввода-вывода: всё, что ей нужно, передаётся аргументами.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tray::{TrayInfo, VerticalAnchor};

/// Отступ от края экрана при выравнивании влево/вправо
pub const EDGE_MARGIN: i32 = 10;

/// Горизонтальное выравнивание (окна меню или панели)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl FromStr for HorizontalAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(format!("неизвестное выравнивание: {}", other)),
        }
    }
}

impl fmt::Display for HorizontalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: i32,
    pub height: i32,
}

impl ScreenGeometry {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl FromStr for ScreenGeometry {
    type Err = String;

    /// Формат `1920x1080`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("ожидался формат WxH: {}", s))?;
        let width = w.trim().parse::<i32>().map_err(|e| format!("ширина '{}': {}", w, e))?;
        let height = h.trim().parse::<i32>().map_err(|e| format!("высота '{}': {}", h, e))?;
        if width <= 0 || height <= 0 {
            return Err(format!("размер экрана должен быть положительным: {}", s));
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

/// Внешние настройки размещения окна
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentConfig {
    pub horizontal: HorizontalAlign,
    pub window_width: i32,
    pub window_height: i32,
}

impl AlignmentConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            horizontal: config.horizontal_align(),
            window_width: config.window.width,
            window_height: config.window.height,
        }
    }

    pub fn window_size(&self) -> WindowSize {
        WindowSize {
            width: self.window_width,
            height: self.window_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

pub struct PositionCalculator;

impl PositionCalculator {
    /// Координаты левого верхнего угла окна меню.
    ///
    /// Результат всегда лежит в `[0, screen - window]` по каждой оси; если окно
    /// больше экрана, координата равна 0.
    pub fn calculate(
        screen: ScreenGeometry,
        tray: &TrayInfo,
        window: WindowSize,
        horizontal: HorizontalAlign,
    ) -> Position {
        // Считаем в i64: размеры приходят из чужих конфигов и могут быть любыми
        let (screen_w, screen_h) = (i64::from(screen.width), i64::from(screen.height));
        let (window_w, window_h) = (i64::from(window.width), i64::from(window.height));
        let tray_h = i64::from(tray.height);
        let margin = i64::from(EDGE_MARGIN);

        let x = match horizontal {
            HorizontalAlign::Left => margin,
            HorizontalAlign::Right => screen_w - window_w - margin,
            HorizontalAlign::Center => (screen_w - window_w) / 2,
        };

        let y = match tray.vertical_anchor {
            VerticalAnchor::Top => tray_h,
            VerticalAnchor::Bottom => screen_h - tray_h - window_h,
            VerticalAnchor::Center => (screen_h - window_h) / 2,
        };

        Position {
            x: clamp_axis(x, screen_w - window_w),
            y: clamp_axis(y, screen_h - window_h),
        }
    }

    pub fn calculate_aligned(screen: ScreenGeometry, tray: &TrayInfo, alignment: &AlignmentConfig) -> Position {
        Self::calculate(screen, tray, alignment.window_size(), alignment.horizontal)
    }
}

// min/max вместо clamp: при окне больше экрана верхняя граница отрицательна
fn clamp_axis(value: i64, upper: i64) -> i32 {
    i32::try_from(value.min(upper).max(0)).unwrap_or(0)
}
