use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::TrayPreference;

/// Оконное окружение по файлу-подсказке (обычно /etc/windowmanager)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Openbox,
    Xfce,
    Lxde,
    Jwm,
}

impl DesktopEnvironment {
    pub fn detect(hint_file: &Path) -> Self {
        match fs::read_to_string(hint_file) {
            Ok(content) => Self::classify(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Файл {:?} не найден, считаем что это JWM", hint_file);
                Self::Jwm
            }
            Err(e) => {
                warn!("Не удалось прочитать {:?}: {}", hint_file, e);
                Self::Jwm
            }
        }
    }

    pub fn classify(content: &str) -> Self {
        let content = content.trim().to_lowercase();

        if content.contains("openbox") {
            Self::Openbox
        } else if content.contains("xfce") {
            Self::Xfce
        } else if content.contains("lxde") || content.contains("lxpanel") {
            Self::Lxde
        } else {
            Self::Jwm
        }
    }

    /// Какие источники пробовать: Openbox/XFCE/LXDE диктуют свой формат,
    /// под JWM решает пользовательская настройка.
    pub fn source_plan(&self, preference: &TrayPreference) -> SourcePlan {
        match self {
            Self::Openbox => SourcePlan { use_xfce: false, use_lxde: false, use_tint2: true },
            Self::Xfce => SourcePlan { use_xfce: true, use_lxde: false, use_tint2: false },
            Self::Lxde => SourcePlan { use_xfce: false, use_lxde: true, use_tint2: false },
            Self::Jwm => SourcePlan {
                use_xfce: preference.use_xfce,
                use_lxde: preference.use_lxde,
                use_tint2: preference.use_tint2,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePlan {
    pub use_xfce: bool,
    pub use_lxde: bool,
    pub use_tint2: bool,
}
