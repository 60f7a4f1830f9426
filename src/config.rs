use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::position::HorizontalAlign;
use crate::utils::resolve_path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub window: WindowConfig,
    pub hover: HoverConfig,
    pub paths: PathsConfig,
    pub tray: TrayPreference,
    pub categories: CategoriesConfig,
    #[serde(default)]
    pub favorites: Vec<FavoriteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
    pub halign: String,
    pub screen_width: i32,
    pub screen_height: i32,
}

/// Задержки hover-логики в миллисекундах
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HoverConfig {
    pub category_delay_ms: u64,
    pub favorites_delay_ms: u64,
    pub favorites_grace_ms: u64,
    pub restore_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    pub menu_file: String,
    pub jwmrc_tray: String,
    pub tint2rc: String,
    pub xfce_panel: Vec<String>,
    pub lxde_panel: Vec<String>,
    pub wm_hint: String,
    pub locale_dirs: Vec<String>,
}

/// Пользовательский выбор источника панели (учитывается только для JWM)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrayPreference {
    #[serde(default)]
    pub use_tint2: bool,
    #[serde(default)]
    pub use_xfce: bool,
    #[serde(default)]
    pub use_lxde: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoriesConfig {
    #[serde(default)]
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FavoriteConfig {
    pub name: String,
    #[serde(default)]
    pub exec: String,
    #[serde(default = "default_favorite_icon")]
    pub icon: String,
}

fn default_favorite_icon() -> String {
    "star".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            window: WindowConfig {
                width: 715,
                height: 491,
                halign: "left".to_string(),
                screen_width: 1920,
                screen_height: 1080,
            },
            hover: HoverConfig {
                category_delay_ms: 250,
                favorites_delay_ms: 200,
                favorites_grace_ms: 300,
                restore_delay_ms: 150,
            },
            paths: PathsConfig {
                menu_file: "~/.jwmrc".to_string(),
                jwmrc_tray: "~/.jwmrc-tray".to_string(),
                tint2rc: "~/.config/tint2/tint2rc".to_string(),
                xfce_panel: vec![
                    "~/.config/xfce4/xfconf/xfce-perchannel-xml/xfce4-panel.xml".to_string(),
                    "/etc/xdg/xfce4/panel/default.xml".to_string(),
                    "/usr/share/xfce4/panel/default.xml".to_string(),
                ],
                lxde_panel: vec![
                    "~/.config/lxpanel/LXDE/panels/panel".to_string(),
                    "/etc/xdg/lxpanel/LXDE/panels/panel".to_string(),
                    "/usr/share/lxpanel/profile/LXDE/panels/panel".to_string(),
                ],
                wm_hint: "/etc/windowmanager".to_string(),
                locale_dirs: vec![
                    "~/.config/menupup/locale".to_string(),
                    "/usr/local/share/locale/menupup".to_string(),
                    "/usr/share/locale/menupup".to_string(),
                ],
            },
            tray: TrayPreference::default(),
            categories: CategoriesConfig::default(),
            favorites: Vec::new(),
        }
    }
}

impl Config {
    /// Путь к конфигурации по умолчанию: ~/.config/menupup/config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("menupup")
            .join("config.toml")
    }

    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл не ошибка: остаются значения по умолчанию
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("MENUPUP_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация окна
        if self.window.halign.parse::<HorizontalAlign>().is_err() {
            anyhow::bail!("Неверное выравнивание окна: {}", self.window.halign);
        }

        if self.window.width <= 0 || self.window.height <= 0 {
            anyhow::bail!(
                "Размер окна должен быть положительным: {}x{}",
                self.window.width,
                self.window.height
            );
        }

        if self.window.screen_width <= 0 || self.window.screen_height <= 0 {
            anyhow::bail!(
                "Размер экрана должен быть положительным: {}x{}",
                self.window.screen_width,
                self.window.screen_height
            );
        }

        // Валидация задержек
        let delays = [
            ("category_delay_ms", self.hover.category_delay_ms),
            ("favorites_delay_ms", self.hover.favorites_delay_ms),
            ("favorites_grace_ms", self.hover.favorites_grace_ms),
            ("restore_delay_ms", self.hover.restore_delay_ms),
        ];
        for (name, value) in delays {
            if value == 0 {
                anyhow::bail!("{} должно быть больше 0", name);
            }
        }

        if self.paths.menu_file.trim().is_empty() {
            anyhow::bail!("paths.menu_file не может быть пустым");
        }

        Ok(())
    }

    pub fn horizontal_align(&self) -> HorizontalAlign {
        self.window.halign.parse().unwrap_or_default()
    }

    pub fn menu_file(&self) -> PathBuf {
        resolve_path(&self.paths.menu_file)
    }

    pub fn locale_dirs(&self) -> Vec<PathBuf> {
        self.paths.locale_dirs.iter().map(|p| resolve_path(p)).collect()
    }

    /// Пути к источникам панели с раскрытой `~`
    pub fn panel_sources(&self) -> PanelSources {
        PanelSources {
            wm_hint: resolve_path(&self.paths.wm_hint),
            jwmrc_tray: resolve_path(&self.paths.jwmrc_tray),
            menu_file: self.menu_file(),
            tint2rc: resolve_path(&self.paths.tint2rc),
            xfce_panel: self.paths.xfce_panel.iter().map(|p| resolve_path(p)).collect(),
            lxde_panel: self.paths.lxde_panel.iter().map(|p| resolve_path(p)).collect(),
        }
    }
}

impl HoverConfig {
    pub fn category_delay(&self) -> Duration {
        Duration::from_millis(self.category_delay_ms)
    }

    pub fn favorites_delay(&self) -> Duration {
        Duration::from_millis(self.favorites_delay_ms)
    }

    pub fn favorites_grace(&self) -> Duration {
        Duration::from_millis(self.favorites_grace_ms)
    }

    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.restore_delay_ms)
    }
}

/// Конкретные файлы, которые просматривает детектор панели
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSources {
    pub wm_hint: PathBuf,
    pub jwmrc_tray: PathBuf,
    pub menu_file: PathBuf,
    pub tint2rc: PathBuf,
    pub xfce_panel: Vec<PathBuf>,
    pub lxde_panel: Vec<PathBuf>,
}

impl PanelSources {
    /// Все файлы, изменение которых требует повторной детекции
    pub fn watched_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.jwmrc_tray.clone(), self.tint2rc.clone()];
        files.extend(self.xfce_panel.iter().cloned());
        files.extend(self.lxde_panel.iter().cloned());
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.window.halign = "middle".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.hover.category_delay_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.screen_width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_merges_file_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[window]
width = 600
height = 400
halign = "right"
screen_width = 1366
screen_height = 768

[tray]
use_tint2 = true

[[favorites]]
name = "Firefox"
exec = "firefox"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.window.width, 600);
        assert_eq!(config.horizontal_align(), HorizontalAlign::Right);
        assert!(config.tray.use_tint2);
        assert!(!config.tray.use_xfce);
        // Секции, которых нет в файле, берутся из значений по умолчанию
        assert_eq!(config.hover.category_delay_ms, 250);
        assert_eq!(config.favorites.len(), 1);
        assert_eq!(config.favorites[0].icon, "star");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.window.width, 715);
        assert_eq!(config.paths.xfce_panel.len(), 3);
    }

    #[test]
    fn test_watched_files_cover_all_panel_sources() {
        let config = Config::default();
        let sources = config.panel_sources();
        assert_eq!(sources.watched_files().len(), 2 + 3 + 3);
        assert!(sources.menu_file.ends_with(".jwmrc"));
    }
}
