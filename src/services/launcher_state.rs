use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::catalog::{Catalog, CatalogLoad, MenuCatalogParser, ParseOutcome};
use crate::config::{Config, PanelSources};
use crate::error::Result;
use crate::events::ProtocolLine;
use crate::i18n::{CategoryAliasTable, Translations};
use crate::position::{AlignmentConfig, Position, PositionCalculator, ScreenGeometry};
use crate::tray::{PanelEnvironmentDetector, TrayInfo};

/// Результат разбора меню: каталог и каталоги иконок меняются только вместе
#[derive(Debug, Clone)]
pub struct MenuSnapshot {
    pub catalog: Arc<Catalog>,
    pub icon_dirs: Vec<PathBuf>,
    pub outcome: ParseOutcome,
}

impl From<CatalogLoad> for MenuSnapshot {
    fn from(load: CatalogLoad) -> Self {
        Self {
            catalog: Arc::new(load.catalog),
            icon_dirs: load.icon_dirs,
            outcome: load.outcome,
        }
    }
}

/// Панель и вычисленная по ней позиция окна
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub tray: TrayInfo,
    pub position: Position,
}

/// Текущее состояние лаунчера.
///
/// Перечитывание сначала строит новое значение целиком, затем подменяет `Arc`
/// одной записью: читатель видит либо старый снимок, либо новый.
pub struct LauncherState {
    config: Arc<Config>,
    aliases: CategoryAliasTable,
    translations: Translations,
    menu_file: PathBuf,
    screen: ScreenGeometry,

    menu: RwLock<Arc<MenuSnapshot>>,
    layout: RwLock<Arc<LayoutSnapshot>>,
}

impl LauncherState {
    pub fn load(
        config: Arc<Config>,
        aliases: CategoryAliasTable,
        translations: Translations,
        menu_file: PathBuf,
        screen: ScreenGeometry,
    ) -> Result<Self> {
        let menu = parse_menu(&menu_file, &aliases)?;
        let layout = detect_layout(&config, sources_for(&config, &menu_file), screen);

        Ok(Self {
            config,
            aliases,
            translations,
            menu_file,
            screen,
            menu: RwLock::new(Arc::new(menu)),
            layout: RwLock::new(Arc::new(layout)),
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn menu_file(&self) -> &Path {
        &self.menu_file
    }

    pub fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    /// Файлы панели с учётом переопределённого файла меню
    pub fn panel_sources(&self) -> PanelSources {
        sources_for(&self.config, &self.menu_file)
    }

    pub fn menu(&self) -> Arc<MenuSnapshot> {
        self.menu.read().clone()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.menu.read().catalog.clone()
    }

    pub fn layout(&self) -> Arc<LayoutSnapshot> {
        self.layout.read().clone()
    }

    /// Полный блок меню для UI: категории с переводом, их записи и каталоги иконок
    pub fn menu_lines(&self) -> Vec<ProtocolLine> {
        let menu = self.menu();
        let mut lines = vec![ProtocolLine::Catalog];

        let keys = menu.catalog.ordered_categories(&self.config.categories.excluded);
        for key in &keys {
            lines.push(ProtocolLine::Category {
                key: key.to_string(),
                label: self.translations.get(key).to_string(),
            });
        }
        for key in &keys {
            for entry in menu.catalog.get(key).unwrap_or_default() {
                lines.push(ProtocolLine::Entry {
                    category: key.to_string(),
                    entry: entry.clone(),
                });
            }
        }
        lines.extend(menu.icon_dirs.iter().cloned().map(ProtocolLine::IconDir));
        lines
    }

    pub fn reload_menu(&self) -> Result<Arc<MenuSnapshot>> {
        let fresh = Arc::new(parse_menu(&self.menu_file, &self.aliases)?);
        *self.menu.write() = fresh.clone();
        info!("Каталог перечитан: {:?}", fresh.outcome);
        Ok(fresh)
    }

    pub fn reload_layout(&self) -> Arc<LayoutSnapshot> {
        let fresh = Arc::new(detect_layout(&self.config, self.panel_sources(), self.screen));
        *self.layout.write() = fresh.clone();
        info!("Панель перечитана, окно в {}", fresh.position);
        fresh
    }
}

fn sources_for(config: &Config, menu_file: &Path) -> PanelSources {
    PanelSources {
        menu_file: menu_file.to_path_buf(),
        ..config.panel_sources()
    }
}

fn parse_menu(menu_file: &Path, aliases: &CategoryAliasTable) -> Result<MenuSnapshot> {
    MenuCatalogParser::new(menu_file, aliases)
        .parse()
        .map(MenuSnapshot::from)
}

fn detect_layout(config: &Config, sources: PanelSources, screen: ScreenGeometry) -> LayoutSnapshot {
    let tray = PanelEnvironmentDetector::new(sources, config.tray.clone()).detect();
    let position = PositionCalculator::calculate_aligned(screen, &tray, &AlignmentConfig::from_config(config));
    LayoutSnapshot { tray, position }
}
