use notify::{event::EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::hover_service::HoverHandle;
use super::launcher_state::LauncherState;
use super::r#trait::LauncherService;
use crate::error::Result;
use crate::events::{DisplayCommand, ProtocolLine};
use crate::trace_if_enabled;

/// Редакторы пишут файл в несколько приёмов: ждём тишины перед перечитыванием
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Что нужно перечитать после пачки событий
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Change {
    pub menu: bool,
    pub panel: bool,
}

impl Change {
    fn merge(&mut self, other: Change) {
        self.menu |= other.menu;
        self.panel |= other.panel;
    }

    fn is_empty(&self) -> bool {
        !self.menu && !self.panel
    }
}

/// Файлы, за которыми следим, и классификация событий по ним
#[derive(Debug, Clone)]
pub struct WatchTargets {
    menu_file: PathBuf,
    panel_files: Vec<PathBuf>,
}

impl WatchTargets {
    pub fn from_state(state: &LauncherState) -> Self {
        let sources = state.panel_sources();
        let mut panel_files = sources.watched_files();
        panel_files.push(sources.wm_hint);

        Self {
            menu_file: state.menu_file().to_path_buf(),
            panel_files,
        }
    }

    /// Существующие родительские каталоги: так ловятся атомарные замены файлов
    pub fn directories(&self) -> Vec<PathBuf> {
        let dirs: BTreeSet<PathBuf> = std::iter::once(&self.menu_file)
            .chain(self.panel_files.iter())
            .filter_map(|file| file.parent())
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf)
            .collect();
        dirs.into_iter().collect()
    }

    pub fn classify(&self, event: &notify::Event) -> Change {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
            return Change::default();
        }

        let mut change = Change::default();
        for path in &event.paths {
            if *path == self.menu_file {
                // Меню может содержать и Tray, поэтому панель тоже перечитывается
                change.menu = true;
                change.panel = true;
            } else if self.panel_files.iter().any(|f| f == path) {
                change.panel = true;
            }
        }
        change
    }
}

pub struct SourceWatcher {
    state: Arc<LauncherState>,
    hover: HoverHandle,
    output: mpsc::UnboundedSender<DisplayCommand>,
    lines: mpsc::UnboundedSender<ProtocolLine>,
    targets: WatchTargets,
    events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    // Наблюдатель живёт, пока живёт сервис
    _watcher: RecommendedWatcher,
}

impl SourceWatcher {
    pub fn new(
        state: Arc<LauncherState>,
        hover: HoverHandle,
        output: mpsc::UnboundedSender<DisplayCommand>,
        lines: mpsc::UnboundedSender<ProtocolLine>,
    ) -> Result<Self> {
        let targets = WatchTargets::from_state(&state);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                // Получатель исчезает только вместе с сервисом
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;

        for dir in targets.directories() {
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => debug!("Отслеживаем каталог {:?}", dir),
                Err(e) => warn!("Не удалось отслеживать {:?}: {}", dir, e),
            }
        }

        Ok(Self {
            state,
            hover,
            output,
            lines,
            targets,
            events: rx,
            _watcher: watcher,
        })
    }

    /// Собирает пачку событий до паузы длиной `DEBOUNCE`; `None` — канал закрыт
    async fn next_change(&mut self) -> Option<Change> {
        let mut change = Change::default();

        loop {
            let received = if change.is_empty() {
                self.events.recv().await
            } else {
                match tokio::time::timeout(DEBOUNCE, self.events.recv()).await {
                    Ok(received) => received,
                    Err(_) => return Some(change),
                }
            };

            match received {
                Some(Ok(event)) => {
                    trace_if_enabled!("Событие файловой системы: {:?}", event);
                    change.merge(self.targets.classify(&event));
                }
                Some(Err(e)) => error!("Ошибка наблюдателя файлов: {}", e),
                None => return if change.is_empty() { None } else { Some(change) },
            }
        }
    }
}

#[async_trait::async_trait]
impl LauncherService for SourceWatcher {
    async fn run(self: Box<Self>) -> Result<()> {
        let mut this = self;
        info!("Наблюдение за файлами меню и панели запущено");

        while let Some(change) = this.next_change().await {
            apply_change(change, &this.state, &this.hover, &this.output, &this.lines)?;
        }

        info!("Наблюдатель файлов остановлен");
        Ok(())
    }
}

/// Перечитывает затронутые источники и уведомляет остальных.
///
/// Новый блок меню уходит в UI раньше, чем движок наведения узнает о новом
/// каталоге: `show`/`selected` всегда ссылаются на уже отправленные категории.
pub fn apply_change(
    change: Change,
    state: &LauncherState,
    hover: &HoverHandle,
    output: &mpsc::UnboundedSender<DisplayCommand>,
    lines: &mpsc::UnboundedSender<ProtocolLine>,
) -> Result<()> {
    if change.menu {
        match state.reload_menu() {
            Ok(menu) => {
                for line in state.menu_lines() {
                    // Закрытый вывод означает завершение программы
                    let _ = lines.send(line);
                }
                hover.reload(menu.catalog.clone())?;
            }
            Err(e) => warn!("Меню не перечитано, оставляем прежний каталог: {}", e),
        }
    }

    if change.panel {
        let before = state.layout().position;
        let layout = state.reload_layout();
        if layout.position != before {
            // Закрытый вывод означает завершение программы
            let _ = output.send(DisplayCommand::Place(layout.position));
        }
    }

    Ok(())
}
