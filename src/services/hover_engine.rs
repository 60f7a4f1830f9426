//! Машина состояний наведения: предпросмотр категорий, постоянный выбор и
//! оверлей избранного.
//!
//! Движок однопоточный и ничего не знает о времени: задержки он заказывает
//! у `TimerScheduler`, а срабатывания получает обратно через `handle_timer`.
//! В любой момент ожидает не больше одного таймера наведения (категория,
//! избранное или очистка избранного); отдельно может ожидать таймер
//! восстановления после ухода указателя с меню.

use smallvec::{smallvec, SmallVec};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::timer::{TimerKind, TimerScheduler, TimerToken};
use crate::catalog::Catalog;
use crate::config::{Config, HoverConfig};
use crate::debug_if_enabled;
use crate::events::{DisplayCommand, HoverEvent};

pub type Commands = SmallVec<[DisplayCommand; 2]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverState {
    Idle,
    PendingCategory { category: String, token: TimerToken },
    ActiveCategoryPreview(String),
    SelectedCategory(String),
    PendingFavorites { token: TimerToken },
    ActiveFavorites,
}

/// Что сейчас показано в правой части меню
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Displayed {
    Nothing,
    Category(String),
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverDelays {
    pub category: Duration,
    pub favorites: Duration,
    pub favorites_grace: Duration,
    pub restore: Duration,
}

impl HoverDelays {
    pub fn from_config(config: &HoverConfig) -> Self {
        Self {
            category: config.category_delay(),
            favorites: config.favorites_delay(),
            favorites_grace: config.favorites_grace(),
            restore: config.restore_delay(),
        }
    }
}

impl Default for HoverDelays {
    fn default() -> Self {
        Self::from_config(&Config::default().hover)
    }
}

pub struct HoverSelectionEngine<S: TimerScheduler> {
    scheduler: S,
    delays: HoverDelays,
    catalog: Arc<Catalog>,
    excluded: Vec<String>,
    favorites_available: bool,

    state: HoverState,
    selected: Option<String>,
    displayed: Displayed,
    hover_timer: Option<(TimerToken, TimerKind)>,
    restore_timer: Option<TimerToken>,
}

impl<S: TimerScheduler> HoverSelectionEngine<S> {
    pub fn new(scheduler: S, delays: HoverDelays, catalog: Arc<Catalog>) -> Self {
        Self {
            scheduler,
            delays,
            catalog,
            excluded: Vec::new(),
            favorites_available: false,
            state: HoverState::Idle,
            selected: None,
            displayed: Displayed::Nothing,
            hover_timer: None,
            restore_timer: None,
        }
    }

    pub fn from_config(scheduler: S, config: &Config, catalog: Arc<Catalog>) -> Self {
        Self::new(scheduler, HoverDelays::from_config(&config.hover), catalog)
            .with_excluded(config.categories.excluded.clone())
            .with_favorites(!config.favorites.is_empty())
    }

    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn with_favorites(mut self, available: bool) -> Self {
        self.favorites_available = available;
        self
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn displayed(&self) -> &Displayed {
        &self.displayed
    }

    /// Начальный выбор: первая видимая категория каталога
    pub fn start(&mut self) -> Commands {
        self.cancel_all();
        match self.first_category() {
            Some(first) => self.select(first),
            None => {
                self.selected = None;
                self.displayed = Displayed::Nothing;
                self.state = HoverState::Idle;
                Commands::new()
            }
        }
    }

    /// Подмена каталога после перечитывания меню.
    ///
    /// Все таймеры отменяются; выбор сохраняется, если категория осталась.
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) -> Commands {
        self.cancel_all();
        self.catalog = catalog;

        let keep = self
            .selected
            .take()
            .filter(|key| self.is_selectable(key));

        match keep.or_else(|| self.first_category()) {
            Some(key) => {
                info!("Каталог обновлён, выбрана категория '{}'", key);
                self.select(key)
            }
            None => {
                self.displayed = Displayed::Nothing;
                self.state = HoverState::Idle;
                Commands::new()
            }
        }
    }

    pub fn handle_event(&mut self, event: HoverEvent) -> Commands {
        debug_if_enabled!("Наведение: {} в состоянии {:?}", event, self.state);

        match event {
            HoverEvent::CategoryEnter(key) => self.on_category_enter(key),
            HoverEvent::CategoryLeave(key) => self.on_category_leave(&key),
            HoverEvent::CategoryClick(key) => self.on_category_click(key),
            HoverEvent::FavoritesEnter => self.on_favorites_enter(),
            HoverEvent::FavoritesLeave => self.on_favorites_leave(),
            HoverEvent::MenuEnter => {
                self.cancel_restore();
                Commands::new()
            }
            HoverEvent::MenuLeave => self.on_menu_leave(),
        }
    }

    pub fn handle_timer(&mut self, token: TimerToken, kind: TimerKind) -> Commands {
        if kind == TimerKind::Restore {
            if self.restore_timer != Some(token) {
                debug!("Устаревший таймер восстановления #{} проигнорирован", token.value());
                return Commands::new();
            }
            self.restore_timer = None;
            return self.restore_selected();
        }

        if self.hover_timer != Some((token, kind)) {
            debug!("Устаревший таймер {:?} #{} проигнорирован", kind, token.value());
            return Commands::new();
        }
        self.hover_timer = None;

        match kind {
            TimerKind::CategoryHover => {
                let HoverState::PendingCategory { category, .. } = &self.state else {
                    debug!("Таймер наведения сработал в состоянии {:?}", self.state);
                    return Commands::new();
                };
                let category = category.clone();
                self.state = if self.selected.as_deref() == Some(category.as_str()) {
                    HoverState::SelectedCategory(category.clone())
                } else {
                    HoverState::ActiveCategoryPreview(category.clone())
                };
                self.displayed = Displayed::Category(category.clone());
                smallvec![DisplayCommand::ShowCategory(category)]
            }
            TimerKind::FavoritesHover => {
                if !matches!(self.state, HoverState::PendingFavorites { .. }) {
                    debug!("Таймер избранного сработал в состоянии {:?}", self.state);
                    return Commands::new();
                }
                self.state = HoverState::ActiveFavorites;
                self.displayed = Displayed::Favorites;
                smallvec![DisplayCommand::ShowFavorites]
            }
            TimerKind::FavoritesCleanup | TimerKind::Restore => self.restore_selected(),
        }
    }

    fn on_category_enter(&mut self, key: String) -> Commands {
        if !self.is_selectable(&key) {
            debug!("Наведение на неизвестную категорию '{}' пропущено", key);
            return Commands::new();
        }

        self.cancel_restore();
        self.cancel_hover();

        if self.displayed == Displayed::Category(key.clone()) {
            self.state = self.resting_state();
            return Commands::new();
        }

        let token = self.schedule_hover(self.delays.category, TimerKind::CategoryHover);
        self.state = HoverState::PendingCategory { category: key, token };
        Commands::new()
    }

    fn on_category_leave(&mut self, key: &str) -> Commands {
        let pending = matches!(&self.state, HoverState::PendingCategory { category, .. } if category == key);
        if !pending {
            return Commands::new();
        }

        self.cancel_hover();
        self.state = self.resting_state();

        // Оверлей избранного остался на экране: его надо будет убрать
        if self.displayed == Displayed::Favorites {
            self.schedule_hover(self.delays.favorites_grace, TimerKind::FavoritesCleanup);
        }
        Commands::new()
    }

    fn on_category_click(&mut self, key: String) -> Commands {
        if !self.is_selectable(&key) {
            debug!("Клик по неизвестной категории '{}' пропущен", key);
            return Commands::new();
        }

        self.cancel_all();
        self.select(key)
    }

    fn on_favorites_enter(&mut self) -> Commands {
        if !self.favorites_available {
            return Commands::new();
        }

        self.cancel_restore();
        self.cancel_hover();

        if self.displayed == Displayed::Favorites {
            self.state = HoverState::ActiveFavorites;
            return Commands::new();
        }

        let token = self.schedule_hover(self.delays.favorites, TimerKind::FavoritesHover);
        self.state = HoverState::PendingFavorites { token };
        Commands::new()
    }

    fn on_favorites_leave(&mut self) -> Commands {
        match self.state {
            HoverState::PendingFavorites { .. } => {
                self.cancel_hover();
                self.state = self.resting_state();
            }
            HoverState::ActiveFavorites => {
                self.cancel_hover();
                self.schedule_hover(self.delays.favorites_grace, TimerKind::FavoritesCleanup);
            }
            _ => {}
        }
        Commands::new()
    }

    fn on_menu_leave(&mut self) -> Commands {
        self.cancel_hover();
        self.state = self.resting_state();

        if self.preview_is_live() {
            self.cancel_restore();
            let token = self.scheduler.schedule(self.delays.restore, TimerKind::Restore);
            self.restore_timer = Some(token);
        }
        Commands::new()
    }

    fn select(&mut self, key: String) -> Commands {
        self.selected = Some(key.clone());
        self.displayed = Displayed::Category(key.clone());
        self.state = HoverState::SelectedCategory(key.clone());
        smallvec![DisplayCommand::SetSelected(key.clone()), DisplayCommand::ShowCategory(key)]
    }

    fn restore_selected(&mut self) -> Commands {
        let Some(selected) = self.selected.clone() else {
            self.state = self.resting_state();
            return Commands::new();
        };

        if self.displayed == Displayed::Category(selected.clone()) {
            self.state = self.resting_state();
            return Commands::new();
        }

        self.displayed = Displayed::Category(selected.clone());
        self.state = HoverState::SelectedCategory(selected.clone());
        smallvec![DisplayCommand::ShowCategory(selected)]
    }

    /// Состояние без ожидающих наведений, соответствующее тому, что показано
    fn resting_state(&self) -> HoverState {
        match &self.displayed {
            Displayed::Nothing => HoverState::Idle,
            Displayed::Favorites => HoverState::ActiveFavorites,
            Displayed::Category(key) if self.selected.as_ref() == Some(key) => HoverState::SelectedCategory(key.clone()),
            Displayed::Category(key) => HoverState::ActiveCategoryPreview(key.clone()),
        }
    }

    fn preview_is_live(&self) -> bool {
        match &self.displayed {
            Displayed::Nothing => false,
            Displayed::Favorites => true,
            Displayed::Category(key) => self.selected.as_ref() != Some(key),
        }
    }

    fn is_selectable(&self, key: &str) -> bool {
        self.catalog.contains(key) && !self.excluded.iter().any(|e| e == key)
    }

    fn first_category(&self) -> Option<String> {
        self.catalog
            .ordered_categories(&self.excluded)
            .first()
            .map(|key| key.to_string())
    }

    fn schedule_hover(&mut self, delay: Duration, kind: TimerKind) -> TimerToken {
        self.cancel_hover();
        let token = self.scheduler.schedule(delay, kind);
        self.hover_timer = Some((token, kind));
        token
    }

    fn cancel_hover(&mut self) {
        if let Some((token, _)) = self.hover_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    fn cancel_restore(&mut self) {
        if let Some(token) = self.restore_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_hover();
        self.cancel_restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, MenuEntry};
    use crate::services::timer::manual::ManualScheduler;

    const CATEGORY: Duration = Duration::from_millis(250);

    fn catalog(keys: &[&str]) -> Arc<Catalog> {
        let mut builder = CatalogBuilder::default();
        for key in keys {
            builder.push(key, MenuEntry::new("app", "app", "", "").unwrap());
        }
        Arc::new(builder.build())
    }

    struct Harness {
        clock: ManualScheduler,
        engine: HoverSelectionEngine<ManualScheduler>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = ManualScheduler::default();
            let engine = HoverSelectionEngine::new(
                clock.clone(),
                HoverDelays::default(),
                catalog(&["System", "Internet", "Fun"]),
            )
            .with_favorites(true);
            let mut harness = Self { clock, engine };
            harness.engine.start();
            harness
        }

        fn send(&mut self, event: HoverEvent) -> Vec<DisplayCommand> {
            self.engine.handle_event(event).into_vec()
        }

        /// Сдвинуть виртуальное время, доставляя все срабатывания по порядку
        fn advance(&mut self, by: Duration) -> Vec<DisplayCommand> {
            let until = self.clock.now() + by;
            let mut out = Vec::new();
            while let Some((token, kind)) = self.clock.pop_due(until) {
                out.extend(self.engine.handle_timer(token, kind));
            }
            self.clock.set_now(until);
            out
        }
    }

    fn enter(key: &str) -> HoverEvent {
        HoverEvent::CategoryEnter(key.to_string())
    }

    fn leave(key: &str) -> HoverEvent {
        HoverEvent::CategoryLeave(key.to_string())
    }

    fn show(key: &str) -> DisplayCommand {
        DisplayCommand::ShowCategory(key.to_string())
    }

    #[test]
    fn test_start_selects_first_ordered_category() {
        let clock = ManualScheduler::default();
        let mut engine = HoverSelectionEngine::new(clock, HoverDelays::default(), catalog(&["Fun", "Internet"]));
        let commands = engine.start().into_vec();

        assert_eq!(commands, vec![DisplayCommand::SetSelected("Internet".into()), show("Internet")]);
        assert_eq!(engine.state(), &HoverState::SelectedCategory("Internet".into()));
    }

    #[test]
    fn test_leave_before_deadline_shows_nothing() {
        let mut h = Harness::new();
        assert!(h.send(enter("Internet")).is_empty());
        assert!(h.advance(Duration::from_millis(200)).is_empty());
        assert!(h.send(leave("Internet")).is_empty());

        assert!(h.advance(Duration::from_secs(2)).is_empty());
        assert_eq!(h.engine.state(), &HoverState::SelectedCategory("System".into()));
        assert!(h.clock.pending().is_empty());
    }

    #[test]
    fn test_dwell_shows_once_without_changing_selection() {
        let mut h = Harness::new();
        h.send(enter("Internet"));

        let commands = h.advance(CATEGORY + Duration::from_millis(1));
        assert_eq!(commands, vec![show("Internet")]);
        assert_eq!(h.engine.selected(), Some("System"));
        assert_eq!(h.engine.state(), &HoverState::ActiveCategoryPreview("Internet".into()));

        assert!(h.advance(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_favorites_enter_cancels_pending_category() {
        let mut h = Harness::new();
        h.send(enter("Internet"));
        h.advance(Duration::from_millis(100));
        h.send(HoverEvent::FavoritesEnter);

        assert_eq!(h.clock.pending(), vec![TimerKind::FavoritesHover]);
        let commands = h.advance(Duration::from_secs(1));
        assert!(!commands.contains(&show("Internet")));
        assert_eq!(commands, vec![DisplayCommand::ShowFavorites]);
        assert_eq!(h.engine.state(), &HoverState::ActiveFavorites);
    }

    #[test]
    fn test_click_overrides_pending_hover() {
        let mut h = Harness::new();
        h.send(enter("Internet"));

        let commands = h.send(HoverEvent::CategoryClick("Fun".into()));
        assert_eq!(commands, vec![DisplayCommand::SetSelected("Fun".into()), show("Fun")]);
        assert!(h.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(h.engine.state(), &HoverState::SelectedCategory("Fun".into()));
        assert_eq!(h.engine.selected(), Some("Fun"));
    }

    #[test]
    fn test_at_most_one_hover_timer() {
        let mut h = Harness::new();
        h.send(enter("Internet"));
        h.send(enter("Fun"));
        h.send(HoverEvent::FavoritesEnter);
        h.send(HoverEvent::FavoritesLeave);
        h.send(enter("Internet"));
        assert_eq!(h.clock.pending(), vec![TimerKind::CategoryHover]);
    }

    #[test]
    fn test_entering_displayed_category_is_noop() {
        let mut h = Harness::new();
        assert!(h.send(enter("System")).is_empty());
        assert!(h.clock.pending().is_empty());
        assert!(h.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_favorites_leave_restores_after_grace() {
        let mut h = Harness::new();
        h.send(HoverEvent::FavoritesEnter);
        h.advance(Duration::from_millis(250));
        h.send(HoverEvent::FavoritesLeave);

        assert!(h.advance(Duration::from_millis(100)).is_empty());
        assert_eq!(h.advance(Duration::from_millis(300)), vec![show("System")]);
        assert_eq!(h.engine.state(), &HoverState::SelectedCategory("System".into()));
    }

    #[test]
    fn test_returning_to_favorites_within_grace_keeps_them() {
        let mut h = Harness::new();
        h.send(HoverEvent::FavoritesEnter);
        h.advance(Duration::from_millis(250));
        h.send(HoverEvent::FavoritesLeave);
        h.advance(Duration::from_millis(100));
        h.send(HoverEvent::FavoritesEnter);

        assert!(h.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(h.engine.displayed(), &Displayed::Favorites);
    }

    #[test]
    fn test_short_category_hover_over_favorites_still_cleans_up() {
        let mut h = Harness::new();
        h.send(HoverEvent::FavoritesEnter);
        h.advance(Duration::from_millis(250));
        h.send(HoverEvent::FavoritesLeave);
        h.send(enter("Internet"));
        h.send(leave("Internet"));

        assert_eq!(h.clock.pending(), vec![TimerKind::FavoritesCleanup]);
        assert_eq!(h.advance(Duration::from_secs(1)), vec![show("System")]);
    }

    #[test]
    fn test_menu_leave_restores_preview() {
        let mut h = Harness::new();
        h.send(enter("Fun"));
        h.advance(CATEGORY);
        h.send(HoverEvent::MenuLeave);

        assert_eq!(h.advance(Duration::from_millis(150)), vec![show("System")]);
        assert_eq!(h.engine.state(), &HoverState::SelectedCategory("System".into()));
    }

    #[test]
    fn test_menu_enter_cancels_restore() {
        let mut h = Harness::new();
        h.send(enter("Fun"));
        h.advance(CATEGORY);
        h.send(HoverEvent::MenuLeave);
        h.send(HoverEvent::MenuEnter);

        assert!(h.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(h.engine.displayed(), &Displayed::Category("Fun".into()));
    }

    #[test]
    fn test_menu_leave_without_preview_schedules_nothing() {
        let mut h = Harness::new();
        h.send(enter("Fun"));
        h.send(HoverEvent::MenuLeave);
        assert!(h.clock.pending().is_empty());
        assert_eq!(h.engine.state(), &HoverState::SelectedCategory("System".into()));
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut h = Harness::new();
        h.send(enter("Internet"));
        let stale = match h.engine.state() {
            HoverState::PendingCategory { token, .. } => *token,
            other => panic!("ожидалось ожидание, получено {:?}", other),
        };
        h.send(leave("Internet"));

        assert!(h.engine.handle_timer(stale, TimerKind::CategoryHover).is_empty());
        assert!(h.engine.handle_timer(stale, TimerKind::Restore).is_empty());
    }

    #[test]
    fn test_favorites_disabled_ignores_section() {
        let clock = ManualScheduler::default();
        let mut engine = HoverSelectionEngine::new(clock.clone(), HoverDelays::default(), catalog(&["System"]));
        engine.start();
        assert!(engine.handle_event(HoverEvent::FavoritesEnter).is_empty());
        assert!(clock.pending().is_empty());
    }

    #[test]
    fn test_replace_catalog_keeps_or_resets_selection() {
        let mut h = Harness::new();
        h.send(HoverEvent::CategoryClick("Fun".into()));
        h.send(enter("Internet"));

        let kept = h.engine.replace_catalog(catalog(&["Fun", "Desktop"])).into_vec();
        assert_eq!(kept, vec![DisplayCommand::SetSelected("Fun".into()), show("Fun")]);
        assert!(h.clock.pending().is_empty());

        let reset = h.engine.replace_catalog(catalog(&["Help", "Internet"])).into_vec();
        assert_eq!(reset[0], DisplayCommand::SetSelected("Internet".into()));
    }

    #[test]
    fn test_excluded_and_unknown_categories() {
        let clock = ManualScheduler::default();
        let mut engine = HoverSelectionEngine::new(clock.clone(), HoverDelays::default(), catalog(&["System", "Fun"]))
            .with_excluded(vec!["System".into()]);

        assert_eq!(engine.start()[0], DisplayCommand::SetSelected("Fun".into()));
        assert!(engine.handle_event(enter("System")).is_empty());
        assert!(engine.handle_event(HoverEvent::CategoryClick("Nope".into())).is_empty());
        assert!(clock.pending().is_empty());
    }
}
