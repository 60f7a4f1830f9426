//! Каталог приложений: категории меню в каноническом порядке.

mod icons;
mod parser;

pub use self::parser::{CatalogLoad, MenuCatalogParser, ParseOutcome};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::FavoriteConfig;

/// Предпочтительный порядок категорий; остальные идут после них по алфавиту
pub const PREFERRED_ORDER: [&str; 15] = [
    "Desktop", "System", "Setup", "Utility", "Filesystem", "Graphic", "Document", "Business",
    "Personal", "Network", "Internet", "Multimedia", "Fun", "Help", "Leave",
];

static PREFERRED_RANK: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    PREFERRED_ORDER.iter().enumerate().map(|(rank, key)| (*key, rank)).collect()
});

pub const HELP_CATEGORY: &str = "Help";
pub const LEAVE_CATEGORY: &str = "Leave";
pub const SYSTEM_CATEGORY: &str = "System";
pub const FAVORITES_CATEGORY: &str = "Favorites";

/// Токены эмуляторов терминала для эвристики `is_terminal`
const TERMINAL_TOKENS: [&str; 2] = ["terminal", "urxvt"];

/// Одна запись меню
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub name: String,
    pub command: String,
    pub icon_ref: String,
    pub comment: String,
    pub is_terminal: bool,
    pub categories: Vec<String>,
}

impl MenuEntry {
    /// `None`, если нет имени или команды — такие записи в каталог не попадают
    pub fn new(name: &str, command: &str, icon_ref: &str, comment: &str) -> Option<Self> {
        let name = name.trim();
        let command = command.trim();
        if name.is_empty() || command.is_empty() {
            return None;
        }

        let comment = if comment.trim().is_empty() { name } else { comment.trim() };

        Some(Self {
            name: name.to_string(),
            command: command.to_string(),
            icon_ref: icon_ref.trim().to_string(),
            comment: comment.to_string(),
            is_terminal: looks_like_terminal(command),
            categories: Vec::new(),
        })
    }

    pub fn favorite(favorite: &FavoriteConfig) -> Self {
        Self {
            name: favorite.name.clone(),
            command: favorite.exec.clone(),
            icon_ref: favorite.icon.clone(),
            comment: favorite.name.clone(),
            is_terminal: false,
            categories: vec![FAVORITES_CATEGORY.to_string()],
        }
    }

    fn matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.comment.to_lowercase().contains(needle_lower)
    }
}

/// Эвристика, а не объявленное поле: подстрока в команде без учёта регистра
pub fn looks_like_terminal(command: &str) -> bool {
    let lower = command.to_lowercase();
    TERMINAL_TOKENS.iter().any(|token| lower.contains(token))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub entries: Vec<MenuEntry>,
}

/// Упорядоченное отображение категория → записи. Не изменяется после сборки.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&[MenuEntry]> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.entries.as_slice())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }

    /// Категории для показа: без исключённых пользователем
    pub fn ordered_categories(&self, excluded: &[String]) -> Vec<&str> {
        self.keys()
            .filter(|key| !excluded.iter().any(|e| e == key))
            .collect()
    }

    /// Поиск по имени и комментарию без учёта регистра, в порядке каталога
    pub fn search(&self, query: &str) -> Vec<&MenuEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .filter(|entry| entry.matches(&needle))
            .collect()
    }

    /// Встроенный каталог на случай, если меню не удалось прочитать
    pub fn fallback() -> Self {
        let entry = |name: &str, command: &str, icon: &str, comment: &str| MenuEntry {
            name: name.to_string(),
            command: command.to_string(),
            icon_ref: icon.to_string(),
            comment: comment.to_string(),
            is_terminal: false,
            categories: Vec::new(),
        };

        let mut builder = CatalogBuilder::default();
        builder.extend(
            SYSTEM_CATEGORY,
            vec![
                entry("Terminal", "lxterminal", "terminal", "Terminal emulator"),
                entry("File Manager", "rox", "folder", "File manager"),
            ],
        );
        builder.extend("Internet", vec![entry("Firefox", "firefox", "firefox", "Web browser")]);
        builder.build()
    }
}

/// Накопитель групп в порядке документа; `build` наводит канонический порядок
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    groups: Vec<Category>,
}

impl CatalogBuilder {
    /// Записи группы добавляются в конец уже существующей категории с тем же ключом
    pub fn extend(&mut self, key: &str, entries: Vec<MenuEntry>) {
        if entries.is_empty() {
            return;
        }

        match self.groups.iter_mut().find(|c| c.key == key) {
            Some(category) => category.entries.extend(entries),
            None => self.groups.push(Category {
                key: key.to_string(),
                entries,
            }),
        }
    }

    pub fn push(&mut self, key: &str, entry: MenuEntry) {
        self.extend(key, vec![entry]);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn build(self) -> Catalog {
        let mut categories: Vec<Category> = self
            .groups
            .into_iter()
            .filter(|c| !c.entries.is_empty())
            .map(|mut c| {
                for entry in &mut c.entries {
                    if entry.categories.is_empty() {
                        entry.categories.push(c.key.clone());
                    }
                }
                c
            })
            .collect();

        categories.sort_by(|a, b| {
            let rank = |key: &str| PREFERRED_RANK.get(key).copied();
            match (rank(&a.key), rank(&b.key)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.key.cmp(&b.key),
            }
        });

        Catalog { categories }
    }
}
