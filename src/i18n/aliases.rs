use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::lang_file::read_lang_file;

/// Канонические ключи категорий, которые переводятся в `.lang`-файлах
pub const CANONICAL_CATEGORIES: [&str; 17] = [
    "Desktop", "System", "Setup", "Utility", "Filesystem", "Graphic", "Document", "Business",
    "Personal", "Network", "Internet", "Multimedia", "Fun", "Help", "Rectify", "Shutdown", "Leave",
];

/// Локализованная метка категории → канонический английский ключ.
///
/// Строится один раз при старте и дальше только читается.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAliasTable {
    aliases: HashMap<String, String>,
}

impl Default for CategoryAliasTable {
    fn default() -> Self {
        let aliases = CANONICAL_CATEGORIES
            .iter()
            .map(|key| (key.to_string(), key.to_string()))
            .collect();
        Self { aliases }
    }
}

impl CategoryAliasTable {
    /// Просматривает все `.lang` во всех каталогах локалей
    pub fn build(locale_dirs: &[PathBuf]) -> Self {
        let mut table = Self::default();

        for dir in locale_dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Каталог локалей {:?} пропущен: {}", dir, e);
                    continue;
                }
            };

            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "lang"))
                .collect();
            // Детерминированный порядок при конфликте переводов
            files.sort();

            for file in files {
                match read_lang_file(&file) {
                    Ok(translations) => table.absorb(&translations),
                    Err(e) => warn!("Не удалось прочитать {:?}: {}", file, e),
                }
            }
        }

        info!("Таблица категорий построена: {} записей", table.len());
        table
    }

    fn absorb(&mut self, translations: &HashMap<String, String>) {
        for key in CANONICAL_CATEGORIES {
            if let Some(label) = translations.get(key) {
                if label != key {
                    self.aliases.insert(label.clone(), key.to_string());
                }
            }
        }
    }

    pub fn insert(&mut self, label: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(label.into(), canonical.into());
    }

    /// Неизвестные метки возвращаются как есть
    pub fn normalize<'a>(&'a self, label: &'a str) -> &'a str {
        self.aliases.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_unknown() {
        let table = CategoryAliasTable::default();
        for key in CANONICAL_CATEGORIES {
            assert_eq!(table.normalize(key), key);
        }
        assert_eq!(table.normalize("Juegos raros"), "Juegos raros");
    }

    #[test]
    fn test_build_scans_all_lang_files() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("es.lang"), "System = Sistema\nFun = Juegos\nSave = Guardar\n").unwrap();
        fs::write(second.path().join("fr.lang"), "Internet = Réseau\nDesktop = Desktop\n").unwrap();
        fs::write(second.path().join("notes.txt"), "Help = Nope\n").unwrap();

        let dirs = vec![
            first.path().to_path_buf(),
            PathBuf::from("/definitely/not/here"),
            second.path().to_path_buf(),
        ];
        let table = CategoryAliasTable::build(&dirs);

        assert_eq!(table.normalize("Sistema"), "System");
        assert_eq!(table.normalize("Juegos"), "Fun");
        assert_eq!(table.normalize("Réseau"), "Internet");
        // Не категории и не .lang файлы не попадают в таблицу
        assert_eq!(table.normalize("Guardar"), "Guardar");
        assert_eq!(table.normalize("Nope"), "Nope");
        assert_eq!(table.len(), CANONICAL_CATEGORIES.len() + 3);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut table = CategoryAliasTable::default();
        table.insert("Oficina", "Business");
        let once = table.normalize("Oficina");
        assert_eq!(table.normalize(once), once);
    }
}
