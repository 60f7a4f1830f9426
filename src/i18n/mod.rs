//! Переводы интерфейса и таблица синонимов категорий из `.lang`-файлов.

mod aliases;
mod lang_file;

pub use self::aliases::CategoryAliasTable;

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use self::lang_file::read_lang_file;

/// Переводы для текущего языка; отсутствующий ключ возвращается как есть
#[derive(Debug, Clone, Default)]
pub struct Translations {
    lang: String,
    strings: HashMap<String, String>,
}

impl Translations {
    pub fn load(locale_dirs: &[PathBuf]) -> Self {
        Self::load_for(&detect_language(), locale_dirs)
    }

    pub fn load_for(lang: &str, locale_dirs: &[PathBuf]) -> Self {
        let strings = match find_lang_file(lang, locale_dirs) {
            Some(path) => {
                info!("Загружаем переводы из {:?}", path);
                read_lang_file(&path).unwrap_or_default()
            }
            None => {
                debug!("Файл переводов для '{}' не найден, используем английский", lang);
                HashMap::new()
            }
        };

        Self {
            lang: lang.to_string(),
            strings,
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }
}

/// Код языка из окружения: `es_MX.UTF-8` → `es-MX`
pub fn detect_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .map(|value| language_code(&value))
        .unwrap_or_else(|| "en".to_string())
}

pub fn language_code(locale: &str) -> String {
    let base = locale.split(['.', '@']).next().unwrap_or(locale).trim();
    match base {
        "" | "C" | "POSIX" => "en".to_string(),
        other => other.replace('_', "-"),
    }
}

/// Сначала полный код (es-MX.lang), затем базовый язык (es.lang)
pub fn find_lang_file(lang: &str, locale_dirs: &[PathBuf]) -> Option<PathBuf> {
    let find = |code: &str| {
        locale_dirs
            .iter()
            .map(|dir| dir.join(format!("{}.lang", code)))
            .find(|path| Path::new(path).is_file())
    };

    find(lang).or_else(|| {
        lang.split_once('-')
            .and_then(|(base, _)| find(base))
    })
}
