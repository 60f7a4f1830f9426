use crate::error::{MenuError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Раскрывает ведущую `~` в домашний каталог пользователя
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }

    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(path)
}

/// Путь из конфига или командной строки: `~` раскрыта, относительный путь
/// привязан к текущему каталогу.
///
/// События notify приходят с абсолютными путями, и сравнивать их надо с ними же.
pub fn resolve_path(path: &str) -> PathBuf {
    let expanded = expand_home(path);
    match std::path::absolute(&expanded) {
        Ok(absolute) => absolute,
        Err(e) => {
            debug!("Не удалось сделать путь {:?} абсолютным: {}", expanded, e);
            expanded
        }
    }
}

/// Читает локальный файл-источник целиком.
///
/// Отсутствующий файл превращается в `SourceMissing`, чтобы вызывающая сторона
/// могла отличить его от повреждённого содержимого.
pub fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        debug!("Файл не найден: {:?}", path);
        return MenuError::source_missing(path.display().to_string());
    }

    if path.is_dir() {
        return Err(MenuError::Internal(format!(
            "Ожидался файл, а не каталог: {}",
            path.display()
        )));
    }

    Ok(fs::read_to_string(path)?)
}
