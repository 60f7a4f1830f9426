use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::Result;

/// Разбор `.lang`: строки `key = value`, `#` — комментарий
pub fn parse_lang(content: &str) -> HashMap<String, String> {
    let mut translations = HashMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            warn!("Строка {} пропущена (нет '='): {}", line_num + 1, line);
            continue;
        };

        let (key, value) = (key.trim(), value.trim());
        if !key.is_empty() && !value.is_empty() {
            translations.insert(key.to_string(), value.to_string());
        }
    }

    translations
}

pub fn read_lang_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_lang(&content))
}
