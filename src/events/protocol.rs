use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use crate::catalog::MenuEntry;
use crate::position::Position;

/// Строки с содержимым меню и положением окна.
///
/// Блок `catalog` и следующие за ним `category`/`entry`/`icondir` целиком
/// заменяют всё, что UI получил раньше.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolLine {
    Position(Position),
    Catalog,
    Category { key: String, label: String },
    Entry { category: String, entry: MenuEntry },
    IconDir(PathBuf),
    Favorite(MenuEntry),
    Match(MenuEntry),
}

impl fmt::Display for ProtocolLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "position {}", position),
            Self::Catalog => f.write_str("catalog"),
            Self::Category { key, label } => write!(f, "category {}\t{}", escape_field(key), escape_field(label)),
            Self::Entry { category, entry } => write!(
                f,
                "entry {}\t{}\t{}\t{}\t{}",
                escape_field(category),
                escape_field(&entry.name),
                escape_field(&entry.command),
                escape_field(&entry.icon_ref),
                entry.is_terminal
            ),
            Self::IconDir(dir) => write!(f, "icondir {}", escape_field(&dir.to_string_lossy())),
            Self::Favorite(entry) => write!(f, "favorite {}", entry_fields(entry)),
            Self::Match(entry) => write!(f, "match {}", entry_fields(entry)),
        }
    }
}

fn entry_fields(entry: &MenuEntry) -> String {
    format!("{}\t{}", escape_field(&entry.name), escape_field(&entry.command))
}

/// Поле строки протокола: `\`, табуляция и переводы строк экранируются,
/// прочие управляющие символы заменяются пробелом
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if !value.chars().any(|c| c == '\\' || c.is_control()) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, command: &str) -> MenuEntry {
        MenuEntry::new(name, command, "web", "").unwrap()
    }

    #[test]
    fn test_entry_line_fields() {
        let line = ProtocolLine::Entry {
            category: "Internet".into(),
            entry: entry("Firefox", "firefox"),
        };
        assert_eq!(line.to_string(), "entry Internet\tFirefox\tfirefox\tweb\tfalse");

        let terminal = ProtocolLine::Entry {
            category: "System".into(),
            entry: entry("Top", "urxvt -e top"),
        };
        assert_eq!(terminal.to_string(), "entry System\tTop\turxvt -e top\tweb\ttrue");
    }

    #[test]
    fn test_multiline_command_stays_on_one_line() {
        let line = ProtocolLine::Match(entry("Backup", "rsync -a ~/ /mnt\nnotify-send\t'done'"));
        let text = line.to_string();

        assert!(!text.contains('\n'));
        assert_eq!(text, "match Backup\trsync -a ~/ /mnt\\nnotify-send\\t'done'");
        assert_eq!(text.split('\t').count(), 2);
    }

    #[test]
    fn test_escape_field() {
        assert!(matches!(escape_field("Internet"), Cow::Borrowed("Internet")));
        assert_eq!(escape_field("a\\b"), "a\\\\b");
        assert_eq!(escape_field("bell\u{7}"), "bell ");
        assert_eq!(escape_field("Sys\r\ntem"), "Sys\\r\\ntem");
    }

    #[test]
    fn test_header_lines() {
        assert_eq!(ProtocolLine::Catalog.to_string(), "catalog");
        assert_eq!(ProtocolLine::Position(Position { x: 10, y: 40 }).to_string(), "position 10 40");
        assert_eq!(
            ProtocolLine::Category { key: "Fun".into(), label: "Juegos".into() }.to_string(),
            "category Fun\tJuegos"
        );
        assert_eq!(
            ProtocolLine::IconDir(PathBuf::from("/usr/share/pixmaps")).to_string(),
            "icondir /usr/share/pixmaps"
        );
    }
}
