use std::fmt;
use std::str::FromStr;

/// Указатель мыши относительно элементов меню
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HoverEvent {
    CategoryEnter(String),
    CategoryLeave(String),
    CategoryClick(String),
    FavoritesEnter,
    FavoritesLeave,
    /// Указатель вернулся на поверхность меню
    MenuEnter,
    /// Указатель покинул меню целиком
    MenuLeave,
}

impl fmt::Display for HoverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryEnter(key) => write!(f, "enter {}", key),
            Self::CategoryLeave(key) => write!(f, "leave {}", key),
            Self::CategoryClick(key) => write!(f, "click {}", key),
            Self::FavoritesEnter => f.write_str("fav-enter"),
            Self::FavoritesLeave => f.write_str("fav-leave"),
            Self::MenuEnter => f.write_str("menu-enter"),
            Self::MenuLeave => f.write_str("menu-leave"),
        }
    }
}

/// Строка протокола от UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    Hover(HoverEvent),
    Search(String),
    Quit,
}

impl FromStr for BridgeCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let category = |make: fn(String) -> HoverEvent| {
            if rest.is_empty() {
                Err(format!("команде '{}' нужна категория", verb))
            } else {
                Ok(Self::Hover(make(rest.to_string())))
            }
        };

        match verb {
            "enter" => category(HoverEvent::CategoryEnter),
            "leave" => category(HoverEvent::CategoryLeave),
            "click" => category(HoverEvent::CategoryClick),
            "fav-enter" => Ok(Self::Hover(HoverEvent::FavoritesEnter)),
            "fav-leave" => Ok(Self::Hover(HoverEvent::FavoritesLeave)),
            "menu-enter" => Ok(Self::Hover(HoverEvent::MenuEnter)),
            "menu-leave" => Ok(Self::Hover(HoverEvent::MenuLeave)),
            // Пустой запрос допустим: он просто ничего не находит
            "search" => Ok(Self::Search(rest.to_string())),
            "quit" => Ok(Self::Quit),
            "" => Err("пустая строка".to_string()),
            other => Err(format!("неизвестная команда: {}", other)),
        }
    }
}
