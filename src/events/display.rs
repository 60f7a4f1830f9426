use std::fmt;

use super::protocol::escape_field;
use crate::position::Position;

/// Команды слою отрисовки
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayCommand {
    ShowCategory(String),
    ShowFavorites,
    /// Отметить категорию как постоянно выбранную
    SetSelected(String),
    /// Новые координаты окна после перечитывания панели
    Place(Position),
}

impl fmt::Display for DisplayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShowCategory(key) => write!(f, "show {}", escape_field(key)),
            Self::ShowFavorites => f.write_str("favorites"),
            Self::SetSelected(key) => write!(f, "selected {}", escape_field(key)),
            Self::Place(position) => write!(f, "position {}", position),
        }
    }
}
