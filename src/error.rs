use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка разбора XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Ошибка отслеживания файлов: {0}")]
    Watch(#[from] notify::Error),

    #[error("Источник не найден: {0}")]
    SourceMissing(String),

    #[error("Источник повреждён: {0}")]
    SourceMalformed(String),

    #[error("Отсутствует обязательное поле: {0}")]
    FieldMissing(String),

    #[error("Канал закрыт: {0}")]
    ChannelClosed(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl MenuError {
    pub fn source_missing<T>(msg: impl Into<String>) -> Result<T> {
        Err(MenuError::SourceMissing(msg.into()))
    }

    pub fn malformed<T>(msg: impl Into<String>) -> Result<T> {
        Err(MenuError::SourceMalformed(msg.into()))
    }

    /// Ошибки, после которых цепочка fallback переходит к следующему шагу
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MenuError::Io(_)
                | MenuError::Xml(_)
                | MenuError::SourceMissing(_)
                | MenuError::SourceMalformed(_)
                | MenuError::FieldMissing(_)
        )
    }
}

impl From<quick_xml::events::attributes::AttrError> for MenuError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        MenuError::Xml(quick_xml::Error::InvalidAttr(err))
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! menu_error {
    (missing, $($arg:tt)*) => {
        $crate::error::MenuError::SourceMissing(format!($($arg)*))
    };
    (malformed, $($arg:tt)*) => {
        $crate::error::MenuError::SourceMalformed(format!($($arg)*))
    };
    (field, $($arg:tt)*) => {
        $crate::error::MenuError::FieldMissing(format!($($arg)*))
    };
    (channel, $($arg:tt)*) => {
        $crate::error::MenuError::ChannelClosed(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::MenuError::Internal(format!($($arg)*))
    };
}
