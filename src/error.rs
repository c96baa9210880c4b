use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    /// Сбой перечисления окон/процессов. Единственный класс ошибок,
    /// после которого цикл монитора уходит в длинную паузу.
    #[error("Ошибка перечисления окон: {0}")]
    Enumeration(String),

    #[error("Ошибка захвата экрана: {0}")]
    Capture(String),

    #[error("Ошибка шаблона: {0}")]
    Template(String),

    #[error("Ошибка окна-компаньона: {0}")]
    Window(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl MonitorError {
    pub fn is_enumeration(&self) -> bool {
        matches!(self, MonitorError::Enumeration(_))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! monitor_error {
    (enumeration, $($arg:tt)*) => {
        $crate::error::MonitorError::Enumeration(format!($($arg)*))
    };
    (capture, $($arg:tt)*) => {
        $crate::error::MonitorError::Capture(format!($($arg)*))
    };
    (template, $($arg:tt)*) => {
        $crate::error::MonitorError::Template(format!($($arg)*))
    };
    (window, $($arg:tt)*) => {
        $crate::error::MonitorError::Window(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::MonitorError::Permission(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::MonitorError::Internal(format!($($arg)*))
    };
}
