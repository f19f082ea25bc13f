// Логирование
//
// Протокол пишет через `tracing`; подписчика устанавливает приложение.
// `init_logging` - для тестов и простых бинарников.

use std::fmt;
use tracing_subscriber::{fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Установить глобальный fmt-подписчик.
///
/// `filter` имеет синтаксис `EnvFilter` (например `"crypto=debug"`). Если `None`,
/// используется `RUST_LOG`, а при его отсутствии - `info`.
/// Повторный вызов ничего не делает.
pub fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::registry()
        .with(subscriber_fmt::layer())
        .with(filter)
        .try_init();
}

/// Показывает только длину байтового среза
pub struct RedactedBytes<'a>(pub &'a [u8]);

impl fmt::Display for RedactedBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} bytes]", self.0.len())
    }
}

impl fmt::Debug for RedactedBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
