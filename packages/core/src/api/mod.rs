// Публичный API протокола
// Транспорт (MQTT, WebSocket, HTTP) работает только с этим фасадом

pub mod protocol;

pub use protocol::{ProtocolStatus, SecureProtocol};
