use crate::error::Result;

/// Долгоживущая задача лаунчера, запускаемая из main
#[async_trait::async_trait]
pub trait LauncherService {
    /// Работает до остановки или закрытия входного канала
    async fn run(self: Box<Self>) -> Result<()>;
}
