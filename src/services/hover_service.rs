use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::hover_engine::{Commands, HoverSelectionEngine};
use super::r#trait::LauncherService;
use super::timer::{TimerKind, TimerToken, TokioScheduler};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::events::{DisplayCommand, HoverEvent};
use crate::menu_error;

/// Всё, что может разбудить цикл движка наведения
#[derive(Debug)]
pub enum EngineInput {
    Ui(HoverEvent),
    TimerExpired(TimerToken, TimerKind),
    CatalogReloaded(Arc<Catalog>),
    Shutdown,
}

/// Отправитель входов для остальных частей программы
#[derive(Debug, Clone)]
pub struct HoverHandle {
    inputs: mpsc::UnboundedSender<EngineInput>,
}

impl HoverHandle {
    pub fn send(&self, event: HoverEvent) -> Result<()> {
        self.push(EngineInput::Ui(event))
    }

    pub fn reload(&self, catalog: Arc<Catalog>) -> Result<()> {
        self.push(EngineInput::CatalogReloaded(catalog))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.push(EngineInput::Shutdown)
    }

    fn push(&self, input: EngineInput) -> Result<()> {
        self.inputs
            .send(input)
            .map_err(|_| menu_error!(channel, "цикл наведения уже остановлен"))
    }
}

/// Цикл движка: все переходы выполняются последовательно в одной задаче
pub struct HoverService {
    engine: HoverSelectionEngine<TokioScheduler>,
    inputs: mpsc::UnboundedReceiver<EngineInput>,
    output: mpsc::UnboundedSender<DisplayCommand>,
}

impl HoverService {
    pub fn new(
        config: &Config,
        catalog: Arc<Catalog>,
        output: mpsc::UnboundedSender<DisplayCommand>,
    ) -> (Self, HoverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx.clone());
        let engine = HoverSelectionEngine::from_config(scheduler, config, catalog);

        let service = Self {
            engine,
            inputs: rx,
            output,
        };
        (service, HoverHandle { inputs: tx })
    }

    fn emit(&self, commands: Commands) -> Result<()> {
        for command in commands {
            debug!("→ {}", command);
            self.output
                .send(command)
                .map_err(|_| menu_error!(channel, "получатель команд отображения закрыт"))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LauncherService for HoverService {
    async fn run(self: Box<Self>) -> Result<()> {
        let mut this = self;
        info!("Цикл наведения запущен");
        let initial = this.engine.start();
        this.emit(initial)?;

        while let Some(input) = this.inputs.recv().await {
            let commands = match input {
                EngineInput::Ui(event) => this.engine.handle_event(event),
                EngineInput::TimerExpired(token, kind) => this.engine.handle_timer(token, kind),
                EngineInput::CatalogReloaded(catalog) => this.engine.replace_catalog(catalog),
                EngineInput::Shutdown => {
                    info!("Цикл наведения остановлен");
                    return Ok(());
                }
            };

            if let Err(e) = this.emit(commands) {
                warn!("Команды отображения некуда отправить: {}", e);
                return Err(e);
            }
        }

        Ok(())
    }
}

/// Фабрика цикла наведения и его входного канала
pub fn create_hover_service(
    config: &Config,
    catalog: Arc<Catalog>,
    output: mpsc::UnboundedSender<DisplayCommand>,
) -> (Box<dyn LauncherService + Send>, HoverHandle) {
    let (service, handle) = HoverService::new(config, catalog, output);
    (Box::new(service), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FavoriteConfig;
    use std::time::Duration;

    fn config_with_favorites() -> Config {
        let mut config = Config::default();
        config.favorites.push(FavoriteConfig {
            name: "Notes".into(),
            exec: "geany".into(),
            icon: "star".into(),
        });
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_emits_start_and_preview() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (service, handle) = create_hover_service(&Config::default(), Arc::new(Catalog::fallback()), out_tx);
        let task = tokio::spawn(service.run());

        assert_eq!(out_rx.recv().await, Some(DisplayCommand::SetSelected("System".into())));
        assert_eq!(out_rx.recv().await, Some(DisplayCommand::ShowCategory("System".into())));

        handle.send(HoverEvent::CategoryEnter("Internet".into())).unwrap();
        assert_eq!(out_rx.recv().await, Some(DisplayCommand::ShowCategory("Internet".into())));

        handle.shutdown().unwrap();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorites_hover_cancels_category_timer() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let config = config_with_favorites();
        let (service, handle) = create_hover_service(&config, Arc::new(Catalog::fallback()), out_tx);
        tokio::spawn(service.run());
        out_rx.recv().await;
        out_rx.recv().await;

        handle.send(HoverEvent::CategoryEnter("Internet".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.send(HoverEvent::FavoritesEnter).unwrap();

        assert_eq!(out_rx.recv().await, Some(DisplayCommand::ShowFavorites));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(out_rx.try_recv().is_err());
        handle.shutdown().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_reselects() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (service, handle) = create_hover_service(&Config::default(), Arc::new(Catalog::fallback()), out_tx);
        tokio::spawn(service.run());
        out_rx.recv().await;
        out_rx.recv().await;

        let mut builder = crate::catalog::CatalogBuilder::default();
        builder.push("Fun", crate::catalog::MenuEntry::new("Chess", "xboard", "", "").unwrap());
        handle.reload(Arc::new(builder.build())).unwrap();

        assert_eq!(out_rx.recv().await, Some(DisplayCommand::SetSelected("Fun".into())));
        assert_eq!(out_rx.recv().await, Some(DisplayCommand::ShowCategory("Fun".into())));
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_loop() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (service, handle) = create_hover_service(&Config::default(), Arc::new(Catalog::fallback()), out_tx);
        drop(service);
        assert!(handle.send(HoverEvent::MenuEnter).is_err());
    }
}
