use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod catalog;
mod config;
mod error;
mod events;
mod i18n;
mod position;
mod services;
mod tray;
mod utils;

use catalog::MenuEntry;
use config::Config;
use events::{BridgeCommand, DisplayCommand, ProtocolLine};
use i18n::{CategoryAliasTable, Translations};
use position::ScreenGeometry;
use services::{create_hover_service, HoverHandle, LauncherService, LauncherState, SourceWatcher};

#[derive(Parser, Debug)]
#[command(name = "menupup")]
#[command(about = "Ядро лаунчера: каталог меню, панель, позиция окна и логика наведения")]
struct Args {
    /// Файл меню (по умолчанию из конфигурации)
    menu_file: Option<String>,

    /// Путь к файлу конфигурации
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Уровень логирования (перекрывает конфигурацию)
    #[arg(long)]
    log_level: Option<String>,

    /// Размер экрана в формате WxH
    #[arg(long)]
    screen: Option<ScreenGeometry>,

    /// Разобрать меню и панель, вывести сводку и выйти
    #[arg(long)]
    once: bool,

    /// Не следить за изменениями файлов
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Конфигурация нужна до логирования: уровень может прийти из неё
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Arc::new(Config::load(&config_path)?);

    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level)?;

    info!("Запуск menupup v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {:?}", config_path);

    let menu_file = args
        .menu_file
        .as_deref()
        .map(utils::resolve_path)
        .unwrap_or_else(|| config.menu_file());
    let screen = args
        .screen
        .unwrap_or_else(|| ScreenGeometry::new(config.window.screen_width, config.window.screen_height));

    let locale_dirs = config.locale_dirs();
    let aliases = CategoryAliasTable::build(&locale_dirs);
    let translations = Translations::load(&locale_dirs);
    info!("Язык интерфейса: {}, синонимов категорий: {}", translations.lang(), aliases.len());

    let state = Arc::new(LauncherState::load(config.clone(), aliases, translations, menu_file, screen)?);
    info!(
        "Меню {:?}, экран {}x{}, панель: {}",
        state.menu_file(),
        state.screen().width,
        state.screen().height,
        state.layout().tray
    );
    let startup = startup_lines(&state);

    if args.once {
        let mut stdout = tokio::io::stdout();
        for line in &startup {
            stdout.write_all(format!("{}\n", line).as_bytes()).await?;
        }
        if let Some(first) = state.catalog().ordered_categories(&config.categories.excluded).first() {
            stdout
                .write_all(format!("{}\n", DisplayCommand::SetSelected(first.to_string())).as_bytes())
                .await?;
        }
        stdout.flush().await?;
        return Ok(());
    }

    // Строки протокола печатает одна задача, чтобы они не перемешивались
    let (display_tx, display_rx) = mpsc::unbounded_channel::<DisplayCommand>();
    let (lines_tx, lines_rx) = mpsc::unbounded_channel::<ProtocolLine>();
    for line in startup {
        let _ = lines_tx.send(line);
    }
    let printer_handle = tokio::spawn(print_protocol(display_rx, lines_rx));

    let (hover_service, hover) = create_hover_service(&config, state.catalog(), display_tx.clone());
    let hover_handle = tokio::spawn(async move {
        if let Err(e) = hover_service.run().await {
            error!("Ошибка в цикле наведения: {}", e);
        }
    });

    let watcher_handle = if args.no_watch {
        warn!("Наблюдение за файлами отключено");
        None
    } else {
        match SourceWatcher::new(state.clone(), hover.clone(), display_tx.clone(), lines_tx.clone()) {
            Ok(watcher) => {
                let watcher: Box<dyn LauncherService + Send> = Box::new(watcher);
                Some(tokio::spawn(async move {
                    if let Err(e) = watcher.run().await {
                        error!("Ошибка в наблюдателе файлов: {}", e);
                    }
                }))
            }
            Err(e) => {
                warn!("Наблюдатель файлов не запущен: {}", e);
                None
            }
        }
    };

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения или конца ввода от UI
    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        },
        _ = read_bridge(&state, &hover, &lines_tx) => info!("Ввод от UI завершён"),
    }

    info!("Завершение работы...");

    if let Err(e) = hover.shutdown() {
        warn!("Не удалось остановить цикл наведения: {}", e);
    }
    if let Some(handle) = &watcher_handle {
        handle.abort();
    }
    drop(display_tx);
    drop(lines_tx);

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = hover_handle.await;
        if let Some(handle) = watcher_handle {
            let _ = handle.await;
        }
        // Печать заканчивается, когда закрыты все отправители
        let _ = printer_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("menupup завершил работу");
    Ok(())
}

/// Позиция окна, блок меню и избранное
fn startup_lines(state: &LauncherState) -> Vec<ProtocolLine> {
    let mut lines = vec![ProtocolLine::Position(state.layout().position)];
    lines.extend(state.menu_lines());
    lines.extend(
        state
            .config()
            .favorites
            .iter()
            .map(|favorite| ProtocolLine::Favorite(MenuEntry::favorite(favorite))),
    );
    lines
}

/// Читает команды UI до `quit` или конца ввода
async fn read_bridge(state: &LauncherState, hover: &HoverHandle, lines: &mpsc::UnboundedSender<ProtocolLine>) {
    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match reader.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                error!("Ошибка чтения команд UI: {}", e);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<BridgeCommand>() {
            Ok(BridgeCommand::Hover(event)) => {
                if let Err(e) = hover.send(event) {
                    error!("{}", e);
                    return;
                }
            }
            Ok(BridgeCommand::Search(query)) => {
                let catalog = state.catalog();
                for entry in catalog.search(&query) {
                    let _ = lines.send(ProtocolLine::Match(entry.clone()));
                }
            }
            Ok(BridgeCommand::Quit) => return,
            Err(e) => warn!("Команда UI пропущена: {}", e),
        }
    }
}

async fn print_protocol(
    mut display: mpsc::UnboundedReceiver<DisplayCommand>,
    mut lines: mpsc::UnboundedReceiver<ProtocolLine>,
) {
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            biased;
            Some(line) = lines.recv() => line.to_string(),
            Some(command) = display.recv() => command.to_string(),
            else => break,
        };

        let written = async {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await
        };
        if let Err(e) = written.await {
            error!("Не удалось записать в stdout: {}", e);
            break;
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    // stdout занят протоколом, логи уходят в stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    Ok(())
}
