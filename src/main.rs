use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use std::sync::Arc;
mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use services::{
    create_companion_window,
    create_screen_capturer,
    create_window_backend,
    MonitorSettings,
    PresenceMonitor,
    SystemClock,
    TemplateDetector,
    TemplateMatcher,
    VirtualDevice,
    WindowProbe,
};

#[derive(Parser, Debug)]
#[command(name = "companion-monitor")]
#[command(about = "Фоновый монитор состояния игры для менеджера модов")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "companion.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает logging.level)
    #[arg(long)]
    log_level: Option<String>,

    /// Сразу запросить перезагрузку модов, как только игра станет активной
    #[arg(long)]
    refresh_on_start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск companion-monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Проверка окружения и прав доступа
    utils::permissions::check_environment(args.dry_run)?;

    // Инициализация компонентов
    let settings = MonitorSettings::from_config(&config)?;
    let probe = WindowProbe::new(create_window_backend(args.dry_run));
    let detector = TemplateDetector::new(
        create_screen_capturer(args.dry_run),
        TemplateMatcher::new(config.detection.max_frame_width),
        config.detection.template_path.clone(),
        config.detection.threshold,
    );
    let window = create_companion_window(&config, args.dry_run);
    let injector = VirtualDevice::new("Companion Monitor Virtual Keyboard", args.dry_run)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let monitor = PresenceMonitor::new(
        settings,
        probe,
        Box::new(detector),
        window,
        Box::new(injector),
        events_tx,
        Arc::new(SystemClock::new()),
    );

    info!("Все компоненты инициализированы");

    let monitor_thread = monitor.spawn().context("Не удалось запустить поток монитора")?;
    let handle = monitor_thread.handle();
    if args.refresh_on_start {
        handle.request_refresh();
    }

    let ui_handle = tokio::spawn(services::ui_bridge::run_event_loop(events_rx));

    info!("Монитор запущен, ожидание Ctrl+C");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Поток монитора спит синхронно, ждём его вне рантайма
    match tokio::task::spawn_blocking(move || monitor_thread.stop()).await {
        Ok(Ok(())) => info!("Поток монитора остановлен"),
        Ok(Err(e)) => warn!("Поток монитора завершился с ошибкой: {}", e),
        Err(e) => warn!("Не удалось дождаться потока монитора: {}", e),
    }

    // Поток монитора закрыл свой конец канала, задача интерфейса дочитывает события
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, ui_handle).await {
        Ok(Ok(state)) => info!("Итоговое состояние интерфейса: {:?}", state),
        Ok(Err(e)) => warn!("Задача интерфейса завершилась с ошибкой: {}", e),
        Err(_) => warn!("Таймаут при завершении задачи интерфейса"),
    }

    info!("companion-monitor завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
