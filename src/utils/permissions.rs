use crate::error::{MonitorError, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

/// Утилиты, без которых X11 реализации деградируют до "игра не найдена"
const REQUIRED_TOOLS: &[&str] = &["wmctrl", "xdotool", "xprop", "xrandr"];

/// Проверить окружение перед запуском монитора
pub fn check_environment(dry_run: bool) -> Result<()> {
    info!("Проверка окружения...");

    if dry_run {
        info!("Dry-run: проверки X11 и uinput пропущены");
        return Ok(());
    }

    check_display();
    check_tools();
    check_uinput_access()?;
    check_not_root();

    info!("Проверка окружения завершена");
    Ok(())
}

fn check_display() {
    match std::env::var("DISPLAY") {
        Ok(value) if !value.is_empty() => info!("X11 дисплей: {}", value),
        _ => warn!("Переменная DISPLAY не задана: поиск окон и захват экрана работать не будут"),
    }
}

fn check_tools() {
    let path = std::env::var("PATH").unwrap_or_default();
    for tool in REQUIRED_TOOLS {
        if !find_in_path(&path, tool) {
            warn!("{} не найден в PATH", tool);
        }
    }
}

fn find_in_path(path: &str, tool: &str) -> bool {
    path.split(':')
        .filter(|dir| !dir.is_empty())
        .any(|dir| Path::new(dir).join(tool).is_file())
}

fn check_uinput_access() -> Result<()> {
    let uinput_device = "/dev/uinput";

    if !Path::new(uinput_device).exists() {
        warn!("{} не существует, возможно модуль uinput не загружен", uinput_device);
        return Ok(()); // Не критично: создание устройства сообщит точную ошибку
    }

    match fs::metadata(uinput_device) {
        Ok(metadata) => {
            let mode = metadata.permissions().mode();

            if mode & 0o006 == 0 && mode & 0o060 == 0 && !is_root() {
                return Err(MonitorError::Permission(format!(
                    "Нет прав доступа к {}. Добавьте пользователя в группу 'uinput' или 'input'",
                    uinput_device
                )));
            }

            info!("Доступ к {} подтвержден", uinput_device);
            Ok(())
        }
        Err(e) => Err(crate::monitor_error!(
            permission,
            "Не удалось проверить права доступа к {}: {}",
            uinput_device,
            e
        )),
    }
}

fn is_root() -> bool {
    std::env::var("USER").map(|user| user == "root").unwrap_or(false)
}

fn check_not_root() {
    if is_root() {
        warn!("⚠️  Приложение запущено от имени root!");
        warn!("   Окно игры и окно-компаньон принадлежат сессии пользователя,");
        warn!("   рекомендуется: sudo usermod -a -G input,uinput $USER");
    }
}
