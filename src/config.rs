use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::events::KeyCode;
use crate::mappings::KeyNames;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub game: GameConfig,
    pub polling: PollingConfig,
    pub detection: DetectionConfig,
    pub companion: CompanionConfig,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Точное имя исполняемого файла игры
    pub process_name: String,
    /// Подстрока заголовка окна игры (с учётом регистра)
    pub window_title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Сопоставление с шаблоном выполняется на каждом N-м такте
    pub detection_every: u32,
    /// Пауза после сбоя перечисления окон
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub template_path: PathBuf,
    pub threshold: f32,
    /// Кадр шире этого значения сначала ищется в уменьшенном виде, лучшие позиции
    /// пересчитываются в полном разрешении (0 — только полный перебор)
    pub max_frame_width: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompanionConfig {
    pub window_title: String,
    /// Доля ширины окна игры, занимаемая боковой панелью
    pub width_fraction: f32,
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            game: GameConfig {
                process_name: "Client-Win64-Shipping.exe".to_string(),
                window_title: "Wuthering Waves".to_string(),
            },
            polling: PollingConfig {
                interval_ms: 650,
                detection_every: 2,
                backoff_ms: 5000,
            },
            detection: DetectionConfig {
                template_path: PathBuf::from("static/skins_icon_ingame_screen.png"),
                threshold: 0.867,
                max_frame_width: 0,
            },
            companion: CompanionConfig {
                window_title: "WuWa Mod Manager".to_string(),
                width_fraction: 0.15,
                settle_delay_ms: 330,
            },
            refresh: RefreshConfig {
                key: "f10".to_string(),
            },
        }
    }
}

impl Config {
    /// Значения по умолчанию, поверх них TOML файл, поверх него переменные
    /// окружения `COMPANION_<СЕКЦИЯ>__<КЛЮЧ>`.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("COMPANION_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.game.process_name.trim().is_empty() {
            anyhow::bail!("game.process_name не может быть пустым");
        }
        if self.game.window_title.is_empty() {
            anyhow::bail!("game.window_title не может быть пустым");
        }

        if self.polling.interval_ms < 100 {
            anyhow::bail!("polling.interval_ms должно быть минимум 100");
        }
        if self.polling.detection_every == 0 {
            anyhow::bail!("polling.detection_every должно быть больше 0");
        }
        if self.polling.backoff_ms < self.polling.interval_ms {
            anyhow::bail!("polling.backoff_ms не может быть меньше polling.interval_ms");
        }

        if !(self.detection.threshold > 0.0 && self.detection.threshold <= 1.0) {
            anyhow::bail!(
                "detection.threshold должен быть в диапазоне (0, 1]: {}",
                self.detection.threshold
            );
        }

        if !(self.companion.width_fraction > 0.0 && self.companion.width_fraction <= 1.0) {
            anyhow::bail!(
                "companion.width_fraction должна быть в диапазоне (0, 1]: {}",
                self.companion.width_fraction
            );
        }
        if self.companion.window_title.is_empty() {
            anyhow::bail!("companion.window_title не может быть пустым");
        }

        self.refresh_key()?;

        Ok(())
    }

    pub fn refresh_key(&self) -> Result<KeyCode> {
        KeyNames::translate(&self.refresh.key)
            .map_err(|e| anyhow::anyhow!("Неверная клавиша refresh.key: {}", e))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.polling.backoff_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.companion.settle_delay_ms)
    }
}
