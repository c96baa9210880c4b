use crate::error::{MonitorError, Result};
use crate::events::{KeyCode, VirtualKeyEvent};
use tracing::{debug, info};

const EV_SYN: i32 = 0;
const EV_KEY: i32 = 1;
const SYN_REPORT: i32 = 0;

/// Синтетический ввод в окно, находящееся в фокусе
pub trait KeyInjector: Send {
    fn press_and_release(&mut self, key: KeyCode) -> Result<()>;
}

pub struct VirtualDevice {
    device: Option<uinput::Device>,
    device_name: String,
    dry_run: bool,
}

impl VirtualDevice {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация VirtualDevice '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Self::create_virtual_device(device_name)?)
        };

        Ok(Self {
            device,
            device_name: device_name.to_string(),
            dry_run,
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}' для инъекции клавиш", device_name);

        let virtual_device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| {
                MonitorError::Internal(format!(
                    "Не удалось создать виртуальное устройство '{}': {}",
                    device_name, e
                ))
            })?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    pub fn send_event(&mut self, event: VirtualKeyEvent) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Виртуальное событие: {:?} {}", event.state, event.key_code);
            return Ok(());
        }

        let Some(device) = &mut self.device else {
            return Err(MonitorError::Internal("Виртуальное устройство недоступно".to_string()));
        };

        let keycode = i32::from(event.key_code.value());

        device.write(EV_KEY, keycode, event.state.value()).map_err(|e| {
            MonitorError::Internal(format!("Не удалось отправить событие клавиши {}: {}", event.key_code, e))
        })?;

        device
            .write(EV_SYN, SYN_REPORT, 0)
            .map_err(|e| MonitorError::Internal(format!("Не удалось синхронизировать события: {}", e)))?;

        debug!("Виртуальное событие {:?} {} отправлено", event.state, event.key_code);
        Ok(())
    }
}

impl KeyInjector for VirtualDevice {
    fn press_and_release(&mut self, key: KeyCode) -> Result<()> {
        self.send_event(VirtualKeyEvent::press(key))?;
        self.send_event(VirtualKeyEvent::release(key))
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства '{}'", self.device_name);
        }
    }
}
