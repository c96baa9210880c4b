use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::events::{KeyCode, MonitorEvent, MonitorState, ScreenRect, WindowGeometry, WindowHandle};
use crate::services::companion_window::WindowController;
use crate::services::screen_detector::ScreenDetector;
use crate::services::virtual_device::KeyInjector;
use crate::services::window_probe::WindowProbe;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::placement::{owning_display, sidebar_geometry};

/// Параметры цикла монитора, снятые с конфигурации один раз при запуске
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub process_name: String,
    pub game_window_title: String,
    pub interval: Duration,
    pub detection_every: u32,
    pub backoff: Duration,
    pub width_fraction: f32,
    pub settle_delay: Duration,
    pub refresh_key: KeyCode,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            process_name: config.game.process_name.clone(),
            game_window_title: config.game.window_title.clone(),
            interval: config.interval(),
            detection_every: config.polling.detection_every.max(1),
            backoff: config.backoff(),
            width_fraction: config.companion.width_fraction,
            settle_delay: config.settle_delay(),
            refresh_key: config.refresh_key()?,
        })
    }
}

/// Состояние, видимое из других потоков
#[derive(Default)]
struct Shared {
    state: RwLock<MonitorState>,
    pending_refresh: AtomicBool,
    stop: AtomicBool,
}

/// Cloneable handle for talking to a running monitor from any thread
#[derive(Clone)]
pub struct MonitorHandle {
    shared: Arc<Shared>,
}

impl MonitorHandle {
    /// Ask for the refresh key to be sent the next time the game is running and active.
    /// Repeated requests before that collapse into one.
    pub fn request_refresh(&self) {
        if !self.shared.pending_refresh.swap(true, Ordering::AcqRel) {
            info!("Запрошена перезагрузка модов в игре");
        }
    }

    /// Snapshot published at the end of the last tick
    pub fn state(&self) -> MonitorState {
        let mut state = *self.shared.state.read();
        state.pending_refresh = self.shared.pending_refresh.load(Ordering::Acquire);
        state
    }

    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }
}

/// Running monitor thread
pub struct MonitorThread {
    handle: MonitorHandle,
    join: JoinHandle<()>,
}

impl MonitorThread {
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Blocks until the current sleep ends and the loop notices the stop flag
    pub fn stop(self) -> Result<()> {
        self.handle.stop();
        self.join
            .join()
            .map_err(|_| MonitorError::Internal("Поток монитора завершился с паникой".to_string()))
    }
}

/// Game presence state machine.
///
/// Owns every collaborator it drives; nothing here is touched from other
/// threads except through [`MonitorHandle`]. UI updates leave as
/// [`MonitorEvent`]s over the channel.
pub struct PresenceMonitor {
    settings: MonitorSettings,
    probe: WindowProbe,
    detector: Box<dyn ScreenDetector>,
    window: Box<dyn WindowController>,
    injector: Box<dyn KeyInjector>,
    events: UnboundedSender<MonitorEvent>,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,

    last_running: bool,
    last_active: bool,
    in_target_screen: bool,
    original_geometry: Option<WindowGeometry>,
    detection_counter: u32,
}

impl PresenceMonitor {
    pub fn new(
        settings: MonitorSettings,
        probe: WindowProbe,
        detector: Box<dyn ScreenDetector>,
        window: Box<dyn WindowController>,
        injector: Box<dyn KeyInjector>,
        events: UnboundedSender<MonitorEvent>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Монитор игры: процесс '{}', окно '{}', опрос каждые {:?}, распознавание каждый {}-й тик",
            settings.process_name, settings.game_window_title, settings.interval, settings.detection_every
        );

        Self {
            settings,
            probe,
            detector,
            window,
            injector,
            events,
            clock,
            shared: Arc::new(Shared::default()),
            last_running: false,
            last_active: false,
            in_target_screen: false,
            original_geometry: None,
            detection_counter: 0,
        }
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            shared: self.shared.clone(),
        }
    }

    /// Run the loop on a dedicated named thread
    pub fn spawn(self) -> Result<MonitorThread> {
        let handle = self.handle();
        let join = std::thread::Builder::new()
            .name("presence-monitor".to_string())
            .spawn(move || self.run())?;

        Ok(MonitorThread { handle, join })
    }

    pub fn run(mut self) {
        info!("Монитор состояния игры запущен");

        while !self.shared.stop.load(Ordering::Acquire) {
            self.step();
        }

        // Не оставляем окно-компаньон в режиме боковой панели
        self.exit_target_screen();
        info!("Монитор состояния игры остановлен");
    }

    /// One tick followed by the pause it asks for
    pub fn step(&mut self) {
        let pause = self.run_once();
        self.clock.sleep(pause);
    }

    /// Run a tick and decide how long to wait before the next one
    fn run_once(&mut self) -> Duration {
        match self.tick() {
            Ok(()) => self.settings.interval,
            Err(e) if e.is_enumeration() => {
                error!("{}; следующая попытка через {:?}", e, self.settings.backoff);
                self.settings.backoff
            }
            Err(e) => {
                error!("Ошибка в цикле монитора: {}", e);
                self.settings.interval
            }
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        let running = self.probe.is_running(&self.settings.process_name)?;
        let mut game_window = if running {
            self.probe.resolve(&self.settings.game_window_title)?
        } else {
            self.probe.invalidate();
            None
        };

        let mut active = match game_window {
            Some(handle) => self.probe.is_active(handle),
            None => false,
        };

        // Игра могла пересоздать окно (лаунчер, переключение полноэкранного режима)
        if let (false, Some(cached)) = (active, game_window) {
            let fresh = self.probe.find_window(&self.settings.game_window_title)?;
            if fresh != Some(cached) {
                game_window = fresh;
                active = match fresh {
                    Some(handle) => self.probe.is_active(handle),
                    None => false,
                };
            }
        }

        // Клик по боковой панели не должен выбивать из режима поверх игры
        if !active && running && self.last_active && self.window.has_focus() {
            debug!("Фокус у окна-компаньона, игра считается активной");
            active = true;
        }

        if !active && self.window.is_always_on_top() {
            self.apply("снять поверх всех окон", |w| w.set_always_on_top(false));
        }

        if self.in_target_screen && !(running && active) {
            info!("Игра закрыта или потеряла фокус, выходим из режима боковой панели");
            self.exit_target_screen();
        }

        if running != self.last_running || active != self.last_active {
            info!("Игра: запущена={}, активна={}", running, active);
            self.emit(MonitorEvent::presence(running, active));
            self.last_running = running;
            self.last_active = active;
        }

        if let (true, Some(handle)) = (running && active, game_window) {
            if self.shared.pending_refresh.swap(false, Ordering::AcqRel) {
                self.send_refresh(handle);
            }

            self.detection_counter += 1;
            if self.detection_counter >= self.settings.detection_every {
                self.detection_counter = 0;
                self.check_target_screen(handle);
            }
        }

        self.publish_state(running, active);
        Ok(())
    }

    fn check_target_screen(&mut self, handle: WindowHandle) {
        let game_rect = self.probe.get_rect(handle);
        let result = self.detector.detect(game_rect);
        crate::debug_if_enabled!("Распознавание экрана: {:?}", result);

        if result.detected && !self.in_target_screen {
            info!("Обнаружен экран скинов (совпадение {:.3})", result.score);
            self.enter_target_screen(game_rect);
        } else if !result.detected && self.in_target_screen {
            info!("Экран скинов закрыт (совпадение {:.3})", result.score);
            self.exit_target_screen();
        }
    }

    fn enter_target_screen(&mut self, game_rect: Option<ScreenRect>) {
        if self.original_geometry.is_none() {
            match self.window.current_geometry() {
                Ok(geometry) => {
                    debug!("Исходная геометрия окна-компаньона: {}", geometry);
                    self.original_geometry = Some(geometry);
                }
                Err(e) => {
                    warn!("Не удалось сохранить геометрию окна-компаньона: {}", e);
                    return;
                }
            }
        }

        let Some(game_rect) = game_rect else {
            warn!("Геометрия окна игры неизвестна, режим боковой панели отложен");
            return;
        };

        let displays = match self.window.list_displays() {
            Ok(displays) => displays,
            Err(e) => {
                warn!("Не удалось получить список мониторов: {}", e);
                return;
            }
        };

        let Some(owner) = owning_display(&displays, game_rect) else {
            warn!("Окно игры {} не принадлежит ни одному монитору", game_rect);
            return;
        };

        let target = sidebar_geometry(game_rect, owner, self.settings.width_fraction);
        info!("Боковая панель: {} (игра {}, монитор {:?})", target, game_rect, owner);

        self.apply("изменить размер", |w| w.resize(target.width, target.height));
        self.clock.sleep(self.settings.settle_delay);
        self.apply("поверх всех окон", |w| w.set_always_on_top(true));
        self.apply("включить прозрачность", |w| w.set_transparent(true));
        self.emit(MonitorEvent::InGameMode { enabled: true });
        self.apply("переместить", |w| w.move_to(target.x, target.y));

        self.in_target_screen = true;
    }

    /// No-op unless the sidebar layout is currently applied
    fn exit_target_screen(&mut self) {
        if !self.in_target_screen {
            return;
        }
        self.in_target_screen = false;

        if let Some(original) = self.original_geometry {
            debug!("Восстановление геометрии окна-компаньона: {}", original);
            self.apply("восстановить размер", |w| w.resize(original.width, original.height));
            self.apply("восстановить позицию", |w| w.move_to(original.x, original.y));
        }

        self.apply("снять поверх всех окон", |w| w.set_always_on_top(false));
        self.apply("выключить прозрачность", |w| w.set_transparent(false));
        self.emit(MonitorEvent::InGameMode { enabled: false });
    }

    fn send_refresh(&mut self, handle: WindowHandle) {
        let key = self.settings.refresh_key;
        info!("Отправка {} в игру для перезагрузки модов", key);

        let was_on_top = self.window.is_always_on_top();
        self.apply("снять поверх всех окон", |w| w.set_always_on_top(false));

        if !self.probe.focus(handle) {
            warn!("Окно игры не активировано, {} может уйти в другое окно", key);
        }

        let success = match self.injector.press_and_release(key) {
            Ok(()) => true,
            Err(e) => {
                error!("Не удалось отправить {}: {}", key, e);
                false
            }
        };

        if was_on_top {
            self.apply("вернуть поверх всех окон", |w| w.set_always_on_top(true));
        }

        self.emit(MonitorEvent::RefreshSent { success });
    }

    /// Сбой управления окном-компаньоном не останавливает монитор
    fn apply(&mut self, action: &str, op: impl FnOnce(&mut dyn WindowController) -> Result<()>) {
        if let Err(e) = op(self.window.as_mut()) {
            warn!("Окно-компаньон: не удалось {}: {}", action, e);
        }
    }

    fn emit(&self, event: MonitorEvent) {
        crate::trace_if_enabled!("Событие монитора: {}", event);
        if self.events.send(event).is_err() {
            debug!("Получатель событий монитора закрыт, событие {} отброшено", event);
        }
    }

    fn publish_state(&self, running: bool, active: bool) {
        let state = MonitorState {
            is_running: running,
            is_active: active,
            in_target_screen: self.in_target_screen,
            pending_refresh: false,
        };

        let previous = std::mem::replace(&mut *self.shared.state.write(), state);
        if previous.phase() != state.phase() {
            info!("Состояние игры: {} -> {}", previous.phase(), state.phase());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DetectionResult, Display, WindowInfo};
    use crate::services::companion_window::Displays;
    use crate::services::presence_monitor::clock::ManualClock;
    use crate::services::window_probe::{ProcessInfo, WindowBackend};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    const GAME: WindowHandle = WindowHandle(0x0440_0007);
    const OTHER: WindowHandle = WindowHandle(0x0220_0001);
    const GAME_RECT: ScreenRect = ScreenRect {
        left: 100,
        top: 100,
        right: 1100,
        bottom: 800,
    };
    const ORIGINAL: WindowGeometry = WindowGeometry {
        x: 200,
        y: 150,
        width: 1280,
        height: 800,
    };

    #[derive(Default)]
    struct GameState {
        running: bool,
        foreground: bool,
        /// Окно, пересозданное игрой вместо `GAME`
        recreated: Option<WindowHandle>,
        enumeration_failures: u32,
        probe_times: Vec<Duration>,
        activations: usize,
    }

    struct FakeBackend {
        game: Arc<Mutex<GameState>>,
        clock: Arc<ManualClock>,
    }

    impl WindowBackend for FakeBackend {
        fn list_windows(&mut self) -> Result<Vec<WindowInfo>> {
            let mut game = self.game.lock();
            if game.enumeration_failures > 0 {
                game.enumeration_failures -= 1;
                return Err(crate::monitor_error!(enumeration, "wmctrl недоступен"));
            }
            let mut windows = vec![WindowInfo::new(OTHER, "Terminal".to_string())];
            if game.running {
                let handle = game.recreated.unwrap_or(GAME);
                windows.push(WindowInfo::new(handle, "Wuthering Waves".to_string()));
            }
            Ok(windows)
        }

        fn foreground_window(&mut self) -> Result<Option<WindowHandle>> {
            let game = self.game.lock();
            Ok(Some(if game.foreground {
                game.recreated.unwrap_or(GAME)
            } else {
                OTHER
            }))
        }

        fn window_rect(&mut self, _handle: WindowHandle) -> Result<ScreenRect> {
            Ok(GAME_RECT)
        }

        fn activate(&mut self, _handle: WindowHandle) -> Result<()> {
            self.game.lock().activations += 1;
            Ok(())
        }

        fn processes(&mut self) -> Result<Vec<ProcessInfo>> {
            let mut game = self.game.lock();
            game.probe_times.push(self.clock.elapsed());
            let mut processes = vec![ProcessInfo::new(1, "systemd")];
            if game.running {
                processes.push(
                    ProcessInfo::new(4242, "Client-Win64-Sh")
                        .with_argv0("C:\\Games\\Wuthering Waves\\Client-Win64-Shipping.exe"),
                );
            }
            Ok(processes)
        }
    }

    struct ScriptedDetector {
        script: Arc<Mutex<VecDeque<bool>>>,
        calls: Arc<Mutex<Vec<Option<ScreenRect>>>>,
    }

    impl ScreenDetector for ScriptedDetector {
        fn detect(&mut self, game_rect: Option<ScreenRect>) -> DetectionResult {
            self.calls.lock().push(game_rect);
            match self.script.lock().pop_front() {
                Some(true) => DetectionResult::from_score(0.95, 0.867),
                _ => DetectionResult::from_score(0.2, 0.867),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum WindowCall {
        Resize(u32, u32),
        Move(i32, i32),
        OnTop(bool),
        Transparent(bool),
    }

    struct WindowState {
        geometry: WindowGeometry,
        on_top: bool,
        focused: bool,
        displays: Displays,
        calls: Vec<WindowCall>,
    }

    struct FakeWindow(Arc<Mutex<WindowState>>);

    impl WindowController for FakeWindow {
        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            let mut state = self.0.lock();
            state.geometry.width = width;
            state.geometry.height = height;
            state.calls.push(WindowCall::Resize(width, height));
            Ok(())
        }

        fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
            let mut state = self.0.lock();
            state.geometry.x = x;
            state.geometry.y = y;
            state.calls.push(WindowCall::Move(x, y));
            Ok(())
        }

        fn set_always_on_top(&mut self, on_top: bool) -> Result<()> {
            let mut state = self.0.lock();
            state.on_top = on_top;
            state.calls.push(WindowCall::OnTop(on_top));
            Ok(())
        }

        fn is_always_on_top(&mut self) -> bool {
            self.0.lock().on_top
        }

        fn set_transparent(&mut self, transparent: bool) -> Result<()> {
            self.0.lock().calls.push(WindowCall::Transparent(transparent));
            Ok(())
        }

        fn has_focus(&mut self) -> bool {
            self.0.lock().focused
        }

        fn current_geometry(&mut self) -> Result<WindowGeometry> {
            Ok(self.0.lock().geometry)
        }

        fn list_displays(&mut self) -> Result<Displays> {
            Ok(self.0.lock().displays.clone())
        }
    }

    struct RecordingInjector(Arc<Mutex<Vec<KeyCode>>>);

    impl KeyInjector for RecordingInjector {
        fn press_and_release(&mut self, key: KeyCode) -> Result<()> {
            self.0.lock().push(key);
            Ok(())
        }
    }

    struct Harness {
        monitor: PresenceMonitor,
        game: Arc<Mutex<GameState>>,
        script: Arc<Mutex<VecDeque<bool>>>,
        detections: Arc<Mutex<Vec<Option<ScreenRect>>>>,
        window: Arc<Mutex<WindowState>>,
        injected: Arc<Mutex<Vec<KeyCode>>>,
        events: UnboundedReceiver<MonitorEvent>,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_clock(ManualClock::default())
        }

        fn with_clock(clock: ManualClock) -> Self {
            let clock = Arc::new(clock);
            let game = Arc::new(Mutex::new(GameState::default()));
            let script = Arc::new(Mutex::new(VecDeque::new()));
            let detections = Arc::new(Mutex::new(Vec::new()));
            let window = Arc::new(Mutex::new(WindowState {
                geometry: ORIGINAL,
                on_top: false,
                focused: false,
                displays: Displays::from_slice(&[Display::new(0, 0, 1280, 1024)]),
                calls: Vec::new(),
            }));
            let injected = Arc::new(Mutex::new(Vec::new()));
            let (tx, events) = unbounded_channel();

            let settings = MonitorSettings::from_config(&Config::default()).unwrap();
            let probe = WindowProbe::new(Box::new(FakeBackend {
                game: game.clone(),
                clock: clock.clone(),
            }));
            let monitor = PresenceMonitor::new(
                settings,
                probe,
                Box::new(ScriptedDetector {
                    script: script.clone(),
                    calls: detections.clone(),
                }),
                Box::new(FakeWindow(window.clone())),
                Box::new(RecordingInjector(injected.clone())),
                tx,
                clock.clone(),
            );

            Self {
                monitor,
                game,
                script,
                detections,
                window,
                injected,
                events,
                clock,
            }
        }

        fn set_game(&self, running: bool, foreground: bool) {
            let mut game = self.game.lock();
            game.running = running;
            game.foreground = foreground;
        }

        fn script(&self, results: &[bool]) {
            self.script.lock().extend(results.iter().copied());
        }

        fn tick(&mut self) {
            self.monitor.tick().unwrap();
        }

        fn drain(&mut self) -> Vec<MonitorEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }

        fn window_calls(&self) -> Vec<WindowCall> {
            std::mem::take(&mut self.window.lock().calls)
        }

        /// Два тика: на втором срабатывает распознавание
        fn enter_sidebar(&mut self) {
            self.set_game(true, true);
            self.script(&[true]);
            self.tick();
            self.tick();
            assert!(self.monitor.handle().state().in_target_screen);
        }
    }

    fn presence_events(events: &[MonitorEvent]) -> Vec<(bool, bool)> {
        events
            .iter()
            .filter_map(|event| match event {
                MonitorEvent::Presence { running, active, .. } => Some((*running, *active)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_presence_events_only_on_change() {
        let mut h = Harness::new();
        for running in [true, true, true, false] {
            h.set_game(running, false);
            h.tick();
        }

        let events = h.drain();
        assert_eq!(presence_events(&events), vec![(true, false), (false, false)]);
    }

    #[test]
    fn test_presence_event_carries_indicator_colors() {
        let mut h = Harness::new();
        h.set_game(true, true);
        h.tick();

        match h.drain().as_slice() {
            [MonitorEvent::Presence { indicators, .. }] => {
                assert_eq!(indicators.running_color, "#22c55e");
                assert_eq!(indicators.active_color, "#22c55e");
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_idle_state_does_not_emit() {
        let mut h = Harness::new();
        h.tick();
        h.tick();
        assert!(h.drain().is_empty());
        assert_eq!(h.monitor.handle().state(), MonitorState::default());
    }

    #[test]
    fn test_refresh_consumed_once_while_active() {
        let mut h = Harness::new();
        let handle = h.monitor.handle();
        h.set_game(true, true);

        handle.request_refresh();
        handle.request_refresh();
        assert!(handle.state().pending_refresh);

        h.tick();
        assert!(!handle.state().pending_refresh);
        assert_eq!(h.injected.lock().len(), 1);
        assert_eq!(h.injected.lock()[0].value(), 68);
        assert_eq!(h.game.lock().activations, 1);

        h.tick();
        assert_eq!(h.injected.lock().len(), 1);
        assert!(h.drain().contains(&MonitorEvent::RefreshSent { success: true }));
    }

    #[test]
    fn test_refresh_waits_for_active_game() {
        let mut h = Harness::new();
        let handle = h.monitor.handle();
        handle.request_refresh();

        h.tick();
        h.set_game(true, false);
        h.tick();
        assert!(h.injected.lock().is_empty());
        assert!(handle.state().pending_refresh);

        h.set_game(true, true);
        h.tick();
        assert_eq!(h.injected.lock().len(), 1);
        assert!(!handle.state().pending_refresh);
    }

    #[test]
    fn test_refresh_restores_always_on_top() {
        let mut h = Harness::new();
        h.enter_sidebar();
        h.window_calls();

        h.monitor.handle().request_refresh();
        h.tick();

        assert_eq!(
            h.window_calls(),
            vec![WindowCall::OnTop(false), WindowCall::OnTop(true)]
        );
        assert!(h.window.lock().on_top);
    }

    #[test]
    fn test_sidebar_entered_and_restored() {
        let mut h = Harness::new();
        h.set_game(true, true);
        h.script(&[true, false]);

        h.tick();
        assert!(h.detections.lock().is_empty());
        h.tick();
        assert_eq!(h.detections.lock().as_slice(), &[Some(GAME_RECT)]);

        assert_eq!(
            h.window_calls(),
            vec![
                WindowCall::Resize(150, 700),
                WindowCall::OnTop(true),
                WindowCall::Transparent(true),
                WindowCall::Move(1100, 100),
            ]
        );
        assert_eq!(h.clock.sleeps(), vec![Duration::from_millis(330)]);
        assert_eq!(h.monitor.handle().state().phase(), crate::events::PresencePhase::InTargetScreen);

        // Третий тик без распознавания, четвёртый распознаёт уход с экрана
        h.tick();
        assert!(h.window_calls().is_empty());
        h.tick();
        assert_eq!(h.detections.lock().len(), 2);

        assert_eq!(
            h.window_calls(),
            vec![
                WindowCall::Resize(1280, 800),
                WindowCall::Move(200, 150),
                WindowCall::OnTop(false),
                WindowCall::Transparent(false),
            ]
        );
        assert_eq!(h.window.lock().geometry, ORIGINAL);
        assert!(!h.window.lock().on_top);

        let modes: Vec<_> = h
            .drain()
            .into_iter()
            .filter(|event| matches!(event, MonitorEvent::InGameMode { .. }))
            .collect();
        assert_eq!(
            modes,
            vec![
                MonitorEvent::InGameMode { enabled: true },
                MonitorEvent::InGameMode { enabled: false },
            ]
        );
    }

    #[test]
    fn test_sidebar_clamped_to_narrow_display() {
        let mut h = Harness::new();
        h.window.lock().displays = Displays::from_slice(&[Display::new(0, 0, 1200, 1024)]);
        h.enter_sidebar();
        assert_eq!(h.window.lock().geometry, WindowGeometry::new(1049, 100, 150, 700));
    }

    #[test]
    fn test_exit_is_idempotent() {
        let mut h = Harness::new();
        h.monitor.exit_target_screen();
        h.monitor.exit_target_screen();
        assert!(h.window_calls().is_empty());
        assert!(h.drain().is_empty());

        h.enter_sidebar();
        h.window_calls();
        h.monitor.exit_target_screen();
        let first = h.window_calls();
        h.monitor.exit_target_screen();
        assert_eq!(first.len(), 4);
        assert!(h.window_calls().is_empty());
    }

    #[test]
    fn test_focus_loss_forces_exit() {
        let mut h = Harness::new();
        h.enter_sidebar();
        h.drain();
        h.window_calls();

        h.set_game(true, false);
        h.tick();

        let state = h.monitor.handle().state();
        assert!(!state.in_target_screen);
        assert!(!state.is_active);
        assert_eq!(h.window.lock().geometry, ORIGINAL);

        let events = h.drain();
        assert_eq!(
            events,
            vec![
                MonitorEvent::InGameMode { enabled: false },
                MonitorEvent::presence(true, false),
            ]
        );
    }

    #[test]
    fn test_game_exit_forces_sidebar_exit() {
        let mut h = Harness::new();
        h.enter_sidebar();

        h.set_game(false, false);
        h.tick();

        assert_eq!(h.monitor.handle().state(), MonitorState::default());
        assert!(h.monitor.probe.cached_handle().is_none());
        assert_eq!(h.window.lock().geometry, ORIGINAL);
    }

    #[test]
    fn test_companion_focus_keeps_game_active() {
        let mut h = Harness::new();
        h.enter_sidebar();
        h.drain();

        h.game.lock().foreground = false;
        h.window.lock().focused = true;
        h.tick();

        let state = h.monitor.handle().state();
        assert!(state.is_active);
        assert!(state.in_target_screen);
        assert!(h.window.lock().on_top);
        assert!(h.drain().is_empty());
    }

    #[test]
    fn test_companion_focus_ignored_when_game_was_inactive() {
        let mut h = Harness::new();
        h.set_game(true, false);
        h.window.lock().focused = true;
        h.tick();
        assert!(!h.monitor.handle().state().is_active);
    }

    #[test]
    fn test_on_top_dropped_while_game_inactive() {
        let mut h = Harness::new();
        h.window.lock().on_top = true;
        h.set_game(true, false);
        h.tick();

        assert_eq!(h.window_calls(), vec![WindowCall::OnTop(false)]);
        h.tick();
        assert!(h.window_calls().is_empty());
    }

    #[test]
    fn test_entry_aborted_without_owning_display() {
        let mut h = Harness::new();
        h.window.lock().displays = Displays::from_slice(&[Display::new(2000, 0, 1920, 1080)]);
        h.set_game(true, true);
        h.script(&[true]);
        h.tick();
        h.tick();

        assert!(!h.monitor.handle().state().in_target_screen);
        assert!(h.window_calls().is_empty());
        assert_eq!(h.monitor.original_geometry, Some(ORIGINAL));
    }

    #[test]
    fn test_original_geometry_captured_once() {
        let mut h = Harness::new();
        h.enter_sidebar();
        h.script(&[false]);
        h.tick();
        h.tick();
        assert!(!h.monitor.handle().state().in_target_screen);

        // Пользователь сдвинул окно между заходами на экран скинов
        h.window.lock().geometry = WindowGeometry::new(0, 0, 640, 480);
        h.script(&[false, true, false]);
        for _ in 0..6 {
            h.tick();
        }
        assert!(!h.monitor.handle().state().in_target_screen);
        assert_eq!(h.window.lock().geometry, ORIGINAL);
    }

    #[test]
    fn test_enumeration_failure_backs_off() {
        let mut h = Harness::new();
        h.set_game(true, false);
        h.game.lock().enumeration_failures = 1;

        h.monitor.step();
        h.monitor.step();
        h.monitor.step();

        let times = h.game.lock().probe_times.clone();
        assert_eq!(times.len(), 3);
        assert!(times[1] - times[0] >= Duration::from_secs(5));
        assert_eq!(times[2] - times[1], Duration::from_millis(650));
    }

    #[test]
    fn test_settings_reject_unknown_refresh_key() {
        let mut config = Config::default();
        config.refresh.key = "hyper".to_string();
        assert!(matches!(
            MonitorSettings::from_config(&config),
            Err(MonitorError::Config(_))
        ));
    }

    #[test]
    fn test_recreated_game_window_is_picked_up() {
        let mut h = Harness::new();
        h.set_game(true, true);
        h.tick();
        assert_eq!(h.monitor.probe.cached_handle(), Some(GAME));

        let recreated = WindowHandle(0x0460_0001);
        h.game.lock().recreated = Some(recreated);
        h.tick();

        assert!(h.monitor.handle().state().is_active);
        assert_eq!(h.monitor.probe.cached_handle(), Some(recreated));
        assert!(h.drain().iter().all(|event| *event != MonitorEvent::presence(true, false)));
    }

    #[test]
    fn test_on_top_set_outside_monitor_is_respected() {
        let mut h = Harness::new();
        h.set_game(true, true);
        h.tick();

        // Интерфейс сам закрепил окно поверх всех
        h.window.lock().on_top = true;
        h.monitor.handle().request_refresh();
        h.tick();

        assert_eq!(
            h.window_calls(),
            vec![WindowCall::OnTop(false), WindowCall::OnTop(true)]
        );
        assert!(h.window.lock().on_top);

        h.set_game(true, false);
        h.tick();
        assert_eq!(h.window_calls(), vec![WindowCall::OnTop(false)]);
    }

    #[test]
    fn test_stop_restores_companion_window() {
        let mut h = Harness::new();
        h.enter_sidebar();

        let handle = h.monitor.handle();
        handle.stop();
        h.monitor.run();

        assert_eq!(h.window.lock().geometry, ORIGINAL);
        assert!(!h.window.lock().on_top);
    }

    #[test]
    fn test_spawned_thread_stops() {
        let h = Harness::with_clock(ManualClock::with_real_pause(Duration::from_millis(1)));
        h.set_game(true, true);
        let thread = h.monitor.spawn().unwrap();
        let handle = thread.handle();

        std::thread::sleep(Duration::from_millis(20));
        assert!(thread.stop().is_ok());
        assert!(handle.state().is_running);
    }
}
