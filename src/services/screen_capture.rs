use crate::error::{MonitorError, Result};
use crate::events::ScreenRect;
use image::RgbaImage;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt as _, ImageFormat, ImageOrder, Window};
use x11rb::rust_connection::RustConnection;

/// Захваченный кадр, всегда в порядке каналов RGBA
pub type Frame = RgbaImage;

/// Захват области экрана. Вызов может блокироваться на X сервере,
/// поэтому его нельзя выполнять под блокировкой.
pub trait ScreenCapturer: Send {
    fn capture(&mut self, rect: Option<ScreenRect>) -> Option<Frame>;
}

/// Factory function to create an appropriate capturer based on the dry_run flag
pub fn create_screen_capturer(dry_run: bool) -> Box<dyn ScreenCapturer> {
    if dry_run {
        Box::new(DryRunCapturer)
    } else {
        Box::new(X11ScreenCapturer::new())
    }
}

struct X11Session {
    conn: RustConnection,
    root: Window,
    root_width: i32,
    root_height: i32,
    bits_per_pixel: u8,
    lsb_first: bool,
}

impl X11Session {
    fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .map_err(|e| crate::monitor_error!(capture, "Не удалось подключиться к X серверу: {}", e))?;

        let (root, root_width, root_height, bits_per_pixel, lsb_first) = {
            let setup = conn.setup();
            let screen = setup.roots.get(screen_num).ok_or_else(|| {
                MonitorError::Capture(format!("Экран {} не найден", screen_num))
            })?;
            let bits_per_pixel = setup
                .pixmap_formats
                .iter()
                .find(|format| format.depth == screen.root_depth)
                .map(|format| format.bits_per_pixel)
                .unwrap_or(0);
            (
                screen.root,
                i32::from(screen.width_in_pixels),
                i32::from(screen.height_in_pixels),
                bits_per_pixel,
                setup.image_byte_order == ImageOrder::LSB_FIRST,
            )
        };

        info!(
            "Подключено к X серверу: {}x{}, {} bpp",
            root_width, root_height, bits_per_pixel
        );

        Ok(Self {
            conn,
            root,
            root_width,
            root_height,
            bits_per_pixel,
            lsb_first,
        })
    }

    fn grab(&self, rect: ScreenRect) -> Result<Frame> {
        if self.bits_per_pixel != 32 {
            return Err(MonitorError::Capture(format!(
                "Неподдерживаемый формат пикселей: {} bpp",
                self.bits_per_pixel
            )));
        }

        // Обрезаем по границам корневого окна: окно игры может частично уходить за экран
        let clipped = ScreenRect::new(
            rect.left.max(0),
            rect.top.max(0),
            rect.right.min(self.root_width),
            rect.bottom.min(self.root_height),
        );
        if clipped.is_empty() {
            return Err(crate::monitor_error!(capture, "Пустая область захвата {}", rect));
        }

        let (left, top) = (clipped.left, clipped.top);
        let width = clipped.width() as u16;
        let height = clipped.height() as u16;

        let reply = self
            .conn
            .get_image(
                ImageFormat::Z_PIXMAP,
                self.root,
                left as i16,
                top as i16,
                width,
                height,
                !0,
            )
            .map_err(|e| crate::monitor_error!(capture, "GetImage: {}", e))?
            .reply()
            .map_err(|e| crate::monitor_error!(capture, "GetImage: {}", e))?;

        packed_to_rgba(&reply.data, u32::from(width), u32::from(height), self.lsb_first)
            .ok_or_else(|| MonitorError::Capture("Неполный ответ GetImage".to_string()))
    }
}

/// Перевод 32-битных пикселей X сервера (BGRX при LSB, XRGB при MSB) в RGBA
pub(crate) fn packed_to_rgba(data: &[u8], width: u32, height: u32, lsb_first: bool) -> Option<Frame> {
    let pixels = (width as usize) * (height as usize);
    if data.len() < pixels * 4 {
        return None;
    }

    let mut rgba = Vec::with_capacity(pixels * 4);
    for px in data[..pixels * 4].chunks_exact(4) {
        let (r, g, b) = if lsb_first {
            (px[2], px[1], px[0])
        } else {
            (px[1], px[2], px[3])
        };
        rgba.extend_from_slice(&[r, g, b, 255]);
    }

    RgbaImage::from_raw(width, height, rgba)
}

/// Захват через X11 GetImage на корневом окне. Соединение открывается
/// лениво и сбрасывается после любой ошибки.
pub struct X11ScreenCapturer {
    session: Option<X11Session>,
}

impl X11ScreenCapturer {
    pub fn new() -> Self {
        Self { session: None }
    }

    fn try_capture(&mut self, rect: ScreenRect) -> Result<Frame> {
        if self.session.is_none() {
            self.session = Some(X11Session::connect()?);
        }
        match &self.session {
            Some(session) => session.grab(rect),
            None => Err(MonitorError::Capture("Нет соединения с X сервером".to_string())),
        }
    }
}

impl ScreenCapturer for X11ScreenCapturer {
    fn capture(&mut self, rect: Option<ScreenRect>) -> Option<Frame> {
        let rect = rect?;
        match self.try_capture(rect) {
            Ok(frame) => {
                crate::debug_if_enabled!("Захвачен кадр {}x{} для {}", frame.width(), frame.height(), rect);
                Some(frame)
            }
            Err(e) => {
                warn!("Захват экрана не удался: {}", e);
                self.session = None;
                None
            }
        }
    }
}

/// Захват для dry-run: кадров нет
pub struct DryRunCapturer;

impl ScreenCapturer for DryRunCapturer {
    fn capture(&mut self, rect: Option<ScreenRect>) -> Option<Frame> {
        debug!("[DRY RUN] Захват {:?} пропущен", rect);
        None
    }
}
