use crate::events::{DetectionResult, ScreenRect};
use crate::services::screen_capture::ScreenCapturer;
use crate::services::template_matcher::TemplateMatcher;
use std::path::PathBuf;

/// Detects whether the game currently shows the target screen
pub trait ScreenDetector: Send {
    fn detect(&mut self, game_rect: Option<ScreenRect>) -> DetectionResult;
}

/// Capture the game window region and match it against the reference image on disk
pub struct TemplateDetector {
    capturer: Box<dyn ScreenCapturer>,
    matcher: TemplateMatcher,
    template_path: PathBuf,
    threshold: f32,
}

impl TemplateDetector {
    pub fn new(
        capturer: Box<dyn ScreenCapturer>,
        matcher: TemplateMatcher,
        template_path: PathBuf,
        threshold: f32,
    ) -> Self {
        Self {
            capturer,
            matcher,
            template_path,
            threshold,
        }
    }
}

impl ScreenDetector for TemplateDetector {
    fn detect(&mut self, game_rect: Option<ScreenRect>) -> DetectionResult {
        let frame = self.capturer.capture(game_rect);
        self.matcher
            .match_template(frame.as_ref(), &self.template_path, self.threshold)
    }
}
