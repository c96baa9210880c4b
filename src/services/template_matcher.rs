//! Template matching by zero-mean normalized cross-correlation.
//!
//! Both the captured frame and the reference image are reduced to 8-bit luma
//! first, so UI colour theming and overlay transparency do not cause misses.
//! The score of a placement is
//!
//! ```text
//!            Σ (F - mean F)(T - mean T)
//! score = --------------------------------
//!         sqrt(Σ (F - mean F)² Σ (T - mean T)²)
//! ```
//!
//! which is invariant to brightness and contrast drift between the stored
//! reference and the live capture. The reported score is the maximum over all
//! placements of the template inside the frame, clamped to `[0, 1]`.
//!
//! With `max_frame_width` set, a downscaled pass only nominates candidate
//! placements; their neighbourhoods are then scored at full resolution, so an
//! exact occurrence of the reference still scores 1.0.

use crate::error::Result;
use crate::events::DetectionResult;
use crate::services::screen_capture::Frame;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use std::path::Path;
use tracing::warn;

/// Дисперсия окна ниже этого порога считается нулевой (однотонная область)
const MIN_VARIANCE: f64 = 1e-6;

/// Сколько лучших позиций грубого прохода пересчитывается в полном разрешении
const COARSE_CANDIDATES: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct TemplateMatcher {
    /// Кадры шире этого значения сначала ищутся в уменьшенном виде, затем лучшие
    /// позиции пересчитываются в полном разрешении; 0 отключает грубый проход
    max_frame_width: u32,
}

impl TemplateMatcher {
    pub fn new(max_frame_width: u32) -> Self {
        Self { max_frame_width }
    }

    /// Загрузить шаблон с диска (каждый раз заново) и сопоставить с кадром.
    /// Отсутствующий кадр или нечитаемый шаблон дают `{detected: false, score: 0}`.
    pub fn match_template(
        &self,
        frame: Option<&Frame>,
        reference_path: &Path,
        threshold: f32,
    ) -> DetectionResult {
        let Some(frame) = frame else {
            return DetectionResult::not_detected();
        };

        match load_reference(reference_path) {
            Ok(reference) => self.match_images(frame, &reference, threshold),
            Err(e) => {
                warn!("{}", e);
                DetectionResult::not_detected()
            }
        }
    }

    pub fn match_images(&self, frame: &Frame, reference: &DynamicImage, threshold: f32) -> DetectionResult {
        let frame_gray = imageops::grayscale(frame);
        let template_gray = reference.to_luma8();

        let score = if self.max_frame_width > 0 && frame_gray.width() > self.max_frame_width {
            let scale = f64::from(self.max_frame_width) / f64::from(frame_gray.width());
            coarse_to_fine(&frame_gray, &template_gray, scale)
        } else {
            max_correlation(&frame_gray, &template_gray)
        };

        crate::trace_if_enabled!("Оценка совпадения с шаблоном: {:.4}", score);
        DetectionResult::from_score(score, threshold)
    }
}

fn load_reference(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| crate::monitor_error!(template, "Не удалось загрузить шаблон {:?}: {}", path, e))
}

fn scale_gray(image: &GrayImage, scale: f64) -> GrayImage {
    let width = ((f64::from(image.width()) * scale).round() as u32).max(1);
    let height = ((f64::from(image.height()) * scale).round() as u32).max(1);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Максимальная нормализованная корреляция по всем допустимым позициям шаблона.
/// 0.0, если шаблон больше кадра или однотонный.
pub fn max_correlation(frame: &GrayImage, template: &GrayImage) -> f32 {
    match Correlator::new(frame, template) {
        Some(correlator) => clamp_score(correlator.best(correlator.positions())),
        None => 0.0,
    }
}

/// Поиск по уменьшенным копиям отбирает кандидатов, итоговая оценка
/// всегда считается в полном разрешении вокруг них.
fn coarse_to_fine(frame: &GrayImage, template: &GrayImage, scale: f64) -> f32 {
    let Some(full) = Correlator::new(frame, template) else {
        return 0.0;
    };

    let coarse_frame = scale_gray(frame, scale);
    let coarse_template = scale_gray(template, scale);
    let Some(coarse) = Correlator::new(&coarse_frame, &coarse_template) else {
        // Шаблон выродился при уменьшении: только полный перебор
        return clamp_score(full.best(full.positions()));
    };

    let radius = (1.0 / scale).ceil() as usize + 1;
    let mut best = 0.0f64;
    for (cx, cy) in coarse.top_positions(COARSE_CANDIDATES) {
        let fx = ((cx as f64) / scale).round() as usize;
        let fy = ((cy as f64) / scale).round() as usize;
        let xs = fx.saturating_sub(radius)..=(fx + radius).min(full.max_x);
        let ys = fy.saturating_sub(radius)..=(fy + radius).min(full.max_y);
        let around = ys.flat_map(|y| xs.clone().map(move |x| (x, y)));
        best = best.max(full.best(around));
    }

    clamp_score(best)
}

fn clamp_score(score: f64) -> f32 {
    score.clamp(0.0, 1.0) as f32
}

/// Кадр и центрированный шаблон, подготовленные для оценки отдельных позиций
struct Correlator {
    pixels: Vec<f64>,
    frame_width: usize,
    template: Vec<f64>,
    template_width: usize,
    template_height: usize,
    template_norm: f64,
    integral: IntegralImage,
    max_x: usize,
    max_y: usize,
}

impl Correlator {
    fn new(frame: &GrayImage, template: &GrayImage) -> Option<Self> {
        let (fw, fh) = (frame.width() as usize, frame.height() as usize);
        let (tw, th) = (template.width() as usize, template.height() as usize);
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let n = (tw * th) as f64;
        let template_mean = template.as_raw().iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let centered: Vec<f64> = template
            .as_raw()
            .iter()
            .map(|&v| f64::from(v) - template_mean)
            .collect();
        let template_norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
        if template_norm < MIN_VARIANCE {
            return None;
        }

        let pixels: Vec<f64> = frame.as_raw().iter().map(|&v| f64::from(v)).collect();
        let integral = IntegralImage::new(&pixels, fw, fh);

        Some(Self {
            pixels,
            frame_width: fw,
            template: centered,
            template_width: tw,
            template_height: th,
            template_norm,
            integral,
            max_x: fw - tw,
            max_y: fh - th,
        })
    }

    fn positions(&self) -> impl Iterator<Item = (usize, usize)> {
        let (max_x, max_y) = (self.max_x, self.max_y);
        (0..=max_y).flat_map(move |y| (0..=max_x).map(move |x| (x, y)))
    }

    fn score_at(&self, x: usize, y: usize) -> f64 {
        let (tw, th) = (self.template_width, self.template_height);
        let n = (tw * th) as f64;
        let (sum, sum_sq) = self.integral.window(x, y, tw, th);
        let variance = sum_sq - sum * sum / n;
        if variance < MIN_VARIANCE {
            return 0.0;
        }

        // Σ F·T' == Σ (F - mean F)·T', так как Σ T' == 0
        let fw = self.frame_width;
        let mut numerator = 0.0;
        for row in 0..th {
            let frame_row = &self.pixels[(y + row) * fw + x..(y + row) * fw + x + tw];
            let template_row = &self.template[row * tw..(row + 1) * tw];
            numerator += frame_row
                .iter()
                .zip(template_row)
                .map(|(f, t)| f * t)
                .sum::<f64>();
        }

        numerator / (variance.sqrt() * self.template_norm)
    }

    fn best(&self, positions: impl Iterator<Item = (usize, usize)>) -> f64 {
        positions
            .map(|(x, y)| self.score_at(x, y))
            .fold(0.0, f64::max)
    }

    fn top_positions(&self, count: usize) -> Vec<(usize, usize)> {
        let mut scored: Vec<(f64, (usize, usize))> = self
            .positions()
            .map(|(x, y)| (self.score_at(x, y), (x, y)))
            .collect();
        scored.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(count);
        scored.into_iter().map(|(_, position)| position).collect()
    }
}

/// Интегральные изображения суммы и суммы квадратов для O(1) статистики окна
struct IntegralImage {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl IntegralImage {
    fn new(pixels: &[f64], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sum = vec![0.0; stride * (height + 1)];
        let mut sum_sq = vec![0.0; stride * (height + 1)];

        for y in 0..height {
            let mut row_sum = 0.0;
            let mut row_sum_sq = 0.0;
            for x in 0..width {
                let v = pixels[y * width + x];
                row_sum += v;
                row_sum_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row_sum;
                sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sum_sq;
            }
        }

        Self { stride, sum, sum_sq }
    }

    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let at = |table: &[f64], xx: usize, yy: usize| table[yy * self.stride + xx];
        let rect = |table: &[f64]| {
            at(table, x + w, y + h) - at(table, x, y + h) - at(table, x + w, y) + at(table, x, y)
        };
        (rect(&self.sum), rect(&self.sum_sq))
    }
}
