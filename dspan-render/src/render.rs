use std::path::Path;
use std::time::Duration;

use ab_glyph::FontVec;
use anyhow::{Result, anyhow, bail};
use dspan_core::{Condition, ConditionSummary, TestResults, TrialPhase};
use dspan_timing::{HighPrecisionTimer, Timer};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};
use tracing::debug;

use crate::scene::{Scene, TrialView};
use crate::segments::draw_number_centered;
use crate::text::TextCache;

pub const BACKGROUND: [u8; 4] = [0, 0, 0, 255];
pub const FOREGROUND: [u8; 4] = [255, 255, 255, 255];
pub const MUTED: [u8; 4] = [156, 163, 175, 255];
pub const ACCENT: [u8; 4] = [46, 160, 104, 255];
pub const SECONDARY: [u8; 4] = [79, 70, 229, 255];
const TRACK: [u8; 4] = [55, 65, 81, 255];

const EXPORT_SIZE: (u32, u32) = (1280, 800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

/// Software renderer drawing one [`Scene`] per frame into an RGBA canvas.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    text: Option<TextCache>,
}

impl SkiaRenderer {
    /// `font` is optional: without it labels are skipped, numerals still draw.
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let canvas = blank_canvas(width, height)?;
        debug!(width, height, text = font.is_some(), "renderer created");
        Ok(Self {
            width,
            height,
            canvas,
            text: font.map(TextCache::new),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = blank_canvas(new_width, new_height)?;
        self.width = new_width;
        self.height = new_height;
        if let Some(cache) = &self.text {
            debug!(cached_labels = cache.len(), "canvas resized");
        }
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Number of rasterised labels held by the text cache.
    pub fn cached_labels(&self) -> usize {
        self.text.as_ref().map_or(0, TextCache::len)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn render_scene(&mut self, scene: &Scene<'_>) {
        let (w, h) = (self.width as f32, self.height as f32);
        self.canvas.fill(color(BACKGROUND));
        let mut p = Painter {
            canvas: &mut self.canvas,
            text: self.text.as_mut(),
        };
        match scene {
            Scene::Welcome { participant } => draw_welcome(&mut p, w, h, participant),
            Scene::Instructions {
                step,
                total,
                title,
                body,
            } => draw_instructions(&mut p, w, h, *step, *total, title, body),
            Scene::Trial(view) => draw_trial(&mut p, w, h, view),
            Scene::Results {
                results,
                span_scale,
            } => draw_results(&mut p, w, h, results, *span_scale, true),
            Scene::ThankYou => {
                p.label("Thank You", 56.0, (w / 2.0, h * 0.38), Align::Center, FOREGROUND);
                p.label(
                    "Your participation is complete.",
                    26.0,
                    (w / 2.0, h * 0.5),
                    Align::Center,
                    FOREGROUND,
                );
                p.label(
                    "You may now close this window (Esc).",
                    18.0,
                    (w / 2.0, h * 0.62),
                    Align::Center,
                    MUTED,
                );
            }
        }
    }

    /// Draws `scene` and copies the canvas into the RGBA `frame_buffer`.
    pub fn render_frame(
        &mut self,
        scene: &Scene<'_>,
        frame_buffer: &mut [u8],
        timer: &mut HighPrecisionTimer,
    ) -> Result<FrameStats> {
        let t_draw = {
            let t = timer.now();
            self.render_scene(scene);
            timer.elapsed(t)
        };

        let t_copy = {
            let t = timer.now();
            let data = self.canvas.data();
            if frame_buffer.len() != data.len() {
                bail!(
                    "frame buffer holds {} bytes, canvas {}x{} needs {}",
                    frame_buffer.len(),
                    self.width,
                    self.height,
                    data.len()
                );
            }
            frame_buffer.copy_from_slice(data);
            timer.elapsed(t)
        };

        let total = t_draw + t_copy;
        timer.record_frame(total);
        Ok(FrameStats {
            draw: t_draw,
            copy: t_copy,
            total,
        })
    }

    /// Writes the results panel, without key hints, to a PNG file.
    pub fn export_results_png(
        &mut self,
        results: &TestResults,
        span_scale: usize,
        path: &Path,
    ) -> Result<()> {
        let (w, h) = EXPORT_SIZE;
        let mut pm = blank_canvas(w, h)?;
        let mut p = Painter {
            canvas: &mut pm,
            text: self.text.as_mut(),
        };
        draw_results(&mut p, w as f32, h as f32, results, span_scale, false);
        pm.save_png(path)
            .map_err(|e| anyhow!("writing {}: {e}", path.display()))?;
        debug!(path = %path.display(), "results exported");
        Ok(())
    }
}

fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
    let mut pm =
        Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
    pm.fill(color(BACKGROUND));
    Ok(pm)
}

fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn paint(c: [u8; 4]) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color_rgba8(c[0], c[1], c[2], c[3]);
    p.anti_alias = true;
    p
}

struct Painter<'a> {
    canvas: &'a mut Pixmap,
    text: Option<&'a mut TextCache>,
}

impl Painter<'_> {
    fn has_text(&self) -> bool {
        self.text.is_some()
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, c: [u8; 4]) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            self.canvas
                .fill_rect(rect, &paint(c), Transform::identity(), None);
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, c: [u8; 4]) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&path, &paint(c), &stroke, Transform::identity(), None);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, c: [u8; 4]) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.canvas
                .stroke_path(&path, &paint(c), &stroke, Transform::identity(), None);
        }
    }

    /// Draws one line of text with its top edge at `pos.1`. No-op without a font.
    fn label(&mut self, text: &str, size: f32, pos: (f32, f32), align: Align, c: [u8; 4]) {
        let Some(cache) = self.text.as_deref_mut() else {
            return;
        };
        if let Some(pm) = cache.get_or_render(text, size, c) {
            self.blit(&pm, pos, align);
        }
    }

    /// Like [`Painter::label`] but bypasses the cache; used for live input.
    fn live_label(&mut self, text: &str, size: f32, pos: (f32, f32), align: Align, c: [u8; 4]) {
        let Some(cache) = self.text.as_deref() else {
            return;
        };
        if let Some(pm) = cache.render_uncached(text, size, c) {
            self.blit(&pm, pos, align);
        }
    }

    fn blit(&mut self, pm: &Pixmap, pos: (f32, f32), align: Align) {
        let x = match align {
            Align::Left => pos.0,
            Align::Center => pos.0 - pm.width() as f32 / 2.0,
            Align::Right => pos.0 - pm.width() as f32,
        };
        self.canvas.draw_pixmap(
            x as i32,
            pos.1 as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Word-wraps `text` into `max_width`, returning the y below the last line.
    fn wrapped(&mut self, text: &str, size: f32, x: f32, y: f32, max_width: f32, c: [u8; 4]) -> f32 {
        let Some(cache) = self.text.as_deref() else {
            return y;
        };
        let mut lines = Vec::new();
        let mut line = String::new();
        for word in text.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_owned()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && cache.measure(&candidate, size) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_owned()));
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }

        let line_height = size * 1.45;
        let mut cy = y;
        for l in &lines {
            self.label(l, size, (x, cy), Align::Left, c);
            cy += line_height;
        }
        cy
    }
}

fn draw_welcome(p: &mut Painter<'_>, w: f32, h: f32, participant: &str) {
    p.label("Digit Span Test", 48.0, (w / 2.0, h * 0.18), Align::Center, FOREGROUND);
    p.label(
        "A working memory experiment",
        22.0,
        (w / 2.0, h * 0.18 + 68.0),
        Align::Center,
        MUTED,
    );
    p.label(
        "Please enter your participant ID",
        26.0,
        (w / 2.0, h * 0.4),
        Align::Center,
        FOREGROUND,
    );

    let (bw, bh) = ((w * 0.6).min(480.0), 64.0);
    let (bx, by) = (w / 2.0 - bw / 2.0, h * 0.48);
    p.stroke_rect(bx, by, bw, bh, 2.0, MUTED);
    if p.has_text() {
        p.live_label(participant, 30.0, (w / 2.0, by + 14.0), Align::Center, FOREGROUND);
    } else {
        // One block per typed character.
        let count = participant.chars().count() as f32;
        let step = 22.0;
        let start = w / 2.0 - count * step / 2.0;
        for i in 0..participant.chars().count() {
            p.fill_rect(start + i as f32 * step + 4.0, by + 24.0, 14.0, 16.0, FOREGROUND);
        }
    }

    p.label(
        "Your ID is stored locally for the duration of this experiment.",
        16.0,
        (w / 2.0, by + bh + 16.0),
        Align::Center,
        MUTED,
    );
    p.label("Press Enter to begin", 22.0, (w / 2.0, h * 0.72), Align::Center, FOREGROUND);
}

fn draw_instructions(
    p: &mut Painter<'_>,
    w: f32,
    h: f32,
    step: usize,
    total: usize,
    title: &str,
    body: &str,
) {
    p.label(title, 40.0, (w / 2.0, h * 0.18), Align::Center, FOREGROUND);
    p.wrapped(body, 24.0, w * 0.2, h * 0.32, w * 0.6, FOREGROUND);

    // Page markers.
    let size = 12.0;
    let gap = 10.0;
    let start = w / 2.0 - (total as f32 * (size + gap) - gap) / 2.0;
    for i in 0..total {
        let c = if i <= step { ACCENT } else { TRACK };
        p.fill_rect(start + i as f32 * (size + gap), h * 0.78, size, size, c);
    }
    p.label(
        "Press Enter to continue",
        18.0,
        (w / 2.0, h * 0.78 + 28.0),
        Align::Center,
        MUTED,
    );
}

fn draw_trial(p: &mut Painter<'_>, w: f32, h: f32, view: &TrialView<'_>) {
    // Header and progress bar.
    let (bx, bw) = (w * 0.15, w * 0.7);
    p.label(view.condition.label(), 18.0, (bx, 24.0), Align::Left, FOREGROUND);
    p.label(
        &format!(
            "Length: {} | Trial: {}/{}",
            view.length, view.trial_number, view.trials_per_length
        ),
        18.0,
        (bx + bw, 24.0),
        Align::Right,
        MUTED,
    );
    p.fill_rect(bx, 56.0, bw, 8.0, TRACK);
    p.fill_rect(bx, 56.0, bw * view.progress.clamp(0.0, 1.0), 8.0, ACCENT);

    let backward = view.condition == Condition::Backward;
    match view.phase {
        TrialPhase::Transition if view.condition_intro => {
            let title = if backward {
                "Backward Digit Span Test"
            } else {
                "Forward Digit Span Test"
            };
            p.label(title, 40.0, (w / 2.0, h * 0.24), Align::Center, FOREGROUND);
            let order = if backward {
                "Your task is to type them back in REVERSE order."
            } else {
                "Your task is to type them back in the SAME order."
            };
            let mut y = h * 0.38;
            for line in [
                "You will see a series of digits displayed one at a time.",
                order,
                "The sequences start short and gradually get longer.",
            ] {
                p.label(line, 22.0, (w / 2.0, y), Align::Center, FOREGROUND);
                y += 36.0;
            }
            if backward {
                p.label(
                    "Example: if you see 3-7-9, type 9-7-3",
                    20.0,
                    (w / 2.0, y + 12.0),
                    Align::Center,
                    [250, 204, 21, 255],
                );
            }
            p.label("Press Enter to start", 24.0, (w / 2.0, h * 0.75), Align::Center, ACCENT);
        }
        TrialPhase::Transition => {
            let title = if backward {
                "Backward Digit Span"
            } else {
                "Forward Digit Span"
            };
            let hint = if backward {
                "Remember the digits in reverse order."
            } else {
                "Remember the digits in the same order they appear."
            };
            p.label(title, 34.0, (w / 2.0, h * 0.3), Align::Center, FOREGROUND);
            p.label(hint, 22.0, (w / 2.0, h * 0.42), Align::Center, FOREGROUND);
            p.label(
                &format!(
                    "Length: {} digits | Trial {} of {}",
                    view.length, view.trial_number, view.trials_per_length
                ),
                18.0,
                (w / 2.0, h * 0.5),
                Align::Center,
                MUTED,
            );
            p.label("Ready - press Enter", 24.0, (w / 2.0, h * 0.65), Align::Center, ACCENT);
        }
        TrialPhase::Showing => {
            p.label("Watch carefully...", 22.0, (w / 2.0, h * 0.16), Align::Center, MUTED);
            if let Some(digit) = view.digit {
                draw_number_centered(
                    p.canvas,
                    &digit.to_string(),
                    (w / 2.0, h / 2.0),
                    h * 0.3,
                    FOREGROUND,
                );
            }
            if let Some((shown, len)) = view.position {
                p.label(
                    &format!("{shown} / {len}"),
                    18.0,
                    (w / 2.0, h * 0.78),
                    Align::Center,
                    MUTED,
                );
            }
        }
        TrialPhase::Input => {
            let prompt = if backward {
                "Enter the digits in reverse order:"
            } else {
                "Enter the digits in order:"
            };
            p.label(prompt, 26.0, (w / 2.0, h * 0.3), Align::Center, FOREGROUND);

            let (ibw, ibh) = ((w * 0.5).min(560.0), 96.0);
            let (ibx, iby) = (w / 2.0 - ibw / 2.0, h * 0.42);
            p.stroke_rect(ibx, iby, ibw, ibh, 2.0, MUTED);
            // Slot markers under the field, one per expected digit.
            let slot = ibw / view.length.max(1) as f32;
            let typed = view.response.chars().count();
            for i in 0..view.length {
                let c = if i < typed { ACCENT } else { TRACK };
                p.fill_rect(ibx + i as f32 * slot + 6.0, iby + ibh + 8.0, slot - 12.0, 4.0, c);
            }
            draw_number_centered(
                p.canvas,
                view.response,
                (w / 2.0, iby + ibh / 2.0),
                56.0,
                FOREGROUND,
            );
            p.label(
                &format!("Expected {} digits - press Enter to submit", view.length),
                16.0,
                (w / 2.0, iby + ibh + 28.0),
                Align::Center,
                MUTED,
            );
        }
        TrialPhase::Complete => {
            p.label("Test complete", 34.0, (w / 2.0, h * 0.45), Align::Center, FOREGROUND);
        }
    }
}

fn draw_results(
    p: &mut Painter<'_>,
    w: f32,
    h: f32,
    results: &TestResults,
    span_scale: usize,
    key_hints: bool,
) {
    p.label(
        "Results for the Digit Span Experiment",
        32.0,
        (w / 2.0, 24.0),
        Align::Center,
        FOREGROUND,
    );
    p.label(
        &format!("Participant ID: {}", results.participant_id),
        20.0,
        (w / 2.0, 72.0),
        Align::Center,
        FOREGROUND,
    );
    p.label(
        &format!(
            "Completed: {}",
            results.completed_at.format("%B %-d, %Y %H:%M UTC")
        ),
        16.0,
        (w / 2.0, 102.0),
        Align::Center,
        MUTED,
    );

    let top = 140.0;
    let chart_h = h * 0.5;
    let chart_w = w * 0.42;
    let fwd = &results.forward;
    let bwd = &results.backward;

    let digit_scale = fwd.digits_shown.max(bwd.digits_shown).max(1);
    bar_chart(
        p,
        (w * 0.05, top, chart_w, chart_h),
        "Digit Placement Accuracy by Condition",
        &[
            ("Forward", vec![(fwd.digits_shown, MUTED), (fwd.digits_correct, ACCENT)]),
            ("Backward", vec![(bwd.digits_shown, MUTED), (bwd.digits_correct, ACCENT)]),
        ],
        digit_scale,
    );
    bar_chart(
        p,
        (w * 0.53, top, chart_w, chart_h),
        "Maximum Span Achieved by Condition",
        &[
            ("Forward", vec![(fwd.max_span, ACCENT)]),
            ("Backward", vec![(bwd.max_span, SECONDARY)]),
        ],
        span_scale.max(1),
    );

    // Legend for the first chart.
    let ly = top + chart_h + 6.0;
    p.fill_rect(w * 0.05 + 40.0, ly + 4.0, 12.0, 12.0, MUTED);
    p.label("Digits shown", 14.0, (w * 0.05 + 58.0, ly), Align::Left, MUTED);
    p.fill_rect(w * 0.05 + 170.0, ly + 4.0, 12.0, 12.0, ACCENT);
    p.label("Correctly placed", 14.0, (w * 0.05 + 188.0, ly), Align::Left, MUTED);

    let mut y = top + chart_h + 40.0;
    for condition in [Condition::Forward, Condition::Backward] {
        p.label(
            &summary_line(condition, results.summary(condition)),
            18.0,
            (w * 0.08, y),
            Align::Left,
            FOREGROUND,
        );
        y += 30.0;
    }

    if key_hints {
        p.label(
            "Enter: finish    S: save image    R: restart",
            16.0,
            (w / 2.0, h - 40.0),
            Align::Center,
            MUTED,
        );
    }
}

pub fn summary_line(condition: Condition, s: &ConditionSummary) -> String {
    format!(
        "{}: {} trials, {} fully correct ({:.1}%), digits {}/{} ({:.1}%), max span {}",
        condition.label(),
        s.total_responses,
        s.total_correct,
        s.trial_accuracy(),
        s.digits_correct,
        s.digits_shown,
        s.digit_accuracy(),
        s.max_span
    )
}

/// Grouped bar chart. Values and axis ticks use segment numerals.
fn bar_chart(
    p: &mut Painter<'_>,
    area: (f32, f32, f32, f32),
    title: &str,
    groups: &[(&str, Vec<(usize, [u8; 4])>)],
    scale_max: usize,
) {
    let (x, y, w, h) = area;
    p.label(title, 18.0, (x + w / 2.0, y), Align::Center, FOREGROUND);

    let (px, py) = (x + 48.0, y + 40.0);
    let (pw, ph) = (w - 60.0, h - 80.0);
    if pw <= 0.0 || ph <= 0.0 || groups.is_empty() {
        return;
    }

    for i in 0..=4 {
        let gy = py + ph - ph * i as f32 / 4.0;
        p.line((px, gy), (px + pw, gy), 1.0, TRACK);
        let value = scale_max * i / 4;
        draw_number_centered(p.canvas, &value.to_string(), (px - 22.0, gy), 12.0, MUTED);
    }
    p.line((px, py), (px, py + ph), 2.0, MUTED);
    p.line((px, py + ph), (px + pw, py + ph), 2.0, MUTED);

    let gw = pw / groups.len() as f32;
    for (gi, (label, bars)) in groups.iter().enumerate() {
        let gx = px + gi as f32 * gw;
        let bar_w = gw * 0.6 / bars.len().max(1) as f32;
        let mut bx = gx + gw * 0.2;
        for &(value, c) in bars.iter() {
            let frac = (value as f32 / scale_max as f32).clamp(0.0, 1.0);
            let bh = ph * frac;
            p.fill_rect(bx + 2.0, py + ph - bh, bar_w - 4.0, bh, c);
            draw_number_centered(
                p.canvas,
                &value.to_string(),
                (bx + bar_w / 2.0, py + ph - bh - 14.0),
                14.0,
                FOREGROUND,
            );
            bx += bar_w;
        }
        p.label(label, 16.0, (gx + gw / 2.0, py + ph + 10.0), Align::Center, FOREGROUND);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dspan_core::{Sequence, Trial};

    fn lit(r: &SkiaRenderer) -> usize {
        r.canvas()
            .pixels()
            .iter()
            .filter(|px| px.red() > 0 || px.green() > 0 || px.blue() > 0)
            .count()
    }

    fn view(phase: TrialPhase, digit: Option<u8>, response: &str) -> TrialView<'_> {
        TrialView {
            condition: Condition::Forward,
            phase,
            length: 4,
            trial_number: 1,
            trials_per_length: 2,
            digit,
            position: digit.map(|_| (1, 4)),
            response,
            progress: 0.25,
            condition_intro: false,
        }
    }

    #[test]
    fn showing_draws_the_digit_without_a_font() {
        let mut r = SkiaRenderer::new(320, 240, None).unwrap();
        r.render_scene(&Scene::Trial(view(TrialPhase::Showing, None, "")));
        let empty = lit(&r);
        r.render_scene(&Scene::Trial(view(TrialPhase::Showing, Some(8), "")));
        assert!(lit(&r) > empty);
    }

    #[test]
    fn typed_response_is_visible() {
        let mut r = SkiaRenderer::new(320, 240, None).unwrap();
        r.render_scene(&Scene::Trial(view(TrialPhase::Input, None, "")));
        let empty = lit(&r);
        r.render_scene(&Scene::Trial(view(TrialPhase::Input, None, "3792")));
        assert!(lit(&r) > empty);
    }

    #[test]
    fn frame_copy_checks_buffer_size() {
        let mut r = SkiaRenderer::new(64, 48, None).unwrap();
        let mut timer = HighPrecisionTimer::new();
        let mut frame = vec![0u8; 64 * 48 * 4];
        r.render_frame(&Scene::ThankYou, &mut frame, &mut timer)
            .unwrap();
        assert_eq!(timer.frame_count(), 1);
        assert!(frame.chunks(4).all(|px| px == BACKGROUND));

        let mut short = vec![0u8; 10];
        assert!(r.render_frame(&Scene::ThankYou, &mut short, &mut timer).is_err());
    }

    #[test]
    fn results_export_writes_png() {
        let trial = Trial {
            sequence: Sequence::new(vec![3, 7]).unwrap(),
            response: "37".into(),
            correct_digits: 2,
            fully_correct: true,
            length: 2,
            trial_number: 1,
            condition: Condition::Forward,
            completed_at: Utc::now(),
        };
        let results = TestResults::compile("u1", vec![trial], vec![], Utc::now());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.png");

        let mut r = SkiaRenderer::new(320, 240, None).unwrap();
        r.export_results_png(&results, 10, &path).unwrap();
        let written = Pixmap::load_png(&path).unwrap();
        assert_eq!((written.width(), written.height()), EXPORT_SIZE);
    }

    #[test]
    fn summary_line_reports_percentages() {
        let s = ConditionSummary {
            total_responses: 4,
            total_correct: 1,
            max_span: 3,
            digits_shown: 10,
            digits_correct: 7,
        };
        let line = summary_line(Condition::Backward, &s);
        assert!(line.starts_with("Backward Span: 4 trials"));
        assert!(line.contains("(25.0%)"));
        assert!(line.contains("7/10 (70.0%)"));
        assert!(line.ends_with("max span 3"));
    }

    fn system_font() -> Option<FontVec> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/Library/Fonts/DejaVuSans.ttf",
        ]
        .iter()
        .find_map(|p| crate::text::load_font(Path::new(p)).ok())
    }

    #[test]
    fn typing_an_id_does_not_grow_the_label_cache() {
        let Some(font) = system_font() else {
            eprintln!("no system font, skipping");
            return;
        };
        let mut r = SkiaRenderer::new(640, 480, Some(font)).unwrap();
        r.render_scene(&Scene::Welcome { participant: "a" });
        let cached = r.cached_labels();
        assert!(cached > 0);

        let mut id = String::from("a");
        for c in "bcdefgh".chars() {
            id.push(c);
            r.render_scene(&Scene::Welcome { participant: &id });
        }
        assert_eq!(r.cached_labels(), cached);
    }

    #[test]
    fn zero_sized_canvas_is_an_error() {
        assert!(SkiaRenderer::new(0, 10, None).is_err());
    }
}
