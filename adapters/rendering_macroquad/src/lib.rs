#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the garden editor.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Each frame the adapter samples input, hands it to the caller's update
//! closure together with the [`RenderLoop`], and paints whatever plan the loop
//! holds afterwards. Gradients are painted as narrow solid bands.

mod input;
mod sprites;
mod ui;

use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec2;
use iso_garden_core::InputEvent;
use iso_garden_rendering::{
    Color, Diamond, DrawOp, FrameInput, FramePlan, Presentation, RenderLoop, RenderingBackend,
    GROUND_LEFT, GROUND_RIGHT, GROUND_TOP_DARK, GROUND_TOP_LIGHT,
};
use macroquad::math::Vec2 as MacroquadVec2;
use tracing::{error, info};

pub use self::input::{InputTranslator, RawInput};
use self::{
    sprites::SpriteAtlas,
    ui::{
        draw_clear_prompt, draw_inventory_panel, draw_removal_prompt, PromptUiResult,
        SidebarUiResult, SIDEBAR_WIDTH,
    },
};

const BACKGROUND_BANDS: u32 = 48;
const GROUND_BANDS: u32 = 8;
const STATUS_FONT_SIZE: f32 = 22.0;

/// Holds events raised by UI buttons so they reach the session on the next frame.
#[doc(hidden)]
#[derive(Clone, Debug, Default)]
pub struct UiEventLatch {
    pending: Vec<InputEvent>,
}

impl UiEventLatch {
    /// Records an event raised by a button press.
    pub fn register(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    /// Returns every recorded event in press order and clears the latch.
    pub fn take(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    load_sprites: bool,
    window_size: (i32, i32),
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            load_sprites: true,
            window_size: (1280, 720),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the backend should attempt to load sprite assets.
    #[must_use]
    pub fn with_sprite_loading(mut self, enabled: bool) -> Self {
        self.load_sprites = enabled;
        self
    }

    /// Sets the initial window size in pixels.
    #[must_use]
    pub fn with_window_size(mut self, width: i32, height: i32) -> Self {
        self.window_size = (width, height);
        self
    }
}

/// One frame as seen by [`FrameStats`].
#[derive(Clone, Copy, Debug, Default)]
struct FrameSample {
    /// Wall time of the frame.
    frame: Duration,
    /// Time spent updating and painting.
    busy: Duration,
    /// Running count of frames the render loop replanned.
    planned_total: u64,
    /// Running count of frames the render loop painted from its previous plan.
    reused_total: u64,
}

/// Frame rate and plan reuse over the last reporting second.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameReport {
    fps: f32,
    busy: Duration,
    planned: u64,
    reused: u64,
}

#[derive(Debug, Default)]
struct FrameStats {
    elapsed: Duration,
    frames: u32,
    busy: Duration,
    planned_reported: u64,
    reused_reported: u64,
}

impl FrameStats {
    /// Adds a frame and returns a report once a second has accumulated.
    fn record(&mut self, sample: FrameSample) -> Option<FrameReport> {
        self.elapsed += sample.frame;
        self.frames = self.frames.saturating_add(1);
        self.busy += sample.busy;
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let report = FrameReport {
            fps: self.frames as f32 / self.elapsed.as_secs_f32(),
            busy: self.busy / self.frames,
            planned: sample.planned_total.saturating_sub(self.planned_reported),
            reused: sample.reused_total.saturating_sub(self.reused_reported),
        };
        *self = Self {
            planned_reported: sample.planned_total,
            reused_reported: sample.reused_total,
            ..Self::default()
        };
        Some(report)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut RenderLoop) -> Result<()> + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            load_sprites,
            window_size,
        } = self;

        let Presentation {
            window_title,
            sprites,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: window_size.0,
            window_height: window_size.1,
            window_resizable: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            macroquad::input::prevent_quit();
            macroquad::input::simulate_mouse_with_touch(false);

            let atlas = match sprites {
                Some(manifest) if load_sprites => {
                    let atlas = SpriteAtlas::load(&manifest);
                    info!(textures = atlas.len(), "sprites loaded");
                    Some(atlas)
                }
                _ => None,
            };

            let mut render_loop = RenderLoop::new();
            let mut translator = InputTranslator::new();
            let mut ui_events = UiEventLatch::default();
            let mut stats = FrameStats::default();

            loop {
                let closing = macroquad::input::is_quit_requested();
                let frame = Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));

                let raw = RawInput::poll();
                let mut events = translator.translate(&raw, render_loop.plan().overlay());
                events.extend(ui_events.take());

                let busy_start = Instant::now();
                let input = FrameInput {
                    elapsed: frame,
                    events,
                    closing,
                };
                if let Err(error) = update(input, &mut render_loop) {
                    error!(error = %format!("{error:#}"), "frame update failed");
                }
                if closing {
                    break;
                }

                paint(render_loop.plan(), atlas.as_ref());
                draw_widgets(render_loop.plan(), &mut ui_events);

                let report = stats.record(FrameSample {
                    frame,
                    busy: busy_start.elapsed(),
                    planned_total: render_loop.planned_frames(),
                    reused_total: render_loop.reused_frames(),
                });
                if let (true, Some(report)) = (show_fps, report) {
                    info!(
                        fps = %format!("{:.2}", report.fps),
                        busy_ms = report.busy.as_secs_f64() * 1_000.0,
                        planned = report.planned,
                        reused = report.reused,
                        "frame timing"
                    );
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Draws the plan's widgets and latches the events their buttons raise.
fn draw_widgets(plan: &FramePlan, ui_events: &mut UiEventLatch) {
    let overlay = plan.overlay();
    let surface = Vec2::new(
        macroquad::window::screen_width(),
        macroquad::window::screen_height(),
    );
    let mut root = macroquad::ui::root_ui();

    if let Some(entries) = &overlay.sidebar {
        let SidebarUiResult {
            picked,
            clear,
            save,
        } = draw_inventory_panel(&mut root, entries, surface.y);
        if let Some(plant) = picked {
            ui_events.register(InputEvent::PickPlant { plant });
        }
        if save {
            ui_events.register(InputEvent::RequestSave);
        }
        if clear {
            ui_events.register(InputEvent::RequestClear);
        }
    }

    if let Some(anchor) = overlay.removal_prompt {
        let PromptUiResult { confirm, dismiss } = draw_removal_prompt(&mut root, anchor);
        if confirm {
            ui_events.register(InputEvent::ConfirmRemoval);
        } else if dismiss {
            ui_events.register(InputEvent::DismissRemoval);
        }
    }

    if overlay.clear_prompt {
        let PromptUiResult { confirm, dismiss } = draw_clear_prompt(&mut root, surface);
        if confirm {
            ui_events.register(InputEvent::ConfirmClear);
        } else if dismiss {
            ui_events.register(InputEvent::DismissClear);
        }
    }
}

fn paint(plan: &FramePlan, atlas: Option<&SpriteAtlas>) {
    for op in plan.ops() {
        match op {
            DrawOp::Background { top, bottom } => draw_background(*top, *bottom),
            DrawOp::GridLine { diamond, color } => draw_diamond_outline(diamond, *color),
            DrawOp::GroundBlock { diamond, depth } => draw_ground_block(diamond, *depth),
            DrawOp::Plant(plant) => {
                let drawn = atlas.is_some_and(|atlas| atlas.draw_plant(plant));
                if let (false, Some(fill)) = (drawn, plant.fallback) {
                    fill_diamond(&plant.diamond, fill);
                }
            }
            DrawOp::Highlight { diamond, color } => fill_diamond(diamond, *color),
        }
    }
    if let Some(status) = &plan.overlay().status {
        let left = if plan.overlay().sidebar.is_some() {
            SIDEBAR_WIDTH
        } else {
            0.0
        };
        macroquad::text::draw_text(
            status,
            left + 16.0,
            16.0 + STATUS_FONT_SIZE,
            STATUS_FONT_SIZE,
            to_macroquad_color(Color::new(1.0, 1.0, 1.0, 0.85)),
        );
    }
}

fn draw_background(top: Color, bottom: Color) {
    let width = macroquad::window::screen_width();
    let height = macroquad::window::screen_height();
    let band = height / BACKGROUND_BANDS as f32;
    for index in 0..BACKGROUND_BANDS {
        let amount = (index as f32 + 0.5) / BACKGROUND_BANDS as f32;
        macroquad::shapes::draw_rectangle(
            0.0,
            index as f32 * band,
            width,
            band + 1.0,
            to_macroquad_color(top.mix(bottom, amount)),
        );
    }
}

fn draw_diamond_outline(diamond: &Diamond, color: Color) {
    let color = to_macroquad_color(color);
    let corners = diamond.corners();
    for (index, from) in corners.iter().enumerate() {
        let to = corners[(index + 1) % corners.len()];
        macroquad::shapes::draw_line(from.x, from.y, to.x, to.y, 1.0, color);
    }
}

fn fill_quad(points: [Vec2; 4], color: Color) {
    let color = to_macroquad_color(color);
    let [a, b, c, d] = points.map(|point| MacroquadVec2::new(point.x, point.y));
    macroquad::shapes::draw_triangle(a, b, c, color);
    macroquad::shapes::draw_triangle(a, c, d, color);
}

fn fill_diamond(diamond: &Diamond, color: Color) {
    fill_quad(diamond.corners(), color);
}

/// Earth block: gradient top face over two shaded side faces.
fn draw_ground_block(diamond: &Diamond, depth: f32) {
    let [_, right, bottom, left] = diamond.corners();
    let drop = Vec2::new(0.0, depth);
    fill_quad([bottom, right, right + drop, bottom + drop], GROUND_RIGHT);
    fill_quad([bottom, left, left + drop, bottom + drop], GROUND_LEFT);

    let half_height = diamond.height / 2.0;
    let half_width_at = |offset: f32| {
        diamond.width / 2.0 * (1.0 - (offset - half_height).abs() / half_height)
    };
    let band = diamond.height / GROUND_BANDS as f32;
    for index in 0..GROUND_BANDS {
        let from = index as f32 * band;
        let to = from + band;
        let (from_half, to_half) = (half_width_at(from), half_width_at(to));
        let top = diamond.top;
        fill_quad(
            [
                top + Vec2::new(-from_half, from),
                top + Vec2::new(from_half, from),
                top + Vec2::new(to_half, to),
                top + Vec2::new(-to_half, to),
            ],
            GROUND_TOP_LIGHT.mix(GROUND_TOP_DARK, (from + to) / 2.0 / diamond.height),
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_convert_channel_for_channel() {
        let converted = to_macroquad_color(Color::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(
            (converted.r, converted.g, converted.b, converted.a),
            (0.1, 0.2, 0.3, 0.4)
        );
    }

    #[test]
    fn frame_stats_report_once_a_second() {
        let mut stats = FrameStats::default();
        let sample = |planned_total, reused_total| FrameSample {
            frame: Duration::from_millis(250),
            busy: Duration::from_millis(6),
            planned_total,
            reused_total,
        };
        assert!(stats.record(sample(1, 0)).is_none());
        assert!(stats.record(sample(1, 1)).is_none());
        assert!(stats.record(sample(2, 1)).is_none());

        let report = stats.record(sample(2, 2)).expect("one second elapsed");
        assert!((report.fps - 4.0).abs() <= 1e-3);
        assert_eq!(report.busy, Duration::from_millis(6));
        assert_eq!((report.planned, report.reused), (2, 2));
        assert!(stats.record(sample(2, 3)).is_none());
    }

    #[test]
    fn frame_stats_count_plans_since_the_previous_report() {
        let mut stats = FrameStats::default();
        let second = |planned_total, reused_total| FrameSample {
            frame: Duration::from_secs(1),
            busy: Duration::ZERO,
            planned_total,
            reused_total,
        };
        let _ = stats.record(second(10, 50));
        let report = stats.record(second(11, 109)).expect("report");
        assert_eq!((report.planned, report.reused), (1, 59));
    }

    #[test]
    fn ui_events_are_handed_over_once_in_press_order() {
        let mut latch = UiEventLatch::default();
        latch.register(InputEvent::RequestClear);
        latch.register(InputEvent::ConfirmClear);
        assert_eq!(
            latch.take(),
            vec![InputEvent::RequestClear, InputEvent::ConfirmClear]
        );
        assert!(latch.take().is_empty());
    }
}
