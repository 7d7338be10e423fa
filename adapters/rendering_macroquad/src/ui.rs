//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use glam::Vec2;
use iso_garden_core::PlantId;
use iso_garden_rendering::SidebarEntry;
use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2 as MacroquadVec2},
    ui::{hash, Skin, Ui},
};

const PROMPT_SIZE: Vec2 = Vec2::new(180.0, 92.0);
const PROMPT_GAP: f32 = 12.0;
const CLEAR_PROMPT_SIZE: Vec2 = Vec2::new(320.0, 104.0);

/// Width of the inventory sidebar docked to the left edge.
pub(crate) const SIDEBAR_WIDTH: f32 = 220.0;

const PANEL_BACKGROUND: Color =
    Color::new(12.0 / 255.0, 28.0 / 255.0, 40.0 / 255.0, 235.0 / 255.0);
const MUTED_TEXT: Color = Color::new(1.0, 1.0, 1.0, 0.4);

/// Top-left corner of a removal prompt raised above `anchor`.
pub(crate) fn prompt_origin(anchor: Vec2) -> Vec2 {
    anchor - Vec2::new(PROMPT_SIZE.x / 2.0, PROMPT_SIZE.y + PROMPT_GAP)
}

/// Reports whether `point` falls on the prompt anchored at `anchor`.
pub(crate) fn prompt_contains(anchor: Vec2, point: Vec2) -> bool {
    rect_contains(prompt_origin(anchor), PROMPT_SIZE, point)
}

/// Top-left corner of the clear confirmation, centred on a surface of `surface` pixels.
pub(crate) fn clear_prompt_origin(surface: Vec2) -> Vec2 {
    (surface - CLEAR_PROMPT_SIZE) / 2.0
}

/// Reports whether `point` falls on the clear confirmation.
pub(crate) fn clear_prompt_contains(surface: Vec2, point: Vec2) -> bool {
    rect_contains(clear_prompt_origin(surface), CLEAR_PROMPT_SIZE, point)
}

/// Reports whether `point` falls on the inventory sidebar.
pub(crate) fn sidebar_contains(point: Vec2) -> bool {
    point.x >= 0.0 && point.x <= SIDEBAR_WIDTH
}

fn rect_contains(origin: Vec2, size: Vec2, point: Vec2) -> bool {
    let end = origin + size;
    point.x >= origin.x && point.x <= end.x && point.y >= origin.y && point.y <= end.y
}

/// Buttons pressed on a confirmation prompt during this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PromptUiResult {
    /// The confirming button was pressed.
    pub(crate) confirm: bool,
    /// The keep button was pressed.
    pub(crate) dismiss: bool,
}

/// Buttons pressed on the inventory sidebar during this frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SidebarUiResult {
    /// Plant whose entry was clicked.
    pub(crate) picked: Option<PlantId>,
    /// The clear button was pressed.
    pub(crate) clear: bool,
    /// The save button was pressed.
    pub(crate) save: bool,
}

fn garden_skin(ui: &mut Ui) -> Skin {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(PANEL_BACKGROUND)
        .color_hovered(PANEL_BACKGROUND)
        .color_clicked(PANEL_BACKGROUND)
        .color_selected(PANEL_BACKGROUND)
        .color_selected_hovered(PANEL_BACKGROUND)
        .color_inactive(PANEL_BACKGROUND)
        .text_color(WHITE)
        .margin(RectOffset::new(12.0, 12.0, 10.0, 10.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 2.0, 6.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(46, 140, 69, 255))
        .color_hovered(Color::from_rgba(93, 216, 122, 255))
        .color_clicked(Color::from_rgba(30, 96, 48, 255))
        .margin(RectOffset::new(8.0, 8.0, 4.0, 4.0))
        .build();
    skin.button_style = button_style;
    skin
}

fn entry_label(entry: &SidebarEntry) -> String {
    let marker = if entry.selected { "> " } else { "" };
    match entry.quantity {
        Some(quantity) => format!("{marker}{}  x{quantity}", entry.name),
        None => format!("{marker}{}", entry.name),
    }
}

/// Draws the inventory list docked to the left edge of a surface `height` pixels tall.
///
/// Entries out of stock are shown as muted labels that cannot be clicked.
pub(crate) fn draw_inventory_panel(
    ui: &mut Ui,
    entries: &[SidebarEntry],
    height: f32,
) -> SidebarUiResult {
    let skin = garden_skin(ui);
    let mut muted = skin.clone();
    muted.label_style = ui
        .style_builder()
        .text_color(MUTED_TEXT)
        .text_color_hovered(MUTED_TEXT)
        .text_color_clicked(MUTED_TEXT)
        .margin(RectOffset::new(8.0, 8.0, 4.0, 4.0))
        .build();
    ui.push_skin(&skin);

    let mut result = SidebarUiResult::default();
    let _ = ui.window(
        hash!("inventory_panel"),
        MacroquadVec2::new(0.0, 0.0),
        MacroquadVec2::new(SIDEBAR_WIDTH, height),
        |ui| {
            ui.label(None, "Plants");
            ui.separator();
            for entry in entries {
                let label = entry_label(entry);
                if entry.enabled {
                    if ui.button(None, label.as_str()) {
                        result.picked = Some(entry.plant.clone());
                    }
                } else {
                    ui.push_skin(&muted);
                    ui.label(None, &label);
                    ui.pop_skin();
                }
            }
            ui.separator();
            result.save = ui.button(None, "Save garden");
            ui.same_line(0.0);
            result.clear = ui.button(None, "Clear all");
        },
    );

    ui.pop_skin();
    result
}

/// Draws the clear confirmation in the middle of a surface of `surface` pixels.
pub(crate) fn draw_clear_prompt(ui: &mut Ui, surface: Vec2) -> PromptUiResult {
    let skin = garden_skin(ui);
    ui.push_skin(&skin);

    let origin = clear_prompt_origin(surface);
    let mut result = PromptUiResult::default();
    let _ = ui.window(
        hash!("clear_prompt"),
        MacroquadVec2::new(origin.x, origin.y),
        MacroquadVec2::new(CLEAR_PROMPT_SIZE.x, CLEAR_PROMPT_SIZE.y),
        |ui| {
            ui.label(None, "Remove all tiles?");
            ui.label(None, "They will be returned to your inventory.");
            result.confirm = ui.button(None, "Clear");
            ui.same_line(0.0);
            result.dismiss = ui.button(None, "Keep");
        },
    );

    ui.pop_skin();
    result
}

/// Draws the removal confirmation above the anchored cell.
pub(crate) fn draw_removal_prompt(ui: &mut Ui, anchor: Vec2) -> PromptUiResult {
    let skin = garden_skin(ui);
    ui.push_skin(&skin);

    let origin = prompt_origin(anchor);
    let mut result = PromptUiResult::default();
    let _ = ui.window(
        hash!("removal_prompt"),
        MacroquadVec2::new(origin.x, origin.y),
        MacroquadVec2::new(PROMPT_SIZE.x, PROMPT_SIZE.y),
        |ui| {
            ui.label(None, "Remove this plant?");
            result.confirm = ui.button(None, "Remove");
            ui.same_line(0.0);
            result.dismiss = ui.button(None, "Keep");
        },
    );

    ui.pop_skin();
    result
}
