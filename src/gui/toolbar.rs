use super::to_color32;
use crate::draw::model::Color;
use eframe::egui::{self, Color32, Stroke, Vec2};

const SWATCH_SIZE: f32 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Reset,
    SelectColor(Color),
    Calculate,
}

pub struct Toolbar {
    palette: Vec<Color>,
    selected: Color,
}

impl Toolbar {
    pub fn new(palette: Vec<Color>, selected: Color) -> Self {
        Self { palette, selected }
    }

    pub fn selected(&self) -> Color {
        self.selected
    }

    /// Reset on the left, swatches in the middle, Calculate on the right.
    pub fn ui(&mut self, ui: &mut egui::Ui, busy: bool) -> Option<ToolbarAction> {
        let mut action = None;
        ui.columns(3, |cols| {
            if cols[0].button("Reset").clicked() {
                action = Some(ToolbarAction::Reset);
            }

            cols[1].horizontal_wrapped(|ui| {
                for color in &self.palette {
                    let stroke = if *color == self.selected {
                        Stroke::new(2.0, Color32::LIGHT_BLUE)
                    } else {
                        Stroke::new(1.0, Color32::DARK_GRAY)
                    };
                    let swatch = egui::Button::new("")
                        .fill(to_color32(*color))
                        .stroke(stroke)
                        .min_size(Vec2::splat(SWATCH_SIZE));
                    if ui.add(swatch).clicked() {
                        self.selected = *color;
                        action = Some(ToolbarAction::SelectColor(*color));
                    }
                }
            });

            cols[2].horizontal(|ui| {
                if ui.button("Calculate").clicked() {
                    action = Some(ToolbarAction::Calculate);
                }
                if busy {
                    ui.add(egui::Spinner::new());
                    ui.label("Calculating...");
                }
            });
        });
        action
    }
}
