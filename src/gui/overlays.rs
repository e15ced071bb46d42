use crate::session::overlay::Position;
use crate::session::Session;
use crate::typeset::TypesetCache;
use eframe::egui::{self, Color32, Id, Pos2, RichText};
use std::collections::HashSet;

/// Draws overlay entries as movable areas over the canvas.
///
/// egui remembers each area's position by id, which plays the role of the
/// per-element drag offset; the session only hears about a drag once it
/// ends.
#[derive(Default)]
pub struct OverlayLayer {
    typeset: TypesetCache,
    dragging: HashSet<usize>,
}

impl OverlayLayer {
    pub fn forget_drags(&mut self) {
        self.dragging.clear();
    }

    pub fn ui(&mut self, ctx: &egui::Context, session: &mut Session, origin: Pos2) {
        let overlays = session.overlays();
        self.typeset.refresh(
            overlays.revision(),
            overlays.entries().iter().map(|e| e.latex.as_str()),
        );

        let epoch = session.epoch();
        let mut finished = Vec::new();
        for (index, entry) in overlays.entries().iter().enumerate() {
            let Some(text) = self.typeset.get(index) else {
                continue;
            };
            let area = egui::Area::new(Id::new(("overlay", epoch, index)))
                .order(egui::Order::Foreground)
                .movable(true)
                .default_pos(origin + egui::vec2(entry.anchor.x, entry.anchor.y))
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .inner_margin(8.0)
                        .rounding(4.0)
                        .shadow(ui.style().visuals.popup_shadow)
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new(&text.text)
                                    .size(text.font_size())
                                    .color(Color32::WHITE),
                            );
                        });
                });

            if area.response.dragged() {
                self.dragging.insert(index);
            } else if self.dragging.remove(&index) {
                let pos = area.response.rect.min - origin;
                finished.push((index, Position::new(pos.x, pos.y)));
            }
        }

        for (index, position) in finished {
            tracing::debug!(index, x = position.x, y = position.y, "overlay moved");
            session.end_overlay_drag(index, position);
        }
    }
}
