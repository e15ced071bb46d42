mod overlays;
mod toolbar;

pub use overlays::OverlayLayer;
pub use toolbar::{Toolbar, ToolbarAction};

use crate::calc::client::Recognizer;
use crate::calc::worker::RecognitionWorker;
use crate::draw::canvas::PixelCanvas;
use crate::draw::model::Color;
use crate::session::{Notice, Session};
use crate::settings::Settings;
use crate::toast_log::append_toast_log;
use eframe::egui::{self, Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::sync::Arc;
use std::time::Instant;

pub const CALCULATION_DONE: &str = "Calculation Done";
pub const CALCULATION_FAILED: &str = "Error Occurred";

fn push_toast(toasts: &mut Toasts, toast: Toast) {
    append_toast_log(toast.text.text());
    toasts.add(toast);
}

fn full_image(canvas: &PixelCanvas) -> egui::ColorImage {
    let (width, height) = canvas.size();
    egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], canvas.rgba_pixels())
}

pub fn to_color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// The drawing page: toolbar on top, canvas filling the rest, results
/// floating above the canvas.
pub struct CalcApp {
    settings: Settings,
    toolbar: Toolbar,
    session: Option<Session>,
    worker: RecognitionWorker,
    toasts: Toasts,
    texture: Option<TextureHandle>,
    uploaded_revision: Option<u64>,
    overlays: OverlayLayer,
}

impl CalcApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        recognizer: Arc<dyn Recognizer>,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let worker = RecognitionWorker::new(recognizer).with_wake_hook(move || ctx.request_repaint());
        let toolbar = Toolbar::new(settings.palette(), settings.pen_color());
        Self {
            settings,
            toolbar,
            session: None,
            worker,
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            texture: None,
            uploaded_revision: None,
            overlays: OverlayLayer::default(),
        }
    }

    fn notify(&mut self, kind: ToastKind, text: &str) {
        if !self.settings.enable_toasts {
            append_toast_log(text);
            return;
        }
        push_toast(
            &mut self.toasts,
            Toast {
                text: text.into(),
                kind,
                options: ToastOptions::default()
                    .duration_in_seconds(self.settings.toast_duration as f64),
            },
        );
    }

    fn calculate(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.begin_calculation() {
            Ok((ticket, request)) => self.worker.submit(ticket, request),
            Err(e) => {
                tracing::error!("calculation request failed: {e:#}");
                self.notify(ToastKind::Error, CALCULATION_FAILED);
            }
        }
    }

    fn reset(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
        self.overlays.forget_drags();
    }

    fn apply_completions(&mut self, now: Instant) {
        for completion in self.worker.drain() {
            let notice = match self.session.as_mut() {
                Some(session) => {
                    session.complete_calculation(completion.ticket, completion.outcome, now)
                }
                None => None,
            };
            match notice {
                Some(Notice::Done { .. }) => self.notify(ToastKind::Success, CALCULATION_DONE),
                Some(Notice::Failed { .. }) => self.notify(ToastKind::Error, CALCULATION_FAILED),
                None => {}
            }
        }
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) -> Rect {
        let rect = ui.available_rect_before_wrap();
        let settings = &self.settings;
        let session = self.session.get_or_insert_with(|| {
            let (width, height) = settings.canvas_size.unwrap_or((
                rect.width().max(1.0).round() as u32,
                rect.height().max(1.0).round() as u32,
            ));
            tracing::info!(width, height, "canvas size fixed");
            Session::new(width, height, settings.session_options())
        });
        let (width, height) = session.canvas().size();
        let canvas_rect = Rect::from_min_size(rect.min, Vec2::new(width as f32, height as f32));

        let response = ui.allocate_rect(canvas_rect, Sense::drag());
        let to_canvas = |pos: Pos2| {
            (
                (pos.x - canvas_rect.min.x).floor() as i32,
                (pos.y - canvas_rect.min.y).floor() as i32,
            )
        };

        let revision_before = session.canvas().revision();
        let mut damage = None;
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                session.pointer_down(to_canvas(pos));
            }
        }
        if session.is_drawing() {
            let (down, hover) = ui.input(|i| (i.pointer.primary_down(), i.pointer.hover_pos()));
            match hover {
                _ if !down => session.pointer_up(),
                Some(pos) if canvas_rect.contains(pos) => {
                    damage = session.pointer_move(to_canvas(pos));
                }
                _ => session.pointer_leave(),
            }
        }

        let canvas = session.canvas();
        if self.uploaded_revision != Some(canvas.revision()) {
            // Only the stroke changed since the last upload: send its area.
            let damage = damage.filter(|_| self.uploaded_revision == Some(revision_before));
            match (self.texture.as_mut(), damage) {
                (Some(texture), Some(dirty)) => {
                    let patch = egui::ColorImage::from_rgba_unmultiplied(
                        [dirty.width as usize, dirty.height as usize],
                        &canvas.region_rgba(dirty),
                    );
                    texture.set_partial(
                        [dirty.x as usize, dirty.y as usize],
                        patch,
                        TextureOptions::NEAREST,
                    );
                }
                (Some(texture), None) => texture.set(full_image(canvas), TextureOptions::NEAREST),
                (None, _) => {
                    let texture = ui.ctx().load_texture(
                        "ink-canvas",
                        full_image(canvas),
                        TextureOptions::NEAREST,
                    );
                    self.texture = Some(texture);
                }
            }
            self.uploaded_revision = Some(canvas.revision());
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::BLACK);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                canvas_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        canvas_rect
    }
}

impl eframe::App for CalcApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.apply_completions(now);
        if let Some(session) = self.session.as_mut() {
            session.tick(now);
        }

        let busy = self.session.as_ref().map(Session::in_flight).unwrap_or(0) > 0;
        let action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| self.toolbar.ui(ui, busy))
            .inner;
        match action {
            Some(ToolbarAction::Reset) => self.reset(),
            Some(ToolbarAction::Calculate) => self.calculate(),
            Some(ToolbarAction::SelectColor(color)) => {
                if let Some(session) = self.session.as_mut() {
                    session.select_color(color);
                }
            }
            None => {}
        }

        let canvas_rect = egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| self.canvas_ui(ui))
            .inner;

        if let Some(session) = self.session.as_mut() {
            self.overlays.ui(ctx, session, canvas_rect.min);
            if let Some(deadline) = session.next_deadline() {
                ctx.request_repaint_after(deadline.saturating_duration_since(now));
            }
        }

        self.toasts.show(ctx);
    }
}
