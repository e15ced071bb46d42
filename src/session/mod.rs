pub mod overlay;
pub mod schedule;
pub mod vars;

use crate::calc::wire::{CalculateRequest, RecognitionResult};
use crate::draw::bounds::ink_bounds;
use crate::draw::canvas::PixelCanvas;
use crate::draw::input::DrawInputState;
use crate::draw::model::{Color, StrokeStyle};
use crate::draw::raster::DirtyRect;
use anyhow::{Context, Result};
use overlay::{OverlayList, Position};
use schedule::DeferredQueue;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use vars::VariableTable;

pub const DEFAULT_OVERLAY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_OVERLAY_ORIGIN: Position = Position::new(10.0, 200.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Drawing,
    Calculating,
}

/// Identifies one calculation request. `epoch` is the session epoch at
/// submit time; a reset moves the session to a new epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket {
    pub id: u64,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Done { ticket: Ticket, results: usize },
    Failed { ticket: Ticket, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub stroke: StrokeStyle,
    pub overlay_delay: Duration,
    pub overlay_origin: Position,
    pub clear_canvas_on_result: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            stroke: StrokeStyle::default(),
            overlay_delay: DEFAULT_OVERLAY_DELAY,
            overlay_origin: DEFAULT_OVERLAY_ORIGIN,
            clear_canvas_on_result: true,
        }
    }
}

/// Everything the drawing page holds in memory, with one method per user
/// or network event.
///
/// The session never touches the network or the screen. The GUI feeds it
/// pointer events and completions and reads back the canvas and overlays.
#[derive(Debug)]
pub struct Session {
    canvas: PixelCanvas,
    input: DrawInputState,
    vars: VariableTable,
    overlays: OverlayList,
    last_result: Option<RecognitionResult>,
    pending: DeferredQueue<RecognitionResult>,
    in_flight: BTreeSet<Ticket>,
    next_ticket: u64,
    epoch: u64,
    options: SessionOptions,
}

impl Session {
    pub fn new(width: u32, height: u32, options: SessionOptions) -> Self {
        tracing::debug!(width, height, "creating drawing session");
        Self {
            canvas: PixelCanvas::new(width, height),
            input: DrawInputState::new(options.stroke),
            vars: VariableTable::default(),
            overlays: OverlayList::new(options.overlay_origin),
            last_result: None,
            pending: DeferredQueue::default(),
            in_flight: BTreeSet::new(),
            next_ticket: 1,
            epoch: 0,
            options,
        }
    }

    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    pub fn vars(&self) -> &VariableTable {
        &self.vars
    }

    pub fn overlays(&self) -> &OverlayList {
        &self.overlays
    }

    pub fn last_result(&self) -> Option<&RecognitionResult> {
        self.last_result.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn color(&self) -> Color {
        self.input.style().color
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_overlays(&self) -> usize {
        self.pending.len()
    }

    pub fn is_drawing(&self) -> bool {
        self.input.is_drawing()
    }

    pub fn phase(&self) -> Phase {
        if self.input.is_drawing() {
            Phase::Drawing
        } else if !self.in_flight.is_empty() {
            Phase::Calculating
        } else {
            Phase::Idle
        }
    }

    pub fn pointer_down(&mut self, point: (i32, i32)) {
        self.input.handle_down(point);
    }

    /// Extend the current stroke. Returns the canvas area that changed.
    pub fn pointer_move(&mut self, point: (i32, i32)) -> Option<DirtyRect> {
        self.input.handle_move(&mut self.canvas, point)
    }

    pub fn pointer_up(&mut self) {
        self.input.handle_up();
    }

    pub fn pointer_leave(&mut self) {
        self.input.handle_leave();
    }

    pub fn select_color(&mut self, color: Color) {
        self.input.set_color(color);
    }

    /// Snapshot the canvas and variables into a request and mark it in
    /// flight. Calling this again before the first completes issues a
    /// second, independent request.
    pub fn begin_calculation(&mut self) -> Result<(Ticket, CalculateRequest)> {
        let image = self
            .canvas
            .to_data_url()
            .context("snapshot canvas for calculation")?;
        let ticket = Ticket {
            id: self.next_ticket,
            epoch: self.epoch,
        };
        self.next_ticket += 1;
        self.in_flight.insert(ticket);
        tracing::info!(
            ticket = ticket.id,
            in_flight = self.in_flight.len(),
            "calculation started"
        );
        Ok((
            ticket,
            CalculateRequest {
                image,
                dict_of_vars: self.vars.clone(),
            },
        ))
    }

    /// Apply a finished request.
    ///
    /// Assignments go into the variable table first, then the shared
    /// overlay anchor moves to the center of the ink, then one overlay per
    /// result is scheduled `overlay_delay` after `now`. Completions for
    /// tickets issued before the last reset are discarded and return
    /// `None`.
    pub fn complete_calculation(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<RecognitionResult>>,
        now: Instant,
    ) -> Option<Notice> {
        if ticket.epoch != self.epoch {
            tracing::debug!(ticket = ticket.id, "discarding completion from before reset");
            return None;
        }
        if !self.in_flight.remove(&ticket) {
            tracing::warn!(ticket = ticket.id, "completion for unknown ticket");
            return None;
        }

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(ticket = ticket.id, "calculation request failed: {e:#}");
                return Some(Notice::Failed {
                    ticket,
                    error: format!("{e:#}"),
                });
            }
        };

        for result in results.iter().filter(|r| r.assign) {
            self.vars.assign(result.expr.as_str(), result.result.as_str());
        }

        let bounds = ink_bounds(&self.canvas);
        if bounds.is_empty() {
            tracing::debug!("no ink on canvas; anchoring overlays at canvas center");
        }
        self.overlays.set_anchor(bounds.center().into());

        let due = now + self.options.overlay_delay;
        let count = results.len();
        for result in results {
            self.pending.schedule(due, result);
        }
        tracing::info!(ticket = ticket.id, results = count, "calculation done");
        Some(Notice::Done {
            ticket,
            results: count,
        })
    }

    /// Materialize overlays whose delay has elapsed. Returns how many were
    /// added.
    pub fn tick(&mut self, now: Instant) -> usize {
        let due = self.pending.poll(now);
        let count = due.len();
        for result in due {
            self.overlays.push(&result.expr, &result.result);
            self.last_result = Some(result);
            if self.options.clear_canvas_on_result {
                self.canvas.clear();
            }
        }
        count
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.next_deadline()
    }

    pub fn end_overlay_drag(&mut self, index: usize, position: Position) {
        self.overlays.end_drag(index, position);
    }

    /// Back to a blank page: canvas, overlays, last result and variables
    /// are cleared, pending overlays are cancelled and in-flight requests
    /// are orphaned. The overlay anchor is kept.
    pub fn reset(&mut self) {
        let cancelled = self.pending.cancel_all();
        let orphaned = self.in_flight.len();
        self.canvas.clear();
        self.input.handle_up();
        self.overlays.clear();
        self.last_result = None;
        self.vars.clear();
        self.in_flight.clear();
        self.epoch = self.epoch.wrapping_add(1);
        tracing::info!(cancelled, orphaned, "session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn session() -> Session {
        Session::new(64, 48, SessionOptions::default())
    }

    fn scribble(session: &mut Session) {
        session.pointer_down((10, 10));
        session.pointer_move((30, 20));
        session.pointer_up();
    }

    #[test]
    fn phase_follows_pointer_and_requests() {
        let mut s = session();
        assert_eq!(s.phase(), Phase::Idle);
        s.pointer_down((1, 1));
        assert_eq!(s.phase(), Phase::Drawing);
        s.pointer_leave();
        assert_eq!(s.phase(), Phase::Idle);

        let (ticket, _) = s.begin_calculation().unwrap();
        assert_eq!(s.phase(), Phase::Calculating);
        s.complete_calculation(ticket, Ok(Vec::new()), Instant::now());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn request_carries_canvas_and_variables() {
        let mut s = session();
        s.vars.assign("x", "5");
        let (_, request) = s.begin_calculation().unwrap();
        assert!(request.image.starts_with("data:image/png;base64,"));
        assert_eq!(request.dict_of_vars.get("x"), Some("5"));
    }

    #[test]
    fn failure_leaves_state_untouched() {
        let mut s = session();
        scribble(&mut s);
        let (ticket, _) = s.begin_calculation().unwrap();
        let notice = s.complete_calculation(ticket, Err(anyhow!("boom")), Instant::now());
        assert!(matches!(notice, Some(Notice::Failed { .. })));
        assert!(s.vars().is_empty());
        assert_eq!(s.pending_overlays(), 0);
        assert_eq!(s.overlays().anchor(), DEFAULT_OVERLAY_ORIGIN);
        assert!(!s.canvas().is_blank());
    }

    #[test]
    fn anchor_moves_to_ink_center() {
        let mut s = session();
        s.canvas.fill_rect(10, 20, 30, 40, Color::WHITE);
        let (ticket, _) = s.begin_calculation().unwrap();
        s.complete_calculation(
            ticket,
            Ok(vec![RecognitionResult::new("1+1", "2", false)]),
            Instant::now(),
        );
        assert_eq!(s.overlays().anchor(), Position::new(20.0, 30.0));
    }

    #[test]
    fn overlay_clears_canvas_when_it_appears() {
        let mut s = session();
        scribble(&mut s);
        let start = Instant::now();
        let (ticket, _) = s.begin_calculation().unwrap();
        s.complete_calculation(
            ticket,
            Ok(vec![RecognitionResult::new("1+1", "2", false)]),
            start,
        );
        assert!(!s.canvas().is_blank());
        assert_eq!(s.tick(start + DEFAULT_OVERLAY_DELAY), 1);
        assert!(s.canvas().is_blank());
        assert_eq!(
            s.last_result(),
            Some(&RecognitionResult::new("1+1", "2", false))
        );
    }

    #[test]
    fn canvas_kept_when_clear_on_result_disabled() {
        let mut s = Session::new(
            64,
            48,
            SessionOptions {
                clear_canvas_on_result: false,
                ..SessionOptions::default()
            },
        );
        scribble(&mut s);
        let start = Instant::now();
        let (ticket, _) = s.begin_calculation().unwrap();
        s.complete_calculation(
            ticket,
            Ok(vec![RecognitionResult::new("1+1", "2", false)]),
            start,
        );
        s.tick(start + DEFAULT_OVERLAY_DELAY);
        assert!(!s.canvas().is_blank());
    }

    #[test]
    fn pointer_move_reports_changed_area() {
        let mut s = session();
        assert_eq!(s.pointer_move((5, 5)), None);
        s.pointer_down((10, 10));
        let dirty = s.pointer_move((20, 12)).expect("stroke on canvas");
        assert_eq!((dirty.x, dirty.y), (9, 9));
        assert_eq!((dirty.width, dirty.height), (13, 5));
        assert_eq!(s.pointer_move((20, 12)), None);
    }

    #[test]
    fn unknown_ticket_is_ignored() {
        let mut s = session();
        let bogus = Ticket { id: 99, epoch: 0 };
        assert_eq!(
            s.complete_calculation(bogus, Ok(Vec::new()), Instant::now()),
            None
        );
    }
}
