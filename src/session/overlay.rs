/// Screen position of an overlay, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

pub fn format_latex(expression: &str, result: &str) -> String {
    format!("\\(\\LARGE{{{expression} = {result}}}\\)")
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub latex: String,
    pub expression: String,
    pub result: String,
    /// Shared anchor at the moment this entry was created.
    pub anchor: Position,
    /// Where the entry currently sits. Starts at `anchor`, follows drags.
    pub position: Position,
}

/// Typeset results shown over the canvas, oldest first.
///
/// All entries share one anchor. A finished drag writes the dragged entry's
/// position into that anchor, which only affects entries created later.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayList {
    entries: Vec<OverlayEntry>,
    anchor: Position,
    revision: u64,
}

impl OverlayList {
    pub fn new(anchor: Position) -> Self {
        Self {
            entries: Vec::new(),
            anchor,
            revision: 0,
        }
    }

    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    /// Changes whenever the list does; the typesetter re-renders on change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_anchor(&mut self, anchor: Position) {
        self.anchor = anchor;
    }

    pub fn push(&mut self, expression: &str, result: &str) -> &OverlayEntry {
        self.entries.push(OverlayEntry {
            latex: format_latex(expression, result),
            expression: expression.to_owned(),
            result: result.to_owned(),
            anchor: self.anchor,
            position: self.anchor,
        });
        self.revision = self.revision.wrapping_add(1);
        &self.entries[self.entries.len() - 1]
    }

    pub fn end_drag(&mut self, index: usize, position: Position) {
        let Some(entry) = self.entries.get_mut(index) else {
            tracing::warn!(index, "drag ended on unknown overlay");
            return;
        };
        entry.position = position;
        self.anchor = position;
    }

    /// Drops every entry. The anchor is left where it was.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.revision = self.revision.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latex_wraps_expression_and_result() {
        assert_eq!(format_latex("2 + 3", "5"), "\\(\\LARGE{2 + 3 = 5}\\)");
    }

    #[test]
    fn entries_capture_anchor_at_creation() {
        let mut list = OverlayList::new(Position::new(10.0, 200.0));
        list.push("x", "5");
        list.set_anchor(Position::new(50.0, 60.0));
        list.push("y", "6");

        assert_eq!(list.entries()[0].anchor, Position::new(10.0, 200.0));
        assert_eq!(list.entries()[1].anchor, Position::new(50.0, 60.0));
    }

    #[test]
    fn drag_moves_shared_anchor_not_siblings() {
        let mut list = OverlayList::new(Position::new(10.0, 200.0));
        list.push("a", "1");
        list.push("b", "2");
        list.end_drag(0, Position::new(300.0, 40.0));

        assert_eq!(list.entries()[0].position, Position::new(300.0, 40.0));
        assert_eq!(list.entries()[1].position, Position::new(10.0, 200.0));
        assert_eq!(list.anchor(), Position::new(300.0, 40.0));

        let next = list.push("c", "3");
        assert_eq!(next.position, Position::new(300.0, 40.0));
    }

    #[test]
    fn revision_tracks_list_changes() {
        let mut list = OverlayList::new(Position::default());
        let r0 = list.revision();
        list.push("a", "1");
        let r1 = list.revision();
        assert_ne!(r0, r1);
        list.end_drag(0, Position::new(1.0, 1.0));
        assert_eq!(list.revision(), r1);
        list.clear();
        assert_ne!(list.revision(), r1);
        assert!(list.is_empty());
    }

    #[test]
    fn drag_on_missing_entry_is_ignored() {
        let mut list = OverlayList::new(Position::new(1.0, 2.0));
        list.end_drag(4, Position::new(9.0, 9.0));
        assert_eq!(list.anchor(), Position::new(1.0, 2.0));
    }
}
