//! Comment anchoring and page markers.

use serde::Serialize;
use uuid::Uuid;

use crate::reader::models::{Comment, Position, Rect};

/// Markers are 16px squares drawn with their top-left at `anchor - MARKER_OFFSET`,
/// which centres them on the anchor.
pub const MARKER_SIZE: f64 = 16.0;
pub const MARKER_OFFSET: f64 = MARKER_SIZE / 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub comment_id: Uuid,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
}

/// Top-centre of the selection, relative to the container.
pub fn anchor_from_selection(selection: &Rect, container: &Rect) -> Position {
    Position {
        x: selection.left - container.left + selection.width / 2.0,
        y: selection.top - container.top,
    }
}

/// Markers for every positioned comment on `page`, in comment order.
pub fn markers_for_page(comments: &[Comment], page: u32) -> Vec<Marker> {
    comments
        .iter()
        .filter(|c| c.page_number == Some(page))
        .filter_map(|c| {
            c.position.map(|p| Marker {
                comment_id: c.id,
                x: p.x - MARKER_OFFSET,
                y: p.y - MARKER_OFFSET,
                is_ai: c.is_ai,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(position: Option<Position>, page: Option<u32>) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            text: "note".into(),
            is_ai: false,
            timestamp: Utc::now(),
            position,
            page_number: page,
            selected_text: None,
        }
    }

    #[test]
    fn test_anchor_is_top_centre_of_selection() {
        let selection = Rect {
            left: 150.0,
            top: 420.0,
            width: 80.0,
            height: 18.0,
        };
        let container = Rect {
            left: 100.0,
            top: 60.0,
            width: 800.0,
            height: 1000.0,
        };
        assert_eq!(
            anchor_from_selection(&selection, &container),
            Position { x: 90.0, y: 360.0 }
        );
    }

    #[test]
    fn test_markers_are_offset_and_filtered_by_page() {
        let on_page = comment(Some(Position { x: 90.0, y: 360.0 }), Some(2));
        let comments = vec![
            comment(Some(Position { x: 10.0, y: 10.0 }), Some(1)),
            on_page.clone(),
            // no anchor, never drawn
            comment(None, Some(2)),
        ];

        let markers = markers_for_page(&comments, 2);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].comment_id, on_page.id);
        assert_eq!((markers[0].x, markers[0].y), (82.0, 352.0));
    }

    #[test]
    fn test_empty_page() {
        assert!(markers_for_page(&[comment(None, None)], 1).is_empty());
    }
}
