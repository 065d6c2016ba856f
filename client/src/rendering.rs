//! Plain-text rendering of boards, pieces and scores

use crate::game::ClientGameState;
use shared::generator::COLOR_TABLE;
use shared::{Cell, Grid, Piece, SessionPhase};
use std::fmt::Write;
use std::time::Duration;

const EMPTY: char = '.';

/// Single-character glyph for a cell color. Table colors use the initial of
/// their name; anything else is drawn as `#`.
pub fn glyph(cell: &Cell) -> char {
    match cell {
        None => EMPTY,
        Some(color) => COLOR_TABLE
            .iter()
            .find(|entry| entry.color.eq_ignore_ascii_case(color))
            .and_then(|entry| entry.name.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('#'),
    }
}

/// Board with column numbers on top and row numbers on the left
pub fn render_grid(grid: &Grid) -> String {
    let mut out = String::from("   ");
    for col in 0..grid.cols() {
        let _ = write!(out, "{}", col % 10);
    }
    out.push('\n');
    for (row, cells) in grid.iter_rows().enumerate() {
        let _ = write!(out, "{:>2} ", row);
        out.extend(cells.iter().map(glyph));
        out.push('\n');
    }
    out
}

pub fn render_piece(piece: &Piece) -> Vec<String> {
    let fill = glyph(&Some(piece.color.clone()));
    piece
        .shape
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| if *cell != 0 { fill } else { ' ' })
                .collect()
        })
        .collect()
}

/// Slots side by side, each labelled with its index
pub fn render_pieces(pieces: &[Option<Piece>]) -> String {
    let columns: Vec<Vec<String>> = pieces
        .iter()
        .map(|piece| piece.as_ref().map(render_piece).unwrap_or_default())
        .collect();
    let width = columns
        .iter()
        .flat_map(|lines| lines.iter().map(|l| l.chars().count()))
        .max()
        .unwrap_or(0)
        .max(3);
    let height = columns.iter().map(Vec::len).max().unwrap_or(0);

    let mut header = String::new();
    for slot in 0..columns.len() {
        let _ = write!(header, "[{}]{:width$}", slot, "", width = width - 1);
    }
    let mut out = format!("{}\n", header.trim_end());
    for line in 0..height {
        let mut text = String::new();
        for lines in &columns {
            let cell = lines.get(line).map(String::as_str).unwrap_or("");
            let _ = write!(text, "{:<width$}  ", cell, width = width);
        }
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}

/// Full screen: own board, target or pieces, countdown and opponent view
pub fn render_game(state: &ClientGameState, remaining: Option<Duration>) -> String {
    let Some(session) = state.session() else {
        return "waiting for a game to start\n".to_string();
    };
    let engine = session.engine();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "== {} | score {} | turn {} ==",
        session.game_id(),
        session.score(),
        session.turn()
    );
    if let Some(target) = engine.target() {
        out.push_str("target:\n");
        out.push_str(&render_grid(target));
    }
    out.push_str("your board:\n");
    out.push_str(&render_grid(engine.board()));
    out.push_str("pieces:\n");
    out.push_str(&render_pieces(&engine.pieces()));

    match session.phase() {
        SessionPhase::Finished => {
            let _ = writeln!(out, "game over, final score {}", session.score());
        }
        _ => {
            if let Some(remaining) = remaining {
                let _ = writeln!(out, "{}s left this turn", remaining.as_secs());
            }
        }
    }

    if let Some(view) = state.opponent() {
        let _ = writeln!(out, "opponent (score {}):", view.snapshot.score);
        out.push_str(&render_grid(&view.snapshot.board));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Shape;

    #[test]
    fn test_glyphs() {
        assert_eq!(glyph(&None), '.');
        assert_eq!(glyph(&Some("#D92328".to_string())), 'R');
        assert_eq!(glyph(&Some("#237841".to_string())), 'G');
        assert_eq!(glyph(&Some("#123456".to_string())), '#');
    }

    #[test]
    fn test_render_grid_labels() {
        let grid = Grid::new(2, 3);
        assert_eq!(render_grid(&grid), "   012\n 0 ...\n 1 ...\n");
    }

    #[test]
    fn test_render_piece_shape() {
        let piece = Piece::new(Shape::new(vec![vec![1, 1], vec![0, 1]]).unwrap(), "#006CB7");
        assert_eq!(render_piece(&piece), vec!["BB".to_string(), " B".to_string()]);
    }

    #[test]
    fn test_render_pieces_with_empty_slot() {
        let piece = Piece::new(Shape::solid(1, 2), "#FFCF00");
        let text = render_pieces(&[Some(piece), None]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[0]"));
        assert!(lines[0].contains("[1]"));
        assert_eq!(lines[1], "YY");
    }

    #[test]
    fn test_render_game_without_session() {
        let state = ClientGameState::new();
        assert!(render_game(&state, None).contains("waiting"));
    }
}
