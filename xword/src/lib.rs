//! This crate is meant to be used as the foundation for a crossword puzzle app.
//! It provides no UI itself, but see `xwordtui` for an example of how you can
//! use it to produce a crossword app.
//!
//! Puzzles are loaded from JSON documents describing the grid dimensions, the
//! cells in row-major order, the clues, and the two clue lists ("Across" and
//! "Down"). Feed the raw document text to [Puzzle::load], then drive the
//! returned [Puzzle] with the user-facing operations (focus, typing, arrows,
//! direction toggling) and read the grid, clue, and highlight state back out
//! for rendering.

use Direction::{Across, Down};
use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::ops::Not;

use log::debug;
use thiserror::Error as ThisError;

mod document;
mod model;

pub use document::{CellSpec, CellType, ClueListSpec, ClueSpec, ClueText, Dimensions, Document};
pub use model::{Cell, Clue, ClueList, GridModel, Motion, Wrap};

/// The two crossword directions: `Across` and `Down`
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub enum Direction {
  Across,
  Down,
}

impl Not for Direction {
  type Output = Self;
  fn not(self) -> Self {
    match self {
      Across => Down,
      Down => Across,
    }
  }
}

impl Direction {
  /// The clue list holding this direction's clues: list 0 is Across,
  /// list 1 is Down.
  fn list_index(self) -> usize {
    match self {
      Across => 0,
      Down => 1,
    }
  }

  /// The motion that advances along a word in this direction.
  fn advance(self) -> Motion {
    match self {
      Across => Motion::Right,
      Down => Motion::Down,
    }
  }

  /// The motion that backs up along a word in this direction.
  fn retreat(self) -> Motion {
    match self {
      Across => Motion::Left,
      Down => Motion::Up,
    }
  }
}

/// A square in a crossword grid.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Square {
  /// A block where nothing can be entered.
  Block,
  /// A square where a letter could be entered, but that is currently empty.
  Empty,
  /// A square with a letter written in it.
  Letter(char),
}

impl Debug for Square {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Block => write!(f, "■"),
      Self::Empty => write!(f, " "),
      Self::Letter(c) => write!(f, "{}", c),
    }?;
    Ok(())
  }
}

impl Display for Square {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// The user's position in the puzzle, plus everything derived from it: the
/// current direction, the active clue and its highlighted cells, the clues
/// sharing the focused cell (secondary highlights), and the pending pointer
/// press used by the click-to-toggle pairing rule.
///
/// Owned by a [Puzzle] and rebuilt whole on every load; nothing here is
/// ambient or shared between puzzle instances.
#[derive(Debug)]
struct InteractionState {
  active_cell: Option<usize>,
  direction: Direction,
  active_clue: Option<usize>,
  highlighted_cells: HashSet<usize>,
  secondary_clues: Vec<usize>,
  pending_press: Option<usize>,
}

impl InteractionState {
  fn new() -> Self {
    Self {
      active_cell: None,
      direction: Across,
      active_clue: None,
      highlighted_cells: HashSet::new(),
      secondary_clues: Vec::new(),
      pending_press: None,
    }
  }
}

/// Display metadata carried through from the document for the front end.
#[derive(Debug, Default)]
struct Metadata {
  title: String,
  constructors: Vec<String>,
  editor: String,
  publication_date: String,
}

/// Represents a crossword puzzle being solved interactively. When implementing
/// a crossword app, this will be the main structure you will use.
#[derive(Debug)]
pub struct Puzzle {
  model: GridModel,
  squares: Vec<Square>,
  state: InteractionState,
  meta: Metadata,
}

impl Puzzle {
  /// Creates a Puzzle from the text of a JSON puzzle document, validating it
  /// and building the grid/clue model. All-or-nothing: on any error, no
  /// puzzle state exists, so a caller holding a previous `Puzzle` keeps it.
  pub fn load(raw: &str) -> Result<Self, Error> {
    let doc = Document::parse(raw)?;
    let meta = Metadata {
      title: doc.title.clone().unwrap_or_default(),
      constructors: doc.constructors.clone(),
      editor: doc.editor.clone().unwrap_or_default(),
      publication_date: doc.publication_date.clone().unwrap_or_default(),
    };
    let model = GridModel::build(doc)?;
    let squares = model
      .cells()
      .iter()
      .map(|cell| {
        if cell.fillable {
          Square::Empty
        } else {
          Square::Block
        }
      })
      .collect();
    debug!(
      "loaded puzzle '{}': {}x{}, {} clues",
      meta.title,
      model.width(),
      model.height(),
      model.clues().len()
    );
    Ok(Self {
      model,
      squares,
      state: InteractionState::new(),
      meta,
    })
  }

  /// Moves focus to the given cell and recomputes the active clue and the
  /// highlight set. Focusing a block or an out-of-range index is a no-op.
  ///
  /// If the cell has no clue in the current direction but has one in the
  /// other, the direction flips to match before highlighting, so the active
  /// clue is resolvable whenever the cell belongs to any clue at all.
  pub fn focus_cell(&mut self, index: usize) {
    if !self.is_fillable(index) {
      return;
    }
    self.state.active_cell = Some(index);
    self.refresh_highlights(index);
  }

  /// Writes the given letter, uppercased, to the given cell and advances
  /// focus along the current direction under grid wrap, so entry flows
  /// from word to word across the whole puzzle.
  pub fn type_char(&mut self, index: usize, ch: char) {
    if !self.is_fillable(index) {
      return;
    }
    self.squares[index] = Square::Letter(ch.to_ascii_uppercase());
    let next = self
      .model
      .adjacent_fillable(index, self.state.direction.advance(), Wrap::Grid);
    self.focus_cell(next);
  }

  /// Clears the given cell if it holds a letter. If it is already empty,
  /// backs focus up along the current direction under grid wrap and clears
  /// the cell arrived at.
  pub fn backspace(&mut self, index: usize) {
    if !self.is_fillable(index) {
      return;
    }
    if self.squares[index] != Square::Empty {
      self.squares[index] = Square::Empty;
      return;
    }
    let previous = self
      .model
      .adjacent_fillable(index, self.state.direction.retreat(), Wrap::Grid);
    self.squares[previous] = Square::Empty;
    self.focus_cell(previous);
  }

  /// Clears the given cell without moving focus.
  pub fn delete(&mut self, index: usize) {
    if self.is_fillable(index) {
      self.squares[index] = Square::Empty;
    }
  }

  /// Moves focus one cell in the given motion under line wrap: movement
  /// stays within the current row or column, wrapping around its ends.
  /// Does not change any cell value.
  pub fn arrow(&mut self, index: usize, motion: Motion) {
    if !self.is_fillable(index) {
      return;
    }
    let next = self.model.adjacent_fillable(index, motion, Wrap::Line);
    self.focus_cell(next);
  }

  /// Flips the current direction and recomputes highlights for the active
  /// cell. If that cell only has a clue in the original direction, the
  /// highlight recomputation flips back, so the direction never points
  /// where the cell has no clue.
  pub fn toggle_direction(&mut self) {
    self.state.direction = !self.state.direction;
    if let Some(index) = self.state.active_cell {
      self.refresh_highlights(index);
    }
  }

  /// Handles a clue-list entry being chosen: sets the direction from the
  /// list containing the clue, then focuses the clue's first cell. The
  /// focus-driven highlight resolution lands back on the same clue.
  pub fn click_clue(&mut self, clue: usize) {
    if clue >= self.model.clues().len() {
      return;
    }
    for (l, list) in self.model.clue_lists().iter().enumerate() {
      if list.clue_indices.contains(&clue) {
        self.state.direction = if l == 0 { Across } else { Down };
        break;
      }
    }
    self.focus_cell(self.model.clue(clue).cell_indices[0]);
  }

  /// Handles a pointer press on the given cell (`None` for a press outside
  /// the grid). A press on the already-focused fillable cell arms the
  /// click-to-toggle; a press anywhere else disarms it, and a press on some
  /// other fillable cell focuses that cell.
  pub fn pointer_press(&mut self, index: Option<usize>) {
    self.state.pending_press = None;
    let Some(index) = index else { return };
    if !self.is_fillable(index) {
      return;
    }
    if self.state.active_cell == Some(index) {
      self.state.pending_press = Some(index);
    } else {
      self.focus_cell(index);
    }
  }

  /// Handles a pointer release on the given cell (`None` for a release
  /// outside the grid). Toggles the direction only when the release matches
  /// the armed press, so a press-drag-release across cells never toggles.
  /// The armed press is cleared unconditionally, matched or not.
  pub fn pointer_release(&mut self, index: Option<usize>) {
    if self.state.pending_press.take() == index && index.is_some() {
      self.toggle_direction();
    }
  }

  /// Recomputes the active clue and highlight set for the focused cell,
  /// from scratch.
  ///
  /// The active clue is the member of the cell's clue set that appears in
  /// the current direction's clue list. When there is none, the direction
  /// flips once and the other list is searched; if that also fails (a cell
  /// belonging to no clue) nothing is highlighted and the direction stays
  /// flipped. Every other clue through the cell becomes a secondary
  /// highlight, without expanding its cells.
  fn refresh_highlights(&mut self, index: usize) {
    let mut active = self.clue_in_list(index, self.state.direction);
    if active.is_none() {
      self.state.direction = !self.state.direction;
      active = self.clue_in_list(index, self.state.direction);
    }

    self.state.active_clue = active;
    self.state.highlighted_cells.clear();
    self.state.secondary_clues.clear();
    if let Some(active) = active {
      self
        .state
        .highlighted_cells
        .extend(self.model.clue(active).cell_indices.iter().copied());
      self.state.secondary_clues.extend(
        self
          .model
          .cell(index)
          .clue_indices
          .iter()
          .copied()
          .filter(|&k| k != active),
      );
    }
  }

  /// Searches the cell's clue set for a member of the given direction's
  /// clue list. Membership is discovered from the clue lists, never assumed
  /// from the order of the cell's clue entries.
  fn clue_in_list(&self, index: usize, direction: Direction) -> Option<usize> {
    let list = &self.model.clue_lists()[direction.list_index()];
    self
      .model
      .cell(index)
      .clue_indices
      .iter()
      .copied()
      .find(|k| list.clue_indices.contains(k))
  }

  fn is_fillable(&self, index: usize) -> bool {
    index < self.model.total() && self.model.cell(index).fillable
  }

  /// Returns a reference to the underlying grid/clue model.
  pub fn model(&self) -> &GridModel {
    &self.model
  }

  pub fn width(&self) -> usize {
    self.model.width()
  }

  pub fn height(&self) -> usize {
    self.model.height()
  }

  /// Returns the [Square] at the given index.
  pub fn square(&self, index: usize) -> Square {
    self.squares[index]
  }

  /// The first fillable cell in row-major order, a natural initial focus.
  pub fn first_fillable(&self) -> Option<usize> {
    self.model.first_fillable()
  }

  pub fn direction(&self) -> Direction {
    self.state.direction
  }

  pub fn active_cell(&self) -> Option<usize> {
    self.state.active_cell
  }

  /// The clue driving the primary highlight, if one is resolved.
  pub fn active_clue(&self) -> Option<usize> {
    self.state.active_clue
  }

  /// Whether the given cell belongs to the active clue's word.
  pub fn is_highlighted(&self, index: usize) -> bool {
    self.state.highlighted_cells.contains(&index)
  }

  /// The other clues through the focused cell, rendered distinctly but not
  /// expanded into highlighted cells.
  pub fn secondary_clues(&self) -> &[usize] {
    &self.state.secondary_clues
  }

  /// Returns the display text of the active clue.
  pub fn current_clue(&self) -> Option<&str> {
    self
      .state
      .active_clue
      .map(|k| self.model.clue(k).text.as_str())
  }

  pub fn title(&self) -> &str {
    &self.meta.title
  }

  pub fn constructors(&self) -> &[String] {
    &self.meta.constructors
  }

  pub fn editor(&self) -> &str {
    &self.meta.editor
  }

  pub fn publication_date(&self) -> &str {
    &self.meta.publication_date
  }
}

/// The errors that may be produced by functions in this crate.
#[derive(Debug, ThisError)]
pub enum Error {
  /// The document is not parseable as JSON at all.
  #[error("malformed puzzle document: {0}")]
  Malformed(String),
  /// The document parses but fails a shape or constraint check. The message
  /// names the first offending field.
  #[error("invalid puzzle document: {0}")]
  SchemaViolation(String),
  /// The document is internally consistent per the schema, but one of its
  /// cross-references exceeds the bounds of the array it points into.
  #[error("puzzle document reference out of range: {0}")]
  IndexOutOfRange(String),
  /// An [I/O error](std::io::Error) occurred.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  /// A 3x3 grid, all cells fillable, with a single across clue spanning
  /// row 0 and a single down clue spanning column 0. Cell 0 belongs to
  /// both; cells 1-2 only to the across clue; cells 3 and 6 only to the
  /// down clue. The remaining cells point at clues 2 and 3, which appear
  /// in neither clue list, so those cells resolve to no active clue.
  fn corner_puzzle() -> Puzzle {
    let raw = json!({
      "dimensions": {"width": 3, "height": 3},
      "clueLists": [
        {"name": "Across", "clues": [0]},
        {"name": "Down", "clues": [1]}
      ],
      "clues": [
        {"label": "1", "text": [{"plain": "across"}], "cells": [0, 1, 2]},
        {"label": "1", "text": [{"plain": "down"}], "cells": [0, 3, 6]},
        {"label": "9", "text": [{"plain": "unlisted"}], "cells": [4, 5]},
        {"label": "9", "text": [{"plain": "unlisted"}], "cells": [7, 8]}
      ],
      "cells": [
        {"label": "1", "answer": "A", "clues": [0, 1]},
        {"answer": "B", "clues": [0]},
        {"answer": "C", "clues": [0]},
        {"answer": "D", "clues": [1]},
        {"answer": "E", "clues": [2]},
        {"answer": "F", "clues": [2]},
        {"answer": "G", "clues": [1]},
        {"answer": "H", "clues": [3]},
        {"answer": "I", "clues": [3]}
      ]
    })
    .to_string();
    Puzzle::load(&raw).unwrap()
  }

  #[test]
  fn load_builds_squares_from_fillability() {
    let puzzle = corner_puzzle();
    assert_eq!(puzzle.width(), 3);
    assert_eq!(puzzle.height(), 3);
    for index in 0..9 {
      assert_eq!(puzzle.square(index), Square::Empty);
    }
    assert_eq!(puzzle.active_cell(), None);
    assert_eq!(puzzle.direction(), Across);
  }

  #[test]
  fn focus_highlights_across_word() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    assert_eq!(puzzle.direction(), Across);
    assert_eq!(puzzle.active_clue(), Some(0));
    assert_eq!(puzzle.current_clue(), Some("across"));
    for index in [0, 1, 2] {
      assert!(puzzle.is_highlighted(index));
    }
    for index in [3, 4, 5, 6, 7, 8] {
      assert!(!puzzle.is_highlighted(index));
    }
    assert_eq!(puzzle.secondary_clues(), &[1]);
  }

  #[test]
  fn toggle_switches_to_down_word() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.toggle_direction();
    assert_eq!(puzzle.direction(), Down);
    assert_eq!(puzzle.active_clue(), Some(1));
    assert_eq!(puzzle.current_clue(), Some("down"));
    for index in [0, 3, 6] {
      assert!(puzzle.is_highlighted(index));
    }
    assert!(!puzzle.is_highlighted(1));
    assert_eq!(puzzle.secondary_clues(), &[0]);
  }

  #[test]
  fn focus_falls_back_to_the_other_list() {
    let mut puzzle = corner_puzzle();
    // Cell 3 only belongs to the down clue, so focusing it while the
    // direction is across must flip the direction to match reality.
    assert_eq!(puzzle.direction(), Across);
    puzzle.focus_cell(3);
    assert_eq!(puzzle.direction(), Down);
    assert_eq!(puzzle.active_clue(), Some(1));
    assert!(puzzle.secondary_clues().is_empty());
  }

  #[test]
  fn focus_on_clueless_cell_highlights_nothing() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(4);
    assert_eq!(puzzle.active_cell(), Some(4));
    assert_eq!(puzzle.active_clue(), None);
    assert_eq!(puzzle.current_clue(), None);
    // Neither list matched; the direction stays where the fallback left it.
    assert_eq!(puzzle.direction(), Down);
    for index in 0..9 {
      assert!(!puzzle.is_highlighted(index));
    }
  }

  #[test]
  fn exactly_one_of_two_clues_is_primary() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    for _ in 0..4 {
      let active = puzzle.active_clue().unwrap();
      let secondary = puzzle.secondary_clues();
      assert_eq!(secondary.len(), 1);
      assert_ne!(secondary[0], active);
      assert!(active <= 1 && secondary[0] <= 1);
      puzzle.toggle_direction();
    }
  }

  #[test]
  fn typing_fills_and_advances() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.type_char(0, 'a');
    assert_eq!(puzzle.square(0), Square::Letter('A'));
    assert_eq!(puzzle.active_cell(), Some(1));
    puzzle.type_char(1, 'b');
    assert_eq!(puzzle.square(1), Square::Letter('B'));
    assert_eq!(puzzle.active_cell(), Some(2));
  }

  #[test]
  fn typing_at_end_of_row_flows_into_next_row() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(2);
    assert_eq!(puzzle.direction(), Across);
    puzzle.type_char(2, 'c');
    assert_eq!(puzzle.active_cell(), Some(3));
  }

  #[test]
  fn typing_down_advances_down_the_column() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.toggle_direction();
    puzzle.type_char(0, 'a');
    assert_eq!(puzzle.active_cell(), Some(3));
  }

  #[test]
  fn backspace_clears_in_place_then_retreats() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.type_char(0, 'a');
    assert_eq!(puzzle.active_cell(), Some(1));

    // Cell 1 is empty, so backspace retreats to cell 0 and clears it.
    puzzle.backspace(1);
    assert_eq!(puzzle.active_cell(), Some(0));
    assert_eq!(puzzle.square(0), Square::Empty);

    // A filled cell is cleared in place without moving focus.
    puzzle.type_char(0, 'a');
    puzzle.type_char(1, 'b');
    assert_eq!(puzzle.active_cell(), Some(2));
    puzzle.focus_cell(1);
    puzzle.backspace(1);
    assert_eq!(puzzle.square(1), Square::Empty);
    assert_eq!(puzzle.active_cell(), Some(1));
  }

  #[test]
  fn delete_clears_without_moving() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.type_char(0, 'a');
    puzzle.focus_cell(0);
    puzzle.delete(0);
    assert_eq!(puzzle.square(0), Square::Empty);
    assert_eq!(puzzle.active_cell(), Some(0));
  }

  #[test]
  fn arrows_use_line_wrap() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(2);
    puzzle.arrow(2, Motion::Right);
    assert_eq!(puzzle.active_cell(), Some(0));
    puzzle.arrow(0, Motion::Up);
    assert_eq!(puzzle.active_cell(), Some(6));
  }

  #[test]
  fn click_clue_sets_direction_and_focus() {
    let mut puzzle = corner_puzzle();
    puzzle.click_clue(1);
    assert_eq!(puzzle.direction(), Down);
    assert_eq!(puzzle.active_cell(), Some(0));
    assert_eq!(puzzle.active_clue(), Some(1));

    puzzle.click_clue(0);
    assert_eq!(puzzle.direction(), Across);
    assert_eq!(puzzle.active_cell(), Some(0));
    assert_eq!(puzzle.active_clue(), Some(0));
  }

  #[test]
  fn click_toggles_only_on_matched_press_and_release() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    assert_eq!(puzzle.direction(), Across);

    // Press and release on the focused cell: one toggle.
    puzzle.pointer_press(Some(0));
    puzzle.pointer_release(Some(0));
    assert_eq!(puzzle.direction(), Down);

    // Press on the focused cell, drag, release elsewhere: no toggle.
    puzzle.pointer_press(Some(0));
    puzzle.pointer_release(Some(1));
    assert_eq!(puzzle.direction(), Down);

    // The unmatched release cleared the armed press.
    puzzle.pointer_release(Some(0));
    assert_eq!(puzzle.direction(), Down);
  }

  #[test]
  fn press_on_unfocused_cell_focuses_it() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.pointer_press(Some(1));
    puzzle.pointer_release(Some(1));
    assert_eq!(puzzle.active_cell(), Some(1));
    // Focus moved, but no toggle fired.
    assert_eq!(puzzle.direction(), Across);
  }

  #[test]
  fn release_outside_grid_clears_armed_press() {
    let mut puzzle = corner_puzzle();
    puzzle.focus_cell(0);
    puzzle.pointer_press(Some(0));
    puzzle.pointer_release(None);
    assert_eq!(puzzle.direction(), Across);
    puzzle.pointer_release(Some(0));
    assert_eq!(puzzle.direction(), Across);
  }

  #[test]
  fn operations_on_blocks_are_noops() {
    let raw = json!({
      "dimensions": {"width": 2, "height": 1},
      "clueLists": [
        {"name": "Across", "clues": [0]},
        {"name": "Down", "clues": [0]}
      ],
      "clues": [
        {"label": "1", "text": [{"plain": "lonely"}], "cells": [0]}
      ],
      "cells": [
        {"label": "1", "answer": "A", "clues": [0]},
        {}
      ]
    })
    .to_string();
    let mut puzzle = Puzzle::load(&raw).unwrap();
    assert_eq!(puzzle.square(1), Square::Block);

    puzzle.focus_cell(1);
    assert_eq!(puzzle.active_cell(), None);
    puzzle.type_char(1, 'x');
    assert_eq!(puzzle.square(1), Square::Block);
    puzzle.focus_cell(9);
    assert_eq!(puzzle.active_cell(), None);
  }

  #[test]
  fn failed_load_reports_one_error() {
    let err = Puzzle::load("{").unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
    let err = Puzzle::load("{}").unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
  }
}
