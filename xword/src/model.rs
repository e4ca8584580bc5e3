//! The indexed grid/clue model built from a validated [Document], and the
//! navigation engine that computes wrapped neighbor indices over it.

use crate::Error;
use crate::document::{CellType, Document};

/// A movement request, as produced by an arrow key or by letter entry.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Motion {
  Left,
  Right,
  Up,
  Down,
}

/// What "next cell" means at a row or column boundary.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Wrap {
  /// Movement stays within the current row or column, wrapping to the
  /// opposite end of the same one. Used for arrow-key navigation.
  Line,
  /// Movement treats the whole grid as one continuous sequence: row-major
  /// for left/right, column-major for up/down, so stepping off one row or
  /// column carries into the next. Used for letter-entry traversal.
  Grid,
}

/// One grid position of the built model.
#[derive(Debug)]
pub struct Cell {
  /// Whether a letter can be entered here. A non-fillable cell is a block.
  pub fillable: bool,
  pub label: Option<String>,
  pub circled: bool,
  /// The clue(s) passing through this cell, verbatim from the document.
  pub clue_indices: Vec<usize>,
}

/// One clue of the built model, index-aligned with the document's clues.
#[derive(Debug)]
pub struct Clue {
  pub label: String,
  pub text: String,
  pub formatted: Option<String>,
  /// The cells this clue occupies, in fill order.
  pub cell_indices: Vec<usize>,
  pub relatives: Vec<usize>,
}

/// One of the two named clue groupings, conventionally Across then Down.
#[derive(Debug)]
pub struct ClueList {
  pub name: String,
  pub clue_indices: Vec<usize>,
}

/// The queryable model of one loaded puzzle: a row-major cell array, the
/// clue array, and the two clue lists. Once built, every cross-reference in
/// it is in bounds, so lookups never fail.
#[derive(Debug)]
pub struct GridModel {
  width: usize,
  height: usize,
  cells: Vec<Cell>,
  clues: Vec<Clue>,
  clue_lists: [ClueList; 2],
}

impl GridModel {
  /// Builds the model from a validated document. Re-checks the cross-field
  /// invariants the schema checks can't see: the cell array must cover the
  /// full `width * height` grid, and every index in `cells[..].clues`,
  /// `clues[..].cells`, `clues[..].relatives`, and `clueLists[..].clues`
  /// must be in range. A failure here is load-time fatal, never a silent
  /// truncation.
  pub fn build(doc: Document) -> Result<Self, Error> {
    let width = doc.dimensions.width;
    let height = doc.dimensions.height;
    let total = width * height;

    if doc.cells.len() != total {
      return Err(Error::IndexOutOfRange(format!(
        "document provides {} cells for a {width}x{height} grid",
        doc.cells.len()
      )));
    }

    let clue_count = doc.clues.len();
    for (k, clue) in doc.clues.iter().enumerate() {
      for &cell in &clue.cells {
        if cell >= total {
          return Err(Error::IndexOutOfRange(format!(
            "clues[{k}] references cell {cell} of a {total}-cell grid"
          )));
        }
      }
      for &relative in &clue.relatives {
        if relative >= clue_count {
          return Err(Error::IndexOutOfRange(format!(
            "clues[{k}] references relative clue {relative} of {clue_count} clues"
          )));
        }
      }
    }
    for (l, list) in doc.clue_lists.iter().enumerate() {
      for &k in &list.clues {
        if k >= clue_count {
          return Err(Error::IndexOutOfRange(format!(
            "clueLists[{l}] references clue {k} of {clue_count} clues"
          )));
        }
      }
    }

    let mut cells = Vec::with_capacity(total);
    for (i, spec) in doc.cells.into_iter().enumerate() {
      let clue_indices = spec.clues.unwrap_or_default();
      for &k in &clue_indices {
        if k >= clue_count {
          return Err(Error::IndexOutOfRange(format!(
            "cells[{i}] references clue {k} of {clue_count} clues"
          )));
        }
      }
      cells.push(Cell {
        fillable: spec.answer.is_some(),
        label: spec.label,
        circled: spec.cell_type == Some(CellType::Circled),
        clue_indices,
      });
    }

    let clues = doc
      .clues
      .into_iter()
      .map(|mut spec| {
        let text = spec.text.swap_remove(0);
        Clue {
          label: spec.label,
          text: text.plain,
          formatted: text.formatted,
          cell_indices: spec.cells,
          relatives: spec.relatives,
        }
      })
      .collect();

    let clue_lists: Vec<ClueList> = doc
      .clue_lists
      .into_iter()
      .map(|list| ClueList {
        name: list.name,
        clue_indices: list.clues,
      })
      .collect();
    let clue_lists: [ClueList; 2] = clue_lists
      .try_into()
      .map_err(|_| Error::SchemaViolation("clueLists must contain exactly 2 lists".into()))?;

    Ok(Self {
      width,
      height,
      cells,
      clues,
      clue_lists,
    })
  }

  /// The width of this grid.
  pub fn width(&self) -> usize {
    self.width
  }

  /// The height of this grid.
  pub fn height(&self) -> usize {
    self.height
  }

  /// The number of cells in this grid.
  pub fn total(&self) -> usize {
    self.cells.len()
  }

  /// Returns the [Cell] at the given index.
  pub fn cell(&self, index: usize) -> &Cell {
    &self.cells[index]
  }

  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  /// Returns the [Clue] at the given index.
  pub fn clue(&self, index: usize) -> &Clue {
    &self.clues[index]
  }

  pub fn clues(&self) -> &[Clue] {
    &self.clues
  }

  pub fn clue_lists(&self) -> &[ClueList; 2] {
    &self.clue_lists
  }

  /// The first fillable cell in row-major order, if any.
  pub fn first_fillable(&self) -> Option<usize> {
    self.cells.iter().position(|cell| cell.fillable)
  }

  /// Computes the nearest fillable cell from `from` in the given motion and
  /// wrap topology, skipping blocks. If the whole wrap cycle holds no other
  /// fillable cell, returns `from` unchanged.
  pub fn adjacent_fillable(&self, from: usize, motion: Motion, wrap: Wrap) -> usize {
    let mut index = self.step(from, motion, wrap);
    while index != from && !self.cells[index].fillable {
      index = self.step(index, motion, wrap);
    }
    index
  }

  /// One raw wrapped step, fillable or not. The step cycles: repeated
  /// application always returns to the starting index, which is what bounds
  /// the skip loop in [adjacent_fillable](Self::adjacent_fillable).
  fn step(&self, index: usize, motion: Motion, wrap: Wrap) -> usize {
    let total = self.cells.len();
    let (row, col) = (index / self.width, index % self.width);
    match wrap {
      Wrap::Line => match motion {
        Motion::Left => row * self.width + (col + self.width - 1) % self.width,
        Motion::Right => row * self.width + (col + 1) % self.width,
        Motion::Up => (row + self.height - 1) % self.height * self.width + col,
        Motion::Down => (row + 1) % self.height * self.width + col,
      },
      Wrap::Grid => match motion {
        Motion::Left => (index + total - 1) % total,
        Motion::Right => (index + 1) % total,
        // Up and down walk the column-major sequence, so stepping off the
        // top of column c lands at the bottom of column c-1, and off the
        // bottom at the top of column c+1.
        Motion::Up => {
          let cm = (col * self.height + row + total - 1) % total;
          (cm % self.height) * self.width + cm / self.height
        }
        Motion::Down => {
          let cm = (col * self.height + row + 1) % total;
          (cm % self.height) * self.width + cm / self.height
        }
      },
    }
  }
}
