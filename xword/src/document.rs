//! The puzzle document format: a JSON object describing the grid dimensions,
//! the cells in row-major order, the clues, and the two clue lists
//! (conventionally "Across" and "Down").

use serde::Deserialize;
use serde_repr::Deserialize_repr;

use crate::Error;

/// A validated puzzle document. Obtain one with [Document::parse]; a `Document`
/// that exists has passed every schema check, but its cross-references have not
/// yet been bounds-checked against the grid (that happens when the
/// [GridModel](crate::GridModel) is built).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub dimensions: Dimensions,
  pub cells: Vec<CellSpec>,
  pub clues: Vec<ClueSpec>,
  pub clue_lists: Vec<ClueListSpec>,
  pub title: Option<String>,
  #[serde(default)]
  pub constructors: Vec<String>,
  pub editor: Option<String>,
  pub publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Dimensions {
  pub width: usize,
  pub height: usize,
}

/// One grid position. A cell with no `answer` is a block where nothing can be
/// entered; a cell with an `answer` must also name the clue(s) passing through
/// it, and a labeled cell starts at least one of those clues.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSpec {
  pub label: Option<String>,
  pub answer: Option<String>,
  pub clues: Option<Vec<usize>>,
  #[serde(rename = "type")]
  pub cell_type: Option<CellType>,
}

#[derive(Debug, Deserialize_repr, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum CellType {
  Plain = 1,
  Circled = 2,
}

#[derive(Debug, Deserialize)]
pub struct ClueSpec {
  pub label: String,
  /// Exactly one entry: the display text, optionally with a rich variant.
  pub text: Vec<ClueText>,
  /// The cells this clue occupies, in fill order.
  pub cells: Vec<usize>,
  /// Linked clue indices, carried through for display purposes only.
  #[serde(default)]
  pub relatives: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ClueText {
  pub plain: String,
  pub formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClueListSpec {
  pub name: String,
  pub clues: Vec<usize>,
}

impl Document {
  /// Parses and validates a raw puzzle document. All-or-nothing: either every
  /// schema check passes and a `Document` comes back, or the first failure is
  /// reported and nothing is applied.
  pub fn parse(raw: &str) -> Result<Self, Error> {
    let value: serde_json::Value =
      serde_json::from_str(raw).map_err(|e| Error::Malformed(e.to_string()))?;
    let doc: Document =
      serde_json::from_value(value).map_err(|e| Error::SchemaViolation(e.to_string()))?;
    doc.check()?;
    Ok(doc)
  }

  /// The constraint checks that serde's shape checking can't express.
  /// The first failing field wins, and the message names it.
  fn check(&self) -> Result<(), Error> {
    if self.dimensions.width == 0 {
      return Err(schema("dimensions.width must be at least 1"));
    }
    if self.dimensions.height == 0 {
      return Err(schema("dimensions.height must be at least 1"));
    }

    if self.clue_lists.len() != 2 {
      return Err(schema(format!(
        "clueLists must contain exactly 2 lists, found {}",
        self.clue_lists.len()
      )));
    }
    for (l, list) in self.clue_lists.iter().enumerate() {
      if list.clues.is_empty() {
        return Err(schema(format!("clueLists[{l}].clues must not be empty")));
      }
    }

    for (k, clue) in self.clues.iter().enumerate() {
      if clue.text.len() != 1 {
        return Err(schema(format!(
          "clues[{k}].text must contain exactly one entry, found {}",
          clue.text.len()
        )));
      }
      if clue.text[0].plain.is_empty() {
        return Err(schema(format!("clues[{k}].text[0].plain must not be empty")));
      }
      if clue.cells.is_empty() {
        return Err(schema(format!("clues[{k}].cells must not be empty")));
      }
    }

    for (i, cell) in self.cells.iter().enumerate() {
      match (&cell.answer, &cell.clues) {
        (Some(_), None) => {
          return Err(schema(format!("cells[{i}].answer requires clues")));
        }
        (None, Some(_)) => {
          return Err(schema(format!("cells[{i}].clues requires answer")));
        }
        _ => {}
      }
      if let Some(clues) = &cell.clues {
        if clues.is_empty() {
          return Err(schema(format!("cells[{i}].clues must not be empty")));
        }
        if clues.len() > 2 {
          return Err(schema(format!(
            "cells[{i}].clues must contain at most 2 entries, found {}",
            clues.len()
          )));
        }
      }
      if cell.label.is_some() && cell.answer.is_none() {
        return Err(schema(format!("cells[{i}].label requires answer and clues")));
      }
    }

    let expected = self.dimensions.width * self.dimensions.height;
    if self.cells.len() != expected {
      return Err(schema(format!(
        "cells has {} entries for {}x{} dimensions, expected {expected}",
        self.cells.len(),
        self.dimensions.width,
        self.dimensions.height
      )));
    }

    Ok(())
  }
}

fn schema(message: impl Into<String>) -> Error {
  Error::SchemaViolation(message.into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn minimal() -> serde_json::Value {
    json!({
      "dimensions": {"width": 2, "height": 1},
      "clueLists": [
        {"name": "Across", "clues": [0]},
        {"name": "Down", "clues": [1]}
      ],
      "clues": [
        {"label": "1", "text": [{"plain": "Across clue"}], "cells": [0, 1]},
        {"label": "1", "text": [{"plain": "Down clue"}], "cells": [0]}
      ],
      "cells": [
        {"label": "1", "answer": "A", "clues": [0, 1]},
        {"answer": "B", "clues": [0]}
      ],
      "title": "Tiny"
    })
  }

  fn parse(value: serde_json::Value) -> Result<Document, Error> {
    Document::parse(&value.to_string())
  }

  #[test]
  fn parses_well_formed_document() {
    let doc = parse(minimal()).unwrap();
    assert_eq!(doc.dimensions.width, 2);
    assert_eq!(doc.cells.len(), 2);
    assert_eq!(doc.clues.len(), 2);
    assert_eq!(doc.clue_lists[0].name, "Across");
    assert_eq!(doc.title.as_deref(), Some("Tiny"));
  }

  #[test]
  fn rejects_unparseable_text() {
    let err = Document::parse("{not json").unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
  }

  #[test]
  fn rejects_missing_dimensions() {
    let mut value = minimal();
    value.as_object_mut().unwrap().remove("dimensions");
    let err = parse(value).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
  }

  #[test]
  fn rejects_zero_width() {
    let mut value = minimal();
    value["dimensions"]["width"] = json!(0);
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("dimensions.width"));
  }

  #[test]
  fn rejects_wrong_clue_list_count() {
    let mut value = minimal();
    value["clueLists"].as_array_mut().unwrap().pop();
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("exactly 2 lists"));
  }

  #[test]
  fn rejects_answer_without_clues() {
    let mut value = minimal();
    value["cells"][1] = json!({"answer": "B"});
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("cells[1].answer requires clues"));
  }

  #[test]
  fn rejects_clues_without_answer() {
    let mut value = minimal();
    value["cells"][1] = json!({"clues": [0]});
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("cells[1].clues requires answer"));
  }

  #[test]
  fn rejects_label_on_block() {
    let mut value = minimal();
    value["cells"][1] = json!({"label": "2"});
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("cells[1].label"));
  }

  #[test]
  fn rejects_more_than_two_clues_per_cell() {
    let mut value = minimal();
    value["cells"][0]["clues"] = json!([0, 1, 1]);
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("at most 2"));
  }

  #[test]
  fn rejects_cell_count_mismatch() {
    let mut value = minimal();
    value["cells"].as_array_mut().unwrap().pop();
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("cells has 1 entries"));
  }

  #[test]
  fn rejects_empty_clue_text() {
    let mut value = minimal();
    value["clues"][0]["text"] = json!([]);
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("clues[0].text"));
  }

  #[test]
  fn rejects_unknown_cell_type() {
    let mut value = minimal();
    value["cells"][0]["type"] = json!(7);
    let err = parse(value).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
  }

  #[test]
  fn accepts_circled_cell_type() {
    let mut value = minimal();
    value["cells"][0]["type"] = json!(2);
    let doc = parse(value).unwrap();
    assert_eq!(doc.cells[0].cell_type, Some(CellType::Circled));
  }
}
