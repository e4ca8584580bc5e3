use std::path::PathBuf;
use std::{fs, io};

use clap::Parser;
use crossterm::event::{
  self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
  KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
  DefaultTerminal, Frame,
  buffer::Buffer,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style, Stylize},
  text::Line,
  widgets::{Block, Padding, Paragraph, Widget, Wrap},
};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use xword::{Motion, Puzzle, Square};

const SQUARE_WIDTH: u16 = 7;
const SQUARE_HEIGHT: u16 = 3;

#[derive(Parser)]
#[command(name = "xwordtui", about = "Solve crossword puzzles in your terminal")]
struct Args {
  /// Path to a JSON puzzle document
  puzzle: PathBuf,

  /// Write debug logs to this file
  #[arg(long)]
  log: Option<PathBuf>,
}

fn main() -> io::Result<()> {
  let args = Args::parse();

  // The terminal belongs to the UI, so logs go to a file or nowhere.
  if let Some(path) = &args.log {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(file) = fs::File::create(path) {
      let _ = WriteLogger::init(LevelFilter::Debug, config, file);
    }
  }

  let mut app = App::new(args.puzzle);
  app.reload();

  let terminal = ratatui::init();
  crossterm::execute!(io::stdout(), EnableMouseCapture)?;
  let result = app.run(terminal);
  let _ = crossterm::execute!(io::stdout(), DisableMouseCapture);
  ratatui::restore();
  result
}

struct App {
  path: PathBuf,
  /// The currently loaded puzzle. Stays `None` until a document passes
  /// validation, and keeps its previous value when a reload fails.
  puzzle: Option<Puzzle>,
  /// Error text from the most recent failed load.
  status: Option<String>,
  /// Where the grid was drawn last frame, for mouse hit-testing.
  grid_area: Rect,
  running: bool,
}

impl App {
  fn new(path: PathBuf) -> Self {
    Self {
      path,
      puzzle: None,
      status: None,
      grid_area: Rect::ZERO,
      running: false,
    }
  }

  /// Loads (or re-loads) the puzzle document from disk. The swap is
  /// all-or-nothing: on any error the current puzzle, if there is one,
  /// stays displayed and interactive.
  fn reload(&mut self) {
    let loaded = fs::read_to_string(&self.path)
      .map_err(xword::Error::from)
      .and_then(|raw| Puzzle::load(&raw));
    match loaded {
      Ok(mut puzzle) => {
        if let Some(index) = puzzle.first_fillable() {
          puzzle.focus_cell(index);
        }
        log::info!("loaded '{}' from {}", puzzle.title(), self.path.display());
        self.puzzle = Some(puzzle);
        self.status = None;
      }
      Err(e) => {
        log::warn!("failed to load {}: {e}", self.path.display());
        self.status = Some(e.to_string());
      }
    }
  }

  fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
    self.running = true;
    while self.running {
      terminal.draw(|frame| self.draw(frame))?;
      self.handle_crossterm_events()?;
    }
    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    self.grid_area = grid_area(frame.area(), &self.puzzle);
    frame.render_widget(&*self, frame.area());
  }

  fn handle_crossterm_events(&mut self) -> io::Result<()> {
    match event::read()? {
      // it's important to check KeyEventKind::Press to avoid handling key release events
      Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
      Event::Mouse(mouse) => self.on_mouse_event(mouse),
      Event::Resize(_, _) => {}
      _ => {}
    }
    Ok(())
  }

  /// Handles the key events and updates the state of [`App`].
  ///
  /// Plain letters fill squares, so quitting and reloading live on Esc and
  /// the control chords.
  fn on_key_event(&mut self, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') => self.quit(),
        KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
        _ => {}
      }
      return;
    }

    match key.code {
      KeyCode::Esc => self.quit(),
      KeyCode::Char(' ') => {
        if let Some(puzzle) = &mut self.puzzle {
          puzzle.toggle_direction();
        }
      }
      KeyCode::Char(c) if c.is_ascii_alphabetic() => {
        self.with_active_cell(|puzzle, index| puzzle.type_char(index, c));
      }
      KeyCode::Backspace => self.with_active_cell(Puzzle::backspace),
      KeyCode::Delete => self.with_active_cell(Puzzle::delete),
      KeyCode::Left => self.with_active_cell(|p, i| p.arrow(i, Motion::Left)),
      KeyCode::Right => self.with_active_cell(|p, i| p.arrow(i, Motion::Right)),
      KeyCode::Up => self.with_active_cell(|p, i| p.arrow(i, Motion::Up)),
      KeyCode::Down => self.with_active_cell(|p, i| p.arrow(i, Motion::Down)),
      KeyCode::Tab => self.cycle_clue(1),
      KeyCode::BackTab => self.cycle_clue(-1),
      _ => {}
    }
  }

  fn with_active_cell(&mut self, f: impl FnOnce(&mut Puzzle, usize)) {
    if let Some(puzzle) = &mut self.puzzle {
      if let Some(index) = puzzle.active_cell() {
        f(puzzle, index);
      }
    }
  }

  /// Moves to the next (or previous) clue, walking the across list then the
  /// down list and wrapping around.
  fn cycle_clue(&mut self, step: isize) {
    let Some(puzzle) = &mut self.puzzle else { return };
    let lists = puzzle.model().clue_lists();
    let order: Vec<usize> = lists[0]
      .clue_indices
      .iter()
      .chain(lists[1].clue_indices.iter())
      .copied()
      .collect();
    if order.is_empty() {
      return;
    }

    let next = match puzzle
      .active_clue()
      .and_then(|k| order.iter().position(|&o| o == k))
    {
      Some(i) => (i as isize + step).rem_euclid(order.len() as isize) as usize,
      None => 0,
    };
    puzzle.click_clue(order[next]);
  }

  fn on_mouse_event(&mut self, mouse: MouseEvent) {
    let hit = self.hit_test(mouse.column, mouse.row);
    let Some(puzzle) = &mut self.puzzle else { return };
    match mouse.kind {
      MouseEventKind::Down(MouseButton::Left) => puzzle.pointer_press(hit),
      MouseEventKind::Up(MouseButton::Left) => puzzle.pointer_release(hit),
      _ => {}
    }
  }

  /// Maps a terminal coordinate to the grid cell drawn there, if any. The
  /// one-column/one-row gaps between squares count as misses, so a click in
  /// the gutter never targets a cell.
  fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
    let puzzle = self.puzzle.as_ref()?;
    let area = self.grid_area;
    if column < area.x || row < area.y {
      return None;
    }

    let dx = (column - area.x) as usize;
    let dy = (row - area.y) as usize;
    let col = dx / (SQUARE_WIDTH as usize + 1);
    let grid_row = dy / (SQUARE_HEIGHT as usize + 1);
    if col >= puzzle.width() || grid_row >= puzzle.height() {
      return None;
    }
    if dx % (SQUARE_WIDTH as usize + 1) >= SQUARE_WIDTH as usize {
      return None;
    }
    if dy % (SQUARE_HEIGHT as usize + 1) >= SQUARE_HEIGHT as usize {
      return None;
    }

    Some(grid_row * puzzle.width() + col)
  }

  /// Set running to false to quit the application.
  fn quit(&mut self) {
    self.running = false;
  }

  fn square_style(&self, puzzle: &Puzzle, index: usize) -> Style {
    let base = if puzzle.active_cell() == Some(index) {
      Style::new().bg(Color::LightRed)
    } else if puzzle.is_highlighted(index) {
      Style::new().bg(Color::LightYellow)
    } else {
      Style::new().bg(Color::White)
    };
    base.fg(Color::Black).add_modifier(Modifier::BOLD)
  }

  fn render_square(&self, puzzle: &Puzzle, index: usize, square_area: Rect, buf: &mut Buffer) {
    let square = puzzle.square(index);
    if square == Square::Block {
      Block::new()
        .style(Style::new().bg(Color::Black))
        .render(square_area, buf);
      return;
    }

    let style = self.square_style(puzzle, index);
    Block::new().style(style).render(square_area, buf);

    let cell = puzzle.model().cell(index);
    let top_row = Rect {
      height: 1,
      ..square_area
    };
    if let Some(label) = &cell.label {
      Paragraph::new(label.as_str())
        .style(style)
        .render(top_row, buf);
    }
    if cell.circled {
      Paragraph::new("○")
        .right_aligned()
        .style(style)
        .render(top_row, buf);
    }

    if let Square::Letter(c) = square {
      let letter_row = Rect {
        y: square_area.y + 1,
        height: 1,
        ..square_area
      };
      Paragraph::new(c.to_string())
        .centered()
        .style(style)
        .render(letter_row, buf);
    }
  }

  fn render_clue_panel(&self, puzzle: &Puzzle, area: Rect, buf: &mut Buffer) {
    let [current_area, lists_area] =
      Layout::vertical([Constraint::Length(7), Constraint::Percentage(100)]).areas(area);

    Paragraph::new(puzzle.current_clue().unwrap_or(""))
      .wrap(Wrap { trim: true })
      .block(
        Block::bordered()
          .title(Line::from("Current clue").centered())
          .padding(Padding::uniform(1)),
      )
      .render(current_area, buf);

    let [left_area, right_area] =
      Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(lists_area);

    for (list, list_area) in puzzle
      .model()
      .clue_lists()
      .iter()
      .zip([left_area, right_area])
    {
      let lines: Vec<Line> = list
        .clue_indices
        .iter()
        .map(|&k| {
          let clue = puzzle.model().clue(k);
          let line = Line::from(format!("{}. {}", clue.label, clue.text));
          if puzzle.active_clue() == Some(k) {
            line.style(Style::new().add_modifier(Modifier::REVERSED))
          } else if puzzle.secondary_clues().contains(&k) {
            line.style(Style::new().add_modifier(Modifier::UNDERLINED))
          } else {
            line
          }
        })
        .collect();

      Paragraph::new(lines)
        .block(Block::bordered().title(Line::from(list.name.as_str()).centered()))
        .render(list_area, buf);
    }
  }
}

impl Widget for &App {
  fn render(self, area: Rect, buf: &mut Buffer) {
    let (title_area, puzzle_area, clue_area, status_area) = areas(area);

    let mut title_spans = vec!["xword".bold().blue()];
    if let Some(puzzle) = &self.puzzle {
      title_spans.push(": ".bold());
      title_spans.push(puzzle.title().to_string().bold());
      if !puzzle.constructors().is_empty() {
        title_spans.push(format!(" by {}", puzzle.constructors().join(", ")).into());
      }
      if !puzzle.editor().is_empty() {
        title_spans.push(format!(", edited by {}", puzzle.editor()).into());
      }
      if !puzzle.publication_date().is_empty() {
        title_spans.push(format!(" ({})", puzzle.publication_date()).into());
      }
    }
    Line::from(title_spans).centered().render(title_area, buf);

    match &self.puzzle {
      Some(puzzle) => {
        let mut square_area = Rect {
          x: self.grid_area.x,
          y: self.grid_area.y,
          width: SQUARE_WIDTH,
          height: SQUARE_HEIGHT,
        };
        for row in 0..puzzle.height() {
          for col in 0..puzzle.width() {
            self.render_square(puzzle, row * puzzle.width() + col, square_area, buf);
            square_area.x += SQUARE_WIDTH + 1;
          }
          square_area.x = self.grid_area.x;
          square_area.y += SQUARE_HEIGHT + 1;
        }

        self.render_clue_panel(puzzle, clue_area, buf);
      }
      None => {
        Paragraph::new("No puzzle loaded. Press Ctrl-R to retry, or Esc to quit.")
          .centered()
          .render(puzzle_area, buf);
      }
    }

    let status = match &self.status {
      Some(error) => Line::from(error.as_str().red()),
      None => Line::from(
        "type to fill | arrows move | space or click toggles direction | Tab next clue | Ctrl-R reload | Esc quit",
      ),
    };
    status.render(status_area, buf);
  }
}

fn areas(area: Rect) -> (Rect, Rect, Rect, Rect) {
  let [title_area, main_area, status_area] = Layout::vertical([
    Constraint::Length(2),
    Constraint::Percentage(100),
    Constraint::Length(1),
  ])
  .areas(area);
  let [puzzle_area, clue_area] =
    Layout::horizontal([Constraint::Percentage(100), Constraint::Length(45)]).areas(main_area);
  (title_area, puzzle_area, clue_area, status_area)
}

/// The rectangle the grid is drawn in: the puzzle's footprint, centered in
/// the space left of the clue panel.
fn grid_area(frame_area: Rect, puzzle: &Option<Puzzle>) -> Rect {
  let Some(puzzle) = puzzle else {
    return Rect::ZERO;
  };
  let (_, puzzle_area, _, _) = areas(frame_area);
  center(
    puzzle_area,
    Constraint::Length(
      (puzzle.width() * (SQUARE_WIDTH as usize + 1))
        .try_into()
        .unwrap(),
    ),
    Constraint::Length(
      (puzzle.height() * (SQUARE_HEIGHT as usize + 1))
        .try_into()
        .unwrap(),
    ),
  )
}

/// https://ratatui.rs/recipes/layout/center-a-widget/
fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
  let [area] = Layout::horizontal([horizontal])
    .flex(Flex::Center)
    .areas(area);
  let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
  area
}
