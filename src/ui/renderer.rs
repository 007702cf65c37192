/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One grid cell is drawn as a block of `scale` rows by `2 * scale`
/// columns, so the map grows with the terminal. The scale lives on the
/// world and is refit whenever the terminal size changes.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Occupant;
use crate::sim::world::{Phase, SessionState, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, also used
    /// for `Clear`, so gaps between rows match the cells.
    const BASE_BG: Color = Color::Rgb { r: 14, g: 22, b: 38 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer; differs from any real cell.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Terminal columns per grid cell at scale 1.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, message + gap + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 4;

const HUD_BG: Color = Color::Rgb { r: 20, g: 30, b: 70 };
const MSG_BG: Color = Color::Rgb { r: 170, g: 210, b: 240 };
const ICE: Color = Color::Rgb { r: 150, g: 200, b: 230 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    last_level: Option<usize>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            last_level: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        // Refit scale when the terminal or the level changed
        let viewport = (self.term_w, self.term_h.saturating_sub(RESERVED_ROWS));
        if world.viewport != viewport {
            world.set_viewport(viewport.0, viewport.1);
        }

        let level = world.loaded.then_some(world.current_level);
        if self.last_phase != Some(world.phase) || self.last_level != level {
            self.invalidate()?;
            self.last_phase = Some(world.phase);
            self.last_level = level;
        }

        self.compose(world);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    fn compose(&mut self, world: &WorldState) {
        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => {
                self.compose_game(world);
                if world.state() == SessionState::Paused {
                    self.compose_pause_overlay(world);
                }
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let scale = w.scale.max(1);

        // ── HUD row ──
        let (name, author) = w.current_def()
            .map(|d| (d.name.as_str(), d.author.as_str()))
            .unwrap_or(("", ""));
        let players = w.players().count();
        let finished = w.players().filter(|p| p.finished).count();
        let by = if author.is_empty() { String::new() } else { format!(" by {author}") };
        let hud = format!(
            " Level {}/{}  {}{}   Tick:{:<5}  Home:{}/{} ",
            w.current_level + 1, w.levels.len(),
            name, by,
            w.tick, finished, players,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        let map_cols = w.grid.width * CELL_W * scale;
        let left = self.front.width.saturating_sub(map_cols) / 2;
        for gy in 0..w.grid.height {
            for gx in 0..w.grid.width {
                self.compose_cell(w, gx, gy, left + gx * CELL_W * scale, MAP_ROW + gy * scale, scale);
            }
        }
        let map_bottom = MAP_ROW + w.grid.height * scale;

        // ── Message bar ──
        let msg_row = map_bottom + 1;
        let status = if w.is_level_complete() {
            if w.has_next_level() {
                "Solved!  SPACE: next level".to_string()
            } else {
                "All levels solved!  ESC: title".to_string()
            }
        } else {
            w.message.clone()
        };
        if !status.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, &status, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = map_bottom + 3;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD:Slide  R:Reset  P:Pause  T:Step  SPACE:Next  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Fill one grid cell's block of terminal cells.
    fn compose_cell(&mut self, w: &WorldState, gx: usize, gy: usize, col: usize, row: usize, scale: usize) {
        let (glyph, fg, bg) = match w.occupant_at(gx, gy) {
            Occupant::Wall  => ('█', Color::Rgb{r:90,g:100,b:120}, Color::Rgb{r:60,g:70,b:90}),
            Occupant::Floor => (' ', ICE, Color::Rgb{r:200,g:225,b:240}),
            Occupant::Goal  => ('◎', Color::Rgb{r:20,g:140,b:60}, Color::Rgb{r:150,g:230,b:170}),
            Occupant::Player(i) => {
                let done = w.actors.get(i).map_or(false, |a| a.finished);
                let bg = if done { Color::Rgb{r:150,g:230,b:170} } else { Color::Rgb{r:200,g:225,b:240} };
                ('@', Color::Rgb{r:200,g:30,b:60}, bg)
            }
            Occupant::Box(_) => ('▣', Color::Rgb{r:240,g:220,b:170}, Color::Rgb{r:140,g:90,b:40}),
        };

        let cols = CELL_W * scale;
        for dy in 0..scale {
            for dx in 0..cols {
                let ch = if glyph == '█' {
                    glyph
                } else if dy == scale / 2 && dx == cols / 2 - 1 {
                    glyph
                } else {
                    ' '
                };
                self.front.set(col + dx, row + dy, Cell::new(ch, fg, bg));
            }
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  ___ _ _    _     _             ",
            r" / __| (_)__| |___| |__  _____ __",
            r" \__ \ | / _` / -_) '_ \/ _ \ \ /",
            r" |___/_|_\__,_\___|_.__/\___/_\_\",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, ICE, Color::Reset);
        }

        let tagline = "── push the boxes, mind the ice ──";
        self.front.put_str(2, 7, tagline, Color::Rgb{r:120,g:160,b:200}, Color::Reset);

        let menu_base = 10;
        let hi = Color::Rgb{r:120,g:255,b:160};
        self.front.put_str(8, menu_base, "ENTER   Play", hi, Color::Reset);
        self.front.put_str(8, menu_base + 1, "ESC/Q   Quit", Color::White, Color::Reset);

        let info = format!("        {} levels", w.levels.len());
        self.front.put_str(8, menu_base + 3, &info, Color::DarkGrey, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Slide all players",
            "  R  Reset level     P  Pause",
            "  T  Single step     SPACE  Next level",
            "  ESC  Back to title",
        ];
        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { ICE } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }

        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            if msg_row > help_base + help.len() {
                self.front.fill_row(msg_row, MSG_BG);
                self.front.put_str(1, msg_row, &w.message, Color::Black, MSG_BG);
            }
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb{r:30,g:40,b:60};
        let blink = (w.anim_tick / 8) % 2 == 0;

        let box_w = 30_usize.min(self.front.width);
        let box_h = 7_usize;
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, dim));
            }
        }

        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + 9, box_y + 1, label, ICE, dim);
        self.front.put_str(box_x + 3, box_y + 3, "P  Resume    T  Step", Color::White, dim);
        self.front.put_str(box_x + 3, box_y + 4, "R  Reset     ESC Title", Color::White, dim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelDef;
    use crate::sim::step;

    fn playing(src: &str) -> WorldState {
        let def = LevelDef { name: "t".into(), author: "me".into(), source: src.into() };
        let mut w = WorldState::new(vec![def]);
        step::start_game(&mut w).expect("level loads");
        w
    }

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width).map(|x| buf.get(x, y).ch).collect()
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut buf = FrameBuffer::new(4, 1);
        buf.put_str(2, 0, "abc", Color::White, Color::Reset);
        assert_eq!(row_text(&buf, 0), "  ab");
        assert_eq!(buf.get(2, 0).bg, Cell::BASE_BG);
    }

    #[test]
    fn game_screen_draws_map_at_scale_one() {
        let mut w = playing("1111\n1239\n1111\n");
        w.set_viewport(8, 3);
        assert_eq!(w.scale, 1);

        let mut r = Renderer::new();
        r.front.resize(40, 12);
        r.compose(&w);

        assert!(row_text(&r.front, HUD_ROW).contains("Level 1/1  t by me"));
        // 8 map columns centered in 40
        let map: String = row_text(&r.front, MAP_ROW).chars().skip(16).take(8).collect();
        assert_eq!(map, "████████");
        let mid: Vec<char> = row_text(&r.front, MAP_ROW + 1).chars().collect();
        assert_eq!(mid[18], '@');
        assert_eq!(mid[20], '▣');
        assert_eq!(mid[22], '◎');
    }

    #[test]
    fn scaled_cells_fill_a_block() {
        let mut w = playing("2\n");
        w.set_viewport(4, 2);
        assert_eq!(w.scale, 2);

        let mut r = Renderer::new();
        r.front.resize(4, 10);
        r.compose(&w);

        // 2 rows × 4 columns, glyph near the middle
        assert_eq!(row_text(&r.front, MAP_ROW), "    ");
        assert_eq!(row_text(&r.front, MAP_ROW + 1), " @  ");
        assert_ne!(r.front.get(0, MAP_ROW).bg, Cell::BASE_BG);
    }

    #[test]
    fn solved_level_shows_prompt() {
        let mut w = playing("1291\n");
        w.actors[0].finished = true;
        w.set_viewport(8, 1);

        let mut r = Renderer::new();
        r.front.resize(40, 10);
        r.compose(&w);
        let msg = row_text(&r.front, MAP_ROW + 1 + 1);
        assert!(msg.contains("All levels solved!"));
    }
}
