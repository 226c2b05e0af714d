// src/testcard.rs

//! A small built-in engine: a "lights out" board.
//!
//! Pressing a tile toggles it and its orthogonal neighbours; the board is
//! solved when every light is off. It exercises every drawing primitive,
//! the status bar, presets and the animation timer, and is what the binary
//! opens.
//!
//! This is a demo and test engine, not part of the front end's API. Real
//! puzzles implement [`Midend`] in their own crates.

use log::{debug, info};

use crate::fonts::FontFamily;
use crate::midend::{Command, Midend};
use crate::render::{Align, DrawingApi};

const TILE: i32 = 32;
const BORDER: i32 = 16;
const FLASH_SECS: f32 = 0.3;

const COL_BACKGROUND: usize = 0;
const COL_GRID: usize = 1;
const COL_LIT: usize = 2;
const COL_UNLIT: usize = 3;
const COL_CURSOR: usize = 4;
const COL_TEXT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCardParams {
    pub size: usize,
}

impl Default for TestCardParams {
    fn default() -> Self {
        Self { size: 5 }
    }
}

#[derive(Debug, Clone)]
pub struct TestCard {
    params: TestCardParams,
    initial: Vec<bool>,
    lit: Vec<bool>,
    cursor: (usize, usize),
    undo: Vec<Vec<bool>>,
    redo: Vec<Vec<bool>>,
    seed: u64,
    flash: Option<f32>,
}

impl Default for TestCard {
    fn default() -> Self {
        Self::new(TestCardParams::default())
    }
}

impl TestCard {
    pub fn new(params: TestCardParams) -> Self {
        let cells = params.size * params.size;
        Self {
            params,
            initial: vec![false; cells],
            lit: vec![false; cells],
            cursor: (0, 0),
            undo: Vec::new(),
            redo: Vec::new(),
            seed: 0x2545_f491_4f6c_dd1d,
            flash: None,
        }
    }

    pub fn lit(&self) -> &[bool] {
        &self.lit
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn moves(&self) -> usize {
        self.undo.len()
    }

    pub fn is_solved(&self) -> bool {
        self.lit.iter().all(|l| !l)
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_some()
    }

    /// Serialised board, one `0`/`1` per tile in row order.
    pub fn description(&self) -> String {
        self.lit.iter().map(|&l| if l { '1' } else { '0' }).collect()
    }

    fn next_random(&mut self) -> u64 {
        // xorshift64
        let mut x = self.seed;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.seed = x;
        x
    }

    fn toggle(lit: &mut [bool], size: usize, x: usize, y: usize) {
        let mut flip = |cx: usize, cy: usize| lit[cy * size + cx] = !lit[cy * size + cx];
        flip(x, y);
        if x > 0 {
            flip(x - 1, y);
        }
        if x + 1 < size {
            flip(x + 1, y);
        }
        if y > 0 {
            flip(x, y - 1);
        }
        if y + 1 < size {
            flip(x, y + 1);
        }
    }

    fn tile_at(&self, px: i32, py: i32) -> Option<(usize, usize)> {
        let (gx, gy) = (px - BORDER, py - BORDER);
        if gx < 0 || gy < 0 {
            return None;
        }
        let (tx, ty) = ((gx / TILE) as usize, (gy / TILE) as usize);
        (tx < self.params.size && ty < self.params.size).then_some((tx, ty))
    }

    fn play(&mut self, fe: &mut dyn DrawingApi, x: usize, y: usize, neighbours: bool) {
        self.undo.push(self.lit.clone());
        self.redo.clear();
        if neighbours {
            Self::toggle(&mut self.lit, self.params.size, x, y);
        } else {
            let i = y * self.params.size + x;
            self.lit[i] = !self.lit[i];
        }
        if self.is_solved() {
            info!("Board solved in {} moves", self.moves());
            self.flash = Some(0.0);
            fe.activate_timer();
        }
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let max = self.params.size as i32 - 1;
        let x = (self.cursor.0 as i32 + dx).clamp(0, max);
        let y = (self.cursor.1 as i32 + dy).clamp(0, max);
        self.cursor = (x as usize, y as usize);
    }

    fn update_status(&self, fe: &mut dyn DrawingApi) {
        let lit = self.lit.iter().filter(|l| **l).count();
        let text = if self.is_solved() {
            format!("Solved in {} moves", self.moves())
        } else {
            format!("Moves: {}  Lights on: {}", self.moves(), lit)
        };
        fe.status_bar(&text);
    }

    fn paint(&self, fe: &mut dyn DrawingApi) {
        let (w, h) = self.size();
        let size = self.params.size;
        let flashing = self.flash.is_some_and(|t| ((t / 0.1) as i32) % 2 == 0);

        fe.start_draw();
        fe.draw_rect(0, 0, w, h, COL_BACKGROUND);
        for ty in 0..size {
            for tx in 0..size {
                let x = BORDER + tx as i32 * TILE;
                let y = BORDER + ty as i32 * TILE;
                let colour = if self.lit[ty * size + tx] != flashing {
                    COL_LIT
                } else {
                    COL_UNLIT
                };
                fe.draw_rect(x + 1, y + 1, TILE - 1, TILE - 1, colour);
                fe.draw_rect_outline(x, y, TILE + 1, TILE + 1, COL_GRID);
            }
        }

        // Cursor: a diamond clipped to its tile.
        let cx = BORDER + self.cursor.0 as i32 * TILE;
        let cy = BORDER + self.cursor.1 as i32 * TILE;
        let mid = TILE / 2;
        fe.clip(cx + 1, cy + 1, TILE - 1, TILE - 1);
        fe.draw_polygon(
            &[
                cx + mid,
                cy + 4,
                cx + TILE - 4,
                cy + mid,
                cx + mid,
                cy + TILE - 4,
                cx + 4,
                cy + mid,
            ],
            false,
            COL_CURSOR,
        );
        fe.unclip();

        // Frame.
        let right = BORDER + size as i32 * TILE;
        fe.draw_line(BORDER - 2, BORDER - 2, right + 2, BORDER - 2, COL_GRID);
        fe.draw_line(BORDER - 2, right + 2, right + 2, right + 2, COL_GRID);

        fe.draw_text(
            w / 2,
            h - BORDER / 2,
            FontFamily::Variable,
            BORDER / 2 + 2,
            Align::centred(),
            COL_TEXT,
            &format!("{}x{}", size, size),
        );
        fe.end_draw();
    }
}

impl Midend for TestCard {
    type Params = TestCardParams;

    fn new_game(&mut self, saved: Option<&str>) {
        let size = self.params.size;
        let cells = size * size;
        let restored = saved.filter(|s| s.len() == cells && s.chars().all(|c| c == '0' || c == '1'));
        self.lit = match restored {
            Some(s) => s.chars().map(|c| c == '1').collect(),
            None => {
                let mut lit = vec![false; cells];
                // Random presses from the solved state keep the board solvable.
                for _ in 0..cells {
                    let i = (self.next_random() % cells as u64) as usize;
                    Self::toggle(&mut lit, size, i % size, i / size);
                }
                if lit.iter().all(|l| !l) {
                    Self::toggle(&mut lit, size, size / 2, size / 2);
                }
                lit
            }
        };
        self.initial = self.lit.clone();
        self.undo.clear();
        self.redo.clear();
        self.cursor = (0, 0);
        self.flash = None;
        debug!("New {}x{} board {}", size, size, self.description());
    }

    fn size(&self) -> (i32, i32) {
        let side = 2 * BORDER + self.params.size as i32 * TILE + 1;
        (side, side + BORDER)
    }

    fn num_presets(&self) -> usize {
        2
    }

    fn fetch_preset(&self, index: usize) -> Option<(String, Self::Params)> {
        let size = match index {
            0 => 5,
            1 => 8,
            _ => return None,
        };
        Some((format!("{size}x{size}"), TestCardParams { size }))
    }

    fn colours(&mut self, fe: &dyn DrawingApi) -> Vec<f32> {
        let [r, g, b] = fe.default_colour();
        vec![
            r, g, b, // background
            0.0, 0.0, 0.0, // grid
            1.0, 0.85, 0.2, // lit
            0.3, 0.3, 0.35, // unlit
            0.9, 0.1, 0.1, // cursor
            0.0, 0.0, 0.0, // text
        ]
    }

    fn wants_statusbar(&self) -> bool {
        true
    }

    fn process_key(&mut self, fe: &mut dyn DrawingApi, x: i32, y: i32, command: Command) -> bool {
        match command {
            Command::Char(b'q') | Command::Char(b'Q') => return false,
            Command::Char(b'n') => self.new_game(None),
            Command::Char(b'r') => {
                self.lit = self.initial.clone();
                self.undo.clear();
                self.redo.clear();
                self.flash = None;
            }
            Command::Char(b'u') => {
                if let Some(prev) = self.undo.pop() {
                    self.redo.push(std::mem::replace(&mut self.lit, prev));
                }
            }
            Command::Char(0x12) => {
                if let Some(next) = self.redo.pop() {
                    self.undo.push(std::mem::replace(&mut self.lit, next));
                }
            }
            Command::Char(b' ') | Command::Char(b'\r') => {
                let (cx, cy) = self.cursor;
                self.play(fe, cx, cy, true);
            }
            Command::LeftButton | Command::RightButton => {
                let Some((tx, ty)) = self.tile_at(x, y) else {
                    return true;
                };
                self.cursor = (tx, ty);
                self.play(fe, tx, ty, command == Command::LeftButton);
            }
            Command::MiddleButton => {
                if let Some(tile) = self.tile_at(x, y) {
                    self.cursor = tile;
                }
            }
            Command::CursorUp => self.move_cursor(0, -1),
            Command::CursorDown => self.move_cursor(0, 1),
            Command::CursorLeft => self.move_cursor(-1, 0),
            Command::CursorRight => self.move_cursor(1, 0),
            Command::CursorUpLeft => self.move_cursor(-1, -1),
            Command::CursorDownLeft => self.move_cursor(-1, 1),
            Command::CursorUpRight => self.move_cursor(1, -1),
            Command::CursorDownRight => self.move_cursor(1, 1),
            Command::Char(_) => return true,
        }
        self.redraw(fe);
        true
    }

    fn timer(&mut self, fe: &mut dyn DrawingApi, elapsed: f32) {
        let Some(t) = self.flash.as_mut() else {
            fe.deactivate_timer();
            return;
        };
        *t += elapsed;
        if *t >= FLASH_SECS {
            self.flash = None;
            fe.deactivate_timer();
        }
        self.paint(fe);
    }

    fn redraw(&mut self, fe: &mut dyn DrawingApi) {
        self.paint(fe);
        self.update_status(fe);
    }

    fn params(&self) -> Self::Params {
        self.params
    }

    fn set_params(&mut self, params: &Self::Params) {
        *self = Self {
            seed: self.seed,
            ..Self::new(*params)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_boards_are_never_already_solved() {
        let mut card = TestCard::default();
        for _ in 0..20 {
            card.new_game(None);
            assert!(!card.is_solved());
        }
    }

    #[test]
    fn saved_description_round_trips() {
        let mut card = TestCard::default();
        card.new_game(None);
        let saved = card.description();
        let mut other = TestCard::default();
        other.new_game(Some(&saved));
        assert_eq!(other.lit(), card.lit());
    }

    #[test]
    fn malformed_description_starts_a_fresh_board() {
        let mut card = TestCard::default();
        card.new_game(Some("01"));
        assert_eq!(card.lit().len(), 25);
        assert!(!card.is_solved());
    }

    #[test]
    fn size_follows_the_preset() {
        let mut card = TestCard::default();
        assert_eq!(card.size(), (2 * BORDER + 5 * TILE + 1, 2 * BORDER + 5 * TILE + 1 + BORDER));
        let (_, params) = card.fetch_preset(1).unwrap();
        card.set_params(&params);
        assert_eq!(card.params().size, 8);
        assert_eq!(card.size().0, 2 * BORDER + 8 * TILE + 1);
    }

    #[test]
    fn tiles_are_hit_inside_the_grid_only() {
        let card = TestCard::default();
        assert_eq!(card.tile_at(BORDER, BORDER), Some((0, 0)));
        assert_eq!(card.tile_at(BORDER + TILE, BORDER + 2 * TILE + 5), Some((1, 2)));
        assert_eq!(card.tile_at(BORDER - 1, BORDER), None);
        assert_eq!(card.tile_at(BORDER + 5 * TILE, BORDER), None);
    }
}
