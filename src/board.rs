//! Tic-tac-toe style board: an n x n grid where a full row, column or main
//! diagonal of one mark wins. X always moves first.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, DOMAIN_BOARD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    X,
    O,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::X => Side::O,
            Side::O => Side::X,
        }
    }

    pub fn to_cell(self) -> Cell {
        match self {
            Side::X => Cell::X,
            Side::O => Cell::O,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::X => "X",
            Side::O => "O",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | ' ' | '_' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' => Some(Cell::O),
            _ => None,
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Side::X),
            Cell::O => Some(Side::O),
        }
    }

    fn code(self) -> u32 {
        match self {
            Cell::Empty => 0,
            Cell::X => 1,
            Cell::O => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Win(Side),
    Tie,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    to_move: Side,
    history: Vec<Coord>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Empty 3x3 board, X to move.
    pub fn new() -> Self {
        Board {
            size: 3,
            cells: vec![Cell::Empty; 9],
            to_move: Side::X,
            history: Vec::new(),
        }
    }

    pub fn with_size(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::config("board size must be at least 1"));
        }
        Ok(Board {
            size,
            cells: vec![Cell::Empty; size * size],
            to_move: Side::X,
            history: Vec::new(),
        })
    }

    /// Parse a square position, one string per row (`X`, `O`, `.` or space).
    ///
    /// The side to move follows from the mark counts: X moves first, so X has
    /// either as many marks as O (X to move) or exactly one more (O to move).
    /// The result carries no move history.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(Error::config("board has no rows"));
        }

        let mut cells = Vec::with_capacity(size * size);
        for (r, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.as_ref().chars().collect();
            if chars.len() != size {
                return Err(Error::config(format!(
                    "row {r} has {} cells, expected {size}",
                    chars.len()
                )));
            }
            for (c, ch) in chars.into_iter().enumerate() {
                let cell = Cell::from_char(ch).ok_or_else(|| {
                    Error::config(format!("invalid symbol '{ch}' at ({r}, {c})"))
                })?;
                cells.push(cell);
            }
        }

        let x = cells.iter().filter(|&&c| c == Cell::X).count();
        let o = cells.iter().filter(|&&c| c == Cell::O).count();
        let to_move = if x == o {
            Side::X
        } else if x == o + 1 {
            Side::O
        } else {
            return Err(Error::config(format!(
                "impossible mark counts X={x}, O={o} (X moves first)"
            )));
        };

        Ok(Board {
            size,
            cells,
            to_move,
            history: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn side_to_move(&self) -> Side {
        self.to_move
    }

    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    /// Moves played on this board object, oldest first.
    pub fn history(&self) -> &[Coord] {
        &self.history
    }

    /// Marks on the board, including any the position was parsed with.
    pub fn move_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != Cell::Empty).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.move_count()
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if coord.row < self.size && coord.col < self.size {
            Some(coord.row * self.size + coord.col)
        } else {
            None
        }
    }

    /// Empty cells in row-major order.
    pub fn legal_moves(&self) -> Vec<Coord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == Cell::Empty)
            .map(|(idx, _)| Coord::new(idx / self.size, idx % self.size))
            .collect()
    }

    /// Place the mover's mark and pass the turn.
    pub fn play(&mut self, coord: Coord) -> Result<()> {
        let idx = self
            .index(coord)
            .ok_or_else(|| Error::illegal_move(coord, "outside the board"))?;
        if self.cells[idx] != Cell::Empty {
            return Err(Error::illegal_move(coord, "cell is occupied"));
        }
        self.cells[idx] = self.to_move.to_cell();
        self.history.push(coord);
        self.to_move = self.to_move.opponent();
        Ok(())
    }

    /// Take back the most recent move played on this board.
    pub fn undo(&mut self) -> Result<Coord> {
        let coord = self.history.pop().ok_or(Error::NothingToUndo)?;
        match self.index(coord) {
            Some(idx) => self.cells[idx] = Cell::Empty,
            None => {
                return Err(Error::InvariantViolation {
                    message: format!("history holds off-board move {coord}"),
                })
            }
        }
        self.to_move = self.to_move.opponent();
        Ok(coord)
    }

    pub fn successors(&self) -> Vec<(Coord, Board)> {
        self.legal_moves()
            .into_iter()
            .filter_map(|mv| {
                let mut child = self.clone();
                child.play(mv).ok().map(|_| (mv, child))
            })
            .collect()
    }

    // owner of the line of `size` cells starting at `start`, stepping by `step`
    fn line_owner(&self, start: usize, step: usize) -> Option<Side> {
        let first = self.cells[start].side()?;
        (1..self.size)
            .all(|k| self.cells[start + k * step] == first.to_cell())
            .then_some(first)
    }

    fn winners(&self) -> (bool, bool) {
        let n = self.size;
        let rows = (0..n).map(|r| (r * n, 1));
        let cols = (0..n).map(|c| (c, n));
        let diagonals = [(0, n + 1), (n - 1, n - 1)];

        let mut x = false;
        let mut o = false;
        for (start, step) in rows.chain(cols).chain(diagonals) {
            match self.line_owner(start, step) {
                Some(Side::X) => x = true,
                Some(Side::O) => o = true,
                None => {}
            }
        }
        (x, o)
    }

    /// Fails when both sides own a complete line, which no legal game reaches.
    pub fn status(&self) -> Result<GameStatus> {
        match self.winners() {
            (true, true) => Err(Error::InvariantViolation {
                message: format!("both sides own a winning line\n{self}"),
            }),
            (true, false) => Ok(GameStatus::Win(Side::X)),
            (false, true) => Ok(GameStatus::Win(Side::O)),
            (false, false) if self.cells.contains(&Cell::Empty) => Ok(GameStatus::InProgress),
            (false, false) => Ok(GameStatus::Tie),
        }
    }

    /// Digest of the marks only; history and turn are not part of it.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_grid(
            DOMAIN_BOARD,
            self.size,
            self.size,
            self.cells.iter().map(|c| c.code()),
        )
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.chunks(self.size).enumerate() {
            if r > 0 {
                let rule = vec!["---"; self.size].join("+");
                writeln!(f, "{rule}")?;
            }
            let marks: Vec<String> = row.iter().map(|c| format!(" {} ", c.to_char())).collect();
            writeln!(f, "{}", marks.join("|"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_derives_side_to_move() {
        let board = Board::from_rows(&["X..", ".O.", "..X"]).unwrap();
        assert_eq!(board.side_to_move(), Side::O);
        assert_eq!(board.move_count(), 3);
        assert_eq!(board.cell(Coord::new(1, 1)), Some(Cell::O));
        assert_eq!(board.cell(Coord::new(3, 0)), None);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            Board::from_rows(&["X..", "..", "..."]),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            Board::from_rows(&["X?.", "...", "..."]),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            Board::from_rows(&["OO.", "...", "..."]),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            Board::from_rows::<&str>(&[]),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn occupied_cell_is_illegal() {
        let mut board = Board::new();
        board.play(Coord::new(1, 1)).unwrap();
        let before = board.clone();
        assert!(matches!(
            board.play(Coord::new(1, 1)),
            Err(Error::IllegalMove { .. })
        ));
        assert!(matches!(
            board.play(Coord::new(0, 3)),
            Err(Error::IllegalMove { .. })
        ));
        assert_eq!(board, before);
    }

    #[test]
    fn successors_play_one_mark_each() {
        let board = Board::from_rows(&["X..", ".O.", "..."]).unwrap();
        let children = board.successors();
        assert_eq!(children.len(), 7);
        for (mv, mut child) in children {
            assert_eq!(child.size(), board.size());
            assert_eq!(child.side_to_move(), board.side_to_move().opponent());
            assert_eq!(child.history().last(), Some(&mv));
            assert_eq!(child.cell(mv), Some(Cell::O));
            assert_eq!(child.undo().unwrap(), mv);
            assert_eq!(child, board);
        }
    }

    #[test]
    fn play_then_undo_restores_board() {
        let mut board = Board::from_rows(&["X..", ".O.", "..."]).unwrap();
        let before = board.clone();
        for mv in board.legal_moves() {
            board.play(mv).unwrap();
            assert_eq!(board.undo().unwrap(), mv);
            assert_eq!(board, before);
        }
        assert_eq!(board.undo(), Err(Error::NothingToUndo));
    }

    #[test]
    fn status_detects_lines() {
        let row = Board::from_rows(&["XXX", "OO.", "..."]).unwrap();
        assert_eq!(row.status().unwrap(), GameStatus::Win(Side::X));

        let column = Board::from_rows(&["XO.", "XO.", ".OX"]).unwrap();
        assert_eq!(column.status().unwrap(), GameStatus::Win(Side::O));

        let anti = Board::from_rows(&["XXO", "XO.", "O.."]).unwrap();
        assert_eq!(anti.status().unwrap(), GameStatus::Win(Side::O));

        let tie = Board::from_rows(&["XOX", "XOO", "OXX"]).unwrap();
        assert_eq!(tie.status().unwrap(), GameStatus::Tie);

        assert_eq!(Board::new().status().unwrap(), GameStatus::InProgress);
    }

    #[test]
    fn double_winner_is_an_invariant_violation() {
        let board = Board::from_rows(&["XXX", "OOO", "..."]).unwrap();
        assert!(matches!(
            board.status(),
            Err(Error::InvariantViolation { .. })
        ));
    }

    #[test]
    fn fingerprint_ignores_move_order() {
        let mut a = Board::new();
        let mut b = Board::new();
        for mv in [Coord::new(0, 0), Coord::new(1, 1), Coord::new(2, 2)] {
            a.play(mv).unwrap();
        }
        for mv in [Coord::new(2, 2), Coord::new(1, 1), Coord::new(0, 0)] {
            b.play(mv).unwrap();
        }
        assert_ne!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), Board::new().fingerprint());
    }

    #[test]
    fn larger_boards_need_full_lines() {
        let board = Board::from_rows(&["XXX.", "OOO.", "....", "...."]).unwrap();
        assert_eq!(board.status().unwrap(), GameStatus::InProgress);
        let single = Board::with_size(1).unwrap();
        assert_eq!(single.legal_moves(), vec![Coord::new(0, 0)]);
        assert!(Board::with_size(0).is_err());
    }
}
