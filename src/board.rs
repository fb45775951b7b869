//! Board topology and movement resolution.
//!
//! The board has 29 cells: a 20-cell outer ring (`00`..`19`) and two
//! diagonal shortcuts that cross at a shared centre cell (`cc`).
//!
//! ```text
//!     10 09 08 07 06 05
//!        xx       aa
//!     11             04
//!          yy    bb
//!     12             03
//!            cc
//!     13             02
//!          uu    pp
//!     14             01
//!        vv       qq
//!     15 16 17 18 19 00
//! ```
//!
//! - Landing on `05` sends the next move down `aa -> bb -> cc -> uu -> vv`,
//!   which rejoins the ring at `15`.
//! - Landing on `10` sends the next move down `xx -> yy -> cc -> pp -> qq`,
//!   which ends at `00`.
//! - A move that *starts* on `cc` always heads for `00` via `pp -> qq`.
//!
//! Movement is a pure table lookup. There is no graph walk: every row of the
//! forward table already encodes which branch a piece standing on that cell
//! follows, so passing through `05` or `10` mid-move never diverts a piece.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::constants::{BACK_STEP, MAX_STEPS, NUM_CELLS, OUTER_CELLS};
use crate::error::ParseCellError;

/// A cell on the board.
///
/// Indices `0..20` are the outer ring in travel order, `20..29` are the
/// diagonal cells `aa bb cc pp qq xx yy uu vv`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell(u8);

const LABELS: [&str; NUM_CELLS] = [
    "00", "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12", "13", "14",
    "15", "16", "17", "18", "19", "aa", "bb", "cc", "pp", "qq", "xx", "yy", "uu", "vv",
];

impl Cell {
    /// Start cell, which is also the finish.
    pub const START: Cell = Cell(0);
    /// First branch cell (`05`), entrance of the `aa` diagonal.
    pub const FIRST_BRANCH: Cell = Cell(5);
    /// Second branch cell (`10`), entrance of the `xx` diagonal.
    pub const SECOND_BRANCH: Cell = Cell(10);
    /// Ring cell where the `aa` diagonal rejoins the outer ring.
    pub const RING_EXIT: Cell = Cell(15);

    pub const AA: Cell = Cell(20);
    pub const BB: Cell = Cell(21);
    /// Crossroad shared by both diagonals.
    pub const CC: Cell = Cell(22);
    pub const PP: Cell = Cell(23);
    pub const QQ: Cell = Cell(24);
    pub const XX: Cell = Cell(25);
    pub const YY: Cell = Cell(26);
    pub const UU: Cell = Cell(27);
    pub const VV: Cell = Cell(28);

    /// The outer-ring cell `n` (0..20).
    pub const fn outer(n: u8) -> Cell {
        assert!((n as usize) < OUTER_CELLS, "outer ring has 20 cells");
        Cell(n)
    }

    /// Position of this cell in the lookup tables.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Two-character board label (`"00"`, `"cc"`, ...).
    pub fn label(self) -> &'static str {
        LABELS[self.index()]
    }

    pub const fn is_outer(self) -> bool {
        (self.0 as usize) < OUTER_CELLS
    }

    pub const fn is_diagonal(self) -> bool {
        !self.is_outer()
    }

    /// Every cell, ring first.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..NUM_CELLS as u8).map(Cell)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cell {
    type Err = ParseCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LABELS
            .iter()
            .position(|&label| label.eq_ignore_ascii_case(s.trim()))
            .map(|i| Cell(i as u8))
            .ok_or_else(|| ParseCellError(s.to_string()))
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// =============================================================================
// Lookup Tables
// =============================================================================

type ForwardRow = [Option<Cell>; MAX_STEPS as usize];

/// Build a forward row. Missing trailing entries overshoot the finish.
const fn fwd(dests: &[Cell]) -> ForwardRow {
    let mut row = [None; MAX_STEPS as usize];
    let mut i = 0;
    while i < dests.len() {
        row[i] = Some(dests[i]);
        i += 1;
    }
    row
}

const fn o(n: u8) -> Cell {
    Cell::outer(n)
}

const AA: Cell = Cell::AA;
const BB: Cell = Cell::BB;
const CC: Cell = Cell::CC;
const PP: Cell = Cell::PP;
const QQ: Cell = Cell::QQ;
const XX: Cell = Cell::XX;
const YY: Cell = Cell::YY;
const UU: Cell = Cell::UU;
const VV: Cell = Cell::VV;

/// `FORWARD[cell][steps - 1]` is the destination of a forward move.
const FORWARD: [ForwardRow; NUM_CELLS] = [
    fwd(&[o(1), o(2), o(3), o(4), o(5)]),      // 00
    fwd(&[o(2), o(3), o(4), o(5), o(6)]),      // 01
    fwd(&[o(3), o(4), o(5), o(6), o(7)]),      // 02
    fwd(&[o(4), o(5), o(6), o(7), o(8)]),      // 03
    fwd(&[o(5), o(6), o(7), o(8), o(9)]),      // 04
    fwd(&[AA, BB, CC, UU, VV]),                // 05
    fwd(&[o(7), o(8), o(9), o(10), o(11)]),    // 06
    fwd(&[o(8), o(9), o(10), o(11), o(12)]),   // 07
    fwd(&[o(9), o(10), o(11), o(12), o(13)]),  // 08
    fwd(&[o(10), o(11), o(12), o(13), o(14)]), // 09
    fwd(&[XX, YY, CC, PP, QQ]),                // 10
    fwd(&[o(12), o(13), o(14), o(15), o(16)]), // 11
    fwd(&[o(13), o(14), o(15), o(16), o(17)]), // 12
    fwd(&[o(14), o(15), o(16), o(17), o(18)]), // 13
    fwd(&[o(15), o(16), o(17), o(18), o(19)]), // 14
    fwd(&[o(16), o(17), o(18), o(19), o(0)]),  // 15
    fwd(&[o(17), o(18), o(19), o(0)]),         // 16
    fwd(&[o(18), o(19), o(0)]),                // 17
    fwd(&[o(19), o(0)]),                       // 18
    fwd(&[o(0)]),                              // 19
    fwd(&[BB, CC, UU, VV, o(15)]),             // aa
    fwd(&[CC, UU, VV, o(15), o(16)]),          // bb
    fwd(&[PP, QQ, o(0)]),                      // cc
    fwd(&[QQ, o(0)]),                          // pp
    fwd(&[o(0)]),                              // qq
    fwd(&[YY, CC, PP, QQ, o(0)]),              // xx
    fwd(&[CC, PP, QQ, o(0)]),                  // yy
    fwd(&[VV, o(15), o(16), o(17), o(18)]),    // uu
    fwd(&[o(15), o(16), o(17), o(18), o(19)]), // vv
];

/// Single predecessor of every cell. `00` has none in this table.
const BACKWARD: [Option<Cell>; NUM_CELLS] = [
    None,        // 00
    Some(o(0)),  // 01
    Some(o(1)),  // 02
    Some(o(2)),  // 03
    Some(o(3)),  // 04
    Some(o(4)),  // 05
    Some(o(5)),  // 06
    Some(o(6)),  // 07
    Some(o(7)),  // 08
    Some(o(8)),  // 09
    Some(o(9)),  // 10
    Some(o(10)), // 11
    Some(o(11)), // 12
    Some(o(12)), // 13
    Some(o(13)), // 14
    Some(o(14)), // 15
    Some(o(15)), // 16
    Some(o(16)), // 17
    Some(o(17)), // 18
    Some(o(18)), // 19
    Some(o(5)),  // aa
    Some(AA),    // bb
    Some(BB),    // cc
    Some(CC),    // pp
    Some(PP),    // qq
    Some(o(10)), // xx
    Some(XX),    // yy
    Some(CC),    // uu
    Some(UU),    // vv
];

/// `00` is reached from the ring (`19`) and from the `xx` diagonal (`qq`).
static START_PREDECESSORS: [Cell; 2] = [o(19), QQ];

/// Cells from which the search agent may decline its remaining moves.
const LATE_PATH: [Cell; 10] = [XX, YY, CC, PP, QQ, o(15), o(16), o(17), o(18), o(19)];

static STANDARD: Board = Board {
    forward: FORWARD,
    backward: BACKWARD,
};

// =============================================================================
// Board
// =============================================================================

/// Read-only movement tables.
///
/// There is one instance for the whole process; games hold a `&'static Board`
/// so cloning a game never copies the tables.
#[derive(Debug)]
pub struct Board {
    forward: [ForwardRow; NUM_CELLS],
    backward: [Option<Cell>; NUM_CELLS],
}

impl Board {
    /// The standard board shared by every game.
    pub fn standard() -> &'static Board {
        &STANDARD
    }

    /// Resolve a move of `steps` from `cell`.
    ///
    /// `steps` is one of `-1, 1..=5`; `0` returns `cell` unchanged. Returns
    /// `None` when the move overshoots the finish, for backward moves from
    /// `00`, and for step values no throw can produce.
    pub fn resolve(&self, cell: Cell, steps: i8) -> Option<Cell> {
        match steps {
            0 => Some(cell),
            BACK_STEP => self.backward[cell.index()],
            1..=MAX_STEPS => self.forward[cell.index()][(steps - 1) as usize],
            _ => None,
        }
    }

    /// Every cell a backward move from `cell` may land on.
    ///
    /// Only `00` has two predecessors; every other cell has exactly the one
    /// entry of the backward table.
    pub fn back_do_destinations(&self, cell: Cell) -> &[Cell] {
        if cell == Cell::START {
            &START_PREDECESSORS
        } else {
            self.backward[cell.index()].as_slice()
        }
    }

    /// True if a piece landing here takes a diagonal on its next move.
    pub fn triggers_shortcut(&self, cell: Cell) -> bool {
        cell == Cell::FIRST_BRANCH || cell == Cell::SECOND_BRANCH
    }

    /// True for a piece back on `00` after having moved.
    pub fn is_finish(&self, cell: Cell, has_moved: bool) -> bool {
        cell == Cell::START && has_moved
    }

    /// Entry cell for a new piece thrown onto the board with `steps`.
    pub fn entry(&self, steps: i8) -> Option<Cell> {
        if (1..=MAX_STEPS).contains(&steps) {
            self.resolve(Cell::START, steps)
        } else {
            None
        }
    }

    /// Cells close enough to the finish that declining further moves is
    /// offered to the tree search.
    pub fn is_late_path(&self, cell: Cell) -> bool {
        LATE_PATH.contains(&cell)
    }
}
