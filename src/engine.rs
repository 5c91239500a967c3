// Chess rules core:
// - 8x8 grid of optional pieces (row 0 = black home rank, row 7 = white home rank)
// - Pseudo-legal and legal move generation, castling behind a full legality gate
// - Check / checkmate / stalemate detection
// - Move execution with queen promotion and per-piece move-history flags

use std::fmt;

pub const BOARD_SIZE: usize = 8;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// =====================
// Pieces
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn step for this side.
    pub fn forward(self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn pawn_row(self) -> usize {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn promotion_row(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Material table used by the static evaluator.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 3,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 100,
        }
    }

    /// Material table used when scoring captures in the move heuristic.
    pub fn capture_value(self) -> i32 {
        match self {
            PieceKind::Pawn => 10,
            PieceKind::Knight => 30,
            PieceKind::Bishop => 30,
            PieceKind::Rook => 50,
            PieceKind::Queen => 90,
            PieceKind::King => 900,
        }
    }

    fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub has_moved: bool,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Piece {
        Piece {
            kind,
            color,
            has_moved: false,
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn is_unmoved(self, kind: PieceKind) -> bool {
        self.kind == kind && !self.has_moved
    }
}

// =====================
// Squares & Moves
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub fn new(row: usize, col: usize) -> Square {
        assert!(
            row < BOARD_SIZE && col < BOARD_SIZE,
            "square ({row}, {col}) is off the board"
        );
        Square { row, col }
    }

    pub fn offset(self, d_row: i32, d_col: i32) -> Option<Square> {
        let row = self.row as i32 + d_row;
        let col = self.col as i32 + d_col;
        if (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col) {
            Some(Square::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// Every square in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Square::new(row, col)))
    }

    // Rank 8 is row 0.
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Some(Square::new(
            BOARD_SIZE - 1 - (rank - b'1') as usize,
            (file - b'a') as usize,
        ))
    }

    pub fn to_algebraic(self) -> String {
        format!(
            "{}{}",
            (b'a' + self.col as u8) as char,
            BOARD_SIZE - self.row
        )
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub is_castling: bool,
    /// Scratch score, only meaningful inside move selection.
    pub score: i32,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            is_castling: false,
            score: 0,
        }
    }

    pub fn castle(king: Square, to: Square) -> Move {
        Move {
            is_castling: true,
            ..Move::new(king, to)
        }
    }

    /// Corner rook that takes part in a castling move.
    pub fn rook_square(&self) -> Square {
        let col = if self.to.col > self.from.col {
            BOARD_SIZE - 1
        } else {
            0
        };
        Square::new(self.from.row, col)
    }

    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

// =====================
// Board State
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Board {
    squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
    side_to_move: Color,
}

impl Default for Board {
    fn default() -> Self {
        Board::starting_position()
    }
}

impl Board {
    pub fn empty() -> Board {
        Board {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
            side_to_move: Color::White,
        }
    }

    pub fn starting_position() -> Board {
        let mut b = Board::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (col, &kind) in back_rank.iter().enumerate() {
            b.squares[0][col] = Some(Piece::new(kind, Color::Black));
            b.squares[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            b.squares[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            b.squares[7][col] = Some(Piece::new(kind, Color::White));
        }
        b
    }

    /// Builds a board from a FEN string. Only placement, side to move and
    /// castling rights are read. Pawns off their start row count as moved;
    /// kings and rooks lose their unmoved flag when the matching right is absent.
    pub fn from_fen(fen: &str) -> Board {
        let mut b = Board::empty();
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() {
            return b;
        }

        for (row, rank_str) in parts[0].split('/').take(BOARD_SIZE).enumerate() {
            let mut col = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    col += skip as usize;
                } else if let Some(piece) = Piece::from_char(ch) {
                    if col < BOARD_SIZE {
                        b.squares[row][col] = Some(piece);
                    }
                    col += 1;
                }
            }
        }

        if parts.len() > 1 {
            b.side_to_move = if parts[1] == "b" {
                Color::Black
            } else {
                Color::White
            };
        }

        let rights = parts.get(2).copied().unwrap_or("-");
        for sq in Square::all() {
            let Some(piece) = b.squares[sq.row][sq.col].as_mut() else {
                continue;
            };
            let (king_side, queen_side, home) = match piece.color {
                Color::White => ('K', 'Q', 7),
                Color::Black => ('k', 'q', 0),
            };
            piece.has_moved = match piece.kind {
                PieceKind::Pawn => sq.row != piece.color.pawn_row(),
                PieceKind::King => {
                    sq != Square::new(home, 4)
                        || !(rights.contains(king_side) || rights.contains(queen_side))
                }
                PieceKind::Rook if sq == Square::new(home, 7) => !rights.contains(king_side),
                PieceKind::Rook if sq == Square::new(home, 0) => !rights.contains(queen_side),
                PieceKind::Rook => true,
                _ => false,
            };
        }
        b
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row][sq.col]
    }

    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row][sq.col] = piece;
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    // Raw relocation used to probe positions; flags and turn are untouched.
    pub(crate) fn relocate(&mut self, from: Square, to: Square) -> Option<Piece> {
        let captured = self.piece_at(to);
        let moving = self.piece_at(from);
        self.set_piece(to, moving);
        self.set_piece(from, None);
        captured
    }

    /// Applies a move without validation and returns the captured piece.
    /// Castling moves are routed to [`Board::perform_castle`].
    pub fn make_move(&mut self, mv: Move) -> Option<Piece> {
        if mv.is_castling {
            self.perform_castle(mv.from, mv.rook_square());
            return None;
        }

        let captured = self.piece_at(mv.to);
        if let Some(mut moving) = self.piece_at(mv.from) {
            if moving.kind == PieceKind::Pawn && mv.to.row == moving.color.promotion_row() {
                moving = Piece::new(PieceKind::Queen, moving.color);
            }
            moving.has_moved = true;
            self.set_piece(mv.to, Some(moving));
            self.set_piece(mv.from, None);
        }
        self.side_to_move = self.side_to_move.opposite();
        captured
    }

    pub fn perform_castle(&mut self, king: Square, rook: Square) {
        let direction: i32 = if rook.col > king.col { 1 } else { -1 };
        let king_to = Square::new(king.row, (king.col as i32 + 2 * direction) as usize);
        let rook_to = Square::new(king.row, (king.col as i32 + direction) as usize);

        self.relocate(king, king_to);
        self.relocate(rook, rook_to);
        for sq in [king_to, rook_to] {
            if let Some(p) = self.squares[sq.row][sq.col].as_mut() {
                p.has_moved = true;
            }
        }
        self.side_to_move = self.side_to_move.opposite();
    }

    /// Copy of the board with `mv` applied.
    pub fn with_move(&self, mv: Move) -> Board {
        let mut b = *self;
        b.make_move(mv);
        b
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for row in 0..BOARD_SIZE {
            write!(f, "{} |", BOARD_SIZE - row)?;
            for col in 0..BOARD_SIZE {
                let c = self
                    .piece_at(Square::new(row, col))
                    .map_or('.', Piece::to_char);
                write!(f, " {}", c)?;
            }
            writeln!(f, " |")?;
        }
        writeln!(f, "  +-----------------+")?;
        writeln!(f, "    a b c d e f g h")?;
        write!(f, "Side: {}", self.side_to_move)
    }
}

// =====================
// Move Generation
// =====================
const KNIGHT_DELTAS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const KING_DELTAS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
const ROOK_DIRS: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const BISHOP_DIRS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Pseudo-legal moves of the piece on `from`, destinations in row-major order.
pub fn pseudo_legal_moves(board: &Board, from: Square) -> Vec<Move> {
    let mut moves = Vec::new();
    let Some(piece) = board.piece_at(from) else {
        return moves;
    };
    match piece.kind {
        PieceKind::Pawn => gen_pawn_moves(board, from, piece.color, &mut moves),
        PieceKind::Knight => gen_leaper_moves(board, from, piece.color, &KNIGHT_DELTAS, &mut moves),
        PieceKind::Bishop => gen_slider_moves(board, from, piece.color, &BISHOP_DIRS, &mut moves),
        PieceKind::Rook => gen_slider_moves(board, from, piece.color, &ROOK_DIRS, &mut moves),
        PieceKind::Queen => {
            gen_slider_moves(board, from, piece.color, &ROOK_DIRS, &mut moves);
            gen_slider_moves(board, from, piece.color, &BISHOP_DIRS, &mut moves);
        }
        PieceKind::King => gen_leaper_moves(board, from, piece.color, &KING_DELTAS, &mut moves),
    }
    moves.sort_by_key(|m| m.to);
    moves
}

fn gen_leaper_moves(
    board: &Board,
    from: Square,
    color: Color,
    deltas: &[(i32, i32)],
    moves: &mut Vec<Move>,
) {
    for &(dr, dc) in deltas {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        match board.piece_at(to) {
            Some(p) if p.color == color => {}
            _ => moves.push(Move::new(from, to)),
        }
    }
}

fn gen_slider_moves(
    board: &Board,
    from: Square,
    color: Color,
    dirs: &[(i32, i32)],
    moves: &mut Vec<Move>,
) {
    for &(dr, dc) in dirs {
        let mut cur = from.offset(dr, dc);
        while let Some(to) = cur {
            match board.piece_at(to) {
                None => moves.push(Move::new(from, to)),
                Some(p) => {
                    if p.color != color {
                        moves.push(Move::new(from, to));
                    }
                    break;
                }
            }
            cur = to.offset(dr, dc);
        }
    }
}

fn gen_pawn_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<Move>) {
    let dir = color.forward();
    if let Some(one) = from.offset(dir, 0) {
        if board.piece_at(one).is_none() {
            moves.push(Move::new(from, one));
            if from.row == color.pawn_row() {
                if let Some(two) = from.offset(2 * dir, 0) {
                    if board.piece_at(two).is_none() {
                        moves.push(Move::new(from, two));
                    }
                }
            }
        }
    }
    for dc in [-1, 1] {
        if let Some(to) = from.offset(dir, dc) {
            if matches!(board.piece_at(to), Some(p) if p.color != color) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// True when any square strictly between `from` and `to` is occupied.
/// Both squares must share a row, a column or a diagonal.
pub fn has_obstacles_between(board: &Board, from: Square, to: Square) -> bool {
    let d_row = (to.row as i32 - from.row as i32).signum();
    let d_col = (to.col as i32 - from.col as i32).signum();
    debug_assert!(
        d_row == 0
            || d_col == 0
            || (to.row as i32 - from.row as i32).abs() == (to.col as i32 - from.col as i32).abs(),
        "{from} and {to} are not on a common line"
    );

    let mut cur = from.offset(d_row, d_col);
    while let Some(sq) = cur {
        if sq == to {
            return false;
        }
        if board.piece_at(sq).is_some() {
            return true;
        }
        cur = sq.offset(d_row, d_col);
    }
    false
}

/// Movement-geometry and occupancy check for a single move; ignores whose
/// turn it is and whether the mover's king ends up attacked.
pub fn is_pseudo_legal(board: &Board, from: Square, to: Square) -> bool {
    if from == to {
        return false;
    }
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    let target = board.piece_at(to);
    if matches!(target, Some(t) if t.color == piece.color) {
        return false;
    }

    let d_row = to.row as i32 - from.row as i32;
    let d_col = to.col as i32 - from.col as i32;
    let straight = d_row == 0 || d_col == 0;
    let diagonal = d_row.abs() == d_col.abs();

    match piece.kind {
        PieceKind::Pawn => {
            let dir = piece.color.forward();
            if d_col == 0 && target.is_none() {
                d_row == dir
                    || (from.row == piece.color.pawn_row()
                        && d_row == 2 * dir
                        && from
                            .offset(dir, 0)
                            .is_some_and(|mid| board.piece_at(mid).is_none()))
            } else {
                d_col.abs() == 1 && d_row == dir && target.is_some()
            }
        }
        PieceKind::Knight => {
            (d_row.abs() == 2 && d_col.abs() == 1) || (d_row.abs() == 1 && d_col.abs() == 2)
        }
        PieceKind::Bishop => diagonal && !has_obstacles_between(board, from, to),
        PieceKind::Rook => straight && !has_obstacles_between(board, from, to),
        PieceKind::Queen => (straight || diagonal) && !has_obstacles_between(board, from, to),
        PieceKind::King => d_row.abs() <= 1 && d_col.abs() <= 1,
    }
}

/// True when playing `from -> to` would leave the mover's own king attacked.
pub fn move_would_cause_check(board: &Board, from: Square, to: Square) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    let mut scratch = *board;
    scratch.relocate(from, to);
    is_in_check(&scratch, piece.color)
}

/// Legal non-castling move check for the piece on `from`, regardless of turn.
pub fn is_valid_move(board: &Board, from: Square, to: Square) -> bool {
    is_pseudo_legal(board, from, to) && !move_would_cause_check(board, from, to)
}

pub fn can_castle(board: &Board, king_sq: Square, rook_sq: Square) -> bool {
    if king_sq.row != rook_sq.row || king_sq.col == rook_sq.col {
        return false;
    }
    let (Some(king), Some(rook)) = (board.piece_at(king_sq), board.piece_at(rook_sq)) else {
        return false;
    };
    if !king.is_unmoved(PieceKind::King)
        || !rook.is_unmoved(PieceKind::Rook)
        || king.color != rook.color
    {
        return false;
    }
    if is_in_check(board, king.color) {
        return false;
    }
    if has_obstacles_between(board, king_sq, rook_sq) {
        return false;
    }

    // The king may neither pass through nor land on an attacked square.
    let direction: i32 = if rook_sq.col > king_sq.col { 1 } else { -1 };
    for step in 1..=2 {
        match king_sq.offset(0, step * direction) {
            Some(sq) if !move_would_cause_check(board, king_sq, sq) => {}
            _ => return false,
        }
    }
    true
}

fn castling_moves(board: &Board, king_sq: Square, moves: &mut Vec<Move>) {
    let row = king_sq.row;
    let corners = [(BOARD_SIZE - 1, 2i32), (0, -2i32)];
    for (rook_col, step) in corners {
        let reachable = if step > 0 {
            king_sq.col + 3 < BOARD_SIZE
        } else {
            king_sq.col >= 4
        };
        if !reachable {
            continue;
        }
        let rook_sq = Square::new(row, rook_col);
        let unmoved_rook = board
            .piece_at(rook_sq)
            .is_some_and(|p| p.is_unmoved(PieceKind::Rook));
        if unmoved_rook && can_castle(board, king_sq, rook_sq) {
            if let Some(to) = king_sq.offset(0, step) {
                moves.push(Move::castle(king_sq, to));
            }
        }
    }
}

/// Legal moves of the piece on `from` including castling, regardless of turn.
pub fn piece_moves(board: &Board, from: Square) -> Vec<Move> {
    let mut moves: Vec<Move> = pseudo_legal_moves(board, from)
        .into_iter()
        .filter(|m| !move_would_cause_check(board, m.from, m.to))
        .collect();
    if let Some(piece) = board.piece_at(from) {
        if piece.is_unmoved(PieceKind::King) {
            castling_moves(board, from, &mut moves);
        }
    }
    moves
}

/// Destination squares the piece on `from` may legally reach.
pub fn valid_targets(board: &Board, from: Square) -> Vec<Square> {
    piece_moves(board, from).into_iter().map(|m| m.to).collect()
}

/// All legal moves for `color`. The side not on move has none.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    if board.side_to_move() != color {
        return Vec::new();
    }
    board
        .pieces()
        .filter(|(_, p)| p.color == color)
        .flat_map(|(sq, _)| piece_moves(board, sq))
        .collect()
}

// =====================
// Check Detection
// =====================

pub fn is_in_check(board: &Board, color: Color) -> bool {
    let Some(king_sq) = board.find_king(color) else {
        return false;
    };
    board
        .pieces()
        .filter(|(_, p)| p.color != color)
        .any(|(sq, _)| is_pseudo_legal(board, sq, king_sq))
}

// Whether any piece of `color` has a legal move, whoever is on move.
fn has_any_move(board: &Board, color: Color) -> bool {
    board
        .pieces()
        .filter(|(_, p)| p.color == color)
        .any(|(sq, _)| !piece_moves(board, sq).is_empty())
}

pub fn is_in_checkmate(board: &Board, color: Color) -> bool {
    is_in_check(board, color) && !has_any_move(board, color)
}

pub fn is_stalemate(board: &Board, color: Color) -> bool {
    board.side_to_move() == color && !is_in_check(board, color) && !has_any_move(board, color)
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
}

/// Terminal state for the side to move, if any.
pub fn outcome(board: &Board) -> Option<Outcome> {
    let side = board.side_to_move();
    if !legal_moves(board, side).is_empty() {
        return None;
    }
    if is_in_check(board, side) {
        Some(Outcome::Checkmate {
            winner: side.opposite(),
        })
    } else {
        Some(Outcome::Stalemate)
    }
}
