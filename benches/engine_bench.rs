//! Engine benchmarks: move generation, evaluation, search and the checkers
//! heuristic.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_board_games::checkers::{CheckersBoard, Side, select_move};
use rust_board_games::engine::{Board, Color, Move, Square, legal_moves};
use rust_board_games::evaluation::evaluate_board;
use rust_board_games::search::find_best_move;

fn after_e4() -> Board {
    Board::starting_position().with_move(Move::new(Square::new(6, 4), Square::new(4, 4)))
}

fn bench_legal_moves_starting(c: &mut Criterion) {
    let board = Board::starting_position();

    c.bench_function("legal_moves_starting_position", |b| {
        b.iter(|| black_box(legal_moves(&board, Color::White)))
    });
}

fn bench_legal_moves_middlegame(c: &mut Criterion) {
    let board = Board::from_fen("r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 0 1");

    c.bench_function("legal_moves_middlegame", |b| {
        b.iter(|| black_box(legal_moves(&board, Color::White)))
    });
}

fn bench_evaluate_board(c: &mut Criterion) {
    let board = after_e4();

    c.bench_function("evaluate_board", |b| b.iter(|| black_box(evaluate_board(&board))));
}

fn bench_search_depths(c: &mut Criterion) {
    let board = after_e4();
    let mut group = c.benchmark_group("find_best_move");
    group.sample_size(10);

    for depth in [1, 2, 3] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| black_box(find_best_move(&board, depth)))
        });
    }
    group.finish();
}

fn bench_checkers_select_move(c: &mut Criterion) {
    let board = CheckersBoard::starting_position();

    c.bench_function("checkers_select_move", |b| {
        b.iter(|| black_box(select_move(&board, Side::Red)))
    });
}

criterion_group!(
    benches,
    bench_legal_moves_starting,
    bench_legal_moves_middlegame,
    bench_evaluate_board,
    bench_search_depths,
    bench_checkers_select_move,
);
criterion_main!(benches);
