//! Performance benchmarks for the per-turn hot paths

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::clear::clear_lines;
use shared::generator::{weighted_color, COLOR_TABLE};
use shared::placement::{can_place_anywhere, valid_positions};
use shared::{Grid, Piece, Shape, Snapshot, SnapshotEnvelope};
use std::time::Instant;

/// 8x8 board with a full row and a full column, everything else alternating
fn busy_board() -> Grid {
    let rows = (0..8)
        .map(|r| {
            (0..8)
                .map(|c| {
                    if r == 3 || c == 5 || (r + c) % 2 == 0 {
                        Some("#D92328".to_string())
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect();
    Grid::from_rows(rows).unwrap_or_default()
}

/// Benchmarks line detection and clearing after a placement
#[test]
fn benchmark_clear_lines() {
    let board = busy_board();
    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let (_, report) = clear_lines(&board, &COLOR_TABLE);
        assert_eq!(report.lines(), 2);
    }

    let duration = start.elapsed();
    println!(
        "Clear lines: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds even unoptimized
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the game-over check, which tries every rotation everywhere
#[test]
fn benchmark_game_over_check() {
    let board = busy_board();
    let shapes: Vec<Shape> = (0..7).map(Shape::from_catalogue).collect();
    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        for shape in &shapes {
            let _ = can_place_anywhere(&board, shape);
        }
    }

    let duration = start.elapsed();
    println!(
        "Game-over check: {} iterations x {} shapes in {:?}",
        iterations,
        shapes.len(),
        duration
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the auto-placer's candidate enumeration on an empty board
#[test]
fn benchmark_valid_positions() {
    let board = Grid::new(8, 8);
    let shape = Shape::from_catalogue(0);
    let iterations = 5_000;
    let start = Instant::now();

    let mut total = 0;
    for _ in 0..iterations {
        total += valid_positions(&board, &shape).len();
    }

    let duration = start.elapsed();
    println!("Valid positions: {} iterations in {:?}", iterations, duration);

    assert!(total > 0);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks weighted color draws
#[test]
fn benchmark_weighted_color() {
    let mut rng = StdRng::seed_from_u64(1);
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = weighted_color(&mut rng, &COLOR_TABLE);
    }

    let duration = start.elapsed();
    println!(
        "Weighted color: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks encoding a full snapshot frame, sent after every move
#[test]
fn benchmark_snapshot_encoding() {
    let envelope = SnapshotEnvelope::new(
        "AB12",
        Snapshot {
            board: busy_board(),
            available_pieces: vec![
                Some(Piece::new(Shape::from_catalogue(1), "#006CB7")),
                None,
                Some(Piece::new(Shape::from_catalogue(4), "#FFCF00")),
            ],
            score: 1750,
        },
    );
    let iterations = 2_000;
    let start = Instant::now();

    let mut bytes = 0;
    for _ in 0..iterations {
        let json = serde_json::to_string(&envelope).unwrap();
        bytes += json.len();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encoding: {} frames ({} bytes) in {:?}",
        iterations, bytes, duration
    );

    assert!(duration.as_millis() < 2000);
}
