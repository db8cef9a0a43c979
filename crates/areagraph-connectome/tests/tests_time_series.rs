use areagraph_connectome::{
    AggregationOptions, CancellationToken, ConnectomeError, Direction, PositionTable,
    SimulationLayout, StepFiles, TimeSeriesCollector, TrackedKeys,
};
use areagraph_structures::{AreaId, AreaPair, TrackedKey};
use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    layout: SimulationLayout,
    table: PositionTable,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let layout = SimulationLayout::new(dir.path(), 0);
    fs::create_dir_all(dir.path().join("positions")).unwrap();
    fs::create_dir_all(dir.path().join("network")).unwrap();
    fs::write(
        layout.positions_file(),
        "0 0 0 0 area_1\n1 2 0 0 area_1\n2 0 0 0 area_2\n3 9 9 9 area_3\n",
    )
    .unwrap();
    let table = PositionTable::load(layout.positions_file()).unwrap();
    Fixture {
        _dir: dir,
        layout,
        table,
    }
}

fn write_edges(layout: &SimulationLayout, step: u64, direction: Direction, rows: &str) {
    fs::write(layout.network_file(step, direction), rows).unwrap();
}

fn pair(a: u32, b: u32) -> AreaPair {
    AreaPair::directed(AreaId::new(a), AreaId::new(b))
}

#[test]
fn test_missing_step_is_a_gap_not_a_zero() {
    let f = fixture();
    write_edges(&f.layout, 0, Direction::Out, "0 1 0 0 1\n0 2 0 1 1\n");
    write_edges(&f.layout, 20, Direction::Out, "0 2 0 0 1\n");

    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::directed());
    let keys = TrackedKeys::new([pair(1, 2)]);
    let outcome = collector
        .collect(&[0, 10, 20], &f.layout.network_files(&[Direction::Out]), &keys)
        .unwrap();

    let samples = outcome.series.get(pair(1, 2)).unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].step, 0);
    assert_eq!(samples[1].step, 20);
    assert_eq!(outcome.steps_skipped, vec![10]);
    assert_eq!(outcome.diagnostics.missing_files, 1);
}

#[test]
fn test_untracked_keys_are_not_materialized() {
    let f = fixture();
    write_edges(&f.layout, 0, Direction::Out, "0 1 0 0 1\n0 2 0 1 1\n0 3 0 2 1\n");

    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::undirected());
    let keys = TrackedKeys::new([pair(2, 3)]);
    let outcome = collector
        .collect(&[0], &f.layout.network_files(&[Direction::Out]), &keys)
        .unwrap();
    assert_eq!(outcome.series.len(), 1);
    assert_eq!(outcome.series.keys().next(), Some(&TrackedKey::Pair(pair(2, 3))));
    assert_eq!(outcome.series.counts(pair(2, 3)), vec![1]);
}

#[test]
fn test_tracked_pair_absent_from_step_counts_zero() {
    let f = fixture();
    write_edges(&f.layout, 0, Direction::Out, "0 1 0 0 1\n");

    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::undirected());
    let keys = TrackedKeys::new([pair(1, 3)]);
    let outcome = collector
        .collect(&[0], &f.layout.network_files(&[Direction::Out]), &keys)
        .unwrap();
    assert_eq!(outcome.series.counts(pair(1, 3)), vec![0]);
}

#[test]
fn test_partial_step_uses_existing_file() {
    let f = fixture();
    write_edges(&f.layout, 0, Direction::In, "0 2 0 0 1\n");
    write_edges(&f.layout, 10, Direction::In, "0 2 0 0 1\n");
    write_edges(&f.layout, 10, Direction::Out, "0 2 0 1 1\n");

    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::directed());
    let keys = TrackedKeys::new([pair(1, 2)]);
    let resolver = f.layout.network_files(&[Direction::In, Direction::Out]);
    let outcome = collector.collect(&[0, 10], &resolver, &keys).unwrap();
    assert_eq!(outcome.series.counts(pair(1, 2)), vec![1, 2]);
    assert_eq!(outcome.steps_skipped, Vec::<u64>::new());
    assert_eq!(outcome.diagnostics.missing_files, 1);
}

#[test]
fn test_area_series_and_normalization() {
    let f = fixture();
    write_edges(&f.layout, 0, Direction::Out, "0 1 0 0 1\n0 2 0 1 1\n");

    let collector = TimeSeriesCollector::new(
        &f.table,
        AggregationOptions::directed().with_normalize(true),
    );
    let keys = TrackedKeys::all_areas(&f.table);
    let outcome = collector
        .collect(&[0], &f.layout.network_files(&[Direction::Out]), &keys)
        .unwrap();

    // area_1: self pair (2) + one edge to area_2 (1)
    let area_1 = outcome.series.get(AreaId::new(1)).unwrap()[0];
    let area_2 = outcome.series.get(AreaId::new(2)).unwrap()[0];
    let area_3 = outcome.series.get(AreaId::new(3)).unwrap()[0];
    assert_eq!(area_1.count, 3);
    assert_eq!(area_1.normalized, Some(1.0));
    assert_eq!(area_2.count, 1);
    assert_eq!(area_2.normalized, Some(1.0 / 3.0));
    assert_eq!(area_3.count, 0);
}

#[test]
fn test_cancellation_keeps_completed_steps() {
    let f = fixture();
    for step in [0, 10, 20] {
        write_edges(&f.layout, step, Direction::Out, "0 2 0 0 1\n");
    }
    let cancel = CancellationToken::new();
    let calls = Cell::new(0);
    let root: PathBuf = f.layout.root().to_path_buf();
    let resolver = |step: u64| {
        calls.set(calls.get() + 1);
        if step == 10 {
            cancel.cancel();
        }
        StepFiles::outgoing(
            root.join("network")
                .join(format!("rank_0_step_{}_out_network.txt", step)),
        )
    };

    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::directed());
    let keys = TrackedKeys::new([pair(1, 2)]);
    let outcome = collector
        .collect_with_cancel(&[0, 10, 20], &resolver, &keys, &cancel)
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(calls.get(), 2);
    assert_eq!(outcome.steps_collected, vec![0, 10]);
    assert_eq!(outcome.steps_not_attempted, vec![20]);
    assert_eq!(outcome.series.counts(pair(1, 2)), vec![1, 1]);
}

#[test]
fn test_parallel_sweep_is_ordered_like_sequential() {
    let f = fixture();
    for step in (0..200).step_by(10) {
        if step % 30 == 0 {
            continue;
        }
        let rows = "0 2 0 0 1\n".repeat((step / 10) as usize);
        write_edges(&f.layout, step, Direction::Out, &rows);
    }
    let steps: Vec<u64> = (0u32..200).step_by(10).rev().map(u64::from).collect();
    let resolver = f.layout.network_files(&[Direction::Out]);
    let collector = TimeSeriesCollector::new(
        &f.table,
        AggregationOptions::undirected().with_normalize(true),
    );
    let keys = TrackedKeys::new([
        TrackedKey::Pair(pair(1, 2)),
        TrackedKey::Area(AreaId::new(2)),
    ]);

    let sequential = collector.collect(&steps, &resolver, &keys).unwrap();
    let parallel = collector
        .collect_parallel(&steps, &resolver, &keys, &CancellationToken::new())
        .unwrap();

    assert_eq!(sequential, parallel);
    let collected = parallel.series.steps(pair(1, 2));
    assert!(collected.windows(2).all(|w| w[0] < w[1]));
    assert!(!collected.contains(&30));
    assert_eq!(
        serde_json::to_string(&sequential).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

#[test]
fn test_unreadable_step_aborts_sweep() {
    let f = fixture();
    // A directory where a file is expected opens but cannot be read as text
    fs::create_dir_all(f.layout.network_file(0, Direction::Out)).unwrap();

    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::directed());
    let keys = TrackedKeys::new([pair(1, 2)]);
    let result = collector.collect(&[0], &f.layout.network_files(&[Direction::Out]), &keys);
    match result {
        Err(ConnectomeError::Io { .. }) => {}
        Ok(outcome) => assert_eq!(outcome.diagnostics.read_errors, 1),
        Err(other) => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_key_errors_surface_before_io() {
    let f = fixture();
    let collector = TimeSeriesCollector::new(&f.table, AggregationOptions::undirected());
    let keys = TrackedKeys::new([pair(3, 1)]);
    let result = collector.collect(&[0], &f.layout.network_files(&[Direction::Out]), &keys);
    assert!(matches!(result, Err(ConnectomeError::InvalidModeOrKey(_))));
}
