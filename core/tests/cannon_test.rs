use cannon::config::{Fill, RunConfig};
use cannon::distributed::{launch, CannonEngine, CannonState, Communicator, ProcessGrid};
use cannon::harness::{run_cannon, run_threaded};
use cannon::matrix::Matrix;
use cannon::Error;

#[test]
fn test_concrete_4x4_on_2x2_grid() {
    // A[i][j] = (4i + j) mod 10, B[i][j] = (4i + j + 1) mod 10
    let config = RunConfig::new(4).with_fill(Fill::Sequence);
    let report = run_threaded::<i64>(4, &config).unwrap();

    #[rustfmt::skip]
    let expected = Matrix::new(vec![
         32, 18, 24,  30,
        104, 66, 88, 110,
         56, 74, 92, 110,
         68, 42, 56,  70,
    ], 4).unwrap();

    assert_eq!(report.grid_side, 2);
    assert_eq!(report.c, expected);
    assert_eq!(report.a.matmul(&report.b).unwrap(), expected);
    assert_eq!(report.mismatches, 0);
    assert_eq!(report.verdict(), "result correct");
}

#[test]
fn test_matches_oracle_for_square_worlds() {
    for processes in [1, 4, 9, 16] {
        for dim in [12, 24] {
            let config = RunConfig::new(dim).with_seed(processes as u64 * 1000 + dim as u64);
            let report = run_threaded::<i64>(processes, &config).unwrap();

            let expected = report.a.matmul(&report.b).unwrap();
            assert_eq!(report.c, expected, "P={processes} N={dim}");
            assert!(report.is_correct(), "P={processes} N={dim}");
        }
    }
}

#[test]
fn test_one_element_blocks() {
    // N == sqrt(P): every block is 1x1.
    let config = RunConfig::new(3).with_seed(3);
    let report = run_threaded::<i32>(9, &config).unwrap();
    assert!(report.is_correct());
}

#[test]
fn test_only_root_gets_a_report() {
    let config = RunConfig::new(8).with_fill(Fill::Sequence);
    let reports = launch(4, |comm| run_cannon::<_, i64>(&comm, &config)).unwrap();

    assert!(reports[0].is_some());
    assert!(reports[1..].iter().all(Option::is_none));
}

#[test]
fn test_rejects_non_square_process_counts() {
    let config = RunConfig::new(12);
    for processes in [2, 3, 5, 6, 7, 8] {
        let err = run_threaded::<i64>(processes, &config);
        assert_eq!(err.unwrap_err(), Error::NotPerfectSquare { processes });

        // The SPMD body rejects it too, on every rank, before generating anything.
        let err = launch(processes, |comm| run_cannon::<_, i64>(&comm, &config));
        assert_eq!(err.unwrap_err(), Error::NotPerfectSquare { processes });
    }
}

#[test]
fn test_rejects_indivisible_dimension() {
    let config = RunConfig::new(5);
    let err = launch(4, |comm| run_cannon::<_, i64>(&comm, &config));
    assert_eq!(
        err.unwrap_err(),
        Error::IndivisibleDimension {
            dim: 5,
            grid_side: 2
        }
    );

    assert_eq!(
        run_threaded::<i64>(9, &RunConfig::new(10)).unwrap_err(),
        Error::IndivisibleDimension {
            dim: 10,
            grid_side: 3
        }
    );
}

#[test]
fn test_rejects_oversized_configurations() {
    // 17 x 17 is square but larger than the thread world allows.
    let err = run_threaded::<i64>(289, &RunConfig::new(17));
    assert!(matches!(err, Err(Error::InvalidWorld { processes: 289, .. })));

    let err = run_threaded::<i64>(1, &RunConfig::new(usize::MAX));
    assert_eq!(err.unwrap_err(), Error::DimensionTooLarge { dim: usize::MAX });

    assert_eq!(
        run_threaded::<i64>(usize::MAX, &RunConfig::new(4)).unwrap_err(),
        Error::NotPerfectSquare {
            processes: usize::MAX
        }
    );
}

#[test]
fn test_failure_after_skew_aborts_the_run() {
    // The center of a 3 x 3 grid fails once its blocks are skewed; its
    // neighbors are mid-round and must fail too instead of hanging.
    let err = launch(9, |comm| {
        let ctx = ProcessGrid::new(comm.size())?.context(comm.rank())?;
        let mut engine = CannonEngine::new(ctx, 2, vec![1i64; 4], vec![1i64; 4])?;
        engine.skew(&comm)?;
        if comm.rank() == 4 {
            return Err(Error::InvalidState("boom".to_string()));
        }
        engine.run(&comm)?;
        engine.into_accumulator()
    });

    assert_eq!(err, Err(Error::InvalidState("boom".to_string())));
}

#[test]
fn test_failure_between_rounds_aborts_the_run() {
    let err = launch(16, |comm| {
        let ctx = ProcessGrid::new(comm.size())?.context(comm.rank())?;
        let mut engine = CannonEngine::new(ctx, 1, vec![2i64], vec![3i64])?;
        engine.skew(&comm)?;
        engine.step(&comm)?;
        if comm.rank() == 6 {
            panic!("rank 6 exploded between rounds");
        }
        engine.run(&comm)?;
        engine.into_accumulator()
    });

    assert_eq!(err, Err(Error::RankPanicked { rank: 6 }));
}

#[test]
fn test_skew_alignment() {
    // Each rank's blocks are tagged with the rank that originally held them.
    let side = 3;
    let placed = launch(side * side, |comm| {
        let ctx = ProcessGrid::new(comm.size())?.context(comm.rank())?;
        let (row, col) = (ctx.row, ctx.col);
        let a = vec![comm.rank() as i64; 4];
        let b = vec![100 + comm.rank() as i64; 4];

        let mut engine = CannonEngine::new(ctx, 2, a, b)?;
        engine.skew(&comm)?;
        assert_eq!(engine.state(), CannonState::Iterating { round: 0 });
        Ok((row, col, engine.a_block().to_vec(), engine.b_block().to_vec()))
    })
    .unwrap();

    for (row, col, a, b) in placed {
        let a_origin = row * side + (col + row) % side;
        let b_origin = ((row + col) % side) * side + col;
        assert_eq!(a, vec![a_origin as i64; 4], "A at ({row}, {col})");
        assert_eq!(b, vec![100 + b_origin as i64; 4], "B at ({row}, {col})");
    }
}

#[test]
fn test_round_count_is_grid_side() {
    for block_dim in [1, 2, 4] {
        let rounds = launch(4, |comm| {
            let ctx = ProcessGrid::new(comm.size())?.context(comm.rank())?;
            let len = block_dim * block_dim;
            let mut engine = CannonEngine::new(ctx, block_dim, vec![1i64; len], vec![1i64; len])?;
            engine.run(&comm)?;
            assert_eq!(engine.state(), CannonState::Done);
            Ok(engine.rounds_completed())
        })
        .unwrap();

        assert_eq!(rounds, vec![2, 2, 2, 2], "block_dim={block_dim}");
    }
}

#[test]
fn test_all_ones_accumulates_dim() {
    // With all-ones inputs every element of C is N.
    let dim = 8;
    let blocks = launch(16, |comm| {
        let ctx = ProcessGrid::new(comm.size())?.context(comm.rank())?;
        let mut engine = CannonEngine::new(ctx, 2, vec![1i64; 4], vec![1i64; 4])?;
        engine.run(&comm)?;
        engine.into_accumulator()
    })
    .unwrap();

    for block in blocks {
        assert_eq!(block, vec![dim as i64; 4]);
    }
}

#[test]
fn test_report_serializes_to_json() {
    let config = RunConfig::new(2).with_fill(Fill::Sequence);
    let report = run_threaded::<i64>(1, &config).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["dim"], 2);
    assert_eq!(json["processes"], 1);
    assert_eq!(json["mismatches"], 0);
    assert_eq!(json["a"]["data"], serde_json::json!([0, 1, 2, 3]));
}
