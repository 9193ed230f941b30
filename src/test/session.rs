use super::{append_file, assert_points, record, unique_temp_dir, write_file};
use crate::aggregate::AggregateMode;
use crate::error::{ErrorKind, IngestError};
use crate::ingest::IngestionSession;
use crate::log::{BottleneckSchedule, EntityId, LogChunk, RateChange, Watermark};
use crate::series::{UnitSeries, extract, raw_series, resample};
use crate::unit::{UnitKind, UnitTable};
use csv::StringRecord;
use std::fs;

const HEADER: &str = "Time_Now;Buffer_Level;Bytes_Received;Buffer_Underrun;Rep_Level\n";

fn log_headers() -> StringRecord {
    record(&[
        "Time_Now",
        "Buffer_Level",
        "Bytes_Received",
        "Buffer_Underrun",
        "Rep_Level",
        "Download_Request_Sent",
        "Segment_Size",
    ])
}

/// 稀疏、时间略有乱序的日志行，形状与客户端日志一致
fn synthetic_rows(n: usize) -> Vec<StringRecord> {
    (0..n)
        .map(|i| {
            let t = if i % 9 == 4 {
                format!("{:.3}", i as f64 * 0.37 - 0.5)
            } else {
                format!("{:.3}", i as f64 * 0.37)
            };
            let bl = if i % 6 == 0 {
                String::new()
            } else {
                format!("{}", (i % 7) as f64 * 0.5)
            };
            let bytes = if i % 4 == 3 {
                String::new()
            } else {
                format!("{}", 100 + (i * 37) % 50)
            };
            let underrun = if i % 3 == 0 {
                format!("{}", u8::from(i % 5 == 0))
            } else {
                String::new()
            };
            let rep = if i % 2 == 0 {
                format!("{}", i % 4)
            } else {
                String::new()
            };
            let (sent, seg) = if i % 5 == 1 {
                (
                    format!("{:.3}", i as f64 * 0.37 - 0.2),
                    format!("{}", 4000 + i * 10),
                )
            } else {
                (String::new(), String::new())
            };
            StringRecord::from(vec![t, bl, bytes, underrun, rep, sent, seg])
        })
        .collect()
}

fn chunk(headers: Option<StringRecord>, rows: &[StringRecord], total: usize) -> LogChunk {
    LogChunk {
        headers,
        rows: rows.to_vec(),
        watermark: Watermark {
            rows: total,
            offset: total as u64,
        },
    }
}

fn fold_in_batches(
    table: &UnitTable,
    unit: UnitKind,
    rows: &[StringRecord],
    cuts: &[usize],
) -> UnitSeries {
    let id = EntityId::parse("sim1_cl0_panda_output.txt").expect("id");
    let mut session = IngestionSession::new(table.clone());
    let mut start = 0;
    for &end in cuts {
        let headers = (start == 0).then(log_headers);
        session
            .merge_new(&id, unit, chunk(headers, &rows[start..end], end))
            .expect("merge");
        start = end;
    }
    session.series(&id.name, unit).expect("series").clone()
}

#[test]
fn incremental_merge_matches_full_recompute() {
    let rows = synthetic_rows(60);
    let all_cuts: Vec<usize> = (1..=rows.len()).collect();
    let splits: [&[usize]; 4] = [&[60], &[1, 3, 7, 20, 60], &[30, 31, 59, 60], &all_cuts];

    for table in [UnitTable::standard(), UnitTable::live()] {
        for d in table.iter() {
            let samples = extract(d, &log_headers(), &rows);
            let full = if d.resample {
                resample(d, &samples)
            } else {
                raw_series(&samples)
            };
            assert!(!full.is_empty(), "unit {} has data", d.kind);
            for cuts in splits {
                let folded = fold_in_batches(&table, d.kind, &rows, cuts);
                assert!(
                    folded.approx_eq(&full, 1e-9),
                    "unit {} cuts {:?}: {:?} vs {:?}",
                    d.kind,
                    cuts,
                    folded,
                    full
                );
            }
        }
    }
}

#[test]
fn empty_batches_are_no_ops() {
    let table = UnitTable::standard();
    let id = EntityId::parse("cl0_panda_output.txt").expect("id");
    let mut session = IngestionSession::new(table);

    let rows = vec![record(&["0.5", "", "1000", "", ""])];
    let first = session
        .merge_new(
            &id,
            UnitKind::Throughput,
            chunk(Some(log_headers()), &rows, 1),
        )
        .expect("merge")
        .clone();
    assert_points(&first, &[(0, 8.0)]);

    let rows = vec![record(&["0.9", "2.0", "", "", ""])];
    let second = session
        .merge_new(&id, UnitKind::Throughput, chunk(None, &rows, 2))
        .expect("merge")
        .clone();
    assert_eq!(first, second);

    let third = session
        .merge_new(&id, UnitKind::Throughput, chunk(None, &[], 2))
        .expect("merge")
        .clone();
    assert_eq!(first, third);
    assert_eq!(session.entity(&id.name).unwrap().row_count(), 2);
}

#[test]
fn poll_dir_tails_growing_logs_and_aggregates() {
    let dir = unique_temp_dir("session-poll");
    let a = write_file(
        &dir,
        "sim1_cl0_panda_output.txt",
        &format!("{HEADER}0.5;;1000;;\n0.8;2.0;;0;\n1.2;;500;;\n1.5;4.0;;0;3\n"),
    );
    write_file(
        &dir,
        "sim1_cl1_festive_output.txt",
        &format!("{HEADER}0.1;;2000;;\n"),
    );
    write_file(
        &dir,
        "sim2_cl0_panda_output.txt",
        &format!("{HEADER}0.1;;99999;;\n"),
    );

    let units = [UnitKind::Throughput, UnitKind::BufferLevel];
    let mut session = IngestionSession::default();
    let report = session.poll_dir(&dir, 1, &units).expect("poll");
    assert_eq!(report.entities, 2);
    assert_eq!(report.new_rows, 5);
    assert!(report.failures.is_empty());

    let agg = session
        .aggregate(UnitKind::Throughput, AggregateMode::Average)
        .expect("aggregate");
    assert_eq!(agg.entities, 2);
    assert_points(&agg.overall, &[(0, 12.0), (1, 2.0)]);
    assert_points(&agg.by_algorithm["panda"], &[(0, 8.0), (1, 4.0)]);
    assert_points(&agg.by_algorithm["festive"], &[(0, 16.0)]);

    append_file(&a, "1.9;;250;;\n2.2;;125;;\n3.0;;99");
    let report = session.poll_dir(&dir, 1, &units).expect("poll again");
    assert_eq!(report.new_rows, 2);

    let name = "sim1_cl0_panda_output.txt";
    assert_points(
        session.series(name, UnitKind::Throughput).expect("tp"),
        &[(0, 8.0), (1, 6.0), (2, 1.0)],
    );
    assert_points(
        session.series(name, UnitKind::BufferLevel).expect("bl"),
        &[(0, 2.0), (1, 4.0)],
    );
    let record = session.entity(name).expect("entity");
    assert_eq!(record.row_count(), 6);
    assert_eq!(record.watermark().map(|w| w.rows), Some(6));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failing_entity_does_not_disturb_others() {
    let dir = unique_temp_dir("session-failure");
    let good = write_file(
        &dir,
        "sim1_cl0_panda_output.txt",
        &format!("{HEADER}0.5;;1000;;\n1.5;;1000;;\n"),
    );
    fs::create_dir_all(dir.join("sim1_cl1_festive_output.txt")).expect("mkdir");

    let mut session = IngestionSession::default();
    let report = session
        .poll_dir(&dir, 1, &[UnitKind::Throughput])
        .expect("poll");
    assert_eq!(report.entities, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].1.kind(), ErrorKind::Io);
    assert_points(
        session
            .series("sim1_cl0_panda_output.txt", UnitKind::Throughput)
            .expect("tp"),
        &[(0, 8.0), (1, 8.0)],
    );

    fs::write(&good, HEADER).expect("truncate");
    let err = session
        .poll_file(&good, &[UnitKind::Throughput])
        .expect_err("truncated");
    assert!(matches!(err, IngestError::LogTruncated { .. }));
    let record = session.entity("sim1_cl0_panda_output.txt").expect("entity");
    assert_eq!(record.row_count(), 2);
    assert_eq!(record.series(UnitKind::Throughput).expect("tp").len(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn entity_file_not_yet_created_is_tolerated() {
    let dir = unique_temp_dir("session-startup");
    let path = dir.join("sim1_cl0_panda_output.txt");

    let mut session = IngestionSession::default();
    let added = session
        .poll_file(&path, &[UnitKind::BufferLevel])
        .expect("missing file");
    assert_eq!(added, 0);
    assert!(
        session
            .series("sim1_cl0_panda_output.txt", UnitKind::BufferLevel)
            .expect("bl")
            .is_empty()
    );

    write_file(

        &dir,

        "sim1_cl0_panda_output.txt",

        &format!("{HEADER}0.5;3.0;;;\n"),

    );
    let added = session
        .poll_file(&path, &[UnitKind::BufferLevel])
        .expect("now present");
    assert_eq!(added, 1);
    assert_points(
        session
            .series("sim1_cl0_panda_output.txt", UnitKind::BufferLevel)
            .expect("bl"),
        &[(0, 3.0)],
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_units_and_ids_are_rejected() {
    let table = UnitTable::from_json_str(
        r#"{ "units": [ { "kind": "tp", "index": "Time_Now", "value": "Bytes_Received" } ] }"#,
    )
    .expect("table");
    let mut session = IngestionSession::new(table);

    let err = session
        .aggregate(UnitKind::BufferLevel, AggregateMode::Average)
        .expect_err("bl not configured");
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let id = EntityId::parse("cl0_panda_output.txt").expect("id");
    assert!(session.merge_new(&id, UnitKind::BufferLevel, LogChunk::default()).is_err());
    assert!(session.refresh("cl9_ghost_output.txt", UnitKind::Throughput).is_err());

    let dir = unique_temp_dir("session-bad-id");
    let err = session
        .poll_file(&dir.join("router_output.txt"), &[UnitKind::Throughput])
        .expect_err("router");
    assert_eq!(err.kind(), ErrorKind::UnrecognizedEntity);

    let empty = session
        .aggregate(UnitKind::Throughput, AggregateMode::Sum)
        .expect("aggregate");
    assert!(empty.overall.is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn efficiency_and_summaries_follow_bottleneck_schedule() {
    let dir = unique_temp_dir("session-eff");
    write_file(
        &dir,
        "sim1_cl0_panda_output.txt",
        &format!("{HEADER}0.5;;1000;;1\n1.5;;500;1;1\n2.5;;;0;2\n"),
    );
    write_file(
        &dir,
        "sim1_cl1_panda_output.txt",
        &format!("{HEADER}0.5;;1000;;\n"),
    );

    let mut session = IngestionSession::default();
    let units = [UnitKind::Efficiency, UnitKind::QualityLevel, UnitKind::BufferUnderrun];
    session.poll_dir(&dir, 1, &units).expect("poll");

    assert!(session.efficiency("sim1_cl0_panda_output.txt").is_none());
    session.set_bottleneck_schedule(BottleneckSchedule::new(vec![RateChange {
        at_secs: 0.0,
        kbps: 16.0,
    }]));

    assert_points(
        &session.efficiency("sim1_cl0_panda_output.txt").expect("eff"),
        &[(0, 0.5), (1, 0.25)],
    );
    let total = session
        .aggregate(UnitKind::Efficiency, AggregateMode::StackedSum)
        .expect("aggregate");
    assert_points(&total.overall, &[(0, 1.0), (1, 0.25)]);

    let summaries = session.summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].client, 0);
    assert_eq!(summaries[0].quality_changes, Some(1));
    assert_eq!(summaries[0].total_underrun, Some(1.0));
    assert_eq!(summaries[0].mean_efficiency, Some(0.375));
    assert_eq!(summaries[1].quality_changes, Some(0));

    session.reset();
    assert!(session.entities().is_empty());
    assert!(session.bottleneck_schedule().is_none());

    let _ = fs::remove_dir_all(&dir);
}
