mod session;

use crate::series::{Sample, SimTime, UnitSeries};
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "dashlog-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub(crate) fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

pub(crate) fn append_file(path: &Path, contents: &str) {
    use std::io::Write;
    let mut f = fs::OpenOptions::new()
        .append(true)
        .open(path)
        .expect("open for append");
    f.write_all(contents.as_bytes()).expect("append");
}

pub(crate) fn record(fields: &[&str]) -> StringRecord {
    StringRecord::from(fields.to_vec())
}

pub(crate) fn at_secs(secs: f64, value: f64) -> Sample {
    Sample::new(
        SimTime::from_raw(secs, crate::unit::TimeUnit::Seconds).expect("valid time"),
        value,
    )
}

pub(crate) fn assert_points(series: &UnitSeries, expected: &[(u64, f64)]) {
    let got: Vec<(u64, f64)> = series.iter().collect();
    assert_eq!(
        got.len(),
        expected.len(),
        "point count differs: got {got:?}, expected {expected:?}"
    );
    for ((gk, gv), (ek, ev)) in got.iter().zip(expected) {
        assert_eq!(gk, ek, "keys differ: got {got:?}, expected {expected:?}");
        assert!(
            (gv - ev).abs() < 1e-9,
            "value at {gk} differs: got {gv}, expected {ev}"
        );
    }
}
