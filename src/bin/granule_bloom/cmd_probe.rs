use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use granule_bloom::{hash_value, SegmentReader};

use crate::util::parse_value_arg;

#[derive(Serialize)]
struct ProbeReport {
    column: usize,
    hash: u64,
    granules: u64,
    maybe: Vec<u64>,
    skipped: u64,
}

/// CLI: probe: which granules may hold `value` in `column`.
pub fn exec(path: PathBuf, column: usize, value: String, json: bool) -> Result<()> {
    let v = parse_value_arg(&value)?;
    let hash = hash_value(&v);

    let mut reader = SegmentReader::open(&path)?;
    let mut maybe = Vec::new();
    let mut granules = 0u64;
    while let Some(g) = reader.next_granule()? {
        if g.may_contain(column, hash)? {
            maybe.push(granules);
        }
        granules += 1;
    }

    let report = ProbeReport {
        column,
        hash,
        granules,
        skipped: granules - maybe.len() as u64,
        maybe,
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "probe: column={} value={:?} hash={:#018x}",
            report.column, v, report.hash
        );
        println!(
            "  maybe: {:?}; skipped {} of {} granule(s)",
            report.maybe, report.skipped, report.granules
        );
    }
    Ok(())
}
