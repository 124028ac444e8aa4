use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use granule_bloom::metrics::{self, MetricsSnapshot};
use granule_bloom::SegmentReader;

#[derive(Serialize)]
struct GranuleInfo {
    index: u64,
    total_rows: u64,
    bytes_size: usize,
    fill_ratio: Vec<f64>,
}

#[derive(Serialize)]
struct InspectReport {
    version: u32,
    bits_per_row: u64,
    hash_functions: usize,
    columns: usize,
    granules: Vec<GranuleInfo>,
    metrics: MetricsSnapshot,
}

/// CLI: inspect: header plus per-granule total_rows / bytes_size / fill ratio per column.
pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let mut reader = SegmentReader::open(&path)?;

    let mut infos = Vec::new();
    let mut index = 0u64;
    while let Some(g) = reader.next_granule()? {
        infos.push(GranuleInfo {
            index,
            total_rows: g.total_rows(),
            bytes_size: g.bytes_size(),
            fill_ratio: g.filters().iter().map(|f| f.fill_ratio()).collect(),
        });
        index += 1;
    }

    let cfg = *reader.config();
    let report = InspectReport {
        version: reader.version(),
        bits_per_row: cfg.bits_per_row,
        hash_functions: cfg.hash_functions,
        columns: reader.columns(),
        granules: infos,
        metrics: metrics::snapshot(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("segment: {}", path.display());
    println!("  version:        {}", report.version);
    println!("  bits_per_row:   {}", report.bits_per_row);
    println!("  hash_functions: {}", report.hash_functions);
    println!("  columns:        {}", report.columns);
    println!("  granules:       {}", report.granules.len());
    for gi in &report.granules {
        let fills: Vec<String> = gi.fill_ratio.iter().map(|r| format!("{:.3}", r)).collect();
        println!(
            "  #{:<6} total_rows={:<8} bytes_size={:<8} fill=[{}]",
            gi.index,
            gi.total_rows,
            gi.bytes_size,
            fills.join(", ")
        );
    }
    Ok(())
}
