use anyhow::{anyhow, Context, Result};
use log::warn;
use std::fs;
use std::path::PathBuf;

use granule_bloom::{GranuleAggregator, IndexConfigBuilder, SegmentWriter, Value};

use crate::util::json_to_value;

/// CLI: build
/// - Each input granule goes through GranuleAggregator, then into the segment in order.
/// - All granules must have the same column count; it is taken from the first one.
pub fn exec(
    input: PathBuf,
    out: PathBuf,
    bits_per_row: Option<u64>,
    hash_functions: Option<usize>,
) -> Result<()> {
    let mut builder = IndexConfigBuilder::new();
    if let Some(b) = bits_per_row {
        builder = builder.bits_per_row(b);
    }
    if let Some(k) = hash_functions {
        builder = builder.hash_functions(k);
    }
    let cfg = builder.build()?;

    let text = fs::read_to_string(&input)
        .with_context(|| format!("read input {}", input.display()))?;
    let granules: Vec<Vec<Vec<serde_json::Value>>> = serde_json::from_str(&text)
        .with_context(|| format!("parse input {}", input.display()))?;

    let columns = granules
        .first()
        .map(|g| g.len())
        .ok_or_else(|| anyhow!("input has no granules"))?;

    let mut agg = GranuleAggregator::new(&cfg, columns)?;
    let mut writer = SegmentWriter::create(&out, &cfg, columns)?;

    for (gi, granule) in granules.iter().enumerate() {
        let cols: Vec<Vec<Value>> = granule
            .iter()
            .map(|c| c.iter().map(json_to_value).collect::<Result<Vec<_>>>())
            .collect::<Result<_>>()
            .with_context(|| format!("granule #{}", gi))?;
        let slices: Vec<&[Value]> = cols.iter().map(|c| c.as_slice()).collect();
        agg.update(&slices)
            .with_context(|| format!("granule #{}", gi))?;

        let g = agg.take_granule()?;
        if g.is_empty() {
            warn!("granule #{}: no rows, nothing to index", gi);
            return Err(anyhow!("granule #{} has no rows", gi));
        }
        writer.append(&g)?;
    }

    let summary = writer.finish()?;
    println!(
        "build: {} granule(s), {} column(s), {} byte(s) -> {} ({})",
        summary.granules,
        columns,
        summary.bytes,
        out.display(),
        cfg
    );
    Ok(())
}
