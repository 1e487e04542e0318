use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{MagnitudeBand, StatsSummary, TimeRange};

// ---------------------------------------------------------------------------
// Two-column CSV tables
// ---------------------------------------------------------------------------

/// Which statistics table to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsTable {
    /// All four bands, strongest first, zero counts included.
    Bands,
    /// Regions by count descending, ties by label.
    Regions,
}

impl StatsTable {
    fn header(self) -> [&'static str; 2] {
        match self {
            StatsTable::Bands => ["band", "count"],
            StatsTable::Regions => ["region", "count"],
        }
    }

    fn rows(self, stats: &StatsSummary) -> Vec<(String, usize)> {
        match self {
            StatsTable::Bands => MagnitudeBand::ALL
                .iter()
                .map(|band| (band.label().to_string(), stats.band_count(*band)))
                .collect(),
            StatsTable::Regions => stats
                .top_regions(usize::MAX)
                .into_iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect(),
        }
    }
}

/// Write one table as CSV (header row plus `label,count` rows).
pub fn write_table<W: Write>(stats: &StatsSummary, table: StatsTable, writer: W) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.header())?;
    for (label, count) in table.rows(stats) {
        out.write_record([label, count.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

/// Render one table to a `String`.
pub fn table_to_string(stats: &StatsSummary, table: StatsTable) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_table(stats, table, &mut buf)?;
    // csv only emits the UTF-8 we hand it.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Default file name offered by the export dialog.
pub fn default_file_name(range: TimeRange, table: StatsTable) -> String {
    match table {
        StatsTable::Bands => format!("earthquake_stats_{}.csv", range.key()),
        StatsTable::Regions => format!("earthquake_regions_{}.csv", range.key()),
    }
}

/// Export a table to `path`.
pub fn export_to_file(stats: &StatsSummary, table: StatsTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_table(stats, table, file).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {table:?} table to {}", path.display());
    Ok(())
}
