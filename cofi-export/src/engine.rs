//! Conversion pipeline
//!
//! Load input → amount table → CoFi rows → output files. Output is
//! written to temporary siblings and renamed into place only after every
//! file has been written, so a failed run leaves no partial output.

use crate::{
    cofi::{self, NettingBatch},
    config::{AmountSource, Config, InputFormat},
    pathfinder, Result,
};
use capacity_core::{AmountTable, CapacityEngine, Snapshot, UtilizationGraph};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Summary of a finished conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Accounts in the index table
    pub accounts: usize,
    /// Edges in the amount table
    pub input_edges: usize,
    /// CoFi rows written
    pub rows_written: usize,
    /// Self-loops skipped
    pub self_loops_skipped: usize,
    /// Edges dropped after rescaling to zero
    pub dropped_below_unit: usize,
}

impl From<&NettingBatch> for ConversionReport {
    fn from(batch: &NettingBatch) -> Self {
        Self {
            accounts: batch.index.len(),
            input_edges: batch.stats.input_edges,
            rows_written: batch.rows.len(),
            self_loops_skipped: batch.stats.self_loops_skipped,
            dropped_below_unit: batch.stats.dropped_below_unit,
        }
    }
}

/// Runs one conversion described by a [`Config`]
#[derive(Debug)]
pub struct Converter {
    config: Config,
}

impl Converter {
    /// Create converter, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the amount table the configuration points at
    pub fn load_table(&self) -> Result<AmountTable> {
        let input = &self.config.input;
        match input.format {
            InputFormat::Pathfinder2Csv => pathfinder::read_edges_file(&input.path),
            InputFormat::Snapshot => {
                let snapshot = Snapshot::read_from(&input.path)?;
                Ok(table_from_snapshot(&snapshot, input.amounts))
            }
        }
    }

    /// Run the conversion
    pub fn run(&self) -> Result<ConversionReport> {
        tracing::info!(
            "Converting {} ({:?})",
            self.config.input.path.display(),
            self.config.input.format
        );

        let table = self.load_table()?;
        let batch = cofi::transform(&table);

        let output = &self.config.output;
        let mut staged = StagedOutput::default();

        let cofi_tmp = staged.stage(&output.cofi_path);
        cofi::write_rows(&batch.rows, BufWriter::new(File::create(&cofi_tmp)?))?;

        if let Some(index_path) = &output.index_path {
            let index_tmp = staged.stage(index_path);
            cofi::write_index(&batch.index, BufWriter::new(File::create(&index_tmp)?))?;
        }

        staged.commit()?;

        let report = ConversionReport::from(&batch);
        tracing::info!(
            "Wrote {} edges to {}",
            report.rows_written,
            output.cofi_path.display()
        );
        Ok(report)
    }
}

/// Pick the snapshot table handed to the transformer
pub fn table_from_snapshot(snapshot: &Snapshot, amounts: AmountSource) -> AmountTable {
    let graph = UtilizationGraph::build(snapshot);
    let summary = graph.summary();
    tracing::info!(
        "Utilization graph: {} accounts, {} edges, utilized {}, capacity {}",
        summary.node_count,
        summary.edge_count,
        summary.total_utilized,
        summary.total_capacity
    );

    match amounts {
        AmountSource::Balances => snapshot.balances.clone(),
        AmountSource::Capacities => CapacityEngine::new(snapshot).capacity_table(),
    }
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Output files written to `.tmp` siblings and renamed as a group.
///
/// Dropping an uncommitted set removes every temporary file. A failed
/// commit also removes the destinations it already renamed.
#[derive(Debug, Default)]
struct StagedOutput {
    files: Vec<(PathBuf, PathBuf)>,
    committed: bool,
}

impl StagedOutput {
    /// Register a destination and return its temporary path
    fn stage(&mut self, dest: &Path) -> PathBuf {
        let tmp = staging_path(dest);
        self.files.push((tmp.clone(), dest.to_path_buf()));
        tmp
    }

    fn commit(mut self) -> Result<()> {
        for (done, (tmp, dest)) in self.files.iter().enumerate() {
            if let Err(e) = std::fs::rename(tmp, dest) {
                tracing::warn!("Failed to commit {}: {}", dest.display(), e);
                for (_, renamed) in &self.files[..done] {
                    let _ = std::fs::remove_file(renamed);
                }
                return Err(e.into());
            }
            tracing::debug!("Committed {}", dest.display());
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (tmp, _) in &self.files {
            let _ = std::fs::remove_file(tmp);
        }
    }
}
