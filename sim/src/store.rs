//! Snapshot store: persist suggester state between runs as pretty JSON.

use anyhow::Context;
use search_core::SuggesterSnapshot;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Save a suggester snapshot to a JSON file.
///
/// Non-finite densities cannot be represented in JSON and are refused.
pub fn save_snapshot(snapshot: &SuggesterSnapshot, path: &Path) -> anyhow::Result<()> {
    if snapshot.densities.data.iter().any(|d| !d.is_finite()) {
        anyhow::bail!("refusing to save non-finite ensemble densities to {}", path.display());
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating snapshot file {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot)?;
    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Load a suggester snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> anyhow::Result<SuggesterSnapshot> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening snapshot file {}", path.display()))?;
    let reader = BufReader::new(file);
    let snapshot: SuggesterSnapshot = serde_json::from_reader(reader)
        .with_context(|| format!("parsing snapshot file {}", path.display()))?;
    Ok(snapshot)
}
