//! Writers for trajectory frames, recorded snapshots and the final colony state.

use crate::colony::Colony;
use anyhow::{Context, Result};
use colony_common::Snapshot;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// On-disk encoding of the recorded snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SnapshotFormat {
    /// Parses the `output.format` setting. Unknown names fall back to JSON.
    pub fn parse(name: Option<&str>) -> Self {
        match name.unwrap_or("json") {
            "json" => SnapshotFormat::Json,
            "bincode" => SnapshotFormat::Bincode,
            "messagepack" => SnapshotFormat::MessagePack,
            other => {
                warn!("Unknown output format: {}. Using JSON instead.", other);
                SnapshotFormat::Json
            }
        }
    }

    fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
            SnapshotFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes all snapshots to `{base}_snapshots.{ext}` and returns the path.
pub fn save_snapshots(snapshots: &[Snapshot], base: &str, format: SnapshotFormat) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_snapshots.{}", base, format.extension()));
    let file = File::create(&path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        SnapshotFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        SnapshotFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;

    info!("{} snapshots saved to {}", snapshots.len(), path.display());
    Ok(path)
}

/// Writes `id,x,y,radius` for every cell to `{base}_final_positions.csv`.
pub fn save_final_positions(colony: &Colony, base: &str) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_final_positions.csv", base));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["id", "x", "y", "radius"])?;
    for cell in colony.cells() {
        let p = cell.position();
        writer.write_record(&[
            cell.id().to_string(),
            format!("{:.6}", p.x),
            format!("{:.6}", p.y),
            format!("{:.6}", cell.radius()),
        ])?;
    }
    writer.flush()?;
    info!("Final positions saved to {}", path.display());
    Ok(path)
}

/// Writes one pair of text frames per recorded step into `{base}_frames/`:
/// `cells_NNNNNN.txt` with `id x y radius` lines and `centers_NNNNNN.txt`
/// with `x y 0` lines.
#[derive(Debug)]
pub struct TrajectoryWriter {
    dir: PathBuf,
    frames_written: usize,
}

impl TrajectoryWriter {
    pub fn create(base: &str) -> Result<Self> {
        let dir = PathBuf::from(format!("{}_frames", base));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Error creating frame directory '{}'", dir.display()))?;
        Ok(Self { dir, frames_written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn write_frame(&mut self, step: u32, colony: &Colony) -> Result<()> {
        let cells_path = self.dir.join(format!("cells_{:06}.txt", step));
        let centers_path = self.dir.join(format!("centers_{:06}.txt", step));

        let mut cells_out = BufWriter::new(
            File::create(&cells_path).with_context(|| format!("Error creating '{}'", cells_path.display()))?,
        );
        let mut centers_out = BufWriter::new(
            File::create(&centers_path).with_context(|| format!("Error creating '{}'", centers_path.display()))?,
        );
        for cell in colony.cells() {
            cell.write_txt_record(&mut cells_out)?;
            cell.write_center_record(&mut centers_out)?;
        }
        cells_out.flush()?;
        centers_out.flush()?;

        self.frames_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_common::Vec2;

    fn two_cells() -> Colony {
        let mut colony = Colony::new();
        colony.add_founder(Vec2::new(0.0, 0.5), 0.6, 0.5).unwrap();
        colony.add_founder(Vec2::new(-1.25, 2.0), 0.6, 0.25).unwrap();
        colony
    }

    fn base_in(dir: &tempfile::TempDir) -> String {
        dir.path().join("run").to_string_lossy().into_owned()
    }

    fn snapshot(step: u32) -> Snapshot {
        Snapshot {
            step,
            time: step as f64 * 0.1,
            total_cell_count: 2,
            bud_count: 0,
            phase_counts: [2, 0, 0, 0],
            mean_radius: 0.375,
            max_overlap: 0.0,
            cells: None,
        }
    }

    #[test]
    fn format_names_parse_with_json_fallback() {
        assert_eq!(SnapshotFormat::parse(None), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::parse(Some("bincode")), SnapshotFormat::Bincode);
        assert_eq!(SnapshotFormat::parse(Some("messagepack")), SnapshotFormat::MessagePack);
        assert_eq!(SnapshotFormat::parse(Some("yaml")), SnapshotFormat::Json);
    }

    #[test]
    fn trajectory_frames_hold_both_record_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TrajectoryWriter::create(&base_in(&dir)).unwrap();
        writer.write_frame(7, &two_cells()).unwrap();
        assert_eq!(writer.frames_written(), 1);

        let cells = fs::read_to_string(writer.dir().join("cells_000007.txt")).unwrap();
        assert_eq!(cells, "0 0 0.5 0.5\n1 -1.25 2 0.25\n");
        let centers = fs::read_to_string(writer.dir().join("centers_000007.txt")).unwrap();
        assert_eq!(centers, "0 0.5 0\n-1.25 2 0\n");
    }

    #[test]
    fn json_snapshots_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = vec![snapshot(0), snapshot(50)];
        let path = save_snapshots(&snapshots, &base_in(&dir), SnapshotFormat::Json).unwrap();
        assert!(path.to_string_lossy().ends_with("run_snapshots.json"));

        let loaded: Vec<Snapshot> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].step, 50);
        assert!(loaded[1].cells.is_none());
    }

    #[test]
    fn binary_snapshot_formats_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = vec![snapshot(0)];
        for format in [SnapshotFormat::Bincode, SnapshotFormat::MessagePack] {
            let path = save_snapshots(&snapshots, &base_in(&dir), format).unwrap();
            assert!(fs::metadata(&path).unwrap().len() > 0, "{:?}", format);
        }
    }

    #[test]
    fn final_positions_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_final_positions(&two_cells(), &base_in(&dir)).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,x,y,radius");
        assert_eq!(lines[1], "0,0.000000,0.500000,0.500000");
        assert_eq!(lines.len(), 3);
    }
}
