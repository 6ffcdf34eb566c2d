// src/report_sink.rs
use std::{io::Write, path::Path, process::Command};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::report::ReportRow;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to open {path}: {reason}")]
    ViewerLaunch { path: String, reason: String },
}

/// Writes the report table, header first, one record per row.
pub fn write_report<W: Write>(writer: W, rows: &[ReportRow], delimiter: u8) -> Result<(), SinkError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    csv_writer.write_record(ReportRow::header())?;
    for row in rows {
        csv_writer.write_record(row.to_record())?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_report(path: &Path, rows: &[ReportRow], delimiter: u8) -> Result<(), SinkError> {
    let file = std::fs::File::create(path)?;
    write_report(file, rows, delimiter)?;
    info!("Wrote {} report rows to {}", rows.len(), path.display());
    Ok(())
}

// --- Viewer Capability ---

/// Opens a finished report for the user. Callers treat failures as warnings.
pub trait FileViewer {
    fn open(&self, path: &Path) -> Result<(), SinkError>;
}

/// Hands the file to the host's default application.
pub struct SystemViewer;

impl SystemViewer {
    fn command_for(path: &Path) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(path);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }
}

impl FileViewer for SystemViewer {
    fn open(&self, path: &Path) -> Result<(), SinkError> {
        let launch_error = |reason: String| SinkError::ViewerLaunch {
            path: path.display().to_string(),
            reason,
        };
        let status = Self::command_for(path)
            .status()
            .map_err(|e| launch_error(e.to_string()))?;
        if !status.success() {
            return Err(launch_error(format!("viewer exited with {}", status)));
        }
        info!("Opened {} in the default viewer", path.display());
        Ok(())
    }
}

/// Best-effort open; a failure is logged and reported as `false`.
pub fn open_report(viewer: &dyn FileViewer, path: &Path) -> bool {
    match viewer.open(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

/// Used when opening the report is switched off.
pub struct NoopViewer;

impl FileViewer for NoopViewer {
    fn open(&self, path: &Path) -> Result<(), SinkError> {
        debug!("Report viewer disabled, not opening {}", path.display());
        Ok(())
    }
}

pub fn viewer_for(open_report: bool) -> Box<dyn FileViewer> {
    if open_report {
        Box::new(SystemViewer)
    } else {
        Box::new(NoopViewer)
    }
}
