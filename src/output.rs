use crate::types::{DashboardRecord, RoutineEntry};

use std::fs;
use std::path::{Path, PathBuf};

const FINAL_CSV: &str = "final_combined_routine.csv";
const FINAL_JSON: &str = "final_combined_routine.json";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("could not serialize {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persists per-user debugging artifacts and the final combined routine.
/// Directories are supplied by the caller; write failures are logged and
/// never abort the run, so remaining outputs are still attempted.
pub struct DatasetWriter {
    final_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl DatasetWriter {
    pub fn new(final_dir: PathBuf, scratch_dir: PathBuf) -> Self {
        Self {
            final_dir,
            scratch_dir,
        }
    }

    /// Writes the combined routine as CSV and JSON with fixed filenames.
    pub fn write_final(&self, entries: &[RoutineEntry]) {
        if entries.is_empty() {
            return;
        }
        log_write(write_csv(&self.final_dir.join(FINAL_CSV), entries));
        log_write(write_json(&self.final_dir.join(FINAL_JSON), entries));
    }

    /// Writes one user's raw fragment and parsed records to the scratch
    /// dir, named by session tag. Debugging aids only.
    pub fn write_session(&self, records: &[DashboardRecord], fragment: &str, tag: &str) {
        let html = format!(
            "<html><head><meta charset='utf-8'></head><body>{fragment}</body></html>"
        );
        log_write(write_text(
            &self.scratch_dir.join(format!("attendance_dashboard_{tag}.html")),
            &html,
        ));
        if records.is_empty() {
            return;
        }
        log_write(write_dashboard_csv(
            &self.scratch_dir.join(format!("dashboard_data_{tag}.csv")),
            records,
        ));
        log_write(write_json(
            &self.scratch_dir.join(format!("dashboard_data_{tag}.json")),
            records,
        ));
    }
}

fn log_write(result: Result<PathBuf, OutputError>) {
    match result {
        Ok(path) => log::info!("data saved to {}", path.display()),
        Err(e) => log::error!("{e}"),
    }
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_csv(path: &Path, entries: &[RoutineEntry]) -> Result<PathBuf, OutputError> {
    ensure_parent(path)?;
    let to_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    for entry in entries {
        writer.serialize(entry).map_err(to_err)?;
    }
    writer.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

fn write_dashboard_csv(path: &Path, records: &[DashboardRecord]) -> Result<PathBuf, OutputError> {
    ensure_parent(path)?;
    let to_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    writer
        .write_record([
            "SL",
            "UserScrapedSection",
            "CourseCode",
            "CourseTitle",
            "Credit",
            "CourseSection",
            "ScheduleOne_Day",
            "ScheduleOne_Time",
            "ScheduleOne_Room",
            "ScheduleOne_TeacherInitial",
            "ScheduleTwo_Day",
            "ScheduleTwo_Time",
            "ScheduleTwo_Room",
            "ScheduleTwo_TeacherInitial",
        ])
        .map_err(to_err)?;
    for r in records {
        writer
            .write_record([
                &r.serial,
                &r.section_tag,
                &r.course_code,
                &r.course_title,
                &r.credit,
                &r.course_section,
                &r.slot_one.day,
                &r.slot_one.time,
                &r.slot_one.room,
                &r.slot_one.teacher_initial,
                &r.slot_two.day,
                &r.slot_two.time,
                &r.slot_two.room,
                &r.slot_two.teacher_initial,
            ])
            .map_err(to_err)?;
    }
    writer.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, data: &T) -> Result<PathBuf, OutputError> {
    ensure_parent(path)?;
    let raw = serde_json::to_string_pretty(data).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &raw)
}

fn write_text(path: &Path, contents: &str) -> Result<PathBuf, OutputError> {
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}
