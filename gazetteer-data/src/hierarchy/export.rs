//! Plain-text dump of country boundary rings for visual inspection.
//!
//! One file per country, one `lon,lat` line per ring point in ring order.

use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use gazetteer_core::Polygon;
use thiserror::Error;

/// Errors raised while writing a boundary export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export file could not be created.
    #[error("failed to create boundary export at {path:?}")]
    Create {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing ring points failed.
    #[error("failed to write boundary export at {path:?}")]
    Write {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    /// File the failed export targeted.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Create { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

/// Turn a boundary name into a single path component.
///
/// Separators and NUL are replaced with `_`; names that would resolve to the
/// directory itself or its parent become `_`.
#[must_use]
pub fn export_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "_".to_owned(),
        _ => cleaned,
    }
}

/// Write `polygon`'s ring to `<dir>/<name>`, creating `dir` if needed.
///
/// Returns the path written.
pub fn export_ring(
    dir: &Utf8Path,
    name: &str,
    polygon: &Polygon,
) -> Result<Utf8PathBuf, ExportError> {
    let file_name = export_file_name(name);
    let path = dir.join(&file_name);
    let file = gazetteer_fs::create_file_in(dir, &file_name).map_err(|source| {
        ExportError::Create {
            path: path.clone(),
            source,
        }
    })?;

    let mut writer = BufWriter::new(file);
    let written = polygon
        .points()
        .iter()
        .try_for_each(|point| writeln!(writer, "{},{}", point.lon, point.lat))
        .and_then(|()| writer.flush());
    written.map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazetteer_core::Point;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        (dir, path)
    }

    #[rstest]
    fn writes_one_line_per_point_longitude_first(temp_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, base) = temp_dir;
        let polygon = Polygon::new(vec![
            Point::new(42.5, 74.0),
            Point::new(42.5, 75.25),
            Point::new(43.0, 75.25),
        ]);
        let path = export_ring(&base.join("rings"), "Kyrgyzstan", &polygon).expect("export");

        assert_eq!(path, base.join("rings/Kyrgyzstan"));
        let contents = std::fs::read_to_string(path.as_std_path()).expect("read back");
        assert_eq!(contents, "74,42.5\n75.25,42.5\n75.25,43\n");
    }

    #[rstest]
    #[case("Kyrgyzstan", "Kyrgyzstan")]
    #[case("Bosnia/Herzegovina", "Bosnia_Herzegovina")]
    #[case("..", "_")]
    #[case("", "_")]
    fn sanitises_file_names(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(export_file_name(name), expected);
    }

    #[rstest]
    fn reports_create_failures_with_path(temp_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, base) = temp_dir;
        let blocker = base.join("occupied");
        std::fs::write(blocker.as_std_path(), b"not a directory").expect("write blocker");

        let polygon = Polygon::new(vec![Point::new(0.0, 0.0)]);
        let err = export_ring(&blocker, "Kyrgyzstan", &polygon).expect_err("dir is a file");
        assert!(matches!(err, ExportError::Create { .. }));
        assert_eq!(err.path(), blocker.join("Kyrgyzstan"));
    }
}
