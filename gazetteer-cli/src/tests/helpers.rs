//! Test helpers for decoding the sample extract and capturing JSON output.

use base64::{Engine as _, engine::general_purpose};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, io::Write};
use tempfile::{Builder, TempDir, TempPath};

/// Sample extract and a scratch directory for the index database.
pub(super) struct SampleWorkspace {
    _dir: TempDir,
    root: Utf8PathBuf,
    extract: TempPath,
}

impl SampleWorkspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Self {
            _dir: dir,
            root,
            extract: decode_fixture("bishkek"),
        }
    }

    pub(super) fn extract(&self) -> &Utf8Path {
        Utf8Path::from_path(&self.extract).expect("utf-8 fixture path")
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn index_db(&self) -> Utf8PathBuf {
        self.root.join("index").join("gazetteer.db")
    }
}

/// Decode `tests/fixtures/<stem>.osm.pbf.b64` into a temporary file.
pub(super) fn decode_fixture(stem: &str) -> TempPath {
    let encoded_path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(format!("{stem}.osm.pbf.b64"));
    let encoded = fs::read_to_string(&encoded_path).unwrap_or_else(|err| {
        panic!("failed to read base64 fixture {encoded_path:?}: {err}");
    });
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let decoded = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .unwrap_or_else(|err| panic!("failed to decode base64 fixture {encoded_path:?}: {err}"));
    let mut tempfile = Builder::new()
        .prefix(stem)
        .suffix(".osm.pbf")
        .tempfile()
        .expect("create temporary fixture");
    tempfile.write_all(&decoded).expect("write decoded fixture");
    tempfile.flush().expect("flush decoded fixture");
    tempfile.into_temp_path()
}

/// Parse captured command output as JSON.
pub(super) fn output_json(buffer: &[u8]) -> serde_json::Value {
    serde_json::from_slice(buffer).expect("command output is JSON")
}
