//! Running an export and reading back what it wrote.

use crate::Setup;

use apache_avro::types::Value as AvroValue;
use dbexport_avro::METADATA_SCHEMA;
use dbexport::{
    manifest::{ManifestDocument, ObjectStatus},
    CancellationToken, ExportConfig, Exporter, RunReport,
};
use std::{collections::HashMap, fs, path::Path};
use tempfile::TempDir;

/// A finished run and the directory it wrote to.
pub struct Export {
    pub dir: TempDir,
    pub report: RunReport,
}

/// Exports `setup`'s database into a fresh directory. `configure` adjusts
/// the defaults, which already use millisecond retry delays.
pub async fn export<S: Setup + ?Sized>(
    setup: &S,
    configure: impl FnOnce(ExportConfig) -> ExportConfig,
) -> Export {
    export_until(setup, CancellationToken::new(), configure).await
}

/// Like [`export`], stopping when `cancel` fires.
pub async fn export_until<S: Setup + ?Sized>(
    setup: &S,
    cancel: CancellationToken,
    configure: impl FnOnce(ExportConfig) -> ExportConfig,
) -> Export {
    let dir = tempfile::tempdir().unwrap();
    let config = configure(
        ExportConfig::new(dir.path())
            .backoff(std::time::Duration::from_millis(1), std::time::Duration::from_millis(5)),
    );

    let exporter = Exporter::from_shared(setup.driver().await, config);
    let report = exporter.run(cancel).await;

    Export { dir, report }
}

impl Export {
    #[track_caller]
    pub fn manifest(&self) -> &ManifestDocument {
        self.report
            .manifest
            .as_ref()
            .unwrap_or_else(|| panic!("no manifest; error={:?}", self.report.error))
    }

    pub fn status(&self, object: &str) -> &ObjectStatus {
        &self.manifest().objects[object].status
    }

    /// The files of `object`, in shard order.
    pub fn files(&self, object: &str) -> Vec<AvroFile> {
        self.manifest()
            .files(object)
            .into_iter()
            .map(|name| AvroFile::open(&self.dir.path().join(name)))
            .collect()
    }

    /// Every record of `object`, across its files.
    pub fn records(&self, object: &str) -> Vec<AvroValue> {
        self.files(object)
            .into_iter()
            .flat_map(|file| file.records)
            .collect()
    }

    /// Names of every entry in the output directory.
    pub fn dir_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// One Avro object container file, fully read.
pub struct AvroFile {
    /// The synthesized schema document stored with the file
    pub schema: serde_json::Value,
    pub metadata: HashMap<String, Vec<u8>>,
    pub records: Vec<AvroValue>,
}

impl AvroFile {
    pub fn open(path: &Path) -> Self {
        let file = fs::File::open(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        let reader = apache_avro::Reader::new(file).unwrap();

        let metadata = reader.user_metadata().clone();
        let schema = serde_json::from_slice(&metadata[METADATA_SCHEMA]).unwrap();
        let records = reader.map(Result::unwrap).collect();

        Self {
            schema,
            metadata,
            records,
        }
    }

    #[track_caller]
    pub fn metadata(&self, key: &str) -> &str {
        std::str::from_utf8(&self.metadata[key]).unwrap()
    }
}

/// The value of column `name` in `record`, with any null union unwrapped.
#[track_caller]
pub fn column<'a>(record: &'a AvroValue, name: &str) -> &'a AvroValue {
    let AvroValue::Record(fields) = record else {
        panic!("not a record: {record:?}");
    };

    let value = fields
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, value)| value)
        .unwrap_or_else(|| panic!("no column `{name}` in {record:?}"));

    match value {
        AvroValue::Union(_, value) => value,
        value => value,
    }
}

/// The `id` column of every record, sorted.
pub fn ids(records: &[AvroValue]) -> Vec<i64> {
    let mut ids: Vec<i64> = records
        .iter()
        .map(|record| match column(record, "id") {
            AvroValue::Long(id) => *id,
            other => panic!("id is not a long: {other:?}"),
        })
        .collect();
    ids.sort();
    ids
}
