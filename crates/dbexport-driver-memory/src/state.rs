use dbexport_core::{
    bail,
    driver::Capability,
    err,
    schema::{Catalog, Object, ObjectKind},
    stmt::{Key, KeyRange, ValueRecord},
    Error, Result,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Every object and row version ever committed.
#[derive(Debug, Default)]
pub(crate) struct State {
    seq: u64,
    objects: IndexMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    object: Object,
    created: u64,
    dropped: Option<u64>,

    /// Positions of the primary key columns in a row
    key: Vec<usize>,

    rows: BTreeMap<Key, Vec<Version>>,
}

#[derive(Debug)]
struct Version {
    seq: u64,

    /// `None` marks a delete
    row: Option<ValueRecord>,
}

impl State {
    pub(crate) fn latest(&self) -> u64 {
        self.seq
    }

    pub(crate) fn create(&mut self, capability: &Capability, object: Object) -> Result<u64> {
        match &object.kind {
            ObjectKind::Table { .. } => {}
            ObjectKind::Model if !capability.models => {
                bail!("{} databases have no models", capability.dialect)
            }
            ObjectKind::SearchIndex { .. } if !capability.search_indexes => {
                bail!("{} databases have no search indexes", capability.dialect)
            }
            ObjectKind::SearchIndex { table, .. } => {
                if !self.is_live(table) {
                    bail!("base table `{table}` of search index `{}` does not exist", object.name);
                }
            }
            ObjectKind::Model => {}
        }

        if self.is_live(&object.name) {
            bail!("object `{}` already exists", object.name);
        }

        let key = object
            .primary_key()
            .iter()
            .map(|name| {
                object
                    .fields
                    .iter()
                    .position(|field| field.name == *name)
                    .ok_or_else(|| err!("primary key column `{name}` not found in `{}`", object.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let seq = self.commit();
        let name = object.name.clone();

        // A dropped object's history is replaced by the new definition.
        self.objects.shift_remove(&name);
        self.objects.insert(
            name,
            Entry {
                object,
                created: seq,
                dropped: None,
                key,
                rows: BTreeMap::new(),
            },
        );

        Ok(seq)
    }

    pub(crate) fn drop_object(&mut self, name: &str) -> Result<u64> {
        if !self.is_live(name) {
            bail!("object `{name}` does not exist");
        }

        let seq = self.commit();
        if let Some(entry) = self.objects.get_mut(name) {
            entry.dropped = Some(seq);
        }
        Ok(seq)
    }

    pub(crate) fn insert(&mut self, table: &str, rows: Vec<ValueRecord>) -> Result<u64> {
        let entry = self.live_table(table)?;

        for row in &rows {
            if row.len() != entry.object.fields.len() {
                bail!(
                    "row for `{table}` has {} values, expected {}",
                    row.len(),
                    entry.object.fields.len()
                );
            }
        }

        let keys = rows
            .iter()
            .map(|row| Key::from_vec(row.project(&entry.key).into_vec()))
            .collect::<Vec<_>>();

        let seq = self.commit();
        let entry = self.entry_mut(table)?;
        for (key, row) in keys.into_iter().zip(rows) {
            entry.rows.entry(key).or_default().push(Version {
                seq,
                row: Some(row),
            });
        }

        Ok(seq)
    }

    pub(crate) fn delete(&mut self, table: &str, keys: Vec<Key>) -> Result<u64> {
        self.live_table(table)?;

        let seq = self.commit();
        let entry = self.entry_mut(table)?;
        for key in keys {
            if let Some(versions) = entry.rows.get_mut(&key) {
                versions.push(Version { seq, row: None });
            }
        }

        Ok(seq)
    }

    /// Objects visible at `snapshot`: tables, then models, then search
    /// indexes, each by name.
    pub(crate) fn catalog(&self, dialect: dbexport_core::Dialect, snapshot: u64) -> Catalog {
        let mut objects = self
            .objects
            .values()
            .filter(|entry| entry.visible_at(snapshot))
            .map(|entry| entry.object.clone())
            .collect::<Vec<_>>();

        objects.sort_by(|a, b| {
            kind_rank(a)
                .cmp(&kind_rank(b))
                .then_with(|| a.name.cmp(&b.name))
        });

        Catalog::new(dialect, objects)
    }

    /// The latest definition of `name`, if it still exists.
    pub(crate) fn describe(&self, name: &str) -> Option<Object> {
        self.objects
            .get(name)
            .filter(|entry| entry.dropped.is_none())
            .map(|entry| entry.object.clone())
    }

    /// Rows of `table` within `range`, as of `snapshot`, in key order.
    pub(crate) fn scan(&self, table: &str, snapshot: u64, range: &KeyRange) -> Result<Vec<ValueRecord>> {
        let entry = self.readable(table, snapshot)?;

        Ok(entry
            .rows
            .range((range.start.clone(), range.end.clone()))
            .filter_map(|(_, versions)| visible(versions, snapshot))
            .cloned()
            .collect())
    }

    /// Keys of `table` as of `snapshot`, in key order.
    pub(crate) fn keys(&self, table: &str, snapshot: u64) -> Result<Vec<Key>> {
        let entry = self.readable(table, snapshot)?;

        Ok(entry
            .rows
            .iter()
            .filter(|(_, versions)| visible(versions, snapshot).is_some())
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Positions of `columns` in the rows of `table`.
    pub(crate) fn column_positions(&self, table: &str, columns: &[String]) -> Result<Vec<usize>> {
        let entry = self.entry(table)?;
        columns
            .iter()
            .map(|name| {
                entry
                    .object
                    .fields
                    .iter()
                    .position(|field| field.name == *name)
                    .ok_or_else(|| {
                        Error::catalog_drift(table, format!("column {name} no longer exists"))
                    })
            })
            .collect()
    }

    fn readable(&self, table: &str, snapshot: u64) -> Result<&Entry> {
        let entry = self.entry(table)?;

        if entry.dropped.is_some() {
            return Err(Error::catalog_drift(table, "table was dropped"));
        }
        if entry.created > snapshot {
            return Err(Error::catalog_drift(
                table,
                format!("table was created after snapshot {snapshot}"),
            ));
        }
        if !entry.object.is_table() {
            bail!("`{table}` has no rows: it is a {}", entry.object.kind_name());
        }

        Ok(entry)
    }

    fn is_live(&self, name: &str) -> bool {
        self.objects
            .get(name)
            .is_some_and(|entry| entry.dropped.is_none())
    }

    fn live_table(&self, name: &str) -> Result<&Entry> {
        match self.objects.get(name) {
            Some(entry) if entry.dropped.is_none() && entry.object.is_table() => Ok(entry),
            _ => bail!("table `{name}` does not exist"),
        }
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        self.objects
            .get(name)
            .ok_or_else(|| Error::catalog_drift(name, "object does not exist"))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Entry> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| err!("object `{name}` does not exist"))
    }

    fn commit(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

impl Entry {
    fn visible_at(&self, snapshot: u64) -> bool {
        self.created <= snapshot && self.dropped.map_or(true, |dropped| dropped > snapshot)
    }
}

fn visible(versions: &[Version], snapshot: u64) -> Option<&ValueRecord> {
    versions
        .iter()
        .rev()
        .find(|version| version.seq <= snapshot)
        .and_then(|version| version.row.as_ref())
}

fn kind_rank(object: &Object) -> u8 {
    match object.kind {
        ObjectKind::Table { .. } => 0,
        ObjectKind::Model => 1,
        ObjectKind::SearchIndex { .. } => 2,
    }
}
