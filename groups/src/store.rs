//! Reads groups out of the host's SQLite database. Deployments disagree on
//! table and column names, so every lookup walks an ordered candidate list and
//! takes the first one that exists.
use crate::normalize::{display_string, normalize_key, safe_count};
use crate::types::{Group, GroupKey, RawValue};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const GROUP_TABLES: &[&str] = &["groups", "group"];
const ID_COLUMNS: &[&str] = &["id", "uuid"];
const NAME_COLUMNS: &[&str] = &["name"];
const MEMBER_COUNT_COLUMNS: &[&str] = &["members", "member_count", "members_count"];
const MEMBERSHIP_TABLES: &[&str] = &[
    "group_members",
    "group_users",
    "groups_users",
    "user_groups",
    "group_memberships",
];
const GROUP_REFERENCE_COLUMNS: &[&str] = &["group_id", "groupId", "group", "group_uuid"];

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("groups table `{0}` has no valid name column")]
    MissingNameColumn(String),

    #[error("groups table `{0}` has no valid id column")]
    MissingIdColumn(String),
}

pub trait GroupStore: Send + Sync {
    /// `Ok(None)` means there is no store to read from at all, which is
    /// different from a store that holds zero groups.
    fn fetch(&self) -> Result<Option<Vec<Group>>, StoreError>;
}

pub struct SqliteGroupStore {
    path: PathBuf,
}

impl SqliteGroupStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteGroupStore {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl GroupStore for SqliteGroupStore {
    fn fetch(&self) -> Result<Option<Vec<Group>>, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "groups store not found");
            return Ok(None);
        }

        // Read-only so a missing or mistyped path never creates a new database.
        // The connection is dropped, and closed, on every return path.
        let result = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StoreError::from)
        .and_then(|conn| read_groups(&conn));

        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                path = %self.path.display(),
                "failed to read groups from store"
            );
        }

        result.map(Some)
    }
}

struct GroupRow {
    id: RawValue,
    name: RawValue,
    members: Option<RawValue>,
}

fn read_groups(conn: &Connection) -> Result<Vec<Group>, StoreError> {
    let Some(table) = first_match(GROUP_TABLES, |name| table_exists(conn, name))? else {
        tracing::warn!("no groups table present in the store");
        return Ok(Vec::new());
    };

    let columns = table_columns(conn, table)?;
    let id_column = pick_column(ID_COLUMNS, &columns)
        .ok_or_else(|| StoreError::MissingIdColumn(table.to_string()))?;
    let name_column = pick_column(NAME_COLUMNS, &columns)
        .ok_or_else(|| StoreError::MissingNameColumn(table.to_string()))?;
    let members_column = pick_column(MEMBER_COUNT_COLUMNS, &columns);

    let mut selected = vec![quote_ident(id_column), quote_ident(name_column)];
    if let Some(column) = members_column {
        selected.push(quote_ident(column));
    }
    let sql = format!("SELECT {} FROM {}", selected.join(", "), quote_ident(table));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let members = match members_column {
                Some(_) => Some(row.get::<_, Value>(2)?.into()),
                None => None,
            };
            Ok(GroupRow {
                id: row.get::<_, Value>(0)?.into(),
                name: row.get::<_, Value>(1)?.into(),
                members,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // A denormalized count column wins; membership tables are only consulted
    // when the groups table has none.
    let counts = match members_column {
        Some(_) => HashMap::new(),
        None => membership_counts(conn)?,
    };

    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(id), Some(name)) = (normalize_key(&row.id), display_string(&row.name)) else {
            tracing::debug!(table, "skipping group row with null id or name");
            continue;
        };
        let members = match &row.members {
            Some(raw) => safe_count(raw),
            None => counts.get(&id).copied().unwrap_or(0),
        };
        groups.push(Group::new(id, name, members));
    }

    Ok(groups)
}

/// Member counts keyed by normalized group id, taken from the first
/// membership table that carries a recognizable group reference column.
fn membership_counts(conn: &Connection) -> Result<HashMap<GroupKey, u64>, StoreError> {
    let Some((table, column)) = resolve_membership_table(conn)? else {
        return Ok(HashMap::new());
    };

    let column = quote_ident(column);
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM {} GROUP BY {column}",
        quote_ident(table)
    );

    let mut counts = HashMap::new();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let raw: RawValue = row.get::<_, Value>(0)?.into();
        let count: i64 = row.get(1)?;
        // "1" and 1 are separate SQL groups but the same key
        if let Some(key) = normalize_key(&raw) {
            *counts.entry(key).or_insert(0) += u64::try_from(count).unwrap_or(0);
        }
    }

    Ok(counts)
}

fn resolve_membership_table(
    conn: &Connection,
) -> Result<Option<(&'static str, &'static str)>, StoreError> {
    for &table in MEMBERSHIP_TABLES {
        if !table_exists(conn, table)? {
            continue;
        }

        let columns = table_columns(conn, table)?;
        if let Some(column) = pick_column(GROUP_REFERENCE_COLUMNS, &columns) {
            tracing::debug!(table, column, "using membership table");
            return Ok(Some((table, column)));
        }
    }

    Ok(None)
}

fn first_match<F>(
    candidates: &[&'static str],
    mut predicate: F,
) -> Result<Option<&'static str>, StoreError>
where
    F: FnMut(&str) -> Result<bool, StoreError>,
{
    for &candidate in candidates {
        if predicate(candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn pick_column(candidates: &[&'static str], columns: &HashSet<String>) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| columns.contains(*candidate))
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(name) FROM sqlite_master WHERE type = 'table' AND name = :tname",
        &[(":tname", name)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(columns)
}

// `group` is a reserved word, so every interpolated identifier is quoted.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
