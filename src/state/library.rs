use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};

use super::data::{Asset, Category};

const ASSET_COLUMNS: &str = "id, category, name, small_bundle, medium_bundle, large_bundle, favorite, has_backup";

/// Listing filter for [`Library::assets`]
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    /// Substring matched against the asset name
    pub filter: Option<String>,
    /// Also match the filter against the large bundle code
    pub search_bundles: bool,
    /// Only favorites. The text filter is ignored in this mode.
    pub favorites_only: bool,
}

/// The Library manages the SQLite asset catalog.
/// It stores the bundle codes of every asset plus the favorite and backup flags.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open the catalog at its default location:
    /// - Linux: ~/.local/share/texture-swap/catalog.db
    /// - macOS: ~/Library/Application Support/texture-swap/catalog.db
    /// - Windows: %APPDATA%\texture-swap\catalog.db
    pub fn new() -> crate::Result<Self> {
        let db_path = Self::default_db_path().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine user data directory",
            )
        })?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self::open(&db_path)?)
    }

    /// Open or create a catalog database file
    pub fn open(path: &Path) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        tracing::info!("📁 Catalog opened at: {}", path.display());

        let mut library = Library {
            conn,
            db_path: path.to_path_buf(),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Catalog that lives only as long as the returned value
    pub fn open_in_memory() -> SqlResult<Self> {
        let mut library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    fn default_db_path() -> Option<PathBuf> {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join("texture-swap").join("catalog.db"))
    }

    /// Create tables and indexes if they don't exist.
    fn init_schema(&mut self) -> SqlResult<()> {
        // Bundle codes are unique within their slot class
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS assets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                category        TEXT NOT NULL,
                name            TEXT NOT NULL,
                small_bundle    TEXT NOT NULL UNIQUE,
                medium_bundle   TEXT NOT NULL UNIQUE,
                large_bundle    TEXT UNIQUE,
                favorite        INTEGER NOT NULL DEFAULT 0,
                has_backup      INTEGER NOT NULL DEFAULT 0,
                backed_up_at    INTEGER
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_category_name
             ON assets(category, name)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Number of assets in a category
    pub fn asset_count(&self, category: Category) -> SqlResult<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM assets WHERE category = ?1",
            [category.to_string()],
            |row| row.get(0),
        )
    }

    /// Add an asset and return its new ID
    pub fn insert_asset(
        &self,
        category: Category,
        name: &str,
        small_bundle: &str,
        medium_bundle: &str,
        large_bundle: Option<&str>,
    ) -> SqlResult<i64> {
        self.conn.execute(
            "INSERT INTO assets (category, name, small_bundle, medium_bundle, large_bundle)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category.to_string(),
                name,
                small_bundle,
                medium_bundle,
                large_bundle
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List assets of a category ordered by name
    pub fn assets(&self, category: Category, query: &AssetQuery) -> SqlResult<Vec<Asset>> {
        let filter = if query.favorites_only {
            None
        } else {
            query.filter.as_deref().filter(|f| !f.is_empty())
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets
             WHERE category = ?1
               AND (?2 IS NULL
                    OR name LIKE '%' || ?2 || '%'
                    OR (?3 AND large_bundle LIKE '%' || ?2 || '%'))
               AND (NOT ?4 OR favorite = 1)
             ORDER BY name"
        ))?;

        let rows = stmt.query_map(
            params![
                category.to_string(),
                filter,
                query.search_bundles,
                query.favorites_only
            ],
            row_to_asset,
        )?;

        rows.collect()
    }

    /// Find the asset owning a bundle code in any of its slots
    pub fn find_by_bundle(&self, bundle: &str) -> SqlResult<Option<Asset>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {ASSET_COLUMNS} FROM assets
                     WHERE small_bundle = ?1 OR medium_bundle = ?1 OR large_bundle = ?1"
                ),
                [bundle],
                row_to_asset,
            )
            .optional()
    }

    pub fn get_asset(&self, id: i64) -> SqlResult<Option<Asset>> {
        self.conn
            .query_row(
                &format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?1"),
                [id],
                row_to_asset,
            )
            .optional()
    }

    /// Record whether an asset has a backup. Setting it stamps the time.
    pub fn set_backup_state(&self, id: i64, has_backup: bool) -> SqlResult<()> {
        let stamp = has_backup.then(|| Utc::now().timestamp());
        self.conn.execute(
            "UPDATE assets SET has_backup = ?1, backed_up_at = ?2 WHERE id = ?3",
            params![has_backup, stamp, id],
        )?;
        Ok(())
    }

    /// When the asset was backed up, if it was
    pub fn backed_up_at(&self, id: i64) -> SqlResult<Option<DateTime<Utc>>> {
        let stamp: Option<i64> = self.conn.query_row(
            "SELECT backed_up_at FROM assets WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(stamp.and_then(|secs| Utc.timestamp_opt(secs, 0).single()))
    }

    pub fn set_favorite(&self, id: i64, favorite: bool) -> SqlResult<()> {
        self.conn.execute(
            "UPDATE assets SET favorite = ?1 WHERE id = ?2",
            params![favorite, id],
        )?;
        Ok(())
    }
}

fn row_to_asset(row: &Row<'_>) -> SqlResult<Asset> {
    let category: String = row.get(1)?;
    let category = category.parse::<Category>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Asset {
        id: row.get(0)?,
        category,
        name: row.get(2)?,
        small_bundle: row.get(3)?,
        medium_bundle: row.get(4)?,
        large_bundle: row.get(5)?,
        favorite: row.get(6)?,
        has_backup: row.get(7)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
