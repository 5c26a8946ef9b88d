// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! SQLite-backed spot store
//!
//! The connection is owned by a dedicated worker thread. Callers submit
//! closures over a channel and await the reply, so every access is scoped to
//! one task and the connection is released when the store is dropped.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Row};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::migrations::run_migrations;
use super::model::{GeoPoint, GeoSpot, NewSpot};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to spot store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join spot store thread: {join_err:?}");
            }
        }
    }
}

fn row_to_spot(row: &Row) -> rusqlite::Result<GeoSpot> {
    let location = GeoPoint {
        x: row.get("longitude")?,
        y: row.get("latitude")?,
        srid: row.get("srid")?,
    };
    Ok(GeoSpot::from_parts(
        row.get("id")?,
        row.get("name")?,
        row.get("category")?,
        location,
    ))
}

fn insert_spot(conn: &Connection, spot: &NewSpot) -> Result<i64> {
    let location = spot.location();
    location.validate()?;

    conn.execute(
        "INSERT INTO geo_spots (name, category, longitude, latitude, srid)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![spot.name, spot.category, location.x, location.y, location.srid],
    )
    .context("failed to insert spot")?;

    Ok(conn.last_insert_rowid())
}

/// Handle to the spot database; cheap to clone
#[derive(Clone)]
pub struct SpotStore {
    inner: Arc<StoreInner>,
    location: Arc<String>,
}

impl std::fmt::Debug for SpotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SpotStore {
    /// Open (or create) the database file at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path: PathBuf = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let location = db_path.display().to_string();
        Self::spawn(location, move || {
            let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
            if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                warn!("Failed to enable WAL mode: {err}");
            }
            Ok(conn)
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::spawn(":memory:".to_string(), || {
            Connection::open_in_memory().context("failed to open in-memory SQLite database")
        })
    }

    fn spawn<F>(location: String, opener: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Connection> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let worker = thread::Builder::new()
            .name("pulseview-spots".into())
            .spawn(move || {
                let mut conn = match opener() {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("Spot store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Spot store thread shutting down");
            })
            .context("failed to spawn spot store worker thread")?;

        ready_rx
            .recv()
            .context("spot store worker exited before signaling readiness")??;

        info!("Spot store ready at {}", location);

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            location: Arc::new(location),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Spot store caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to spot store thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("spot store thread terminated unexpectedly"))?
    }

    /// List spots in insertion order, skipping `skip` and returning at most `limit`
    pub async fn list_spots(&self, skip: u32, limit: u32) -> Result<Vec<GeoSpot>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, category, longitude, latitude, srid
                 FROM geo_spots
                 ORDER BY id ASC
                 LIMIT ?1 OFFSET ?2",
            )?;

            let spots = stmt
                .query_map(params![i64::from(limit), i64::from(skip)], row_to_spot)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("failed to read spots")?;

            Ok(spots)
        })
        .await
    }

    /// Persist a new spot and return it with its assigned id
    pub async fn create_spot(&self, spot: NewSpot) -> Result<GeoSpot> {
        self.execute(move |conn| {
            let id = insert_spot(conn, &spot)?;

            let mut stmt = conn.prepare(
                "SELECT id, name, category, longitude, latitude, srid
                 FROM geo_spots
                 WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(row_to_spot(row)?),
                None => Err(anyhow!("spot {id} not found after insert")),
            }
        })
        .await
    }

    /// Insert many spots in one transaction; returns the number inserted
    pub async fn insert_spots(&self, spots: Vec<NewSpot>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open insert transaction")?;
            for (index, spot) in spots.iter().enumerate() {
                insert_spot(&tx, spot).with_context(|| format!("row {index} ({})", spot.name))?;
            }
            tx.commit().context("failed to commit spot batch")?;
            Ok(spots.len())
        })
        .await
    }

    pub async fn count_spots(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM geo_spots", [], |row| row.get(0))?;
            u64::try_from(count).map_err(|_| anyhow!("negative spot count {count}"))
        })
        .await
    }
}
