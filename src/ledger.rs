//! Suspect Ledger
//!
//! Persistent, escalating record of the funding sources behind newly
//! deployed tokens, keyed by funder address. A first sighting of a non-safe
//! funder inserts a row; every later sighting escalates it to the
//! serial-scammer tier. Sightings that resolve to known safe infrastructure
//! (CEX, bridge, DEX, governance) are never tracked and never escalate an
//! existing row; safe-entity protection is absolute.
//!
//! Writes are best-effort: a failed write rolls back, gets logged by the
//! caller, and the event counts as delivered.
//!
//! Author: AI-Generated
//! Created: 2026-08-01

use crate::types::{ChainId, EntityDescriptor};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

/// Risk tier and status label assigned on escalation.
pub const SERIAL_SCAMMER_TIER: u8 = 5;
pub const SERIAL_SCAMMER_STATUS: &str = "Serial Scammer";

const DEFAULT_STATUS: &str = "Detected by Bot";

/// One sighting of a funder behind a new token deployment.
#[derive(Debug, Clone)]
pub struct Sighting {
    pub funder: EntityDescriptor,
    pub chain: ChainId,
    pub impact_usd: Decimal,
    pub evidence_link: String,
}

/// Persistent row, keyed by lowercase funder address.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspectRecord {
    pub address: String,
    pub chain: String,
    pub risk_score: u8,
    pub impact_usd: Decimal,
    pub status: String,
    pub evidence_link: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting of a non-safe funder: new row.
    Inserted,
    /// Repeat sighting of a known address: escalated to the ceiling tier.
    Escalated,
    /// Sighting resolved to safe infrastructure: nothing recorded.
    SkippedSafe,
}

pub struct SuspectLedger {
    conn: Mutex<Connection>,
}

impl SuspectLedger {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).with_context(|| {
            format!(
                "Failed to open suspect database: {}",
                path.as_ref().display()
            )
        })?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS suspects (
                address TEXT PRIMARY KEY,
                chain TEXT NOT NULL,
                risk_score INTEGER NOT NULL,
                impact_usd TEXT NOT NULL,
                status TEXT NOT NULL,
                evidence_link TEXT NOT NULL,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply one sighting. The check-then-act sequence runs in a single
    /// transaction behind the connection mutex, so concurrent traces for the
    /// same funder cannot double-insert or race an insert against an
    /// escalation.
    ///
    /// The escalation key is "have we seen this address before", not the new
    /// sighting's classification. The one exception: a safe-entity sighting
    /// never touches rows at all, guarding against coincidental address
    /// reuse.
    pub fn upsert(&self, sighting: &Sighting) -> Result<UpsertOutcome> {
        if sighting.funder.entity_type.is_safe() {
            return Ok(UpsertOutcome::SkippedSafe);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let address = sighting.funder.address.to_lowercase();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT rowid FROM suspects WHERE address = ?1",
                params![address],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = if existing.is_some() {
            // impact_usd and evidence_link from the first sighting are kept.
            tx.execute(
                "UPDATE suspects SET risk_score = ?1, status = ?2, last_seen = ?3
                 WHERE address = ?4",
                params![SERIAL_SCAMMER_TIER, SERIAL_SCAMMER_STATUS, now, address],
            )?;
            UpsertOutcome::Escalated
        } else {
            let status = if sighting.funder.name.is_empty() {
                DEFAULT_STATUS
            } else {
                &sighting.funder.name
            };
            tx.execute(
                "INSERT INTO suspects
                    (address, chain, risk_score, impact_usd, status, evidence_link, first_seen, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    address,
                    sighting.chain.as_str(),
                    sighting.funder.risk,
                    sighting.impact_usd.to_string(),
                    status,
                    sighting.evidence_link,
                    now,
                    now
                ],
            )?;
            UpsertOutcome::Inserted
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn get(&self, address: &str) -> Result<Option<SuspectRecord>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT address, chain, risk_score, impact_usd, status, evidence_link,
                        first_seen, last_seen
                 FROM suspects WHERE address = ?1",
                params![address.to_lowercase()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((address, chain, risk, impact, status, evidence, first_seen, last_seen)) => {
                Ok(Some(SuspectRecord {
                    address,
                    chain,
                    risk_score: risk as u8,
                    impact_usd: Decimal::from_str(&impact)
                        .context("bad impact_usd stored in ledger")?,
                    status,
                    evidence_link: evidence,
                    first_seen: parse_timestamp(&first_seen)?,
                    last_seen: parse_timestamp(&last_seen)?,
                }))
            }
        }
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM suspects", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .context("bad timestamp stored in ledger")?
        .with_timezone(&Utc))
}
