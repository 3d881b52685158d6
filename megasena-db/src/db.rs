use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{parse_date, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest  INTEGER PRIMARY KEY,
    date     TEXT,
    ball_1   INTEGER NOT NULL,
    ball_2   INTEGER NOT NULL,
    ball_3   INTEGER NOT NULL,
    ball_4   INTEGER NOT NULL,
    ball_5   INTEGER NOT NULL,
    ball_6   INTEGER NOT NULL
);
";

const SELECT_DRAWS: &str =
    "SELECT contest, date, ball_1, ball_2, ball_3, ball_4, ball_5, ball_6 FROM draws";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("megasena.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Insère un tirage ; un concours déjà présent est conservé tel quel.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let date = draw.date.map(|d| d.format("%Y-%m-%d").to_string());
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (contest, date, ball_1, ball_2, ball_3, ball_4, ball_5, ball_6)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            draw.contest,
            date,
            draw.balls[0],
            draw.balls[1],
            draw.balls[2],
            draw.balls[3],
            draw.balls[4],
            draw.balls[5],
        ],
    ).with_context(|| format!("Échec de l'insertion du concours {}", draw.contest))?;
    Ok(changed > 0)
}

/// Insère un lot dans une transaction. Retourne le nombre de lignes nouvelles.
pub fn insert_draws(conn: &Connection, draws: &[Draw]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    let mut inserted = 0;
    for draw in draws {
        if insert_draw(&tx, draw)? {
            inserted += 1;
        }
    }
    tx.commit().context("Échec du commit")?;
    Ok(inserted)
}

type DrawRow = (u32, Option<String>, [u8; 6]);

fn query_draws(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, Option<String>>(1)?,
            [
                row.get::<_, u8>(2)?,
                row.get::<_, u8>(3)?,
                row.get::<_, u8>(4)?,
                row.get::<_, u8>(5)?,
                row.get::<_, u8>(6)?,
                row.get::<_, u8>(7)?,
            ],
        ))
    })?.collect::<Result<Vec<DrawRow>, _>>()?;

    rows.into_iter()
        .map(|(contest, date, balls)| {
            let date = date.as_deref().and_then(parse_date);
            Draw::new(contest, date, &balls)
                .with_context(|| format!("Concours {} corrompu en base", contest))
        })
        .collect()
}

/// Tout l'historique, par concours croissant.
pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    query_draws(conn, &format!("{SELECT_DRAWS} ORDER BY contest ASC"), [])
}

/// Les `limit` derniers concours, du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    query_draws(conn, &format!("{SELECT_DRAWS} ORDER BY contest DESC LIMIT ?1"), [limit])
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_contest(conn: &Connection) -> Result<Option<u32>> {
    let latest: Option<u32> = conn.query_row("SELECT MAX(contest) FROM draws", [], |row| row.get(0))?;
    Ok(latest)
}
