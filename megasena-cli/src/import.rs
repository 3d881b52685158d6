use anyhow::{Context, Result, bail};
use log::{info, warn};
use megasena_db::rusqlite::Connection;
use std::io::Read;
use std::path::Path;

use megasena_db::db::insert_draws;
use megasena_db::models::{RawRecord, PICK_COUNT};
use megasena_db::store::{DrawStore, RejectedRecord};

const CONTEST_COLUMN: &str = "Concurso";
const DATE_COLUMN: &str = "Data do Sorteio";

/// Le fichier de l'éditeur est en Latin-1 : chaque octet est un point de code.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

struct Columns {
    contest: usize,
    date: usize,
    balls: [usize; PICK_COUNT],
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            match headers.iter().position(|h| h == name) {
                Some(idx) => Ok(idx),
                None => bail!("Colonne '{}' absente de l'en-tête", name),
            }
        };

        let mut balls = [0usize; PICK_COUNT];
        for (i, slot) in balls.iter_mut().enumerate() {
            *slot = find(&format!("Bola{}", i + 1))?;
        }

        Ok(Self {
            contest: find(CONTEST_COLUMN)?,
            date: find(DATE_COLUMN)?,
            balls,
        })
    }
}

pub struct CsvRecords {
    pub records: Vec<RawRecord>,
    pub read_errors: usize,
}

/// Lit un CSV `;` Latin-1 et produit des enregistrements bruts, sans les valider.
pub fn read_records<R: Read>(input: R) -> Result<CsvRecords> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .byte_headers()
        .context("Impossible de lire l'en-tête")?
        .iter()
        .map(|h| latin1(h).trim().to_string())
        .collect();
    let columns = Columns::locate(&headers)?;

    let mut out = CsvRecords {
        records: Vec::new(),
        read_errors: 0,
    };

    for (i, record_result) in reader.byte_records().enumerate() {
        match record_result {
            Ok(record) => {
                let field = |idx: usize| record.get(idx).map(latin1).unwrap_or_default();
                out.records.push(RawRecord {
                    contest: field(columns.contest),
                    date: field(columns.date),
                    balls: columns.balls.iter().map(|&idx| field(idx)).collect(),
                });
            }
            Err(e) => {
                warn!("Erreur lecture ligne {}: {}", i + 2, e);
                out.read_errors += 1;
            }
        }
    }

    Ok(out)
}

pub struct ImportResult {
    pub total_records: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub already_known: usize,
    pub rejected: Vec<RejectedRecord>,
    pub read_errors: usize,
    pub latest_contest: Option<u32>,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let csv = read_records(file)
        .with_context(|| format!("Fichier {:?} illisible", path))?;

    let (store, summary) = DrawStore::load(csv.records);
    let inserted = insert_draws(conn, store.all_draws())?;
    info!("{} tirage(s) valides lus depuis {:?}, {} nouveau(x)", store.len(), path, inserted);

    Ok(ImportResult {
        total_records: summary.total_records + csv.read_errors,
        inserted,
        duplicates: summary.duplicates,
        already_known: summary.loaded - inserted,
        rejected: summary.rejected,
        read_errors: csv.read_errors,
        latest_contest: store.latest_contest(),
    })
}
