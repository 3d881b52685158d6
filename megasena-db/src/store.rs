use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::error::MegaError;
use crate::models::{Draw, RawRecord};

/// Historique en mémoire, trié par concours croissant, sans doublon.
///
/// Les tirages stockés ne sont jamais modifiés : `append` n'ajoute que des
/// concours postérieurs au dernier connu.
#[derive(Debug, Clone, Default)]
pub struct DrawStore {
    draws: Vec<Draw>,
}

#[derive(Debug, Clone)]
pub struct RejectedRecord {
    /// Index (base 1) de l'enregistrement dans la source.
    pub line: usize,
    pub error: MegaError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub total_records: usize,
    pub loaded: usize,
    pub duplicates: usize,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct AppendSummary {
    pub total_records: usize,
    /// Tirages effectivement ajoutés, par concours croissant.
    pub appended: Vec<Draw>,
    pub ignored: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl DrawStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construit le magasin à partir d'enregistrements bruts. Les
    /// enregistrements invalides sont écartés ; à concours égal, le premier
    /// rencontré est conservé.
    pub fn load<I>(records: I) -> (Self, LoadSummary)
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut summary = LoadSummary::default();
        let mut by_contest: BTreeMap<u32, Draw> = BTreeMap::new();

        for (i, record) in records.into_iter().enumerate() {
            summary.total_records += 1;
            match record.parse() {
                Ok(draw) => {
                    if by_contest.contains_key(&draw.contest) {
                        debug!("Concours {} en double ignoré", draw.contest);
                        summary.duplicates += 1;
                    } else {
                        by_contest.insert(draw.contest, draw);
                    }
                }
                Err(error) => {
                    warn!("Enregistrement {} écarté : {}", i + 1, error);
                    summary.rejected.push(RejectedRecord { line: i + 1, error });
                }
            }
        }

        summary.loaded = by_contest.len();
        let store = Self {
            draws: by_contest.into_values().collect(),
        };
        (store, summary)
    }

    /// Tirages déjà validés (relus depuis la base).
    pub fn from_draws(mut draws: Vec<Draw>) -> Self {
        draws.sort_by_key(|d| d.contest);
        draws.dedup_by_key(|d| d.contest);
        Self { draws }
    }

    pub fn latest_contest(&self) -> Option<u32> {
        self.draws.last().map(|d| d.contest)
    }

    pub fn latest_draw(&self) -> Option<&Draw> {
        self.draws.last()
    }

    /// Ajoute les tirages dont le concours dépasse le dernier connu. Les
    /// autres sont ignorés : les entrées existantes font foi.
    pub fn append<I>(&mut self, records: I) -> AppendSummary
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let threshold = self.latest_contest().unwrap_or(0);
        let mut summary = AppendSummary::default();
        let mut fresh: BTreeMap<u32, Draw> = BTreeMap::new();

        for (i, record) in records.into_iter().enumerate() {
            summary.total_records += 1;
            match record.parse() {
                Ok(draw) if draw.contest <= threshold || fresh.contains_key(&draw.contest) => {
                    debug!("Concours {} déjà connu, ignoré", draw.contest);
                    summary.ignored += 1;
                }
                Ok(draw) => {
                    fresh.insert(draw.contest, draw);
                }
                Err(error) => {
                    warn!("Enregistrement {} écarté : {}", i + 1, error);
                    summary.rejected.push(RejectedRecord { line: i + 1, error });
                }
            }
        }

        summary.appended = fresh.into_values().collect();
        self.draws.extend(summary.appended.iter().cloned());
        if !summary.appended.is_empty() {
            info!(
                "{} tirage(s) ajouté(s), dernier concours : {:?}",
                summary.appended.len(),
                self.latest_contest()
            );
        }
        summary
    }

    /// Tous les tirages, par concours croissant. Stable jusqu'au prochain `append`.
    pub fn all_draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}
