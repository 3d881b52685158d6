use megasena_db::error::{MegaError, MegaResult};
use megasena_db::models::POOL_SIZE;
use megasena_db::store::DrawStore;

fn slot(number: u8) -> Option<usize> {
    let idx = (number as usize).checked_sub(1)?;
    (idx < POOL_SIZE).then_some(idx)
}

/// Nombre de tirages contenant chaque numéro. Toujours 60 entrées.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable([u32; POOL_SIZE]);

impl FrequencyTable {
    pub fn get(&self, number: u8) -> u32 {
        slot(number).map(|i| self.0[i]).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().enumerate().map(|(i, &c)| ((i + 1) as u8, c))
    }

    pub fn max(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

/// Retard : concours écoulés depuis la dernière sortie de chaque numéro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayTable {
    latest_contest: u32,
    delays: [u32; POOL_SIZE],
}

impl DelayTable {
    pub fn get(&self, number: u8) -> u32 {
        slot(number).map(|i| self.delays[i]).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.delays.iter().enumerate().map(|(i, &d)| ((i + 1) as u8, d))
    }

    pub fn max(&self) -> u32 {
        self.delays.iter().copied().max().unwrap_or(0)
    }

    pub fn latest_contest(&self) -> u32 {
        self.latest_contest
    }
}

pub fn frequency(store: &DrawStore) -> FrequencyTable {
    let mut counts = [0u32; POOL_SIZE];
    for draw in store.all_draws() {
        for &n in &draw.balls {
            if let Some(i) = slot(n) {
                counts[i] += 1;
            }
        }
    }
    FrequencyTable(counts)
}

/// Un seul passage sur l'historique : dernier concours vu par numéro.
pub fn delay(store: &DrawStore) -> MegaResult<DelayTable> {
    let latest_contest = store.latest_contest().ok_or(MegaError::EmptyDataset)?;

    let mut last_seen = [None::<u32>; POOL_SIZE];
    for draw in store.all_draws() {
        for &n in &draw.balls {
            if let Some(i) = slot(n) {
                last_seen[i] = Some(last_seen[i].map_or(draw.contest, |c| c.max(draw.contest)));
            }
        }
    }

    let mut delays = [0u32; POOL_SIZE];
    for (d, seen) in delays.iter_mut().zip(last_seen) {
        *d = match seen {
            Some(contest) => latest_contest - contest,
            None => latest_contest,
        };
    }

    Ok(DelayTable { latest_contest, delays })
}
