use rand::Rng;

use megasena_db::error::{MegaError, MegaResult};
use megasena_db::models::{Ticket, PICK_COUNT, POOL_SIZE};

pub const MIN_SELECTION: usize = 7;
pub const MAX_SELECTION: usize = 15;

/// Fermeture : toutes les combinaisons de 6 numéros d'une sélection.
///
/// L'énumération est paresseuse et déterministe (ordre lexicographique sur
/// l'ordre de saisie) ; chaque appel à `iter` repart du début.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingWheel {
    pool: Vec<u8>,
}

pub fn closing_combinations(selected: &[u8]) -> MegaResult<ClosingWheel> {
    if !(MIN_SELECTION..=MAX_SELECTION).contains(&selected.len()) {
        return Err(MegaError::InvalidSelection(format!(
            "{} numéros choisis, entre {} et {} attendus",
            selected.len(),
            MIN_SELECTION,
            MAX_SELECTION
        )));
    }
    let mut seen = [false; POOL_SIZE];
    for &n in selected {
        if n < 1 || n as usize > POOL_SIZE {
            return Err(MegaError::InvalidSelection(format!("numéro {} hors limites (1-60)", n)));
        }
        let slot = &mut seen[(n - 1) as usize];
        if *slot {
            return Err(MegaError::InvalidSelection(format!("numéro en double : {}", n)));
        }
        *slot = true;
    }
    Ok(ClosingWheel { pool: selected.to_vec() })
}

impl ClosingWheel {
    pub fn pool(&self) -> &[u8] {
        &self.pool
    }

    /// C(k, 6).
    pub fn len(&self) -> usize {
        binomial(self.pool.len(), PICK_COUNT)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Combinations<'_> {
        Combinations::new(&self.pool)
    }
}

impl<'a> IntoIterator for &'a ClosingWheel {
    type Item = Ticket;
    type IntoIter = Combinations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Combinations<'a> {
    pool: &'a [u8],
    indices: [usize; PICK_COUNT],
    remaining: usize,
}

impl<'a> Combinations<'a> {
    fn new(pool: &'a [u8]) -> Self {
        let mut indices = [0usize; PICK_COUNT];
        for (i, idx) in indices.iter_mut().enumerate() {
            *idx = i;
        }
        Self {
            pool,
            indices,
            remaining: binomial(pool.len(), PICK_COUNT),
        }
    }

    fn advance(&mut self) {
        let n = self.pool.len();
        let Some(i) = (0..PICK_COUNT).rev().find(|&i| self.indices[i] < n - PICK_COUNT + i) else {
            return;
        };
        self.indices[i] += 1;
        for j in (i + 1)..PICK_COUNT {
            self.indices[j] = self.indices[j - 1] + 1;
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Ticket;

    fn next(&mut self) -> Option<Ticket> {
        if self.remaining == 0 {
            return None;
        }
        let numbers = self.indices.map(|i| self.pool[i]);
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Ticket::new(&numbers).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// Sous-ensemble uniforme, sans remise, de `sample_size` combinaisons.
pub fn sample_combinations<R: Rng + ?Sized>(
    combinations: &[Ticket],
    sample_size: usize,
    rng: &mut R,
) -> MegaResult<Vec<Ticket>> {
    if sample_size > combinations.len() {
        return Err(MegaError::InvalidSelection(format!(
            "{} grilles demandées pour {} combinaisons",
            sample_size,
            combinations.len()
        )));
    }
    Ok(rand::seq::index::sample(rng, combinations.len(), sample_size)
        .into_iter()
        .map(|i| combinations[i])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_seven_numbers_give_seven_combinations() {
        let wheel = closing_combinations(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(wheel.len(), 7);
        let all: Vec<Ticket> = wheel.iter().collect();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], Ticket::new(&[1, 2, 3, 4, 5, 6]).unwrap());
        assert_eq!(all[6], Ticket::new(&[2, 3, 4, 5, 6, 7]).unwrap());
    }

    #[test]
    fn test_six_numbers_rejected() {
        let err = closing_combinations(&[1, 2, 3, 4, 5, 6]).unwrap_err();
        assert!(matches!(err, MegaError::InvalidSelection(_)));
    }

    #[test]
    fn test_sixteen_numbers_rejected() {
        let selected: Vec<u8> = (1..=16).collect();
        assert!(closing_combinations(&selected).is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(closing_combinations(&[1, 2, 3, 4, 5, 6, 6]).is_err());
        assert!(closing_combinations(&[0, 2, 3, 4, 5, 6, 7]).is_err());
        assert!(closing_combinations(&[1, 2, 3, 4, 5, 6, 61]).is_err());
    }

    #[test]
    fn test_enumeration_follows_input_order() {
        let wheel = closing_combinations(&[50, 40, 30, 20, 10, 5, 1]).unwrap();
        let first = wheel.iter().next().unwrap();
        // Premier = les 6 premiers saisis, restitués triés.
        assert_eq!(first, Ticket::new(&[50, 40, 30, 20, 10, 5]).unwrap());
        assert_eq!(first.numbers(), &[5, 10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_enumeration_is_restartable_and_deterministic() {
        let wheel = closing_combinations(&[3, 8, 15, 22, 31, 40, 47, 59]).unwrap();
        let a: Vec<Ticket> = wheel.iter().collect();
        let b: Vec<Ticket> = (&wheel).into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 28);
    }

    #[test]
    fn test_full_wheel_is_distinct() {
        let selected: Vec<u8> = (1..=15).collect();
        let wheel = closing_combinations(&selected).unwrap();
        assert_eq!(wheel.len(), 5005);
        assert_eq!(wheel.iter().len(), 5005);
        let unique: HashSet<Ticket> = wheel.iter().collect();
        assert_eq!(unique.len(), 5005);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(7, 6), 7);
        assert_eq!(binomial(10, 6), 210);
        assert_eq!(binomial(12, 6), 924);
        assert_eq!(binomial(5, 6), 0);
    }

    #[test]
    fn test_sample_too_large() {
        let all: Vec<Ticket> = closing_combinations(&[1, 2, 3, 4, 5, 6, 7]).unwrap().iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            sample_combinations(&all, 8, &mut rng),
            Err(MegaError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_sample_full_population_once_each() {
        let all: Vec<Ticket> = closing_combinations(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap().iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_combinations(&all, all.len(), &mut rng).unwrap();
        assert_eq!(sample.len(), all.len());
        let unique: HashSet<Ticket> = sample.iter().copied().collect();
        let expected: HashSet<Ticket> = all.iter().copied().collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn test_sample_subset_distinct() {
        let selected: Vec<u8> = (1..=10).collect();
        let all: Vec<Ticket> = closing_combinations(&selected).unwrap().iter().collect();
        let sample = sample_combinations(&all, 10, &mut StdRng::seed_from_u64(9)).unwrap();
        let unique: HashSet<Ticket> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 10);
        assert!(sample.iter().all(|t| all.contains(t)));
    }
}
