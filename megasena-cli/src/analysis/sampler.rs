use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use megasena_db::error::{MegaError, MegaResult};
use megasena_db::models::{NumberProbability, ProbabilityTag, Ticket, PICK_COUNT, POOL_SIZE};

use crate::analysis::statistics::{DelayTable, FrequencyTable};

/// Lissage ajouté à chaque poids : aucun numéro n'a une probabilité nulle.
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Distribution de tirage sur 1..=60, strictement positive, de somme 1.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDistribution {
    probabilities: [f64; POOL_SIZE],
}

impl WeightedDistribution {
    pub fn probability(&self, number: u8) -> f64 {
        (number as usize)
            .checked_sub(1)
            .and_then(|i| self.probabilities.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.probabilities
    }

    /// Produit des p(n)/p_uniforme : > 1 pour une grille plus probable qu'au hasard.
    pub fn score(&self, ticket: &Ticket) -> f64 {
        let uniform = 1.0 / POOL_SIZE as f64;
        ticket
            .numbers()
            .iter()
            .map(|&n| self.probability(n) / uniform)
            .product()
    }

    pub fn to_number_probabilities(&self) -> Vec<NumberProbability> {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, &probability)| NumberProbability {
                number: (i + 1) as u8,
                probability,
                tag: ProbabilityTag::Normal,
            })
            .collect()
    }
}

pub fn weighted_pick(
    freq: &FrequencyTable,
    delay: &DelayTable,
    delay_bias: f64,
) -> MegaResult<WeightedDistribution> {
    weighted_pick_with(freq, delay, delay_bias, DEFAULT_EPSILON)
}

/// w[n] = freq[n]/max(freq) * (1 - bias) + delay[n]/max(delay) * bias,
/// puis p[n] = (w[n] + ε) / Σ(w + ε).
pub fn weighted_pick_with(
    freq: &FrequencyTable,
    delay: &DelayTable,
    delay_bias: f64,
    epsilon: f64,
) -> MegaResult<WeightedDistribution> {
    if !(0.0..=1.0).contains(&delay_bias) {
        return Err(MegaError::InvalidParameter(format!(
            "poids du retard {} hors de [0, 1]",
            delay_bias
        )));
    }
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(MegaError::InvalidParameter(format!(
            "lissage {} doit être strictement positif",
            epsilon
        )));
    }

    let max_freq = freq.max();
    if max_freq == 0 {
        return Err(MegaError::DegenerateInput("toutes les fréquences sont nulles".to_string()));
    }
    let max_delay = delay.max();
    if max_delay == 0 {
        return Err(MegaError::DegenerateInput("tous les retards sont nuls".to_string()));
    }

    let mut probabilities = [0.0f64; POOL_SIZE];
    for ((p, (_, f)), (_, d)) in probabilities.iter_mut().zip(freq.iter()).zip(delay.iter()) {
        let w = (f as f64 / max_freq as f64) * (1.0 - delay_bias)
            + (d as f64 / max_delay as f64) * delay_bias;
        *p = w + epsilon;
    }

    let total: f64 = probabilities.iter().sum();
    for p in &mut probabilities {
        *p /= total;
    }

    Ok(WeightedDistribution { probabilities })
}

/// Graine fixe pour la reproductibilité, sinon entropie du système.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

pub fn generate_tickets<R: Rng + ?Sized>(
    distribution: &WeightedDistribution,
    count: usize,
    rng: &mut R,
) -> MegaResult<Vec<Ticket>> {
    if count == 0 {
        return Err(MegaError::InvalidSelection("au moins une grille est requise".to_string()));
    }

    let mut tickets = Vec::with_capacity(count);
    for _ in 0..count {
        let numbers = sample_without_replacement(distribution.as_slice(), PICK_COUNT, rng)?;
        tickets.push(Ticket::new(&numbers)?);
    }
    Ok(tickets)
}

/// Tirage pondéré sans remise : les poids restants sont renormalisés après
/// chaque numéro retiré.
fn sample_without_replacement<R: Rng + ?Sized>(
    probs: &[f64],
    count: usize,
    rng: &mut R,
) -> MegaResult<Vec<u8>> {
    let mut available: Vec<(u8, f64)> = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| ((i + 1) as u8, p))
        .collect();
    let mut selected = Vec::with_capacity(count);

    for _ in 0..count {
        let weights: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| MegaError::DegenerateInput(e.to_string()))?;
        let idx = dist.sample(rng);

        let (number, _) = available.remove(idx);
        selected.push(number);
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use megasena_db::models::Draw;
    use megasena_db::store::DrawStore;
    use proptest::prelude::*;

    use crate::analysis::statistics::{delay, frequency};

    fn sample_store() -> DrawStore {
        DrawStore::from_draws(vec![
            Draw::new(1, None, &[1, 2, 3, 4, 5, 6]).unwrap(),
            Draw::new(2, None, &[1, 7, 8, 9, 10, 11]).unwrap(),
            Draw::new(3, None, &[1, 2, 12, 13, 14, 15]).unwrap(),
        ])
    }

    fn sample_distribution(bias: f64) -> WeightedDistribution {
        let store = sample_store();
        weighted_pick(&frequency(&store), &delay(&store).unwrap(), bias).unwrap()
    }

    #[test]
    fn test_distribution_sums_to_one_and_positive() {
        for bias in [0.0, 0.25, 0.5, 1.0] {
            let dist = sample_distribution(bias);
            let sum: f64 = dist.as_slice().iter().sum();
            assert!((sum - 1.0).abs() < 1e-10, "Sum = {}", sum);
            assert!(dist.as_slice().iter().all(|&p| p > 0.0));
        }
    }

    #[test]
    fn test_bias_zero_favors_frequent() {
        let dist = sample_distribution(0.0);
        // 1 sort 3 fois, 60 jamais.
        assert!(dist.probability(1) > dist.probability(2));
        assert!(dist.probability(2) > dist.probability(60));
    }

    #[test]
    fn test_bias_one_favors_delayed() {
        let dist = sample_distribution(1.0);
        // 60 jamais sorti (retard 3), 1 sorti au dernier concours (retard 0).
        assert!(dist.probability(60) > dist.probability(3));
        assert!(dist.probability(3) > dist.probability(1));
    }

    #[test]
    fn test_weighted_pick_exact_values() {
        let store = sample_store();
        let freq = frequency(&store);
        let delays = delay(&store).unwrap();
        let dist = weighted_pick_with(&freq, &delays, 0.5, 0.01).unwrap();

        let weight = |n: u8| {
            (freq.get(n) as f64 / 3.0) * 0.5 + (delays.get(n) as f64 / 3.0) * 0.5 + 0.01
        };
        let total: f64 = (1..=60).map(weight).sum();
        assert!((dist.probability(1) - weight(1) / total).abs() < 1e-12);
        assert!((dist.probability(60) - weight(60) / total).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_pick_degenerate_frequency() {
        let store = DrawStore::new();
        let freq = frequency(&store);
        let delays = delay(&sample_store()).unwrap();
        let err = weighted_pick(&freq, &delays, 0.5).unwrap_err();
        assert!(matches!(err, MegaError::DegenerateInput(_)));
    }

    #[test]
    fn test_weighted_pick_invalid_bias() {
        let store = sample_store();
        let freq = frequency(&store);
        let delays = delay(&store).unwrap();
        assert!(matches!(
            weighted_pick(&freq, &delays, 1.5),
            Err(MegaError::InvalidParameter(_))
        ));
        assert!(matches!(
            weighted_pick(&freq, &delays, f64::NAN),
            Err(MegaError::InvalidParameter(_))
        ));
        assert!(matches!(
            weighted_pick_with(&freq, &delays, 0.5, 0.0),
            Err(MegaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_generate_exact_count() {
        let dist = sample_distribution(0.5);
        let mut rng = StdRng::seed_from_u64(42);
        for count in [1, 5, 50] {
            let tickets = generate_tickets(&dist, count, &mut rng).unwrap();
            assert_eq!(tickets.len(), count);
        }
    }

    #[test]
    fn test_generate_zero_count() {
        let dist = sample_distribution(0.5);
        let mut rng = StdRng::seed_from_u64(42);
        assert!(matches!(
            generate_tickets(&dist, 0, &mut rng),
            Err(MegaError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_seed_determinism() {
        let dist = sample_distribution(0.5);
        let t1 = generate_tickets(&dist, 5, &mut seeded_rng(Some(123))).unwrap();
        let t2 = generate_tickets(&dist, 5, &mut seeded_rng(Some(123))).unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn test_heavy_weights_dominate() {
        let mut probabilities = [1e-9; POOL_SIZE];
        for n in [5, 15, 25, 35, 45, 55] {
            probabilities[n - 1] = 1.0;
        }
        let total: f64 = probabilities.iter().sum();
        for p in &mut probabilities {
            *p /= total;
        }
        let dist = WeightedDistribution { probabilities };
        let tickets = generate_tickets(&dist, 20, &mut StdRng::seed_from_u64(7)).unwrap();
        let expected = Ticket::new(&[5, 15, 25, 35, 45, 55]).unwrap();
        let matching = tickets.iter().filter(|t| **t == expected).count();
        assert!(matching >= 19, "{} grilles attendues sur 20", matching);
    }

    #[test]
    fn test_score_uniform_is_one() {
        let dist = WeightedDistribution { probabilities: [1.0 / 60.0; POOL_SIZE] };
        let ticket = Ticket::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert!((dist.score(&ticket) - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn tickets_always_valid(seed in any::<u64>(), bias in 0.0f64..=1.0) {
            let dist = sample_distribution(bias);
            let tickets = generate_tickets(&dist, 10, &mut StdRng::seed_from_u64(seed)).unwrap();
            for t in &tickets {
                let n = t.numbers();
                prop_assert_eq!(n.len(), 6);
                prop_assert!(n.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(n.iter().all(|&x| (1..=60).contains(&x)));
            }
        }
    }
}
