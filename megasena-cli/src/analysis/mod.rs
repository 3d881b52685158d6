pub mod backtest;
pub mod closing;
pub mod sampler;
pub mod statistics;

use megasena_db::models::{NumberProbability, NumberStats, ProbabilityTag, POOL_SIZE};

use crate::analysis::statistics::{DelayTable, FrequencyTable};

pub fn number_stats(freq: &FrequencyTable, delay: &DelayTable) -> Vec<NumberStats> {
    freq.iter()
        .map(|(number, frequency)| NumberStats {
            number,
            frequency,
            delay: delay.get(number),
        })
        .collect()
}

pub fn tag_probabilities(probs: &mut [NumberProbability]) {
    let uniform = 1.0 / POOL_SIZE as f64;
    let threshold = 0.3;

    for p in probs.iter_mut() {
        let deviation = (p.probability - uniform) / uniform;
        if deviation > threshold {
            p.tag = ProbabilityTag::Hot;
        } else if deviation < -threshold {
            p.tag = ProbabilityTag::Cold;
        } else {
            p.tag = ProbabilityTag::Normal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use megasena_db::models::Draw;
    use megasena_db::store::DrawStore;

    use crate::analysis::statistics::{delay, frequency};

    #[test]
    fn test_number_stats_rows() {
        let store = DrawStore::from_draws(vec![
            Draw::new(1, None, &[1, 2, 3, 4, 5, 6]).unwrap(),
            Draw::new(2, None, &[1, 7, 8, 9, 10, 11]).unwrap(),
        ]);
        let stats = number_stats(&frequency(&store), &delay(&store).unwrap());
        assert_eq!(stats.len(), 60);
        assert_eq!(stats[0].number, 1);
        assert_eq!(stats[0].frequency, 2);
        assert_eq!(stats[0].delay, 0);
        assert_eq!(stats[1].delay, 1);
        assert_eq!(stats[59].frequency, 0);
        assert_eq!(stats[59].delay, 2);
    }

    #[test]
    fn test_tag_probabilities() {
        let uniform = 1.0 / 60.0;
        let mut probs = vec![
            NumberProbability { number: 1, probability: uniform * 1.5, tag: ProbabilityTag::Normal },
            NumberProbability { number: 2, probability: uniform * 0.5, tag: ProbabilityTag::Normal },
            NumberProbability { number: 3, probability: uniform, tag: ProbabilityTag::Hot },
        ];
        tag_probabilities(&mut probs);
        assert_eq!(probs[0].tag, ProbabilityTag::Hot);
        assert_eq!(probs[1].tag, ProbabilityTag::Cold);
        assert_eq!(probs[2].tag, ProbabilityTag::Normal);
    }
}
