use bgh_core::BALL_MAX;
use bgh_core::BallNumber;
use bgh_core::LUCKY_ROSTER_SIZE;
use rand::Rng;

/// Process-wide set of 7 lucky numbers.
///
/// Sampled uniformly without replacement from [1, 99]; regenerated once
/// at startup when the live store has no roster.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LuckyRoster(Vec<BallNumber>);

impl LuckyRoster {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let picks = rand::seq::index::sample(rng, BALL_MAX as usize, LUCKY_ROSTER_SIZE);
        Self(picks.iter().map(|i| (i + 1) as BallNumber).collect())
    }
    pub fn numbers(&self) -> &[BallNumber] {
        &self.0
    }
    pub fn contains(&self, number: BallNumber) -> bool {
        self.0.contains(&number)
    }
}

impl std::fmt::Display for LuckyRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{}]", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn roster_has_seven_distinct_in_range_numbers() {
        let mut rng = rand::rng();
        for _ in 0..32 {
            let roster = LuckyRoster::generate(&mut rng);
            let numbers = roster.numbers();
            assert_eq!(numbers.len(), LUCKY_ROSTER_SIZE);
            for &n in numbers {
                assert!((1..=BALL_MAX).contains(&n));
            }
            let mut deduped = numbers.to_vec();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(deduped.len(), LUCKY_ROSTER_SIZE);
        }
    }
}
