//! Stick throwing.
//!
//! Four sticks are thrown; each lands flat side up with probability
//! [`FLAT_PROBABILITY`]. The number of flat sticks names the result:
//!
//! | flat | result | steps |
//! |------|--------|-------|
//! | 1    | do     | 1     |
//! | 2    | gae    | 2     |
//! | 3    | geol   | 3     |
//! | 4    | yut    | 4     |
//! | 0    | mo     | 5     |
//!
//! One stick is marked. A `do` whose single flat stick is the marked one is a
//! `back_do` and moves one step backward. `yut` and `mo` earn another throw.

use std::fmt;

use crate::constants::{BACK_DO_STICK, FLAT_PROBABILITY};

/// The named result of one throw.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Throw {
    BackDo,
    Do,
    Gae,
    Geol,
    Yut,
    Mo,
}

impl Throw {
    /// Every result, in order of movement value.
    pub const ALL: [Throw; 6] = [
        Throw::BackDo,
        Throw::Do,
        Throw::Gae,
        Throw::Geol,
        Throw::Yut,
        Throw::Mo,
    ];

    /// Classify a set of sticks (`true` = flat side up).
    pub fn from_sticks(sticks: [bool; 4]) -> Throw {
        match sticks.iter().filter(|&&flat| flat).count() {
            0 => Throw::Mo,
            1 if sticks[BACK_DO_STICK] => Throw::BackDo,
            1 => Throw::Do,
            2 => Throw::Gae,
            3 => Throw::Geol,
            _ => Throw::Yut,
        }
    }

    /// Movement value of this result.
    pub fn steps(self) -> i8 {
        match self {
            Throw::BackDo => -1,
            Throw::Do => 1,
            Throw::Gae => 2,
            Throw::Geol => 3,
            Throw::Yut => 4,
            Throw::Mo => 5,
        }
    }

    /// `yut` and `mo` earn another throw.
    pub fn grants_extra_throw(self) -> bool {
        matches!(self, Throw::Yut | Throw::Mo)
    }

    pub fn name(self) -> &'static str {
        match self {
            Throw::BackDo => "back_do",
            Throw::Do => "do",
            Throw::Gae => "gae",
            Throw::Geol => "geol",
            Throw::Yut => "yut",
            Throw::Mo => "mo",
        }
    }
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Throw the four sticks once.
pub fn throw_sticks(rng: &mut fastrand::Rng) -> Throw {
    let sticks = std::array::from_fn(|_| rng.f64() < FLAT_PROBABILITY);
    Throw::from_sticks(sticks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sticks() {
        assert_eq!(Throw::from_sticks([false; 4]), Throw::Mo);
        assert_eq!(Throw::from_sticks([true; 4]), Throw::Yut);
        assert_eq!(Throw::from_sticks([true, false, false, false]), Throw::BackDo);
        assert_eq!(Throw::from_sticks([false, true, false, false]), Throw::Do);
        assert_eq!(Throw::from_sticks([false, false, false, true]), Throw::Do);
        assert_eq!(Throw::from_sticks([true, true, false, false]), Throw::Gae);
        assert_eq!(Throw::from_sticks([true, false, true, true]), Throw::Geol);
    }

    #[test]
    fn test_steps_and_extra_throws() {
        let steps: Vec<i8> = Throw::ALL.iter().map(|t| t.steps()).collect();
        assert_eq!(steps, vec![-1, 1, 2, 3, 4, 5]);

        let extra: Vec<Throw> = Throw::ALL
            .into_iter()
            .filter(|t| t.grants_extra_throw())
            .collect();
        assert_eq!(extra, vec![Throw::Yut, Throw::Mo]);
    }

    #[test]
    fn test_names() {
        assert_eq!(Throw::BackDo.to_string(), "back_do");
        assert_eq!(Throw::Geol.to_string(), "geol");
    }

    #[test]
    fn test_distribution_matches_binomial() {
        let mut rng = fastrand::Rng::with_seed(7);
        let samples = 200_000;
        let mut counts = [0usize; 6];
        for _ in 0..samples {
            let t = throw_sticks(&mut rng);
            let i = Throw::ALL.iter().position(|&x| x == t).unwrap();
            counts[i] += 1;
        }

        // P(k flat) = C(4,k) 0.6^k 0.4^(4-k); the single-flat case splits 1:3.
        let p = FLAT_PROBABILITY;
        let q = 1.0 - p;
        let one_flat = 4.0 * p * q.powi(3);
        let expected = [
            one_flat / 4.0,
            one_flat * 3.0 / 4.0,
            6.0 * p.powi(2) * q.powi(2),
            4.0 * p.powi(3) * q,
            p.powi(4),
            q.powi(4),
        ];

        for (i, &e) in expected.iter().enumerate() {
            let observed = counts[i] as f64 / samples as f64;
            assert!(
                (observed - e).abs() < 0.01,
                "{}: observed {observed:.4}, expected {e:.4}",
                Throw::ALL[i]
            );
        }
    }

    #[test]
    fn test_back_do_is_quarter_of_single_flats() {
        let mut rng = fastrand::Rng::with_seed(11);
        let (mut back, mut fwd) = (0usize, 0usize);
        for _ in 0..100_000 {
            match throw_sticks(&mut rng) {
                Throw::BackDo => back += 1,
                Throw::Do => fwd += 1,
                _ => {}
            }
        }
        let ratio = back as f64 / (back + fwd) as f64;
        assert!((0.22..0.28).contains(&ratio), "back_do ratio {ratio:.3}");
    }
}
