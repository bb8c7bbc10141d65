//! Jet-to-parton assignment enumeration.
//!
//! An assignment picks `k` jets (`min_jets <= k <= max_jets`), marks one of them
//! as the b-jet of the leptonic top, and gives the other `k - 1` to the
//! hadronic top. Enumeration order is deterministic:
//!
//! 1. by subset size `k`, ascending
//! 2. by subset, in lexicographic order of jet indices
//! 3. by leptonic jet, in subset order
//!
//! The reconstructor breaks mass-difference ties by this order.

/// One jet assignment (indices into the event's jet list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub leptonic: usize,
    pub hadronic: Vec<usize>,
}

/// Enumerate all assignments for `n_jets` jets.
pub fn enumerate_assignments(n_jets: usize, min_jets: usize, max_jets: usize) -> Vec<Assignment> {
    let mut out = Vec::with_capacity(count_assignments(n_jets, min_jets, max_jets));
    let max_k = max_jets.min(n_jets);
    for k in min_jets.max(2)..=max_k {
        for_each_combination(n_jets, k, |subset| {
            for (pos, &leptonic) in subset.iter().enumerate() {
                let hadronic = subset
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != pos)
                    .map(|(_, &j)| j)
                    .collect();
                out.push(Assignment { leptonic, hadronic });
            }
        });
    }
    out
}

/// Number of assignments `enumerate_assignments` produces: `Σ_k C(n, k) · k`.
pub fn count_assignments(n_jets: usize, min_jets: usize, max_jets: usize) -> usize {
    let max_k = max_jets.min(n_jets);
    (min_jets.max(2)..=max_k)
        .map(|k| binomial(n_jets, k).saturating_mul(k))
        .fold(0usize, |acc, x| acc.saturating_add(x))
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: usize = 1;
    for i in 0..k {
        acc = acc.saturating_mul(n - i) / (i + 1);
    }
    acc
}

/// Visit every `k`-subset of `0..n` in lexicographic order.
fn for_each_combination(n: usize, k: usize, mut visit: impl FnMut(&[usize])) {
    if k == 0 || k > n {
        return;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        visit(&idx);

        // Find the rightmost position that can still advance.
        let mut i = k;
        while i > 0 {
            i -= 1;
            if idx[i] < n - k + i {
                idx[i] += 1;
                for j in (i + 1)..k {
                    idx[j] = idx[j - 1] + 1;
                }
                break;
            }
            if i == 0 {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_of_four_gives_four_assignments() {
        let all = enumerate_assignments(4, 4, 4);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], Assignment { leptonic: 0, hadronic: vec![1, 2, 3] });
        assert_eq!(all[3], Assignment { leptonic: 3, hadronic: vec![0, 1, 2] });
    }

    #[test]
    fn count_matches_enumeration() {
        for n in 0..9 {
            for (lo, hi) in [(2, 4), (4, 4), (3, 6), (2, 2)] {
                assert_eq!(
                    enumerate_assignments(n, lo, hi).len(),
                    count_assignments(n, lo, hi),
                    "n={n} k=[{lo},{hi}]"
                );
            }
        }
        // C(8,4) * 4
        assert_eq!(count_assignments(8, 4, 4), 280);
    }

    #[test]
    fn too_few_jets_gives_nothing() {
        assert!(enumerate_assignments(3, 4, 4).is_empty());
        assert_eq!(count_assignments(3, 4, 4), 0);
    }

    #[test]
    fn combinations_are_lexicographic() {
        let mut seen = Vec::new();
        for_each_combination(4, 2, |c| seen.push(c.to_vec()));
        assert_eq!(
            seen,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }
}
