//! The pair accumulator (C6): enumerates barcode-shared scaffold pairs and
//! bins links by orientation category.

use std::collections::HashMap;

use crate::barcode_index::{BarcodeIndex, MultiplicityMap};
use crate::orientation::resolve_scaffold;

/// Orientation bin index: HH=0, HT=1, TH=2, TT=3.
pub const HH: usize = 0;
pub const HT: usize = 1;
pub const TH: usize = 2;
pub const TT: usize = 3;

/// unordered scaffold pair (a,b), a<b -> [HH,HT,TH,TT] link counts.
pub type PairMap = HashMap<(i64, i64), [i64; 4]>;

#[allow(clippy::too_many_arguments)]
pub fn build_pair_map(
    barcode_index: &BarcodeIndex,
    mult_map: &MultiplicityMap,
    lengths: &HashMap<i64, i64>,
    min_mult: i64,
    max_mult: i64,
    end_length: i64,
    min_reads: i64,
    error_percent: f64,
) -> PairMap {
    let mut pmap = PairMap::new();

    for (barcode, tallies) in barcode_index {
        let mult = *mult_map.get(barcode).unwrap_or(&0);
        if mult < min_mult || mult > max_mult {
            continue;
        }

        // Resolve every scaffold this barcode touches once, then enumerate
        // unordered pairs over the resolved set.
        let resolved: Vec<(i64, bool)> = tallies
            .iter()
            .filter_map(|(&scaffold, tally)| {
                let size = *lengths.get(&scaffold)?;
                resolve_scaffold(tally, size, end_length, min_reads, error_percent)
                    .map(|head| (scaffold, head))
            })
            .collect();

        for i in 0..resolved.len() {
            for j in 0..resolved.len() {
                let (scaf_a, head_a) = resolved[i];
                let (scaf_b, head_b) = resolved[j];
                if scaf_a >= scaf_b {
                    continue;
                }
                let bin = match (head_a, head_b) {
                    (true, true) => HH,
                    (true, false) => HT,
                    (false, true) => TH,
                    (false, false) => TT,
                };
                pmap.entry((scaf_a, scaf_b)).or_insert([0; 4])[bin] += 1;
            }
        }
    }

    pmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode_index::ScaffoldTally;

    #[test]
    fn pairs_two_scaffolds_with_orientation() {
        let mut barcode_index = BarcodeIndex::new();
        let mut tallies = HashMap::new();
        tallies.insert(
            1,
            ScaffoldTally {
                head_evidence: 10,
                sum_or_tail: 0,
            },
        );
        tallies.insert(
            2,
            ScaffoldTally {
                head_evidence: 0,
                sum_or_tail: 10,
            },
        );
        barcode_index.insert("AAAA".to_string(), tallies);

        let mut mult_map = MultiplicityMap::new();
        mult_map.insert("AAAA".to_string(), 1500);

        let mut lengths = HashMap::new();
        lengths.insert(1, 10_000);
        lengths.insert(2, 10_000);

        let pmap = build_pair_map(&barcode_index, &mult_map, &lengths, 1000, 2000, 1000, 2, 0.0);
        let counts = pmap[&(1, 2)];
        assert_eq!(counts[TH], 1);
        assert_eq!(counts.iter().sum::<i64>(), 1);
    }

    #[test]
    fn multiplicity_outside_range_is_skipped() {
        let mut barcode_index = BarcodeIndex::new();
        let mut tallies = HashMap::new();
        tallies.insert(
            1,
            ScaffoldTally {
                head_evidence: 10,
                sum_or_tail: 0,
            },
        );
        tallies.insert(
            2,
            ScaffoldTally {
                head_evidence: 0,
                sum_or_tail: 10,
            },
        );
        barcode_index.insert("AAAA".to_string(), tallies);

        let mut mult_map = MultiplicityMap::new();
        mult_map.insert("AAAA".to_string(), 5); // outside 1000-2000

        let mut lengths = HashMap::new();
        lengths.insert(1, 10_000);
        lengths.insert(2, 10_000);

        let pmap = build_pair_map(&barcode_index, &mult_map, &lengths, 1000, 2000, 1000, 2, 0.0);
        assert!(pmap.is_empty());
    }

    #[test]
    fn pair_ordering_always_ascending() {
        let mut barcode_index = BarcodeIndex::new();
        let mut tallies = HashMap::new();
        tallies.insert(
            5,
            ScaffoldTally {
                head_evidence: 10,
                sum_or_tail: 0,
            },
        );
        tallies.insert(
            3,
            ScaffoldTally {
                head_evidence: 0,
                sum_or_tail: 10,
            },
        );
        barcode_index.insert("AAAA".to_string(), tallies);

        let mut mult_map = MultiplicityMap::new();
        mult_map.insert("AAAA".to_string(), 1500);

        let mut lengths = HashMap::new();
        lengths.insert(5, 10_000);
        lengths.insert(3, 10_000);

        let pmap = build_pair_map(&barcode_index, &mult_map, &lengths, 1000, 2000, 1000, 2, 0.0);
        assert!(pmap.contains_key(&(3, 5)));
        assert!(!pmap.contains_key(&(5, 3)));
    }

    proptest::proptest! {
        #[test]
        fn pair_map_keys_are_always_ascending(
            scaffold_ids in proptest::collection::vec(1i64..20, 2..8),
            heads in proptest::collection::vec(proptest::bool::ANY, 2..8),
        ) {
            let mut tallies = HashMap::new();
            for (id, head) in scaffold_ids.iter().zip(heads.iter()) {
                let tally = if *head {
                    ScaffoldTally { head_evidence: 10, sum_or_tail: 0 }
                } else {
                    ScaffoldTally { head_evidence: 0, sum_or_tail: 10 }
                };
                tallies.insert(*id, tally);
            }

            let mut barcode_index = BarcodeIndex::new();
            barcode_index.insert("AAAA".to_string(), tallies);

            let mut mult_map = MultiplicityMap::new();
            mult_map.insert("AAAA".to_string(), 1500);

            let mut lengths = HashMap::new();
            for id in &scaffold_ids {
                lengths.insert(*id, 10_000);
            }

            let pmap = build_pair_map(&barcode_index, &mult_map, &lengths, 1000, 2000, 1000, 2, 0.0);
            for (a, b) in pmap.keys() {
                prop_assert!(a < b);
            }
        }
    }
}
