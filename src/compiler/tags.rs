//! Tag-table compressor (component E).
//!
//! Every rule's tag map flattens to `[name_id, value_id, name_id, value_id, ...]`.
//! Duplicate sequences are discarded before the same merge strategy used for
//! strings (operating on `u32` units instead of bytes) packs the rest.

use hashbrown::HashMap;

use super::merge;

pub struct TagTable {
    pub units: Vec<u32>,
}

/// Per-rule placement: `tags_offset` indexes into `TagTable::units` in pair
/// units (i.e. `units[tags_offset*2]` is the first name id), `tags_count` is
/// the number of `(name, value)` pairs. Because merging operates in whole
/// `u32` units rather than whole pairs, two different rules' tag placements
/// may straddle the same merged region; only `(offset, count)` is meaningful,
/// pair alignment on the *shared* array is not guaranteed beyond that.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagPlacement {
    pub tags_offset: u16,
    pub tags_count: u16,
}

pub fn compress(sequences: &[Vec<u32>]) -> (TagTable, Vec<TagPlacement>) {
    let mut unique: Vec<Vec<u32>> = Vec::new();
    let mut dedup_index: HashMap<Vec<u32>, usize> = HashMap::new();
    let mut rule_to_unique = Vec::with_capacity(sequences.len());

    for seq in sequences {
        let idx = *dedup_index.entry(seq.clone()).or_insert_with(|| {
            unique.push(seq.clone());
            unique.len() - 1
        });
        rule_to_unique.push(idx);
    }

    let (units, spans) = merge::pack(&unique);

    let placements = rule_to_unique
        .into_iter()
        .zip(sequences.iter())
        .map(|(unique_idx, seq)| {
            let (offset, _len) = spans[unique_idx];
            TagPlacement {
                tags_offset: offset as u16,
                tags_count: (seq.len() / 2) as u16,
            }
        })
        .collect();

    (TagTable { units }, placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_identical_tag_sequences() {
        let sequences = vec![vec![1u32, 2, 3, 4], vec![1u32, 2, 3, 4]];
        let (table, placements) = compress(&sequences);
        assert_eq!(placements[0].tags_offset, placements[1].tags_offset);
        assert_eq!(table.units, vec![1, 2, 3, 4]);
    }

    #[test]
    fn allows_odd_offsets_when_units_overlap() {
        let sequences = vec![vec![10u32, 20, 30, 40], vec![30u32, 40, 50, 60]];
        let (table, placements) = compress(&sequences);
        assert_eq!(table.units, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(placements[0].tags_offset, 0);
        assert_eq!(placements[1].tags_offset, 2);
    }

    #[test]
    fn every_placement_resolves_correctly() {
        let sequences = vec![vec![1u32, 2], vec![3u32, 4, 5, 6], vec![5u32, 6]];
        let (table, placements) = compress(&sequences);
        for (seq, placement) in sequences.iter().zip(&placements) {
            let start = placement.tags_offset as usize;
            let count = placement.tags_count as usize;
            assert_eq!(&table.units[start..start + count * 2], seq.as_slice());
        }
    }
}
