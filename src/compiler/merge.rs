//! Generic greedy superstring packer shared by the string interner (component D)
//! and the tag-table compressor (component E): the former packs `Vec<u8>`, the
//! latter packs `Vec<u32>` flattened `(name_id, value_id)` sequences.

/// Packs `items` into one merged array, returning the array plus the
/// `(offset, length)` span of each original item within it.
///
/// Two passes, both intentionally O(N^2) per the design notes:
/// 1. **Containment.** Any item that is a contiguous subsequence of a longer
///    item is marked "included" and contributes no bytes of its own.
/// 2. **Suffix/prefix merge.** Repeatedly find the longest overlap where a
///    proper suffix of one surviving item equals a prefix of another, and
///    replace the pair with their merge, until no positive overlap remains.
///
/// The final array is the concatenation of the surviving (non-included)
/// items. Every original item's span is then located by a linear search
/// within that array — this is what makes the loader's job trivial: it
/// never needs to understand the packing, only `(offset, length)`.
pub fn pack<T: Clone + PartialEq>(items: &[Vec<T>]) -> (Vec<T>, Vec<(usize, usize)>) {
    let n = items.len();
    let mut pool: Vec<Vec<T>> = items.to_vec();
    let mut included = vec![false; pool.len()];

    // Containment pass.
    for i in 0..pool.len() {
        for j in 0..pool.len() {
            if i == j || included[j] {
                continue;
            }
            if pool[j].len() < pool[i].len() && contains_seq(&pool[i], &pool[j]) {
                included[j] = true;
            }
        }
    }

    // Suffix/prefix merge pass.
    loop {
        let mut best: Option<(usize, usize, usize)> = None;
        for i in 0..pool.len() {
            if included[i] {
                continue;
            }
            for j in 0..pool.len() {
                if i == j || included[j] {
                    continue;
                }
                let ov = overlap_len(&pool[i], &pool[j]);
                if ov > 0 && best.map_or(true, |(_, _, best_ov)| ov > best_ov) {
                    best = Some((i, j, ov));
                }
            }
        }
        let Some((i, j, ov)) = best else { break };
        let mut merged = pool[i].clone();
        merged.extend_from_slice(&pool[j][ov..]);
        included[i] = true;
        included[j] = true;
        included.push(false);
        pool.push(merged);
    }

    let mut array: Vec<T> = Vec::new();
    for (idx, seq) in pool.iter().enumerate() {
        if !included[idx] {
            array.extend_from_slice(seq);
        }
    }

    let mut spans = Vec::with_capacity(n);
    for item in items.iter().take(n) {
        let offset = find_subseq(&array, item)
            .expect("every packed item must be losslessly retrievable from the merged array");
        spans.push((offset, item.len()));
    }
    (array, spans)
}

fn contains_seq<T: PartialEq>(haystack: &[T], needle: &[T]) -> bool {
    find_subseq(haystack, needle).is_some()
}

fn find_subseq<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Longest `k` such that the last `k` elements of `a` equal the first `k` of
/// `b`, excluding the degenerate full-length self-overlap.
fn overlap_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let max_k = a.len().min(b.len());
    for k in (1..=max_k).rev() {
        if a[a.len() - k..] == b[..k] {
            return k;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn containment_absorbs_substrings() {
        let items = vec![bytes("hello"), bytes("ell")];
        let (array, spans) = pack(&items);
        assert_eq!(array, bytes("hello"));
        assert_eq!(spans[1].0, 1);
        assert_eq!(spans[1].1, 3);
    }

    #[test]
    fn merge_pass_overlaps_suffix_prefix() {
        let items = vec![bytes("abcd"), bytes("cdef")];
        let (array, spans) = pack(&items);
        assert_eq!(array, bytes("abcdef"));
        for (i, item) in items.iter().enumerate() {
            let (off, len) = spans[i];
            assert_eq!(&array[off..off + len], item.as_slice());
        }
    }

    #[test]
    fn every_span_roundtrips() {
        let items = vec![bytes("uk"), bytes("co.uk"), bytes("org.uk"), bytes("police.uk")];
        let (array, spans) = pack(&items);
        for (i, item) in items.iter().enumerate() {
            let (off, len) = spans[i];
            assert_eq!(&array[off..off + len], item.as_slice());
        }
    }

    #[test]
    fn packs_u32_sequences() {
        let items: Vec<Vec<u32>> = vec![vec![1, 2, 3, 4], vec![3, 4, 5, 6]];
        let (array, spans) = pack(&items);
        assert_eq!(array, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(spans[0], (0, 4));
        assert_eq!(spans[1], (2, 4));
    }
}
