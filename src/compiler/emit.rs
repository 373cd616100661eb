//! Sort rules level-first, assign dense indices, compute parent ranges, and
//! serialize the chunked binary rule file (component F).

use hashbrown::HashMap;

use super::intern::{self, Interner};
use super::rule::Rule;
use super::tags;
use crate::binary::format::{
    Description, Header, CHUNK_DESC, CHUNK_HEAD, CHUNK_SLEN, CHUNK_SOFF, CHUNK_STRS, CHUNK_TAGS, NONE_U16,
};
use crate::binary::writer::{encode_u16_array, encode_u32_array, ChunkWriter};
use crate::error::CompileError;
use crate::status::Status;

/// Segments joined by `.` in their *original* written order (leaf-first),
/// used as the key `apply_to` values and source-file rule names are written
/// in, as opposed to [`Rule::get_inverted_name`]'s top-of-tree sort key.
fn written_name(segments: &[String]) -> String {
    segments.iter().rev().cloned().collect::<Vec<_>>().join(".")
}

/// Parent key: all but the last (leaf) segment, `!`-joined, `""` for
/// top-level (depth 1) rules whose only parent is the implicit root.
fn parent_key(segments: &[String]) -> String {
    if segments.len() <= 1 {
        String::new()
    } else {
        segments[..segments.len() - 1].join("!")
    }
}

pub fn emit(mut rules: Vec<Rule>, creation_timestamp: u64) -> Result<Vec<u8>, CompileError> {
    // Every rule needs a resolved status; reject compilation rather than
    // emit an `Undefined` entry silently.
    for rule in &rules {
        if rule.status.is_none() {
            return Err(CompileError::syntax(
                "<emit>",
                0,
                format!("rule '{}' has no status assigned", written_name(&rule.segments)),
            ));
        }
        if rule.apply_to.is_some() && rule.status != Some(Status::Exception) {
            return Err(CompileError::syntax(
                "<emit>",
                0,
                format!(
                    "rule '{}' sets apply_to but status is not 'exception'",
                    written_name(&rule.segments)
                ),
            ));
        }
        if rule.status == Some(Status::Exception) && rule.apply_to.is_none() {
            return Err(CompileError::syntax(
                "<emit>",
                0,
                format!("exception rule '{}' has no apply_to", written_name(&rule.segments)),
            ));
        }
    }

    // Duplicate segment sequences are a compile-time error.
    {
        let mut seen: HashMap<String, ()> = HashMap::new();
        for rule in &rules {
            let key = rule.get_inverted_name();
            if seen.insert(key, ()).is_some() {
                return Err(CompileError::DuplicateRule(rule.segments.clone()));
            }
        }
    }

    // `category` defaults to `country` when present, else must be explicit.
    for rule in &mut rules {
        if !rule.tags.contains_key("category") {
            if rule.tags.contains_key("country") {
                let country = rule.tags.get("country").cloned().unwrap();
                rule.tags.insert("category".to_string(), country);
            } else {
                return Err(CompileError::MissingCategory(written_name(&rule.segments)));
            }
        }
    }

    let max_level = rules.iter().map(Rule::depth).max().unwrap_or(0);
    if max_level > 7 {
        return Err(CompileError::TooDeep(max_level));
    }

    // F.1 — deepest level first, ties broken by inverted name.
    rules.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.get_inverted_name().cmp(&b.get_inverted_name())));
    if rules.len() > u16::MAX as usize - 1 {
        return Err(CompileError::TooManyRules(rules.len()));
    }
    for (idx, rule) in rules.iter_mut().enumerate() {
        rule.index = idx as u16;
    }

    // Name -> index, for apply_to resolution.
    let name_to_index: HashMap<String, u16> =
        rules.iter().map(|r| (written_name(&r.segments), r.index)).collect();

    // F.2 — group by parent key; within each group the wildcard (if any)
    // must sort first, then the rest ascending by leaf label.
    let mut groups: HashMap<String, Vec<u16>> = HashMap::new();
    for rule in &rules {
        groups.entry(parent_key(&rule.segments)).or_default().push(rule.index);
    }
    for indices in groups.values_mut() {
        indices.sort_by(|&a, &b| {
            let ra = &rules[a as usize];
            let rb = &rules[b as usize];
            match (ra.is_wildcard(), rb.is_wildcard()) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => ra.leaf().cmp(rb.leaf()),
            }
        });
        // Contiguity assertion: a group's member indices, once settled into
        // final emission order, must occupy one unbroken range. We enforce
        // this below by re-deriving ranges from the *original* depth-sorted
        // array position, not from this within-group reordering, so the
        // group's members are first checked for index contiguity here.
        let mut sorted_by_index = indices.clone();
        sorted_by_index.sort_unstable();
        for w in sorted_by_index.windows(2) {
            if w[1] != w[0] + 1 {
                return Err(CompileError::syntax(
                    "<emit>",
                    0,
                    "internal error: sibling rules are not index-contiguous",
                ));
            }
        }
    }

    // Re-sort each group's stored order (wildcard-first, then leaf-ascending)
    // and lay the DESC array out in that order instead of raw index order,
    // since the wildcard must physically occupy the lowest slot of the range.
    let mut emission_order: Vec<u16> = Vec::with_capacity(rules.len());
    {
        // Collect groups in ascending min-index order so deeper levels still
        // precede shallower ones in the final array.
        let mut group_list: Vec<(&String, &Vec<u16>)> = groups.iter().collect();
        group_list.sort_by_key(|(_, idxs)| *idxs.iter().min().unwrap());
        for (_, idxs) in group_list {
            emission_order.extend_from_slice(idxs);
        }
    }
    // Map original index -> final emission slot.
    let mut slot_of: Vec<u16> = vec![0; rules.len()];
    for (slot, &orig_idx) in emission_order.iter().enumerate() {
        slot_of[orig_idx as usize] = slot as u16;
    }
    for rule in &mut rules {
        rule.index = slot_of[rule.index as usize];
    }
    let mut by_slot: Vec<Rule> = vec![Rule::new(); rules.len()];
    for rule in rules.into_iter() {
        let slot = rule.index as usize;
        by_slot[slot] = rule;
    }
    let rules = by_slot;

    // Child ranges: for each rule, the contiguous slot range of its children.
    // `parent_key` is `!`-joined top-of-tree segments (matching
    // `Rule::get_inverted_name`), so parents are looked up the same way
    // rather than through the leaf-first `written_name`/`name_to_index` map.
    let mut child_range: Vec<(u16, u16)> = vec![(NONE_U16, NONE_U16); rules.len()];
    let index_by_inverted: HashMap<String, u16> =
        rules.iter().map(|r| (r.get_inverted_name(), r.index)).collect();
    let mut groups_by_slot: HashMap<String, Vec<u16>> = HashMap::new();
    for rule in &rules {
        groups_by_slot.entry(parent_key(&rule.segments)).or_default().push(rule.index);
    }
    let mut tld_start = NONE_U16;
    let mut tld_end = NONE_U16;
    for (key, mut slots) in groups_by_slot {
        slots.sort_unstable();
        let start = *slots.first().unwrap();
        let end = *slots.last().unwrap() + 1;
        for w in slots.windows(2) {
            if w[1] != w[0] + 1 {
                return Err(CompileError::syntax("<emit>", 0, "non-contiguous child range"));
            }
        }
        if key.is_empty() {
            tld_start = start;
            tld_end = end;
        } else if let Some(&parent_idx) = index_by_inverted.get(&key) {
            child_range[parent_idx as usize] = (start, end);
        }
    }

    // Interning + tag compression.
    let mut interner = Interner::new();
    let mut tag_sequences: Vec<Vec<u32>> = Vec::with_capacity(rules.len());
    let mut leaf_ids: Vec<u32> = Vec::with_capacity(rules.len());
    for rule in &rules {
        leaf_ids.push(interner.intern(rule.leaf()));
        let mut seq = Vec::with_capacity(rule.tags.len() * 2);
        let mut pairs: Vec<(&String, &String)> = rule.tags.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in pairs {
            seq.push(interner.intern(name));
            seq.push(interner.intern(value));
        }
        tag_sequences.push(seq);
    }
    if interner.len() > u16::MAX as usize {
        return Err(CompileError::TooManyRules(interner.len()));
    }
    let string_blob = intern::compress(&interner);
    let (tag_table, tag_placements) = tags::compress(&tag_sequences);

    let mut descs = Vec::with_capacity(rules.len());
    for (i, rule) in rules.iter().enumerate() {
        let (start, end) = child_range[rule.index as usize];
        let exception_apply_to = if rule.status == Some(Status::Exception) {
            let name = rule.apply_to.as_ref().expect("checked above: exception has apply_to");
            name_to_index.get(name).copied().ok_or_else(|| CompileError::UnresolvedApplyTo {
                name: name.clone(),
                file: "<emit>".to_string(),
                line: 0,
            })?
        } else {
            NONE_U16
        };
        descs.push(Description {
            status: rule.status.unwrap_or(Status::Undefined).as_u8(),
            exception_level: if rule.status == Some(Status::Exception) {
                rule.depth() as u8
            } else {
                0
            },
            exception_apply_to,
            start_offset: start,
            end_offset: end,
            tld_string_id: leaf_ids[i] as u16,
            tags_offset: tag_placements[i].tags_offset,
            tags_count: tag_placements[i].tags_count,
        });
    }

    let header = Header {
        version_major: crate::binary::format::SUPPORTED_VERSION_MAJOR,
        version_minor: crate::binary::format::SUPPORTED_VERSION_MINOR,
        max_level: max_level as u8,
        tld_start_offset: tld_start,
        tld_end_offset: tld_end,
        creation_timestamp,
    };

    let mut desc_bytes = Vec::with_capacity(descs.len() * crate::binary::format::DESC_RECORD_SIZE);
    for d in &descs {
        desc_bytes.extend_from_slice(&d.encode());
    }

    let mut writer = ChunkWriter::new();
    writer.push_chunk(CHUNK_HEAD, header.encode().to_vec());
    writer.push_chunk(CHUNK_DESC, desc_bytes);
    writer.push_chunk(CHUNK_TAGS, encode_u32_array(&tag_table.units));
    writer.push_chunk(CHUNK_SOFF, encode_u32_array(&string_blob.offsets));
    writer.push_chunk(CHUNK_SLEN, encode_u16_array(&string_blob.lengths));
    writer.push_chunk(CHUNK_STRS, string_blob.blob);

    let bytes = writer.finish();
    if bytes.len() > crate::binary::format::MAX_FILE_SIZE {
        return Err(CompileError::syntax(
            "<emit>",
            0,
            format!("compiled file size {} exceeds the 1 MiB cap", bytes.len()),
        ));
    }
    Ok(bytes)
}
