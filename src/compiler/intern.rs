//! String interner and superstring compressor (component D).

use hashbrown::HashMap;

use super::merge;

/// Dense positive string IDs. ID 0 is reserved as the "absent" sentinel.
pub struct Interner {
    strings: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            strings: vec![String::new()],
            ids: HashMap::new(),
        }
    }

    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.ids.insert(s.to_string(), id);
        id
    }

    pub fn resolve(&self, id: u32) -> &str {
        &self.strings[id as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// The compressed string blob plus per-ID `(offset, length)` spans, ready to
/// become the `SOFF`/`SLEN`/`STRS` chunks. Index 0 is an unused placeholder
/// (the null-string sentinel never occupies blob bytes).
pub struct StringBlob {
    pub blob: Vec<u8>,
    pub offsets: Vec<u32>,
    pub lengths: Vec<u16>,
}

pub fn compress(interner: &Interner) -> StringBlob {
    let items: Vec<Vec<u8>> = interner.strings[1..].iter().map(|s| s.as_bytes().to_vec()).collect();
    let (blob, spans) = merge::pack(&items);

    let mut offsets = vec![0u32];
    let mut lengths = vec![0u16];
    for (offset, length) in spans {
        offsets.push(offset as u32);
        lengths.push(length as u16);
    }
    StringBlob { blob, offsets, lengths }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_identical_strings() {
        let mut i = Interner::new();
        let a = i.intern("co");
        let b = i.intern("co");
        assert_eq!(a, b);
        assert_eq!(i.resolve(a), "co");
    }

    #[test]
    fn compresses_and_every_span_resolves() {
        let mut i = Interner::new();
        let ids: Vec<u32> = ["uk", "co.uk", "org.uk", "police.uk", "com"]
            .iter()
            .map(|s| i.intern(s))
            .collect();
        let blob = compress(&i);
        for (&id, s) in ids.iter().zip(["uk", "co.uk", "org.uk", "police.uk", "com"]) {
            let off = blob.offsets[id as usize] as usize;
            let len = blob.lengths[id as usize] as usize;
            assert_eq!(std::str::from_utf8(&blob.blob[off..off + len]).unwrap(), s);
        }
    }
}
