//! End-to-end tests driving the public API the way a real caller would:
//! write `*.ini` rule sources to a temp directory, compile them with
//! `compile_directory`, reload the bytes with `LoadedRules::open`, then
//! exercise `lookup`/`enumerate`/`validate` against the loaded file.

use std::fs;
use std::io::Write;

use tldrs::{enumerate::Enumerator, lookup, lookup_uri, status_to_string, Outcome, Status, UriFlags};

fn write_rule_file(dir: &std::path::Path, name: &str, body: &str) {
    let mut f = fs::File::create(dir.join(name)).unwrap();
    f.write_all(body.as_bytes()).unwrap();
}

fn compile_sample() -> tldrs::LoadedRules {
    let dir = tempfile::tempdir().unwrap();
    write_rule_file(
        dir.path(),
        "generic.ini",
        "[com]\nstatus = valid\ntag/country = none\n\n\
         [net]\nstatus = deprecated\ntag/country = none\n",
    );
    write_rule_file(
        dir.path(),
        "ar.ini",
        "[ar]\nstatus = unused\ntag/country = Argentina\n\n\
         [int.ar]\nstatus = valid\ntag/country = Argentina\n",
    );
    write_rule_file(
        dir.path(),
        "jp.ini",
        "[jp]\nstatus = valid\ntag/country = Japan\n\n\
         [kawasaki.jp]\nstatus = valid\ntag/country = Japan\n\n\
         [*.kawasaki.jp]\nstatus = valid\ntag/country = Japan\n",
    );
    write_rule_file(
        dir.path(),
        "elb.ini",
        "[amazonaws.com]\nstatus = valid\ntag/country = none\n\n\
         [elb.amazonaws.com]\nstatus = valid\ntag/country = none\n\n\
         [us-west-2.elb.amazonaws.com]\nstatus = valid\ntag/country = none\n",
    );
    write_rule_file(
        dir.path(),
        "ck.ini",
        "[ck]\nstatus = valid\ntag/country = Cook Islands\n\n\
         [*.ck]\nstatus = valid\ntag/country = Cook Islands\n\n\
         [?www.ck]\nstatus = exception\napply_to = ck\ntag/country = Cook Islands\n",
    );

    let bytes = tldrs::compile_directory(dir.path(), 1_700_000_000).unwrap();
    let out = dir.path().join("out.tld");
    fs::write(&out, &bytes).unwrap();
    tldrs::LoadedRules::open(&out).unwrap()
}

#[test]
fn spec_scenario_table() {
    let rules = compile_sample();

    let cases: &[(&str, Outcome, &str, usize)] = &[
        ("m2osw.com", Outcome::Success, "com", 5),
        (
            "advisor-z2-ngprod-1997768525.us-west-2.elb.amazonaws.com",
            Outcome::Success,
            "us-west-2.elb.amazonaws.com",
            28,
        ),
        (".com", Outcome::Success, "com", 0),
        ("int.ar", Outcome::Success, "int.ar", 0),
        ("orange.blah.int.ar", Outcome::Success, "int.ar", 11),
        ("night-club.kawasaki.jp", Outcome::Success, "night-club.kawasaki.jp", 0),
        ("orange.night-club.kawasaki.jp", Outcome::Success, "night-club.kawasaki.jp", 6),
    ];

    for (input, outcome, tld, offset) in cases {
        let info = lookup(&rules, input).unwrap_or_else(|e| panic!("{input}: unexpected error {e}"));
        assert_eq!(info.outcome, *outcome, "outcome for {input}");
        assert_eq!(info.tld, *tld, "tld for {input}");
        assert_eq!(info.offset, *offset, "offset for {input}");
    }
}

#[test]
fn spec_scenario_errors() {
    let rules = compile_sample();
    assert!(lookup(&rules, "com").is_err());
    assert!(lookup(&rules, "a..b.com").is_err());
}

#[test]
fn spec_scenario_invalid_status() {
    let rules = compile_sample();
    let info = lookup(&rules, ".ar").unwrap();
    assert_eq!(info.outcome, Outcome::Invalid);
    assert_eq!(info.status, Status::Unused);
    assert_eq!(status_to_string(info.status), "unused");
}

#[test]
fn wildcard_and_exception_round_trip_through_compiled_file() {
    let rules = compile_sample();

    let info = lookup(&rules, "x.y.ck").unwrap();
    assert_eq!(info.outcome, Outcome::Success);
    assert_eq!(info.tld, "y.ck");

    let info = lookup(&rules, "www.ck").unwrap();
    assert_eq!(info.outcome, Outcome::Success);
    assert_eq!(info.tld, "ck");

    let info = lookup(&rules, "anything.ck").unwrap();
    assert_eq!(info.tld, "anything.ck");
}

#[test]
fn enumerator_round_trips_every_compiled_rule() {
    let rules = compile_sample();
    let mut names = std::collections::HashSet::new();
    let mut it = Enumerator::new(&rules);
    while let Ok(entry) = it.next() {
        names.insert(entry.name);
    }
    for expected in [".com", ".net", ".ar", ".int.ar", ".jp", ".kawasaki.jp"] {
        assert!(names.contains(expected), "missing {expected} in enumerated set");
    }
}

#[test]
fn lookup_uri_extracts_host_and_resolves_it() {
    let rules = compile_sample();
    let info = lookup_uri(&rules, "https://m2osw.com/path?x=1", "*", UriFlags::default()).unwrap();
    assert_eq!(info.outcome, Outcome::Success);
    assert_eq!(info.tld, "com");
}

#[test]
fn recompiling_the_same_sources_is_deterministic_modulo_timestamp() {
    use tldrs::binary::{CHUNK_PREFIX_SIZE, HEAD_SIZE, PREAMBLE_SIZE};

    let dir = tempfile::tempdir().unwrap();
    write_rule_file(dir.path(), "root.ini", "[com]\nstatus = valid\ntag/country = none\n");
    let mut a = tldrs::compile_directory(dir.path(), 111).unwrap();
    let mut b = tldrs::compile_directory(dir.path(), 222).unwrap();
    assert_eq!(a.len(), b.len());

    // The `HEAD` chunk is written first and is the only chunk whose bytes
    // depend on the creation timestamp; mask just that 8-byte field (the
    // last field of the HEAD payload) before comparing the rest byte-for-byte.
    let head_payload_start = PREAMBLE_SIZE + CHUNK_PREFIX_SIZE;
    let timestamp_start = head_payload_start + (HEAD_SIZE - 8);
    let timestamp_end = head_payload_start + HEAD_SIZE;
    for buf in [&mut a, &mut b] {
        buf[timestamp_start..timestamp_end].fill(0);
    }
    assert_eq!(a, b);
}
