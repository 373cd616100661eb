//! The compiler: ingests a directory of INI-style rule source files and
//! emits a compact binary rule file (components A-F).

pub mod emit;
pub mod intern;
pub mod lexer;
pub mod merge;
pub mod parser;
pub mod rule;
pub mod tags;

use std::path::Path;

use walkdir::WalkDir;

use crate::error::CompileError;
pub use parser::Parser;
pub use rule::Rule;

/// Walks every `*.ini` file below `dir` (filesystem enumeration order does
/// not affect the result, since rules are sorted before emission) and
/// compiles them into one binary rule file.
pub fn compile_directory(dir: &Path, creation_timestamp: u64) -> Result<Vec<u8>, CompileError> {
    let mut parser = Parser::new();
    let mut file_count = 0usize;

    let mut paths: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "ini").unwrap_or(false))
        .map(|e| e.path().to_path_buf())
        .collect();
    // Sorted purely for deterministic logging; compiled output does not
    // depend on file enumeration order (rules are globally re-sorted).
    paths.sort();

    for path in &paths {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_label = path.display().to_string();
        log::debug!("parsing {file_label}");
        parser.parse_file(&file_label, &text)?;
        file_count += 1;
    }
    log::info!("parsed {file_count} rule file(s), {} rule(s) total", parser.rules.len());

    let bytes = emit::emit(parser.rules, creation_timestamp)?;
    log::info!("emitted {} byte(s)", bytes.len());
    Ok(bytes)
}

/// Emits the compiled bytes as a C `static const uint8_t[]` literal, for
/// embedding as a static fallback (spec.md §4.F.5, §6).
pub fn to_c_source(bytes: &[u8], symbol: &str) -> String {
    let mut out = String::with_capacity(bytes.len() * 6 + 64);
    out.push_str(&format!("static const unsigned char {symbol}[] = {{\n"));
    for chunk in bytes.chunks(16) {
        out.push_str("    ");
        for b in chunk {
            out.push_str(&format!("0x{b:02x}, "));
        }
        out.push('\n');
    }
    out.push_str("};\n");
    out.push_str(&format!("static const unsigned long {symbol}_len = {};\n", bytes.len()));
    out
}
