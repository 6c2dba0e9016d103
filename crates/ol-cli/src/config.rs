use std::fs;
use std::path::Path;
use std::time::Instant;

use ol_compiler::{build_whitelist, parse_config, CompiledConfig};

/// Read, validate and build a configuration file.
pub fn load_config(path: &Path) -> Result<CompiledConfig, String> {
    let start = Instant::now();

    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

    let document = parse_config(&content)
        .map_err(|e| format!("Invalid configuration '{}': {}", path.display(), e))?;

    let compiled = build_whitelist(&document)
        .map_err(|e| format!("Invalid configuration '{}': {}", path.display(), e))?;

    log::debug!(
        "loaded '{}': {} -> {} access entries (dedupe removed {}), multi access {}, {:.1}ms",
        path.display(),
        compiled.stats.before,
        compiled.stats.after,
        compiled.stats.deduped,
        document.has_multi_access,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(compiled)
}
