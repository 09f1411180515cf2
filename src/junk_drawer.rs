use std::path::Path;
use std::time::Duration;

pub fn duration_to_seconds_string(duration: Duration) -> String {
    // Millisecond precision is plenty for a CPU time report.
    format!("{:.3}", duration.as_secs_f64())
}

/// True if both paths name the same file. Falls back to comparing the paths
/// as given when either cannot be canonicalized (e.g. it does not exist).
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
