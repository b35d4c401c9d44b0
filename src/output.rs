use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress human-readable progress lines (set `SYMSTORE_QUIET=1`)
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("SYMSTORE_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
