use std::env;
use std::path::PathBuf;

/// Replace `${VAR}` references with the variable's value (empty when unset).
///
/// An unclosed `${` is kept literally.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Expand env references, then a leading `~/` to the home directory.
pub fn expand_path(value: &str) -> PathBuf {
    let expanded = expand_env_vars(value);
    if let Some(stripped) = expanded.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(expanded)
}
