use log::debug;
use thiserror::Error;

/// Version string baked in when the bundled version record is missing or
/// unreadable.
pub const FALLBACK_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("Empty version string")]
    Empty,
    #[error("Invalid version component {component:?} in {input:?}")]
    InvalidComponent { input: String, component: String },
}

/// Parse a dotted version string into its numeric components.
///
/// # Errors
/// Returns an error when the input is blank or any dot-separated component is
/// not a non-negative integer.
pub fn parse_components(version: &str) -> Result<Vec<u64>, VersionParseError> {
    let version = version.trim();
    if version.is_empty() {
        return Err(VersionParseError::Empty);
    }

    version
        .split('.')
        .map(|component| {
            let component = component.trim();
            component
                .parse::<u64>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    input: version.to_string(),
                    component: component.to_string(),
                })
        })
        .collect()
}

/// Whether `latest` is strictly newer than `current`.
///
/// Components are compared left to right as integers; a missing trailing
/// component counts as zero, so `1.2` and `1.2.0` are equal. Blank or
/// malformed input fails closed: the comparison reports no update rather than
/// erroring.
#[must_use]
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    let (latest, current) = match (parse_components(latest), parse_components(current)) {
        (Ok(latest), Ok(current)) => (latest, current),
        (Err(error), _) | (_, Err(error)) => {
            debug!("Version comparison failed closed: {error}");
            return false;
        }
    };

    for i in 0..latest.len().max(current.len()) {
        let l = latest.get(i).copied().unwrap_or(0);
        let c = current.get(i).copied().unwrap_or(0);
        if l != c {
            return l > c;
        }
    }

    false
}

/// Strip the release-tag prefix from a tag name: a leading `v.` if present,
/// otherwise a leading `v`, otherwise the tag is returned unchanged.
#[must_use]
pub fn version_from_tag(tag: &str) -> &str {
    tag.strip_prefix("v.")
        .or_else(|| tag.strip_prefix('v'))
        .unwrap_or(tag)
}

/// Read `application.version` from a `key=value` properties resource.
///
/// Lines starting with `#` or `!` are comments. A missing key or blank value
/// falls back to [`FALLBACK_VERSION`].
#[must_use]
pub fn version_from_properties(contents: &str) -> String {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .find_map(|line| {
            let (key, value) = line.split_once('=')?;
            (key.trim() == "application.version").then(|| value.trim().to_string())
        })
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| FALLBACK_VERSION.to_string())
}
