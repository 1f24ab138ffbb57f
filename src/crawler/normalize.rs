use url::Url;

/// Resolve `href` against `base` and scope it to `base`'s host.
///
/// `base` is the URL of the *parent* Resource, not the Worker's seed —
/// every admitted ancestor has already passed this same test, so it
/// already shares the seed host.
///
/// `url::Url::parse` rejects bare relative references, so an `href` that
/// parses as a standalone URL is treated as already-absolute; one that
/// doesn't parse is resolved as a reference relative to `base` instead.
/// Either way the resolved URL's host is checked against `base`'s host —
/// a network-path reference such as `//cdn.other.com/x` fails to parse
/// standalone but still carries its own host once joined against `base`,
/// so the check has to run unconditionally on the resolved URL rather
/// than only on the already-absolute branch.
pub fn normalise(href: &str, base: &Url) -> Option<Url> {
    let resolved = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(_) => base.join(href).ok()?,
    };

    if resolved.host_str() != base.host_str() {
        return None;
    }

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
