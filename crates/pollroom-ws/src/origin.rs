use axum::http::{header, HeaderMap};
use pollroom_core::AppConfig;
use std::collections::BTreeSet;
use url::Url;

/// Dev servers that may always open a room.
const LOCAL_ORIGINS: &[&str] = &[
    "http://localhost:1999",
    "http://127.0.0.1:1999",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// `scheme://host[:port]` as browsers send it, or `None` if `raw` is not an
/// http(s) origin. Case, trailing paths and default ports are folded away.
fn canonical_origin(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url.origin().ascii_serialization())
}

/// Which browser origins may upgrade to a room socket.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: BTreeSet<String>,
    ignored: Vec<String>,
}

impl OriginPolicy {
    pub fn new(config: &AppConfig) -> Self {
        let configured = config
            .public_url
            .iter()
            .chain(&config.allowed_origins)
            .map(String::as_str)
            .filter(|raw| !raw.trim().is_empty());

        let mut allowed = BTreeSet::new();
        let mut ignored = Vec::new();
        for raw in LOCAL_ORIGINS.iter().copied().chain(configured) {
            match canonical_origin(raw) {
                Some(origin) => {
                    allowed.insert(origin);
                }
                None => ignored.push(raw.to_string()),
            }
        }
        Self { allowed, ignored }
    }

    /// Configured entries that are not usable origins, `*` included.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn permits(&self, headers: &HeaderMap) -> bool {
        let Some(raw) = header_str(headers, header::ORIGIN) else {
            // Non-browser clients do not send Origin.
            return true;
        };
        let Some(origin) = canonical_origin(raw) else {
            return false;
        };
        if self.allowed.contains(&origin) {
            return true;
        }
        header_str(headers, header::HOST).is_some_and(|host| same_authority(&origin, host))
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// A page served by this very host may always connect back to it.
fn same_authority(origin: &str, host: &str) -> bool {
    origin
        .split_once("://")
        .is_some_and(|(_, authority)| authority.eq_ignore_ascii_case(host.trim()))
}
