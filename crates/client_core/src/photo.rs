use shared::domain::Visit;
use url::Url;

/// Resolves the visit's effective photo URL against the service origin.
///
/// Absolute URLs are returned as-is. Anything else is treated as a path on the service:
/// `/doorbell/visit/7/photo` becomes `{base}/doorbell/visit/7/photo`.
pub fn resolve_photo_url(base_url: &Url, visit: &Visit) -> Option<Url> {
    let raw = visit.effective_photo_url()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(absolute) = Url::parse(raw) {
        if absolute.has_host() {
            return Some(absolute);
        }
    }

    let origin = base_url.as_str().trim_end_matches('/');
    let path = raw.trim_start_matches('/');
    Url::parse(&format!("{origin}/{path}")).ok()
}
