use url::Url;

/// Resolves a captcha `imageUrl` against the API base.
///
/// Absolute URLs are returned unchanged. Root-relative paths (`/captcha/x.png`)
/// resolve against the base origin, other relative paths against the base path.
/// Falls back to the raw value when the base itself cannot be parsed.
pub fn resolve_image_url(base_url: &str, image_url: &str) -> String {
    if Url::parse(image_url).is_ok() {
        return image_url.to_string();
    }
    let base = format!("{}/", base_url.trim_end_matches('/'));
    match Url::parse(&base).and_then(|b| b.join(image_url)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => image_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://host.example/api/ecourts";

    #[test]
    fn test_absolute_passes_through() {
        assert_eq!(
            resolve_image_url(BASE, "https://cdn.example/c.png"),
            "https://cdn.example/c.png"
        );
        assert_eq!(
            resolve_image_url(BASE, "data:image/png;base64,AAAA"),
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn test_root_relative_uses_origin() {
        assert_eq!(
            resolve_image_url(BASE, "/captcha/abc.png"),
            "https://host.example/captcha/abc.png"
        );
    }

    #[test]
    fn test_relative_uses_base_path() {
        assert_eq!(
            resolve_image_url(BASE, "captcha/abc.png"),
            "https://host.example/api/ecourts/captcha/abc.png"
        );
    }

    #[test]
    fn test_unparseable_base_returns_raw() {
        assert_eq!(resolve_image_url("not a url", "x.png"), "x.png");
    }
}
