//! Link recognition and normalization

use url::Url;

/// Schemes accepted as absolute web links
const WEB_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Whether `payload` is, in its entirety, an absolute web URL.
///
/// The trimmed text must contain no whitespace, parse as a URL, use a web scheme
/// and name a host. Opaque forms such as `wifi:...` or `geo:...` are not links.
pub fn looks_like_absolute_url(payload: &str) -> bool {
    let candidate = payload.trim();
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => {
            WEB_SCHEMES.contains(&url.scheme()) && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Remove every query parameter whose key starts with `utm` (any case).
///
/// Remaining parameters keep their order and the fragment is preserved. When no
/// parameter survives, the `?` goes too. Input without a query is returned as is,
/// so applying this twice gives the same result as applying it once.
pub fn strip_tracking_params(url: &str) -> String {
    let (base, fragment) = match url.find('#') {
        Some(i) => url.split_at(i),
        None => (url, ""),
    };
    let Some(q) = base.find('?') else {
        return url.to_string();
    };
    let (path, query) = (&base[..q], &base[q + 1..]);

    let kept: Vec<&str> = query
        .split('&')
        .filter(|param| !param.is_empty() && !is_tracking_param(param))
        .collect();

    let mut out = String::with_capacity(url.len());
    out.push_str(path);
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    out.push_str(fragment);
    out
}

fn is_tracking_param(param: &str) -> bool {
    let key = param.split('=').next().unwrap_or(param);
    key.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("utm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_urls() {
        assert!(looks_like_absolute_url("https://example.com"));
        assert!(looks_like_absolute_url("  http://example.com/path?q=1  "));
        assert!(looks_like_absolute_url("ftp://files.example.com/a.txt"));
    }

    #[test]
    fn test_not_absolute_urls() {
        assert!(!looks_like_absolute_url(""));
        assert!(!looks_like_absolute_url("example.com"));
        assert!(!looks_like_absolute_url("WIFI:T:WPA;S:MyNet;P:secret;;"));
        assert!(!looks_like_absolute_url("geo:37.7,-122.4"));
        assert!(!looks_like_absolute_url("https://example.com and more"));
        assert!(!looks_like_absolute_url("BEGIN:VCARD\nEND:VCARD"));
    }

    #[test]
    fn test_strip_middle_param() {
        assert_eq!(
            strip_tracking_params("https://x.com/?a=1&utm_source=x&b=2"),
            "https://x.com/?a=1&b=2"
        );
    }

    #[test]
    fn test_strip_all_params_drops_question_mark() {
        assert_eq!(
            strip_tracking_params("https://x.com/page?utm_source=a&UTM_Medium=b"),
            "https://x.com/page"
        );
    }

    #[test]
    fn test_strip_keeps_fragment() {
        assert_eq!(
            strip_tracking_params("https://x.com/?utm_campaign=z&id=7#top"),
            "https://x.com/?id=7#top"
        );
        assert_eq!(
            strip_tracking_params("https://x.com/?utm_campaign=z#top"),
            "https://x.com/#top"
        );
    }

    #[test]
    fn test_strip_leaves_other_urls_alone() {
        assert_eq!(strip_tracking_params("https://x.com/a"), "https://x.com/a");
        assert_eq!(
            strip_tracking_params("https://x.com/?utmost=1"),
            "https://x.com/"
        );
        assert_eq!(
            strip_tracking_params("https://x.com/?source=utm"),
            "https://x.com/?source=utm"
        );
    }

    #[test]
    fn test_strip_is_idempotent() {
        let inputs = [
            "https://x.com/?a=1&utm_source=x&b=2",
            "https://x.com/?utm_source=x",
            "https://x.com/?a=1&&b=2#frag",
            "plain text",
        ];
        for input in inputs {
            let once = strip_tracking_params(input);
            assert_eq!(strip_tracking_params(&once), once, "input: {}", input);
        }
    }
}
