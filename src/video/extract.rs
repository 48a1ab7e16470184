//! Artifact-URL extraction over the provider's shape-variable status
//! responses. Strategies run in declared priority order; the generic
//! "any key containing url" scan is the lowest-priority fallback.

use serde_json::Value;

/// One attempt at locating the artifact URL in a status response body.
pub trait UrlStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_extract(&self, body: &Value) -> Option<String>;
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

struct ResultFilesUrl;

impl UrlStrategy for ResultFilesUrl {
    fn name(&self) -> &'static str {
        "result.files[0].url"
    }

    fn try_extract(&self, body: &Value) -> Option<String> {
        non_empty_str(body.get("result")?.get("files")?.get(0)?.get("url")?)
    }
}

struct ResultVideoUrl;

impl UrlStrategy for ResultVideoUrl {
    fn name(&self) -> &'static str {
        "result.video_url"
    }

    fn try_extract(&self, body: &Value) -> Option<String> {
        non_empty_str(body.get("result")?.get("video_url")?)
    }
}

struct ResultUrl;

impl UrlStrategy for ResultUrl {
    fn name(&self) -> &'static str {
        "result.url"
    }

    fn try_extract(&self, body: &Value) -> Option<String> {
        non_empty_str(body.get("result")?.get("url")?)
    }
}

struct TopLevelVideoUrl;

impl UrlStrategy for TopLevelVideoUrl {
    fn name(&self) -> &'static str {
        "video_url"
    }

    fn try_extract(&self, body: &Value) -> Option<String> {
        non_empty_str(body.get("video_url")?)
    }
}

/// Last resort: first key under `result` whose name contains "url"
/// (case-insensitive) with a non-empty string value. Key iteration follows
/// the parsed map's deterministic order, but which field wins is inherently
/// a guess about provider intent.
struct AnyResultUrlKey;

impl UrlStrategy for AnyResultUrlKey {
    fn name(&self) -> &'static str {
        "result.*url*"
    }

    fn try_extract(&self, body: &Value) -> Option<String> {
        let result = body.get("result")?.as_object()?;
        for (key, value) in result {
            if key.to_lowercase().contains("url") {
                if let Some(url) = non_empty_str(value) {
                    return Some(url);
                }
            }
        }
        None
    }
}

/// Priority order is this declared list, never the response's key order.
pub static DEFAULT_STRATEGIES: &[&dyn UrlStrategy] = &[
    &ResultFilesUrl,
    &ResultVideoUrl,
    &ResultUrl,
    &TopLevelVideoUrl,
    &AnyResultUrlKey,
];

/// Apply the strategy chain; `None` means no recognizable artifact URL.
pub fn extract_artifact_url(body: &Value) -> Option<String> {
    for strategy in DEFAULT_STRATEGIES {
        if let Some(url) = strategy.try_extract(body) {
            log::debug!("artifact URL located via {}", strategy.name());
            return Some(url);
        }
    }
    None
}
