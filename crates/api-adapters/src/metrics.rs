//! Prometheus counters exposed on `/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Post,
    Reply,
}

impl GenerationKind {
    fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Post => "post",
            GenerationKind::Reply => "reply",
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct GenerationLabels {
    kind: String,
    outcome: String,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ErrorLabels {
    code: String,
}

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    generations: Family<GenerationLabels, Counter>,
    http_errors: Family<ErrorLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let generations = Family::<GenerationLabels, Counter>::default();
        let http_errors = Family::<ErrorLabels, Counter>::default();

        registry.register(
            "ai_generation_requests",
            "AI content generation attempts by kind and outcome",
            generations.clone(),
        );
        registry.register(
            "http_errors",
            "Error responses by error code",
            http_errors.clone(),
        );

        Self {
            registry,
            generations,
            http_errors,
        }
    }

    pub fn record_generation(&self, kind: GenerationKind, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.generations
            .get_or_create(&GenerationLabels {
                kind: kind.as_str().to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn record_error(&self, code: &str) {
        self.http_errors
            .get_or_create(&ErrorLabels {
                code: code.to_string(),
            })
            .inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = Metrics::new();
        metrics.record_generation(GenerationKind::Post, true);
        metrics.record_generation(GenerationKind::Post, true);
        metrics.record_generation(GenerationKind::Reply, false);
        metrics.record_error("BOARD_NOT_FOUND");

        let text = metrics.render().unwrap();
        let posts_ok = r#"ai_generation_requests_total{kind="post",outcome="success"} 2"#;
        let replies_failed = r#"ai_generation_requests_total{kind="reply",outcome="failure"} 1"#;
        assert!(text.contains(posts_ok), "{text}");
        assert!(text.contains(replies_failed), "{text}");
        assert!(text.contains(r#"http_errors_total{code="BOARD_NOT_FOUND"} 1"#), "{text}");
        assert!(text.ends_with("# EOF\n"));
    }
}
