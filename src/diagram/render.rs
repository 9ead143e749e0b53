//! Diagram rendering
//!
//! Documents are rendered by an external PlantUML server. A batch runs on a
//! bounded worker pool; every document gets its own result slot, and a
//! failing or panicking render becomes a placeholder instead of taking the
//! batch down.
//!
//! @module diagram/render

use crate::core::config::RenderConfig;
use crate::core::error::{Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use reqwest::blocking::Client;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// =============================================================================
// RENDERER
// =============================================================================

/// Turns a diagram document into image bytes
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, document: &str) -> Result<Vec<u8>>;
}

/// PlantUML server client (`POST <server>/<format>` with the document as body)
pub struct PlantUmlServer {
    client: Client,
    endpoint: String,
}

impl PlantUmlServer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                config.server_url.trim_end_matches('/'),
                config.format.as_str()
            ),
        })
    }

    /// Create render error with helpful message
    fn connection_error(&self, e: reqwest::Error) -> Error {
        if e.is_connect() {
            Error::Render {
                message: format!(
                    "Cannot connect to PlantUML server at {}. Check render.server_url in your config.",
                    self.endpoint
                ),
            }
        } else if e.is_timeout() {
            Error::Render {
                message: format!("PlantUML request to {} timed out", self.endpoint),
            }
        } else {
            Error::Http(e)
        }
    }
}

impl DiagramRenderer for PlantUmlServer {
    fn render(&self, document: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(document.to_string())
            .send()
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Render {
                message: format!("PlantUML server returned {}", status),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

// =============================================================================
// RENDER POOL
// =============================================================================

/// Result slot of one rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { bytes: Vec<u8> },
    Failed { message: String },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }
}

/// Bounded pool rendering independent documents in parallel
pub struct RenderPool {
    pool: ThreadPool,
}

impl RenderPool {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("strata-render-{}", i))
            .build()
            .map_err(|e| Error::Render {
                message: format!("Failed to start render pool: {}", e),
            })?;
        Ok(Self { pool })
    }

    /// Render every document; outcomes come back in input order
    pub fn render_all<R>(&self, renderer: &R, documents: &[String]) -> Vec<RenderOutcome>
    where
        R: DiagramRenderer + ?Sized,
    {
        self.pool.install(|| {
            documents
                .par_iter()
                .map(|document| render_one(renderer, document))
                .collect()
        })
    }
}

fn render_one<R: DiagramRenderer + ?Sized>(renderer: &R, document: &str) -> RenderOutcome {
    let tag = short_tag();
    let start = Instant::now();
    debug!(task = %tag, bytes = document.len(), "Rendering diagram");

    match panic::catch_unwind(AssertUnwindSafe(|| renderer.render(document))) {
        Ok(Ok(bytes)) => {
            debug!(
                task = %tag,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Diagram rendered"
            );
            RenderOutcome::Rendered { bytes }
        }
        Ok(Err(e)) => {
            warn!(task = %tag, "Diagram render failed: {}", e);
            RenderOutcome::Failed {
                message: e.to_string(),
            }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(task = %tag, "Diagram renderer panicked: {}", message);
            RenderOutcome::Failed {
                message: format!("renderer panicked: {}", message),
            }
        }
    }
}

fn short_tag() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ImageFormat;

    /// Echoes documents back, fails on "fail", panics on "panic"
    struct FakeRenderer;

    impl DiagramRenderer for FakeRenderer {
        fn render(&self, document: &str) -> Result<Vec<u8>> {
            match document {
                "fail" => Err(Error::Render {
                    message: "server said no".to_string(),
                }),
                "panic" => panic!("renderer exploded"),
                other => Ok(other.as_bytes().to_vec()),
            }
        }
    }

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_outcomes_keep_input_order() {
        let pool = RenderPool::new(3).unwrap();
        let outcomes = pool.render_all(&FakeRenderer, &docs(&["a", "b", "c", "d"]));
        let rendered: Vec<_> = outcomes
            .iter()
            .map(|o| match o {
                RenderOutcome::Rendered { bytes } => String::from_utf8(bytes.clone()).unwrap(),
                RenderOutcome::Failed { message } => message.clone(),
            })
            .collect();
        assert_eq!(rendered, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_failures_become_placeholders() {
        let pool = RenderPool::new(2).unwrap();
        let outcomes = pool.render_all(&FakeRenderer, &docs(&["ok", "fail", "panic", "fine"]));

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_rendered());
        assert!(matches!(&outcomes[1], RenderOutcome::Failed { message } if message.contains("server said no")));
        assert!(matches!(&outcomes[2], RenderOutcome::Failed { message } if message.contains("renderer exploded")));
        assert!(outcomes[3].is_rendered());
    }

    #[test]
    fn test_server_endpoint() {
        let config = RenderConfig {
            server_url: "http://plantuml:8080/".to_string(),
            format: ImageFormat::Svg,
            ..RenderConfig::default()
        };
        let server = PlantUmlServer::new(&config).unwrap();
        assert_eq!(server.endpoint, "http://plantuml:8080/svg");
    }

    #[test]
    fn test_zero_workers_still_runs() {
        let pool = RenderPool::new(0).unwrap();
        assert_eq!(pool.render_all(&FakeRenderer, &docs(&["x"])).len(), 1);
    }
}
