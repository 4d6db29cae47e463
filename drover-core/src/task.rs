use std::sync::Arc;

use bytes::Bytes;
use rand::Rng;

use drover_http::HttpRequest;

use crate::config::TaskConfig;
use crate::error::{Error, Result};

const ID_PLACEHOLDER: &str = "{id}";

/// One synthetic request type: its shape, success criterion, and relative
/// selection weight. Built once from the config and immutable for the run.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    name: Arc<str>,
    weight: u32,
    method: http::Method,
    url_template: String,
    body_template: Option<String>,
    expected_status: u16,
    id_range: (u64, u64),
}

impl TaskDefinition {
    /// Resolves a task config against the target base URL.
    ///
    /// Assumes the config has already been validated; an unparseable method
    /// still fails here rather than panicking so the type stays safe to use
    /// on its own.
    pub fn from_config(cfg: &TaskConfig, base_url: &str) -> Result<Self> {
        let method: http::Method = cfg.method.parse().map_err(|_| Error::InvalidMethod {
            task: cfg.name.clone(),
            method: cfg.method.clone(),
        })?;
        if cfg.id_min > cfg.id_max {
            return Err(Error::InvalidIdRange(cfg.name.clone()));
        }

        let base = base_url.trim_end_matches('/');
        let url_template = format!("{base}{}", cfg.path);

        Ok(Self {
            name: Arc::from(cfg.name.as_str()),
            weight: cfg.weight,
            method,
            url_template,
            body_template: cfg.body.clone(),
            expected_status: cfg.expected_status,
            id_range: (cfg.id_min, cfg.id_max),
        })
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    /// Builds a concrete request, substituting `{id}` in the URL and body
    /// with a fresh draw from this task's id range.
    pub fn build_request<R: Rng>(&self, rng: &mut R) -> HttpRequest {
        let (lo, hi) = self.id_range;
        let id = rng.random_range(lo..=hi);

        let url = expand_id(&self.url_template, id);
        let (headers, body) = match &self.body_template {
            Some(template) => (
                vec![("content-type".to_string(), "application/json".to_string())],
                Bytes::from(expand_id(template, id)),
            ),
            None => (Vec::new(), Bytes::new()),
        };

        HttpRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
            timeout: None,
        }
    }
}

fn expand_id(template: &str, id: u64) -> String {
    if template.contains(ID_PLACEHOLDER) {
        template.replace(ID_PLACEHOLDER, &id.to_string())
    } else {
        template.to_string()
    }
}

/// A task drawn from the scheduler together with its freshly built request.
/// Owned by the virtual user that requested it and discarded after execution.
#[derive(Debug)]
pub struct ScheduledTask<'a> {
    pub definition: &'a TaskDefinition,
    pub request: HttpRequest,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn definition(cfg: TaskConfig) -> TaskDefinition {
        TaskDefinition::from_config(&cfg, "http://127.0.0.1:9999/").unwrap()
    }

    #[test]
    fn base_url_and_path_join_without_double_slash() {
        let def = definition(TaskConfig {
            name: "list".to_string(),
            path: "/albums".to_string(),
            ..TaskConfig::default()
        });
        let mut rng = SmallRng::seed_from_u64(1);
        let req = def.build_request(&mut rng);
        assert_eq!(req.url, "http://127.0.0.1:9999/albums");
    }

    #[test]
    fn id_placeholder_expands_within_range() {
        let def = definition(TaskConfig {
            name: "get-by-id".to_string(),
            path: "/albums/{id}".to_string(),
            id_min: 1,
            id_max: 3,
            ..TaskConfig::default()
        });

        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let req = def.build_request(&mut rng);
            let id: u64 = req.url.rsplit('/').next().unwrap().parse().unwrap();
            assert!((1..=3).contains(&id), "id {id} out of range: {}", req.url);
        }
    }

    #[test]
    fn body_template_gets_json_content_type_and_same_id() {
        let def = definition(TaskConfig {
            name: "create".to_string(),
            method: "POST".to_string(),
            path: "/albums/{id}".to_string(),
            body: Some(r#"{"id": {id}, "artist": "synthetic"}"#.to_string()),
            expected_status: 201,
            ..TaskConfig::default()
        });

        let mut rng = SmallRng::seed_from_u64(7);
        let req = def.build_request(&mut rng);

        let url_id = req.url.rsplit('/').next().unwrap().to_string();
        let body = std::str::from_utf8(&req.body).unwrap();
        assert!(body.contains(&format!(r#""id": {url_id}"#)));
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert_eq!(req.method, http::Method::POST);
    }

    #[test]
    fn seeded_builds_are_deterministic() {
        let def = definition(TaskConfig {
            name: "get-by-id".to_string(),
            path: "/products/{id}".to_string(),
            ..TaskConfig::default()
        });

        let mut a = SmallRng::seed_from_u64(99);
        let mut b = SmallRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(def.build_request(&mut a).url, def.build_request(&mut b).url);
        }
    }
}
