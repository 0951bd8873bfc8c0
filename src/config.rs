use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

const ENV_PREFIX: &str = "GRADCRAWL";
const BASE_URL: &str = "https://www.thegradcafe.com";
pub const MAX_RETRIES_LIMIT: u32 = 5;

/// Inclusive jitter window in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        DelayRange { min_ms, max_ms }
    }

    pub const ZERO: DelayRange = DelayRange::new(0, 0);

    /// Draw a random delay from the window.
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub base_url: String,
    /// Tried in order for every page; `{page}` is replaced by the page index.
    pub listing_urls: Vec<String>,
    pub target_entries: usize,
    pub max_pages: usize,
    pub empty_page_threshold: usize,
    pub workers: usize,
    pub batch_size: usize,
    pub page_delay: DelayRange,
    pub detail_delay: DelayRange,
    pub checkpoint_interval: usize,
    pub checkpoint_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub show_progress: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            base_url: BASE_URL.to_string(),
            listing_urls: vec![
                format!("{BASE_URL}/survey/index.php?q=&t=a&o=&pp=250&p={{page}}"),
                format!("{BASE_URL}/survey/?page={{page}}"),
                format!("{BASE_URL}/survey/index.php?page={{page}}"),
            ],
            target_entries: 1000,
            max_pages: 100,
            empty_page_threshold: 3,
            workers: 5,
            batch_size: 50,
            page_delay: DelayRange::new(1000, 2000),
            detail_delay: DelayRange::new(500, 1200),
            checkpoint_interval: 500,
            checkpoint_dir: PathBuf::from("data/checkpoints"),
            request_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 1000,
            show_progress: true,
        }
    }
}

impl CrawlConfig {
    /// Defaults, then an optional config file, then `GRADCRAWL__*` environment variables
    /// (`GRADCRAWL__WORKERS=8`).
    pub fn load(file: Option<&Path>) -> Result<Self, PipelineError> {
        let defaults = config::Config::try_from(&CrawlConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("listing_urls"),
            )
            .build()?;
        let cfg: CrawlConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Shorter politeness windows, less friendly to the server.
    pub fn fast(mut self) -> Self {
        self.page_delay = DelayRange::new(300, 800);
        self.detail_delay = DelayRange::new(300, 700);
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let fail = |msg: &str| Err(PipelineError::Config(msg.to_string()));
        if self.listing_urls.is_empty() {
            return fail("at least one listing URL template is required");
        }
        if self.listing_urls.iter().any(|u| !u.contains("{page}")) {
            return fail("listing URL templates must contain {page}");
        }
        if self.workers == 0 {
            return fail("workers must be at least 1");
        }
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1");
        }
        if self.checkpoint_interval == 0 {
            return fail("checkpoint_interval must be at least 1");
        }
        if self.empty_page_threshold == 0 {
            return fail("empty_page_threshold must be at least 1");
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(PipelineError::Config(format!(
                "max_retries must be at most {MAX_RETRIES_LIMIT}"
            )));
        }
        if self.page_delay.min_ms > self.page_delay.max_ms
            || self.detail_delay.min_ms > self.detail_delay.max_ms
        {
            return fail("delay ranges must have min <= max");
        }
        Ok(())
    }

    pub fn listing_url(&self, template: &str, page: usize) -> String {
        template.replace("{page}", &page.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CrawlConfig::default().validate().is_ok());
    }

    #[test]
    fn fast_mode_shrinks_delays() {
        let cfg = CrawlConfig::default().fast();
        assert_eq!(cfg.page_delay, DelayRange::new(300, 800));
        assert_eq!(cfg.detail_delay, DelayRange::new(300, 700));
    }

    #[test]
    fn rejects_inverted_delay() {
        let cfg = CrawlConfig {
            detail_delay: DelayRange::new(900, 100),
            ..CrawlConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unbounded_retries() {
        let cfg = CrawlConfig {
            max_retries: 40,
            ..CrawlConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = CrawlConfig {
            max_retries: MAX_RETRIES_LIMIT,
            ..CrawlConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let cfg = CrawlConfig {
            listing_urls: vec!["https://example.com/list".into()],
            ..CrawlConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sample_stays_in_window() {
        let range = DelayRange::new(10, 20);
        for _ in 0..50 {
            let d = range.sample().as_millis() as u64;
            assert!((10..=20).contains(&d));
        }
        assert_eq!(DelayRange::ZERO.sample(), Duration::ZERO);
    }

    #[test]
    fn listing_url_substitutes_page() {
        let cfg = CrawlConfig::default();
        let url = cfg.listing_url("https://x.test/survey?p={page}", 7);
        assert_eq!(url, "https://x.test/survey?p=7");
    }

    #[test]
    fn load_reads_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.toml");
        std::fs::write(&path, "workers = 8\nbatch_size = 20\n").unwrap();
        let cfg = CrawlConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.checkpoint_interval, 500);
    }

    #[test]
    fn load_reads_double_underscore_env() {
        std::env::set_var("GRADCRAWL__EMPTY_PAGE_THRESHOLD", "4");
        let cfg = CrawlConfig::load(None);
        std::env::remove_var("GRADCRAWL__EMPTY_PAGE_THRESHOLD");
        assert_eq!(cfg.unwrap().empty_page_threshold, 4);
    }
}
