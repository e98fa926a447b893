use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Decides whether a domain is spam. Called once per work item, in batch order.
pub trait Classifier {
    /// Sent to the server as `pc_version` on every request.
    fn version(&self) -> &str;
    fn is_spam(&self, domain: &str) -> Result<bool>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn version(&self) -> &str {
        (**self).version()
    }

    fn is_spam(&self, domain: &str) -> Result<bool> {
        (**self).is_spam(domain)
    }
}

/// Pattern, suffix and keyword rules taken from the `[classifier]` config section.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    version: String,
    patterns: Vec<Regex>,
    suffixes: Vec<String>,
    keywords: Vec<String>,
    allow_suffixes: Vec<String>,
}

impl RuleClassifier {
    pub fn new(cfg: &Config) -> Result<Self> {
        let c = &cfg.classifier;
        let patterns = c
            .patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("bad classifier pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version: c.version.clone(),
            patterns,
            suffixes: normalize_all(&c.suffixes),
            keywords: normalize_all(&c.keywords),
            allow_suffixes: normalize_all(&c.allow_suffixes),
        })
    }
}

impl Classifier for RuleClassifier {
    fn version(&self) -> &str {
        &self.version
    }

    fn is_spam(&self, domain: &str) -> Result<bool> {
        let name = normalize_domain(domain);
        if name.is_empty() {
            return Err(anyhow!("empty domain name"));
        }

        if self.allow_suffixes.iter().any(|s| has_label_suffix(&name, s)) {
            return Ok(false);
        }

        Ok(self.patterns.iter().any(|re| re.is_match(&name))
            || self.suffixes.iter().any(|s| has_label_suffix(&name, s))
            || self.keywords.iter().any(|k| name.contains(k.as_str())))
    }
}

/// NFKC, lowercase, no surrounding whitespace, no trailing root dot.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('.')
        .nfkc()
        .collect::<String>()
        .to_lowercase()
}

fn normalize_all(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| normalize_domain(s.trim_start_matches('.')))
        .filter(|s| !s.is_empty())
        .collect()
}

fn has_label_suffix(name: &str, suffix: &str) -> bool {
    name == suffix
        || name
            .strip_suffix(suffix)
            .is_some_and(|head| head.ends_with('.'))
}
