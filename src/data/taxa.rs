use anyhow::Result;

use crate::error::SplitsError;

/// Taxon labels for ids `1..=ntax`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxa {
    labels: Vec<String>,
}

impl Taxa {
    pub fn from_labels(labels: Vec<String>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for l in &labels {
            if !seen.insert(l.as_str()) {
                return Err(SplitsError::InvalidInput(format!("duplicate taxon label '{}'", l)).into());
            }
        }
        Ok(Self { labels })
    }

    /// Labels `t1..tn`.
    pub fn with_default_labels(ntax: usize) -> Self {
        Self {
            labels: (1..=ntax).map(|i| format!("t{}", i)).collect(),
        }
    }

    pub fn ntax(&self) -> usize {
        self.labels.len()
    }

    /// 1-based label lookup.
    pub fn label(&self, taxon: usize) -> Option<&str> {
        taxon
            .checked_sub(1)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 1-based id of a label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_based_lookup() {
        let taxa = Taxa::from_labels(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(taxa.ntax(), 3);
        assert_eq!(taxa.label(1), Some("a"));
        assert_eq!(taxa.label(0), None);
        assert_eq!(taxa.label(4), None);
        assert_eq!(taxa.index_of("c"), Some(3));
        assert_eq!(Taxa::with_default_labels(2).labels(), &["t1", "t2"]);
    }

    #[test]
    fn duplicate_labels_rejected() {
        assert!(Taxa::from_labels(vec!["a".into(), "a".into()]).is_err());
    }
}
