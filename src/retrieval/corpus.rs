use crate::error::{AppError, Result};
use crate::normalize::normalize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Question files compiled into the binary, used when no corpus
/// directory is available.
const EMBEDDED: &[&str] = &[
    include_str!("../../prompts/meta_ads.txt"),
    include_str!("../../prompts/analytics.txt"),
    include_str!("../../prompts/strategy.txt"),
];

/// Words that carry no routing signal. Time words and request fillers are
/// included so a question only matches on its subject.
const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "am", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by",
    "can", "could", "did", "do", "does", "for", "from", "get", "got", "had", "has", "have", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "my", "of", "on", "or", "our", "so",
    "that", "the", "their", "them", "then", "there", "these", "this", "those", "to", "up", "us",
    "was", "we", "were", "what", "whats", "when", "where", "which", "who", "why", "will", "with",
    "would", "you", "your", "today", "yesterday", "tomorrow", "now", "please", "tell", "show",
    "give", "much", "many", "far", "like", "going", "s",
];

/// Lowercase alphanumeric words longer than one character, minus stop words.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptEntry {
    pub text: String,
    pub tokens: HashSet<String>,
}

/// Static set of example questions, normalized at load time.
#[derive(Debug, Clone, Default)]
pub struct PromptCorpus {
    entries: Vec<PromptEntry>,
}

impl PromptCorpus {
    pub fn from_prompts<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let entries = prompts
            .into_iter()
            .filter_map(|p| {
                let line = p.as_ref().trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                let text = normalize(line);
                let tokens = tokenize(&text);
                (!tokens.is_empty() && seen.insert(text.clone())).then_some(PromptEntry { text, tokens })
            })
            .collect();
        Self { entries }
    }

    pub fn embedded() -> Self {
        Self::from_prompts(EMBEDDED.iter().flat_map(|file| file.lines()))
    }

    /// Load every `*.txt` file in `dir`, one question per line, in file
    /// name order.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let read_dir = fs::read_dir(dir).map_err(|e| {
            AppError::ConfigError(format!("Cannot read prompt corpus {}: {}", dir.display(), e))
        })?;

        let mut files: Vec<_> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        files.sort();

        let mut lines = Vec::new();
        for path in &files {
            let content = fs::read_to_string(path).map_err(|e| {
                AppError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
            })?;
            lines.extend(content.lines().map(str::to_string));
        }

        let corpus = Self::from_prompts(lines);
        tracing::info!(
            dir = %dir.display(),
            files = files.len(),
            prompts = corpus.len(),
            "Prompt corpus loaded"
        );
        Ok(corpus)
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("What's my Meta spend today? A/B");
        let mut sorted: Vec<_> = tokens.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["meta", "spend"]);
    }

    #[test]
    fn test_from_prompts_skips_comments_and_duplicates() {
        let corpus = PromptCorpus::from_prompts([
            "# header",
            "",
            "How many leads did we get",
            "how many leads did we get",
            "the",
        ]);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.entries()[0].text, "how many leads did we get");
    }

    #[test]
    fn test_embedded_corpus_is_not_empty() {
        assert!(PromptCorpus::embedded().len() > 20);
    }

    #[test]
    fn test_load_dir_reads_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ads.txt"), "# ads\nhow much did i spend\n").unwrap();
        std::fs::write(dir.path().join("ga.txt"), "website visitors yesterday\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored question here\n").unwrap();

        let corpus = PromptCorpus::load_dir(dir.path()).unwrap();
        let texts: Vec<&str> = corpus.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["how much did i spend", "website visitors yesterday"]);
    }

    #[test]
    fn test_load_dir_missing_is_config_error() {
        let result = PromptCorpus::load_dir(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
