use crate::cache::TtlCache;
use crate::intent::infer_tools;
use crate::retrieval::corpus::{tokenize, PromptCorpus};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Candidates kept after the weighted pre-filter.
const CANDIDATE_POOL: usize = 320;
const MIN_OVERLAP: f64 = 0.15;
const MAX_MATCHES: usize = 12;
const MAX_TOOLS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieval {
    pub matched_prompts: Vec<String>,
    pub tools: Vec<String>,
}

/// Inverted index over the corpus: token to entry positions.
struct InvertedIndex {
    postings: HashMap<String, Vec<usize>>,
}

impl InvertedIndex {
    fn build(corpus: &PromptCorpus) -> Self {
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in corpus.entries().iter().enumerate() {
            for token in &entry.tokens {
                postings.entry(token.clone()).or_default().push(idx);
            }
        }
        Self { postings }
    }

    /// Sum of `1 / sqrt(document frequency)` over shared tokens.
    fn weighted_candidates(&self, query: &HashSet<String>) -> Vec<(usize, f64)> {
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for token in query {
            if let Some(entries) = self.postings.get(token) {
                let weight = 1.0 / (entries.len() as f64).sqrt();
                for &idx in entries {
                    *scores.entry(idx).or_insert(0.0) += weight;
                }
            }
        }
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(CANDIDATE_POOL);
        ranked
    }
}

/// Token-overlap search over example questions. Never touches the network.
pub struct PromptMatcher {
    corpus: Arc<PromptCorpus>,
    index: InvertedIndex,
    cache: TtlCache<String, Retrieval>,
}

impl PromptMatcher {
    pub fn new(corpus: Arc<PromptCorpus>, cache_capacity: usize, cache_ttl: Duration) -> Self {
        let index = InvertedIndex::build(&corpus);
        tracing::debug!(
            prompts = corpus.len(),
            tokens = index.postings.len(),
            "Prompt index built"
        );
        Self {
            corpus,
            index,
            cache: TtlCache::new(cache_capacity, cache_ttl),
        }
    }

    pub fn corpus(&self) -> &PromptCorpus {
        &self.corpus
    }

    pub fn retrieve(&self, normalized: &str) -> Retrieval {
        let key = normalized.to_string();
        if let Some(hit) = self.cache.get(&key) {
            metrics::counter!("prompt_retrieval_cache_hits_total").increment(1);
            return hit;
        }
        let retrieval = self.search(normalized);
        self.cache.insert(key, retrieval.clone());
        retrieval
    }

    fn search(&self, normalized: &str) -> Retrieval {
        let query = tokenize(normalized);
        if query.is_empty() {
            return Retrieval::default();
        }

        let entries = self.corpus.entries();
        let mut scored: Vec<(usize, f64)> = self
            .index
            .weighted_candidates(&query)
            .into_iter()
            .filter_map(|(idx, _)| {
                let tokens = &entries[idx].tokens;
                let shared = tokens.intersection(&query).count() as f64;
                let denom = tokens.len().min(query.len()).max(3) as f64;
                let overlap = shared / denom;
                (overlap >= MIN_OVERLAP).then_some((idx, overlap))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(MAX_MATCHES);

        let matched_prompts: Vec<String> =
            scored.iter().map(|&(idx, _)| entries[idx].text.clone()).collect();

        let mut tools: Vec<String> = Vec::new();
        let sources = std::iter::once(normalized).chain(matched_prompts.iter().map(String::as_str));
        'harvest: for text in sources {
            for tool in infer_tools(text) {
                if tools.len() == MAX_TOOLS {
                    break 'harvest;
                }
                if !tools.iter().any(|t| t == tool) {
                    tools.push(tool.to_string());
                }
            }
        }

        Retrieval {
            matched_prompts,
            tools,
        }
    }
}
