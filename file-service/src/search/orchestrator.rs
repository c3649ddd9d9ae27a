use crate::dtos::{SearchHit, SearchResponse};
use crate::models::FileRecord;
use crate::search::matcher::find_matches;
use crate::services::{Caller, FileFilter, FileRepository};
use metrics::counter;
use service_core::error::AppError;
use std::str::FromStr;
use std::sync::Arc;

/// Which files a search considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Files owned by the caller.
    Mine,
    /// Every file in the system. Admin only.
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Mine => "mine",
            Scope::All => "all",
        }
    }

    /// Metadata filter for this scope, or `Forbidden` when the caller may
    /// not search it.
    pub fn candidate_filter(&self, caller: &Caller) -> Result<FileFilter, AppError> {
        match self {
            Scope::Mine => Ok(FileFilter::owned_by(&caller.uid).with_text()),
            Scope::All if caller.is_admin => Ok(FileFilter::all().with_text()),
            Scope::All => Err(AppError::Forbidden(anyhow::anyhow!("Admin only"))),
        }
    }
}

impl FromStr for Scope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mine" => Ok(Scope::Mine),
            "all" => Ok(Scope::All),
            _ => Err(AppError::BadRequest(anyhow::anyhow!(
                "scope must be mine|all"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Result cap: most files with at least one match in a response.
    pub max_results: usize,
    /// Match cap: most matching lines reported per file.
    pub max_matches_per_file: usize,
}

/// Content search over the extracted text of stored files.
#[derive(Clone)]
pub struct ContentSearch {
    repo: Arc<dyn FileRepository>,
}

impl ContentSearch {
    pub fn new(repo: Arc<dyn FileRepository>) -> Self {
        Self { repo }
    }

    pub async fn search(
        &self,
        caller: &Caller,
        query: &str,
        scope: Scope,
        limits: SearchLimits,
    ) -> Result<SearchResponse, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("q is required")));
        }

        let filter = scope.candidate_filter(caller).inspect_err(|_| {
            tracing::warn!(uid = %caller.uid, scope = scope.as_str(), "Search scope denied");
        })?;

        let candidates = self.repo.list(&filter).await?;
        let candidate_count = candidates.len();

        let response = collect_hits(query, candidates, limits);

        counter!("content_search_requests_total", "scope" => scope.as_str()).increment(1);
        counter!("content_search_files_skipped_total")
            .increment(response.skipped_unsupported as u64);
        counter!("content_search_files_truncated_total").increment(response.truncated_files as u64);

        tracing::info!(
            uid = %caller.uid,
            scope = scope.as_str(),
            candidates = candidate_count,
            hits = response.items.len(),
            skipped = response.skipped_unsupported,
            truncated = response.truncated_files,
            "Content search completed"
        );

        Ok(response)
    }
}

/// Run the match finder over `candidates` in the order given.
///
/// Files without extracted text are counted as skipped. Once
/// `limits.max_results` files have hits, every remaining searchable file is
/// counted as truncated without being evaluated.
pub fn collect_hits<I>(query: &str, candidates: I, limits: SearchLimits) -> SearchResponse
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut response = SearchResponse::new(query);

    for mut record in candidates {
        let Some(text) = record.extracted_text.take() else {
            response.skipped_unsupported += 1;
            continue;
        };
        if !record.file_type.is_allowed() {
            response.skipped_unsupported += 1;
            continue;
        }

        if response.items.len() >= limits.max_results {
            response.truncated_files += 1;
            continue;
        }

        let matches = find_matches(&text, query, limits.max_matches_per_file);
        if !matches.is_empty() {
            response.items.push(SearchHit {
                file: record.into(),
                matches,
            });
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileType;
    use crate::services::InMemoryFileRepository;
    use chrono::{Duration, Utc};

    const LIMITS: SearchLimits = SearchLimits {
        max_results: 25,
        max_matches_per_file: 10,
    };

    fn record(uid: &str, name: &str, text: Option<&str>) -> FileRecord {
        let file_type = FileType::from_filename(name).unwrap();
        FileRecord::new(
            uid.to_string(),
            name.to_string(),
            file_type,
            text.map_or(0, |t| t.len() as u64),
            format!("users/{}/{}", uid, name),
            text.map(str::to_string),
        )
    }

    fn caller(uid: &str, is_admin: bool) -> Caller {
        Caller {
            uid: uid.to_string(),
            email: format!("{}@test.com", uid),
            is_admin,
        }
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("mine".parse::<Scope>().unwrap(), Scope::Mine);
        assert_eq!("all".parse::<Scope>().unwrap(), Scope::All);
        assert!(matches!(
            "everyone".parse::<Scope>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_all_scope_requires_admin() {
        assert!(matches!(
            Scope::All.candidate_filter(&caller("user_uid", false)),
            Err(AppError::Forbidden(_))
        ));
        let filter = Scope::All.candidate_filter(&caller("admin_uid", true)).unwrap();
        assert_eq!(filter.owner, None);
        let filter = Scope::Mine.candidate_filter(&caller("user_uid", false)).unwrap();
        assert_eq!(filter.owner.as_deref(), Some("user_uid"));
    }

    #[test]
    fn test_hits_keep_candidate_order() {
        let candidates = vec![
            record("u", "newest.txt", Some("alpha\nBeta\nalpha again")),
            record("u", "middle.txt", Some("nothing here")),
            record("u", "oldest.json", Some("{\"k\": \"ALPHA\"}")),
        ];

        let response = collect_hits("alpha", candidates, LIMITS);

        assert_eq!(response.q, "alpha");
        let names: Vec<_> = response.items.iter().map(|h| h.file.name.as_str()).collect();
        assert_eq!(names, vec!["newest.txt", "oldest.json"]);
        assert_eq!(
            response.items[0]
                .matches
                .iter()
                .map(|m| (m.line, m.text.as_str()))
                .collect::<Vec<_>>(),
            vec![(1, "alpha"), (3, "alpha again")]
        );
        assert_eq!(response.skipped_unsupported, 0);
        assert_eq!(response.truncated_files, 0);
    }

    #[test]
    fn test_unrecognized_type_is_always_skipped() {
        let mut odd = record("u", "notes.md", None);
        odd.extracted_text = Some("alpha".to_string());

        let response = collect_hits("alpha", vec![odd, record("u", "scan.pdf", None)], LIMITS);

        assert!(response.items.is_empty());
        assert_eq!(response.skipped_unsupported, 2);
    }

    #[test]
    fn test_result_cap_counts_unevaluated_files() {
        let candidates = vec![
            record("u", "a.txt", Some("alpha")),
            record("u", "b.txt", Some("alpha")),
        ];

        let response = collect_hits(
            "alpha",
            candidates,
            SearchLimits {
                max_results: 1,
                ..LIMITS
            },
        );

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].file.name, "a.txt");
        assert_eq!(response.truncated_files, 1);
    }

    #[test]
    fn test_zero_result_cap_truncates_every_searchable_file() {
        let candidates = vec![
            record("u", "a.txt", Some("alpha")),
            record("u", "b.pdf", None),
            record("u", "c.json", Some("\"alpha\"")),
        ];

        let response = collect_hits(
            "alpha",
            candidates,
            SearchLimits {
                max_results: 0,
                ..LIMITS
            },
        );

        assert!(response.items.is_empty());
        assert_eq!(response.truncated_files, 2);
        assert_eq!(response.skipped_unsupported, 1);
    }

    #[test]
    fn test_unmatched_files_do_not_count_as_truncated() {
        let candidates = vec![
            record("u", "a.txt", Some("no")),
            record("u", "b.txt", Some("alpha")),
            record("u", "c.txt", Some("nope")),
        ];

        let response = collect_hits(
            "alpha",
            candidates,
            SearchLimits {
                max_results: 1,
                ..LIMITS
            },
        );

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].file.name, "b.txt");
        assert_eq!(response.truncated_files, 1);
    }

    #[test]
    fn test_match_cap_applies_per_file() {
        let text = (0..30).map(|_| "alpha").collect::<Vec<_>>().join("\n");
        let response = collect_hits("alpha", vec![record("u", "a.txt", Some(&text))], LIMITS);
        assert_eq!(response.items[0].matches.len(), LIMITS.max_matches_per_file);
    }

    #[tokio::test]
    async fn test_search_scopes_and_idempotence() {
        let repo = Arc::new(InMemoryFileRepository::new());
        let mut older = record("user_uid", "mine.txt", Some("shared alpha"));
        older.created_at = Utc::now() - Duration::minutes(5);
        repo.insert(&older).await.unwrap();
        repo.insert(&record("other_uid", "theirs.txt", Some("alpha too")))
            .await
            .unwrap();

        let search = ContentSearch::new(repo);

        let mine = search
            .search(&caller("user_uid", false), "  alpha ", Scope::Mine, LIMITS)
            .await
            .unwrap();
        assert_eq!(mine.q, "alpha");
        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].file.uid, "user_uid");

        let all = search
            .search(&caller("admin_uid", true), "alpha", Scope::All, LIMITS)
            .await
            .unwrap();
        let names: Vec<_> = all.items.iter().map(|h| h.file.name.as_str()).collect();
        assert_eq!(names, vec!["theirs.txt", "mine.txt"]);

        let again = search
            .search(&caller("admin_uid", true), "alpha", Scope::All, LIMITS)
            .await
            .unwrap();
        assert_eq!(all, again);
    }

    #[tokio::test]
    async fn test_search_rejects_before_reading() {
        let search = ContentSearch::new(Arc::new(InMemoryFileRepository::new()));

        let err = search
            .search(&caller("user_uid", false), "alpha", Scope::All, LIMITS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = search
            .search(&caller("user_uid", false), "   ", Scope::Mine, LIMITS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
