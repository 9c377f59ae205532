//! In-process test doubles for the storage traits.
//!
//! Each store keeps its table behind a single mutex, so check-and-insert in
//! [`InMemoryReviewStore::create`] is atomic in the same way the unique
//! index makes it atomic in Postgres. The service and aggregator tests run
//! against these; the server always uses the Postgres stores.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::CoreError;
use crate::media::{ExternalMediaCacheEntry, ExternalMetadata, MediaItem, MediaKind, NewMediaItem};
use crate::media_ref::MediaRef;
use crate::pagination::{Page, PageRequest};
use crate::rating::{AggregateRating, NO_RATING};
use crate::review::{
    AuthorReviewFilter, MediaReviewFilter, NewReview, Review, ReviewPatch, ReviewSort,
};
use crate::store::{MediaStore, RatingSummary, ReviewStore};
use crate::types::DbId;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CoreError> {
    mutex
        .lock()
        .map_err(|_| CoreError::StorageUnavailable("in-memory store lock poisoned".into()))
}

fn paginate(mut rows: Vec<Review>, page: PageRequest) -> Page<Review> {
    let total = rows.len() as i64;
    let start = page.offset().min(total) as usize;
    let end = page.offset().saturating_add(page.limit).min(total) as usize;
    let items = rows.drain(start..end).collect();
    Page::new(items, page, total)
}

/// Most recent first, newest id breaking timestamp ties.
fn recent_first(a: &Review, b: &Review) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/* --------------------------------------------------------------------------
Media
-------------------------------------------------------------------------- */

#[derive(Default)]
struct MediaTable {
    items: BTreeMap<DbId, MediaItem>,
    cache: HashMap<MediaRef, ExternalMediaCacheEntry>,
    /// Number of `set_aggregate_rating` calls per reference.
    aggregate_writes: HashMap<MediaRef, u64>,
    next_id: DbId,
}

/// Media catalog held in memory.
#[derive(Default)]
pub struct InMemoryMediaStore {
    inner: Mutex<MediaTable>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog entry. Fails with [`CoreError::Conflict`] when the
    /// `(external_id, media_kind)` pair is taken.
    pub fn insert(&self, input: &NewMediaItem) -> Result<MediaItem, CoreError> {
        input.check()?;
        let mut table = lock(&self.inner)?;
        if table
            .items
            .values()
            .any(|m| m.external_id == input.external_id && m.media_kind == input.media_kind)
        {
            return Err(CoreError::Conflict(format!(
                "Media {} {} already exists",
                input.media_kind, input.external_id
            )));
        }
        table.next_id += 1;
        let now = Utc::now();
        let item = MediaItem {
            id: table.next_id,
            external_id: input.external_id,
            media_kind: input.media_kind,
            title: input.title.trim().to_string(),
            overview: input.overview.clone(),
            poster_path: input.poster_path.clone(),
            backdrop_path: input.backdrop_path.clone(),
            release_date: input.release_date,
            aggregate_rating: AggregateRating::EMPTY,
            created_at: now,
            updated_at: now,
        };
        table.items.insert(item.id, item.clone());
        Ok(item)
    }

    /// How many times `set_aggregate_rating` was called for `media_ref`.
    pub fn aggregate_write_count(&self, media_ref: &MediaRef) -> u64 {
        self.inner
            .lock()
            .map(|t| t.aggregate_writes.get(media_ref).copied().unwrap_or(0))
            .unwrap_or_default()
    }

    /// Total `set_aggregate_rating` calls across all references.
    pub fn total_aggregate_writes(&self) -> u64 {
        self.inner
            .lock()
            .map(|t| t.aggregate_writes.values().sum())
            .unwrap_or_default()
    }

    /// Kind of a catalog entry, if the id is known.
    fn kind_of(&self, id: DbId) -> Option<MediaKind> {
        self.inner
            .lock()
            .ok()
            .and_then(|t| t.items.get(&id).map(|m| m.media_kind))
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn find_by_local_id(&self, id: DbId) -> Result<Option<MediaItem>, CoreError> {
        Ok(lock(&self.inner)?.items.get(&id).cloned())
    }

    async fn find_by_external(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> Result<Option<MediaItem>, CoreError> {
        Ok(lock(&self.inner)?
            .items
            .values()
            .find(|m| m.media_kind == kind && m.external_id == external_id)
            .cloned())
    }

    async fn set_aggregate_rating(
        &self,
        media_ref: &MediaRef,
        rating: &AggregateRating,
    ) -> Result<bool, CoreError> {
        let mut table = lock(&self.inner)?;
        *table.aggregate_writes.entry(*media_ref).or_default() += 1;
        let Some(id) = media_ref.local_id() else {
            return Ok(false);
        };
        match table.items.get_mut(&id) {
            Some(item) => {
                item.aggregate_rating = *rating;
                item.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_external_cache(
        &self,
        media_ref: &MediaRef,
        metadata: &ExternalMetadata,
    ) -> Result<ExternalMediaCacheEntry, CoreError> {
        if !media_ref.is_external() {
            return Err(CoreError::InvalidMediaReference(format!(
                "'{media_ref}' is not an external reference"
            )));
        }
        let mut table = lock(&self.inner)?;
        // Absent fields keep their cached value.
        let (title, poster_path, overview) = match table.cache.remove(media_ref) {
            Some(old) => (old.title, old.poster_path, old.overview),
            None => (None, None, None),
        };
        let entry = ExternalMediaCacheEntry {
            media_ref: *media_ref,
            title: metadata.title.clone().or(title),
            poster_path: metadata.poster_path.clone().or(poster_path),
            overview: metadata.overview.clone().or(overview),
            updated_at: Utc::now(),
        };
        table.cache.insert(*media_ref, entry.clone());
        Ok(entry)
    }

    async fn find_external_cache(
        &self,
        media_ref: &MediaRef,
    ) -> Result<Option<ExternalMediaCacheEntry>, CoreError> {
        Ok(lock(&self.inner)?.cache.get(media_ref).cloned())
    }
}

/* --------------------------------------------------------------------------
Reviews
-------------------------------------------------------------------------- */

#[derive(Default)]
struct ReviewTable {
    rows: BTreeMap<DbId, Review>,
    next_id: DbId,
}

/// Review collection held in memory.
///
/// Kind-filtered rating summaries resolve local references through the
/// attached catalog; without one, local references never match a kind.
#[derive(Default)]
pub struct InMemoryReviewStore {
    inner: Mutex<ReviewTable>,
    catalog: Option<Arc<InMemoryMediaStore>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose kind filters look up local media in `catalog`.
    pub fn with_catalog(catalog: Arc<InMemoryMediaStore>) -> Self {
        Self {
            inner: Mutex::default(),
            catalog: Some(catalog),
        }
    }

    fn kind_of(&self, media_ref: &MediaRef) -> Option<MediaKind> {
        match media_ref {
            MediaRef::External { kind, .. } => Some(*kind),
            MediaRef::Local(id) => self.catalog.as_ref().and_then(|c| c.kind_of(*id)),
        }
    }

    /// Number of stored reviews.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|t| t.rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn create(&self, input: &NewReview) -> Result<Review, CoreError> {
        let mut table = lock(&self.inner)?;
        let taken = table.rows.values().any(|r| {
            r.author_id == input.author_id
                && r.profile_id == input.profile_id
                && r.media_ref == input.media_ref
        });
        if taken {
            return Err(CoreError::DuplicateReview {
                media_ref: input.media_ref.to_string(),
            });
        }

        table.next_id += 1;
        let now = Utc::now();
        let review = Review {
            id: table.next_id,
            author_id: input.author_id,
            profile_id: input.profile_id,
            media_ref: input.media_ref,
            rating: input.rating,
            content: input.content.clone(),
            is_public: input.is_public,
            spoiler: input.spoiler,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(review.id, review.clone());
        Ok(review)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Review>, CoreError> {
        Ok(lock(&self.inner)?.rows.get(&id).cloned())
    }

    async fn find_by_media(
        &self,
        media_ref: &MediaRef,
        filter: &MediaReviewFilter,
    ) -> Result<Page<Review>, CoreError> {
        let mut rows: Vec<Review> = lock(&self.inner)?
            .rows
            .values()
            .filter(|r| r.media_ref == *media_ref && filter.visibility.admits(r))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let primary = match filter.sort {
                ReviewSort::Recent => Ordering::Equal,
                ReviewSort::RatingHigh => b.rating.total_cmp(&a.rating),
                ReviewSort::RatingLow => a.rating.total_cmp(&b.rating),
                ReviewSort::Likes => b.like_count.cmp(&a.like_count),
            };
            primary.then_with(|| recent_first(a, b))
        });

        Ok(paginate(rows, filter.page))
    }

    async fn find_by_author(
        &self,
        author_id: DbId,
        filter: &AuthorReviewFilter,
    ) -> Result<Page<Review>, CoreError> {
        let mut rows: Vec<Review> = lock(&self.inner)?
            .rows
            .values()
            .filter(|r| r.author_id == author_id)
            .filter(|r| filter.profile_id.is_none_or(|p| r.profile_id == p))
            .filter(|r| !filter.public_only || r.is_public)
            .cloned()
            .collect();
        rows.sort_by(recent_first);
        Ok(paginate(rows, filter.page))
    }

    async fn update(&self, id: DbId, patch: &ReviewPatch) -> Result<Option<Review>, CoreError> {
        let mut table = lock(&self.inner)?;
        let Some(review) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(content) = &patch.content {
            review.content = content.clone();
        }
        if let Some(is_public) = patch.is_public {
            review.is_public = is_public;
        }
        if let Some(spoiler) = patch.spoiler {
            review.spoiler = spoiler;
        }
        review.updated_at = Utc::now();
        Ok(Some(review.clone()))
    }

    async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        Ok(lock(&self.inner)?.rows.remove(&id).is_some())
    }

    async fn increment_likes(&self, id: DbId) -> Result<Option<i64>, CoreError> {
        let mut table = lock(&self.inner)?;
        Ok(table.rows.get_mut(&id).map(|r| {
            r.like_count += 1;
            r.like_count
        }))
    }

    async fn ratings_for(&self, media_ref: &MediaRef) -> Result<Vec<f64>, CoreError> {
        Ok(lock(&self.inner)?
            .rows
            .values()
            .filter(|r| r.media_ref == *media_ref && r.rating > NO_RATING)
            .map(|r| r.rating)
            .collect())
    }

    async fn rating_summaries(
        &self,
        kind: Option<MediaKind>,
        limit: Option<i64>,
    ) -> Result<Vec<RatingSummary>, CoreError> {
        let mut by_ref: HashMap<MediaRef, Vec<f64>> = HashMap::new();
        for review in lock(&self.inner)?.rows.values().filter(|r| r.is_rated()) {
            by_ref.entry(review.media_ref).or_default().push(review.rating);
        }
        if kind.is_some() {
            by_ref.retain(|media_ref, _| self.kind_of(media_ref) == kind);
        }

        let mut summaries: Vec<RatingSummary> = by_ref
            .into_iter()
            .map(|(media_ref, ratings)| RatingSummary {
                media_ref,
                rating: AggregateRating::from_ratings(&ratings),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.rating
                .average
                .total_cmp(&a.rating.average)
                .then(b.rating.review_count.cmp(&a.rating.review_count))
                .then_with(|| a.media_ref.to_string().cmp(&b.media_ref.to_string()))
        });
        if let Some(limit) = limit {
            summaries.truncate(limit.max(0) as usize);
        }
        Ok(summaries)
    }
}
