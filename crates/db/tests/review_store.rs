//! Integration tests for the Postgres review and media stores.
//!
//! Exercises the store adapters and the review service against a real
//! database:
//! - Uniqueness of (author, profile, media) under concurrent creates
//! - Aggregate maintenance for local and external media
//! - Visibility, sorting and pagination of listings
//! - External display cache upsert

use std::sync::Arc;

use assert_matches::assert_matches;
use marquee_core::error::CoreError;
use marquee_core::media::{ExternalMetadata, MediaItem, MediaKind, NewMediaItem};
use marquee_core::media_ref::{classify, MediaRef};
use marquee_core::pagination::PageRequest;
use marquee_core::rating::AggregateRating;
use marquee_core::review::{
    AuthorReviewFilter, CreateReview, MediaReviewFilter, NewReview, ReviewPatch, ReviewSort,
    ReviewVisibility,
};
use marquee_core::review_service::{Actor, ReviewService};
use marquee_core::roles::ROLE_USER;
use marquee_core::store::{MediaStore, ReviewStore};
use marquee_db::repositories::MediaItemRepo;
use marquee_db::{PgMediaStore, PgReviewStore};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_media(pool: &PgPool, external_id: i64, kind: MediaKind) -> MediaItem {
    let row = MediaItemRepo::create(
        pool,
        &NewMediaItem {
            external_id,
            media_kind: kind,
            title: format!("Title {external_id}"),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
        },
    )
    .await
    .unwrap();
    MediaItem::try_from(row).unwrap()
}

fn new_review(author_id: i64, profile_id: i64, media_ref: MediaRef, rating: f64) -> NewReview {
    NewReview {
        author_id,
        profile_id,
        media_ref,
        rating,
        content: "Solid".to_string(),
        is_public: true,
        spoiler: false,
    }
}

fn service(pool: &PgPool) -> ReviewService {
    ReviewService::new(
        Arc::new(PgMediaStore::new(pool.clone())),
        Arc::new(PgReviewStore::new(pool.clone())),
    )
}

fn create_input(profile_id: i64, media_ref: &str, rating: f64) -> CreateReview {
    CreateReview {
        profile_id,
        media_ref: media_ref.to_string(),
        rating: Some(rating),
        content: "Worth a watch".to_string(),
        is_public: None,
        spoiler: None,
        external_metadata: None,
    }
}

// ---------------------------------------------------------------------------
// Review store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_find_review(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let media = seed_media(&pool, 550, MediaKind::Movie).await;

    let created = store
        .create(&new_review(1, 10, media.media_ref(), 4.5))
        .await
        .unwrap();
    assert_eq!(created.media_ref, MediaRef::Local(media.id));
    assert_eq!(created.like_count, 0);

    let found = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(store.find_by_id(created.id + 1000).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_review_maps_to_domain_error(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let media_ref = classify("external:movie:550").unwrap();

    store.create(&new_review(1, 10, media_ref, 4.0)).await.unwrap();
    let dup = store.create(&new_review(1, 10, media_ref, 2.0)).await;
    assert_matches!(dup, Err(CoreError::DuplicateReview { .. }));

    // A second profile of the same author is a different reviewer.
    store.create(&new_review(1, 11, media_ref, 2.0)).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_duplicate_creates(pool: PgPool) {
    let store = Arc::new(PgReviewStore::new(pool.clone()));
    let media_ref = classify("tv-1399").unwrap();

    let attempts = (0..4).map(|_| {
        let store = Arc::clone(&store);
        async move { store.create(&new_review(7, 70, media_ref, 5.0)).await }
    });
    let results = futures::future::join_all(attempts).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let dup = results
        .iter()
        .filter(|r| matches!(r, Err(CoreError::DuplicateReview { .. })))
        .count();
    assert_eq!((ok, dup), (1, 3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_delete_and_likes(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let media = seed_media(&pool, 1, MediaKind::Movie).await;
    let review = store
        .create(&new_review(1, 10, media.media_ref(), 3.0))
        .await
        .unwrap();

    let updated = store
        .update(
            review.id,
            &ReviewPatch {
                content: Some("Changed my mind".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.content, "Changed my mind");
    assert_eq!(updated.rating, 3.0);

    assert_eq!(store.increment_likes(review.id).await.unwrap(), Some(1));
    assert_eq!(store.increment_likes(review.id).await.unwrap(), Some(2));

    assert!(store.delete(review.id).await.unwrap());
    assert!(!store.delete(review.id).await.unwrap());
    assert!(store.update(review.id, &ReviewPatch::default()).await.unwrap().is_none());
    assert_eq!(store.increment_likes(review.id).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_media_listing_visibility_sort_and_pages(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let media = seed_media(&pool, 2, MediaKind::Series).await;
    let media_ref = media.media_ref();

    for (author, rating) in [(1, 2.0), (2, 5.0), (3, 4.0)] {
        store
            .create(&new_review(author, author, media_ref, rating))
            .await
            .unwrap();
    }
    store
        .create(&NewReview {
            is_public: false,
            ..new_review(4, 4, media_ref, 1.0)
        })
        .await
        .unwrap();

    let filter = |visibility, sort, page| MediaReviewFilter {
        visibility,
        sort,
        page,
    };

    let public = store
        .find_by_media(
            &media_ref,
            &filter(ReviewVisibility::PublicOnly, ReviewSort::RatingHigh, PageRequest::new(None, Some(2))),
        )
        .await
        .unwrap();
    assert_eq!(public.total, 3);
    assert_eq!(public.total_pages, 2);
    let ratings: Vec<f64> = public.items.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![5.0, 4.0]);

    let own = store
        .find_by_media(
            &media_ref,
            &filter(ReviewVisibility::PublicAndOwn(4), ReviewSort::RatingLow, PageRequest::default()),
        )
        .await
        .unwrap();
    assert_eq!(own.total, 4);
    assert_eq!(own.items[0].rating, 1.0);

    let strangers = store
        .find_by_media(
            &media_ref,
            &filter(ReviewVisibility::PublicAndOwn(99), ReviewSort::Recent, PageRequest::default()),
        )
        .await
        .unwrap();
    assert_eq!(strangers.total, 3);

    let all = store
        .find_by_media(
            &media_ref,
            &filter(ReviewVisibility::All, ReviewSort::Likes, PageRequest::default()),
        )
        .await
        .unwrap();
    assert_eq!(all.total, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_author_listing_filters(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let a = seed_media(&pool, 3, MediaKind::Movie).await;
    let b = seed_media(&pool, 4, MediaKind::Movie).await;

    store.create(&new_review(1, 10, a.media_ref(), 3.0)).await.unwrap();
    store
        .create(&NewReview {
            is_public: false,
            ..new_review(1, 11, b.media_ref(), 4.0)
        })
        .await
        .unwrap();

    let everything = store
        .find_by_author(
            1,
            &AuthorReviewFilter {
                profile_id: None,
                public_only: false,
                page: PageRequest::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(everything.total, 2);

    let public = store
        .find_by_author(
            1,
            &AuthorReviewFilter {
                profile_id: None,
                public_only: true,
                page: PageRequest::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(public.total, 1);

    let profile = store
        .find_by_author(
            1,
            &AuthorReviewFilter {
                profile_id: Some(11),
                public_only: false,
                page: PageRequest::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.total, 1);
    assert_eq!(profile.items[0].profile_id, 11);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rating_queries_skip_unrated(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let local = seed_media(&pool, 5, MediaKind::Movie).await;
    let external = classify("external:series:1396").unwrap();

    store.create(&new_review(1, 1, local.media_ref(), 4.0)).await.unwrap();
    store.create(&new_review(2, 2, local.media_ref(), 0.0)).await.unwrap();
    store.create(&new_review(3, 3, local.media_ref(), 3.0)).await.unwrap();
    store.create(&new_review(1, 1, external, 5.0)).await.unwrap();

    let mut ratings = store.ratings_for(&local.media_ref()).await.unwrap();
    ratings.sort_by(f64::total_cmp);
    assert_eq!(ratings, vec![3.0, 4.0]);

    let summaries = store.rating_summaries(None, None).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].media_ref, external);
    assert_eq!(
        summaries[1].rating,
        AggregateRating {
            average: 3.5,
            review_count: 2
        }
    );

    assert_eq!(store.rating_summaries(None, Some(1)).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rating_summaries_order_by_the_rounded_average(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let tied_pair = classify("external:movie:100").unwrap();
    let single = classify("external:movie:200").unwrap();

    // 4.25 rounds to 4.3 and ties with a lone 4.3; the larger count wins.
    store.create(&new_review(1, 1, tied_pair, 4.0)).await.unwrap();
    store.create(&new_review(2, 2, tied_pair, 4.5)).await.unwrap();
    store.create(&new_review(3, 3, single, 4.3)).await.unwrap();

    let summaries = store.rating_summaries(None, None).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].media_ref, tied_pair);
    assert_eq!(summaries[0].rating.average, 4.3);
    assert_eq!(summaries[0].rating.review_count, 2);
    assert_eq!(summaries[1].media_ref, single);
    assert_eq!(summaries[1].rating.average, 4.3);
    assert!(summaries
        .windows(2)
        .all(|w| w[0].rating.average >= w[1].rating.average));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rating_summaries_filter_by_kind(pool: PgPool) {
    let store = PgReviewStore::new(pool.clone());
    let local_movie = seed_media(&pool, 7, MediaKind::Movie).await.media_ref();
    let orphan = MediaRef::Local(987_654);
    let external_movie = classify("external:movie:550").unwrap();
    let external_series = classify("external:series:1399").unwrap();

    store.create(&new_review(1, 1, local_movie, 3.0)).await.unwrap();
    store.create(&new_review(1, 1, orphan, 4.5)).await.unwrap();
    store.create(&new_review(1, 1, external_movie, 4.0)).await.unwrap();
    store.create(&new_review(1, 1, external_series, 5.0)).await.unwrap();

    let movies: Vec<MediaRef> = store
        .rating_summaries(Some(MediaKind::Movie), None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.media_ref)
        .collect();
    assert_eq!(movies, vec![external_movie, local_movie]);

    let series = store
        .rating_summaries(Some(MediaKind::Series), None)
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].media_ref, external_series);

    let top_movie = store
        .rating_summaries(Some(MediaKind::Movie), Some(1))
        .await
        .unwrap();
    assert_eq!(top_movie.len(), 1);
    assert_eq!(top_movie[0].media_ref, external_movie);

    assert_eq!(store.rating_summaries(None, None).await.unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Media store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_media_lookup_and_aggregate_write(pool: PgPool) {
    let store = PgMediaStore::new(pool.clone());
    let item = seed_media(&pool, 603, MediaKind::Movie).await;

    let by_external = store
        .find_by_external(MediaKind::Movie, 603)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_external.id, item.id);
    assert!(store
        .find_by_external(MediaKind::Series, 603)
        .await
        .unwrap()
        .is_none());

    let rating = AggregateRating {
        average: 4.2,
        review_count: 5,
    };
    assert!(store.set_aggregate_rating(&item.media_ref(), &rating).await.unwrap());
    let stored = store.find_by_local_id(item.id).await.unwrap().unwrap();
    assert_eq!(stored.aggregate_rating, rating);

    assert!(!store
        .set_aggregate_rating(&MediaRef::Local(item.id + 1000), &rating)
        .await
        .unwrap());
    assert!(!store
        .set_aggregate_rating(&classify("movie-603").unwrap(), &rating)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_media_is_conflict(pool: PgPool) {
    seed_media(&pool, 9, MediaKind::Movie).await;
    let err = MediaItemRepo::create(
        &pool,
        &NewMediaItem {
            external_id: 9,
            media_kind: MediaKind::Movie,
            title: "Again".to_string(),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(marquee_db::error::map_db_error(err), CoreError::Conflict(_));

    // Same id, other kind is a different item.
    seed_media(&pool, 9, MediaKind::Series).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_external_cache_upsert_keeps_known_fields(pool: PgPool) {
    let store = PgMediaStore::new(pool.clone());
    let media_ref = classify("external:movie:13").unwrap();

    store
        .upsert_external_cache(
            &media_ref,
            &ExternalMetadata {
                title: Some("Forrest Gump".to_string()),
                poster_path: Some("/fg.jpg".to_string()),
                overview: None,
            },
        )
        .await
        .unwrap();
    let refreshed = store
        .upsert_external_cache(
            &media_ref,
            &ExternalMetadata {
                overview: Some("Life is like a box of chocolates".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(refreshed.title.as_deref(), Some("Forrest Gump"));
    assert_eq!(refreshed.poster_path.as_deref(), Some("/fg.jpg"));
    assert!(refreshed.overview.is_some());

    let found = store.find_external_cache(&media_ref).await.unwrap().unwrap();
    assert_eq!(found, refreshed);

    assert_matches!(
        store
            .upsert_external_cache(&MediaRef::Local(1), &ExternalMetadata::default())
            .await,
        Err(CoreError::InvalidMediaReference(_))
    );
}

// ---------------------------------------------------------------------------
// Service over Postgres
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_service_keeps_stored_aggregate_consistent(pool: PgPool) {
    let service = service(&pool);
    let media = seed_media(&pool, 42, MediaKind::Movie).await;
    let media_ref = media.id.to_string();
    let author = Actor::new(1, ROLE_USER);

    let a = service
        .create_review(&author, create_input(10, &media_ref, 4.0))
        .await
        .unwrap();
    let b = service
        .create_review(&author, create_input(11, &media_ref, 2.0))
        .await
        .unwrap();
    assert_eq!(
        b.refresh.rating,
        Some(AggregateRating {
            average: 3.0,
            review_count: 2
        })
    );

    service
        .update_review(
            a.review.id,
            &author,
            ReviewPatch {
                rating: Some(0.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service.delete_review(b.review.id, &author).await.unwrap();

    let stored = PgMediaStore::new(pool.clone())
        .find_by_local_id(media.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.aggregate_rating, AggregateRating::EMPTY);
    assert_eq!(
        service.media_rating(&media_ref).await.unwrap().rating,
        AggregateRating::EMPTY
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_service_rejects_unknown_local_media(pool: PgPool) {
    let service = service(&pool);
    let result = service
        .create_review(&Actor::new(1, ROLE_USER), create_input(1, "987654", 4.0))
        .await;
    assert_matches!(result, Err(CoreError::MediaNotFound(_)));
}
