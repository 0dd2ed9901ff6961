//! Platform-authored content: news, government affairs and the two
//! market offering boards (regulation and marketing services). All of
//! it is admin-written; published rows are public.

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};

use crate::error::{MessageResponse, Result};
use crate::models::{
    Actor, ArticleInput, GovAffairResponse, MarketItemInput, MarketItemResponse, MarketKind,
    MarketListQuery, NewsResponse,
};
use crate::pagination::{Page, PageQuery};
use crate::services::{ContentService, MarketService};
use crate::uploads::FormData;
use crate::AppState;

fn article_input(form: &FormData) -> Result<ArticleInput> {
    Ok(ArticleInput {
        title: form.text("title").map(String::from),
        content: form.text("content").map(String::from),
        is_published: form.bool_field("is_published")?,
        country_id: form.i64_field("country_id")?,
    })
}

fn market_input(form: &FormData) -> Result<MarketItemInput> {
    Ok(MarketItemInput {
        title: form.text("title").map(String::from),
        content: form.text("content").map(String::from),
        is_published: form.bool_field("is_published")?,
        category_id: form.i64_field("category_id")?,
        country_id: form.i64_field("country_id")?,
    })
}

// ---- news ----

/// GET /v1/news
pub async fn news_list(
    State(state): State<AppState>,
    Extension(actor): Extension<Option<Actor>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<NewsResponse>>> {
    let page =
        ContentService::news_list(&state.db, actor.as_ref(), query.page, query.limit).await?;
    Ok(Json(page))
}

/// GET /v1/news/:id_or_slug
pub async fn news_get(
    State(state): State<AppState>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<NewsResponse>> {
    let news = ContentService::news_get(&state.db, actor.as_ref(), &id_or_slug).await?;
    Ok(Json(news))
}

/// POST /v1/news
pub async fn news_create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<NewsResponse>> {
    let form = FormData::read(multipart).await?;
    let input = article_input(&form)?;
    let image = form.file("image").cloned();
    let news = ContentService::news_create(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        input,
        image,
    )
    .await?;
    Ok(Json(news))
}

/// PUT /v1/news/:id_or_slug
pub async fn news_update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<NewsResponse>> {
    let form = FormData::read(multipart).await?;
    let input = article_input(&form)?;
    let image = form.file("image").cloned();
    let news = ContentService::news_update(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        &id_or_slug,
        input,
        image,
    )
    .await?;
    Ok(Json(news))
}

/// DELETE /v1/news/:id_or_slug
pub async fn news_destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<MessageResponse>> {
    let done =
        ContentService::news_destroy(&state.db, state.storage.as_ref(), &actor, &id_or_slug)
            .await?;
    Ok(Json(done))
}

// ---- government affairs ----

/// GET /v1/gov-affairs
pub async fn gov_affair_list(
    State(state): State<AppState>,
    Extension(actor): Extension<Option<Actor>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<GovAffairResponse>>> {
    let page =
        ContentService::gov_affair_list(&state.db, actor.as_ref(), query.page, query.limit).await?;
    Ok(Json(page))
}

/// GET /v1/gov-affairs/:id_or_slug
pub async fn gov_affair_get(
    State(state): State<AppState>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<GovAffairResponse>> {
    let affair = ContentService::gov_affair_get(&state.db, actor.as_ref(), &id_or_slug).await?;
    Ok(Json(affair))
}

/// POST /v1/gov-affairs
pub async fn gov_affair_create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<GovAffairResponse>> {
    let form = FormData::read(multipart).await?;
    let input = article_input(&form)?;
    let image = form.file("image").cloned();
    let affair = ContentService::gov_affair_create(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        input,
        image,
    )
    .await?;
    Ok(Json(affair))
}

/// PUT /v1/gov-affairs/:id_or_slug
pub async fn gov_affair_update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<GovAffairResponse>> {
    let form = FormData::read(multipart).await?;
    let input = article_input(&form)?;
    let image = form.file("image").cloned();
    let affair = ContentService::gov_affair_update(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        &id_or_slug,
        input,
        image,
    )
    .await?;
    Ok(Json(affair))
}

/// DELETE /v1/gov-affairs/:id_or_slug
pub async fn gov_affair_destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<MessageResponse>> {
    let done =
        ContentService::gov_affair_destroy(&state.db, state.storage.as_ref(), &actor, &id_or_slug)
            .await?;
    Ok(Json(done))
}

// ---- market offerings ----
// Paths shown for regulation services; the same routes exist under
// /v1/marketing-services.

/// GET /v1/regulation-services
pub async fn market_list(
    State(state): State<AppState>,
    Extension(kind): Extension<MarketKind>,
    Extension(actor): Extension<Option<Actor>>,
    Query(query): Query<MarketListQuery>,
) -> Result<Json<Page<MarketItemResponse>>> {
    let page = MarketService::list(&state.db, actor.as_ref(), kind, query).await?;
    Ok(Json(page))
}

/// GET /v1/regulation-services/:id
pub async fn market_get(
    State(state): State<AppState>,
    Extension(kind): Extension<MarketKind>,
    Extension(actor): Extension<Option<Actor>>,
    Path(id): Path<i64>,
) -> Result<Json<MarketItemResponse>> {
    let item = MarketService::get(&state.db, actor.as_ref(), kind, id).await?;
    Ok(Json(item))
}

/// POST /v1/regulation-services
pub async fn market_create(
    State(state): State<AppState>,
    Extension(kind): Extension<MarketKind>,
    Extension(actor): Extension<Actor>,
    multipart: Multipart,
) -> Result<Json<MarketItemResponse>> {
    let form = FormData::read(multipart).await?;
    let input = market_input(&form)?;
    let image = form.file("image").cloned();
    let item = MarketService::create(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        kind,
        input,
        image,
    )
    .await?;
    Ok(Json(item))
}

/// PUT /v1/regulation-services/:id
pub async fn market_update(
    State(state): State<AppState>,
    Extension(kind): Extension<MarketKind>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<MarketItemResponse>> {
    let form = FormData::read(multipart).await?;
    let input = market_input(&form)?;
    let image = form.file("image").cloned();
    let item = MarketService::update(
        &state.db,
        &state.config,
        state.storage.as_ref(),
        &actor,
        kind,
        id,
        input,
        image,
    )
    .await?;
    Ok(Json(item))
}

/// DELETE /v1/regulation-services/:id
pub async fn market_destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<MarketKind>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let done = MarketService::destroy(&state.db, state.storage.as_ref(), &actor, kind, id).await?;
    Ok(Json(done))
}
