//! Listing, create, edit and delete handlers.

use actix_web::{HttpRequest, HttpResponse, web};
use url::form_urlencoded;

use daylog_core::domain::PostDraft;
use daylog_core::filter::QueryFilter;
use daylog_core::pagination::pagination_links;
use daylog_shared::dto::PostForm;

use super::{parse_id, redirect_home, render};
use crate::middleware::Access;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{IndexView, PostFormView};

/// GET /
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    access: Access,
) -> AppResult<HttpResponse> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(req.query_string().as_bytes())
        .into_owned()
        .collect();

    let filter = QueryFilter::from_pairs(&pairs);
    let page_size = filter.page_size;

    let listing = state.listing.list(filter, access.archive).await?;
    let pages = pagination_links(listing.total, page_size, &pairs);
    let attachments = state.journal.attachments_for(&listing.posts).await?;

    render(&state, "index.html", &IndexView::new(listing, pages, &attachments))
}

/// GET /new
pub async fn new_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    render(&state, "post_form.html", &PostFormView::blank(state.gate.now()))
}

/// POST /new
pub async fn create(
    state: web::Data<AppState>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let draft = PostDraft::parse(&form.event_time, &form.title, &form.body, &form.attachment_ids)?;

    state.journal.create(draft).await?;
    Ok(redirect_home())
}

/// GET /posts/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.journal.get(parse_id(&id)?).await?;
    render(&state, "post_form.html", &PostFormView::edit(&post))
}

/// POST /posts/{id}/edit
///
/// `action=delete` soft-deletes; anything else overwrites the entry.
pub async fn edit(
    state: web::Data<AppState>,
    id: web::Path<String>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&id)?;
    state.journal.get(id).await?;

    let form = form.into_inner();
    if form.action.as_deref() == Some("delete") {
        state.journal.delete(id).await?;
        return Ok(redirect_home());
    }

    let draft = PostDraft::parse(&form.event_time, &form.title, &form.body, "")?;
    state.journal.update(id, draft).await?;
    Ok(redirect_home())
}

/// DELETE /posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.journal.delete(parse_id(&id)?).await?;

    Ok(HttpResponse::Ok().insert_header(("HX-Redirect", "/")).finish())
}
