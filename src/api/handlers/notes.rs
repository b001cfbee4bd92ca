//! Note retrieval, history, search, tagging, and deletion handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use validator::Validate;

use crate::api::dto::{
    DeletedData, HistoryData, HistoryQuery, NoteListData, RecentQuery, SearchQuery, TagsRequest,
};
use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{QuillError, Result};
use crate::models::{HistoryRequest, ProcessedNote};

use super::upload::DEFAULT_OWNER;

const DEFAULT_RECENT_LIMIT: u32 = 10;
const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 50;

fn owner(user_id: Option<String>) -> String {
    user_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| id.trim().to_string())
        .unwrap_or_else(|| DEFAULT_OWNER.to_string())
}

/// `GET /notes/recent` — most recent notes, newest first.
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<ApiResponse<NoteListData>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let notes = state
        .store
        .list_recent(&owner(query.user_id), limit)
        .await?;

    Ok(ApiResponse::success(NoteListData {
        count: notes.len(),
        notes,
    }))
}

/// `GET /notes/history` — paginated full records.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<ApiResponse<HistoryData>> {
    let req = HistoryRequest {
        page: query.page,
        limit: query.limit,
        tag: query.tag,
    };
    let (notes, pagination) = state
        .store
        .list_history(&owner(query.user_id), &req)
        .await?;

    Ok(ApiResponse::success(HistoryData { notes, pagination }))
}

/// `GET /notes/search?q=...`
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<ApiResponse<NoteListData>> {
    query
        .validate()
        .map_err(|e| QuillError::Validation(e.to_string()))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let notes = state
        .store
        .search_notes(&owner(query.user_id), query.q.trim(), limit)
        .await?;

    Ok(ApiResponse::success(NoteListData {
        count: notes.len(),
        notes,
    }))
}

/// `GET /notes/{id}`
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ProcessedNote>> {
    let note = state
        .store
        .get_note(&id)
        .await?
        .ok_or_else(|| QuillError::NotFound(format!("Note {id} not found")))?;

    Ok(ApiResponse::success(note))
}

/// `DELETE /notes/{id}` — removes the record and its image file.
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedData>> {
    if !state.pipeline.delete_note(&id).await? {
        return Err(QuillError::NotFound(format!("Note {id} not found")));
    }

    Ok(ApiResponse::success_with_message(
        "Note deleted successfully",
        DeletedData { id },
    ))
}

/// `POST /notes/{id}/tags`
pub async fn add_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TagsRequest>,
) -> Result<ApiResponse<ProcessedNote>> {
    req.validate()
        .map_err(|e| QuillError::Validation(e.to_string()))?;

    let note = state
        .store
        .add_tags(&id, &req.tags)
        .await?
        .ok_or_else(|| QuillError::NotFound(format!("Note {id} not found")))?;

    Ok(ApiResponse::success_with_message("Tags added", note))
}

/// `DELETE /notes/{id}/tags`
pub async fn remove_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TagsRequest>,
) -> Result<ApiResponse<ProcessedNote>> {
    req.validate()
        .map_err(|e| QuillError::Validation(e.to_string()))?;

    let note = state
        .store
        .remove_tags(&id, &req.tags)
        .await?
        .ok_or_else(|| QuillError::NotFound(format!("Note {id} not found")))?;

    Ok(ApiResponse::success_with_message("Tags removed", note))
}
