//! Chat management and messaging.
//!
//! A chat is only visible to its owner; for anyone else every route answers
//! 404 exactly as if the chat did not exist.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{debug, info};

use edubot_shared::protocol::{
    ChatListResponse, ChatView, CreateChatRequest, FetchMessagesResponse, MessageResponse,
    MessageView, SendMessageRequest, SendMessageResponse,
};
use edubot_store::{Chat, Message};

use super::extract::ApiJson;
use super::{not_found_as, AppState, CHAT_NOT_FOUND, USER_NOT_FOUND};
use crate::auth::Identity;
use crate::error::ServerError;

fn views(messages: &[Message]) -> Vec<MessageView> {
    messages.iter().map(Message::view).collect()
}

pub(super) async fn create_chat(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatView>), ServerError> {
    let name = req.chat_name.trim();
    if name.is_empty() {
        return Err(ServerError::BadRequest("Chat name cannot be empty.".into()));
    }

    let chat = Chat::new(name, identity.email);
    state.db.lock().await.create_chat(&chat)?;

    info!(chat_id = %chat.id, "Chat created");

    Ok((
        StatusCode::CREATED,
        Json(ChatView {
            chat_id: chat.id,
            chat_name: chat.name,
            user_email: chat.owner_email,
            messages: Vec::new(),
            created_at: chat.created_at,
            last_activity: chat.last_activity,
        }),
    ))
}

pub(super) async fn list_chats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ChatListResponse>, ServerError> {
    let chats = state.db.lock().await.list_chats_for_owner(&identity.email)?;
    Ok(Json(ChatListResponse {
        chats: chats.iter().map(Chat::summary).collect(),
    }))
}

pub(super) async fn delete_chat(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(chat_id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    if !state.db.lock().await.delete_chat(&chat_id, &identity.email)? {
        return Err(ServerError::NotFound(CHAT_NOT_FOUND.into()));
    }
    info!(chat_id = %chat_id, "Chat deleted");
    Ok(Json(MessageResponse::new("Chat deleted successfully.")))
}

/// Append the user's message, ask the tutor, append its reply.
///
/// The user's message is kept even if the tutor fails.
pub(super) async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ServerError> {
    if req.message.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "Message content cannot be empty.".into(),
        ));
    }

    let (settings, history) = {
        let db = state.db.lock().await;
        let user = db
            .get_user_by_email(&identity.email)
            .map_err(not_found_as(USER_NOT_FOUND))?;
        db.append_message(&req.chat_id, &identity.email, &req.message, true)
            .map_err(not_found_as(CHAT_NOT_FOUND))?;
        (user.settings, db.get_messages_for_chat(&req.chat_id)?)
    };

    // The database lock is not held while the provider is working.
    let reply = state.tutor.reply(&history, &settings).await?;
    debug!(chat_id = %req.chat_id, reply_len = reply.len(), "Tutor replied");

    let history = {
        let db = state.db.lock().await;
        db.append_message(&req.chat_id, &identity.email, &reply, false)
            .map_err(not_found_as(CHAT_NOT_FOUND))?;
        db.get_messages_for_chat(&req.chat_id)?
    };

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: "Message sent successfully.".into(),
            chat: views(&history),
        }),
    ))
}

pub(super) async fn fetch_messages(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(chat_id): Path<String>,
) -> Result<Json<FetchMessagesResponse>, ServerError> {
    let messages = {
        let db = state.db.lock().await;
        db.get_chat(&chat_id, &identity.email)
            .map_err(not_found_as(CHAT_NOT_FOUND))?;
        db.get_messages_for_chat(&chat_id)?
    };

    Ok(Json(FetchMessagesResponse {
        message: "Messages fetched successfully.".into(),
        messages: views(&messages),
    }))
}
