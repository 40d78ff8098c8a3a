//! Messenger contract the engine consumes.
//!
//! The engine never talks to a chat transport directly; it calls through
//! this trait so the same dispatch logic runs against a real Telegram
//! client in production and a recording fake in tests.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("transport error: {0}")]
    Transport(String),
}

pub type MessengerResult<T> = Result<T, MessengerError>;

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub parse_mode: Option<String>,
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyMarkup {
    pub rows: Vec<Vec<InlineButton>>,
}

impl ReplyMarkup {
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self { rows: vec![buttons] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMemberStatus {
    Member,
    Administrator,
    Creator,
    Left,
    Kicked,
}

/// Outbound capability the core consumes. Implementations must treat
/// an "edit: message not modified" response as success rather than an
/// error; callers never special-case it.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, opts: &SendOptions) -> MessengerResult<i64>;
    async fn send_photo(&self, chat_id: i64, photo: &[u8], caption: &str, opts: &SendOptions) -> MessengerResult<i64>;
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str, opts: &SendOptions) -> MessengerResult<()>;
    async fn edit_caption(&self, chat_id: i64, message_id: i64, caption: &str, opts: &SendOptions) -> MessengerResult<()>;
    async fn edit_reply_markup(&self, chat_id: i64, message_id: i64, markup: &ReplyMarkup) -> MessengerResult<()>;
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> MessengerResult<()>;
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, show_alert: bool) -> MessengerResult<()>;
    async fn get_chat_member_status(&self, chat_id: i64, user_id: i64) -> MessengerResult<ChatMemberStatus>;
    async fn get_chat_member_count(&self, chat_id: i64) -> MessengerResult<i64>;
}

/// Composes a player's profile/inventory portrait into a photo byte buffer
/// for `sendPhoto`/`editCaption` flows. Out of scope: the actual
/// rendering backend; the dispatcher only needs this seam to stay mockable.
#[async_trait]
pub trait ImageComposer: Send + Sync {
    async fn compose_portrait(&self, player_name: &str, hp: i64, max_hp: i64) -> MessengerResult<Vec<u8>>;
}

/// Send with graceful edit-vs-send fallback: try to edit first, and if the
/// edit fails for any reason other than "not modified", fall back to a
/// fresh send.
pub async fn edit_or_send(messenger: &dyn Messenger,
    chat_id: i64,
    message_id: Option<i64>,
    text: &str,
    opts: &SendOptions) -> MessengerResult<i64> {
    if let Some(id) = message_id {
        if messenger.edit_text(chat_id, id, text, opts).await.is_ok() {
            return Ok(id);
        }
    }
    messenger.send_text(chat_id, text, opts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMessenger {
        edit_should_fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_text(&self, _chat_id: i64, text: &str, _opts: &SendOptions) -> MessengerResult<i64> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(1)
        }
        async fn send_photo(&self, _chat_id: i64, _photo: &[u8], _caption: &str, _opts: &SendOptions) -> MessengerResult<i64> {
            Ok(1)
        }
        async fn edit_text(&self, _chat_id: i64, _message_id: i64, _text: &str, _opts: &SendOptions) -> MessengerResult<()> {
            if self.edit_should_fail {
                Err(MessengerError::Transport("not modified".into()))
            } else {
                Ok(())
            }
        }
        async fn edit_caption(&self, _chat_id: i64, _message_id: i64, _caption: &str, _opts: &SendOptions) -> MessengerResult<()> {
            Ok(())
        }
        async fn edit_reply_markup(&self, _chat_id: i64, _message_id: i64, _markup: &ReplyMarkup) -> MessengerResult<()> {
            Ok(())
        }
        async fn delete_message(&self, _chat_id: i64, _message_id: i64) -> MessengerResult<()> {
            Ok(())
        }
        async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>, _show_alert: bool) -> MessengerResult<()> {
            Ok(())
        }
        async fn get_chat_member_status(&self, _chat_id: i64, _user_id: i64) -> MessengerResult<ChatMemberStatus> {
            Ok(ChatMemberStatus::Member)
        }
        async fn get_chat_member_count(&self, _chat_id: i64) -> MessengerResult<i64> {
            Ok(10)
        }
    }

    #[tokio::test]
    async fn edit_or_send_falls_back_to_send_on_edit_failure() {
        let messenger = RecordingMessenger { edit_should_fail: true, ..Default::default() };
        edit_or_send(&messenger, 1, Some(42), "hello", &SendOptions::default()).await.unwrap();
        assert_eq!(messenger.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edit_or_send_skips_send_when_no_message_id() {
        let messenger = RecordingMessenger::default();
        let id = edit_or_send(&messenger, 1, None, "hello", &SendOptions::default()).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(messenger.sent.lock().unwrap().len(), 1);
    }
}
