//! SendMessage command handler
//!
//! Appends a message to a thread and bumps the thread's activity
//! timestamp so it sorts to the top of the inbox. Chat traffic gets no
//! notification fan-out or audit trail.

use chrono::Utc;

use shared::models::Message;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{MAX_TEXT_LEN, MAX_URL_LEN, validate_command_text};

/// SendMessage action
#[derive(Debug, Clone)]
pub struct SendMessageAction {
    pub thread_id: String,
    pub message_text: String,
    pub attachments: Vec<String>,
}

impl CommandHandler for SendMessageAction {
    type Output = Message;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Message, LifecycleError> {
        // 1. Validate input
        validate_command_text(&self.message_text, "message_text", MAX_TEXT_LEN)?;
        for url in &self.attachments {
            validate_command_text(url, "attachment", MAX_URL_LEN)?;
        }

        // 2. Load the thread; only its participants can post
        let mut thread = ctx.load_thread(&self.thread_id)?;
        if !thread.involves(&metadata.actor_id) {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Append the message
        let now = Utc::now();
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread.id.clone(),
            from_user_id: metadata.actor_id.clone(),
            message_text: self.message_text.clone(),
            attachments: self.attachments.clone(),
            is_read: false,
            created_at: now,
        };
        ctx.storage.store_message(ctx.txn, &message)?;

        // 4. Bump the thread
        thread.updated_at = now;
        ctx.storage.store_thread(ctx.txn, &thread)?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::storage::MarketStorage;
    use chrono::Duration;
    use shared::UserRole;
    use shared::models::Thread;

    fn create_test_metadata(user_id: &str) -> CommandMetadata {
        let user = CurrentUser {
            id: user_id.to_string(),
            name: "Test User".to_string(),
            role: UserRole::Trader,
        };
        CommandMetadata::for_user(Some("cmd-1".to_string()), &user)
    }

    fn create_thread(buyer_id: &str, seller_id: &str) -> Thread {
        let earlier = Utc::now() - Duration::hours(1);
        Thread {
            id: uuid::Uuid::new_v4().to_string(),
            buyer_id: buyer_id.to_string(),
            seller_id: seller_id.to_string(),
            listing_id: Some("listing-1".to_string()),
            subject: Some("Offer for Basmati Rice".to_string()),
            is_active: true,
            created_at: earlier,
            updated_at: earlier,
        }
    }

    #[test]
    fn test_send_message_appends_and_bumps_thread() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let thread = create_thread("trader-1", "farmer-1");
        storage.store_thread(&txn, &thread).unwrap();
        storage.index_thread(&txn, &thread).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = SendMessageAction {
            thread_id: thread.id.clone(),
            message_text: "Can you deliver by Friday?".to_string(),
            attachments: vec![],
        };
        let metadata = create_test_metadata("trader-1");

        let message = action.execute(&mut ctx, &metadata).unwrap();

        assert_eq!(message.from_user_id, "trader-1");
        assert!(!message.is_read);
        assert!(ctx.notifications().is_empty());
        assert!(ctx.audits().is_empty());
        assert!(ctx.events().is_empty());

        drop(ctx);
        txn.commit().unwrap();

        let messages = storage.list_messages(&thread.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_text, "Can you deliver by Friday?");

        let stored_thread = storage.get_thread(&thread.id).unwrap().unwrap();
        assert!(stored_thread.updated_at > thread.updated_at);
    }

    #[test]
    fn test_send_message_by_seller_is_allowed() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let thread = create_thread("trader-1", "farmer-1");
        storage.store_thread(&txn, &thread).unwrap();
        storage.index_thread(&txn, &thread).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = SendMessageAction {
            thread_id: thread.id.clone(),
            message_text: "Friday works. Truck leaves at dawn.".to_string(),
            attachments: vec!["https://files.example/loading-plan.pdf".to_string()],
        };
        let metadata = create_test_metadata("farmer-1");

        let message = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(message.from_user_id, "farmer-1");
        assert_eq!(message.attachments.len(), 1);
    }

    #[test]
    fn test_send_message_by_outsider_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let thread = create_thread("trader-1", "farmer-1");
        storage.store_thread(&txn, &thread).unwrap();
        storage.index_thread(&txn, &thread).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = SendMessageAction {
            thread_id: thread.id.clone(),
            message_text: "Hello?".to_string(),
            attachments: vec![],
        };
        let metadata = create_test_metadata("trader-2");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_send_message_requires_text() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = SendMessageAction {
            thread_id: "thread-1".to_string(),
            message_text: "   ".to_string(),
            attachments: vec![],
        };
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::Validation(msg)) => {
                assert_eq!(msg, "message_text must not be empty");
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_send_message_to_missing_thread_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = SendMessageAction {
            thread_id: "nonexistent".to_string(),
            message_text: "Anyone there?".to_string(),
            attachments: vec![],
        };
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    }
}
