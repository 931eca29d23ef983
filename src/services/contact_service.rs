use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    normalize_email, page_bounds, validate_contact_message, ContactListQuery, ContactMessage,
    ContactRequest,
};
use crate::store::Store;

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn Store>,
}

impl ContactService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Store a message from the contact form, linked to the sender when logged in.
    pub async fn submit(
        &self,
        request: ContactRequest,
        user_id: Option<Uuid>,
    ) -> Result<ContactMessage, AppError> {
        validate_contact_message(&request.name, &request.email, &request.message)?;

        let message = ContactMessage {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            subject: request
                .subject
                .map(|subject| subject.trim().to_string())
                .filter(|subject| !subject.is_empty()),
            message: request.message.trim().to_string(),
            user_id,
            created_at: Utc::now(),
        };

        self.store.insert_contact_message(&message).await?;
        tracing::info!(message_id = %message.id, "contact message received");
        Ok(message)
    }

    pub async fn list(&self, query: ContactListQuery) -> Result<Vec<ContactMessage>, AppError> {
        let (limit, offset) = page_bounds(query.limit, query.offset);
        Ok(self.store.list_contact_messages(limit, offset).await?)
    }
}
