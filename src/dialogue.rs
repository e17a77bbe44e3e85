//! Conversation state for the user and admin engines.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::config::MAX_BUTTON_NAME_CHARS;
use crate::store::{MessageContent, Receipt};

/// Where a regular user is in the conversation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum UserState {
    #[default]
    Idle,
    AwaitingReceipt,
}

/// Where an admin is inside the admin panel
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum AdminState {
    #[default]
    MainMenu,
    ChooseButton,
    ChooseAction {
        button: String,
    },
    NewName {
        button: String,
    },
    CreateButton,
    AddMessage {
        button: String,
    },
    PreviewMessage {
        button: String,
        draft: MessageContent,
    },
    AddCaption {
        button: String,
        draft: MessageContent,
    },
    DeleteMessage {
        button: String,
    },
    ConfirmBroadcast,
    PreviewBroadcast {
        draft: MessageContent,
    },
    SelectReceipt {
        pending: Vec<Receipt>,
    },
    ProcessReceipt {
        receipt: Receipt,
    },
}

pub type UserDialogue = Dialogue<UserState, InMemStorage<UserState>>;
pub type AdminDialogue = Dialogue<AdminState, InMemStorage<AdminState>>;

/// Validates a button name input
pub fn validate_button_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_BUTTON_NAME_CHARS {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::ChatId;

    #[test]
    fn test_button_name_validation() {
        assert!(validate_button_name("Прайс").is_ok());
        assert!(validate_button_name("  FAQ  ").is_ok());

        assert!(validate_button_name("").is_err());
        assert!(validate_button_name("   ").is_err());
        assert_eq!(validate_button_name(&"я".repeat(51)), Err("too_long"));
        assert!(validate_button_name(&"я".repeat(50)).is_ok());
    }

    #[test]
    fn test_button_name_trimming() {
        assert_eq!(validate_button_name("  Новая кнопка  ").unwrap(), "Новая кнопка");
    }

    #[tokio::test]
    async fn test_states_are_kept_per_chat() {
        let storage = InMemStorage::<AdminState>::new();
        let first = AdminDialogue::new(storage.clone(), ChatId(1));
        let second = AdminDialogue::new(storage, ChatId(2));

        first.update(AdminState::CreateButton).await.unwrap();

        assert_eq!(first.get_or_default().await.unwrap(), AdminState::CreateButton);
        assert_eq!(second.get().await.unwrap(), None);
    }
}
