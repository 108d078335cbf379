use teloxide::types::{ChatId, Message, MessageId, UserId};

/// Kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    /// One-to-one chat with the bot.
    Private,
    /// Basic groups and supergroups.
    Group,
    /// Channels and anything else.
    Other,
}

/// The author of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender {
    /// User id.
    pub id: UserId,
    /// Set for automated accounts.
    pub is_bot: bool,
}

/// The parts of an inbound update the bot acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message was posted in.
    pub chat_id: ChatId,
    /// Kind of that chat.
    pub scope: ChatScope,
    /// Chat title, absent for private chats.
    pub chat_title: Option<String>,
    /// Id of the message within the chat.
    pub message_id: MessageId,
    /// Author, absent for anonymous admins and channel posts.
    pub sender: Option<Sender>,
    /// Text or caption.
    pub text: Option<String>,
}

impl InboundMessage {
    /// Chat title, falling back to the chat id.
    pub fn display_title(&self) -> String {
        self.chat_title.clone().unwrap_or_else(|| self.chat_id.to_string())
    }

    /// The sender, unless the message came from an automated account or
    /// has no user attached.
    pub fn human_sender(&self) -> Option<Sender> {
        self.sender.filter(|sender| !sender.is_bot)
    }
}

impl From<&Message> for InboundMessage {
    fn from(msg: &Message) -> Self {
        let scope = if msg.chat.is_private() {
            ChatScope::Private
        } else if msg.chat.is_group() || msg.chat.is_supergroup() {
            ChatScope::Group
        } else {
            ChatScope::Other
        };

        Self {
            chat_id: msg.chat.id,
            scope,
            chat_title: msg.chat.title().map(str::to_string),
            message_id: msg.id,
            sender: msg.from.as_ref().map(|user| Sender { id: user.id, is_bot: user.is_bot }),
            text: msg.text().map(str::to_string),
        }
    }
}
