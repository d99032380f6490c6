use std::time::{Duration, Instant};

/// Outbound messages show as delivered this long after sending.
pub const DELIVERED_AFTER: Duration = Duration::from_secs(1);
/// And as read this long after sending.
pub const READ_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    WhatsApp,
    Instagram,
    Facebook,
    Telegram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connected,
    Disconnected,
    Error,
}

/// A configured messaging-channel connection. Presentation state only, not a
/// network session.
#[derive(Debug, Clone)]
pub struct ChannelSession {
    pub id: u32,
    pub name: String,
    pub channel: Channel,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeliveryState {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub direction: Direction,
    pub sent_at: Instant,
    /// `None` for inbound messages.
    pub delivery: Option<DeliveryState>,
}

/// In-memory view model of one displayed conversation.
///
/// Owns no timers: the caller supplies the clock to `send` and
/// `poll_delivery`, which makes the fake receipt progression deterministic
/// under test.
pub struct ChatSessionPresenter {
    sessions: Vec<ChannelSession>,
    active: Option<u32>,
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl ChatSessionPresenter {
    /// The first connected session starts active.
    pub fn new(sessions: Vec<ChannelSession>) -> Self {
        let active = sessions
            .iter()
            .find(|s| s.status == SessionStatus::Connected)
            .map(|s| s.id);
        Self {
            sessions,
            active,
            messages: Vec::new(),
            next_id: 1,
        }
    }

    pub fn sessions(&self) -> &[ChannelSession] {
        &self.sessions
    }

    pub fn active_session(&self) -> Option<&ChannelSession> {
        let id = self.active?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Returns false if no such session is configured.
    pub fn select_session(&mut self, id: u32) -> bool {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends an outbound message in the `Sent` state.
    pub fn send(&mut self, text: impl Into<String>, at: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            text: text.into(),
            direction: Direction::Sent,
            sent_at: at,
            delivery: Some(DeliveryState::Sent),
        });
        id
    }

    /// Appends an inbound message. Inbound messages carry no delivery state.
    pub fn push_incoming(&mut self, text: impl Into<String>, at: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            text: text.into(),
            direction: Direction::Received,
            sent_at: at,
            delivery: None,
        });
        id
    }

    /// Promotes outbound delivery states by elapsed time: `Delivered` after
    /// 1s, `Read` after 3s. States never regress. Returns the number of
    /// promotions.
    pub fn poll_delivery(&mut self, now: Instant) -> usize {
        let mut promoted = 0;
        for message in &mut self.messages {
            let Some(current) = message.delivery else {
                continue;
            };
            let elapsed = now.saturating_duration_since(message.sent_at);
            let target = if elapsed >= READ_AFTER {
                DeliveryState::Read
            } else if elapsed >= DELIVERED_AFTER {
                DeliveryState::Delivered
            } else {
                DeliveryState::Sent
            };
            if target > current {
                message.delivery = Some(target);
                promoted += 1;
            }
        }
        promoted
    }
}
