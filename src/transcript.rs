//! The ordered list of chat turns shown in the transcript panel.
//!
//! Turns are addressed by a [`TurnId`] that stays valid until the turn is
//! removed or the transcript is cleared. Assistant text can be revealed one
//! character at a time; the turn's sources are attached only once the reveal
//! has placed every character.

use crate::types::{Role, SourceRef};
use time::OffsetDateTime;

pub type TurnId = u64;

/// What produced a turn. Only answers can be rewritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOrigin {
    Question,
    Answer,
    Notice,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TurnState {
    /// Placeholder shown while a response is outstanding.
    Typing,
    Revealing(PendingReveal),
    Settled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PendingReveal {
    target: String,
    sources: Vec<SourceRef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealStep {
    /// One more character was placed; more remain.
    Advanced,
    /// The last character is placed and sources are attached.
    Finished,
    /// The turn no longer exists, or is not revealing.
    Gone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatTurn {
    pub id: TurnId,
    pub role: Role,
    pub origin: TurnOrigin,
    pub text: String,
    pub sources: Vec<SourceRef>,
    pub created_at: Option<OffsetDateTime>,
    pub state: TurnState,
}

impl ChatTurn {
    pub fn is_typing(&self) -> bool {
        matches!(self.state, TurnState::Typing)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, TurnState::Settled)
    }

    pub fn is_revealing(&self) -> bool {
        matches!(self.state, TurnState::Revealing(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
    next_id: TurnId,
}

fn current_time() -> Option<OffsetDateTime> {
    Some(OffsetDateTime::now_utc())
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, id: TurnId) -> Option<&ChatTurn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    fn get_mut(&mut self, id: TurnId) -> Option<&mut ChatTurn> {
        self.turns.iter_mut().find(|turn| turn.id == id)
    }

    fn push(
        &mut self,
        role: Role,
        origin: TurnOrigin,
        text: String,
        sources: Vec<SourceRef>,
        state: TurnState,
    ) -> TurnId {
        let id = self.next_id;
        self.next_id += 1;
        self.turns.push(ChatTurn {
            id,
            role,
            origin,
            text,
            sources,
            created_at: current_time(),
            state,
        });
        id
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> TurnId {
        self.push(
            Role::User,
            TurnOrigin::Question,
            text.into(),
            Vec::new(),
            TurnState::Settled,
        )
    }

    /// Assistant turn shown in full right away.
    pub fn push_assistant(&mut self, origin: TurnOrigin, text: impl Into<String>) -> TurnId {
        self.push(
            Role::Assistant,
            origin,
            text.into(),
            Vec::new(),
            TurnState::Settled,
        )
    }

    pub fn push_typing(&mut self) -> TurnId {
        self.push(
            Role::Assistant,
            TurnOrigin::Notice,
            String::new(),
            Vec::new(),
            TurnState::Typing,
        )
    }

    /// Assistant turn that starts empty and grows via [`Transcript::advance_reveal`].
    pub fn begin_reveal(
        &mut self,
        origin: TurnOrigin,
        text: impl Into<String>,
        sources: Vec<SourceRef>,
    ) -> TurnId {
        let reveal = PendingReveal {
            target: text.into(),
            sources,
        };
        self.push(
            Role::Assistant,
            origin,
            String::new(),
            Vec::new(),
            TurnState::Revealing(reveal),
        )
    }

    pub fn advance_reveal(&mut self, id: TurnId) -> RevealStep {
        let Some(turn) = self.get_mut(id) else {
            return RevealStep::Gone;
        };
        let TurnState::Revealing(reveal) = &mut turn.state else {
            return RevealStep::Gone;
        };

        if let Some(ch) = reveal.target[turn.text.len()..].chars().next() {
            turn.text.push(ch);
        }
        if turn.text.len() < reveal.target.len() {
            return RevealStep::Advanced;
        }

        turn.sources = std::mem::take(&mut reveal.sources);
        turn.state = TurnState::Settled;
        RevealStep::Finished
    }

    /// Places every remaining character at once.
    pub fn complete_reveal(&mut self, id: TurnId) -> RevealStep {
        loop {
            match self.advance_reveal(id) {
                RevealStep::Advanced => continue,
                step => return step,
            }
        }
    }

    pub fn revealing_ids(&self) -> Vec<TurnId> {
        self.turns
            .iter()
            .filter(|turn| turn.is_revealing())
            .map(|turn| turn.id)
            .collect()
    }

    pub fn remove(&mut self, id: TurnId) -> bool {
        let before = self.turns.len();
        self.turns.retain(|turn| turn.id != id);
        self.turns.len() != before
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
