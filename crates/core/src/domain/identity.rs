// Identity Types - opaque ids shared by every queue variant

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Chat-platform guild (server) id
    GuildId(u64)
);
opaque_id!(
    /// Text channel id
    ChannelId(u64)
);
opaque_id!(
    /// Queued user (student, asker, follower)
    ParticipantId(u64)
);
opaque_id!(
    /// Live-session destination (voice channel)
    VoiceLocation(u64)
);
opaque_id!(
    /// Reviewable unit in the multi-assignment variant (e.g. homework number)
    AssignmentId(u32)
);
opaque_id!(
    /// Question number; allocated once, never reused
    QuestionIndex(u32)
);

/// Reviewers are participants with staff rights; authorization is checked upstream.
pub type ReviewerId = ParticipantId;

/// Queue identity: one queue per (guild, channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueIdentity {
    pub guild: GuildId,
    pub channel: ChannelId,
}

impl QueueIdentity {
    pub fn new(guild: impl Into<GuildId>, channel: impl Into<ChannelId>) -> Self {
        Self {
            guild: guild.into(),
            channel: channel.into(),
        }
    }

    /// Stable file stem used by the persistence store: `<guild>-<channel>`
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.guild, self.channel)
    }

    /// Inverse of [`QueueIdentity::file_stem`]
    pub fn parse_file_stem(stem: &str) -> Result<Self, DomainError> {
        let (guild, channel) = stem
            .split_once('-')
            .ok_or_else(|| DomainError::InvalidIdentity(stem.to_string()))?;

        let guild: u64 = guild
            .parse()
            .map_err(|_| DomainError::InvalidIdentity(stem.to_string()))?;
        let channel: u64 = channel
            .parse()
            .map_err(|_| DomainError::InvalidIdentity(stem.to_string()))?;

        Ok(Self::new(guild, channel))
    }
}

impl fmt::Display for QueueIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.guild, self.channel)
    }
}

/// Queue variant tag, persisted as `variantTag`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantTag {
    Review,
    MultiReview,
    Question,
}

impl VariantTag {
    pub const ALL: [VariantTag; 3] = [
        VariantTag::Review,
        VariantTag::MultiReview,
        VariantTag::Question,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantTag::Review => "Review",
            VariantTag::MultiReview => "MultiReview",
            VariantTag::Question => "Question",
        }
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariantTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownVariant(s.to_string()))
    }
}
