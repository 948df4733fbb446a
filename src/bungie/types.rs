//! Response schemas for the Bungie.net Platform API.
//!
//! Every Platform response is wrapped in the same PascalCase envelope; the
//! payload under `Response` uses camelCase.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Envelope around every Platform API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BungieEnvelope<T> {
    pub response: Option<T>,
    #[serde(default)]
    pub error_code: i32,
    #[serde(default)]
    pub error_status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `Response` of `User/GetMembershipsById`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMembershipData {
    #[serde(default)]
    pub destiny_memberships: Vec<DestinyMembership>,
}

/// One linked Destiny account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinyMembership {
    pub membership_type: BungieMembershipType,
    #[serde(deserialize_with = "string_or_number")]
    pub membership_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Platform a Destiny account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum BungieMembershipType {
    Xbox,
    Psn,
    Steam,
    Blizzard,
    Stadia,
    Egs,
    BungieNext,
    All,
    Other(i32),
}

impl From<i32> for BungieMembershipType {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Xbox,
            2 => Self::Psn,
            3 => Self::Steam,
            4 => Self::Blizzard,
            5 => Self::Stadia,
            6 => Self::Egs,
            254 => Self::BungieNext,
            -1 => Self::All,
            other => Self::Other(other),
        }
    }
}

impl From<BungieMembershipType> for i32 {
    fn from(value: BungieMembershipType) -> Self {
        match value {
            BungieMembershipType::Xbox => 1,
            BungieMembershipType::Psn => 2,
            BungieMembershipType::Steam => 3,
            BungieMembershipType::Blizzard => 4,
            BungieMembershipType::Stadia => 5,
            BungieMembershipType::Egs => 6,
            BungieMembershipType::BungieNext => 254,
            BungieMembershipType::All => -1,
            BungieMembershipType::Other(n) => n,
        }
    }
}

/// Renders the numeric code used in request paths.
impl fmt::Display for BungieMembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i32::from(*self))
    }
}

/// The membership a profile is fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipRecord {
    pub membership_type: BungieMembershipType,
    pub membership_id: String,
}

impl From<DestinyMembership> for MembershipRecord {
    fn from(m: DestinyMembership) -> Self {
        Self {
            membership_type: m.membership_type,
            membership_id: m.membership_id,
        }
    }
}

/// The `Response` of a profile request, passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileSnapshot {
    pub response: serde_json::Value,
}

/// Character class offered by the selection control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    Titan,
    Hunter,
    Warlock,
}

impl CharacterClass {
    pub const ALL: [Self; 3] = [Self::Titan, Self::Hunter, Self::Warlock];
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Titan => write!(f, "titan"),
            Self::Hunter => write!(f, "hunter"),
            Self::Warlock => write!(f, "warlock"),
        }
    }
}

impl FromStr for CharacterClass {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "titan" => Ok(Self::Titan),
            "hunter" => Ok(Self::Hunter),
            "warlock" => Ok(Self::Warlock),
            other => Err(format!("Unknown character class: {other}")),
        }
    }
}

// Membership ids are int64 on the wire but usually arrive as strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
