use std::fmt;

use serde::{Deserialize, Serialize};

/// A card as served by `/api/collection`. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub image: String,
    #[serde(default)]
    pub ap: i32,
    #[serde(default)]
    pub hp: i32,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub ability: Option<String>,
}

/// Card tiers, ordered weakest to strongest. The derived `Ord` is the
/// ordering used when sorting the collection by tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Champion,
    Exalted,
    Celestial,
    Divine,
    Ascendant,
    Genesis,
    Voidborn,
    Omega,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Champion => "champion",
            Tier::Exalted => "exalted",
            Tier::Celestial => "celestial",
            Tier::Divine => "divine",
            Tier::Ascendant => "ascendant",
            Tier::Genesis => "genesis",
            Tier::Voidborn => "voidborn",
            Tier::Omega => "omega",
        };
        f.write_str(name)
    }
}

/// The `{success, message}` envelope every endpoint wraps its payload in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub token: Option<String>,
}

/// Payload of a collection load. `decks` is present only when the viewing
/// target is the authenticated user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionData {
    #[serde(default)]
    pub inventory: Vec<Card>,
    #[serde(default)]
    pub decks: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub status: Option<FriendStatus>,
}

/// Relation of a searched user to the authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Friend,
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendsData {
    #[serde(default)]
    pub friends: Vec<UserSummary>,
    #[serde(default, rename = "incomingRequests")]
    pub incoming_requests: Vec<UserSummary>,
    #[serde(default, rename = "outgoingRequests")]
    pub outgoing_requests: Vec<UserSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearchData {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Verdict sent back for a pending friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Accept,
    Decline,
    Cancel,
}

/// `/api/open_pack` returns a reduced card shape without stats or ability.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackCard {
    pub name: String,
    pub number: u32,
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackData {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cards: Vec<PackCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_order_matches_game_ranking() {
        assert!(Tier::Champion < Tier::Exalted);
        assert!(Tier::Exalted < Tier::Celestial);
        assert!(Tier::Celestial < Tier::Divine);
        assert!(Tier::Divine < Tier::Ascendant);
        assert!(Tier::Ascendant < Tier::Genesis);
        assert!(Tier::Genesis < Tier::Voidborn);
        assert!(Tier::Voidborn < Tier::Omega);
    }

    #[test]
    fn collection_payload_decodes_with_decks() {
        let json = r#"{
            "success": true,
            "inventory": [
                {"id": "c1", "name": "Ashen Herald", "number": 12,
                 "image": "http://cdn/c1.png", "ap": 3, "hp": 5,
                 "tier": "divine", "ability": "Burns on entry."}
            ],
            "decks": [["c1"], [], []]
        }"#;
        let data: CollectionData = serde_json::from_str(json).unwrap();
        assert_eq!(data.inventory.len(), 1);
        assert_eq!(data.inventory[0].tier, Tier::Divine);
        assert_eq!(data.decks.as_ref().unwrap().len(), 3);
        assert_eq!(data.decks.unwrap()[0], vec!["c1".to_owned()]);
    }

    #[test]
    fn collection_payload_decodes_without_decks() {
        // A friend's collection never carries deck lists.
        let json = r#"{"success": true, "inventory": []}"#;
        let data: CollectionData = serde_json::from_str(json).unwrap();
        assert!(data.inventory.is_empty());
        assert!(data.decks.is_none());
    }

    #[test]
    fn card_tolerates_missing_optional_fields() {
        let json = r#"{"id": "c9", "name": "Blank", "number": 4, "image": "x"}"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.tier, Tier::Champion);
        assert_eq!(card.ap, 0);
        assert!(card.ability.is_none());
    }

    #[test]
    fn friends_payload_decodes_wire_names() {
        let json = r#"{
            "success": true,
            "friends": [{"_id": "u1", "displayName": "Rin"}],
            "incomingRequests": [{"_id": "u2", "displayName": "Kel"}],
            "outgoingRequests": []
        }"#;
        let data: FriendsData = serde_json::from_str(json).unwrap();
        assert_eq!(data.friends[0].display_name, "Rin");
        assert_eq!(data.incoming_requests[0].id, "u2");
        assert!(data.outgoing_requests.is_empty());
    }

    #[test]
    fn search_status_decodes_known_and_unknown() {
        let json = r#"{"users": [
            {"_id": "a", "displayName": "A", "status": "friend"},
            {"_id": "b", "displayName": "B", "status": "pending"},
            {"_id": "c", "displayName": "C", "status": "stranger"}
        ]}"#;
        let data: UserSearchData = serde_json::from_str(json).unwrap();
        assert_eq!(data.users[0].status, Some(FriendStatus::Friend));
        assert_eq!(data.users[1].status, Some(FriendStatus::Pending));
        assert_eq!(data.users[2].status, Some(FriendStatus::Unknown));
    }

    #[test]
    fn request_action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestAction::Accept).unwrap(),
            "\"accept\""
        );
        assert_eq!(
            serde_json::to_string(&RequestAction::Cancel).unwrap(),
            "\"cancel\""
        );
    }
}
