//! Payload messages carried inside [`crate::Envelope`] values. Only the
//! kinds the dispatcher inspects are modelled; everything else stays opaque
//! and is forwarded by type identifier alone.

use prost::Message;

// ---------------------------------------------------------------------------
// Requests (client -> server)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct MapMovementRequest {
    /// Compressed path steps, direction in bits 12-14 and cell id below.
    #[prost(int32, repeated, tag = "1")]
    pub key_cells: Vec<i32>,
    #[prost(int32, tag = "2")]
    pub map_id: i32,
    #[prost(bool, tag = "3")]
    pub cautious: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapMovementConfirmRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct MapChangeRequest {
    #[prost(int32, tag = "1")]
    pub map_id: i32,
    #[prost(bool, tag = "2")]
    pub auto_pilot: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapInformationRequest {
    #[prost(int32, tag = "1")]
    pub map_id: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChatChannelMessageRequest {
    #[prost(int32, tag = "1")]
    pub channel: i32,
    #[prost(string, tag = "2")]
    pub content: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct InteractiveUseRequest {
    #[prost(int32, tag = "1")]
    pub element_id: i32,
    #[prost(int32, tag = "2")]
    pub skill_instance_uid: i32,
}

// ---------------------------------------------------------------------------
// Responses (server -> client)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct MapMovementConfirmResponse {}

// ---------------------------------------------------------------------------
// Events (server -> client)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct MapMovementEvent {
    #[prost(int64, tag = "1")]
    pub actor_id: i64,
    /// Cell ids along the accepted path, start first.
    #[prost(int32, repeated, tag = "2")]
    pub cells: Vec<i32>,
    #[prost(bool, tag = "3")]
    pub cautious: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapChangeOrientationEvent {
    #[prost(int64, tag = "1")]
    pub actor_id: i64,
    #[prost(int32, tag = "2")]
    pub direction: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapCurrentEvent {
    #[prost(int32, tag = "1")]
    pub map_id: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ActorDisposition {
    #[prost(int32, optional, tag = "1")]
    pub cell_id: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HumanoidInfo {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreatureInfo {
    #[prost(int32, tag = "1")]
    pub level: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct MonsterGroupInfo {
    #[prost(message, optional, tag = "1")]
    pub main_creature: Option<CreatureInfo>,
    #[prost(message, repeated, tag = "2")]
    pub underlings: Vec<CreatureInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NpcInfo {}

#[derive(Clone, PartialEq, Message)]
pub struct PortalInfo {}

#[derive(Clone, PartialEq, Message)]
pub struct FighterInfo {}

#[derive(Clone, PartialEq, Message)]
pub struct ActorPositionInformation {
    #[prost(int64, tag = "1")]
    pub actor_id: i64,
    #[prost(message, optional, tag = "2")]
    pub disposition: Option<ActorDisposition>,
    #[prost(oneof = "actor_position_information::Kind", tags = "3, 4, 5, 6, 7")]
    pub kind: Option<actor_position_information::Kind>,
}

pub mod actor_position_information {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "3")]
        Humanoid(super::HumanoidInfo),
        #[prost(message, tag = "4")]
        MonsterGroup(super::MonsterGroupInfo),
        #[prost(message, tag = "5")]
        Npc(super::NpcInfo),
        #[prost(message, tag = "6")]
        Portal(super::PortalInfo),
        #[prost(message, tag = "7")]
        Fighter(super::FighterInfo),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct ElementSkill {
    #[prost(int32, tag = "1")]
    pub skill_id: i32,
    #[prost(int32, tag = "2")]
    pub skill_instance_uid: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct InteractiveElement {
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(int32, tag = "2")]
    pub element_type_id: i32,
    #[prost(message, repeated, tag = "3")]
    pub enabled_skills: Vec<ElementSkill>,
    #[prost(message, repeated, tag = "4")]
    pub disabled_skills: Vec<ElementSkill>,
    #[prost(bool, tag = "5")]
    pub on_current_map: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct StatedElement {
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(int32, tag = "2")]
    pub cell_id: i32,
    #[prost(int32, tag = "3")]
    pub state: i32,
    #[prost(bool, tag = "4")]
    pub on_current_map: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapObstacle {
    #[prost(int32, tag = "1")]
    pub cell_id: i32,
    #[prost(int32, tag = "2")]
    pub state: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapComplementaryInformationEvent {
    #[prost(int32, tag = "1")]
    pub map_id: i32,
    #[prost(message, repeated, tag = "2")]
    pub actors: Vec<ActorPositionInformation>,
    #[prost(message, repeated, tag = "3")]
    pub interactive_elements: Vec<InteractiveElement>,
    #[prost(message, repeated, tag = "4")]
    pub stated_elements: Vec<StatedElement>,
    #[prost(message, repeated, tag = "5")]
    pub obstacles: Vec<MapObstacle>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ShowActorsEvent {
    #[prost(message, repeated, tag = "1")]
    pub actors: Vec<ActorPositionInformation>,
}

#[derive(Clone, PartialEq, Message)]
pub struct InteractiveUsedEvent {
    #[prost(int64, tag = "1")]
    pub entity_id: i64,
    #[prost(int32, tag = "2")]
    pub element_id: i32,
    #[prost(int32, tag = "3")]
    pub skill_id: i32,
    /// Announced harvest duration in tenths of seconds.
    #[prost(int32, tag = "4")]
    pub duration: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct InteractiveUseEndedEvent {
    #[prost(int32, tag = "1")]
    pub element_id: i32,
    #[prost(int32, tag = "2")]
    pub skill_id: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct InteractiveUseErrorEvent {
    #[prost(int32, tag = "1")]
    pub element_id: i32,
    #[prost(int32, tag = "2")]
    pub skill_instance_uid: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct InteractiveElementUpdatedEvent {
    #[prost(message, optional, tag = "1")]
    pub element: Option<InteractiveElement>,
}

#[derive(Clone, PartialEq, Message)]
pub struct StatedElementUpdatedEvent {
    #[prost(message, optional, tag = "1")]
    pub element: Option<StatedElement>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChatChannelMessageEvent {
    #[prost(int32, tag = "1")]
    pub channel: i32,
    #[prost(string, tag = "2")]
    pub content: String,
    #[prost(string, tag = "3")]
    pub sender_name: String,
}
