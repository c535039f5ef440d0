//! Game zones (deck, hand, battlefield, graveyard, secrets, artifact slot)

use crate::core::{CardInstance, InstanceId, PlayerState, Side};
use serde::{Deserialize, Serialize};

/// Different zones where cards can exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Deck,
    Hand,
    Battlefield,
    Graveyard,
    Secrets,
    Artifact,
}

/// Where an instance currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub side: Side,
    pub zone: Zone,
    pub index: usize,
}

impl Zone {
    pub fn cards(self, player: &PlayerState) -> &[CardInstance] {
        match self {
            Zone::Deck => &player.deck,
            Zone::Hand => &player.hand,
            Zone::Battlefield => &player.battlefield,
            Zone::Graveyard => &player.graveyard,
            Zone::Secrets => &player.secrets,
            Zone::Artifact => player.artifact.as_slice(),
        }
    }
}

/// Find an instance anywhere on either side
pub fn locate(players: &[PlayerState; 2], id: InstanceId) -> Option<Location> {
    const SEARCH_ORDER: [Zone; 6] = [
        Zone::Battlefield,
        Zone::Hand,
        Zone::Artifact,
        Zone::Secrets,
        Zone::Deck,
        Zone::Graveyard,
    ];
    for player in players {
        for zone in SEARCH_ORDER {
            if let Some(index) = zone.cards(player).iter().position(|c| c.instance_id == id) {
                return Some(Location {
                    side: player.side,
                    zone,
                    index,
                });
            }
        }
    }
    None
}

/// Remove an instance from an ordered zone
pub fn take(cards: &mut Vec<CardInstance>, id: InstanceId) -> Option<CardInstance> {
    // remove() rather than swap_remove(): board and hand order are visible
    // to players and drive deterministic resolution order.
    let pos = cards.iter().position(|c| c.instance_id == id)?;
    Some(cards.remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardDefinition;
    use std::sync::Arc;

    fn card(id: u32, side: Side) -> CardInstance {
        CardInstance::new(
            InstanceId::new(id),
            Arc::new(CardDefinition::minion(1, "Thrall", 1, 1, 1)),
            side,
        )
    }

    #[test]
    fn test_locate_finds_zone_and_side() {
        let mut p = PlayerState::new(Side::Player, "A", 30);
        let mut o = PlayerState::new(Side::Opponent, "B", 30);
        p.hand.push(card(1, Side::Player));
        o.battlefield.push(card(2, Side::Opponent));
        o.battlefield.push(card(3, Side::Opponent));
        let players = [p, o];

        let loc = locate(&players, InstanceId::new(3)).unwrap();
        assert_eq!(loc.side, Side::Opponent);
        assert_eq!(loc.zone, Zone::Battlefield);
        assert_eq!(loc.index, 1);
        assert_eq!(locate(&players, InstanceId::new(1)).unwrap().zone, Zone::Hand);
        assert!(locate(&players, InstanceId::new(9)).is_none());
    }

    #[test]
    fn test_take_preserves_order() {
        let mut cards = vec![card(1, Side::Player), card(2, Side::Player), card(3, Side::Player)];
        let taken = take(&mut cards, InstanceId::new(1)).unwrap();
        assert_eq!(taken.instance_id, InstanceId::new(1));
        let ids: Vec<u32> = cards.iter().map(|c| c.instance_id.as_u32()).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
