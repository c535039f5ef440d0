//! Attacks
//!
//! An attack is validated completely before anything changes. Declaring it
//! fires the attack triggers (which may kill either side of the fight or
//! reveal a secret), the participants are then re-checked, and the damage
//! exchange is simultaneous: both values are read before either is dealt and
//! the dead are swept only afterwards.

use crate::core::{CardKind, InstanceId, Side, TargetRef, Trigger};
use crate::error::ActionRejection;
use crate::events::GameEvent;
use crate::game::primitives::{Source, SourceKind};
use crate::game::{GamePhase, GameState, LogKind};
use crate::Result;

impl GameState {
    pub(crate) fn check_can_act(&self, side: Side) -> std::result::Result<(), ActionRejection> {
        if self.is_game_over() {
            return Err(ActionRejection::GameOver);
        }
        if self.phase != GamePhase::Play {
            return Err(ActionRejection::WrongPhase);
        }
        if side != self.current_turn() {
            return Err(ActionRejection::NotYourTurn);
        }
        if self.pending_discover.is_some() {
            return Err(ActionRejection::DiscoveryPending);
        }
        Ok(())
    }

    /// Target rules shared by minion and hero attacks
    fn check_attack_target(&self, side: Side, target: TargetRef) -> std::result::Result<(), ActionRejection> {
        let enemy = side.other();
        match target {
            TargetRef::Hero(s) if s == enemy => {}
            TargetRef::Minion(id) => {
                let defender = self
                    .player(enemy)
                    .minion(id)
                    .filter(|m| m.is_alive())
                    .ok_or(ActionRejection::IllegalTarget)?;
                if defender.is_stealth {
                    return Err(ActionRejection::IllegalTarget);
                }
            }
            TargetRef::Hero(_) => return Err(ActionRejection::IllegalTarget),
        }
        if self.player(enemy).has_taunt() {
            let hits_taunt = target
                .minion()
                .and_then(|id| self.player(enemy).minion(id))
                .is_some_and(|m| m.is_taunt);
            if !hits_taunt {
                return Err(ActionRejection::MustAttackTaunt);
            }
        }
        Ok(())
    }

    /// Whether `attacker` may attack `target` right now
    pub fn check_minion_attack(
        &self,
        side: Side,
        attacker: InstanceId,
        target: TargetRef,
    ) -> std::result::Result<(), ActionRejection> {
        self.check_can_act(side)?;
        let minion = self
            .player(side)
            .minion(attacker)
            .filter(|m| m.is_alive())
            .ok_or(ActionRejection::AttackerNotFound)?;
        if minion.is_frozen {
            return Err(ActionRejection::Frozen);
        }
        if self.effective_attack(minion) <= 0 {
            return Err(ActionRejection::NoAttack);
        }
        if minion.attacks_performed >= minion.max_attacks_per_turn() {
            return Err(ActionRejection::AlreadyAttacked);
        }
        if minion.is_summoning_sick && !minion.has_charge && !minion.has_rush {
            return Err(ActionRejection::SummoningSick);
        }
        self.check_attack_target(side, target)?;
        if minion.is_summoning_sick && !minion.has_charge && matches!(target, TargetRef::Hero(_)) {
            return Err(ActionRejection::RushTargetsMinionsOnly);
        }
        Ok(())
    }

    /// Whether `side`'s hero may attack `target` right now
    pub fn check_hero_attack(&self, side: Side, target: TargetRef) -> std::result::Result<(), ActionRejection> {
        self.check_can_act(side)?;
        let player = self.player(side);
        if player.artifact.is_none() {
            return Err(ActionRejection::NoWeapon);
        }
        if self.hero_attack(side) <= 0 {
            return Err(ActionRejection::NoAttack);
        }
        if player.hero_attacks_this_turn >= 1 {
            return Err(ActionRejection::AlreadyAttacked);
        }
        self.check_attack_target(side, target)
    }

    /// Attack with a friendly minion
    pub fn attack_with_minion(&mut self, side: Side, attacker: InstanceId, target: TargetRef) -> Result<()> {
        self.check_minion_attack(side, attacker, target)?;

        let Some(minion) = self.player_mut(side).minion_mut(attacker) else {
            return Err(crate::EngineError::InvariantViolation(format!(
                "attacker {attacker} vanished after validation"
            )));
        };
        minion.attacks_performed += 1;
        if minion.attacks_performed >= minion.max_attacks_per_turn() {
            minion.can_attack = false;
        }
        minion.is_stealth = false;
        let name = minion.name().to_string();
        let declared_attack = minion.current_attack;

        self.emit(GameEvent::AttackDeclared {
            side,
            attacker: TargetRef::Minion(attacker),
            defender: target,
        });
        self.log(
            LogKind::Combat,
            Some(side),
            format!("{} attacks {}", name, self.describe(target)),
            Some(&name),
            None,
        );

        let subject = Some(TargetRef::Minion(attacker));
        self.fire_trigger(Trigger::OnMinionAttack, side, Some(target), declared_attack);
        self.fire_trigger(Trigger::OnEnemyAttack, side.other(), subject, declared_attack);

        let Some(attacker_card) = self.minion(attacker).cloned() else {
            self.log(LogKind::Combat, Some(side), format!("{} died before striking", name), Some(&name), None);
            return Ok(());
        };
        if self.is_game_over() || !self.target_exists(target) {
            self.log(LogKind::Combat, Some(side), format!("{}'s attack has no target left", name), Some(&name), None);
            return Ok(());
        }

        let attack = self.effective_attack(&attacker_card);
        let retaliation = target
            .minion()
            .and_then(|id| self.minion(id))
            .map(|d| (Source::card(d, SourceKind::Minion), self.effective_attack(d)));

        let attacker_source = Source::card(&attacker_card, SourceKind::Minion);
        self.deal_damage(&attacker_source, target, attack);
        if let Some((defender_source, counter)) = retaliation {
            self.deal_damage(&defender_source, TargetRef::Minion(attacker), counter);
        }
        self.sweep_dead();
        Ok(())
    }

    /// Attack with the hero using the equipped weapon or artifact
    ///
    /// Weapons lose one durability per attack and break at zero; artifacts
    /// with attack do not wear out.
    pub fn attack_with_hero(&mut self, side: Side, target: TargetRef) -> Result<()> {
        self.check_hero_attack(side, target)?;

        let player = self.player_mut(side);
        player.hero_attacks_this_turn += 1;
        if let Some(state) = player.artifact_state.as_mut() {
            state.hero_attacks_this_turn += 1;
        }
        let weapon_name = player
            .artifact
            .as_ref()
            .map(|a| a.name().to_string())
            .unwrap_or_default();
        let declared_attack = self.hero_attack(side);

        self.emit(GameEvent::AttackDeclared {
            side,
            attacker: TargetRef::Hero(side),
            defender: target,
        });
        self.log(
            LogKind::Combat,
            Some(side),
            format!("The {} hero attacks {} with {}", side, self.describe(target), weapon_name),
            Some(&weapon_name),
            Some(declared_attack),
        );

        self.fire_trigger(Trigger::OnHeroAttack, side, Some(target), declared_attack);
        self.fire_trigger(Trigger::OnEnemyAttack, side.other(), Some(TargetRef::Hero(side)), declared_attack);
        if self.is_game_over() || !self.target_exists(target) {
            return Ok(());
        }

        let attack = self.hero_attack(side);
        let retaliation = target
            .minion()
            .and_then(|id| self.minion(id))
            .map(|d| (Source::card(d, SourceKind::Minion), self.effective_attack(d)));
        let source = Source::new(side, weapon_name, SourceKind::Hero);
        self.deal_damage(&source, target, attack);
        if let Some((defender_source, counter)) = retaliation {
            self.deal_damage(&defender_source, TargetRef::Hero(side), counter);
        }
        let killed = matches!(target, TargetRef::Minion(_)) && !self.target_exists(target);

        self.wear_weapon(side);
        self.sweep_dead();
        if killed {
            self.fire_trigger(Trigger::OnHeroKill, side, Some(target), attack);
        }
        Ok(())
    }

    fn wear_weapon(&mut self, side: Side) {
        let player = self.player_mut(side);
        let Some(weapon) = player.artifact.as_mut().filter(|a| a.kind() == CardKind::Weapon) else {
            return;
        };
        weapon.current_health -= 1;
        if weapon.current_health > 0 {
            return;
        }
        if let Some(broken) = player.artifact.take() {
            player.artifact_state = None;
            let name = broken.name().to_string();
            player.graveyard.push(broken);
            self.log(LogKind::Combat, Some(side), format!("{} breaks", name), Some(&name), None);
        }
    }

    pub(crate) fn describe(&self, target: TargetRef) -> String {
        match target {
            TargetRef::Hero(side) => format!("the {} hero", side),
            TargetRef::Minion(id) => self
                .minion(id)
                .map(|m| m.name().to_string())
                .unwrap_or_else(|| format!("minion {}", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::core::{
        ArtifactRuntimeState, CardDefinition, CardKind, InstanceId, Keyword, Side, TargetRef,
    };
    use crate::error::ActionRejection;
    use crate::game::{GamePhase, GameState};
    use crate::loader::CardCatalog;
    use std::sync::Arc;

    fn state() -> GameState {
        let mut gs = GameState::new(EngineConfig::default(), Arc::new(CardCatalog::default()));
        gs.phase = GamePhase::Play;
        gs.turn.begin();
        gs
    }

    fn put(gs: &mut GameState, side: Side, def: CardDefinition) -> InstanceId {
        let card = gs.new_instance(Arc::new(def), side);
        let id = card.instance_id;
        gs.player_mut(side).battlefield.push(card);
        id
    }

    fn rejection(result: crate::Result<()>) -> Option<ActionRejection> {
        result.err().and_then(|e| e.rejection())
    }

    #[test]
    fn test_simultaneous_exchange() {
        let mut gs = state();
        let a = put(&mut gs, Side::Player, CardDefinition::minion(1, "Raider", 3, 3, 2));
        let d = put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Skald", 2, 2, 3));
        gs.attack_with_minion(Side::Player, a, TargetRef::Minion(d)).unwrap();
        assert!(gs.player(Side::Player).battlefield.is_empty());
        assert!(gs.player(Side::Opponent).battlefield.is_empty());
        assert_eq!(gs.player(Side::Player).graveyard.len(), 1);
        assert_eq!(gs.player(Side::Opponent).graveyard.len(), 1);
    }

    #[test]
    fn test_summoning_sick_and_already_attacked() {
        let mut gs = state();
        let a = put(&mut gs, Side::Player, CardDefinition::minion(1, "Raider", 3, 3, 5));
        gs.player_mut(Side::Player).battlefield[0].is_summoning_sick = true;
        let enemy = TargetRef::Hero(Side::Opponent);
        assert_eq!(rejection(gs.attack_with_minion(Side::Player, a, enemy)), Some(ActionRejection::SummoningSick));

        gs.player_mut(Side::Player).battlefield[0].is_summoning_sick = false;
        gs.attack_with_minion(Side::Player, a, enemy).unwrap();
        assert_eq!(gs.player(Side::Opponent).hero_health, 27);
        assert_eq!(rejection(gs.attack_with_minion(Side::Player, a, enemy)), Some(ActionRejection::AlreadyAttacked));
    }

    #[test]
    fn test_rush_cannot_hit_hero_on_first_turn() {
        let mut gs = state();
        let a = put(
            &mut gs,
            Side::Player,
            CardDefinition::minion(1, "Wolf Rider", 3, 3, 1).with_keywords(&[Keyword::Rush]),
        );
        gs.player_mut(Side::Player).battlefield[0].is_summoning_sick = true;
        let d = put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Thrall", 1, 1, 1));
        assert_eq!(
            rejection(gs.attack_with_minion(Side::Player, a, TargetRef::Hero(Side::Opponent))),
            Some(ActionRejection::RushTargetsMinionsOnly)
        );
        gs.attack_with_minion(Side::Player, a, TargetRef::Minion(d)).unwrap();
        assert!(gs.player(Side::Opponent).battlefield.is_empty());
    }

    #[test]
    fn test_stealth_and_own_side_are_illegal_targets() {
        let mut gs = state();
        let a = put(&mut gs, Side::Player, CardDefinition::minion(1, "Raider", 3, 3, 5));
        let friend = put(&mut gs, Side::Player, CardDefinition::minion(1, "Raider", 3, 3, 5));
        let hidden = put(
            &mut gs,
            Side::Opponent,
            CardDefinition::minion(2, "Shade", 2, 2, 2).with_keywords(&[Keyword::Stealth]),
        );
        assert_eq!(
            rejection(gs.attack_with_minion(Side::Player, a, TargetRef::Minion(hidden))),
            Some(ActionRejection::IllegalTarget)
        );
        assert_eq!(
            rejection(gs.attack_with_minion(Side::Player, a, TargetRef::Minion(friend))),
            Some(ActionRejection::IllegalTarget)
        );
        assert_eq!(
            rejection(gs.attack_with_minion(Side::Player, a, TargetRef::Hero(Side::Player))),
            Some(ActionRejection::IllegalTarget)
        );
    }

    #[test]
    fn test_windfury_attacks_twice() {
        let mut gs = state();
        let a = put(
            &mut gs,
            Side::Player,
            CardDefinition::minion(1, "Storm Valkyrie", 4, 2, 5).with_keywords(&[Keyword::Windfury]),
        );
        let enemy = TargetRef::Hero(Side::Opponent);
        gs.attack_with_minion(Side::Player, a, enemy).unwrap();
        gs.attack_with_minion(Side::Player, a, enemy).unwrap();
        assert_eq!(gs.player(Side::Opponent).hero_health, 26);
        assert!(gs.attack_with_minion(Side::Player, a, enemy).is_err());
    }

    #[test]
    fn test_weapon_loses_durability_and_breaks() {
        let mut gs = state();
        let mut axe = CardDefinition::new(crate::core::CardId::new(30), "Bearded Axe", CardKind::Weapon, 2);
        axe.attack = 2;
        axe.durability = Some(1);
        let mut weapon = gs.new_instance(Arc::new(axe), Side::Player);
        weapon.current_health = 1;
        gs.player_mut(Side::Player).artifact = Some(weapon);
        gs.player_mut(Side::Player).artifact_state = Some(ArtifactRuntimeState::default());

        gs.attack_with_hero(Side::Player, TargetRef::Hero(Side::Opponent)).unwrap();
        assert_eq!(gs.player(Side::Opponent).hero_health, 28);
        assert!(gs.player(Side::Player).artifact.is_none());
        assert_eq!(gs.player(Side::Player).graveyard.len(), 1);
        assert_eq!(
            rejection(gs.attack_with_hero(Side::Player, TargetRef::Hero(Side::Opponent))),
            Some(ActionRejection::NoWeapon)
        );
    }

    #[test]
    fn test_hero_attack_takes_retaliation() {
        let mut gs = state();
        let mut hammer = CardDefinition::new(crate::core::CardId::new(31), "Hammer", CardKind::Artifact, 3);
        hammer.attack = 3;
        let hammer = gs.new_instance(Arc::new(hammer), Side::Player);
        gs.player_mut(Side::Player).artifact = Some(hammer);
        let d = put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Troll", 4, 4, 3));
        gs.attack_with_hero(Side::Player, TargetRef::Minion(d)).unwrap();
        assert_eq!(gs.player(Side::Player).hero_health, 26);
        assert!(gs.player(Side::Opponent).battlefield.is_empty());
        assert!(gs.player(Side::Player).artifact.is_some());
    }
}
