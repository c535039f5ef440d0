//! Quest tracking
//!
//! A quest counts qualifying actions of its owner and grants a reward card
//! once the count reaches the goal. Each action advances a quest by at most
//! one step, and completion is terminal.

use crate::core::{CardId, CardInstance, Keyword, Side};
use crate::events::GameEvent;
use crate::game::{GameState, LogKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a quest counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCondition {
    SummonMinion,
    SummonDeathrattleMinions,
    PlayTauntMinions,
    CastGeneratedSpells,
    PlayMinionsSameName,
    SummonMinionsWithAttack,
    PlayMinionsCost1,
    Generic,
}

/// Tracked action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestAction {
    /// A minion played from hand
    PlayMinion,
    /// A minion put onto the battlefield by an effect
    SummonMinion,
    CastSpell,
}

/// Quest fields of a card definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestSpec {
    pub condition: QuestCondition,
    pub goal: u32,
    pub reward_card_id: CardId,
    /// Minimum attack for `summon_minions_with_attack`
    #[serde(default)]
    pub threshold: i32,
}

/// A quest in play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveQuest {
    pub quest_id: u32,
    pub card_id: CardId,
    pub name: String,
    pub condition: QuestCondition,
    pub current: u32,
    pub goal: u32,
    pub reward_card_id: CardId,
    pub threshold: i32,
    /// First minion name counted by `play_minions_same_name`
    pub tracked_name: Option<String>,
    pub completed: bool,
    pub started_turn: u32,
    pub completed_turn: Option<u32>,
}

impl ActiveQuest {
    pub fn new(quest_id: u32, card: &CardInstance, spec: &QuestSpec, turn: u32) -> Self {
        ActiveQuest {
            quest_id,
            card_id: card.card_id(),
            name: card.name().to_string(),
            condition: spec.condition,
            current: 0,
            goal: spec.goal.max(1),
            reward_card_id: spec.reward_card_id,
            threshold: spec.threshold,
            tracked_name: None,
            completed: false,
            started_turn: turn,
            completed_turn: None,
        }
    }

    pub fn progress(&self) -> String {
        format!("{}/{}", self.current, self.goal)
    }
}

/// Whether `action` with `card` advances `quest`
pub fn should_increment(quest: &ActiveQuest, action: QuestAction, card: &CardInstance) -> bool {
    if quest.completed {
        return false;
    }
    let entered_play = matches!(action, QuestAction::PlayMinion | QuestAction::SummonMinion);
    let played = action == QuestAction::PlayMinion;
    match quest.condition {
        QuestCondition::SummonMinion => entered_play && card.definition.is_minion(),
        QuestCondition::SummonDeathrattleMinions => entered_play && card.definition.has_deathrattle(),
        QuestCondition::PlayTauntMinions => played && card.has_keyword(Keyword::Taunt),
        QuestCondition::CastGeneratedSpells => action == QuestAction::CastSpell && card.is_generated,
        QuestCondition::PlayMinionsSameName => {
            played
                && quest
                    .tracked_name
                    .as_deref()
                    .map_or(true, |name| name == card.name())
        }
        QuestCondition::SummonMinionsWithAttack => {
            entered_play && card.current_attack >= quest.threshold
        }
        QuestCondition::PlayMinionsCost1 => played && card.definition.mana_cost == 1,
        QuestCondition::Generic => true,
    }
}

impl GameState {
    /// Put a quest card into play for `side`
    pub fn start_quest(&mut self, side: Side, card: &CardInstance) -> bool {
        let Some(spec) = card.definition.quest.as_ref() else {
            tracing::warn!(card = %card.name(), "quest card without quest data");
            return false;
        };
        let quest = ActiveQuest::new(card.instance_id.as_u32(), card, spec, self.turn_number());
        self.emit(GameEvent::QuestStarted {
            side,
            quest_id: quest.quest_id,
            name: quest.name.clone(),
            goal: quest.goal,
        });
        self.log(
            LogKind::Quest,
            Some(side),
            format!("{} started quest: {} ({})", side, quest.name, quest.progress()),
            Some(&quest.name),
            Some(0),
        );
        self.player_mut(side).active_quests.push(quest);
        true
    }

    /// Advance every matching active quest of `side` by one
    pub fn track_quest_action(&mut self, side: Side, action: QuestAction, card: &CardInstance) {
        let turn = self.turn_number();
        let mut progressed = Vec::new();
        for quest in self.player_mut(side).active_quests.iter_mut() {
            if !should_increment(quest, action, card) {
                continue;
            }
            if quest.condition == QuestCondition::PlayMinionsSameName && quest.tracked_name.is_none() {
                quest.tracked_name = Some(card.name().to_string());
            }
            quest.current += 1;
            if quest.current >= quest.goal {
                quest.completed = true;
                quest.completed_turn = Some(turn);
            }
            progressed.push(quest.clone());
        }
        for quest in &progressed {
            self.emit(GameEvent::QuestProgressed {
                side,
                quest_id: quest.quest_id,
                current: quest.current,
                goal: quest.goal,
            });
            self.log(
                LogKind::Quest,
                Some(side),
                format!("{} quest progress: {} {}", side, quest.name, quest.progress()),
                Some(&quest.name),
                Some(quest.current as i32),
            );
        }
        for quest in progressed.into_iter().filter(|q| q.completed) {
            self.complete_quest(side, quest);
        }
    }

    fn complete_quest(&mut self, side: Side, quest: ActiveQuest) {
        let player = self.player_mut(side);
        player.active_quests.retain(|q| q.quest_id != quest.quest_id);
        player.completed_quests.push(quest.clone());
        self.emit(GameEvent::QuestCompleted {
            side,
            quest_id: quest.quest_id,
            name: quest.name.clone(),
            reward_card_id: quest.reward_card_id,
        });
        self.log(
            LogKind::Quest,
            Some(side),
            format!("{} completed quest: {}", side, quest.name),
            Some(&quest.name),
            Some(quest.goal as i32),
        );
        let reward = self.catalog().get(quest.reward_card_id);
        match reward {
            Some(reward) => {
                let card = self.new_instance(Arc::clone(&reward), side);
                let reward_name = card.name().to_string();
                if self.add_to_hand(side, card) {
                    self.log(
                        LogKind::Quest,
                        Some(side),
                        format!("{} receives quest reward {}", side, reward_name),
                        Some(&quest.name),
                        None,
                    );
                }
            }
            None => {
                tracing::warn!(quest = %quest.name, reward = %quest.reward_card_id, "quest reward not in catalog");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, CardKind};
    use std::sync::Arc;

    fn quest(condition: QuestCondition, goal: u32) -> ActiveQuest {
        ActiveQuest {
            quest_id: 1,
            card_id: CardId::new(900),
            name: "Test Quest".into(),
            condition,
            current: 0,
            goal,
            reward_card_id: CardId::new(901),
            threshold: 5,
            tracked_name: None,
            completed: false,
            started_turn: 1,
            completed_turn: None,
        }
    }

    fn card(def: CardDefinition) -> CardInstance {
        CardInstance::new(crate::core::InstanceId::new(10), Arc::new(def), Side::Player)
    }

    #[test]
    fn test_taunt_quest_only_counts_played_taunts() {
        let q = quest(QuestCondition::PlayTauntMinions, 3);
        let taunt = card(CardDefinition::minion(1, "Shieldwall", 2, 1, 3).with_keywords(&[Keyword::Taunt]));
        let plain = card(CardDefinition::minion(2, "Thrall", 1, 1, 1));
        assert!(should_increment(&q, QuestAction::PlayMinion, &taunt));
        assert!(!should_increment(&q, QuestAction::SummonMinion, &taunt));
        assert!(!should_increment(&q, QuestAction::PlayMinion, &plain));
    }

    #[test]
    fn test_same_name_quest_tracks_first_name() {
        let mut q = quest(QuestCondition::PlayMinionsSameName, 2);
        let a = card(CardDefinition::minion(1, "Raven", 1, 1, 1));
        let b = card(CardDefinition::minion(2, "Wolf", 1, 1, 1));
        assert!(should_increment(&q, QuestAction::PlayMinion, &b));
        q.tracked_name = Some("Raven".into());
        assert!(should_increment(&q, QuestAction::PlayMinion, &a));
        assert!(!should_increment(&q, QuestAction::PlayMinion, &b));
    }

    #[test]
    fn test_attack_threshold_and_cost_one() {
        let q = quest(QuestCondition::SummonMinionsWithAttack, 2);
        assert!(should_increment(&q, QuestAction::SummonMinion, &card(CardDefinition::minion(1, "Giant", 6, 5, 5))));
        assert!(!should_increment(&q, QuestAction::SummonMinion, &card(CardDefinition::minion(2, "Imp", 1, 1, 1))));
        let q = quest(QuestCondition::PlayMinionsCost1, 2);
        assert!(should_increment(&q, QuestAction::PlayMinion, &card(CardDefinition::minion(2, "Imp", 1, 1, 1))));
    }

    #[test]
    fn test_generated_spell_quest() {
        let q = quest(QuestCondition::CastGeneratedSpells, 2);
        let mut spell = card(CardDefinition::new(CardId::new(3), "Rune", CardKind::Spell, 1));
        assert!(!should_increment(&q, QuestAction::CastSpell, &spell));
        spell.is_generated = true;
        assert!(should_increment(&q, QuestAction::CastSpell, &spell));
    }

    #[test]
    fn test_completed_quest_never_increments() {
        let mut q = quest(QuestCondition::Generic, 1);
        q.completed = true;
        assert!(!should_increment(&q, QuestAction::CastSpell, &card(CardDefinition::spell(4, "Spark", 1))));
    }
}
