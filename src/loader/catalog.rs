//! Card catalog
//!
//! Immutable card definitions keyed by id, loaded from a JSON array. Entries
//! without the identity fields (`id`, `name`, `type`) or with malformed
//! optional fields are skipped and reported instead of failing the load.

use crate::core::{CardDefinition, CardId, Effect, EffectSlot};
use crate::{EngineError, Result};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Id of the built-in coin given to the second player
pub const THE_COIN_ID: u32 = 10000;

/// Why one catalog entry was not loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the source array
    pub index: usize,
    pub id: Option<u64>,
    pub reason: String,
}

/// Outcome of loading a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedEntry>,
    /// `(card name, effect type)` for descriptors that will be no-ops
    pub unknown_effects: Vec<(String, String)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.unknown_effects.is_empty()
    }

    /// Every problem as a `DataError`
    pub fn errors(&self) -> Vec<EngineError> {
        let skipped = self.skipped.iter().map(|s| {
            EngineError::DataError(format!("entry {} skipped: {}", s.index, s.reason))
        });
        let unknown = self.unknown_effects.iter().map(|(card, ty)| {
            EngineError::DataError(format!("{card}: unknown effect type '{ty}'"))
        });
        skipped.chain(unknown).collect()
    }
}

/// Static collection of card definitions
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: FxHashMap<CardId, Arc<CardDefinition>>,
    /// Insertion order, so iteration is deterministic
    order: Vec<CardId>,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; returns false if the id is already taken
    pub fn insert(&mut self, definition: CardDefinition) -> bool {
        let id = definition.id;
        if self.cards.contains_key(&id) {
            return false;
        }
        self.cards.insert(id, Arc::new(definition));
        self.order.push(id);
        true
    }

    pub fn get(&self, id: CardId) -> Option<Arc<CardDefinition>> {
        self.cards.get(&id).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<CardDefinition>> {
        self.iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Definitions in load order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CardDefinition>> {
        self.order.iter().filter_map(|id| self.cards.get(id))
    }

    pub fn collectible(&self) -> impl Iterator<Item = &Arc<CardDefinition>> {
        self.iter().filter(|def| def.collectible)
    }

    /// The coin from the catalog, or the built-in one
    pub fn coin(&self) -> Arc<CardDefinition> {
        self.get(CardId::new(THE_COIN_ID))
            .unwrap_or_else(|| Arc::new(builtin_coin()))
    }

    /// Parse a JSON array of definitions
    ///
    /// Fails only when the document itself is not an array; bad entries end
    /// up in the report.
    pub fn from_json_str(json: &str) -> Result<(Self, LoadReport)> {
        let raw: Value = serde_json::from_str(json)?;
        let Value::Array(entries) = raw else {
            return Err(EngineError::DataError(
                "catalog must be a JSON array of card definitions".to_string(),
            ));
        };
        let mut catalog = CardCatalog::new();
        let mut report = LoadReport::default();
        for (index, entry) in entries.into_iter().enumerate() {
            let id = entry.get("id").and_then(Value::as_u64);
            let missing: Vec<&str> = ["id", "name", "type"]
                .into_iter()
                .filter(|field| entry.get(*field).map_or(true, Value::is_null))
                .collect();
            if !missing.is_empty() {
                let reason = format!("missing {}", missing.join(", "));
                tracing::warn!(index, ?id, %reason, "skipping catalog entry");
                report.skipped.push(SkippedEntry { index, id, reason });
                continue;
            }
            let definition: CardDefinition = match serde_json::from_value(entry) {
                Ok(def) => def,
                Err(e) => {
                    let reason = format!("malformed entry: {e}");
                    tracing::warn!(index, ?id, %reason, "skipping catalog entry");
                    report.skipped.push(SkippedEntry { index, id, reason });
                    continue;
                }
            };
            for ty in unknown_effect_types(&definition) {
                tracing::warn!(card = %definition.name, effect_type = %ty, "unknown effect type in catalog");
                report.unknown_effects.push((definition.name.clone(), ty));
            }
            let name = definition.name.clone();
            if !catalog.insert(definition) {
                let reason = format!("duplicate id for '{name}'");
                tracing::warn!(index, ?id, %reason, "skipping catalog entry");
                report.skipped.push(SkippedEntry { index, id, reason });
                continue;
            }
            report.loaded += 1;
        }
        Ok((catalog, report))
    }

    pub fn load_from_file(path: &Path) -> Result<(Self, LoadReport)> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Load a catalog file without blocking the runtime
    pub async fn load_async(path: &Path) -> Result<(Self, LoadReport)> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&text)
    }
}

fn builtin_coin() -> CardDefinition {
    let mut coin = CardDefinition::spell(THE_COIN_ID, "The Coin", 0);
    coin.description = "Gain 1 Mana Crystal this turn only.".to_string();
    coin.spell_effects = vec![Effect::GainMana { amount: 1 }.into()];
    coin.collectible = false;
    coin
}

fn collect_unknown(slots: &[EffectSlot], out: &mut Vec<String>) {
    for slot in slots {
        match slot {
            EffectSlot::Unrecognized(_) => out.push(slot.type_name().to_string()),
            EffectSlot::Known(Effect::Conditional { effects, .. })
            | EffectSlot::Known(Effect::SpendCounter { effects, .. }) => collect_unknown(effects, out),
            EffectSlot::Known(_) => {}
        }
    }
}

fn unknown_effect_types(def: &CardDefinition) -> Vec<String> {
    let mut out = Vec::new();
    collect_unknown(&def.battlecry, &mut out);
    collect_unknown(&def.deathrattle, &mut out);
    collect_unknown(&def.spell_effects, &mut out);
    for triggered in &def.triggers {
        collect_unknown(&triggered.effects, &mut out);
    }
    out
}
