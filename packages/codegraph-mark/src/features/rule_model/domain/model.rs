/*
 * MarkModel - entities + rules of one MARK rule set
 */

use super::entity::Entity;
use super::rule::Rule;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Serialized shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawModel {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    rules: Vec<Rule>,
}

/// Immutable rule model, shared read-only by a pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawModel", into = "RawModel")]
pub struct MarkModel {
    entities: Vec<Entity>,
    rules: Vec<Rule>,
    entity_index: FxHashMap<String, usize>,
}

impl From<RawModel> for MarkModel {
    fn from(raw: RawModel) -> Self {
        Self::new(raw.entities, raw.rules)
    }
}

impl From<MarkModel> for RawModel {
    fn from(model: MarkModel) -> Self {
        RawModel {
            entities: model.entities,
            rules: model.rules,
        }
    }
}

impl MarkModel {
    /// Build a model; on duplicate entity names the first one wins lookups
    pub fn new(entities: Vec<Entity>, rules: Vec<Rule>) -> Self {
        let mut entity_index = FxHashMap::default();
        for (idx, entity) in entities.iter().enumerate() {
            entity_index.entry(entity.name.clone()).or_insert(idx);
        }
        Self {
            entities,
            rules,
            entity_index,
        }
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entity_index.get(name).map(|&idx| &self.entities[idx])
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }
}
