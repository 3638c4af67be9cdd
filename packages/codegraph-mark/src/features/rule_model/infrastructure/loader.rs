/*
 * MARK Model Loader
 *
 * Loads an already-parsed MARK model from YAML or JSON.
 *
 * # Schema
 * ```yaml
 * entities:
 *   - name: Botan
 *     vars: [cipher, direction]
 *     ops:
 *       - name: create
 *         statements:
 *           - call: { name: Botan, params: [cipher, direction] }
 *       - name: init
 *         statements:
 *           - call: { name: Botan.set_key, params: ["_"] }
 * rules:
 *   - name: UseOfBotan_CipherMode
 *     using: [{ entity: Botan, alias: cm }]
 *     ensure:
 *       order:
 *         sequence:
 *           - op: { alias: cm, op: create }
 *           - op: { alias: cm, op: init }
 *     fail: WrongUseOfBotan_CipherMode
 * ```
 *
 * # Validation
 * - Entity names and rule names are unique (error)
 * - Operation names are unique within an entity (error)
 * - Order expressions name a single alias and at least one operation (error)
 * - `using` references an unknown entity (warning, rule is vacuous)
 * - Markvar/order alias not declared in `using` (warning)
 * - Order label not an operation of the aliased entity (warning)
 */

use crate::errors::{MarkError, Result};
use crate::features::rule_model::domain::{MarkModel, Rule};
use rustc_hash::FxHashSet;
use serde_yaml::with::singleton_map_recursive;
use std::path::Path;
use tracing::{debug, warn};

/// Model loader
pub struct MarkModelLoader;

impl MarkModelLoader {
    /// Load a model from YAML
    ///
    /// Expression variants are single-key maps (`order: { sequence: [...] }`),
    /// not YAML tags.
    pub fn from_yaml(yaml: &str) -> Result<MarkModel> {
        let model: MarkModel =
            singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))?;
        Self::validate(&model)?;
        Ok(model)
    }

    /// Load a model from JSON
    pub fn from_json(json: &str) -> Result<MarkModel> {
        let model: MarkModel = serde_json::from_str(json)?;
        Self::validate(&model)?;
        Ok(model)
    }

    /// Load a model from a file; `.json` is read as JSON, anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<MarkModel> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        debug!("Loading MARK model from {}", path.display());
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Structural validation; hard errors abort loading, the rest is logged
    pub fn validate(model: &MarkModel) -> Result<()> {
        let mut seen = FxHashSet::default();
        for entity in model.entities() {
            if !seen.insert(entity.name.as_str()) {
                return Err(MarkError::model(format!(
                    "duplicate entity '{}'",
                    entity.name
                )));
            }
            let mut ops = FxHashSet::default();
            for op in &entity.ops {
                if !ops.insert(op.name.as_str()) {
                    return Err(MarkError::model(format!(
                        "duplicate operation '{}' in entity '{}'",
                        op.name, entity.name
                    )));
                }
            }
        }

        let mut rules = FxHashSet::default();
        for rule in model.rules() {
            if !rules.insert(rule.name.as_str()) {
                return Err(MarkError::model(format!("duplicate rule '{}'", rule.name)));
            }
            Self::validate_rule(model, rule)?;
        }

        debug!(
            "MARK model valid: {} entities, {} rules",
            model.entities().len(),
            model.rules().len()
        );
        Ok(())
    }

    fn validate_rule(model: &MarkModel, rule: &Rule) -> Result<()> {
        for aliased in &rule.using {
            if model.entity(&aliased.entity).is_none() {
                warn!(
                    "Rule '{}' uses unknown entity '{}' as '{}'",
                    rule.name, aliased.entity, aliased.alias
                );
            }
        }

        for alias in rule.undeclared_aliases() {
            warn!("Rule '{}' references undeclared alias '{}'", rule.name, alias);
        }

        let mut orders = rule.ensure.orders();
        if let Some(when) = &rule.when {
            orders.extend(when.orders());
        }
        for order in orders {
            let alias = order.base_alias().map_err(|e| {
                MarkError::model(format!("rule '{}': {}", rule.name, e))
            })?;
            let Some(entity) = rule.entity_for(alias).and_then(|name| model.entity(name)) else {
                continue;
            };
            for label in order.labels() {
                if entity.op(&label).is_none() {
                    warn!(
                        "Rule '{}' orders '{}' which is not an operation of entity '{}'",
                        rule.name, label, entity.name
                    );
                }
            }
        }
        Ok(())
    }
}
