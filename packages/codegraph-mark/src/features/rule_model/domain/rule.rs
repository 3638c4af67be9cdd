/*
 * MARK Rules
 *
 * ```text
 * rule UseOfBotan_CipherMode {
 *   using Botan as cm
 *   when _split(cm.cipher, "/", 0) == "AES"
 *   ensure order cm.create(), cm.init(), (cm.start(), cm.finish())+
 *   onfail WrongUseOfBotan_CipherMode
 * }
 * ```
 */

use super::expression::Expression;
use serde::{Deserialize, Serialize};

/// `using <entity> as <alias>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasedEntity {
    pub alias: String,
    pub entity: String,
}

impl AliasedEntity {
    pub fn new(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            entity: entity.into(),
        }
    }
}

/// A MARK rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub using: Vec<AliasedEntity>,

    /// Precondition; `ensure` is only checked where it holds
    #[serde(default)]
    pub when: Option<Expression>,

    pub ensure: Expression,

    /// Message attached to violations
    #[serde(default)]
    pub fail: String,
}

impl Rule {
    pub fn new(name: impl Into<String>, ensure: Expression) -> Self {
        Self {
            name: name.into(),
            using: Vec::new(),
            when: None,
            ensure,
            fail: String::new(),
        }
    }

    pub fn using(mut self, entity: impl Into<String>, alias: impl Into<String>) -> Self {
        self.using.push(AliasedEntity::new(entity, alias));
        self
    }

    pub fn when(mut self, condition: Expression) -> Self {
        self.when = Some(condition);
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.fail = message.into();
        self
    }

    /// Entity name bound to `alias`
    pub fn entity_for(&self, alias: &str) -> Option<&str> {
        self.using
            .iter()
            .find(|a| a.alias == alias)
            .map(|a| a.entity.as_str())
    }

    /// Aliases referenced by markvars or orders but not declared in `using`
    pub fn undeclared_aliases(&self) -> Vec<String> {
        let mut referenced = self.ensure.vars();
        if let Some(when) = &self.when {
            when.collect_vars(&mut referenced);
        }
        let mut aliases: Vec<String> = referenced
            .iter()
            .filter_map(|var| var.split_once('.').map(|(alias, _)| alias.to_string()))
            .collect();
        for order in self.ensure.orders() {
            if let Ok(alias) = order.base_alias() {
                aliases.push(alias.to_string());
            }
        }
        aliases.sort();
        aliases.dedup();
        aliases.retain(|alias| self.entity_for(alias).is_none());
        aliases
    }
}
