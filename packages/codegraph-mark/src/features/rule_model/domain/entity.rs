/*
 * Entities, Operations and Call Patterns
 *
 * # Example (MARK)
 * ```text
 * entity Botan {
 *   var cipher;
 *   var direction;
 *   op create { Botan(cipher, direction); }
 *   op init   { Botan.set_key(_); }
 *   op start  { Botan.start(*); }
 *   op finish { Botan.finish(_); }
 *   op bad    { forbidden Botan.set_key(_, _); }
 * }
 * ```
 *
 * Parameter syntax:
 * - `_`               : wildcard, matches any single argument
 * - `*`               : spread, matches all remaining arguments
 * - `name`            : hole, matches any argument and binds field `name`
 * - `name: Type`      : typed hole, argument type must be `Type` when known
 * - `"lit"`, `42`, `true`, `1.5` : literal, matched by constant equality
 */

use crate::shared::models::ConstValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Parameter of a call pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Param {
    Wildcard,
    Spread,
    Hole {
        name: String,
        type_name: Option<String>,
    },
    Literal(ConstValue),
}

/// Malformed call-pattern parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid call pattern parameter '{param}': {reason}")]
pub struct ParamParseError {
    pub param: String,
    pub reason: String,
}

impl Param {
    pub fn hole(name: impl Into<String>) -> Self {
        Param::Hole {
            name: name.into(),
            type_name: None,
        }
    }

    pub fn typed_hole(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Param::Hole {
            name: name.into(),
            type_name: Some(type_name.into()),
        }
    }

    pub fn literal(value: impl Into<ConstValue>) -> Self {
        Param::Literal(value.into())
    }

    /// Field bound by this parameter, if it is a hole
    pub fn bound_var(&self) -> Option<&str> {
        match self {
            Param::Hole { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

impl FromStr for Param {
    type Err = ParamParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let err = |reason: &str| ParamParseError {
            param: raw.to_string(),
            reason: reason.to_string(),
        };

        match s {
            "" => return Err(err("empty parameter")),
            "_" => return Ok(Param::Wildcard),
            "*" | "..." => return Ok(Param::Spread),
            "true" => return Ok(Param::Literal(ConstValue::Bool(true))),
            "false" => return Ok(Param::Literal(ConstValue::Bool(false))),
            _ => {}
        }

        for quote in ['"', '\''] {
            if s.starts_with(quote) {
                return if s.len() >= 2 && s.ends_with(quote) {
                    Ok(Param::Literal(ConstValue::Str(s[1..s.len() - 1].to_string())))
                } else {
                    Err(err("unterminated string literal"))
                };
            }
        }

        if let Ok(i) = s.parse::<i64>() {
            return Ok(Param::Literal(ConstValue::Int(i)));
        }
        if s.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return s
                .parse::<f64>()
                .map(|f| Param::Literal(ConstValue::Float(f)))
                .map_err(|_| err("malformed number"));
        }

        if let Some((name, type_name)) = s.split_once(':') {
            let (name, type_name) = (name.trim(), type_name.trim());
            if !is_identifier(name) || !is_identifier(type_name) {
                return Err(err("typed hole must be 'name: Type'"));
            }
            return Ok(Param::typed_hole(name, type_name));
        }

        if is_identifier(s) {
            Ok(Param::hole(s))
        } else {
            Err(err("expected '_', '*', a literal or an identifier"))
        }
    }
}

impl TryFrom<String> for Param {
    type Error = ParamParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Param> for String {
    fn from(param: Param) -> Self {
        param.to_string()
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Wildcard => write!(f, "_"),
            Param::Spread => write!(f, "*"),
            Param::Hole {
                name,
                type_name: None,
            } => write!(f, "{}", name),
            Param::Hole {
                name,
                type_name: Some(t),
            } => write!(f, "{}: {}", name, t),
            Param::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// Call pattern: callee name + parameter shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallPattern {
    /// Simple (`init`) or qualified (`Botan.init`) callee name
    pub name: String,

    #[serde(default)]
    pub params: Vec<Param>,
}

impl CallPattern {
    pub fn new(name: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Build from textual parameters (`["cipher", "_", "*"]`)
    pub fn parse(name: impl Into<String>, params: &[&str]) -> Result<Self, ParamParseError> {
        let params = params
            .iter()
            .map(|p| p.parse())
            .collect::<Result<Vec<Param>, _>>()?;
        Ok(Self::new(name, params))
    }

    /// Argument position bound to field `var`
    pub fn hole_index(&self, var: &str) -> Option<usize> {
        self.params.iter().position(|p| p.bound_var() == Some(var))
    }
}

impl std::fmt::Display for CallPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// One call statement of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpStatement {
    pub call: CallPattern,

    /// Any call matching this statement is a violation
    #[serde(default)]
    pub forbidden: bool,
}

impl OpStatement {
    pub fn new(call: CallPattern) -> Self {
        Self {
            call,
            forbidden: false,
        }
    }

    pub fn forbidden(call: CallPattern) -> Self {
        Self {
            call,
            forbidden: true,
        }
    }
}

/// Named lifecycle action of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub statements: Vec<OpStatement>,
}

impl Operation {
    pub fn new(name: impl Into<String>, statements: Vec<OpStatement>) -> Self {
        Self {
            name: name.into(),
            statements,
        }
    }

    /// Operation backed by plain (non-forbidden) call patterns
    pub fn with_calls(name: impl Into<String>, calls: Vec<CallPattern>) -> Self {
        Self::new(name, calls.into_iter().map(OpStatement::new).collect())
    }
}

/// Abstract API role with a lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    /// Declared fields, bound through call-pattern holes
    #[serde(default)]
    pub vars: Vec<String>,

    #[serde(default)]
    pub ops: Vec<Operation>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn with_var(mut self, var: impl Into<String>) -> Self {
        self.vars.push(var.into());
        self
    }

    pub fn with_op(mut self, op: Operation) -> Self {
        self.ops.push(op);
        self
    }

    pub fn op(&self, name: &str) -> Option<&Operation> {
        self.ops.iter().find(|op| op.name == name)
    }

    pub fn has_var(&self, var: &str) -> bool {
        self.vars.iter().any(|v| v == var)
    }
}
