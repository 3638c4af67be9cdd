/*
 * Variable Binder
 *
 * Markvar `alias.field` → candidate values under an instance context.
 *
 * # Resolution
 * For each op statement of the alias's entity whose call pattern has a hole
 * named `field`, and each bound call of that statement made on the context's
 * instance, the argument at the hole's position is read:
 * - constant (literal, or a reference with a single constant source) → value
 * - otherwise → opaque node (the referenced declaration when there is one)
 *
 * Candidates are deduplicated by value; the argument nodes are kept as
 * origins for finding ranges.
 */

use super::run_context::RunContext;
use crate::features::mark_evaluation::domain::{
    Binding, EvalValue, EvaluationError, InstanceContext, VariableContext,
};
use crate::features::rule_model::Rule;
use crate::shared::models::NodeId;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct VariableBinder<'r, 'g> {
    run: &'r RunContext<'g>,
}

impl<'r, 'g> VariableBinder<'r, 'g> {
    pub fn new(run: &'r RunContext<'g>) -> Self {
        Self { run }
    }

    /// Candidate bindings of `markvar` for the instance context
    pub fn candidates(
        &self,
        rule: &Rule,
        markvar: &str,
        instances: &InstanceContext,
    ) -> Result<Vec<Binding>, EvaluationError> {
        let (alias, field) = markvar
            .split_once('.')
            .filter(|(alias, field)| !alias.is_empty() && !field.is_empty())
            .ok_or_else(|| EvaluationError::MalformedMarkvar(markvar.to_string()))?;
        let entity_name = rule
            .entity_for(alias)
            .ok_or_else(|| EvaluationError::UnknownAlias(alias.to_string()))?;
        let entity = self
            .run
            .model
            .entity(entity_name)
            .ok_or_else(|| EvaluationError::UnknownEntity(entity_name.to_string()))?;
        let instance = instances
            .get(alias)
            .ok_or_else(|| EvaluationError::UnknownAlias(alias.to_string()))?;

        let graph = self.run.graph;
        let mut candidates: Vec<Binding> = Vec::new();
        for op in &entity.ops {
            let Some(bound) = self.run.bindings.get(&entity.name, &op.name) else {
                continue;
            };
            for (statement, calls) in op.statements.iter().zip(&bound.by_statement) {
                if statement.forbidden {
                    continue;
                }
                let Some(position) = statement.call.hole_index(field) else {
                    continue;
                };
                for &call in calls {
                    if self.run.receiver_instance(call) != Some(instance.node) {
                        continue;
                    }
                    let Some(&arg) = graph.arguments(call).get(position) else {
                        continue;
                    };
                    let value = self.value_of(arg);
                    match candidates.iter_mut().find(|c| c.value.equals(&value)) {
                        Some(existing) => existing.origins.push(arg),
                        None => candidates.push(Binding::from_node(value, arg)),
                    }
                }
            }
        }

        debug!(
            "{}: {} candidates for {} on {}",
            rule.name,
            candidates.len(),
            markvar,
            instance.node
        );
        Ok(candidates)
    }

    fn value_of(&self, arg: NodeId) -> EvalValue {
        let graph = self.run.graph;
        match graph.assigned_constant(arg) {
            Some(constant) => EvalValue::from(&constant),
            None => EvalValue::Node(graph.refers_to(arg).unwrap_or(arg)),
        }
    }

    /// Children of `parent` over the markvars of `vars` it does not bind yet
    pub fn expand(
        &self,
        rule: &Rule,
        vars: &BTreeSet<String>,
        instances: &InstanceContext,
        parent: &Arc<VariableContext>,
    ) -> Result<Vec<Arc<VariableContext>>, EvaluationError> {
        let bound = parent.keys();
        let candidates = vars
            .iter()
            .filter(|var| !bound.contains(*var))
            .map(|var| Ok((var.clone(), self.candidates(rule, var, instances)?)))
            .collect::<Result<Vec<_>, EvaluationError>>()?;

        for (var, values) in &candidates {
            if values.is_empty() {
                debug!("{}: no values for {} in {}", rule.name, var, instances);
            }
        }
        Ok(VariableContext::cartesian_product(parent, &candidates))
    }
}
