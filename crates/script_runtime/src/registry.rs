// Template Registry - Stores node templates and their evaluation functions
//
// The registry is the closed catalog of node blueprints. It is filled once at
// startup and consulted whenever a graph stamps out a node.

use std::collections::HashMap;
use std::sync::Arc;

use script_types::{PortDef, PortType, TemplateKind, Value, port_types};

use super::executor::{EvalContext, NodeOutput};

// ─────────────────────────────────────────────────────────────────────────────
// Node Evaluator Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluation behaviour of a template
pub trait NodeEvaluator: Send + Sync {
    /// Compute one result per output port from resolved inputs
    fn evaluate(&self, inputs: &[Value], ctx: &mut EvalContext<'_>) -> NodeOutput;
}

/// Function-based evaluator (every built-in template uses one)
pub struct FnEvaluator<F>
where
    F: Fn(&[Value], &mut EvalContext<'_>) -> NodeOutput + Send + Sync,
{
    func: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&[Value], &mut EvalContext<'_>) -> NodeOutput + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> NodeEvaluator for FnEvaluator<F>
where
    F: Fn(&[Value], &mut EvalContext<'_>) -> NodeOutput + Send + Sync,
{
    fn evaluate(&self, inputs: &[Value], ctx: &mut EvalContext<'_>) -> NodeOutput {
        (self.func)(inputs, ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Template
// ─────────────────────────────────────────────────────────────────────────────

/// Blueprint for a node.
///
/// One record for every kind; `evaluator` is absent for event and constant
/// templates, `internals`/`defaults` are empty for plain and event templates.
#[derive(Clone)]
pub struct NodeTemplate {
    pub category: String,
    pub name: String,
    pub kind: TemplateKind,
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
    pub internals: Vec<PortDef>,
    /// Seed values for `internals`, same length
    pub defaults: Vec<Value>,
    pub evaluator: Option<Arc<dyn NodeEvaluator>>,
    /// Internal configuration is surfaced as a tunable parameter
    pub exported: bool,
}

impl std::fmt::Debug for NodeTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTemplate")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("internals", &self.internals)
            .field("defaults", &self.defaults)
            .field("exported", &self.exported)
            .finish_non_exhaustive()
    }
}

impl NodeTemplate {
    pub fn input_types(&self) -> Vec<PortType> {
        port_types(&self.inputs)
    }

    /// Zero value for every output port
    pub fn zero_outputs(&self) -> Vec<Value> {
        self.outputs.iter().map(|p| p.port_type.zero_value()).collect()
    }

    /// Position of an internal port by name
    pub fn internal_index(&self, name: &str) -> Option<usize> {
        self.internals.iter().position(|p| p.name == name)
    }

    pub fn is_event(&self) -> bool {
        self.kind == TemplateKind::Event
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Template Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of all available node templates
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<NodeTemplate>>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in catalog
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::catalog::register_builtin_templates(&mut registry);
        registry
    }

    /// Insert a template; an existing template with the same name is replaced
    pub fn register(&mut self, template: NodeTemplate) {
        let name = template.name.clone();
        if self.templates.insert(name.clone(), Arc::new(template)).is_some() {
            tracing::debug!(template = %name, "Replaced existing template");
        } else {
            tracing::debug!(template = %name, "Registered template");
        }
    }

    pub fn register_plain<F>(
        &mut self,
        category: &str,
        name: &str,
        inputs: Vec<PortDef>,
        outputs: Vec<PortDef>,
        evaluate: F,
        exported: bool,
    ) where
        F: Fn(&[Value], &mut EvalContext<'_>) -> NodeOutput + Send + Sync + 'static,
    {
        self.register(NodeTemplate {
            category: category.to_string(),
            name: name.to_string(),
            kind: TemplateKind::Plain,
            inputs,
            outputs,
            internals: Vec::new(),
            defaults: Vec::new(),
            evaluator: Some(Arc::new(FnEvaluator::new(evaluate))),
            exported,
        });
    }

    /// Event templates have no inputs and no evaluation; the dispatcher binds
    /// their outputs when it fires them.
    pub fn register_event(&mut self, category: &str, name: &str, outputs: Vec<PortDef>) {
        self.register(NodeTemplate {
            category: category.to_string(),
            name: name.to_string(),
            kind: TemplateKind::Event,
            inputs: Vec::new(),
            outputs,
            internals: Vec::new(),
            defaults: Vec::new(),
            evaluator: None,
            exported: false,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn register_internal<F>(
        &mut self,
        category: &str,
        name: &str,
        inputs: Vec<PortDef>,
        internals: Vec<PortDef>,
        defaults: Vec<Value>,
        outputs: Vec<PortDef>,
        evaluate: F,
        exported: bool,
    ) where
        F: Fn(&[Value], &mut EvalContext<'_>) -> NodeOutput + Send + Sync + 'static,
    {
        let defaults = normalize_defaults(name, &internals, defaults);
        self.register(NodeTemplate {
            category: category.to_string(),
            name: name.to_string(),
            kind: TemplateKind::Internal,
            inputs,
            outputs,
            internals,
            defaults,
            evaluator: Some(Arc::new(FnEvaluator::new(evaluate))),
            exported,
        });
    }

    /// Constant templates use `ports` both as internal settings and outputs
    pub fn register_constant(
        &mut self,
        category: &str,
        name: &str,
        ports: Vec<PortDef>,
        defaults: Vec<Value>,
        exported: bool,
    ) {
        let defaults = normalize_defaults(name, &ports, defaults);
        self.register(NodeTemplate {
            category: category.to_string(),
            name: name.to_string(),
            kind: TemplateKind::Constant,
            inputs: Vec::new(),
            outputs: ports.clone(),
            internals: ports,
            defaults,
            evaluator: None,
            exported,
        });
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<NodeTemplate>> {
        self.templates.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// All registered names, sorted
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.templates.keys().cloned().collect();
        names.sort();
        names
    }

    /// Templates in a category, sorted by name
    pub fn templates_in_category(&self, category: &str) -> Vec<Arc<NodeTemplate>> {
        let mut found: Vec<_> = self
            .templates
            .values()
            .filter(|t| t.category == category)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// All categories, sorted and deduplicated
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<_> = self.templates.values().map(|t| t.category.clone()).collect();
        cats.sort();
        cats.dedup();
        cats
    }

    pub fn templates(&self) -> impl Iterator<Item = &Arc<NodeTemplate>> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Keep `defaults` parallel to `internals`
fn normalize_defaults(name: &str, internals: &[PortDef], mut defaults: Vec<Value>) -> Vec<Value> {
    if defaults.len() != internals.len() {
        tracing::warn!(
            template = %name,
            internals = internals.len(),
            defaults = defaults.len(),
            "Default value count does not match internal ports"
        );
        defaults.truncate(internals.len());
        for port in &internals[defaults.len()..] {
            defaults.push(port.port_type.zero_value());
        }
    }
    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use script_types::port;

    #[test]
    fn test_empty_registry() {
        let registry = TemplateRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list_names().is_empty());
    }

    #[test]
    fn test_register_plain() {
        let mut registry = TemplateRegistry::new();
        registry.register_plain(
            "math",
            "Negate",
            vec![port("x", PortType::Number)],
            vec![port("-x", PortType::Number)],
            |inputs, _| NodeOutput::active([-inputs[0].as_f64().unwrap_or(0.0)]),
            false,
        );

        let template = registry.get("Negate").unwrap();
        assert_eq!(template.kind, TemplateKind::Plain);
        assert_eq!(template.input_types(), vec![PortType::Number]);
        assert!(template.evaluator.is_some());
        assert!(!template.exported);
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let mut registry = TemplateRegistry::new();
        registry.register_event("event", "OnThing", vec![]);
        registry.register_event("input", "OnThing", vec![port("x", PortType::Int)]);

        assert_eq!(registry.len(), 1);
        let template = registry.get("OnThing").unwrap();
        assert_eq!(template.category, "input");
        assert_eq!(template.outputs.len(), 1);
    }

    #[test]
    fn test_constant_ports_are_internal_and_output() {
        let mut registry = TemplateRegistry::new();
        registry.register_constant(
            "math",
            "ConstPair",
            vec![port("a", PortType::Int), port("b", PortType::String)],
            vec![Value::from(1)],
            false,
        );

        let template = registry.get("ConstPair").unwrap();
        assert!(template.inputs.is_empty());
        assert_eq!(template.outputs, template.internals);
        // short defaults padded with zero values
        assert_eq!(template.defaults, vec![Value::from(1), Value::from("")]);
    }

    #[test]
    fn test_names_and_categories_sorted() {
        let mut registry = TemplateRegistry::new();
        registry.register_event("event", "OnTick", vec![]);
        registry.register_constant(
            "math",
            "ConstInt",
            vec![port("int", PortType::Int)],
            vec![Value::from(0)],
            false,
        );
        registry.register_event("event", "OnCollide", vec![]);

        assert_eq!(registry.list_names(), vec!["ConstInt", "OnCollide", "OnTick"]);
        assert_eq!(registry.categories(), vec!["event", "math"]);
        let events: Vec<_> = registry
            .templates_in_category("event")
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(events, vec!["OnCollide", "OnTick"]);
    }
}
