//! Hierarchical process, a stack of process layers.

use std::fmt;

use rand_core::RngCore;

use super::Process;
use crate::error::{EstimateError, Result};
use crate::models::{check_conditions, Variable, VariableKind};

/// A hierarchical process of layers L0..Ld.
///
/// Layers are chained top-down: the random variable of layer i-1 is the first condition variable of layer i.
/// Any further condition variables of a layer are controls. A flat control list is split into consecutive
/// chunks, one per layer in layer order, each the size of the layer's control arity.
///
/// The random variables of all layers for one time step are returned together, in layer order.
pub struct Hierarchical {
    layers: Vec<Box<dyn Process>>,
    // control arity of each layer
    arities: Vec<usize>,
    // control kinds of each layer
    control_kinds: Vec<Vec<VariableKind>>,
    // offset of each layer's controls in the flat control list
    offsets: Vec<usize>,
}

impl Hierarchical {
    /// Compose layers, top layer first.
    ///
    /// Fails if there are no layers or a layer's first condition variable is not of the kind of the layer above.
    pub fn new(layers: Vec<Box<dyn Process>>) -> Result<Hierarchical> {
        if layers.is_empty() {
            return Err(EstimateError::construction("hierarchical process without layers"));
        }
        let mut control_kinds = Vec::with_capacity(layers.len());
        for (i, layer) in layers.iter().enumerate() {
            let mut kinds = layer.condition_kinds();
            if i == 0 {
                control_kinds.push(kinds);
                continue;
            }
            let above = layers[i - 1].variable_kind();
            match kinds.first().copied() {
                Some(first) if first == above => control_kinds.push(kinds.split_off(1)),
                first => {
                    return Err(EstimateError::construction(format!(
                        "layer {} conditioned on {:?} below a layer of {:?}",
                        i, first, above
                    )))
                }
            }
        }
        let arities: Vec<usize> = control_kinds.iter().map(Vec::len).collect();
        let offsets = arities
            .iter()
            .scan(0, |offset, &arity| {
                let start = *offset;
                *offset += arity;
                Some(start)
            })
            .collect();
        log::debug!("hierarchical process of {} layers, control arities {:?}", layers.len(), arities);

        Ok(Hierarchical {
            layers,
            arities,
            control_kinds,
            offsets,
        })
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Control arity of each layer.
    pub fn arities(&self) -> &[usize] {
        &self.arities
    }

    /// Total number of controls taken by [`random`](Hierarchical::random).
    pub fn control_count(&self) -> usize {
        self.arities.iter().sum()
    }

    /// Kinds of the random variables of each layer.
    pub fn variable_kinds(&self) -> Vec<VariableKind> {
        self.layers.iter().map(|l| l.variable_kind()).collect()
    }

    pub fn process(&self, level: usize) -> Result<&dyn Process> {
        self.layers
            .get(level)
            .map(|l| &**l)
            .ok_or_else(|| no_level(level, self.depth()))
    }

    pub fn process_mut(&mut self, level: usize) -> Result<&mut dyn Process> {
        let depth = self.depth();
        let layer = self.layers.get_mut(level).ok_or_else(|| no_level(level, depth))?;
        let process: &mut dyn Process = &mut **layer;
        Ok(process)
    }

    /// The layer at `level` as its concrete type.
    pub fn layer<P: Process>(&self, level: usize) -> Result<&P> {
        self.process(level)?.as_any().downcast_ref::<P>().ok_or_else(|| {
            EstimateError::construction(format!(
                "layer {} is not a {}",
                level,
                std::any::type_name::<P>()
            ))
        })
    }

    /// Initialise every layer in order.
    pub fn initialize(&mut self, rng: &mut dyn RngCore) -> Result<Vec<Variable>> {
        self.layers.iter_mut().map(|l| l.initialize(rng)).collect()
    }

    /// Sample one time step of all layers.
    pub fn random(&mut self, controls: &[Variable], rng: &mut dyn RngCore) -> Result<Vec<Variable>> {
        self.check_controls(controls)?;
        let mut xs: Vec<Variable> = Vec::with_capacity(self.depth());
        for i in 0..self.layers.len() {
            let conditions = self.conditions(i, xs.last(), controls);
            let x = self.layers[i].random(&conditions, rng)?;
            xs.push(x);
        }
        Ok(xs)
    }

    /// Sample `n` time steps with the same controls each step.
    pub fn random_n(&mut self, n: usize, controls: &[Variable], rng: &mut dyn RngCore) -> Result<Vec<Vec<Variable>>> {
        (0..n).map(|_| self.random(controls, rng)).collect()
    }

    /// Joint likelihood of one time step of all layers.
    ///
    /// The product of each layer's likelihood of its variable given the variable of the layer above and its controls.
    pub fn likelihood(&mut self, xs: &[Variable], controls: &[Variable]) -> Result<f64> {
        if xs.len() != self.depth() {
            return Err(EstimateError::precondition(format!(
                "{} variables for a {} layer process",
                xs.len(),
                self.depth()
            )));
        }
        self.check_controls(controls)?;
        let mut lik = 1.;
        for i in 0..self.layers.len() {
            let above = if i == 0 { None } else { Some(&xs[i - 1]) };
            let conditions = self.conditions(i, above, controls);
            lik *= self.layers[i].likelihood(&xs[i], &conditions)?;
        }
        Ok(lik)
    }

    // Condition variables of layer i: the variable of the layer above followed by its controls
    fn conditions(&self, i: usize, above: Option<&Variable>, controls: &[Variable]) -> Vec<Variable> {
        let chunk = &controls[self.offsets[i]..self.offsets[i] + self.arities[i]];
        let mut conditions = Vec::with_capacity(chunk.len() + 1);
        if i > 0 {
            conditions.extend(above.cloned());
        }
        conditions.extend_from_slice(chunk);
        conditions
    }

    // Checks the count and kinds of every layer's controls before any layer is advanced
    fn check_controls(&self, controls: &[Variable]) -> Result<()> {
        if controls.len() != self.control_count() {
            return Err(EstimateError::precondition(format!(
                "{} controls for a process taking {}",
                controls.len(),
                self.control_count()
            )));
        }
        for (i, kinds) in self.control_kinds.iter().enumerate() {
            let chunk = &controls[self.offsets[i]..self.offsets[i] + self.arities[i]];
            check_conditions(kinds, chunk)?;
        }
        Ok(())
    }
}

fn no_level(level: usize, depth: usize) -> EstimateError {
    EstimateError::precondition(format!("level {} of a {} layer process", level, depth))
}

impl fmt::Debug for Hierarchical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchical")
            .field("variables", &self.variable_kinds())
            .field("arities", &self.arities)
            .finish()
    }
}
