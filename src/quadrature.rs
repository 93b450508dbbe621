//! Quadrature keys, rules and the rule cache.
use crate::element::ElementType;
use crate::error::JacobianError;
use crate::nalgebra::Point3;
use crate::reference::{LagrangeReference, ReferenceRuleProvider};
use itertools::izip;
use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Families of quadrature rules.
///
/// The calculators never look at the family; it only selects which points and weights the
/// reference library produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuadratureFamily {
    Gauss,
    GaussLobatto,
    Grid,
}

/// Polynomial order, used both for quadrature strength and for the order of a Lagrange basis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order(pub u32);

impl Order {
    pub const CONSTANT: Order = Order(0);
    pub const FIRST: Order = Order(1);
    pub const SECOND: Order = Order(2);
    pub const THIRD: Order = Order(3);

    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a quadrature rule on a reference element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuadratureKey {
    pub element_type: ElementType,
    pub family: QuadratureFamily,
    pub order: Order,
}

impl QuadratureKey {
    pub fn new(element_type: ElementType, family: QuadratureFamily, order: Order) -> Self {
        Self {
            element_type,
            family,
            order,
        }
    }

    pub fn reference_dim(&self) -> usize {
        self.element_type.reference_dim()
    }
}

impl Display for QuadratureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?}, order {})", self.element_type, self.family, self.order)
    }
}

/// A point in reference coordinates. Components beyond the reference dimension are zero.
pub type ReferencePoint = Point3<f64>;

/// Reference points and strictly positive weights of a quadrature rule.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    reference_dim: usize,
    weights: Vec<f64>,
    points: Vec<ReferencePoint>,
}

impl QuadratureRule {
    /// # Panics
    ///
    /// Panics if the number of weights and points differ, if a weight is not positive or if
    /// a point has non-zero components beyond `reference_dim`.
    pub fn new(reference_dim: usize, weights: Vec<f64>, points: Vec<ReferencePoint>) -> Self {
        assert!((1..=3).contains(&reference_dim), "reference dimension must be 1, 2 or 3");
        assert_eq!(weights.len(), points.len(), "every quadrature point needs exactly one weight");
        assert!(weights.iter().all(|&w| w > 0.0), "quadrature weights must be positive");
        assert!(
            points
                .iter()
                .all(|p| p.coords.iter().skip(reference_dim).all(|&x| x == 0.0)),
            "reference points must be padded with zeros"
        );
        Self {
            reference_dim,
            weights,
            points,
        }
    }

    pub fn from_rule1d((weights, points): jxw_quadrature::Rule1d) -> Self {
        let points = points.into_iter().map(|[x]| Point3::new(x, 0.0, 0.0)).collect();
        Self::new(1, weights, points)
    }

    pub fn from_rule2d((weights, points): jxw_quadrature::Rule2d) -> Self {
        let points = points.into_iter().map(|[x, y]| Point3::new(x, y, 0.0)).collect();
        Self::new(2, weights, points)
    }

    pub fn from_rule3d((weights, points): jxw_quadrature::Rule3d) -> Self {
        let points = points.into_iter().map(Point3::from).collect();
        Self::new(3, weights, points)
    }

    pub fn reference_dim(&self) -> usize {
        self.reference_dim
    }

    /// The number of quadrature points.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (&f64, &ReferencePoint)> {
        izip!(&self.weights, &self.points)
    }

    /// Approximates the integral of `f` over the reference element.
    pub fn integrate(&self, f: impl Fn(&ReferencePoint) -> f64) -> f64 {
        self.iter().map(|(w, xi)| w * f(xi)).sum()
    }
}

/// Memoising map from quadrature keys to rules.
///
/// The provider is consulted once per distinct key. The cache can be shared between
/// threads, so that per-thread registries do not rebuild the same rules.
#[derive(Debug)]
pub struct QuadratureCache<P = LagrangeReference> {
    provider: P,
    rules: RwLock<FxHashMap<QuadratureKey, Arc<QuadratureRule>>>,
}

impl Default for QuadratureCache<LagrangeReference> {
    fn default() -> Self {
        Self::with_provider(LagrangeReference)
    }
}

impl QuadratureCache<LagrangeReference> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P> QuadratureCache<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            rules: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The number of rules materialised so far.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}

impl<P: ReferenceRuleProvider> QuadratureCache<P> {
    pub fn rule(&self, key: QuadratureKey) -> Result<Arc<QuadratureRule>, JacobianError> {
        if let Some(rule) = self.rules.read().get(&key) {
            return Ok(Arc::clone(rule));
        }

        let rule = Arc::new(self.provider.rule(key)?);
        debug!("Materialised quadrature rule {} with {} points", key, rule.len());
        // Another thread may have raced us here, in which case its rule wins
        let mut rules = self.rules.write();
        Ok(Arc::clone(rules.entry(key).or_insert(rule)))
    }
}
