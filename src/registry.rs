//! Registries that build calculators on demand and keep them for reuse.
use crate::calculator::{
    AffineTet4, AffineTriangle3, BilinearQuad4, BiquadraticQuad9, CalculatorKernel, JacobianCalculator,
    LagrangeJacobianCalculator,
};
use crate::element::{Element, ElementType};
use crate::error::JacobianError;
use crate::quadrature::{QuadratureCache, QuadratureKey};
use crate::reference::{LagrangeReference, ReferenceRuleProvider};
use log::{debug, trace};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use thread_local::ThreadLocal;

/// Owns one [`JacobianCalculator`] per quadrature key, for elements in a fixed spatial
/// dimension.
///
/// Calculators are built on first use. Closed-form kernels are chosen where one exists for
/// the element type and spatial dimension:
///
/// | Element type | Spatial dimension | Kernel                |
/// |--------------|-------------------|-----------------------|
/// | `Tri3`       | 2                 | [`AffineTriangle3`]   |
/// | `Tet4`       | 3                 | [`AffineTet4`]        |
/// | `Quad4`      | 2                 | [`BilinearQuad4`]     |
/// | `Quad9`      | 2                 | [`BiquadraticQuad9`], if the rule is the tensor product of the provider's 1D factor |
///
/// Everything else uses [`LagrangeJacobianCalculator`].
#[derive(Debug)]
pub struct CalculatorRegistry<P = LagrangeReference> {
    spatial_dim: usize,
    quadrature: Arc<QuadratureCache<P>>,
    calculators: FxHashMap<QuadratureKey, JacobianCalculator>,
}

impl CalculatorRegistry<LagrangeReference> {
    pub fn new(spatial_dim: usize) -> Self {
        Self::with_quadrature_cache(spatial_dim, Arc::new(QuadratureCache::new()))
    }
}

impl<P> CalculatorRegistry<P> {
    pub fn with_provider(spatial_dim: usize, provider: P) -> Self {
        Self::with_quadrature_cache(spatial_dim, Arc::new(QuadratureCache::with_provider(provider)))
    }

    /// Creates a registry that obtains its rules from a (possibly shared) cache.
    pub fn with_quadrature_cache(spatial_dim: usize, quadrature: Arc<QuadratureCache<P>>) -> Self {
        Self {
            spatial_dim,
            quadrature,
            calculators: FxHashMap::default(),
        }
    }

    pub fn spatial_dim(&self) -> usize {
        self.spatial_dim
    }

    pub fn quadrature_cache(&self) -> &Arc<QuadratureCache<P>> {
        &self.quadrature
    }

    /// The number of calculators built so far.
    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}

impl<P: ReferenceRuleProvider> CalculatorRegistry<P> {
    /// Returns the calculator for `key`, building it if necessary.
    ///
    /// # Errors
    ///
    /// Construction errors are returned unchanged and nothing is cached, so a later call
    /// with the same key fails the same way.
    pub fn get(&mut self, key: QuadratureKey) -> Result<&mut JacobianCalculator, JacobianError> {
        match self.calculators.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let kernel = build_kernel(&self.quadrature, key, self.spatial_dim)?;
                debug!(
                    "Built {} Jacobian calculator for {} in {} dimensions",
                    kernel.name(),
                    key,
                    self.spatial_dim
                );
                Ok(entry.insert(JacobianCalculator::new(kernel)))
            }
        }
    }

    /// Computes `JxW` for `element` with the calculator for `key`.
    pub fn jxw<E>(&mut self, key: QuadratureKey, element: &E) -> Result<&[f64], JacobianError>
    where
        E: Element + ?Sized,
    {
        self.get(key)?.jxw(element)
    }
}

fn build_kernel<P: ReferenceRuleProvider>(
    quadrature: &QuadratureCache<P>,
    key: QuadratureKey,
    spatial_dim: usize,
) -> Result<CalculatorKernel, JacobianError> {
    use ElementType::*;
    let rule = quadrature.rule(key)?;
    let provider = quadrature.provider();
    let kernel = match (key.element_type, spatial_dim) {
        (Tri3, 2) => AffineTriangle3::new(key, rule)?.into(),
        (Tet4, 3) => AffineTet4::new(key, rule)?.into(),
        (Quad4, 2) => BilinearQuad4::new(key, rule)?.into(),
        (Quad9, 2) => {
            let quad9 = provider
                .tensor_factor(key)
                .map(|rule1d| BiquadraticQuad9::new(key, Arc::clone(&rule), &rule1d, provider));
            match quad9 {
                Some(Ok(kernel)) => kernel.into(),
                Some(Err(JacobianError::TensorProductExpected { .. })) => {
                    debug!("Rule for {} is not the tensor product of its 1D factor", key);
                    LagrangeJacobianCalculator::new(key, rule, spatial_dim, provider)?.into()
                }
                Some(Err(err)) => return Err(err),
                None => LagrangeJacobianCalculator::new(key, rule, spatial_dim, provider)?.into(),
            }
        }
        _ => LagrangeJacobianCalculator::new(key, rule, spatial_dim, provider)?.into(),
    };
    Ok(kernel)
}

/// A [`CalculatorRegistry`] per thread, sharing a single quadrature cache.
///
/// Since [`JacobianCalculator::jxw`] mutates the calculator's buffer, calculators cannot be
/// shared between threads. This type gives every thread its own registry instead, so that
/// it can be used from parallel element loops through a shared reference.
#[derive(Debug)]
pub struct ThreadLocalCalculatorRegistry<P: Send + Sync = LagrangeReference> {
    spatial_dim: usize,
    quadrature: Arc<QuadratureCache<P>>,
    registries: ThreadLocal<RefCell<CalculatorRegistry<P>>>,
}

impl ThreadLocalCalculatorRegistry<LagrangeReference> {
    pub fn new(spatial_dim: usize) -> Self {
        Self::with_quadrature_cache(spatial_dim, Arc::new(QuadratureCache::new()))
    }
}

impl<P: Send + Sync> ThreadLocalCalculatorRegistry<P> {
    pub fn with_quadrature_cache(spatial_dim: usize, quadrature: Arc<QuadratureCache<P>>) -> Self {
        Self {
            spatial_dim,
            quadrature,
            registries: ThreadLocal::new(),
        }
    }

    pub fn spatial_dim(&self) -> usize {
        self.spatial_dim
    }

    pub fn quadrature_cache(&self) -> &Arc<QuadratureCache<P>> {
        &self.quadrature
    }
}

impl<P: ReferenceRuleProvider + Send + Sync> ThreadLocalCalculatorRegistry<P> {
    /// Calls `f` with this thread's calculator for `key`.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within `f` on the same thread.
    pub fn with_calculator<R>(
        &self,
        key: QuadratureKey,
        f: impl FnOnce(&mut JacobianCalculator) -> R,
    ) -> Result<R, JacobianError> {
        let registry = self.registries.get_or(|| {
            trace!("Creating calculator registry for thread {:?}", std::thread::current().id());
            RefCell::new(CalculatorRegistry::with_quadrature_cache(
                self.spatial_dim,
                Arc::clone(&self.quadrature),
            ))
        });
        let mut registry = registry.borrow_mut();
        let calculator = registry.get(key)?;
        Ok(f(calculator))
    }

    /// Computes `JxW` for `element` with this thread's calculator for `key`, passing the
    /// result to `f`.
    pub fn jxw<E, R>(&self, key: QuadratureKey, element: &E, f: impl FnOnce(&[f64]) -> R) -> Result<R, JacobianError>
    where
        E: Element + ?Sized,
    {
        self.with_calculator(key, |calculator| calculator.jxw(element).map(f))?
    }
}
