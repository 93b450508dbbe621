//! Element types and the element interface consumed by the calculators.
use crate::nalgebra::{Point1, Point2, Point3};
use crate::quadrature::Order;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Supported reference element shapes.
///
/// The node ordering of every type is documented on
/// [`LagrangeReference::reference_nodes`](crate::reference::LagrangeReference::reference_nodes).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Edge2,
    Edge3,
    Tri3,
    Tri6,
    Quad4,
    Quad9,
    Tet4,
    Tet10,
    Hex8,
    Hex27,
}

impl ElementType {
    pub const ALL: [ElementType; 10] = [
        ElementType::Edge2,
        ElementType::Edge3,
        ElementType::Tri3,
        ElementType::Tri6,
        ElementType::Quad4,
        ElementType::Quad9,
        ElementType::Tet4,
        ElementType::Tet10,
        ElementType::Hex8,
        ElementType::Hex27,
    ];

    /// Dimension of the reference cell.
    pub const fn reference_dim(&self) -> usize {
        use ElementType::*;
        match self {
            Edge2 | Edge3 => 1,
            Tri3 | Tri6 | Quad4 | Quad9 => 2,
            Tet4 | Tet10 | Hex8 | Hex27 => 3,
        }
    }

    pub const fn num_nodes(&self) -> usize {
        use ElementType::*;
        match self {
            Edge2 => 2,
            Edge3 => 3,
            Tri3 => 3,
            Tri6 => 6,
            Quad4 => 4,
            Quad9 => 9,
            Tet4 => 4,
            Tet10 => 10,
            Hex8 => 8,
            Hex27 => 27,
        }
    }

    /// Polynomial order of the Lagrange basis that interpolates the element geometry.
    pub const fn default_order(&self) -> Order {
        use ElementType::*;
        match self {
            Edge2 | Tri3 | Quad4 | Tet4 | Hex8 => Order::FIRST,
            Edge3 | Tri6 | Quad9 | Tet10 | Hex27 => Order::SECOND,
        }
    }

    /// Whether the reference cell is a unit simplex (as opposed to `[-1, 1]^d`).
    pub const fn is_simplex(&self) -> bool {
        use ElementType::*;
        matches!(self, Tri3 | Tri6 | Tet4 | Tet10)
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

const fn max_num_nodes(types: &[ElementType]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < types.len() {
        let n = types[i].num_nodes();
        if n > max {
            max = n;
        }
        i += 1;
    }
    max
}

/// The largest node count among the supported element types.
///
/// Bounds the stack storage used when gathering node coordinates.
pub const MAX_NODES: usize = max_num_nodes(&ElementType::ALL);

/// A point in physical space.
///
/// Components beyond the spatial dimension of the problem are ignored.
pub type PhysicalPoint = Point3<f64>;

/// The view of a physical element that the calculators need.
pub trait Element {
    fn element_type(&self) -> ElementType;

    /// Returns the coordinates of node `i`, for `i < self.element_type().num_nodes()`.
    fn point(&self, i: usize) -> PhysicalPoint;
}

impl<E: Element + ?Sized> Element for &E {
    fn element_type(&self) -> ElementType {
        E::element_type(self)
    }

    fn point(&self, i: usize) -> PhysicalPoint {
        E::point(self, i)
    }
}

/// An element that owns the coordinates of its nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodalElement {
    element_type: ElementType,
    nodes: Vec<PhysicalPoint>,
}

impl NodalElement {
    /// # Panics
    ///
    /// Panics if the number of nodes does not match the element type.
    pub fn new(element_type: ElementType, nodes: Vec<PhysicalPoint>) -> Self {
        assert_eq!(
            nodes.len(),
            element_type.num_nodes(),
            "{} elements have {} nodes",
            element_type,
            element_type.num_nodes()
        );
        Self { element_type, nodes }
    }

    pub fn from_points1(element_type: ElementType, points: &[Point1<f64>]) -> Self {
        Self::new(element_type, points.iter().map(|p| Point3::new(p.x, 0.0, 0.0)).collect())
    }

    pub fn from_points2(element_type: ElementType, points: &[Point2<f64>]) -> Self {
        Self::new(element_type, points.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect())
    }

    pub fn from_points3(element_type: ElementType, points: &[Point3<f64>]) -> Self {
        Self::new(element_type, points.to_vec())
    }

    pub fn nodes(&self) -> &[PhysicalPoint] {
        &self.nodes
    }

    /// Returns a new element whose nodes are the images of the nodes of this element.
    pub fn map_nodes(&self, f: impl FnMut(&PhysicalPoint) -> PhysicalPoint) -> Self {
        Self {
            element_type: self.element_type,
            nodes: self.nodes.iter().map(f).collect(),
        }
    }
}

impl Element for NodalElement {
    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn point(&self, i: usize) -> PhysicalPoint {
        self.nodes[i]
    }
}
