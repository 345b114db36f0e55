use num_complex::Complex64;

/// Boundary marker value of a node whose potential was not prescribed
pub const FREE_NODE: f64 = -2.0;

/// A vertex of the solved Mesh
#[derive(Clone, Debug)]
pub struct MeshNode {
    pub x: f64,
    pub y: f64,
    /// Fixed-value marker: [FREE_NODE] for unconstrained nodes, anything else for prescribed (Dirichlet) nodes
    pub q: f64,
    /// Scalar solution at the node: voltage (electrostatics) or temperature (heat flow)
    pub value: f64,
    pub in_conductor: Option<usize>,
    pub is_selected: bool,
    pub(crate) msk: f64,
}

impl MeshNode {
    /// A free node with a zero solution value
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            q: FREE_NODE,
            value: 0.0,
            in_conductor: None,
            is_selected: false,
            msk: 0.0,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Mark the node's value as prescribed
    pub fn fixed(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    pub fn with_conductor(mut self, conductor: usize) -> Self {
        self.in_conductor = Some(conductor);
        self
    }

    pub fn is_free(&self) -> bool {
        self.q == FREE_NODE
    }

    /// Region mask value (0 or 1); meaningful after the mask has been computed
    pub fn msk(&self) -> f64 {
        self.msk
    }

    pub fn cc(&self) -> Complex64 {
        Complex64::new(self.x, self.y)
    }

    pub fn toggle_select(&mut self) {
        self.is_selected = !self.is_selected;
    }
}
