/// A marker placed inside a region of the drawing, assigning it a material and meshing parameters
#[derive(Clone, Debug)]
pub struct BlockLabel {
    pub x: f64,
    pub y: f64,
    /// Index of the region's material
    pub block_type: usize,
    /// Maximum element area requested for the region (`<= 0` when unspecified)
    pub max_area: f64,
    /// Whether the region models the exterior of an unbounded axisymmetric problem
    pub is_external: bool,
    /// Group number (0 for no group)
    pub in_group: usize,
    pub is_selected: bool,
}

impl BlockLabel {
    pub fn new(x: f64, y: f64, block_type: usize) -> Self {
        Self {
            x,
            y,
            block_type,
            max_area: 0.0,
            is_external: false,
            in_group: 0,
            is_selected: false,
        }
    }

    pub fn with_max_area(mut self, max_area: f64) -> Self {
        self.max_area = max_area;
        self
    }

    pub fn with_group(mut self, group: usize) -> Self {
        self.in_group = group;
        self
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }

    pub fn toggle_select(&mut self) {
        self.is_selected = !self.is_selected;
    }
}
