use super::element::MeshElement;
use super::node::MeshNode;

/// Elements incident to each node, stored contiguously
///
/// The incident elements of node `i` are `elems[offsets[i]..offsets[i + 1]]`, sorted counter-clockwise
/// about the node by the angle of each element's centroid.
#[derive(Clone, Debug, Default)]
pub struct NodeAdjacency {
    offsets: Vec<usize>,
    elems: Vec<usize>,
}

impl NodeAdjacency {
    /// Build the adjacency lists. Element centroids must already be cached.
    pub fn build(nodes: &[MeshNode], elements: &[MeshElement]) -> Self {
        let mut counts = vec![0; nodes.len()];
        for elem in elements.iter() {
            for &p in elem.p.iter() {
                counts[p] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        offsets.push(0);
        for count in counts.iter() {
            offsets.push(offsets[offsets.len() - 1] + count);
        }

        let mut elems = vec![0; offsets[nodes.len()]];
        let mut fill = offsets.clone();
        for (elem_id, elem) in elements.iter().enumerate() {
            for &p in elem.p.iter() {
                elems[fill[p]] = elem_id;
                fill[p] += 1;
            }
        }

        for (node_id, node) in nodes.iter().enumerate() {
            let origin = node.cc();
            elems[offsets[node_id]..offsets[node_id + 1]].sort_by(|a, b| {
                let ta = (elements[*a].ctr - origin).arg();
                let tb = (elements[*b].ctr - origin).arg();
                ta.total_cmp(&tb)
            });
        }

        Self { offsets, elems }
    }

    /// Elements sharing `node`, in counter-clockwise order
    pub fn incident(&self, node: usize) -> &[usize] {
        &self.elems[self.offsets[node]..self.offsets[node + 1]]
    }

    /// Number of elements sharing `node`
    pub fn len(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    pub fn num_nodes(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // four triangles fanned around a center node (4)
    fn fan() -> (Vec<MeshNode>, Vec<MeshElement>) {
        let nodes = vec![
            MeshNode::new(1.0, 0.0),
            MeshNode::new(0.0, 1.0),
            MeshNode::new(-1.0, 0.0),
            MeshNode::new(0.0, -1.0),
            MeshNode::new(0.0, 0.0),
        ];
        let mut elements = vec![
            MeshElement::new([4, 2, 3], 0, 0),
            MeshElement::new([4, 0, 1], 0, 0),
            MeshElement::new([4, 3, 0], 0, 0),
            MeshElement::new([4, 1, 2], 0, 0),
        ];
        elements.iter_mut().for_each(|e| e.update_bounds(&nodes));
        (nodes, elements)
    }

    #[test]
    fn counter_clockwise_ordering() {
        let (nodes, elements) = fan();
        let adj = NodeAdjacency::build(&nodes, &elements);

        // centroid angles: e0 = -135°, e2 = -45°, e1 = 45°, e3 = 135°
        assert_eq!(adj.incident(4), &[0, 2, 1, 3]);
        assert_eq!(adj.len(4), 4);
        assert_eq!(adj.num_nodes(), 5);
    }

    #[test]
    fn lengths_match_incidence() {
        let (nodes, elements) = fan();
        let adj = NodeAdjacency::build(&nodes, &elements);

        for node_id in 0..nodes.len() {
            assert_eq!(adj.len(node_id), adj.incident(node_id).len());
            for &e in adj.incident(node_id) {
                assert!(elements[e].has_node(node_id));
            }
        }
        assert_eq!(adj.len(0), 2);
    }
}
