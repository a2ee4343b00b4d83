use geo::BoundingRect;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

type IndexedEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// R-tree of feature bounding rectangles, keyed by the feature's position in its input slice.
pub struct EnvelopeIndex {
    rtree: RTree<IndexedEnvelope>,
}

impl EnvelopeIndex {
    /// Index the given geometries. Geometries without a bounding rectangle (empty ones) are left out.
    pub fn new<'a, G, I>(geometries: I) -> Self
    where
        G: BoundingRect<f64> + 'a,
        G::Output: Into<Option<geo::Rect>>,
        I: IntoIterator<Item = &'a G>,
    {
        let envelopes = geometries
            .into_iter()
            .enumerate()
            .filter_map(|(index, geometry)| {
                let rect: Option<geo::Rect> = geometry.bounding_rect().into();
                rect.map(|rect| IndexedEnvelope::new(rect_to_rectangle(&rect), index))
            })
            .collect();
        Self {
            rtree: RTree::bulk_load(envelopes),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Indices of features whose envelope intersects `rect`, in ascending order.
    pub fn candidates(&self, rect: &geo::Rect) -> Vec<usize> {
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        let mut indices: Vec<usize> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        indices.sort_unstable();
        indices
    }
}

fn rect_to_rectangle(rect: &geo::Rect) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

#[cfg(test)]
mod tests {
    use super::EnvelopeIndex;

    #[test]
    fn test_candidates_by_envelope() {
        let lines: Vec<geo::LineString> = vec![
            vec![(0.0, 0.0), (1.0, 1.0)].into(),
            vec![(5.0, 5.0), (6.0, 6.0)].into(),
            vec![(0.5, -3.0), (0.5, 3.0)].into(),
            geo::LineString::new(vec![]),
        ];
        let index = EnvelopeIndex::new(&lines);
        assert_eq!(3, index.len());

        let query = geo::Rect::new((0.0, 0.0), (2.0, 2.0));
        assert_eq!(vec![0, 2], index.candidates(&query));

        let query = geo::Rect::new((10.0, 10.0), (20.0, 20.0));
        assert!(index.candidates(&query).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = EnvelopeIndex::new(&Vec::<geo::LineString>::new());
        assert!(index.is_empty());
        assert!(index
            .candidates(&geo::Rect::new((0.0, 0.0), (1.0, 1.0)))
            .is_empty());

        let lines: Vec<geo::LineString> = vec![vec![(0.0, 0.0), (1.0, 1.0)].into()];
        assert!(!EnvelopeIndex::new(&lines).is_empty());
    }

    #[test]
    fn test_touching_envelopes_are_candidates() {
        let lines: Vec<geo::LineString> = vec![vec![(1.0, 0.0), (2.0, 0.0)].into()];
        let index = EnvelopeIndex::new(&lines);
        let query = geo::Rect::new((0.0, 0.0), (1.0, 1.0));
        assert_eq!(vec![0], index.candidates(&query));
    }
}
