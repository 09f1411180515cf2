/// Point-region quadtree over the (mean hue, mean saturation) plane of the colour descriptor.
/// A range query around the query image's means gathers candidates, which are then ranked
/// by full histogram distance.

use log::warn;

use crate::config::IndexConfig;
use crate::index::{rank_by_histogram, SimilarityIndex};
use crate::models::{Record, SearchResult};

/// Nodes at this depth no longer subdivide and grow past their capacity instead.
/// Without the limit, more than `capacity` coincident points would subdivide forever.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub record: Record,
}

/// Axis-aligned rectangle given by its centre and half extents. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Rect {
    /// The unit square [0, 1] x [0, 1], where descriptor means live.
    pub const UNIT: Rect = Rect { x: 0.5, y: 0.5, half_w: 0.5, half_h: 0.5 };

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x - self.half_w && x <= self.x + self.half_w &&
        y >= self.y - self.half_h && y <= self.y + self.half_h
    }

    pub fn intersects(&self, range: &Rect) -> bool {
        !(range.x - range.half_w > self.x + self.half_w ||
          range.x + range.half_w < self.x - self.half_w ||
          range.y - range.half_h > self.y + self.half_h ||
          range.y + range.half_h < self.y - self.half_h)
    }
}

#[derive(Debug)]
pub struct Quadtree {
    boundary: Rect,
    capacity: usize,
    depth: usize,
    points: Vec<Point>,
    /// North-east, north-west, south-east, south-west. Present once the node has subdivided.
    children: Option<Box<[Quadtree; 4]>>,
}

impl Quadtree {
    pub fn new(boundary: Rect, capacity: usize) -> Quadtree {
        Quadtree::with_depth(boundary, capacity.max(1), 0)
    }

    fn with_depth(boundary: Rect, capacity: usize, depth: usize) -> Quadtree {
        Quadtree {
            boundary,
            capacity,
            depth,
            points: Vec::with_capacity(capacity),
            children: None,
        }
    }

    /// Returns false if the point lies outside this node's boundary.
    pub fn insert(&mut self, point: Point) -> bool {
        if !self.boundary.contains(point.x, point.y) {
            return false;
        }

        if self.points.len() < self.capacity || self.depth >= MAX_DEPTH {
            self.points.push(point);
            return true;
        }

        if self.children.is_none() {
            self.subdivide();
        }

        let Some(children) = self.children.as_mut() else {
            return false;
        };
        // The children tile the parent; the first one containing the point takes it.
        match children.iter_mut().find(|child| child.boundary.contains(point.x, point.y)) {
            Some(child) => child.insert(point),
            None => false,
        }
    }

    fn subdivide(&mut self) {
        let Rect { x, y, half_w, half_h } = self.boundary;
        let hw = half_w / 2.0;
        let hh = half_h / 2.0;
        let depth = self.depth + 1;

        self.children = Some(Box::new([
            Quadtree::with_depth(Rect { x: x + hw, y: y - hh, half_w: hw, half_h: hh }, self.capacity, depth),
            Quadtree::with_depth(Rect { x: x - hw, y: y - hh, half_w: hw, half_h: hh }, self.capacity, depth),
            Quadtree::with_depth(Rect { x: x + hw, y: y + hh, half_w: hw, half_h: hh }, self.capacity, depth),
            Quadtree::with_depth(Rect { x: x - hw, y: y + hh, half_w: hw, half_h: hh }, self.capacity, depth),
        ]));
    }

    /// Appends every stored point inside `range` to `found`.
    pub fn query_range<'a>(&'a self, range: &Rect, found: &mut Vec<&'a Point>) {
        if !self.boundary.intersects(range) {
            return;
        }

        found.extend(self.points.iter().filter(|p| range.contains(p.x, p.y)));

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_range(range, found);
            }
        }
    }

    #[cfg(test)]
    fn is_divided(&self) -> bool {
        self.children.is_some()
    }
}

/// Similarity index backed by a quadtree. Records are placed at (mu_h, mu_s);
/// queries look `radius` around the query in both directions.
#[derive(Debug)]
pub struct QuadtreeIndex {
    tree: Quadtree,
    radius: f32,
    len: usize,
}

impl QuadtreeIndex {
    pub fn new(config: &IndexConfig) -> QuadtreeIndex {
        QuadtreeIndex {
            tree: Quadtree::new(Rect::UNIT, config.quadtree_capacity),
            radius: config.quadtree_radius,
            len: 0,
        }
    }
}

impl SimilarityIndex for QuadtreeIndex {
    fn insert(&mut self, record: Record) {
        let (x, y) = (record.color.mu_h, record.color.mu_s);
        if !self.tree.boundary.contains(x, y) {
            warn!("{:?} lies outside the quadtree at ({}, {}); skipping", record.path, x, y);
            return;
        }
        if self.tree.insert(Point { x, y, record }) {
            self.len += 1;
        }
    }

    fn query(&self, query: &Record, k: usize) -> Vec<SearchResult> {
        let range = Rect {
            x: query.color.mu_h,
            y: query.color.mu_s,
            half_w: self.radius,
            half_h: self.radius,
        };
        let mut candidates = Vec::new();
        self.tree.query_range(&range, &mut candidates);

        rank_by_histogram(query, candidates.into_iter().map(|p| &p.record), k)
    }

    fn len(&self) -> usize {
        self.len
    }
}
