use std::collections::HashMap;

use bevy::prelude::Vec3;
use serde::{Deserialize, Serialize};

use mediagraph_core::{NodeId, NodeKind};

use crate::graph::model::GraphModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    #[default]
    ForceDirected,
    Circular,
    Grid,
    Concentric,
}

impl LayoutAlgorithm {
    pub const ALL: [LayoutAlgorithm; 4] = [
        LayoutAlgorithm::ForceDirected,
        LayoutAlgorithm::Circular,
        LayoutAlgorithm::Grid,
        LayoutAlgorithm::Concentric,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LayoutAlgorithm::ForceDirected => "force-directed",
            LayoutAlgorithm::Circular => "circular",
            LayoutAlgorithm::Grid => "grid",
            LayoutAlgorithm::Concentric => "concentric",
        }
    }
}

struct LayoutAnim {
    from: HashMap<NodeId, Vec3>,
    to: HashMap<NodeId, Vec3>,
    elapsed: f32,
    duration: f32,
}

/// Assigns and animates node positions for the current snapshot. Positions
/// are a transient overlay keyed by node id; the snapshot itself is never
/// touched, and a replacement discards every position.
///
/// Re-layout has two independent triggers, tracked as separate watermarks:
/// the snapshot serial and the selected algorithm.
pub struct LayoutState {
    pub algorithm: LayoutAlgorithm,
    pub positions: HashMap<NodeId, Vec3>,
    velocities: HashMap<NodeId, Vec3>,
    seen_serial: u64,
    seen_algorithm: Option<LayoutAlgorithm>,
    anim: Option<LayoutAnim>,

    pub node_spacing: f32,
    pub link_distance: f32,
    pub repulsion: f32,
    pub damping: f32,
    pub max_step: f32,
    pub anim_duration: f32,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::default(),
            positions: HashMap::new(),
            velocities: HashMap::new(),
            seen_serial: 0,
            seen_algorithm: None,
            anim: None,
            node_spacing: 3.0,
            link_distance: 6.0,
            repulsion: 22.0,
            damping: 0.92,
            max_step: 0.35,
            anim_duration: 0.6,
        }
    }
}

impl LayoutState {
    /// Re-runs the layout when the snapshot was replaced or the algorithm
    /// changed; returns whether a run started.
    pub fn refresh_if_needed(&mut self, model: &GraphModel) -> bool {
        let snapshot_changed = self.seen_serial != model.serial;
        let algorithm_changed = self.seen_algorithm != Some(self.algorithm);

        if snapshot_changed {
            self.positions.clear();
            self.velocities.clear();
            self.anim = None;
            self.seen_serial = model.serial;
        }
        if algorithm_changed {
            self.seen_algorithm = Some(self.algorithm);
        }
        if !(snapshot_changed || algorithm_changed) {
            return false;
        }

        self.start(model);
        true
    }

    fn start(&mut self, model: &GraphModel) {
        let ids = model.sorted_ids();
        match self.algorithm {
            LayoutAlgorithm::ForceDirected => {
                self.anim = None;
                self.seed_missing(model, &ids);
                for id in &ids {
                    self.velocities.insert(id.clone(), Vec3::ZERO);
                }
            }
            LayoutAlgorithm::Circular => {
                self.begin_anim(circular_targets(&ids, self.node_spacing));
            }
            LayoutAlgorithm::Grid => {
                self.begin_anim(grid_targets(&ids, self.node_spacing));
            }
            LayoutAlgorithm::Concentric => {
                self.begin_anim(concentric_targets(model, self.node_spacing));
            }
        }
    }

    fn begin_anim(&mut self, targets: HashMap<NodeId, Vec3>) {
        let mut from = HashMap::with_capacity(targets.len());
        for (id, target) in targets.iter() {
            // Nodes without a prior position appear in place.
            let start = self.positions.get(id).copied().unwrap_or(*target);
            from.insert(id.clone(), start);
            self.positions.insert(id.clone(), start);
        }
        self.anim = Some(LayoutAnim {
            from,
            to: targets,
            elapsed: 0.0,
            duration: self.anim_duration.max(0.01),
        });
    }

    /// Per-frame advance: either eases toward the geometric targets or
    /// integrates the force simulation.
    pub fn step(&mut self, model: &GraphModel, dt: f32) {
        if let Some(anim) = self.anim.as_mut() {
            anim.elapsed += dt;
            let t = (anim.elapsed / anim.duration).clamp(0.0, 1.0);
            let ease = t * t * (3.0 - 2.0 * t);
            for (id, to) in anim.to.iter() {
                let from = anim.from.get(id).copied().unwrap_or(*to);
                self.positions.insert(id.clone(), from.lerp(*to, ease));
            }
            if t >= 1.0 {
                self.anim = None;
            }
            return;
        }

        if self.algorithm == LayoutAlgorithm::ForceDirected {
            self.force_step(model, dt);
        }
    }

    pub fn is_settled(&self) -> bool {
        self.anim.is_none()
    }

    /// Initial placement for the force run: one ring per node kind, concepts
    /// innermost, so the simulation starts untangled.
    fn seed_missing(&mut self, model: &GraphModel, ids: &[NodeId]) {
        let mut concepts = Vec::new();
        let mut texts = Vec::new();
        let mut images = Vec::new();
        for id in ids {
            if self.positions.contains_key(id) {
                continue;
            }
            match model.nodes.get(id).map(|n| n.kind) {
                Some(NodeKind::Concept) => concepts.push(id.clone()),
                Some(NodeKind::Text) => texts.push(id.clone()),
                Some(NodeKind::Image) => images.push(id.clone()),
                None => {}
            }
        }

        let base = ring_radius(ids.len(), self.node_spacing);
        place_ring(&mut self.positions, &concepts, base * 0.45);
        place_ring(&mut self.positions, &texts, base * 0.8);
        place_ring(&mut self.positions, &images, base * 1.2);
    }

    fn force_step(&mut self, model: &GraphModel, dt: f32) {
        let ids: Vec<NodeId> = {
            let mut ids: Vec<NodeId> = model
                .nodes
                .keys()
                .filter(|id| self.positions.contains_key(*id))
                .cloned()
                .collect();
            ids.sort();
            ids
        };
        if ids.len() <= 1 {
            return;
        }

        let link_dist = self.link_distance.max(0.1);
        let repulsion = self.repulsion.max(0.0);
        let damping = self.damping.clamp(0.0, 1.0);
        let max_step = self.max_step.max(0.001);

        let mut forces: HashMap<NodeId, Vec3> = HashMap::new();
        for id in ids.iter() {
            forces.insert(id.clone(), Vec3::ZERO);
        }

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let a = &ids[i];
                let b = &ids[j];
                let pa = *self.positions.get(a).unwrap_or(&Vec3::ZERO);
                let pb = *self.positions.get(b).unwrap_or(&Vec3::ZERO);

                let mut dir = pa - pb;
                dir.y = 0.0;
                let dist2 = dir.length_squared().max(0.01);
                let f = (repulsion / dist2) * dir.normalize_or_zero();

                *forces.get_mut(a).unwrap() += f;
                *forces.get_mut(b).unwrap() -= f;
            }
        }

        for edge in model.edges.iter() {
            if !(self.positions.contains_key(&edge.source)
                && self.positions.contains_key(&edge.target))
            {
                continue;
            }
            let pa = *self.positions.get(&edge.source).unwrap_or(&Vec3::ZERO);
            let pb = *self.positions.get(&edge.target).unwrap_or(&Vec3::ZERO);

            let mut d = pb - pa;
            d.y = 0.0;
            let len = d.length().max(0.001);
            let dir = d / len;
            let k = 0.6;
            let stretch = len - link_dist;
            let f = k * stretch * dir;

            if let Some(fa) = forces.get_mut(&edge.source) {
                *fa += f;
            }
            if let Some(fb) = forces.get_mut(&edge.target) {
                *fb -= f;
            }
        }

        for id in ids.iter() {
            let v = self.velocities.entry(id.clone()).or_insert(Vec3::ZERO);
            let f = *forces.get(id).unwrap_or(&Vec3::ZERO);

            *v = (*v + f * dt) * damping;

            let mut step = *v * dt;
            if step.length() > max_step {
                step = step.normalize_or_zero() * max_step;
            }

            let p = self.positions.entry(id.clone()).or_insert(Vec3::ZERO);
            *p += step;
            p.y = 0.0;
        }
    }
}

fn ring_radius(count: usize, spacing: f32) -> f32 {
    (spacing * count.max(1) as f32 / std::f32::consts::TAU).max(spacing)
}

fn place_ring(positions: &mut HashMap<NodeId, Vec3>, ids: &[NodeId], radius: f32) {
    let n = ids.len().max(1) as f32;
    for (i, id) in ids.iter().enumerate() {
        if positions.contains_key(id) {
            continue;
        }
        let t = (i as f32) / n * std::f32::consts::TAU;
        positions.insert(id.clone(), Vec3::new(radius * t.cos(), 0.0, radius * t.sin()));
    }
}

fn circular_targets(ids: &[NodeId], spacing: f32) -> HashMap<NodeId, Vec3> {
    let radius = ring_radius(ids.len(), spacing);
    let n = ids.len().max(1) as f32;
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let t = (i as f32) / n * std::f32::consts::TAU;
            (
                id.clone(),
                Vec3::new(radius * t.cos(), 0.0, radius * t.sin()),
            )
        })
        .collect()
}

fn grid_targets(ids: &[NodeId], spacing: f32) -> HashMap<NodeId, Vec3> {
    let cols = (ids.len() as f32).sqrt().ceil().max(1.0) as usize;
    let half = (cols.saturating_sub(1)) as f32 / 2.0;
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let col = (i % cols) as f32;
            let row = (i / cols) as f32;
            (
                id.clone(),
                Vec3::new((col - half) * spacing, 0.0, (row - half) * spacing),
            )
        })
        .collect()
}

/// Highest-degree node at the center, the rest on rings of growing capacity
/// (8, 16, 24, ...) in descending degree order.
fn concentric_targets(model: &GraphModel, spacing: f32) -> HashMap<NodeId, Vec3> {
    let mut ids = model.sorted_ids();
    ids.sort_by(|a, b| model.degree(b).cmp(&model.degree(a)).then_with(|| a.cmp(b)));

    let gap = spacing * 1.8;
    let mut out = HashMap::with_capacity(ids.len());
    let mut rest = ids.into_iter();

    if let Some(center) = rest.next() {
        out.insert(center, Vec3::ZERO);
    }

    let mut ring = 1usize;
    let mut remaining: Vec<NodeId> = rest.collect();
    while !remaining.is_empty() {
        let capacity = 8 * ring;
        let take = capacity.min(remaining.len());
        let members: Vec<NodeId> = remaining.drain(..take).collect();
        let radius = gap * ring as f32;
        let n = members.len() as f32;
        for (i, id) in members.into_iter().enumerate() {
            let t = (i as f32) / n * std::f32::consts::TAU;
            out.insert(id, Vec3::new(radius * t.cos(), 0.0, radius * t.sin()));
        }
        ring += 1;
    }
    out
}
