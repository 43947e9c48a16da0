//! Interaction zones: which scene objects the character is close enough to use.
//!
//! The tracker is fed a [`CharacterState`] snapshot after each tick and reports
//! enter/exit transitions; the UI layer turns those into prompts.

use std::collections::BTreeSet;

use crate::{
    collision::types::{ObstacleId, Vec2},
    constants::PROXIMITY_HYSTERESIS,
    movement::CharacterState,
    utils::to_planar,
};

#[derive(Clone, Debug, PartialEq)]
pub struct InteractionZone {
    pub id: ObstacleId,
    pub label: String,
    pub center: Vec2,
    /// Planar distance from `center` at which the zone becomes active (meters).
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProximityEvent {
    Entered(ObstacleId),
    Exited(ObstacleId),
}

#[derive(Clone, Debug, Default)]
pub struct ProximityTracker {
    zones: Vec<InteractionZone>,
    inside: BTreeSet<ObstacleId>,
}

impl ProximityTracker {
    pub fn new(mut zones: Vec<InteractionZone>) -> Self {
        zones.sort_by(|a, b| a.id.cmp(&b.id));
        zones.dedup_by(|a, b| a.id == b.id);
        Self {
            zones,
            inside: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn zones(&self) -> &[InteractionZone] {
        &self.zones
    }

    #[inline]
    pub fn is_inside(&self, id: &ObstacleId) -> bool {
        self.inside.contains(id)
    }

    /// Recompute membership for `state`. Exits are reported before entries; each group
    /// is in id order.
    pub fn update(&mut self, state: &CharacterState) -> Vec<ProximityEvent> {
        let here = to_planar(state.position);
        if !(here.x.is_finite() && here.y.is_finite()) {
            return Vec::new();
        }

        let mut exited = Vec::new();
        let mut entered = Vec::new();
        for zone in &self.zones {
            let dist = (zone.center - here).norm();
            let was_inside = self.inside.contains(&zone.id);
            if was_inside && dist > zone.radius + PROXIMITY_HYSTERESIS {
                exited.push(zone.id.clone());
            } else if !was_inside && dist <= zone.radius {
                entered.push(zone.id.clone());
            }
        }

        for id in &exited {
            self.inside.remove(id);
        }
        for id in &entered {
            self.inside.insert(id.clone());
        }
        exited
            .into_iter()
            .map(ProximityEvent::Exited)
            .chain(entered.into_iter().map(ProximityEvent::Entered))
            .collect()
    }

    /// Zones the character is currently inside, nearest first.
    pub fn nearby(&self, state: &CharacterState) -> Vec<(ObstacleId, f32)> {
        let here = to_planar(state.position);
        let mut out: Vec<(ObstacleId, f32)> = self
            .zones
            .iter()
            .filter(|z| self.inside.contains(&z.id))
            .map(|z| (z.id.clone(), (z.center - here).norm()))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Forget membership, e.g. after a teleport or scene reload.
    pub fn reset(&mut self) {
        self.inside.clear();
    }
}
