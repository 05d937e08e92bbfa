use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FlpzError, Result};
use crate::model::Cell;
use crate::physics::operations::supercell::{images_of, stencil, PeriodicImage};
use crate::utils::linalg::{norm, sub};

pub const DEFAULT_TOLERANCE: f64 = 0.2;
pub const DEFAULT_REPLICATION_RADIUS: u32 = 3;
/// Largest accepted radius: 101^3 images per origin atom.
pub const MAX_REPLICATION_RADIUS: u32 = 50;

// --- CONFIGURATION ---

/// How a target atom picks among several origin images inside the tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Closest image wins; ties keep the earliest image in scan order.
    #[default]
    Nearest,
    /// Last image in scan order (origin atom, then image) wins.
    LastMatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    /// Maximum Cartesian distance (Å), compared with strict `<`.
    pub tolerance: f64,
    /// Images are generated for every shift in [-radius, radius]^3.
    pub replication_radius: u32,
    pub policy: MatchPolicy,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            replication_radius: DEFAULT_REPLICATION_RADIUS,
            policy: MatchPolicy::Nearest,
        }
    }
}

impl MapOptions {
    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(FlpzError::InvalidTolerance(self.tolerance));
        }
        if self.replication_radius > MAX_REPLICATION_RADIUS {
            return Err(FlpzError::MalformedInput(format!(
                "replication radius {} exceeds the maximum of {}",
                self.replication_radius, MAX_REPLICATION_RADIUS
            )));
        }
        Ok(())
    }
}

// --- RESULTS ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AtomMatch {
    Matched {
        origin_index: usize,
        element: String,
        /// Integer translation (in origin lattice vectors) of the chosen image.
        shift: [i32; 3],
        /// Image Cartesian position minus target Cartesian position (Å).
        displacement: [f64; 3],
        distance: f64,
        /// Number of images that fell inside the tolerance.
        candidates: usize,
    },
    Unmatched,
}

impl AtomMatch {
    pub fn is_matched(&self) -> bool {
        matches!(self, AtomMatch::Matched { .. })
    }

    pub fn origin_index(&self) -> Option<usize> {
        match self {
            AtomMatch::Matched { origin_index, .. } => Some(*origin_index),
            AtomMatch::Unmatched => None,
        }
    }

    pub fn displacement(&self) -> Option<[f64; 3]> {
        match self {
            AtomMatch::Matched { displacement, .. } => Some(*displacement),
            AtomMatch::Unmatched => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// One entry per target atom, in target order.
    pub matches: Vec<AtomMatch>,
    pub tolerance: f64,
    pub policy: MatchPolicy,
}

impl MappingResult {
    /// 1-based origin indices with 0 for unmatched atoms (legacy array layout).
    pub fn legacy_mapping(&self) -> Vec<usize> {
        self.matches
            .iter()
            .map(|m| m.origin_index().map_or(0, |i| i + 1))
            .collect()
    }

    /// Displacement rows; unmatched atoms get the zero vector, so check
    /// `matches` before trusting a zero row.
    pub fn displacements(&self) -> Vec<[f64; 3]> {
        self.matches
            .iter()
            .map(|m| m.displacement().unwrap_or([0.0; 3]))
            .collect()
    }

    pub fn unmatched(&self) -> Vec<usize> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_matched())
            .map(|(i, _)| i)
            .collect()
    }

    /// Target atoms that had more than one image inside the tolerance.
    pub fn ambiguous(&self) -> Vec<usize> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(_, m)| matches!(m, AtomMatch::Matched { candidates, .. } if *candidates > 1))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn all_matched(&self) -> bool {
        self.matches.iter().all(AtomMatch::is_matched)
    }
}

/// A single image falling inside the tolerance of a target atom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchEvent {
    pub origin_index: usize,
    pub shift: [i32; 3],
    pub target_index: usize,
    pub distance: f64,
}

// --- MAIN CALCULATION ---

struct Hit {
    image_rank: usize,
    image: PeriodicImage,
    displacement: [f64; 3],
    distance: f64,
}

/// Map every target atom onto the origin atom it coincides with.
///
/// # Algorithm
/// 1. Replicate each origin atom over the integer stencil
/// 2. Project images and target atoms to Cartesian space
/// 3. Every image closer than `tolerance` to a target atom is a hit
/// 4. Resolve hits per target atom according to `options.policy`
pub fn map_atoms(origin: &Cell, target: &Cell, options: &MapOptions) -> Result<MappingResult> {
    map_atoms_observed(origin, target, options, |_| {})
}

/// Same as [`map_atoms`], reporting every hit to `observer` in scan order
/// (origin atom, then image, then target atom).
pub fn map_atoms_observed<F>(
    origin: &Cell,
    target: &Cell,
    options: &MapOptions,
    mut observer: F,
) -> Result<MappingResult>
where
    F: FnMut(&MatchEvent),
{
    options.validate()?;
    origin.validate("origin")?;
    target.validate("target")?;

    let shifts = stencil(options.replication_radius)?;

    // Flattened origin-major, image-minor: position in this list is scan order.
    let images: Vec<PeriodicImage> = (0..origin.atoms.len())
        .flat_map(|i| images_of(origin, i, &shifts))
        .collect();
    let target_carts = target.cartesian_positions();

    debug!(
        "Mapping {} target atoms against {} origin images (tolerance {} Å)",
        target_carts.len(),
        images.len(),
        options.tolerance
    );

    let hits_per_target: Vec<Vec<Hit>> = target_carts
        .par_iter()
        .map(|t_cart| {
            images
                .iter()
                .enumerate()
                .filter_map(|(rank, img)| {
                    let displacement = sub(img.cartesian, *t_cart);
                    let distance = norm(displacement);
                    (distance < options.tolerance).then_some(Hit {
                        image_rank: rank,
                        image: *img,
                        displacement,
                        distance,
                    })
                })
                .collect()
        })
        .collect();

    let mut events: Vec<(usize, MatchEvent)> = hits_per_target
        .iter()
        .enumerate()
        .flat_map(|(t, hits)| {
            hits.iter().map(move |h| {
                (
                    h.image_rank,
                    MatchEvent {
                        origin_index: h.image.origin_index,
                        shift: h.image.shift,
                        target_index: t,
                        distance: h.distance,
                    },
                )
            })
        })
        .collect();
    events.sort_by_key(|(rank, ev)| (*rank, ev.target_index));
    for (_, ev) in &events {
        observer(ev);
    }

    let matches: Vec<AtomMatch> = hits_per_target
        .iter()
        .map(|hits| resolve(hits, options.policy, origin))
        .collect();

    let result = MappingResult {
        matches,
        tolerance: options.tolerance,
        policy: options.policy,
    };

    let unmatched = result.unmatched().len();
    info!(
        "Mapped {}/{} target atoms ({} unmatched, {} ambiguous)",
        result.matches.len() - unmatched,
        result.matches.len(),
        unmatched,
        result.ambiguous().len()
    );

    Ok(result)
}

fn resolve(hits: &[Hit], policy: MatchPolicy, origin: &Cell) -> AtomMatch {
    // Hits are already in scan order.
    let chosen = match policy {
        MatchPolicy::LastMatch => hits.last(),
        MatchPolicy::Nearest => hits.iter().fold(None, |best: Option<&Hit>, h| match best {
            Some(b) if b.distance <= h.distance => Some(b),
            _ => Some(h),
        }),
    };

    match chosen {
        Some(h) => AtomMatch::Matched {
            origin_index: h.image.origin_index,
            element: origin.atoms[h.image.origin_index].element.clone(),
            shift: h.image.shift,
            displacement: h.displacement,
            distance: h.distance,
            candidates: hits.len(),
        },
        None => AtomMatch::Unmatched,
    }
}
