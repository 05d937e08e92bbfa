use crate::error::{FlpzError, Result};
use crate::model::{Atom, Cell};
use crate::utils::linalg::frac_to_cart;

/// One translated copy of an origin atom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicImage {
    pub origin_index: usize,
    pub shift: [i32; 3],
    pub cartesian: [f64; 3],
}

/// Integer shifts covering [-radius, radius] on every axis, x outermost.
/// radius 3 gives the 343-point stencil.
pub fn stencil(radius: u32) -> Result<Vec<[i32; 3]>> {
    let too_large =
        || FlpzError::MalformedInput(format!("replication radius {} is too large", radius));

    let r = i32::try_from(radius).map_err(|_| too_large())?;
    let side = (radius as usize)
        .checked_mul(2)
        .and_then(|d| d.checked_add(1))
        .ok_or_else(too_large)?;
    let count = side
        .checked_mul(side)
        .and_then(|s| s.checked_mul(side))
        .ok_or_else(too_large)?;
    let mut shifts = Vec::with_capacity(count);

    for x in -r..=r {
        for y in -r..=r {
            for z in -r..=r {
                shifts.push([x, y, z]);
            }
        }
    }
    Ok(shifts)
}

/// All periodic images of one atom of `cell`, in stencil order.
pub fn images_of(cell: &Cell, origin_index: usize, shifts: &[[i32; 3]]) -> Vec<PeriodicImage> {
    let p = cell.atoms[origin_index].position;

    shifts
        .iter()
        .map(|s| {
            let frac = [
                p[0] + s[0] as f64,
                p[1] + s[1] as f64,
                p[2] + s[2] as f64,
            ];
            PeriodicImage {
                origin_index,
                shift: *s,
                cartesian: frac_to_cart(frac, cell.lattice),
            }
        })
        .collect()
}

/// Diagonal nx × ny × nz supercell. Positions stay fractional, expressed in
/// the new (enlarged) lattice; atoms are grouped per origin atom.
pub fn build(cell: &Cell, nx: u32, ny: u32, nz: u32) -> Result<Cell> {
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(FlpzError::MalformedInput(format!(
            "supercell multiplicities must be positive, got {}x{}x{}",
            nx, ny, nz
        )));
    }

    let dims = [nx as f64, ny as f64, nz as f64];
    let mut new_atoms = Vec::with_capacity(cell.atoms.len() * (nx * ny * nz) as usize);

    for atom in &cell.atoms {
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let shifted = [
                        (atom.position[0] + x as f64) / dims[0],
                        (atom.position[1] + y as f64) / dims[1],
                        (atom.position[2] + z as f64) / dims[2],
                    ];
                    new_atoms.push(Atom {
                        element: atom.element.clone(),
                        position: shifted,
                    });
                }
            }
        }
    }

    let mut new_lattice = cell.lattice;
    for (row, n) in new_lattice.iter_mut().zip(dims) {
        for v in row.iter_mut() {
            *v *= n;
        }
    }

    let mut out = Cell::new(new_lattice, new_atoms);
    out.label = format!("{} ({}x{}x{} Supercell)", cell.formula(), nx, ny, nz);
    Ok(out)
}
