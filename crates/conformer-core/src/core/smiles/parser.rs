use super::SmilesError;
use crate::core::models::atom::{Atom, Chirality};
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{BondOrder, BondStereo, StereoKind};
use crate::core::perception;
use crate::core::perception::stereo::{chiral_reference_order, permutation_parity};
use std::collections::BTreeMap;
use tracing::debug;

/// Largest formal charge magnitude accepted in a bracket atom.
const MAX_CHARGE: i8 = 15;

/// Parses a SMILES string into a sanitized molecule with implicit hydrogens,
/// ring membership checks, hybridization and stereo perception applied.
pub fn parse(smiles: &str) -> Result<Molecule, SmilesError> {
    let mut mol = parse_graph(smiles)?;
    perception::sanitize(&mut mol)?;
    debug!(
        smiles,
        atoms = mol.num_atoms(),
        bonds = mol.num_bonds(),
        "Parsed SMILES"
    );
    Ok(mol)
}

/// Parses a SMILES string into a bare molecular graph without any perception.
///
/// Chirality tags are converted to the graph neighbor order and `/` `\`
/// marks around double bonds become cis/trans configurations; neither is
/// checked for being a real stereo element until sanitization.
pub fn parse_graph(smiles: &str) -> Result<Molecule, SmilesError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::Empty);
    }
    Parser::new(trimmed).run()
}

#[derive(Debug, Clone, Copy)]
struct PendingBond {
    order: BondOrder,
    /// `Some(true)` for `/`, `Some(false)` for `\`.
    direction: Option<bool>,
    pos: usize,
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
    direction: Option<bool>,
    /// Position of the ring bond in the opening atom's written neighbors.
    slot: usize,
}

/// A neighbor of an atom in the order the string writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Atom(usize),
    /// Bracket hydrogen, or the lone pair of a three-coordinate center.
    Implicit,
    /// Ring bond whose partner has not been read yet.
    Ring,
}

/// A `/` or `\` bond, oriented from the atom written first.
#[derive(Debug, Clone, Copy)]
struct Direction {
    bond: usize,
    first: usize,
    up: bool,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    /// Bond symbol waiting for its second atom.
    pending_bond: Option<PendingBond>,
    branches: Vec<usize>,
    rings: BTreeMap<u16, RingOpening>,
    written_order: Vec<Vec<Slot>>,
    directions: Vec<Direction>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: BTreeMap::new(),
            written_order: Vec::new(),
            directions: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Molecule, SmilesError> {
        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    let prev = self.prev.ok_or_else(|| self.unexpected())?;
                    if self.pending_bond.is_some() {
                        return Err(self.unexpected());
                    }
                    self.branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    let open = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnmatchedParen(self.pos))?;
                    if let Some(pending) = self.pending_bond {
                        return Err(SmilesError::DanglingBond(pending.pos));
                    }
                    self.prev = Some(open);
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' => {
                    if self.prev.is_none() || self.pending_bond.is_some() {
                        return Err(self.unexpected());
                    }
                    let (order, direction) = match c {
                        b'=' => (BondOrder::Double, None),
                        b'#' => (BondOrder::Triple, None),
                        b':' => (BondOrder::Aromatic, None),
                        b'/' => (BondOrder::Single, Some(true)),
                        b'\\' => (BondOrder::Single, Some(false)),
                        _ => (BondOrder::Single, None),
                    };
                    self.pending_bond = Some(PendingBond {
                        order,
                        direction,
                        pos: self.pos,
                    });
                    self.pos += 1;
                }
                b'.' => {
                    if self.pending_bond.is_some() || self.prev.is_none() {
                        return Err(self.unexpected());
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' | b'%' => {
                    if self.prev.is_none() {
                        return Err(self.unexpected());
                    }
                    let label = self.ring_label()?;
                    self.ring_bond(label)?;
                }
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.attach(atom)?;
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.attach(atom)?;
                }
            }
        }

        if !self.branches.is_empty() {
            return Err(SmilesError::UnclosedBranch);
        }
        if let Some(pending) = self.pending_bond {
            return Err(SmilesError::DanglingBond(pending.pos));
        }
        if let Some(&label) = self.rings.keys().next() {
            return Err(SmilesError::UnclosedRing(label));
        }

        self.assign_chirality();
        self.assign_double_bond_stereo();
        Ok(self.mol)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn unexpected(&self) -> SmilesError {
        match self.peek() {
            Some(c) => SmilesError::UnexpectedChar {
                pos: self.pos,
                ch: c as char,
            },
            None => SmilesError::UnexpectedEnd,
        }
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        let atoms = self.mol.atoms();
        if atoms[a].is_aromatic && atoms[b].is_aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let bracket = atom.no_implicit;
        let idx = self.mol.add_atom(atom);
        let mut written = Vec::new();
        if let Some(prev) = self.prev {
            let pending = self.pending_bond.take();
            let order = match pending {
                Some(p) => p.order,
                None => self.default_order(prev, idx),
            };
            let bond = self.mol.add_bond(prev, idx, order)?;
            if let Some(up) = pending.and_then(|p| p.direction) {
                self.directions.push(Direction {
                    bond,
                    first: prev,
                    up,
                });
            }
            self.written_order[prev].push(Slot::Atom(idx));
            written.push(Slot::Atom(prev));
        }
        if bracket {
            written.push(Slot::Implicit);
        }
        self.written_order.push(written);
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_label(&mut self) -> Result<u16, SmilesError> {
        match self.peek() {
            Some(b'%') => {
                self.pos += 1;
                let mut label = 0u16;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            label = label * 10 + (d - b'0') as u16;
                            self.pos += 1;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                Ok(label)
            }
            Some(d @ b'0'..=b'9') => {
                self.pos += 1;
                Ok((d - b'0') as u16)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn ring_bond(&mut self, label: u16) -> Result<(), SmilesError> {
        let Some(current) = self.prev else {
            return Err(SmilesError::UnexpectedEnd);
        };
        let written = self.pending_bond.take();
        let written_order = written.map(|p| p.order);
        let written_direction = written.and_then(|p| p.direction);

        match self.rings.remove(&label) {
            Some(open) => {
                let order = match (open.order, written_order) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::RingBondConflict(label));
                    }
                    (a, b) => a
                        .or(b)
                        .unwrap_or_else(|| self.default_order(open.atom, current)),
                };
                let bond = self.mol.add_bond(open.atom, current, order)?;
                self.written_order[open.atom][open.slot] = Slot::Atom(current);
                self.written_order[current].push(Slot::Atom(open.atom));

                let direction = open
                    .direction
                    .map(|up| (open.atom, up))
                    .or(written_direction.map(|up| (current, up)));
                if let Some((first, up)) = direction {
                    self.directions.push(Direction { bond, first, up });
                }
            }
            None => {
                let slot = self.written_order[current].len();
                self.written_order[current].push(Slot::Ring);
                self.rings.insert(
                    label,
                    RingOpening {
                        atom: current,
                        order: written_order,
                        direction: written_direction,
                        slot,
                    },
                );
            }
        }
        Ok(())
    }

    /// Restates every chirality tag relative to the graph neighbor order.
    fn assign_chirality(&mut self) {
        for atom in 0..self.mol.num_atoms() {
            let tag = self.mol.atoms()[atom].chirality;
            if !tag.is_specified() {
                continue;
            }
            let reference = chiral_reference_order(&self.mol, atom);
            let implicit = reference.contains(&None);
            let written: Vec<Option<usize>> = self.written_order[atom]
                .iter()
                .filter_map(|slot| match *slot {
                    Slot::Atom(n) => Some(Some(n)),
                    Slot::Implicit if implicit => Some(None),
                    _ => None,
                })
                .collect();
            let converted = match permutation_parity(&written, &reference) {
                Some(true) => tag.inverted(),
                Some(false) => tag,
                None => Chirality::Unspecified,
            };
            if let Some(a) = self.mol.atom_mut(atom) {
                a.chirality = converted;
            }
        }
    }

    /// Turns `/` and `\` marks on both sides of a double bond into its
    /// cis/trans configuration.
    fn assign_double_bond_stereo(&mut self) {
        if self.directions.is_empty() {
            return;
        }
        for bond in 0..self.mol.num_bonds() {
            let b = self.mol.bonds()[bond];
            if b.order != BondOrder::Double {
                continue;
            }
            let (Some((x1, up1)), Some((x2, up2))) = (
                self.marked_neighbor(b.atom1, bond),
                self.marked_neighbor(b.atom2, bond),
            ) else {
                continue;
            };
            let kind = if up1 == up2 {
                StereoKind::Cis
            } else {
                StereoKind::Trans
            };
            if let Some(double) = self.mol.bond_mut(bond) {
                double.stereo = Some(BondStereo {
                    kind,
                    refs: (x1, x2),
                });
            }
        }
    }

    /// The first marked neighbor of `end` other than across `double`, and
    /// whether it sits above `end`.
    fn marked_neighbor(&self, end: usize, double: usize) -> Option<(usize, bool)> {
        self.directions.iter().find_map(|d| {
            if d.bond == double {
                return None;
            }
            let other = self.mol.bonds()[d.bond].other(end)?;
            Some((other, if d.first == end { d.up } else { !d.up }))
        })
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let c = self.peek().ok_or(SmilesError::UnexpectedEnd)?;
        let next = self.input.get(self.pos + 1).copied();
        let (element, aromatic, width) = match (c, next) {
            (b'B', Some(b'r')) => (Element::Br, false, 2),
            (b'C', Some(b'l')) => (Element::Cl, false, 2),
            (b'B', _) => (Element::B, false, 1),
            (b'C', _) => (Element::C, false, 1),
            (b'N', _) => (Element::N, false, 1),
            (b'O', _) => (Element::O, false, 1),
            (b'P', _) => (Element::P, false, 1),
            (b'S', _) => (Element::S, false, 1),
            (b'F', _) => (Element::F, false, 1),
            (b'I', _) => (Element::I, false, 1),
            (b'b', _) => (Element::B, true, 1),
            (b'c', _) => (Element::C, true, 1),
            (b'n', _) => (Element::N, true, 1),
            (b'o', _) => (Element::O, true, 1),
            (b'p', _) => (Element::P, true, 1),
            (b's', _) => (Element::S, true, 1),
            (c, _) if c.is_ascii_alphabetic() => {
                return Err(SmilesError::UnknownElement {
                    pos: start,
                    symbol: (c as char).to_string(),
                });
            }
            _ => return Err(self.unexpected()),
        };
        self.pos += width;

        Ok(if aromatic {
            Atom::aromatic(element)
        } else {
            Atom::new(element)
        })
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        self.pos += 1; // '['

        let isotope_start = self.pos;
        let isotope = match self.number() {
            Some(value) => Some(
                u16::try_from(value).map_err(|_| SmilesError::InvalidIsotope {
                    pos: isotope_start,
                })?,
            ),
            None => None,
        };

        let start = self.pos;
        let c = self.peek().ok_or(SmilesError::UnexpectedEnd)?;
        let (element, aromatic) = if c.is_ascii_uppercase() {
            let two = self
                .input
                .get(self.pos + 1)
                .filter(|n| n.is_ascii_lowercase())
                .and_then(|&n| {
                    let symbol = [c, n];
                    std::str::from_utf8(&symbol)
                        .ok()
                        .and_then(Element::from_symbol)
                });
            match two {
                Some(element) => {
                    self.pos += 2;
                    (element, false)
                }
                None => {
                    let symbol = (c as char).to_string();
                    let element =
                        Element::from_symbol(&symbol).ok_or_else(|| SmilesError::UnknownElement {
                            pos: start,
                            symbol: self.symbol_at(start),
                        })?;
                    self.pos += 1;
                    (element, false)
                }
            }
        } else if c.is_ascii_lowercase() {
            let symbol = (c.to_ascii_uppercase() as char).to_string();
            let element = Element::from_symbol(&symbol)
                .filter(|e| e.can_be_aromatic())
                .ok_or_else(|| SmilesError::UnknownElement {
                    pos: start,
                    symbol: self.symbol_at(start),
                })?;
            self.pos += 1;
            (element, true)
        } else {
            return Err(self.unexpected());
        };

        let mut atom = if aromatic {
            Atom::aromatic(element)
        } else {
            Atom::new(element)
        };
        atom.no_implicit = true;
        atom.isotope = isotope;

        if self.peek() == Some(b'@') {
            self.pos += 1;
            atom.chirality = if self.peek() == Some(b'@') {
                self.pos += 1;
                Chirality::Clockwise
            } else {
                Chirality::CounterClockwise
            };
        }

        if self.peek() == Some(b'H') {
            self.pos += 1;
            atom.explicit_hydrogens = match self.peek() {
                Some(d @ b'0'..=b'9') => {
                    self.pos += 1;
                    d - b'0'
                }
                _ => 1,
            };
        }

        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let charge_start = self.pos;
            self.pos += 1;
            let magnitude = match self.number() {
                Some(n) => n,
                None => {
                    let mut count = 1;
                    while self.peek() == Some(sign) {
                        self.pos += 1;
                        count += 1;
                    }
                    count
                }
            };
            let magnitude = i8::try_from(magnitude)
                .ok()
                .filter(|m| *m <= MAX_CHARGE)
                .ok_or(SmilesError::InvalidCharge { pos: charge_start })?;
            atom.formal_charge = if sign == b'+' { magnitude } else { -magnitude };
        }

        if self.peek() == Some(b':') {
            self.pos += 1;
            if self.number().is_none() {
                return Err(self.unexpected());
            }
        }

        match self.peek() {
            Some(b']') => {
                self.pos += 1;
                Ok(atom)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Reads a run of digits, saturating instead of overflowing.
    fn number(&mut self) -> Option<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(d @ b'0'..=b'9') = self.peek() {
            value = value.saturating_mul(10).saturating_add(u64::from(d - b'0'));
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    fn symbol_at(&self, start: usize) -> String {
        self.input[start..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic())
            .map(|&c| c as char)
            .collect()
    }
}
