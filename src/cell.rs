use crate::force::{self, Relation};
use colony_common::{angle_to_vec, SimParams, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

/// Stable identity of a cell. Equals the cell's slot in the colony and is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cell-cycle phase. Being an enum, exactly one phase holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Growing. Every new cell starts here.
    #[default]
    G1,
    /// Committed to budding; resolved within the same step.
    S,
    /// Mother still attached to an undivided bud.
    G2,
    /// Ready for mitosis; resolved within the same step.
    M,
}

impl Phase {
    /// Slot of the phase in per-phase tallies, ordered G1, S, G2, M.
    pub fn index(self) -> usize {
        match self {
            Phase::G1 => 0,
            Phase::S => 1,
            Phase::G2 => 2,
            Phase::M => 3,
        }
    }
}

/// A cross-cell effect produced while evaluating one cell's cycle, applied by the colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSignal {
    /// The bud is large enough to separate: its mother must enter M.
    MotherEntersMitosis(CellId),
}

/// A single budding cell. Owned by the colony; `mother`/`daughter` are plain id links.
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    position: Vec2,
    radius: f64,
    max_radius: f64,
    age: u32,
    phase: Phase,
    is_bud: bool,
    has_bud: bool,
    mother: Option<CellId>,
    daughter: Option<CellId>,
    current_force: Vec2,
}

impl Cell {
    /// Creates a founder cell: no mother, phase G1.
    pub fn founder(id: CellId, position: Vec2, max_radius: f64, init_radius: f64) -> Self {
        Cell {
            id,
            position,
            radius: init_radius,
            max_radius,
            age: 0,
            phase: Phase::G1,
            is_bud: false,
            has_bud: false,
            mother: None,
            daughter: None,
            current_force: Vec2::zero(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_bud(&self) -> bool {
        self.is_bud
    }

    pub fn has_bud(&self) -> bool {
        self.has_bud
    }

    pub fn mother(&self) -> Option<CellId> {
        self.mother
    }

    pub fn daughter(&self) -> Option<CellId> {
        self.daughter
    }

    pub fn current_force(&self) -> Vec2 {
        self.current_force
    }

    /// How `other` relates to this cell.
    pub fn relation_to(&self, other: CellId) -> Relation {
        if self.mother == Some(other) {
            Relation::Mother
        } else if self.daughter == Some(other) {
            Relation::Daughter
        } else {
            Relation::Stranger
        }
    }

    /// One explicit Euler step of the saturating growth ODE. Only G1 cells grow.
    ///
    /// `f(r) = k_g1 * r + k_g2` is damped by `1 - f(r) / f(max_radius)`, so the
    /// radius approaches `max_radius` asymptotically. Overshoot from rounding
    /// near the asymptote is left as is.
    pub fn grow(&mut self, params: &SimParams) {
        if self.phase != Phase::G1 {
            return;
        }
        let f_radius = params.k_g1 * self.radius + params.k_g2;
        let f_radius_max = params.k_g1 * self.max_radius + params.k_g2;
        let slowing_factor = 1.0 - f_radius / f_radius_max;
        self.radius += f_radius * slowing_factor * params.dt;
    }

    /// Evaluates this step's cell-cycle transition.
    ///
    /// A bud never changes its own phase here; once it passes `k_mitosis` of its
    /// max radius it asks for its mother to enter M. Any other cell moves from
    /// G1 to S once it passes `k_g1_threshold` of its max radius.
    pub fn update_cell_cycle(&mut self, params: &SimParams) -> Option<CycleSignal> {
        if self.is_bud {
            if self.radius > params.k_mitosis * self.max_radius {
                return self.mother.map(CycleSignal::MotherEntersMitosis);
            }
        } else if self.radius > params.k_g1_threshold * self.max_radius && self.phase == Phase::G1 {
            self.phase = Phase::S;
        }
        None
    }

    /// Marks this cell (a mother) ready for mitosis.
    pub fn enter_mitosis(&mut self) {
        self.phase = Phase::M;
    }

    /// Creates this cell's bud and moves this cell to G2.
    ///
    /// The bud sits on the mother's rim at a uniformly random angle, starts at
    /// `bud_radius_fraction` of the mother's max radius and inherits the max radius.
    /// The caller registers the returned cell under `new_id`.
    ///
    /// # Panics
    /// If the cell is not in S or already has a bud.
    pub fn bud<R: Rng + ?Sized>(&mut self, new_id: CellId, params: &SimParams, rng: &mut R) -> Cell {
        assert_eq!(self.phase, Phase::S, "cell {} budded outside phase S", self.id);
        assert!(!self.has_bud, "cell {} budded while it already has a bud", self.id);

        let theta = rng.random_range(0.0..std::f64::consts::TAU);
        let position = self.position + angle_to_vec(theta) * self.radius;
        let init_radius = params.bud_radius_fraction * self.max_radius;

        let bud = Cell {
            is_bud: true,
            mother: Some(self.id),
            ..Cell::founder(new_id, position, self.max_radius, init_radius)
        };

        self.daughter = Some(new_id);
        self.has_bud = true;
        self.phase = Phase::G2;
        bud
    }

    /// Mother's half of mitosis: drops the bud link and returns to G1.
    /// Returns the released daughter, whose own half is `detach_from_mother`.
    ///
    /// # Panics
    /// If the cell is not in M or has no daughter.
    pub fn complete_mitosis(&mut self) -> CellId {
        assert_eq!(self.phase, Phase::M, "cell {} divided outside phase M", self.id);
        let Some(daughter) = self.daughter.take() else {
            panic!("cell {} entered mitosis without a daughter", self.id);
        };
        self.has_bud = false;
        self.phase = Phase::G1;
        daughter
    }

    /// Daughter's half of mitosis: becomes an independent cell. Phase is untouched.
    pub fn detach_from_mother(&mut self) {
        self.is_bud = false;
        self.mother = None;
    }

    pub fn set_force(&mut self, force: Vec2) {
        self.current_force = force;
    }

    /// Explicit Euler position update from the force computed this step.
    pub fn update_location(&mut self, dt: f64) {
        self.position += self.current_force * dt;
    }

    pub fn tick_age(&mut self) {
        self.age += 1;
    }

    /// Largest positive overlap with any other cell of `population`.
    pub fn max_overlap(&self, population: &[Cell]) -> f64 {
        force::max_overlap(self, population)
    }

    /// Writes `id x y radius`.
    pub fn write_txt_record<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{} {} {} {}", self.id, self.position.x, self.position.y, self.radius)
    }

    /// Writes `x y 0` for tools that expect three coordinates.
    pub fn write_center_record<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{} {} 0", self.position.x, self.position.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> SimParams {
        SimParams::default()
    }

    #[test]
    fn growth_is_monotone_and_converges_to_max_radius() {
        let params = params();
        let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.01);
        let mut steps = 0;
        while cell.radius() < 0.6 - 1e-4 {
            let previous = cell.radius();
            cell.grow(&params);
            assert!(cell.radius() > previous, "radius must grow strictly below max");
            steps += 1;
            assert!(steps < 1_000_000, "growth stalled at {}", cell.radius());
        }
        // Keep going well past the point where increments vanish in rounding.
        for _ in 0..100_000 {
            cell.grow(&params);
            assert!(cell.radius() <= 0.6 + 1e-9);
        }
        assert!((cell.radius() - 0.6).abs() < 1e-4);
    }

    #[test]
    fn no_growth_outside_g1() {
        let params = params();
        for phase in [Phase::S, Phase::G2, Phase::M] {
            let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.3);
            cell.phase = phase;
            cell.grow(&params);
            assert_eq!(cell.radius(), 0.3);
        }
    }

    #[test]
    fn founder_enters_s_on_the_step_threshold_is_crossed() {
        let params = SimParams { dt: 0.1, k_g1: 0.01, k_g2: 0.01, ..params() };
        let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.01);
        let threshold = 0.9 * 0.6;
        let mut steps = 0;
        loop {
            let before = cell.radius();
            cell.grow(&params);
            assert_eq!(cell.update_cell_cycle(&params), None);
            steps += 1;
            if cell.radius() > threshold {
                assert!(before <= threshold);
                assert_eq!(cell.phase(), Phase::S);
                break;
            }
            assert_eq!(cell.phase(), Phase::G1);
            assert!(steps < 1_000_000, "threshold never crossed");
        }
    }

    #[test]
    fn g2_mother_does_not_return_to_s() {
        let params = params();
        let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.59);
        cell.phase = Phase::G2;
        cell.update_cell_cycle(&params);
        assert_eq!(cell.phase(), Phase::G2);
        cell.phase = Phase::M;
        cell.update_cell_cycle(&params);
        assert_eq!(cell.phase(), Phase::M);
    }

    #[test]
    fn budding_sets_both_sides_of_the_link() {
        let params = params();
        let mut rng = StdRng::seed_from_u64(7);
        let mut mother = Cell::founder(CellId(0), Vec2::new(1.0, -2.0), 0.6, 0.55);
        mother.phase = Phase::S;

        let bud = mother.bud(CellId(1), &params, &mut rng);

        assert_eq!(mother.phase(), Phase::G2);
        assert!(mother.has_bud());
        assert_eq!(mother.daughter(), Some(CellId(1)));
        assert_eq!(bud.id(), CellId(1));
        assert!(bud.is_bud());
        assert!(!bud.has_bud());
        assert_eq!(bud.mother(), Some(CellId(0)));
        assert_eq!(bud.phase(), Phase::G1);
        assert_eq!(bud.max_radius(), 0.6);
        assert!((bud.radius() - params.bud_radius_fraction * 0.6).abs() < 1e-12);
        let d = bud.position().distance(mother.position());
        assert!((d - 0.55).abs() < 1e-12, "bud must sit on the mother's rim, got d={}", d);
    }

    #[test]
    #[should_panic(expected = "budded outside phase S")]
    fn budding_outside_s_fails_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.3);
        cell.bud(CellId(1), &params(), &mut rng);
    }

    #[test]
    #[should_panic(expected = "already has a bud")]
    fn budding_twice_fails_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.3);
        cell.phase = Phase::S;
        cell.bud(CellId(1), &params(), &mut rng);
        cell.phase = Phase::S;
        cell.bud(CellId(2), &params(), &mut rng);
    }

    #[test]
    fn bud_signals_its_mother_once_large_enough() {
        let params = params();
        let mut rng = StdRng::seed_from_u64(3);
        let mut mother = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.55);
        mother.phase = Phase::S;
        let mut bud = mother.bud(CellId(1), &params, &mut rng);
        bud.radius = 0.2;

        assert_eq!(bud.update_cell_cycle(&params), None);
        bud.radius = 0.7 * 0.6 + 1e-6;
        assert_eq!(
            bud.update_cell_cycle(&params),
            Some(CycleSignal::MotherEntersMitosis(CellId(0)))
        );
        assert_eq!(bud.phase(), Phase::G1, "the bud itself never enters M");
    }

    #[test]
    fn mitosis_halves_clear_the_link() {
        let params = params();
        let mut rng = StdRng::seed_from_u64(5);
        let mut mother = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.55);
        mother.phase = Phase::S;
        let mut bud = mother.bud(CellId(1), &params, &mut rng);
        mother.enter_mitosis();

        let released = mother.complete_mitosis();
        bud.detach_from_mother();

        assert_eq!(released, CellId(1));
        assert_eq!(mother.phase(), Phase::G1);
        assert!(!mother.has_bud());
        assert_eq!(mother.daughter(), None);
        assert!(!bud.is_bud());
        assert_eq!(bud.mother(), None);
        assert_eq!(bud.phase(), Phase::G1);
    }

    #[test]
    #[should_panic(expected = "without a daughter")]
    fn mitosis_without_daughter_fails_fast() {
        let mut cell = Cell::founder(CellId(0), Vec2::zero(), 0.6, 0.55);
        cell.enter_mitosis();
        cell.complete_mitosis();
    }

    #[test]
    fn relation_lookup_uses_links() {
        let params = params();
        let mut rng = StdRng::seed_from_u64(9);
        let mut mother = Cell::founder(CellId(4), Vec2::zero(), 0.6, 0.55);
        mother.phase = Phase::S;
        let bud = mother.bud(CellId(8), &params, &mut rng);
        assert_eq!(mother.relation_to(CellId(8)), Relation::Daughter);
        assert_eq!(bud.relation_to(CellId(4)), Relation::Mother);
        assert_eq!(mother.relation_to(CellId(5)), Relation::Stranger);
    }

    #[test]
    fn update_location_applies_force_times_dt() {
        let mut cell = Cell::founder(CellId(0), Vec2::new(1.0, 1.0), 0.6, 0.5);
        cell.set_force(Vec2::new(2.0, -4.0));
        cell.update_location(0.5);
        assert_eq!(cell.position(), Vec2::new(2.0, -1.0));
    }

    #[test]
    fn text_records_have_expected_layout() {
        let cell = Cell::founder(CellId(3), Vec2::new(1.5, -0.25), 0.6, 0.5);
        let mut txt = Vec::new();
        cell.write_txt_record(&mut txt).unwrap();
        assert_eq!(String::from_utf8(txt).unwrap(), "3 1.5 -0.25 0.5\n");

        let mut centers = Vec::new();
        cell.write_center_record(&mut centers).unwrap();
        assert_eq!(String::from_utf8(centers).unwrap(), "1.5 -0.25 0\n");
    }
}
