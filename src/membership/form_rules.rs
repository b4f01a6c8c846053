//! Declarative quorum rules per segment form
//!
//! Every segment form is described by one `FormRules` record. A record only
//! spells out where the form deviates from `DEFAULT`; the predicates are
//! small expressions over a `Tally` of role counts and round flags, so each
//! form can be audited and tested on its own.
//!
//! The same `Tally` shape serves every question:
//! - create/commit merges count good acknowledgements per role
//! - read merges count good readers, with `Fetch` the data-returning ones
//! - process rules count members still alive mid-round
//! - done rules count members known to be disconnected

use super::io_context::IoActionContext;
use super::segment_form::SegmentForm;

/// A counted quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Term {
    /// Primaries
    P,
    /// Secondaries
    S,
    /// Joining secondaries
    J,
    /// Arbiters
    A,
    /// Secondaries that returned data for a read
    Fetch,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    Lit(u32),
    /// The volume type's write quorum size
    Quorum,
    /// Write quorum size minus a constant
    QuorumLess(u32),
    /// Members the round asked to write
    TotalWrite,
}

/// Round-level observation taken from the `IoActionContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    PrimaryDown,
    SecondaryDown,
    JoiningDown,
    MetReadDownSecondary,
}

/// Boolean predicate over a `Tally`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rule {
    Always,
    Never,
    Is(Flag),
    AtLeast(&'static [Term], Bound),
    Below(&'static [Term], Bound),
    Equal(&'static [Term], Bound),
    Not(&'static Rule),
    All(&'static [Rule]),
    Any(&'static [Rule]),
    /// `When(condition, then, otherwise)`
    When(&'static Rule, &'static Rule, &'static Rule),
}

/// Counts and flags a rule is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub primary: u32,
    pub secondary: u32,
    pub joining: u32,
    pub arbiter: u32,
    pub fetch: u32,
    pub total_write: u32,
    pub write_quorum: u32,
    pub primary_down: bool,
    pub secondary_down: bool,
    pub joining_down: bool,
    pub met_read_down_secondary: bool,
}

impl Tally {
    pub(crate) fn new(write_quorum: u32) -> Self {
        Self {
            write_quorum,
            ..Self::default()
        }
    }

    pub(crate) fn counts(mut self, primary: u32, secondary: u32, joining: u32, arbiter: u32) -> Self {
        self.primary = primary;
        self.secondary = secondary;
        self.joining = joining;
        self.arbiter = arbiter;
        self
    }

    pub(crate) fn fetched(mut self, fetch: u32) -> Self {
        self.fetch = fetch;
        self
    }

    /// Take the round flags and write total from a context.
    pub(crate) fn observe(mut self, ctx: &IoActionContext) -> Self {
        self.total_write = ctx.total_write_count();
        self.primary_down = ctx.is_primary_down();
        self.secondary_down = ctx.is_secondary_down();
        self.joining_down = ctx.is_joining_secondary_down();
        self.met_read_down_secondary = ctx.is_met_read_down_secondary();
        self
    }

    fn term(&self, term: Term) -> u32 {
        match term {
            Term::P => self.primary,
            Term::S => self.secondary,
            Term::J => self.joining,
            Term::A => self.arbiter,
            Term::Fetch => self.fetch,
        }
    }

    fn sum(&self, terms: &[Term]) -> u32 {
        terms.iter().map(|t| self.term(*t)).sum()
    }

    fn bound(&self, bound: Bound) -> u32 {
        match bound {
            Bound::Lit(n) => n,
            Bound::Quorum => self.write_quorum,
            Bound::QuorumLess(n) => self.write_quorum.saturating_sub(n),
            Bound::TotalWrite => self.total_write,
        }
    }

    fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::PrimaryDown => self.primary_down,
            Flag::SecondaryDown => self.secondary_down,
            Flag::JoiningDown => self.joining_down,
            Flag::MetReadDownSecondary => self.met_read_down_secondary,
        }
    }
}

impl Rule {
    pub(crate) fn holds(&self, t: &Tally) -> bool {
        match self {
            Rule::Always => true,
            Rule::Never => false,
            Rule::Is(flag) => t.flag(*flag),
            Rule::AtLeast(terms, bound) => t.sum(terms) >= t.bound(*bound),
            Rule::Below(terms, bound) => t.sum(terms) < t.bound(*bound),
            Rule::Equal(terms, bound) => t.sum(terms) == t.bound(*bound),
            Rule::Not(rule) => !rule.holds(t),
            Rule::All(rules) => rules.iter().all(|r| r.holds(t)),
            Rule::Any(rules) => rules.iter().any(|r| r.holds(t)),
            Rule::When(cond, then, otherwise) => {
                if cond.holds(t) {
                    then.holds(t)
                } else {
                    otherwise.holds(t)
                }
            }
        }
    }
}

/// Full behaviour of one segment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormRules {
    /// Create-log and commit-log success
    pub write_merge: Rule,
    pub read_merge: Rule,
    /// Resend immediately, given members still alive during a write
    pub write_resend: Rule,
    /// Resend immediately, given members still alive during a read
    pub read_resend: Rule,
    /// When a read goes on, the primary alone confirms it
    pub trim_check_reads: bool,
    pub write_done: Rule,
    pub read_done: Rule,
    pub can_generate_new_primary: bool,
    pub only_primary: bool,
    pub safe_with_secondary_missing: bool,
    /// Skipped secondaries at which source volume data is skipped
    pub skip_threshold: u32,
}

use Bound::{Lit, Quorum, QuorumLess, TotalWrite};
use Term::{Fetch, A, J, P, S};

const PRIMARY_DOWN: Rule = Rule::Is(Flag::PrimaryDown);
const PRIMARY_UP: Rule = Rule::Not(&PRIMARY_DOWN);
const PRIMARY_ALIVE: Rule = Rule::AtLeast(&[P], Lit(1));
const PRIMARY_GONE: Rule = Rule::Below(&[P], Lit(1));
const PRIMARY_UP_AND_ALIVE: Rule = Rule::All(&[PRIMARY_UP, PRIMARY_ALIVE]);

/// Standard read progress: without a primary resend, otherwise drop checks.
const PRIMARY_READ: (Rule, bool) = (PRIMARY_GONE, true);

const DEFAULT: FormRules = FormRules {
    write_merge: Rule::Equal(&[P, S, J], TotalWrite),
    read_merge: Rule::Never,
    write_resend: Rule::Never,
    read_resend: Rule::Never,
    trim_check_reads: false,
    write_done: Rule::Never,
    read_done: Rule::Never,
    can_generate_new_primary: false,
    only_primary: false,
    safe_with_secondary_missing: true,
    skip_threshold: 1,
};

/// Forms whose missing members make every write and read resend.
const ALWAYS_RESEND: FormRules = FormRules {
    write_resend: Rule::Always,
    read_resend: Rule::Always,
    ..DEFAULT
};

// ---------------------------------------------------------------------------
// Three-member forms
// ---------------------------------------------------------------------------

const PSS: FormRules = FormRules {
    write_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::AtLeast(&[S], Quorum),
        &Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[S], Lit(1))]),
    ),
    read_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::When(
            &Rule::Is(Flag::MetReadDownSecondary),
            &Rule::AtLeast(&[S], Lit(1)),
            &Rule::All(&[Rule::AtLeast(&[Fetch], Lit(1)), Rule::AtLeast(&[S], Quorum)]),
        ),
        &Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[S], Lit(1))]),
    ),
    write_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Below(&[S], Quorum),
        &Rule::Below(&[S], Lit(1)),
    ),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::When(
            &Rule::Is(Flag::MetReadDownSecondary),
            &Rule::Below(&[S], Lit(1)),
            &Rule::Below(&[S], Quorum),
        ),
        &Rule::Below(&[S], Lit(1)),
    ),
    write_done: Rule::AtLeast(&[P, S], Quorum),
    read_done: Rule::AtLeast(&[P, S], Quorum),
    can_generate_new_primary: true,
    skip_threshold: 2,
    ..DEFAULT
};

const PSJ: FormRules = FormRules {
    write_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::AtLeast(&[S, J], Quorum),
        &Rule::All(&[
            PRIMARY_ALIVE,
            Rule::When(
                &Rule::Is(Flag::SecondaryDown),
                &Rule::AtLeast(&[J], Lit(1)),
                &Rule::AtLeast(&[S], Lit(1)),
            ),
        ]),
    ),
    read_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::AtLeast(&[S, J], Quorum),
        &Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[S, J], Lit(1))]),
    ),
    write_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Below(&[S, J], Quorum),
        &Rule::Below(&[S, J], Lit(1)),
    ),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Below(&[S, J], Quorum),
        &Rule::Below(&[S, J], Lit(1)),
    ),
    write_done: Rule::AtLeast(&[P, S, J], Quorum),
    read_done: Rule::AtLeast(&[P, S, J], Quorum),
    can_generate_new_primary: true,
    skip_threshold: 2,
    ..DEFAULT
};

const PSI: FormRules = FormRules {
    write_merge: Rule::All(&[PRIMARY_UP, PRIMARY_ALIVE, Rule::AtLeast(&[S], Lit(1))]),
    read_merge: PRIMARY_UP_AND_ALIVE,
    write_resend: Rule::Below(&[P, S], Quorum),
    read_resend: PRIMARY_READ.0,
    trim_check_reads: PRIMARY_READ.1,
    write_done: Rule::AtLeast(&[P, S], Lit(1)),
    read_done: Rule::AtLeast(&[P], Lit(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

/// Primary with a joining secondary and nothing else usable.
const PRIMARY_WITH_JOINING: FormRules = FormRules {
    write_merge: Rule::All(&[
        PRIMARY_UP,
        PRIMARY_ALIVE,
        Rule::Any(&[Rule::Is(Flag::JoiningDown), Rule::AtLeast(&[J], Lit(1))]),
    ]),
    read_merge: PRIMARY_ALIVE,
    write_resend: PRIMARY_GONE,
    read_resend: PRIMARY_READ.0,
    trim_check_reads: PRIMARY_READ.1,
    write_done: PRIMARY_ALIVE,
    read_done: PRIMARY_ALIVE,
    ..DEFAULT
};

const PJI: FormRules = PRIMARY_WITH_JOINING;

const PJJ: FormRules = FormRules {
    write_merge: Rule::Never,
    read_merge: PRIMARY_ALIVE,
    write_resend: Rule::Always,
    read_resend: PRIMARY_READ.0,
    trim_check_reads: PRIMARY_READ.1,
    write_done: Rule::Always,
    read_done: PRIMARY_ALIVE,
    ..DEFAULT
};

/// Primary is the only member holding data.
const LONE_PRIMARY: FormRules = FormRules {
    write_merge: PRIMARY_UP_AND_ALIVE,
    read_merge: PRIMARY_ALIVE,
    write_resend: PRIMARY_GONE,
    read_resend: PRIMARY_READ.0,
    trim_check_reads: PRIMARY_READ.1,
    write_done: PRIMARY_ALIVE,
    read_done: PRIMARY_ALIVE,
    only_primary: true,
    ..DEFAULT
};

const PII: FormRules = LONE_PRIMARY;

/// Primary with one secondary and no quorum to spare.
const PRIMARY_WITH_SECONDARY: FormRules = FormRules {
    write_merge: Rule::All(&[
        PRIMARY_UP,
        PRIMARY_ALIVE,
        Rule::Any(&[Rule::Is(Flag::SecondaryDown), Rule::AtLeast(&[S], Lit(1))]),
    ]),
    read_merge: PRIMARY_UP_AND_ALIVE,
    write_resend: PRIMARY_GONE,
    read_resend: PRIMARY_READ.0,
    trim_check_reads: PRIMARY_READ.1,
    write_done: PRIMARY_ALIVE,
    read_done: PRIMARY_ALIVE,
    ..DEFAULT
};

const PS: FormRules = PRIMARY_WITH_SECONDARY;

const PJ: FormRules = PRIMARY_WITH_JOINING;

const PI: FormRules = FormRules {
    trim_check_reads: false,
    ..LONE_PRIMARY
};

const PSA: FormRules = FormRules {
    write_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::AtLeast(&[S], Lit(1)),
        &Rule::All(&[
            PRIMARY_ALIVE,
            Rule::Any(&[Rule::Is(Flag::SecondaryDown), Rule::AtLeast(&[S], Lit(1))]),
        ]),
    ),
    read_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::AtLeast(&[S, A], Quorum),
        &Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[P, S, A], Quorum)]),
    ),
    write_resend: Rule::Below(&[P, S], Lit(1)),
    read_resend: Rule::When(
        &PRIMARY_DOWN,
        &Rule::Below(&[S, A], Quorum),
        &Rule::Any(&[PRIMARY_GONE, Rule::Below(&[P, S, A], Quorum)]),
    ),
    write_done: Rule::AtLeast(&[P, S], Quorum),
    read_done: Rule::AtLeast(&[P, S, A], Quorum),
    can_generate_new_primary: true,
    safe_with_secondary_missing: false,
    ..DEFAULT
};

const PJA: FormRules = PRIMARY_WITH_JOINING;

const PIA: FormRules = LONE_PRIMARY;

const PA: FormRules = FormRules {
    read_merge: PRIMARY_UP_AND_ALIVE,
    ..LONE_PRIMARY
};

const TPS: FormRules = PRIMARY_WITH_SECONDARY;

const TPJ: FormRules = PRIMARY_WITH_JOINING;

const TPI: FormRules = LONE_PRIMARY;

// ---------------------------------------------------------------------------
// Five-member forms (and their four-member remnants)
//
// Create and commit keep the default all-written rule.
// ---------------------------------------------------------------------------

const SECONDARY_ARBITER_READ: Rule = Rule::When(
    &PRIMARY_DOWN,
    &Rule::All(&[Rule::AtLeast(&[Fetch], Lit(1)), Rule::AtLeast(&[S, A], Quorum)]),
    &Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[S, A], Lit(2))]),
);

const JOINING_ARBITER_READ: Rule = Rule::When(
    &PRIMARY_DOWN,
    &Rule::All(&[Rule::AtLeast(&[Fetch], Lit(1)), Rule::AtLeast(&[J, A], Lit(2))]),
    &Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[S, J, A], Lit(2))]),
);

const PRIMARY_AND_TWO_JA: Rule = Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]);
const PRIMARY_AND_TWO_SA: Rule = Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[S, A], Lit(2))]);

const GONE_OR_NO_SECONDARY: Rule = Rule::Any(&[PRIMARY_GONE, Rule::Below(&[S], Lit(1))]);
const GONE_OR_NO_JOINING: Rule = Rule::Any(&[PRIMARY_GONE, Rule::Below(&[J], Lit(1))]);
const GONE_OR_FEW_JA: Rule = Rule::Any(&[PRIMARY_GONE, Rule::Below(&[J, A], Lit(2))]);
const GONE_OR_FEW_SA: Rule = Rule::Any(&[PRIMARY_GONE, Rule::Below(&[S, A], Lit(2))]);
const GONE_OR_FEW_A: Rule = Rule::Any(&[PRIMARY_GONE, Rule::Below(&[A], Lit(2))]);

const PSSAA: FormRules = FormRules {
    read_merge: SECONDARY_ARBITER_READ,
    write_resend: Rule::All(&[PRIMARY_GONE, Rule::Below(&[S], Lit(1))]),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Below(&[S, A], Quorum),
        &Rule::Below(&[S, A], Lit(2)),
    ),
    write_done: Rule::AtLeast(&[P, S, A], Quorum),
    read_done: Rule::AtLeast(&[P, S, A], Quorum),
    can_generate_new_primary: true,
    safe_with_secondary_missing: false,
    ..DEFAULT
};

const PSSAI: FormRules = FormRules {
    read_merge: SECONDARY_ARBITER_READ,
    write_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Below(&[S], Lit(2)),
        &Rule::Below(&[S], Lit(1)),
    ),
    read_resend: PSSAA.read_resend,
    write_done: Rule::AtLeast(&[P, S, A], QuorumLess(1)),
    read_done: Rule::AtLeast(&[P, S, A], QuorumLess(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSSII: FormRules = FormRules {
    read_merge: Rule::All(&[PRIMARY_UP, PRIMARY_ALIVE, Rule::AtLeast(&[S], Lit(2))]),
    write_resend: Rule::Any(&[PRIMARY_GONE, Rule::Below(&[S], Lit(2))]),
    read_resend: Rule::Any(&[PRIMARY_GONE, Rule::Below(&[S], Lit(2))]),
    write_done: Rule::AtLeast(&[P, S], Lit(1)),
    read_done: Rule::AtLeast(&[P, S, A], Lit(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSJAA: FormRules = FormRules {
    read_merge: JOINING_ARBITER_READ,
    write_resend: Rule::All(&[PRIMARY_GONE, Rule::Below(&[S], Lit(1))]),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Any(&[Rule::Below(&[S], Lit(1)), Rule::Below(&[J, A], Lit(2))]),
        &Rule::Below(&[S, J, A], Lit(2)),
    ),
    write_done: Rule::Any(&[
        Rule::AtLeast(&[P, S, J, A], Quorum),
        Rule::AtLeast(&[P, S], Lit(2)),
    ]),
    read_done: Rule::Any(&[
        Rule::AtLeast(&[P, S, J, A], Quorum),
        Rule::AtLeast(&[P, S], Lit(2)),
    ]),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSJAI: FormRules = FormRules {
    read_merge: JOINING_ARBITER_READ,
    write_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Any(&[Rule::Below(&[S], Lit(1)), Rule::Below(&[J], Lit(1))]),
        &Rule::Below(&[S, J], Lit(1)),
    ),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Any(&[Rule::Below(&[S], Lit(1)), Rule::Below(&[J, A], Lit(2))]),
        &Rule::All(&[Rule::AtLeast(&[S, J, A], Lit(1)), Rule::Below(&[S, J, A], Lit(2))]),
    ),
    write_done: Rule::AtLeast(&[P, S, J, A], QuorumLess(1)),
    read_done: Rule::AtLeast(&[P, S, J, A], QuorumLess(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSJII: FormRules = FormRules {
    read_merge: Rule::Equal(&[P, S, J], Quorum),
    write_resend: Rule::Any(&[PRIMARY_GONE, Rule::Below(&[S, J], Lit(2))]),
    read_resend: Rule::Any(&[PRIMARY_GONE, Rule::Below(&[S, J], Lit(2))]),
    write_done: Rule::AtLeast(&[P, S, J], Lit(1)),
    read_done: Rule::AtLeast(&[P, S, J], Lit(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSIAA: FormRules = FormRules {
    read_merge: SECONDARY_ARBITER_READ,
    write_resend: Rule::Below(&[P, S], Lit(1)),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Any(&[Rule::Below(&[S], Lit(1)), Rule::Below(&[A], Lit(2))]),
        &Rule::Below(&[S, A], Lit(2)),
    ),
    write_done: Rule::AtLeast(&[P, S, A], QuorumLess(1)),
    read_done: Rule::AtLeast(&[P, S, A], QuorumLess(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSIAI: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_SA,
    write_resend: GONE_OR_NO_SECONDARY,
    read_resend: GONE_OR_FEW_SA,
    write_done: Rule::AtLeast(&[P, S, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, S, A], Lit(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSIII: FormRules = ALWAYS_RESEND;

const PJJAA: FormRules = FormRules {
    read_merge: Rule::All(&[PRIMARY_UP, PRIMARY_AND_TWO_JA]),
    write_resend: GONE_OR_NO_JOINING,
    read_resend: GONE_OR_FEW_JA,
    write_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(3))]),
    read_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(3))]),
    ..DEFAULT
};

const PJJAI: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_JA,
    write_resend: GONE_OR_NO_JOINING,
    read_resend: GONE_OR_FEW_JA,
    write_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]),
    read_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]),
    ..DEFAULT
};

const PJJII: FormRules = FormRules {
    read_merge: Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[J], Lit(2))]),
    write_resend: Rule::Any(&[PRIMARY_GONE, Rule::Below(&[J], Lit(2))]),
    read_resend: Rule::Any(&[PRIMARY_GONE, Rule::Below(&[J], Lit(2))]),
    write_done: Rule::AtLeast(&[P, J], Lit(1)),
    read_done: Rule::AtLeast(&[P, J], Lit(1)),
    ..DEFAULT
};

const PJIAA: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_JA,
    write_resend: GONE_OR_NO_JOINING,
    read_resend: GONE_OR_FEW_JA,
    write_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]),
    read_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]),
    ..DEFAULT
};

const PJIAI: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_JA,
    write_resend: GONE_OR_NO_JOINING,
    read_resend: GONE_OR_FEW_JA,
    write_done: Rule::AtLeast(&[P, J, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, J, A], Lit(1)),
    ..DEFAULT
};

const PJIII: FormRules = ALWAYS_RESEND;

const PIIAA: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_JA,
    write_resend: PRIMARY_GONE,
    read_resend: GONE_OR_FEW_A,
    write_done: Rule::AtLeast(&[P, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, A], Lit(1)),
    only_primary: true,
    ..DEFAULT
};

const PIIAI: FormRules = ALWAYS_RESEND;

const PIIII: FormRules = ALWAYS_RESEND;

const PSAA: FormRules = FormRules {
    read_merge: Rule::When(
        &PRIMARY_DOWN,
        &Rule::AtLeast(&[Fetch, A], Quorum),
        &PRIMARY_AND_TWO_SA,
    ),
    write_resend: Rule::All(&[PRIMARY_GONE, Rule::Below(&[S], Lit(1))]),
    read_resend: Rule::When(
        &PRIMARY_GONE,
        &Rule::Any(&[Rule::Below(&[S], Lit(1)), Rule::Below(&[A], Lit(2))]),
        &Rule::Below(&[S, A], Lit(2)),
    ),
    write_done: Rule::AtLeast(&[P, S, A], QuorumLess(1)),
    read_done: Rule::AtLeast(&[P, S, A], QuorumLess(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSAI: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_SA,
    write_resend: GONE_OR_NO_SECONDARY,
    read_resend: GONE_OR_FEW_SA,
    write_done: Rule::AtLeast(&[P, S, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, S, A], Lit(1)),
    can_generate_new_primary: true,
    ..DEFAULT
};

const PSII: FormRules = ALWAYS_RESEND;

const PIAA: FormRules = FormRules {
    read_merge: Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[A], Lit(2))]),
    write_resend: PRIMARY_GONE,
    read_resend: GONE_OR_FEW_A,
    write_done: Rule::AtLeast(&[P, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, A], Lit(1)),
    only_primary: true,
    ..DEFAULT
};

const PIAI: FormRules = ALWAYS_RESEND;

const PIII: FormRules = ALWAYS_RESEND;

const PJAA: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_JA,
    write_resend: PRIMARY_GONE,
    read_resend: GONE_OR_FEW_JA,
    write_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]),
    read_done: Rule::Any(&[PRIMARY_ALIVE, Rule::AtLeast(&[J, A], Lit(2))]),
    ..DEFAULT
};

const PJAI: FormRules = FormRules {
    read_merge: PRIMARY_AND_TWO_JA,
    write_resend: GONE_OR_NO_JOINING,
    read_resend: GONE_OR_FEW_JA,
    write_done: Rule::AtLeast(&[P, J, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, J, A], Lit(1)),
    ..DEFAULT
};

const PJII: FormRules = ALWAYS_RESEND;

const PAA: FormRules = FormRules {
    read_merge: Rule::All(&[PRIMARY_ALIVE, Rule::AtLeast(&[A], Lit(2))]),
    write_resend: PRIMARY_GONE,
    read_resend: GONE_OR_FEW_A,
    write_done: Rule::AtLeast(&[P, A], Lit(1)),
    read_done: Rule::AtLeast(&[P, A], Lit(1)),
    only_primary: true,
    ..DEFAULT
};

/// The rule record of a form.
pub(crate) fn rules_of(form: SegmentForm) -> &'static FormRules {
    match form {
        SegmentForm::PSS => &PSS,
        SegmentForm::PSJ => &PSJ,
        SegmentForm::PSI => &PSI,
        SegmentForm::PJI => &PJI,
        SegmentForm::PJJ => &PJJ,
        SegmentForm::PII => &PII,
        SegmentForm::PS => &PS,
        SegmentForm::PJ => &PJ,
        SegmentForm::PI => &PI,
        SegmentForm::PSA => &PSA,
        SegmentForm::PJA => &PJA,
        SegmentForm::PIA => &PIA,
        SegmentForm::PA => &PA,
        SegmentForm::TPS => &TPS,
        SegmentForm::TPJ => &TPJ,
        SegmentForm::TPI => &TPI,
        SegmentForm::PSSAA => &PSSAA,
        SegmentForm::PSSAI => &PSSAI,
        SegmentForm::PSSII => &PSSII,
        SegmentForm::PSJAA => &PSJAA,
        SegmentForm::PSJAI => &PSJAI,
        SegmentForm::PSJII => &PSJII,
        SegmentForm::PSIAA => &PSIAA,
        SegmentForm::PSIAI => &PSIAI,
        SegmentForm::PSIII => &PSIII,
        SegmentForm::PJJAA => &PJJAA,
        SegmentForm::PJJAI => &PJJAI,
        SegmentForm::PJJII => &PJJII,
        SegmentForm::PJIAA => &PJIAA,
        SegmentForm::PJIAI => &PJIAI,
        SegmentForm::PJIII => &PJIII,
        SegmentForm::PIIAA => &PIIAA,
        SegmentForm::PIIAI => &PIIAI,
        SegmentForm::PIIII => &PIIII,
        SegmentForm::PSAA => &PSAA,
        SegmentForm::PSAI => &PSAI,
        SegmentForm::PSII => &PSII,
        SegmentForm::PIAA => &PIAA,
        SegmentForm::PIAI => &PIAI,
        SegmentForm::PIII => &PIII,
        SegmentForm::PJAA => &PJAA,
        SegmentForm::PJAI => &PJAI,
        SegmentForm::PJII => &PJII,
        SegmentForm::PAA => &PAA,
    }
}
