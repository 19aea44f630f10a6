//! Value conversion rules.
//!
//! This module decides when a value of one type may be used where another is
//! expected:
//!
//! - [`representable`]: whether a constant fits a basic type
//! - [`untyped`]: finalizing untyped constants against a target type
//! - [`distance`]: the conversion distance and the overload score built on it
//! - [`assignment`]: the `check_assignment` choke point
//! - [`castable`]: explicit `cast(T)` conversions
//!
//! # Distances
//!
//! | Distance | Meaning |
//! |----------|---------|
//! | -1 | not assignable |
//! | 0 | identical |
//! | 1 | untyped constant of the target's kind, or identical structure with one side unnamed |
//! | 2 | untyped constant representable in a target of another kind, or untyped boolean into a named boolean |
//! | 4 | struct embedding the target with `using` |
//! | 5 | pointer into `rawptr` |
//! | 10 | anything into `any` |

mod assignment;
mod castable;
mod distance;
mod representable;
mod untyped;

pub use distance::distance_score;
