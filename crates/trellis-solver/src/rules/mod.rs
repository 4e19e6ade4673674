//! Join, meet and subtyping rules, as `impl` blocks on `TypeLattice`.

mod join;
mod meet;
mod subtype;

#[cfg(test)]
#[path = "../../tests/law_tests.rs"]
mod law_tests;

#[cfg(test)]
#[path = "../../tests/concurrency_tests.rs"]
mod concurrency_tests;
