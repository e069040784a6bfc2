//! Test suites for handler dispatch and lifecycles.

mod lifecycle;
mod support;
