//! Test-only crate. The integration suites live under `tests/`.
