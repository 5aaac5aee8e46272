// Cross-module tests for the money paths.
//
// Each #[test] runs on its own thread and therefore starts from empty stable
// memory. Property tests that need a clean slate per case use
// `fixtures::in_fresh_state`.

mod integration;
mod monte_carlo;
mod stress_tests;
