// Monte Carlo simulation tests for the odds table
//
// These tests verify that the wheel's mathematical properties hold in
// practice, not just in theory. They prove:
// 1. Every bet type returns exactly 36/37 of the stake on average
// 2. Random bytes map onto the 37 pockets uniformly
// 3. The worst-case payout used for reservations is never exceeded

pub mod ev_convergence;
