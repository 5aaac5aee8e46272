// End-to-end flows through the real state, with the asset ledger simulated.
//
// 1. Roll lifecycle: submit, resolve, refund, and their races
// 2. Exchange flows: chips and liquidity in and out, including failed transfers

mod roll_lifecycle;
