use greetrpc_common::MAX_NAME_SIZE;

/// Request body cap. JSON-encoded names can be several times the raw name
/// length once escaping is applied, so the limit leaves that headroom and the
/// handler still gets to validate the decoded name and return 400.
pub const MAX_BODY_SIZE: usize = 8 * MAX_NAME_SIZE;

/// Latency injection tiers for the hedging demo. A roll in `0..100` selects
/// the first tier whose upper bound it falls under: 1% of calls stall 10s,
/// the next 4% stall 5s, the next 5% stall 2s, the rest answer immediately.
pub const LATENCY_TIERS: [(u32, u64); 3] = [(1, 10_000), (5, 5_000), (10, 2_000)];

/// Map a roll in `0..100` to the injected delay in milliseconds.
pub fn injected_delay_ms(roll: u32) -> u64 {
    for (upper, delay_ms) in LATENCY_TIERS {
        if roll < upper {
            return delay_ms;
        }
    }
    0
}
