/// Load scenarios, each pairing a server fault profile with the client-side
/// policy it demonstrates.
///
/// | Scenario  | Server behavior        | Client call path  |
/// |-----------|------------------------|-------------------|
/// | Hello     | plain                  | single call       |
/// | Retry     | 50% UNAVAILABLE        | retry policy      |
/// | Hedging   | latency tiers injected | hedging policy    |
/// | NoHedging | latency tiers injected | single call       |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Hello,
    Retry,
    Hedging,
    NoHedging,
}

impl Scenario {
    pub fn from_name(name: &str) -> Option<Scenario> {
        match name {
            "hello" => Some(Scenario::Hello),
            "retry" => Some(Scenario::Retry),
            "hedging" => Some(Scenario::Hedging),
            "no-hedging" => Some(Scenario::NoHedging),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Scenario::Hello => "hello",
            Scenario::Retry => "retry",
            Scenario::Hedging => "hedging",
            Scenario::NoHedging => "no-hedging",
        }
    }

    /// Label printed in the summary block.
    pub fn as_label(&self) -> &'static str {
        match self {
            Scenario::Hello => "Plain client",
            Scenario::Retry => "Retrying enabled",
            Scenario::Hedging => "Hedging enabled",
            Scenario::NoHedging => "Hedging disabled",
        }
    }

    /// Extra flags passed to the spawned `greetrpc-server` process.
    pub fn server_args(&self) -> Vec<&'static str> {
        match self {
            Scenario::Hello => vec![],
            Scenario::Retry => vec!["--unavailable-ratio", "0.5"],
            Scenario::Hedging | Scenario::NoHedging => vec!["--inject-latency"],
        }
    }

    /// Calls issued when the CLI does not override the count. The retry
    /// scenario stays small because every declined call burns backoff time.
    pub fn default_call_count(&self) -> usize {
        match self {
            Scenario::Hello => 200,
            Scenario::Retry => 50,
            Scenario::Hedging | Scenario::NoHedging => 2_000,
        }
    }
}
