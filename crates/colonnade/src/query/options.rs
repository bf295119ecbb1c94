use derive_more::Display;

///
/// Consistency
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Consistency {
    #[display("one")]
    One,
    #[display("two")]
    Two,
    #[display("three")]
    Three,
    #[display("quorum")]
    Quorum,
    #[display("all")]
    All,
    #[display("local_one")]
    LocalOne,
    #[display("local_quorum")]
    LocalQuorum,
    #[display("each_quorum")]
    EachQuorum,
}

///
/// RetryPolicy
///
/// Selected here, applied by the execution collaborator. The core never
/// retries on its own.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum RetryPolicy {
    #[display("default")]
    Default,
    #[display("downgrading_consistency")]
    DowngradingConsistency,
    #[display("fallthrough")]
    Fallthrough,
}

///
/// QueryOptions
///
/// One layer of the option stack: per-call override or per-method static
/// options. Every field is independently optional.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryOptions {
    pub fetch_size: Option<u32>,
    pub consistency: Option<Consistency>,
    pub retry_policy: Option<RetryPolicy>,
}

impl QueryOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fetch_size: None,
            consistency: None,
            retry_policy: None,
        }
    }

    #[must_use]
    pub const fn fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    #[must_use]
    pub const fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    #[must_use]
    pub const fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }
}

///
/// ProfileDefaults
///
/// Process-wide option defaults supplied by the execution collaborator;
/// always fully populated.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProfileDefaults {
    pub fetch_size: u32,
    pub consistency: Consistency,
    pub retry_policy: RetryPolicy,
}

///
/// EffectiveOptions
///
/// Fully-resolved per-invocation options; no unset fields remain.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EffectiveOptions {
    pub fetch_size: u32,
    pub consistency: Consistency,
    pub retry_policy: RetryPolicy,
}

impl EffectiveOptions {
    /// Merge the three option sources, per field, highest precedence first:
    /// per-call override, then per-method statics, then profile defaults.
    /// Pure function of its inputs.
    #[must_use]
    pub fn resolve(
        call: Option<&QueryOptions>,
        method: Option<&QueryOptions>,
        defaults: &ProfileDefaults,
    ) -> Self {
        fn pick<T: Copy>(call: Option<T>, method: Option<T>, default: T) -> T {
            call.or(method).unwrap_or(default)
        }

        Self {
            fetch_size: pick(
                call.and_then(|o| o.fetch_size),
                method.and_then(|o| o.fetch_size),
                defaults.fetch_size,
            ),
            consistency: pick(
                call.and_then(|o| o.consistency),
                method.and_then(|o| o.consistency),
                defaults.consistency,
            ),
            retry_policy: pick(
                call.and_then(|o| o.retry_policy),
                method.and_then(|o| o.retry_policy),
                defaults.retry_policy,
            ),
        }
    }
}

///
/// TESTS
///
