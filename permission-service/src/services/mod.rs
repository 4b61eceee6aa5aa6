pub mod decision_cache;
pub mod error;
pub mod identity;
pub mod memory;
pub mod redis;
pub mod sink;
pub mod stores;

pub use decision_cache::{
    build_decision_cache, DecisionCache, DecisionKey, MemoryDecisionCache, MockDecisionCache,
};
pub use error::ServiceError;
pub use identity::IdentityResolver;
pub use memory::MemoryStore;
pub use redis::RedisDecisionCache;
pub use sink::{
    build_decision_sink, DecisionEvent, DecisionSink, GrantPath, MetricsDecisionSink,
    NoopDecisionSink, RecordingDecisionSink, TracingDecisionSink,
};
pub use stores::{
    ConsumerStore, GroupResourceStore, GroupStore, IdentityStore, JobStore, PermissionStore,
    PermissionTarget, UserStore,
};
