// ! Plugin RPC method constants
// !
// ! Every method is scoped to the service that implements it, in
// ! `Service.Method` form.

// Session methods, served by every plugin kind
pub const SESSION_PING: &str = "SessionState.Ping";
pub const SESSION_SET_KEY: &str = "SessionState.SetKey";
pub const SESSION_KILL: &str = "SessionState.Kill";
pub const SESSION_GET_CONFIG_POLICY: &str = "SessionState.GetConfigPolicy";

// Collector methods
pub const COLLECTOR_COLLECT_METRICS: &str = "Collector.CollectMetrics";
pub const COLLECTOR_GET_METRIC_TYPES: &str = "Collector.GetMetricTypes";

// Processor methods
pub const PROCESSOR_PROCESS: &str = "Processor.Process";

// Publisher methods
pub const PUBLISHER_PUBLISH: &str = "Publisher.Publish";
