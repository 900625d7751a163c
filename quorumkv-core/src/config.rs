//! Timing configuration for the consensus subsystem.

use std::time::Duration;

/// All periodic and debounce intervals used by the cluster.
///
/// The defaults are the production values: leaders emit heartbeats every
/// 5 s, monitors check for silence every 7 s, elections are debounced at
/// 1 s, and the failure injector waits a uniform 10-20 s before each kill
/// and each restart. Tests construct tighter values.
#[derive(Debug, Clone, Copy)]
pub struct ClusterTiming {
    /// Cadence at which a leader pings every peer's `receive_heartbeat`.
    pub heartbeat_interval: Duration,

    /// Cadence at which a non-leader checks whether a heartbeat arrived
    /// during the last window.
    pub monitor_interval: Duration,

    /// Minimum interval between two runs of the same election routine.
    /// A second call inside this window returns without action.
    pub election_debounce: Duration,

    /// Lower bound of the failure injector's random delay, applied before
    /// each unexport and again before the matching restart.
    pub failure_delay_min: Duration,

    /// Upper bound of the failure injector's random delay.
    pub failure_delay_max: Duration,

    /// Transport-level timeout for every remote invocation. There is no
    /// application-level cancellation; a stalled peer is only dropped when
    /// the transport gives up, and the failed call counts as a REJECT vote.
    pub rpc_timeout: Duration,
}

impl Default for ClusterTiming {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            monitor_interval: Duration::from_secs(7),
            election_debounce: Duration::from_millis(1000),
            failure_delay_min: Duration::from_secs(10),
            failure_delay_max: Duration::from_secs(20),
            rpc_timeout: Duration::from_secs(30),
        }
    }
}
