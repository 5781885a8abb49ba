//! Label vocabularies: resource kinds, push trigger reasons and inbound update types.

use std::fmt;

/// xDS v3 type URL for listeners.
pub const LISTENER_TYPE: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";
/// xDS v3 type URL for routes.
pub const ROUTE_TYPE: &str = "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";
/// xDS v3 type URL for clusters.
pub const CLUSTER_TYPE: &str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";
/// xDS v3 type URL for endpoints.
pub const ENDPOINT_TYPE: &str =
    "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment";

/// Category of configuration object distributed to proxies.
///
/// The four known kinds are closed; anything else is carried verbatim in
/// [`ResourceKind::Unknown`] so recorders can skip kind-specific series
/// instead of misattributing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Listener,
    Route,
    Cluster,
    Endpoint,
    Unknown(String),
}

impl ResourceKind {
    /// Parse a type URL as sent on the wire.
    pub fn from_type_url(type_url: &str) -> Self {
        match type_url {
            LISTENER_TYPE => ResourceKind::Listener,
            ROUTE_TYPE => ResourceKind::Route,
            CLUSTER_TYPE => ResourceKind::Cluster,
            ENDPOINT_TYPE => ResourceKind::Endpoint,
            other => ResourceKind::Unknown(other.to_string()),
        }
    }

    /// Canonical label value used by the unified series.
    ///
    /// Unknown kinds fall back to their raw type URL.
    pub fn metric_type(&self) -> &str {
        match self {
            ResourceKind::Listener => "lds",
            ResourceKind::Route => "rds",
            ResourceKind::Cluster => "cds",
            ResourceKind::Endpoint => "eds",
            ResourceKind::Unknown(type_url) => type_url,
        }
    }

    /// Returns true for the four kinds that have dedicated series.
    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceKind::Unknown(_))
    }
}

impl From<&str> for ResourceKind {
    fn from(type_url: &str) -> Self {
        Self::from_type_url(type_url)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_type())
    }
}

/// Causal event that prompted a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerReason {
    /// A configuration object changed.
    ConfigChange,
    /// Endpoints of a service changed.
    EndpointChange,
    /// A service was added or updated.
    ServiceUpdate,
    /// A service was deleted.
    ServiceDelete,
    /// The proxy itself changed (labels, metadata).
    ProxyUpdate,
    /// Full push of everything to everyone.
    GlobalUpdate,
    /// A referenced secret changed.
    SecretChange,
    /// Mesh network topology changed.
    NetworksChange,
    /// The proxy explicitly requested resources.
    ProxyRequest,
    /// A namespace changed.
    NamespaceChange,
    /// Push requested through a debug interface.
    Debug,
    /// Cause was not reported by the scheduler.
    Unknown,
}

impl TriggerReason {
    pub const ALL: [TriggerReason; 12] = [
        TriggerReason::ConfigChange,
        TriggerReason::EndpointChange,
        TriggerReason::ServiceUpdate,
        TriggerReason::ServiceDelete,
        TriggerReason::ProxyUpdate,
        TriggerReason::GlobalUpdate,
        TriggerReason::SecretChange,
        TriggerReason::NetworksChange,
        TriggerReason::ProxyRequest,
        TriggerReason::NamespaceChange,
        TriggerReason::Debug,
        TriggerReason::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerReason::ConfigChange => "config",
            TriggerReason::EndpointChange => "endpoint",
            TriggerReason::ServiceUpdate => "service",
            TriggerReason::ServiceDelete => "svcdelete",
            TriggerReason::ProxyUpdate => "proxy",
            TriggerReason::GlobalUpdate => "global",
            TriggerReason::SecretChange => "secret",
            TriggerReason::NetworksChange => "networks",
            TriggerReason::ProxyRequest => "proxyrequest",
            TriggerReason::NamespaceChange => "namespace",
            TriggerReason::Debug => "debug",
            TriggerReason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of an update received by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundUpdate {
    Config,
    Endpoint,
    Service,
    ServiceDelete,
}

impl InboundUpdate {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundUpdate::Config => "config",
            InboundUpdate::Endpoint => "eds",
            InboundUpdate::Service => "svc",
            InboundUpdate::ServiceDelete => "svcdelete",
        }
    }
}
