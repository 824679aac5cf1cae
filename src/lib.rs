//! Safety KPI aggregation for HSE dashboards.
//!
//! Records live in per-domain collections behind a [`store::StoreBackend`].
//! The [`pipeline::Aggregator`] reads the collections its KPIs depend on and
//! publishes [`metrics::Snapshot`]s; a [`pipeline::LiveAggregator`] keeps one
//! current as the [`bus::ChangeBus`] reports writes. [`alerts`] classifies
//! critical incidents and [`serial`] suggests serial numbers for new records.

pub mod alerts;
pub mod bus;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod records;
pub mod serial;
pub mod store;

pub use alerts::{classify, is_critical, AlertFeed};
pub use bus::{ChangeBus, ChangeEvent, ChangeNotice, ChangeOrigin, ChangeSubscription, Unsubscribe};
pub use config::{HseConfig, SettingsError};
pub use metrics::{
    compute_kpis, format_snapshot, DateWindow, Kpi, KpiSet, MetricContext, PipelineStatus,
    ProjectRating, RecordSet, SafetyKpis, Snapshot,
};
pub use pipeline::{Aggregator, LiveAggregator};
pub use records::{Domain, DomainRecord, DomainSet};
pub use serial::SerialGenerator;
pub use store::{FileBackend, MemoryBackend, RecordStore, StoreBackend, StoreError, StoreWatcher};
