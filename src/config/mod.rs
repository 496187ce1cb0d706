mod attribution_config;

pub use attribution_config::AttributionConfig;
